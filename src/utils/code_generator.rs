//! Short code generation.
//!
//! Codes are sampled from a URL-safe alphabet with a cryptographically
//! secure RNG. Collisions are not retried here; the durable store's
//! first-writer-wins insert keeps the earlier record.

/// URL-safe alphabet: 64 symbols, so a random byte maps without modulo bias.
const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Default code length when none is configured.
pub const DEFAULT_CODE_LENGTH: usize = 8;

/// Generates fixed-length short codes from a URL-safe alphabet.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    length: usize,
}

impl CodeGenerator {
    /// Creates a generator producing codes of the given length.
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    /// Generates a new random code.
    ///
    /// Each character is drawn independently; over a 64-symbol alphabet at
    /// length 8 the keyspace is 64^8 (~2.8e14), which keeps the collision
    /// probability negligible for realistic volumes.
    ///
    /// # Panics
    ///
    /// Panics if the system random number generator fails (extremely rare).
    pub fn generate(&self) -> String {
        let mut buffer = vec![0u8; self.length];

        getrandom::fill(&mut buffer).expect("Failed to generate random bytes");

        buffer
            .iter()
            .map(|b| ALPHABET[(b & 0x3f) as usize] as char)
            .collect()
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}
