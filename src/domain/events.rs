//! Analytics events emitted on the request path.
//!
//! Wire format is JSON with camelCase field names; these structs are the
//! single source of truth for both the publisher and the consumer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Emitted after a short URL is successfully created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UrlCreatedEvent {
    pub code: String,
    pub original_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_hash: Option<String>,
    pub strategy: String,
    pub created_at: DateTime<Utc>,
    pub client_ip: String,
    pub user_agent: String,
}

/// Emitted after a successful redirect lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UrlAccessedEvent {
    pub code: String,
    pub accessed_at: DateTime<Utc>,
    pub client_ip: String,
    pub user_agent: String,
    pub referrer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_event_json_field_names() {
        let event = UrlCreatedEvent {
            code: "abc12345".to_string(),
            original_url: "https://example.com".to_string(),
            url_hash: Some("ff".repeat(32)),
            strategy: "hash".to_string(),
            created_at: Utc::now(),
            client_ip: "203.0.113.9".to_string(),
            user_agent: "curl/8.0".to_string(),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert!(value.get("originalUrl").is_some());
        assert!(value.get("urlHash").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("clientIp").is_some());
        assert!(value.get("userAgent").is_some());
    }

    #[test]
    fn test_created_event_omits_empty_hash() {
        let event = UrlCreatedEvent {
            code: "abc12345".to_string(),
            original_url: "https://example.com".to_string(),
            url_hash: None,
            strategy: "token".to_string(),
            created_at: Utc::now(),
            client_ip: String::new(),
            user_agent: String::new(),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert!(value.get("urlHash").is_none());
    }

    #[test]
    fn test_accessed_event_round_trips() {
        let event = UrlAccessedEvent {
            code: "abc12345".to_string(),
            accessed_at: Utc::now(),
            client_ip: "203.0.113.9".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            referrer: "https://news.example.com".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("accessedAt"));
        assert!(json.contains("referrer"));

        let decoded: UrlAccessedEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, event);
    }
}
