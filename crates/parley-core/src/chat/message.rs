//! Conversation message types.
//!
//! Messages are stored as flat JSON objects so that previously persisted
//! threads keep loading:
//!
//! ```json
//! {"id":"1704067200000_k3j2h1g0f","text":"hi","timestamp":"2024-01-01T00:00:00.000Z","type":"sent","status":"sent"}
//! ```

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::id::generate_message_id;

/// Direction of a message relative to the local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Written by the local user.
    #[default]
    Sent,
    /// Produced by the simulated partner.
    Received,
}

/// Delivery status shown next to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Sent,
    Delivered,
}

/// Payload of a message. Exactly one of `text` / `image` is present in the
/// stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageContent {
    /// Plain text.
    Text(String),
    /// Image payload (data URL or remote URL).
    Image(String),
}

impl MessageContent {
    /// Returns the text payload, if this is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text),
            MessageContent::Image(_) => None,
        }
    }
}

/// A single message in the thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique time + random composite id.
    pub id: String,
    /// Text or image payload.
    #[serde(flatten)]
    pub content: MessageContent,
    /// Creation time, stored as ISO-8601 with millisecond precision.
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    /// Sent or received. Older entries without it read as sent.
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub status: MessageStatus,
}

impl Message {
    /// Creates a message sent by the local user.
    pub fn sent(content: MessageContent) -> Self {
        Self {
            id: generate_message_id(),
            content,
            timestamp: Utc::now().trunc_subsecs(3),
            kind: MessageKind::Sent,
            status: MessageStatus::Sent,
        }
    }

    /// Creates a message received from the partner.
    pub fn received(text: impl Into<String>) -> Self {
        Self {
            id: generate_message_id(),
            content: MessageContent::Text(text.into()),
            timestamp: Utc::now().trunc_subsecs(3),
            kind: MessageKind::Received,
            status: MessageStatus::Delivered,
        }
    }
}

/// Serializes timestamps the way browsers print `Date.toISOString()`.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Formats a timestamp relative to `now` for display next to a message.
pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(timestamp);
    let millis = diff.num_milliseconds();

    if millis < 60_000 {
        "just now".to_string()
    } else if millis < 3_600_000 {
        format!("{} min ago", millis / 60_000)
    } else if millis < 86_400_000 {
        format!("{} h ago", millis / 3_600_000)
    } else {
        timestamp.format("%Y-%m-%d %H:%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stored_shape_is_flat() {
        let message = Message {
            id: "1_abc".to_string(),
            content: MessageContent::Text("hello".to_string()),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            kind: MessageKind::Sent,
            status: MessageStatus::Sent,
        };

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["text"], "hello");
        assert_eq!(value["type"], "sent");
        assert_eq!(value["status"], "sent");
        assert_eq!(value["timestamp"], "2024-01-01T00:00:00.000Z");
        assert!(value.get("content").is_none());
    }

    #[test]
    fn test_parse_image_message_with_extra_fields() {
        let raw = r#"{"id":"x","image":"data:image/png;base64,AAAA","timestamp":"2024-05-01T10:00:00Z","type":"received","status":"delivered","unknown":1}"#;
        let message: Message = serde_json::from_str(raw).unwrap();
        assert_eq!(
            message.content,
            MessageContent::Image("data:image/png;base64,AAAA".to_string())
        );
        assert_eq!(message.kind, MessageKind::Received);
        assert_eq!(message.status, MessageStatus::Delivered);
    }

    #[test]
    fn test_missing_timestamp_is_rejected() {
        let raw = r#"{"id":"x","text":"hi","type":"sent","status":"sent"}"#;
        assert!(serde_json::from_str::<Message>(raw).is_err());
    }

    #[test]
    fn test_missing_kind_and_status_default_to_sent() {
        let raw = r#"{"id":"x","text":"hi","timestamp":"2024-01-01T00:00:00.000Z"}"#;
        let message: Message = serde_json::from_str(raw).unwrap();
        assert_eq!(message.kind, MessageKind::Sent);
        assert_eq!(message.status, MessageStatus::Sent);
    }

    #[test]
    fn test_received_constructor() {
        let message = Message::received("ok");
        assert_eq!(message.kind, MessageKind::Received);
        assert_eq!(message.status, MessageStatus::Delivered);
        assert_eq!(message.content.as_text(), Some("ok"));
    }

    #[test]
    fn test_format_relative_time() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap();
        assert_eq!(format_relative_time(now, now), "just now");
        assert_eq!(
            format_relative_time(now - chrono::Duration::minutes(5), now),
            "5 min ago"
        );
        assert_eq!(
            format_relative_time(now - chrono::Duration::hours(3), now),
            "3 h ago"
        );
        assert_eq!(
            format_relative_time(now - chrono::Duration::days(2), now),
            "2023-12-31 12:00"
        );
    }
}
