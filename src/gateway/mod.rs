pub mod memory;
pub mod rest;

use crate::error::FetchError;
use crate::feeds::{PostId, RowRange};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub use memory::MemoryGateway;
pub use rest::RestGateway;

/// A row of the `posts` table as the backend returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: PostId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
    #[serde(default)]
    pub hashtags: Option<Vec<String>>,
}

/// The row written when a post is composed. `id` is assigned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPostRecord {
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Session {
    #[serde(rename = "id")]
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Read the rows covered by `range`, in table order.
    async fn fetch_posts(&self, range: RowRange) -> Result<Vec<PostRecord>, FetchError>;

    /// Insert `record`, merging with an existing row on key conflict.
    async fn upsert_post(&self, record: NewPostRecord) -> Result<(), FetchError>;

    /// The signed-in user, if the configured credentials carry one.
    async fn current_session(&self) -> Result<Option<Session>, FetchError>;
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

/// Accepts RFC 3339 (`timestamptz`) and zone-less (`timestamp`) columns; the
/// latter are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_with_offset() {
        let ts = parse_timestamp("2024-03-01T10:15:00.123456+02:00").unwrap();
        assert_eq!(
            ts.with_timezone(&Utc).format("%H:%M").to_string(),
            "08:15"
        );
    }

    #[test]
    fn test_parse_timestamp_without_zone() {
        assert_eq!(
            parse_timestamp("2024-03-01T10:15:00"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2024-03-01 10:15:00.5").map(|t| t.format("%S").to_string()),
            Some("00".to_string())
        );
    }

    #[test]
    fn test_parse_timestamp_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_post_record_ignores_unknown_columns() {
        let json = r#"{
            "id": 7,
            "title": "Sunset",
            "content": "look #sky",
            "image_url": null,
            "created_at": "2024-03-01T10:15:00+00:00",
            "likes": 12
        }"#;
        let record: PostRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.title.as_deref(), Some("Sunset"));
        assert_eq!(record.image_url, None);
        assert_eq!(record.hashtags, None);
        assert_eq!(record.user_id, None);
    }

    #[test]
    fn test_new_post_record_wire_shape() {
        let record = NewPostRecord {
            title: "t".to_string(),
            content: "c".to_string(),
            image_url: "file:///tmp/a.png".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["image_url"], "file:///tmp/a.png");
        assert_eq!(value["created_at"], "2024-01-02T03:04:05Z");
        assert!(value.get("id").is_none());
        assert!(value.get("hashtags").is_none());
    }
}
