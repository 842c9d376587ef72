use super::{Gateway, NewPostRecord, PostRecord, Session};
use crate::error::FetchError;
use crate::feeds::RowRange;
use crate::hashtags::extract_hashtags;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// An in-process `posts` table.
///
/// Backs the `demo` command and the tests. Rows are kept in insertion order,
/// which is the order `fetch_posts` pages through them.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    rows: Mutex<Vec<PostRecord>>,
    session: Option<Session>,
    failure: Mutex<Option<String>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_posts(rows: Vec<PostRecord>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    /// A small hand-written feed for trying the interface without a backend.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let samples = [
            (
                "Morning run",
                "5k along the river #running #outdoors",
                Some("https://picsum.photos/id/1011/600/400"),
            ),
            ("New keyboard", "Finally switched to a split layout #setup", None),
            (
                "Sourdough day 3",
                "The starter is alive #baking #bread",
                Some("https://picsum.photos/id/1080/600/400"),
            ),
            ("Conference notes", "Slides are up, thanks everyone #rustlang #talks", None),
            (
                "Weekend hike",
                "Foggy but worth it #outdoors #hiking",
                Some("https://picsum.photos/id/1018/600/400"),
            ),
            ("Release 0.2", "Pagination fixes and a new dashboard #release", None),
            ("Coffee", "Trying a new roast #coffee", None),
        ];

        let rows = samples
            .iter()
            .enumerate()
            .map(|(i, &(title, content, image))| PostRecord {
                id: i as i64 + 1,
                title: Some(title.to_string()),
                content: Some(content.to_string()),
                image_url: image.map(str::to_string),
                created_at: now - Duration::hours((samples.len() - i) as i64 * 5),
                user_id: Some(serde_json::Value::String("demo".to_string())),
                hashtags: Some(extract_hashtags(content)),
            })
            .collect();

        Self {
            rows: Mutex::new(rows),
            session: Some(Session {
                user_id: "demo".to_string(),
                email: Some("demo@localhost".to_string()),
            }),
            ..Self::default()
        }
    }

    /// Make every following call fail with `message` until cleared with `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        *lock(&self.failure) = message.map(str::to_string);
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn rows(&self) -> Vec<PostRecord> {
        lock(&self.rows).clone()
    }

    fn check_failure(&self) -> Result<(), FetchError> {
        match lock(&self.failure).as_ref() {
            Some(message) => Err(FetchError::new(message.clone())),
            None => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn fetch_posts(&self, range: RowRange) -> Result<Vec<PostRecord>, FetchError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let rows = lock(&self.rows);
        Ok(rows
            .iter()
            .skip(range.offset as usize)
            .take(range.limit as usize)
            .cloned()
            .collect())
    }

    async fn upsert_post(&self, record: NewPostRecord) -> Result<(), FetchError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let mut rows = lock(&self.rows);
        let id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        rows.push(PostRecord {
            id,
            title: Some(record.title),
            content: Some(record.content),
            image_url: Some(record.image_url),
            created_at: record.created_at,
            user_id: self
                .session
                .as_ref()
                .map(|s| serde_json::Value::String(s.user_id.clone())),
            hashtags: None,
        });
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Session>, FetchError> {
        self.check_failure()?;
        Ok(self.session.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_posts_slices_by_range() {
        let gateway = MemoryGateway::seeded();
        let rows = gateway
            .fetch_posts(RowRange {
                offset: 3,
                limit: 3,
            })
            .await
            .unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 5, 6]);
        assert_eq!(
            rows[0].hashtags.as_deref(),
            Some(&["#rustlang".to_string(), "#talks".to_string()][..])
        );

        let tail = gateway
            .fetch_posts(RowRange {
                offset: 6,
                limit: 3,
            })
            .await
            .unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(gateway.read_count(), 2);
    }

    #[tokio::test]
    async fn test_upsert_assigns_next_id() {
        let gateway = MemoryGateway::seeded();
        gateway
            .upsert_post(NewPostRecord {
                title: "Late post".to_string(),
                content: "#late".to_string(),
                image_url: "/tmp/late.png".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let rows = gateway.rows();
        let last = rows.last().unwrap();
        assert_eq!(last.id, 8);
        assert_eq!(last.image_url.as_deref(), Some("/tmp/late.png"));
        assert_eq!(gateway.write_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_applies_until_cleared() {
        let gateway = MemoryGateway::new();
        gateway.set_failure(Some("offline"));
        let err = gateway
            .fetch_posts(RowRange {
                offset: 0,
                limit: 3,
            })
            .await
            .unwrap_err();
        assert_eq!(err.message, "offline");

        gateway.set_failure(None);
        assert!(gateway
            .fetch_posts(RowRange {
                offset: 0,
                limit: 3,
            })
            .await
            .unwrap()
            .is_empty());
    }
}
