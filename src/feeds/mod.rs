pub mod loader;

use crate::gateway::PostRecord;
use chrono::{DateTime, Utc};

pub use loader::{FeedLoader, PageRequest};

pub type PostId = i64;

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub hashtags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub author: Option<String>,
}

impl From<PostRecord> for Post {
    fn from(record: PostRecord) -> Self {
        let author = record.user_id.and_then(|value| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });

        Self {
            id: record.id,
            title: record.title.unwrap_or_default(),
            content: record.content.unwrap_or_default(),
            image_url: record.image_url,
            hashtags: record.hashtags.unwrap_or_default(),
            created_at: record.created_at,
            author,
        }
    }
}

/// One successfully loaded batch of posts.
#[derive(Debug, Clone, PartialEq)]
pub struct PostPage {
    pub page: u32,
    pub posts: Vec<Post>,
    pub has_more: bool,
}

/// Zero-based rows `offset ..= offset + limit - 1` of the posts table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub offset: u64,
    pub limit: u64,
}

impl RowRange {
    pub fn last_row(&self) -> u64 {
        (self.offset + self.limit).saturating_sub(1)
    }
}

/// Position in the feed: which 1-based page comes next and how big pages are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    page: u32,
    page_size: u32,
}

impl PageCursor {
    pub fn first(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Rows for the current page, aligned to the page size so that page 1
    /// starts at row 0 and consecutive pages neither overlap nor skip rows.
    pub fn range(&self) -> RowRange {
        let size = u64::from(self.page_size);
        RowRange {
            offset: u64::from(self.page - 1) * size,
            limit: size,
        }
    }

    pub fn advance(self) -> Self {
        Self {
            page: self.page + 1,
            ..self
        }
    }
}
