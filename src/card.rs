use crate::feeds::{Post, PostId};
use chrono::{DateTime, Utc};

/// A comment that only exists while its card does.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalComment {
    pub id: u64,
    pub content: String,
    pub author: String,
    pub post_id: PostId,
    pub created_at: DateTime<Utc>,
}

/// One post in the feed plus the comment thread typed against it.
#[derive(Debug, Clone)]
pub struct CardPresenter {
    post: Post,
    author: String,
    comments: Vec<LocalComment>,
    input: String,
    hashtag_cursor: Option<usize>,
}

impl CardPresenter {
    /// `author` is who local comments are attributed to.
    pub fn new(post: Post, author: impl Into<String>) -> Self {
        Self {
            post,
            author: author.into(),
            comments: Vec::new(),
            input: String::new(),
            hashtag_cursor: None,
        }
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn comments(&self) -> &[LocalComment] {
        &self.comments
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn push_input(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_input(&mut self) {
        self.input.pop();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    /// Append a comment unless `text` is blank. Returns the new comment's id.
    pub fn add_comment(&mut self, text: &str) -> Option<u64> {
        if text.trim().is_empty() {
            return None;
        }

        let id = self.comments.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        self.comments.push(LocalComment {
            id,
            content: text.to_string(),
            author: self.author.clone(),
            post_id: self.post.id,
            created_at: Utc::now(),
        });
        self.input.clear();
        Some(id)
    }

    /// Post whatever is in the input buffer.
    pub fn submit_input(&mut self) -> Option<u64> {
        let text = self.input.clone();
        self.add_comment(&text)
    }

    pub fn delete_comment(&mut self, id: u64) -> bool {
        match self.comments.iter().position(|c| c.id == id) {
            Some(index) => {
                self.comments.remove(index);
                true
            }
            None => false,
        }
    }

    /// Step the highlighted hashtag forward, wrapping around.
    pub fn next_hashtag(&mut self) -> Option<&str> {
        if self.post.hashtags.is_empty() {
            return None;
        }
        let next = match self.hashtag_cursor {
            Some(i) => (i + 1) % self.post.hashtags.len(),
            None => 0,
        };
        self.hashtag_cursor = Some(next);
        self.post.hashtags.get(next).map(String::as_str)
    }

    pub fn highlighted_hashtag(&self) -> Option<usize> {
        self.hashtag_cursor
    }
}
