use super::{PageCursor, Post, PostPage, RowRange};
use crate::error::FetchError;
use crate::gateway::{Gateway, PostRecord};
use tracing::{debug, info, warn};

/// A page fetch that has been started and not yet completed.
///
/// Carries the loader generation it was issued under, so a completion that
/// arrives after `FeedLoader::reset` is recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    generation: u64,
    cursor: PageCursor,
}

impl PageRequest {
    pub fn page(&self) -> u32 {
        self.cursor.page()
    }

    pub fn range(&self) -> RowRange {
        self.cursor.range()
    }
}

/// Feed page state and the rules for moving it forward.
///
/// At most one fetch is in flight. The cursor only advances on success, and
/// once a page comes back short no further fetch is issued.
#[derive(Debug, Clone)]
pub struct FeedLoader {
    posts: Vec<Post>,
    cursor: PageCursor,
    has_more: bool,
    in_flight: bool,
    last_error: Option<String>,
    generation: u64,
}

impl FeedLoader {
    pub fn new(page_size: u32) -> Self {
        Self {
            posts: Vec::new(),
            cursor: PageCursor::first(page_size),
            has_more: true,
            in_flight: false,
            last_error: None,
            generation: 0,
        }
    }

    /// Loaded posts, most recently fetched page first.
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Claim the in-flight slot for the next page, or `None` when a fetch is
    /// already running or the feed is exhausted.
    pub fn begin(&mut self) -> Option<PageRequest> {
        if self.in_flight {
            debug!(page = self.cursor.page(), "fetch already in flight");
            return None;
        }
        if !self.has_more {
            debug!("no more pages to fetch");
            return None;
        }

        self.in_flight = true;
        Some(PageRequest {
            generation: self.generation,
            cursor: self.cursor,
        })
    }

    /// Apply the gateway's answer to `request`.
    ///
    /// Returns `None` when the request belongs to an earlier generation and
    /// was discarded without touching state.
    pub fn complete(
        &mut self,
        request: PageRequest,
        result: Result<Vec<PostRecord>, FetchError>,
    ) -> Option<Result<PostPage, FetchError>> {
        if request.generation != self.generation {
            debug!(page = request.page(), "discarding stale page");
            return None;
        }
        self.in_flight = false;

        match result {
            Ok(records) => {
                let posts: Vec<Post> = records.into_iter().map(Post::from).collect();
                if posts.len() < self.cursor.page_size() as usize {
                    self.has_more = false;
                }

                let mut merged = posts.clone();
                merged.append(&mut self.posts);
                self.posts = merged;

                self.cursor = self.cursor.advance();
                self.last_error = None;

                info!(
                    page = request.page(),
                    count = posts.len(),
                    has_more = self.has_more,
                    "loaded feed page"
                );
                Some(Ok(PostPage {
                    page: request.page(),
                    posts,
                    has_more: self.has_more,
                }))
            }
            Err(err) => {
                warn!(page = request.page(), error = %err, "error fetching posts");
                self.last_error = Some(err.message.clone());
                Some(Err(err))
            }
        }
    }

    /// Fetch and merge the next page in one step.
    ///
    /// `Ok(None)` means nothing was requested, either because a fetch is
    /// running or because every page has been loaded.
    pub async fn load_next_page<G>(&mut self, gateway: &G) -> Result<Option<PostPage>, FetchError>
    where
        G: Gateway + ?Sized,
    {
        let Some(request) = self.begin() else {
            return Ok(None);
        };

        let result = gateway.fetch_posts(request.range()).await;
        match self.complete(request, result) {
            Some(Ok(page)) => Ok(Some(page)),
            Some(Err(err)) => Err(err),
            None => Ok(None),
        }
    }

    /// Drop everything loaded and start over from the first page. A fetch
    /// still running for the old state will be ignored when it completes.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.posts.clear();
        self.cursor = PageCursor::first(self.cursor.page_size());
        self.has_more = true;
        self.in_flight = false;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;
    use chrono::Utc;

    fn record(id: i64) -> PostRecord {
        PostRecord {
            id,
            title: Some(format!("Post {}", id)),
            content: Some(format!("content {}", id)),
            image_url: Some(format!("file:///img/{}.jpg", id)),
            created_at: Utc::now(),
            user_id: None,
            hashtags: None,
        }
    }

    fn gateway_with(count: i64) -> MemoryGateway {
        MemoryGateway::with_posts((1..=count).map(record).collect())
    }

    fn ids(loader: &FeedLoader) -> Vec<i64> {
        loader.posts().iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn test_full_page_keeps_more_and_advances() {
        let gateway = gateway_with(7);
        let mut loader = FeedLoader::new(3);

        let page = loader.load_next_page(&gateway).await.unwrap().unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.posts.len(), 3);
        assert!(page.has_more);
        assert!(loader.has_more());
        assert_eq!(loader.cursor().page(), 2);
        assert!(!loader.is_fetching());
        assert_eq!(gateway.read_count(), 1);
    }

    #[tokio::test]
    async fn test_newest_page_is_prepended() {
        let gateway = gateway_with(7);
        let mut loader = FeedLoader::new(3);

        loader.load_next_page(&gateway).await.unwrap();
        loader.load_next_page(&gateway).await.unwrap();
        assert_eq!(ids(&loader), vec![4, 5, 6, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_short_page_stops_further_fetches() {
        let gateway = gateway_with(4);
        let mut loader = FeedLoader::new(3);

        loader.load_next_page(&gateway).await.unwrap();
        let page = loader.load_next_page(&gateway).await.unwrap().unwrap();
        assert_eq!(page.posts.len(), 1);
        assert!(!page.has_more);
        assert!(!loader.has_more());
        assert_eq!(loader.cursor().page(), 3);

        let reads = gateway.read_count();
        assert_eq!(loader.load_next_page(&gateway).await.unwrap(), None);
        assert_eq!(gateway.read_count(), reads);
        assert_eq!(ids(&loader), vec![4, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_empty_table_ends_feed() {
        let gateway = MemoryGateway::new();
        let mut loader = FeedLoader::new(3);

        let page = loader.load_next_page(&gateway).await.unwrap().unwrap();
        assert!(page.posts.is_empty());
        assert!(!loader.has_more());
    }

    #[tokio::test]
    async fn test_load_while_in_flight_is_noop() {
        let gateway = gateway_with(7);
        let mut loader = FeedLoader::new(3);
        loader.load_next_page(&gateway).await.unwrap();

        let pending = loader.begin().unwrap();
        let before_ids = ids(&loader);
        let before_cursor = loader.cursor();

        assert_eq!(loader.load_next_page(&gateway).await.unwrap(), None);
        assert_eq!(loader.begin(), None);
        assert_eq!(ids(&loader), before_ids);
        assert_eq!(loader.cursor(), before_cursor);
        assert!(loader.has_more());
        assert!(loader.is_fetching());
        assert_eq!(gateway.read_count(), 1);

        let result = gateway.fetch_posts(pending.range()).await;
        loader.complete(pending, result).unwrap().unwrap();
        assert_eq!(ids(&loader), vec![4, 5, 6, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_failure_keeps_list_and_cursor() {
        let gateway = gateway_with(7);
        let mut loader = FeedLoader::new(3);
        loader.load_next_page(&gateway).await.unwrap();

        gateway.set_failure(Some("network request failed"));
        let err = loader.load_next_page(&gateway).await.unwrap_err();
        assert_eq!(err.message, "network request failed");
        assert_eq!(loader.last_error(), Some("network request failed"));
        assert_eq!(loader.cursor().page(), 2);
        assert_eq!(ids(&loader), vec![1, 2, 3]);
        assert!(!loader.is_fetching());
        assert!(loader.has_more());

        gateway.set_failure(None);
        loader.load_next_page(&gateway).await.unwrap();
        assert_eq!(loader.last_error(), None);
        assert_eq!(loader.cursor().page(), 3);
    }

    #[tokio::test]
    async fn test_reset_discards_stale_completion() {
        let gateway = gateway_with(7);
        let mut loader = FeedLoader::new(3);

        let stale = loader.begin().unwrap();
        loader.reset();
        assert!(!loader.is_fetching());

        let result = gateway.fetch_posts(stale.range()).await;
        assert!(loader.complete(stale, result).is_none());
        assert!(loader.posts().is_empty());
        assert_eq!(loader.cursor().page(), 1);

        loader.load_next_page(&gateway).await.unwrap();
        assert_eq!(ids(&loader), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_image_reference_copied_verbatim() {
        let gateway = gateway_with(1);
        let mut loader = FeedLoader::new(3);
        loader.load_next_page(&gateway).await.unwrap();
        assert_eq!(
            loader.posts()[0].image_url.as_deref(),
            Some("file:///img/1.jpg")
        );
    }
}
