//! Post feed controller.
//!
//! Simpler than the message feed: no drafts, no delete. Likes are
//! applied only after the server confirms, so a failed toggle changes
//! nothing and there is no rollback path. This is deliberately not the
//! message feed's reconcile-by-refetch strategy; the two feeds differ
//! on purpose.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mingle_client::{ApiClient, ApiError, Page, Post};
use tracing::warn;

use crate::collection::{FeedItem, PageSource, PagedCollection};

impl FeedItem for Post {
    fn item_id(&self) -> &str {
        &self.id
    }
}

struct PostSource {
    api: ApiClient,
}

#[async_trait]
impl PageSource<Post> for PostSource {
    async fn first_page(&self) -> Result<Page<Post>, ApiError> {
        self.api.posts().await
    }

    async fn page_at(&self, cursor: &str) -> Result<Page<Post>, ApiError> {
        self.api.page(cursor).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFeedState {
    Loading,
    Idle,
    Error(String),
}

struct PostInner {
    state: PostFeedState,
    query: String,
}

/// Controller for the post feed. Clones share state.
#[derive(Clone)]
pub struct PostFeed {
    api: ApiClient,
    collection: PagedCollection<Post>,
    inner: Arc<Mutex<PostInner>>,
}

impl PostFeed {
    pub fn new(api: ApiClient) -> Self {
        let source = PostSource { api: api.clone() };
        Self {
            api,
            collection: PagedCollection::new(Arc::new(source)),
            inner: Arc::new(Mutex::new(PostInner {
                state: PostFeedState::Loading,
                query: String::new(),
            })),
        }
    }

    // ── Snapshots for the view ──────────────────────────────────────

    pub fn state(&self) -> PostFeedState {
        self.inner.lock().unwrap().state.clone()
    }

    pub fn query(&self) -> String {
        self.inner.lock().unwrap().query.clone()
    }

    /// The full fetched set, unfiltered.
    pub fn posts(&self) -> Vec<Post> {
        self.collection.items()
    }

    /// The fetched set narrowed by the current query. A projection over
    /// [`Self::posts`]; the underlying collection is never mutated by
    /// filtering.
    pub fn filtered_posts(&self) -> Vec<Post> {
        let query = self.inner.lock().unwrap().query.to_lowercase();
        let items = self.collection.items();
        if query.is_empty() {
            return items;
        }
        items
            .into_iter()
            .filter(|post| {
                post.title.to_lowercase().contains(&query)
                    || post.owner_name.to_lowercase().contains(&query)
            })
            .collect()
    }

    pub fn has_more(&self) -> bool {
        self.collection.has_more()
    }

    // ── Loading ─────────────────────────────────────────────────────

    pub async fn load_first_page(&self) -> Result<(), ApiError> {
        self.set_state(PostFeedState::Loading);
        match self.collection.load_first_page().await {
            Ok(()) => {
                self.set_state(PostFeedState::Idle);
                Ok(())
            }
            Err(err) => {
                self.set_state(PostFeedState::Error(err.user_message()));
                Err(err)
            }
        }
    }

    /// Failures surface as an error state; loaded posts stay visible.
    pub async fn load_next_page(&self) -> Result<bool, ApiError> {
        match self.collection.load_next_page().await {
            Ok(merged) => Ok(merged),
            Err(err) => {
                self.set_state(PostFeedState::Error(err.user_message()));
                Err(err)
            }
        }
    }

    // ── Likes ───────────────────────────────────────────────────────

    /// Like or unlike, by current like state. The local post mutates
    /// only after the server confirms; a failure leaves `like_id` and
    /// `likes_count` exactly as they were.
    pub async fn toggle_like(&self, post_id: &str) -> Result<(), ApiError> {
        let Some(post) = self.collection.get(post_id) else {
            warn!(post_id, "like toggled on unknown post");
            return Ok(());
        };

        match post.like_id {
            Some(like_id) => match self.api.unlike(&like_id).await {
                Ok(()) => {
                    self.collection.update(post_id, |p| {
                        p.like_id = None;
                        p.likes_count = p.likes_count.saturating_sub(1);
                    });
                    Ok(())
                }
                Err(err) => {
                    warn!(post_id, error = %err, "unlike failed, post unchanged");
                    Err(err)
                }
            },
            None => match self.api.like_post(post_id).await {
                Ok(like) => {
                    self.collection.update(post_id, |p| {
                        p.like_id = Some(like.id);
                        p.likes_count += 1;
                    });
                    Ok(())
                }
                Err(err) => {
                    warn!(post_id, error = %err, "like failed, post unchanged");
                    Err(err)
                }
            },
        }
    }

    // ── Search ──────────────────────────────────────────────────────

    pub fn set_search_query(&self, query: impl Into<String>) {
        self.inner.lock().unwrap().query = query.into();
    }

    /// Reset the query. Recomputes the projection from the already
    /// fetched set; no refetch.
    pub fn clear_filters(&self) {
        self.inner.lock().unwrap().query.clear();
    }

    // ── Errors ──────────────────────────────────────────────────────

    pub fn dismiss_error(&self) {
        let mut inner = self.inner.lock().unwrap();
        if matches!(inner.state, PostFeedState::Error(_)) {
            inner.state = PostFeedState::Idle;
        }
    }

    fn set_state(&self, state: PostFeedState) {
        self.inner.lock().unwrap().state = state;
    }
}
