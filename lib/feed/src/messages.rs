//! Circle chat feed controller.
//!
//! Drives one circle's message list: initial load, scroll-back
//! pagination, draft submit (create or edit), and two-step delete. The
//! view layer calls the transition methods and renders the snapshots;
//! it never talks to the API directly.
//!
//! Mutations reconcile by refetching the first page instead of patching
//! locally. Ordering and derived fields are server-authoritative, and a
//! refetch is cheaper than predicting them.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mingle_client::{ApiClient, ApiError, Message, Page};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::collection::{FeedItem, PageSource, PagedCollection};

impl FeedItem for Message {
    fn item_id(&self) -> &str {
        &self.id
    }
}

/// Pages for one circle's messages.
struct MessageSource {
    api: ApiClient,
    circle_id: String,
}

#[async_trait]
impl PageSource<Message> for MessageSource {
    async fn first_page(&self) -> Result<Page<Message>, ApiError> {
        self.api.circle_messages(&self.circle_id).await
    }

    async fn page_at(&self, cursor: &str) -> Result<Page<Message>, ApiError> {
        self.api.page(cursor).await
    }
}

/// Visible state of the message feed.
///
/// `Loading` covers the initial fetch only; everything after lives in
/// the ready sub-states. `Error` keeps previously loaded messages
/// visible until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageFeedState {
    Loading,
    Idle,
    Editing(String),
    ConfirmingDelete(String),
    Error(String),
}

/// Draft text plus the edit target, if any.
///
/// A set `editing_target` turns the next submit into an update of that
/// message instead of a create. The text is repopulated from the target
/// when editing begins and cleared when it ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftState {
    pub editing_target: Option<String>,
    pub text: String,
}

struct FeedInner {
    state: MessageFeedState,
    draft: DraftState,
}

/// Controller for one circle's chat.
///
/// Clones share state; hand a clone to a spawned task and the feed
/// everywhere sees the result.
#[derive(Clone)]
pub struct MessageFeed {
    api: ApiClient,
    circle_id: String,
    collection: PagedCollection<Message>,
    inner: Arc<Mutex<FeedInner>>,
    changed: Arc<watch::Sender<u64>>,
}

impl MessageFeed {
    pub fn new(api: ApiClient, circle_id: impl Into<String>) -> Self {
        let circle_id = circle_id.into();
        let source = MessageSource { api: api.clone(), circle_id: circle_id.clone() };
        let (changed, _) = watch::channel(0);
        Self {
            api,
            circle_id,
            collection: PagedCollection::new(Arc::new(source)),
            inner: Arc::new(Mutex::new(FeedInner {
                state: MessageFeedState::Loading,
                draft: DraftState::default(),
            })),
            changed: Arc::new(changed),
        }
    }

    pub fn circle_id(&self) -> &str {
        &self.circle_id
    }

    // ── Snapshots for the view ──────────────────────────────────────

    pub fn state(&self) -> MessageFeedState {
        self.inner.lock().unwrap().state.clone()
    }

    pub fn draft(&self) -> DraftState {
        self.inner.lock().unwrap().draft.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.collection.items()
    }

    pub fn has_more(&self) -> bool {
        self.collection.has_more()
    }

    /// Counter bumped after every change to the message list. The view
    /// watches it to scroll to the newest message.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changed.subscribe()
    }

    // ── Loading ─────────────────────────────────────────────────────

    pub async fn load_first_page(&self) -> Result<(), ApiError> {
        self.set_state(MessageFeedState::Loading);
        match self.collection.load_first_page().await {
            Ok(()) => {
                self.set_state(MessageFeedState::Idle);
                self.notify_changed();
                Ok(())
            }
            Err(err) => {
                self.set_state(MessageFeedState::Error(err.user_message()));
                Err(err)
            }
        }
    }

    /// Scroll-back pagination. Failures surface as an error state but
    /// already loaded messages stay visible.
    pub async fn load_next_page(&self) -> Result<bool, ApiError> {
        match self.collection.load_next_page().await {
            Ok(true) => {
                self.notify_changed();
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(err) => {
                self.set_state(MessageFeedState::Error(err.user_message()));
                Err(err)
            }
        }
    }

    // ── Draft & edit ────────────────────────────────────────────────

    pub fn set_draft_text(&self, text: impl Into<String>) {
        self.inner.lock().unwrap().draft.text = text.into();
    }

    /// Enter edit mode for a message, repopulating the draft from its
    /// current content.
    pub fn begin_edit(&self, id: &str) {
        let Some(message) = self.collection.get(id) else {
            warn!(id, "edit requested for unknown message");
            return;
        };
        let mut inner = self.inner.lock().unwrap();
        inner.draft = DraftState { editing_target: Some(id.to_string()), text: message.content };
        inner.state = MessageFeedState::Editing(id.to_string());
    }

    pub fn cancel_edit(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.draft = DraftState::default();
        inner.state = MessageFeedState::Idle;
    }

    /// Submit the draft: an update when an edit target is set, a create
    /// otherwise. Success clears the draft and reconciles the first
    /// page. Failure keeps the draft (and its edit target) so nothing
    /// typed is ever silently discarded.
    pub async fn submit_draft(&self) -> Result<(), ApiError> {
        let (target, text) = {
            let inner = self.inner.lock().unwrap();
            (inner.draft.editing_target.clone(), inner.draft.text.clone())
        };

        if text.trim().is_empty() {
            let err = ApiError::Validation("Cannot send blank messages".into());
            self.set_state(MessageFeedState::Error(err.user_message()));
            return Err(err);
        }

        let sent = match &target {
            Some(id) => self.api.update_message(id, &text).await.map(|_| ()),
            None => self.api.send_message(&self.circle_id, &text).await.map(|_| ()),
        };

        match sent {
            Ok(()) => {
                self.inner.lock().unwrap().draft = DraftState::default();
                match self.collection.replace_first_page().await {
                    Ok(()) => {
                        self.set_state(MessageFeedState::Idle);
                        self.notify_changed();
                        Ok(())
                    }
                    Err(err) => {
                        // The mutation landed; only the refetch failed.
                        self.set_state(MessageFeedState::Error(err.user_message()));
                        Err(err)
                    }
                }
            }
            Err(err) => {
                self.set_state(MessageFeedState::Error(err.user_message()));
                Err(err)
            }
        }
    }

    // ── Delete ──────────────────────────────────────────────────────

    /// Ask for confirmation before deleting.
    pub fn request_delete(&self, id: &str) {
        if self.collection.get(id).is_none() {
            warn!(id, "delete requested for unknown message");
            return;
        }
        self.set_state(MessageFeedState::ConfirmingDelete(id.to_string()));
    }

    pub fn cancel_delete(&self) {
        let mut inner = self.inner.lock().unwrap();
        if matches!(inner.state, MessageFeedState::ConfirmingDelete(_)) {
            inner.state = MessageFeedState::Idle;
        }
    }

    /// Issue the pending delete. Success removes the message locally,
    /// no refetch; failure leaves it in place.
    pub async fn confirm_delete(&self) -> Result<(), ApiError> {
        let id = {
            let inner = self.inner.lock().unwrap();
            match &inner.state {
                MessageFeedState::ConfirmingDelete(id) => id.clone(),
                other => {
                    debug!(state = ?other, "confirm_delete outside of confirmation");
                    return Ok(());
                }
            }
        };

        match self.api.delete_message(&id).await {
            Ok(()) => {
                self.collection.remove(&id);
                self.set_state(MessageFeedState::Idle);
                self.notify_changed();
                Ok(())
            }
            Err(err) => {
                self.set_state(MessageFeedState::Error(err.user_message()));
                Err(err)
            }
        }
    }

    // ── Errors ──────────────────────────────────────────────────────

    /// Acknowledge the error and return to idle. Loaded messages, and
    /// any draft, are retained.
    pub fn dismiss_error(&self) {
        let mut inner = self.inner.lock().unwrap();
        if matches!(inner.state, MessageFeedState::Error(_)) {
            inner.state = MessageFeedState::Idle;
        }
    }

    fn set_state(&self, state: MessageFeedState) {
        self.inner.lock().unwrap().state = state;
    }

    fn notify_changed(&self) {
        self.changed.send_modify(|n| *n = n.wrapping_add(1));
    }
}
