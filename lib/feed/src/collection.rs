//! Generic cursor-paginated collection.
//!
//! Holds an ordered, id-unique item list plus the opaque `next` cursor.
//! Pages merge by id: an item seen again is updated in place (the most
//! recently fetched content wins, the first-seen position is kept),
//! unseen items append in arrival order. Overlapping loads never
//! corrupt the list; completion order decides, and a page that arrives
//! after the collection was replaced is discarded.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mingle_client::{ApiError, Page};
use tracing::debug;

/// Anything a paginated collection can hold.
pub trait FeedItem: Clone + Send + Sync + 'static {
    fn item_id(&self) -> &str;
}

/// Where pages come from. Injected at construction so collection logic
/// is testable without a network.
#[async_trait]
pub trait PageSource<T>: Send + Sync + 'static {
    async fn first_page(&self) -> Result<Page<T>, ApiError>;

    /// Fetch the page at an opaque cursor, verbatim.
    async fn page_at(&self, cursor: &str) -> Result<Page<T>, ApiError>;
}

struct CollectionState<T> {
    items: Vec<T>,
    cursor: Option<String>,
    /// Bumped on every wholesale replacement; a page fetched under an
    /// older generation is stale and must not be applied.
    generation: u64,
    next_in_flight: bool,
    loaded: bool,
}

/// Cursor-paginated, id-unique item collection.
///
/// Clones share state, so a clone can be moved into a spawned task and
/// the results show up everywhere.
pub struct PagedCollection<T: FeedItem> {
    source: Arc<dyn PageSource<T>>,
    state: Arc<Mutex<CollectionState<T>>>,
}

impl<T: FeedItem> Clone for PagedCollection<T> {
    fn clone(&self) -> Self {
        Self { source: self.source.clone(), state: self.state.clone() }
    }
}

impl<T: FeedItem> PagedCollection<T> {
    pub fn new(source: Arc<dyn PageSource<T>>) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(CollectionState {
                items: Vec::new(),
                cursor: None,
                generation: 0,
                next_in_flight: false,
                loaded: false,
            })),
        }
    }

    /// Fetch the first page and replace the collection with it. Also
    /// marks the collection loaded when the page is empty, so "no items
    /// yet" and "zero items" stay distinguishable.
    pub async fn load_first_page(&self) -> Result<(), ApiError> {
        self.reload().await
    }

    /// Wholesale replacement after a mutation. Pages loaded beyond the
    /// first are discarded; deeper pagination state does not survive a
    /// reconciliation.
    pub async fn replace_first_page(&self) -> Result<(), ApiError> {
        self.reload().await
    }

    async fn reload(&self) -> Result<(), ApiError> {
        let page = self.source.first_page().await?;
        let mut st = self.state.lock().unwrap();
        st.generation += 1;
        st.items.clear();
        st.cursor = None;
        merge(&mut st, page);
        st.loaded = true;
        Ok(())
    }

    /// Fetch and merge the page at the current cursor.
    ///
    /// Returns `Ok(false)` without fetching when there is no cursor or
    /// another next-page load is already in flight (overlapping calls
    /// are ignored, not queued). A page that resolves after the
    /// collection was replaced is dropped.
    pub async fn load_next_page(&self) -> Result<bool, ApiError> {
        let (cursor, generation) = {
            let mut st = self.state.lock().unwrap();
            if st.next_in_flight {
                return Ok(false);
            }
            let Some(cursor) = st.cursor.clone() else {
                return Ok(false);
            };
            st.next_in_flight = true;
            (cursor, st.generation)
        };

        let result = self.source.page_at(&cursor).await;

        let mut st = self.state.lock().unwrap();
        st.next_in_flight = false;
        if st.generation != generation {
            debug!(cursor, "discarding stale page, collection was replaced");
            return Ok(false);
        }
        merge(&mut st, result?);
        Ok(true)
    }

    /// Drop the item with this id. Returns whether it was present.
    pub fn remove(&self, id: &str) -> bool {
        let mut st = self.state.lock().unwrap();
        let before = st.items.len();
        st.items.retain(|item| item.item_id() != id);
        st.items.len() < before
    }

    /// Mutate the item with this id in place. Returns whether it was
    /// found.
    pub fn update(&self, id: &str, f: impl FnOnce(&mut T)) -> bool {
        let mut st = self.state.lock().unwrap();
        match st.items.iter_mut().find(|item| item.item_id() == id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<T> {
        let st = self.state.lock().unwrap();
        st.items.iter().find(|item| item.item_id() == id).cloned()
    }

    /// Snapshot of the items in display order.
    pub fn items(&self) -> Vec<T> {
        self.state.lock().unwrap().items.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().unwrap().items.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.state.lock().unwrap().cursor.is_some()
    }

    /// Whether a first page has ever been applied.
    pub fn is_loaded(&self) -> bool {
        self.state.lock().unwrap().loaded
    }

    pub fn cursor(&self) -> Option<String> {
        self.state.lock().unwrap().cursor.clone()
    }
}

fn merge<T: FeedItem>(st: &mut CollectionState<T>, page: Page<T>) {
    for incoming in page.results {
        match st.items.iter_mut().find(|item| item.item_id() == incoming.item_id()) {
            Some(existing) => *existing = incoming,
            None => st.items.push(incoming),
        }
    }
    st.cursor = page.next;
}
