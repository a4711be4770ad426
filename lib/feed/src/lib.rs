//! Feed controllers for the Mingle client.
//!
//! [`PagedCollection`] is the generic cursor-paginated collection every
//! feed is built on: fetch, dedup-by-id merge, append. On top of it sit
//! the two domain controllers the views drive directly:
//! [`MessageFeed`] (circle chat with draft/edit/delete) and
//! [`PostFeed`] (like toggling and local search).

pub mod collection;
pub mod messages;
pub mod posts;

#[cfg(test)]
mod testing;

pub use collection::{FeedItem, PageSource, PagedCollection};
pub use messages::{DraftState, MessageFeed, MessageFeedState};
pub use posts::{PostFeed, PostFeedState};
