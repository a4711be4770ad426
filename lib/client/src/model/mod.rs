//! Wire models for the Mingle API.

mod identity;
mod message;
mod post;

pub use identity::Identity;
pub use message::Message;
pub use post::{Like, Post};

use serde::{Deserialize, Serialize};

/// One page of a cursor-paginated collection.
///
/// `next` is an opaque absolute URL; clients follow it verbatim rather
/// than constructing query parameters themselves. `None` means end of
/// data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub next: Option<String>,
}

impl<T> Page<T> {
    /// A terminal empty page.
    pub fn empty() -> Self {
        Self { results: Vec::new(), next: None }
    }
}
