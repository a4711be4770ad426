//! HTTP client core for the Mingle social API.
//!
//! [`ApiClient`] is the typed endpoint surface. Every domain call flows
//! through a [`SessionPipeline`], which attaches the bearer credential,
//! keeps it fresh around the call, and retries exactly once on 401. The
//! signed-in identity lives in a [`SessionStore`] cloned into every
//! component that needs it.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use mingle_client::{ApiClient, HttpTransport, SessionStore};
//!
//! let session = SessionStore::new();
//! let api = ApiClient::new("http://localhost:8080", Arc::new(HttpTransport::new()), session);
//! let me = api.login("alice", "secret").await?;
//! ```

pub mod api;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod session;
pub mod transport;

pub use api::ApiClient;
pub use error::ApiError;
pub use model::{Identity, Like, Message, Page, Post};
pub use pipeline::SessionPipeline;
pub use session::SessionStore;
pub use transport::{HttpTransport, Method, Request, Response, Transport};
