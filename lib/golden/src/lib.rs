//! Golden tests for the Mingle client stack.
//!
//! Each test runs the real stack end to end against an in-memory
//! social server over HTTP: session pipeline, typed API client, and
//! the feed controllers. If the wire contract or the refresh semantics
//! drift, these break first.

#[cfg(test)]
mod server;
