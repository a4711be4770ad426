use serde::{Deserialize, Serialize};

/// A chat message inside one interest circle.
///
/// Content is the only field the owner may edit; everything else is
/// server-assigned. `timestamp` is an RFC 3339 string owned by the
/// server and treated as opaque here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub owner_id: String,
    pub owner_username: String,
    pub content: String,
    pub timestamp: String,
    pub circle_id: String,
}
