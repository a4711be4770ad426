use serde::{Deserialize, Serialize};

/// A post as seen by the current viewer.
///
/// `like_id` is present exactly when the signed-in account has liked the
/// post; it and `likes_count` always change together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub owner_id: String,
    pub owner_name: String,
    #[serde(default)]
    pub like_id: Option<String>,
    pub likes_count: u32,
    pub created_at: String,
}

impl Post {
    pub fn liked(&self) -> bool {
        self.like_id.is_some()
    }
}

/// Canonical body returned by `POST /likes`. The generated `id` is what
/// a later unlike deletes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub id: String,
    pub post_id: String,
}
