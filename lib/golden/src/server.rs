//! In-memory social server the golden tests run against.
//!
//! Speaks the same wire contract as the production API: bearer auth
//! with rotating refresh tokens, cursor pagination via absolute `next`
//! URLs, and `{"detail": ...}` error bodies. Fault switches let a test
//! force the next domain call to fail, or revoke refresh entirely, so
//! the pipeline's recovery paths are reachable deterministically.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

type Shared = Arc<Mutex<SocialState>>;

#[derive(Clone)]
struct UserRecord {
    id: String,
    username: String,
    password: String,
    display_name: String,
}

#[derive(Clone)]
struct MessageRecord {
    id: String,
    owner_id: String,
    owner_username: String,
    content: String,
    timestamp: String,
    circle_id: String,
}

#[derive(Clone)]
struct PostRecord {
    id: String,
    title: String,
    owner_id: String,
    owner_name: String,
    /// Base count standing in for likes by users the test never seeds.
    seed_likes: u32,
    created_at: String,
}

#[derive(Clone)]
struct LikeRecord {
    id: String,
    user_id: String,
    post_id: String,
}

#[derive(Default)]
struct SocialState {
    base_url: String,
    page_size: usize,
    users: Vec<UserRecord>,
    tokens: HashMap<String, String>,
    /// Per circle, newest first.
    messages: HashMap<String, Vec<MessageRecord>>,
    posts: Vec<PostRecord>,
    likes: Vec<LikeRecord>,
    refresh_disabled: bool,
    fail_next_unauthorized: bool,
    fail_next_server_error: bool,
    refresh_count: u64,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string().replace('-', "")
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(String::from)
}

fn viewer(st: &SocialState, headers: &HeaderMap) -> Option<UserRecord> {
    let token = bearer(headers)?;
    let user_id = st.tokens.get(&token)?;
    st.users.iter().find(|u| &u.id == user_id).cloned()
}

fn error_body(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

fn unauthorized() -> Response {
    error_body(StatusCode::UNAUTHORIZED, "Token invalid or expired")
}

/// Gate for domain handlers: applies pending fault switches, then
/// resolves the viewer from the bearer token.
fn admit(st: &mut SocialState, headers: &HeaderMap) -> Result<UserRecord, Response> {
    if st.fail_next_unauthorized {
        st.fail_next_unauthorized = false;
        return Err(error_body(StatusCode::UNAUTHORIZED, "Token expired"));
    }
    if st.fail_next_server_error {
        st.fail_next_server_error = false;
        return Err(error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal error"));
    }
    viewer(st, headers).ok_or_else(unauthorized)
}

fn message_json(m: &MessageRecord) -> Value {
    json!({
        "id": m.id,
        "owner_id": m.owner_id,
        "owner_username": m.owner_username,
        "content": m.content,
        "timestamp": m.timestamp,
        "circle_id": m.circle_id,
    })
}

fn post_json(st: &SocialState, viewer_id: &str, p: &PostRecord) -> Value {
    let likes: Vec<&LikeRecord> = st.likes.iter().filter(|l| l.post_id == p.id).collect();
    let like_id = likes.iter().find(|l| l.user_id == viewer_id).map(|l| l.id.clone());
    json!({
        "id": p.id,
        "title": p.title,
        "owner_id": p.owner_id,
        "owner_name": p.owner_name,
        "like_id": like_id,
        "likes_count": p.seed_likes + likes.len() as u32,
        "created_at": p.created_at,
    })
}

/// Cut one page out of the full item list and point `next` at the
/// following offset, as an absolute URL.
fn page_json(st: &SocialState, path: &str, items: Vec<Value>, cursor: Option<usize>) -> Value {
    let offset = cursor.unwrap_or(0).min(items.len());
    let end = (offset + st.page_size).min(items.len());
    let next = (end < items.len()).then(|| format!("{}{}?cursor={}", st.base_url, path, end));
    json!({ "results": items[offset..end].to_vec(), "next": next })
}

#[derive(Deserialize)]
struct Cursor {
    cursor: Option<usize>,
}

// ── Auth endpoints ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(State(state): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    let mut st = state.lock().unwrap();
    let found = st
        .users
        .iter()
        .find(|u| u.username == body.username && u.password == body.password)
        .cloned();
    let Some(user) = found else {
        return error_body(StatusCode::UNAUTHORIZED, "Invalid username or password");
    };
    let token = new_id();
    st.tokens.insert(token.clone(), user.id);
    (
        StatusCode::OK,
        Json(json!({ "access_token": token, "token_type": "Bearer", "expires_in": 3600 })),
    )
        .into_response()
}

async fn refresh(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut st = state.lock().unwrap();
    st.refresh_count += 1;
    if st.refresh_disabled {
        return error_body(StatusCode::UNAUTHORIZED, "Refresh token revoked");
    }
    let Some(user) = viewer(&st, &headers) else {
        return unauthorized();
    };
    // Rotate: mint a fresh token; older ones stay valid until revoked.
    let token = new_id();
    st.tokens.insert(token.clone(), user.id);
    (StatusCode::OK, Json(json!({ "access_token": token, "expires_in": 3600 }))).into_response()
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut st = state.lock().unwrap();
    if let Some(token) = bearer(&headers) {
        st.tokens.remove(&token);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut st = state.lock().unwrap();
    let user = match admit(&mut st, &headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    (
        StatusCode::OK,
        Json(json!({ "id": user.id, "username": user.username, "display_name": user.display_name })),
    )
        .into_response()
}

// ── Circle messages ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct MessageBody {
    content: String,
}

async fn list_messages(
    State(state): State<Shared>,
    Path(circle_id): Path<String>,
    Query(q): Query<Cursor>,
    headers: HeaderMap,
) -> Response {
    let mut st = state.lock().unwrap();
    if let Err(resp) = admit(&mut st, &headers) {
        return resp;
    }
    let items: Vec<Value> = st
        .messages
        .get(&circle_id)
        .map(|msgs| msgs.iter().map(message_json).collect())
        .unwrap_or_default();
    let path = format!("/circles/{}/messages", circle_id);
    (StatusCode::OK, Json(page_json(&st, &path, items, q.cursor))).into_response()
}

async fn create_message(
    State(state): State<Shared>,
    Path(circle_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<MessageBody>,
) -> Response {
    let mut st = state.lock().unwrap();
    let user = match admit(&mut st, &headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if body.content.trim().is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "Content cannot be blank");
    }
    let record = MessageRecord {
        id: new_id(),
        owner_id: user.id,
        owner_username: user.username,
        content: body.content,
        timestamp: chrono::Utc::now().to_rfc3339(),
        circle_id: circle_id.clone(),
    };
    let out = message_json(&record);
    st.messages.entry(circle_id).or_default().insert(0, record);
    (StatusCode::CREATED, Json(out)).into_response()
}

async fn update_message(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<MessageBody>,
) -> Response {
    let mut st = state.lock().unwrap();
    let user = match admit(&mut st, &headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if body.content.trim().is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "Content cannot be blank");
    }
    for msgs in st.messages.values_mut() {
        if let Some(m) = msgs.iter_mut().find(|m| m.id == id) {
            if m.owner_id != user.id {
                return error_body(StatusCode::FORBIDDEN, "Only the owner can edit a message");
            }
            m.content = body.content;
            let out = message_json(m);
            return (StatusCode::OK, Json(out)).into_response();
        }
    }
    error_body(StatusCode::NOT_FOUND, "Message not found")
}

async fn delete_message(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut st = state.lock().unwrap();
    let user = match admit(&mut st, &headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    for msgs in st.messages.values_mut() {
        let Some(pos) = msgs.iter().position(|m| m.id == id) else {
            continue;
        };
        if msgs[pos].owner_id != user.id {
            return error_body(StatusCode::FORBIDDEN, "Only the owner can delete a message");
        }
        msgs.remove(pos);
        return StatusCode::NO_CONTENT.into_response();
    }
    error_body(StatusCode::NOT_FOUND, "Message not found")
}

// ── Posts & likes ───────────────────────────────────────────────────

async fn list_posts(
    State(state): State<Shared>,
    Query(q): Query<Cursor>,
    headers: HeaderMap,
) -> Response {
    let mut st = state.lock().unwrap();
    let user = match admit(&mut st, &headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let items: Vec<Value> = st.posts.iter().map(|p| post_json(&st, &user.id, p)).collect();
    (StatusCode::OK, Json(page_json(&st, "/posts", items, q.cursor))).into_response()
}

#[derive(Deserialize)]
struct LikeBody {
    post_id: String,
}

async fn create_like(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<LikeBody>,
) -> Response {
    let mut st = state.lock().unwrap();
    let user = match admit(&mut st, &headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if !st.posts.iter().any(|p| p.id == body.post_id) {
        return error_body(StatusCode::NOT_FOUND, "Post not found");
    }
    // Liking twice returns the existing record instead of duplicating.
    if let Some(existing) =
        st.likes.iter().find(|l| l.user_id == user.id && l.post_id == body.post_id)
    {
        return (
            StatusCode::OK,
            Json(json!({ "id": existing.id, "post_id": existing.post_id })),
        )
            .into_response();
    }
    let like = LikeRecord { id: new_id(), user_id: user.id, post_id: body.post_id };
    let out = json!({ "id": like.id, "post_id": like.post_id });
    st.likes.push(like);
    (StatusCode::CREATED, Json(out)).into_response()
}

async fn delete_like(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut st = state.lock().unwrap();
    let user = match admit(&mut st, &headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let before = st.likes.len();
    st.likes.retain(|l| !(l.id == id && l.user_id == user.id));
    if st.likes.len() < before {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_body(StatusCode::NOT_FOUND, "Like not found")
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/circles/{circle_id}/messages", get(list_messages).post(create_message))
        .route("/messages/{id}", put(update_message).delete(delete_message))
        .route("/posts", get(list_posts))
        .route("/likes", post(create_like))
        .route("/likes/{id}", delete(delete_like))
        .with_state(state)
}

/// Handle for a running test server.
pub(crate) struct SocialServer {
    pub(crate) base_url: String,
    state: Shared,
}

impl SocialServer {
    pub(crate) async fn start() -> Self {
        Self::start_with_page_size(20).await
    }

    pub(crate) async fn start_with_page_size(page_size: usize) -> Self {
        let state: Shared =
            Arc::new(Mutex::new(SocialState { page_size, ..Default::default() }));
        let app = router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);
        state.lock().unwrap().base_url = base_url.clone();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for the server to accept connections.
        let probe = reqwest::Client::new();
        for _ in 0..50 {
            if probe.get(format!("{}/auth/login", base_url)).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        }

        Self { base_url, state }
    }

    // ── Seeding ─────────────────────────────────────────────────────

    pub(crate) fn seed_user(&self, username: &str, password: &str, display_name: &str) -> String {
        let mut st = self.state.lock().unwrap();
        let user = UserRecord {
            id: new_id(),
            username: username.into(),
            password: password.into(),
            display_name: display_name.into(),
        };
        let id = user.id.clone();
        st.users.push(user);
        id
    }

    pub(crate) fn seed_message(&self, circle_id: &str, owner: &str, content: &str) -> String {
        let mut st = self.state.lock().unwrap();
        let user = st
            .users
            .iter()
            .find(|u| u.username == owner)
            .expect("seed_message: user not seeded")
            .clone();
        let record = MessageRecord {
            id: new_id(),
            owner_id: user.id,
            owner_username: user.username,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            circle_id: circle_id.into(),
        };
        let id = record.id.clone();
        st.messages.entry(circle_id.to_string()).or_default().insert(0, record);
        id
    }

    pub(crate) fn seed_post(&self, title: &str, owner: &str, seed_likes: u32) -> String {
        let mut st = self.state.lock().unwrap();
        let user = st
            .users
            .iter()
            .find(|u| u.username == owner)
            .expect("seed_post: user not seeded")
            .clone();
        let post = PostRecord {
            id: new_id(),
            title: title.into(),
            owner_id: user.id,
            owner_name: user.display_name,
            seed_likes,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let id = post.id.clone();
        st.posts.push(post);
        id
    }

    // ── Fault switches ──────────────────────────────────────────────

    /// Invalidate every issued token. Refresh still works for nobody,
    /// since no bearer is recognized anymore.
    pub(crate) fn expire_tokens(&self) {
        self.state.lock().unwrap().tokens.clear();
    }

    /// Make refresh fail from now on, leaving issued tokens valid.
    pub(crate) fn disable_refresh(&self) {
        self.state.lock().unwrap().refresh_disabled = true;
    }

    /// The next domain call answers 401 regardless of its token.
    pub(crate) fn fail_next_unauthorized(&self) {
        self.state.lock().unwrap().fail_next_unauthorized = true;
    }

    /// The next domain call answers 500.
    pub(crate) fn fail_next_server_error(&self) {
        self.state.lock().unwrap().fail_next_server_error = true;
    }

    // ── Observability ───────────────────────────────────────────────

    pub(crate) fn refresh_count(&self) -> u64 {
        self.state.lock().unwrap().refresh_count
    }

    /// Server-side message contents for a circle, newest first.
    pub(crate) fn message_contents(&self, circle_id: &str) -> Vec<String> {
        let st = self.state.lock().unwrap();
        st.messages
            .get(circle_id)
            .map(|msgs| msgs.iter().map(|m| m.content.clone()).collect())
            .unwrap_or_default()
    }

    /// Server-side like total for a post, seeded base included.
    pub(crate) fn like_count(&self, post_id: &str) -> u32 {
        let st = self.state.lock().unwrap();
        let seeded = st.posts.iter().find(|p| p.id == post_id).map_or(0, |p| p.seed_likes);
        seeded + st.likes.iter().filter(|l| l.post_id == post_id).count() as u32
    }
}
