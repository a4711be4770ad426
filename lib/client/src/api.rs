//! Typed endpoint surface of the Mingle API.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{extract_message, ApiError};
use crate::model::{Identity, Like, Message, Page, Post};
use crate::pipeline::SessionPipeline;
use crate::session::SessionStore;
use crate::transport::{Request, Response, Transport};

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    #[allow(dead_code)]
    expires_in: u64,
}

/// Typed client for the social API.
///
/// Cheap to clone; all clones share one pipeline and one session store.
#[derive(Clone)]
pub struct ApiClient {
    pipeline: Arc<SessionPipeline>,
    base_url: String,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        session: SessionStore,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let pipeline = Arc::new(SessionPipeline::new(&base_url, transport, session));
        Self { pipeline, base_url }
    }

    pub fn session(&self) -> &SessionStore {
        self.pipeline.session()
    }

    pub fn pipeline(&self) -> &SessionPipeline {
        &self.pipeline
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Parse an API response, mapping HTTP errors to [`ApiError`].
    fn parse<R: DeserializeOwned>(resp: Response) -> Result<R, ApiError> {
        if resp.status == 401 {
            return Err(ApiError::Auth(extract_message(resp.status, &resp.body)));
        }
        if !resp.ok() {
            return Err(ApiError::Server {
                status: resp.status,
                message: extract_message(resp.status, &resp.body),
            });
        }
        serde_json::from_str(&resp.body)
            .map_err(|e| ApiError::Decode(format!("response body: {}", e)))
    }

    /// Like [`Self::parse`] but for endpoints that answer 204.
    fn ensure_ok(resp: Response) -> Result<(), ApiError> {
        if resp.status == 401 {
            return Err(ApiError::Auth(extract_message(resp.status, &resp.body)));
        }
        if !resp.ok() {
            return Err(ApiError::Server {
                status: resp.status,
                message: extract_message(resp.status, &resp.body),
            });
        }
        Ok(())
    }

    // ── Auth ────────────────────────────────────────────────────────

    /// Exchange credentials for a bearer token, then fetch the identity
    /// and seed the session store with it.
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, ApiError> {
        let req = Request::post(self.url("/auth/login")).json(serde_json::json!({
            "username": username,
            "password": password,
        }));
        let resp = self.pipeline.send_raw(req).await?;
        let login: LoginResponse = Self::parse(resp)?;
        self.pipeline.set_token(login.access_token).await;

        let identity = self.whoami().await?;
        self.session().set(Some(identity.clone()));
        Ok(identity)
    }

    /// Tell the server goodbye (best effort), then drop the credential
    /// and sign the session out locally.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let req = Request::post(self.url("/auth/logout"));
        match self.pipeline.send_raw(req).await {
            Ok(resp) if resp.ok() => {}
            Ok(resp) => debug!(status = resp.status, "logout rejected by server"),
            Err(err) => debug!(error = %err, "logout request failed"),
        }
        self.pipeline.clear_token().await;
        self.session().clear();
        Ok(())
    }

    /// Identity of the current credential.
    pub async fn whoami(&self) -> Result<Identity, ApiError> {
        let resp = self.pipeline.send(Request::get(self.url("/auth/me"))).await?;
        Self::parse(resp)
    }

    /// Seed the session store at startup. Failures leave it anonymous.
    pub async fn bootstrap_session(&self) -> Option<Identity> {
        match self.whoami().await {
            Ok(identity) => {
                self.session().set(Some(identity.clone()));
                Some(identity)
            }
            Err(err) => {
                debug!(error = %err, "session bootstrap failed, staying anonymous");
                None
            }
        }
    }

    // ── Circle messages ─────────────────────────────────────────────

    /// First page of a circle's messages, newest first.
    pub async fn circle_messages(&self, circle_id: &str) -> Result<Page<Message>, ApiError> {
        let url = self.url(&format!("/circles/{}/messages", circle_id));
        let resp = self.pipeline.send(Request::get(url)).await?;
        Self::parse(resp)
    }

    pub async fn send_message(&self, circle_id: &str, content: &str) -> Result<Message, ApiError> {
        let url = self.url(&format!("/circles/{}/messages", circle_id));
        let req = Request::post(url).json(serde_json::json!({ "content": content }));
        let resp = self.pipeline.send(req).await?;
        Self::parse(resp)
    }

    pub async fn update_message(&self, id: &str, content: &str) -> Result<Message, ApiError> {
        let url = self.url(&format!("/messages/{}", id));
        let req = Request::put(url).json(serde_json::json!({ "content": content }));
        let resp = self.pipeline.send(req).await?;
        Self::parse(resp)
    }

    pub async fn delete_message(&self, id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("/messages/{}", id));
        let resp = self.pipeline.send(Request::delete(url)).await?;
        Self::ensure_ok(resp)
    }

    // ── Posts & likes ───────────────────────────────────────────────

    /// First page of the post feed.
    pub async fn posts(&self) -> Result<Page<Post>, ApiError> {
        let resp = self.pipeline.send(Request::get(self.url("/posts"))).await?;
        Self::parse(resp)
    }

    /// Like a post. The returned record carries the generated like id,
    /// which is what a later [`Self::unlike`] deletes.
    pub async fn like_post(&self, post_id: &str) -> Result<Like, ApiError> {
        let req = Request::post(self.url("/likes")).json(serde_json::json!({ "post_id": post_id }));
        let resp = self.pipeline.send(req).await?;
        Self::parse(resp)
    }

    pub async fn unlike(&self, like_id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("/likes/{}", like_id));
        let resp = self.pipeline.send(Request::delete(url)).await?;
        Self::ensure_ok(resp)
    }

    // ── Pagination ──────────────────────────────────────────────────

    /// Fetch a page at an opaque `next` URL, verbatim.
    pub async fn page<T: DeserializeOwned>(&self, next_url: &str) -> Result<Page<T>, ApiError> {
        let resp = self.pipeline.send(Request::get(next_url)).await?;
        Self::parse(resp)
    }
}
