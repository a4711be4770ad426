//! Session-aware request pipeline.
//!
//! Every outbound domain call flows through [`SessionPipeline::send`],
//! which attaches the bearer credential, refreshes it around the call,
//! and retries exactly once on 401. Call sites never see any of this;
//! they build a plain [`Request`] and get the final [`Response`].
//!
//! Refresh policy:
//! - before each domain call the credential is refreshed best-effort; a
//!   failure here signs the session out but the call still proceeds
//! - a 401 response triggers exactly one more refresh; on success the
//!   original request is re-issued once and that result is returned
//!   as-is, on failure the session is signed out and the original 401
//!   is surfaced
//!
//! A failed refresh is the single forced-sign-out trigger in the whole
//! client; nothing else polls session validity.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{extract_message, ApiError};
use crate::session::SessionStore;
use crate::transport::{Request, Response, Transport};

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
}

/// Decorator over a [`Transport`], composed once at the boundary and
/// shared by every call site.
pub struct SessionPipeline {
    transport: Arc<dyn Transport>,
    session: SessionStore,
    refresh_url: String,
    token: RwLock<Option<String>>,
}

impl SessionPipeline {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        session: SessionStore,
    ) -> Self {
        let base = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            session,
            refresh_url: format!("{}/auth/refresh", base),
            token: RwLock::new(None),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Current bearer credential. The CLI persists this across runs.
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }

    /// Send a domain request with the full session treatment.
    pub async fn send(&self, req: Request) -> Result<Response, ApiError> {
        // Keep the credential fresh before spending the call. Failure is
        // the forced-sign-out signal but never aborts the caller's
        // request.
        if let Err(err) = self.refresh().await {
            if self.session.is_signed_in() {
                warn!(error = %err, "credential refresh failed, signing out");
            } else {
                debug!(error = %err, "credential refresh failed (anonymous)");
            }
            self.session.clear();
        }

        let resp = self.issue(req.clone()).await?;
        if resp.status != 401 {
            return Ok(resp);
        }

        // One reactive recovery, never more.
        debug!(url = %req.url, "401 response, refreshing and retrying once");
        match self.refresh().await {
            Ok(()) => self.issue(req).await,
            Err(err) => {
                warn!(error = %err, "refresh after 401 failed, signing out");
                self.session.clear();
                Ok(resp)
            }
        }
    }

    /// Send without the refresh wrapper. Used for the credential
    /// endpoints themselves (login, logout).
    pub async fn send_raw(&self, req: Request) -> Result<Response, ApiError> {
        self.issue(req).await
    }

    async fn issue(&self, mut req: Request) -> Result<Response, ApiError> {
        req.bearer = self.token.read().await.clone();
        self.transport.execute(req).await
    }

    /// POST the refresh endpoint with the current credential; replace
    /// the cached bearer on success. Goes straight to the inner
    /// transport, never back through `send`.
    async fn refresh(&self) -> Result<(), ApiError> {
        let bearer = self.token.read().await.clone();
        let req = Request::post(self.refresh_url.clone()).bearer(bearer);
        let resp = self.transport.execute(req).await?;
        if !resp.ok() {
            return Err(ApiError::Auth(extract_message(resp.status, &resp.body)));
        }
        let parsed: RefreshResponse = serde_json::from_str(&resp.body)
            .map_err(|e| ApiError::Decode(format!("refresh response: {}", e)))?;
        *self.token.write().await = Some(parsed.access_token);
        Ok(())
    }
}
