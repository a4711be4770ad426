//! Scripted transport shared by the controller tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mingle_client::{ApiClient, ApiError, Request, Response, SessionStore, Transport};

/// Transport double with a canned script.
///
/// Refresh calls always succeed (and are counted separately), so the
/// pipeline's pre-call refresh never interferes with a controller test.
/// Every other request is recorded and answered with the next scripted
/// response.
pub(crate) struct StubTransport {
    script: Mutex<VecDeque<Response>>,
    domain: Mutex<Vec<Request>>,
    pub(crate) refresh_calls: AtomicUsize,
}

impl StubTransport {
    pub(crate) fn new(script: Vec<Response>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            domain: Mutex::new(Vec::new()),
            refresh_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn push(&self, resp: Response) {
        self.script.lock().unwrap().push_back(resp);
    }

    /// Requests seen so far, refreshes excluded.
    pub(crate) fn domain_requests(&self) -> Vec<Request> {
        self.domain.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn execute(&self, req: Request) -> Result<Response, ApiError> {
        if req.url.ends_with("/auth/refresh") {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            return Ok(Response { status: 200, body: r#"{"access_token":"fresh"}"#.into() });
        }
        self.domain.lock().unwrap().push(req);
        let resp = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Response { status: 599, body: "unscripted request".into() });
        Ok(resp)
    }
}

pub(crate) fn api_with(script: Vec<Response>) -> (ApiClient, Arc<StubTransport>) {
    let transport = Arc::new(StubTransport::new(script));
    let api = ApiClient::new("http://api.test", transport.clone(), SessionStore::new());
    (api, transport)
}

pub(crate) fn page_resp(items: Vec<serde_json::Value>, next: Option<&str>) -> Response {
    Response {
        status: 200,
        body: serde_json::json!({ "results": items, "next": next }).to_string(),
    }
}

pub(crate) fn json_resp(status: u16, body: serde_json::Value) -> Response {
    Response { status, body: body.to_string() }
}

pub(crate) fn error_resp(status: u16, detail: &str) -> Response {
    json_resp(status, serde_json::json!({ "detail": detail }))
}

pub(crate) fn no_content() -> Response {
    Response { status: 204, body: String::new() }
}
