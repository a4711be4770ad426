//! Command implementations.

pub mod chat;
pub mod context;
pub mod login;
pub mod messages;
pub mod posts;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use mingle_client::{ApiClient, ApiError, HttpTransport, SessionStore};

use crate::config::{ClientConfig, Context};

/// Build an API client for a context, seeding the pipeline with the
/// stored credential.
pub async fn client_for(ctx: &Context) -> Result<ApiClient> {
    if ctx.server.is_empty() {
        anyhow::bail!(
            "No server URL set for context \"{}\". Run `mingle context add {} --server <url>`.",
            ctx.name,
            ctx.name
        );
    }
    let api = ApiClient::new(&ctx.server, Arc::new(HttpTransport::new()), SessionStore::new());
    if !ctx.token.is_empty() {
        api.pipeline().set_token(ctx.token.clone()).await;
    }
    Ok(api)
}

/// Resolve the current context and connect, restoring the session from
/// the stored credential when it is still valid.
pub async fn connect(config_path: &Path) -> Result<ApiClient> {
    let config = ClientConfig::load(config_path)?;
    let ctx = config
        .current()
        .ok_or_else(|| anyhow::anyhow!("No current context. Run `mingle use context <name>`."))?;
    let api = client_for(ctx).await?;
    if !ctx.token.is_empty() {
        api.bootstrap_session().await;
    }
    Ok(api)
}

/// Turn an API error into the message shown to the user.
pub fn user_error(err: ApiError) -> anyhow::Error {
    anyhow::anyhow!("{}", err.user_message())
}
