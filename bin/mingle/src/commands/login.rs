//! Login / logout / whoami commands.

use anyhow::Result;

use crate::config::ClientConfig;

/// Sign in to the current context's server and persist the credential.
pub async fn login(
    username: &str,
    password: &str,
    client_config_path: &std::path::Path,
) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    let ctx = config
        .current()
        .ok_or_else(|| anyhow::anyhow!("No current context. Run `mingle use context <name>`."))?
        .clone();

    let api = super::client_for(&ctx).await?;
    let identity = api
        .login(username, password)
        .await
        .map_err(|e| anyhow::anyhow!("Login failed: {}", e.user_message()))?;

    // Persist the credential so later invocations can restore the
    // session.
    let token = api.pipeline().token().await.unwrap_or_default();
    let ctx_mut = config
        .get_mut(&ctx.name)
        .ok_or_else(|| anyhow::anyhow!("Context disappeared"))?;
    ctx_mut.token = token;
    config.save(client_config_path)?;

    println!("Signed in as {}.", identity.label());
    println!("Credential saved to context \"{}\".", ctx.name);
    Ok(())
}

/// Sign out: tell the server, then clear the stored credential.
pub async fn logout(client_config_path: &std::path::Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    let current_name = config.current_context.clone();
    if current_name.is_empty() {
        anyhow::bail!("No current context.");
    }

    let ctx = config
        .current()
        .ok_or_else(|| anyhow::anyhow!("Current context not found."))?
        .clone();

    if !ctx.token.is_empty() {
        let api = super::client_for(&ctx).await?;
        if let Err(err) = api.logout().await {
            eprintln!("Warning: server logout failed: {}", err);
        }
    }

    let ctx_mut = config
        .get_mut(&current_name)
        .ok_or_else(|| anyhow::anyhow!("Current context not found."))?;
    ctx_mut.token = String::new();
    config.save(client_config_path)?;

    println!("Signed out from context \"{}\".", current_name);
    Ok(())
}

/// Show the identity behind the stored credential.
pub async fn whoami(client_config_path: &std::path::Path) -> Result<()> {
    let api = super::connect(client_config_path).await?;

    match api.session().current() {
        Some(identity) => {
            println!("{} (@{})", identity.label(), identity.username);
            println!("id: {}", identity.id);
        }
        None => println!("Not signed in. Run `mingle login`."),
    }
    Ok(())
}
