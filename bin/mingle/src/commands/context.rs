//! Context management commands.

use anyhow::Result;

use crate::config::{ClientConfig, Context};

/// Add or update a context.
pub fn add(name: &str, server: &str, client_config_path: &std::path::Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    let token = config.get_mut(name).map(|c| c.token.clone()).unwrap_or_default();
    config.upsert(Context {
        name: name.to_string(),
        server: server.trim_end_matches('/').to_string(),
        token,
    });
    if config.current_context.is_empty() {
        config.current_context = name.to_string();
    }
    config.save(client_config_path)?;

    println!("Context \"{}\" added.", name);
    Ok(())
}

/// List contexts, marking the active one.
pub fn list(client_config_path: &std::path::Path) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;

    if config.contexts.is_empty() {
        println!("No contexts configured.");
        println!("Run: mingle context add <name> --server <url>");
        return Ok(());
    }

    println!("{:2} {:20} {:40} {:10}", "", "NAME", "SERVER", "SIGNED-IN");
    for ctx in &config.contexts {
        let marker = if ctx.name == config.current_context { "*" } else { " " };
        let server = if ctx.server.is_empty() { "-" } else { &ctx.server };
        let signed_in = if ctx.token.is_empty() { "no" } else { "yes" };
        println!("{:2} {:20} {:40} {:10}", marker, ctx.name, server, signed_in);
    }

    Ok(())
}

/// Make a context the active one.
pub fn use_context(name: &str, client_config_path: &std::path::Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    if !config.contexts.iter().any(|c| c.name == name) {
        anyhow::bail!(
            "Context \"{}\" not found. Run `mingle context list` to see available contexts.",
            name
        );
    }

    config.current_context = name.to_string();
    config.save(client_config_path)?;
    println!("Switched to context \"{}\".", name);
    Ok(())
}

/// Delete a context.
pub fn delete(name: &str, client_config_path: &std::path::Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    if !config.remove(name) {
        anyhow::bail!("Context \"{}\" not found.", name);
    }

    config.save(client_config_path)?;
    println!("Context \"{}\" deleted.", name);
    Ok(())
}
