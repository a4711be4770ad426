//! CLI client for a Mingle server.
//!
//! Manages contexts and authentication, and drives the message and
//! post feeds from the terminal, including an interactive chat mode.

mod commands;
mod config;

use clap::{Parser, Subcommand};

/// Mingle CLI tool.
#[derive(Parser, Debug)]
#[command(name = "mingle", about = "Mingle social client")]
struct Cli {
    /// Path to client config file (default: ~/.mingle/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage contexts (server connections).
    #[command(name = "context")]
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// Switch the current context.
    #[command(name = "use")]
    Use {
        #[command(subcommand)]
        what: UseWhat,
    },

    /// Sign in to the current context's server.
    Login {
        /// Username.
        #[arg(long)]
        user: Option<String>,
        /// Password (prefer the interactive prompt).
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign out and clear the stored credential.
    Logout,

    /// Show the signed-in identity.
    Whoami,

    /// Messages in a circle.
    Messages {
        #[command(subcommand)]
        action: MessageAction,
    },

    /// The post feed.
    Posts {
        #[command(subcommand)]
        action: PostAction,
    },

    /// Interactive chat in a circle.
    Chat {
        /// Circle id.
        circle: String,
    },

    /// Show version.
    Version,
}

#[derive(Subcommand, Debug)]
enum ContextAction {
    /// Add or update a context.
    Add {
        /// Context name.
        name: String,
        /// Server URL (e.g. http://localhost:8080).
        #[arg(long)]
        server: String,
    },
    /// List all contexts.
    List,
    /// Delete a context.
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum UseWhat {
    /// Switch to a context.
    Context { name: String },
}

#[derive(Subcommand, Debug)]
enum MessageAction {
    /// List messages, newest first.
    List {
        /// Circle id.
        circle: String,
        /// Number of pages to fetch.
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Send a message.
    Send {
        /// Circle id.
        circle: String,
        /// Message text.
        content: String,
    },
    /// Edit a message you own.
    Edit {
        /// Circle id.
        circle: String,
        /// Message id.
        id: String,
        /// Replacement text.
        content: String,
    },
    /// Delete a message you own.
    Delete {
        /// Circle id.
        circle: String,
        /// Message id.
        id: String,
        /// Skip confirmation.
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum PostAction {
    /// List posts.
    List {
        /// Narrow by title or owner (local filter, no refetch).
        #[arg(long)]
        query: Option<String>,
        /// Number of pages to fetch.
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Toggle a like on a post.
    Like {
        /// Post id.
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::ClientConfig::default_path);

    match cli.command {
        Commands::Context { action } => match action {
            ContextAction::Add { name, server } => {
                commands::context::add(&name, &server, &config_path)?;
            }
            ContextAction::List => {
                commands::context::list(&config_path)?;
            }
            ContextAction::Delete { name } => {
                commands::context::delete(&name, &config_path)?;
            }
        },

        Commands::Use { what } => match what {
            UseWhat::Context { name } => {
                commands::context::use_context(&name, &config_path)?;
            }
        },

        Commands::Login { user, password } => {
            let username = user.unwrap_or_else(|| {
                eprint!("Username: ");
                let mut s = String::new();
                std::io::stdin().read_line(&mut s).unwrap();
                s.trim().to_string()
            });
            let password = password.unwrap_or_else(|| {
                rpassword::prompt_password("Password: ").unwrap_or_default()
            });
            commands::login::login(&username, &password, &config_path).await?;
        }

        Commands::Logout => {
            commands::login::logout(&config_path).await?;
        }

        Commands::Whoami => {
            commands::login::whoami(&config_path).await?;
        }

        Commands::Messages { action } => match action {
            MessageAction::List { circle, pages } => {
                commands::messages::list(&circle, pages, &config_path).await?;
            }
            MessageAction::Send { circle, content } => {
                commands::messages::send(&circle, &content, &config_path).await?;
            }
            MessageAction::Edit { circle, id, content } => {
                commands::messages::edit(&circle, &id, &content, &config_path).await?;
            }
            MessageAction::Delete { circle, id, yes } => {
                commands::messages::delete(&circle, &id, yes, &config_path).await?;
            }
        },

        Commands::Posts { action } => match action {
            PostAction::List { query, pages } => {
                commands::posts::list(query.as_deref(), pages, &config_path).await?;
            }
            PostAction::Like { id } => {
                commands::posts::like(&id, &config_path).await?;
            }
        },

        Commands::Chat { circle } => {
            commands::chat::run(&circle, &config_path).await?;
        }

        Commands::Version => {
            println!("mingle cli v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
