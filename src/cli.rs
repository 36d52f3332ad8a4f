use clap::{Parser, Subcommand};
use uuid::Uuid;

/// Logging API: bot log ingestion with bearer-token auth
#[derive(Parser)]
#[command(name = "logging-api", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind (defaults to LOGGING_API_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Apply pending database migrations and exit
    Migrate,

    /// Manage API tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Issue a new token
    Create {
        #[arg(long)]
        name: String,
        /// Grant admin privileges
        #[arg(long)]
        admin: bool,
        /// Bot the token acts for (required unless --admin)
        #[arg(long)]
        bot_id: Option<Uuid>,
    },
    /// List all tokens
    List,
    /// Deactivate a token; it stays on record but stops authenticating
    Deactivate {
        #[arg(long)]
        token_id: Uuid,
    },
    /// Permanently delete a token
    Delete {
        #[arg(long)]
        token_id: Uuid,
    },
}
