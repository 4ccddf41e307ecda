//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Bank-statement import and review for small-business books
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Import bank statements, review line items, confirm into the ledger", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (defaults to TALLY_DB or the platform data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set TALLY_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Upload a bank statement (OFX/QFX or template CSV)
    Upload {
        /// Statement file to upload
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Manage import sessions (list, show, classify, confirm, cancel)
    Imports {
        #[command(subcommand)]
        action: Option<ImportsAction>,
    },

    /// Manage categories
    Categories {
        #[command(subcommand)]
        action: Option<LookupAction>,
    },

    /// Manage suppliers
    Suppliers {
        #[command(subcommand)]
        action: Option<LookupAction>,
    },

    /// Manage clients
    Clients {
        #[command(subcommand)]
        action: Option<LookupAction>,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a
        /// network. By default the server requires a bearer API key from
        /// TALLY_API_KEYS.
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
pub enum ImportsAction {
    /// List import sessions, newest first
    List,

    /// Show one session's review state
    Show {
        /// Session ID
        id: i64,

        /// Review page to display (25 items per page)
        #[arg(long, default_value = "0")]
        page: usize,

        /// Print the raw session JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Classify line items (single or batch)
    Classify {
        /// Session ID
        id: i64,

        /// Item IDs to classify (comma-separated), or "all"
        #[arg(long)]
        items: String,

        /// Counterparty (supplier or client) ID to assign
        #[arg(long)]
        counterparty: Option<i64>,

        /// Category ID to assign
        #[arg(long)]
        category: Option<i64>,

        /// Ledger type override: payable or receivable
        #[arg(long)]
        ledger: Option<String>,
    },

    /// Confirm a session, materializing ledger entries
    Confirm {
        /// Session ID
        id: i64,
    },

    /// Cancel a session without creating ledger entries
    Cancel {
        /// Session ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum LookupAction {
    /// List records
    List,

    /// Add a record
    Add {
        /// Name of the record
        name: String,
    },
}
