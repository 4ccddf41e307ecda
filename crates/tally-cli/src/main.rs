//! Tally CLI - Bank-statement import and review
//!
//! Usage:
//!   tally init                    Initialize database
//!   tally upload --file FILE      Upload a statement (OFX/QFX or CSV)
//!   tally imports show ID         Review a session's line items
//!   tally imports confirm ID      Materialize ledger entries
//!   tally serve --port 3000       Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let db_path = commands::resolve_db_path(cli.db.as_deref())?;

    match cli.command {
        Commands::Init => commands::cmd_init(&db_path, cli.no_encrypt),
        Commands::Upload { file } => {
            let db = commands::open_db(&db_path, cli.no_encrypt)?;
            commands::cmd_upload(&db, &file)
        }
        Commands::Imports { action } => {
            let db = commands::open_db(&db_path, cli.no_encrypt)?;
            match action {
                None | Some(ImportsAction::List) => commands::cmd_imports_list(&db),
                Some(ImportsAction::Show { id, page, json }) => {
                    commands::cmd_imports_show(db, id, page, json)
                }
                Some(ImportsAction::Classify {
                    id,
                    items,
                    counterparty,
                    category,
                    ledger,
                }) => commands::cmd_imports_classify(
                    db,
                    id,
                    &items,
                    counterparty,
                    category,
                    ledger.as_deref(),
                ),
                Some(ImportsAction::Confirm { id }) => commands::cmd_imports_confirm(db, id),
                Some(ImportsAction::Cancel { id }) => commands::cmd_imports_cancel(db, id),
            }
        }
        Commands::Categories { action } => {
            let db = commands::open_db(&db_path, cli.no_encrypt)?;
            match action {
                None | Some(LookupAction::List) => commands::cmd_categories_list(&db),
                Some(LookupAction::Add { name }) => commands::cmd_categories_add(&db, &name),
            }
        }
        Commands::Suppliers { action } => {
            let db = commands::open_db(&db_path, cli.no_encrypt)?;
            match action {
                None | Some(LookupAction::List) => commands::cmd_suppliers_list(&db),
                Some(LookupAction::Add { name }) => commands::cmd_suppliers_add(&db, &name),
            }
        }
        Commands::Clients { action } => {
            let db = commands::open_db(&db_path, cli.no_encrypt)?;
            match action {
                None | Some(LookupAction::List) => commands::cmd_clients_list(&db),
                Some(LookupAction::Add { name }) => commands::cmd_clients_add(&db, &name),
            }
        }
        Commands::Serve {
            port,
            host,
            no_auth,
        } => commands::cmd_serve(&db_path, &host, port, no_auth, cli.no_encrypt).await,
    }
}
