//! Core command implementations and shared utilities

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tally_core::db::Database;

/// Resolve the database path: explicit flag > TALLY_DB > platform data dir
pub fn resolve_db_path(flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("TALLY_DB") {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    let data_dir = dirs::data_local_dir()
        .context("Could not determine the data directory; pass --db explicitly")?
        .join("tally");
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;

    Ok(data_dir.join("tally.db"))
}

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path.to_str().context("Database path is not valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("Initializing database at {}...", db_path.display());

    let _db = open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   Encryption: ENABLED");
    }

    println!("Database initialized.");
    println!();
    println!("Next steps:");
    println!("  1. Add lookup data:      tally suppliers add \"Acme Ltda\"");
    println!("  2. Upload a statement:   tally upload --file extrato.ofx");
    println!("  3. Review and confirm:   tally imports show <id>");

    Ok(())
}
