//! Server command implementation

use std::path::Path;

use anyhow::Result;

use super::open_db;
use tally_server::ServerConfig;

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    no_auth: bool,
    no_encrypt: bool,
) -> Result<()> {
    println!("Starting Tally web server...");
    println!("   Database:  {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);

    // Parse API keys from environment (comma-separated)
    let api_keys: Vec<String> = std::env::var("TALLY_API_KEYS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if no_auth {
        println!();
        println!("   WARNING: authentication disabled (--no-auth)");
        println!("   Do not expose this server to a network.");
    } else if api_keys.is_empty() {
        println!();
        println!("   No API keys configured. Set TALLY_API_KEYS (comma-separated)");
        println!("   or pass --no-auth for local development.");
    }

    // Parse allowed CORS origins from environment (comma-separated)
    let allowed_origins: Vec<String> = std::env::var("TALLY_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let config = ServerConfig {
        require_auth: !no_auth,
        allowed_origins,
        api_keys,
    };

    let db = open_db(db_path, no_encrypt)?;
    tally_server::serve_with_config(db, host, port, config).await
}
