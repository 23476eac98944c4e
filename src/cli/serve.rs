use anyhow::Result;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::api::{ApiServer, ServerConfig};
use crate::db::Database;

/// Environment fallback for the shared-secret API key.
pub const API_KEY_ENV: &str = "ORGCATALOG_API_KEY";

pub fn run_serve(port: u16, api_key: Option<String>, db_path: Option<PathBuf>) -> Result<()> {
    let api_key = match api_key.or_else(|| std::env::var(API_KEY_ENV).ok()) {
        Some(key) if !key.is_empty() => key,
        _ => anyhow::bail!("no API key configured: pass --api-key or set {}", API_KEY_ENV),
    };

    let db_path = match db_path {
        Some(path) => path,
        None => Database::default_path()?,
    };

    // Create the schema up front so the first request does not pay for it
    Database::open_at(db_path.clone())?;
    info!(db = %db_path.display(), "database ready");

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    let server = ApiServer::new(ServerConfig {
        port,
        db_path,
        api_key,
    });
    server.start(shutdown)
}
