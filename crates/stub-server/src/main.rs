//! Standalone stub server binary.
//!
//! ## Purpose
//! Serves the users endpoint and the report webhook on their own so the `relay` CLI can be
//! pointed at them. The workspace's main `relay-run` binary starts the same stub alongside an
//! interactive form session.

use relay_stub::{default_users, load_users, serve, StubState, WebhookMode};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the relay stub server
///
/// # Environment Variables
/// - `RELAY_STUB_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `RELAY_STUB_USERS_FILE`: JSON file with the user list (default: built-in list)
/// - `RELAY_STUB_WEBHOOK_MODE`: `json`, `empty`, `text` or `fail:<status>` (default: `json`)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("relay_stub=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("RELAY_STUB_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let users = match std::env::var("RELAY_STUB_USERS_FILE").ok().map(PathBuf::from) {
        Some(path) => load_users(&path)?,
        None => default_users(),
    };
    let mode: WebhookMode = std::env::var("RELAY_STUB_WEBHOOK_MODE")
        .unwrap_or_default()
        .parse()?;

    tracing::info!("-- Starting relay stub on {} ({} users, {:?})", addr, users.len(), mode);

    serve(&addr, StubState::new(users, mode)).await?;

    Ok(())
}
