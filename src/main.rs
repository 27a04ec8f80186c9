use relay_cli::{init_tracing, interactive, open_session};
use relay_core::RelayConfig;
use relay_stub::{StubState, WebhookMode, default_users, load_users, serve_listener};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::io::BufReader;

/// Main entry point for the relay workspace
///
/// Starts the stub users endpoint and webhook in the background, then opens an interactive
/// form session on stdin pointed at them.
///
/// # Environment Variables
/// - `RELAY_STUB_ADDR`: Stub server address (default: "127.0.0.1:3000", use port 0 for any)
/// - `RELAY_STUB_USERS_FILE`: JSON file with the user list (default: built-in list)
/// - `RELAY_STUB_WEBHOOK_MODE`: `json`, `empty`, `text` or `fail:<status>` (default: `json`)
/// - `RELAY_USERS_URL` / `RELAY_WEBHOOK_URL`: Point the form elsewhere instead of the stub
///
/// # Returns
/// * `Ok(())` - When the session ends on `quit` or end of input
/// * `Err(anyhow::Error)` - If the stub cannot start or the config is invalid
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("relay=info")?;

    let stub_addr = std::env::var("RELAY_STUB_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into());
    let users = match std::env::var("RELAY_STUB_USERS_FILE").ok().map(PathBuf::from) {
        Some(path) => load_users(&path)?,
        None => default_users(),
    };
    let mode: WebhookMode = std::env::var("RELAY_STUB_WEBHOOK_MODE")
        .unwrap_or_default()
        .parse()?;

    let listener = tokio::net::TcpListener::bind(&stub_addr).await?;
    let local = listener.local_addr()?;
    tracing::info!("++ Starting relay stub on {} ({:?})", local, mode);

    let stub = tokio::spawn(async move {
        if let Err(e) = serve_listener(listener, StubState::new(users, mode)).await {
            tracing::error!("Stub server stopped: {}", e);
        }
    });

    let config = RelayConfig::from_env_values(
        Some(endpoint_or_stub(
            std::env::var("RELAY_USERS_URL").ok(),
            local,
            "/users",
        )),
        Some(endpoint_or_stub(
            std::env::var("RELAY_WEBHOOK_URL").ok(),
            local,
            "/webhook",
        )),
    )?;
    tracing::info!(
        "++ Form session using {} and {}",
        config.users_url(),
        config.webhook_url()
    );

    let session = open_session(config)?;
    interactive::run(session, BufReader::new(tokio::io::stdin())).await?;

    stub.abort();
    Ok(())
}

/// An explicit endpoint wins; unset or blank falls back to the stub's bound address.
fn endpoint_or_stub(value: Option<String>, stub: SocketAddr, path: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| format!("http://{stub}{path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_endpoint_falls_back_to_bound_stub_port() {
        let stub: SocketAddr = "127.0.0.1:41234".parse().unwrap();

        assert_eq!(
            endpoint_or_stub(Some("  ".into()), stub, "/users"),
            "http://127.0.0.1:41234/users"
        );
        assert_eq!(
            endpoint_or_stub(None, stub, "/webhook"),
            "http://127.0.0.1:41234/webhook"
        );
        assert_eq!(
            endpoint_or_stub(Some(" https://hooks.example.com/r ".into()), stub, "/webhook"),
            "https://hooks.example.com/r"
        );
    }
}
