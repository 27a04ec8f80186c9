//! # Relay CLI
//!
//! Terminal front end for the report form: a notification surface that prints to stdout, a
//! line-driven interactive session, and the startup plumbing shared by the `relay` and
//! `relay-run` binaries.

pub mod interactive;
pub mod terminal;

use relay_core::{FormSession, RelayConfig, ReqwestTransport, SystemClock};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use terminal::TerminalSurface;

/// Install the fmt subscriber on stderr so log lines never interleave with form output on
/// stdout.
pub fn init_tracing(directive: &str) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

/// Read endpoint overrides from the environment (after `.env` has been loaded).
pub fn config_from_env() -> anyhow::Result<RelayConfig> {
    Ok(RelayConfig::from_env_values(
        std::env::var("RELAY_USERS_URL").ok(),
        std::env::var("RELAY_WEBHOOK_URL").ok(),
    )?)
}

/// Open a session against real endpoints, printing notifications to the terminal.
pub fn open_session(config: RelayConfig) -> anyhow::Result<Arc<FormSession>> {
    let transport = ReqwestTransport::new(config.timings().request_timeout)?;
    Ok(Arc::new(FormSession::open(
        config,
        Arc::new(transport),
        Arc::new(TerminalSurface),
        Arc::new(SystemClock),
    )))
}
