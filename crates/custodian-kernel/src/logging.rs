//! Tracing subscriber setup for binaries

use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// Honors `RUST_LOG`, defaulting to `info`. `json` switches to one JSON
/// object per line.
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
    .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
