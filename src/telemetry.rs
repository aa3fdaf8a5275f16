//! Tracing subscriber setup shared by the server and the terminal client.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const DEFAULT_FILTER: &str = "info,tower_http=info";

/// Install the global fmt subscriber. `RUST_LOG` overrides `default_filter`.
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()?;

    Ok(())
}
