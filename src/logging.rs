use anyhow::Result;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "NAVGATE_LOG";

/// Install the stderr subscriber. `NAVGATE_LOG` overrides the default
/// `navgate=info` filter.
pub fn init(default_directive: &str) -> Result<()> {
    let filter = match std::env::var(LOG_ENV) {
        Ok(spec) if !spec.trim().is_empty() => EnvFilter::try_new(spec)?,
        _ => EnvFilter::new(default_directive),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install tracing subscriber: {}", e))?;
    Ok(())
}
