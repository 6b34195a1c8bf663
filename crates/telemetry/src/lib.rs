//! Tracing subscriber bootstrap shared by every binary in the workspace.

use anyhow::{anyhow, Context};
use library_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` takes precedence over
/// `telemetry.filter`.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = env_filter(settings)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match settings.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };
    installed.map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))?;

    tracing::info!(
        target: "library-telemetry",
        format = ?settings.log_format,
        "telemetry initialized"
    );
    Ok(())
}

fn env_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.filter)
            .with_context(|| format!("invalid telemetry filter '{}'", settings.filter)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        let settings = TelemetrySettings::default();
        assert!(EnvFilter::try_new(&settings.filter).is_ok());
    }

    #[test]
    fn invalid_filter_is_reported() {
        let settings = TelemetrySettings {
            filter: "library=loudest".to_string(),
            ..TelemetrySettings::default()
        };
        if std::env::var("RUST_LOG").is_err() {
            assert!(env_filter(&settings).is_err());
        }
    }
}
