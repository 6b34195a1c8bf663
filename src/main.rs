use anyhow::Context;
use library_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load library settings")?;
    library_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "library-app bootstrap starting"
    );

    library_app::app::serve(&settings).await
}
