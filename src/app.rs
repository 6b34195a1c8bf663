//! Process lifecycle: open the pool, migrate, run modules, shut down cleanly.

use anyhow::Context;
use library_kernel::settings::Settings;
use library_kernel::InitCtx;
use sqlx::SqlitePool;

use crate::modules;

/// Open the database, apply pending migrations, and serve until a shutdown
/// signal arrives. The pool is closed on every exit path after it opens.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let pool = library_db::connect(&settings.database).await?;
    let result = serve_with_pool(settings, &pool).await;

    pool.close().await;
    tracing::info!(target: "library-db", "database pool closed");
    result
}

async fn serve_with_pool(settings: &Settings, pool: &SqlitePool) -> anyhow::Result<()> {
    let registry = modules::register_all(pool);
    let applied = library_db::run_migrations(pool, &registry.collect_migrations())
        .await
        .with_context(|| "failed to apply migrations")?;
    tracing::info!(applied, "migrations up to date");

    let ctx = InitCtx { settings };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = library_http::start_server(&registry, settings, shutdown_signal()).await;
    let stopped = registry.stop_modules().await;

    served.and(stopped)
}

/// Apply pending migrations and report how many ran
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let pool = library_db::connect(&settings.database).await?;
    let registry = modules::register_all(&pool);
    let applied = library_db::run_migrations(&pool, &registry.collect_migrations()).await;
    pool.close().await;

    let applied = applied.with_context(|| "failed to apply migrations")?;
    tracing::info!(applied, "migrations up to date");
    Ok(applied)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
