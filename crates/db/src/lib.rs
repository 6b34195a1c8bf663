//! SQLite connection factory and the migration runner for module schemas.

use std::str::FromStr;

use anyhow::Context;
use library_kernel::settings::DatabaseSettings;
use library_kernel::Migration;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

const MIGRATIONS_TABLE_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS _library_migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL,
        PRIMARY KEY (module, id)
    );
"#;

/// Open a connection pool for the configured database.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .create_if_missing(true);

    let mut pool_options = SqlitePoolOptions::new().max_connections(settings.max_connections);
    if settings.url.contains(":memory:") {
        // Dropping the last connection discards an in-memory database.
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open database '{}'", settings.url))?;

    tracing::info!(
        target: "library-db",
        url = %settings.url,
        max_connections = settings.max_connections,
        "database pool opened"
    );
    Ok(pool)
}

/// Apply every migration not yet recorded in `_library_migrations`.
///
/// Each migration runs in its own transaction together with its bookkeeping
/// row, so a failing script leaves no trace. Returns how many were applied.
pub async fn run_migrations(
    pool: &SqlitePool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    sqlx::raw_sql(MIGRATIONS_TABLE_DDL)
        .execute(pool)
        .await
        .with_context(|| "failed to create migrations table")?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let already_applied: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM _library_migrations WHERE module = ? AND id = ?",
        )
        .bind(module)
        .bind(migration.id)
        .fetch_one(pool)
        .await
        .with_context(|| format!("failed to inspect migration {}/{}", module, migration.id))?;

        if already_applied > 0 {
            tracing::debug!(target: "library-db", module = %module, id = migration.id, "migration already applied");
            continue;
        }

        let applied_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .with_context(|| "failed to format migration timestamp")?;

        let mut tx = pool.begin().await?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;
        sqlx::query("INSERT INTO _library_migrations (module, id, applied_at) VALUES (?, ?, ?)")
            .bind(module)
            .bind(migration.id)
            .bind(applied_at)
            .execute(&mut *tx)
            .await?;
        tx.commit()
            .await
            .with_context(|| format!("failed to commit migration {}/{}", module, migration.id))?;

        tracing::info!(target: "library-db", module = %module, id = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}
