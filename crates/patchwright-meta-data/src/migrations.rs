//! Database migration runner with advisory lock support

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};

/// Advisory lock ID for migrations (arbitrary but stable)
const MIGRATION_LOCK_ID: i64 = 4217;

const INITIAL_SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS installations (
    installation_id BIGINT PRIMARY KEY,
    account_login TEXT NOT NULL,
    account_type TEXT NOT NULL,
    installed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    deleted_at TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS repositories (
    github_id BIGINT PRIMARY KEY,
    name TEXT NOT NULL,
    full_name TEXT NOT NULL UNIQUE,
    private BOOLEAN NOT NULL DEFAULT FALSE,
    installation_id BIGINT NOT NULL REFERENCES installations(installation_id),
    added_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    removed_at TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS repo_index_meta (
    repo_id TEXT NOT NULL,
    branch TEXT NOT NULL,
    last_indexed_at TIMESTAMPTZ NOT NULL,
    last_index_type TEXT NOT NULL,
    last_indexed_sha TEXT NOT NULL,
    PRIMARY KEY (repo_id, branch)
);

CREATE TABLE IF NOT EXISTS bm25_state (
    repo_id TEXT NOT NULL,
    branch TEXT NOT NULL,
    state JSONB NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (repo_id, branch)
);

CREATE TABLE IF NOT EXISTS jobs (
    id TEXT PRIMARY KEY,
    queue_name TEXT NOT NULL,
    payload JSONB NOT NULL,
    state TEXT NOT NULL DEFAULT 'waiting',
    attempts INT NOT NULL DEFAULT 0,
    max_attempts INT NOT NULL DEFAULT 3,
    progress INT NOT NULL DEFAULT 0,
    result JSONB,
    failed_reason TEXT,
    owner_user_id TEXT,
    run_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const INDEXES: &str = r"
CREATE INDEX IF NOT EXISTS idx_repositories_full_name
    ON repositories (full_name) WHERE removed_at IS NULL;

CREATE INDEX IF NOT EXISTS idx_jobs_queue_state_run
    ON jobs (queue_name, state, run_at);

CREATE INDEX IF NOT EXISTS idx_jobs_owner
    ON jobs (owner_user_id);
";

/// Run all pending migrations with advisory locking
///
/// # Errors
/// Returns an error when the lock cannot be acquired or a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    // Acquire advisory lock for migrations
    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_ID)
        .execute(pool)
        .await
        .context("Failed to acquire migration lock")?;

    // Ensure lock is released even on error
    let result = run_migrations_inner(pool).await;

    sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_ID)
        .execute(pool)
        .await
        .context("Failed to release migration lock")?;

    result
}

async fn run_migrations_inner(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMPTZ DEFAULT NOW()
        )
    ",
    )
    .execute(pool)
    .await
    .context("Failed to create migrations table")?;

    let applied: Vec<i32> = sqlx::query("SELECT version FROM schema_migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to fetch applied migrations")?
        .iter()
        .map(|row| row.get(0))
        .collect();

    let migrations = vec![(1, "initial_schema", INITIAL_SCHEMA), (2, "indexes", INDEXES)];

    for (version, name, sql) in migrations {
        if applied.contains(&version) {
            tracing::debug!("Migration {} ({}) already applied", version, name);
            continue;
        }

        tracing::info!("Applying migration {} ({})", version, name);

        let mut tx = pool.begin().await.context("Failed to begin transaction")?;

        // Statements are split on blank-line boundaries; each DDL is idempotent
        for statement in sql.split(";\n").filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Migration {version} ({name}) failed"))?;
        }

        sqlx::query("INSERT INTO schema_migrations (version, name) VALUES ($1, $2)")
            .bind(version)
            .bind(name)
            .execute(&mut *tx)
            .await
            .context("Failed to record migration")?;

        tx.commit().await.context("Failed to commit migration")?;
    }

    Ok(())
}
