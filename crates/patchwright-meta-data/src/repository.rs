//! PostgreSQL implementation of the metadata repository

use crate::MetaDataResult;
use crate::models::{IndexMeta, IndexType, Installation, RepositoryRecord};
use crate::traits::MetaRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

/// Metadata repository backed by the shared connection pool
#[derive(Clone)]
pub struct DbMetaRepository {
    pool: PgPool,
}

impl DbMetaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetaRepository for DbMetaRepository {
    async fn upsert_installation(&self, installation: &Installation) -> MetaDataResult<()> {
        sqlx::query(
            r"
            INSERT INTO installations (installation_id, account_login, account_type, installed_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, NOW(), NULL)
            ON CONFLICT (installation_id) DO UPDATE SET
                account_login = EXCLUDED.account_login,
                account_type = EXCLUDED.account_type,
                updated_at = NOW(),
                deleted_at = NULL
            ",
        )
        .bind(installation.installation_id)
        .bind(&installation.account_login)
        .bind(&installation.account_type)
        .bind(installation.installed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_installation(&self, installation_id: i64) -> MetaDataResult<()> {
        sqlx::query(
            "UPDATE installations SET deleted_at = NOW(), updated_at = NOW() WHERE installation_id = $1",
        )
        .bind(installation_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_repository(&self, repository: &RepositoryRecord) -> MetaDataResult<()> {
        sqlx::query(
            r"
            INSERT INTO repositories (github_id, name, full_name, private, installation_id, added_at, removed_at)
            VALUES ($1, $2, $3, $4, $5, $6, NULL)
            ON CONFLICT (github_id) DO UPDATE SET
                name = EXCLUDED.name,
                full_name = EXCLUDED.full_name,
                private = EXCLUDED.private,
                installation_id = EXCLUDED.installation_id,
                removed_at = NULL
            ",
        )
        .bind(repository.github_id)
        .bind(&repository.name)
        .bind(&repository.full_name)
        .bind(repository.private)
        .bind(repository.installation_id)
        .bind(repository.added_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_repository(&self, full_name: &str) -> MetaDataResult<()> {
        sqlx::query("UPDATE repositories SET removed_at = NOW() WHERE full_name = $1")
            .bind(full_name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn installation_for_repo(&self, full_name: &str) -> MetaDataResult<Option<i64>> {
        let row = sqlx::query(
            r"
            SELECT r.installation_id
            FROM repositories r
            JOIN installations i ON i.installation_id = r.installation_id
            WHERE r.full_name = $1
              AND r.removed_at IS NULL
              AND i.deleted_at IS NULL
            ",
        )
        .bind(full_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row.get::<i64, _>("installation_id")))
    }

    async fn get_index_meta(
        &self,
        repo_id: &str,
        branch: &str,
    ) -> MetaDataResult<Option<IndexMeta>> {
        let row = sqlx::query(
            r"
            SELECT repo_id, branch, last_indexed_at, last_index_type, last_indexed_sha
            FROM repo_index_meta
            WHERE repo_id = $1 AND branch = $2
            ",
        )
        .bind(repo_id)
        .bind(branch)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            let index_type: String = row.get("last_index_type");
            IndexMeta {
                repo_id: row.get("repo_id"),
                branch: row.get("branch"),
                last_indexed_at: row.get::<DateTime<Utc>, _>("last_indexed_at"),
                last_index_type: index_type.parse().unwrap_or(IndexType::Full),
                last_indexed_sha: row.get("last_indexed_sha"),
            }
        }))
    }

    async fn set_index_meta(&self, meta: &IndexMeta) -> MetaDataResult<()> {
        sqlx::query(
            r"
            INSERT INTO repo_index_meta (repo_id, branch, last_indexed_at, last_index_type, last_indexed_sha)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (repo_id, branch) DO UPDATE SET
                last_indexed_at = EXCLUDED.last_indexed_at,
                last_index_type = EXCLUDED.last_index_type,
                last_indexed_sha = EXCLUDED.last_indexed_sha
            ",
        )
        .bind(&meta.repo_id)
        .bind(&meta.branch)
        .bind(meta.last_indexed_at)
        .bind(meta.last_index_type.to_string())
        .bind(&meta.last_indexed_sha)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_bm25_state(
        &self,
        repo_id: &str,
        branch: &str,
    ) -> MetaDataResult<Option<serde_json::Value>> {
        let row = sqlx::query("SELECT state FROM bm25_state WHERE repo_id = $1 AND branch = $2")
            .bind(repo_id)
            .bind(branch)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get::<serde_json::Value, _>("state")))
    }

    async fn save_bm25_state(
        &self,
        repo_id: &str,
        branch: &str,
        state: &serde_json::Value,
    ) -> MetaDataResult<()> {
        sqlx::query(
            r"
            INSERT INTO bm25_state (repo_id, branch, state, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (repo_id, branch) DO UPDATE SET
                state = EXCLUDED.state,
                updated_at = NOW()
            ",
        )
        .bind(repo_id)
        .bind(branch)
        .bind(state)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_bm25_state(&self, repo_id: &str, branch: &str) -> MetaDataResult<()> {
        sqlx::query("DELETE FROM bm25_state WHERE repo_id = $1 AND branch = $2")
            .bind(repo_id)
            .bind(branch)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
