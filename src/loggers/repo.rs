use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;

use crate::{
    db::like_pattern,
    error::StoreError,
    loggers::{
        dto::{LoggerPatch, NewLogger},
        repo_types::{Logger, LoggerFilter},
    },
    util::page::PageRequest,
};

#[async_trait]
pub trait LoggerStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Logger>, StoreError>;
    async fn find_and_count(
        &self,
        filter: &LoggerFilter,
        page: &PageRequest,
    ) -> Result<(Vec<Logger>, i64), StoreError>;
    async fn insert(&self, entry: &NewLogger) -> Result<i64, StoreError>;
    async fn update(&self, id: i64, patch: &LoggerPatch) -> Result<u64, StoreError>;
    async fn delete(&self, id: i64) -> Result<u64, StoreError>;
    async fn count(&self) -> Result<i64, StoreError>;
}

#[derive(Clone)]
pub struct PgLoggerStore {
    db: PgPool,
}

impl PgLoggerStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LoggerStore for PgLoggerStore {
    async fn get(&self, id: i64) -> Result<Option<Logger>, StoreError> {
        let entry = sqlx::query_as::<_, Logger>(
            r#"
            SELECT id, user_id, path, params, method, ip, latency, agent,
                   status, rtime, created_at, updated_at
            FROM loggers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(entry)
    }

    async fn find_and_count(
        &self,
        filter: &LoggerFilter,
        page: &PageRequest,
    ) -> Result<(Vec<Logger>, i64), StoreError> {
        let path = filter.path.as_deref().map(like_pattern);

        let rows = sqlx::query_as::<_, Logger>(
            r#"
            SELECT id, user_id, path, params, method, ip, latency, agent,
                   status, rtime, created_at, updated_at
            FROM loggers
            WHERE ($1::text IS NULL OR path LIKE $1 ESCAPE '\')
            ORDER BY id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&path)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM loggers
            WHERE ($1::text IS NULL OR path LIKE $1 ESCAPE '\')
            "#,
        )
        .bind(&path)
        .fetch_one(&self.db)
        .await?;

        Ok((rows, total))
    }

    async fn insert(&self, entry: &NewLogger) -> Result<i64, StoreError> {
        let mut tx = self.db.begin().await?;
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO loggers (user_id, path, params, method, ip, latency, agent,
                                 status, rtime)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&entry.user_id)
        .bind(&entry.path)
        .bind(&entry.params)
        .bind(&entry.method)
        .bind(&entry.ip)
        .bind(entry.latency)
        .bind(&entry.agent)
        .bind(entry.status)
        .bind(&entry.rtime)
        .fetch_one(&mut *tx)
        .await;

        match inserted {
            Ok(id) => {
                tx.commit().await?;
                Ok(id)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    warn!(error = %rb, "rollback after failed logger insert");
                }
                Err(e.into())
            }
        }
    }

    async fn update(&self, id: i64, patch: &LoggerPatch) -> Result<u64, StoreError> {
        let mut tx = self.db.begin().await?;
        let updated = sqlx::query(
            r#"
            UPDATE loggers
               SET user_id = COALESCE($2, user_id),
                   path = COALESCE($3, path),
                   params = COALESCE($4, params),
                   method = COALESCE($5, method),
                   ip = COALESCE($6, ip),
                   latency = COALESCE($7, latency),
                   agent = COALESCE($8, agent),
                   status = COALESCE($9, status),
                   rtime = COALESCE($10, rtime),
                   updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.user_id)
        .bind(&patch.path)
        .bind(&patch.params)
        .bind(&patch.method)
        .bind(&patch.ip)
        .bind(patch.latency)
        .bind(&patch.agent)
        .bind(patch.status)
        .bind(&patch.rtime)
        .execute(&mut *tx)
        .await;

        match updated {
            Ok(res) => {
                tx.commit().await?;
                Ok(res.rows_affected())
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    warn!(error = %rb, logger_id = id, "rollback after failed logger update");
                }
                Err(e.into())
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<u64, StoreError> {
        let res = sqlx::query("DELETE FROM loggers WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM loggers")
            .fetch_one(&self.db)
            .await?;
        Ok(total)
    }
}
