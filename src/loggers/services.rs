use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::{
    error::{ServiceError, ServiceResult},
    loggers::{
        dto::{LoggerPatch, NewLogger},
        repo::LoggerStore,
        repo_types::{Logger, LoggerFilter},
    },
    util::{
        page::{Page, PageRequest},
        param_str, Params,
    },
};

/// CRUD over access-log records. Same locking discipline as `UserService`.
pub struct LoggerService {
    store: Arc<dyn LoggerStore>,
    lock: Mutex<()>,
}

impl LoggerService {
    pub fn new(store: Arc<dyn LoggerStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    pub async fn one(&self, id: i64) -> ServiceResult<Logger> {
        let _guard = self.lock.lock().await;
        if id == 0 {
            return Err(ServiceError::MissingArgument("id"));
        }
        self.store
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound("record"))
    }

    /// Filter: `path` (substring); pagination: `page`, `limit`.
    pub async fn query(&self, params: &Params) -> ServiceResult<(Vec<Logger>, Page)> {
        let _guard = self.lock.lock().await;

        let filter = LoggerFilter {
            path: param_str(params, "path"),
        };
        let req = PageRequest::from_params(params);
        let (entries, total) = self.store.find_and_count(&filter, &req).await?;
        Ok((entries, Page::new(req.page, req.limit, total)))
    }

    pub async fn add(&self, entry: NewLogger) -> ServiceResult<Logger> {
        let _guard = self.lock.lock().await;

        let id = self.store.insert(&entry).await.map_err(|e| {
            error!(error = %e, path = %entry.path, "insert logger failed");
            ServiceError::OperationFailed("insert")
        })?;
        let stored = self
            .store
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound("record"))?;
        debug!(logger_id = stored.id, path = %stored.path, "access log stored");
        Ok(stored)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<u64> {
        let _guard = self.lock.lock().await;
        if id == 0 {
            return Err(ServiceError::MissingArgument("id"));
        }
        let affected = self.store.delete(id).await?;
        info!(logger_id = id, affected, "logger deleted");
        Ok(affected)
    }

    pub async fn update(&self, id: i64, patch: LoggerPatch) -> ServiceResult<u64> {
        let _guard = self.lock.lock().await;
        if id == 0 {
            return Err(ServiceError::MissingArgument("id"));
        }
        self.store.update(id, &patch).await.map_err(|e| {
            error!(error = %e, logger_id = id, "update logger failed");
            ServiceError::OperationFailed("update")
        })
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        let _guard = self.lock.lock().await;
        Ok(self.store.count().await?)
    }
}
