use std::collections::HashMap;

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::{error::ServiceError, util::Params};

#[derive(Debug, Serialize)]
pub struct RowsAffected {
    pub affected: u64,
}

#[derive(Debug, Serialize)]
pub struct Total {
    pub total: i64,
}

pub fn reject(e: ServiceError) -> (StatusCode, String) {
    let status = e.status();
    if status.is_server_error() {
        error!(error = %e, "request failed");
    }
    (status, e.to_string())
}

pub fn query_params(raw: HashMap<String, String>) -> Params {
    raw.into_iter().map(|(k, v)| (k, Value::String(v))).collect()
}
