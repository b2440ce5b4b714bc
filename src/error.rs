use axum::http::StatusCode;
use thiserror::Error;

use crate::users::repo_types::User;

/// Failure reported by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index rejected the write.
    #[error("unique constraint violated")]
    Conflict,
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        let unique = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if unique {
            StoreError::Conflict
        } else {
            StoreError::Database(e)
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("missing parameter: {0}")]
    MissingArgument(&'static str),
    #[error("{0}")]
    InvalidFormat(&'static str),
    /// Carries the row that already holds the username, email or phone.
    #[error("user already exists")]
    AlreadyExists(Box<User>),
    #[error("{0} does not exist")]
    NotFound(&'static str),
    #[error("incorrect password, please try again")]
    WrongPassword,
    #[error("{0} failed")]
    OperationFailed(&'static str),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::MissingArgument(_) | ServiceError::InvalidFormat(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::AlreadyExists(_) => StatusCode::CONFLICT,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::WrongPassword => StatusCode::UNAUTHORIZED,
            ServiceError::OperationFailed(_) | ServiceError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            ServiceError::MissingArgument("id").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ServiceError::NotFound("user").status(), StatusCode::NOT_FOUND);
        assert_eq!(ServiceError::WrongPassword.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ServiceError::OperationFailed("insert").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_are_readable() {
        assert_eq!(
            ServiceError::MissingArgument("id").to_string(),
            "missing parameter: id"
        );
        assert_eq!(ServiceError::NotFound("user").to_string(), "user does not exist");
        assert_eq!(ServiceError::OperationFailed("update").to_string(), "update failed");
    }
}
