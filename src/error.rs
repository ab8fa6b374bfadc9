use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, RuntimeErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

use crate::response::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable")]
    Unavailable,

    #[error("ORM error")]
    OrmError(#[source] DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::OrmError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Conflict(_) | AppError::Unavailable)
    }
}

// Postgres SQLSTATE codes that are classified instead of surfaced as 500s.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => return AppError::Conflict(detail),
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                return AppError::NotFound("Referenced record");
            }
            _ => {}
        }

        match &err {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => return AppError::Unavailable,
            DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db)))
            | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db))) => {
                match db.code().as_deref() {
                    Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => {
                        return AppError::Conflict("concurrent update, retry the request".into());
                    }
                    Some(NUMERIC_VALUE_OUT_OF_RANGE) => {
                        return AppError::Validation("quantity is too large".into());
                    }
                    _ => {}
                }
            }
            DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::PoolTimedOut))
            | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::PoolTimedOut)) => {
                return AppError::Unavailable;
            }
            _ => {}
        }

        AppError::OrmError(err)
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    retryable: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
                retryable: self.is_retryable(),
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
