// ==========================================
// Rural Sales IMS - API layer error types
// ==========================================
// Responsibility: translate store errors into caller-facing messages
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[from] RepositoryError),
}

pub type ApiResult<T> = Result<T, ApiError>;
