//! Centralized error handling.
//!
//! Provides the error taxonomy for the account lifecycle flows. Expected
//! business results (user already registered, no user for an email) are NOT
//! errors; they are `Outcome` values returned by the engine.

use thiserror::Error;
use uuid::Uuid;

use crate::validation::ValidationReport;

/// Persistence-layer error raised by `UserStore` implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A commit hit a uniqueness constraint (username or email).
    /// Registration maps this to `Outcome::AlreadyExists`.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A login-info record was requested for an account that has not been
    /// committed yet. Login-info provider keys require a durable identifier.
    #[error("account {0} has not been committed")]
    NotPersisted(Uuid),

    /// Any other storage failure (connection, I/O, transaction).
    #[error("storage failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        StoreError::Backend(msg.into())
    }
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(msg)) => {
                StoreError::UniqueViolation(msg)
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Workflow error types
#[derive(Error, Debug)]
pub enum FlowError {
    /// Required fields reached the engine empty despite front-end validation.
    #[error("{0}")]
    InvalidArgument(String),

    /// The rule context reported violations; the session stays open for
    /// correction and the report carries the per-field details.
    #[error("validation failed: {0}")]
    Validation(ValidationReport),

    /// Password hashing or credential update failed.
    #[error("credential update failed: {0}")]
    Credential(String),

    /// `open_session` was called while a session is already open.
    #[error("a parameter session is already open")]
    SessionBusy,

    /// `accept`/`cancel` was called with no open parameter session.
    #[error("no parameter session is open")]
    NoOpenSession,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience constructors
impl FlowError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        FlowError::InvalidArgument(msg.into())
    }

    pub fn credential(msg: impl Into<String>) -> Self {
        FlowError::Credential(msg.into())
    }
}

/// Result type alias for workflow operations
pub type FlowResult<T> = Result<T, FlowError>;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
