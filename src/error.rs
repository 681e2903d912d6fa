//! Error types for Biblio server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Numeric error codes carried in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    DbFailure = 3,
    NoSuchMember = 4,
    NoSuchBook = 5,
    BookNotAvailable = 7,
    Duplicate = 8,
    BadValue = 18,
    NoSuchData = 20,
    NoSuchLoan = 22,
    LoanAlreadyReturned = 23,
    LoanStillActive = 24,
}

/// Broad classification of lending failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced book, member or loan does not exist
    NotFound,
    /// The request is well-formed but contradicts current state
    Conflict,
    /// Transaction or infrastructure failure; nothing was applied
    StoreFailure,
}

/// Errors raised by the loan and inventory engine
#[derive(Error, Debug)]
pub enum LendingError {
    #[error("Book {0} not found")]
    BookNotFound(i32),

    #[error("Member {0} not found")]
    MemberNotFound(i32),

    #[error("Loan {0} not found")]
    LoanNotFound(i32),

    #[error("Book {0} has no copies available")]
    BookUnavailable(i32),

    #[error("Loan {0} has already been returned")]
    AlreadyReturned(i32),

    #[error("Loan {0} is still active and must be returned first")]
    LoanActive(i32),

    #[error("Due date {due_date} precedes loan date {loan_date}")]
    InvalidSchedule {
        loan_date: chrono::NaiveDate,
        due_date: chrono::NaiveDate,
    },

    #[error("Store failure: {0}")]
    Store(#[from] sqlx::Error),
}

impl LendingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LendingError::BookNotFound(_)
            | LendingError::MemberNotFound(_)
            | LendingError::LoanNotFound(_) => ErrorKind::NotFound,
            LendingError::BookUnavailable(_)
            | LendingError::AlreadyReturned(_)
            | LendingError::LoanActive(_)
            | LendingError::InvalidSchedule { .. } => ErrorKind::Conflict,
            LendingError::Store(_) => ErrorKind::StoreFailure,
        }
    }
}

/// Result type alias for lending operations
pub type LendingResult<T> = Result<T, LendingError>;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Lending(#[from] LendingError),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

fn lending_status(err: &LendingError) -> (StatusCode, ErrorCode) {
    match err {
        LendingError::BookNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchBook),
        LendingError::MemberNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchMember),
        LendingError::LoanNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchLoan),
        LendingError::BookUnavailable(_) => {
            (StatusCode::BAD_REQUEST, ErrorCode::BookNotAvailable)
        }
        LendingError::AlreadyReturned(_) => {
            (StatusCode::BAD_REQUEST, ErrorCode::LoanAlreadyReturned)
        }
        LendingError::LoanActive(_) => (StatusCode::CONFLICT, ErrorCode::LoanStillActive),
        LendingError::InvalidSchedule { .. } => (StatusCode::BAD_REQUEST, ErrorCode::BadValue),
        LendingError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DbFailure),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone()),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
            AppError::Lending(err) => {
                let (status, code) = lending_status(err);
                let message = match err.kind() {
                    ErrorKind::StoreFailure => {
                        tracing::error!("Lending store failure: {:?}", err);
                        "Database error".to_string()
                    }
                    _ => err.to_string(),
                };
                (status, code, message)
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

/// Map constraint violations raised by record-store writes to a conflict
pub(crate) fn constraint_conflict(err: sqlx::Error, message: impl Into<String>) -> AppError {
    match err {
        sqlx::Error::Database(ref db)
            if db.is_foreign_key_violation() || db.is_unique_violation() =>
        {
            AppError::Conflict(message.into())
        }
        other => AppError::Database(other),
    }
}
