//! Error types for the book library server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable application error codes returned in response bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    DbFailure = 2,
    NoSuchBook = 3,
    ConstraintViolation = 4,
    BadValue = 5,
}

/// A write-time constraint violation on a book record.
///
/// Every variant aborts the pending write without partial effect. These are
/// caller-input errors; no retry logic applies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstraintViolation {
    #[error("missing required field `{field}`")]
    MissingRequiredField { field: String },

    #[error("wrong type for field `{field}`")]
    TypeMismatch { field: String },

    #[error("field `{field}` is {length} characters long, maximum is {max}")]
    LengthExceeded {
        field: String,
        length: usize,
        max: usize,
    },

    #[error("value for field `{field}` does not fit the column range")]
    RangeExceeded { field: String },
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(#[from] ConstraintViolation),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        // The schema is the backstop behind the validated constructor;
        // constraint failures raised by the database itself are folded back
        // into the taxonomy so callers see one error kind per cause.
        if let sqlx::Error::Database(ref db) = err {
            let message = db.message().to_string();
            match db.kind() {
                sqlx::error::ErrorKind::NotNullViolation => {
                    return AppError::Constraint(ConstraintViolation::MissingRequiredField {
                        field: column_from_message(&message),
                    });
                }
                sqlx::error::ErrorKind::CheckViolation => {
                    return AppError::Constraint(classify_check(&message));
                }
                _ => {}
            }
        }
        AppError::Database(err)
    }
}

/// Extract the column name from a SQLite constraint message such as
/// "NOT NULL constraint failed: books.name".
fn column_from_message(message: &str) -> String {
    message
        .rsplit('.')
        .next()
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

/// Map a named CHECK constraint back to its cause. The schema names its
/// constraints `books_<field>_length` and `books_year_range` (see the books
/// repository) so this classification stays mechanical.
fn classify_check(message: &str) -> ConstraintViolation {
    if message.contains("books_year_range") {
        return ConstraintViolation::RangeExceeded {
            field: "year_published".to_string(),
        };
    }
    for field in ["name", "author", "book_type"] {
        if message.contains(&format!("books_{}_length", field)) {
            return ConstraintViolation::LengthExceeded {
                field: field.to_string(),
                length: 0,
                max: 0,
            };
        }
    }
    ConstraintViolation::TypeMismatch {
        field: column_from_message(message),
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchBook, msg.clone()),
            AppError::Constraint(violation) => (
                StatusCode::BAD_REQUEST,
                ErrorCode::ConstraintViolation,
                violation.to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
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
