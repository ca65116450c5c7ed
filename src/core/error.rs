//! Error handling - Tassonomia degli errori applicativi
//!
//! Every failure carries a coarse [`ErrorKind`], a stable `code` clients can branch on,
//! and an optional `details` string. Raw database errors are logged, never returned.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::fmt;
use tracing::error;

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Caller error, never retried.
    Validation,
    /// The request clashes with existing state.
    Conflict,
    NotFound,
    /// A collaborator failed (database, notification provider). May be retried.
    Dependency,
    Unauthorized,
    Forbidden,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Dependency => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    kind: ErrorKind,
    code: Option<&'static str>,
    message: &'static str,
    details: Option<String>,
    transient: bool,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self {
            kind,
            code: None,
            message,
            details: None,
            transient: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    /// Marks the failure as a serialization conflict the gateway may retry.
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    // Common error constructors
    pub fn not_found(message: &'static str) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn bad_request(message: &'static str) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn unauthorized(message: &'static str) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: &'static str) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn conflict(message: &'static str) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn internal_server_error(message: &'static str) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn service_unavailable(message: &'static str) -> Self {
        Self::new(ErrorKind::Dependency, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> Option<&'static str> {
        self.code
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message)?,
            None => write!(f, "{}", self.message)?,
        }
        if let Some(details) = &self.details {
            write!(f, ": {}", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

/// SQLite reports lock contention as SQLITE_BUSY (5) / SQLITE_LOCKED (6), possibly
/// as an extended code; Postgres uses the SQLSTATE serialization classes.
fn is_serialization_conflict(code: &str) -> bool {
    match code {
        "40001" | "40P01" => true,
        other => other
            .parse::<i32>()
            .map(|c| matches!(c & 0xff, 5 | 6))
            .unwrap_or(false),
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("Resource not found"),

            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
                if is_serialization_conflict(&code) {
                    Self::service_unavailable("Transaction conflict")
                        .transient()
                        .with_details(db_err.message().to_string())
                } else if db_err.is_unique_violation() {
                    Self::conflict("Resource already exists")
                } else if db_err.is_foreign_key_violation() {
                    Self::not_found("Referenced resource not found")
                } else {
                    Self::internal_server_error("Database error")
                }
            }

            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                Self::service_unavailable("Database unavailable")
            }

            _ => Self::internal_server_error("Internal server error"),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::internal_server_error("Migration failed").with_details(err.to_string())
    }
}

impl From<axum::Error> for AppError {
    fn from(err: axum::Error) -> Self {
        Self::internal_server_error("Internal server error").with_details(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::bad_request("Validation error").with_details(err.to_string())
    }
}

/// Tags a failed step of a unit of work with a stable code.
///
/// The underlying error is logged and its kind (and transient flag) preserved; on
/// success the value passes through untouched.
pub trait StepContext<T> {
    fn step(self, code: &'static str, message: &'static str) -> Result<T, AppError>;
}

impl<T> StepContext<T> for Result<T, sqlx::Error> {
    fn step(self, code: &'static str, message: &'static str) -> Result<T, AppError> {
        self.map_err(|err| {
            error!(code, "{}: {}", message, err);
            let mut app_err = AppError::from(err);
            app_err.code = Some(code);
            app_err.message = message;
            app_err
        })
    }
}

impl<T> StepContext<T> for Result<T, AppError> {
    fn step(self, code: &'static str, message: &'static str) -> Result<T, AppError> {
        self.map_err(|mut err| {
            error!(code, "{}: {}", message, err);
            err.code = Some(code);
            err.message = message;
            err
        })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        // 5xx details may leak internals
        let details = if status.is_server_error() {
            None
        } else {
            self.details
        };
        let body = Json(ErrorResponse {
            error: self.message,
            code: self.code,
            details,
        });
        (status, body).into_response()
    }
}
