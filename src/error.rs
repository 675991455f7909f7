//! Typed failures returned by every attendance operation.

use serde::Serialize;
use serde_json::{Value, json};

/// Message attached to every [`AppError::Duplicate`], whichever layer caught it.
pub const DUPLICATE_RECORD_MESSAGE: &str =
    "An attendance record already exists for this student and date; edit the existing record instead";

/// Serializable error body for consumers that render or forward failures.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Error taxonomy of the attendance core.
///
/// No operation swallows a failure: every store or validation problem reaches
/// the caller as one of these variants.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed input (unknown presence value, malformed date, bad pagination).
    #[error("{message}")]
    Validation { message: String, details: Value },

    /// A live record already exists for the `(student_id, date)` pair.
    #[error("{message}")]
    Duplicate { message: String, details: Value },

    /// `update`/`delete` referenced a record that does not exist.
    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// The actor lacks a managing role, or carries no role at all.
    #[error("{message}")]
    Permission { message: String, details: Value },

    /// The store could not be reached.
    #[error("{message}")]
    Connectivity { message: String, details: Value },

    /// Unexpected store failure.
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn duplicate(message: impl Into<String>, details: Value) -> Self {
        Self::Duplicate {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn permission_denied(message: impl Into<String>, details: Value) -> Self {
        Self::Permission {
            message: message.into(),
            details,
        }
    }
    pub fn connectivity(message: impl Into<String>, details: Value) -> Self {
        Self::Connectivity {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Stable machine-readable code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::Duplicate { .. } => "duplicate",
            AppError::NotFound { .. } => "not_found",
            AppError::Permission { .. } => "permission_denied",
            AppError::Connectivity { .. } => "connectivity_error",
            AppError::Internal { .. } => "internal_error",
        }
    }

    /// Structured details attached to the failure.
    pub fn details(&self) -> &Value {
        match self {
            AppError::Validation { details, .. }
            | AppError::Duplicate { details, .. }
            | AppError::NotFound { details, .. }
            | AppError::Permission { details, .. }
            | AppError::Connectivity { details, .. }
            | AppError::Internal { details, .. } => details,
        }
    }

    /// Whether a caller may retry a *read* that failed with this error.
    ///
    /// Writes are never retried on the caller's behalf.
    pub fn is_retryable_read(&self) -> bool {
        matches!(self, AppError::Connectivity { .. })
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        ErrorInfo {
            code: self.code(),
            message: self.to_string(),
            details: self.details().clone(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect();
        fields.sort();
        AppError::bad_request(
            "Validation failed",
            json!({ "fields": fields, "errors": errors }),
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

/// Translates a driver error into the attendance taxonomy.
///
/// Unique violations become [`AppError::Duplicate`]; pool and transport
/// failures become [`AppError::Connectivity`].
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error()
        && db.is_unique_violation()
    {
        return AppError::duplicate(
            DUPLICATE_RECORD_MESSAGE,
            json!({ "constraint": db.constraint() }),
        );
    }

    match &e {
        sqlx::Error::RowNotFound => AppError::not_found("Attendance record not found", json!({})),
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => AppError::connectivity(
            "Attendance store unreachable",
            json!({ "reason": e.to_string() }),
        ),
        _ => {
            tracing::error!(error = %e, "Unexpected attendance store error");
            AppError::internal("Database error", json!({}))
        }
    }
}
