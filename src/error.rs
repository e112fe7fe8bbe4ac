use thiserror::Error;

use crate::models::DiscoveredStatus;

pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the discovery pipeline and the persistence layer.
///
/// Configuration problems are distinct from transport problems, and
/// constraint violations are distinct from "not found" so callers can
/// decide whether a failure is retryable, a duplicate, or a bug.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API request timed out")]
    Timeout,

    #[error("HTTP error: {status}{}", body_suffix(.body))]
    Http { status: u16, body: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Job is already {0}")]
    AlreadyProcessed(DiscoveredStatus),

    #[error("Invalid {field} value: '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {}", body)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(failure, msg)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::Constraint(
                    msg.clone()
                        .unwrap_or_else(|| "constraint violation".to_string()),
                )
            }
            _ => Error::Database(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_includes_status_and_body() {
        let err = Error::Http {
            status: 429,
            body: "rate limited".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("rate limited"));
    }

    #[test]
    fn test_http_error_without_body() {
        let err = Error::Http {
            status: 500,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "HTTP error: 500");
    }

    #[test]
    fn test_already_processed_message() {
        let err = Error::AlreadyProcessed(DiscoveredStatus::Promoted);
        assert_eq!(err.to_string(), "Job is already promoted");
    }
}
