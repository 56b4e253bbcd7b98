use std::result::Result as StdResult;

use thiserror::Error;

/// Error type shared by storage, services and configuration.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Operation not allowed: {0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = StdResult<T, TrackerError>;

impl TrackerError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        TrackerError::NotFound { entity, id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        TrackerError::Validation(message.into())
    }
}

impl From<rusqlite::Error> for TrackerError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                TrackerError::Conflict(message.unwrap_or_else(|| code.to_string()))
            }
            other => TrackerError::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_renders_entity_and_id() {
        let err = TrackerError::not_found("Budget", 7);
        assert_eq!(err.to_string(), "Budget 7 not found");
    }

    #[test]
    fn query_errors_map_to_storage() {
        let err = TrackerError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, TrackerError::Storage(_)));
    }
}
