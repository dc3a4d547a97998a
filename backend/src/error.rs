use thiserror::Error;

use crate::database::DatabaseError;

/// Request-level failure taxonomy. Missing forecast data is not an error:
/// the scorer resolves it with documented defaults instead.
#[derive(Debug, Error)]
pub enum HoriError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{service} unavailable: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

impl HoriError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        HoriError::InvalidInput(message.into())
    }

    pub fn upstream(service: &'static str, message: impl ToString) -> Self {
        HoriError::Upstream {
            service,
            message: message.to_string(),
        }
    }
}
