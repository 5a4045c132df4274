//! Application-level errors (wraps domain and remote client errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::RemoteError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("TFS Authentication Failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("{0}")]
    Remote(#[from] RemoteError),

    #[error("unexpected item type for {0}: not sure what to do with this")]
    UnexpectedItemType(String),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
