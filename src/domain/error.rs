//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent invalid user input or contract violations
/// detected without touching the network or the disk.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid version specification: {spec}: {reason}")]
    InvalidVersionSpec { spec: String, reason: String },

    #[error("server item {item} is not below project path {project}")]
    OutsideProject { project: String, item: String },

    #[error("invalid server path: {0}")]
    InvalidServerPath(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
