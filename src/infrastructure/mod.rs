//! Infrastructure layer: I/O implementations and DI container
//!
//! This layer implements the capability traits the application depends on:
//! the remote version control client, the local filesystem and the prompt.

pub mod di;
pub mod error;
pub mod rest;
pub mod traits;

pub use error::{InfraError, InfraResult, RemoteError, RemoteResult};
