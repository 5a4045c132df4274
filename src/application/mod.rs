//! Application layer: tasks and the pipeline that runs them
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod pipeline;
pub mod services;
pub mod warnings;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use pipeline::{ConnectionParams, Session, Stage, Task, TaskRunner};
pub use warnings::WarningQueue;
