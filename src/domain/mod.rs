//! Domain layer: entities and pure logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no HTTP).

pub mod change_type;
pub mod credential;
pub mod entities;
pub mod error;
pub mod mapping;
pub mod version;

pub use change_type::ChangeType;
pub use credential::{Credential, PromptMode};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use mapping::local_item_path;
pub use version::{VersionRange, VersionSpec};
