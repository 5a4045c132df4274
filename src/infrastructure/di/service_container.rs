//! Service container for dependency injection
//!
//! Wires the task runner with its collaborators.

use std::sync::Arc;

use crate::application::TaskRunner;
use crate::config::Settings;
use crate::infrastructure::rest::RestConnector;
use crate::infrastructure::traits::{
    Connector, FileSystem, Prompter, RealFileSystem, StdinPrompter,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Version control server access
    pub connector: Arc<dyn Connector>,

    /// Interactive password prompt
    pub prompter: Arc<dyn Prompter>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        let connector = Arc::new(RestConnector::new(settings.server.clone()));
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            connector,
            Arc::new(StdinPrompter),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        connector: Arc<dyn Connector>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            connector,
            prompter,
        }
    }

    /// Task runner sharing the container's collaborators.
    pub fn task_runner(&self) -> TaskRunner {
        TaskRunner::new(
            self.connector.clone(),
            self.fs.clone(),
            self.prompter.clone(),
        )
    }
}
