//! I/O boundary traits for testability
//!
//! The remote version control client is reached only through the narrow
//! `Connector`/`VersionControl` capability set, so the task logic runs
//! against the REST client in production and an in-memory server in tests.

use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::mpsc::Sender;

use crate::domain::{Change, Changeset, Credential, Item, VersionRange, VersionSpec};
use crate::infrastructure::RemoteResult;

/// Warning reported by the client during a long operation. Never aborts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonFatalError {
    pub message: String,
}

impl NonFatalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Channel end the client uses to report non-fatal errors.
pub type Notifier = Sender<NonFatalError>;

/// Parameters of a changeset history query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub path: String,
    pub recursive: bool,
    pub range: VersionRange,
    /// Also fetch check-in notes, policy overrides and work items
    pub include_details: bool,
}

/// Opens connections to a version control server.
pub trait Connector: Send + Sync {
    /// Open a connection. No request is made until the first call on it.
    ///
    /// `credential: None` means the ambient/default identity.
    fn connect(
        &self,
        url: &str,
        credential: Option<&Credential>,
        notifier: Notifier,
    ) -> RemoteResult<Box<dyn VersionControl>>;
}

/// Open connection to a version control server.
///
/// Dropping the connection releases it.
pub trait VersionControl {
    /// Verify the credential. Returns the authenticated user's display name.
    fn authenticate(&self) -> RemoteResult<String>;

    /// All items below `path` (inclusive, fully recursive) at `version`.
    fn list_items(&self, path: &str, version: &VersionSpec) -> RemoteResult<Vec<Item>>;

    /// Content stream of a file item.
    fn download(&self, item: &Item) -> RemoteResult<Box<dyn Read + Send>>;

    /// Changesets matching the query, newest first.
    fn query_history(&self, query: &HistoryQuery) -> RemoteResult<Vec<Changeset>>;

    /// Item changes recorded in one changeset.
    fn changes_for_changeset(&self, changeset_id: u32) -> RemoteResult<Vec<Change>>;
}

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create or truncate a file for writing.
    fn create_file(&self, path: &Path) -> io::Result<Box<dyn Write>>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// Interactive password prompt abstraction.
pub trait Prompter: Send + Sync {
    /// Ask for the password of `user` on `url`.
    fn prompt_password(&self, user: &str, url: &str) -> io::Result<String>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn create_file(&self, path: &Path) -> io::Result<Box<dyn Write>> {
        let file = std::fs::File::create(path)?;
        Ok(Box::new(io::BufWriter::new(file)))
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Real prompt reading the password from stdin.
///
/// The question goes to stderr so piped history output stays clean.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn prompt_password(&self, user: &str, url: &str) -> io::Result<String> {
        use colored::Colorize;

        let mut stderr = io::stderr();
        write!(
            stderr,
            "{} ",
            format!("Password for '{}' on {}:", user, url).cyan()
        )?;
        stderr.flush()?;

        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        let password = line.trim_end_matches(['\r', '\n']).to_string();
        if password.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no password entered",
            ));
        }
        Ok(password)
    }
}
