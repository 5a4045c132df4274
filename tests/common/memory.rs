//! In-memory version control server
//!
//! Holds a linear history of changesets, each with a full tree snapshot.

use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

use tfsget::domain::{Change, Changeset, Credential, Item, ItemKind, VersionRange, VersionSpec};
use tfsget::infrastructure::traits::{
    Connector, HistoryQuery, NonFatalError, Notifier, VersionControl,
};
use tfsget::infrastructure::{RemoteError, RemoteResult};

/// Entry of a tree snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryEntry {
    Folder(String),
    File(String, Vec<u8>),
    /// Entry of a kind the client does not understand
    Other(String),
}

impl MemoryEntry {
    fn path(&self) -> &str {
        match self {
            Self::Folder(p) | Self::File(p, _) | Self::Other(p) => p,
        }
    }
}

#[derive(Debug, Clone)]
struct Revision {
    changeset: Changeset,
    changes: Vec<Change>,
    tree: Vec<MemoryEntry>,
}

#[derive(Debug, Clone, Default)]
struct ServerData {
    revisions: Vec<Revision>,
    login: Option<(String, String)>,
    warnings: Vec<String>,
    missing_downloads: Vec<String>,
}

#[derive(Debug, Default)]
struct Counters {
    open: AtomicUsize,
    connects: AtomicUsize,
}

/// In-memory server implementing `Connector`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryServer {
    data: Arc<ServerData>,
    counters: Arc<Counters>,
}

impl InMemoryServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require this user and password; any other credential is rejected.
    pub fn with_login(mut self, user: &str, password: &str) -> Self {
        Arc::make_mut(&mut self.data).login = Some((user.to_string(), password.to_string()));
        self
    }

    /// Append a changeset with its changes and the full tree after it.
    pub fn with_changeset(
        mut self,
        changeset: Changeset,
        changes: Vec<Change>,
        tree: Vec<MemoryEntry>,
    ) -> Self {
        let data = Arc::make_mut(&mut self.data);
        data.revisions.push(Revision {
            changeset,
            changes,
            tree,
        });
        data.revisions.sort_by_key(|r| r.changeset.id);
        self
    }

    /// Report this non-fatal error on every history query.
    pub fn with_warning(mut self, message: &str) -> Self {
        Arc::make_mut(&mut self.data).warnings.push(message.to_string());
        self
    }

    /// Answer downloads of this file with `NotFound` although it is listed.
    pub fn with_missing_download(mut self, server_path: &str) -> Self {
        Arc::make_mut(&mut self.data)
            .missing_downloads
            .push(server_path.to_string());
        self
    }

    /// Connections currently open (not yet dropped).
    pub fn open_connections(&self) -> usize {
        self.counters.open.load(Ordering::SeqCst)
    }

    /// Connections opened so far.
    pub fn connect_count(&self) -> usize {
        self.counters.connects.load(Ordering::SeqCst)
    }
}

impl Connector for InMemoryServer {
    fn connect(
        &self,
        url: &str,
        credential: Option<&Credential>,
        notifier: Notifier,
    ) -> RemoteResult<Box<dyn VersionControl>> {
        debug!("connect: url={}", url);
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        self.counters.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection {
            data: Arc::clone(&self.data),
            counters: Arc::clone(&self.counters),
            url: url.to_string(),
            credential: credential.cloned(),
            notifier,
        }))
    }
}

struct MemoryConnection {
    data: Arc<ServerData>,
    counters: Arc<Counters>,
    url: String,
    credential: Option<Credential>,
    notifier: Notifier,
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.counters.open.fetch_sub(1, Ordering::SeqCst);
    }
}

fn is_under(path: &str, root: &str) -> bool {
    let root = root.trim_end_matches('/');
    path.len() >= root.len()
        && path.is_char_boundary(root.len())
        && path[..root.len()].eq_ignore_ascii_case(root)
        && (path.len() == root.len() || path[root.len()..].starts_with('/'))
}

impl MemoryConnection {
    fn revision_at(&self, version: &VersionSpec) -> Option<&Revision> {
        let revisions = &self.data.revisions;
        match version {
            VersionSpec::Latest => revisions.last(),
            VersionSpec::Changeset(id) => revisions.iter().rev().find(|r| r.changeset.id <= *id),
            VersionSpec::Date(date) => revisions
                .iter()
                .rev()
                .find(|r| r.changeset.created.date_naive() <= *date),
        }
    }

    fn in_range(&self, changeset: &Changeset, range: &VersionRange) -> bool {
        let after_start = match &range.start {
            None => true,
            Some(VersionSpec::Changeset(id)) => changeset.id >= *id,
            Some(VersionSpec::Date(date)) => changeset.created.date_naive() >= *date,
            Some(VersionSpec::Latest) => self
                .data
                .revisions
                .last()
                .map(|r| r.changeset.id == changeset.id)
                .unwrap_or(false),
        };
        let before_end = match &range.end {
            None | Some(VersionSpec::Latest) => true,
            Some(VersionSpec::Changeset(id)) => changeset.id <= *id,
            Some(VersionSpec::Date(date)) => changeset.created.date_naive() <= *date,
        };
        after_start && before_end
    }
}

impl VersionControl for MemoryConnection {
    fn authenticate(&self) -> RemoteResult<String> {
        match (&self.data.login, &self.credential) {
            (None, None) => Ok("anonymous".to_string()),
            (None, Some(cred)) => Ok(cred.user.clone()),
            (Some((user, password)), Some(cred))
                if &cred.user == user && cred.password.as_deref() == Some(password.as_str()) =>
            {
                Ok(user.clone())
            }
            _ => Err(RemoteError::Unauthorized(format!(
                "TF30063: You are not authorized to access {}.",
                self.url
            ))),
        }
    }

    fn list_items(&self, path: &str, version: &VersionSpec) -> RemoteResult<Vec<Item>> {
        let revision = self
            .revision_at(version)
            .ok_or_else(|| RemoteError::NotFound(format!("no version {} of {}", version, path)))?;
        let items: Vec<Item> = revision
            .tree
            .iter()
            .filter(|entry| is_under(entry.path(), path))
            .map(|entry| Item {
                server_path: entry.path().to_string(),
                kind: match entry {
                    MemoryEntry::Folder(_) => ItemKind::Folder,
                    MemoryEntry::File(..) => ItemKind::File,
                    MemoryEntry::Other(_) => ItemKind::Any,
                },
                changeset_id: revision.changeset.id,
                size: match entry {
                    MemoryEntry::File(_, content) => Some(content.len() as u64),
                    _ => None,
                },
            })
            .collect();
        if items.is_empty() {
            return Err(RemoteError::NotFound(format!(
                "{} does not exist at version {}",
                path, version
            )));
        }
        Ok(items)
    }

    fn download(&self, item: &Item) -> RemoteResult<Box<dyn Read + Send>> {
        if self
            .data
            .missing_downloads
            .iter()
            .any(|p| p.eq_ignore_ascii_case(&item.server_path))
        {
            return Err(RemoteError::NotFound(format!(
                "TF10169: {} was not found",
                item.server_path
            )));
        }
        let revision = self
            .revision_at(&VersionSpec::Changeset(item.changeset_id))
            .ok_or_else(|| RemoteError::NotFound(item.server_path.clone()))?;
        revision
            .tree
            .iter()
            .find_map(|entry| match entry {
                MemoryEntry::File(p, content) if p.eq_ignore_ascii_case(&item.server_path) => {
                    Some(Box::new(Cursor::new(content.clone())) as Box<dyn Read + Send>)
                }
                _ => None,
            })
            .ok_or_else(|| RemoteError::NotFound(item.server_path.clone()))
    }

    fn query_history(&self, query: &HistoryQuery) -> RemoteResult<Vec<Changeset>> {
        for warning in &self.data.warnings {
            let _ = self.notifier.send(NonFatalError::new(warning.clone()));
        }
        let history = self
            .data
            .revisions
            .iter()
            .rev()
            .filter(|r| {
                r.changes.is_empty()
                    || r.changes.iter().any(|c| is_under(&c.server_path, &query.path))
            })
            .filter(|r| self.in_range(&r.changeset, &query.range))
            .map(|r| {
                let mut changeset = r.changeset.clone();
                if !query.include_details {
                    changeset.checkin_notes.clear();
                    changeset.policy_override = None;
                    changeset.work_items.clear();
                }
                changeset
            })
            .collect();
        Ok(history)
    }

    fn changes_for_changeset(&self, changeset_id: u32) -> RemoteResult<Vec<Change>> {
        self.data
            .revisions
            .iter()
            .find(|r| r.changeset.id == changeset_id)
            .map(|r| r.changes.clone())
            .ok_or_else(|| RemoteError::NotFound(format!("changeset {}", changeset_id)))
    }
}
