//! Domain entities: remote items and changesets as read from the server

use chrono::{DateTime, Utc};

/// Kind of a remote file-system entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    File,
    Folder,
    /// Anything the server reports that is neither a file nor a folder
    Any,
}

/// File or folder entry in the remote tree at some version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Full server path, e.g. `$/Project/Sub/readme.txt`
    pub server_path: String,
    pub kind: ItemKind,
    /// Changeset in which this version of the item was last changed
    pub changeset_id: u32,
    /// Content length in bytes (files only, when the server reports it)
    pub size: Option<u64>,
}

impl Item {
    pub fn file(server_path: impl Into<String>, changeset_id: u32) -> Self {
        Self {
            server_path: server_path.into(),
            kind: ItemKind::File,
            changeset_id,
            size: None,
        }
    }

    pub fn folder(server_path: impl Into<String>, changeset_id: u32) -> Self {
        Self {
            server_path: server_path.into(),
            kind: ItemKind::Folder,
            changeset_id,
            size: None,
        }
    }
}

/// A user identity as shown in history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    /// Account name, e.g. `DOMAIN\alice` or `alice@example.com`
    pub unique_name: String,
    pub display_name: String,
}

impl Identity {
    pub fn new(unique_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            unique_name: unique_name.into(),
            display_name: display_name.into(),
        }
    }
}

/// Named check-in note value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckinNote {
    pub name: String,
    pub value: String,
}

/// Check-in policy that failed and was overridden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyFailure {
    pub policy_name: String,
    pub message: String,
}

/// Reason and failures recorded when check-in policies were overridden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyOverride {
    pub comment: Option<String>,
    pub failures: Vec<PolicyFailure>,
}

/// Work item linked to a changeset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItemRef {
    pub id: u32,
    pub title: String,
}

/// One committed changeset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changeset {
    pub id: u32,
    pub owner: Identity,
    pub committer: Identity,
    pub created: DateTime<Utc>,
    pub comment: Option<String>,
    pub checkin_notes: Vec<CheckinNote>,
    pub policy_override: Option<PolicyOverride>,
    pub work_items: Vec<WorkItemRef>,
}

impl Changeset {
    /// Changeset owned and committed by the same identity, without details.
    pub fn new(id: u32, author: Identity, created: DateTime<Utc>, comment: Option<String>) -> Self {
        Self {
            id,
            owner: author.clone(),
            committer: author,
            created,
            comment,
            checkin_notes: Vec::new(),
            policy_override: None,
            work_items: Vec::new(),
        }
    }

    /// Comment text, empty when the server sent none.
    pub fn comment_text(&self) -> &str {
        self.comment.as_deref().unwrap_or("")
    }

    /// Policy override with at least one recorded failure.
    pub fn overridden_policies(&self) -> Option<&PolicyOverride> {
        self.policy_override
            .as_ref()
            .filter(|po| !po.failures.is_empty())
    }
}

/// Single item change within a changeset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub change_type: crate::domain::ChangeType,
    pub server_path: String,
}
