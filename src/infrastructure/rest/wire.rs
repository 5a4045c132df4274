//! JSON shapes of the TFVC REST API and their conversion into domain types

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::{
    ChangeType, Changeset, CheckinNote, Identity, Item, ItemKind, PolicyFailure, PolicyOverride,
    WorkItemRef,
};

/// `{ "count": n, "value": [...] }` envelope of list responses.
#[derive(Debug, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionData {
    pub authenticated_user: Option<ConnectionUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionUser {
    pub provider_display_name: Option<String>,
    pub custom_display_name: Option<String>,
}

/// Error body returned by the server, e.g. `{"message": "TF401019: ..."}`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TfvcItem {
    pub path: String,
    pub version: Option<u32>,
    #[serde(default)]
    pub is_folder: bool,
    #[serde(default)]
    pub is_sym_link: bool,
    #[serde(default)]
    pub is_pending_change: bool,
    pub size: Option<u64>,
}

impl From<TfvcItem> for Item {
    fn from(dto: TfvcItem) -> Self {
        let kind = if dto.is_sym_link || dto.is_pending_change {
            ItemKind::Any
        } else if dto.is_folder {
            ItemKind::Folder
        } else {
            ItemKind::File
        };
        Item {
            server_path: dto.path,
            kind,
            changeset_id: dto.version.unwrap_or(0),
            size: dto.size,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    pub display_name: Option<String>,
    pub unique_name: Option<String>,
}

impl From<IdentityRef> for Identity {
    fn from(dto: IdentityRef) -> Self {
        let unique_name = dto.unique_name.unwrap_or_default();
        let display_name = dto.display_name.unwrap_or_else(|| unique_name.clone());
        Identity {
            unique_name,
            display_name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NoteValue {
    pub name: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyFailureInfo {
    pub policy_name: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyOverrideInfo {
    pub comment: Option<String>,
    pub policy_failures: Option<Vec<PolicyFailureInfo>>,
}

#[derive(Debug, Deserialize)]
pub struct AssociatedWorkItem {
    pub id: u32,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TfvcChangeset {
    pub changeset_id: u32,
    pub author: Option<IdentityRef>,
    pub checked_in_by: Option<IdentityRef>,
    pub created_date: DateTime<Utc>,
    pub comment: Option<String>,
    pub checkin_notes: Option<Vec<NoteValue>>,
    pub policy_override: Option<PolicyOverrideInfo>,
    pub work_items: Option<Vec<AssociatedWorkItem>>,
}

impl From<TfvcChangeset> for Changeset {
    fn from(dto: TfvcChangeset) -> Self {
        let owner: Identity = dto.author.map(Identity::from).unwrap_or_default();
        let committer = dto
            .checked_in_by
            .map(Identity::from)
            .unwrap_or_else(|| owner.clone());
        Changeset {
            id: dto.changeset_id,
            owner,
            committer,
            created: dto.created_date,
            comment: dto.comment,
            checkin_notes: dto
                .checkin_notes
                .unwrap_or_default()
                .into_iter()
                .map(|n| CheckinNote {
                    name: n.name.unwrap_or_default(),
                    value: n.value.unwrap_or_default(),
                })
                .collect(),
            policy_override: dto.policy_override.map(|po| PolicyOverride {
                comment: po.comment,
                failures: po
                    .policy_failures
                    .unwrap_or_default()
                    .into_iter()
                    .map(|f| PolicyFailure {
                        policy_name: f.policy_name.unwrap_or_default(),
                        message: f.message.unwrap_or_default(),
                    })
                    .collect(),
            }),
            work_items: dto
                .work_items
                .unwrap_or_default()
                .into_iter()
                .map(|w| WorkItemRef {
                    id: w.id,
                    title: w.title.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// Change kind as sent by the server: either `"edit, rename"` or a bit mask.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireChangeType {
    Names(String),
    Bits(u32),
}

impl WireChangeType {
    /// Recognized kinds plus the names that were not understood.
    pub fn decode(&self) -> (ChangeType, Vec<String>) {
        match self {
            Self::Names(names) => ChangeType::from_wire(names),
            Self::Bits(bits) => (ChangeType::from_bits_truncate(*bits), Vec::new()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TfvcChange {
    pub item: TfvcItem,
    pub change_type: WireChangeType,
}
