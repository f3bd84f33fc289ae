use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base type of a repository node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Folder,
    Document,
}

/// Actions a repository may allow on an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    CanGetProperties,
    CanCreateDocument,
    CanCreateFolder,
    CanDeleteObject,
    CanSetContentStream,
    CanGetContentStream,
}

/// Snapshot of one remote repository node.
///
/// Objects are fetched on demand and never cached across driver calls;
/// a handle reflects the repository state at the time of the fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryObject {
    /// Repository UUID, possibly carrying a `;MAJ.MIN` version suffix.
    pub id: String,
    pub name: String,
    /// Absent for the repository root.
    pub parent_id: Option<String>,
    pub kind: ObjectKind,
    /// Content stream length (None for folders).
    pub size: Option<u64>,
    pub mime_type: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    /// Allowable-action set; None when the repository supplies none.
    pub allowed_actions: Option<Vec<Action>>,
    /// Direct content or rendition URL, when the repository exposes one.
    pub content_url: Option<String>,
}

impl RepositoryObject {
    /// Create a new folder handle.
    pub fn folder(id: impl Into<String>, name: impl Into<String>, parent_id: Option<String>) -> Self {
        RepositoryObject {
            id: id.into(),
            name: name.into(),
            parent_id,
            kind: ObjectKind::Folder,
            size: None,
            mime_type: None,
            created: None,
            modified: None,
            allowed_actions: None,
            content_url: None,
        }
    }

    /// Create a new document handle.
    pub fn document(
        id: impl Into<String>,
        name: impl Into<String>,
        parent_id: Option<String>,
        size: u64,
    ) -> Self {
        RepositoryObject {
            id: id.into(),
            name: name.into(),
            parent_id,
            kind: ObjectKind::Document,
            size: Some(size),
            mime_type: None,
            created: None,
            modified: None,
            allowed_actions: None,
            content_url: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ObjectKind::Folder
    }

    pub fn is_document(&self) -> bool {
        self.kind == ObjectKind::Document
    }
}

/// Host-defined roles reserved folders are tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderRole {
    Processed,
    UserUpload,
    Temporary,
    Recycler,
}

impl FolderRole {
    /// The reserved folder name carrying this role.
    pub fn folder_name(&self) -> &'static str {
        match self {
            FolderRole::Processed => crate::FOLDER_PROCESSED,
            FolderRole::UserUpload => crate::FOLDER_DEFAULT,
            FolderRole::Temporary => crate::FOLDER_TEMP,
            FolderRole::Recycler => crate::FOLDER_RECYCLER,
        }
    }

    /// The role a reserved folder name maps to, if any.
    pub fn from_folder_name(name: &str) -> Option<Self> {
        match name {
            crate::FOLDER_PROCESSED => Some(FolderRole::Processed),
            crate::FOLDER_DEFAULT => Some(FolderRole::UserUpload),
            crate::FOLDER_TEMP => Some(FolderRole::Temporary),
            crate::FOLDER_RECYCLER => Some(FolderRole::Recycler),
            _ => None,
        }
    }
}
