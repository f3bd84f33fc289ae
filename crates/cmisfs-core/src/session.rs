use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::SessionError;
use crate::object::RepositoryObject;

/// Per-fetch options for [`Session::object`].
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    /// Rendition kinds to resolve (e.g. `cmis:thumbnail`); when set, the
    /// returned object's `content_url` points at the first matching
    /// rendition instead of the primary content stream.
    pub rendition_filter: Option<String>,
}

impl OperationContext {
    pub fn with_rendition_filter(filter: impl Into<String>) -> Self {
        OperationContext {
            rendition_filter: Some(filter.into()),
        }
    }
}

/// Properties for a folder to be created.
#[derive(Debug, Clone)]
pub struct FolderSpec {
    pub name: String,
}

impl FolderSpec {
    pub fn new(name: impl Into<String>) -> Self {
        FolderSpec { name: name.into() }
    }
}

/// Properties for a document to be created.
#[derive(Debug, Clone, Default)]
pub struct DocumentSpec {
    pub name: String,
    pub mime_type: Option<String>,
    /// Additional CMIS properties (aspect tagging etc.), keyed by property id.
    pub properties: Map<String, Value>,
}

impl DocumentSpec {
    pub fn new(name: impl Into<String>) -> Self {
        DocumentSpec {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn property(mut self, id: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(id.to_string(), value.into());
        self
    }
}

/// An authenticated handle to one remote repository.
///
/// All identifiers are repository UUIDs; emulated slash paths are a driver
/// concern and never reach this trait. Implementations are responsible for
/// transport-level timeouts and retries; the driver performs none.
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// Fetch one object by id.
    async fn object(
        &self,
        id: &str,
        context: Option<&OperationContext>,
    ) -> Result<RepositoryObject, SessionError>;

    /// Fetch the repository's top-level root folder.
    async fn root_folder(&self) -> Result<RepositoryObject, SessionError>;

    /// List the immediate children of a folder.
    async fn children(&self, folder_id: &str) -> Result<Vec<RepositoryObject>, SessionError>;

    /// Create a folder under `parent_id`, returning the new identifier.
    ///
    /// Fails with [`SessionError::Conflict`] when an object of the same
    /// name already exists in the parent.
    async fn create_folder(&self, spec: &FolderSpec, parent_id: &str)
        -> Result<String, SessionError>;

    /// Create a document under `parent_id`, returning the new identifier.
    async fn create_document(
        &self,
        spec: &DocumentSpec,
        parent_id: &str,
        content: Option<Vec<u8>>,
    ) -> Result<String, SessionError>;

    /// Update properties of an object, returning the refreshed handle.
    async fn update_properties(
        &self,
        id: &str,
        properties: Map<String, Value>,
    ) -> Result<RepositoryObject, SessionError>;

    /// Replace (or set) the content stream of a document.
    async fn set_content(
        &self,
        id: &str,
        content: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), SessionError>;

    /// Fetch the full content stream of a document; None when the document
    /// has no content stream.
    async fn content(&self, id: &str) -> Result<Option<Vec<u8>>, SessionError>;

    /// Copy a document into a target folder, returning the copy's identifier.
    async fn copy(&self, id: &str, target_folder_id: &str) -> Result<String, SessionError>;

    /// Move an object between folders. The repository may or may not keep
    /// the identifier stable; the returned value is authoritative.
    async fn move_object(
        &self,
        id: &str,
        source_folder_id: &str,
        target_folder_id: &str,
    ) -> Result<String, SessionError>;

    /// Delete a single object.
    async fn delete(&self, id: &str) -> Result<(), SessionError>;

    /// Delete a folder tree, unfiling rather than orphaning descendants.
    /// Returns the identifiers the repository could not delete.
    async fn delete_tree(&self, id: &str) -> Result<Vec<String>, SessionError>;

    /// Create a typed relationship between two objects, returning its id.
    async fn create_relationship(
        &self,
        type_id: &str,
        source_id: &str,
        target_id: &str,
    ) -> Result<String, SessionError>;
}

/// Supplies sessions for named repository connections.
pub trait SessionProvider: Send + Sync + 'static {
    /// Resolve the session for `connection`, or the default connection
    /// when `None`.
    fn session(&self, connection: Option<&str>) -> Result<Arc<dyn Session>, SessionError>;
}
