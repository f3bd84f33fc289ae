//! Identifier lookups the host queries without changing anything.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use cmisfs_core::{
    Action, DriverError, FolderSpec, ObjectKind, OperationContext, SessionError, FOLDER_DEFAULT,
    FOLDER_SHARED,
};

use crate::driver::CmisFilesystemDriver;

/// Read and write permission flags for one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Permissions {
    #[serde(rename = "r")]
    pub read: bool,
    #[serde(rename = "w")]
    pub write: bool,
}

/// Sub-driver for read-only lookups.
pub(crate) struct ResolvingDriver<'d> {
    driver: &'d CmisFilesystemDriver,
}

impl<'d> ResolvingDriver<'d> {
    pub fn new(driver: &'d CmisFilesystemDriver) -> Self {
        ResolvingDriver { driver }
    }

    /// Identifier of the storage root: the configured folder when set,
    /// otherwise the well-known shared folder under the connection root.
    /// A storage with neither is unusable and reports a configuration
    /// error instead of guessing.
    pub async fn root_level_folder(&self) -> Result<String, DriverError> {
        if let Some(folder) = self.driver.config().folder.as_deref() {
            if !folder.is_empty() {
                return Ok(folder.to_string());
            }
        }

        let session = self.driver.session()?;
        let root = session.root_folder().await?;
        let shared = session
            .children(&root.id)
            .await?
            .into_iter()
            .find(|child| child.is_folder() && child.name == FOLDER_SHARED);
        match shared {
            Some(folder) => Ok(folder.id),
            None => Err(DriverError::Configuration(format!(
                "Unable to determine a root level folder: no folder configured and no \
                 '{}' folder found in the repository",
                FOLDER_SHARED
            ))),
        }
    }

    /// Identifier of the default upload folder, created on first use.
    pub async fn default_folder(&self) -> Result<String, DriverError> {
        match self.driver.object_by_path(FOLDER_DEFAULT, None).await? {
            Some(folder) => Ok(folder.id),
            None => {
                debug!(name = FOLDER_DEFAULT, "creating default upload folder");
                self.driver.create_folder(FOLDER_DEFAULT, "", false).await
            }
        }
    }

    /// Identifier of the parent folder of an object; the storage root is
    /// its own parent.
    pub async fn parent_folder_identifier(&self, identifier: &str) -> Result<String, DriverError> {
        let object = self.driver.object_by_identifier(identifier, None).await?;
        match object.parent_id {
            Some(parent) => Ok(parent),
            None => self.root_level_folder().await,
        }
    }

    /// Metadata for a file identifier. Resolving to a folder instead is
    /// reported as a missing file.
    pub async fn file_info_by_identifier(
        &self,
        identifier: &str,
        keys: &[&str],
    ) -> Result<IndexMap<String, Value>, DriverError> {
        let object = self.driver.object_by_identifier(identifier, None).await?;
        if !object.is_document() {
            return Err(DriverError::FileNotFound(identifier.to_string()));
        }
        self.driver.extract_file_information(&object, keys).await
    }

    /// Metadata for a folder identifier. Resolving to a document instead
    /// is reported as a missing folder.
    pub async fn folder_info_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<IndexMap<String, Value>, DriverError> {
        let object = self.driver.object_by_identifier(identifier, None).await?;
        if !object.is_folder() {
            return Err(DriverError::FolderNotFound(identifier.to_string()));
        }
        let mut information = IndexMap::new();
        information.insert("identifier".to_string(), Value::from(object.id.clone()));
        information.insert("name".to_string(), Value::from(object.name.clone()));
        information.insert("storage".to_string(), Value::from(self.driver.storage_uid()));
        Ok(information)
    }

    /// Identifier of the named document inside a folder.
    pub async fn file_in_folder(
        &self,
        name: &str,
        folder_identifier: &str,
    ) -> Result<String, DriverError> {
        let folder = self.driver.object_by_identifier(folder_identifier, None).await?;
        match self.driver.child_by_name(&folder.id, name).await? {
            Some(child) if child.is_document() => Ok(child.id),
            _ => Err(DriverError::FileNotFound(name.to_string())),
        }
    }

    /// Identifier of the named folder inside a folder.
    pub async fn folder_in_folder(
        &self,
        name: &str,
        folder_identifier: &str,
    ) -> Result<String, DriverError> {
        let folder = self.driver.object_by_identifier(folder_identifier, None).await?;
        match self.driver.child_by_name(&folder.id, name).await? {
            Some(child) if child.is_folder() => Ok(child.id),
            _ => Err(DriverError::FolderNotFound(name.to_string())),
        }
    }

    /// Document identifiers directly inside a folder. The range,
    /// recursion and filter arguments exist for host interface
    /// compatibility; the listing is always flat and complete.
    pub async fn files_in_folder(
        &self,
        folder_identifier: &str,
        _start: usize,
        _count: usize,
        _recursive: bool,
        _filters: &[&str],
    ) -> Result<Vec<String>, DriverError> {
        let folder = self.driver.object_by_identifier(folder_identifier, None).await?;
        self.driver
            .child_identifiers(&folder.id, Some(ObjectKind::Document))
            .await
    }

    /// Folder identifiers directly inside a folder.
    pub async fn folders_in_folder(
        &self,
        folder_identifier: &str,
        _start: usize,
        _count: usize,
        _recursive: bool,
        _filters: &[&str],
    ) -> Result<Vec<String>, DriverError> {
        let folder = self.driver.object_by_identifier(folder_identifier, None).await?;
        self.driver
            .child_identifiers(&folder.id, Some(ObjectKind::Folder))
            .await
    }

    /// Permissions derived from the repository's allowable actions.
    ///
    /// Write is granted when any create or delete action is allowed; an
    /// object without an action list is treated as readable.
    pub async fn permissions(&self, identifier: &str) -> Result<Permissions, DriverError> {
        let object = self.driver.object_by_identifier(identifier, None).await?;
        let permissions = match &object.allowed_actions {
            None => Permissions {
                read: true,
                write: false,
            },
            Some(actions) => Permissions {
                read: actions.contains(&Action::CanGetProperties),
                write: actions.contains(&Action::CanCreateDocument)
                    || actions.contains(&Action::CanCreateFolder)
                    || actions.contains(&Action::CanDeleteObject),
            },
        };
        Ok(permissions)
    }

    /// Publicly reachable URL of a document, when the repository exposes
    /// one. Folders and unresolvable identifiers yield none.
    pub async fn public_url(&self, identifier: &str) -> Result<Option<String>, DriverError> {
        match self.driver.resolve_optional(identifier).await? {
            Some(object) if object.is_document() => Ok(object.content_url),
            _ => Ok(None),
        }
    }

    /// URL of a rendition matching the filter. A document without one is
    /// an error, since the caller asked for public delivery; folders
    /// yield none.
    pub async fn rendition_url(
        &self,
        identifier: &str,
        rendition_filter: &str,
    ) -> Result<Option<String>, DriverError> {
        let context = OperationContext::with_rendition_filter(rendition_filter);
        let object = self
            .driver
            .object_by_identifier(identifier, Some(&context))
            .await?;
        if !object.is_document() {
            return Ok(None);
        }
        match object.content_url {
            Some(url) => Ok(Some(url)),
            None => Err(DriverError::MissingRendition(identifier.to_string())),
        }
    }

    /// Resolve a top-level folder by name directly under the connection
    /// root, creating it when missing. Used when provisioning storages.
    pub async fn resolve_or_create_storage_root(&self, name: &str) -> Result<String, DriverError> {
        let session = self.driver.session()?;
        let root = session.root_folder().await?;
        let existing = session
            .children(&root.id)
            .await?
            .into_iter()
            .find(|child| child.is_folder() && child.name == name);
        if let Some(folder) = existing {
            return Ok(folder.id);
        }
        match session.create_folder(&FolderSpec::new(name), &root.id).await {
            Ok(id) => Ok(id),
            Err(SessionError::Conflict(_)) => self
                .driver
                .child_by_name(&root.id, name)
                .await?
                .map(|child| child.id)
                .ok_or_else(|| DriverError::NotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}
