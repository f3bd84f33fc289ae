//! Object creation.

use std::path::Path;

use tracing::debug;

use cmisfs_core::{property, DocumentSpec, DriverError, FolderSpec, SessionError};
use serde_json::Value;

use crate::driver::CmisFilesystemDriver;

/// Sub-driver for creating folders and files.
pub(crate) struct CreationDriver<'d> {
    driver: &'d CmisFilesystemDriver,
}

impl<'d> CreationDriver<'d> {
    pub fn new(driver: &'d CmisFilesystemDriver) -> Self {
        CreationDriver { driver }
    }

    /// Create a folder inside the parent, returning the new identifier.
    ///
    /// A name conflict is not an error: the existing folder wins and its
    /// identifier is returned, so concurrent creators converge.
    pub async fn create_folder(
        &self,
        name: &str,
        parent_identifier: &str,
        _recursive: bool,
    ) -> Result<String, DriverError> {
        let parent = self.driver.object_by_identifier(parent_identifier, None).await?;
        let session = self.driver.session()?;
        match session.create_folder(&FolderSpec::new(name), &parent.id).await {
            Ok(id) => Ok(id),
            Err(SessionError::Conflict(_)) => {
                debug!(name, parent = %parent.id, "folder exists, reusing");
                self.driver
                    .child_by_name(&parent.id, name)
                    .await?
                    .map(|child| child.id)
                    .ok_or_else(|| DriverError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create a document inside the parent, tagged with the host-file
    /// aspect so the host indexer can attach record data later.
    pub async fn create_file(
        &self,
        name: &str,
        parent_identifier: &str,
        content: Option<Vec<u8>>,
    ) -> Result<String, DriverError> {
        let parent = self.driver.object_by_identifier(parent_identifier, None).await?;
        let session = self.driver.session()?;
        let spec = DocumentSpec::new(name)
            .property(
                property::SECONDARY_OBJECT_TYPE_IDS,
                Value::from(vec![property::ASPECT_HOST_FILE]),
            )
            .property(
                property::RAW_DATA,
                format!("{}/{}", parent_identifier.trim_end_matches('/'), name),
            )
            .property(property::SOURCE_TABLE, "file")
            .property(property::SOURCE_UID, 0);
        Ok(session.create_document(&spec, &parent.id, content).await?)
    }

    /// Upload a local file into the target folder. The file keeps its
    /// local name unless `new_name` overrides it.
    ///
    /// `remove_original` is accepted for host interface compatibility;
    /// removing the local source is the caller's responsibility.
    pub async fn add_file(
        &self,
        local_path: &Path,
        target_folder_identifier: &str,
        new_name: Option<&str>,
        _remove_original: bool,
    ) -> Result<String, DriverError> {
        let name = match new_name {
            Some(name) => name.to_string(),
            None => local_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    DriverError::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("local path has no file name: {}", local_path.display()),
                    ))
                })?,
        };
        let content = tokio::fs::read(local_path).await?;
        self.create_file(&name, target_folder_identifier, Some(content))
            .await
    }
}
