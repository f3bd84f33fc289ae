//! Renames, moves, copies and content replacement.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use tracing::debug;

use cmisfs_core::{property, DriverError, FolderSpec, ObjectKind};
use serde_json::{Map, Value};

use crate::driver::CmisFilesystemDriver;

/// Sub-driver for operations changing existing objects.
pub(crate) struct ModificationDriver<'d> {
    driver: &'d CmisFilesystemDriver,
}

impl<'d> ModificationDriver<'d> {
    pub fn new(driver: &'d CmisFilesystemDriver) -> Self {
        ModificationDriver { driver }
    }

    /// Rename an object. Renaming to the current name is a no-op that
    /// still reports success, so idempotent host retries stay cheap.
    pub async fn rename(&self, identifier: &str, new_name: &str) -> Result<String, DriverError> {
        let object = self.driver.object_by_identifier(identifier, None).await?;
        if object.name == new_name {
            return Ok(object.id);
        }
        let session = self.driver.session()?;
        let mut properties = Map::new();
        properties.insert(property::NAME.to_string(), Value::from(new_name));
        let updated = session.update_properties(&object.id, properties).await?;
        Ok(updated.id)
    }

    /// Move an object into another folder; a differing target name is
    /// applied as a rename before the move.
    pub async fn move_within(
        &self,
        identifier: &str,
        target_folder_identifier: &str,
        new_name: &str,
    ) -> Result<String, DriverError> {
        let renamed = self.rename(identifier, new_name).await?;
        let object = self.driver.object_by_identifier(&renamed, None).await?;
        let target = self
            .driver
            .object_by_identifier(target_folder_identifier, None)
            .await?;
        let source_folder = match &object.parent_id {
            Some(id) => id.clone(),
            None => self.driver.root_level_folder().await?,
        };
        let session = self.driver.session()?;
        let moved = session
            .move_object(&object.id, &source_folder, &target.id)
            .await?;
        debug!(object = %moved, target = %target.id, "object moved");
        Ok(moved)
    }

    /// Copy a document into another folder; the repository duplicates the
    /// content server-side. A differing target name is applied to the copy.
    pub async fn copy_file(
        &self,
        identifier: &str,
        target_folder_identifier: &str,
        new_name: &str,
    ) -> Result<String, DriverError> {
        let source = self.driver.object_by_identifier(identifier, None).await?;
        let target = self
            .driver
            .object_by_identifier(target_folder_identifier, None)
            .await?;
        let session = self.driver.session()?;
        let copy_id = session.copy(&source.id, &target.id).await?;
        if source.name != new_name {
            let mut properties = Map::new();
            properties.insert(property::NAME.to_string(), Value::from(new_name));
            session.update_properties(&copy_id, properties).await?;
        }
        Ok(copy_id)
    }

    /// Recursively copy a folder into another folder under a new name.
    pub async fn copy_folder(
        &self,
        identifier: &str,
        target_folder_identifier: &str,
        new_folder_name: &str,
    ) -> Result<String, DriverError> {
        let source = self.driver.object_by_identifier(identifier, None).await?;
        let target = self
            .driver
            .object_by_identifier(target_folder_identifier, None)
            .await?;
        let copy_id = self
            .driver
            .create_folder(new_folder_name, &target.id, false)
            .await?;
        self.copy_children(source.id, copy_id.clone()).await?;
        Ok(copy_id)
    }

    /// Copy all children of one folder into another, depth-first.
    fn copy_children(
        &self,
        source_id: String,
        target_id: String,
    ) -> Pin<Box<dyn Future<Output = Result<(), DriverError>> + Send + '_>> {
        Box::pin(async move {
            let session = self.driver.session()?;
            for child in session.children(&source_id).await? {
                match child.kind {
                    ObjectKind::Document => {
                        session.copy(&child.id, &target_id).await?;
                    }
                    ObjectKind::Folder => {
                        let folder_copy = session
                            .create_folder(&FolderSpec::new(&child.name), &target_id)
                            .await?;
                        self.copy_children(child.id, folder_copy).await?;
                    }
                }
            }
            Ok(())
        })
    }

    /// Replace a document's content with the bytes of a local file.
    pub async fn replace(
        &self,
        identifier: &str,
        local_path: &Path,
    ) -> Result<bool, DriverError> {
        let content = tokio::fs::read(local_path).await?;
        let object = self.driver.object_by_identifier(identifier, None).await?;
        let session = self.driver.session()?;
        session.set_content(&object.id, content, true).await?;
        Ok(true)
    }
}
