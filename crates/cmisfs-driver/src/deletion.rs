//! Object deletion.

use tracing::{debug, warn};

use cmisfs_core::DriverError;

use crate::driver::CmisFilesystemDriver;

/// Sub-driver for deleting files and folder trees.
pub(crate) struct DeletionDriver<'d> {
    driver: &'d CmisFilesystemDriver,
}

impl<'d> DeletionDriver<'d> {
    pub fn new(driver: &'d CmisFilesystemDriver) -> Self {
        DeletionDriver { driver }
    }

    /// Delete a single file.
    pub async fn delete_file(&self, identifier: &str) -> Result<bool, DriverError> {
        let object = self.driver.object_by_identifier(identifier, None).await?;
        let session = self.driver.session()?;
        session.delete(&object.id).await?;
        Ok(true)
    }

    /// Delete a folder.
    ///
    /// A recursive deletion of a non-empty folder runs as a tree delete;
    /// it succeeds only when the repository reports zero undeleted
    /// descendants, and partial failures come back as `Ok(false)` rather
    /// than an error. Empty folders are deleted directly either way.
    pub async fn delete_folder(
        &self,
        identifier: &str,
        recursive: bool,
    ) -> Result<bool, DriverError> {
        let folder = self.driver.object_by_identifier(identifier, None).await?;
        let session = self.driver.session()?;
        let empty = session.children(&folder.id).await?.is_empty();

        if recursive && !empty {
            let failed = session.delete_tree(&folder.id).await?;
            if failed.is_empty() {
                debug!(folder = %folder.id, "folder tree deleted");
                Ok(true)
            } else {
                warn!(
                    folder = %folder.id,
                    undeleted = failed.len(),
                    "folder tree deletion left objects behind"
                );
                Ok(false)
            }
        } else {
            session.delete(&folder.id).await?;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cmisfs_config::StorageConfig;
    use cmisfs_core::{DocumentSpec, Session, SessionError};
    use cmisfs_session::{MemorySession, SingleSessionProvider};

    fn driver_for(session: &Arc<MemorySession>) -> CmisFilesystemDriver {
        let config = StorageConfig {
            folder: Some(session.root_id().to_string()),
            ..Default::default()
        };
        CmisFilesystemDriver::new(config, Arc::new(SingleSessionProvider::new(session.clone())), 1)
    }

    #[tokio::test]
    async fn test_delete_file() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let id = session
            .create_document(&DocumentSpec::new("a.txt"), session.root_id(), None)
            .await
            .unwrap();

        assert!(driver.delete_file(&id).await.unwrap());
        assert!(matches!(
            session.object(&id, None).await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_error() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let result = driver.delete_file("does-not-exist").await;
        assert!(matches!(result, Err(DriverError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_empty_folder() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let folder = driver.create_folder("docs", "/", false).await.unwrap();

        assert!(driver.delete_folder(&folder, false).await.unwrap());
        assert!(!driver.folder_exists(&folder).await.unwrap());
    }

    #[tokio::test]
    async fn test_recursive_delete_succeeds_when_all_gone() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let folder = driver.create_folder("docs", "/", false).await.unwrap();
        session
            .create_document(&DocumentSpec::new("a.txt"), &folder, None)
            .await
            .unwrap();

        assert!(driver.delete_folder(&folder, true).await.unwrap());
        assert!(!driver.folder_exists(&folder).await.unwrap());
    }

    #[tokio::test]
    async fn test_recursive_delete_reports_partial_failure() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let folder = driver.create_folder("docs", "/", false).await.unwrap();
        let locked = session
            .create_document(&DocumentSpec::new("locked.txt"), &folder, None)
            .await
            .unwrap();
        session.mark_undeletable(&locked);

        assert!(!driver.delete_folder(&folder, true).await.unwrap());
        // The locked file is still reachable.
        assert!(driver.file_exists(&locked).await.unwrap());
    }
}
