//! Existence and containment checks.
//!
//! Assertions never treat a missing object as an error: an identifier that
//! fails to resolve simply means "does not exist". Containment checks fail
//! closed so the host never acts on an unverifiable claim.

use cmisfs_core::DriverError;

use crate::driver::CmisFilesystemDriver;
use crate::resolve::strip_version;

/// Sub-driver answering existence questions.
pub(crate) struct AssertionDriver<'d> {
    driver: &'d CmisFilesystemDriver,
}

impl<'d> AssertionDriver<'d> {
    pub fn new(driver: &'d CmisFilesystemDriver) -> Self {
        AssertionDriver { driver }
    }

    /// Whether the identifier resolves to a document.
    pub async fn file_exists(&self, identifier: &str) -> Result<bool, DriverError> {
        Ok(self
            .driver
            .resolve_optional(identifier)
            .await?
            .map(|object| object.is_document())
            .unwrap_or(false))
    }

    /// Whether the identifier resolves to a folder.
    pub async fn folder_exists(&self, identifier: &str) -> Result<bool, DriverError> {
        Ok(self
            .driver
            .resolve_optional(identifier)
            .await?
            .map(|object| object.is_folder())
            .unwrap_or(false))
    }

    /// Whether a folder has no children at all. An identifier resolving
    /// to a document answers `false` rather than erroring.
    pub async fn is_folder_empty(&self, identifier: &str) -> Result<bool, DriverError> {
        let folder = self.driver.object_by_identifier(identifier, None).await?;
        if !folder.is_folder() {
            return Ok(false);
        }
        let session = self.driver.session()?;
        Ok(session.children(&folder.id).await?.is_empty())
    }

    /// Whether `identifier` is the container itself or one of its
    /// immediate children. Any resolution failure yields `false`.
    pub async fn is_within(&self, folder_identifier: &str, identifier: &str) -> bool {
        let folder = match self.driver.resolve_optional(folder_identifier).await {
            Ok(Some(folder)) if folder.is_folder() => folder,
            _ => return false,
        };
        let candidate = match self.driver.resolve_optional(identifier).await {
            Ok(Some(candidate)) => candidate,
            _ => return false,
        };
        if strip_version(&candidate.id) == strip_version(&folder.id) {
            return true;
        }
        match self.driver.child_identifiers(&folder.id, None).await {
            Ok(children) => children
                .iter()
                .any(|child| strip_version(child) == strip_version(&candidate.id)),
            Err(_) => false,
        }
    }

    /// Whether the folder has an immediate child document named `name`.
    pub async fn file_exists_in_folder(
        &self,
        name: &str,
        folder_identifier: &str,
    ) -> Result<bool, DriverError> {
        let folder = match self.driver.resolve_optional(folder_identifier).await? {
            Some(folder) if folder.is_folder() => folder,
            _ => return Ok(false),
        };
        Ok(self
            .driver
            .child_by_name(&folder.id, name)
            .await?
            .map(|child| child.is_document())
            .unwrap_or(false))
    }

    /// Whether the folder has an immediate child folder named `name`.
    pub async fn folder_exists_in_folder(
        &self,
        name: &str,
        folder_identifier: &str,
    ) -> Result<bool, DriverError> {
        let folder = match self.driver.resolve_optional(folder_identifier).await? {
            Some(folder) if folder.is_folder() => folder,
            _ => return Ok(false),
        };
        Ok(self
            .driver
            .child_by_name(&folder.id, name)
            .await?
            .map(|child| child.is_folder())
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cmisfs_config::StorageConfig;
    use cmisfs_core::{DocumentSpec, Session};
    use cmisfs_session::{MemorySession, SingleSessionProvider};

    fn driver_for(session: &Arc<MemorySession>) -> CmisFilesystemDriver {
        let config = StorageConfig {
            folder: Some(session.root_id().to_string()),
            ..Default::default()
        };
        CmisFilesystemDriver::new(config, Arc::new(SingleSessionProvider::new(session.clone())), 1)
    }

    #[tokio::test]
    async fn test_file_exists_only_for_documents() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let folder = driver.create_folder("docs", "/", false).await.unwrap();
        let doc = session
            .create_document(&DocumentSpec::new("a.txt"), session.root_id(), None)
            .await
            .unwrap();

        assert!(driver.file_exists(&doc).await.unwrap());
        assert!(!driver.file_exists(&folder).await.unwrap());
        assert!(!driver.file_exists("nope").await.unwrap());

        assert!(driver.folder_exists(&folder).await.unwrap());
        assert!(!driver.folder_exists(&doc).await.unwrap());
        assert!(!driver.folder_exists("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_is_folder_empty() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let folder = driver.create_folder("docs", "/", false).await.unwrap();
        assert!(driver.is_folder_empty(&folder).await.unwrap());

        session
            .create_document(&DocumentSpec::new("a.txt"), &folder, None)
            .await
            .unwrap();
        assert!(!driver.is_folder_empty(&folder).await.unwrap());
    }

    #[tokio::test]
    async fn test_is_folder_empty_answers_false_for_documents() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let doc = session
            .create_document(&DocumentSpec::new("a.txt"), session.root_id(), None)
            .await
            .unwrap();

        assert!(!driver.is_folder_empty(&doc).await.unwrap());
        // Unresolvable identifiers still surface an error.
        assert!(driver.is_folder_empty("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_is_within_container_and_children() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let folder = driver.create_folder("docs", "/", false).await.unwrap();
        let child = session
            .create_document(&DocumentSpec::new("a.txt"), &folder, None)
            .await
            .unwrap();
        let grandchild_folder = driver.create_folder("nested", &folder, false).await.unwrap();
        let grandchild = session
            .create_document(&DocumentSpec::new("deep.txt"), &grandchild_folder, None)
            .await
            .unwrap();

        assert!(driver.is_within(&folder, &folder).await);
        assert!(driver.is_within(&folder, &child).await);
        assert!(driver.is_within(&folder, &grandchild_folder).await);
        // Only immediate children count.
        assert!(!driver.is_within(&folder, &grandchild).await);
    }

    #[tokio::test]
    async fn test_is_within_fails_closed() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let folder = driver.create_folder("docs", "/", false).await.unwrap();

        assert!(!driver.is_within("missing", &folder).await);
        assert!(!driver.is_within(&folder, "missing").await);
    }

    #[tokio::test]
    async fn test_exists_in_folder_distinguishes_kinds() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let folder = driver.create_folder("docs", "/", false).await.unwrap();
        session
            .create_document(&DocumentSpec::new("a.txt"), &folder, None)
            .await
            .unwrap();
        driver.create_folder("sub", &folder, false).await.unwrap();

        assert!(driver.file_exists_in_folder("a.txt", &folder).await.unwrap());
        assert!(!driver.file_exists_in_folder("sub", &folder).await.unwrap());
        assert!(driver.folder_exists_in_folder("sub", &folder).await.unwrap());
        assert!(!driver.folder_exists_in_folder("a.txt", &folder).await.unwrap());
        assert!(!driver.file_exists_in_folder("b.txt", &folder).await.unwrap());
    }
}
