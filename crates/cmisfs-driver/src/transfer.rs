//! Content transfer between the repository and the local machine.

use std::path::PathBuf;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use cmisfs_core::DriverError;

use crate::driver::CmisFilesystemDriver;

/// Sub-driver for reading and writing document content.
pub(crate) struct TransferDriver<'d> {
    driver: &'d CmisFilesystemDriver,
}

impl<'d> TransferDriver<'d> {
    pub fn new(driver: &'d CmisFilesystemDriver) -> Self {
        TransferDriver { driver }
    }

    /// Full content of a document. A document without a content stream
    /// yields an empty buffer, matching host expectations for fresh files.
    pub async fn file_contents(&self, identifier: &str) -> Result<Vec<u8>, DriverError> {
        let object = self.driver.object_by_identifier(identifier, None).await?;
        let session = self.driver.session()?;
        Ok(session.content(&object.id).await?.unwrap_or_default())
    }

    /// Replace a document's content, returning the number of bytes written.
    pub async fn set_file_contents(
        &self,
        identifier: &str,
        contents: Vec<u8>,
    ) -> Result<usize, DriverError> {
        let object = self.driver.object_by_identifier(identifier, None).await?;
        let written = contents.len();
        let session = self.driver.session()?;
        session.set_content(&object.id, contents, true).await?;
        Ok(written)
    }

    /// Materialize a document at a deterministic local path.
    ///
    /// The path is derived from the identifier hash, so repeated requests
    /// for the same document land on the same file. A read-only request
    /// reuses an existing non-empty copy without fetching; a writable
    /// request always fetches fresh content so later edits start from the
    /// repository state.
    pub async fn file_for_local_processing(
        &self,
        identifier: &str,
        writable: bool,
    ) -> Result<PathBuf, DriverError> {
        let object = self.driver.object_by_identifier(identifier, None).await?;
        let path = Self::local_processing_path(&object.id, &object.name);

        if !writable {
            if let Ok(metadata) = tokio::fs::metadata(&path).await {
                if metadata.len() > 0 {
                    debug!(path = %path.display(), "reusing local copy");
                    return Ok(path);
                }
            }
        }

        let session = self.driver.session()?;
        let contents = session.content(&object.id).await?.unwrap_or_default();
        tokio::fs::write(&path, contents).await?;
        Ok(path)
    }

    /// Stream a document's content into an async sink.
    pub async fn dump_file_contents<W>(
        &self,
        identifier: &str,
        sink: &mut W,
    ) -> Result<(), DriverError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let contents = self.file_contents(identifier).await?;
        sink.write_all(&contents).await?;
        sink.flush().await?;
        Ok(())
    }

    /// The local scratch path a document materializes at. The original
    /// file extension is kept so local tooling can sniff the format.
    fn local_processing_path(id: &str, name: &str) -> PathBuf {
        let hash = CmisFilesystemDriver::hash_identifier(id);
        let file_name = match name.rsplit_once('.') {
            Some((stem, extension)) if !stem.is_empty() => {
                format!("cmisfs-{}.{}", hash, extension)
            }
            _ => format!("cmisfs-{}", hash),
        };
        std::env::temp_dir().join(file_name)
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
    async fn test_file_contents_round_trip() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let id = session
            .create_document(&DocumentSpec::new("a.txt"), session.root_id(), None)
            .await
            .unwrap();

        let written = driver
            .set_file_contents(&id, b"stored remotely".to_vec())
            .await
            .unwrap();
        assert_eq!(written, 15);
        assert_eq!(
            driver.get_file_contents(&id).await.unwrap(),
            b"stored remotely".to_vec()
        );
    }

    #[tokio::test]
    async fn test_contents_of_streamless_document_are_empty() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let id = session
            .create_document(&DocumentSpec::new("a.txt"), session.root_id(), None)
            .await
            .unwrap();

        assert!(driver.get_file_contents(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_local_processing_path_is_deterministic() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let id = session
            .create_document(
                &DocumentSpec::new("report.pdf"),
                session.root_id(),
                Some(b"%PDF".to_vec()),
            )
            .await
            .unwrap();

        let first = driver.get_file_for_local_processing(&id, true).await.unwrap();
        let second = driver.get_file_for_local_processing(&id, true).await.unwrap();
        assert_eq!(first, second);
        assert!(first
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with(".pdf"));
        assert_eq!(std::fs::read(&first).unwrap(), b"%PDF");

        let _ = std::fs::remove_file(first);
    }

    #[tokio::test]
    async fn test_readonly_processing_reuses_local_copy() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let id = session
            .create_document(
                &DocumentSpec::new("cached.bin"),
                session.root_id(),
                Some(b"version one".to_vec()),
            )
            .await
            .unwrap();

        let path = driver.get_file_for_local_processing(&id, false).await.unwrap();
        session
            .set_content(&id, b"version two".to_vec(), true)
            .await
            .unwrap();

        // Read-only access sticks with the local copy.
        let again = driver.get_file_for_local_processing(&id, false).await.unwrap();
        assert_eq!(std::fs::read(&again).unwrap(), b"version one");

        // Writable access refreshes from the repository.
        let fresh = driver.get_file_for_local_processing(&id, true).await.unwrap();
        assert_eq!(std::fs::read(&fresh).unwrap(), b"version two");

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_dump_file_contents() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let id = session
            .create_document(
                &DocumentSpec::new("a.txt"),
                session.root_id(),
                Some(b"streamed".to_vec()),
            )
            .await
            .unwrap();

        let mut sink = Vec::new();
        driver.dump_file_contents(&id, &mut sink).await.unwrap();
        assert_eq!(sink, b"streamed");
    }
}
