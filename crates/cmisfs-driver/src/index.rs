//! Relation indexing between host records and repository documents.
//!
//! When a host record references a stored file, a background job mirrors
//! that reference into the repository as a typed relationship. Jobs are
//! queued by the host and executed here one at a time; a stable resource
//! id lets the queue deduplicate pending jobs for the same reference.

use async_trait::async_trait;
use tracing::{debug, instrument};

use cmisfs_core::{DriverError, TYPE_FILE_RELATION};

use crate::driver::CmisFilesystemDriver;

/// One pending record-to-file relation to be mirrored into the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRelationJob {
    /// Host table of the referencing record.
    pub source_table: String,
    /// Field of the record carrying the reference.
    pub source_field: String,
    /// Uid of the referencing record.
    pub source_uid: i64,
    /// Identifier of the referenced file, in either identifier form.
    pub target_identifier: String,
    /// Relationship type created in the repository.
    pub relation_type: String,
}

impl FileRelationJob {
    pub fn new(
        source_table: impl Into<String>,
        source_field: impl Into<String>,
        source_uid: i64,
        target_identifier: impl Into<String>,
    ) -> Self {
        FileRelationJob {
            source_table: source_table.into(),
            source_field: source_field.into(),
            source_uid,
            target_identifier: target_identifier.into(),
            relation_type: TYPE_FILE_RELATION.to_string(),
        }
    }

    /// Stable id used to deduplicate queued jobs for the same reference.
    pub fn resource_id(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.source_table,
            self.source_field,
            self.source_uid,
            self.target_identifier,
            self.relation_type
        )
    }

    /// Whether two jobs describe the same reference.
    pub fn matches(&self, other: &FileRelationJob) -> bool {
        self.resource_id() == other.resource_id()
    }
}

/// Maps a host record to the repository object mirroring it.
#[async_trait]
pub trait LocalObjectResolver: Send + Sync {
    /// The repository identifier of the object representing `table`:`uid`.
    async fn resolve(&self, table: &str, uid: i64) -> Result<String, DriverError>;
}

/// Execute one relation job: resolve both ends and create the
/// relationship. Returns the new relationship's identifier.
#[instrument(skip(driver, resolver))]
pub async fn execute_relation_index(
    driver: &CmisFilesystemDriver,
    resolver: &dyn LocalObjectResolver,
    job: &FileRelationJob,
) -> Result<String, DriverError> {
    let source_id = resolver.resolve(&job.source_table, job.source_uid).await?;
    let target = driver
        .object_by_identifier(&job.target_identifier, None)
        .await?;
    let session = driver.session()?;
    let relationship_id = session
        .create_relationship(&job.relation_type, &source_id, &target.id)
        .await?;
    debug!(
        relationship = %relationship_id,
        source = %source_id,
        target = %target.id,
        "relation indexed"
    );
    Ok(relationship_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cmisfs_config::StorageConfig;
    use cmisfs_core::{DocumentSpec, Session};
    use cmisfs_session::{MemorySession, SingleSessionProvider};

    struct FixedResolver {
        id: String,
    }

    #[async_trait]
    impl LocalObjectResolver for FixedResolver {
        async fn resolve(&self, _table: &str, _uid: i64) -> Result<String, DriverError> {
            Ok(self.id.clone())
        }
    }

    fn driver_for(session: &Arc<MemorySession>) -> CmisFilesystemDriver {
        let config = StorageConfig {
            folder: Some(session.root_id().to_string()),
            ..Default::default()
        };
        CmisFilesystemDriver::new(config, Arc::new(SingleSessionProvider::new(session.clone())), 1)
    }

    #[test]
    fn test_resource_id_identifies_reference() {
        let a = FileRelationJob::new("pages", "media", 42, "file-id");
        let b = FileRelationJob::new("pages", "media", 42, "file-id");
        let c = FileRelationJob::new("pages", "media", 43, "file-id");

        assert!(a.matches(&b));
        assert!(!a.matches(&c));
        assert_eq!(a.resource_id(), "pages:media:42:file-id:R:cmisfs:references");
    }

    #[tokio::test]
    async fn test_execute_creates_relationship() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let record_object = session
            .create_document(&DocumentSpec::new("page-42"), session.root_id(), None)
            .await
            .unwrap();
        let file = session
            .create_document(&DocumentSpec::new("a.txt"), session.root_id(), None)
            .await
            .unwrap();

        let resolver = FixedResolver {
            id: record_object.clone(),
        };
        let job = FileRelationJob::new("pages", "media", 42, file.clone());
        execute_relation_index(&driver, &resolver, &job).await.unwrap();

        let relationships = session.relationships();
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].type_id, TYPE_FILE_RELATION);
        assert_eq!(relationships[0].source_id, record_object);
        assert_eq!(relationships[0].target_id, file);
    }

    #[tokio::test]
    async fn test_execute_fails_for_missing_target() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let resolver = FixedResolver {
            id: session.root_id().to_string(),
        };
        let job = FileRelationJob::new("pages", "media", 42, "missing-file");

        let result = execute_relation_index(&driver, &resolver, &job).await;
        assert!(matches!(result, Err(DriverError::NotFound(_))));
        assert!(session.relationships().is_empty());
    }
}
