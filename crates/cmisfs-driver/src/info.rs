//! Metadata extraction.
//!
//! The host indexes files through a fixed set of ten metadata keys. Every
//! value is derived from the repository object handle alone; dates are
//! normalized to epoch seconds and hashes are stable across calls.

use indexmap::IndexMap;
use serde_json::Value;

use cmisfs_core::{DriverError, RepositoryObject};

use crate::driver::CmisFilesystemDriver;

/// One key of the fixed file-information set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileInfoKey {
    Size,
    Atime,
    Mtime,
    Ctime,
    Mimetype,
    Name,
    Identifier,
    IdentifierHash,
    Storage,
    FolderHash,
}

impl FileInfoKey {
    /// All keys, in the order a full extraction emits them.
    pub const ALL: [FileInfoKey; 10] = [
        FileInfoKey::Size,
        FileInfoKey::Atime,
        FileInfoKey::Mtime,
        FileInfoKey::Ctime,
        FileInfoKey::Mimetype,
        FileInfoKey::Name,
        FileInfoKey::Identifier,
        FileInfoKey::IdentifierHash,
        FileInfoKey::Storage,
        FileInfoKey::FolderHash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileInfoKey::Size => "size",
            FileInfoKey::Atime => "atime",
            FileInfoKey::Mtime => "mtime",
            FileInfoKey::Ctime => "ctime",
            FileInfoKey::Mimetype => "mimetype",
            FileInfoKey::Name => "name",
            FileInfoKey::Identifier => "identifier",
            FileInfoKey::IdentifierHash => "identifier_hash",
            FileInfoKey::Storage => "storage",
            FileInfoKey::FolderHash => "folder_hash",
        }
    }

    pub fn parse(name: &str) -> Option<FileInfoKey> {
        FileInfoKey::ALL.iter().copied().find(|key| key.as_str() == name)
    }
}

impl CmisFilesystemDriver {
    /// Extract file information for the requested keys; an empty key list
    /// extracts the full set. A key outside the fixed set is an error.
    pub async fn extract_file_information(
        &self,
        object: &RepositoryObject,
        keys: &[&str],
    ) -> Result<IndexMap<String, Value>, DriverError> {
        let mut information = IndexMap::new();
        if keys.is_empty() {
            for key in FileInfoKey::ALL {
                information.insert(
                    key.as_str().to_string(),
                    self.specific_file_information(object, key).await?,
                );
            }
        } else {
            for name in keys {
                let key = FileInfoKey::parse(name)
                    .ok_or_else(|| DriverError::UnknownInfoKey(name.to_string()))?;
                information.insert(
                    key.as_str().to_string(),
                    self.specific_file_information(object, key).await?,
                );
            }
        }
        Ok(information)
    }

    /// One metadata value for an object.
    ///
    /// The repository has no access-time notion, so `atime` mirrors the
    /// modification date. `folder_hash` hashes the parent identifier the
    /// same way `identifier_hash` hashes the object's own.
    pub async fn specific_file_information(
        &self,
        object: &RepositoryObject,
        key: FileInfoKey,
    ) -> Result<Value, DriverError> {
        let value = match key {
            FileInfoKey::Size => Value::from(object.size.unwrap_or(0)),
            FileInfoKey::Atime | FileInfoKey::Mtime => object
                .modified
                .map(|date| Value::from(date.timestamp()))
                .unwrap_or(Value::Null),
            FileInfoKey::Ctime => object
                .created
                .map(|date| Value::from(date.timestamp()))
                .unwrap_or(Value::Null),
            FileInfoKey::Mimetype => {
                Value::from(object.mime_type.clone().unwrap_or_default())
            }
            FileInfoKey::Name => Value::from(object.name.clone()),
            FileInfoKey::Identifier => Value::from(object.id.clone()),
            FileInfoKey::IdentifierHash => Value::from(Self::hash_identifier(&object.id)),
            FileInfoKey::Storage => Value::from(self.storage_uid()),
            FileInfoKey::FolderHash => {
                let parent_id = match &object.parent_id {
                    Some(id) => id.clone(),
                    None => self.root_level_folder().await?,
                };
                Value::from(Self::hash_identifier(&parent_id))
            }
        };
        Ok(value)
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
        CmisFilesystemDriver::new(config, Arc::new(SingleSessionProvider::new(session.clone())), 7)
    }

    #[test]
    fn test_key_name_round_trip() {
        for key in FileInfoKey::ALL {
            assert_eq!(FileInfoKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(FileInfoKey::parse("creator"), None);
    }

    #[tokio::test]
    async fn test_full_extraction_yields_all_keys() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let id = session
            .create_document(
                &DocumentSpec::new("a.txt"),
                session.root_id(),
                Some(b"hello".to_vec()),
            )
            .await
            .unwrap();
        let object = driver.object_by_identifier(&id, None).await.unwrap();

        let info = driver.extract_file_information(&object, &[]).await.unwrap();
        assert_eq!(info.len(), 10);
        assert_eq!(info["size"], Value::from(5));
        assert_eq!(info["name"], Value::from("a.txt"));
        assert_eq!(info["identifier"], Value::from(id.clone()));
        assert_eq!(info["storage"], Value::from(7));
        assert_eq!(
            info["identifier_hash"],
            Value::from(CmisFilesystemDriver::hash_identifier(&id))
        );
        assert_eq!(
            info["folder_hash"],
            Value::from(CmisFilesystemDriver::hash_identifier(session.root_id()))
        );
    }

    #[tokio::test]
    async fn test_dates_are_epoch_seconds() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let id = session
            .create_document(&DocumentSpec::new("a.txt"), session.root_id(), None)
            .await
            .unwrap();
        let object = driver.object_by_identifier(&id, None).await.unwrap();

        let info = driver
            .extract_file_information(&object, &["atime", "mtime", "ctime"])
            .await
            .unwrap();
        for key in ["atime", "mtime", "ctime"] {
            assert!(info[key].is_i64(), "{} should be an epoch integer", key);
        }
        assert_eq!(info["atime"], info["mtime"]);
    }

    #[tokio::test]
    async fn test_subset_extraction_preserves_request_order() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let id = session
            .create_document(&DocumentSpec::new("a.txt"), session.root_id(), None)
            .await
            .unwrap();
        let object = driver.object_by_identifier(&id, None).await.unwrap();

        let info = driver
            .extract_file_information(&object, &["name", "size"])
            .await
            .unwrap();
        let keys: Vec<&String> = info.keys().collect();
        assert_eq!(keys, vec!["name", "size"]);
    }

    #[tokio::test]
    async fn test_unknown_key_is_rejected() {
        let session = Arc::new(MemorySession::new());
        let driver = driver_for(&session);
        let id = session
            .create_document(&DocumentSpec::new("a.txt"), session.root_id(), None)
            .await
            .unwrap();
        let object = driver.object_by_identifier(&id, None).await.unwrap();

        let result = driver
            .extract_file_information(&object, &["name", "owner"])
            .await;
        assert!(matches!(result, Err(DriverError::UnknownInfoKey(key)) if key == "owner"));
    }
}
