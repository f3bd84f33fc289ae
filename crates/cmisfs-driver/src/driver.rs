use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha1::{Digest, Sha1};
use tokio::io::AsyncWrite;
use tracing::{debug, instrument};

use cmisfs_config::StorageConfig;
use cmisfs_core::{DriverError, Session, SessionProvider};
use serde_json::Value;

use crate::assertion::AssertionDriver;
use crate::capabilities::Capabilities;
use crate::creation::CreationDriver;
use crate::deletion::DeletionDriver;
use crate::modification::ModificationDriver;
use crate::resolving::{Permissions, ResolvingDriver};
use crate::transfer::TransferDriver;

/// Facade driver presenting one CMIS repository as a host storage.
///
/// The driver is stateless between calls: every operation resolves its
/// identifiers against the repository afresh, so a handle never outlives
/// the call that fetched it. Specialized concerns (creation, deletion,
/// modification, transfer, assertions, resolving) live in dedicated
/// sub-drivers that each borrow the facade per call.
pub struct CmisFilesystemDriver {
    config: StorageConfig,
    provider: Arc<dyn SessionProvider>,
    storage_uid: u64,
    capabilities: Capabilities,
}

impl CmisFilesystemDriver {
    /// Build a driver for one configured storage.
    ///
    /// The driver starts with its native capability set narrowed by the
    /// configuration's toggles.
    pub fn new(config: StorageConfig, provider: Arc<dyn SessionProvider>, storage_uid: u64) -> Self {
        let capabilities = Capabilities::ALL & Capabilities::from_toggles(&config.capabilities);
        CmisFilesystemDriver {
            config,
            provider,
            storage_uid,
            capabilities,
        }
    }

    /// Verify the configuration is usable by resolving the root folder and
    /// the processed-files folder once.
    ///
    /// A failure here marks the whole storage unusable; it is reported as a
    /// configuration error rather than crashing the host.
    #[instrument(skip(self), fields(storage = self.storage_uid))]
    pub async fn process_configuration(&self) -> Result<(), DriverError> {
        let initialize = async {
            let root = self.root_level_folder().await?;
            debug!(root = %root, "storage root resolved");
            self.processed_files_folder().await?;
            Ok::<(), DriverError>(())
        };
        initialize.await.map_err(|e| {
            DriverError::Configuration(format!(
                "There was a problem initializing the repository connection: {}",
                e
            ))
        })
    }

    /// The host-side uid of the storage this driver serves.
    pub fn storage_uid(&self) -> u64 {
        self.storage_uid
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Narrow the capability set by intersecting it with host-granted
    /// capabilities. Returns the effective set.
    pub fn merge_configuration_capabilities(&mut self, granted: Capabilities) -> Capabilities {
        self.capabilities = self.capabilities & granted;
        self.capabilities
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Look up one storage option by name.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.config.option(name)
    }

    /// Look up one storage option, falling back when unset or empty.
    pub fn option_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.config.option_or(name, default)
    }

    /// The session for this storage's configured connection.
    pub fn session(&self) -> Result<Arc<dyn Session>, DriverError> {
        Ok(self.provider.session(self.config.repository.as_deref())?)
    }

    /// SHA1 hex digest of an identifier string. Used for the stable
    /// `identifier_hash` and `folder_hash` metadata values.
    pub fn hash_identifier(identifier: &str) -> String {
        let digest = Sha1::digest(identifier.as_bytes());
        digest.iter().map(|byte| format!("{:02x}", byte)).collect()
    }

    /// Content hash of a file identifier, as handed to the host's file
    /// index. The identifier is resolved first so both addressing forms
    /// of the same object hash identically; content never is hashed.
    pub async fn hash(&self, identifier: &str) -> Result<String, DriverError> {
        let object = self.object_by_identifier(identifier, None).await?;
        Ok(Self::hash_identifier(&object.id))
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Create a folder inside `parent_identifier`, returning the new
    /// identifier. A name conflict resolves to the existing folder.
    #[instrument(skip(self))]
    pub async fn create_folder(
        &self,
        name: &str,
        parent_identifier: &str,
        recursive: bool,
    ) -> Result<String, DriverError> {
        CreationDriver::new(self)
            .create_folder(name, parent_identifier, recursive)
            .await
    }

    /// Create an empty file inside `parent_identifier`.
    #[instrument(skip(self))]
    pub async fn create_file(
        &self,
        name: &str,
        parent_identifier: &str,
    ) -> Result<String, DriverError> {
        CreationDriver::new(self)
            .create_file(name, parent_identifier, None)
            .await
    }

    /// Upload a local file into `target_folder_identifier`.
    #[instrument(skip(self))]
    pub async fn add_file(
        &self,
        local_path: &Path,
        target_folder_identifier: &str,
        new_name: Option<&str>,
        remove_original: bool,
    ) -> Result<String, DriverError> {
        CreationDriver::new(self)
            .add_file(local_path, target_folder_identifier, new_name, remove_original)
            .await
    }

    // ------------------------------------------------------------------
    // Modification
    // ------------------------------------------------------------------

    /// Rename a file, returning its (unchanged) identifier.
    #[instrument(skip(self))]
    pub async fn rename_file(
        &self,
        identifier: &str,
        new_name: &str,
    ) -> Result<String, DriverError> {
        ModificationDriver::new(self).rename(identifier, new_name).await
    }

    /// Rename a folder, returning its (unchanged) identifier.
    #[instrument(skip(self))]
    pub async fn rename_folder(
        &self,
        identifier: &str,
        new_name: &str,
    ) -> Result<String, DriverError> {
        ModificationDriver::new(self).rename(identifier, new_name).await
    }

    /// Move a file into another folder, renaming it on the way when the
    /// target name differs.
    #[instrument(skip(self))]
    pub async fn move_file_within_storage(
        &self,
        identifier: &str,
        target_folder_identifier: &str,
        new_name: &str,
    ) -> Result<String, DriverError> {
        ModificationDriver::new(self)
            .move_within(identifier, target_folder_identifier, new_name)
            .await
    }

    /// Move a folder into another folder, renaming it on the way when the
    /// target name differs.
    #[instrument(skip(self))]
    pub async fn move_folder_within_storage(
        &self,
        identifier: &str,
        target_folder_identifier: &str,
        new_name: &str,
    ) -> Result<String, DriverError> {
        ModificationDriver::new(self)
            .move_within(identifier, target_folder_identifier, new_name)
            .await
    }

    /// Copy a file into another folder, returning the copy's identifier.
    #[instrument(skip(self))]
    pub async fn copy_file_within_storage(
        &self,
        identifier: &str,
        target_folder_identifier: &str,
        new_name: &str,
    ) -> Result<String, DriverError> {
        ModificationDriver::new(self)
            .copy_file(identifier, target_folder_identifier, new_name)
            .await
    }

    /// Recursively copy a folder into another folder.
    #[instrument(skip(self))]
    pub async fn copy_folder_within_storage(
        &self,
        identifier: &str,
        target_folder_identifier: &str,
        new_folder_name: &str,
    ) -> Result<String, DriverError> {
        ModificationDriver::new(self)
            .copy_folder(identifier, target_folder_identifier, new_folder_name)
            .await
    }

    /// Replace a file's content with the bytes of a local file.
    #[instrument(skip(self))]
    pub async fn replace_file(
        &self,
        identifier: &str,
        local_path: &Path,
    ) -> Result<bool, DriverError> {
        ModificationDriver::new(self).replace(identifier, local_path).await
    }

    // ------------------------------------------------------------------
    // Deletion
    // ------------------------------------------------------------------

    /// Delete a single file.
    #[instrument(skip(self))]
    pub async fn delete_file(&self, identifier: &str) -> Result<bool, DriverError> {
        DeletionDriver::new(self).delete_file(identifier).await
    }

    /// Delete a folder. A recursive deletion succeeds only when the
    /// repository reports no undeleted descendants.
    #[instrument(skip(self))]
    pub async fn delete_folder(
        &self,
        identifier: &str,
        recursive: bool,
    ) -> Result<bool, DriverError> {
        DeletionDriver::new(self).delete_folder(identifier, recursive).await
    }

    // ------------------------------------------------------------------
    // Content transfer
    // ------------------------------------------------------------------

    /// Fetch the full content of a file. A document without a content
    /// stream yields an empty buffer.
    #[instrument(skip(self))]
    pub async fn get_file_contents(&self, identifier: &str) -> Result<Vec<u8>, DriverError> {
        TransferDriver::new(self).file_contents(identifier).await
    }

    /// Replace the content of a file, returning the number of bytes written.
    #[instrument(skip(self, contents), fields(bytes = contents.len()))]
    pub async fn set_file_contents(
        &self,
        identifier: &str,
        contents: Vec<u8>,
    ) -> Result<usize, DriverError> {
        TransferDriver::new(self)
            .set_file_contents(identifier, contents)
            .await
    }

    /// Materialize a file at a deterministic local path for processing.
    ///
    /// When the caller does not intend to write and a non-empty local copy
    /// already exists, the copy is reused without a repository round trip.
    #[instrument(skip(self))]
    pub async fn get_file_for_local_processing(
        &self,
        identifier: &str,
        writable: bool,
    ) -> Result<PathBuf, DriverError> {
        TransferDriver::new(self)
            .file_for_local_processing(identifier, writable)
            .await
    }

    /// Stream a file's content into an async sink.
    pub async fn dump_file_contents<W>(
        &self,
        identifier: &str,
        sink: &mut W,
    ) -> Result<(), DriverError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        TransferDriver::new(self).dump_file_contents(identifier, sink).await
    }

    // ------------------------------------------------------------------
    // Assertions
    // ------------------------------------------------------------------

    /// Whether the identifier resolves to a document.
    pub async fn file_exists(&self, identifier: &str) -> Result<bool, DriverError> {
        AssertionDriver::new(self).file_exists(identifier).await
    }

    /// Whether the identifier resolves to a folder.
    pub async fn folder_exists(&self, identifier: &str) -> Result<bool, DriverError> {
        AssertionDriver::new(self).folder_exists(identifier).await
    }

    /// Whether the folder has no children at all.
    pub async fn is_folder_empty(&self, identifier: &str) -> Result<bool, DriverError> {
        AssertionDriver::new(self).is_folder_empty(identifier).await
    }

    /// Whether `identifier` is the container itself or one of its immediate
    /// children. Fails closed: any resolution failure yields `false`.
    pub async fn is_within(&self, folder_identifier: &str, identifier: &str) -> bool {
        AssertionDriver::new(self).is_within(folder_identifier, identifier).await
    }

    /// Whether the folder has an immediate child document named `name`.
    pub async fn file_exists_in_folder(
        &self,
        name: &str,
        folder_identifier: &str,
    ) -> Result<bool, DriverError> {
        AssertionDriver::new(self)
            .file_exists_in_folder(name, folder_identifier)
            .await
    }

    /// Whether the folder has an immediate child folder named `name`.
    pub async fn folder_exists_in_folder(
        &self,
        name: &str,
        folder_identifier: &str,
    ) -> Result<bool, DriverError> {
        AssertionDriver::new(self)
            .folder_exists_in_folder(name, folder_identifier)
            .await
    }

    // ------------------------------------------------------------------
    // Resolving
    // ------------------------------------------------------------------

    /// Identifier of the storage's root folder.
    pub async fn root_level_folder(&self) -> Result<String, DriverError> {
        ResolvingDriver::new(self).root_level_folder().await
    }

    /// Identifier of the default upload folder, creating it when missing.
    #[instrument(skip(self))]
    pub async fn default_folder(&self) -> Result<String, DriverError> {
        ResolvingDriver::new(self).default_folder().await
    }

    /// Identifier of the parent folder of an object.
    pub async fn parent_folder_identifier(&self, identifier: &str) -> Result<String, DriverError> {
        ResolvingDriver::new(self).parent_folder_identifier(identifier).await
    }

    /// Metadata for a file identifier; fails when the identifier resolves
    /// to a folder. An empty key list extracts the full fixed set.
    #[instrument(skip(self, keys))]
    pub async fn get_file_info_by_identifier(
        &self,
        identifier: &str,
        keys: &[&str],
    ) -> Result<indexmap::IndexMap<String, Value>, DriverError> {
        ResolvingDriver::new(self)
            .file_info_by_identifier(identifier, keys)
            .await
    }

    /// Metadata for a folder identifier; fails when the identifier resolves
    /// to a document.
    #[instrument(skip(self))]
    pub async fn get_folder_info_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<indexmap::IndexMap<String, Value>, DriverError> {
        ResolvingDriver::new(self).folder_info_by_identifier(identifier).await
    }

    /// Identifier of the named file inside a folder.
    pub async fn get_file_in_folder(
        &self,
        name: &str,
        folder_identifier: &str,
    ) -> Result<String, DriverError> {
        ResolvingDriver::new(self).file_in_folder(name, folder_identifier).await
    }

    /// Identifier of the named folder inside a folder.
    pub async fn get_folder_in_folder(
        &self,
        name: &str,
        folder_identifier: &str,
    ) -> Result<String, DriverError> {
        ResolvingDriver::new(self)
            .folder_in_folder(name, folder_identifier)
            .await
    }

    /// Identifiers of the files directly inside a folder.
    ///
    /// `start`, `count`, `recursive` and `filters` are accepted for
    /// interface compatibility with the host; listing is always flat and
    /// complete.
    #[instrument(skip(self, filters))]
    pub async fn get_files_in_folder(
        &self,
        folder_identifier: &str,
        start: usize,
        count: usize,
        recursive: bool,
        filters: &[&str],
    ) -> Result<Vec<String>, DriverError> {
        ResolvingDriver::new(self)
            .files_in_folder(folder_identifier, start, count, recursive, filters)
            .await
    }

    /// Identifiers of the folders directly inside a folder.
    #[instrument(skip(self, filters))]
    pub async fn get_folders_in_folder(
        &self,
        folder_identifier: &str,
        start: usize,
        count: usize,
        recursive: bool,
        filters: &[&str],
    ) -> Result<Vec<String>, DriverError> {
        ResolvingDriver::new(self)
            .folders_in_folder(folder_identifier, start, count, recursive, filters)
            .await
    }

    /// Number of files directly inside a folder.
    pub async fn count_files_in_folder(
        &self,
        folder_identifier: &str,
    ) -> Result<usize, DriverError> {
        Ok(self
            .get_files_in_folder(folder_identifier, 0, 0, false, &[])
            .await?
            .len())
    }

    /// Number of folders directly inside a folder.
    pub async fn count_folders_in_folder(
        &self,
        folder_identifier: &str,
    ) -> Result<usize, DriverError> {
        Ok(self
            .get_folders_in_folder(folder_identifier, 0, 0, false, &[])
            .await?
            .len())
    }

    /// Read and write permissions the repository grants on an object.
    pub async fn permissions(&self, identifier: &str) -> Result<Permissions, DriverError> {
        ResolvingDriver::new(self).permissions(identifier).await
    }

    /// Publicly reachable URL of a file, when the repository exposes one.
    pub async fn get_public_url(&self, identifier: &str) -> Result<Option<String>, DriverError> {
        ResolvingDriver::new(self).public_url(identifier).await
    }

    /// URL of a rendition matching `rendition_filter`; a document without
    /// one is an error, since public accessibility was mandated.
    pub async fn get_rendition_url(
        &self,
        identifier: &str,
        rendition_filter: &str,
    ) -> Result<Option<String>, DriverError> {
        ResolvingDriver::new(self)
            .rendition_url(identifier, rendition_filter)
            .await
    }

    /// Resolve a top-level folder by name under the connection root,
    /// creating it when missing.
    #[instrument(skip(self))]
    pub async fn resolve_or_create_storage_root(&self, name: &str) -> Result<String, DriverError> {
        ResolvingDriver::new(self).resolve_or_create_storage_root(name).await
    }
}
