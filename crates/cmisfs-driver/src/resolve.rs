//! Identifier resolution.
//!
//! Host identifiers come in two forms: an opaque repository UUID (possibly
//! carrying a `;MAJ.MIN` version suffix) or an emulated slash path rooted at
//! the storage's root folder. Resolution is two-phase: a direct by-id fetch
//! first, then a segment-wise path walk from the root. Only when both
//! phases come up empty is the identifier reported as not found.

use cmisfs_core::{
    DriverError, FolderSpec, ObjectKind, OperationContext, RepositoryObject, SessionError,
    FOLDER_PROCESSED,
};

use crate::driver::CmisFilesystemDriver;

/// Drop a `;MAJ.MIN` version suffix from an identifier, if present.
pub fn strip_version(identifier: &str) -> &str {
    match identifier.split_once(';') {
        Some((id, _version)) => id,
        None => identifier,
    }
}

impl CmisFilesystemDriver {
    /// Resolve an identifier of either form to a repository object.
    ///
    /// An empty identifier (or bare slashes) resolves to the storage root;
    /// the reserved processed-files name resolves to that folder, creating
    /// it on first use.
    pub async fn object_by_identifier(
        &self,
        identifier: &str,
        context: Option<&OperationContext>,
    ) -> Result<RepositoryObject, DriverError> {
        let trimmed = identifier.trim_matches('/');
        if trimmed.is_empty() {
            return self.root_level_folder_object().await;
        }
        if trimmed == FOLDER_PROCESSED {
            return self.processed_files_folder().await;
        }

        let session = self.session()?;
        match session.object(strip_version(trimmed), context).await {
            Ok(object) => return Ok(object),
            Err(SessionError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        match self.object_by_path(trimmed, context).await? {
            Some(object) => Ok(object),
            None => Err(DriverError::NotFound(identifier.to_string())),
        }
    }

    /// Walk an emulated slash path from the storage root, segment by
    /// segment. Each segment matches a child by name, or by identifier so
    /// that mixed paths assembled by the host still resolve.
    pub async fn object_by_path(
        &self,
        path: &str,
        context: Option<&OperationContext>,
    ) -> Result<Option<RepositoryObject>, DriverError> {
        let session = self.session()?;
        let mut current = self.root_level_folder_object().await?;
        for segment in path.trim_matches('/').split('/').filter(|s| !s.is_empty()) {
            let children = session.children(&current.id).await?;
            let hit = children.into_iter().find(|child| {
                child.name == segment || strip_version(&child.id) == strip_version(segment)
            });
            match hit {
                Some(child) => current = child,
                None => return Ok(None),
            }
        }
        if context.is_some() {
            current = session.object(&current.id, context).await?;
        }
        Ok(Some(current))
    }

    /// Reconstruct the slash path of an object by walking parent links up
    /// to the storage root. The root itself maps to `/`.
    pub async fn object_path(&self, object: &RepositoryObject) -> Result<String, DriverError> {
        let root_id = self.root_level_folder().await?;
        if strip_version(&object.id) == strip_version(&root_id) {
            return Ok("/".to_string());
        }

        let session = self.session()?;
        let mut segments = vec![object.name.clone()];
        let mut parent_id = object.parent_id.clone();
        while let Some(id) = parent_id {
            if strip_version(&id) == strip_version(&root_id) {
                break;
            }
            let parent = session.object(&id, None).await?;
            segments.push(parent.name.clone());
            parent_id = parent.parent_id;
        }
        segments.reverse();
        Ok(segments.join("/"))
    }

    /// Find an immediate child by name. Identifier matches are accepted
    /// too, so callers can probe with either form.
    pub async fn child_by_name(
        &self,
        folder_id: &str,
        name: &str,
    ) -> Result<Option<RepositoryObject>, DriverError> {
        let session = self.session()?;
        let children = session.children(strip_version(folder_id)).await?;
        Ok(children
            .into_iter()
            .find(|child| child.name == name || strip_version(&child.id) == strip_version(name)))
    }

    /// Identifiers of a folder's immediate children, optionally filtered
    /// by object kind.
    pub async fn child_identifiers(
        &self,
        folder_id: &str,
        kind: Option<ObjectKind>,
    ) -> Result<Vec<String>, DriverError> {
        let session = self.session()?;
        let children = session.children(strip_version(folder_id)).await?;
        Ok(children
            .into_iter()
            .filter(|child| kind.map(|k| child.kind == k).unwrap_or(true))
            .map(|child| child.id)
            .collect())
    }

    /// The reserved processed-files folder directly under the storage
    /// root, created on first use. Concurrent creation races resolve to
    /// whichever folder won.
    pub async fn processed_files_folder(&self) -> Result<RepositoryObject, DriverError> {
        let root = self.root_level_folder_object().await?;
        if let Some(existing) = self.child_by_name(&root.id, FOLDER_PROCESSED).await? {
            return Ok(existing);
        }

        let session = self.session()?;
        let id = match session
            .create_folder(&FolderSpec::new(FOLDER_PROCESSED), &root.id)
            .await
        {
            Ok(id) => id,
            Err(SessionError::Conflict(_)) => self
                .child_by_name(&root.id, FOLDER_PROCESSED)
                .await?
                .map(|child| child.id)
                .ok_or_else(|| DriverError::NotFound(FOLDER_PROCESSED.to_string()))?,
            Err(e) => return Err(e.into()),
        };
        Ok(session.object(&id, None).await?)
    }

    /// The storage root as an object handle.
    pub async fn root_level_folder_object(&self) -> Result<RepositoryObject, DriverError> {
        let id = self.root_level_folder().await?;
        let session = self.session()?;
        Ok(session.object(strip_version(&id), None).await?)
    }

    /// Resolve an identifier, mapping every not-found flavor to `None` so
    /// existence checks can fail closed.
    pub(crate) async fn resolve_optional(
        &self,
        identifier: &str,
    ) -> Result<Option<RepositoryObject>, DriverError> {
        match self.object_by_identifier(identifier, None).await {
            Ok(object) => Ok(Some(object)),
            Err(
                DriverError::NotFound(_)
                | DriverError::FileNotFound(_)
                | DriverError::FolderNotFound(_),
            ) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
