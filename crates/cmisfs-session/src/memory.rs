use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use cmisfs_core::{
    property, Action, DocumentSpec, FolderSpec, ObjectKind, OperationContext, RepositoryObject,
    Session, SessionError,
};

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent_id: Option<String>,
    kind: ObjectKind,
    content: Option<Vec<u8>>,
    mime_type: Option<String>,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    allowed_actions: Option<Vec<Action>>,
    content_url: Option<String>,
}

impl Node {
    fn new(name: &str, parent_id: Option<String>, kind: ObjectKind) -> Self {
        let now = Utc::now();
        Node {
            name: name.to_string(),
            parent_id,
            kind,
            content: None,
            mime_type: None,
            created: now,
            modified: now,
            allowed_actions: None,
            content_url: None,
        }
    }
}

/// A typed relationship created through [`Session::create_relationship`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub type_id: String,
    pub source_id: String,
    pub target_id: String,
}

struct State {
    nodes: HashMap<String, Node>,
    undeletable: HashSet<String>,
    relationships: Vec<Relationship>,
}

/// In-memory repository session for tests and local development.
///
/// Models the parts of a CMIS repository the driver depends on: a folder
/// tree with UUID identifiers, name conflicts on creation, tree deletion
/// with reportable failures, and relationship records.
pub struct MemorySession {
    state: RwLock<State>,
    root_id: String,
}

impl MemorySession {
    /// Create a session with an empty repository root.
    pub fn new() -> Self {
        let root_id = Uuid::new_v4().to_string();
        let mut nodes = HashMap::new();
        nodes.insert(root_id.clone(), Node::new("root", None, ObjectKind::Folder));
        MemorySession {
            state: RwLock::new(State {
                nodes,
                undeletable: HashSet::new(),
                relationships: Vec::new(),
            }),
            root_id,
        }
    }

    /// Identifier of the repository root folder.
    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Mark an object as undeletable; tree deletions will report it as failed.
    pub fn mark_undeletable(&self, id: &str) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.undeletable.insert(canonical(id).to_string());
    }

    /// Set the allowable-action list returned for an object.
    pub fn set_allowed_actions(&self, id: &str, actions: Vec<Action>) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if let Some(node) = state.nodes.get_mut(canonical(id)) {
            node.allowed_actions = Some(actions);
        }
    }

    /// Set the content URL exposed for a document.
    pub fn set_content_url(&self, id: &str, url: &str) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if let Some(node) = state.nodes.get_mut(canonical(id)) {
            node.content_url = Some(url.to_string());
        }
    }

    /// All relationships created so far.
    pub fn relationships(&self) -> Vec<Relationship> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.relationships.clone()
    }

    fn to_object(id: &str, node: &Node) -> RepositoryObject {
        RepositoryObject {
            id: id.to_string(),
            name: node.name.clone(),
            parent_id: node.parent_id.clone(),
            kind: node.kind,
            size: match node.kind {
                ObjectKind::Document => {
                    Some(node.content.as_ref().map(|c| c.len() as u64).unwrap_or(0))
                }
                ObjectKind::Folder => None,
            },
            mime_type: node.mime_type.clone(),
            created: Some(node.created),
            modified: Some(node.modified),
            allowed_actions: node.allowed_actions.clone(),
            content_url: node.content_url.clone(),
        }
    }

    fn require_folder(state: &State, id: &str) -> Result<(), SessionError> {
        match state.nodes.get(id) {
            None => Err(SessionError::NotFound(id.to_string())),
            Some(node) if node.kind != ObjectKind::Folder => {
                Err(SessionError::NotAFolder(id.to_string()))
            }
            Some(_) => Ok(()),
        }
    }

    fn child_with_name(state: &State, parent_id: &str, name: &str) -> Option<String> {
        state
            .nodes
            .iter()
            .find(|(_, node)| node.parent_id.as_deref() == Some(parent_id) && node.name == name)
            .map(|(id, _)| id.clone())
    }

    fn subtree_ids(state: &State, root: &str) -> Vec<String> {
        let mut collected = vec![root.to_string()];
        let mut frontier = vec![root.to_string()];
        while let Some(current) = frontier.pop() {
            for (id, node) in &state.nodes {
                if node.parent_id.as_deref() == Some(current.as_str()) {
                    collected.push(id.clone());
                    frontier.push(id.clone());
                }
            }
        }
        collected
    }
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

/// Drops a `;MAJ.MIN` version suffix; lookups accept both identifier forms.
fn canonical(id: &str) -> &str {
    id.split(';').next().unwrap_or(id)
}

#[async_trait]
impl Session for MemorySession {
    async fn object(
        &self,
        id: &str,
        _context: Option<&OperationContext>,
    ) -> Result<RepositoryObject, SessionError> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        let id = canonical(id);
        state
            .nodes
            .get(id)
            .map(|node| Self::to_object(id, node))
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    async fn root_folder(&self) -> Result<RepositoryObject, SessionError> {
        self.object(&self.root_id, None).await
    }

    async fn children(&self, folder_id: &str) -> Result<Vec<RepositoryObject>, SessionError> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        let folder_id = canonical(folder_id);
        Self::require_folder(&state, folder_id)?;
        Ok(state
            .nodes
            .iter()
            .filter(|(_, node)| node.parent_id.as_deref() == Some(folder_id))
            .map(|(id, node)| Self::to_object(id, node))
            .collect())
    }

    async fn create_folder(
        &self,
        spec: &FolderSpec,
        parent_id: &str,
    ) -> Result<String, SessionError> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let parent_id = canonical(parent_id).to_string();
        Self::require_folder(&state, &parent_id)?;
        if Self::child_with_name(&state, &parent_id, &spec.name).is_some() {
            return Err(SessionError::Conflict(spec.name.clone()));
        }
        let id = Uuid::new_v4().to_string();
        state.nodes.insert(
            id.clone(),
            Node::new(&spec.name, Some(parent_id), ObjectKind::Folder),
        );
        Ok(id)
    }

    async fn create_document(
        &self,
        spec: &DocumentSpec,
        parent_id: &str,
        content: Option<Vec<u8>>,
    ) -> Result<String, SessionError> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let parent_id = canonical(parent_id).to_string();
        Self::require_folder(&state, &parent_id)?;
        if Self::child_with_name(&state, &parent_id, &spec.name).is_some() {
            return Err(SessionError::Conflict(spec.name.clone()));
        }
        let id = Uuid::new_v4().to_string();
        let mut node = Node::new(&spec.name, Some(parent_id), ObjectKind::Document);
        node.content = content;
        node.mime_type = spec.mime_type.clone();
        state.nodes.insert(id.clone(), node);
        Ok(id)
    }

    async fn update_properties(
        &self,
        id: &str,
        properties: Map<String, Value>,
    ) -> Result<RepositoryObject, SessionError> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let id = canonical(id).to_string();
        let node = state
            .nodes
            .get_mut(&id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        if let Some(name) = properties.get(property::NAME).and_then(Value::as_str) {
            node.name = name.to_string();
        }
        node.modified = Utc::now();
        let node = node.clone();
        Ok(Self::to_object(&id, &node))
    }

    async fn set_content(
        &self,
        id: &str,
        content: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), SessionError> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let id = canonical(id).to_string();
        let node = state
            .nodes
            .get_mut(&id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        if node.content.is_some() && !overwrite {
            return Err(SessionError::Conflict(id));
        }
        node.content = Some(content);
        node.modified = Utc::now();
        Ok(())
    }

    async fn content(&self, id: &str) -> Result<Option<Vec<u8>>, SessionError> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        let id = canonical(id);
        state
            .nodes
            .get(id)
            .map(|node| node.content.clone())
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    async fn copy(&self, id: &str, target_folder_id: &str) -> Result<String, SessionError> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let id = canonical(id);
        let target = canonical(target_folder_id).to_string();
        Self::require_folder(&state, &target)?;
        let source = state
            .nodes
            .get(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?
            .clone();
        let copy_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        state.nodes.insert(
            copy_id.clone(),
            Node {
                parent_id: Some(target),
                created: now,
                modified: now,
                ..source
            },
        );
        Ok(copy_id)
    }

    async fn move_object(
        &self,
        id: &str,
        _source_folder_id: &str,
        target_folder_id: &str,
    ) -> Result<String, SessionError> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let id = canonical(id).to_string();
        let target = canonical(target_folder_id).to_string();
        Self::require_folder(&state, &target)?;
        let node = state
            .nodes
            .get_mut(&id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        node.parent_id = Some(target);
        node.modified = Utc::now();
        Ok(id)
    }

    async fn delete(&self, id: &str) -> Result<(), SessionError> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let id = canonical(id);
        if state.nodes.remove(id).is_none() {
            return Err(SessionError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete_tree(&self, id: &str) -> Result<Vec<String>, SessionError> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let id = canonical(id);
        if !state.nodes.contains_key(id) {
            return Err(SessionError::NotFound(id.to_string()));
        }
        let subtree = Self::subtree_ids(&state, id);
        let failed: Vec<String> = subtree
            .iter()
            .filter(|node_id| state.undeletable.contains(node_id.as_str()))
            .cloned()
            .collect();

        // Ancestors of a failed node stay in place so it is not orphaned.
        let mut kept: HashSet<String> = failed.iter().cloned().collect();
        for node_id in &failed {
            let mut current = node_id.clone();
            while let Some(parent) = state
                .nodes
                .get(&current)
                .and_then(|node| node.parent_id.clone())
            {
                if !subtree.contains(&parent) || !kept.insert(parent.clone()) {
                    break;
                }
                current = parent;
            }
        }
        for node_id in &subtree {
            if !kept.contains(node_id) {
                state.nodes.remove(node_id);
            }
        }
        Ok(failed)
    }

    async fn create_relationship(
        &self,
        type_id: &str,
        source_id: &str,
        target_id: &str,
    ) -> Result<String, SessionError> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        for object_id in [canonical(source_id), canonical(target_id)] {
            if !state.nodes.contains_key(object_id) {
                return Err(SessionError::NotFound(object_id.to_string()));
            }
        }
        let id = Uuid::new_v4().to_string();
        state.relationships.push(Relationship {
            id: id.clone(),
            type_id: type_id.to_string(),
            source_id: canonical(source_id).to_string(),
            target_id: canonical(target_id).to_string(),
        });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_root_folder() {
        let session = MemorySession::new();
        let root = session.root_folder().await.unwrap();
        assert_eq!(root.id, session.root_id());
        assert!(root.is_folder());
        assert!(root.parent_id.is_none());
    }

    #[tokio::test]
    async fn test_create_and_fetch_folder() {
        let session = MemorySession::new();
        let id = session
            .create_folder(&FolderSpec::new("docs"), session.root_id())
            .await
            .unwrap();

        let folder = session.object(&id, None).await.unwrap();
        assert_eq!(folder.name, "docs");
        assert!(folder.is_folder());
        assert_eq!(folder.parent_id.as_deref(), Some(session.root_id()));
    }

    #[tokio::test]
    async fn test_create_folder_conflict() {
        let session = MemorySession::new();
        session
            .create_folder(&FolderSpec::new("docs"), session.root_id())
            .await
            .unwrap();
        let result = session
            .create_folder(&FolderSpec::new("docs"), session.root_id())
            .await;
        assert!(matches!(result, Err(SessionError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_versioned_identifier_lookup() {
        let session = MemorySession::new();
        let id = session
            .create_document(&DocumentSpec::new("a.txt"), session.root_id(), None)
            .await
            .unwrap();

        let versioned = format!("{};1.0", id);
        let object = session.object(&versioned, None).await.unwrap();
        assert_eq!(object.id, id);
    }

    #[tokio::test]
    async fn test_document_content_round_trip() {
        let session = MemorySession::new();
        let id = session
            .create_document(
                &DocumentSpec::new("a.txt"),
                session.root_id(),
                Some(b"hello".to_vec()),
            )
            .await
            .unwrap();

        assert_eq!(session.content(&id).await.unwrap(), Some(b"hello".to_vec()));

        session
            .set_content(&id, b"replaced".to_vec(), true)
            .await
            .unwrap();
        assert_eq!(
            session.content(&id).await.unwrap(),
            Some(b"replaced".to_vec())
        );
    }

    #[tokio::test]
    async fn test_content_absent_for_empty_document() {
        let session = MemorySession::new();
        let id = session
            .create_document(&DocumentSpec::new("a.txt"), session.root_id(), None)
            .await
            .unwrap();
        assert_eq!(session.content(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_children_requires_folder() {
        let session = MemorySession::new();
        let id = session
            .create_document(&DocumentSpec::new("a.txt"), session.root_id(), None)
            .await
            .unwrap();
        let result = session.children(&id).await;
        assert!(matches!(result, Err(SessionError::NotAFolder(_))));
    }

    #[tokio::test]
    async fn test_move_keeps_identifier() {
        let session = MemorySession::new();
        let folder = session
            .create_folder(&FolderSpec::new("docs"), session.root_id())
            .await
            .unwrap();
        let doc = session
            .create_document(&DocumentSpec::new("a.txt"), session.root_id(), None)
            .await
            .unwrap();

        let moved = session
            .move_object(&doc, session.root_id(), &folder)
            .await
            .unwrap();
        assert_eq!(moved, doc);

        let object = session.object(&doc, None).await.unwrap();
        assert_eq!(object.parent_id.as_deref(), Some(folder.as_str()));
    }

    #[tokio::test]
    async fn test_copy_creates_new_identifier() {
        let session = MemorySession::new();
        let folder = session
            .create_folder(&FolderSpec::new("docs"), session.root_id())
            .await
            .unwrap();
        let doc = session
            .create_document(
                &DocumentSpec::new("a.txt"),
                session.root_id(),
                Some(b"data".to_vec()),
            )
            .await
            .unwrap();

        let copy = session.copy(&doc, &folder).await.unwrap();
        assert_ne!(copy, doc);
        assert_eq!(session.content(&copy).await.unwrap(), Some(b"data".to_vec()));
    }

    #[tokio::test]
    async fn test_delete_tree_reports_failures() {
        let session = MemorySession::new();
        let folder = session
            .create_folder(&FolderSpec::new("docs"), session.root_id())
            .await
            .unwrap();
        let kept = session
            .create_document(&DocumentSpec::new("locked.txt"), &folder, None)
            .await
            .unwrap();
        let removed = session
            .create_document(&DocumentSpec::new("free.txt"), &folder, None)
            .await
            .unwrap();
        session.mark_undeletable(&kept);

        let failed = session.delete_tree(&folder).await.unwrap();
        assert_eq!(failed, vec![kept.clone()]);

        // The failed node and its ancestor folder survive; the rest is gone.
        assert!(session.object(&kept, None).await.is_ok());
        assert!(session.object(&folder, None).await.is_ok());
        assert!(matches!(
            session.object(&removed, None).await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_tree_clean() {
        let session = MemorySession::new();
        let folder = session
            .create_folder(&FolderSpec::new("docs"), session.root_id())
            .await
            .unwrap();
        session
            .create_document(&DocumentSpec::new("a.txt"), &folder, None)
            .await
            .unwrap();

        let failed = session.delete_tree(&folder).await.unwrap();
        assert!(failed.is_empty());
        assert!(session.object(&folder, None).await.is_err());
    }

    #[tokio::test]
    async fn test_rename_via_update_properties() {
        let session = MemorySession::new();
        let id = session
            .create_document(&DocumentSpec::new("a.txt"), session.root_id(), None)
            .await
            .unwrap();

        let mut props = Map::new();
        props.insert(property::NAME.to_string(), Value::from("b.txt"));
        let updated = session.update_properties(&id, props).await.unwrap();
        assert_eq!(updated.name, "b.txt");
        assert_eq!(updated.id, id);
    }

    #[tokio::test]
    async fn test_create_relationship() {
        let session = MemorySession::new();
        let doc = session
            .create_document(&DocumentSpec::new("a.txt"), session.root_id(), None)
            .await
            .unwrap();

        session
            .create_relationship("R:cmisfs:references", session.root_id(), &doc)
            .await
            .unwrap();

        let relationships = session.relationships();
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].target_id, doc);
    }
}
