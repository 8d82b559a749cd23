//! In-process [`RemoteStore`] holding a drive tree in memory.
//!
//! Behaves like the kDrive endpoints the engine uses: paged listings in
//! insertion order, numeric ids, subtree deletes, upload-replaces-by-name. Every
//! call is journaled so callers can assert on the exact remote traffic.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream;
use serde_json::json;

use crate::error::{KdriveError, Result};
use crate::store::{ByteStream, ListingPage, RemoteEntry, RemoteStore};

/// Default listing page size, matching the client default.
const DEFAULT_PAGE_SIZE: usize = 200;

/// Timestamp given to nodes unless set explicitly (seconds).
const DEFAULT_TIMESTAMP: i64 = 1_700_000_000;

/// A remote call as seen by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List { node_id: String, cursor: Option<String> },
    CreateFolder { parent_id: String, name: String },
    Upload { parent_id: String, name: String, len: usize },
    Download { node_id: String },
    Rename { node_id: String, new_name: String },
    Move { node_id: String, new_parent_id: String },
    Delete { node_id: String },
}

#[derive(Debug, Clone)]
struct MemNode {
    name: String,
    parent: Option<String>,
    is_dir: bool,
    content: Vec<u8>,
    modified: i64,
    children: Vec<String>,
}

#[derive(Debug)]
struct Tree {
    nodes: HashMap<String, MemNode>,
    next_id: u64,
    calls: Vec<StoreCall>,
    timestamp: i64,
}

/// In-memory drive.
#[derive(Debug)]
pub struct MemoryStore {
    drive_id: String,
    root_id: String,
    page_size: usize,
    tree: Mutex<Tree>,
}

fn api_error(code: &str, description: &str) -> KdriveError {
    KdriveError::ApiError {
        code: code.to_string(),
        description: description.to_string(),
    }
}

fn not_found() -> KdriveError {
    api_error("object_not_found", "Object not found")
}

impl MemoryStore {
    /// Create an empty drive whose root folder has id `root_id`.
    pub fn new(drive_id: impl Into<String>, root_id: impl Into<String>) -> Self {
        let root_id = root_id.into();
        let mut nodes = HashMap::new();
        nodes.insert(
            root_id.clone(),
            MemNode {
                name: "Private".to_string(),
                parent: None,
                is_dir: true,
                content: Vec::new(),
                modified: DEFAULT_TIMESTAMP,
                children: Vec::new(),
            },
        );
        let next_id = root_id.parse::<u64>().map(|id| id + 1).unwrap_or(1);

        Self {
            drive_id: drive_id.into(),
            root_id,
            page_size: DEFAULT_PAGE_SIZE,
            tree: Mutex::new(Tree {
                nodes,
                next_id,
                calls: Vec::new(),
                timestamp: DEFAULT_TIMESTAMP,
            }),
        }
    }

    /// Serve listings `page_size` entries at a time.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn drive_id(&self) -> &str {
        &self.drive_id
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    fn lock(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Timestamp (seconds) stamped on nodes created or modified from now on.
    pub fn set_timestamp(&self, secs: i64) {
        self.lock().timestamp = secs;
    }

    /// Add a folder with a generated id.
    pub fn add_folder(&self, parent_id: &str, name: &str) -> String {
        let mut tree = self.lock();
        let id = tree.allocate_id();
        tree.insert(&id, parent_id, name, true, Vec::new());
        id
    }

    /// Add a file with a generated id.
    ///
    /// Seeding helpers never check sibling names, so duplicates can be set up
    /// on purpose.
    pub fn add_file(&self, parent_id: &str, name: &str, content: Vec<u8>) -> String {
        let mut tree = self.lock();
        let id = tree.allocate_id();
        tree.insert(&id, parent_id, name, false, content);
        id
    }

    /// Add a folder with a fixed id.
    pub fn add_folder_with_id(&self, parent_id: &str, id: &str, name: &str) {
        let mut tree = self.lock();
        tree.reserve_id(id);
        tree.insert(id, parent_id, name, true, Vec::new());
    }

    /// Add a file with a fixed id and modification time (seconds).
    pub fn add_file_with_id(
        &self,
        parent_id: &str,
        id: &str,
        name: &str,
        content: Vec<u8>,
        modified: i64,
    ) {
        let mut tree = self.lock();
        tree.reserve_id(id);
        tree.insert(id, parent_id, name, false, content);
        if let Some(node) = tree.nodes.get_mut(id) {
            node.modified = modified;
        }
    }

    /// Id of the first child of `parent_id` named `name`.
    pub fn child_id(&self, parent_id: &str, name: &str) -> Option<String> {
        let tree = self.lock();
        tree.nodes
            .get(parent_id)?
            .children
            .iter()
            .find(|id| tree.nodes.get(*id).is_some_and(|n| n.name == name))
            .cloned()
    }

    /// Id of the node at a slash-separated path below the root.
    pub fn id_at(&self, path: &str) -> Option<String> {
        let mut current = self.root_id.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self.child_id(&current, segment)?;
        }
        Some(current)
    }

    pub fn exists(&self, id: &str) -> bool {
        self.lock().nodes.contains_key(id)
    }

    pub fn name_of(&self, id: &str) -> Option<String> {
        self.lock().nodes.get(id).map(|n| n.name.clone())
    }

    pub fn parent_of(&self, id: &str) -> Option<String> {
        self.lock().nodes.get(id).and_then(|n| n.parent.clone())
    }

    pub fn content_of(&self, id: &str) -> Option<Vec<u8>> {
        self.lock()
            .nodes
            .get(id)
            .filter(|n| !n.is_dir)
            .map(|n| n.content.clone())
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.lock().nodes.len()
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    /// Number of listing pages served so far.
    pub fn list_calls(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, StoreCall::List { .. }))
            .count()
    }

    /// Whether any call other than a listing was received.
    pub fn has_mutations(&self) -> bool {
        self.lock()
            .calls
            .iter()
            .any(|c| !matches!(c, StoreCall::List { .. } | StoreCall::Download { .. }))
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn check_drive(&self, drive_id: &str) -> Result<()> {
        if drive_id == self.drive_id {
            Ok(())
        } else {
            Err(api_error("not_authorized", "Unknown drive"))
        }
    }
}

impl Tree {
    fn allocate_id(&mut self) -> String {
        let id = self.next_id;
        self.next_id += 1;
        id.to_string()
    }

    fn reserve_id(&mut self, id: &str) {
        if let Ok(n) = id.parse::<u64>() {
            self.next_id = self.next_id.max(n + 1);
        }
    }

    fn insert(&mut self, id: &str, parent_id: &str, name: &str, is_dir: bool, content: Vec<u8>) {
        let modified = self.timestamp;
        self.nodes.insert(
            id.to_string(),
            MemNode {
                name: name.to_string(),
                parent: Some(parent_id.to_string()),
                is_dir,
                content,
                modified,
                children: Vec::new(),
            },
        );
        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.children.push(id.to_string());
        }
    }

    fn entry(&self, id: &str) -> Option<RemoteEntry> {
        let node = self.nodes.get(id)?;
        Some(RemoteEntry {
            id: id.to_string(),
            name: node.name.clone(),
            kind_tag: if node.is_dir { "dir" } else { "file" }.to_string(),
            size: (!node.is_dir).then(|| json!(node.content.len())),
            last_modified_at: Some(node.modified),
        })
    }

    fn directory(&self, id: &str) -> Result<&MemNode> {
        let node = self.nodes.get(id).ok_or_else(not_found)?;
        if !node.is_dir {
            return Err(api_error(
                "destination_not_a_directory",
                "Destination not a valid directory",
            ));
        }
        Ok(node)
    }

    fn find_child(&self, parent_id: &str, name: &str) -> Option<String> {
        self.nodes.get(parent_id)?.children.iter().find(|id| {
            self.nodes.get(*id).is_some_and(|n| n.name == name)
        }).cloned()
    }

    /// Whether a sibling other than `id` under `parent_id` is named `name`.
    fn name_taken(&self, parent_id: &str, name: &str, id: &str) -> bool {
        self.nodes.get(parent_id).is_some_and(|parent| {
            parent
                .children
                .iter()
                .any(|c| c != id && self.nodes.get(c).is_some_and(|n| n.name == name))
        })
    }

    fn is_ancestor(&self, ancestor: &str, id: &str) -> bool {
        let mut current = Some(id.to_string());
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.nodes.get(&node_id).and_then(|n| n.parent.clone());
        }
        false
    }

    fn detach(&mut self, id: &str) {
        let parent = self.nodes.get(id).and_then(|n| n.parent.clone());
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| c != id);
        }
    }

    fn remove_subtree(&mut self, id: &str) {
        if let Some(node) = self.nodes.remove(id) {
            for child in node.children {
                self.remove_subtree(&child);
            }
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list_children_page(
        &self,
        drive_id: &str,
        node_id: &str,
        cursor: Option<&str>,
    ) -> Result<ListingPage> {
        let mut tree = self.lock();
        tree.calls.push(StoreCall::List {
            node_id: node_id.to_string(),
            cursor: cursor.map(str::to_string),
        });
        self.check_drive(drive_id)?;

        let offset = match cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| api_error("validation_failed", "Invalid cursor"))?,
            None => 0,
        };
        let children = tree.directory(node_id)?.children.clone();
        let end = (offset + self.page_size).min(children.len());
        let entries = children
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .filter_map(|id| tree.entry(id))
            .collect();
        let has_more = end < children.len();

        Ok(ListingPage {
            entries,
            cursor: has_more.then(|| end.to_string()),
            has_more,
        })
    }

    async fn create_folder(
        &self,
        drive_id: &str,
        parent_id: &str,
        name: &str,
    ) -> Result<RemoteEntry> {
        let mut tree = self.lock();
        tree.calls.push(StoreCall::CreateFolder {
            parent_id: parent_id.to_string(),
            name: name.to_string(),
        });
        self.check_drive(drive_id)?;
        tree.directory(parent_id)?;
        if tree.find_child(parent_id, name).is_some() {
            return Err(api_error(
                "destination_already_exists",
                "Destination already exists",
            ));
        }

        let id = tree.allocate_id();
        tree.insert(&id, parent_id, name, true, Vec::new());
        tree.entry(&id).ok_or(KdriveError::InvalidResponse)
    }

    async fn upload_content(
        &self,
        drive_id: &str,
        parent_id: &str,
        name: &str,
        data: Vec<u8>,
    ) -> Result<RemoteEntry> {
        let mut tree = self.lock();
        tree.calls.push(StoreCall::Upload {
            parent_id: parent_id.to_string(),
            name: name.to_string(),
            len: data.len(),
        });
        self.check_drive(drive_id)?;
        tree.directory(parent_id)?;

        let timestamp = tree.timestamp;
        let id = match tree.find_child(parent_id, name) {
            Some(existing) => {
                let node = tree.nodes.get_mut(&existing).ok_or_else(not_found)?;
                if node.is_dir {
                    return Err(api_error(
                        "destination_already_exists",
                        "A directory with this name exists",
                    ));
                }
                node.content = data;
                node.modified = timestamp;
                existing
            }
            None => {
                let id = tree.allocate_id();
                tree.insert(&id, parent_id, name, false, data);
                id
            }
        };
        tree.entry(&id).ok_or(KdriveError::InvalidResponse)
    }

    async fn download_content(&self, drive_id: &str, node_id: &str) -> Result<ByteStream> {
        let mut tree = self.lock();
        tree.calls.push(StoreCall::Download {
            node_id: node_id.to_string(),
        });
        self.check_drive(drive_id)?;

        let node = tree.nodes.get(node_id).ok_or_else(not_found)?;
        if node.is_dir {
            return Err(api_error("validation_failed", "Cannot download a directory"));
        }
        let content = Bytes::from(node.content.clone());
        Ok(stream::iter(vec![Ok(content)]).boxed())
    }

    async fn rename_node(&self, drive_id: &str, node_id: &str, new_name: &str) -> Result<()> {
        let mut tree = self.lock();
        tree.calls.push(StoreCall::Rename {
            node_id: node_id.to_string(),
            new_name: new_name.to_string(),
        });
        self.check_drive(drive_id)?;

        let parent = tree.nodes.get(node_id).ok_or_else(not_found)?.parent.clone();
        if parent.is_some_and(|p| tree.name_taken(&p, new_name, node_id)) {
            return Err(api_error(
                "destination_already_exists",
                "Destination already exists",
            ));
        }

        let timestamp = tree.timestamp;
        let node = tree.nodes.get_mut(node_id).ok_or_else(not_found)?;
        node.name = new_name.to_string();
        node.modified = timestamp;
        Ok(())
    }

    async fn move_node(&self, drive_id: &str, node_id: &str, new_parent_id: &str) -> Result<()> {
        let mut tree = self.lock();
        tree.calls.push(StoreCall::Move {
            node_id: node_id.to_string(),
            new_parent_id: new_parent_id.to_string(),
        });
        self.check_drive(drive_id)?;

        let name = tree.nodes.get(node_id).ok_or_else(not_found)?.name.clone();
        tree.directory(new_parent_id)?;
        if tree.is_ancestor(node_id, new_parent_id) {
            return Err(api_error(
                "validation_failed",
                "Cannot move a directory into itself",
            ));
        }
        if tree.name_taken(new_parent_id, &name, node_id) {
            return Err(api_error(
                "destination_already_exists",
                "Destination already exists",
            ));
        }

        tree.detach(node_id);
        if let Some(node) = tree.nodes.get_mut(node_id) {
            node.parent = Some(new_parent_id.to_string());
        }
        if let Some(parent) = tree.nodes.get_mut(new_parent_id) {
            parent.children.push(node_id.to_string());
        }
        Ok(())
    }

    async fn delete_node(&self, drive_id: &str, node_id: &str) -> Result<()> {
        let mut tree = self.lock();
        tree.calls.push(StoreCall::Delete {
            node_id: node_id.to_string(),
        });
        self.check_drive(drive_id)?;

        if !tree.nodes.contains_key(node_id) {
            return Err(not_found());
        }
        if node_id == self.root_id {
            return Err(api_error("forbidden", "Cannot delete the drive root"));
        }
        tree.detach(node_id);
        tree.remove_subtree(node_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_paged_listing() {
        let store = MemoryStore::new("1", "5").with_page_size(2);
        for name in ["a", "b", "c"] {
            store.add_folder("5", name);
        }

        let first = store.list_children_page("1", "5", None).await.unwrap();
        assert_eq!(first.entries.len(), 2);
        assert!(first.has_more);

        let second = store
            .list_children_page("1", "5", first.cursor.as_deref())
            .await
            .unwrap();
        assert_eq!(second.entries.len(), 1);
        assert_eq!(second.entries[0].name, "c");
        assert!(!second.has_more);
        assert!(second.cursor.is_none());
    }

    #[tokio::test]
    async fn test_wrong_drive_rejected() {
        let store = MemoryStore::new("1", "5");
        let err = store.list_children_page("2", "5", None).await.unwrap_err();
        assert_eq!(err.api_code(), Some(crate::api::ApiErrorCode::NotAuthorized));
    }

    #[tokio::test]
    async fn test_upload_replaces_by_name() {
        let store = MemoryStore::new("1", "5");
        let first = store.upload_content("1", "5", "f.txt", b"one".to_vec()).await.unwrap();
        let second = store.upload_content("1", "5", "f.txt", b"two!".to_vec()).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.size, Some(json!(4)));
        assert_eq!(store.content_of(&first.id).unwrap(), b"two!");
    }

    #[tokio::test]
    async fn test_download_content() {
        let store = MemoryStore::new("1", "5");
        let id = store.add_file("5", "f.txt", b"hello".to_vec());
        let chunks: Vec<Bytes> = store
            .download_content("1", &id)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.concat(), b"hello");

        let folder = store.add_folder("5", "dir");
        assert!(store.download_content("1", &folder).await.is_err());
    }

    #[tokio::test]
    async fn test_move_into_own_subtree_rejected() {
        let store = MemoryStore::new("1", "5");
        let a = store.add_folder("5", "a");
        let b = store.add_folder(&a, "b");
        assert!(store.move_node("1", &a, &b).await.is_err());
        assert!(store.move_node("1", &a, &a).await.is_err());
        assert_eq!(store.parent_of(&a).as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn test_delete_removes_subtree() {
        let store = MemoryStore::new("1", "5");
        let a = store.add_folder("5", "a");
        let b = store.add_folder(&a, "b");
        let f = store.add_file(&b, "f", vec![1, 2]);
        assert_eq!(store.node_count(), 4);

        store.delete_node("1", &a).await.unwrap();
        assert_eq!(store.node_count(), 1);
        assert!(!store.exists(&f));
        assert!(store.child_id("5", "a").is_none());
    }

    #[test]
    fn test_fixed_ids_bump_allocator() {
        let store = MemoryStore::new("1", "5");
        store.add_folder_with_id("5", "10", "first");
        store.add_file_with_id("10", "42", "outside.png", vec![0; 2048], 1_700_000_000);
        let next = store.add_folder("5", "next");
        assert_eq!(next, "43");
        assert_eq!(store.id_at("/first/outside.png").as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_rename_and_move_reject_taken_names() {
        let store = MemoryStore::new("1", "5");
        let a = store.add_file("5", "a.txt", vec![1]);
        store.add_file("5", "b.txt", vec![2]);
        let dir = store.add_folder("5", "dir");
        store.add_file(&dir, "a.txt", vec![3]);

        let err = store.rename_node("1", &a, "b.txt").await.unwrap_err();
        assert_eq!(
            err.api_code(),
            Some(crate::api::ApiErrorCode::DestinationAlreadyExists)
        );
        assert!(store.move_node("1", &a, &dir).await.is_err());
        assert_eq!(store.parent_of(&a).as_deref(), Some("5"));

        // Renaming to its own name is not a conflict
        store.rename_node("1", &a, "a.txt").await.unwrap();
    }
}
