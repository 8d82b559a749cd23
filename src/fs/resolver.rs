//! Path resolution against a listing-only remote.
//!
//! kDrive has no "node at path" endpoint. A path is resolved by listing the
//! children of the mount root, picking the child whose name matches the first
//! segment, listing that child, and so on. Resolution short-circuits to
//! [`NodeView::Absent`] on the first segment that has no match; a missing
//! intermediate directory makes the whole path unresolvable.
//!
//! When the remote holds several siblings with the same name the first one in
//! listing order wins. This is a policy, not a guarantee about which node the
//! user meant.

use tracing::{debug, info};

use crate::error::{KdriveError, Result};
use crate::fs::lister::ChildLister;
use crate::fs::node::{Node, NodeKind, NodeView};
use crate::fs::path::NormalizedPath;
use crate::store::RemoteStore;

/// Everything one resolution needs. Built per operation and dropped after.
#[derive(Debug, Clone)]
pub struct ResolutionContext<'a> {
    pub drive_id: &'a str,
    /// Node the path is relative to (the mount root)
    pub start_id: &'a str,
    pub path: NormalizedPath,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(drive_id: &'a str, start_id: &'a str, path: NormalizedPath) -> Self {
        Self {
            drive_id,
            start_id,
            path,
        }
    }
}

/// Walks normalized paths segment by segment.
pub struct PathResolver<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: RemoteStore + ?Sized> PathResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Resolve `ctx.path` starting at `ctx.start_id`.
    ///
    /// The root path resolves to a synthetic directory for the start node
    /// without any remote call. With `create_missing_folders` every missing
    /// segment is created as a folder, so the result is always `Present`.
    pub async fn resolve(
        &self,
        ctx: &ResolutionContext<'_>,
        create_missing_folders: bool,
    ) -> Result<NodeView> {
        let lister = ChildLister::new(self.store, ctx.drive_id);
        let mut current = Node::root(ctx.start_id);

        for (depth, segment) in ctx.path.segments().iter().enumerate() {
            if current.is_file() {
                // A file has no children to match against
                if create_missing_folders {
                    return Err(KdriveError::InvalidPath(format!(
                        "{} is a file, cannot create {} under it",
                        NormalizedPath::parse(&ctx.path.segments()[..depth].join("/")),
                        segment
                    )));
                }
                debug!(path = %ctx.path, segment = %segment, "segment under a file");
                return Ok(NodeView::Absent {
                    path: ctx.path.clone(),
                });
            }

            let found = lister.find_child(&current.id, segment).await?;
            match found {
                Some(child) => current = child,
                None if create_missing_folders => {
                    let entry = self
                        .store
                        .create_folder(ctx.drive_id, &current.id, segment)
                        .await?;
                    let mut folder = Node::from_entry(entry);
                    folder.kind = NodeKind::Directory;
                    info!(
                        drive = ctx.drive_id,
                        parent = %current.id,
                        folder = %folder.id,
                        name = %segment,
                        "created missing folder"
                    );
                    current = folder;
                }
                None => {
                    debug!(path = %ctx.path, segment = %segment, "segment not found");
                    return Ok(NodeView::Absent {
                        path: ctx.path.clone(),
                    });
                }
            }
        }

        Ok(NodeView::Present(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreCall};

    /// /first/second/outside.png plus /other
    fn sample_store() -> MemoryStore {
        let store = MemoryStore::new("1", "5");
        let first = store.add_folder("5", "first");
        let second = store.add_folder(&first, "second");
        store.add_file(&second, "outside.png", vec![0; 16]);
        store.add_folder("5", "other");
        store
    }

    fn ctx(path: &str) -> ResolutionContext<'static> {
        ResolutionContext::new("1", "5", NormalizedPath::parse(path))
    }

    #[tokio::test]
    async fn test_root_resolves_without_remote_calls() {
        let store = MemoryStore::new("1", "5");
        let resolver = PathResolver::new(&store);

        for raw in ["", "/", "//"] {
            let view = resolver.resolve(&ctx(raw), false).await.unwrap();
            let node = view.node().unwrap();
            assert_eq!(node.id, "5");
            assert!(node.is_folder());
        }
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_resolves_nested_file() {
        let store = sample_store();
        let resolver = PathResolver::new(&store);

        let view = resolver
            .resolve(&ctx("/first/second/outside.png"), false)
            .await
            .unwrap();
        let node = view.node().unwrap();
        assert_eq!(node.name, "outside.png");
        assert!(node.is_file());
        assert_eq!(node.size, Some(16));
        assert_eq!(store.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_missing_interior_short_circuits() {
        let store = sample_store();
        let resolver = PathResolver::new(&store);

        // "second/outside.png" exists, but not under "missing"
        let view = resolver
            .resolve(&ctx("/missing/second/outside.png"), false)
            .await
            .unwrap();
        assert_eq!(
            view,
            NodeView::Absent {
                path: NormalizedPath::parse("missing/second/outside.png")
            }
        );
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_leaf_is_absent() {
        let store = sample_store();
        let resolver = PathResolver::new(&store);

        let view = resolver
            .resolve(&ctx("/first/second/missing.png"), false)
            .await
            .unwrap();
        assert!(!view.exists());
    }

    #[tokio::test]
    async fn test_segment_below_file_is_absent() {
        let store = sample_store();
        let resolver = PathResolver::new(&store);

        let view = resolver
            .resolve(&ctx("/first/second/outside.png/outside.png"), false)
            .await
            .unwrap();
        assert!(!view.exists());
        assert_eq!(store.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_create_missing_folders() {
        let store = sample_store();
        let resolver = PathResolver::new(&store);

        let view = resolver
            .resolve(&ctx("/first/new/deep"), true)
            .await
            .unwrap();
        let node = view.into_node().unwrap();
        assert!(node.is_folder());
        assert_eq!(node.name, "deep");

        let creates: Vec<_> = store
            .calls()
            .into_iter()
            .filter(|c| matches!(c, StoreCall::CreateFolder { .. }))
            .collect();
        assert_eq!(creates.len(), 2);

        // Second pass finds everything and creates nothing
        store.clear_calls();
        let again = resolver
            .resolve(&ctx("/first/new/deep"), true)
            .await
            .unwrap();
        assert_eq!(again.node().unwrap().id, node.id);
        assert!(
            store
                .calls()
                .iter()
                .all(|c| matches!(c, StoreCall::List { .. }))
        );
    }

    #[tokio::test]
    async fn test_create_never_returns_absent() {
        let store = MemoryStore::new("1", "5");
        let resolver = PathResolver::new(&store);

        for raw in ["a", "a/b", "x/y/z", "/a/b/c/"] {
            let view = resolver.resolve(&ctx(raw), true).await.unwrap();
            assert!(view.is_folder(), "{raw} should exist after creation");
        }
    }

    #[tokio::test]
    async fn test_create_under_file_fails() {
        let store = sample_store();
        let resolver = PathResolver::new(&store);

        let err = resolver
            .resolve(&ctx("/first/second/outside.png/sub"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, KdriveError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_resolve_from_other_start() {
        let store = sample_store();
        let first = store.child_id("5", "first").unwrap();
        let resolver = PathResolver::new(&store);

        let ctx = ResolutionContext::new("1", &first, NormalizedPath::parse("second"));
        let view = resolver.resolve(&ctx, false).await.unwrap();
        assert!(view.is_folder());
    }
}
