//! Lazy, page-by-page listing of a node's children.

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::{debug, warn};

use crate::error::{KdriveError, Result};
use crate::fs::node::Node;
use crate::store::RemoteStore;

enum PageState {
    First,
    Next(String),
    Done,
}

/// Lists children of remote nodes within one drive.
///
/// Each call to [`children`](Self::children) starts a fresh listing from the
/// first page; pages are only requested as the stream is polled. Nothing is
/// cached here.
pub struct ChildLister<'a, S: ?Sized> {
    store: &'a S,
    drive_id: &'a str,
}

impl<'a, S: RemoteStore + ?Sized> ChildLister<'a, S> {
    pub fn new(store: &'a S, drive_id: &'a str) -> Self {
        Self { store, drive_id }
    }

    /// Stream the children of `node_id` in remote order.
    ///
    /// The stream owns its copy of `node_id`, so several listings can be
    /// held open at once.
    pub fn children(&self, node_id: &str) -> BoxStream<'a, Result<Node>> {
        let store: &'a S = self.store;
        let drive_id: &'a str = self.drive_id;
        let node_id = node_id.to_string();

        stream::try_unfold(PageState::First, move |state| {
            let node_id = node_id.clone();
            async move {
                let cursor = match state {
                    PageState::Done => return Ok(None),
                    PageState::First => None,
                    PageState::Next(cursor) => Some(cursor),
                };

                debug!(drive = drive_id, node = %node_id, cursor = ?cursor, "listing children page");
                let page = store
                    .list_children_page(drive_id, &node_id, cursor.as_deref())
                    .await?;

                let next = match (page.has_more, page.cursor) {
                    (true, Some(cursor)) => PageState::Next(cursor),
                    (true, None) => {
                        warn!(
                            drive = drive_id,
                            node = %node_id,
                            "listing reports more pages without a cursor, stopping"
                        );
                        PageState::Done
                    }
                    (false, _) => PageState::Done,
                };

                Ok::<_, KdriveError>(Some((page.entries, next)))
            }
        })
        .map_ok(|entries| stream::iter(entries.into_iter().map(|e| Ok(Node::from_entry(e)))))
        .try_flatten()
        .boxed()
    }

    /// First child named exactly `name`, in listing order.
    ///
    /// Listing stops at the match, so later pages are not fetched.
    pub async fn find_child(&self, node_id: &str, name: &str) -> Result<Option<Node>> {
        let mut children = self.children(node_id);
        while let Some(child) = children.try_next().await? {
            if child.name == name {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    /// All children of `node_id`.
    pub async fn collect(&self, node_id: &str) -> Result<Vec<Node>> {
        self.children(node_id).try_collect().await
    }
}
