//! Read-only lookups: `stat` and `browse`.

use futures::TryStreamExt;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::fs::drive::DriveFs;
use crate::fs::entry::{BrowseRecord, StatRecord};
use crate::fs::node::NodeView;
use crate::fs::path::normalize;
use crate::store::RemoteStore;

impl<S: RemoteStore> DriveFs<S> {
    /// Get information about a file or folder.
    ///
    /// # Returns
    /// `None` if nothing exists at `path`. Directories report size 0.
    #[instrument(skip(self), fields(drive = %self.drive_id()))]
    pub async fn stat(&self, path: &str) -> Result<Option<StatRecord>> {
        let path = normalize(path);
        match self.resolve(&path, false).await? {
            NodeView::Present(node) => Ok(Some(StatRecord::new(&path, &node))),
            NodeView::Absent { .. } => {
                debug!(%path, "stat: not found");
                Ok(None)
            }
        }
    }

    /// Describe the file or folder at `path`, with one level of children for
    /// folders.
    ///
    /// A missing path is not an error: the record has `exists: false`.
    #[instrument(skip(self), fields(drive = %self.drive_id()))]
    pub async fn browse(&self, path: &str) -> Result<BrowseRecord> {
        let path = normalize(path);
        let node = match self.resolve(&path, false).await? {
            NodeView::Present(node) => node,
            NodeView::Absent { .. } => return Ok(BrowseRecord::absent()),
        };

        let record = BrowseRecord::describe(&path, &node);
        if node.is_file() {
            return Ok(record);
        }

        let children: Vec<BrowseRecord> = self
            .lister()
            .children(&node.id)
            .map_ok(|child| BrowseRecord::describe(&path.join(&child.name), &child))
            .try_collect()
            .await?;
        debug!(%path, children = children.len(), "browse: listed directory");
        Ok(record.with_children(children))
    }
}
