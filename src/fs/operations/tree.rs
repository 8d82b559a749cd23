//! Recursive file enumeration.

use futures::TryStreamExt;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::fs::drive::DriveFs;
use crate::fs::entry::FileRecord;
use crate::fs::node::NodeView;
use crate::fs::path::normalize;
use crate::store::RemoteStore;

impl<S: RemoteStore> DriveFs<S> {
    /// Enumerate files recursively below `path`.
    ///
    /// A file yields a single record carrying the queried path. A folder
    /// yields one record per file anywhere below it, depth first in listing
    /// order: a subfolder is walked as soon as it is listed. Folders
    /// themselves produce no record. With `first_non_empty` the walk stops
    /// right after the first file with a non-zero size.
    ///
    /// # Returns
    /// `None` if nothing exists at `path`.
    #[instrument(skip(self), fields(drive = %self.drive_id()))]
    pub async fn enumerate(
        &self,
        path: &str,
        first_non_empty: bool,
    ) -> Result<Option<Vec<FileRecord>>> {
        let path = normalize(path);
        let node = match self.resolve(&path, false).await? {
            NodeView::Present(node) => node,
            NodeView::Absent { .. } => return Ok(None),
        };
        if node.is_file() {
            return Ok(Some(vec![FileRecord::new(&path, &node)]));
        }

        let lister = self.lister();
        let mut records = Vec::new();
        // One open listing per folder on the way down from `path`
        let mut frames = vec![(lister.children(&node.id), path)];

        while let Some((children, folder_path)) = frames.last_mut() {
            let Some(child) = children.try_next().await? else {
                frames.pop();
                continue;
            };

            let child_path = folder_path.join(&child.name);
            if child.is_folder() {
                frames.push((lister.children(&child.id), child_path));
                continue;
            }

            let non_empty = child.size_or_zero() > 0;
            records.push(FileRecord::new(&child_path, &child));
            if first_non_empty && non_empty {
                debug!(path = %child_path, "stopping at first non-empty file");
                return Ok(Some(records));
            }
        }

        Ok(Some(records))
    }
}
