//! Directory and node mutation operations.

use tracing::{debug, info, instrument, warn};

use crate::error::{KdriveError, Result};
use crate::fs::drive::DriveFs;
use crate::fs::node::NodeView;
use crate::fs::path::normalize;
use crate::store::RemoteStore;

enum MoveStep {
    Move,
    Rename,
}

impl<S: RemoteStore> DriveFs<S> {
    /// Move or rename a file or folder.
    ///
    /// Within one folder this is a rename. Across folders the node is moved
    /// into the folder of `to` and renamed if the leaf name changes too; the
    /// rename goes first when that folder already holds the old name. These
    /// are two remote calls: if the second fails, the node stays where the
    /// first one left it and the error is returned.
    ///
    /// # Returns
    /// `false` if nothing exists at `from`.
    ///
    /// # Errors
    /// `InvalidPath` when either path is the mount root, `NotFound` when the
    /// destination folder does not exist.
    #[instrument(skip(self), fields(drive = %self.drive_id()))]
    pub async fn move_path(&self, from: &str, to: &str) -> Result<bool> {
        let from = normalize(from);
        let to = normalize(to);
        let (Some((from_parent, from_leaf)), Some((to_parent, to_leaf))) =
            (from.split_leaf(), to.split_leaf())
        else {
            return Err(KdriveError::InvalidPath(
                "cannot move the mount root".to_string(),
            ));
        };

        let node = match self.resolve(&from, false).await? {
            NodeView::Present(node) => node,
            NodeView::Absent { .. } => {
                debug!(%from, "move: source not found");
                return Ok(false);
            }
        };
        if from == to {
            return Ok(true);
        }

        if from_parent == to_parent {
            self.store()
                .rename_node(self.drive_id(), &node.id, to_leaf)
                .await?;
            info!(node = %node.id, %from, %to, "renamed");
            return Ok(true);
        }

        let destination = match self.resolve(&to_parent, false).await? {
            NodeView::Present(folder) if folder.is_folder() => folder,
            NodeView::Present(_) => {
                return Err(KdriveError::InvalidPath(format!(
                    "{} is not a directory",
                    to_parent
                )));
            }
            NodeView::Absent { .. } => return Err(KdriveError::NotFound(to_parent.render())),
        };

        if from_leaf == to_leaf {
            self.store()
                .move_node(self.drive_id(), &node.id, &destination.id)
                .await?;
        } else {
            // Rename first when the destination already holds the old name
            let old_name_taken = self
                .lister()
                .find_child(&destination.id, from_leaf)
                .await?
                .is_some();
            let steps = if old_name_taken {
                [MoveStep::Rename, MoveStep::Move]
            } else {
                [MoveStep::Move, MoveStep::Rename]
            };

            for (done, step) in steps.into_iter().enumerate() {
                let result = match step {
                    MoveStep::Move => {
                        self.store()
                            .move_node(self.drive_id(), &node.id, &destination.id)
                            .await
                    }
                    MoveStep::Rename => {
                        self.store()
                            .rename_node(self.drive_id(), &node.id, to_leaf)
                            .await
                    }
                };
                if let Err(e) = result {
                    if done > 0 {
                        warn!(node = %node.id, %from, %to, error = %e, "move only partly applied");
                    }
                    return Err(e);
                }
            }
        }
        info!(node = %node.id, parent = %destination.id, %from, %to, "moved");
        Ok(true)
    }

    /// Delete a file or folder with everything below it.
    ///
    /// # Returns
    /// The number of deleted nodes as seen from the path: 0 if nothing
    /// exists there, 1 otherwise.
    #[instrument(skip(self), fields(drive = %self.drive_id()))]
    pub async fn delete_recursive(&self, path: &str) -> Result<u64> {
        let path = normalize(path);
        if path.is_root() {
            return Err(KdriveError::InvalidPath(
                "cannot delete the mount root".to_string(),
            ));
        }

        match self.resolve(&path, false).await? {
            NodeView::Present(node) => {
                self.store().delete_node(self.drive_id(), &node.id).await?;
                info!(node = %node.id, %path, "deleted");
                Ok(1)
            }
            NodeView::Absent { .. } => Ok(0),
        }
    }
}
