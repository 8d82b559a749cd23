//! File content transfer: `read` and `write`.

use std::io::{Read, Write};

use futures::TryStreamExt;
use tracing::{debug, info, instrument};

use crate::error::{KdriveError, Result};
use crate::fs::drive::DriveFs;
use crate::fs::node::NodeView;
use crate::fs::path::normalize;
use crate::store::RemoteStore;

impl<S: RemoteStore> DriveFs<S> {
    /// Download the file at `path` into `sink`.
    ///
    /// `limit` is accepted for hosts that pass a byte bound, but the whole
    /// file is always sent.
    ///
    /// # Returns
    /// The number of bytes written.
    ///
    /// # Errors
    /// `NotFound` if nothing exists at `path`, `NotAFile` for a folder.
    #[instrument(skip(self, sink), fields(drive = %self.drive_id()))]
    pub async fn read<W: Write + ?Sized>(
        &self,
        path: &str,
        sink: &mut W,
        limit: Option<u64>,
    ) -> Result<u64> {
        let path = normalize(path);
        let node = match self.resolve(&path, false).await? {
            NodeView::Present(node) => node,
            NodeView::Absent { .. } => return Err(KdriveError::NotFound(path.render())),
        };
        if node.is_folder() {
            return Err(KdriveError::NotAFile(path.render()));
        }

        let mut content = self.store().download_content(self.drive_id(), &node.id).await?;
        let mut written = 0u64;
        while let Some(chunk) = content.try_next().await? {
            sink.write_all(&chunk)?;
            written += chunk.len() as u64;
        }
        sink.flush()?;

        debug!(%path, node = %node.id, bytes = written, "read complete");
        Ok(written)
    }

    /// Upload everything `reader` yields as the file at `path`.
    ///
    /// Missing parent folders are created. An existing file at `path` gets
    /// its content replaced.
    ///
    /// # Errors
    /// `InvalidPath` for the mount root or when a parent segment is a file.
    #[instrument(skip(self, reader), fields(drive = %self.drive_id()))]
    pub async fn write<R: Read + ?Sized>(&self, path: &str, reader: &mut R) -> Result<()> {
        let path = normalize(path);
        let Some((parent, name)) = path.split_leaf() else {
            return Err(KdriveError::InvalidPath(
                "cannot write to the mount root".to_string(),
            ));
        };

        let folder = self
            .resolve(&parent, true)
            .await?
            .into_node()
            .ok_or_else(|| KdriveError::NotFound(parent.render()))?;

        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let size = data.len();

        let entry = self
            .store()
            .upload_content(self.drive_id(), &folder.id, name, data)
            .await?;
        info!(%path, node = %entry.id, parent = %folder.id, bytes = size, "uploaded");
        Ok(())
    }
}
