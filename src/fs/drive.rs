//! The mounted filesystem.

use tracing::{debug, instrument, warn};

use crate::config::{DynStore, MountConfig, MountRoot};
use crate::error::Result;
use crate::fs::lister::ChildLister;
use crate::fs::node::NodeView;
use crate::fs::path::NormalizedPath;
use crate::fs::resolver::{PathResolver, ResolutionContext};
use crate::store::RemoteStore;

/// A kDrive folder exposed as a path-addressed filesystem.
///
/// Holds only immutable mount settings and the store handle. Every operation
/// resolves its path from the mount root again; nothing is remembered between
/// calls, so operations can run concurrently and observe remote changes
/// immediately.
///
/// # Example
/// ```no_run
/// # use kdrivefs::{DriveFs, MountConfig};
/// # async fn example() -> kdrivefs::Result<()> {
/// let config = MountConfig::new(
///     "https://ksuite.infomaniak.com/kdrive/app/drive/497955/files/5",
///     "my-api-token",
/// );
/// let fs = DriveFs::connect(&config)?;
/// if let Some(stat) = fs.stat("/first/outside.png").await? {
///     println!("{} bytes", stat.size);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DriveFs<S> {
    store: S,
    drive_id: String,
    root_id: String,
    root_path: NormalizedPath,
}

impl DriveFs<DynStore> {
    /// Mount over HTTP as described by `config`.
    pub fn connect(config: &MountConfig) -> Result<Self> {
        Self::from_config(config, config.build_store()?)
    }
}

impl<S: RemoteStore> DriveFs<S> {
    /// Mount the folder `root` using `store`.
    pub fn new(store: S, root: MountRoot) -> Self {
        Self {
            store,
            drive_id: root.drive_id,
            root_id: root.root_id,
            root_path: NormalizedPath::root(),
        }
    }

    /// Mount using `store` with the root URL and root path of `config`.
    ///
    /// Fails with `InvalidRootUrl` when the root URL does not carry a drive
    /// id and a folder id.
    pub fn from_config(config: &MountConfig, store: S) -> Result<Self> {
        Ok(Self::new(store, config.mount_root()?).with_root_path(&config.root))
    }

    /// Make every caller path relative to `root` below the mount root.
    pub fn with_root_path(mut self, root: &str) -> Self {
        self.root_path = NormalizedPath::parse(root);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn drive_id(&self) -> &str {
        &self.drive_id
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn root_path(&self) -> &NormalizedPath {
        &self.root_path
    }

    /// Where a caller path lives below the mount root.
    pub(crate) fn remote_path(&self, path: &NormalizedPath) -> NormalizedPath {
        self.root_path.concat(path)
    }

    /// Resolve a caller path.
    pub(crate) async fn resolve(&self, path: &NormalizedPath, create: bool) -> Result<NodeView> {
        let ctx = ResolutionContext::new(&self.drive_id, &self.root_id, self.remote_path(path));
        PathResolver::new(&self.store).resolve(&ctx, create).await
    }

    pub(crate) fn lister(&self) -> ChildLister<'_, S> {
        ChildLister::new(&self.store, &self.drive_id)
    }

    /// Release the mount. There is nothing to release; provided for hosts that
    /// expect it.
    pub fn close(&self) -> Result<()> {
        debug!(drive = %self.drive_id, root = %self.root_id, "close");
        Ok(())
    }

    /// kDrive offers no way to set a node's modification time, so this always
    /// answers `false` ("not possible").
    #[instrument(skip(self), fields(drive = %self.drive_id))]
    pub async fn set_last_modified(&self, path: &str, last_modified_ms: i64) -> Result<bool> {
        warn!("setting the modification time is not supported");
        Ok(false)
    }
}
