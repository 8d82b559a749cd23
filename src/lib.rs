//! # kdrivefs
//!
//! Path-addressed filesystem over Infomaniak kDrive.
//!
//! kDrive addresses files by numeric node id and only lets you list a
//! folder's children. This crate mounts a kDrive folder and exposes it
//! through slash-separated paths, resolving each path segment by segment on
//! every call.
//!
//! ## Features
//!
//! - **Lookups**: `stat` a path, `browse` a folder with one level of children.
//! - **Enumeration**: recursive file listing, optionally stopping at the first
//!   non-empty file.
//! - **Mutations**:
//!   - Move and rename (`move_path`), recursive delete (`delete_recursive`).
//!   - Upload (`write`) with automatic creation of missing parent folders.
//! - **Downloads**: stream a file into any `std::io::Write` sink (`read`).
//! - **Pluggable stores**: the engine talks to a [`RemoteStore`]. The HTTP
//!   client, an in-memory drive and a listing cache are provided.
//!
//! Nothing is cached between operations unless a listing cache TTL is
//! configured, so remote changes are visible immediately.
//!
//! ## Example
//!
//! ```no_run
//! use kdrivefs::{DriveFs, MountConfig};
//!
//! # async fn example() -> kdrivefs::Result<()> {
//! let config = MountConfig::new(
//!     "https://ksuite.infomaniak.com/kdrive/app/drive/497955/files/5",
//!     "my-api-token",
//! );
//! let fs = DriveFs::connect(&config)?;
//!
//! // List a folder
//! let listing = fs.browse("/first").await?;
//! for child in listing.children.unwrap_or_default() {
//!     println!("{:?} ({:?} bytes)", child.full_path, child.size);
//! }
//!
//! // Upload, creating /reports if needed
//! fs.write("/reports/today.csv", &mut &b"a,b\n1,2\n"[..]).await?;
//!
//! // Download to stdout
//! fs.read("/first/outside.png", &mut std::io::stdout(), None).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod fs;
pub mod http;
pub mod store;

// Re-export commonly used types
pub use api::{ApiErrorCode, KdriveClient};
pub use config::{DynStore, MountConfig, MountRoot};
pub use error::{KdriveError, Result};
pub use fs::{BrowseRecord, DriveFs, FileRecord, Node, NodeKind, NodeView, NormalizedPath, StatRecord};
pub use store::{CachingStore, MemoryStore, RemoteStore, StoreCall};
