//! Path-addressed filesystem over a node-addressed remote.

mod drive;
pub mod entry;
pub mod lister;
pub(crate) mod node;
mod operations;
pub mod path;
pub mod resolver;

pub use drive::DriveFs;
pub use entry::{BrowseRecord, FileRecord, StatRecord};
pub use lister::ChildLister;
pub use node::{Node, NodeKind, NodeView};
pub use path::{NormalizedPath, normalize, render};
pub use resolver::{PathResolver, ResolutionContext};
