//! Filesystem node types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fs::path::NormalizedPath;
use crate::store::RemoteEntry;

/// Node kind as reported by the remote `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Regular file
    File,
    /// Folder/directory
    Directory,
}

impl NodeKind {
    /// Create from the kDrive type tag. Only `"dir"` is a container.
    pub fn from_tag(tag: &str) -> Self {
        if tag == "dir" {
            NodeKind::Directory
        } else {
            NodeKind::File
        }
    }

    /// Type tag used on the wire.
    pub fn as_tag(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Directory => "dir",
        }
    }
}

/// A node in the remote drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Opaque node id (unique within the drive)
    pub id: String,
    /// Leaf name
    pub name: String,
    /// Node kind
    pub kind: NodeKind,
    /// File size in bytes (absent for directories)
    pub size: Option<u64>,
    /// Last modification in milliseconds since the Unix epoch
    pub last_modified_ms: Option<i64>,
}

impl Node {
    /// Build a node from a raw listing entry.
    ///
    /// Sizes are coerced to integers (numeric strings are accepted) and the
    /// remote timestamp is converted from seconds to milliseconds.
    pub fn from_entry(entry: RemoteEntry) -> Self {
        Self {
            kind: NodeKind::from_tag(&entry.kind_tag),
            size: entry.size.as_ref().and_then(coerce_size),
            last_modified_ms: entry.last_modified_at.map(|secs| secs * 1000),
            id: entry.id,
            name: entry.name,
        }
    }

    /// Synthetic directory standing for the mount root.
    ///
    /// The root is known by id only, so nothing else is filled in.
    pub fn root(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            kind: NodeKind::Directory,
            size: None,
            last_modified_ms: None,
        }
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// Check if this node is a directory.
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Size in bytes, 0 when unknown or for directories.
    pub fn size_or_zero(&self) -> u64 {
        self.size.unwrap_or(0)
    }
}

fn coerce_size(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Outcome of resolving a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeView {
    /// No node at this path; carries the path that was looked up.
    Absent { path: NormalizedPath },
    /// Every segment matched.
    Present(Node),
}

impl NodeView {
    /// Whether the path resolved.
    pub fn exists(&self) -> bool {
        matches!(self, NodeView::Present(_))
    }

    /// The resolved node, if any.
    pub fn node(&self) -> Option<&Node> {
        match self {
            NodeView::Present(node) => Some(node),
            NodeView::Absent { .. } => None,
        }
    }

    /// Consume the view, keeping the node.
    pub fn into_node(self) -> Option<Node> {
        match self {
            NodeView::Present(node) => Some(node),
            NodeView::Absent { .. } => None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.node().is_some_and(Node::is_file)
    }

    pub fn is_folder(&self) -> bool {
        self.node().is_some_and(Node::is_folder)
    }

    pub fn size(&self) -> Option<u64> {
        self.node().and_then(|n| n.size)
    }

    pub fn last_modified_ms(&self) -> Option<i64> {
        self.node().and_then(|n| n.last_modified_ms)
    }

    pub fn name(&self) -> Option<&str> {
        self.node().map(|n| n.name.as_str())
    }
}
