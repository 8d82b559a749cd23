//! Records returned to the host.
//!
//! Field names follow the host protocol (camelCase) so records can be handed
//! over as JSON without any mapping.

use serde::{Deserialize, Serialize};

use crate::fs::node::Node;
use crate::fs::path::NormalizedPath;

/// Result of `stat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatRecord {
    pub path: String,
    /// Always 0 for directories
    pub size: u64,
    pub last_modified: Option<i64>,
    pub is_directory: bool,
}

impl StatRecord {
    pub(crate) fn new(path: &NormalizedPath, node: &Node) -> Self {
        Self {
            path: path.render(),
            size: if node.is_folder() { 0 } else { node.size_or_zero() },
            last_modified: node.last_modified_ms,
            is_directory: node.is_folder(),
        }
    }
}

/// Result of `browse`, and one entry of its `children`.
///
/// An absent path is `{"fullPath": null, "exists": false}`; everything else
/// is left out of the JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseRecord {
    pub full_path: Option<String>,
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<BrowseRecord>>,
}

impl BrowseRecord {
    pub(crate) fn absent() -> Self {
        Self {
            full_path: None,
            exists: false,
            directory: None,
            name: None,
            size: None,
            last_modified: None,
            children: None,
        }
    }

    /// Describe `node` found at `path`, without children.
    pub(crate) fn describe(path: &NormalizedPath, node: &Node) -> Self {
        Self {
            full_path: Some(path.render()),
            exists: true,
            directory: Some(node.is_folder()),
            name: Some(node.name.clone()),
            size: node.size,
            last_modified: node.last_modified_ms,
            children: None,
        }
    }

    pub(crate) fn with_children(mut self, children: Vec<BrowseRecord>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn is_directory(&self) -> bool {
        self.directory.unwrap_or(false)
    }
}

/// One file found by `enumerate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub path: String,
    pub size: u64,
    pub last_modified: Option<i64>,
}

impl FileRecord {
    pub(crate) fn new(path: &NormalizedPath, node: &Node) -> Self {
        Self {
            path: path.render(),
            size: node.size_or_zero(),
            last_modified: node.last_modified_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::node::NodeKind;
    use serde_json::json;

    fn file() -> Node {
        Node {
            id: "42".to_string(),
            name: "outside.png".to_string(),
            kind: NodeKind::File,
            size: Some(2048),
            last_modified_ms: Some(1_700_000_000_000),
        }
    }

    #[test]
    fn test_stat_record_json() {
        let path = NormalizedPath::parse("first/outside.png");
        let record = StatRecord::new(&path, &file());
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "path": "/first/outside.png",
                "size": 2048,
                "lastModified": 1_700_000_000_000i64,
                "isDirectory": false
            })
        );
    }

    #[test]
    fn test_directory_stat_has_zero_size() {
        let mut dir = file();
        dir.kind = NodeKind::Directory;
        let record = StatRecord::new(&NormalizedPath::parse("first"), &dir);
        assert_eq!(record.size, 0);
        assert!(record.is_directory);
    }

    #[test]
    fn test_absent_browse_json() {
        assert_eq!(
            serde_json::to_value(BrowseRecord::absent()).unwrap(),
            json!({ "fullPath": null, "exists": false })
        );
    }

    #[test]
    fn test_browse_record_json() {
        let path = NormalizedPath::parse("/first/outside.png");
        let record = BrowseRecord::describe(&path, &file());
        assert!(!record.is_directory());
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "fullPath": "/first/outside.png",
                "exists": true,
                "directory": false,
                "name": "outside.png",
                "size": 2048,
                "lastModified": 1_700_000_000_000i64
            })
        );
    }
}
