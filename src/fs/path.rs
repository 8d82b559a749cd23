//! Canonical slash-separated paths.

use std::fmt;

/// A path as an ordered list of non-empty segments. The empty list is the
/// mount root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NormalizedPath {
    segments: Vec<String>,
}

impl NormalizedPath {
    /// The mount root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Normalize any string: a leading slash is optional, repeated and
    /// trailing slashes are ignored. Never fails.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.strip_prefix('/').unwrap_or(raw);
        Self {
            segments: trimmed
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Last segment, `None` for the root.
    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Everything but the last segment. The parent of the root is the root.
    pub fn parent(&self) -> NormalizedPath {
        let end = self.segments.len().saturating_sub(1);
        Self {
            segments: self.segments[..end].to_vec(),
        }
    }

    /// Split into parent and leaf; `None` for the root.
    pub fn split_leaf(&self) -> Option<(NormalizedPath, &str)> {
        let leaf = self.leaf()?;
        Some((self.parent(), leaf))
    }

    /// Append one name. The name is normalized too, so `join("a/b")` appends
    /// two segments and `join("")` appends nothing.
    pub fn join(&self, name: &str) -> NormalizedPath {
        self.concat(&NormalizedPath::parse(name))
    }

    /// Append all segments of `other`.
    pub fn concat(&self, other: &NormalizedPath) -> NormalizedPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// `/` for the root, `/a/b/c` otherwise.
    pub fn render(&self) -> String {
        if self.segments.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", self.segments.join("/"))
        }
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for NormalizedPath {
    fn from(raw: &str) -> Self {
        NormalizedPath::parse(raw)
    }
}

/// Normalize a user-supplied path.
pub fn normalize(raw: &str) -> NormalizedPath {
    NormalizedPath::parse(raw)
}

/// Render a normalized path in its canonical form.
pub fn render(path: &NormalizedPath) -> String {
    path.render()
}
