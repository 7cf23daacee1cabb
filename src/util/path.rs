//! Materialized-path codec.
//!
//! A path has the shape `SEP seg1 SEP seg2 ... SEP segN`, the segments being
//! the ids from the root down to the node. The root path is `SEP` alone.

pub const DEFAULT_SEPARATOR: char = '/';

/// Pure functions over a path string and its separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathCodec {
    separator: char,
}

impl Default for PathCodec {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

impl PathCodec {
    pub const fn new(separator: char) -> Self {
        Self { separator }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// The root path, a lone separator.
    pub fn root(&self) -> String {
        self.separator.to_string()
    }

    pub fn is_root(&self, path: &str) -> bool {
        self.depth(path) == 0
    }

    /// Splits a path on the separator.
    ///
    /// The first element is always the empty leading segment. A trailing
    /// separator does not add an empty segment, so `explode("/") == [""]`.
    /// A path missing its leading separator is read as if it had one.
    pub fn explode<'a>(&self, path: &'a str) -> Vec<&'a str> {
        let trimmed = path.strip_suffix(self.separator).unwrap_or(path);
        let mut segments: Vec<&str> = trimmed.split(self.separator).collect();
        if segments.first().is_some_and(|s| !s.is_empty()) {
            segments.insert(0, "");
        }
        segments
    }

    /// Number of ancestors of the node owning `path`.
    pub fn depth(&self, path: &str) -> usize {
        self.explode(path).len().saturating_sub(1)
    }

    /// Drops the last segment; an empty result falls back to the root path.
    pub fn parent_path(&self, path: &str) -> String {
        let mut segments = self.explode(path);
        segments.pop();
        let parent = segments.join(&self.separator.to_string());
        if parent.is_empty() {
            self.root()
        } else {
            parent
        }
    }

    /// `SEP` followed by the first non-empty segment.
    pub fn root_segment(&self, path: &str) -> String {
        let first = self
            .explode(path)
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or_default();
        format!("{}{}", self.separator, first)
    }

    /// Path of a child with `id` placed under `parent_path`.
    pub fn join(&self, parent_path: &str, id: &str) -> String {
        format!(
            "{}{}{}",
            parent_path.trim_end_matches(self.separator),
            self.separator,
            id
        )
    }

    /// True if `path` lies strictly below `ancestor`.
    pub fn is_descendant_path(&self, path: &str, ancestor: &str) -> bool {
        let ancestor = self.explode(ancestor);
        let path = self.explode(path);
        path.len() > ancestor.len() && path.starts_with(&ancestor)
    }
}
