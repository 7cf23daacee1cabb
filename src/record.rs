//! Flat node records as stored on disk.
//!
//! A record persists its id, a display label and its materialized path.
//! Parent and child links are never stored; they are rebuilt by
//! [`TreeBuilder`](crate::builder::TreeBuilder) on load.

use std::fmt;
use std::fs;
use std::path::Path;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::arena::TreeArena;
use crate::errors::{LoadError, LoadResult};
use crate::tree_traits::PathEntity;
use crate::util::path::PathCodec;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_path(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            path: Some(path.into()),
            label: None,
        }
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.label, &self.id) {
            (Some(label), _) => write!(f, "{}", label),
            (None, Some(id)) => write!(f, "{}", id),
            (None, None) => Ok(()),
        }
    }
}

impl PathEntity for Record {
    fn node_id(&self) -> Option<String> {
        self.id.clone()
    }

    fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    fn set_path(&mut self, path: String) {
        self.path = Some(path);
    }
}

/// Collection of records, serialized as a TOML array of `[[node]]` tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    #[serde(default, rename = "node")]
    pub nodes: Vec<Record>,
}

impl RecordSet {
    #[instrument(level = "debug")]
    pub fn load(path: &Path) -> LoadResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content).map_err(|message| LoadError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| e.to_string())
    }

    pub fn save(&self, path: &Path) -> LoadResult<()> {
        let content = self.to_toml().map_err(|message| LoadError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        fs::write(path, content).map_err(|e| LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn find(&self, id: &str) -> Option<&Record> {
        self.nodes.iter().find(|r| r.id.as_deref() == Some(id))
    }

    /// The record acting as root: the one with `root_id`, or else the one
    /// with the shallowest path (records without a path count as roots).
    pub fn root(&self, root_id: Option<&str>, codec: &PathCodec) -> LoadResult<&Record> {
        match root_id {
            Some(id) => self
                .find(id)
                .ok_or_else(|| LoadError::RootNotFound(id.to_string())),
            None => self
                .nodes
                .iter()
                .min_by_key(|r| r.path.as_deref().map_or(0, |p| codec.depth(p)))
                .ok_or_else(|| LoadError::RootNotFound("<empty record set>".to_string())),
        }
    }

    /// All records strictly below `root` by path, ancestors first.
    ///
    /// The sort by depth is stable, so records of equal depth keep their file
    /// order. With `keep_order` the file order is used unchanged.
    #[instrument(level = "debug", skip(self, codec))]
    pub fn descendants(&self, root: &Record, codec: &PathCodec, keep_order: bool) -> Vec<Record> {
        let root_path = root.path.clone().unwrap_or_else(|| codec.root());
        let selected = self.nodes.iter().filter(|r| {
            r.id != root.id
                && r
                    .path
                    .as_deref()
                    .is_some_and(|p| codec.is_descendant_path(p, &root_path))
        });
        let descendants: Vec<Record> = if keep_order {
            selected.cloned().collect()
        } else {
            selected
                .sorted_by_key(|r| r.path.as_deref().map_or(0, |p| codec.depth(p)))
                .cloned()
                .collect()
        };
        debug!("{} descendants below {}", descendants.len(), root_path);
        descendants
    }

    /// Copies the current path of every record found in `arena` (by id)
    /// back into the set. Returns the number of records whose path changed.
    #[instrument(level = "debug", skip(self, arena))]
    pub fn sync_paths(&mut self, arena: &TreeArena<Record>) -> usize {
        let mut changed = 0;
        for record in self.nodes.iter_mut() {
            let Some(idx) = record.id.as_deref().and_then(|id| arena.find_by_id(id)) else {
                continue;
            };
            let Some(node) = arena.get_node(idx) else {
                continue;
            };
            if record.path.as_deref() != Some(node.path()) {
                record.path = Some(node.path().to_string());
                changed += 1;
            }
        }
        debug!("{} record paths changed", changed);
        changed
    }
}
