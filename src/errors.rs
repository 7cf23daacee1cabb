use std::path::PathBuf;

use generational_arena::Index;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    /// A node cannot be positioned in a tree before it has a stable identifier.
    #[error("illegal state: node at path {path:?} has no id and cannot be part of a tree")]
    MissingId { path: Option<String> },

    #[error("unknown node: {0:?}")]
    UnknownNode(Index),

    #[error("cycle detected in tree hierarchy at node: {id}")]
    CycleDetected { id: String },

    #[error("orphan node {id}: no node with parent path {parent_path} seen yet")]
    Orphan { id: String, parent_path: String },

    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TreeResult<T> = Result<T, TreeError>;

/// Errors raised while loading records or settings from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid record file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("root node not found: {0}")]
    RootNotFound(String),
}

pub type LoadResult<T> = Result<T, LoadError>;
