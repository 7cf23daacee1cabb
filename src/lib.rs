//! Materialized-path trees.
//!
//! Every node stores its ancestry as a delimited path (`/1/4/9`). From that
//! single persisted field this crate rebuilds parent/child links
//! ([`TreeBuilder`]), keeps paths consistent when a subtree moves
//! ([`TreeArena::set_child_of`]) and renders trees as nested, flat or JSON
//! output.

pub mod arena;
pub mod builder;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exitcode;
pub mod record;
pub mod render;
pub mod tree_traits;
pub mod util;

pub use arena::{TreeArena, TreeNode};
pub use builder::{BuildReport, OrphanPolicy, TreeBuilder};
pub use errors::{LoadError, TreeError, TreeResult};
pub use record::{Record, RecordSet};
pub use render::{FlatTree, NestedTree, NodeView};
pub use tree_traits::{PathEntity, TreeNodeConvert};
pub use util::path::PathCodec;
