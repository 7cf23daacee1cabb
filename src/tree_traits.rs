use std::fmt::Display;

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::arena::TreeArena;

/// Capability an entity needs to take part in a materialized-path tree:
/// a stable identifier and storage for its path.
///
/// The path is the only tree state the entity persists. Parent and child
/// links are rebuilt in a [`TreeArena`].
pub trait PathEntity {
    /// Externally assigned identifier; `None` or empty means not yet assigned.
    fn node_id(&self) -> Option<String>;

    fn path(&self) -> Option<&str>;

    fn set_path(&mut self, path: String);

    /// Gives a never-persisted entity the root path.
    fn ensure_default_path(&mut self, separator: char) {
        if self.path().map_or(true, str::is_empty) {
            self.set_path(separator.to_string());
        }
    }
}

pub trait TreeNodeConvert {
    fn to_tree_string(&self, start: Index) -> Tree<String>;
}

impl<T: PathEntity + Display> TreeNodeConvert for TreeArena<T> {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self, start: Index) -> Tree<String> {
        fn build_tree<T: PathEntity + Display>(
            arena: &TreeArena<T>,
            node_idx: Index,
            parent_tree: &mut Tree<String>,
        ) {
            for &child_idx in arena.children(node_idx) {
                if let Some(child) = arena.get_node(child_idx) {
                    let mut child_tree = Tree::new(child.data.to_string());
                    build_tree(arena, child_idx, &mut child_tree);
                    parent_tree.push(child_tree);
                }
            }
        }

        match self.get_node(start) {
            Some(node) => {
                let mut tree = Tree::new(node.data.to_string());
                build_tree(self, start, &mut tree);
                tree
            }
            None => Tree::new("Empty tree".to_string()),
        }
    }
}
