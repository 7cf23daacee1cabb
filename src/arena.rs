use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::errors::{TreeError, TreeResult};
use crate::tree_traits::PathEntity;
use crate::util::path::PathCodec;

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode<T> {
    /// Entity payload, owner of the persisted path
    pub data: T,
    /// Index of parent node in the arena, None for root nodes
    parent: Option<Index>,
    /// Indices of child nodes in insertion order, without duplicates
    children: Vec<Index>,
}

impl<T: PathEntity> TreeNode<T> {
    /// Non-empty id of the entity, if assigned.
    pub fn id(&self) -> Option<String> {
        self.data.node_id().filter(|id| !id.is_empty())
    }

    pub fn path(&self) -> &str {
        self.data.path().unwrap_or_default()
    }

    fn require_id(&self) -> TreeResult<String> {
        self.id().ok_or_else(|| TreeError::MissingId {
            path: self.data.path().map(str::to_string),
        })
    }
}

impl<T> TreeNode<T> {
    pub fn parent(&self) -> Option<Index> {
        self.parent
    }

    pub fn children(&self) -> &[Index] {
        &self.children
    }
}

/// Arena-based forest of materialized-path nodes.
///
/// Nodes own nothing but indices: a parent link is a plain back-index and the
/// child list is the owning side of the relation. Every node without a parent
/// is a root. The arena itself owns all node payloads.
#[derive(Debug)]
pub struct TreeArena<T> {
    arena: Arena<TreeNode<T>>,
    codec: PathCodec,
}

impl<T> Default for TreeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TreeArena<T> {
    pub fn new() -> Self {
        Self::with_codec(PathCodec::default())
    }

    pub fn with_codec(codec: PathCodec) -> Self {
        Self {
            arena: Arena::new(),
            codec,
        }
    }

    pub fn codec(&self) -> &PathCodec {
        &self.codec
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node(&self, idx: Index) -> Option<&TreeNode<T>> {
        self.arena.get(idx)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode<T>> {
        self.arena.get_mut(idx)
    }

    pub fn parent(&self, idx: Index) -> Option<Index> {
        self.arena.get(idx).and_then(|n| n.parent)
    }

    /// Children of `idx`; empty for unknown indices.
    pub fn children(&self, idx: Index) -> &[Index] {
        self.arena
            .get(idx)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    /// All nodes without a parent.
    pub fn roots(&self) -> Vec<Index> {
        self.arena
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(idx, _)| idx)
            .collect()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self, start: Index) -> TreeIterator<'_, T> {
        TreeIterator::new(self, start)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter_postorder(&self, start: Index) -> PostOrderIterator<'_, T> {
        PostOrderIterator::new(self, start)
    }

    /// Number of levels in the subtree below and including `start`.
    #[instrument(level = "debug", skip(self))]
    pub fn max_depth(&self, start: Index) -> usize {
        if let Some(node) = self.get_node(start) {
            1 + node
                .children
                .iter()
                .map(|&child| self.max_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    fn node(&self, idx: Index) -> TreeResult<&TreeNode<T>> {
        self.arena.get(idx).ok_or(TreeError::UnknownNode(idx))
    }

    fn node_mut(&mut self, idx: Index) -> TreeResult<&mut TreeNode<T>> {
        self.arena.get_mut(idx).ok_or(TreeError::UnknownNode(idx))
    }

    /// True if `ancestor` is `idx` or lies on its parent chain.
    fn is_ancestor_or_self(&self, ancestor: Index, idx: Index) -> bool {
        let mut current = Some(idx);
        for _ in 0..=self.arena.len() {
            match current {
                Some(c) if c == ancestor => return true,
                Some(c) => current = self.parent(c),
                None => return false,
            }
        }
        false
    }

    fn detach_from(&mut self, parent: Index, child: Index) {
        if let Some(node) = self.arena.get_mut(parent) {
            node.children.retain(|&c| c != child);
        }
    }

    /// Removes a leaf node from the arena and from its parent's child set.
    pub(crate) fn discard_node(&mut self, idx: Index) -> Option<T> {
        if let Some(parent) = self.parent(idx) {
            self.detach_from(parent, idx);
        }
        self.arena.remove(idx).map(|node| node.data)
    }
}

impl<T: PathEntity> TreeArena<T> {
    /// Adds a detached node. An entity without a path gets the root path.
    #[instrument(level = "trace", skip(self, data))]
    pub fn insert_node(&mut self, mut data: T) -> Index {
        data.ensure_default_path(self.codec.separator());
        self.arena.insert(TreeNode {
            data,
            parent: None,
            children: Vec::new(),
        })
    }

    pub fn find_by_id(&self, id: &str) -> Option<Index> {
        self.arena
            .iter()
            .find(|(_, node)| node.id().as_deref() == Some(id))
            .map(|(idx, _)| idx)
    }

    pub fn find_by_path(&self, path: &str) -> Option<Index> {
        self.arena
            .iter()
            .find(|(_, node)| node.path() == path)
            .map(|(idx, _)| idx)
    }

    pub fn path(&self, idx: Index) -> TreeResult<&str> {
        Ok(self.node(idx)?.path())
    }

    pub fn parent_path(&self, idx: Index) -> TreeResult<String> {
        Ok(self.codec.parent_path(self.node(idx)?.path()))
    }

    pub fn exploded_path(&self, idx: Index) -> TreeResult<Vec<&str>> {
        Ok(self.codec.explode(self.node(idx)?.path()))
    }

    /// Depth of the node: number of ancestors encoded in its path.
    pub fn level(&self, idx: Index) -> TreeResult<usize> {
        Ok(self.codec.depth(self.node(idx)?.path()))
    }

    pub fn root_path(&self, idx: Index) -> TreeResult<String> {
        Ok(self.codec.root_segment(self.node(idx)?.path()))
    }

    /// Follows parent links up to a node without a parent.
    ///
    /// The walk is bounded by the arena size; a longer chain can only be a
    /// cycle and is reported as such.
    #[instrument(level = "trace", skip(self))]
    pub fn get_root(&self, idx: Index) -> TreeResult<Index> {
        let mut current = idx;
        for _ in 0..=self.arena.len() {
            match self.node(current)?.parent {
                Some(parent) => current = parent,
                None => return Ok(current),
            }
        }
        Err(TreeError::CycleDetected {
            id: self.display_id(idx),
        })
    }

    /// True if the parent path of `idx` is the path of `candidate`.
    pub fn is_child_of(&self, idx: Index, candidate: Index) -> TreeResult<bool> {
        Ok(self.parent_path(idx)? == self.node(candidate)?.path())
    }

    /// Raw insert into the child set of `parent`; paths are left untouched.
    #[instrument(level = "trace", skip(self))]
    pub fn add_child(&mut self, parent: Index, child: Index) -> TreeResult<()> {
        self.node(child)?;
        let node = self.node_mut(parent)?;
        if !node.children.contains(&child) {
            node.children.push(child);
        }
        Ok(())
    }

    /// Raw link of `child` under `parent`, detaching it from any previous
    /// parent. Paths are left untouched.
    #[instrument(level = "trace", skip(self))]
    pub fn set_parent(&mut self, child: Index, parent: Index) -> TreeResult<()> {
        self.node(parent)?;
        let old = self.node_mut(child)?.parent.replace(parent);
        if let Some(old) = old.filter(|&old| old != parent) {
            self.detach_from(old, child);
        }
        self.add_child(parent, child)
    }

    /// Moves `node` under `parent` and repairs the paths of its whole subtree.
    ///
    /// Fails before any write if `node` has no id or if `parent` lies inside
    /// the subtree of `node`. A descendant without an id aborts the repair
    /// midway; nodes already visited keep their new paths.
    #[instrument(level = "debug", skip(self))]
    pub fn set_child_of(&mut self, node: Index, parent: Index) -> TreeResult<()> {
        let id = self.node(node)?.require_id()?;
        self.node(parent)?;
        if self.is_ancestor_or_self(node, parent) {
            return Err(TreeError::CycleDetected { id });
        }

        let mut stack = vec![(node, parent)];
        while let Some((current, new_parent)) = stack.pop() {
            let id = self.node(current)?.require_id()?;
            let path = self.codec.join(self.node(new_parent)?.path(), &id);
            debug!("set path of {} to {}", id, path);
            self.node_mut(current)?.data.set_path(path);
            self.set_parent(current, new_parent)?;

            for &child in self.node(current)?.children.iter().rev() {
                stack.push((child, current));
            }
        }
        Ok(())
    }

    /// Same as `set_child_of(child, parent)`.
    pub fn attach_child(&mut self, parent: Index, child: Index) -> TreeResult<()> {
        self.set_child_of(child, parent)
    }

    pub fn get_child(&self, parent: Index, id: &str) -> Option<Index> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.get_node(c).and_then(TreeNode::id).as_deref() == Some(id))
    }

    pub fn has_child(&self, parent: Index, id: &str) -> bool {
        self.get_child(parent, id).is_some()
    }

    /// Unlinks the child with `id`. It keeps its path and becomes a root.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_child(&mut self, parent: Index, id: &str) -> Option<Index> {
        let child = self.get_child(parent, id)?;
        self.detach_from(parent, child);
        if let Some(node) = self.arena.get_mut(child) {
            node.parent = None;
        }
        Some(child)
    }

    pub(crate) fn display_id(&self, idx: Index) -> String {
        self.get_node(idx)
            .map(|node| node.id().unwrap_or_else(|| node.path().to_string()))
            .unwrap_or_else(|| format!("{:?}", idx))
    }
}

/// Pre-order, left-to-right traversal of a subtree.
pub struct TreeIterator<'a, T> {
    arena: &'a TreeArena<T>,
    stack: Vec<Index>,
}

impl<'a, T> TreeIterator<'a, T> {
    fn new(arena: &'a TreeArena<T>, start: Index) -> Self {
        let stack = if arena.get_node(start).is_some() {
            vec![start]
        } else {
            Vec::new()
        };
        Self { arena, stack }
    }
}

impl<'a, T> Iterator for TreeIterator<'a, T> {
    type Item = (Index, &'a TreeNode<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a, T> {
    arena: &'a TreeArena<T>,
    stack: Vec<(Index, bool)>,
}

impl<'a, T> PostOrderIterator<'a, T> {
    fn new(arena: &'a TreeArena<T>, start: Index) -> Self {
        let stack = if arena.get_node(start).is_some() {
            vec![(start, false)]
        } else {
            Vec::new()
        };
        Self { arena, stack }
    }
}

impl<'a, T> Iterator for PostOrderIterator<'a, T> {
    type Item = (Index, &'a TreeNode<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn arena_with_root() -> (TreeArena<Record>, Index) {
        let mut arena = TreeArena::new();
        let root = arena.insert_node(Record::new("1"));
        (arena, root)
    }

    #[test]
    fn test_insert_node_applies_default_path() {
        let (arena, root) = arena_with_root();
        assert_eq!(arena.path(root).unwrap(), "/");
        assert_eq!(arena.level(root).unwrap(), 0);
        assert_eq!(arena.roots(), vec![root]);
    }

    #[test]
    fn test_set_child_of_sets_path_and_links() {
        let (mut arena, root) = arena_with_root();
        let a = arena.insert_node(Record::new("a"));
        arena.set_child_of(a, root).unwrap();

        assert_eq!(arena.path(a).unwrap(), "/a");
        assert_eq!(arena.parent(a), Some(root));
        assert_eq!(arena.children(root), &[a]);
        assert!(arena.is_child_of(a, root).unwrap());
        assert_eq!(arena.parent_path(a).unwrap(), "/");
    }

    #[test]
    fn test_set_child_of_detaches_from_old_parent() {
        let (mut arena, root) = arena_with_root();
        let a = arena.insert_node(Record::new("a"));
        let b = arena.insert_node(Record::new("b"));
        arena.set_child_of(a, root).unwrap();
        arena.set_child_of(b, root).unwrap();
        arena.set_child_of(b, a).unwrap();

        assert_eq!(arena.children(root), &[a]);
        assert_eq!(arena.children(a), &[b]);
        assert_eq!(arena.path(b).unwrap(), "/a/b");
    }

    #[test]
    fn test_set_child_of_twice_keeps_single_membership() {
        let (mut arena, root) = arena_with_root();
        let a = arena.insert_node(Record::new("a"));
        let b = arena.insert_node(Record::new("b"));
        arena.set_child_of(a, root).unwrap();
        arena.set_child_of(b, root).unwrap();
        arena.set_child_of(a, root).unwrap();

        assert_eq!(arena.children(root), &[a, b]);
        assert_eq!(arena.path(a).unwrap(), "/a");
    }

    #[test]
    fn test_set_child_of_without_id_fails_without_mutation() {
        let (mut arena, root) = arena_with_root();
        let nameless = arena.insert_node(Record::default());
        let result = arena.set_child_of(nameless, root);

        assert!(matches!(result, Err(TreeError::MissingId { .. })));
        assert_eq!(arena.path(nameless).unwrap(), "/");
        assert_eq!(arena.parent(nameless), None);
        assert!(arena.children(root).is_empty());
    }

    #[test]
    fn test_set_child_of_rejects_cycle() {
        let (mut arena, root) = arena_with_root();
        let a = arena.insert_node(Record::new("a"));
        let b = arena.insert_node(Record::new("b"));
        arena.set_child_of(a, root).unwrap();
        arena.set_child_of(b, a).unwrap();

        let result = arena.set_child_of(a, b);
        assert!(matches!(result, Err(TreeError::CycleDetected { .. })));
        assert!(matches!(
            arena.set_child_of(a, a),
            Err(TreeError::CycleDetected { .. })
        ));
        assert_eq!(arena.path(a).unwrap(), "/a");
        assert_eq!(arena.parent(a), Some(root));
    }

    #[test]
    fn test_get_root_walks_parents() {
        let (mut arena, root) = arena_with_root();
        let a = arena.insert_node(Record::new("a"));
        let b = arena.insert_node(Record::new("b"));
        arena.set_child_of(a, root).unwrap();
        arena.set_child_of(b, a).unwrap();

        assert_eq!(arena.get_root(b).unwrap(), root);
        assert_eq!(arena.get_root(root).unwrap(), root);
        assert_eq!(arena.root_path(b).unwrap(), "/a");
        assert_eq!(arena.exploded_path(b).unwrap(), vec!["", "a", "b"]);
    }

    #[test]
    fn test_named_child_operations() {
        let (mut arena, root) = arena_with_root();
        let a = arena.insert_node(Record::new("a"));
        arena.attach_child(root, a).unwrap();

        assert!(arena.has_child(root, "a"));
        assert_eq!(arena.get_child(root, "a"), Some(a));
        assert!(!arena.has_child(root, "zz"));

        assert_eq!(arena.remove_child(root, "a"), Some(a));
        assert!(!arena.has_child(root, "a"));
        assert_eq!(arena.parent(a), None);
        assert_eq!(arena.path(a).unwrap(), "/a");
        assert_eq!(arena.remove_child(root, "a"), None);
    }

    #[test]
    fn test_add_child_is_set_like_and_leaves_paths() {
        let (mut arena, root) = arena_with_root();
        let a = arena.insert_node(Record::with_path("a", "/x/a"));
        arena.add_child(root, a).unwrap();
        arena.add_child(root, a).unwrap();

        assert_eq!(arena.children(root), &[a]);
        assert_eq!(arena.path(a).unwrap(), "/x/a");
    }

    #[test]
    fn test_iterators_and_depth() {
        let (mut arena, root) = arena_with_root();
        let a = arena.insert_node(Record::new("a"));
        let b = arena.insert_node(Record::new("b"));
        let c = arena.insert_node(Record::new("c"));
        arena.set_child_of(a, root).unwrap();
        arena.set_child_of(b, a).unwrap();
        arena.set_child_of(c, root).unwrap();

        let pre: Vec<Index> = arena.iter(root).map(|(idx, _)| idx).collect();
        assert_eq!(pre, vec![root, a, b, c]);
        let post: Vec<Index> = arena.iter_postorder(root).map(|(idx, _)| idx).collect();
        assert_eq!(post, vec![b, a, c, root]);
        assert_eq!(arena.max_depth(root), 3);
        assert_eq!(arena.find_by_path("/a/b"), Some(b));
        assert_eq!(arena.find_by_id("c"), Some(c));
    }

    #[test]
    fn test_get_root_reports_cyclic_parent_chain() {
        let (mut arena, _) = arena_with_root();
        let a = arena.insert_node(Record::new("a"));
        let b = arena.insert_node(Record::new("b"));
        arena.set_parent(b, a).unwrap();
        arena.set_parent(a, b).unwrap();

        assert!(matches!(
            arena.get_root(a),
            Err(TreeError::CycleDetected { .. })
        ));
        assert!(matches!(
            arena.get_root(b),
            Err(TreeError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_unknown_node_is_reported() {
        let (mut arena, root) = arena_with_root();
        let gone = arena.insert_node(Record::new("gone"));
        arena.arena.remove(gone);

        assert!(matches!(
            arena.set_child_of(gone, root),
            Err(TreeError::UnknownNode(_))
        ));
        assert!(matches!(arena.level(gone), Err(TreeError::UnknownNode(_))));
        assert!(arena.children(gone).is_empty());
    }
}
