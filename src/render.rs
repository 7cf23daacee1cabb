//! Read-only views of an assembled tree: nested, flat and JSON.
//!
//! Every output follows depth-first pre-order and child-set order. Each view
//! comes in two flavors: one using the built-in label and a `_with` variant
//! taking a caller-supplied render function.

use std::fmt::Display;

use generational_arena::Index;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::instrument;

use crate::arena::TreeArena;
use crate::errors::{TreeError, TreeResult};
use crate::tree_traits::PathEntity;

/// What a render function sees of a node.
pub struct NodeView<'a, T> {
    arena: &'a TreeArena<T>,
    pub index: Index,
    pub data: &'a T,
}

impl<'a, T: PathEntity> NodeView<'a, T> {
    /// Id of the node, empty if unassigned.
    pub fn id(&self) -> String {
        self.data.node_id().unwrap_or_default()
    }

    pub fn path(&self) -> &'a str {
        self.data.path().unwrap_or_default()
    }

    pub fn parent_path(&self) -> String {
        self.arena.codec().parent_path(self.path())
    }

    pub fn level(&self) -> usize {
        self.arena.codec().depth(self.path())
    }
}

/// Built-in label: the entity's `Display` output.
pub fn default_label<T: PathEntity + Display>(view: NodeView<'_, T>) -> String {
    view.data.to_string()
}

/// Built-in flat label: one dash per level below the first, then the label.
pub fn indented_label<T: PathEntity + Display>(view: NodeView<'_, T>) -> String {
    let level = view.level();
    let indent = if level > 1 {
        "-".repeat(level)
    } else {
        String::new()
    };
    format!("{}{}", indent, view.data)
}

/// Nested rendering: `{ id: { "node": ..., "children": { ... } } }`.
///
/// Keyed by id in first-seen order; a repeated id replaces the earlier entry
/// in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NestedTree<R> {
    entries: IndexMap<String, NestedEntry<R>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedEntry<R> {
    pub node: R,
    pub children: NestedTree<R>,
}

impl<R> NestedTree<R> {
    fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&NestedEntry<R>> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NestedEntry<R>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Flat rendering: `id -> value` in pre-order, same keying as [`NestedTree`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FlatTree<R> {
    entries: IndexMap<String, R>,
}

impl<R> FlatTree<R> {
    pub fn get(&self, id: &str) -> Option<&R> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &R)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: PathEntity> TreeArena<T> {
    fn view(&self, index: Index) -> TreeResult<NodeView<'_, T>> {
        let data = &self
            .get_node(index)
            .ok_or(TreeError::UnknownNode(index))?
            .data;
        Ok(NodeView {
            arena: self,
            index,
            data,
        })
    }

    #[instrument(level = "debug", skip(self, render))]
    pub fn to_array_with<R, F>(&self, start: Index, render: F) -> TreeResult<NestedTree<R>>
    where
        F: Fn(NodeView<'_, T>) -> R,
    {
        let mut tree = NestedTree::new();
        self.insert_nested(&mut tree, start, &render)?;
        Ok(tree)
    }

    fn insert_nested<R, F>(
        &self,
        tree: &mut NestedTree<R>,
        index: Index,
        render: &F,
    ) -> TreeResult<()>
    where
        F: Fn(NodeView<'_, T>) -> R,
    {
        let view = self.view(index)?;
        let id = view.id();
        let node = render(view);
        let mut children = NestedTree::new();
        for &child in self.children(index) {
            self.insert_nested(&mut children, child, render)?;
        }
        tree.entries.insert(id, NestedEntry { node, children });
        Ok(())
    }

    #[instrument(level = "debug", skip(self, render))]
    pub fn to_flat_array_with<R, F>(&self, start: Index, render: F) -> TreeResult<FlatTree<R>>
    where
        F: Fn(NodeView<'_, T>) -> R,
    {
        let mut entries = IndexMap::new();
        self.view(start)?;
        for (index, _) in self.iter(start) {
            let view = self.view(index)?;
            entries.insert(view.id(), render(view));
        }
        Ok(FlatTree { entries })
    }

    /// Nested rendering encoded as a JSON document.
    pub fn to_json_with<R, F>(&self, start: Index, render: F) -> TreeResult<String>
    where
        R: Serialize,
        F: Fn(NodeView<'_, T>) -> R,
    {
        let tree = self.to_array_with(start, render)?;
        Ok(serde_json::to_string(&tree)?)
    }
}

impl<T: PathEntity + Display> TreeArena<T> {
    pub fn to_array(&self, start: Index) -> TreeResult<NestedTree<String>> {
        self.to_array_with(start, default_label::<T>)
    }

    pub fn to_flat_array(&self, start: Index) -> TreeResult<FlatTree<String>> {
        self.to_flat_array_with(start, indented_label::<T>)
    }

    pub fn to_json(&self, start: Index) -> TreeResult<String> {
        self.to_json_with(start, default_label::<T>)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::builder::TreeBuilder;
    use crate::record::Record;

    fn sample() -> (TreeArena<Record>, Index) {
        let mut arena = TreeArena::new();
        let root = arena.insert_node(Record::with_path("1", "/").labeled("root"));
        TreeBuilder::new()
            .build_tree(
                &mut arena,
                root,
                vec![
                    Record::with_path("2", "/2").labeled("two"),
                    Record::with_path("3", "/2/3").labeled("three"),
                    Record::with_path("4", "/4").labeled("four"),
                ],
            )
            .unwrap();
        (arena, root)
    }

    #[test]
    fn test_to_array_nests_children() {
        let (arena, root) = sample();
        let tree = arena.to_array(root).unwrap();

        let top = tree.get("1").unwrap();
        assert_eq!(top.node, "root");
        assert_eq!(top.children.len(), 2);
        let two = top.children.get("2").unwrap();
        assert_eq!(two.node, "two");
        assert_eq!(two.children.get("3").unwrap().node, "three");
        assert!(top.children.get("4").unwrap().children.is_empty());
    }

    #[test]
    fn test_to_flat_array_indents_by_level() {
        let (arena, root) = sample();
        let flat = arena.to_flat_array(root).unwrap();

        let pairs: Vec<(&str, &String)> = flat.iter().collect();
        assert_eq!(
            pairs,
            vec![
                ("1", &"root".to_string()),
                ("2", &"two".to_string()),
                ("3", &"--three".to_string()),
                ("4", &"four".to_string()),
            ]
        );
    }

    #[test]
    fn test_to_json_preserves_order() {
        let (arena, root) = sample();
        let json = arena.to_json(root).unwrap();
        assert_eq!(
            json,
            r#"{"1":{"node":"root","children":{"2":{"node":"two","children":{"3":{"node":"three","children":{}}}},"4":{"node":"four","children":{}}}}}"#
        );
    }

    #[test]
    fn test_to_json_with_custom_render() {
        let (arena, root) = sample();
        let json = arena.to_json_with(root, |view| view.level()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["1"]["children"]["2"]["children"]["3"]["node"], 2);
    }

    #[test]
    fn test_to_json_propagates_encoder_failure() {
        let (arena, root) = sample();
        let result = arena.to_json_with(root, |_| {
            let mut bad = HashMap::new();
            bad.insert((1, 2), 3);
            bad
        });
        assert!(matches!(result, Err(TreeError::Json(_))));
    }

    #[test]
    fn test_repeated_id_replaces_entry_in_place() {
        let mut arena = TreeArena::new();
        let root = arena.insert_node(Record::with_path("1", "/").labeled("root"));
        TreeBuilder::new()
            .build_tree(
                &mut arena,
                root,
                vec![
                    Record::with_path("2", "/2").labeled("first"),
                    Record::with_path("4", "/4").labeled("four"),
                    Record::with_path("2", "/2").labeled("second"),
                ],
            )
            .unwrap();

        let flat = arena.to_flat_array(root).unwrap();
        assert_eq!(flat.len(), 3);
        assert_eq!(flat.keys().collect::<Vec<_>>(), vec!["1", "2", "4"]);
        assert_eq!(flat.get("2").map(String::as_str), Some("second"));

        let tree = arena.to_array(root).unwrap();
        let ids: Vec<&str> = tree.get("1").unwrap().children.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["2", "4"]);
        assert_eq!(
            arena.to_json(root).unwrap(),
            r#"{"1":{"node":"root","children":{"2":{"node":"second","children":{}},"4":{"node":"four","children":{}}}}}"#
        );
    }

    #[test]
    fn test_render_is_read_only() {
        let (arena, root) = sample();
        let before: Vec<String> = arena
            .iter(root)
            .map(|(_, node)| node.path().to_string())
            .collect();
        arena.to_array(root).unwrap();
        arena.to_flat_array(root).unwrap();
        let after: Vec<String> = arena
            .iter(root)
            .map(|(_, node)| node.path().to_string())
            .collect();
        assert_eq!(before, after);
    }
}
