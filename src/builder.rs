use std::collections::HashMap;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::arena::TreeArena;
use crate::errors::{TreeError, TreeResult};
use crate::tree_traits::PathEntity;

/// What to do with a candidate whose parent path has not been seen yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Link the orphan directly under the assumed root and report it.
    #[default]
    AttachToRoot,
    /// Fail the build with [`TreeError::Orphan`].
    Reject,
}

/// Outcome of one tree assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Candidates in arrival order
    pub linked: Vec<Index>,
    /// Candidates that fell back to the root
    pub orphans: Vec<Index>,
}

/// Reassembles a tree from nodes carrying authoritative paths.
///
/// Candidates must arrive ancestors first: each one is linked to the node
/// registered under its parent path, so a parent arriving later is missed.
pub struct TreeBuilder {
    orphan_policy: OrphanPolicy,
    path_lookup: HashMap<String, Index>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::with_orphan_policy(OrphanPolicy::default())
    }

    pub fn with_orphan_policy(orphan_policy: OrphanPolicy) -> Self {
        Self {
            orphan_policy,
            path_lookup: HashMap::new(),
        }
    }

    pub fn orphan_policy(&self) -> OrphanPolicy {
        self.orphan_policy
    }

    /// Inserts `candidates` one at a time and links each below `root`.
    ///
    /// On error the failing candidate is removed again. Candidates linked
    /// before it stay in the tree and the rest are never inserted.
    #[instrument(level = "debug", skip(self, arena, candidates))]
    pub fn build_tree<T, I>(
        &mut self,
        arena: &mut TreeArena<T>,
        root: Index,
        candidates: I,
    ) -> TreeResult<BuildReport>
    where
        T: PathEntity,
        I: IntoIterator<Item = T>,
    {
        self.seed_lookup(arena, root)?;
        let mut report = BuildReport::default();
        for candidate in candidates {
            let idx = arena.insert_node(candidate);
            if let Err(e) = self.link_one(arena, root, idx, &mut report) {
                arena.discard_node(idx);
                return Err(e);
            }
        }
        log_report(arena, root, &report);
        Ok(report)
    }

    /// Links nodes already stored in the arena below `root`, in one pass.
    ///
    /// Paths are taken as they are; nothing is recomputed.
    #[instrument(level = "debug", skip(self, arena, candidates))]
    pub fn link_nodes<T, I>(
        &mut self,
        arena: &mut TreeArena<T>,
        root: Index,
        candidates: I,
    ) -> TreeResult<BuildReport>
    where
        T: PathEntity,
        I: IntoIterator<Item = Index>,
    {
        self.seed_lookup(arena, root)?;
        let mut report = BuildReport::default();
        for candidate in candidates {
            self.link_one(arena, root, candidate, &mut report)?;
        }
        log_report(arena, root, &report);
        Ok(report)
    }

    fn seed_lookup<T: PathEntity>(&mut self, arena: &TreeArena<T>, root: Index) -> TreeResult<()> {
        self.path_lookup.clear();
        self.path_lookup
            .insert(arena.path(root)?.to_string(), root);
        Ok(())
    }

    fn link_one<T: PathEntity>(
        &mut self,
        arena: &mut TreeArena<T>,
        root: Index,
        candidate: Index,
        report: &mut BuildReport,
    ) -> TreeResult<()> {
        let path = arena.path(candidate)?.to_string();
        let parent_path = arena.codec().parent_path(&path);
        self.path_lookup.insert(path, candidate);

        let parent = match self.path_lookup.get(&parent_path) {
            Some(&parent) if parent != candidate => parent,
            _ => {
                let id = arena.display_id(candidate);
                if self.orphan_policy == OrphanPolicy::Reject {
                    return Err(TreeError::Orphan { id, parent_path });
                }
                warn!(
                    "orphan {}: parent path {} not seen yet, attaching to root",
                    id, parent_path
                );
                report.orphans.push(candidate);
                root
            }
        };

        arena.set_parent(candidate, parent)?;
        report.linked.push(candidate);
        Ok(())
    }
}

fn log_report<T>(arena: &TreeArena<T>, root: Index, report: &BuildReport) {
    debug!(
        "linked {} nodes ({} orphans), depth {}",
        report.linked.len(),
        report.orphans.len(),
        arena.max_depth(root)
    );
}
