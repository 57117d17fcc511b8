//! Owns everything one query needs: both parsed trees, the shared leaf-label
//! interner, and the current `Hdt`. Replaces the legacy implementation's
//! process-globals-plus-`atexit` lifecycle (SPEC_FULL.md §9) with ordinary
//! Rust ownership — dropping a `Session` drops every pool it owns
//! transitively.

use std::collections::HashMap;

use crate::error::{DistResult, TreeError};
use crate::tree::{LeafId, RootedTree};

/// Leaf-label interning table shared by both trees of a query, so that
/// equal labels in T1 and T2 map to the identical [`LeafId`] and a leaf-set
/// mismatch can be detected by integer comparison alone (component A's
/// `pair_alt_world`, reshaped per DESIGN.md).
#[derive(Debug, Default)]
pub struct LeafInterner {
    by_label: HashMap<String, LeafId>,
    labels: Vec<String>,
}

impl LeafInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `label`, returning its existing id if already seen.
    pub fn intern(&mut self, label: &str) -> LeafId {
        if let Some(&id) = self.by_label.get(label) {
            return id;
        }
        let id = LeafId(self.labels.len() as u32);
        self.labels.push(label.to_string());
        self.by_label.insert(label.to_string(), id);
        id
    }

    pub fn label(&self, id: LeafId) -> Option<&str> {
        self.labels.get(id.0 as usize).map(String::as_str)
    }

    /// Total number of distinct labels interned across both trees so far —
    /// the upper bound the driver passes as `max_colour`/total leaf count.
    pub fn len(&self) -> u32 {
        self.labels.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Everything one `calcTripDist`/`calcQuartDist` query needs, bundled so it
/// can be dropped as a single unit (§4.H).
pub struct Session {
    pub interner: LeafInterner,
    pub t1: RootedTree,
    pub t2: RootedTree,
}

impl Session {
    /// Parses `t1_src`/`t2_src` (Newick text, with `t1_path`/`t2_path` used
    /// only for diagnostics) into a shared-interner `Session`.
    pub fn load(t1_path: &str, t1_src: &str, t2_path: &str, t2_src: &str) -> DistResult<Self> {
        let mut interner = LeafInterner::new();
        let unrooted_t1 = crate::newick::parse(t1_path, t1_src, &mut interner)?;
        let unrooted_t2 = crate::newick::parse(t2_path, t2_src, &mut interner)?;
        let t1 = unrooted_t1.root();
        let t2 = unrooted_t2.root();
        Ok(Self { interner, t1, t2 })
    }

    /// Total leaf-label space across both trees — used to size
    /// `Hdt::leaf_nodes` and as the triplet/quartet combinatorial bound
    /// (`binom3`/`binom4`). The colour-space bound itself (`max_colour`) is
    /// `T1`'s own `max_degree`, not this value — see `driver::calculate_triplet_distance`.
    pub fn total_leaves(&self) -> u32 {
        self.interner.len()
    }

    /// True iff `t1`/`t2` carry exactly the same set of leaf labels
    /// (component A's `pair_alt_world` check). A mismatch is reported as
    /// [`TreeError::LeafSetMismatch`] so the CLI can print the `-1` sentinel
    /// (OQ-1) rather than a parse-time abort.
    pub fn check_leaf_sets_match(&self) -> DistResult<()> {
        let n = self.total_leaves();
        for i in 0..n {
            let id = LeafId(i);
            if self.t1.leaf_node(id).is_none() || self.t2.leaf_node(id).is_none() {
                return Err(TreeError::LeafSetMismatch.into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable_across_repeated_labels() {
        let mut interner = LeafInterner::new();
        let a = interner.intern("foo");
        let b = interner.intern("bar");
        let a2 = interner.intern("foo");
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(interner.len(), 2);
        assert_eq!(interner.label(a), Some("foo"));
    }
}
