//! Hierarchical Decomposition Tree: the data structure the driver rebuilds
//! and recolours at every recursion frame to maintain triplet/quartet
//! counters in better-than-quadratic time.
//!
//! A `T2` rooted tree decomposes into an `Hdt` of four node kinds:
//! - [`HdtNodeKind::Leaf`] — a `T2` leaf.
//! - [`HdtNodeKind::Series`] (`C`) — a degree-1 `T2` node: pure pass-through,
//!   contributes no new resolved/agree triples.
//! - [`HdtNodeKind::Parallel`] (`I`) — a genuine degree-2 `T2` node.
//! - [`HdtNodeKind::General`] (`G`) — a degree-`k >= 3` `T2` node (a real
//!   multifurcation), wrapping its `k` real children directly rather than
//!   rebalancing them into a synthetic binary merge tree. A pairwise Huffman
//!   rebalancing (combining two sibling children's counters before a third
//!   sibling is visible) would make two leaves sitting in two *different*
//!   real children look "already together" to the counter recurrence, which
//!   both fabricates resolved triplets/quartets that do not exist in `T2`'s
//!   real topology and never gives the genuine "all children pairwise
//!   distinct" case a chance to register as unresolved. [`counters`]'s
//!   `combine_general` works from the `k` real children directly so no
//!   sibling ever looks closer to another sibling than the construction
//!   actually warrants.

pub mod construct;
pub mod counters;
pub mod counting_list;

pub use construct::construct;
pub use counters::QuartetCounterSet;

use crate::arena::{Id, Pool};
use crate::config::DistanceMode;
use crate::tree::LeafId;
use counting_list::CountingList;
use smallvec::SmallVec;

pub type HdtId<M> = Id<HdtNode<M>>;

#[derive(Debug, Clone)]
pub enum HdtNodeKind<M: DistanceMode> {
    Leaf(LeafId),
    Series(HdtId<M>),
    Parallel(HdtId<M>, HdtId<M>),
    General(SmallVec<[HdtId<M>; 4]>),
}

/// One node of the decomposition. Every field except `kind` and `parent` is
/// a cached aggregate over the leaves beneath this node, recomputed by
/// [`counters::update_counters`] only when [`HdtNode::dirty`] is set.
pub struct HdtNode<M: DistanceMode> {
    pub kind: HdtNodeKind<M>,
    pub parent: Option<HdtId<M>>,
    /// `cnt[c]`: number of leaves under this node with current `T1` colour
    /// `c`.
    pub leaf_counts: CountingList,
    /// `resolved_ij[i].get(j)`: number of resolved triplets under this node
    /// whose pair-branch carries colour `i` and whose singleton-branch
    /// carries colour `j`.
    pub resolved_ij: Vec<CountingList>,
    /// Resolved triplets are only ever created by summing two already-
    /// distinct branches (see `counters`), so unlike `resolved_ij` this
    /// total never needs a per-colour breakdown to compose correctly.
    pub unresolved_triplets: u64,
    pub quartet: M::Quartet,
    pub dirty: bool,
}

impl<M: DistanceMode> HdtNode<M> {
    fn new_empty(kind: HdtNodeKind<M>, max_colour: u32) -> Self {
        let cap = max_colour as usize + 1;
        Self {
            kind,
            parent: None,
            leaf_counts: CountingList::new(cap),
            resolved_ij: (0..cap).map(|_| CountingList::new(cap)).collect(),
            unresolved_triplets: 0,
            quartet: M::Quartet::default(),
            dirty: true,
        }
    }
}

/// An HDT over a fixed `T2` topology, generic over the active
/// [`DistanceMode`] so a triplet-only build never instantiates quartet
/// storage.
pub struct Hdt<M: DistanceMode> {
    pub nodes: Pool<HdtNode<M>>,
    pub root: HdtId<M>,
    /// `T1`/`T2`-shared leaf id -> HDT leaf node id, sized to the whole
    /// session's leaf space rather than to this `Hdt`'s own `T2`: a rebuilt
    /// `Hdt` over an extracted-and-contracted subtree only has entries for
    /// the surviving leaves, and every other slot is `None`.
    pub leaf_nodes: Vec<Option<HdtId<M>>>,
    /// Largest colour value ever assigned plus one; bounds every
    /// [`CountingList`]'s capacity.
    pub max_colour: u32,
    /// Root totals as of the last `update_counters` call, so the next call
    /// can report a delta instead of an absolute value (component D sums
    /// deltas across the whole smaller-half recursion).
    snapshot_resolved: u64,
    snapshot_unresolved: u64,
    snapshot_quartet_agree: u64,
    snapshot_quartet_agree_diag: u64,
    snapshot_quartet_agree_upper: u64,
    snapshot_quartet_unresolved: u64,
}

/// Deltas accumulated by a single `update_counters` call, relative to the
/// previous call on the same `Hdt`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterDelta {
    pub resolved_triplets: u64,
    pub unresolved_triplets: u64,
    pub quartet_agree: u64,
    pub quartet_agree_diag: u64,
    pub quartet_agree_upper: u64,
    pub quartet_unresolved: u64,
}

impl<M: DistanceMode> Hdt<M> {
    /// Number of leaves currently represented in this `Hdt` — the size of
    /// its `T2` projection, which may be smaller than the whole session's
    /// leaf space after an extract-and-contract rebuild (component D step 7
    /// consults this to decide whether a rebuild is due).
    pub fn leaf_count(&self) -> u32 {
        self.leaf_nodes.iter().filter(|s| s.is_some()).count() as u32
    }

    /// Marks `leaf`'s colour as changed and propagates dirtiness up to the
    /// root. Does not recompute anything; call [`Hdt::update_counters`]
    /// once all colour changes for this frame have been applied.
    pub fn leaf_color_changed(&mut self, leaf: LeafId, old_colour: u32, new_colour: u32) {
        if old_colour == new_colour {
            return;
        }
        let Some(id) = self.leaf_nodes[leaf.0 as usize] else {
            // Leaf absent from this Hdt's T2 (an extracted-and-contracted
            // rebuild scoped to a different subtree); nothing to propagate.
            return;
        };
        {
            let node = self.nodes.get_mut(id);
            let cur_old = node.leaf_counts.get(old_colour);
            debug_assert!(cur_old >= 1, "leaf colour {old_colour} count going negative at HDT leaf {id:?}");
            node.leaf_counts.set(old_colour, cur_old.saturating_sub(1));
            let cur_new = node.leaf_counts.get(new_colour);
            node.leaf_counts.set(new_colour, cur_new + 1);
        }
        self.mark_dirty_upward(id);
    }

    fn mark_dirty_upward(&mut self, mut id: HdtId<M>) {
        loop {
            let node = self.nodes.get_mut(id);
            if node.dirty {
                return;
            }
            node.dirty = true;
            match node.parent {
                Some(p) => id = p,
                None => return,
            }
        }
    }

    /// Recomputes every dirty node bottom-up and returns the deltas at the
    /// root since the previous call.
    pub fn update_counters(&mut self) -> CounterDelta {
        counters::recompute(self, self.root);
        let root = self.nodes.get(self.root);
        let resolved = counters::total_resolved_triplets(root);
        let unresolved = root.unresolved_triplets;
        let q_agree = root.quartet.agree();
        let q_diag = root.quartet.agree_diag();
        let q_upper = root.quartet.agree_upper();
        let q_unresolved = root.quartet.unresolved();

        let delta = CounterDelta {
            resolved_triplets: resolved.saturating_sub(self.snapshot_resolved),
            unresolved_triplets: unresolved.saturating_sub(self.snapshot_unresolved),
            quartet_agree: q_agree.saturating_sub(self.snapshot_quartet_agree),
            quartet_agree_diag: q_diag.saturating_sub(self.snapshot_quartet_agree_diag),
            quartet_agree_upper: q_upper.saturating_sub(self.snapshot_quartet_agree_upper),
            quartet_unresolved: q_unresolved.saturating_sub(self.snapshot_quartet_unresolved),
        };
        self.snapshot_resolved = resolved;
        self.snapshot_unresolved = unresolved;
        self.snapshot_quartet_agree = q_agree;
        self.snapshot_quartet_agree_diag = q_diag;
        self.snapshot_quartet_agree_upper = q_upper;
        self.snapshot_quartet_unresolved = q_unresolved;
        delta
    }
}
