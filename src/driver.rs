//! Smaller-half recursion over `T1`, orchestrating recolouring, counter
//! reads, and extract-and-contract of `T2`'s `Hdt` (component D).
//!
//! Ported from `original_source/src/Soda13Impl.cpp`'s `count()` and
//! `calculateTripletDistance`/`calculateQuartetDistance`: rotate the largest
//! child to the head of the child list, colour every other child with a
//! distinct colour, read the `Hdt`'s deltas, stash an extracted-and-contracted
//! `T2` projection for every non-first child, recolour back to 0, then
//! recurse — rebuilding the `Hdt` on a smaller image whenever the current one
//! has grown disproportionate to the subtree still being visited.

use std::collections::HashSet;

use smallvec::SmallVec;

use crate::config::{CONTRACT_MAX_EXTRA_SIZE, DistanceMode};
use crate::hdt::{self, CounterDelta, Hdt};
use crate::tree::{LeafId, NodeId, RootedTree};

/// Running totals accumulated across every `update_counters` call made over
/// the course of one `count()` traversal.
#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    resolved_triplets: u64,
    unresolved_triplets: u64,
    quartet_agree: u64,
    quartet_agree_diag: u64,
    quartet_agree_upper: u64,
    quartet_unresolved: u64,
}

impl Totals {
    fn accumulate(&mut self, delta: CounterDelta) {
        self.resolved_triplets += delta.resolved_triplets;
        self.unresolved_triplets += delta.unresolved_triplets;
        self.quartet_agree += delta.quartet_agree;
        self.quartet_agree_diag += delta.quartet_agree_diag;
        self.quartet_agree_upper += delta.quartet_agree_upper;
        self.quartet_unresolved += delta.quartet_unresolved;
    }
}

/// `T2`'s current working topology paired with the `Hdt` built over it. The
/// pair is always rebuilt together: `Hdt::construct` borrows `tree` only
/// transiently, so `T2State` is what actually flows through the recursion.
struct T2State<M: DistanceMode> {
    tree: RootedTree,
    hdt: Hdt<M>,
}

impl<M: DistanceMode> T2State<M> {
    fn fresh(tree: RootedTree, max_colour: u32) -> Self {
        let hdt = hdt::construct(&tree, max_colour);
        Self { tree, hdt }
    }

    fn restricted(&self, keep: &HashSet<LeafId>, max_colour: u32) -> Self {
        let tree = self.tree.extract_and_contract(&|leaf| keep.contains(&leaf));
        log::trace!(
            "extract-and-contract: {} leaves -> {} leaves, HDT rebuild",
            self.tree.num_leaves,
            tree.num_leaves
        );
        Self::fresh(tree, max_colour)
    }
}

/// `binom(n, 3)`: the total number of leaf triples on `n` leaves.
pub fn binom3(n: u64) -> u64 {
    if n < 3 {
        return 0;
    }
    n * (n - 1) * (n - 2) / 6
}

/// `binom(n, 4)`: the total number of leaf quadruples on `n` leaves.
pub fn binom4(n: u64) -> u64 {
    if n < 4 {
        return 0;
    }
    n * (n - 1) * (n - 2) * (n - 3) / 24
}

/// True iff `t1` and `t2` carry exactly the same leaf ids out of the shared
/// `[0, total_leaves)` interning space — component A's `pair_alt_world`
/// check, reshaped per DESIGN.md as a pair of dense lookup tables rather
/// than direct back-pointers.
fn leaf_sets_match(t1: &RootedTree, t2: &RootedTree, total_leaves: u32) -> bool {
    (0..total_leaves).all(|i| {
        let id = LeafId(i);
        t1.leaf_node(id).is_some() && t2.leaf_node(id).is_some()
    })
}

/// The smaller-half recursion (component D, `count(v)`). Consumes `t2`: each
/// call either hands the same `Hdt`/tree pair down to exactly one recursive
/// call, or replaces it with a freshly built one scoped to a narrower leaf
/// set. A `T2State` that is not handed further down is simply dropped at the
/// end of its owning call — the `Retired` state in the HDT lifecycle.
fn count<M: DistanceMode>(
    t1: &mut RootedTree,
    v: NodeId,
    mut t2: T2State<M>,
    max_colour: u32,
    totals: &mut Totals,
) {
    let (is_leaf, n) = {
        let node = t1.node(v);
        (node.leaf.is_some(), node.n)
    };

    // Step 1: base case.
    if is_leaf || n <= 2 {
        t1.color_subtree(v, 0, |leaf, old, new| t2.hdt.leaf_color_changed(leaf, old, new));
        return;
    }

    // Step 2: rotate the largest child to the front (ties: first-seen wins,
    // see DESIGN.md OQ-2).
    t1.rotate_largest_child_to_front(v);
    let children: SmallVec<[NodeId; 4]> = t1.node(v).children.clone();
    let first_child = children[0];

    // Step 3: colour every other child with its own (1-based) position.
    for (pos, &child) in children.iter().enumerate().skip(1) {
        let colour = (pos + 1) as u32;
        t1.color_subtree(child, colour, |leaf, old, new| {
            t2.hdt.leaf_color_changed(leaf, old, new)
        });
    }

    // Step 4: read and accumulate the triplets/quartets this split resolves.
    totals.accumulate(t2.hdt.update_counters());

    // Step 5: stash an extracted-and-contracted T2 projection per non-first
    // child, while the current colouring (and hence `t1`'s topology) is
    // still in the shape this frame left it.
    let mut stashed: Vec<RootedTree> = Vec::with_capacity(children.len().saturating_sub(1));
    for &child in children.iter().skip(1) {
        let mut leaves = Vec::new();
        t1.leaves_under(child, &mut leaves);
        let keep: HashSet<LeafId> = leaves.into_iter().collect();
        stashed.push(t2.tree.extract_and_contract(&|leaf| keep.contains(&leaf)));
    }

    // Step 6: recolour non-first children back to 0. Left dirty on purpose:
    // the next `update_counters` call (inside whichever recursive call reads
    // it next) recomputes the union of this undo and that call's own
    // colouring in one pass.
    for &child in children.iter().skip(1) {
        t1.color_subtree(child, 0, |leaf, old, new| t2.hdt.leaf_color_changed(leaf, old, new));
    }

    // Step 7: recurse into the first (largest) child, rebuilding the Hdt
    // first if it has grown disproportionate to what's left to visit.
    let first_n = t1.node(first_child).n as u64;
    if first_n * CONTRACT_MAX_EXTRA_SIZE < t2.hdt.leaf_count() as u64 {
        let mut leaves = Vec::new();
        t1.leaves_under(first_child, &mut leaves);
        let keep: HashSet<LeafId> = leaves.into_iter().collect();
        t2 = t2.restricted(&keep, max_colour);
    }
    count(t1, first_child, t2, max_colour, totals);

    // Step 8: recurse into every other child with `n > 2`, each from its own
    // stashed, independently rebuilt Hdt.
    for (pos, &child) in children.iter().enumerate().skip(1) {
        let child_n = t1.node(child).n;
        if child_n <= 2 {
            continue;
        }
        let sub_tree = std::mem::replace(
            &mut stashed[pos - 1],
            RootedTree {
                nodes: crate::arena::Pool::new(),
                root: crate::arena::Id::from_index(0),
                num_leaves: 0,
                max_degree: 0,
                leaf_nodes: Vec::new(),
            },
        );
        log::trace!("stashed-child rebuild: {} leaves", sub_tree.num_leaves);
        let mut sub = T2State::fresh(sub_tree, max_colour);
        // Mark the whole subtree as "inside" this isolated Hdt before
        // recursing — see DESIGN.md for why this is a no-op on the counts
        // themselves (every leaf here moves to the same colour at once) but
        // keeps colour 0 meaning "outside the current recursion" uniformly.
        t1.color_subtree(child, 1, |leaf, old, new| sub.hdt.leaf_color_changed(leaf, old, new));
        count(t1, child, sub, max_colour, totals);
    }
}

/// Computes the triplet distance between `t1` and `t2`. Returns `-1` if the
/// two trees do not share exactly the same `total_leaves`-sized leaf set
/// (component D's pairing-failure sentinel, see DESIGN.md OQ-1); otherwise a
/// value in `[0, binom3(total_leaves)]`.
pub fn calculate_triplet_distance<M: DistanceMode>(
    mut t1: RootedTree,
    t2: RootedTree,
    total_leaves: u32,
) -> i64 {
    if !leaf_sets_match(&t1, &t2, total_leaves) {
        return -1;
    }
    let mut totals = Totals::default();
    // The colour domain is bounded by T1's own max degree (colours are
    // 1-based sibling positions assigned per `count`'s step 3), not by the
    // total leaf count — `original_source/src/Soda13Impl.cpp` sizes its
    // counting lists off `t1->maxDegree` for the same reason.
    let max_colour = t1.max_degree;
    let t2_state = T2State::fresh(t2, max_colour);
    count(&mut t1, t1.root, t2_state, max_colour, &mut totals);

    // `resolved_triplets` counts triples T1 and T2 agree on (resolved the
    // same way); `unresolved_triplets` counts triples both leave unresolved.
    // Everything else is a disagreement — the triplet distance.
    let total = binom3(total_leaves as u64);
    let agreeing = totals.resolved_triplets + totals.unresolved_triplets;
    total_leaves_saturating_sub(total, agreeing) as i64
}

/// Computes the quartet distance between `t1` and `t2`. Same `-1` sentinel
/// semantics as [`calculate_triplet_distance`]; only meaningful when `M`'s
/// [`DistanceMode::QUARTETS`] is `true` (the CLI rejects `calcQuartDist`
/// before ever reaching this call when it is not).
pub fn calculate_quartet_distance<M: DistanceMode>(
    mut t1: RootedTree,
    t2: RootedTree,
    total_leaves: u32,
) -> i64 {
    if !leaf_sets_match(&t1, &t2, total_leaves) {
        return -1;
    }
    let mut totals = Totals::default();
    let max_colour = t1.max_degree;
    let t2_state = T2State::fresh(t2, max_colour);
    count(&mut t1, t1.root, t2_state, max_colour, &mut totals);

    let total = binom4(total_leaves as u64);
    let agree = totals.quartet_agree + totals.quartet_agree_diag + totals.quartet_agree_upper;
    let agreeing = agree + totals.quartet_unresolved;
    total_leaves_saturating_sub(total, agreeing) as i64
}

fn total_leaves_saturating_sub(total: u64, counted: u64) -> u64 {
    total.saturating_sub(counted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binom3_matches_definition() {
        assert_eq!(binom3(0), 0);
        assert_eq!(binom3(2), 0);
        assert_eq!(binom3(3), 1);
        assert_eq!(binom3(4), 4);
        assert_eq!(binom3(5), 10);
    }

    #[test]
    fn binom4_matches_definition() {
        assert_eq!(binom4(3), 0);
        assert_eq!(binom4(4), 1);
        assert_eq!(binom4(5), 5);
    }
}
