//! Build-time configuration knobs.
//!
//! Both knobs described by the driver are fixed at compile time rather than
//! threaded through as runtime struct fields: `CONTRACT_MAX_EXTRA_SIZE` is
//! consulted once per recursion frame on a path that is already O(log n)
//! deep, and the quartet capability switch is selected once per binary, not
//! per query.

/// Threshold controlling when the HDT is rebuilt on the extracted-and-
/// contracted image of the first (largest) child before recursing into it.
/// See [`crate::driver::count`].
pub const CONTRACT_MAX_EXTRA_SIZE: u64 = 20_000;

/// Per-node quartet bookkeeping, factored out of [`DistanceMode`] as an
/// associated type so a triplet-only build carries a zero-sized `()` rather
/// than a family of counting lists it never reads.
///
/// Implementors own the `agree`/`agreeDiag`/`agreeUpper`/`unresolved` quartet
/// families for a single HDT node and know how to fold a child's families
/// into a parent's during `I` composition (see [`crate::hdt::counters`]).
/// The split between `agree_diag` and
/// `agree_upper` is this crate's own convention for the two ways a
/// `(2,1,1)`-shaped quartet can straddle a composition node (pair on the
/// first branch vs. pair on a later one); only their sum is load-bearing for
/// the final distance, so the split carries no claim of matching any
/// published source's internal naming.
pub trait QuartetAccum: Default + Clone + std::fmt::Debug {
    /// Fold two children of a binary (`I`) composition node into `self`.
    /// `left_counts`/`right_counts` are the children's per-colour leaf
    /// tallies, already known to the caller; passed in rather than read off
    /// `self` because `QuartetAccum` does not own colour counts.
    fn combine_binary(
        &mut self,
        left: &Self,
        left_counts: &crate::hdt::counting_list::CountingList,
        right: &Self,
        right_counts: &crate::hdt::counting_list::CountingList,
        max_colour: u32,
    );

    /// Copy a single child's families through unchanged (`C` composition).
    fn combine_series(&mut self, child: &Self) {
        *self = child.clone();
    }

    /// Fold the `k >= 3` real children of a `General` (`G`) composition node
    /// into `self` directly, without rebalancing them into a synthetic
    /// binary merge first. Each pair `(child, child_counts)` mirrors the
    /// `left`/`left_counts` pairing `combine_binary` takes.
    fn combine_general(&mut self, children: &[(&Self, &crate::hdt::counting_list::CountingList)], max_colour: u32);

    fn agree(&self) -> u64;
    fn agree_diag(&self) -> u64;
    fn agree_upper(&self) -> u64;
    fn unresolved(&self) -> u64;
}

/// No-op quartet bookkeeping for [`TripletOnly`]: every fold is a no-op and
/// every total reads zero, so the shared recurrence code in
/// [`crate::hdt::counters`] can call these methods unconditionally without a
/// `M::QUARTETS` branch on the hot path.
impl QuartetAccum for () {
    fn combine_binary(
        &mut self,
        _left: &Self,
        _left_counts: &crate::hdt::counting_list::CountingList,
        _right: &Self,
        _right_counts: &crate::hdt::counting_list::CountingList,
        _max_colour: u32,
    ) {
    }
    fn combine_series(&mut self, _child: &Self) {}
    fn combine_general(&mut self, _children: &[(&Self, &crate::hdt::counting_list::CountingList)], _max_colour: u32) {}
    fn agree(&self) -> u64 {
        0
    }
    fn agree_diag(&self) -> u64 {
        0
    }
    fn agree_upper(&self) -> u64 {
        0
    }
    fn unresolved(&self) -> u64 {
        0
    }
}

/// Capability switch selecting whether quartet-mode counter families are
/// tracked. Implemented as a sealed trait with two marker types rather than
/// a `#[cfg]`-gated field, so the counter engine's recurrence table is
/// generic over the mode instead of branching on it at every update.
pub trait DistanceMode: Copy + Clone + std::fmt::Debug + 'static {
    /// Whether quartet counter families are tracked at all.
    const QUARTETS: bool;

    /// Quartet-family storage for one HDT node; `()` when [`Self::QUARTETS`]
    /// is `false`.
    type Quartet: QuartetAccum;
}

/// Triplet distance only; quartet counter families are not maintained.
#[derive(Debug, Clone, Copy)]
pub struct TripletOnly;

impl DistanceMode for TripletOnly {
    const QUARTETS: bool = false;
    type Quartet = ();
}

/// Both triplet and quartet distances are maintained.
#[derive(Debug, Clone, Copy)]
pub struct TripletAndQuartet;

impl DistanceMode for TripletAndQuartet {
    const QUARTETS: bool = true;
    type Quartet = crate::hdt::counters::QuartetCounterSet;
}

#[cfg(feature = "quartet")]
pub type ActiveMode = TripletAndQuartet;
#[cfg(not(feature = "quartet"))]
pub type ActiveMode = TripletOnly;
