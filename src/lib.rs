//! Triplet and quartet tree distance via Hierarchical Decomposition Trees
//! (Brodal, Fagerberg, Mailund, Pedersen & Sand, SODA'13).
//!
//! Given two trees `T1`, `T2` on the same `n` labelled leaves, this crate
//! counts the triples (resp. quadruples) of leaves on which the two trees
//! induce different topologies, in subquadratic time. The driver
//! ([`driver`]) walks `T1` with a smaller-half recursion, colouring
//! subtrees and reading accumulated counts out of an HDT ([`hdt`]) built
//! over `T2`; `hdt::construct` rebuilds that HDT in place whenever
//! extract-and-contract has shrunk the remaining work enough to make a
//! rebuild pay for itself.
//!
//! Module map
//! - [`arena`] — handle-addressed node pools shared by every tree/HDT.
//! - [`tree`] — `UnrootedTree`/`RootedTree`, colouring, extract-and-contract.
//! - [`hdt`] — the decomposition itself and its counter-update protocol.
//! - [`driver`] — the smaller-half recursion and public distance functions.
//! - [`newick`] — Newick text -> `UnrootedTree`.
//! - [`dot`] — Graphviz DOT rendering of parsed trees and HDTs.
//! - [`session`] — leaf-label interning and the value that owns one query's
//!   two trees.
//! - [`config`] — `CONTRACT_MAX_EXTRA_SIZE` and the quartet-mode capability
//!   switch.
//! - [`error`] — the crate's error hierarchy.
//!
//! Example
//! ```
//! use hdtdist::config::TripletOnly;
//! use hdtdist::driver::calculate_triplet_distance;
//! use hdtdist::session::{LeafInterner, Session};
//!
//! let s = Session::load("t1.nwk", "(A,(B,C));", "t2.nwk", "((A,B),C);").unwrap();
//! let total = s.total_leaves();
//! let distance = calculate_triplet_distance::<TripletOnly>(s.t1, s.t2, total);
//! assert_eq!(distance, 1);
//! ```

pub mod arena;
pub mod config;
pub mod dot;
pub mod driver;
pub mod error;
pub mod hdt;
pub mod newick;
pub mod session;
pub mod tree;

pub mod prelude {
    pub use crate::config::{ActiveMode, DistanceMode, TripletAndQuartet, TripletOnly};
    pub use crate::driver::{calculate_quartet_distance, calculate_triplet_distance};
    pub use crate::error::{DistResult, DistanceError};
    pub use crate::session::Session;
}
