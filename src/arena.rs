//! Index-addressed node pools.
//!
//! Role
//! - Both [`crate::tree::RootedTree`] and [`crate::hdt::Hdt`] own their nodes
//!   in a flat pool addressed by small integer handles rather than by
//!   reference. Both tree kinds are rebuilt many times over a single query
//!   (extract-and-contract, HDT rebuilds before descending into the first
//!   child); tying node lifetimes to a borrowed arena would force every
//!   rebuild through a fresh lifetime parameter threaded back up to the
//!   caller. An owned `Vec`-backed pool sidesteps that entirely: the pool is
//!   still dropped as a single unit, just by dropping the owning struct
//!   rather than an external `typed_arena::Arena`.
//! - Handles are `Copy` so algorithms can freely stash them in counting
//!   lists, rotation buffers, and parent back-pointers without fighting the
//!   borrow checker.
//!
//! Performance
//! - `alloc` is amortized O(1); `get`/`get_mut` are O(1) index into the
//!   backing `Vec`. There is no per-node deallocation.

use std::marker::PhantomData;

/// A handle into a [`Pool<T>`]. Carries no lifetime; validity is a pool-local
/// invariant — never hand a handle from one pool to another.
pub struct Id<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    fn new(index: u32) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// Construct a handle from a raw pool index. Only meaningful alongside
    /// the `Pool<T>` it was obtained from.
    pub fn from_index(index: u32) -> Self {
        Self::new(index)
    }

    pub fn index(self) -> u32 {
        self.index
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Id<T> {}
impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}
impl<T> Eq for Id<T> {}
impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state)
    }
}
impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// An owned, append-only pool of `T`, addressed by [`Id<T>`].
pub struct Pool<T> {
    items: Vec<T>,
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            items: Vec::with_capacity(cap),
        }
    }

    pub fn alloc(&mut self, value: T) -> Id<T> {
        let index = self.items.len() as u32;
        self.items.push(value);
        Id::new(index)
    }

    pub fn get(&self, id: Id<T>) -> &T {
        &self.items[id.index as usize]
    }

    pub fn get_mut(&mut self, id: Id<T>) -> &mut T {
        &mut self.items[id.index as usize]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = Id<T>> + '_ {
        (0..self.items.len() as u32).map(Id::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, v)| (Id::new(i as u32), v))
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}
