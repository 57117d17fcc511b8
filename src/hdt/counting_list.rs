//! Per-colour counter storage reused across HDT recomputation passes.
//!
//! Every HDT node keeps one or more of these: the per-colour leaf tally
//! `cnt[c]`, and a row of them per composition for the resolved/agree
//! families keyed `(colour, colour)`. A naive `Vec<u64>` zeroed on every
//! recompute costs `O(max_degree)` per node per pass regardless of how many
//! colours are actually present under that node; `CountingList` instead
//! remembers which cells it wrote last time and only zeroes those, so a
//! recompute costs time proportional to the colours actually touched.
//!
//! This is a simplified, safe-Rust rendition of the generation-stamped
//! pooled lists in `original_source/src/HDTListUtils.cpp`: rather than a
//! pool-wide generation counter compared per cell, each list privately
//! tracks its own touched set and clears exactly those cells on `reset`.

use smallvec::SmallVec;

#[derive(Debug, Clone)]
pub struct CountingList {
    cells: Vec<u64>,
    touched: SmallVec<[u32; 8]>,
}

impl CountingList {
    /// `capacity` must be at least `max_colour + 1` for every colour this
    /// list will ever be asked to hold.
    pub fn new(capacity: usize) -> Self {
        Self {
            cells: vec![0; capacity],
            touched: SmallVec::new(),
        }
    }

    /// Clears every cell touched since the last reset. Cheap: touches only
    /// the cells this list actually wrote, not its full capacity.
    pub fn reset(&mut self) {
        for &c in &self.touched {
            self.cells[c as usize] = 0;
        }
        self.touched.clear();
    }

    pub fn get(&self, colour: u32) -> u64 {
        self.cells.get(colour as usize).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }

    /// Adds `delta` to `cells[colour]`, registering it as touched the first
    /// time a nonzero value lands there. A no-op for `delta == 0` so callers
    /// can add unconditionally without inflating the touched set.
    pub fn add(&mut self, colour: u32, delta: u64) {
        if delta == 0 {
            return;
        }
        if self.cells[colour as usize] == 0 {
            self.touched.push(colour);
        }
        self.cells[colour as usize] += delta;
    }

    /// Sets `cells[colour]` outright (used to seed a leaf's own colour, and
    /// to move a leaf from one colour to another across a recolouring
    /// event). Prunes `colour` from the touched set on a transition back to
    /// zero, so repeated recolourings of the same leaf across a whole
    /// recursion don't leak stale zero-valued entries into `touched`.
    pub fn set(&mut self, colour: u32, value: u64) {
        let was_zero = self.cells[colour as usize] == 0;
        match (was_zero, value == 0) {
            (true, false) => self.touched.push(colour),
            (false, true) => self.touched.retain(|&c| c != colour),
            _ => {}
        }
        self.cells[colour as usize] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.touched.iter().map(move |&c| (c, self.cells[c as usize]))
    }

    /// Sum of every touched cell's value.
    pub fn total(&self) -> u64 {
        self.iter().map(|(_, v)| v).sum()
    }

    /// Sum of squares of every touched cell's value, used by the
    /// `(2,1,1)`-quartet cross term to avoid a nested double loop over
    /// colour pairs.
    pub fn sum_of_squares(&self) -> u64 {
        self.iter().map(|(_, v)| v * v).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_reset_clears_only_touched_cells() {
        let mut l = CountingList::new(8);
        l.add(3, 5);
        l.add(1, 2);
        assert_eq!(l.get(3), 5);
        assert_eq!(l.total(), 7);
        l.reset();
        assert_eq!(l.get(3), 0);
        assert_eq!(l.get(1), 0);
        assert!(l.is_empty());
    }

    #[test]
    fn iter_yields_exactly_the_touched_colours() {
        let mut l = CountingList::new(8);
        l.add(0, 1);
        l.add(5, 4);
        let mut seen: Vec<_> = l.iter().collect();
        seen.sort();
        assert_eq!(seen, vec![(0, 1), (5, 4)]);
    }

    #[test]
    fn sum_of_squares_matches_manual_computation() {
        let mut l = CountingList::new(4);
        l.add(0, 3);
        l.add(1, 2);
        assert_eq!(l.sum_of_squares(), 9 + 4);
    }

    #[test]
    fn set_to_zero_drops_the_cell_from_touched() {
        let mut l = CountingList::new(8);
        l.set(2, 1);
        assert_eq!(l.total(), 1);
        l.set(2, 0);
        assert!(l.is_empty());
        assert_eq!(l.iter().count(), 0);
    }

    #[test]
    fn repeated_recolouring_never_leaks_stale_zero_cells() {
        // Mirrors `Hdt::leaf_color_changed`: a leaf's colour is moved from
        // `old` to `new` by decrementing `old` (possibly to zero) and
        // incrementing `new`, over and over across a whole recursion.
        let mut l = CountingList::new(8);
        l.set(0, 1);
        for (old, new) in [(0, 1), (1, 2), (2, 3), (3, 4)] {
            let cur_old = l.get(old);
            l.set(old, cur_old - 1);
            let cur_new = l.get(new);
            l.set(new, cur_new + 1);
        }
        assert_eq!(l.iter().count(), 1);
        assert_eq!(l.get(4), 1);
        assert_eq!(l.total(), 1);
    }
}
