//! Transposition tables for the exact solver.
//!
//! Entries are keyed by exact stone placement only. Scores are relative to
//! the side to move, so [`ColorTables`] keeps Black's and White's entries
//! apart. Because the solver always searches to the end of the game there is
//! no depth to record; instead every entry carries the [`Bound`] its score
//! was proven under, and the solver only reuses a score the bound allows.

use std::collections::HashMap;

use crate::board::{Color, Point};

/// How a cached score relates to the true game value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// The score is the exact value.
    Exact,
    /// The true value is at least the score (fail-high).
    Lower,
    /// The true value is at most the score (fail-low).
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtEntry {
    pub score: i32,
    pub best_move: Option<Point>,
    pub bound: Bound,
}

impl TtEntry {
    /// Score usable as a final answer inside the window `(alpha, beta)`.
    #[inline]
    pub fn cutoff(&self, alpha: i32, beta: i32) -> Option<i32> {
        match self.bound {
            Bound::Exact => Some(self.score),
            Bound::Lower if self.score >= beta => Some(self.score),
            Bound::Upper if self.score <= alpha => Some(self.score),
            _ => None,
        }
    }
}

/// Hash code to cached result.
#[derive(Debug, Default)]
pub struct TranspositionTable {
    entries: HashMap<u64, TtEntry>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `hash`.
    #[inline]
    pub fn store(&mut self, hash: u64, entry: TtEntry) {
        self.entries.insert(hash, entry);
    }

    /// Cached entry for `hash`, or `None` on a miss.
    #[inline]
    pub fn lookup(&self, hash: u64) -> Option<TtEntry> {
        self.entries.get(&hash).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// One table per side to move.
#[derive(Debug, Default)]
pub struct ColorTables {
    tables: [TranspositionTable; 2],
}

impl ColorTables {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, color: Color) -> &TranspositionTable {
        &self.tables[color.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, color: Color) -> &mut TranspositionTable {
        &mut self.tables[color.index()]
    }

    pub fn len(&self) -> usize {
        self.tables.iter().map(TranspositionTable::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(TranspositionTable::is_empty)
    }

    pub fn clear(&mut self) {
        self.tables.iter_mut().for_each(TranspositionTable::clear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(score: i32, bound: Bound) -> TtEntry {
        TtEntry { score, best_move: Some(17), bound }
    }

    #[test]
    fn test_miss_then_hit() {
        let mut tt = TranspositionTable::new();
        assert_eq!(tt.lookup(42), None);
        tt.store(42, entry(0, Bound::Exact));
        assert_eq!(tt.lookup(42), Some(entry(0, Bound::Exact)));
        assert_eq!(tt.lookup(43), None);
    }

    #[test]
    fn test_store_overwrites() {
        let mut tt = TranspositionTable::new();
        tt.store(7, entry(0, Bound::Upper));
        tt.store(7, entry(100, Bound::Lower));
        assert_eq!(tt.len(), 1);
        assert_eq!(tt.lookup(7).map(|e| e.score), Some(100));
    }

    #[test]
    fn test_colors_are_separate() {
        let mut tables = ColorTables::new();
        tables.get_mut(Color::Black).store(1, entry(10, Bound::Exact));
        assert!(tables.get(Color::White).lookup(1).is_none());
        assert_eq!(tables.len(), 1);
        tables.clear();
        assert!(tables.is_empty());
    }

    #[test]
    fn test_cutoff_respects_bound() {
        assert_eq!(entry(5, Bound::Exact).cutoff(-10, 10), Some(5));
        assert_eq!(entry(10, Bound::Lower).cutoff(-10, 10), Some(10));
        assert_eq!(entry(0, Bound::Lower).cutoff(-10, 10), None);
        assert_eq!(entry(-10, Bound::Upper).cutoff(-10, 10), Some(-10));
        assert_eq!(entry(0, Bound::Upper).cutoff(-10, 10), None);
    }
}
