//! Zobrist hashing of stone placements.
//!
//! Every (on-board point, color) pair gets a random 64-bit key; a position's
//! hash is the XOR of the keys of its stones. Since XOR is its own inverse,
//! search code keeps the hash current by XORing a single key on play and
//! again on undo, which must agree with [`ZobristTable::hash`] exactly.
//!
//! Side to move is not part of the key. The solver keeps one transposition
//! table per color instead.

use crate::board::{Board, Cell, Color, Point};
use crate::constants::ZOBRIST_SEED;

pub struct ZobristTable {
    size: usize,
    /// `[black, white]` key per dense point index.
    keys: Vec<[u64; 2]>,
}

impl ZobristTable {
    /// Allocate keys for a `size` x `size` board. Border cells get none.
    pub fn build(size: usize) -> Self {
        Self::with_seed(size, ZOBRIST_SEED)
    }

    /// Like [`build`](Self::build) with an explicit RNG seed.
    pub fn with_seed(size: usize, seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let keys = (0..size * size).map(|_| [rng.u64(..), rng.u64(..)]).collect();
        Self { size, keys }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Key for a stone of `color` at `pt`.
    #[inline]
    pub fn key(&self, board: &Board, pt: Point, color: Color) -> u64 {
        self.keys[board.dense_index(pt)][color.index()]
    }

    /// Hash a board from scratch, visiting points in row-major order.
    pub fn hash(&self, board: &Board) -> u64 {
        debug_assert_eq!(board.size(), self.size, "zobrist table built for another size");
        board.points().fold(0, |h, pt| match board.get(pt) {
            Cell::Stone(color) => h ^ self.key(board, pt, color),
            _ => h,
        })
    }
}
