//! Constants for board geometry, search parameters, and heuristic weights.
//!
//! Board size is chosen at runtime (GTP `boardsize`), so unlike the other
//! constants it only has a default and a legal range here.

use std::time::Duration;

// =============================================================================
// Board Geometry
// =============================================================================

/// Default board size (NxN).
pub const DEFAULT_SIZE: usize = 7;

/// Smallest board on which five-in-a-row is possible.
pub const MIN_SIZE: usize = 5;

/// Largest board that GTP column letters (A..Z without I) can address.
pub const MAX_SIZE: usize = 25;

/// Number of stones needed to win.
pub const WIN_LENGTH: usize = 5;

/// GTP column letters. 'I' is skipped to avoid confusion with 'J'.
pub const COLUMN_LETTERS: &[u8; 25] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

// =============================================================================
// Exact Solver Parameters
// =============================================================================

/// Score of a proven win from the side to move. Also the search window bound.
pub const WIN_SCORE: i32 = 10_000;

/// Default wall-clock budget for the solver, in seconds.
pub const DEFAULT_TIME_LIMIT: u64 = 1;

/// Default solver budget as a [`Duration`].
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(DEFAULT_TIME_LIMIT);

/// The deadline clock is read once every this many nodes.
pub const DEADLINE_POLL_NODES: u64 = 256;

// =============================================================================
// Line Heuristic
// =============================================================================

/// Window score indexed by the number of same-colored stones in a 5-window.
pub const LINE_WEIGHTS: [i32; 6] = [0, 2, 8, 16, 64, WIN_SCORE];

// =============================================================================
// MCTS (Monte Carlo Tree Search) Parameters
// =============================================================================

/// Default number of playouts per `genmove`.
pub const N_SIMS: usize = 100;

/// Default UCT exploration constant.
pub const EXPLORATION: f64 = 0.4;

/// Win credit of a drawn playout (Black win = 1, White win = 0).
pub const DRAW_CREDIT: f64 = 0.5;

// =============================================================================
// Randomness
// =============================================================================

/// Seed for Zobrist keys. Fixed so hashes are reproducible across runs.
pub const ZOBRIST_SEED: u64 = 0x9E37_79B9_7F4A_7C15;
