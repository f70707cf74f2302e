//! gomoku-search: move search for Gomoku (five in a row).
//!
//! Two search strategies share one board representation:
//! an exact alpha-beta solver with a transposition table, and a Monte Carlo
//! Tree Search engine that keeps its tree between moves.
//!
//! ## Modules
//!
//! - [`constants`] - Board limits and engine parameters
//! - [`board`] - Padded 1-D board, 5-cell windows, move/undo
//! - [`zobrist`] - Position hashing
//! - [`tt`] - Transposition tables, one per side to move
//! - [`eval`] - Line heuristic for move ordering
//! - [`policy`] - Tactical move categories and playout policies
//! - [`solver`] - Time-bounded negamax solver
//! - [`mcts`] - UCT search with tree reuse
//! - [`config`] - Runtime engine settings
//! - [`gtp`] - GTP command dispatcher
//!
//! ## Example
//!
//! ```
//! use gomoku_search::board::{Board, Color};
//! use gomoku_search::mcts::Mcts;
//! use gomoku_search::policy::PlayoutPolicy;
//! use gomoku_search::solver::{Outcome, Solver};
//!
//! let mut board = Board::new(7).unwrap();
//! board.play_move(board.parse_point("D4").unwrap(), Color::Black).unwrap();
//!
//! let mut mcts = Mcts::with_seed(PlayoutPolicy::RuleBased, 1);
//! let mv = mcts.get_move(&board, Color::White, 50, 0.4).unwrap();
//! assert!(board.is_empty_point(mv));
//!
//! let mut solver = Solver::new(board.size());
//! let result = solver.solve(&board, Color::White, Some(std::time::Duration::from_millis(10)));
//! assert_ne!(result.outcome, Outcome::Win);
//! ```

pub mod board;
pub mod config;
pub mod constants;
pub mod eval;
pub mod gtp;
pub mod mcts;
pub mod policy;
pub mod solver;
pub mod tt;
pub mod zobrist;
