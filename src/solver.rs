//! Exact endgame solver: depth-unbounded negamax with alpha-beta pruning.
//!
//! The solver plays the game out to the end on a private copy of the board.
//! Scores are from the side to move: [`WIN_SCORE`] for a forced win, zero for
//! a draw, `-WIN_SCORE` for a forced loss.
//!
//! Per node, in order:
//! 1. A five made by the previous move is a loss; a full board is a draw.
//! 2. Liveness from the Erdős-Selfridge potential ([`Board::potential`]):
//!    a side whose open windows weigh too little cannot force five against
//!    pure blocking. Neither side able to force five is a draw. If only one
//!    side can, the score is bounded on the other side and the window
//!    narrows.
//! 3. Transposition table probe (one table per side to move).
//! 4. Tactics: take an immediate five; against two opponent winning points
//!    the position is lost; against one, blocking it is the only move.
//!    Otherwise a move that creates two winning points at once wins.
//! 5. Remaining moves ordered by [`move_gain`], then plain negamax.
//!
//! A draw held up by step 2 carries the blocking move the bound relies on:
//! the point that removes the most opponent potential.
//!
//! Time control: the caller's budget becomes a [`Deadline`] that is checked
//! on recursion entry. Expiry raises [`Aborted`], which every frame passes
//! straight up with `?`; `solve` reports it as [`Outcome::Unknown`].

use std::fmt;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::board::{Board, Color, Point};
use crate::constants::{DEADLINE_POLL_NODES, WIN_LENGTH, WIN_SCORE};
use crate::eval::move_gain;
use crate::policy::{threats_after, winning_points};
use crate::tt::{Bound, ColorTables, TtEntry};
use crate::zobrist::ZobristTable;

/// Raised when the time budget runs out mid-search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("search aborted: time budget exhausted")]
pub struct Aborted;

/// Wall-clock limit for one `solve` call.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires: Option<Instant>,
}

impl Deadline {
    pub fn unlimited() -> Self {
        Self { expires: None }
    }

    pub fn after(budget: Duration) -> Self {
        Self {
            expires: Instant::now().checked_add(budget),
        }
    }

    pub fn from_budget(budget: Option<Duration>) -> Self {
        budget.map_or_else(Self::unlimited, Self::after)
    }

    #[inline]
    pub fn expired(&self) -> bool {
        self.expires.is_some_and(|t| Instant::now() >= t)
    }

    #[inline]
    pub fn check(&self) -> Result<(), Aborted> {
        if self.expired() { Err(Aborted) } else { Ok(()) }
    }
}

/// Game-theoretic result for the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
    /// The budget ran out before a proof was found.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveResult {
    pub outcome: Outcome,
    /// A winning or drawing move. `None` for losses, unknowns and finished games.
    pub best_move: Option<Point>,
    pub to_move: Color,
    pub nodes: u64,
}

impl SolveResult {
    /// Color that wins with best play, if the game is decided.
    pub fn winner(&self) -> Option<Color> {
        match self.outcome {
            Outcome::Win => Some(self.to_move),
            Outcome::Loss => Some(self.to_move.opponent()),
            Outcome::Draw | Outcome::Unknown => None,
        }
    }
}

impl fmt::Display for SolveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.outcome, self.winner()) {
            (Outcome::Unknown, _) => f.write_str("unknown"),
            (Outcome::Draw, _) => f.write_str("draw"),
            (_, Some(color)) => f.write_str(color.letter()),
            (_, None) => f.write_str("unknown"),
        }
    }
}

type Scored = (i32, Option<Point>);

pub struct Solver {
    zobrist: ZobristTable,
    tables: ColorTables,
    deadline: Deadline,
    nodes: u64,
}

impl Solver {
    pub fn new(size: usize) -> Self {
        Self {
            zobrist: ZobristTable::build(size),
            tables: ColorTables::new(),
            deadline: Deadline::unlimited(),
            nodes: 0,
        }
    }

    /// Solve `board` with `to_move` to play, within `budget` (`None` = no limit).
    pub fn solve(&mut self, board: &Board, to_move: Color, budget: Option<Duration>) -> SolveResult {
        if self.zobrist.size() != board.size() {
            self.zobrist = ZobristTable::build(board.size());
        }
        self.tables.clear();
        self.nodes = 0;
        self.deadline = Deadline::from_budget(budget);

        let started = Instant::now();
        let result = self.solve_root(board, to_move);
        log::info!(
            "solve {to_move}: {} {} ({} nodes, {} tt entries, {:.3}s)",
            result,
            result.best_move.map(|pt| board.format_point(pt)).unwrap_or_default(),
            self.nodes,
            self.tables.len(),
            started.elapsed().as_secs_f64()
        );
        self.tables.clear();
        result
    }

    fn solve_root(&mut self, board: &Board, to_move: Color) -> SolveResult {
        let finished = |outcome| SolveResult {
            outcome,
            best_move: None,
            to_move,
            nodes: 0,
        };
        if let Some(winner) = board.detect_five_in_a_row() {
            return finished(if winner == to_move { Outcome::Win } else { Outcome::Loss });
        }
        if board.is_full() {
            return finished(Outcome::Draw);
        }

        let mut state = board.clone();
        state.set_current_player(to_move);
        let hash = self.zobrist.hash(&state);

        let (outcome, best_move) = match self.negamax(&mut state, hash, -WIN_SCORE, WIN_SCORE) {
            Ok((score, mv)) if score > 0 => (Outcome::Win, mv),
            Ok((0, None)) => (Outcome::Draw, drawing_move(&state, to_move)),
            Ok((0, mv)) => (Outcome::Draw, mv),
            Ok(_) => (Outcome::Loss, None),
            Err(Aborted) => {
                log::debug!("solver aborted after {} nodes", self.nodes);
                (Outcome::Unknown, None)
            }
        };
        SolveResult {
            outcome,
            best_move,
            to_move,
            nodes: self.nodes,
        }
    }

    fn record(&mut self, color: Color, hash: u64, score: i32, best_move: Option<Point>, bound: Bound) -> Scored {
        self.tables.get_mut(color).store(hash, TtEntry { score, best_move, bound });
        (score, best_move)
    }

    fn negamax(&mut self, board: &mut Board, hash: u64, mut alpha: i32, mut beta: i32) -> Result<Scored, Aborted> {
        self.nodes += 1;
        if self.nodes % DEADLINE_POLL_NODES == 0 {
            self.deadline.check()?;
        }

        let to_move = board.current_player();
        let opponent = to_move.opponent();

        if board.last_move_made_five() {
            return Ok((-WIN_SCORE, None));
        }
        if board.is_full() {
            return Ok((0, None));
        }

        let (can_win, can_lose) = (may_force_five(board, to_move), may_force_five(board, opponent));
        if !can_win && !can_lose {
            return Ok((0, None));
        }
        let (floor, ceiling) = (
            if can_lose { -WIN_SCORE } else { 0 },
            if can_win { WIN_SCORE } else { 0 },
        );
        if ceiling <= alpha {
            return Ok((alpha, None));
        }
        if floor >= beta {
            return Ok((beta, None));
        }

        if let Some(entry) = self.tables.get(to_move).lookup(hash) {
            if let Some(score) = entry.cutoff(alpha, beta) {
                return Ok((score, entry.best_move));
            }
        }

        if let Some(&pt) = winning_points(board, to_move).first() {
            return Ok(self.record(to_move, hash, WIN_SCORE, Some(pt), Bound::Exact));
        }

        let threats = winning_points(board, opponent);
        let candidates = match threats.as_slice() {
            [] => {
                let empties = board.empty_points();
                if let Some(&pt) = empties.iter().find(|&&pt| threats_after(board, pt, to_move).len() >= 2) {
                    return Ok(self.record(to_move, hash, WIN_SCORE, Some(pt), Bound::Exact));
                }
                let mut scored: Vec<(i32, Point)> = empties
                    .into_iter()
                    .map(|pt| (move_gain(board, pt, to_move), pt))
                    .collect();
                scored.sort_by(|a, b| b.0.cmp(&a.0));
                scored.into_iter().map(|(_, pt)| pt).collect()
            }
            [block] => vec![*block],
            [block, ..] => {
                return Ok(self.record(to_move, hash, -WIN_SCORE, Some(*block), Bound::Exact));
            }
        };

        let (alpha_orig, beta_orig) = (alpha, beta);
        alpha = alpha.max(floor);
        beta = beta.min(ceiling);

        let first = candidates.first().copied();
        let mut best = None;
        for pt in candidates {
            if board.play_move(pt, to_move).is_err() {
                continue;
            }
            let child_hash = hash ^ self.zobrist.key(board, pt, to_move);
            let (child_score, _) = self.negamax(board, child_hash, -beta, -alpha)?;
            board.undo_move();

            let value = -child_score;
            if value > alpha {
                alpha = value;
                best = Some(pt);
            }
            if value >= beta {
                let bound = if beta >= beta_orig { Bound::Lower } else { Bound::Exact };
                return Ok(self.record(to_move, hash, beta, Some(pt), bound));
            }
        }

        // A score held up only by the floor needs the move the bound assumes.
        let best = match best {
            Some(pt) => Some(pt),
            None if alpha > alpha_orig => drawing_move(board, to_move),
            None => first,
        };
        let bound = if alpha <= alpha_orig { Bound::Upper } else { Bound::Exact };
        Ok(self.record(to_move, hash, alpha, best, bound))
    }
}

/// Whether `color` may still force five against an opponent that only blocks.
///
/// Below `2^WIN_LENGTH` with the opponent to move, or `2^(WIN_LENGTH - 1)`
/// with `color` to move, the opponent can stop every window.
fn may_force_five(board: &Board, color: Color) -> bool {
    let threshold = if board.current_player() == color {
        1 << (WIN_LENGTH - 1)
    } else {
        1 << WIN_LENGTH
    };
    board.potential(color) >= threshold
}

/// Move for a draw proven by [`may_force_five`]: greedy blocking of the
/// opponent's potential, ties broken by [`move_gain`].
fn drawing_move(board: &Board, to_move: Color) -> Option<Point> {
    let opponent = to_move.opponent();
    board
        .empty_points()
        .into_iter()
        .max_by_key(|&pt| (board.potential_through(pt, opponent), move_gain(board, pt, to_move)))
}
