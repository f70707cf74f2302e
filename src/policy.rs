//! Tactical move classification for playouts and for the solver's pruning.
//!
//! Every empty point falls into exactly one [`MoveCategory`]. The category
//! of a point is read off the 5-cell windows through it:
//!
//! | window holds (other cells)     | category for the mover |
//! |--------------------------------|------------------------|
//! | 4 own stones, no opponent      | `Win`                  |
//! | 4 opponent stones, no own      | `BlockWin`             |
//! | 3 own stones, no opponent      | `OpenFour`             |
//! | 3 opponent stones, no own      | `BlockOpenFour`        |
//!
//! Filling the last gap of a clean window completes five; taking the gap of
//! an opponent's clean four removes that winning continuation; adding a
//! fourth stone to a clean window leaves a four with an open cell; and the
//! same point taken first stops the opponent from making that four.

use std::fmt;
use std::str::FromStr;

use crate::board::{Board, Color, Point};

/// Tactical classes, declared in priority order (`Win` is most urgent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MoveCategory {
    Win,
    BlockWin,
    OpenFour,
    BlockOpenFour,
    Random,
}

impl fmt::Display for MoveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MoveCategory::Win => "Win",
            MoveCategory::BlockWin => "BlockWin",
            MoveCategory::OpenFour => "OpenFour",
            MoveCategory::BlockOpenFour => "BlockOpenFour",
            MoveCategory::Random => "Random",
        };
        f.write_str(name)
    }
}

/// Category a window with these (black, white) counts contributes to its
/// empty cells when `color` moves.
#[inline]
fn window_category((black, white): (usize, usize), color: Color) -> MoveCategory {
    let (mine, theirs) = match color {
        Color::Black => (black, white),
        Color::White => (white, black),
    };
    match (mine, theirs) {
        (4, 0) => MoveCategory::Win,
        (0, 4) => MoveCategory::BlockWin,
        (3, 0) => MoveCategory::OpenFour,
        (0, 3) => MoveCategory::BlockOpenFour,
        _ => MoveCategory::Random,
    }
}

/// Category of playing the empty point `pt` for `color`.
pub fn classify(board: &Board, pt: Point, color: Color) -> MoveCategory {
    board
        .lines_through(pt)
        .map(|(_, counts)| window_category(counts, color))
        .min()
        .unwrap_or(MoveCategory::Random)
}

/// The highest non-empty category for `color` and all points in it, sorted.
///
/// `Random` carries every empty point. An empty list means the board is full.
pub fn policy_moves(board: &Board, color: Color) -> (MoveCategory, Vec<Point>) {
    let mut best = MoveCategory::Random;
    let mut moves = Vec::new();

    for (window, counts) in board.lines() {
        let category = window_category(counts, color);
        if category == MoveCategory::Random || category > best {
            continue;
        }
        if category < best {
            best = category;
            moves.clear();
        }
        moves.extend(window.iter().copied().filter(|&pt| board.is_empty_point(pt)));
    }

    if best == MoveCategory::Random {
        return (MoveCategory::Random, board.empty_points());
    }
    moves.sort_unstable();
    moves.dedup();
    (best, moves)
}

/// Empty points where `color` would complete five immediately.
pub fn winning_points(board: &Board, color: Color) -> Vec<Point> {
    let mut points: Vec<Point> = board
        .lines()
        .filter(|&(_, counts)| window_category(counts, color) == MoveCategory::Win)
        .flat_map(|(window, _)| window.iter().copied().filter(|&pt| board.is_empty_point(pt)))
        .collect();
    points.sort_unstable();
    points.dedup();
    points
}

/// New winning points `color` would own after playing the empty point `pt`.
///
/// Two or more is a double threat: the opponent can only block one of them.
pub fn threats_after(board: &Board, pt: Point, color: Color) -> Vec<Point> {
    let mut points: Vec<Point> = board
        .lines_through(pt)
        .filter(|&(_, counts)| window_category(counts, color) == MoveCategory::OpenFour)
        .flat_map(|(window, _)| {
            window
                .iter()
                .copied()
                .filter(move |&q| q != pt && board.is_empty_point(q))
        })
        .collect();
    points.sort_unstable();
    points.dedup();
    points
}

/// How playouts pick their candidate moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayoutPolicy {
    /// Any empty point.
    #[default]
    Random,
    /// Only points in the highest non-empty [`MoveCategory`].
    RuleBased,
}

impl PlayoutPolicy {
    /// Candidate set for `color`; callers choose uniformly within it.
    pub fn candidate_moves(self, board: &Board, color: Color) -> (MoveCategory, Vec<Point>) {
        match self {
            PlayoutPolicy::Random => (MoveCategory::Random, board.empty_points()),
            PlayoutPolicy::RuleBased => policy_moves(board, color),
        }
    }
}

impl FromStr for PlayoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(PlayoutPolicy::Random),
            "rule_based" | "rulebased" => Ok(PlayoutPolicy::RuleBased),
            other => Err(format!("unknown policy '{other}'")),
        }
    }
}

impl fmt::Display for PlayoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayoutPolicy::Random => f.write_str("random"),
            PlayoutPolicy::RuleBased => f.write_str("rule_based"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(stones: &[(&str, Color)]) -> Board {
        let mut board = Board::new(7).unwrap();
        for &(mv, color) in stones {
            let pt = board.parse_point(mv).unwrap();
            board.play_move(pt, color).unwrap();
        }
        board
    }

    fn names(board: &Board, points: &[Point]) -> Vec<String> {
        points.iter().map(|&pt| board.format_point(pt)).collect()
    }

    #[test]
    fn test_priority_order() {
        assert!(MoveCategory::Win < MoveCategory::BlockWin);
        assert!(MoveCategory::BlockWin < MoveCategory::OpenFour);
        assert!(MoveCategory::OpenFour < MoveCategory::BlockOpenFour);
        assert!(MoveCategory::BlockOpenFour < MoveCategory::Random);
    }

    #[test]
    fn test_empty_board_is_random() {
        let board = Board::new(7).unwrap();
        let (category, moves) = policy_moves(&board, Color::Black);
        assert_eq!(category, MoveCategory::Random);
        assert_eq!(moves.len(), 49);
    }

    #[test]
    fn test_open_four_ends_are_wins() {
        let board = setup(&[
            ("b4", Color::Black),
            ("c4", Color::Black),
            ("d4", Color::Black),
            ("e4", Color::Black),
        ]);
        let (category, moves) = policy_moves(&board, Color::Black);
        assert_eq!(category, MoveCategory::Win);
        assert_eq!(names(&board, &moves), ["A4", "F4"]);
        assert_eq!(classify(&board, board.parse_point("a4").unwrap(), Color::Black), MoveCategory::Win);
    }

    #[test]
    fn test_block_win_for_opponent() {
        let board = setup(&[
            ("b4", Color::Black),
            ("c4", Color::Black),
            ("d4", Color::Black),
            ("e4", Color::Black),
            ("a4", Color::White),
        ]);
        let (category, moves) = policy_moves(&board, Color::White);
        assert_eq!(category, MoveCategory::BlockWin);
        assert_eq!(names(&board, &moves), ["F4"]);
    }

    #[test]
    fn test_open_four_creation() {
        let board = setup(&[("c3", Color::White), ("c4", Color::White), ("c5", Color::White)]);
        let (category, moves) = policy_moves(&board, Color::White);
        assert_eq!(category, MoveCategory::OpenFour);
        assert_eq!(names(&board, &moves), ["C1", "C2", "C6", "C7"]);
    }

    #[test]
    fn test_block_open_four() {
        let board = setup(&[("c3", Color::White), ("c4", Color::White), ("c5", Color::White)]);
        let (category, moves) = policy_moves(&board, Color::Black);
        assert_eq!(category, MoveCategory::BlockOpenFour);
        assert_eq!(names(&board, &moves), ["C1", "C2", "C6", "C7"]);
        assert_eq!(classify(&board, board.parse_point("g7").unwrap(), Color::Black), MoveCategory::Random);
    }

    #[test]
    fn test_winning_points_and_threats() {
        let board = setup(&[("b2", Color::Black), ("c2", Color::Black), ("d2", Color::Black)]);
        assert!(winning_points(&board, Color::Black).is_empty());
        let e2 = board.parse_point("e2").unwrap();
        // After e2, both a2 and f2 complete five.
        let threats = threats_after(&board, e2, Color::Black);
        assert_eq!(names(&board, &threats), ["A2", "F2"]);

        let mut after = board.clone();
        after.play_move(e2, Color::Black).unwrap();
        assert_eq!(winning_points(&after, Color::Black), threats);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("random".parse::<PlayoutPolicy>(), Ok(PlayoutPolicy::Random));
        assert_eq!("rule_based".parse::<PlayoutPolicy>(), Ok(PlayoutPolicy::RuleBased));
        assert!("greedy".parse::<PlayoutPolicy>().is_err());
        assert_eq!(PlayoutPolicy::RuleBased.to_string(), "rule_based");
    }
}
