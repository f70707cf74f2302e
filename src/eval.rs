//! Line-based static evaluation, used to order moves in the exact solver.
//!
//! Each 5-cell window scores `LINE_WEIGHTS[mine] - LINE_WEIGHTS[theirs]`;
//! a window holding stones of both colors can never become five and scores
//! zero.

use crate::board::{Board, Color, Point};
use crate::constants::LINE_WEIGHTS;

#[inline]
fn window_score(black: usize, white: usize, color: Color) -> i32 {
    if black > 0 && white > 0 {
        return 0;
    }
    let (mine, theirs) = match color {
        Color::Black => (black, white),
        Color::White => (white, black),
    };
    LINE_WEIGHTS[mine.min(5)] - LINE_WEIGHTS[theirs.min(5)]
}

/// Heuristic value of the whole board from `color`'s point of view.
pub fn evaluate(board: &Board, color: Color) -> i32 {
    board
        .lines()
        .map(|(_, (black, white))| window_score(black, white, color))
        .sum()
}

/// Change in [`evaluate`] for `color` if `color` played at the empty `pt`.
///
/// Only windows through `pt` change, so this avoids a full rescan.
pub fn move_gain(board: &Board, pt: Point, color: Color) -> i32 {
    board
        .lines_through(pt)
        .map(|(_, (black, white))| {
            let (after_black, after_white) = match color {
                Color::Black => (black + 1, white),
                Color::White => (black, white + 1),
            };
            window_score(after_black, after_white, color) - window_score(black, white, color)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_board_is_zero() {
        let board = Board::new(7).unwrap();
        assert_eq!(evaluate(&board, Color::Black), 0);
        assert_eq!(evaluate(&board, Color::White), 0);
    }

    #[test]
    fn test_symmetric_between_colors() {
        let mut board = Board::new(7).unwrap();
        board.play_move(board.point(4, 4), Color::Black).unwrap();
        board.play_move(board.point(1, 1), Color::White).unwrap();
        assert_eq!(evaluate(&board, Color::Black), -evaluate(&board, Color::White));
    }

    #[test]
    fn test_single_stone_weights() {
        // On 5x5 the center lies on its row, column and both diagonals.
        let mut board = Board::new(5).unwrap();
        board.play_move(board.point(3, 3), Color::Black).unwrap();
        assert_eq!(evaluate(&board, Color::Black), 4 * LINE_WEIGHTS[1]);
    }

    #[test]
    fn test_blocked_window_scores_zero() {
        let mut board = Board::new(5).unwrap();
        board.play_move(board.point(1, 1), Color::Black).unwrap();
        board.play_move(board.point(1, 2), Color::White).unwrap();
        // Row 1 is blocked; a1 still has column 1 and the main diagonal,
        // b1 still has column 2.
        assert_eq!(evaluate(&board, Color::Black), 2 * LINE_WEIGHTS[1] - LINE_WEIGHTS[1]);
    }

    #[test]
    fn test_move_gain_matches_full_evaluation() {
        let mut board = Board::new(7).unwrap();
        for &(row, col, color) in &[(4, 4, Color::Black), (4, 5, Color::White), (3, 3, Color::Black)] {
            board.play_move(board.point(row, col), color).unwrap();
        }
        for pt in board.empty_points() {
            for color in [Color::Black, Color::White] {
                let before = evaluate(&board, color);
                let gain = move_gain(&board, pt, color);
                let mut after = board.clone();
                after.play_move(pt, color).unwrap();
                assert_eq!(before + gain, evaluate(&after, color));
            }
        }
    }
}
