//! Gomoku board: cell storage, move legality, move/undo and win detection.
//!
//! The board is a 1D array with a border of padding cells, the same layout
//! the GTP coordinate helpers assume: point = row * (size + 1) + col with
//! row and col both 1-based. Column 0 of every row doubles as the right-hand
//! border of the previous row, and rows 0 and size + 1 are all border.
//!
//! Search code never mutates the live board. It clones it (`Clone` is the
//! `copy` operation) and then applies strictly paired `play_move` /
//! `undo_move` calls on the private copy.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::constants::{COLUMN_LETTERS, MAX_SIZE, MIN_SIZE, WIN_LENGTH};

/// A point on the board, represented as an index into the padded 1D array.
pub type Point = usize;

/// A five-cell segment of a row, column or diagonal.
pub type Window = [Point; WIN_LENGTH];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    #[inline]
    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Dense index (Black = 0, White = 1) for per-color tables.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Color::Black => 0,
            Color::White => 1,
        }
    }

    /// Parse a GTP color argument (`b`, `w`, `black`, `white`).
    pub fn from_gtp(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "b" | "black" => Some(Color::Black),
            "w" | "white" => Some(Color::White),
            _ => None,
        }
    }

    /// Single-letter GTP form.
    pub fn letter(self) -> &'static str {
        match self {
            Color::Black => "b",
            Color::White => "w",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "black"),
            Color::White => write!(f, "white"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Stone(Color),
    Border,
}

/// Errors from constructing a board or parsing coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("unacceptable size {0}, expected {MIN_SIZE}..={MAX_SIZE}")]
    BadSize(usize),
    #[error("invalid point: '{0}'")]
    BadPoint(String),
    #[error("\"{0}\" wrong coordinate")]
    OutOfRange(String),
}

/// Why a move was rejected. The board is left untouched in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("illegal move: point not empty")]
    Occupied,
    #[error("illegal move: point off board")]
    OffBoard,
}

/// Line structure shared by every copy of a board of a given size.
#[derive(Debug)]
struct Geometry {
    windows: Vec<Window>,
    /// Indices into `windows` for every point (empty for border points).
    through: Vec<Vec<usize>>,
}

impl Geometry {
    fn new(size: usize) -> Self {
        let stride = size + 1;
        let maxpoint = (size + 2) * stride + 1;
        let directions: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];
        let last = (WIN_LENGTH - 1) as isize;
        let n = size as isize;

        let mut windows = Vec::new();
        for row in 1..=n {
            for col in 1..=n {
                for (dr, dc) in directions {
                    let (end_row, end_col) = (row + dr * last, col + dc * last);
                    if end_row < 1 || end_row > n || end_col < 1 || end_col > n {
                        continue;
                    }
                    let mut window = [0; WIN_LENGTH];
                    for (k, slot) in window.iter_mut().enumerate() {
                        let k = k as isize;
                        *slot = ((row + dr * k) * (n + 1) + col + dc * k) as Point;
                    }
                    windows.push(window);
                }
            }
        }

        let mut through = vec![Vec::new(); maxpoint];
        for (idx, window) in windows.iter().enumerate() {
            for &pt in window {
                through[pt].push(idx);
            }
        }

        Self { windows, through }
    }
}

/// A square Gomoku board with side-to-move and an undo stack.
#[derive(Clone)]
pub struct Board {
    size: usize,
    stride: usize,
    cells: Vec<Cell>,
    current: Color,
    history: Vec<Point>,
    geometry: Arc<Geometry>,
    /// (black, white) stones in each window, kept in step with play/undo.
    line_counts: Vec<[u8; 2]>,
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("size", &self.size)
            .field("current", &self.current)
            .field("history", &self.history)
            .finish()
    }
}

impl Board {
    /// Create an empty board of the given size with Black to move.
    pub fn new(size: usize) -> Result<Self, BoardError> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&size) {
            return Err(BoardError::BadSize(size));
        }
        let stride = size + 1;
        let maxpoint = (size + 2) * stride + 1;
        let geometry = Geometry::new(size);
        let mut cells = vec![Cell::Border; maxpoint];
        for row in 1..=size {
            for col in 1..=size {
                cells[row * stride + col] = Cell::Empty;
            }
        }
        Ok(Self {
            size,
            stride,
            cells,
            current: Color::Black,
            history: Vec::with_capacity(size * size),
            line_counts: vec![[0; 2]; geometry.windows.len()],
            geometry: Arc::new(geometry),
        })
    }

    /// Clear all stones and give the move to Black.
    pub fn reset(&mut self) {
        for pt in self.history.drain(..) {
            self.cells[pt] = Cell::Empty;
        }
        self.line_counts.fill([0; 2]);
        self.current = Color::Black;
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn current_player(&self) -> Color {
        self.current
    }

    pub fn set_current_player(&mut self, color: Color) {
        self.current = color;
    }

    /// Contents of a point. Anything outside the array reads as border.
    #[inline]
    pub fn get(&self, pt: Point) -> Cell {
        self.cells.get(pt).copied().unwrap_or(Cell::Border)
    }

    /// Point for 1-based (row, col). Row 1 is the bottom row in GTP terms.
    #[inline]
    pub fn point(&self, row: usize, col: usize) -> Point {
        row * self.stride + col
    }

    /// 1-based (row, col) of a point.
    #[inline]
    pub fn coord(&self, pt: Point) -> (usize, usize) {
        (pt / self.stride, pt % self.stride)
    }

    /// Dense 0-based index of an on-board point, row-major.
    #[inline]
    pub fn dense_index(&self, pt: Point) -> usize {
        let (row, col) = self.coord(pt);
        (row - 1) * self.size + (col - 1)
    }

    #[inline]
    pub fn is_empty_point(&self, pt: Point) -> bool {
        self.get(pt) == Cell::Empty
    }

    /// Whether `color` may play at `pt`. In Gomoku every empty point is legal.
    pub fn is_legal(&self, pt: Point, _color: Color) -> bool {
        self.is_empty_point(pt)
    }

    /// Place a stone. On success the move goes to the opponent of `color`.
    pub fn play_move(&mut self, pt: Point, color: Color) -> Result<(), MoveError> {
        match self.get(pt) {
            Cell::Empty => {}
            Cell::Stone(_) => return Err(MoveError::Occupied),
            Cell::Border => return Err(MoveError::OffBoard),
        }
        self.cells[pt] = Cell::Stone(color);
        for &idx in &self.geometry.through[pt] {
            self.line_counts[idx][color.index()] += 1;
        }
        self.history.push(pt);
        self.current = color.opponent();
        Ok(())
    }

    /// Take back the most recent move and give the turn back to its player.
    ///
    /// Returns the point that was cleared, or `None` if nothing was played.
    pub fn undo_move(&mut self) -> Option<Point> {
        let pt = self.history.pop()?;
        if let Cell::Stone(color) = self.cells[pt] {
            for &idx in &self.geometry.through[pt] {
                self.line_counts[idx][color.index()] -= 1;
            }
            self.current = color;
        }
        self.cells[pt] = Cell::Empty;
        Some(pt)
    }

    #[inline]
    pub fn last_move(&self) -> Option<Point> {
        self.history.last().copied()
    }

    /// Number of stones on the board.
    #[inline]
    pub fn stone_count(&self) -> usize {
        self.history.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.history.len() == self.size * self.size
    }

    /// All empty on-board points in row-major order.
    pub fn empty_points(&self) -> Vec<Point> {
        let mut points = Vec::with_capacity(self.size * self.size - self.history.len());
        for row in 1..=self.size {
            let start = self.point(row, 1);
            points.extend((start..start + self.size).filter(|&pt| self.cells[pt] == Cell::Empty));
        }
        points
    }

    /// All on-board points in row-major order.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (1..=self.size).flat_map(move |row| {
            let start = self.point(row, 1);
            start..start + self.size
        })
    }

    /// Every 5-cell window along rows, columns and both diagonals.
    #[inline]
    pub fn windows(&self) -> &[Window] {
        &self.geometry.windows
    }

    /// Indices into [`Board::windows`] of the windows containing `pt`.
    #[inline]
    fn window_indices(&self, pt: Point) -> &[usize] {
        self.geometry.through.get(pt).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Count of (black, white) stones in the window at `idx`.
    #[inline]
    fn window_counts(&self, idx: usize) -> (usize, usize) {
        let [black, white] = self.line_counts[idx];
        (black as usize, white as usize)
    }

    /// Every window together with its (black, white) counts.
    pub fn lines(&self) -> impl Iterator<Item = (&Window, (usize, usize))> + '_ {
        self.windows()
            .iter()
            .enumerate()
            .map(|(idx, window)| (window, self.window_counts(idx)))
    }

    /// Windows containing `pt`, with their (black, white) counts.
    pub fn lines_through(&self, pt: Point) -> impl Iterator<Item = (&Window, (usize, usize))> + '_ {
        self.window_indices(pt)
            .iter()
            .map(|&idx| (&self.geometry.windows[idx], self.window_counts(idx)))
    }

    /// The color that has five in a row anywhere on the board, if any.
    pub fn detect_five_in_a_row(&self) -> Option<Color> {
        self.line_counts.iter().find_map(|&[black, white]| match (black as usize, white as usize) {
            (WIN_LENGTH, _) => Some(Color::Black),
            (_, WIN_LENGTH) => Some(Color::White),
            _ => None,
        })
    }

    /// Whether the stone at `pt` is part of five or more in a row.
    pub fn makes_five_at(&self, pt: Point) -> bool {
        let Cell::Stone(color) = self.get(pt) else {
            return false;
        };
        let stone = Cell::Stone(color);
        [1, self.stride, self.stride + 1, self.stride - 1]
            .into_iter()
            .any(|dir| {
                let mut count = 1;
                let mut p = pt + dir;
                while self.get(p) == stone {
                    count += 1;
                    p += dir;
                }
                let mut p = pt.checked_sub(dir);
                while let Some(q) = p.filter(|&q| self.get(q) == stone) {
                    count += 1;
                    p = q.checked_sub(dir);
                }
                count >= WIN_LENGTH
            })
    }

    /// Fast terminal check: did the last move complete five in a row?
    #[inline]
    pub fn last_move_made_five(&self) -> bool {
        self.last_move().is_some_and(|pt| self.makes_five_at(pt))
    }

    /// Winner of the game so far, judged from the last move only.
    ///
    /// Valid whenever the board was built by alternating play from empty,
    /// which is how every search path reaches its positions.
    pub fn last_move_winner(&self) -> Option<Color> {
        let pt = self.last_move()?;
        match self.get(pt) {
            Cell::Stone(color) if self.makes_five_at(pt) => Some(color),
            _ => None,
        }
    }

    /// Erdős-Selfridge potential of `color`: the sum of `2^k` over windows
    /// holding `k` of its stones and none of the opponent's.
    pub fn potential(&self, color: Color) -> u64 {
        self.line_counts
            .iter()
            .filter_map(|&counts| open_weight(counts, color))
            .sum()
    }

    /// Share of [`Board::potential`] carried by windows through `pt`.
    pub fn potential_through(&self, pt: Point, color: Color) -> u64 {
        self.window_indices(pt)
            .iter()
            .filter_map(|&idx| open_weight(self.line_counts[idx], color))
            .sum()
    }

    /// Parse a GTP vertex such as `c3` into a point on this board.
    pub fn parse_point(&self, s: &str) -> Result<Point, BoardError> {
        let lower = s.to_ascii_lowercase();
        let bytes = lower.as_bytes();
        let bad = || BoardError::BadPoint(lower.clone());

        let (&col_char, digits) = bytes.split_first().ok_or_else(bad)?;
        if !col_char.is_ascii_lowercase() || col_char == b'i' {
            return Err(bad());
        }
        let mut col = (col_char - b'a') as usize;
        if col_char < b'i' {
            col += 1;
        }
        let row: usize = std::str::from_utf8(digits)
            .ok()
            .and_then(|d| d.parse().ok())
            .filter(|&r| r >= 1)
            .ok_or_else(bad)?;
        if col > self.size || row > self.size {
            return Err(BoardError::OutOfRange(lower));
        }
        Ok(self.point(row, col))
    }

    /// Format a point as an upper-case GTP vertex (e.g. "C3").
    pub fn format_point(&self, pt: Point) -> String {
        let (row, col) = self.coord(pt);
        format!("{}{row}", COLUMN_LETTERS[col - 1] as char)
    }
}

#[inline]
fn open_weight(counts: [u8; 2], color: Color) -> Option<u64> {
    (counts[color.opponent().index()] == 0).then(|| 1u64 << counts[color.index()])
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (1..=self.size).rev() {
            write!(f, "{row:>2} ")?;
            for col in 1..=self.size {
                let ch = match self.cells[self.point(row, col)] {
                    Cell::Stone(Color::Black) => 'X',
                    Cell::Stone(Color::White) => 'O',
                    _ => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        write!(f, "   ")?;
        for &letter in &COLUMN_LETTERS[..self.size] {
            write!(f, "{} ", letter as char)?;
        }
        writeln!(f)
    }
}
