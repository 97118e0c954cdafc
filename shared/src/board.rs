//! Connect Four board with gravity placement and win detection

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const DEFAULT_ROWS: usize = 6;
pub const DEFAULT_COLS: usize = 7;

/// Number of aligned pieces needed to win
pub const CONNECT: usize = 4;

/// Largest row or column count; the compact form stores each in one byte
pub const MAX_DIMENSION: usize = u8::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Red,
    Yellow,
}

impl Cell {
    /// Value used by the compact byte form
    pub fn to_bits(self) -> u8 {
        match self {
            Cell::Empty => 0b00,
            Cell::Red => 0b01,
            Cell::Yellow => 0b10,
        }
    }

    pub fn from_bits(bits: u8) -> Option<Cell> {
        match bits {
            0b00 => Some(Cell::Empty),
            0b01 => Some(Cell::Red),
            0b10 => Some(Cell::Yellow),
            _ => None,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Red => 'R',
            Cell::Yellow => 'Y',
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum BoardError {
    #[error("cell ({row}, {col}) is outside a {rows}x{cols} board")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("compact board is truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("invalid cell value {0:#04b}")]
    InvalidCell(u8),

    #[error("board dimensions must be non-zero")]
    EmptyDimensions,

    #[error("a {rows}x{cols} board exceeds the {max}x{max} limit", max = MAX_DIMENSION)]
    TooLarge { rows: usize, cols: usize },

    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Wire shape of a board, validated on the way in
#[derive(Serialize, Deserialize)]
struct BoardRepr {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

/// Fixed-size grid stored column-major, row 0 at the bottom.
///
/// Cells only change through [`Board::drop_piece`], so every column is a
/// contiguous run of pieces from the bottom followed by empty cells.
/// [`Board::set`] exists for setting up positions in tests and tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BoardRepr", into = "BoardRepr")]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl TryFrom<BoardRepr> for Board {
    type Error = String;

    fn try_from(repr: BoardRepr) -> Result<Self, Self::Error> {
        check_dimensions(repr.rows, repr.cols).map_err(|e| e.to_string())?;
        // Both dimensions are at most MAX_DIMENSION here, so this cannot overflow
        if repr.cells.len() != repr.rows * repr.cols {
            return Err(format!(
                "board has {} cells, expected {}x{}",
                repr.cells.len(),
                repr.rows,
                repr.cols
            ));
        }
        Ok(Board {
            rows: repr.rows,
            cols: repr.cols,
            cells: repr.cells,
        })
    }
}

impl From<Board> for BoardRepr {
    fn from(board: Board) -> Self {
        BoardRepr {
            rows: board.rows,
            cols: board.cols,
            cells: board.cells,
        }
    }
}

fn check_dimensions(rows: usize, cols: usize) -> Result<(), BoardError> {
    if rows == 0 || cols == 0 {
        return Err(BoardError::EmptyDimensions);
    }
    if rows > MAX_DIMENSION || cols > MAX_DIMENSION {
        return Err(BoardError::TooLarge { rows, cols });
    }
    Ok(())
}

impl Board {
    pub fn new() -> Self {
        Self::empty(DEFAULT_ROWS, DEFAULT_COLS)
    }

    /// Creates an empty board of 1 to [`MAX_DIMENSION`] rows and columns
    pub fn with_size(rows: usize, cols: usize) -> Result<Self, BoardError> {
        check_dimensions(rows, cols)?;
        Ok(Self::empty(rows, cols))
    }

    fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    fn index(&self, row: usize, col: usize) -> Result<usize, BoardError> {
        if row >= self.rows || col >= self.cols {
            return Err(BoardError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(col * self.rows + row)
    }

    pub fn get(&self, row: usize, col: usize) -> Result<Cell, BoardError> {
        let idx = self.index(row, col)?;
        Ok(self.cells[idx])
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) -> Result<(), BoardError> {
        let idx = self.index(row, col)?;
        self.cells[idx] = cell;
        Ok(())
    }

    /// Lowest empty row of `col`, or None when the column is full or out of range
    pub fn next_open_row(&self, col: usize) -> Option<usize> {
        if col >= self.cols {
            return None;
        }
        let column = &self.cells[col * self.rows..(col + 1) * self.rows];
        column.iter().position(|cell| *cell == Cell::Empty)
    }

    pub fn is_column_full(&self, col: usize) -> bool {
        self.next_open_row(col).is_none()
    }

    pub fn is_full(&self) -> bool {
        (0..self.cols).all(|col| self.is_column_full(col))
    }

    /// Drops a piece into `col`.
    ///
    /// Returns false and leaves the board untouched when the column is full
    /// or does not exist; the caller decides whether that is a protocol error.
    pub fn drop_piece(&mut self, col: usize, cell: Cell) -> bool {
        match self.next_open_row(col) {
            Some(row) => {
                self.cells[col * self.rows + row] = cell;
                true
            }
            None => false,
        }
    }

    /// Returns the color of the first four-in-a-row found, if any.
    ///
    /// Rows are scanned from the top down. Each non-empty cell starts a run
    /// check in four directions: right, up, up-right and down-right.
    pub fn check_win(&self) -> Option<Cell> {
        const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (-1, 1)];

        for row in (0..self.rows).rev() {
            for col in 0..self.cols {
                let cell = self.cells[col * self.rows + row];
                if cell == Cell::Empty {
                    continue;
                }
                for (d_row, d_col) in DIRECTIONS {
                    if self.run_matches(row, col, d_row, d_col, cell) {
                        return Some(cell);
                    }
                }
            }
        }
        None
    }

    fn run_matches(&self, row: usize, col: usize, d_row: isize, d_col: isize, cell: Cell) -> bool {
        (1..CONNECT as isize).all(|step| {
            let r = row as isize + d_row * step;
            let c = col as isize + d_col * step;
            if r < 0 || c < 0 {
                return false;
            }
            matches!(self.get(r as usize, c as usize), Ok(found) if found == cell)
        })
    }

    /// Compact form: row count, column count, then one byte per cell in
    /// row-major order.
    pub fn pack(&self) -> Vec<u8> {
        let mut packed = Vec::with_capacity(2 + self.cells.len());
        // Dimensions never exceed MAX_DIMENSION, so each fits in a byte
        packed.push(self.rows as u8);
        packed.push(self.cols as u8);
        for row in 0..self.rows {
            for col in 0..self.cols {
                packed.push(self.cells[col * self.rows + row].to_bits());
            }
        }
        packed
    }

    pub fn unpack(bytes: &[u8]) -> Result<Board, BoardError> {
        if bytes.len() < 2 {
            return Err(BoardError::Truncated {
                expected: 2,
                actual: bytes.len(),
            });
        }
        let rows = bytes[0] as usize;
        let cols = bytes[1] as usize;
        if rows == 0 || cols == 0 {
            return Err(BoardError::EmptyDimensions);
        }
        let expected = 2 + rows * cols;
        if bytes.len() != expected {
            return Err(BoardError::Truncated {
                expected,
                actual: bytes.len(),
            });
        }

        let mut board = Board::empty(rows, cols);
        for (i, bits) in bytes[2..].iter().enumerate() {
            let cell = Cell::from_bits(*bits).ok_or(BoardError::InvalidCell(*bits))?;
            board.set(i / cols, i % cols, cell)?;
        }
        Ok(board)
    }

    pub fn pack_hex(&self) -> String {
        hex::encode(self.pack())
    }

    pub fn unpack_hex(value: &str) -> Result<Board, BoardError> {
        Board::unpack(&hex::decode(value)?)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for col in 0..self.cols {
            write!(f, " {}", col)?;
        }
        writeln!(f)?;
        for row in (0..self.rows).rev() {
            for col in 0..self.cols {
                write!(f, " {}", self.cells[col * self.rows + row].glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
