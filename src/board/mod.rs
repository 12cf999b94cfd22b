//! Board model and scoring.
//!
//! This module holds the in-memory state of a bingo board and the pure
//! functions that score it.
//!
//! # Architecture
//!
//! * [`tile`]: A single cell: title, points, image, colour, completion and the
//!   optional special-set piece grid.
//! * [`state`]: The board aggregate: tile grid plus row and column bonuses,
//!   with create / resize / clear and bounds-checked mutations.
//! * [`scoring`]: Row and column totals, gained points and bonus rules.
//!
//! # Bonus rule
//!
//! A row or column bonus is only gained when every tile in that line is
//! completed. Partial completion contributes tile points only.

pub mod scoring;
pub mod state;
pub mod tile;

use thiserror::Error;

pub use scoring::{column_score, row_score, LineScore, ScoreSheet};
pub use state::{BoardState, ResizeOutcome, ResizePlan, SetToggle};
pub use tile::{
    set_image_name, Argb, ImageRef, SetGrid, Tile, SET_COLUMNS, SET_NAMES, SET_ROWS, SET_TILE_TITLE,
};

/// Smallest board edge accepted by the public API.
pub const MIN_BOARD_SIZE: usize = 3;

/// Largest board edge accepted by the public API.
pub const MAX_BOARD_SIZE: usize = 15;

/// Upper bound for tile points and line bonuses.
pub const MAX_POINTS: u32 = 999;

/// Board position as `(row, column)`, both zero-based.
pub type Coord = (usize, usize);

/// Errors raised by board mutations.
///
/// Every failing operation leaves the board unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Invalid coordinates: row {row}, column {column}")]
    InvalidCoords { row: usize, column: usize },

    #[error("Invalid board size {0} (must be between {MIN_BOARD_SIZE} and {MAX_BOARD_SIZE})")]
    InvalidSize(usize),

    #[error("Value {0} is out of range (must be between 0 and {MAX_POINTS})")]
    ValueOutOfRange(u32),

    #[error("Invalid set piece: row {row}, column {column}")]
    InvalidSetPiece { row: usize, column: usize },

    #[error("Tile at row {row}, column {column} is not a set tile")]
    NotASetTile { row: usize, column: usize },

    #[error("Invalid colour '{0}' (expected #RRGGBB or #AARRGGBB)")]
    InvalidColour(String),

    #[error("Invalid cell label '{0}' (expected a column letter followed by a row number, e.g. B3)")]
    InvalidCellLabel(String),
}

/// Spreadsheet-style column letter for a 1-based column number.
///
/// Only single letters are produced; columns past `Z` render as `?`.
#[must_use]
pub fn column_letter(column_number: usize) -> String {
    match column_number {
        1..=26 => char::from(b'A' + (column_number - 1) as u8).to_string(),
        _ => "?".to_string(),
    }
}

/// Label such as `B3` for a zero-based coordinate.
#[must_use]
pub fn cell_label((row, column): Coord) -> String {
    format!("{}{}", column_letter(column + 1), row + 1)
}

/// Parse a label such as `B3` (case-insensitive) into a zero-based coordinate.
pub fn parse_cell_label(label: &str) -> Result<Coord, BoardError> {
    let invalid = || BoardError::InvalidCellLabel(label.to_string());
    let trimmed = label.trim();

    let mut chars = trimmed.chars();
    let letter = chars
        .next()
        .filter(char::is_ascii_alphabetic)
        .ok_or_else(invalid)?
        .to_ascii_uppercase();
    let row_number: usize = chars.as_str().parse().map_err(|_| invalid())?;

    if row_number == 0 {
        return Err(invalid());
    }

    let column = (letter as u8 - b'A') as usize;
    Ok((row_number - 1, column))
}
