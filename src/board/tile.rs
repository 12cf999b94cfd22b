//! Tile model: one cell of a bingo board.
//!
//! A tile carries its own coordinates, a title, a point value, an optional
//! image reference, a background colour and a completion flag. Tiles of the
//! special "set" kind additionally track a fixed 4×6 grid of collected pieces.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::BoardError;

/// Number of piece rows tracked by a special set tile.
pub const SET_ROWS: usize = 4;

/// Number of piece columns (one per item set) tracked by a special set tile.
pub const SET_COLUMNS: usize = 6;

/// Title given to a tile when it is converted into a special set tile.
pub const SET_TILE_TITLE: &str = "Barrows Set";

/// Item set names, one per set grid column.
pub const SET_NAMES: [&str; SET_COLUMNS] = [
    "Ahrim's", "Dharok's", "Guthan's", "Karil's", "Torag's", "Verac's",
];

/// 32-bit ARGB colour value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Argb(pub u32);

impl Argb {
    /// White with zero alpha, the value persisted for "no background".
    pub const TRANSPARENT: Argb = Argb(0x00FF_FFFF);

    /// Build a colour from its four channels.
    #[must_use]
    pub const fn from_channels(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    #[must_use]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.0 == Self::TRANSPARENT.0
    }

    /// Reinterpret as the signed integer used by the board document.
    #[must_use]
    pub const fn to_i32(self) -> i32 {
        self.0 as i32
    }

    #[must_use]
    pub const fn from_i32(value: i32) -> Self {
        Self(value as u32)
    }
}

impl Default for Argb {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

impl FromStr for Argb {
    type Err = BoardError;

    /// Parses `#RRGGBB` (opaque) or `#AARRGGBB`; the leading `#` is optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        let invalid = || BoardError::InvalidColour(s.to_string());

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        match hex.len() {
            6 => u32::from_str_radix(hex, 16)
                .map(|rgb| Argb(0xFF00_0000 | rgb))
                .map_err(|_| invalid()),
            8 => u32::from_str_radix(hex, 16).map(Argb).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

/// Where a tile's image comes from.
///
/// The local path and the remote URL are independent: a wiki image has both,
/// a dropped file only a path, and an uploaded image gains a URL later.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRef {
    pub path: Option<PathBuf>,
    pub url: Option<String>,
}

impl ImageRef {
    #[must_use]
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            url: None,
        }
    }

    #[must_use]
    pub fn remote(path: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            url: Some(url.into()),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.url.is_none()
    }
}

/// Collected-piece grid of a special set tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetGrid {
    cells: [[bool; SET_COLUMNS]; SET_ROWS],
}

impl SetGrid {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_cells(cells: [[bool; SET_COLUMNS]; SET_ROWS]) -> Self {
        Self { cells }
    }

    #[must_use]
    pub fn cells(&self) -> &[[bool; SET_COLUMNS]; SET_ROWS] {
        &self.cells
    }

    /// Whether the piece at `(row, column)` is collected; out of range is `false`.
    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> bool {
        self.cells
            .get(row)
            .and_then(|r| r.get(column))
            .copied()
            .unwrap_or(false)
    }

    /// Flip one piece and return its new state.
    pub fn toggle(&mut self, row: usize, column: usize) -> Result<bool, BoardError> {
        let cell = self
            .cells
            .get_mut(row)
            .and_then(|r| r.get_mut(column))
            .ok_or(BoardError::InvalidSetPiece { row, column })?;
        *cell = !*cell;
        Ok(*cell)
    }

    #[must_use]
    pub fn is_column_complete(&self, column: usize) -> bool {
        column < SET_COLUMNS && self.cells.iter().all(|row| row[column])
    }

    /// First item set whose pieces are all collected.
    #[must_use]
    pub fn completed_column(&self) -> Option<usize> {
        (0..SET_COLUMNS).find(|&column| self.is_column_complete(column))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(|&cell| !cell)
    }
}

/// Image file shown on a set tile once item set `column` is complete.
#[must_use]
pub fn set_image_name(column: usize) -> Option<String> {
    SET_NAMES.get(column).map(|name| format!("{name}_set.png"))
}

/// A single board cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub(crate) row: usize,
    pub(crate) column: usize,
    pub title: String,
    pub points: u32,
    pub image: ImageRef,
    pub background: Argb,
    pub completed: bool,
    pub set_grid: Option<SetGrid>,
}

impl Tile {
    /// A default tile at the given position.
    #[must_use]
    pub fn new(row: usize, column: usize) -> Self {
        Self {
            row,
            column,
            title: String::new(),
            points: 0,
            image: ImageRef::default(),
            background: Argb::TRANSPARENT,
            completed: false,
            set_grid: None,
        }
    }

    #[must_use]
    pub fn row(&self) -> usize {
        self.row
    }

    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    #[must_use]
    pub fn coords(&self) -> (usize, usize) {
        (self.row, self.column)
    }

    #[must_use]
    pub fn is_set_tile(&self) -> bool {
        self.set_grid.is_some()
    }

    /// Whether losing this tile would lose user data.
    #[must_use]
    pub fn has_data(&self) -> bool {
        !self.title.is_empty()
            || self.points != 0
            || !self.image.is_empty()
            || !self.background.is_transparent()
    }

    /// Reset every user-editable field, keeping the position.
    pub fn reset(&mut self) {
        *self = Self::new(self.row, self.column);
    }

    /// Copy of this tile moved to a new position.
    pub(crate) fn relocated(&self, row: usize, column: usize) -> Self {
        Self {
            row,
            column,
            ..self.clone()
        }
    }
}
