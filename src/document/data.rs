//! Serializable board document and its validation.
//!
//! Field names follow the PascalCase layout of `.bingo.json` files so boards
//! saved by earlier releases load unchanged. Nullable fields are modelled as
//! `Option` so structural problems are reported instead of silently defaulted.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::tile::{SET_COLUMNS, SET_ROWS, SET_TILE_TITLE};
use crate::board::{
    Argb, BoardState, ImageRef, SetGrid, Tile, MAX_BOARD_SIZE, MAX_POINTS, MIN_BOARD_SIZE,
};

/// Reasons a board document is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Board document has no tiles")]
    MissingTiles,

    #[error("Board document has no row bonuses")]
    MissingRowBonuses,

    #[error("Board document has no column bonuses")]
    MissingColumnBonuses,

    #[error("Invalid board dimensions {rows}x{columns} (each must be between {MIN_BOARD_SIZE} and {MAX_BOARD_SIZE})")]
    InvalidDimensions { rows: i64, columns: i64 },

    #[error("Row bonus count {found} does not match row count {expected}")]
    RowBonusMismatch { expected: usize, found: usize },

    #[error("Column bonus count {found} does not match column count {expected}")]
    ColumnBonusMismatch { expected: usize, found: usize },

    #[error("Tile grid has {found} rows but the board declares {expected}")]
    TileRowCountMismatch { expected: usize, found: usize },

    #[error("Tile row {row} has {found} tiles but the board declares {expected} columns")]
    TileColumnCountMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Tile at row {row}, column {column} is null")]
    NullTile { row: usize, column: usize },

    #[error("Tile at row {row}, column {column} records position ({recorded_row}, {recorded_column})")]
    TileCoordinateMismatch {
        row: usize,
        column: usize,
        recorded_row: i64,
        recorded_column: i64,
    },

    #[error("Tile at row {row}, column {column} has invalid points {points}")]
    InvalidPoints { row: usize, column: usize, points: i64 },

    #[error("Bonus value {0} is out of range (must be between 0 and {MAX_POINTS})")]
    InvalidBonus(i64),

    #[error("Tile at row {row}, column {column} has a missing or malformed completion grid (expected {SET_ROWS}x{SET_COLUMNS})")]
    InvalidCompletionState { row: usize, column: usize },
}

/// Persisted form of a single tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TileRecord {
    pub row: i64,
    pub column: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "transparent_argb")]
    pub background_colour_argb: i32,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub completion_state: Option<Vec<Option<Vec<bool>>>>,
    /// Absent in documents written before set tiles were flagged explicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_set_tile: Option<bool>,
}

fn transparent_argb() -> i32 {
    Argb::TRANSPARENT.to_i32()
}

/// Persisted form of a whole board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BoardDocument {
    #[serde(default)]
    pub tiles: Option<Vec<Option<Vec<Option<TileRecord>>>>>,
    #[serde(default)]
    pub row_bonuses: Option<Vec<i64>>,
    #[serde(default)]
    pub column_bonuses: Option<Vec<i64>>,
    #[serde(default)]
    pub rows: i64,
    #[serde(default)]
    pub columns: i64,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl From<&Tile> for TileRecord {
    fn from(tile: &Tile) -> Self {
        let grid = tile.set_grid.unwrap_or_default();
        Self {
            row: tile.row() as i64,
            column: tile.column() as i64,
            title: Some(tile.title.clone()),
            points: i64::from(tile.points),
            image_path: tile
                .image
                .path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            image_url: tile.image.url.clone(),
            background_colour_argb: tile.background.to_i32(),
            is_completed: tile.completed,
            completion_state: Some(grid.cells().iter().map(|row| Some(row.to_vec())).collect()),
            is_set_tile: Some(tile.is_set_tile()),
        }
    }
}

impl From<&BoardState> for BoardDocument {
    fn from(board: &BoardState) -> Self {
        let tiles = (0..board.rows())
            .map(|row| {
                Some(
                    board
                        .row_tiles(row)
                        .iter()
                        .map(|tile| Some(TileRecord::from(tile)))
                        .collect(),
                )
            })
            .collect();

        Self {
            tiles: Some(tiles),
            row_bonuses: Some(board.row_bonuses().iter().map(|&b| i64::from(b)).collect()),
            column_bonuses: Some(board.column_bonuses().iter().map(|&b| i64::from(b)).collect()),
            rows: board.rows() as i64,
            columns: board.columns() as i64,
        }
    }
}

fn dimension(value: i64) -> Option<usize> {
    usize::try_from(value)
        .ok()
        .filter(|v| (MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(v))
}

fn bonuses(values: &[i64]) -> Result<Vec<u32>, DocumentError> {
    values
        .iter()
        .map(|&value| {
            u32::try_from(value)
                .ok()
                .filter(|&v| v <= MAX_POINTS)
                .ok_or(DocumentError::InvalidBonus(value))
        })
        .collect()
}

fn completion_grid(
    state: &Option<Vec<Option<Vec<bool>>>>,
    row: usize,
    column: usize,
) -> Result<SetGrid, DocumentError> {
    let invalid = || DocumentError::InvalidCompletionState { row, column };
    let rows = state.as_ref().ok_or_else(invalid)?;
    if rows.len() != SET_ROWS {
        return Err(invalid());
    }

    let mut cells = [[false; SET_COLUMNS]; SET_ROWS];
    for (target, source) in cells.iter_mut().zip(rows) {
        let source = source.as_ref().filter(|r| r.len() == SET_COLUMNS).ok_or_else(invalid)?;
        target.copy_from_slice(source);
    }
    Ok(SetGrid::from_cells(cells))
}

impl TileRecord {
    fn into_tile(self, row: usize, column: usize) -> Result<Tile, DocumentError> {
        if self.row != row as i64 || self.column != column as i64 {
            return Err(DocumentError::TileCoordinateMismatch {
                row,
                column,
                recorded_row: self.row,
                recorded_column: self.column,
            });
        }

        let points = u32::try_from(self.points)
            .ok()
            .filter(|&p| p <= MAX_POINTS)
            .ok_or(DocumentError::InvalidPoints {
                row,
                column,
                points: self.points,
            })?;

        let grid = completion_grid(&self.completion_state, row, column)?;
        let title = self.title.unwrap_or_default();
        let is_set_tile = self.is_set_tile.unwrap_or(title == SET_TILE_TITLE);

        let mut tile = Tile::new(row, column);
        tile.image = ImageRef {
            path: non_empty(&self.image_path).map(PathBuf::from),
            url: non_empty(&self.image_url).map(str::to_string),
        };
        tile.title = title;
        tile.points = points;
        tile.background = Argb::from_i32(self.background_colour_argb);
        tile.completed = self.is_completed;
        tile.set_grid = is_set_tile.then_some(grid);
        Ok(tile)
    }
}

impl TryFrom<BoardDocument> for BoardState {
    type Error = DocumentError;

    fn try_from(document: BoardDocument) -> Result<Self, Self::Error> {
        let tile_rows = document.tiles.ok_or(DocumentError::MissingTiles)?;
        let row_bonuses = document.row_bonuses.ok_or(DocumentError::MissingRowBonuses)?;
        let column_bonuses = document
            .column_bonuses
            .ok_or(DocumentError::MissingColumnBonuses)?;

        let (rows, columns) = match (dimension(document.rows), dimension(document.columns)) {
            (Some(rows), Some(columns)) => (rows, columns),
            _ => {
                return Err(DocumentError::InvalidDimensions {
                    rows: document.rows,
                    columns: document.columns,
                })
            }
        };

        if row_bonuses.len() != rows {
            return Err(DocumentError::RowBonusMismatch {
                expected: rows,
                found: row_bonuses.len(),
            });
        }
        if column_bonuses.len() != columns {
            return Err(DocumentError::ColumnBonusMismatch {
                expected: columns,
                found: column_bonuses.len(),
            });
        }
        if tile_rows.len() != rows {
            return Err(DocumentError::TileRowCountMismatch {
                expected: rows,
                found: tile_rows.len(),
            });
        }

        let mut tiles = Vec::with_capacity(rows * columns);
        for (row, records) in tile_rows.into_iter().enumerate() {
            let records = records.ok_or(DocumentError::TileColumnCountMismatch {
                row,
                expected: columns,
                found: 0,
            })?;
            if records.len() != columns {
                return Err(DocumentError::TileColumnCountMismatch {
                    row,
                    expected: columns,
                    found: records.len(),
                });
            }
            for (column, record) in records.into_iter().enumerate() {
                let record = record.ok_or(DocumentError::NullTile { row, column })?;
                tiles.push(record.into_tile(row, column)?);
            }
        }

        Ok(BoardState::from_parts(
            rows,
            columns,
            tiles,
            bonuses(&row_bonuses)?,
            bonuses(&column_bonuses)?,
        ))
    }
}
