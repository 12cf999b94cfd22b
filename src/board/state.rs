//! Board aggregate: tile grid plus row and column bonuses.

use std::ops::Index;

use super::tile::{Argb, ImageRef, SetGrid, Tile, SET_TILE_TITLE};
use super::{BoardError, Coord, MAX_BOARD_SIZE, MAX_POINTS, MIN_BOARD_SIZE};

/// Complete state of one bingo board.
///
/// Tiles are stored row-major. The bonus vectors always match the board
/// dimensions and every tile's coordinates match its slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    rows: usize,
    columns: usize,
    tiles: Vec<Tile>,
    row_bonuses: Vec<u32>,
    column_bonuses: Vec<u32>,
}

/// Data that a resize would discard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizePlan {
    pub rows: usize,
    pub columns: usize,
    /// Coordinates of truncated tiles that still carry data.
    pub lost_tiles: Vec<Coord>,
}

impl ResizePlan {
    /// The caller must confirm before data-carrying tiles are dropped.
    #[must_use]
    pub fn requires_confirmation(&self) -> bool {
        !self.lost_tiles.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    Resized,
    Declined,
    Unchanged,
}

/// Result of toggling one piece of a special set tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetToggle {
    /// New state of the toggled piece.
    pub collected: bool,
    /// First fully collected item set, which also completes the tile.
    pub completed_set: Option<usize>,
}

fn validate_size(size: usize) -> Result<usize, BoardError> {
    if (MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) {
        Ok(size)
    } else {
        Err(BoardError::InvalidSize(size))
    }
}

fn validate_value(value: u32) -> Result<u32, BoardError> {
    if value <= MAX_POINTS {
        Ok(value)
    } else {
        Err(BoardError::ValueOutOfRange(value))
    }
}

impl BoardState {
    /// Create a square board of default tiles with zeroed bonuses.
    pub fn new(size: usize) -> Result<Self, BoardError> {
        Self::with_dimensions(size, size)
    }

    pub fn with_dimensions(rows: usize, columns: usize) -> Result<Self, BoardError> {
        let rows = validate_size(rows)?;
        let columns = validate_size(columns)?;
        Ok(Self::blank(rows, columns))
    }

    fn blank(rows: usize, columns: usize) -> Self {
        let tiles = (0..rows)
            .flat_map(|row| (0..columns).map(move |column| Tile::new(row, column)))
            .collect();
        Self {
            rows,
            columns,
            tiles,
            row_bonuses: vec![0; rows],
            column_bonuses: vec![0; columns],
        }
    }

    /// Assemble a board from already validated parts.
    pub(crate) fn from_parts(
        rows: usize,
        columns: usize,
        tiles: Vec<Tile>,
        row_bonuses: Vec<u32>,
        column_bonuses: Vec<u32>,
    ) -> Self {
        debug_assert_eq!(tiles.len(), rows * columns);
        debug_assert_eq!(row_bonuses.len(), rows);
        debug_assert_eq!(column_bonuses.len(), columns);
        Self {
            rows,
            columns,
            tiles,
            row_bonuses,
            column_bonuses,
        }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn contains(&self, (row, column): Coord) -> bool {
        row < self.rows && column < self.columns
    }

    fn index_of(&self, coords: Coord) -> Result<usize, BoardError> {
        let (row, column) = coords;
        if self.contains(coords) {
            Ok(row * self.columns + column)
        } else {
            Err(BoardError::InvalidCoords { row, column })
        }
    }

    pub fn tile(&self, coords: Coord) -> Result<&Tile, BoardError> {
        let index = self.index_of(coords)?;
        Ok(&self.tiles[index])
    }

    fn tile_mut(&mut self, coords: Coord) -> Result<&mut Tile, BoardError> {
        let index = self.index_of(coords)?;
        Ok(&mut self.tiles[index])
    }

    /// All tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Tiles of one row; empty when out of range.
    #[must_use]
    pub fn row_tiles(&self, row: usize) -> &[Tile] {
        if row < self.rows {
            &self.tiles[row * self.columns..(row + 1) * self.columns]
        } else {
            &[]
        }
    }

    /// Tiles of one column; empty when out of range.
    pub fn column_tiles(&self, column: usize) -> impl Iterator<Item = &Tile> {
        let columns = self.columns;
        let skip = if column < columns { column } else { self.tiles.len() };
        self.tiles.iter().skip(skip).step_by(columns.max(1))
    }

    #[must_use]
    pub fn row_bonuses(&self) -> &[u32] {
        &self.row_bonuses
    }

    #[must_use]
    pub fn column_bonuses(&self) -> &[u32] {
        &self.column_bonuses
    }

    #[must_use]
    pub fn row_bonus(&self, row: usize) -> u32 {
        self.row_bonuses.get(row).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn column_bonus(&self, column: usize) -> u32 {
        self.column_bonuses.get(column).copied().unwrap_or(0)
    }

    /// Every tile of the row is completed. Out-of-range rows are never complete.
    #[must_use]
    pub fn is_row_complete(&self, row: usize) -> bool {
        row < self.rows && self.row_tiles(row).iter().all(|tile| tile.completed)
    }

    #[must_use]
    pub fn is_column_complete(&self, column: usize) -> bool {
        column < self.columns && self.column_tiles(column).all(|tile| tile.completed)
    }

    /// The tile is completed and sits in a fully completed row or column.
    #[must_use]
    pub fn is_in_completed_line(&self, coords: Coord) -> bool {
        let (row, column) = coords;
        self.tile(coords).is_ok_and(|tile| tile.completed)
            && (self.is_row_complete(row) || self.is_column_complete(column))
    }

    // ------------------------------------------------------------------
    // Resize / clear
    // ------------------------------------------------------------------

    /// Describe what resizing to a `new_size` square would discard.
    pub fn plan_resize(&self, new_size: usize) -> Result<ResizePlan, BoardError> {
        self.plan_resize_to(new_size, new_size)
    }

    pub fn plan_resize_to(&self, rows: usize, columns: usize) -> Result<ResizePlan, BoardError> {
        let rows = validate_size(rows)?;
        let columns = validate_size(columns)?;

        let lost_tiles = self
            .tiles
            .iter()
            .filter(|tile| (tile.row >= rows || tile.column >= columns) && tile.has_data())
            .map(Tile::coords)
            .collect();

        Ok(ResizePlan {
            rows,
            columns,
            lost_tiles,
        })
    }

    /// Copy of this board at the new square size.
    ///
    /// Overlapping tiles are deep-copied, new cells are defaults, bonuses are
    /// truncated or zero-extended.
    pub fn resized(&self, new_size: usize) -> Result<Self, BoardError> {
        self.resized_to(new_size, new_size)
    }

    pub fn resized_to(&self, rows: usize, columns: usize) -> Result<Self, BoardError> {
        let rows = validate_size(rows)?;
        let columns = validate_size(columns)?;

        let mut next = Self::blank(rows, columns);
        for tile in &self.tiles {
            if tile.row < rows && tile.column < columns {
                next.tiles[tile.row * columns + tile.column] = tile.relocated(tile.row, tile.column);
            }
        }

        let copy_bonuses = |target: &mut Vec<u32>, source: &[u32]| {
            let overlap = target.len().min(source.len());
            target[..overlap].copy_from_slice(&source[..overlap]);
        };
        copy_bonuses(&mut next.row_bonuses, &self.row_bonuses);
        copy_bonuses(&mut next.column_bonuses, &self.column_bonuses);

        Ok(next)
    }

    /// Resize to a `new_size` square.
    ///
    /// `confirm` is only consulted when tiles carrying data would be
    /// truncated; returning `false` leaves the board untouched.
    pub fn resize<F>(&mut self, new_size: usize, confirm: F) -> Result<ResizeOutcome, BoardError>
    where
        F: FnOnce(&ResizePlan) -> bool,
    {
        self.resize_to(new_size, new_size, confirm)
    }

    pub fn resize_to<F>(
        &mut self,
        rows: usize,
        columns: usize,
        confirm: F,
    ) -> Result<ResizeOutcome, BoardError>
    where
        F: FnOnce(&ResizePlan) -> bool,
    {
        let plan = self.plan_resize_to(rows, columns)?;

        if plan.rows == self.rows && plan.columns == self.columns {
            return Ok(ResizeOutcome::Unchanged);
        }

        if plan.requires_confirmation() && !confirm(&plan) {
            log::debug!(
                "Resize to {}x{} declined ({} tiles with data)",
                plan.rows,
                plan.columns,
                plan.lost_tiles.len()
            );
            return Ok(ResizeOutcome::Declined);
        }

        *self = self.resized_to(plan.rows, plan.columns)?;
        log::debug!("Board resized to {}x{}", self.rows, self.columns);
        Ok(ResizeOutcome::Resized)
    }

    /// Reset every tile and zero all bonuses, keeping the dimensions.
    pub fn clear(&mut self) {
        self.tiles.iter_mut().for_each(Tile::reset);
        self.row_bonuses.fill(0);
        self.column_bonuses.fill(0);
    }

    // ------------------------------------------------------------------
    // Tile mutations
    // ------------------------------------------------------------------

    pub fn set_title(&mut self, coords: Coord, title: impl Into<String>) -> Result<(), BoardError> {
        self.tile_mut(coords)?.title = title.into();
        Ok(())
    }

    pub fn set_points(&mut self, coords: Coord, points: u32) -> Result<(), BoardError> {
        let points = validate_value(points)?;
        self.tile_mut(coords)?.points = points;
        Ok(())
    }

    pub fn set_image(&mut self, coords: Coord, image: ImageRef) -> Result<(), BoardError> {
        self.tile_mut(coords)?.image = image;
        Ok(())
    }

    pub fn clear_image(&mut self, coords: Coord) -> Result<(), BoardError> {
        self.tile_mut(coords)?.image = ImageRef::default();
        Ok(())
    }

    pub fn set_background(&mut self, coords: Coord, colour: Argb) -> Result<(), BoardError> {
        self.tile_mut(coords)?.background = colour;
        Ok(())
    }

    /// Flip the completion flag and return the new value.
    pub fn toggle_completed(&mut self, coords: Coord) -> Result<bool, BoardError> {
        let tile = self.tile_mut(coords)?;
        tile.completed = !tile.completed;
        Ok(tile.completed)
    }

    pub fn set_row_bonus(&mut self, row: usize, bonus: u32) -> Result<(), BoardError> {
        let bonus = validate_value(bonus)?;
        let slot = self
            .row_bonuses
            .get_mut(row)
            .ok_or(BoardError::InvalidCoords { row, column: 0 })?;
        *slot = bonus;
        Ok(())
    }

    pub fn set_column_bonus(&mut self, column: usize, bonus: u32) -> Result<(), BoardError> {
        let bonus = validate_value(bonus)?;
        let slot = self
            .column_bonuses
            .get_mut(column)
            .ok_or(BoardError::InvalidCoords { row: 0, column })?;
        *slot = bonus;
        Ok(())
    }

    /// Convert a tile into a special set tile, or back into a normal tile.
    ///
    /// Returns `true` when the tile is now a set tile. Reverting drops the
    /// title, image, background and piece grid but keeps the points.
    pub fn toggle_set_tile(&mut self, coords: Coord) -> Result<bool, BoardError> {
        let tile = self.tile_mut(coords)?;
        tile.completed = false;

        if tile.set_grid.take().is_some() {
            tile.title.clear();
            tile.image = ImageRef::default();
            tile.background = Argb::TRANSPARENT;
            Ok(false)
        } else {
            tile.title = SET_TILE_TITLE.to_string();
            tile.set_grid = Some(SetGrid::new());
            Ok(true)
        }
    }

    /// Toggle one piece of a set tile; the tile is completed while any item
    /// set column is fully collected.
    pub fn toggle_set_piece(
        &mut self,
        coords: Coord,
        piece_row: usize,
        piece_column: usize,
    ) -> Result<SetToggle, BoardError> {
        let tile = self.tile_mut(coords)?;
        let (row, column) = tile.coords();
        let grid = tile
            .set_grid
            .as_mut()
            .ok_or(BoardError::NotASetTile { row, column })?;

        let collected = grid.toggle(piece_row, piece_column)?;
        let completed_set = grid.completed_column();
        tile.completed = completed_set.is_some();

        Ok(SetToggle {
            collected,
            completed_set,
        })
    }
}

impl Index<Coord> for BoardState {
    type Output = Tile;

    fn index(&self, (row, column): Coord) -> &Self::Output {
        assert!(row < self.rows && column < self.columns, "tile index out of bounds");
        &self.tiles[row * self.columns + column]
    }
}
