//! Row and column scoring.
//!
//! All functions here are pure reads of a [`BoardState`]. Recomputing the
//! whole sheet after every mutation is cheap: boards are at most 15×15.

use serde::Serialize;

use super::state::BoardState;
use super::tile::Tile;

/// Score of one row or column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineScore {
    /// Sum of tile points plus the line bonus.
    pub total: u32,
    /// Points of completed tiles, plus the bonus when the line is complete.
    pub gained: u32,
    /// Every tile in the line is completed.
    pub complete: bool,
}

fn line_score<'a>(tiles: impl Iterator<Item = &'a Tile>, bonus: u32) -> LineScore {
    let mut points = 0;
    let mut gained = 0;
    let mut complete = true;
    let mut count = 0usize;

    for tile in tiles {
        count += 1;
        points += tile.points;
        if tile.completed {
            gained += tile.points;
        } else {
            complete = false;
        }
    }

    // Lines without tiles only exist out of range; they score nothing.
    if count == 0 {
        return LineScore::default();
    }

    LineScore {
        total: points + bonus,
        gained: if complete { gained + bonus } else { gained },
        complete,
    }
}

#[must_use]
pub fn row_score(board: &BoardState, row: usize) -> LineScore {
    line_score(board.row_tiles(row).iter(), board.row_bonus(row))
}

#[must_use]
pub fn column_score(board: &BoardState, column: usize) -> LineScore {
    line_score(board.column_tiles(column), board.column_bonus(column))
}

/// Scores of every row and column of a board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreSheet {
    pub rows: Vec<LineScore>,
    pub columns: Vec<LineScore>,
    /// Sum of all tile points (bonuses excluded).
    pub points_total: u32,
    /// Sum of points of completed tiles (bonuses excluded).
    pub points_gained: u32,
    pub tiles_completed: usize,
    pub tile_count: usize,
}

impl ScoreSheet {
    #[must_use]
    pub fn compute(board: &BoardState) -> Self {
        let rows = (0..board.rows()).map(|row| row_score(board, row)).collect();
        let columns = (0..board.columns())
            .map(|column| column_score(board, column))
            .collect();

        let (points_total, points_gained, tiles_completed) =
            board.tiles().fold((0, 0, 0), |(total, gained, done), tile| {
                if tile.completed {
                    (total + tile.points, gained + tile.points, done + 1)
                } else {
                    (total + tile.points, gained, done)
                }
            });

        Self {
            rows,
            columns,
            points_total,
            points_gained,
            tiles_completed,
            tile_count: board.tile_count(),
        }
    }

    /// Bonuses currently earned by complete rows and columns.
    #[must_use]
    pub fn bonus_gained(&self, board: &BoardState) -> u32 {
        let rows: u32 = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, score)| score.complete)
            .map(|(row, _)| board.row_bonus(row))
            .sum();
        let columns: u32 = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, score)| score.complete)
            .map(|(column, _)| board.column_bonus(column))
            .sum();
        rows + columns
    }
}
