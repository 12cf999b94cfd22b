//! JSON score report.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "rows": [{ "index": 1, "label": "1", "bonus": 10, "total": 25, "gained": 25, "complete": true }],
//!   "columns": [{ "index": 1, "label": "A", "bonus": 0, "total": 1, "gained": 1, "complete": true }],
//!   "summary": {
//!     "rows": 5,
//!     "columns": 5,
//!     "tiles_completed": 5,
//!     "tile_count": 25,
//!     "points_total": 15,
//!     "points_gained": 15,
//!     "bonus_gained": 10
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::board::{column_letter, BoardState, LineScore, ScoreSheet};

/// Score of one row or column in the report.
#[derive(Debug, Clone, Serialize)]
pub struct JsonLine {
    /// 1-based line number
    pub index: usize,
    /// Row number or column letter
    pub label: String,
    pub bonus: u32,
    pub total: u32,
    pub gained: u32,
    pub complete: bool,
}

impl JsonLine {
    fn new(index: usize, label: String, bonus: u32, score: &LineScore) -> Self {
        Self {
            index,
            label,
            bonus,
            total: score.total,
            gained: score.gained,
            complete: score.complete,
        }
    }
}

/// Board-wide totals.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    pub rows: usize,
    pub columns: usize,
    pub tiles_completed: usize,
    pub tile_count: usize,
    pub points_total: u32,
    pub points_gained: u32,
    pub bonus_gained: u32,
}

/// Complete JSON score report.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub rows: Vec<JsonLine>,
    pub columns: Vec<JsonLine>,
    pub summary: JsonSummary,
}

impl ScoreReport {
    #[must_use]
    pub fn new(board: &BoardState) -> Self {
        let sheet = ScoreSheet::compute(board);

        let rows = sheet
            .rows
            .iter()
            .enumerate()
            .map(|(row, score)| {
                JsonLine::new(row + 1, (row + 1).to_string(), board.row_bonus(row), score)
            })
            .collect();
        let columns = sheet
            .columns
            .iter()
            .enumerate()
            .map(|(column, score)| {
                JsonLine::new(
                    column + 1,
                    column_letter(column + 1),
                    board.column_bonus(column),
                    score,
                )
            })
            .collect();

        Self {
            rows,
            columns,
            summary: JsonSummary {
                rows: board.rows(),
                columns: board.columns(),
                tiles_completed: sheet.tiles_completed,
                tile_count: sheet.tile_count,
                points_total: sheet.points_total,
                points_gained: sheet.points_gained,
                bonus_gained: sheet.bonus_gained(board),
            },
        }
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write indented JSON followed by a newline.
    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)
    }
}
