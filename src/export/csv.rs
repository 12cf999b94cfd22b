//! CSV export of a board.
//!
//! The layout mirrors the board itself so it opens as a grid in spreadsheets:
//!
//! ```text
//! ,A,B,C
//! 1,Zulrah (5 Pts),Vorkath (10 Pts), (0 Pts)
//! 2,...
//! ```
//!
//! Cells containing a comma, quote, CR or LF are quoted with doubled quotes.
//! Records end in CRLF.

use std::io;

use thiserror::Error;

use crate::board::{column_letter, BoardState, Tile};

/// Errors that can occur during CSV export.
#[derive(Debug, Error)]
pub enum CsvExportError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV encoding.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Text of a single exported cell.
#[must_use]
pub fn cell_text(tile: &Tile) -> String {
    format!("{} ({} Pts)", tile.title, tile.points)
}

/// CSV exporter for one board.
pub struct CsvExport<'a> {
    board: &'a BoardState,
}

impl<'a> CsvExport<'a> {
    #[must_use]
    pub fn new(board: &'a BoardState) -> Self {
        Self { board }
    }

    /// Write the CSV document to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvExportError` if writing or encoding fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvExportError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(writer);

        let header = std::iter::once(String::new())
            .chain((1..=self.board.columns()).map(column_letter));
        csv_writer.write_record(header)?;

        for row in 0..self.board.rows() {
            let record = std::iter::once((row + 1).to_string())
                .chain(self.board.row_tiles(row).iter().map(cell_text));
            csv_writer.write_record(record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate the CSV document as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvExportError` if encoding fails.
    pub fn to_string(&self) -> Result<String, CsvExportError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
