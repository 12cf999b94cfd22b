//! Reading and writing `.bingo.json` board files.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::board::BoardState;
use crate::document::data::BoardDocument;

impl BoardState {
    /// Saves the board as an indented JSON document.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create board file: {}", path.display()))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write board to: {}", path.display()))?;
        log::debug!("Saved {}x{} board to {}", self.rows(), self.columns(), path.display());
        Ok(())
    }

    /// Serializes the board to an indented JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&BoardDocument::from(self))
            .context("Failed to serialize board document")
    }

    /// Parses and validates a JSON board document.
    ///
    /// Validation failures keep the [`DocumentError`](crate::document::DocumentError)
    /// in the error chain so callers can tell a bad document from a bad file.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: BoardDocument = serde_json::from_str(json)
            .context("Failed to parse board document. The file might be corrupted.")?;
        let board = BoardState::try_from(document).context("Invalid board document")?;
        Ok(board)
    }

    /// Loads a board from a file and validates it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read board file: {}", path.display()))?;
        let board = Self::from_json(&content)
            .with_context(|| format!("Failed to load board from: {}", path.display()))?;

        for tile in board.tiles() {
            if let Some(image) = &tile.image.path {
                if !image.exists() {
                    log::warn!(
                        "Image referenced by tile {} no longer exists: {}",
                        crate::board::cell_label(tile.coords()),
                        image.display()
                    );
                }
            }
        }

        Ok(board)
    }
}
