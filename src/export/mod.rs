//! Board export formats.
//!
//! - CSV for spreadsheets, one record per board row
//! - JSON score report for scripting

pub mod csv;
pub mod json;

pub use self::csv::{CsvExport, CsvExportError};
pub use self::json::ScoreReport;
