//! Exit codes and structured error output.

use serde::Serialize;

use crate::document::DocumentError;

/// Process exit codes.
///
/// - 0: success
/// - 1: unexpected failure
/// - 2: a board document failed validation
/// - 3: finished, but some image operations failed (board still saved)
/// - 130: interrupted by Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidDocument = 2,
    PartialSuccess = 3,
    Interrupted = 130,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code, e.g. `BB002`.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "BB000",
            Self::GeneralError => "BB001",
            Self::InvalidDocument => "BB002",
            Self::PartialSuccess => "BB003",
            Self::Interrupted => "BB130",
        }
    }

    /// Exit code for an error returned by `run_app`.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err.chain().any(|cause| cause.is::<DocumentError>()) {
            Self::InvalidDocument
        } else {
            Self::GeneralError
        }
    }
}

/// Error report printed with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    pub code: String,
    pub exit_code: i32,
    /// Full error chain, outermost first.
    pub message: String,
    pub interrupted: bool,
}

impl StructuredError {
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
