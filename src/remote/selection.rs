//! Search-and-pick flow for choosing a tile image.
//!
//! ```text
//! Idle -> Searching -> Results -> Previewing -> Confirmed
//!             ^           |            |
//!             +-----------+------------+        (new search)
//! any non-final state -> Cancelled
//! ```
//!
//! Network work happens elsewhere; each transition is fed the result of the
//! call it was waiting for. Failures never abort the flow: they leave an
//! empty result list or no preview, and queue a [`Notice`] for the user.

use thiserror::Error;

use super::{RemoteError, ResolvedImage};

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NoResults { query: String },
    SearchFailed { query: String, reason: String },
    NoImage { title: String },
    UnsupportedFormat { title: String },
    PreviewFailed { title: String, reason: String },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoResults { query } => write!(f, "No results with images found for '{query}'."),
            Self::SearchFailed { query, reason } => {
                write!(f, "Searching for '{query}' failed: {reason}")
            }
            Self::NoImage { title } => write!(f, "No image available for '{title}'."),
            Self::UnsupportedFormat { title } => write!(
                f,
                "The image for '{title}' is a GIF; GIF images are not supported."
            ),
            Self::PreviewFailed { title, reason } => {
                write!(f, "Could not preview '{title}': {reason}")
            }
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Please enter a search term")]
    EmptyQuery,

    #[error("'{0}' is not one of the search results")]
    UnknownTitle(String),

    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Searching {
        query: String,
    },
    Results {
        query: String,
        titles: Vec<String>,
    },
    Previewing {
        query: String,
        titles: Vec<String>,
        image: ResolvedImage,
    },
    Confirmed(ResolvedImage),
    Cancelled,
}

impl SelectionState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Searching { .. } => "searching",
            Self::Results { .. } => "showing results",
            Self::Previewing { .. } => "previewing",
            Self::Confirmed(_) => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Confirmed(_) | Self::Cancelled)
    }
}

/// One image selection interaction.
#[derive(Debug, Default)]
pub struct ImageSelection {
    state: SelectionState,
    notices: Vec<Notice>,
}

impl ImageSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Current result titles; empty outside `Results` and `Previewing`.
    #[must_use]
    pub fn titles(&self) -> &[String] {
        match &self.state {
            SelectionState::Results { titles, .. } | SelectionState::Previewing { titles, .. } => {
                titles
            }
            _ => &[],
        }
    }

    #[must_use]
    pub fn preview(&self) -> Option<&ResolvedImage> {
        match &self.state {
            SelectionState::Previewing { image, .. } => Some(image),
            _ => None,
        }
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn invalid(&self, action: &'static str) -> SelectionError {
        SelectionError::InvalidTransition {
            state: self.state.name(),
            action,
        }
    }

    /// Start a search. Allowed when idle or after earlier results.
    pub fn begin_search(&mut self, query: &str) -> Result<(), SelectionError> {
        match self.state {
            SelectionState::Idle
            | SelectionState::Results { .. }
            | SelectionState::Previewing { .. } => {}
            _ => return Err(self.invalid("search")),
        }
        let query = query.trim();
        if query.is_empty() {
            return Err(SelectionError::EmptyQuery);
        }
        self.state = SelectionState::Searching {
            query: query.to_string(),
        };
        Ok(())
    }

    /// Deliver the outcome of the pending search.
    pub fn finish_search(&mut self, result: Result<Vec<String>, RemoteError>) -> Result<&[String], SelectionError> {
        let SelectionState::Searching { query } = &self.state else {
            return Err(self.invalid("receive search results"));
        };
        let query = query.clone();

        let titles = match result {
            Ok(titles) => {
                if titles.is_empty() {
                    self.notices.push(Notice::NoResults {
                        query: query.clone(),
                    });
                }
                titles
            }
            Err(err) => {
                log::error!("Search for '{query}' failed: {err}");
                self.notices.push(Notice::SearchFailed {
                    query: query.clone(),
                    reason: err.to_string(),
                });
                Vec::new()
            }
        };

        self.state = SelectionState::Results { query, titles };
        Ok(self.titles())
    }

    /// Check that `title` may be previewed before resolving it.
    pub fn check_pick(&self, title: &str) -> Result<(), SelectionError> {
        match &self.state {
            SelectionState::Results { titles, .. } | SelectionState::Previewing { titles, .. } => {
                if titles.iter().any(|t| t == title) {
                    Ok(())
                } else {
                    Err(SelectionError::UnknownTitle(title.to_string()))
                }
            }
            _ => Err(self.invalid("pick a result")),
        }
    }

    /// Deliver the resolved image for a picked title.
    ///
    /// Returns `true` when a preview is now shown. On failure the previous
    /// preview is dropped and a notice explains why.
    pub fn show_preview(
        &mut self,
        title: &str,
        result: Result<ResolvedImage, RemoteError>,
    ) -> Result<bool, SelectionError> {
        self.check_pick(title)?;
        let (query, titles) = match std::mem::take(&mut self.state) {
            SelectionState::Results { query, titles }
            | SelectionState::Previewing { query, titles, .. } => (query, titles),
            other => {
                self.state = other;
                return Err(self.invalid("preview"));
            }
        };

        match result {
            Ok(image) => {
                self.state = SelectionState::Previewing {
                    query,
                    titles,
                    image,
                };
                Ok(true)
            }
            Err(err) => {
                let notice = match err {
                    RemoteError::UnsupportedFormat { .. } => Notice::UnsupportedFormat {
                        title: title.to_string(),
                    },
                    RemoteError::NoImage(_) => Notice::NoImage {
                        title: title.to_string(),
                    },
                    other => Notice::PreviewFailed {
                        title: title.to_string(),
                        reason: other.to_string(),
                    },
                };
                self.notices.push(notice);
                self.state = SelectionState::Results { query, titles };
                Ok(false)
            }
        }
    }

    /// Accept the previewed image.
    pub fn confirm(&mut self) -> Result<&ResolvedImage, SelectionError> {
        if !matches!(self.state, SelectionState::Previewing { .. }) {
            return Err(self.invalid("confirm"));
        }
        if let SelectionState::Previewing { image, .. } = std::mem::take(&mut self.state) {
            self.state = SelectionState::Confirmed(image);
        }
        match &self.state {
            SelectionState::Confirmed(image) => Ok(image),
            _ => Err(self.invalid("confirm")),
        }
    }

    pub fn cancel(&mut self) -> Result<(), SelectionError> {
        if self.state.is_final() {
            return Err(self.invalid("cancel"));
        }
        self.state = SelectionState::Cancelled;
        Ok(())
    }
}
