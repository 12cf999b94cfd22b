//! Remote image search, resolution and upload.
//!
//! The board only depends on two small traits:
//!
//! * [`ImageResolver`]: search page titles and resolve a title to image bytes.
//! * [`ImageUploader`]: publish local image bytes and get a hosted URL back.
//!
//! [`wiki::WikiClient`] and [`upload::ImageHostClient`] implement them over
//! blocking HTTP. Callers that must never fail use the `*_or_*` helpers, which
//! log the error and return an empty or absent value instead.
//! [`selection::ImageSelection`] tracks one search-and-pick interaction.

pub mod selection;
pub mod upload;
pub mod wiki;

use thiserror::Error;

pub use selection::{ImageSelection, Notice, SelectionError, SelectionState};
pub use upload::ImageHostClient;
pub use wiki::WikiClient;

/// Errors raised by remote collaborators.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("No image available for '{0}'")]
    NoImage(String),

    #[error("Image format '{extension}' is not supported: {url}")]
    UnsupportedFormat { url: String, extension: String },

    #[error("Downloaded image data was empty: {0}")]
    EmptyBody(String),

    #[error("No image host client id configured (set remote.upload_client_id)")]
    MissingClientId,

    #[error("Image host rejected the upload: {0}")]
    UploadRejected(String),
}

impl RemoteError {
    /// Errors that mean "nothing to show" rather than "something broke".
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::NoImage(_) | Self::UnsupportedFormat { .. })
    }
}

/// Image bytes resolved from a page title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub title: String,
    /// Remote page identifier.
    pub page_id: String,
    pub source_url: String,
    /// Lower-case extension without the dot, normalised to a supported one.
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Search and resolve images by page title.
pub trait ImageResolver: Send + Sync {
    /// Titles of pages that have an image, most relevant first.
    fn search_titles(&self, query: &str) -> Result<Vec<String>, RemoteError>;

    /// Download the image associated with `title`.
    fn resolve_image(&self, title: &str) -> Result<ResolvedImage, RemoteError>;
}

/// Publish images to a hosting service.
pub trait ImageUploader: Send + Sync {
    /// Upload `bytes` and return the hosted URL.
    fn upload_image(&self, bytes: &[u8]) -> Result<String, RemoteError>;
}

/// Search, reporting failures as an empty list.
pub fn search_titles_or_empty(resolver: &dyn ImageResolver, query: &str) -> Vec<String> {
    match resolver.search_titles(query) {
        Ok(titles) => titles,
        Err(err) => {
            log::error!("Search for '{query}' failed: {err}");
            Vec::new()
        }
    }
}

/// Resolve, reporting failures as absent.
pub fn resolve_image_or_absent(resolver: &dyn ImageResolver, title: &str) -> Option<ResolvedImage> {
    match resolver.resolve_image(title) {
        Ok(image) => Some(image),
        Err(err) if err.is_absent() => {
            log::info!("{err}");
            None
        }
        Err(err) => {
            log::error!("Resolving image for '{title}' failed: {err}");
            None
        }
    }
}

/// Upload, reporting failures as absent. Callers fall back to the local path.
pub fn upload_image_or_absent(uploader: &dyn ImageUploader, bytes: &[u8]) -> Option<String> {
    match uploader.upload_image(bytes) {
        Ok(url) => Some(url),
        Err(err) => {
            log::error!("Image upload failed, keeping local image only: {err}");
            None
        }
    }
}
