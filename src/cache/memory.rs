//! In-memory cache of decoded images.
//!
//! Entries are shared handles: a display surface holding an
//! `Arc<CachedImage>` keeps its image even after the entry is removed.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, ImageReader};
use thiserror::Error;

/// Errors raised while decoding or caching images.
#[derive(Debug, Error)]
pub enum ImageCacheError {
    #[error("I/O error reading image {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unrecognised image format")]
    UnknownFormat,

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("The provided image is invalid or corrupted: {0}")]
    Invalid(String),
}

/// A decoded image together with the format it was read from.
#[derive(Debug, Clone)]
pub struct CachedImage {
    image: DynamicImage,
    format: ImageFormat,
}

impl CachedImage {
    #[must_use]
    pub fn new(image: DynamicImage, format: ImageFormat) -> Self {
        Self { image, format }
    }

    /// Decode an image from memory, sniffing the format from its header.
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageCacheError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|source| ImageCacheError::Io {
                path: "<memory>".to_string(),
                source,
            })?;
        let format = reader.format().ok_or(ImageCacheError::UnknownFormat)?;
        let image = reader.decode()?;
        Ok(Self { image, format })
    }

    /// Read and decode an image file.
    pub fn open(path: &Path) -> Result<Self, ImageCacheError> {
        let bytes = std::fs::read(path).map_err(|source| ImageCacheError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::decode(&bytes)
    }

    #[must_use]
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    #[must_use]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Validity probe: non-zero dimensions and a format this build can read.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width() > 0 && self.height() > 0 && self.format.reading_enabled()
    }
}

/// Map from an image key (usually its path) to a shared decoded image.
#[derive(Debug, Default)]
pub struct ImageCache {
    entries: HashMap<String, Arc<CachedImage>>,
}

impl ImageCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key`. Entries that fail the validity probe are dropped and
    /// reported as absent.
    pub fn get(&mut self, key: &str) -> Option<Arc<CachedImage>> {
        let entry = self.entries.get(key)?;
        if entry.is_valid() {
            return Some(Arc::clone(entry));
        }

        self.entries.remove(key);
        log::debug!("Corrupted image removed from cache: {key}");
        None
    }

    /// Insert or replace the entry for `key`.
    pub fn put(&mut self, key: &str, image: CachedImage) -> Result<Arc<CachedImage>, ImageCacheError> {
        if !image.is_valid() {
            return Err(ImageCacheError::Invalid(key.to_string()));
        }
        let handle = Arc::new(image);
        self.entries.insert(key.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Return the cached image for `path`, decoding and caching it on a miss.
    pub fn get_or_open(&mut self, path: &Path) -> Result<Arc<CachedImage>, ImageCacheError> {
        let key = path.to_string_lossy();
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        let image = CachedImage::open(path)?;
        self.put(&key, image)
    }

    pub fn remove(&mut self, key: &str) -> Option<Arc<CachedImage>> {
        self.entries.remove(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    fn insert_unchecked(&mut self, key: &str, image: CachedImage) {
        self.entries.insert(key.to_string(), Arc::new(image));
    }
}

/// Encode a small solid image, for tests that need real image bytes.
#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::new_rgba8(width, height);
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}
