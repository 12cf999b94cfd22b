//! On-disk image cache with a size bound.
//!
//! Files are named after the BLAKE3 hash of their source key (a URL or an
//! original file path) plus the source extension, so re-caching the same
//! source reuses the existing file. Reads refresh the access time, and
//! [`DiskCache::enforce_capacity`] evicts least-recently-accessed files
//! until the directory fits within its capacity.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytesize::ByteSize;
use filetime::FileTime;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use walkdir::WalkDir;

use super::entry::CacheEntry;
use crate::signal::CancelToken;

/// Default capacity: 100 MiB.
pub const DEFAULT_CAPACITY: u64 = 100 * 1024 * 1024;

/// Extensions accepted for cached images.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Extension used when a source carries no supported one.
pub const FALLBACK_EXTENSION: &str = "png";

/// Errors raised while writing into the cache.
#[derive(Debug, Error)]
pub enum DiskCacheError {
    #[error("Failed to create cache directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write cache file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source image not found: {0}")]
    SourceMissing(PathBuf),

    #[error("Unsupported image type '{0}' (expected .jpg, .jpeg, .png or .bmp)")]
    UnsupportedExtension(String),

    #[error("Refusing to cache an empty image for {0}")]
    Empty(String),
}

/// Outcome of one eviction sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvictionReport {
    pub capacity: u64,
    pub size_before: u64,
    pub size_after: u64,
    pub deleted: Vec<CacheEntry>,
    /// Files that could not be deleted, with the reason.
    pub failed: Vec<(PathBuf, String)>,
    pub cancelled: bool,
}

impl EvictionReport {
    #[must_use]
    pub fn bytes_deleted(&self) -> u64 {
        self.deleted.iter().map(|entry| entry.size).sum()
    }
}

/// Directory summary for `cache stats`.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub root: PathBuf,
    pub files: usize,
    pub total_size: u64,
    pub capacity: u64,
    pub oldest_access: Option<String>,
    pub newest_access: Option<String>,
}

impl CacheStats {
    #[must_use]
    pub fn is_over_capacity(&self) -> bool {
        self.total_size > self.capacity
    }
}

/// Lower-cased extension of a path or URL, ignoring any query string.
#[must_use]
pub fn source_extension(source: &str) -> Option<String> {
    let without_query = source.split(['?', '#']).next().unwrap_or(source);
    Path::new(without_query)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

#[must_use]
pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&ext.trim_start_matches('.').to_ascii_lowercase().as_str())
}

/// Cache file name for a source key: BLAKE3 hex plus `.extension`.
#[must_use]
pub fn key_file_name(source_key: &str, extension: &str) -> String {
    let hash = blake3::hash(source_key.as_bytes());
    format!("{}.{}", hash.to_hex(), extension.trim_start_matches('.'))
}

/// Set the access time of `path` to now.
fn touch(path: &Path) {
    if let Err(err) = filetime::set_file_atime(path, FileTime::now()) {
        log::debug!("Could not refresh access time of {}: {}", path.display(), err);
    }
}

fn access_time(metadata: &std::fs::Metadata) -> SystemTime {
    let atime = FileTime::from_last_access_time(metadata);
    let secs = u64::try_from(atime.unix_seconds()).unwrap_or(0);
    SystemTime::UNIX_EPOCH + std::time::Duration::new(secs, atime.nanoseconds())
}

/// Bounded on-disk image cache rooted at one directory.
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
    capacity: u64,
}

impl DiskCache {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, capacity: u64) -> Self {
        Self {
            root: root.into(),
            capacity,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Path a source key would be cached at.
    #[must_use]
    pub fn path_for(&self, source_key: &str, extension: &str) -> PathBuf {
        self.root.join(key_file_name(source_key, extension))
    }

    fn ensure_root(&self) -> Result<(), DiskCacheError> {
        std::fs::create_dir_all(&self.root).map_err(|source| DiskCacheError::CreateDir {
            path: self.root.clone(),
            source,
        })
    }

    fn store(&self, target: &Path, write: impl FnOnce(&Path) -> std::io::Result<()>) -> Result<(), DiskCacheError> {
        if !target.exists() {
            self.ensure_root()?;
            write(target).map_err(|source| DiskCacheError::Write {
                path: target.to_path_buf(),
                source,
            })?;
            log::debug!("Cached {}", target.display());
        }
        touch(target);
        Ok(())
    }

    /// Cache downloaded bytes under `source_key` (normally the source URL).
    ///
    /// The extension is taken from the key; unsupported or missing
    /// extensions fall back to `.png`.
    pub fn cache_bytes(&self, source_key: &str, bytes: &[u8]) -> Result<PathBuf, DiskCacheError> {
        if bytes.is_empty() {
            return Err(DiskCacheError::Empty(source_key.to_string()));
        }
        let extension = source_extension(source_key)
            .filter(|ext| is_supported_extension(ext))
            .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());

        let target = self.path_for(source_key, &extension);
        self.store(&target, |path| std::fs::write(path, bytes))?;
        Ok(target)
    }

    /// Copy a local image into the cache, keyed by its path.
    pub fn cache_file(&self, source: &Path) -> Result<PathBuf, DiskCacheError> {
        let key = source.to_string_lossy();
        let extension = source
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !is_supported_extension(&extension) {
            return Err(DiskCacheError::UnsupportedExtension(extension));
        }
        if !source.is_file() {
            return Err(DiskCacheError::SourceMissing(source.to_path_buf()));
        }

        let target = self.path_for(&key, &extension);
        self.store(&target, |path| std::fs::copy(source, path).map(|_| ()))?;
        Ok(target)
    }

    /// Refresh the access time of a file read back from the cache.
    ///
    /// Returns `false`, leaving the file alone, for paths outside the root.
    pub fn touch(&self, path: &Path) -> bool {
        if !path.starts_with(&self.root) {
            return false;
        }
        touch(path);
        true
    }

    /// All files under the root, recursively. Unreadable entries are skipped.
    #[must_use]
    pub fn entries(&self) -> Vec<CacheEntry> {
        if !self.root.exists() {
            return Vec::new();
        }

        let paths: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    log::warn!("Skipping unreadable cache entry: {err}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .collect();

        paths
            .into_par_iter()
            .filter_map(|path| match std::fs::metadata(&path) {
                Ok(metadata) => {
                    let accessed = access_time(&metadata);
                    Some(CacheEntry::new(path, metadata.len(), accessed))
                }
                Err(err) => {
                    log::warn!("Skipping {}: {}", path.display(), err);
                    None
                }
            })
            .collect()
    }

    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.entries().iter().map(|entry| entry.size).sum()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries();
        let oldest = entries.iter().map(|entry| entry.accessed).min();
        let newest = entries.iter().map(|entry| entry.accessed).max();
        CacheStats {
            root: self.root.clone(),
            files: entries.len(),
            total_size: entries.iter().map(|entry| entry.size).sum(),
            capacity: self.capacity,
            oldest_access: oldest.map(super::entry::rfc3339),
            newest_access: newest.map(super::entry::rfc3339),
        }
    }

    /// Delete least-recently-accessed files until the cache fits its capacity.
    ///
    /// Per-file failures are logged and recorded; the sweep continues with
    /// the next file. A cancelled token stops the sweep between files.
    pub fn enforce_capacity(&self, cancel: Option<&CancelToken>) -> EvictionReport {
        let mut entries = self.entries();
        let size_before: u64 = entries.iter().map(|entry| entry.size).sum();
        let mut report = EvictionReport {
            capacity: self.capacity,
            size_before,
            size_after: size_before,
            ..EvictionReport::default()
        };

        if size_before <= self.capacity {
            log::debug!(
                "Image cache at {} is within capacity ({} of {})",
                self.root.display(),
                ByteSize::b(size_before),
                ByteSize::b(self.capacity)
            );
            return report;
        }

        let to_delete = size_before - self.capacity;
        let mut deleted_bytes = 0u64;
        entries.sort_by(|a, b| a.accessed.cmp(&b.accessed).then_with(|| a.path.cmp(&b.path)));

        for entry in entries {
            if deleted_bytes >= to_delete {
                break;
            }
            if cancel.is_some_and(CancelToken::is_cancelled) {
                log::info!("Cache sweep cancelled");
                report.cancelled = true;
                break;
            }

            match std::fs::remove_file(&entry.path) {
                Ok(()) => {
                    log::debug!("Deleted cached file: {}", entry.file_name());
                    deleted_bytes += entry.size;
                    report.deleted.push(entry);
                }
                Err(err) => {
                    log::warn!("Error deleting cache file {}: {}", entry.file_name(), err);
                    report.failed.push((entry.path, err.to_string()));
                }
            }
        }

        report.size_after = size_before - deleted_bytes;
        log::info!(
            "Evicted {} cached files ({}), cache now {} of {}",
            report.deleted.len(),
            ByteSize::b(deleted_bytes),
            ByteSize::b(report.size_after),
            ByteSize::b(self.capacity)
        );
        report
    }
}
