//! Files held by the on-disk image cache.

use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One cached image file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntry {
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Last access time; eviction removes the oldest first.
    #[serde(serialize_with = "serialize_time")]
    pub accessed: SystemTime,
}

impl CacheEntry {
    #[must_use]
    pub fn new(path: PathBuf, size: u64, accessed: SystemTime) -> Self {
        Self {
            path,
            size,
            accessed,
        }
    }

    /// Access time in RFC 3339 form.
    #[must_use]
    pub fn accessed_rfc3339(&self) -> String {
        rfc3339(self.accessed)
    }

    /// File name without the cache directory, for display.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub(crate) fn rfc3339(time: SystemTime) -> String {
    let datetime: DateTime<Utc> = time.into();
    datetime.to_rfc3339()
}

fn serialize_time<S: serde::Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&rfc3339(*time))
}
