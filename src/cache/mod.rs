//! Image caching.
//!
//! * [`memory`]: decoded images keyed by path, shared as `Arc` handles and
//!   re-validated on every lookup.
//! * [`disk`]: downloaded and copied image files named by the BLAKE3 hash of
//!   their source, bounded in size by least-recently-accessed eviction.
//! * [`entry`]: metadata of one cached file.

pub mod disk;
pub mod entry;
pub mod memory;

pub use disk::{CacheStats, DiskCache, DiskCacheError, EvictionReport, DEFAULT_CAPACITY};
pub use entry::CacheEntry;
pub use memory::{CachedImage, ImageCache, ImageCacheError};
