use bingoboard::cache::DiskCache;
use bingoboard::signal::CancelToken;
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn cached_file(root: &Path, name: &str, size: usize, accessed_secs: i64) -> PathBuf {
    let path = root.join(name);
    fs::write(&path, vec![7u8; size]).unwrap();
    filetime::set_file_atime(&path, FileTime::from_unix_time(accessed_secs, 0)).unwrap();
    path
}

#[test]
fn test_eviction_removes_least_recently_accessed_first() {
    let dir = tempdir().unwrap();
    let oldest = cached_file(dir.path(), "oldest.png", 40, 1_000);
    let middle = cached_file(dir.path(), "middle.png", 40, 2_000);
    let newest = cached_file(dir.path(), "newest.png", 40, 3_000);

    let cache = DiskCache::new(dir.path(), 90);
    let report = cache.enforce_capacity(None);

    assert_eq!(report.size_before, 120);
    assert_eq!(report.bytes_deleted(), 40);
    assert_eq!(report.size_after, 80);
    assert!(!oldest.exists());
    assert!(middle.exists());
    assert!(newest.exists());
}

#[test]
fn test_eviction_deletes_until_overshoot_is_covered() {
    let dir = tempdir().unwrap();
    cached_file(dir.path(), "a.png", 10, 100);
    cached_file(dir.path(), "b.png", 10, 200);
    cached_file(dir.path(), "c.png", 50, 300);
    let keep = cached_file(dir.path(), "d.png", 50, 400);

    let cache = DiskCache::new(dir.path(), 60);
    let report = cache.enforce_capacity(None);

    let deleted: Vec<String> = report.deleted.iter().map(|entry| entry.file_name()).collect();
    assert_eq!(deleted, vec!["a.png", "b.png", "c.png"]);
    assert_eq!(report.size_after, 50);
    assert!(keep.exists());
    assert!(report.size_after <= cache.capacity());
}

#[test]
fn test_cache_within_capacity_is_untouched() {
    let dir = tempdir().unwrap();
    cached_file(dir.path(), "a.png", 10, 100);
    cached_file(dir.path(), "b.png", 10, 200);

    let report = DiskCache::new(dir.path(), 20).enforce_capacity(None);
    assert!(report.deleted.is_empty());
    assert_eq!(report.size_after, 20);
}

#[test]
fn test_eviction_walks_subdirectories() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("legacy");
    fs::create_dir(&nested).unwrap();
    let old = cached_file(&nested, "old.jpg", 30, 10);
    cached_file(dir.path(), "new.png", 30, 20);

    let report = DiskCache::new(dir.path(), 30).enforce_capacity(None);
    assert_eq!(report.deleted.len(), 1);
    assert!(!old.exists());
}

#[test]
fn test_cancelled_sweep_deletes_nothing() {
    let dir = tempdir().unwrap();
    let a = cached_file(dir.path(), "a.png", 10, 100);
    cached_file(dir.path(), "b.png", 10, 200);

    let token = CancelToken::new();
    token.cancel();
    let report = DiskCache::new(dir.path(), 5).enforce_capacity(Some(&token));

    assert!(report.cancelled);
    assert!(report.deleted.is_empty());
    assert!(a.exists());
}

#[test]
fn test_missing_cache_directory_is_not_an_error() {
    let dir = tempdir().unwrap();
    let report = DiskCache::new(dir.path().join("absent"), 0).enforce_capacity(None);
    assert_eq!(report.size_before, 0);
    assert!(report.deleted.is_empty());
    assert!(report.failed.is_empty());
}

#[test]
fn test_caching_refreshes_access_time_and_protects_from_eviction() {
    let dir = tempdir().unwrap();
    let cache = DiskCache::new(dir.path(), 100);
    let first = cache.cache_bytes("https://example.com/first.png", &[1; 60]).unwrap();
    filetime::set_file_atime(&first, FileTime::from_unix_time(1_000, 0)).unwrap();
    let second = cache.cache_bytes("https://example.com/second.png", &[1; 60]).unwrap();
    filetime::set_file_atime(&second, FileTime::from_unix_time(2_000, 0)).unwrap();

    // Re-caching an existing key only touches it.
    cache.cache_bytes("https://example.com/first.png", &[1; 60]).unwrap();

    let report = cache.enforce_capacity(None);
    assert!(first.exists());
    assert!(!second.exists());
    assert_eq!(report.deleted.len(), 1);
}

#[cfg(unix)]
#[test]
fn test_undeletable_file_is_recorded_and_sweep_continues() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    let stuck = cached_file(&locked, "oldest.png", 40, 1_000);
    let middle = cached_file(dir.path(), "middle.png", 40, 2_000);
    let newest = cached_file(dir.path(), "newest.png", 40, 3_000);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

    // Privileged users can delete from read-only directories.
    let writable = fs::write(locked.join(".write-check"), b"x").is_ok();
    if writable {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let report = DiskCache::new(dir.path(), 90).enforce_capacity(None);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, stuck);
    assert!(stuck.exists());
    assert!(!middle.exists());
    assert!(newest.exists());
    assert_eq!(report.bytes_deleted(), 40);
    assert_eq!(report.size_after, 80);
}

#[test]
fn test_touch_refreshes_cached_files_only() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("cache");
    let cache = DiskCache::new(&root, 100);
    let cached = cache.cache_bytes("https://example.com/a.png", &[1; 10]).unwrap();
    filetime::set_file_atime(&cached, FileTime::from_unix_time(1_000, 0)).unwrap();
    let outside = cached_file(dir.path(), "outside.png", 10, 1_000);

    assert!(cache.touch(&cached));
    assert!(!cache.touch(&outside));

    let accessed = |path: &Path| FileTime::from_last_access_time(&fs::metadata(path).unwrap());
    assert!(accessed(&cached).unix_seconds() > 1_000);
    assert_eq!(accessed(&outside).unix_seconds(), 1_000);
}
