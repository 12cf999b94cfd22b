use bingoboard::cache::disk::key_file_name;
use bingoboard::cache::{CachedImage, DiskCache, DiskCacheError, ImageCache, ImageCacheError};
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tempfile::tempdir;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgba8(RgbaImage::new(width, height));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

fn write_png(path: &Path) {
    fs::write(path, png_bytes(4, 3)).unwrap();
}

#[test]
fn test_downloaded_bytes_are_named_by_source_url() {
    let dir = tempdir().unwrap();
    let cache = DiskCache::new(dir.path().join("WikiImageCache"), 1024 * 1024);
    let url = "https://oldschool.runescape.wiki/images/Abyssal_whip.png?5d1b2";

    let path = cache.cache_bytes(url, &png_bytes(2, 2)).unwrap();

    assert_eq!(path.parent().unwrap(), cache.root());
    assert_eq!(
        path.file_name().unwrap().to_string_lossy(),
        key_file_name(url, "png")
    );
    assert_eq!(cache.cache_bytes(url, &png_bytes(2, 2)).unwrap(), path);
    assert_eq!(cache.entries().len(), 1);
}

#[test]
fn test_unknown_extensions_fall_back_to_png() {
    let dir = tempdir().unwrap();
    let cache = DiskCache::new(dir.path(), 1024 * 1024);

    let path = cache
        .cache_bytes("https://example.com/render.webp", b"bytes")
        .unwrap();
    assert_eq!(path.extension().unwrap(), "png");

    let jpeg = cache
        .cache_bytes("https://example.com/photo.JPG", b"bytes")
        .unwrap();
    assert_eq!(jpeg.extension().unwrap(), "jpg");
}

#[test]
fn test_empty_downloads_are_rejected() {
    let dir = tempdir().unwrap();
    let cache = DiskCache::new(dir.path(), 1024);
    assert!(matches!(
        cache.cache_bytes("https://example.com/a.png", &[]),
        Err(DiskCacheError::Empty(_))
    ));
    assert!(cache.entries().is_empty());
}

#[test]
fn test_local_files_are_copied_into_the_cache() {
    let source_dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let source = source_dir.path().join("Dragon claws.PNG");
    write_png(&source);

    let cache = DiskCache::new(cache_dir.path(), 1024 * 1024);
    let cached = cache.cache_file(&source).unwrap();

    assert!(cached.starts_with(cache_dir.path()));
    assert_eq!(fs::read(&cached).unwrap(), fs::read(&source).unwrap());
    assert_eq!(cache.stats().files, 1);
}

#[test]
fn test_cache_file_rejects_unsupported_or_missing_sources() {
    let dir = tempdir().unwrap();
    let cache = DiskCache::new(dir.path().join("cache"), 1024);

    let gif = dir.path().join("spinner.gif");
    fs::write(&gif, b"GIF89a").unwrap();
    assert!(matches!(
        cache.cache_file(&gif),
        Err(DiskCacheError::UnsupportedExtension(ext)) if ext == "gif"
    ));
    assert!(matches!(
        cache.cache_file(&dir.path().join("gone.png")),
        Err(DiskCacheError::SourceMissing(_))
    ));
}

#[test]
fn test_stats_report_size_against_capacity() {
    let dir = tempdir().unwrap();
    let cache = DiskCache::new(dir.path(), 10);
    cache.cache_bytes("https://example.com/a.png", &[1; 8]).unwrap();
    cache.cache_bytes("https://example.com/b.png", &[1; 8]).unwrap();

    let stats = cache.stats();
    assert_eq!(stats.files, 2);
    assert_eq!(stats.total_size, 16);
    assert!(stats.is_over_capacity());
    assert!(stats.oldest_access.is_some());
}

#[test]
fn test_stats_of_missing_directory_are_empty() {
    let dir = tempdir().unwrap();
    let cache = DiskCache::new(dir.path().join("never-created"), 10);
    let stats = cache.stats();
    assert_eq!(stats.files, 0);
    assert_eq!(stats.total_size, 0);
    assert!(stats.oldest_access.is_none());
}

#[test]
fn test_memory_cache_shares_decoded_images() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tile.png");
    write_png(&path);

    let mut images = ImageCache::new();
    let first = images.get_or_open(&path).unwrap();
    let second = images.get_or_open(&path).unwrap();

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!((first.width(), first.height()), (4, 3));
    assert_eq!(first.format(), ImageFormat::Png);
    assert_eq!(images.len(), 1);
}

#[test]
fn test_memory_cache_rejects_undecodable_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("not-really.png");
    fs::write(&path, b"plain text").unwrap();

    let mut images = ImageCache::new();
    assert!(images.get_or_open(&path).is_err());
    assert!(images.is_empty());
    assert!(matches!(
        images.get_or_open(&dir.path().join("missing.png")),
        Err(ImageCacheError::Io { .. })
    ));
}

#[test]
fn test_decode_detects_format_from_content() {
    let image = CachedImage::decode(&png_bytes(1, 1)).unwrap();
    assert!(image.is_valid());
    assert_eq!(image.format(), ImageFormat::Png);
    assert!(CachedImage::decode(b"").is_err());
}
