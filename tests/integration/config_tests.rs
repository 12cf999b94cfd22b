//! Integration tests for the configuration stack: defaults, TOML files and
//! `BINGOBOARD_*` environment overrides.

use bingoboard::cache::DEFAULT_CAPACITY;
use bingoboard::config::{Config, RemoteConfig};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all BINGOBOARD_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("BINGOBOARD_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_missing_file_gives_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();

    let config = Config::load_from_path(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.cache_capacity, DEFAULT_CAPACITY);
}

#[test]
fn test_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
cache_dir = "/srv/bingo/cache"
cache_capacity = 5242880
worker_threads = 4

[remote]
search_limit = 30
upload_client_id = "abc123"
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.cache_dir, Some(PathBuf::from("/srv/bingo/cache")));
    assert_eq!(config.cache_capacity, 5 * 1024 * 1024);
    assert_eq!(config.worker_threads, 4);
    assert_eq!(config.remote.search_limit, 30);
    assert_eq!(config.remote.upload_client_id.as_deref(), Some("abc123"));
    assert_eq!(config.remote.timeout_secs, RemoteConfig::default().timeout_secs);
}

#[test]
fn test_environment_overrides_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "worker_threads = 4\n[remote]\nsearch_limit = 30\n").unwrap();

    std::env::set_var("BINGOBOARD_WORKER_THREADS", "8");
    std::env::set_var("BINGOBOARD_REMOTE__SEARCH_LIMIT", "3");
    let config = Config::load_from_path(&path);
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.worker_threads, 8);
    assert_eq!(config.remote.search_limit, 3);
}

#[test]
fn test_invalid_toml_is_an_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "cache_capacity = \"lots\"\n").unwrap();

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("config.toml"));
}

#[test]
fn test_save_then_load() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let config = Config {
        cache_dir: Some(dir.path().join("images")),
        cache_capacity: 1_000,
        worker_threads: 1,
        remote: RemoteConfig {
            search_limit: 5,
            ..RemoteConfig::default()
        },
    };
    config.save(&path).unwrap();

    assert_eq!(Config::load_from_path(&path).unwrap(), config);
}

#[test]
fn test_cache_root_defaults_to_shared_wiki_cache() {
    let config = Config::default();
    if let Ok(root) = config.cache_root() {
        assert!(root.ends_with("OsrsBingoCreator/WikiImageCache"));
    }
}
