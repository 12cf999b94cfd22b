use bingoboard::board::BoardState;
use bingoboard::cli::Cli;
use bingoboard::error::ExitCode;
use bingoboard::run_app;
use clap::Parser;
use image::{DynamicImage, ImageFormat};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self { dir: tempdir().unwrap() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn board(&self) -> PathBuf {
        self.path("board.bingo.json")
    }

    fn cache_dir(&self) -> PathBuf {
        self.path("cache")
    }

    /// Run the CLI against a config file that does not exist, so only
    /// defaults and the given flags apply.
    fn run(&self, args: &[&str]) -> anyhow::Result<ExitCode> {
        let config = self.path("config.toml");
        let cache = self.cache_dir();
        let mut argv: Vec<String> = vec![
            "bingoboard".into(),
            "-q".into(),
            "--no-color".into(),
            "--config".into(),
            config.display().to_string(),
            "--cache-dir".into(),
            cache.display().to_string(),
        ];
        argv.extend(args.iter().map(|arg| arg.to_string()));
        run_app(Cli::try_parse_from(argv).unwrap())
    }

    fn run_ok(&self, args: &[&str]) {
        assert_eq!(self.run(args).unwrap(), ExitCode::Success, "{args:?}");
    }

    fn board_arg(&self) -> String {
        self.board().display().to_string()
    }

    fn load(&self) -> BoardState {
        BoardState::load(&self.board()).unwrap()
    }
}

fn write_png(path: &Path) {
    DynamicImage::new_rgba8(3, 3)
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

#[test]
fn test_edit_score_and_export_workflow() {
    let ws = Workspace::new();
    let board = ws.board_arg();

    ws.run_ok(&["new", &board, "--size", "3"]);
    ws.run_ok(&["set", &board, "A1", "--title", "Zulrah", "--points", "5"]);
    ws.run_ok(&["set", &board, "B1", "--title", "Vorkath", "--points", "10"]);
    ws.run_ok(&["set", &board, "C1", "--points", "1", "--background", "#336699"]);
    ws.run_ok(&["bonus", &board, "--row", "1", "20"]);
    ws.run_ok(&["bonus", &board, "--column", "b", "7"]);
    ws.run_ok(&["toggle", &board, "A1", "B1", "c1"]);
    ws.run_ok(&["score", &board, "--format", "json"]);

    let state = ws.load();
    assert_eq!(state.row_bonus(0), 20);
    assert_eq!(state.column_bonus(1), 7);
    assert!(state.is_row_complete(0));
    assert_eq!(state.tile((0, 2)).unwrap().background.0, 0xFF33_6699);

    let csv_path = ws.path("board.csv");
    ws.run_ok(&["export", &board, "-o", &csv_path.display().to_string()]);
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with(",A,B,C\r\n1,Zulrah (5 Pts),Vorkath (10 Pts), (1 Pts)\r\n"));

    let json_path = ws.path("scores.json");
    ws.run_ok(&["export", &board, "-f", "json", "-o", &json_path.display().to_string()]);
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(report["rows"][0]["gained"], 36);
    assert_eq!(report["summary"]["bonus_gained"], 20);
}

#[test]
fn test_new_refuses_to_overwrite_without_force() {
    let ws = Workspace::new();
    let board = ws.board_arg();
    ws.run_ok(&["new", &board]);
    ws.run_ok(&["set", &board, "A1", "--title", "Keep me"]);

    assert!(ws.run(&["new", &board]).is_err());
    assert_eq!(ws.load().tile((0, 0)).unwrap().title, "Keep me");

    ws.run_ok(&["new", &board, "--force", "--rows", "4", "--columns", "6"]);
    let state = ws.load();
    assert_eq!((state.rows(), state.columns()), (4, 6));
    assert!(!state.tile((0, 0)).unwrap().has_data());
}

#[test]
fn test_resize_with_yes_drops_truncated_tiles() {
    let ws = Workspace::new();
    let board = ws.board_arg();
    ws.run_ok(&["new", &board, "--size", "5"]);
    ws.run_ok(&["set", &board, "E5", "--title", "Corner"]);
    ws.run_ok(&["set", &board, "A1", "--title", "Kept"]);

    ws.run_ok(&["resize", &board, "3", "--yes"]);

    let state = ws.load();
    assert_eq!(state.rows(), 3);
    assert_eq!(state.tile((0, 0)).unwrap().title, "Kept");
    assert!(ws.run(&["resize", &board, "20", "--yes"]).is_err());
}

#[test]
fn test_clear_keeps_size() {
    let ws = Workspace::new();
    let board = ws.board_arg();
    ws.run_ok(&["new", &board, "--size", "4"]);
    ws.run_ok(&["set", &board, "D4", "--title", "Gone soon", "--points", "3"]);
    ws.run_ok(&["bonus", &board, "--row", "4", "9"]);

    ws.run_ok(&["clear", &board]);

    assert_eq!(ws.load(), BoardState::new(4).unwrap());
}

#[test]
fn test_set_tile_pieces_complete_the_tile() {
    let ws = Workspace::new();
    let board = ws.board_arg();
    ws.run_ok(&["new", &board]);
    ws.run_ok(&["set-tile", &board, "C3"]);

    for piece in ["1", "2", "3"] {
        ws.run_ok(&["set-piece", &board, "C3", piece, "dharok"]);
    }
    assert!(!ws.load().tile((2, 2)).unwrap().completed);

    ws.run_ok(&["set-piece", &board, "C3", "4", "2"]);
    let state = ws.load();
    let tile = state.tile((2, 2)).unwrap();
    assert!(tile.is_set_tile());
    assert!(tile.completed);

    assert!(ws.run(&["set-piece", &board, "C3", "5", "dharok"]).is_err());
    assert!(ws.run(&["set-piece", &board, "A1", "1", "dharok"]).is_err());
}

#[test]
fn test_set_image_copies_into_cache() {
    let ws = Workspace::new();
    let board = ws.board_arg();
    let source = ws.path("whip.png");
    write_png(&source);
    ws.run_ok(&["new", &board]);

    ws.run_ok(&[
        "set",
        &board,
        "B2",
        "--image",
        &source.display().to_string(),
        "--url",
        "https://oldschool.runescape.wiki/images/Abyssal_whip.png",
    ]);

    let state = ws.load();
    let image = &state.tile((1, 1)).unwrap().image;
    let cached = image.path.clone().unwrap();
    assert!(cached.starts_with(ws.cache_dir()));
    assert!(cached.exists());
    assert_eq!(
        image.url.as_deref(),
        Some("https://oldschool.runescape.wiki/images/Abyssal_whip.png")
    );

    ws.run_ok(&["set", &board, "B2", "--clear-image"]);
    assert!(ws.load().tile((1, 1)).unwrap().image.is_empty());
}

#[test]
fn test_set_rejects_files_that_are_not_images() {
    let ws = Workspace::new();
    let board = ws.board_arg();
    let fake = ws.path("notes.png");
    fs::write(&fake, "not an image").unwrap();
    ws.run_ok(&["new", &board]);

    assert!(ws
        .run(&["set", &board, "A1", "--image", &fake.display().to_string()])
        .is_err());
    assert!(ws.load().tile((0, 0)).unwrap().image.is_empty());
}

#[test]
fn test_invalid_document_maps_to_its_exit_code() {
    let ws = Workspace::new();
    fs::write(ws.board(), r#"{"Tiles": null, "RowBonuses": [], "ColumnBonuses": [], "Rows": 3, "Columns": 3}"#)
        .unwrap();

    let err = ws.run(&["score", &ws.board_arg()]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::InvalidDocument);
}

#[test]
fn test_cache_add_stats_and_clean() {
    let ws = Workspace::new();
    let first = ws.path("first.png");
    let second = ws.path("second.bmp");
    write_png(&first);
    DynamicImage::new_rgb8(3, 3)
        .save_with_format(&second, ImageFormat::Bmp)
        .unwrap();

    ws.run_ok(&[
        "cache",
        "add",
        &first.display().to_string(),
        &second.display().to_string(),
    ]);
    ws.run_ok(&["cache", "stats", "--format", "json"]);
    assert_eq!(fs::read_dir(ws.cache_dir()).unwrap().count(), 2);

    let missing = ws.path("missing.png").display().to_string();
    assert_eq!(
        ws.run(&["cache", "add", &missing]).unwrap(),
        ExitCode::PartialSuccess
    );

    assert_eq!(
        ws.run(&["--cache-capacity", "0", "cache", "clean"]).unwrap(),
        ExitCode::Success
    );
    assert_eq!(fs::read_dir(ws.cache_dir()).unwrap().count(), 0);
}
