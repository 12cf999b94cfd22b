use bingoboard::board::{Argb, BoardState, ImageRef};
use bingoboard::document::{BoardDocument, DocumentError};
use bingoboard::error::ExitCode;
use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;

fn sample_board() -> BoardState {
    let mut board = BoardState::with_dimensions(3, 4).unwrap();
    board.set_title((0, 0), "Zulrah, solo").unwrap();
    board.set_points((0, 0), 12).unwrap();
    board.toggle_completed((0, 0)).unwrap();
    board
        .set_image(
            (0, 1),
            ImageRef::remote("/cache/abc.png", "https://oldschool.runescape.wiki/images/Whip.png"),
        )
        .unwrap();
    board.set_background((2, 3), Argb(0x8000_FF00)).unwrap();
    board.toggle_set_tile((1, 2)).unwrap();
    board.toggle_set_piece((1, 2), 0, 5).unwrap();
    board.set_row_bonus(1, 7).unwrap();
    board.set_column_bonus(3, 99).unwrap();
    board
}

#[test]
fn test_save_and_load_preserves_board() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("raid.bingo.json");
    let board = sample_board();

    board.save(&path).unwrap();
    let loaded = BoardState::load(&path).unwrap();

    assert_eq!(loaded, board);
}

#[test]
fn test_document_uses_pascal_case_layout() {
    let json = sample_board().to_json().unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["Rows"], 3);
    assert_eq!(value["Columns"], 4);
    assert_eq!(value["RowBonuses"], json!([0, 7, 0]));
    assert_eq!(value["ColumnBonuses"], json!([0, 0, 0, 99]));

    let tile = &value["Tiles"][0][0];
    assert_eq!(tile["Row"], 0);
    assert_eq!(tile["Column"], 0);
    assert_eq!(tile["Title"], "Zulrah, solo");
    assert_eq!(tile["Points"], 12);
    assert_eq!(tile["IsCompleted"], true);
    assert_eq!(tile["BackgroundColourArgb"], 16_777_215);

    let image_tile = &value["Tiles"][0][1];
    assert_eq!(
        image_tile["ImageUrl"],
        "https://oldschool.runescape.wiki/images/Whip.png"
    );

    let set_tile = &value["Tiles"][1][2];
    assert_eq!(set_tile["CompletionState"][0][5], true);
    assert_eq!(set_tile["CompletionState"].as_array().unwrap().len(), 4);
}

#[test]
fn test_load_accepts_documents_without_optional_fields() {
    let tile = |row: usize, column: usize| {
        json!({
            "Row": row,
            "Column": column,
            "CompletionState": vec![vec![false; 6]; 4],
        })
    };
    let tiles: Vec<Vec<Value>> = (0..3)
        .map(|row| (0..3).map(|column| tile(row, column)).collect())
        .collect();
    let document = json!({
        "Tiles": tiles,
        "RowBonuses": [1, 2, 3],
        "ColumnBonuses": [4, 5, 6],
        "Rows": 3,
        "Columns": 3,
    });

    let board = BoardState::from_json(&document.to_string()).unwrap();
    assert_eq!(board.row_bonus(2), 3);
    assert_eq!(board.column_bonus(0), 4);
    assert!(board.tiles().all(|tile| !tile.has_data() && !tile.completed));
}

#[test]
fn test_set_tiles_are_recognised_in_older_documents() {
    let mut value: Value = serde_json::from_str(&sample_board().to_json().unwrap()).unwrap();
    for row in value["Tiles"].as_array_mut().unwrap() {
        for tile in row.as_array_mut().unwrap() {
            tile.as_object_mut().unwrap().remove("IsSetTile");
        }
    }

    let board = BoardState::from_json(&value.to_string()).unwrap();
    assert!(board.tile((1, 2)).unwrap().is_set_tile());
    assert!(!board.tile((0, 0)).unwrap().is_set_tile());
}

fn document_error(json: &Value) -> DocumentError {
    let err = BoardState::from_json(&json.to_string()).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::InvalidDocument);
    err.chain()
        .find_map(|cause| cause.downcast_ref::<DocumentError>())
        .cloned()
        .unwrap()
}

fn valid_document() -> Value {
    serde_json::from_str(&BoardState::new(3).unwrap().to_json().unwrap()).unwrap()
}

#[test]
fn test_structural_problems_are_rejected() {
    let mut missing_tiles = valid_document();
    missing_tiles["Tiles"] = Value::Null;
    assert_eq!(document_error(&missing_tiles), DocumentError::MissingTiles);

    let mut bonus_mismatch = valid_document();
    bonus_mismatch["RowBonuses"] = json!([0, 0]);
    assert!(matches!(
        document_error(&bonus_mismatch),
        DocumentError::RowBonusMismatch { expected: 3, found: 2 }
    ));

    let mut null_tile = valid_document();
    null_tile["Tiles"][2][1] = Value::Null;
    assert!(matches!(
        document_error(&null_tile),
        DocumentError::NullTile { row: 2, column: 1 }
    ));

    let mut too_small = valid_document();
    too_small["Rows"] = json!(2);
    assert!(matches!(
        document_error(&too_small),
        DocumentError::InvalidDimensions { rows: 2, .. }
    ));

    let mut bad_points = valid_document();
    bad_points["Tiles"][0][0]["Points"] = json!(-1);
    assert!(matches!(
        document_error(&bad_points),
        DocumentError::InvalidPoints { points: -1, .. }
    ));
}

#[test]
fn test_malformed_json_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.bingo.json");
    fs::write(&path, "{ \"Rows\": 3, ").unwrap();

    let err = BoardState::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("broken.bingo.json"));
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(BoardState::load(&dir.path().join("nope.bingo.json")).is_err());
}

#[test]
fn test_document_struct_roundtrip() {
    let board = sample_board();
    let document = BoardDocument::from(&board);
    assert_eq!(document.rows, 3);
    assert_eq!(document.columns, 4);
    assert_eq!(BoardState::try_from(document).unwrap(), board);
}
