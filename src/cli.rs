//! Command-line interface definitions.
//!
//! Every board command takes the `.bingo.json` file as its first argument,
//! loads it, applies one change and saves it back.
//!
//! # Example
//!
//! ```bash
//! # Create a 5x5 board and fill in a tile
//! bingoboard new raids.bingo.json --size 5
//! bingoboard set raids.bingo.json B3 --title "Twisted bow" --points 10
//!
//! # Mark it done and look at the scores
//! bingoboard toggle raids.bingo.json B3
//! bingoboard score raids.bingo.json
//!
//! # Find an image on the wiki and put it on a tile
//! bingoboard search "dragon claws" --pick 1 --board raids.bingo.json --cell C1
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Achievement bingo board builder and tracker.
///
/// Boards are square or rectangular grids of tiles with point values, row and
/// column bonuses, and optional images fetched from the wiki.
#[derive(Debug, Parser)]
#[command(name = "bingoboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Image cache directory
    #[arg(long, global = true, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Image cache capacity (e.g. 100MiB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, global = true, value_name = "SIZE", value_parser = parse_size)]
    pub cache_capacity: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new empty board
    New(NewArgs),
    /// Change the board size, confirming before tiles with data are dropped
    Resize(ResizeArgs),
    /// Reset every tile and bonus, keeping the size
    Clear(BoardArg),
    /// Edit one tile
    Set(SetArgs),
    /// Toggle completion of one or more tiles
    Toggle(ToggleArgs),
    /// Set a row or column bonus
    Bonus(BonusArgs),
    /// Turn a tile into a set-collection tile, or back
    SetTile(CellArgs),
    /// Toggle one piece of a set-collection tile
    SetPiece(SetPieceArgs),
    /// Show row, column and board scores
    Score(ScoreArgs),
    /// Export the board
    Export(ExportArgs),
    /// Search the wiki for images
    Search(SearchArgs),
    /// Fetch wiki images for tiles in the background
    Fetch(FetchArgs),
    /// Upload a tile's image to the image host
    Upload(CellArgs),
    /// Inspect or maintain the image cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Debug, Args)]
pub struct BoardArg {
    /// Board file
    #[arg(value_name = "BOARD")]
    pub board: PathBuf,
}

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Board file to create
    #[arg(value_name = "BOARD")]
    pub board: PathBuf,

    /// Rows and columns of a square board (3-15)
    #[arg(short, long, default_value = "5", conflicts_with_all = ["rows", "columns"])]
    pub size: usize,

    /// Number of rows (3-15), for rectangular boards
    #[arg(long, requires = "columns")]
    pub rows: Option<usize>,

    /// Number of columns (3-15), for rectangular boards
    #[arg(long, requires = "rows")]
    pub columns: Option<usize>,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct ResizeArgs {
    #[arg(value_name = "BOARD")]
    pub board: PathBuf,

    /// New rows and columns (3-15)
    #[arg(value_name = "SIZE")]
    pub size: usize,

    /// Drop tiles with data without asking
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct CellArgs {
    #[arg(value_name = "BOARD")]
    pub board: PathBuf,

    /// Tile label, e.g. B3 (column letter, row number)
    #[arg(value_name = "CELL")]
    pub cell: String,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    #[arg(value_name = "BOARD")]
    pub board: PathBuf,

    /// Tile label, e.g. B3
    #[arg(value_name = "CELL")]
    pub cell: String,

    /// Tile title
    #[arg(long)]
    pub title: Option<String>,

    /// Tile points (0-999)
    #[arg(long)]
    pub points: Option<u32>,

    /// Local image file (.png, .jpg, .jpeg, .bmp); copied into the image cache
    #[arg(long, value_name = "PATH", conflicts_with = "clear_image")]
    pub image: Option<PathBuf>,

    /// Remote URL recorded with the image
    #[arg(long, value_name = "URL", conflicts_with = "clear_image")]
    pub url: Option<String>,

    /// Remove the tile image
    #[arg(long)]
    pub clear_image: bool,

    /// Background colour as #RRGGBB or #AARRGGBB, or "none"
    #[arg(long, value_name = "COLOUR")]
    pub background: Option<String>,
}

#[derive(Debug, Args)]
pub struct ToggleArgs {
    #[arg(value_name = "BOARD")]
    pub board: PathBuf,

    /// Tile labels, e.g. A1 B2
    #[arg(value_name = "CELL", required = true)]
    pub cells: Vec<String>,
}

#[derive(Debug, Args)]
#[command(group(clap::ArgGroup::new("line").required(true).args(["row", "column"])))]
pub struct BonusArgs {
    #[arg(value_name = "BOARD")]
    pub board: PathBuf,

    /// Row number (1-based)
    #[arg(long)]
    pub row: Option<usize>,

    /// Column letter
    #[arg(long)]
    pub column: Option<String>,

    /// Bonus points (0-999)
    #[arg(value_name = "BONUS")]
    pub bonus: u32,
}

#[derive(Debug, Args)]
pub struct SetPieceArgs {
    #[arg(value_name = "BOARD")]
    pub board: PathBuf,

    /// Tile label of the set tile
    #[arg(value_name = "CELL")]
    pub cell: String,

    /// Piece row (1-4)
    #[arg(value_name = "PIECE")]
    pub piece: usize,

    /// Item set, by number (1-6) or by name prefix (e.g. "dharok")
    #[arg(value_name = "SET")]
    pub set: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ReportFormat {
    /// Coloured table for terminals
    #[default]
    Table,
    /// JSON for scripting
    Json,
}

#[derive(Debug, Args)]
pub struct ScoreArgs {
    #[arg(value_name = "BOARD")]
    pub board: PathBuf,

    #[arg(short, long, value_enum, default_value = "table")]
    pub format: ReportFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Board grid for spreadsheets
    Csv,
    /// JSON score report
    Json,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[arg(value_name = "BOARD")]
    pub board: PathBuf,

    #[arg(short, long, value_enum, default_value = "csv")]
    pub format: ExportFormat,

    /// Output file (stdout when omitted)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Search terms
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Preview the Nth result (1-based) and cache its image
    #[arg(long, value_name = "N")]
    pub pick: Option<usize>,

    /// Board to put the picked image on
    #[arg(long, value_name = "BOARD", requires_all = ["pick", "cell"])]
    pub board: Option<PathBuf>,

    /// Tile to put the picked image on
    #[arg(long, value_name = "CELL", requires = "board")]
    pub cell: Option<String>,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    #[arg(value_name = "BOARD")]
    pub board: PathBuf,

    /// Assignments such as B3="Dragon claws"
    #[arg(value_name = "CELL=TITLE", required = true, value_parser = parse_assignment)]
    pub assignments: Vec<(String, String)>,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommands {
    /// Show cache size and capacity
    Stats {
        #[arg(short, long, value_enum, default_value = "table")]
        format: ReportFormat,
    },
    /// Evict least-recently-used images until the cache fits its capacity
    Clean,
    /// Copy local images into the cache
    Add {
        #[arg(value_name = "IMAGE", required = true)]
        images: Vec<PathBuf>,
    },
}

impl Commands {
    /// Commands that read or write cached images.
    #[must_use]
    pub fn uses_image_cache(&self) -> bool {
        matches!(
            self,
            Commands::Set(_) | Commands::Search(_) | Commands::Fetch(_) | Commands::Upload(_)
        )
    }
}

/// Parse `CELL=TITLE`.
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (cell, title) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected CELL=TITLE, got '{s}'"))?;
    let (cell, title) = (cell.trim(), title.trim());
    if cell.is_empty() || title.is_empty() {
        return Err(format!("Expected CELL=TITLE, got '{s}'"));
    }
    Ok((cell.to_string(), title.to_string()))
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// ```
/// use bingoboard::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("100MiB").unwrap(), 104_857_600);
/// ```
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
