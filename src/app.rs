//! Command dispatch for the `bingoboard` binary.

use std::fs::File;
use std::io::{BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{bail, Context, Result};
use bytesize::ByteSize;

use crate::board::{
    cell_label, column_letter, parse_cell_label, set_image_name, Argb, BoardState, Coord, ImageRef,
    LineScore, ResizeOutcome, ResizePlan, ScoreSheet, SET_COLUMNS, SET_NAMES, SET_ROWS,
};
use crate::cache::{CachedImage, DiskCache, EvictionReport, ImageCache};
use crate::cli::{
    BonusArgs, CacheCommands, Cli, Commands, ExportArgs, ExportFormat, FetchArgs, NewArgs,
    ReportFormat, ResizeArgs, SearchArgs, SetArgs, SetPieceArgs,
};
use crate::config::Config;
use crate::error::ExitCode;
use crate::export::{CsvExport, ScoreReport};
use crate::remote::{
    upload_image_or_absent, ImageHostClient, ImageResolver, ImageSelection, ImageUploader,
    WikiClient,
};
use crate::signal::{self, CancelToken};
use crate::worker::Dispatcher;
use crate::{logging, remote};

/// Run the CLI and return the exit code.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let cancel = signal::install_handler()?;
    let config = load_config(&cli)?;
    let mut app = App::new(config, cancel, cli.quiet);

    let sweep = if cli.command.uses_image_cache() {
        app.spawn_eviction()
    } else {
        None
    };

    let result = app.dispatch(cli.command);

    if let Some(handle) = sweep {
        if handle.join().is_err() {
            log::warn!("Background cache sweep panicked");
        }
    }

    match result {
        Ok(_) if app.cancel.is_cancelled() => Ok(ExitCode::Interrupted),
        other => other,
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load(),
    };
    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = Some(dir.clone());
    }
    if let Some(capacity) = cli.cache_capacity {
        config.cache_capacity = capacity;
    }
    Ok(config)
}

/// Ask before a resize drops tiles that hold data.
///
/// `--yes` accepts; without a terminal the resize is declined.
fn confirm_resize(plan: &ResizePlan, yes: bool) -> bool {
    if yes {
        return true;
    }
    let labels: Vec<String> = plan.lost_tiles.iter().map(|&c| cell_label(c)).collect();
    eprintln!(
        "Resizing to {}x{} will discard data in {} tile(s): {}",
        plan.rows,
        plan.columns,
        labels.len(),
        labels.join(", ")
    );

    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        eprintln!("Not running interactively; pass --yes to confirm.");
        return false;
    }
    eprint!("Continue? [y/N] ");
    let _ = std::io::stderr().flush();
    let mut answer = String::new();
    if stdin.read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn parse_column(letter: &str) -> Result<usize> {
    let (_, column) = parse_cell_label(&format!("{}1", letter.trim()))
        .with_context(|| format!("Invalid column '{letter}'"))?;
    Ok(column)
}

/// Item set index from a 1-based number or a case-insensitive name prefix.
fn parse_set(set: &str) -> Result<usize> {
    if let Ok(number) = set.trim().parse::<usize>() {
        if (1..=SET_COLUMNS).contains(&number) {
            return Ok(number - 1);
        }
        bail!("Set number must be between 1 and {SET_COLUMNS}");
    }
    let wanted = set.trim().to_lowercase();
    SET_NAMES
        .iter()
        .position(|name| !wanted.is_empty() && name.to_lowercase().starts_with(&wanted))
        .with_context(|| format!("Unknown set '{set}' (expected one of {})", SET_NAMES.join(", ")))
}

fn parse_background(colour: &str) -> Result<Argb> {
    if colour.eq_ignore_ascii_case("none") {
        return Ok(Argb::TRANSPARENT);
    }
    Ok(colour.parse()?)
}

/// Plain-text score table.
pub fn render_score_table(board: &BoardState) -> String {
    use yansi::Paint;

    let sheet = ScoreSheet::compute(board);
    let mut out = String::new();

    let line = |label: String, bonus: u32, score: &LineScore| {
        let figures = format!("{:>4} / {:<4}", score.gained, score.total);
        let status = if score.complete {
            "complete".green().to_string()
        } else {
            "open".dim().to_string()
        };
        format!("{label:<10} {figures} bonus {bonus:<4} {status}\n")
    };

    for (row, score) in sheet.rows.iter().enumerate() {
        out.push_str(&line(format!("Row {}", row + 1), board.row_bonus(row), score));
    }
    for (column, score) in sheet.columns.iter().enumerate() {
        out.push_str(&line(
            format!("Column {}", column_letter(column + 1)),
            board.column_bonus(column),
            score,
        ));
    }

    out.push_str(&format!(
        "{} {} / {} points, {} bonus, {} of {} tiles completed\n",
        "Board:".bold(),
        sheet.points_gained,
        sheet.points_total,
        sheet.bonus_gained(board),
        sheet.tiles_completed,
        sheet.tile_count
    ));
    out
}

struct App {
    config: Config,
    cancel: CancelToken,
    quiet: bool,
    images: ImageCache,
}

impl App {
    fn new(config: Config, cancel: CancelToken, quiet: bool) -> Self {
        Self {
            config,
            cancel,
            quiet,
            images: ImageCache::new(),
        }
    }

    fn say(&self, message: impl std::fmt::Display) {
        if !self.quiet {
            println!("{message}");
        }
    }

    fn disk_cache(&self) -> Result<DiskCache> {
        Ok(DiskCache::new(self.config.cache_root()?, self.config.cache_capacity))
    }

    /// Start the capacity sweep on a background thread.
    fn spawn_eviction(&self) -> Option<JoinHandle<EvictionReport>> {
        let cache = match self.disk_cache() {
            Ok(cache) => cache,
            Err(e) => {
                log::warn!("Image cache unavailable, skipping cleanup: {e:#}");
                return None;
            }
        };
        let cancel = self.cancel.clone();
        std::thread::Builder::new()
            .name("bingoboard-cache-sweep".to_string())
            .spawn(move || cache.enforce_capacity(Some(&cancel)))
            .map_err(|e| log::warn!("Could not start cache cleanup: {e}"))
            .ok()
    }

    fn dispatch(&mut self, command: Commands) -> Result<ExitCode> {
        match command {
            Commands::New(args) => self.new_board(&args),
            Commands::Resize(args) => self.resize(&args),
            Commands::Clear(args) => {
                let mut board = BoardState::load(&args.board)?;
                board.clear();
                board.save(&args.board)?;
                self.say(format!("Cleared {}", args.board.display()));
                Ok(ExitCode::Success)
            }
            Commands::Set(args) => self.set(&args),
            Commands::Toggle(args) => {
                let mut board = BoardState::load(&args.board)?;
                let coords = args
                    .cells
                    .iter()
                    .map(|cell| parse_cell_label(cell))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut changes = Vec::with_capacity(coords.len());
                for coord in coords {
                    changes.push((coord, board.toggle_completed(coord)?));
                }
                board.save(&args.board)?;
                for (coord, completed) in changes {
                    let state = if completed { "completed" } else { "not completed" };
                    self.say(format!("{} {}", cell_label(coord), state));
                }
                Ok(ExitCode::Success)
            }
            Commands::Bonus(args) => self.bonus(&args),
            Commands::SetTile(args) => {
                let mut board = BoardState::load(&args.board)?;
                let coord = parse_cell_label(&args.cell)?;
                let is_set = board.toggle_set_tile(coord)?;
                board.save(&args.board)?;
                if is_set {
                    self.say(format!("{} is now a set tile", cell_label(coord)));
                } else {
                    self.say(format!("{} is now a normal tile", cell_label(coord)));
                }
                Ok(ExitCode::Success)
            }
            Commands::SetPiece(args) => self.set_piece(&args),
            Commands::Score(args) => {
                let board = BoardState::load(&args.board)?;
                match args.format {
                    ReportFormat::Table => print!("{}", render_score_table(&board)),
                    ReportFormat::Json => ScoreReport::new(&board).write_to(std::io::stdout())?,
                }
                Ok(ExitCode::Success)
            }
            Commands::Export(args) => self.export(&args),
            Commands::Search(args) => {
                let resolver = WikiClient::new(&self.config.remote)?;
                self.search(&resolver, &args)
            }
            Commands::Fetch(args) => {
                let resolver = Arc::new(WikiClient::new(&self.config.remote)?);
                self.fetch(resolver, &args)
            }
            Commands::Upload(args) => {
                let uploader = ImageHostClient::new(&self.config.remote)?;
                if !uploader.is_configured() {
                    log::warn!("No image host client id configured; set remote.upload_client_id");
                }
                self.upload(&uploader, &args.board, &args.cell)
            }
            Commands::Cache { command } => self.cache(command),
        }
    }

    fn new_board(&self, args: &NewArgs) -> Result<ExitCode> {
        if args.board.exists() && !args.force {
            bail!(
                "{} already exists (use --force to overwrite)",
                args.board.display()
            );
        }
        let (rows, columns) = match (args.rows, args.columns) {
            (Some(rows), Some(columns)) => (rows, columns),
            _ => (args.size, args.size),
        };
        let board = BoardState::with_dimensions(rows, columns)?;
        board.save(&args.board)?;
        self.say(format!(
            "Created {}x{} board at {}",
            rows,
            columns,
            args.board.display()
        ));
        Ok(ExitCode::Success)
    }

    fn resize(&self, args: &ResizeArgs) -> Result<ExitCode> {
        let mut board = BoardState::load(&args.board)?;
        let outcome = board.resize(args.size, |plan| confirm_resize(plan, args.yes))?;
        match outcome {
            ResizeOutcome::Resized => {
                board.save(&args.board)?;
                self.say(format!("Resized to {}x{}", board.rows(), board.columns()));
            }
            ResizeOutcome::Declined => self.say("Resize cancelled; board unchanged"),
            ResizeOutcome::Unchanged => self.say("Board already has that size"),
        }
        Ok(ExitCode::Success)
    }

    /// Validate a local image and copy it into the disk cache.
    ///
    /// The cached copy is used when caching succeeds; otherwise the original
    /// path is kept.
    fn import_image(&mut self, path: &Path) -> Result<PathBuf> {
        self.images
            .get_or_open(path)
            .with_context(|| format!("Cannot use image {}", path.display()))?;

        let cached = self
            .disk_cache()
            .and_then(|cache| Ok(cache.cache_file(path)?));
        match cached {
            Ok(cached) => Ok(cached),
            Err(e) => {
                log::warn!("Could not cache {}, using it in place: {e:#}", path.display());
                Ok(path.to_path_buf())
            }
        }
    }

    fn set(&mut self, args: &SetArgs) -> Result<ExitCode> {
        let mut board = BoardState::load(&args.board)?;
        let coord = parse_cell_label(&args.cell)?;
        board.tile(coord)?;

        if let Some(title) = &args.title {
            board.set_title(coord, title.as_str())?;
        }
        if let Some(points) = args.points {
            board.set_points(coord, points)?;
        }
        if args.clear_image {
            board.clear_image(coord)?;
        }
        if let Some(path) = &args.image {
            let cached = self.import_image(path)?;
            board.set_image(
                coord,
                ImageRef {
                    path: Some(cached),
                    url: args.url.clone(),
                },
            )?;
        } else if let Some(url) = &args.url {
            let mut image = board.tile(coord)?.image.clone();
            image.url = Some(url.clone());
            board.set_image(coord, image)?;
        }
        if let Some(colour) = &args.background {
            board.set_background(coord, parse_background(colour)?)?;
        }

        board.save(&args.board)?;
        let tile = board.tile(coord)?;
        self.say(format!(
            "{}: {} ({} Pts)",
            cell_label(coord),
            tile.title,
            tile.points
        ));
        Ok(ExitCode::Success)
    }

    fn bonus(&self, args: &BonusArgs) -> Result<ExitCode> {
        let mut board = BoardState::load(&args.board)?;
        let label = if let Some(row) = args.row {
            if row == 0 {
                bail!("Row numbers start at 1");
            }
            board.set_row_bonus(row - 1, args.bonus)?;
            format!("Row {row}")
        } else if let Some(column) = &args.column {
            let index = parse_column(column)?;
            board.set_column_bonus(index, args.bonus)?;
            format!("Column {}", column_letter(index + 1))
        } else {
            bail!("Specify --row or --column");
        };
        board.save(&args.board)?;
        self.say(format!("{label} bonus set to {}", args.bonus));
        Ok(ExitCode::Success)
    }

    fn set_piece(&self, args: &SetPieceArgs) -> Result<ExitCode> {
        if !(1..=SET_ROWS).contains(&args.piece) {
            bail!("Piece must be between 1 and {SET_ROWS}");
        }
        let set = parse_set(&args.set)?;
        let mut board = BoardState::load(&args.board)?;
        let coord = parse_cell_label(&args.cell)?;

        let toggle = board.toggle_set_piece(coord, args.piece - 1, set)?;
        board.save(&args.board)?;

        let state = if toggle.collected { "collected" } else { "not collected" };
        self.say(format!("{} piece {} {}", SET_NAMES[set], args.piece, state));
        if let Some(completed) = toggle.completed_set {
            let image = set_image_name(completed).unwrap_or_default();
            self.say(format!(
                "{} set complete ({}); {} is completed",
                SET_NAMES[completed],
                image,
                cell_label(coord)
            ));
        }
        Ok(ExitCode::Success)
    }

    fn export(&self, args: &ExportArgs) -> Result<ExitCode> {
        let board = BoardState::load(&args.board)?;
        let mut writer: Box<dyn Write> = match &args.output {
            Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
                format!("Failed to create export file: {}", path.display())
            })?)),
            None => Box::new(std::io::stdout().lock()),
        };

        match args.format {
            ExportFormat::Csv => CsvExport::new(&board)
                .write_to(&mut writer)
                .context("Failed to write CSV export")?,
            ExportFormat::Json => ScoreReport::new(&board)
                .write_to(&mut writer)
                .context("Failed to write JSON export")?,
        }
        writer.flush()?;

        if let Some(path) = &args.output {
            log::info!("Exported {} to {}", args.format, path.display());
        }
        Ok(ExitCode::Success)
    }

    fn search(&mut self, resolver: &dyn ImageResolver, args: &SearchArgs) -> Result<ExitCode> {
        let mut selection = ImageSelection::new();
        selection.begin_search(&args.query)?;
        let titles = selection
            .finish_search(resolver.search_titles(&args.query))?
            .to_vec();

        for (index, title) in titles.iter().enumerate() {
            self.say(format!("{:>3}. {}", index + 1, title));
        }

        let Some(pick) = args.pick else {
            for notice in selection.take_notices() {
                eprintln!("{notice}");
            }
            return Ok(ExitCode::Success);
        };

        let title = titles
            .get(pick.wrapping_sub(1))
            .with_context(|| format!("--pick {pick} is out of range (1-{})", titles.len()))?;
        let resolved = resolver.resolve_image(title).and_then(|image| {
            CachedImage::decode(&image.bytes)
                .map(|_| image)
                .map_err(|e| remote::RemoteError::Malformed(e.to_string()))
        });
        let shown = selection.show_preview(title, resolved)?;
        for notice in selection.take_notices() {
            eprintln!("{notice}");
        }
        if !shown {
            return Ok(ExitCode::PartialSuccess);
        }

        let image = selection.confirm()?.clone();
        let cached = self.disk_cache()?.cache_bytes(&image.source_url, &image.bytes)?;
        self.say(format!("Cached {} at {}", image.title, cached.display()));

        if let (Some(board_path), Some(cell)) = (&args.board, &args.cell) {
            let mut board = BoardState::load(board_path)?;
            let coord = parse_cell_label(cell)?;
            board.set_image(coord, ImageRef::remote(cached, image.source_url))?;
            board.save(board_path)?;
            self.say(format!("Set image of {}", cell_label(coord)));
        }
        Ok(ExitCode::Success)
    }

    fn fetch(&self, resolver: Arc<dyn ImageResolver>, args: &FetchArgs) -> Result<ExitCode> {
        use yansi::Paint;

        let mut board = BoardState::load(&args.board)?;
        let mut jobs: Vec<(Coord, String)> = Vec::with_capacity(args.assignments.len());
        for (cell, title) in &args.assignments {
            let coord = parse_cell_label(cell)?;
            board.tile(coord)?;
            if jobs.iter().any(|(queued, _)| *queued == coord) {
                bail!("Tile {} is assigned more than once", cell_label(coord));
            }
            jobs.push((coord, title.clone()));
        }

        let cache = self.disk_cache()?;
        let mut dispatcher: Dispatcher<Result<(PathBuf, String), String>> =
            Dispatcher::new(self.config.worker_threads, self.cancel.clone())?;

        for (coord, title) in jobs {
            let resolver = Arc::clone(&resolver);
            let cache = cache.clone();
            dispatcher.submit(coord, move |_| {
                let image = resolver.resolve_image(&title).map_err(|e| e.to_string())?;
                CachedImage::decode(&image.bytes).map_err(|e| format!("'{title}': {e}"))?;
                let path = cache
                    .cache_bytes(&image.source_url, &image.bytes)
                    .map_err(|e| e.to_string())?;
                Ok((path, image.source_url))
            });
        }

        let submitted = args.assignments.len();
        let results = dispatcher.drain();
        if self.cancel.is_cancelled() {
            log::warn!("Fetch interrupted; board left unchanged");
            return Ok(ExitCode::Interrupted);
        }

        let mut failures = submitted - results.len();
        let mut applied = 0;
        for result in results {
            match result.output {
                Ok((path, url)) => {
                    board.set_image(result.coord, ImageRef::remote(path, url))?;
                    self.say(format!("{} image set", cell_label(result.coord)));
                    applied += 1;
                }
                Err(reason) => {
                    eprintln!("{} {}: {}", "Failed".red(), cell_label(result.coord), reason);
                    failures += 1;
                }
            }
        }

        if applied > 0 {
            board.save(&args.board)?;
        }
        Ok(if failures > 0 {
            ExitCode::PartialSuccess
        } else {
            ExitCode::Success
        })
    }

    fn upload(&self, uploader: &dyn ImageUploader, board_path: &Path, cell: &str) -> Result<ExitCode> {
        use yansi::Paint;

        let mut board = BoardState::load(board_path)?;
        let coord = parse_cell_label(cell)?;
        let mut image = board.tile(coord)?.image.clone();
        let path = image
            .path
            .clone()
            .with_context(|| format!("Tile {} has no local image to upload", cell_label(coord)))?;
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        self.disk_cache()?.touch(&path);

        match upload_image_or_absent(uploader, &bytes) {
            Some(url) => {
                image.url = Some(url.clone());
                board.set_image(coord, image)?;
                board.save(board_path)?;
                self.say(format!("Uploaded {}: {}", cell_label(coord), url));
                Ok(ExitCode::Success)
            }
            None => {
                eprintln!(
                    "{} upload failed; {} keeps its local image only",
                    "Warning:".yellow(),
                    cell_label(coord)
                );
                Ok(ExitCode::PartialSuccess)
            }
        }
    }

    fn cache(&self, command: CacheCommands) -> Result<ExitCode> {
        use yansi::Paint;

        let cache = self.disk_cache()?;
        match command {
            CacheCommands::Stats { format } => {
                let stats = cache.stats();
                match format {
                    ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                    ReportFormat::Table => {
                        let usage = format!(
                            "{} of {}",
                            ByteSize::b(stats.total_size),
                            ByteSize::b(stats.capacity)
                        );
                        let usage = if stats.is_over_capacity() {
                            usage.red().to_string()
                        } else {
                            usage.green().to_string()
                        };
                        println!("Cache:   {}", stats.root.display());
                        println!("Files:   {}", stats.files);
                        println!("Size:    {usage}");
                        if let (Some(oldest), Some(newest)) = (&stats.oldest_access, &stats.newest_access) {
                            println!("Access:  {oldest} .. {newest}");
                        }
                    }
                }
                Ok(ExitCode::Success)
            }
            CacheCommands::Clean => {
                let report = cache.enforce_capacity(Some(&self.cancel));
                self.say(format!(
                    "Removed {} file(s), freed {}; cache is {} of {}",
                    report.deleted.len(),
                    ByteSize::b(report.bytes_deleted()),
                    ByteSize::b(report.size_after),
                    ByteSize::b(report.capacity)
                ));
                if report.cancelled {
                    return Ok(ExitCode::Interrupted);
                }
                Ok(if report.failed.is_empty() {
                    ExitCode::Success
                } else {
                    ExitCode::PartialSuccess
                })
            }
            CacheCommands::Add { images } => {
                let mut failures = 0;
                for image in &images {
                    match cache.cache_file(image) {
                        Ok(path) => self.say(format!("{} -> {}", image.display(), path.display())),
                        Err(e) => {
                            eprintln!("{} {}: {}", "Failed".red(), image.display(), e);
                            failures += 1;
                        }
                    }
                }
                Ok(if failures > 0 {
                    ExitCode::PartialSuccess
                } else {
                    ExitCode::Success
                })
            }
        }
    }
}
