use anyhow::{Context, Result};
use clap::Parser;
use playlog_loader::config::{AppConfig, CliConfig, FileConfig};
use playlog_loader::pipeline::Loader;
use playlog_loader::warehouse::{SqliteWarehouse, WAREHOUSE_SCHEMA};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "playlog-loader")]
#[command(about = "Load song catalog and play-event log files into a SQLite warehouse")]
struct CliArgs {
    /// Path to the SQLite warehouse database file (created if absent).
    #[clap(long, value_parser = parse_path)]
    pub db: Option<PathBuf>,

    /// Root directory of the song catalog files.
    #[clap(long, value_parser = parse_path)]
    pub catalog_dir: Option<PathBuf>,

    /// Root directory of the play-event log files.
    #[clap(long, value_parser = parse_path)]
    pub events_dir: Option<PathBuf>,

    /// Optional TOML config file; its values override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Abort the run on the first failed file instead of continuing.
    #[clap(long, default_value_t = false)]
    pub fail_fast: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let cli_args = CliArgs::parse();

    info!(
        "playlog-loader {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = AppConfig::resolve(
        &CliConfig {
            db_path: cli_args.db,
            catalog_dir: cli_args.catalog_dir,
            events_dir: cli_args.events_dir,
            fail_fast: cli_args.fail_fast,
        },
        file_config,
    )?;

    info!("Opening warehouse database at {:?}...", config.db_path);
    let warehouse = SqliteWarehouse::open(&config.db_path, &WAREHOUSE_SCHEMA)?;

    let loader = Loader::new(warehouse.clone(), config.fail_fast);
    let stats = loader.run(&config.catalog_dir, &config.events_dir)?;

    let counts = warehouse.counts()?;
    info!("");
    info!("Load Summary");
    info!("============");
    info!("Catalog files loaded: {}", stats.catalog_files);
    info!("Event files loaded: {}", stats.event_files);
    info!("Songs inserted: {}", stats.songs_inserted);
    info!("Artists inserted: {}", stats.artists_inserted);
    info!("Plays inserted: {}", stats.plays_inserted);
    if stats.unresolved_plays > 0 {
        info!(
            "Plays without a catalog match: {}",
            stats.unresolved_plays
        );
    }
    if stats.failed_files > 0 {
        warn!("Failed files: {}", stats.failed_files);
    }
    if stats.skipped_lines > 0 {
        warn!("Skipped malformed lines: {}", stats.skipped_lines);
    }
    info!("");
    info!("Warehouse contains:");
    info!("  {} songs", counts.songs);
    info!("  {} artists", counts.artists);
    info!("  {} users", counts.users);
    info!("  {} time rows", counts.time_rows);
    info!("  {} plays", counts.plays);

    Ok(())
}
