mod file_config;

pub use file_config::FileConfig;

use anyhow::{bail, Result};
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub catalog_dir: Option<PathBuf>,
    pub events_dir: Option<PathBuf>,
    pub fail_fast: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub catalog_dir: PathBuf,
    pub events_dir: PathBuf,
    pub fail_fast: bool,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db or in config file")
            })?;
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }

        let catalog_dir = file
            .catalog_dir
            .map(PathBuf::from)
            .or_else(|| cli.catalog_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("catalog_dir must be specified via --catalog-dir or in config file")
            })?;

        let events_dir = file
            .events_dir
            .map(PathBuf::from)
            .or_else(|| cli.events_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("events_dir must be specified via --events-dir or in config file")
            })?;

        let fail_fast = file.fail_fast.unwrap_or(cli.fail_fast);

        Ok(AppConfig {
            db_path,
            catalog_dir,
            events_dir,
            fail_fast,
        })
    }
}
