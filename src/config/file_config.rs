use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_path: Option<String>,
    pub catalog_dir: Option<String>,
    pub events_dir: Option<String>,
    pub fail_fast: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_loads_partial_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loader.toml");
        fs::write(&path, "db_path = \"/tmp/warehouse.db\"\nfail_fast = true\n").unwrap();

        let config = FileConfig::load(&path).unwrap();
        assert_eq!(config.db_path.as_deref(), Some("/tmp/warehouse.db"));
        assert_eq!(config.fail_fast, Some(true));
        assert!(config.catalog_dir.is_none());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loader.toml");
        fs::write(&path, "db_path = [broken").unwrap();
        assert!(FileConfig::load(&path).is_err());
    }
}
