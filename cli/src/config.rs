use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use forkful_core::persist::CatalogFiles;

pub struct Config {
    pub data_dir: PathBuf,
    pub files: CatalogFiles,
}

impl Config {
    /// Resolve the data directory, creating it if needed. `data_dir` overrides
    /// the platform default.
    pub fn load(data_dir: Option<&Path>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => ProjectDirs::from("", "", "forkful")
                .context("Could not determine home directory")?
                .data_dir()
                .to_path_buf(),
        };
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let files = CatalogFiles::in_dir(&data_dir);
        Ok(Config { data_dir, files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let config = Config::load(Some(&nested)).unwrap();
        assert!(nested.is_dir());
        assert_eq!(config.data_dir, nested);
        assert_eq!(config.files.food, nested.join("FoodItems.csv"));
    }
}
