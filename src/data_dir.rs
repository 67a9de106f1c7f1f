use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

pub const DATABASE_FILE: &str = "maps.db";
pub const PROCESSED_DIR: &str = "processed";

/// Layout of the on-disk catalogue: the SQLite database plus one asset
/// directory per processed archive.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(custom_dir: Option<PathBuf>) -> Result<Self> {
        let root = match custom_dir {
            Some(dir) => dir,
            None => {
                let proj_dirs = ProjectDirs::from("", "", "spring-maps")
                    .context("Could not determine data directory")?;
                proj_dirs.data_dir().to_path_buf()
            }
        };

        fs::create_dir_all(root.join(PROCESSED_DIR))
            .with_context(|| format!("Failed to create data directory {:?}", root))?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }

    /// Parent of the per-map asset directories
    pub fn processed_dir(&self) -> PathBuf {
        self.root.join(PROCESSED_DIR)
    }

    /// Asset directory for one archive
    pub fn map_dir(&self, file_name: &str) -> PathBuf {
        self.processed_dir().join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_dir_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("data");
        let dir = DataDir::new(Some(root.clone())).unwrap();

        assert_eq!(dir.root(), root);
        assert_eq!(dir.db_path(), root.join("maps.db"));
        assert_eq!(dir.map_dir("delta_siege"), root.join("processed/delta_siege"));
        assert!(dir.processed_dir().is_dir());
    }
}
