// CLI command implementations

pub mod detect;
pub mod index;
pub mod languages;
pub mod query;
pub mod stats;

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use reviewgraph::config::Config;
use reviewgraph::index::db::{Snapshot, SnapshotStore};

/// Configuration and snapshot location of a project directory
pub struct Project {
    pub root: PathBuf,
    pub config: Config,
}

impl Project {
    pub fn load(project: &str) -> Self {
        let root = PathBuf::from(project);
        let config = Config::from_project_dir(&root);
        Self { root, config }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.config.snapshot_path(&self.root)
    }

    pub fn open_snapshot(&self) -> Result<SnapshotStore> {
        SnapshotStore::open(self.snapshot_path())
    }

    /// Load an existing snapshot; commands that read the index need one
    pub fn load_snapshot(&self) -> Result<Snapshot> {
        let path = self.snapshot_path();
        if !path.exists() {
            bail!(
                "No index at {}. Run `reviewgraph index -p {}` first.",
                path.display(),
                self.root.display()
            );
        }
        SnapshotStore::open(&path)?.load()
    }

    pub fn config_status(&self) -> &'static str {
        if self.root.join(reviewgraph::config::CONFIG_FILE_NAME).exists() {
            "loaded"
        } else {
            "default"
        }
    }
}

pub fn file_size_mb(path: &Path) -> Result<f64> {
    let metadata = std::fs::metadata(path)?;
    Ok(metadata.len() as f64 / (1024.0 * 1024.0))
}
