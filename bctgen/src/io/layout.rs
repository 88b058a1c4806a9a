//! Stable on-disk layout for one dataset.

use std::path::{Path, PathBuf};

/// Paths owned by one dataset (prompt configuration) under the data directory.
#[derive(Debug, Clone)]
pub struct DatasetPaths {
    /// `<data_dir>/<dataset>/`
    pub dir: PathBuf,
    /// Completion bookkeeping for resumable runs.
    pub run_state_path: PathBuf,
    /// Generator process logs, one file per code.
    pub logs_dir: PathBuf,
}

impl DatasetPaths {
    pub fn new(data_dir: &Path, dataset: &str) -> Self {
        let dir = data_dir.join(dataset);
        Self {
            run_state_path: dir.join("run_state.json"),
            logs_dir: dir.join("logs"),
            dir,
        }
    }

    /// Append-only table file for one taxonomy code.
    pub fn table_path(&self, code: &str) -> PathBuf {
        self.dir.join(format!("{code}.csv"))
    }

    /// Generator stdout/stderr log for one taxonomy code.
    pub fn generator_log_path(&self, code: &str) -> PathBuf {
        self.logs_dir.join(format!("{code}.log"))
    }
}
