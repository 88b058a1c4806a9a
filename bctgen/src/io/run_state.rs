//! Completion bookkeeping for resumable dataset runs.
//!
//! After a code's table is flushed, the code is recorded here. A resumed run
//! (`--resume`) skips recorded codes instead of regenerating them. The record
//! is written *after* the table data on purpose: an interruption between the
//! two duplicates at most one code's rows on resume, whereas the opposite
//! order could silently lose a code.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Persisted bookkeeping for one dataset (`data/<name>/run_state.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunState {
    /// Codes whose tables were fully written and flushed, in completion order.
    pub completed_codes: Vec<String>,
}

impl RunState {
    pub fn is_completed(&self, code: &str) -> bool {
        self.completed_codes.iter().any(|c| c == code)
    }

    pub fn mark_completed(&mut self, code: &str) {
        if !self.is_completed(code) {
            self.completed_codes.push(code.to_string());
        }
    }
}

/// Load run state from disk. A missing file is an empty state.
pub fn load_run_state(path: &Path) -> Result<RunState> {
    if !path.exists() {
        return Ok(RunState::default());
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("read run state {}", path.display()))?;
    let state: RunState = serde_json::from_str(&contents)
        .with_context(|| format!("parse run state {}", path.display()))?;
    debug!(completed = state.completed_codes.len(), "run state loaded");
    Ok(state)
}

/// Atomically write run state to disk (temp file + rename).
pub fn write_run_state(path: &Path, state: &RunState) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(state)?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("run state path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp run state {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace run state {}", path.display()))?;
    Ok(())
}
