//! Append-only per-code CSV tables under `data/<name>/`.
//!
//! Each taxonomy code owns one file with rows of `(message, code)`. Reopening
//! a table for a resumed run appends rather than truncates, so prior output is
//! never rewritten or reordered. A write failure is fatal for the run: losing
//! generated data silently would be worse than stopping.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// Open handle to one code's table.
pub struct DatasetTable {
    path: PathBuf,
    code: String,
    writer: BufWriter<File>,
}

impl DatasetTable {
    /// Open (or create) the table for `code` under `dir` in append mode.
    ///
    /// Creates the directory path if absent. Idempotent: opening an existing
    /// table positions at the end of the file.
    pub fn open(dir: &Path, code: &str) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("create dataset dir {}", dir.display()))?;
        let path = dir.join(format!("{code}.csv"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open table {}", path.display()))?;
        debug!(path = %path.display(), "opened dataset table");
        Ok(Self {
            path,
            code: code.to_string(),
            writer: BufWriter::new(file),
        })
    }

    /// Append one `(message, code)` row.
    ///
    /// The row only reaches this method once the message has been fully
    /// received from the generator, so no partial row is ever written.
    pub fn append(&mut self, message: &str) -> Result<()> {
        let row = format!("{},{}\n", csv_field(message), csv_field(&self.code));
        self.writer
            .write_all(row.as_bytes())
            .with_context(|| format!("append row to {}", self.path.display()))
    }

    /// Flush buffered rows and release the handle.
    pub fn close(mut self) -> Result<()> {
        self.writer
            .flush()
            .with_context(|| format!("flush table {}", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Quote a CSV field when it contains the delimiter, a quote, or a newline.
///
/// Embedded quotes are doubled (RFC 4180).
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_rows_with_code_column() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut table = DatasetTable::open(temp.path(), "1.1").expect("open");
        table.append("Walk every day.").expect("append");
        table.append("Track your meals.").expect("append");
        table.close().expect("close");

        let contents = fs::read_to_string(temp.path().join("1.1.csv")).expect("read");
        assert_eq!(contents, "Walk every day.,1.1\nTrack your meals.,1.1\n");
    }

    /// Reopen must append, never truncate, so interrupted runs can resume.
    #[test]
    fn reopen_appends_instead_of_truncating() {
        let temp = tempfile::tempdir().expect("tempdir");

        let mut table = DatasetTable::open(temp.path(), "2.3").expect("open");
        table.append("first run").expect("append");
        table.close().expect("close");

        let mut table = DatasetTable::open(temp.path(), "2.3").expect("reopen");
        table.append("second run").expect("append");
        table.close().expect("close");

        let contents = fs::read_to_string(temp.path().join("2.3.csv")).expect("read");
        assert_eq!(contents, "first run,2.3\nsecond run,2.3\n");
    }

    #[test]
    fn quotes_fields_containing_delimiter_or_quotes() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut table = DatasetTable::open(temp.path(), "1.1").expect("open");
        table.append("Set a goal, then review it.").expect("append");
        table.append("Say \"well done\" to yourself.").expect("append");
        table.close().expect("close");

        let contents = fs::read_to_string(temp.path().join("1.1.csv")).expect("read");
        assert_eq!(
            contents,
            "\"Set a goal, then review it.\",1.1\n\"Say \"\"well done\"\" to yourself.\",1.1\n"
        );
    }

    /// A message spanning lines must stay one quoted record, not split rows.
    #[test]
    fn quotes_fields_containing_newlines() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut table = DatasetTable::open(temp.path(), "1.4").expect("open");
        table.append("Plan your week.\nThen review it.").expect("append");
        table.append("after").expect("append");
        table.close().expect("close");

        let contents = fs::read_to_string(temp.path().join("1.4.csv")).expect("read");
        assert_eq!(
            contents,
            "\"Plan your week.\nThen review it.\",1.4\nafter,1.4\n"
        );
    }

    #[test]
    fn creates_missing_directories_on_open() {
        let temp = tempfile::tempdir().expect("tempdir");
        let nested = temp.path().join("data").join("baseline");
        let table = DatasetTable::open(&nested, "5.1").expect("open");
        assert!(table.path().starts_with(&nested));
        table.close().expect("close");
        assert!(nested.join("5.1.csv").is_file());
    }
}
