//! CSV and JSON export writer.
//!
//! Every file is written to a sibling `.tmp` file first and renamed into
//! place, so a reader never sees a half-written export.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;
use crate::ui;

/// Writes exports under one output directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
    snapshot_interval: usize,
}

impl Exporter {
    /// Create the output directory and its `raw_data/` subdirectory.
    pub fn create(dir: &Path, snapshot_interval: usize) -> Result<Self> {
        let raw = paths::raw_data_dir(dir);
        fs::create_dir_all(&raw)
            .with_context(|| format!("Failed to create output directory: {}", raw.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            snapshot_interval,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Write `rows` to `file_name`, replacing any previous file.
    ///
    /// Returns `None` without touching the disk when there are no rows.
    pub fn write_csv<T: Serialize>(&self, file_name: &str, rows: &[T]) -> Result<Option<PathBuf>> {
        if rows.is_empty() {
            ui::dim(&format!("No data to save for {}", file_name));
            return Ok(None);
        }
        let path = self.path(file_name);
        write_atomic(&path, &to_csv(rows)?)?;
        log::info!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(Some(path))
    }

    /// Write `<prefix>_partial_<n>.csv` when `n` is a multiple of the interval.
    pub fn snapshot<T: Serialize>(&self, prefix: &str, rows: &[T]) -> Result<Option<PathBuf>> {
        let n = rows.len();
        if self.snapshot_interval == 0 || n == 0 || n % self.snapshot_interval != 0 {
            return Ok(None);
        }
        let name = format!("{}_partial_{}.csv", prefix, n);
        let path = self.write_csv(&name, rows)?;
        if let Some(p) = &path {
            ui::dim(&format!("Saved partial results to {}", p.display()));
        }
        Ok(path)
    }

    /// Write whatever was collected before a run failed to `<prefix>_error.csv`.
    pub fn write_error_snapshot<T: Serialize>(
        &self,
        prefix: &str,
        rows: &[T],
    ) -> Result<Option<PathBuf>> {
        self.write_csv(&format!("{}_error.csv", prefix), rows)
    }

    /// Pretty JSON dump under `raw_data/<name>.json`.
    pub fn write_raw<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = paths::raw_data_dir(&self.dir).join(format!("{}.json", name));
        write_json(&path, value)?;
        log::debug!("Wrote raw dump {}", path.display());
        Ok(path)
    }
}

/// Serialize rows to CSV with a header line.
pub fn to_csv<T: Serialize>(rows: &[T]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row).context("CSV write error")?;
    }
    wtr.into_inner()
        .map_err(csv::IntoInnerError::into_error)
        .context("Failed to flush CSV")
}

/// Pretty JSON written atomically.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_vec_pretty(value).context("Failed to serialize JSON")?;
    write_atomic(path, &content)
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp_path = PathBuf::from(temp);
    fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;
    Ok(())
}

/// One line of the end-of-run export summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    pub label: String,
    pub count: usize,
    pub path: Option<PathBuf>,
}

impl ExportResult {
    pub fn new(label: &str, count: usize, path: Option<PathBuf>) -> Self {
        Self {
            label: label.to_string(),
            count,
            path,
        }
    }
}

/// Print "{type}: {count} items exported to {path}" per export.
pub fn print_summary(results: &[ExportResult]) {
    ui::header("Export Summary");
    for r in results {
        match &r.path {
            Some(path) => ui::kv(
                &r.label,
                &format!("{} items exported to {}", r.count, path.display()),
            ),
            None => ui::kv(&r.label, &format!("{} items (nothing written)", r.count)),
        }
    }
}
