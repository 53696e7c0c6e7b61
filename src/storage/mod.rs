use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{HarvestError, Result};
use crate::models::ProductRecord;

mod csv;
mod json;

pub use self::csv::CsvSink;
pub use self::json::JsonSink;

/// Destination for the accumulated records.
pub trait OutputSink: Send + Sync {
    fn write(&self, records: &[ProductRecord]) -> Result<()>;
    fn path(&self) -> &Path;
}

/// Write `records` to every sink. Zero records writes nothing and returns
/// `false`.
pub fn save_all(sinks: &[Box<dyn OutputSink>], records: &[ProductRecord]) -> Result<bool> {
    if records.is_empty() {
        info!("No data to save.");
        return Ok(false);
    }

    for sink in sinks {
        sink.write(records)?;
        info!("Saved {} records -> {}", records.len(), sink.path().display());
    }
    Ok(true)
}

pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| HarvestError::Io {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

pub(crate) fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> HarvestError {
    let path: PathBuf = path.to_path_buf();
    move |source| HarvestError::Io { path, source }
}
