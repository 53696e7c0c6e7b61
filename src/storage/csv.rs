use std::path::{Path, PathBuf};

use super::{ensure_parent, io_error, OutputSink};
use crate::error::Result;
use crate::models::ProductRecord;

/// Row-per-record CSV with a header taken from the record's field names.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputSink for CsvSink {
    fn write(&self, records: &[ProductRecord]) -> Result<()> {
        ensure_parent(&self.path)?;

        let file = std::fs::File::create(&self.path).map_err(io_error(&self.path))?;
        let mut writer = ::csv::Writer::from_writer(file);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush().map_err(io_error(&self.path))?;
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
