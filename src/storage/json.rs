use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{ensure_parent, io_error, OutputSink};
use crate::error::Result;
use crate::models::ProductRecord;

/// Pretty-printed JSON array of record objects.
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputSink for JsonSink {
    fn write(&self, records: &[ProductRecord]) -> Result<()> {
        ensure_parent(&self.path)?;

        let file = std::fs::File::create(&self.path).map_err(io_error(&self.path))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.flush().map_err(io_error(&self.path))?;
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
