//! Sink over any `std::io::Write`

use crate::core::{LoggerError, Result, Sink};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes each line followed by `\n`
pub struct WriterSink<W: Write + Send> {
    writer: Option<W>,
    name: String,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            name: "writer".to_string(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Flush and return the inner writer
    pub fn into_inner(mut self) -> Result<W> {
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| LoggerError::writer("Writer already taken"))?;
        writer.flush()?;
        Ok(writer)
    }
}

impl WriterSink<BufWriter<File>> {
    /// Append to the file at `path`, creating it if needed
    pub fn file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| LoggerError::io_operation("opening log file", path.display().to_string(), e))?;
        Ok(Self::new(BufWriter::new(file)).with_name("file"))
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write(&mut self, line: &str) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("Writer not initialized"))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<W: Write + Send> Drop for WriterSink<W> {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
