//! In-memory sink, mostly for tests and embedding

use crate::core::{ErrorReport, Result, Sink};
use parking_lot::Mutex;
use std::sync::Arc;

/// A captured line and the trace written with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLine {
    pub line: String,
    pub trace: Option<String>,
}

/// Collects lines in memory
///
/// Clones share the same buffer, so a clone kept by the caller sees what
/// the pipeline writes.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<CapturedLine>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().iter().map(|c| c.line.clone()).collect()
    }

    pub fn entries(&self) -> Vec<CapturedLine> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl Sink for MemorySink {
    fn write(&mut self, line: &str) -> Result<()> {
        self.lines.lock().push(CapturedLine {
            line: line.to_string(),
            trace: None,
        });
        Ok(())
    }

    fn write_with_error(&mut self, line: &str, error: &Arc<ErrorReport>) -> Result<()> {
        self.lines.lock().push(CapturedLine {
            line: line.to_string(),
            trace: Some(error.render_trace()),
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
