//! Console sink implementation

use crate::core::{ErrorReport, Result, Sink};
#[cfg(feature = "console")]
use colored::Colorize;
use std::io::Write;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleTarget {
    Stdout,
    Stderr,
}

pub struct ConsoleSink {
    target: ConsoleTarget,
    use_colors: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            target: ConsoleTarget::Stdout,
            use_colors: cfg!(feature = "console"),
        }
    }

    pub fn stderr() -> Self {
        Self {
            target: ConsoleTarget::Stderr,
            ..Self::new()
        }
    }

    /// Highlight error traces; has no effect without the `console` feature
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn target(&self) -> ConsoleTarget {
        self.target
    }

    fn emit(&self, text: &str) -> Result<()> {
        match self.target {
            ConsoleTarget::Stdout => writeln!(std::io::stdout().lock(), "{}", text)?,
            ConsoleTarget::Stderr => writeln!(std::io::stderr().lock(), "{}", text)?,
        }
        Ok(())
    }

    fn paint_trace(&self, trace: &str) -> String {
        #[cfg(feature = "console")]
        if self.use_colors {
            return trace.red().to_string();
        }
        trace.to_string()
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn write(&mut self, line: &str) -> Result<()> {
        self.emit(line)
    }

    // Traces always go to stderr so they stay visible when stdout is piped
    fn write_with_error(&mut self, line: &str, error: &Arc<ErrorReport>) -> Result<()> {
        self.emit(line)?;
        let trace = error.render_trace();
        writeln!(
            std::io::stderr().lock(),
            "{}",
            self.paint_trace(trace.trim_end_matches('\n'))
        )?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
