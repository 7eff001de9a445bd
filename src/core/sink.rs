//! Sink trait for rendered output lines

use super::{error::Result, error_report::ErrorReport};
use std::sync::Arc;

/// Destination for rendered lines
///
/// The pipeline serializes calls, so implementations only need to be `Send`.
pub trait Sink: Send {
    fn write(&mut self, line: &str) -> Result<()>;

    /// Write a line together with an error
    ///
    /// The default writes the line followed by the error's trace.
    fn write_with_error(&mut self, line: &str, error: &Arc<ErrorReport>) -> Result<()> {
        let trace = error.render_trace();
        self.write(&format!("{}\n{}", line, trace.trim_end_matches('\n')))
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}
