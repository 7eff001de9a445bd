//! Error reports attached to log entries
//!
//! An `ErrorReport` is the pipeline's view of a failure: a kind, a message,
//! a list of stack frames and an optional cause. Frames and cause live
//! behind locks so reports can be shared between threads, trimmed in place
//! by the [`StackFilter`](super::stack_filter::StackFilter) and linked into
//! chains after construction (including cyclic chains).

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

/// One frame of a captured stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    /// Fully qualified path of the code the frame belongs to, e.g. `std::rt`
    pub origin: String,
    pub function: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl StackFrame {
    pub fn new(origin: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            function: function.into(),
            file: None,
            line: None,
        }
    }

    #[must_use]
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {}::{}", self.origin, self.function)?;
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, " ({}:{})", file, line),
            (Some(file), None) => write!(f, " ({})", file),
            _ => Ok(()),
        }
    }
}

#[derive(Debug)]
pub struct ErrorReport {
    kind: String,
    message: String,
    frames: Mutex<Vec<StackFrame>>,
    cause: Mutex<Option<Arc<ErrorReport>>>,
}

impl ErrorReport {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            frames: Mutex::new(Vec::new()),
            cause: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_frame(self, frame: StackFrame) -> Self {
        self.frames.lock().push(frame);
        self
    }

    #[must_use]
    pub fn with_frames(self, frames: impl IntoIterator<Item = StackFrame>) -> Self {
        self.frames.lock().extend(frames);
        self
    }

    #[must_use]
    pub fn with_cause(self, cause: Arc<ErrorReport>) -> Self {
        *self.cause.lock() = Some(cause);
        self
    }

    /// Build a report chain from any error and its `source()` chain
    ///
    /// The outermost report takes the concrete type name as its kind;
    /// sources are only known as trait objects and are reported as `Error`.
    pub fn from_error<E: Error + 'static>(error: &E) -> Arc<Self> {
        let mut messages = vec![(std::any::type_name::<E>().to_string(), error.to_string())];
        let mut source = error.source();
        while let Some(err) = source {
            messages.push(("Error".to_string(), err.to_string()));
            source = err.source();
        }

        let mut chain: Option<Arc<ErrorReport>> = None;
        for (kind, message) in messages.into_iter().rev() {
            let report = ErrorReport::new(kind, message);
            *report.cause.lock() = chain.take();
            chain = Some(Arc::new(report));
        }
        // `messages` always holds the outer error
        chain.unwrap_or_else(|| Arc::new(ErrorReport::new("Error", error.to_string())))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn frames(&self) -> Vec<StackFrame> {
        self.frames.lock().clone()
    }

    pub fn cause(&self) -> Option<Arc<ErrorReport>> {
        self.cause.lock().clone()
    }

    /// Link a cause after construction
    pub fn set_cause(&self, cause: Option<Arc<ErrorReport>>) {
        *self.cause.lock() = cause;
    }

    /// Keep only the frames matching `keep`
    pub fn retain_frames(&self, keep: impl FnMut(&StackFrame) -> bool) {
        self.frames.lock().retain(keep);
    }

    /// Multi-line trace: headline, frames, then each cause
    ///
    /// A cause already printed is reported as circular instead of being
    /// walked again.
    pub fn render_trace(self: &Arc<Self>) -> String {
        let mut out = String::new();
        let mut seen: HashSet<*const ErrorReport> = HashSet::new();
        let mut current = Some(Arc::clone(self));
        let mut first = true;

        while let Some(report) = current {
            if !seen.insert(Arc::as_ptr(&report)) {
                let _ = writeln!(out, "Caused by: [CIRCULAR REFERENCE: {}]", report.headline());
                break;
            }
            if !first {
                out.push_str("Caused by: ");
            }
            first = false;
            let _ = writeln!(out, "{}", report.headline());
            for frame in report.frames.lock().iter() {
                let _ = writeln!(out, "    {}", frame);
            }
            current = report.cause();
        }
        out
    }

    /// `kind: message`, or just the kind when the message is empty
    pub fn headline(&self) -> String {
        if self.message.is_empty() {
            self.kind.clone()
        } else {
            format!("{}: {}", self.kind, self.message)
        }
    }
}
