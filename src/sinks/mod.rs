//! Sink implementations

pub mod console;
pub mod memory;
pub mod writer;

pub use console::{ConsoleSink, ConsoleTarget};
pub use memory::{CapturedLine, MemorySink};
pub use writer::WriterSink;

pub use crate::core::Sink;
