//! Bridge from the `log` crate facade
//!
//! Records logged through `log::info!` and friends are routed to the
//! pipeline logger named after the record target, with `::` mapped to `.`
//! so module paths share the dotted level hierarchy.

use crate::core::{LogLevel, Pipeline};
use std::sync::Arc;

pub struct LogBridge {
    pipeline: Arc<Pipeline>,
}

impl LogBridge {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    /// Register as the global `log` logger
    ///
    /// # Errors
    ///
    /// Fails if a global logger is already set.
    pub fn install(self) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(log::LevelFilter::Trace);
        Ok(())
    }

    fn logger_name(target: &str) -> String {
        target.replace("::", ".")
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        let level = LogLevel::from(metadata.level());
        self.pipeline
            .logger(&Self::logger_name(metadata.target()))
            .is_enabled(level)
    }

    fn log(&self, record: &log::Record) {
        let level = LogLevel::from(record.level());
        let logger = self.pipeline.logger(&Self::logger_name(record.target()));
        if logger.is_enabled(level) {
            logger.log(level, record.args().to_string());
        }
    }

    fn flush(&self) {
        if let Err(e) = self.pipeline.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush: {}", e);
        }
    }
}
