//! Named loggers handed out by a [`Pipeline`](super::pipeline::Pipeline)

use super::{
    error_report::ErrorReport,
    level_registry::LevelRegistry,
    log_level::LogLevel,
    message::{format_message, LogArg},
    pipeline::PipelineState,
};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// A named entry point into the pipeline
///
/// The effective level is resolved from the level registry when the logger
/// is created and refreshed whenever the pipeline is reconfigured, so the
/// disabled path is a single atomic load.
pub struct Logger {
    name: String,
    level: AtomicU8,
    state: Arc<PipelineState>,
}

macro_rules! level_methods {
    (
        $level:expr,
        $plain:ident,
        $with:ident,
        $with2:ident,
        $args:ident,
        $error:ident,
        $enabled:ident
    ) => {
        #[inline]
        pub fn $plain(&self, message: impl Into<String>) {
            self.log($level, message);
        }

        #[inline]
        pub fn $with(&self, message: &str, arg: impl Into<LogArg>) {
            if self.is_enabled($level) {
                self.log_args($level, message, &[arg.into()]);
            }
        }

        #[inline]
        pub fn $with2(&self, message: &str, first: impl Into<LogArg>, second: impl Into<LogArg>) {
            if self.is_enabled($level) {
                self.log_args($level, message, &[first.into(), second.into()]);
            }
        }

        #[inline]
        pub fn $args(&self, message: &str, args: &[LogArg]) {
            self.log_args($level, message, args);
        }

        #[inline]
        pub fn $error(&self, message: &str, error: &Arc<ErrorReport>) {
            self.log_error($level, message, error);
        }

        #[inline]
        pub fn $enabled(&self) -> bool {
            self.is_enabled($level)
        }
    };
}

impl Logger {
    pub(crate) fn new(name: impl Into<String>, level: LogLevel, state: Arc<PipelineState>) -> Self {
        Self {
            name: name.into(),
            level: AtomicU8::new(level as u8),
            state,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effective level
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Relaxed))
    }

    pub(crate) fn refresh(&self, registry: &LevelRegistry) {
        self.level
            .store(registry.resolve(&self.name) as u8, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.level()
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if !self.is_enabled(level) {
            return;
        }
        self.state.dispatch(&self.name, level, &message.into(), None);
    }

    /// Log with `{}` placeholders; a trailing error argument is attached
    pub fn log_args(&self, level: LogLevel, message: &str, args: &[LogArg]) {
        if !self.is_enabled(level) {
            return;
        }
        let formatted = format_message(message, args);
        self.state
            .dispatch(&self.name, level, &formatted.message, formatted.error.as_ref());
    }

    pub fn log_error(&self, level: LogLevel, message: &str, error: &Arc<ErrorReport>) {
        if !self.is_enabled(level) {
            return;
        }
        self.state.dispatch(&self.name, level, message, Some(error));
    }

    level_methods!(
        LogLevel::Trace,
        trace,
        trace_with,
        trace_with2,
        trace_args,
        trace_error,
        is_trace_enabled
    );
    level_methods!(
        LogLevel::Debug,
        debug,
        debug_with,
        debug_with2,
        debug_args,
        debug_error,
        is_debug_enabled
    );
    level_methods!(
        LogLevel::Info,
        info,
        info_with,
        info_with2,
        info_args,
        info_error,
        is_info_enabled
    );
    level_methods!(
        LogLevel::Warn,
        warn,
        warn_with,
        warn_with2,
        warn_args,
        warn_error,
        is_warn_enabled
    );
    level_methods!(
        LogLevel::Error,
        error,
        error_with,
        error_with2,
        error_args,
        error_error,
        is_error_enabled
    );
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .finish()
    }
}
