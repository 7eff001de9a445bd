//! # Rust Context Logger
//!
//! An embeddable logging pipeline for server applications.
//!
//! ## Features
//!
//! - **Hierarchical Levels**: Dotted logger names inherit overrides from their prefixes
//! - **Templates**: `%logger [%level] [%ip] %message` style line layouts
//! - **Diagnostic Context**: Thread-scoped values and stacks referenced from templates
//! - **Mail Alerts**: Severe lines are mailed over SMTP from a background worker
//! - **Log Facade**: Records from the `log` crate can be routed into a pipeline

pub mod core;
pub mod facade;
pub mod macros;
pub mod notification;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        format_message, ContextGuard, ContextStore, ErrorReport, FormatTemplate, LogArg,
        LogLevel, Logger, LoggerConfig, LoggerError, LoggerMetrics, NotificationConfig,
        Pipeline, PipelineBuilder, Result, Sink, StackFilter, StackFrame, TemplateRenderer,
        DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::facade::LogBridge;
    pub use crate::notification::{Credentials, MailTarget, NotificationEvent, Transport};
    pub use crate::sinks::{ConsoleSink, MemorySink, WriterSink};
}

pub use core::{
    format_message, ContextGuard, ContextStore, ErrorReport, FormatTemplate, FormattedMessage,
    LevelRegistry, LogArg, LogLevel, Logger, LoggerConfig, LoggerError, LoggerMetrics,
    NotificationConfig, Pipeline, PipelineBuilder, Result, Sink, StackFilter, StackFrame,
    TemplateRenderer, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use facade::LogBridge;
pub use notification::{
    Credentials, MailTarget, NotificationEvent, NotificationQueue, SmtpTransport, Transport,
};
pub use sinks::{ConsoleSink, MemorySink, WriterSink};
