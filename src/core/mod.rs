//! Core pipeline types and traits

pub mod config;
pub mod error;
pub mod error_report;
pub mod level_registry;
pub mod log_context;
pub mod log_level;
pub mod logger;
pub mod message;
pub mod metrics;
pub mod pipeline;
pub mod sink;
pub mod stack_filter;
pub mod template;
pub mod timestamp;

pub use config::{LoggerConfig, NotificationConfig, CONFIG_NAMESPACE};
pub use error::{LoggerError, Result};
pub use error_report::{ErrorReport, StackFrame};
pub use level_registry::LevelRegistry;
pub use log_context::{ContextGuard, ContextStore};
pub use log_level::LogLevel;
pub use logger::Logger;
pub use message::{format_message, FormattedMessage, LogArg};
pub use metrics::LoggerMetrics;
pub use pipeline::{
    Pipeline, PipelineBuilder, TransportFactory, DEFAULT_SHUTDOWN_TIMEOUT, NOTIFICATION_LOGGER,
};
pub use sink::Sink;
pub use stack_filter::{StackFilter, DEFAULT_UNWANTED_PREFIXES};
pub use template::{Element, FormatTemplate, TemplateRenderer, DEFAULT_PATTERN};
pub use timestamp::{CachingDateFormatter, DATE_LAYOUT};
