//! Error types for the logging pipeline

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Unknown level name in a configuration value
    #[error("Invalid log level: '{name}'")]
    InvalidLevel { name: String },

    /// Configuration key that is not recognized inside the namespace
    #[error("Invalid init parameter name: '{name}'")]
    InvalidParameter { name: String },

    /// Notification setting that does not have the expected shape
    #[error("Malformed notification setting '{value}': {message}")]
    MalformedNotification { value: String, message: String },

    /// Notification protocol other than smtp
    #[error("Notification protocol not supported: '{protocol}'")]
    UnsupportedProtocol { protocol: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Unexpected reply during the mail delivery handshake
    #[error("SMTP {stage} failed: {reply}")]
    Smtp { stage: String, reply: String },

    /// Sink write error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Notification worker is no longer accepting events
    #[error("Notification worker stopped")]
    NotifierStopped,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid level error
    pub fn invalid_level(name: impl Into<String>) -> Self {
        LoggerError::InvalidLevel { name: name.into() }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(name: impl Into<String>) -> Self {
        LoggerError::InvalidParameter { name: name.into() }
    }

    /// Create a malformed notification error
    pub fn malformed_notification(value: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::MalformedNotification {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported protocol error
    pub fn unsupported_protocol(protocol: impl Into<String>) -> Self {
        LoggerError::UnsupportedProtocol {
            protocol: protocol.into(),
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an SMTP handshake error
    pub fn smtp(stage: impl Into<String>, reply: impl Into<String>) -> Self {
        LoggerError::Smtp {
            stage: stage.into(),
            reply: reply.into(),
        }
    }

    /// Whether this error originates from configuration parsing
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LoggerError::InvalidLevel { .. }
                | LoggerError::InvalidParameter { .. }
                | LoggerError::MalformedNotification { .. }
                | LoggerError::UnsupportedProtocol { .. }
        )
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}
