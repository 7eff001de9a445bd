//! Pipeline configuration
//!
//! Settings arrive as flat key/value parameters, for instance from a
//! deployment descriptor or environment. Only keys under
//! [`CONFIG_NAMESPACE`] are considered:
//!
//! | Key | Value |
//! |---|---|
//! | `context-logger.level` | default level |
//! | `context-logger.format` | line template |
//! | `context-logger.notification` | `level:smtp:host:port:from:to` |
//! | `context-logger.notification.user` | SMTP user |
//! | `context-logger.notification.password` | SMTP password |
//! | `context-logger.strip` | comma-separated frame origin prefixes |
//! | `context-logger.<logger>.level` | level override for a logger prefix |

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::stack_filter::StackFilter;
use super::template::FormatTemplate;
use crate::notification::{Credentials, MailTarget};
use std::collections::HashMap;

pub const CONFIG_NAMESPACE: &str = "context-logger";

const NOTIFICATION_FORMAT: &str = "level:protocol:mail_server:port:from_address:to_address";

/// Alert threshold plus where to send alerts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    pub threshold: LogLevel,
    pub target: MailTarget,
}

impl NotificationConfig {
    /// Parse `level:protocol:host:port:from:to`
    ///
    /// # Errors
    ///
    /// Fails unless there are exactly six tokens, the level and port are
    /// valid, the protocol is `smtp` and no address token is blank.
    pub fn parse(value: &str) -> Result<Self> {
        let tokens: Vec<&str> = value.split(':').collect();
        if tokens.len() != 6 {
            return Err(LoggerError::malformed_notification(
                value,
                format!("expecting 6 tokens: '{}'", NOTIFICATION_FORMAT),
            ));
        }
        let threshold: LogLevel = tokens[0].parse()?;
        if tokens[1] != "smtp" {
            return Err(LoggerError::unsupported_protocol(tokens[1]));
        }
        let port: u16 = tokens[3].trim().parse().map_err(|_| {
            LoggerError::malformed_notification(value, format!("invalid port '{}'", tokens[3]))
        })?;
        let (host, from, to) = (tokens[2].trim(), tokens[4].trim(), tokens[5].trim());
        for (field, token) in [("mail_server", host), ("from_address", from), ("to_address", to)] {
            if token.is_empty() {
                return Err(LoggerError::malformed_notification(
                    value,
                    format!("empty {}", field),
                ));
            }
        }

        Ok(Self {
            threshold,
            target: MailTarget::new(host, port, from, to),
        })
    }
}

/// Typed configuration of a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    pub default_level: LogLevel,
    pub template: FormatTemplate,
    pub overrides: HashMap<String, LogLevel>,
    pub notification: Option<NotificationConfig>,
    pub stack_filter: StackFilter,
    user: Option<String>,
    password: Option<Password>,
}

#[derive(Clone, PartialEq, Eq)]
struct Password(String);

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("\"***\"")
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Info,
            template: FormatTemplate::default(),
            overrides: HashMap::new(),
            notification: None,
            stack_filter: StackFilter::default(),
            user: None,
            password: None,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from parameters, failing on the first bad one
    pub fn from_params<I, K, V>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in params {
            config.apply(key.as_ref(), value.as_ref())?;
        }
        Ok(config)
    }

    /// Apply one parameter
    ///
    /// Keys outside the namespace are ignored. On error the configuration is
    /// left as it was before the call.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let setting = match key
            .strip_prefix(CONFIG_NAMESPACE)
            .and_then(|rest| rest.strip_prefix('.'))
        {
            Some(setting) => setting,
            None => return Ok(()),
        };

        match setting {
            "level" => self.default_level = value.parse()?,
            "format" => self.template = FormatTemplate::compile(value),
            "notification" => self.notification = Some(NotificationConfig::parse(value)?),
            "notification.user" => self.user = Some(value.to_string()),
            "notification.password" => self.password = Some(Password(value.to_string())),
            "strip" => self.stack_filter = StackFilter::from_list(value),
            other => match logger_prefix(other) {
                Some(prefix) => {
                    let level = value.parse()?;
                    self.overrides.insert(prefix.to_string(), level);
                }
                None => return Err(LoggerError::invalid_parameter(key)),
            },
        }
        Ok(())
    }

    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.default_level = level;
        self
    }

    #[must_use]
    pub fn with_format(mut self, pattern: &str) -> Self {
        self.template = FormatTemplate::compile(pattern);
        self
    }

    #[must_use]
    pub fn with_override(mut self, prefix: impl Into<String>, level: LogLevel) -> Self {
        self.overrides.insert(prefix.into(), level);
        self
    }

    #[must_use]
    pub fn with_notification(mut self, notification: NotificationConfig) -> Self {
        self.notification = Some(notification);
        self
    }

    #[must_use]
    pub fn with_stack_filter(mut self, filter: StackFilter) -> Self {
        self.stack_filter = filter;
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(Password(password.into()));
        self
    }

    /// Notification settings with any configured credentials attached
    pub fn resolved_notification(&self) -> Option<NotificationConfig> {
        let mut notification = self.notification.clone()?;
        if let (Some(user), Some(Password(password))) = (&self.user, &self.password) {
            notification.target.credentials = Some(Credentials::new(user, password));
        }
        Some(notification)
    }
}

/// `app.db.level` (any case for `level`) gives `app.db`
fn logger_prefix(setting: &str) -> Option<&str> {
    let split = setting.len().checked_sub(".level".len())?;
    if !setting.is_char_boundary(split) || !setting[split..].eq_ignore_ascii_case(".level") {
        return None;
    }
    let prefix = &setting[..split];
    if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
        return None;
    }
    Some(prefix)
}
