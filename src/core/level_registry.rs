//! Hierarchical level resolution
//!
//! Logger names are dot-separated paths (`app.db.pool`). An override set on
//! a prefix (`app.db`) applies to every logger below it unless a longer
//! prefix overrides it again.

use super::log_level::LogLevel;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelRegistry {
    default_level: LogLevel,
    overrides: HashMap<String, LogLevel>,
}

impl LevelRegistry {
    pub fn new(default_level: LogLevel) -> Self {
        Self {
            default_level,
            overrides: HashMap::new(),
        }
    }

    pub fn default_level(&self) -> LogLevel {
        self.default_level
    }

    pub fn set_default(&mut self, level: LogLevel) {
        self.default_level = level;
    }

    pub fn set_override(&mut self, prefix: impl Into<String>, level: LogLevel) {
        self.overrides.insert(prefix.into(), level);
    }

    pub fn remove_override(&mut self, prefix: &str) -> Option<LogLevel> {
        self.overrides.remove(prefix)
    }

    pub fn overrides(&self) -> &HashMap<String, LogLevel> {
        &self.overrides
    }

    /// Effective level for `name`
    ///
    /// Tries `name` itself, then each shorter prefix obtained by dropping the
    /// last `.segment`, and falls back to the default level.
    pub fn resolve(&self, name: &str) -> LogLevel {
        let mut candidate = name;
        loop {
            if let Some(level) = self.overrides.get(candidate) {
                return *level;
            }
            match candidate.rfind('.') {
                Some(dot) => candidate = &candidate[..dot],
                None => return self.default_level,
            }
        }
    }
}
