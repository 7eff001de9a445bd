//! Line templates
//!
//! A template such as `%date %logger [%level] [%ip] %message` is compiled
//! once into a list of elements and rendered for every emitted line.
//!
//! | Directive | Output |
//! |---|---|
//! | `%date` | local time, `yyyy-MM-dd HH:mm:ss,SSS` |
//! | `%level` / `%Level` / `%LEVEL` | level in lower, title or upper case |
//! | `%logger` | logger name |
//! | `%message` | message after argument substitution |
//! | `%anything_else` | context value for key `anything_else`, empty if unset |

use super::log_context::ContextStore;
use super::log_level::LogLevel;
use super::timestamp::CachingDateFormatter;
use chrono::{DateTime, Local};

pub const DEFAULT_PATTERN: &str = "%logger [%level] [%ip] %message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Literal(String),
    Date,
    LevelLower,
    LevelTitle,
    LevelUpper,
    LoggerName,
    Message,
    ContextRef(String),
}

impl Element {
    fn directive(word: &str) -> Self {
        match word {
            "date" => Element::Date,
            "level" => Element::LevelLower,
            "Level" => Element::LevelTitle,
            "LEVEL" => Element::LevelUpper,
            "logger" => Element::LoggerName,
            "message" => Element::Message,
            other => Element::ContextRef(other.to_string()),
        }
    }
}

/// Compiled, immutable template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatTemplate {
    pattern: String,
    elements: Vec<Element>,
}

impl FormatTemplate {
    /// Compile a pattern
    ///
    /// Runs of text without `%` become literals and `%` followed by
    /// alphanumerics becomes a directive. A `%` with no word after it is
    /// dropped. Compilation never fails.
    pub fn compile(pattern: &str) -> Self {
        let mut elements = Vec::new();
        let mut rest = pattern;

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('%') {
                let word_len = after
                    .find(|c: char| !c.is_ascii_alphanumeric())
                    .unwrap_or(after.len());
                if word_len > 0 {
                    elements.push(Element::directive(&after[..word_len]));
                }
                rest = &after[word_len..];
            } else {
                let literal_len = rest.find('%').unwrap_or(rest.len());
                elements.push(Element::Literal(rest[..literal_len].to_string()));
                rest = &rest[literal_len..];
            }
        }

        Self {
            pattern: pattern.to_string(),
            elements,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Whether rendering reads the clock
    pub fn uses_date(&self) -> bool {
        self.elements.contains(&Element::Date)
    }
}

impl Default for FormatTemplate {
    fn default() -> Self {
        Self::compile(DEFAULT_PATTERN)
    }
}

/// Renders lines from a template, the context store and the clock
///
/// # Example
///
/// ```
/// use rust_context_logger::{ContextStore, FormatTemplate, LogLevel, TemplateRenderer};
///
/// let renderer = TemplateRenderer::new(
///     FormatTemplate::compile("%logger [%level] %message"),
///     ContextStore::new(),
/// );
/// assert_eq!(renderer.render("x", LogLevel::Warn, "oops"), "x [warn.] oops");
/// ```
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    template: FormatTemplate,
    dates: CachingDateFormatter,
    context: ContextStore,
}

impl TemplateRenderer {
    pub fn new(template: FormatTemplate, context: ContextStore) -> Self {
        Self {
            template,
            dates: CachingDateFormatter::default(),
            context,
        }
    }

    pub fn template(&self) -> &FormatTemplate {
        &self.template
    }

    pub fn render(&self, logger: &str, level: LogLevel, message: &str) -> String {
        if self.template.uses_date() {
            self.render_at(logger, level, message, &Local::now())
        } else {
            self.render_with(logger, level, message, String::new)
        }
    }

    /// Render with `%date` bound to `instant`
    pub fn render_at(
        &self,
        logger: &str,
        level: LogLevel,
        message: &str,
        instant: &DateTime<Local>,
    ) -> String {
        self.render_with(logger, level, message, || self.dates.format(instant))
    }

    fn render_with(
        &self,
        logger: &str,
        level: LogLevel,
        message: &str,
        date: impl Fn() -> String,
    ) -> String {
        let mut line = String::with_capacity(128);
        for element in &self.template.elements {
            match element {
                Element::Literal(text) => line.push_str(text),
                Element::Date => line.push_str(&date()),
                Element::LevelLower => line.push_str(level.as_lower()),
                Element::LevelTitle => line.push_str(level.as_title()),
                Element::LevelUpper => line.push_str(level.as_upper()),
                Element::LoggerName => line.push_str(logger),
                Element::Message => line.push_str(message),
                Element::ContextRef(key) => {
                    if let Some(value) = self.context.get(key) {
                        line.push_str(&value);
                    }
                }
            }
        }
        line
    }
}
