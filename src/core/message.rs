//! Argument substitution for `{}` placeholders

use super::error_report::ErrorReport;
use std::fmt;
use std::sync::Arc;

const DELIMITER: &str = "{}";
const ESCAPE: char = '\\';

/// One argument of a parameterized log call
#[derive(Debug, Clone)]
pub enum LogArg {
    Value(String),
    Error(Arc<ErrorReport>),
}

impl LogArg {
    /// Argument from anything printable
    pub fn display(value: impl fmt::Display) -> Self {
        LogArg::Value(value.to_string())
    }

    pub fn error(report: Arc<ErrorReport>) -> Self {
        LogArg::Error(report)
    }

    fn as_error(&self) -> Option<&Arc<ErrorReport>> {
        match self {
            LogArg::Error(report) => Some(report),
            LogArg::Value(_) => None,
        }
    }

    fn text(&self) -> String {
        match self {
            LogArg::Value(value) => value.clone(),
            LogArg::Error(report) => report.headline(),
        }
    }
}

macro_rules! log_arg_from_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for LogArg {
                fn from(value: $ty) -> Self {
                    LogArg::Value(value.to_string())
                }
            }
        )*
    };
}

log_arg_from_display!(
    &str, String, &String, char, bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128,
    usize, f32, f64
);

impl From<Arc<ErrorReport>> for LogArg {
    fn from(report: Arc<ErrorReport>) -> Self {
        LogArg::Error(report)
    }
}

impl From<&Arc<ErrorReport>> for LogArg {
    fn from(report: &Arc<ErrorReport>) -> Self {
        LogArg::Error(Arc::clone(report))
    }
}

/// Message after substitution, with the error bound from the arguments
#[derive(Debug, Clone)]
pub struct FormattedMessage {
    pub message: String,
    pub error: Option<Arc<ErrorReport>>,
}

/// Substitute `args` into the `{}` placeholders of `pattern`
///
/// A trailing error argument is never substituted; it is returned as the
/// attached error. Placeholders without an argument stay as `{}`, extra
/// arguments are ignored. `\{}` renders a literal `{}` and `\\{}` renders a
/// backslash followed by the argument; once every argument is consumed the
/// rest of the pattern is kept as written.
///
/// ```
/// use rust_context_logger::{format_message, LogArg};
///
/// let formatted = format_message("{} of {}", &["3".into(), 5.into()]);
/// assert_eq!(formatted.message, "3 of 5");
///
/// let formatted = format_message("{} and {}", &["one".into()]);
/// assert_eq!(formatted.message, "one and {}");
/// ```
pub fn format_message(pattern: &str, args: &[LogArg]) -> FormattedMessage {
    let (args, error) = match args.split_last() {
        Some((last, rest)) if last.as_error().is_some() => (rest, last.as_error().cloned()),
        _ => (args, None),
    };

    if args.is_empty() {
        return FormattedMessage {
            message: pattern.to_string(),
            error,
        };
    }

    let mut out = String::with_capacity(pattern.len() + 16 * args.len());
    let mut rest = pattern;
    let mut next_arg = args.iter().peekable();

    // once the arguments are used up the remainder is copied verbatim
    while next_arg.peek().is_some() {
        let Some(pos) = rest.find(DELIMITER) else {
            break;
        };
        let before = &rest[..pos];
        let escaped = before.ends_with(ESCAPE);
        let double_escaped = escaped && before[..before.len() - 1].ends_with(ESCAPE);

        if escaped && !double_escaped {
            out.push_str(&before[..before.len() - 1]);
            out.push_str(DELIMITER);
            rest = &rest[pos + DELIMITER.len()..];
            continue;
        }

        if let Some(arg) = next_arg.next() {
            let kept = if double_escaped { &before[..before.len() - 1] } else { before };
            out.push_str(kept);
            out.push_str(&arg.text());
            rest = &rest[pos + DELIMITER.len()..];
        }
    }
    out.push_str(rest);

    FormattedMessage {
        message: out,
        error,
    }
}
