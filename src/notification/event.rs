//! Alert messages produced from severe log lines

use crate::core::error_report::ErrorReport;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub subject: String,
    pub body: String,
}

impl NotificationEvent {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Build an alert from a rendered line and its attached error
    ///
    /// The subject is the first line of the rendered text; the body is the
    /// full text followed by the error trace, if any.
    pub fn from_rendered(rendered: &str, error: Option<&Arc<ErrorReport>>) -> Self {
        let subject = rendered
            .split('\n')
            .next()
            .unwrap_or_default()
            .trim_end_matches('\r');

        let mut body = String::with_capacity(rendered.len() + 256);
        body.push_str(rendered);
        if let Some(report) = error {
            if !body.ends_with('\n') {
                body.push('\n');
            }
            body.push_str(&report.render_trace());
        }

        Self::new(subject, body)
    }
}
