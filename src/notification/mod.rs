//! Alert delivery for severe log lines

pub mod event;
pub mod queue;
pub mod smtp;

pub use event::NotificationEvent;
pub use queue::{
    notifications_suppressed, suppress_notifications, FailureReporter, NotificationQueue,
    WORKER_THREAD_NAME,
};
pub use smtp::{Credentials, MailTarget, SmtpTransport, Transport, DEFAULT_SMTP_TIMEOUT};
