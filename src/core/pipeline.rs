//! The logging pipeline: configuration, dispatch and alert wiring

use super::{
    config::{LoggerConfig, CONFIG_NAMESPACE},
    error::{LoggerError, Result},
    error_report::ErrorReport,
    level_registry::LevelRegistry,
    log_context::ContextStore,
    log_level::LogLevel,
    logger::Logger,
    metrics::LoggerMetrics,
    sink::Sink,
    stack_filter::StackFilter,
    template::TemplateRenderer,
};
use crate::notification::{
    notifications_suppressed, FailureReporter, NotificationEvent, NotificationQueue,
    SmtpTransport, Transport,
};
use crate::sinks::ConsoleSink;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Default shutdown timeout for the notification worker (5 seconds)
///
/// Used when the pipeline is dropped without an explicit `shutdown()`.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Logger that reports failed notification deliveries
pub const NOTIFICATION_LOGGER: &str = "context-logger.notification";

/// Creates a transport for each notification worker
pub type TransportFactory = Arc<dyn Fn() -> Box<dyn Transport> + Send + Sync>;

struct Settings {
    registry: LevelRegistry,
    renderer: TemplateRenderer,
    threshold: Option<LogLevel>,
    stack_filter: StackFilter,
}

impl Settings {
    fn from_config(config: &LoggerConfig, context: &ContextStore) -> Self {
        let mut registry = LevelRegistry::new(config.default_level);
        for (prefix, level) in &config.overrides {
            registry.set_override(prefix.clone(), *level);
        }
        Self {
            registry,
            renderer: TemplateRenderer::new(config.template.clone(), context.clone()),
            threshold: None,
            stack_filter: config.stack_filter.clone(),
        }
    }
}

/// State shared by the pipeline and every logger it hands out
pub(crate) struct PipelineState {
    settings: RwLock<Settings>,
    sink: Mutex<Box<dyn Sink>>,
    notifier: RwLock<Option<NotificationQueue>>,
    pending_error: Mutex<Option<LoggerError>>,
    context: ContextStore,
    metrics: Arc<LoggerMetrics>,
    transport_factory: TransportFactory,
}

impl PipelineState {
    pub(crate) fn dispatch(
        &self,
        logger: &str,
        level: LogLevel,
        message: &str,
        error: Option<&Arc<ErrorReport>>,
    ) {
        let pending = self.pending_error.lock().take();
        if let Some(config_error) = pending {
            let report = ErrorReport::from_error(&config_error);
            let message = format!("{} configuration error", CONFIG_NAMESPACE);
            self.dispatch(logger, LogLevel::Error, &message, Some(&report));
        }

        let (line, threshold) = {
            let settings = self.settings.read();
            (
                settings.renderer.render(logger, level, message),
                settings.threshold,
            )
        };

        self.write_line(&line, error);

        let notify = threshold.is_some_and(|threshold| level >= threshold);
        if notify && !notifications_suppressed() {
            if let Some(report) = error {
                self.settings.read().stack_filter.strip(report);
            }
            self.enqueue(NotificationEvent::from_rendered(&line, error));
        }
    }

    /// Write to the sink with panic isolation
    fn write_line(&self, line: &str, error: Option<&Arc<ErrorReport>>) {
        let mut sink = self.sink.lock();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| match error {
            Some(report) => sink.write_with_error(line, report),
            None => sink.write(line),
        }));

        match result {
            Ok(Ok(())) => {
                self.metrics.record_written();
            }
            Ok(Err(e)) => {
                self.metrics.record_sink_failure();
                eprintln!("[LOGGER ERROR] Sink '{}' failed: {}", sink.name(), e);
            }
            Err(panic_info) => {
                self.metrics.record_sink_failure();
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                eprintln!("[LOGGER CRITICAL] Sink '{}' panicked: {}", sink.name(), panic_msg);
            }
        }
    }

    fn enqueue(&self, event: NotificationEvent) {
        let notifier = self.notifier.read();
        if let Some(queue) = notifier.as_ref() {
            if let Err(e) = queue.enqueue(event) {
                eprintln!("[LOGGER WARNING] Notification not queued: {}", e);
            }
        }
    }

    fn report_notification_failure(&self, event: &NotificationEvent, error: &LoggerError) {
        let level = self.settings.read().registry.resolve(NOTIFICATION_LOGGER);
        if LogLevel::Error < level {
            return;
        }
        let message = format!("could not deliver notification '{}'", event.subject);
        let report = ErrorReport::from_error(error);
        self.dispatch(NOTIFICATION_LOGGER, LogLevel::Error, &message, Some(&report));
    }

    fn flush(&self) -> Result<()> {
        self.sink.lock().flush()
    }
}

/// A configured logging pipeline
///
/// # Example
///
/// ```
/// use rust_context_logger::prelude::*;
///
/// let sink = MemorySink::new();
/// let pipeline = Pipeline::builder()
///     .sink(sink.clone())
///     .param("context-logger.format", "%logger [%level] %message")
///     .param("context-logger.app.db.level", "debug")
///     .build();
///
/// let logger = pipeline.logger("app.db.pool");
/// logger.debug_with("{} connections", 4);
///
/// assert_eq!(sink.lines(), vec!["app.db.pool [debug] 4 connections"]);
/// ```
pub struct Pipeline {
    state: Arc<PipelineState>,
    loggers: Mutex<HashMap<String, Arc<Logger>>>,
}

impl Pipeline {
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Pipeline with default configuration writing to `sink`
    pub fn new(sink: impl Sink + 'static) -> Self {
        Self::builder().sink(sink).build()
    }

    fn with_parts(sink: Box<dyn Sink>, transport_factory: TransportFactory) -> Self {
        let context = ContextStore::new();
        let settings = Settings::from_config(&LoggerConfig::default(), &context);
        Self {
            state: Arc::new(PipelineState {
                settings: RwLock::new(settings),
                sink: Mutex::new(sink),
                notifier: RwLock::new(None),
                pending_error: Mutex::new(None),
                context,
                metrics: Arc::new(LoggerMetrics::new()),
                transport_factory,
            }),
            loggers: Mutex::new(HashMap::new()),
        }
    }

    /// Configure from key/value parameters
    ///
    /// Parameters are applied in order on top of the defaults. The first
    /// invalid one stops processing; everything before it stays in effect
    /// and the error is logged once, on the next enabled log call. Returns
    /// `false` if an error was recorded.
    pub fn configure<I, K, V>(&self, params: I) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = LoggerConfig::default();
        let mut failure = None;
        for (key, value) in params {
            if let Err(e) = config.apply(key.as_ref(), value.as_ref()) {
                failure = Some(e);
                break;
            }
        }

        if let Err(e) = self.apply(config) {
            failure.get_or_insert(e);
        }

        match failure {
            Some(e) => {
                *self.state.pending_error.lock() = Some(e);
                false
            }
            None => true,
        }
    }

    /// Replace the active configuration
    ///
    /// Existing loggers pick up their new effective level. A running
    /// notification worker is stopped and, if the configuration asks for
    /// notifications, a new one is started.
    ///
    /// # Errors
    ///
    /// Fails if the notification worker cannot be started; the rest of the
    /// configuration is applied regardless.
    pub fn apply(&self, config: LoggerConfig) -> Result<()> {
        let previous = self.state.notifier.write().take();
        if let Some(mut queue) = previous {
            queue.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
        }

        let mut settings = Settings::from_config(&config, &self.state.context);
        let notification = config.resolved_notification();
        let started = match notification {
            Some(notification) => NotificationQueue::start(
                notification.target,
                (self.state.transport_factory)(),
                self.failure_reporter(),
                Arc::clone(&self.state.metrics),
            )
            .map(|queue| {
                settings.threshold = Some(notification.threshold);
                Some(queue)
            }),
            None => Ok(None),
        };

        let registry = settings.registry.clone();
        *self.state.settings.write() = settings;

        let result = match started {
            Ok(queue) => {
                *self.state.notifier.write() = queue;
                Ok(())
            }
            Err(e) => Err(e),
        };

        for logger in self.loggers.lock().values() {
            logger.refresh(&registry);
        }
        result
    }

    fn failure_reporter(&self) -> FailureReporter {
        let state: Weak<PipelineState> = Arc::downgrade(&self.state);
        Arc::new(move |event, error| {
            if let Some(state) = state.upgrade() {
                state.report_notification_failure(event, error);
            }
        })
    }

    /// Logger for `name`, created on first use
    pub fn logger(&self, name: &str) -> Arc<Logger> {
        let mut loggers = self.loggers.lock();
        if let Some(logger) = loggers.get(name) {
            return Arc::clone(logger);
        }

        let level = self.state.settings.read().registry.resolve(name);
        let logger = Arc::new(Logger::new(name, level, Arc::clone(&self.state)));
        loggers.insert(name.to_string(), Arc::clone(&logger));
        logger
    }

    /// Effective level `name` would get
    pub fn effective_level(&self, name: &str) -> LogLevel {
        self.state.settings.read().registry.resolve(name)
    }

    /// Context values referenced by `%key` template directives
    pub fn context(&self) -> &ContextStore {
        &self.state.context
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.state.metrics
    }

    pub fn has_pending_error(&self) -> bool {
        self.state.pending_error.lock().is_some()
    }

    /// Take the configuration error that has not been logged yet
    pub fn take_pending_error(&self) -> Option<LoggerError> {
        self.state.pending_error.lock().take()
    }

    /// Whether a notification worker is running
    pub fn notifications_enabled(&self) -> bool {
        self.state
            .notifier
            .read()
            .as_ref()
            .is_some_and(NotificationQueue::is_running)
    }

    pub fn flush(&self) -> Result<()> {
        self.state.flush()
    }

    /// Stop the notification worker and flush the sink
    ///
    /// Returns `true` if the worker exited within `timeout` and the flush
    /// succeeded. Logging keeps working afterwards, without notifications.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.state.settings.write().threshold = None;

        let queue = self.state.notifier.write().take();
        let mut clean = match queue {
            Some(mut queue) => queue.shutdown(timeout),
            None => true,
        };

        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
            clean = false;
        }

        let metrics = &self.state.metrics;
        let dropped = metrics.notifications_dropped();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Pipeline shut down with {} undelivered notifications",
                dropped
            );
        }
        clean
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    }
}

/// Builder for constructing a [`Pipeline`]
pub struct PipelineBuilder {
    sink: Option<Box<dyn Sink>>,
    transport_factory: Option<TransportFactory>,
    config: Option<LoggerConfig>,
    params: Vec<(String, String)>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            sink: None,
            transport_factory: None,
            config: None,
            params: Vec::new(),
        }
    }

    /// Output destination; defaults to a [`ConsoleSink`] on stdout
    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Transport used by notification workers; defaults to SMTP
    #[must_use = "builder methods return a new value"]
    pub fn transport<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Transport> + Send + Sync + 'static,
    {
        self.transport_factory = Some(Arc::new(factory));
        self
    }

    /// Typed configuration; ignored when parameters are also given
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Add a configuration parameter
    #[must_use = "builder methods return a new value"]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Build the pipeline
    ///
    /// Configuration errors do not fail the build; they become the pending
    /// error logged on first use.
    pub fn build(self) -> Pipeline {
        let sink: Box<dyn Sink> = match self.sink {
            Some(sink) => sink,
            None => Box::new(ConsoleSink::new()),
        };
        let transport_factory: TransportFactory = match self.transport_factory {
            Some(factory) => factory,
            None => Arc::new(|| Box::new(SmtpTransport::new()) as Box<dyn Transport>),
        };

        let pipeline = Pipeline::with_parts(sink, transport_factory);
        if !self.params.is_empty() {
            pipeline.configure(self.params);
        } else if let Some(config) = self.config {
            if let Err(e) = pipeline.apply(config) {
                *pipeline.state.pending_error.lock() = Some(e);
            }
        }
        pipeline
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error_report::StackFrame;
    use crate::notification::MailTarget;
    use crate::sinks::MemorySink;
    use std::thread;
    use std::time::Instant;

    fn key(suffix: &str) -> String {
        format!("{}.{}", CONFIG_NAMESPACE, suffix)
    }

    struct Recording {
        events: Arc<Mutex<Vec<NotificationEvent>>>,
        fail: bool,
    }

    impl Transport for Recording {
        fn deliver(&mut self, _target: &MailTarget, event: &NotificationEvent) -> Result<()> {
            if self.fail {
                return Err(LoggerError::smtp("greeting", "421 unavailable"));
            }
            self.events.lock().push(event.clone());
            Ok(())
        }
    }

    fn recording_pipeline(
        fail: bool,
        params: Vec<(String, &str)>,
    ) -> (Pipeline, MemorySink, Arc<Mutex<Vec<NotificationEvent>>>) {
        let sink = MemorySink::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = Arc::clone(&events);
        let mut builder = Pipeline::builder()
            .sink(sink.clone())
            .transport(move || {
                Box::new(Recording {
                    events: Arc::clone(&events_clone),
                    fail,
                })
            });
        for (k, v) in params {
            builder = builder.param(k, v);
        }
        (builder.build(), sink, events)
    }

    fn wait_for(condition: impl Fn() -> bool) {
        let start = Instant::now();
        while !condition() && start.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_default_pipeline() {
        let sink = MemorySink::new();
        let pipeline = Pipeline::new(sink.clone());
        pipeline.context().put("ip", "10.1.1.1");

        let logger = pipeline.logger("web");
        logger.info("started");
        logger.debug("hidden");

        assert_eq!(sink.lines(), vec!["web [info.] [10.1.1.1] started"]);
        assert_eq!(pipeline.metrics().lines_written(), 1);
    }

    #[test]
    fn test_loggers_are_memoized() {
        let pipeline = Pipeline::new(MemorySink::new());
        let a = pipeline.logger("app");
        let b = pipeline.logger("app");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &pipeline.logger("app.db")));
    }

    #[test]
    fn test_pending_error_logged_once() {
        let sink = MemorySink::new();
        let pipeline = Pipeline::builder()
            .sink(sink.clone())
            .param(key("format"), "%level %logger %message")
            .param(key("level"), "loud")
            .param(key("format"), "never applied")
            .build();
        assert!(pipeline.has_pending_error());

        let logger = pipeline.logger("app");
        logger.info("first");
        logger.info("second");

        let entries = sink.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].line, "error app context-logger configuration error");
        assert!(entries[0]
            .trace
            .as_deref()
            .is_some_and(|t| t.contains("Invalid log level: 'loud'")));
        assert_eq!(entries[1].line, "info. app first");
        assert_eq!(entries[2].line, "info. app second");
        assert!(!pipeline.has_pending_error());
    }

    #[test]
    fn test_pending_error_waits_for_enabled_call() {
        let sink = MemorySink::new();
        let pipeline = Pipeline::builder()
            .sink(sink.clone())
            .param(key("level"), "warn")
            .param(key("bogus"), "x")
            .build();

        pipeline.logger("app").info("gated");
        assert!(sink.is_empty());
        assert!(pipeline.has_pending_error());

        let taken = pipeline.take_pending_error().expect("pending");
        assert!(matches!(taken, LoggerError::InvalidParameter { .. }));
        pipeline.logger("app").warn("now");
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_reconfigure_refreshes_existing_loggers() {
        let pipeline = Pipeline::new(MemorySink::new());
        let logger = pipeline.logger("app.db.pool");
        assert_eq!(logger.level(), LogLevel::Info);

        assert!(pipeline.configure([(key("app.db.level"), "trace")]));
        assert_eq!(logger.level(), LogLevel::Trace);
        assert_eq!(pipeline.effective_level("app.web"), LogLevel::Info);

        assert!(pipeline.configure([(key("level"), "error")]));
        assert_eq!(logger.level(), LogLevel::Error);
    }

    #[test]
    fn test_notification_sent_at_threshold() {
        let (pipeline, sink, events) = recording_pipeline(
            false,
            vec![
                (key("format"), "%logger [%level] %message"),
                (key("notification"), "warn:smtp:localhost:25:a@b:c@d"),
            ],
        );
        assert!(pipeline.notifications_enabled());

        let logger = pipeline.logger("jobs");
        logger.info("fine");
        let report = Arc::new(
            ErrorReport::new("app::JobError", "exhausted")
                .with_frame(StackFrame::new("std::panicking", "try"))
                .with_frame(StackFrame::new("app::jobs", "run")),
        );
        logger.error_error("retry budget exhausted", &report);

        wait_for(|| !events.lock().is_empty());
        assert!(pipeline.shutdown(Duration::from_secs(5)));

        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].subject, "jobs [error] retry budget exhausted");
        assert!(events[0].body.contains("app::jobs::run"));
        assert!(!events[0].body.contains("std::panicking"));

        // the sink saw the unstripped trace
        let entries = sink.entries();
        assert!(entries[1]
            .trace
            .as_deref()
            .is_some_and(|t| t.contains("std::panicking")));
    }

    #[test]
    fn test_failed_delivery_is_logged_not_notified() {
        let (pipeline, sink, _events) = recording_pipeline(
            true,
            vec![
                (key("format"), "%logger %message"),
                (key("notification"), "error:smtp:localhost:25:a@b:c@d"),
            ],
        );

        pipeline.logger("jobs").error("boom");
        wait_for(|| sink.len() >= 2);
        pipeline.shutdown(Duration::from_secs(5));

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "jobs boom");
        assert_eq!(
            lines[1],
            "context-logger.notification could not deliver notification 'jobs boom'"
        );
        assert_eq!(pipeline.metrics().notifications_enqueued(), 1);
        assert_eq!(pipeline.metrics().notifications_failed(), 1);
    }

    #[test]
    fn test_shutdown_disables_notifications() {
        let (pipeline, sink, events) = recording_pipeline(
            false,
            vec![(key("notification"), "error:smtp:localhost:25:a@b:c@d")],
        );
        assert!(pipeline.shutdown(Duration::from_secs(5)));
        assert!(!pipeline.notifications_enabled());

        pipeline.logger("app").error("after shutdown");
        assert_eq!(sink.len(), 1);
        assert!(events.lock().is_empty());
        assert_eq!(pipeline.metrics().notifications_enqueued(), 0);
    }

    #[test]
    fn test_failing_sink_is_isolated() {
        struct Broken;
        impl Sink for Broken {
            fn write(&mut self, _line: &str) -> Result<()> {
                Err(LoggerError::writer("disk full"))
            }
            fn name(&self) -> &str {
                "broken"
            }
        }

        struct Panicking;
        impl Sink for Panicking {
            fn write(&mut self, _line: &str) -> Result<()> {
                panic!("sink exploded");
            }
            fn name(&self) -> &str {
                "panicking"
            }
        }

        let pipeline = Pipeline::new(Broken);
        pipeline.logger("app").info("lost");
        assert_eq!(pipeline.metrics().sink_failures(), 1);

        let pipeline = Pipeline::new(Panicking);
        pipeline.logger("app").info("lost");
        assert_eq!(pipeline.metrics().sink_failures(), 1);
    }
}
