//! Background delivery of notifications
//!
//! Producers hand events to [`NotificationQueue::enqueue`] and return at
//! once. A single worker thread takes them in FIFO order and passes each to
//! the transport. Failures go to a reporter callback, which runs with
//! notifications suppressed on the worker thread so a failing mail server
//! cannot feed alerts about itself back into the queue.

use super::event::NotificationEvent;
use super::smtp::{MailTarget, Transport};
use crate::core::error::{LoggerError, Result};
use crate::core::metrics::LoggerMetrics;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub const WORKER_THREAD_NAME: &str = "smtp-notifier";

/// Called on the worker thread when a delivery fails
pub type FailureReporter = Arc<dyn Fn(&NotificationEvent, &LoggerError) + Send + Sync>;

thread_local! {
    static SUPPRESSED: Cell<bool> = const { Cell::new(false) };
}

/// Whether notifications are suppressed on the current thread
pub fn notifications_suppressed() -> bool {
    SUPPRESSED.with(Cell::get)
}

/// Run `f` with notifications suppressed on the current thread
pub fn suppress_notifications<R>(f: impl FnOnce() -> R) -> R {
    struct Restore(bool);
    impl Drop for Restore {
        fn drop(&mut self) {
            SUPPRESSED.with(|flag| flag.set(self.0));
        }
    }

    let _restore = Restore(SUPPRESSED.with(|flag| flag.replace(true)));
    f()
}

enum Command {
    Deliver(NotificationEvent),
    Wake,
}

pub struct NotificationQueue {
    sender: Sender<Command>,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    metrics: Arc<LoggerMetrics>,
}

impl NotificationQueue {
    /// Spawn the delivery worker
    ///
    /// # Errors
    ///
    /// Fails if the worker thread cannot be spawned.
    pub fn start(
        target: MailTarget,
        transport: Box<dyn Transport>,
        reporter: FailureReporter,
        metrics: Arc<LoggerMetrics>,
    ) -> Result<Self> {
        let (sender, receiver) = unbounded();
        let stop = Arc::new(AtomicBool::new(false));

        let worker = Worker {
            receiver,
            stop: Arc::clone(&stop),
            target,
            transport,
            reporter,
            metrics: Arc::clone(&metrics),
        };

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker.run())
            .map_err(|e| LoggerError::io_operation("spawning notification worker", WORKER_THREAD_NAME, e))?;

        Ok(Self {
            sender,
            stop,
            handle: Some(handle),
            metrics,
        })
    }

    /// Queue an event without blocking
    ///
    /// # Errors
    ///
    /// [`LoggerError::NotifierStopped`] once shutdown has begun.
    pub fn enqueue(&self, event: NotificationEvent) -> Result<()> {
        if self.stop.load(Ordering::Acquire) {
            self.metrics.record_notification_dropped();
            return Err(LoggerError::NotifierStopped);
        }
        match self.sender.send(Command::Deliver(event)) {
            Ok(()) => {
                self.metrics.record_notification_enqueued();
                Ok(())
            }
            Err(_) => {
                self.metrics.record_notification_dropped();
                Err(LoggerError::NotifierStopped)
            }
        }
    }

    /// Events waiting for the worker
    pub fn pending(&self) -> usize {
        self.sender.len()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the worker and wait up to `timeout` for it to exit
    ///
    /// A delivery in progress is allowed to finish; events still queued are
    /// discarded and counted as dropped. Returns `true` if the worker exited
    /// within the timeout.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        self.stop.store(true, Ordering::Release);
        let _ = self.sender.send(Command::Wake);

        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => return true,
        };

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    eprintln!("[LOGGER ERROR] Notification worker panicked during shutdown: {:?}", e);
                    return false;
                }
                return true;
            }

            if start.elapsed() >= timeout {
                eprintln!(
                    "[LOGGER WARNING] Notification worker did not finish within {:?}. \
                     Pending notifications may be lost.",
                    timeout
                );
                return false;
            }

            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for NotificationQueue {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shutdown(crate::core::pipeline::DEFAULT_SHUTDOWN_TIMEOUT);
        }
    }
}

struct Worker {
    receiver: Receiver<Command>,
    stop: Arc<AtomicBool>,
    target: MailTarget,
    transport: Box<dyn Transport>,
    reporter: FailureReporter,
    metrics: Arc<LoggerMetrics>,
}

impl Worker {
    fn run(mut self) {
        loop {
            if self.stop.load(Ordering::Acquire) {
                break;
            }
            match self.receiver.recv() {
                Ok(Command::Deliver(event)) => self.deliver(&event),
                Ok(Command::Wake) => continue,
                Err(_) => break,
            }
        }

        while let Ok(command) = self.receiver.try_recv() {
            if let Command::Deliver(_) = command {
                self.metrics.record_notification_dropped();
            }
        }
    }

    fn deliver(&mut self, event: &NotificationEvent) {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.transport.deliver(&self.target, event)
        }));

        let error = match result {
            Ok(Ok(())) => {
                self.metrics.record_notification_delivered();
                return;
            }
            Ok(Err(e)) => e,
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                LoggerError::other(format!("transport panicked: {}", panic_msg))
            }
        };

        self.metrics.record_notification_failed();
        let reporter = Arc::clone(&self.reporter);
        suppress_notifications(|| reporter(event, &error));
    }
}
