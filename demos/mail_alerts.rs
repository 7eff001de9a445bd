//! Mail alert example
//!
//! Demonstrates the notification threshold. Alerts are sent from a
//! background worker; this example swaps the SMTP transport for one that
//! prints the mail, so it runs without a mail server.
//!
//! Run with: cargo run --example mail_alerts

use rust_context_logger::prelude::*;
use std::time::Duration;

/// Prints mail instead of sending it
struct PrintTransport;

impl Transport for PrintTransport {
    fn deliver(&mut self, target: &MailTarget, event: &NotificationEvent) -> Result<()> {
        println!(
            "   [mail to {} via {}:{}] {}",
            target.to, target.host, target.port, event.subject
        );
        Ok(())
    }
}

fn main() -> Result<()> {
    println!("=== Context Logger - Mail Alert Example ===\n");

    let pipeline = Pipeline::builder()
        .transport(|| Box::new(PrintTransport))
        .param("context-logger.format", "%logger [%level] %message")
        .param(
            "context-logger.notification",
            "error:smtp:mail.example.com:25:app@example.com:ops@example.com",
        )
        .build();

    println!("1. Only ERROR entries raise an alert:");
    let logger = pipeline.logger("billing");
    logger.warn("retrying payment provider");
    logger.error_with("invoice {} could not be charged", "inv-1001");

    println!("\n2. Shutting down drains the alert worker:");
    let stopped = pipeline.shutdown(Duration::from_secs(5));
    println!("   worker stopped cleanly: {}", stopped);

    let metrics = pipeline.metrics();
    println!(
        "   alerts enqueued: {}, delivered: {}",
        metrics.notifications_enqueued(),
        metrics.notifications_delivered()
    );

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
