//! Basic pipeline usage example
//!
//! Demonstrates console output, level overrides, templates and the
//! diagnostic context.
//!
//! Run with: cargo run --example basic_usage

use rust_context_logger::info;
use rust_context_logger::prelude::*;
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== Context Logger - Basic Usage Example ===\n");

    // Create a pipeline writing to stdout
    let pipeline = Pipeline::builder()
        .param("context-logger.level", "info")
        .param("context-logger.format", "%date %LEVEL %logger [%ip] %message")
        .param("context-logger.app.db.level", "debug")
        .build();

    let web = pipeline.logger("app.web");
    let db = pipeline.logger("app.db.pool");

    println!("1. Default level INFO, app.db overridden to DEBUG:");
    web.debug("Debug message (hidden)");
    web.info("Info message (visible)");
    db.debug_with("pool size is {}", 8);

    println!("\n2. Diagnostic context:");
    {
        let _guard = pipeline.context().put_scoped("ip", "203.0.113.9");
        web.info_with2("GET {} -> {}", "/orders", 200);
    }
    web.info("request finished, ip tag cleared");

    println!("\n3. Errors with traces:");
    let report = Arc::new(
        ErrorReport::new("app::db::PoolError", "no connection available")
            .with_frame(StackFrame::new("app::db::pool", "checkout").at("src/db/pool.rs", 42)),
    );
    db.error_error("query failed", &report);

    println!("\n4. Formatting macros:");
    let user = "alice";
    info!(web, "user {} signed in", user);

    pipeline.flush()?;
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
