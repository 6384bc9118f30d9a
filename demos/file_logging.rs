//! File logging example
//!
//! Routes two modules to separate files, one of them echoed to the console,
//! and shows messages emitted before registration being replayed.
//!
//! Run with: cargo run --example file_logging

use rust_module_logger::prelude::*;
use rust_module_logger::{info, warning};
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Rust Module Logger - File Logging Example ===\n");

    let manager = LogManager::builder()
        .default_folder("logs")
        .file_tag(FileTag::Number)
        .max_file_size(64 * 1024)
        .build();

    let removed = manager.clear_log_folder("logs", Duration::from_secs(7 * 24 * 60 * 60))?;
    println!("Removed {} log files older than a week\n", removed);

    // Emitted before any destination exists: kept in the backlog
    manager.info("app", "Application started");
    manager.debug("app", "Loading configuration...");

    println!("1. Registering destinations:");
    manager.add_destination(
        "application",
        ["app"],
        DestinationOptions::new().mode(LogMode::Full).notify(true),
    );
    manager.add_destination(
        "database",
        ["db", "cache"],
        DestinationOptions::new().level(LogLevel::Warning),
    );

    info!(manager, "app", "Configuration loaded successfully");
    manager.info("db", "Connecting to database...");
    warning!(manager, "db", "Slow connection: {} ms", 850);
    manager.error("cache", "Failed to warm cache");

    println!("\n2. Performing some operations:");
    for i in 1..=5 {
        manager.info("app", format!("Processing item {}/5", i));
        if i == 3 {
            manager.pause();
            manager.warning("app", "Dropped while paused");
            manager.resume();
        }
    }

    manager.info("app", "All operations completed");

    if !manager.close_all() {
        eprintln!("Some destinations did not finish in time");
    }

    let metrics = manager.metrics();
    println!(
        "\nwritten: {}, filtered: {}, replayed: {}",
        metrics.written(),
        metrics.filtered(),
        metrics.replayed()
    );
    println!("\n=== Example completed successfully! ===");
    println!("Check 'logs/application.log' and 'logs/database.log' for the output");

    Ok(())
}
