//! Criterion benchmarks for rust_module_logger

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_module_logger::prelude::*;
use rust_module_logger::PendingMessage;
use std::sync::Arc;
use tempfile::TempDir;

fn file_manager(temp_dir: &TempDir, level: LogLevel) -> LogManager {
    let manager = LogManager::builder()
        .default_folder(temp_dir.path().to_string_lossy())
        .file_handling(FileHandling::Single)
        .default_level(level)
        .build();
    manager.add_destination("bench", ["bench"], DestinationOptions::new());
    manager
}

// ============================================================================
// Manager Creation Benchmarks
// ============================================================================

fn bench_manager_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("manager_creation");
    group.throughput(Throughput::Elements(1));

    group.bench_function("new", |b| {
        b.iter(|| {
            let manager = LogManager::new();
            black_box(manager)
        });
    });

    group.bench_function("add_destination", |b| {
        let temp_dir = TempDir::new().unwrap();
        b.iter(|| {
            let manager = file_manager(&temp_dir, LogLevel::Info);
            black_box(manager.destination_count())
        });
    });

    group.finish();
}

// ============================================================================
// Emit Benchmarks
// ============================================================================

fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");
    group.throughput(Throughput::Elements(1));

    let temp_dir = TempDir::new().unwrap();
    let manager = file_manager(&temp_dir, LogLevel::Trace);

    group.bench_function("info_bound", |b| {
        b.iter(|| {
            manager.info("bench", black_box("Info message"));
        });
    });

    group.bench_function("debug_with_location", |b| {
        b.iter(|| {
            manager.debug("bench", black_box("Debug message"));
        });
    });

    group.bench_function("unbound_backlog_full", |b| {
        b.iter(|| {
            manager.info("nobody", black_box("Dropped message"));
        });
    });

    group.finish();
    manager.close_all();
}

fn bench_concurrent_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_emit");

    let temp_dir = TempDir::new().unwrap();
    let manager = Arc::new(file_manager(&temp_dir, LogLevel::Info));

    group.bench_function("multi_thread_4", |b| {
        let manager = Arc::clone(&manager);
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let manager = Arc::clone(&manager);
                    std::thread::spawn(move || {
                        manager.info("bench", black_box("Concurrent message"));
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }
        });
    });

    group.finish();
    manager.close_all();
}

// ============================================================================
// Filtering Benchmarks
// ============================================================================

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");
    group.throughput(Throughput::Elements(1));

    let temp_dir = TempDir::new().unwrap();
    let manager = file_manager(&temp_dir, LogLevel::Warning);

    group.bench_function("below_threshold", |b| {
        b.iter(|| {
            manager.debug("bench", black_box("This should be filtered"));
        });
    });

    group.bench_function("above_threshold", |b| {
        b.iter(|| {
            manager.error("bench", black_box("This should be logged"));
        });
    });

    group.finish();
    manager.close_all();
}

// ============================================================================
// Formatting Benchmarks
// ============================================================================

fn bench_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatting");
    group.throughput(Throughput::Elements(1));

    let msg = PendingMessage::new(
        "bench",
        LogLevel::Debug,
        "Formatted message",
        SourceLocation::new("bench_formatting", "benches/logger_benchmarks.rs", 42),
    );

    group.bench_function("pending_message_new", |b| {
        b.iter(|| {
            let msg = PendingMessage::new(
                black_box("bench"),
                black_box(LogLevel::Info),
                black_box("Test message"),
                SourceLocation::none(),
            );
            black_box(msg)
        });
    });

    group.bench_function("default_layout", |b| {
        b.iter(|| black_box(MessageFormat::Default.format(black_box(&msg))));
    });

    let custom = MessageFormat::Custom(MessageFields::with_function_location());
    group.bench_function("custom_layout", |b| {
        b.iter(|| black_box(custom.format(black_box(&msg))));
    });

    group.bench_function("to_json", |b| {
        b.iter(|| {
            let json = serde_json::to_string(&msg).unwrap();
            black_box(json)
        });
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_manager_creation,
    bench_emit,
    bench_concurrent_emit,
    bench_level_filtering,
    bench_formatting
);

criterion_main!(benches);
