//! Integration tests for the buffering and flush discipline
//!
//! These tests drive the sampling loop one iteration at a time through the
//! controller, so tick counts are exact:
//! - Overflow flush with head retention
//! - Save merging the temp store with the live buffer
//! - Reset and the temp-store policy after a save
//! - Storage and read failures

mod common;

use bridge_logger::storage::read_destination;
use common::builders::{ConfigBuilder, Harness};
use common::mock_helpers::{CountingSource, FlakySource};
use tempfile::TempDir;

fn values(samples: &[bridge_logger::Sample]) -> Vec<f64> {
    samples.iter().map(|s| s.value).collect()
}

fn assert_time_ordered(samples: &[bridge_logger::Sample]) {
    for pair in samples.windows(2) {
        assert!(
            pair[0].elapsed_time <= pair[1].elapsed_time,
            "elapsed time went backwards: {:?}",
            pair
        );
    }
}

#[test]
fn test_150_ticks_flush_once_and_save_everything() {
    let dir = TempDir::new().unwrap();
    let config = ConfigBuilder::new(&dir)
        .capacity(100)
        .filename("run1.csv")
        .build();
    let mut h = Harness::new(&config, Box::new(CountingSource::new()));

    h.controller.toggle_record(true);
    h.step(99);
    assert_eq!(h.sampling.buffer().len(), 99);
    assert!(h.sampling.store().is_empty().unwrap());

    // Tick 99 fills the buffer: ticks 0..=98 are flushed, tick 99 stays
    h.step(1);
    let flushed = h.sampling.store().read_all().unwrap();
    assert_eq!(flushed.len(), 99);
    assert_eq!(flushed.last().map(|s| s.value), Some(98.0));
    assert_eq!(h.sampling.buffer().len(), 1);
    assert_eq!(h.sampling.buffer().first().map(|s| s.value), Some(99.0));

    h.step(50);
    assert_eq!(h.sampling.buffer().len(), 51);
    assert_eq!(h.sampling.stats().flushes, 1);
    assert_eq!(
        values(h.sampling.buffer().samples()),
        (99..150).map(|v| v as f64).collect::<Vec<_>>()
    );

    assert!(h.controller.request_save().unwrap());
    h.step(1);
    h.controller.process_events();
    assert!(!h.controller.is_save_pending());

    let saved = read_destination(&config.storage.output_dir.join("run1.csv")).unwrap();
    assert_eq!(saved.len(), 150);
    assert_eq!(values(&saved), (0..150).map(|v| v as f64).collect::<Vec<_>>());
    assert_time_ordered(&saved);

    // Recording was on before the save, so it resumes
    assert!(h.controller.is_recording());
    assert_eq!(h.sampling.stats().samples_recorded, 150);
}

#[test]
fn test_buffer_never_exceeds_capacity() {
    let dir = TempDir::new().unwrap();
    let config = ConfigBuilder::new(&dir).capacity(7).build();
    let mut h = Harness::new(&config, Box::new(CountingSource::new()));

    h.controller.toggle_record(true);
    for _ in 0..100 {
        h.step(1);
        assert!(h.sampling.buffer().len() <= 7);
    }
}

#[test]
fn test_head_is_continuous_across_flush() {
    let dir = TempDir::new().unwrap();
    let config = ConfigBuilder::new(&dir).capacity(10).build();
    let mut h = Harness::new(&config, Box::new(CountingSource::new()));

    h.controller.toggle_record(true);
    h.step(9);
    let last_before = h.sampling.buffer().last().copied();
    h.step(1);

    // The sample that triggered the flush is the head of the next fill
    let head = h.sampling.buffer().first().copied();
    assert_eq!(head.map(|s| s.value), Some(9.0));
    assert_eq!(h.controller.latest_sample(), head);
    assert!(last_before.unwrap().elapsed_time <= head.unwrap().elapsed_time);
}

#[test]
fn test_reset_discards_everything() {
    let dir = TempDir::new().unwrap();
    let config = ConfigBuilder::new(&dir).capacity(10).build();
    let mut h = Harness::new(&config, Box::new(CountingSource::new()));

    h.controller.toggle_record(true);
    h.step(25);
    assert!(!h.sampling.store().is_empty().unwrap());

    assert!(h.controller.request_reset());
    h.step(1);
    h.controller.process_events();

    assert!(!h.controller.is_reset_pending());
    assert!(!h.controller.is_recording());
    assert!(h.sampling.buffer().is_empty());
    assert!(h.sampling.store().is_empty().unwrap());
    assert_eq!(h.controller.latest_sample(), None);

    // Recording again starts a fresh clock
    h.controller.toggle_record(true);
    h.step(1);
    let first = h.sampling.buffer().first().copied().unwrap();
    assert!(first.elapsed_time < 1.0);
    assert_eq!(h.sampling.stats().resets, 1);
}

#[test]
fn test_saves_do_not_repeat_rows_when_temp_is_cleared() {
    let dir = TempDir::new().unwrap();
    let config = ConfigBuilder::new(&dir)
        .capacity(10)
        .filename("run1.csv")
        .build();
    let mut h = Harness::new(&config, Box::new(CountingSource::new()));
    let destination = config.storage.output_dir.join("run1.csv");

    h.controller.toggle_record(true);
    h.step(25);
    h.controller.request_save().unwrap();
    h.step(1);
    h.controller.process_events();
    assert_eq!(read_destination(&destination).unwrap().len(), 25);
    assert!(h.sampling.store().is_empty().unwrap());

    h.step(5);
    h.controller.request_save().unwrap();
    h.step(1);
    h.controller.process_events();
    assert_eq!(
        values(&read_destination(&destination).unwrap()),
        vec![25.0, 26.0, 27.0, 28.0, 29.0]
    );
}

#[test]
fn test_saves_contain_full_history_when_temp_is_kept() {
    let dir = TempDir::new().unwrap();
    let config = ConfigBuilder::new(&dir)
        .capacity(10)
        .filename("run1.csv")
        .clear_temp_after_save(false)
        .build();
    let mut h = Harness::new(&config, Box::new(CountingSource::new()));
    let destination = config.storage.output_dir.join("run1.csv");

    h.controller.toggle_record(true);
    h.step(25);
    h.controller.request_save().unwrap();
    h.step(1);
    h.controller.process_events();
    assert_eq!(read_destination(&destination).unwrap().len(), 25);

    h.step(5);
    h.controller.request_save().unwrap();
    h.step(1);
    h.controller.process_events();

    let saved = read_destination(&destination).unwrap();
    assert_eq!(values(&saved), (0..30).map(|v| v as f64).collect::<Vec<_>>());
    assert_time_ordered(&saved);
}

#[test]
fn test_double_save_request_writes_once() {
    let dir = TempDir::new().unwrap();
    let config = ConfigBuilder::new(&dir).filename("run1.csv").build();
    let mut h = Harness::new(&config, Box::new(CountingSource::new()));

    h.controller.toggle_record(true);
    h.step(3);
    assert!(h.controller.request_save().unwrap());
    assert!(!h.controller.request_save().unwrap());
    h.step(2);
    h.controller.process_events();

    assert_eq!(h.sampling.stats().saves, 1);
}

#[test]
fn test_empty_save_writes_header_only() {
    let dir = TempDir::new().unwrap();
    let config = ConfigBuilder::new(&dir).filename("empty.csv").build();
    let mut h = Harness::new(&config, Box::new(CountingSource::new()));

    h.controller.request_save().unwrap();
    h.step(1);
    h.controller.process_events();

    let destination = config.storage.output_dir.join("empty.csv");
    let text = std::fs::read_to_string(&destination).unwrap();
    assert_eq!(text.trim(), "elapsed_time,value");
    assert!(read_destination(&destination).unwrap().is_empty());
    assert!(!h.controller.is_recording());
}

#[test]
fn test_invalid_filename_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = ConfigBuilder::new(&dir).filename("report.txt").build();
    let mut h = Harness::new(&config, Box::new(CountingSource::new()));

    h.controller.toggle_record(true);
    h.step(3);
    let err = h.controller.request_save().unwrap_err();
    assert!(err.is_input_error());
    h.step(1);

    assert!(h.controller.is_recording());
    assert_eq!(h.sampling.stats().saves, 0);
    assert!(!config.storage.output_dir.join("report.txt").exists());
    assert_eq!(h.sampling.buffer().len(), 4);
}

#[test]
fn test_failed_save_halts_recording() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let mut config = ConfigBuilder::new(&dir).filename("run1.csv").build();
    config.storage.output_dir = blocker;
    let mut h = Harness::new(&config, Box::new(CountingSource::new()));

    h.controller.toggle_record(true);
    h.step(3);
    h.controller.request_save().unwrap();
    h.step(1);

    let errors = h.controller.take_errors();
    assert_eq!(errors.len(), 1);
    assert!(!h.controller.is_recording());
    assert!(!h.controller.is_save_pending());
    assert!(!h.sampling.is_recording());

    // Live data survives a failed save
    assert_eq!(h.sampling.buffer().len(), 3);
}

#[test]
fn test_read_failures_are_skipped() {
    let dir = TempDir::new().unwrap();
    let config = ConfigBuilder::new(&dir).capacity(100).build();
    let mut h = Harness::new(&config, Box::new(FlakySource::new(3)));

    h.controller.toggle_record(true);
    h.step(30);

    assert_eq!(h.sampling.stats().samples_recorded, 20);
    assert_eq!(h.sampling.stats().read_failures, 10);
    assert_eq!(h.sampling.buffer().len(), 20);
    assert!(h.controller.is_recording());
}

#[test]
fn test_repeated_flushes_append_in_order() {
    let dir = TempDir::new().unwrap();
    let config = ConfigBuilder::new(&dir).capacity(5).build();
    let mut h = Harness::new(&config, Box::new(CountingSource::new()));

    h.controller.toggle_record(true);
    h.step(13);

    // Full at ticks 5, 9 and 13; each flush writes 4 rows
    assert_eq!(h.sampling.stats().flushes, 3);
    assert_eq!(h.sampling.stats().rows_flushed, 12);
    let flushed = h.sampling.store().read_all().unwrap();
    assert_eq!(values(&flushed), (0..12).map(|v| v as f64).collect::<Vec<_>>());
    assert_eq!(h.sampling.buffer().len(), 1);
    assert!(h.controller.take_errors().is_empty());
}
