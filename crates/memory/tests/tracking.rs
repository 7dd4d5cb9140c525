//! Integration tests for the tracking decorator

use crossfire_memory::allocator::{
    Allocator, FREED_PATTERN, FRESH_PATTERN, GeneralPurposeAllocator, StackAllocator,
    SystemAllocator, TrackExt, TrackingAllocator, TrackingConfig,
};
use pretty_assertions::assert_eq;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

#[test]
fn fresh_and_freed_patterns() {
    #[repr(align(16))]
    struct Buf([u8; 256]);

    let mut buf = Buf([0; 256]);
    {
        let gpa = GeneralPurposeAllocator::from_slice(&mut buf.0).unwrap();
        let tracked = gpa.with_tracking();

        let block = tracked.allocate(32, 8).unwrap();
        // SAFETY: block is live.
        assert!(unsafe { block.as_slice() }.iter().all(|&b| b == FRESH_PATTERN));

        // SAFETY: block came from `tracked`.
        unsafe { tracked.deallocate(block) };
    }

    // The first 32 bytes of the buffer were handed out and released
    assert!(buf.0[..32].iter().all(|&b| b == FREED_PATTERN));
    assert!(buf.0[32..].iter().all(|&b| b == 0));
}

#[test]
fn counters_follow_operations() {
    let tracked = TrackingAllocator::new(SystemAllocator);

    let a = tracked.allocate(100, 8).unwrap();
    let b = tracked.allocate(50, 8).unwrap();
    assert_eq!(tracked.allocation_count(), 2);
    assert_eq!(tracked.current_usage(), 150);
    assert_eq!(tracked.peak_usage(), 150);

    // SAFETY: both blocks came from `tracked`.
    unsafe {
        tracked.deallocate(a);
        tracked.deallocate(b);
    }

    let stats = tracked.statistics();
    assert_eq!(stats.deallocation_count, 2);
    assert_eq!(stats.total_bytes_allocated, 150);
    assert_eq!(stats.total_bytes_deallocated, 150);
    assert_eq!(stats.allocated_bytes, 0);
    assert_eq!(stats.peak_allocated_bytes, 150);
    assert!(!tracked.detect_leaks());
}

#[test]
fn failures_are_counted() {
    let gpa = GeneralPurposeAllocator::try_new(64, &SystemAllocator).unwrap();
    let tracked = TrackingAllocator::new(&gpa);

    assert!(tracked.allocate(128, 8).is_err());
    assert!(tracked.allocate(0, 8).is_err());

    let stats = tracked.statistics();
    assert_eq!(stats.failed_allocations, 2);
    assert_eq!(stats.allocation_count, 0);
    assert_eq!(tracked.current_usage(), 0);
}

#[test]
fn reallocate_poisons_the_new_tail() {
    let stack = StackAllocator::try_new(256, &SystemAllocator).unwrap();
    let tracked = TrackingAllocator::new(&stack);

    let block = tracked.allocate(8, 8).unwrap();
    // SAFETY: block is live and stays the top of the stack.
    unsafe {
        block.as_mut_slice().copy_from_slice(&[1; 8]);
        let grown = tracked.reallocate(block, 16, 8).unwrap();
        assert_eq!(&grown.as_slice()[..8], &[1; 8]);
        assert_eq!(&grown.as_slice()[8..], &[FRESH_PATTERN; 8]);

        assert_eq!(tracked.allocated_bytes(), 16);
        assert_eq!(tracked.current_usage(), 16);

        let shrunk = tracked.reallocate(grown, 4, 8).unwrap();
        assert_eq!(tracked.deallocated_bytes(), 12);
        assert_eq!(tracked.current_usage(), 4);

        tracked.deallocate(shrunk);
    }
    assert_eq!(tracked.statistics().reallocation_count, 2);
    assert!(!tracked.detect_leaks());
}

/// Runs `f` under a fmt subscriber and returns everything it logged
fn captured_logs(f: impl FnOnce()) -> String {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&buffer);
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || SharedBuffer(Arc::clone(&sink)))
        .finish();

    tracing::subscriber::with_default(subscriber, f);

    let bytes = buffer.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn leak_is_reported_on_drop() {
    let gpa = GeneralPurposeAllocator::try_new(128, &SystemAllocator).unwrap();

    let logs = captured_logs(|| {
        let tracked = TrackingAllocator::new(&gpa);
        let _leaked = tracked.allocate(16, 8).unwrap();

        assert!(tracked.detect_leaks());
        assert_eq!(tracked.statistics().outstanding_allocations(), 1);
        drop(tracked);
    });

    assert!(logs.contains("ERROR"), "{logs}");
    assert!(logs.contains("memory leak detected"), "{logs}");
    assert!(logs.contains("1 allocation(s) not released"), "{logs}");
    assert!(logs.contains("16 byte(s) outstanding"), "{logs}");
    assert_eq!(gpa.reserved_bytes(), 16);
}

#[test]
fn balanced_tracker_reports_nothing() {
    let gpa = GeneralPurposeAllocator::try_new(128, &SystemAllocator).unwrap();

    let logs = captured_logs(|| {
        let tracked = TrackingAllocator::new(&gpa);
        let block = tracked.allocate(16, 8).unwrap();
        // SAFETY: block came from tracked.
        unsafe { tracked.deallocate(block) };
        drop(tracked);
    });

    assert!(!logs.contains("memory leak detected"), "{logs}");
}

#[test]
fn disabled_leak_report_stays_silent() {
    let gpa = GeneralPurposeAllocator::try_new(128, &SystemAllocator).unwrap();
    let config = TrackingConfig {
        report_leaks: false,
        ..TrackingConfig::default()
    };

    let logs = captured_logs(|| {
        let tracked = TrackingAllocator::with_config(&gpa, config);
        let _leaked = tracked.allocate(16, 8).unwrap();
        assert!(tracked.detect_leaks());
        drop(tracked);
    });

    assert!(!logs.contains("memory leak detected"), "{logs}");
}

#[test]
fn quiet_config_counts_without_poisoning() {
    let mut buf = [0u8; 64];
    let gpa = GeneralPurposeAllocator::from_slice(&mut buf).unwrap();
    let tracked = TrackingAllocator::with_config(&gpa, TrackingConfig::quiet());
    assert!(!tracked.config().poison);

    let block = tracked.allocate(16, 1).unwrap();
    // SAFETY: block is live.
    assert!(unsafe { block.as_slice() }.iter().all(|&b| b == 0));
    assert_eq!(tracked.allocation_count(), 1);

    let gpa = tracked.into_inner();
    assert_eq!(gpa.reserved_bytes(), 16);
}
