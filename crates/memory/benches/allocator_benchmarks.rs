//! Allocator benchmarks
//!
//! Compares the strategies on single, batch, and fragmenting workloads

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use crossfire_memory::allocator::{
    Allocator, ArenaAllocator, GeneralPurposeAllocator, Resettable, StackAllocator,
    SystemAllocator, TrackingAllocator, TrackingConfig,
};
use std::hint::black_box;

const REGION: usize = 1024 * 1024;

/// Single allocate / deallocate cycle
fn bench_single_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_allocation");

    group.bench_function("arena_64b", |b| {
        let arena = ArenaAllocator::new(REGION, &SystemAllocator);

        b.iter(|| {
            let block = arena.allocate(64, 8).unwrap();
            black_box(block);
            // SAFETY: nothing from the previous iteration is used.
            unsafe { arena.reset() };
        });
    });

    group.bench_function("stack_64b", |b| {
        let stack = StackAllocator::new(REGION, &SystemAllocator);

        b.iter(|| {
            let block = stack.allocate(64, 8).unwrap();
            // SAFETY: block is the top of the stack.
            unsafe { stack.deallocate(black_box(block)) };
        });
    });

    group.bench_function("general_64b", |b| {
        let gpa = GeneralPurposeAllocator::new(REGION, &SystemAllocator);

        b.iter(|| {
            let block = gpa.allocate(64, 8).unwrap();
            // SAFETY: block came from gpa.
            unsafe { gpa.deallocate(black_box(block)) };
        });
    });

    group.bench_function("system_64b", |b| {
        b.iter(|| {
            let block = SystemAllocator.allocate(64, 8).unwrap();
            // SAFETY: block came from the system allocator.
            unsafe { SystemAllocator.deallocate(black_box(block)) };
        });
    });

    group.bench_function("tracked_general_64b", |b| {
        let gpa = GeneralPurposeAllocator::new(REGION, &SystemAllocator);
        let tracked = TrackingAllocator::with_config(&gpa, TrackingConfig::quiet());

        b.iter(|| {
            let block = tracked.allocate(64, 8).unwrap();
            // SAFETY: block came from tracked.
            unsafe { tracked.deallocate(black_box(block)) };
        });
    });

    group.finish();
}

/// Many allocations followed by release in allocation order
fn bench_batch_allocations(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_allocations");

    for count in [16usize, 128, 1024] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("general", count), &count, |b, &count| {
            let gpa = GeneralPurposeAllocator::new(REGION, &SystemAllocator);
            let mut blocks = Vec::with_capacity(count);

            b.iter(|| {
                for _ in 0..count {
                    blocks.push(gpa.allocate(64, 8).unwrap());
                }
                for block in blocks.drain(..) {
                    // SAFETY: every block came from gpa.
                    unsafe { gpa.deallocate(block) };
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("stack", count), &count, |b, &count| {
            let stack = StackAllocator::new(REGION, &SystemAllocator);

            b.iter(|| {
                let marker = stack.mark();
                for _ in 0..count {
                    black_box(stack.allocate(64, 8).unwrap());
                }
                // SAFETY: nothing allocated past the marker is kept.
                unsafe { stack.restore_to_marker(marker) };
            });
        });
    }

    group.finish();
}

/// Interleaved frees that leave holes for first-fit to search
fn bench_fragmented_first_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragmented_first_fit");

    for holes in [8usize, 64, 512] {
        group.bench_with_input(BenchmarkId::from_parameter(holes), &holes, |b, &holes| {
            let gpa = GeneralPurposeAllocator::new(REGION, &SystemAllocator);
            let blocks: Vec<_> = (0..holes * 2)
                .map(|_| gpa.allocate(32, 8).unwrap())
                .collect();
            for block in blocks.iter().step_by(2) {
                // SAFETY: every other block is released once.
                unsafe { gpa.deallocate(*block) };
            }

            // Too big for any hole: scans the whole free list
            b.iter(|| {
                let block = gpa.allocate(64, 8).unwrap();
                // SAFETY: block came from gpa.
                unsafe { gpa.deallocate(black_box(block)) };
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_allocation,
    bench_batch_allocations,
    bench_fragmented_first_fit,
);
criterion_main!(benches);
