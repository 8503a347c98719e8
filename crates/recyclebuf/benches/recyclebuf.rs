// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![expect(missing_docs, reason = "Benchmark code")]

use std::alloc::System;
use std::hint::black_box;
use std::io::Write;

use alloc_tracker::{Allocator, Session};
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use recyclebuf::PagedByteSink;
use recyclebuf::mem::{PAGE_SIZE, RecyclingPages};
use recyclebuf::recycler::{BoundedRecycler, Factory};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

#[global_allocator]
static ALLOCATOR: Allocator<System> = Allocator::system();

// Roughly the size of a serialized search request. Spans a couple of pages.
const MESSAGE_SIZE: usize = 2 * PAGE_SIZE + 1234;
const MESSAGE: &[u8] = &[42_u8; MESSAGE_SIZE];

#[derive(Debug)]
struct ResetSinks;

impl Factory<PagedByteSink> for ResetSinks {
    fn create(&self, sizing: usize) -> PagedByteSink {
        PagedByteSink::with_capacity(sizing)
    }

    fn recycle(&self, sink: &mut PagedByteSink) {
        sink.reset();
    }
}

fn entrypoint(c: &mut Criterion) {
    let allocs = Session::new();

    let mut group = c.benchmark_group("PagedByteSink");

    let write_slice_allocs = allocs.operation("write_slice_fresh");
    group.bench_function("write_slice_fresh", |b| {
        b.iter(|| {
            let _span = write_slice_allocs.measure_thread();
            let mut sink = PagedByteSink::new();
            sink.write_slice(black_box(MESSAGE));
            sink
        });
    });

    let write_bytes_allocs = allocs.operation("write_byte_fresh");
    group.bench_function("write_byte_fresh", |b| {
        b.iter(|| {
            let _span = write_bytes_allocs.measure_thread();
            let mut sink = PagedByteSink::new();
            for byte in black_box(&MESSAGE[..PAGE_SIZE]) {
                sink.write_byte(*byte);
            }
            sink
        });
    });

    group.bench_function("io_write", |b| {
        b.iter_batched_ref(
            PagedByteSink::new,
            |sink| sink.write_all(black_box(MESSAGE)),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("to_vec", |b| {
        let mut sink = PagedByteSink::new();
        sink.write_slice(MESSAGE);

        b.iter(|| black_box(sink.bytes()).to_vec());
    });

    let recycled_pages = RecyclingPages::new(64);
    let recycled_pages_allocs = allocs.operation("write_slice_recycled_pages");
    group.bench_function("write_slice_recycled_pages", |b| {
        b.iter(|| {
            let _span = recycled_pages_allocs.measure_thread();
            let mut sink = PagedByteSink::with_provider(&recycled_pages);
            sink.write_slice(black_box(MESSAGE));
            sink.size()
        });
    });

    group.finish();

    let mut group = c.benchmark_group("BoundedRecycler");

    let recycler: BoundedRecycler<PagedByteSink, _> = BoundedRecycler::new(16, ResetSinks);
    let recycled_sinks_allocs = allocs.operation("obtain_write_release");
    group.bench_function("obtain_write_release", |b| {
        b.iter(|| {
            let _span = recycled_sinks_allocs.measure_thread();
            let mut sink = recycler.obtain(MESSAGE_SIZE);
            sink.write_slice(black_box(MESSAGE));
            recycler.release(sink)
        });
    });

    let vec_recycler: BoundedRecycler<Vec<u8>, _> = BoundedRecycler::new(16, Vec::with_capacity);
    group.bench_function("obtain_release_vec", |b| {
        b.iter(|| {
            let buffer = vec_recycler.obtain(black_box(1024));
            vec_recycler.release(buffer)
        });
    });

    group.finish();

    allocs.print_to_stdout();
}
