// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::missing_panics_doc)] // Benches panic on failure
#![allow(clippy::semicolon_if_nothing_returned)] // Benchmark code formatting

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use shapecast::{
    from_value, handler, to_value, Context, Inspect, Inspector, NullableSlot, ObjectSlot, Result,
    ScalarMut, TypedSlot,
};

#[derive(Inspect, Clone)]
struct Pose {
    x: f64,
    y: f64,
    z: f64,
    frame: String,
}

#[derive(Inspect, Clone)]
struct Track {
    id: u32,
    poses: Vec<Pose>,
    blob: Vec<u8>,
}

/// Backend that touches every value and discards it.
#[derive(Default)]
struct Sink {
    touched: u64,
    context: Context,
}

impl Inspector for Sink {
    fn field(&mut self, _name: &str, value: ScalarMut<'_>) -> Result<()> {
        black_box(value);
        self.touched += 1;
        Ok(())
    }

    fn nullable_field(&mut self, _name: &str, slot: &mut dyn NullableSlot) -> Result<()> {
        if slot.is_present() {
            slot.value(self)?;
        }
        Ok(())
    }

    fn object_field(&mut self, _name: &str, slot: &mut dyn ObjectSlot) -> Result<()> {
        let version = slot.latest_version();
        slot.describe(self, version)
    }

    fn typed_field(&mut self, _name: &str, slot: &mut dyn TypedSlot) -> Result<()> {
        let version = slot.latest_version()?;
        slot.describe(self, version)
    }

    fn begin_array(&mut self, _lengths: &mut [usize]) -> Result<()> {
        Ok(())
    }

    fn enter_array_level(&mut self, _rank: usize) -> Result<()> {
        Ok(())
    }

    fn leave_array_level(&mut self, _rank: usize) -> Result<()> {
        Ok(())
    }

    fn byte_array(&mut self, _name: &str, bytes: &mut Vec<u8>) -> Result<()> {
        self.touched += bytes.len() as u64;
        Ok(())
    }

    fn context(&mut self) -> &mut Context {
        &mut self.context
    }
}

fn track() -> Track {
    Track {
        id: 17,
        poses: (0..64)
            .map(|i| Pose {
                x: f64::from(i),
                y: 0.5,
                z: -1.0,
                frame: "map".into(),
            })
            .collect(),
        blob: vec![0xab; 4096],
    }
}

// ============================================================================
// Dispatch Benchmarks
// ============================================================================

/// Benchmark: cached handler lookup
fn bench_handler_lookup(c: &mut Criterion) {
    handler::<Track>().expect("warm cache");
    c.bench_function("handler_lookup_cached", |b| {
        b.iter(|| black_box(handler::<Track>().expect("handler")))
    });
}

/// Benchmark: Describe of a 64-pose track into a discarding backend
fn bench_describe_sink(c: &mut Criterion) {
    let handler = handler::<Track>().expect("handler");
    let mut value = track();
    c.bench_function("describe_track_sink", |b| {
        b.iter(|| {
            let mut sink = Sink::default();
            handler.describe(&mut value, &mut sink, 1).expect("describe");
            black_box(sink.touched)
        })
    });
}

/// Benchmark: full in-memory round trip
fn bench_memory_round_trip(c: &mut Criterion) {
    c.bench_function("memory_round_trip_track", |b| {
        b.iter_batched(
            track,
            |mut value| {
                let tree = to_value(&mut value).expect("describe");
                black_box(from_value::<Track>(&tree).expect("create"))
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_handler_lookup,
    bench_describe_sink,
    bench_memory_round_trip
);
criterion_main!(benches);
