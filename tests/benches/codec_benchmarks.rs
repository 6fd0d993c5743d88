//! # Exchange Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Wire encode/decode, 16 fields | < 5µs |
//! | Canonical resolve | < 1µs |
//! | Publish with 8 subscribers | < 20µs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use hmi_hub::{CallbackHandle, DistributionHub};
use hmi_schema::SchemaRegistry;
use hmi_types::{CandidateEnvelope, Envelope};

fn envelope_with_fields(count: usize) -> Envelope {
    let candidate = CandidateEnvelope::new(832)
        .with_payload("340#0011223344556677")
        .with_timestamp(1_700_000_000_000)
        .with_fields((0..count).map(|i| (format!("signal_{i:02}"), format!("{}", i * 17))));
    Envelope::accepted(candidate, 42)
}

// ============================================================================
// WIRE CODEC
// ============================================================================

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("wire-codec");

    for count in [0, 4, 16, 64] {
        let envelope = envelope_with_fields(count);
        let bytes = hmi_wire::encode(&envelope).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", count), &envelope, |b, e| {
            let mut buffer = Vec::with_capacity(hmi_wire::encoded_len(e));
            b.iter(|| {
                buffer.clear();
                hmi_wire::encode_into(black_box(e), &mut buffer).unwrap();
            })
        });

        group.bench_with_input(BenchmarkId::new("decode", count), &bytes, |b, bytes| {
            b.iter(|| hmi_wire::decode(black_box(bytes)).unwrap())
        });
    }

    group.finish();
}

// ============================================================================
// SCHEMA RESOLUTION
// ============================================================================

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema-resolve");
    let registry = SchemaRegistry::with_default_rules().unwrap();

    let current = CandidateEnvelope::new(832).with_field("ARM_STATE_FLAG", "1").fields;
    let legacy = CandidateEnvelope::new(775).with_field("Arm_state", "1").fields;

    group.bench_function("newest_key", |b| {
        b.iter(|| registry.resolve(black_box(832), &current, "ARM_STATE"))
    });
    group.bench_function("older_key", |b| {
        b.iter(|| registry.resolve(black_box(775), &legacy, "ARM_STATE"))
    });
    group.bench_function("resolve_all", |b| {
        b.iter(|| registry.resolve_all(black_box(832), &current))
    });

    group.finish();
}

// ============================================================================
// HUB FAN-OUT
// ============================================================================

fn bench_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("hub-publish");

    for subscribers in [0, 1, 8, 32] {
        let hub = DistributionHub::with_default_schema().unwrap();
        for _ in 0..subscribers {
            hub.register(CallbackHandle::from_fn(|e| {
                black_box(e.sequence_id());
                Ok(())
            }));
        }

        group.throughput(Throughput::Elements(subscribers as u64));
        group.bench_with_input(
            BenchmarkId::new("fan_out", subscribers),
            &hub,
            |b, hub| b.iter(|| hub.publish(CandidateEnvelope::new(800).with_field("MOTOR_RPM", "1200"))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_codec, bench_resolve, bench_publish);
criterion_main!(benches);
