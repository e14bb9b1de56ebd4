//! Hot-path benchmarks: signature checks, seen-set lookups and the canonical
//! encoding every signature depends on.
//!
//! Run with: `cargo bench -p mm-tests`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mm_01_signatures::{canonical_bytes, Attestation, KeyPair, SignatureApi, SignatureService};
use mm_03_gossip::SeenSet;
use serde_json::{json, Value};
use shared_types::{Fingerprint, Timestamp};
use std::time::Duration;

fn service() -> SignatureService {
    SignatureService::new(KeyPair::generate().unwrap(), 1024)
}

fn sample_payload(i: u64) -> Value {
    json!({
        "kind": "note",
        "data": {"seq": i, "text": "the quick brown fox", "tags": ["a", "b", "c"]},
    })
}

fn bench_verify(c: &mut Criterion) {
    let signer = service();
    let verifier = SignatureService::verifier_only(1024);
    let payload = sample_payload(0);
    let attestation = signer.attest(&payload).unwrap();

    c.bench_function("verify_single", |b| {
        b.iter(|| black_box(verifier.verify(&attestation, &payload)))
    });
}

fn bench_verify_batch(c: &mut Criterion) {
    let verifier = SignatureService::verifier_only(1024);
    let signers: Vec<SignatureService> = (0..16).map(|_| service()).collect();

    let mut group = c.benchmark_group("verify_batch");
    for size in [16usize, 64, 256] {
        let items: Vec<(Attestation, Value)> = (0..size)
            .map(|i| {
                let payload = sample_payload(i as u64);
                (signers[i % signers.len()].attest(&payload).unwrap(), payload)
            })
            .collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &items, |b, items| {
            b.iter(|| black_box(verifier.verify_batch(items)))
        });
    }
    group.finish();
}

fn bench_seen_set(c: &mut Criterion) {
    let fingerprints: Vec<Fingerprint> = (0..4096u32)
        .map(|i| {
            let mut bytes = [0u8; 32];
            bytes[..4].copy_from_slice(&i.to_le_bytes());
            Fingerprint(bytes)
        })
        .collect();
    let now = Timestamp::from_secs(1_000);

    c.bench_function("seen_set_insert", |b| {
        b.iter(|| {
            let seen = SeenSet::new(1024, Duration::from_secs(600));
            for fp in &fingerprints {
                black_box(seen.insert_if_absent(*fp, now));
            }
        })
    });
}

fn bench_canonical(c: &mut Criterion) {
    let payload = sample_payload(42);
    c.bench_function("canonical_bytes", |b| {
        b.iter(|| black_box(canonical_bytes(&payload)))
    });
}

criterion_group!(
    benches,
    bench_verify,
    bench_verify_batch,
    bench_seen_set,
    bench_canonical
);
criterion_main!(benches);
