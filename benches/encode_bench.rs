//! Batch encoding benchmarks: symbol lookup, qualifier reification and offsets.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use quadnet::{EncodedBatch, Quadruple, Vocabulary, CURRENT_TIME, STRENGTH, TIMESTAMP};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const ROOMS: usize = 32;
const MAX_TIME: i64 = 100;

fn vocabulary() -> Vocabulary {
    let mut entities = vec!["agent".to_string(), "wall".to_string()];
    entities.extend((0..ROOMS).map(|i| format!("room_{:03}", i)));
    entities.extend((0..=MAX_TIME).map(|t| t.to_string()));
    Vocabulary::new(
        entities,
        ["atlocation", "north", "east", "south", "west", CURRENT_TIME, TIMESTAMP, STRENGTH],
    )
    .unwrap()
}

/// `len` random map facts, about a third of them short-term.
fn make_sample(rng: &mut ChaCha8Rng, len: usize) -> Vec<Quadruple> {
    const DIRECTIONS: [&str; 4] = ["north", "east", "south", "west"];
    (0..len)
        .map(|_| {
            let head = format!("room_{:03}", rng.gen_range(0..ROOMS));
            let tail = if rng.gen_bool(0.2) {
                "wall".to_string()
            } else {
                format!("room_{:03}", rng.gen_range(0..ROOMS))
            };
            let q = Quadruple::new(head, DIRECTIONS[rng.gen_range(0..4)], tail);
            match rng.gen_range(0..3) {
                0 => q.with_qualifier(CURRENT_TIME, rng.gen_range(0..MAX_TIME)),
                1 => q.with_qualifier(TIMESTAMP, vec![rng.gen_range(0..MAX_TIME), rng.gen_range(0..MAX_TIME)]),
                _ => q.with_qualifier(STRENGTH, rng.gen_range(0.0..10.0)),
            }
        })
        .collect()
}

/// Benchmark: encode batches of growing size, 64 facts per sample
fn bench_encode_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_batch");
    let vocab = vocabulary();

    for batch_size in [1, 16, 128] {
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        let batch: Vec<Vec<Quadruple>> = (0..batch_size).map(|_| make_sample(&mut rng, 64)).collect();

        group.throughput(Throughput::Elements((batch_size * 64) as u64));
        group.bench_with_input(BenchmarkId::new("samples", batch_size), &batch, |b, batch| {
            b.iter(|| EncodedBatch::encode(&vocab, batch).unwrap());
        });
    }

    group.finish();
}

/// Benchmark: a single long working memory
fn bench_encode_sample_len(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_sample_len");
    let vocab = vocabulary();

    for len in [16, 256, 2048] {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let batch = vec![make_sample(&mut rng, len)];

        group.bench_with_input(BenchmarkId::new("facts", len), &batch, |b, batch| {
            b.iter(|| EncodedBatch::encode(&vocab, batch).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode_batch, bench_encode_sample_len);
criterion_main!(benches);
