use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use engine::Engine;
use tempfile::tempdir;

fn bench_put(c: &mut Criterion) {
    c.bench_function("put_sequential_1k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let engine = Engine::open(dir.path()).unwrap();
                (dir, engine)
            },
            |(_dir, mut engine)| {
                for key in 0..1000u64 {
                    engine.put(key, b"benchmark-value-payload".to_vec()).unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_get(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let mut engine = Engine::open(dir.path()).unwrap();
    for key in 0..10_000u64 {
        engine.put(key, b"benchmark-value-payload".to_vec()).unwrap();
    }
    engine.force_flush().unwrap();

    let mut key = 0u64;
    c.bench_function("get_from_tables", |b| {
        b.iter(|| {
            key = key.wrapping_mul(6364136223846793005).wrapping_add(1);
            engine.get(key % 10_000).unwrap()
        });
    });
}

criterion_group!(benches, bench_put, bench_get);
criterion_main!(benches);
