use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use mosaic_core::cache::{CacheKey, RedbTileCache, TileCache};
use mosaic_core::tiles::defaults;
use mosaic_core::types::{TileData, TileRequest};
use serde_json::json;
use tempfile::TempDir;

fn bench_data() -> TileData {
    let mut data = TileData::default();
    data.metrics.insert("tam".into(), json!(4_500_000_000u64));
    data.metrics.insert("sam".into(), json!(1_350_000_000u64));
    data.metrics.insert("som".into(), json!(135_000_000u64));
    data.confidence = 0.85;
    data
}

fn bench_key(i: usize) -> CacheKey {
    CacheKey::for_request(&TileRequest::new(
        format!("Benchmark idea number {}", i),
        defaults::market_size(),
    ))
}

fn bench_put(c: &mut Criterion) {
    c.bench_function("tile put", |b| {
        b.iter_batched(
            || {
                let temp_dir = TempDir::new().unwrap();
                let cache = RedbTileCache::open(temp_dir.path().join("bench.redb")).unwrap();
                (cache, temp_dir)
            },
            |(cache, _temp)| {
                cache.put(&bench_key(0), &bench_data()).unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_get(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let cache = RedbTileCache::open(temp_dir.path().join("bench.redb")).unwrap();
    for i in 0..100 {
        cache.put(&bench_key(i), &bench_data()).unwrap();
    }
    let key = bench_key(42);

    c.bench_function("tile get", |b| {
        b.iter(|| {
            let entry = cache.get(&key).unwrap();
            assert!(entry.is_some());
        });
    });
}

fn bench_key_build(c: &mut Criterion) {
    let request = TileRequest::new(
        "An AI-powered productivity application for distributed teams",
        defaults::google_trends(),
    )
    .with_filter("region", "eu")
    .with_filter("months", 6);

    c.bench_function("cache key build", |b| {
        b.iter(|| CacheKey::for_request(&request));
    });
}

criterion_group!(benches, bench_put, bench_get, bench_key_build);
criterion_main!(benches);
