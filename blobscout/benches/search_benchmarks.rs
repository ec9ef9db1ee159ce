use criterion::{black_box, criterion_group, criterion_main, Criterion};
use blobscout::{search, MemoryStore, SearchConfig};
use flate2::{write::GzEncoder, Compression};
use std::{io::Write, num::NonZeroUsize};

fn object_body(lines: usize) -> String {
    (0..lines)
        .map(|j| format!("{} INFO request served in {}ms ERROR id={}\n", j, j % 97, j))
        .collect()
}

fn create_store(object_count: usize, lines_per_object: usize, gzipped: bool) -> MemoryStore {
    let mut store = MemoryStore::new();
    let body = object_body(lines_per_object);
    for i in 0..object_count {
        if gzipped {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
            encoder.write_all(body.as_bytes()).unwrap();
            store.insert("bench", &format!("obj-{:05}.log.gz", i), encoder.finish().unwrap());
        } else {
            store.insert("bench", &format!("obj-{:05}.log", i), body.clone());
        }
    }
    store
}

fn create_base_config(workers: usize) -> SearchConfig {
    SearchConfig {
        bucket: "bench".to_string(),
        content_pattern: r"ERROR id=\d+7$".to_string(),
        thread_count: NonZeroUsize::new(workers).unwrap(),
        ..SearchConfig::default()
    }
}

fn bench_worker_scaling(c: &mut Criterion) {
    let store = create_store(500, 200, false);
    let mut group = c.benchmark_group("Worker Scaling");

    for workers in [1, 4, 16, 64] {
        let config = create_base_config(workers);
        group.bench_function(format!("workers_{}", workers), |b| {
            b.iter(|| search(black_box(&config), &store).unwrap())
        });
    }
    group.finish();
}

fn bench_object_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("Object Scaling");
    let config = create_base_config(16);

    for count in [10, 100, 1000] {
        let store = create_store(count, 100, false);
        group.bench_function(format!("objects_{}", count), |b| {
            b.iter(|| search(black_box(&config), &store).unwrap())
        });
    }
    group.finish();
}

fn bench_compressed(c: &mut Criterion) {
    let plain = create_store(200, 500, false);
    let gzipped = create_store(200, 500, true);
    let config = create_base_config(16);
    let mut group = c.benchmark_group("Compression");

    group.bench_function("plain", |b| {
        b.iter(|| search(black_box(&config), &plain).unwrap())
    });
    group.bench_function("gzip", |b| {
        b.iter(|| search(black_box(&config), &gzipped).unwrap())
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_worker_scaling,
    bench_object_scaling,
    bench_compressed
);
criterion_main!(benches);
