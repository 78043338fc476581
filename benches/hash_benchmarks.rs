use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use refdupe::duplicates::{DuplicateClassifier, HashIndex};
use refdupe::error_sink::ErrorSink;
use refdupe::scanner::{Digest, HashAlgorithm, Hasher, Walker, WalkerConfig};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn populate(root: &Path, depth: usize, files_per_dir: usize, salt: &str) {
    fs::create_dir_all(root).unwrap();
    for i in 0..files_per_dir {
        fs::write(
            root.join(format!("file_{i}.txt")),
            format!("content {salt} {depth} {i}"),
        )
        .unwrap();
    }
    if depth > 1 {
        for i in 0..2 {
            populate(&root.join(format!("dir_{i}")), depth - 1, files_per_dir, salt);
        }
    }
}

// 1. Directory walking
fn bench_walker(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    populate(dir.path(), 4, 10, "walk"); // ~150 files

    c.bench_function("walker_150_files", |b| {
        b.iter(|| {
            let walker = Walker::new(dir.path(), WalkerConfig::default());
            black_box(walker.enumerate(&mut ErrorSink::new()).unwrap());
        })
    });
}

// 2. Whole-file vs chunked hashing, both algorithms
fn bench_hasher(c: &mut Criterion) {
    let mut group = c.benchmark_group("hasher");
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bench_file.dat");
    fs::write(&path, vec![b'a'; 8 * 1024 * 1024]).unwrap();

    for algorithm in [HashAlgorithm::Blake3, HashAlgorithm::Md5] {
        let whole = Hasher::new().with_algorithm(algorithm);
        let chunked = Hasher::new()
            .with_algorithm(algorithm)
            .with_chunk_size(1024 * 1024);

        group.bench_with_input(BenchmarkId::new("whole_8MiB", algorithm), &path, |b, p| {
            b.iter(|| black_box(whole.full_hash(p).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("chunked_8MiB", algorithm), &path, |b, p| {
            b.iter(|| black_box(chunked.full_hash(p).unwrap()))
        });
    }
    group.finish();
}

// 3. Index lookups
fn bench_index(c: &mut Criterion) {
    let hasher = Hasher::new();
    let digests: Vec<Digest> = (0..100_000u32)
        .map(|i| hasher.hash_bytes(&i.to_le_bytes()))
        .collect();
    let index = HashIndex::from_digests(HashAlgorithm::Blake3, digests.iter().copied());
    let misses: Vec<Digest> = (100_000..101_000u32)
        .map(|i| hasher.hash_bytes(&i.to_le_bytes()))
        .collect();

    c.bench_function("index_contains_hit", |b| {
        b.iter(|| {
            for d in &digests[..1000] {
                black_box(index.contains(d));
            }
        })
    });
    c.bench_function("index_contains_miss", |b| {
        b.iter(|| {
            for d in &misses {
                black_box(index.contains(d));
            }
        })
    });
}

// 4. End-to-end classification
fn bench_classify(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("ref");
    let candidate = dir.path().join("cand");
    populate(&reference, 4, 10, "shared");
    populate(&candidate, 4, 10, "shared");
    populate(&candidate.join("extra"), 3, 10, "new");

    let classifier = DuplicateClassifier::with_defaults();
    c.bench_function("classify_150_vs_220", |b| {
        b.iter(|| {
            black_box(
                classifier
                    .classify(&reference, &candidate, &mut ErrorSink::new())
                    .unwrap(),
            )
        })
    });
}

criterion_group!(benches, bench_walker, bench_hasher, bench_index, bench_classify);
criterion_main!(benches);
