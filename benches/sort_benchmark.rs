//! Performance benchmarks for SortCopy
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fs::File;
use std::io::Write;
use tempfile::TempDir;

const EXTENSIONS: [&str; 5] = ["txt", "jpg", "rs", "csv", "log"];

/// Create a test file of the specified size
fn create_test_file(dir: &std::path::Path, name: &str, size: usize) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();

    let chunk_size = 64 * 1024;
    let chunk: Vec<u8> = (0..chunk_size).map(|i| (i % 256) as u8).collect();
    let mut remaining = size;

    while remaining > 0 {
        let to_write = remaining.min(chunk_size);
        file.write_all(&chunk[..to_write]).unwrap();
        remaining -= to_write;
    }

    path
}

/// Ten subdirectories with `per_dir` files each, extensions rotating
fn create_tree(per_dir: usize, size: usize) -> TempDir {
    let dir = TempDir::new().unwrap();

    for i in 0..10 {
        let subdir = dir.path().join(format!("subdir_{}", i));
        std::fs::create_dir_all(&subdir).unwrap();

        for j in 0..per_dir {
            let ext = EXTENSIONS[j % EXTENSIONS.len()];
            create_test_file(&subdir, &format!("file_{}_{}.{}", i, j, ext), size);
        }
    }

    dir
}

fn bench_sort_concurrency(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_1000_small_files");
    let src_dir = create_tree(100, 1024);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    group.throughput(Throughput::Elements(1000));

    for concurrency in [1usize, 8, 64, 256] {
        group.bench_with_input(
            BenchmarkId::new("concurrency", concurrency),
            &concurrency,
            |b, &concurrency| {
                b.iter(|| {
                    let dst_dir = TempDir::new().unwrap();
                    let config = sortcopy::config::SortConfig {
                        source: src_dir.path().to_path_buf(),
                        destination: dst_dir.path().to_path_buf(),
                        concurrency,
                        ..Default::default()
                    };

                    let engine = sortcopy::core::SortEngine::new(config);
                    let _ = black_box(runtime.block_on(engine.execute()));
                });
            },
        );
    }

    group.finish();
}

fn bench_walk(c: &mut Criterion) {
    let dir = create_tree(100, 16);

    c.bench_function("walk_1000_files", |b| {
        b.iter(|| {
            let walker = sortcopy::fs::Walker::new(dir.path(), &Default::default());
            black_box(walker.filter_map(|item| item.ok()).count())
        });
    });
}

fn bench_classify(c: &mut Criterion) {
    let names = ["report.PDF", "archive.tar.gz", "README", ".gitignore", "photo.jpeg"];

    c.bench_function("classify", |b| {
        b.iter(|| {
            for name in names {
                black_box(sortcopy::fs::classify(black_box(name)));
            }
        });
    });
}

criterion_group!(benches, bench_sort_concurrency, bench_walk, bench_classify);

criterion_main!(benches);
