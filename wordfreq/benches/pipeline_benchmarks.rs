#![allow(unused_must_use)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Cursor;
use std::path::Path;
use std::{fs::File, io::Write, num::NonZeroUsize};
use tempfile::tempdir;
use wordfreq::splitter::{ChunkSplitter, SplitOptions};
use wordfreq::{analyze, AnalyzerConfig, FrequencyMap, ProcessingMode};

const LINE: &str = "the quick brown foxes jumped over sleeping hounds while distant rivers murmured";

fn create_test_files(
    dir: &tempfile::TempDir,
    file_count: usize,
    lines_per_file: usize,
) -> std::io::Result<()> {
    for i in 0..file_count {
        let file_path = dir.path().join(format!("corpus_{}.txt", i));
        let mut file = File::create(file_path)?;
        for j in 0..lines_per_file {
            writeln!(file, "{} chapter{} {}", LINE, j % 50, i)?;
        }
    }
    Ok(())
}

fn create_base_config(dir: &tempfile::TempDir) -> AnalyzerConfig {
    AnalyzerConfig {
        root_path: dir.path().to_path_buf(),
        thread_count: NonZeroUsize::new(1).unwrap(),
        ..AnalyzerConfig::default()
    }
}

fn bench_splitter(c: &mut Criterion) {
    let text = LINE.repeat(20_000).into_bytes();
    let mut group = c.benchmark_group("Splitter");
    group.throughput(Throughput::Bytes(text.len() as u64));

    for size in [64usize, 4096, 1024 * 1024] {
        let options = SplitOptions::new(NonZeroUsize::new(size).unwrap());
        group.bench_with_input(BenchmarkId::from_parameter(size), &options, |b, &options| {
            b.iter(|| {
                let splitter =
                    ChunkSplitter::new(Cursor::new(text.as_slice()), Path::new("bench.txt"), options);
                black_box(splitter.filter_map(Result::ok).count())
            });
        });
    }
    group.finish();
}

fn bench_worker_scaling(c: &mut Criterion) -> std::io::Result<()> {
    let dir = tempdir().unwrap();
    create_test_files(&dir, 32, 500)?;

    let mut group = c.benchmark_group("Worker Scaling");
    for mode in [ProcessingMode::Pipeline, ProcessingMode::Parallel] {
        for threads in [1usize, 2, 4, 8] {
            let config = AnalyzerConfig {
                thread_count: NonZeroUsize::new(threads).unwrap(),
                chunk_size: NonZeroUsize::new(16 * 1024).unwrap(),
                mode,
                ..create_base_config(&dir)
            };
            group.bench_function(format!("{}_{}", mode, threads), |b| {
                b.iter(|| black_box(analyze(&config).unwrap()));
            });
        }
    }
    group.finish();
    Ok(())
}

fn bench_channel_capacity(c: &mut Criterion) -> std::io::Result<()> {
    let dir = tempdir().unwrap();
    create_test_files(&dir, 16, 500)?;

    let mut group = c.benchmark_group("Channel Capacity");
    for capacity in [0usize, 1, 4, 64] {
        let config = AnalyzerConfig {
            thread_count: NonZeroUsize::new(4).unwrap(),
            chunk_size: NonZeroUsize::new(4 * 1024).unwrap(),
            channel_capacity: capacity,
            ..create_base_config(&dir)
        };
        group.bench_function(format!("capacity_{}", capacity), |b| {
            b.iter(|| black_box(analyze(&config).unwrap()));
        });
    }
    group.finish();
    Ok(())
}

fn bench_top_k(c: &mut Criterion) {
    let words: Vec<String> = (0..50_000).map(|i| format!("word{}", i % 20_000)).collect();
    let map = FrequencyMap::from_words(words.iter().map(String::as_str));

    let mut group = c.benchmark_group("Top K");
    for k in [10usize, 1_000, 20_000] {
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, &k| {
            b.iter(|| black_box(map.top_k(k)));
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = bench_splitter, bench_worker_scaling,
              bench_channel_capacity, bench_top_k
}

#[test]
fn ensure_benchmarks_valid() {
    benches();
}

criterion_main!(benches);
