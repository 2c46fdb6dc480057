//! End-to-end benchmarks for `meshbatch run`.
//!
//! Each iteration converts a scratch directory of generated grid meshes,
//! including worker spawn and teardown, so the numbers show how worker count
//! and purge frequency trade off against each other.
//!
//! Run with: `cargo bench --bench run_benchmark`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::fmt::Write as _;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const MESHES: usize = 48;

/// An `n` x `n` grid of quads.
fn grid_mesh(n: usize) -> String {
    let mut obj = String::new();
    for y in 0..=n {
        for x in 0..=n {
            let _ = writeln!(obj, "v {} {} 0", x, y);
        }
    }
    let row = n + 1;
    for y in 0..n {
        for x in 0..n {
            let a = y * row + x + 1;
            let _ = writeln!(obj, "f {} {} {} {}", a, a + 1, a + row + 1, a + row);
        }
    }
    obj
}

fn create_input(count: usize, grid: usize) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let mesh = grid_mesh(grid);
    for i in 0..count {
        std::fs::write(dir.path().join(format!("grid_{:03}.obj", i)), &mesh).unwrap();
    }
    dir
}

fn run(input: &Path, workers: usize, purge_frequency: u32) {
    let status = Command::new(env!("CARGO_BIN_EXE_meshbatch"))
        .args(["-q", "run", "--format", "json"])
        .arg("-j")
        .arg(workers.to_string())
        .arg("-p")
        .arg(purge_frequency.to_string())
        .arg(input)
        .status()
        .unwrap();
    assert!(status.success());
}

fn bench_worker_count(c: &mut Criterion) {
    let input = create_input(MESHES, 32);

    let mut group = c.benchmark_group("workers");
    group.sample_size(10);

    for workers in [1, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &w| {
            b.iter(|| run(input.path(), w, 25))
        });
    }

    group.finish();
}

fn bench_purge_frequency(c: &mut Criterion) {
    let input = create_input(MESHES, 32);

    let mut group = c.benchmark_group("purge_frequency");
    group.sample_size(10);

    for frequency in [1, 5, 25, 1000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(frequency),
            &frequency,
            |b, &f| b.iter(|| run(input.path(), 2, f)),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_worker_count, bench_purge_frequency);
criterion_main!(benches);
