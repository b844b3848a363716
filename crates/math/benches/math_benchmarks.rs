//! Benchmarks for dynafactor-math kernels.
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use dynafactor_math::{
    NormalEquations, RollingWindow, expected_shortfall, kronecker_row, least_squares,
    quantile_buckets,
};
use ndarray::{Array1, Array2};
use rand::Rng;

fn random_returns(n: usize) -> Array1<f64> {
    let mut rng = rand::thread_rng();
    Array1::from_iter((0..n).map(|_| rng.r#gen::<f64>() * 0.1 - 0.05))
}

fn random_matrix(rows: usize, cols: usize) -> Array2<f64> {
    let mut rng = rand::thread_rng();
    Array2::from_shape_fn((rows, cols), |_| rng.r#gen::<f64>())
}

fn bench_rolling_quantile(c: &mut Criterion) {
    let mut group = c.benchmark_group("rolling_quantile");
    let window = RollingWindow::new(90, 75);

    for size in [365, 1000, 3000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let data = random_returns(size);
            b.iter(|| window.quantile(black_box(&data), 0.05).unwrap());
        });
    }

    group.finish();
}

fn bench_rolling_shortfall(c: &mut Criterion) {
    let mut group = c.benchmark_group("rolling_shortfall");
    let window = RollingWindow::new(90, 75);

    for size in [365, 1000, 3000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let data = random_returns(size);
            b.iter(|| window.apply(black_box(&data), |v| expected_shortfall(v, 0.05)));
        });
    }

    group.finish();
}

fn bench_quantile_buckets(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantile_buckets");

    for size in [50, 200, 1000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let data = random_returns(size).to_vec();
            b.iter(|| quantile_buckets(black_box(&data), 5));
        });
    }

    group.finish();
}

fn bench_least_squares(c: &mut Criterion) {
    let mut group = c.benchmark_group("least_squares");

    for (rows, cols) in [(365, 6), (2000, 6), (2000, 36)] {
        group.bench_with_input(
            BenchmarkId::new("shape", format!("{rows}x{cols}")),
            &(rows, cols),
            |b, &(rows, cols)| {
                let x = random_matrix(rows, cols);
                let y = random_returns(rows);
                b.iter(|| least_squares(black_box(&y), black_box(&x)).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_kronecker_accumulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("kronecker_accumulation");

    for rows in [10_000, 50_000] {
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            let f = random_matrix(rows, 6);
            let z = random_matrix(rows, 6);
            let y = random_returns(rows);
            b.iter(|| {
                let mut normal = NormalEquations::new(36);
                for i in 0..rows {
                    let row = kronecker_row(f.row(i), z.row(i));
                    normal.push(row.view(), y[i]).unwrap();
                }
                normal.solve().unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_rolling_quantile,
    bench_rolling_shortfall,
    bench_quantile_buckets,
    bench_least_squares,
    bench_kronecker_accumulation,
);
criterion_main!(benches);
