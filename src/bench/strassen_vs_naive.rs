//! Criterion comparison of the naive kernel and Strassen at several leaf
//! sizes. Strassen runs against an arena sized once outside the timed loop.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use matmul::matrix::generators::make_unit_matrix;
use matmul::{
    Matrix, MatrixKind, ScratchArena, StrassenConfig, gemm_naive, gemm_strassen_pow2_prealloc,
    strassen_scratch_bytes,
};
use num_complex::Complex;

const SIZES: [usize; 4] = [32, 64, 128, 256];

fn bench_real(c: &mut Criterion) {
    let mut group = c.benchmark_group("f64");
    group.sample_size(20);

    for n in SIZES {
        let a = make_unit_matrix::<f64>(n, n, MatrixKind::RandomUniform, 1000 + n as u64).unwrap();
        let b = make_unit_matrix::<f64>(n, n, MatrixKind::RandomUniform, 2000 + n as u64).unwrap();
        let mut out = Matrix::<f64>::zeros(n, n).unwrap();
        group.throughput(Throughput::Elements((n * n * n) as u64));

        group.bench_with_input(BenchmarkId::new("naive", n), &n, |bench, _| {
            bench.iter(|| {
                gemm_naive(&a.view(), &b.view(), &mut out.view_mut(), None).unwrap();
                black_box(out[(0, 0)])
            });
        });

        let mut arena = ScratchArena::with_capacity(strassen_scratch_bytes::<f64>(n).unwrap()).unwrap();
        for leaf in [16, 64] {
            let cfg = StrassenConfig::default()
                .with_leaf_size(leaf)
                .with_padding(false);
            group.bench_with_input(BenchmarkId::new(format!("strassen_leaf{leaf}"), n), &n, |bench, _| {
                bench.iter(|| {
                    gemm_strassen_pow2_prealloc(&a.view(), &b.view(), &mut out.view_mut(), &mut arena, None, cfg)
                        .unwrap();
                    black_box(out[(0, 0)])
                });
            });
        }
    }

    group.finish();
}

fn bench_complex(c: &mut Criterion) {
    let mut group = c.benchmark_group("complex_f64");
    group.sample_size(10);

    for n in [64, 128] {
        let a = make_unit_matrix::<Complex<f64>>(n, n, MatrixKind::HermitianUniform, 1000 + n as u64)
            .unwrap();
        let b = make_unit_matrix::<Complex<f64>>(n, n, MatrixKind::HermitianUniform, 2000 + n as u64)
            .unwrap();
        let mut out = Matrix::<Complex<f64>>::zeros(n, n).unwrap();
        let mut arena =
            ScratchArena::with_capacity(strassen_scratch_bytes::<Complex<f64>>(n).unwrap()).unwrap();
        let cfg = StrassenConfig::default().with_leaf_size(32).with_padding(false);

        group.bench_with_input(BenchmarkId::new("naive", n), &n, |bench, _| {
            bench.iter(|| {
                gemm_naive(&a.view(), &b.view(), &mut out.view_mut(), None).unwrap();
                black_box(out[(0, 0)])
            });
        });
        group.bench_with_input(BenchmarkId::new("strassen_leaf32", n), &n, |bench, _| {
            bench.iter(|| {
                gemm_strassen_pow2_prealloc(&a.view(), &b.view(), &mut out.view_mut(), &mut arena, None, cfg)
                    .unwrap();
                black_box(out[(0, 0)])
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_real, bench_complex);
criterion_main!(benches);
