//! Benchmark harness behind the `matmul_bench` binary.
//!
//! One [`BenchRow`] per power-of-two size: seeded operands, warmups, timed
//! trials, the analytic operation model, and process-memory readings taken
//! around the measurement. Rows are written as CSV.

use crate::error::{MatmulError, Result};
use crate::matrix::generators::{MatrixKind, RandomScalar, make_unit_matrix};
use crate::matrix::naive::gemm_naive;
use crate::matrix::owned::Matrix;
use crate::matrix::view::MatrixView;
use crate::memory::arena::ScratchArena;
use crate::memory::process::process_memory_info;
use crate::ops::OpCounter;
use crate::scalar::Scalar;
use crate::strassen::{StrassenConfig, gemm_strassen_pow2_prealloc, strassen_scratch_bytes};
use clap::ValueEnum;
use std::hint::black_box;
use std::io::Write;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Algo {
    Naive,
    Strassen,
}

impl Algo {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algo::Naive => "naive",
            Algo::Strassen => "strassen",
        }
    }
}

/// `real` runs on `f64`, `complex` on `Complex<f64>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dtype {
    Real,
    Complex,
}

impl Dtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dtype::Real => "real",
            Dtype::Complex => "complex",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OperandKind {
    Random,
    Symmetric,
    Hermitian,
}

impl OperandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperandKind::Random => "random",
            OperandKind::Symmetric => "symmetric",
            OperandKind::Hermitian => "hermitian",
        }
    }

    pub fn matrix_kind(&self) -> MatrixKind {
        match self {
            OperandKind::Random => MatrixKind::RandomUniform,
            OperandKind::Symmetric => MatrixKind::SymmetricUniform,
            OperandKind::Hermitian => MatrixKind::HermitianUniform,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchOptions {
    pub algo: Algo,
    pub kind: OperandKind,
    pub warmups: usize,
    pub trials: usize,
    /// Strassen leaf size. Recorded but unused for the naive kernel.
    pub leaf: usize,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            algo: Algo::Naive,
            kind: OperandKind::Random,
            warmups: 2,
            trials: 10,
            leaf: 64,
        }
    }
}

impl BenchOptions {
    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(MatmulError::InvalidArgument(
                "at least one timed trial is required".into(),
            ));
        }
        if self.leaf == 0 {
            return Err(MatmulError::InvalidLeafSize);
        }
        Ok(())
    }
}

/// One CSV line.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchRow {
    pub algo: Algo,
    pub dtype: Dtype,
    pub kind: OperandKind,
    pub n: usize,
    pub warmups: usize,
    pub trials: usize,
    pub leaf: usize,
    pub mean_s: f64,
    pub min_s: f64,
    pub std_s: f64,
    /// Storage of A, B and C.
    pub bytes_abcs: usize,
    /// Scratch arena size; zero for the naive kernel.
    pub extra_bytes_est: usize,
    pub ws_before: usize,
    pub ws_after: usize,
    pub ws_delta: usize,
    pub field: OpCounter,
    pub real_equiv: OpCounter,
    pub checksum: f64,
}

pub const CSV_HEADER: &str = "algo,dtype,kind,n,warmups,trials,leaf,mean_s,min_s,std_s,\
bytes_abcs,extra_bytes_est,ws_before,ws_after,ws_delta,\
field_mul,field_add,field_ops,real_mul_equiv,real_add_equiv,real_ops_equiv,checksum";

/// Powers of two from 2 up to and including the largest one `<= max_n`.
pub fn sizes_pow2_up_to(max_n: usize) -> Vec<usize> {
    std::iter::successors(Some(2usize), |&n| n.checked_mul(2))
        .take_while(|&n| n <= max_n)
        .collect()
}

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample standard deviation (`n - 1` denominator); zero below two samples.
pub fn stddev(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    let acc: f64 = xs.iter().map(|x| (x - m) * (x - m)).sum();
    (acc / (xs.len() - 1) as f64).sqrt()
}

pub fn min(xs: &[f64]) -> f64 {
    xs.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Field operations of the naive kernel on `n x n` operands.
pub fn ops_naive(n: usize) -> OpCounter {
    let n = n as u64;
    OpCounter {
        mul: n * n * n,
        add: n * n * n.saturating_sub(1),
    }
}

/// Field operations of Strassen with leaf cutoff `leaf`.
///
/// Each level costs seven half-size products plus 18 quadrant-sized
/// additions: ten while forming operands and eight while combining.
pub fn ops_strassen(n: usize, leaf: usize) -> OpCounter {
    if n <= leaf || n < 2 {
        return ops_naive(n);
    }
    let m = n / 2;
    let half = ops_strassen(m, leaf);
    OpCounter {
        mul: 7 * half.mul,
        add: 7 * half.add + 18 * (m as u64) * (m as u64),
    }
}

/// Real-arithmetic equivalent of `field`. A complex multiply is four real
/// multiplies and two real adds; a complex add is two real adds.
pub fn real_equiv_ops(is_complex: bool, field: OpCounter) -> OpCounter {
    if !is_complex {
        return field;
    }
    OpCounter {
        mul: 4 * field.mul,
        add: 2 * field.mul + 2 * field.add,
    }
}

/// Sum of entries, or of moduli for complex scalars.
pub fn checksum<T: Scalar>(m: &MatrixView<'_, T>) -> f64 {
    (0..m.rows())
        .flat_map(|i| m.row(i).iter())
        .map(|&x| if T::IS_COMPLEX { x.magnitude() } else { x.re() })
        .sum()
}

/// Runs warmups and timed trials for one size and assembles its row.
///
/// Strassen runs without padding against an arena sized once, before any
/// timing starts.
pub fn bench_size<T: RandomScalar>(opts: &BenchOptions, n: usize) -> Result<BenchRow> {
    opts.validate()?;

    let kind = opts.kind.matrix_kind();
    let a = make_unit_matrix::<T>(n, n, kind, 1000 + n as u64)?;
    let b = make_unit_matrix::<T>(n, n, kind, 2000 + n as u64)?;
    let mut c = Matrix::<T>::zeros(n, n)?;

    let mem_before = process_memory_info();

    let cfg = StrassenConfig::default()
        .with_leaf_size(opts.leaf)
        .with_padding(false);
    let (mut arena, extra_bytes_est) = match opts.algo {
        Algo::Naive => (ScratchArena::<T>::new(), 0),
        Algo::Strassen => {
            let bytes = strassen_scratch_bytes::<T>(n)?;
            (ScratchArena::with_capacity(bytes)?, bytes)
        }
    };

    let mut multiply = |c: &mut Matrix<T>| match opts.algo {
        Algo::Naive => gemm_naive(&a.view(), &b.view(), &mut c.view_mut(), None),
        Algo::Strassen => {
            gemm_strassen_pow2_prealloc(&a.view(), &b.view(), &mut c.view_mut(), &mut arena, None, cfg)
        }
    };

    for _ in 0..opts.warmups {
        multiply(&mut c)?;
        black_box(checksum(&c.view()));
    }

    let mut times = Vec::with_capacity(opts.trials);
    let mut final_checksum = 0.0;
    for _ in 0..opts.trials {
        let start = Instant::now();
        multiply(&mut c)?;
        times.push(start.elapsed().as_secs_f64());

        final_checksum = black_box(checksum(&c.view()));
    }

    let mem_after = process_memory_info();

    let field = match opts.algo {
        Algo::Naive => ops_naive(n),
        Algo::Strassen => ops_strassen(n, opts.leaf),
    };

    Ok(BenchRow {
        algo: opts.algo,
        dtype: if T::IS_COMPLEX { Dtype::Complex } else { Dtype::Real },
        kind: opts.kind,
        n,
        warmups: opts.warmups,
        trials: opts.trials,
        leaf: opts.leaf,
        mean_s: mean(&times),
        min_s: min(&times),
        std_s: stddev(&times),
        bytes_abcs: 3 * n * n * size_of::<T>(),
        extra_bytes_est,
        ws_before: mem_before.working_set_bytes,
        ws_after: mem_after.working_set_bytes,
        ws_delta: mem_after
            .working_set_bytes
            .saturating_sub(mem_before.working_set_bytes),
        field,
        real_equiv: real_equiv_ops(T::IS_COMPLEX, field),
        checksum: final_checksum,
    })
}

pub fn write_csv_header<W: Write>(w: &mut W) -> std::io::Result<()> {
    writeln!(w, "{CSV_HEADER}")
}

pub fn write_csv_row<W: Write>(w: &mut W, r: &BenchRow) -> std::io::Result<()> {
    writeln!(
        w,
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        r.algo.as_str(),
        r.dtype.as_str(),
        r.kind.as_str(),
        r.n,
        r.warmups,
        r.trials,
        r.leaf,
        r.mean_s,
        r.min_s,
        r.std_s,
        r.bytes_abcs,
        r.extra_bytes_est,
        r.ws_before,
        r.ws_after,
        r.ws_delta,
        r.field.mul,
        r.field.add,
        r.field.total(),
        r.real_equiv.mul,
        r.real_equiv.add,
        r.real_equiv.total(),
        r.checksum,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex;

    #[test]
    fn sizes_are_powers_of_two_from_two() {
        assert_eq!(sizes_pow2_up_to(0), Vec::<usize>::new());
        assert_eq!(sizes_pow2_up_to(1), Vec::<usize>::new());
        assert_eq!(sizes_pow2_up_to(2), vec![2]);
        assert_eq!(sizes_pow2_up_to(100), vec![2, 4, 8, 16, 32, 64]);
        assert_eq!(sizes_pow2_up_to(512).last(), Some(&512));
    }

    #[test]
    fn statistics() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(mean(&xs), 2.5);
        assert_relative_eq!(min(&xs), 1.0);
        assert_relative_eq!(stddev(&xs), (5.0f64 / 3.0).sqrt());
        assert_eq!(stddev(&[7.0]), 0.0);
    }

    #[test]
    fn operation_models() {
        assert_eq!(ops_naive(4), OpCounter { mul: 64, add: 48 });
        assert_eq!(ops_naive(0), OpCounter::default());
        // One level above 1x1 leaves: 7 muls, 18 adds.
        assert_eq!(ops_strassen(2, 1), OpCounter { mul: 7, add: 18 });
        assert_eq!(ops_strassen(4, 1), OpCounter { mul: 49, add: 7 * 18 + 18 * 4 });
        assert_eq!(ops_strassen(64, 64), ops_naive(64));
    }

    #[test]
    fn complex_ops_expand_to_real_ops() {
        let field = OpCounter { mul: 10, add: 3 };
        assert_eq!(real_equiv_ops(false, field), field);
        assert_eq!(real_equiv_ops(true, field), OpCounter { mul: 40, add: 26 });
    }

    #[test]
    fn checksum_uses_modulus_for_complex() {
        let real = Matrix::from_rows(&[[1.0, -2.0], [3.0, -4.0]]).unwrap();
        assert_relative_eq!(checksum(&real.view()), -2.0);

        let cplx = Matrix::from_rows(&[[Complex::new(3.0, 4.0), Complex::new(0.0, -1.0)]]).unwrap();
        assert_relative_eq!(checksum(&cplx.view()), 6.0);
    }

    #[test]
    fn zero_trials_are_rejected() {
        let opts = BenchOptions {
            trials: 0,
            ..Default::default()
        };
        assert!(bench_size::<f64>(&opts, 4).is_err());
    }

    #[test]
    fn naive_and_strassen_rows_agree_on_the_product() {
        let naive = BenchOptions {
            warmups: 0,
            trials: 2,
            leaf: 2,
            ..Default::default()
        };
        let strassen = BenchOptions {
            algo: Algo::Strassen,
            ..naive.clone()
        };

        let a = bench_size::<f64>(&naive, 16).unwrap();
        let b = bench_size::<f64>(&strassen, 16).unwrap();
        assert_relative_eq!(a.checksum, b.checksum, epsilon = 1e-9);
        assert_eq!(a.extra_bytes_est, 0);
        assert_eq!(b.extra_bytes_est, strassen_scratch_bytes::<f64>(16).unwrap());
        assert_eq!(b.field, ops_strassen(16, 2));
        assert_eq!(b.bytes_abcs, 3 * 16 * 16 * 8);
        assert!(b.min_s <= b.mean_s);
    }

    #[test]
    fn complex_row_reports_real_equivalents() {
        let opts = BenchOptions {
            kind: OperandKind::Hermitian,
            warmups: 1,
            trials: 1,
            ..Default::default()
        };
        let row = bench_size::<Complex<f64>>(&opts, 4).unwrap();
        assert_eq!(row.dtype, Dtype::Complex);
        assert_eq!(row.real_equiv, real_equiv_ops(true, ops_naive(4)));
        assert_eq!(row.std_s, 0.0);
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let opts = BenchOptions {
            warmups: 0,
            trials: 1,
            ..Default::default()
        };
        let rows: Vec<_> = [2, 4]
            .iter()
            .map(|&n| bench_size::<f64>(&opts, n).unwrap())
            .collect();

        let d = tempfile::tempdir().unwrap();
        let p = d.path().join("results.csv");
        let mut f = std::fs::File::create(&p).unwrap();
        write_csv_header(&mut f).unwrap();
        for r in &rows {
            write_csv_row(&mut f, r).unwrap();
        }
        drop(f);

        let text = std::fs::read_to_string(&p).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        let columns = CSV_HEADER.split(',').count();
        assert_eq!(columns, 22);
        assert!(lines[1..].iter().all(|l| l.split(',').count() == columns));
        assert!(lines[1].starts_with("naive,real,random,2,0,1,64,"));
    }
}
