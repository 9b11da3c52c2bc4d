use super::view::{MatrixView, MatrixViewMut};
use crate::error::{MatmulError, Result};
use crate::ops::OpCounter;
use crate::scalar::Scalar;

/// Naive matrix multiplication using i-j-k loop order: C = A * B.
///
/// This is the textbook triple-loop implementation. It is the correctness
/// oracle for Strassen and the base case its recursion bottoms out in.
///
/// Each output element costs `k` multiplies and `k - 1` adds, so an
/// `n x n` product records `n³` multiplies and `n²(n - 1)` adds.
///
/// # Arguments
///
/// * `a` - Matrix A (m × k)
/// * `b` - Matrix B (k × n)
/// * `c` - Matrix C (m × n), overwritten
/// * `ops` - Optional operation counter
///
/// # Errors
///
/// `DimensionMismatch` if the shapes don't chain; C is left untouched.
pub fn gemm_naive<T: Scalar>(
    a: &MatrixView<'_, T>,
    b: &MatrixView<'_, T>,
    c: &mut MatrixViewMut<'_, T>,
    mut ops: Option<&mut OpCounter>,
) -> Result<()> {
    if a.cols() != b.rows() {
        return Err(MatmulError::mismatch("gemm_naive", a.shape(), b.shape()));
    }
    if c.shape() != (a.rows(), b.cols()) {
        return Err(MatmulError::mismatch(
            "gemm_naive",
            (a.rows(), b.cols()),
            c.shape(),
        ));
    }

    let (m, k, n) = (a.rows(), a.cols(), b.cols());
    if k == 0 {
        c.fill(T::zero());
        return Ok(());
    }

    for i in 0..m {
        let a_row = a.row(i);
        let c_row = c.row_mut(i);
        for (j, out) in c_row.iter_mut().enumerate() {
            let mut sum = a_row[0] * b[(0, j)];
            for p in 1..k {
                sum += a_row[p] * b[(p, j)];
            }
            *out = sum;
        }
    }

    let (m, k, n) = (m as u64, k as u64, n as u64);
    OpCounter::record_mul(&mut ops, m * n * k);
    OpCounter::record_add(&mut ops, m * n * (k - 1));
    Ok(())
}
