//! Strassen's divide-and-conquer multiplication.
//!
//! Two entry points wrap the recursive core:
//!
//! - [`gemm_strassen_pow2_prealloc`] takes a caller-sized arena and requires
//!   a power-of-two size, so benchmark loops keep allocation out of the timed
//!   section.
//! - [`gemm_strassen`] takes any square size, sizes its own arena, and pads
//!   non-power-of-two operands with zeros when the config allows it.
//!
//! ```
//! use matmul::matrix::owned::Matrix;
//! use matmul::strassen::{StrassenConfig, gemm_strassen};
//!
//! let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
//! let b = Matrix::from_rows(&[[5.0, 6.0], [7.0, 8.0]]).unwrap();
//! let mut c = Matrix::zeros(2, 2).unwrap();
//!
//! gemm_strassen(&a.view(), &b.view(), &mut c.view_mut(), None, StrassenConfig::default()).unwrap();
//! assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0]);
//! ```

pub mod recursive;
pub mod sizing;

pub use recursive::{mat_add, mat_sub};
pub use sizing::{is_power_of_two, next_power_of_two, strassen_scratch_bytes};

use crate::error::{MatmulError, Result};
use crate::matrix::owned::Matrix;
use crate::matrix::view::{MatrixView, MatrixViewMut};
use crate::memory::arena::ScratchArena;
use crate::ops::OpCounter;
use crate::scalar::Scalar;
use recursive::strassen_rec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrassenConfig {
    /// Sizes at or below this go straight to the naive kernel. Must be at
    /// least 1.
    pub leaf_size: usize,
    /// Zero-pad non-power-of-two operands in [`gemm_strassen`].
    pub pad_to_power_of_two: bool,
}

impl Default for StrassenConfig {
    fn default() -> Self {
        Self {
            leaf_size: 1,
            pad_to_power_of_two: true,
        }
    }
}

impl StrassenConfig {
    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    pub fn with_padding(mut self, pad_to_power_of_two: bool) -> Self {
        self.pad_to_power_of_two = pad_to_power_of_two;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.leaf_size == 0 {
            return Err(MatmulError::InvalidLeafSize);
        }
        Ok(())
    }
}

/// Checks that A, B, C are square, equal-sized and chain; returns `n`.
fn validate_operands<T: Scalar>(
    op: &'static str,
    a: &MatrixView<'_, T>,
    b: &MatrixView<'_, T>,
    c: &MatrixViewMut<'_, T>,
) -> Result<usize> {
    if a.cols() != b.rows() {
        return Err(MatmulError::mismatch(op, a.shape(), b.shape()));
    }
    if c.shape() != (a.rows(), b.cols()) {
        return Err(MatmulError::mismatch(op, (a.rows(), b.cols()), c.shape()));
    }
    for (rows, cols) in [a.shape(), b.shape(), c.shape()] {
        if rows != cols {
            return Err(MatmulError::NotSquare { op, rows, cols });
        }
    }
    Ok(a.rows())
}

/// C = A * B for power-of-two `n` using a caller-provided arena.
///
/// The arena must have at least [`strassen_scratch_bytes`]`::<T>(n)` free
/// bytes. On return, success or failure, its cursor is back where it was.
///
/// # Errors
///
/// Every precondition (shapes, power-of-two size, leaf size, arena budget)
/// is checked before C is touched.
pub fn gemm_strassen_pow2_prealloc<T: Scalar>(
    a: &MatrixView<'_, T>,
    b: &MatrixView<'_, T>,
    c: &mut MatrixViewMut<'_, T>,
    arena: &mut ScratchArena<T>,
    mut ops: Option<&mut OpCounter>,
    cfg: StrassenConfig,
) -> Result<()> {
    const OP: &str = "gemm_strassen_pow2_prealloc";

    let n = validate_operands(OP, a, b, c)?;
    cfg.validate()?;
    if !is_power_of_two(n) {
        return Err(MatmulError::NotPowerOfTwo { op: OP, n });
    }
    let required = strassen_scratch_bytes::<T>(n)?;
    if arena.free_bytes() < required {
        return Err(MatmulError::ArenaTooSmall {
            n,
            required,
            available: arena.free_bytes(),
        });
    }

    let mut frame = arena.frame();
    strassen_rec(*a, *b, c, &mut frame, &mut ops, cfg.leaf_size)
}

/// C = A * B for any square size.
///
/// Power-of-two sizes run directly with an internally sized arena. Other
/// sizes are zero-padded to the next power of two when
/// `cfg.pad_to_power_of_two` is set; the top-left `n x n` block of the padded
/// product is copied back into C.
///
/// # Errors
///
/// `NotPowerOfTwo` when padding is disabled and `n` needs it, plus every
/// error of [`gemm_strassen_pow2_prealloc`].
pub fn gemm_strassen<T: Scalar>(
    a: &MatrixView<'_, T>,
    b: &MatrixView<'_, T>,
    c: &mut MatrixViewMut<'_, T>,
    ops: Option<&mut OpCounter>,
    cfg: StrassenConfig,
) -> Result<()> {
    const OP: &str = "gemm_strassen";

    let n = validate_operands(OP, a, b, c)?;
    cfg.validate()?;
    if n == 0 {
        return Ok(());
    }

    if is_power_of_two(n) {
        let mut arena = ScratchArena::with_capacity(strassen_scratch_bytes::<T>(n)?)?;
        return gemm_strassen_pow2_prealloc(a, b, c, &mut arena, ops, cfg);
    }
    if !cfg.pad_to_power_of_two {
        return Err(MatmulError::NotPowerOfTwo { op: OP, n });
    }

    let padded = next_power_of_two(n)?;
    tracing::debug!(n, padded, leaf = cfg.leaf_size, "padding strassen operands");

    let mut ap = Matrix::zeros(padded, padded)?;
    let mut bp = Matrix::zeros(padded, padded)?;
    let mut cp = Matrix::zeros(padded, padded)?;
    ap.view_mut().subview_mut(0, 0, n, n)?.copy_from(a)?;
    bp.view_mut().subview_mut(0, 0, n, n)?.copy_from(b)?;

    let mut arena = ScratchArena::with_capacity(strassen_scratch_bytes::<T>(padded)?)?;
    gemm_strassen_pow2_prealloc(
        &ap.view(),
        &bp.view(),
        &mut cp.view_mut(),
        &mut arena,
        ops,
        cfg,
    )?;

    c.copy_from(&cp.view().subview(0, 0, n, n)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::matrix::naive::gemm_naive;

    fn sequential(n: usize) -> Matrix<f64> {
        Matrix::from_fn(n, n, |i, j| ((i * n + j) % 7) as f64 - 3.0).unwrap()
    }

    #[test]
    fn matches_naive_on_power_of_two_sizes() {
        for n in [1, 2, 4, 8, 16] {
            let a = sequential(n);
            let b = Matrix::from_fn(n, n, |i, j| (i as f64) - (j as f64)).unwrap();
            let mut expected = Matrix::zeros(n, n).unwrap();
            let mut actual = Matrix::zeros(n, n).unwrap();

            gemm_naive(&a.view(), &b.view(), &mut expected.view_mut(), None).unwrap();
            gemm_strassen(&a.view(), &b.view(), &mut actual.view_mut(), None, StrassenConfig::default())
                .unwrap();
            assert_eq!(expected.as_slice(), actual.as_slice(), "n={n}");
        }
    }

    #[test]
    fn prealloc_rejects_non_power_of_two_before_writing() {
        let a = sequential(6);
        let mut c = Matrix::zeros(6, 6).unwrap();
        c.fill(42.0);
        let mut arena = ScratchArena::with_capacity(1 << 16).unwrap();

        let err = gemm_strassen_pow2_prealloc(
            &a.view(),
            &a.view(),
            &mut c.view_mut(),
            &mut arena,
            None,
            StrassenConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, MatmulError::NotPowerOfTwo { op: "gemm_strassen_pow2_prealloc", n: 6 });
        assert!(c.as_slice().iter().all(|&x| x == 42.0));
    }

    #[test]
    fn prealloc_rejects_undersized_arena() {
        let a = sequential(8);
        let mut c = Matrix::zeros(8, 8).unwrap();
        let required = strassen_scratch_bytes::<f64>(8).unwrap();
        let mut arena = ScratchArena::with_capacity(required - 1).unwrap();

        let err = gemm_strassen_pow2_prealloc(
            &a.view(),
            &a.view(),
            &mut c.view_mut(),
            &mut arena,
            None,
            StrassenConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MatmulError::ArenaTooSmall { n: 8, .. }));
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn zero_leaf_size_is_invalid() {
        let a = sequential(4);
        let mut c = Matrix::zeros(4, 4).unwrap();
        let cfg = StrassenConfig::default().with_leaf_size(0);
        let err = gemm_strassen(&a.view(), &a.view(), &mut c.view_mut(), None, cfg).unwrap_err();
        assert_eq!(err, MatmulError::InvalidLeafSize);
    }

    #[test]
    fn non_square_operands_are_rejected() {
        let a = Matrix::<f64>::zeros(2, 4).unwrap();
        let b = Matrix::<f64>::zeros(4, 2).unwrap();
        let mut c = Matrix::<f64>::zeros(2, 2).unwrap();
        let err = gemm_strassen(&a.view(), &b.view(), &mut c.view_mut(), None, StrassenConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            MatmulError::NotSquare {
                op: "gemm_strassen",
                rows: 2,
                cols: 4
            }
        );
    }

    #[test]
    fn empty_operands_are_a_noop() {
        let a = Matrix::<f64>::new();
        let mut c = Matrix::<f64>::new();
        gemm_strassen(&a.view(), &a.view(), &mut c.view_mut(), None, StrassenConfig::default())
            .unwrap();
    }

    #[test]
    fn padding_handles_odd_sizes() {
        let n = 5;
        let a = sequential(n);
        let b = Matrix::from_fn(n, n, |i, j| (i * j) as f64).unwrap();
        let mut expected = Matrix::zeros(n, n).unwrap();
        let mut actual = Matrix::zeros(n, n).unwrap();

        gemm_naive(&a.view(), &b.view(), &mut expected.view_mut(), None).unwrap();
        gemm_strassen(&a.view(), &b.view(), &mut actual.view_mut(), None, StrassenConfig::default())
            .unwrap();
        assert_eq!(expected.as_slice(), actual.as_slice());
    }

    #[test]
    fn arena_is_fully_rolled_back_after_the_call() {
        let n = 16;
        let a = sequential(n);
        let mut c = Matrix::zeros(n, n).unwrap();
        let mut arena = ScratchArena::with_capacity(strassen_scratch_bytes::<f64>(n).unwrap()).unwrap();

        let before = arena.used_bytes();
        gemm_strassen_pow2_prealloc(
            &a.view(),
            &a.view(),
            &mut c.view_mut(),
            &mut arena,
            None,
            StrassenConfig::default(),
        )
        .unwrap();
        assert_eq!(arena.used_bytes(), before);
        assert!(arena.peak_bytes() > 0);
        assert!(arena.peak_bytes() <= strassen_scratch_bytes::<f64>(n).unwrap());
    }
}
