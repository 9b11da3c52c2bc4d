//! The recursive Strassen core and its element-wise helpers.

use crate::error::{MatmulError, Result};
use crate::matrix::naive::gemm_naive;
use crate::matrix::view::{MatrixView, MatrixViewMut};
use crate::memory::arena::ScratchFrame;
use crate::ops::OpCounter;
use crate::scalar::Scalar;

fn check_same_shape<T: Scalar>(
    op: &'static str,
    x: &MatrixView<'_, T>,
    y: &MatrixView<'_, T>,
    out: &MatrixViewMut<'_, T>,
) -> Result<()> {
    if x.shape() != y.shape() {
        return Err(MatmulError::mismatch(op, x.shape(), y.shape()));
    }
    if out.shape() != x.shape() {
        return Err(MatmulError::mismatch(op, x.shape(), out.shape()));
    }
    Ok(())
}

fn zip_into<T: Scalar>(
    x: &MatrixView<'_, T>,
    y: &MatrixView<'_, T>,
    out: &mut MatrixViewMut<'_, T>,
    ops: &mut Option<&mut OpCounter>,
    f: impl Fn(T, T) -> T,
) {
    for i in 0..out.rows() {
        let (xr, yr) = (x.row(i), y.row(i));
        for ((o, &p), &q) in out.row_mut(i).iter_mut().zip(xr).zip(yr) {
            *o = f(p, q);
        }
    }
    OpCounter::record_add(ops, (out.rows() * out.cols()) as u64);
}

/// `out = x + y`, one add per element.
pub fn mat_add<T: Scalar>(
    x: &MatrixView<'_, T>,
    y: &MatrixView<'_, T>,
    out: &mut MatrixViewMut<'_, T>,
    ops: &mut Option<&mut OpCounter>,
) -> Result<()> {
    check_same_shape("mat_add", x, y, out)?;
    zip_into(x, y, out, ops, |p, q| p + q);
    Ok(())
}

/// `out = x - y`, counted as one add per element.
pub fn mat_sub<T: Scalar>(
    x: &MatrixView<'_, T>,
    y: &MatrixView<'_, T>,
    out: &mut MatrixViewMut<'_, T>,
    ops: &mut Option<&mut OpCounter>,
) -> Result<()> {
    check_same_shape("mat_sub", x, y, out)?;
    zip_into(x, y, out, ops, |p, q| p - q);
    Ok(())
}

/// Writes `f(i, j)` into the `m x m` quadrant of `c` at `(r0, c0)`.
fn write_quadrant<T: Scalar>(
    c: &mut MatrixViewMut<'_, T>,
    r0: usize,
    c0: usize,
    m: usize,
    f: impl Fn(usize, usize) -> T,
) -> Result<()> {
    let mut q = c.subview_mut(r0, c0, m, m)?;
    for i in 0..m {
        for (j, out) in q.row_mut(i).iter_mut().enumerate() {
            *out = f(i, j);
        }
    }
    Ok(())
}

/// C = A * B for square, equal-sized operands whose size halves cleanly down
/// to `leaf`.
///
/// All nine temporaries of a level come from a child of `frame`, which is
/// dropped before returning. Only one branch of the recursion holds scratch
/// at a time, so peak usage stays below `3·n²` elements.
///
/// C is written only in the final combine step, after every sub-product has
/// succeeded.
pub(crate) fn strassen_rec<T: Scalar>(
    a: MatrixView<'_, T>,
    b: MatrixView<'_, T>,
    c: &mut MatrixViewMut<'_, T>,
    frame: &mut ScratchFrame<'_, T>,
    ops: &mut Option<&mut OpCounter>,
    leaf: usize,
) -> Result<()> {
    debug_assert!(a.is_square() && b.is_square() && c.is_square());
    debug_assert!(a.rows() == b.rows() && a.rows() == c.rows());

    let n = a.rows();
    if n == 0 {
        return Ok(());
    }
    if n <= leaf {
        return gemm_naive(&a, &b, c, ops.as_deref_mut());
    }
    if n % 2 != 0 {
        return Err(MatmulError::OddDimension { n, leaf });
    }

    let m = n / 2;
    tracing::trace!(n, offset = frame.used_bytes(), "strassen level");

    let [a11, a12, a21, a22] = a.quadrants()?;
    let [b11, b12, b21, b22] = b.quadrants()?;

    let mut scratch = frame.child();
    let mut m1 = scratch.alloc_matrix(m, m)?;
    let mut m2 = scratch.alloc_matrix(m, m)?;
    let mut m3 = scratch.alloc_matrix(m, m)?;
    let mut m4 = scratch.alloc_matrix(m, m)?;
    let mut m5 = scratch.alloc_matrix(m, m)?;
    let mut m6 = scratch.alloc_matrix(m, m)?;
    let mut m7 = scratch.alloc_matrix(m, m)?;
    let mut t1 = scratch.alloc_matrix(m, m)?;
    let mut t2 = scratch.alloc_matrix(m, m)?;

    // M1 = (A11 + A22)(B11 + B22)
    mat_add(&a11, &a22, &mut t1, ops)?;
    mat_add(&b11, &b22, &mut t2, ops)?;
    strassen_rec(t1.as_view(), t2.as_view(), &mut m1, &mut scratch, ops, leaf)?;

    // M2 = (A21 + A22) B11
    mat_add(&a21, &a22, &mut t1, ops)?;
    strassen_rec(t1.as_view(), b11, &mut m2, &mut scratch, ops, leaf)?;

    // M3 = A11 (B12 - B22)
    mat_sub(&b12, &b22, &mut t2, ops)?;
    strassen_rec(a11, t2.as_view(), &mut m3, &mut scratch, ops, leaf)?;

    // M4 = A22 (B21 - B11)
    mat_sub(&b21, &b11, &mut t2, ops)?;
    strassen_rec(a22, t2.as_view(), &mut m4, &mut scratch, ops, leaf)?;

    // M5 = (A11 + A12) B22
    mat_add(&a11, &a12, &mut t1, ops)?;
    strassen_rec(t1.as_view(), b22, &mut m5, &mut scratch, ops, leaf)?;

    // M6 = (A21 - A11)(B11 + B12)
    mat_sub(&a21, &a11, &mut t1, ops)?;
    mat_add(&b11, &b12, &mut t2, ops)?;
    strassen_rec(t1.as_view(), t2.as_view(), &mut m6, &mut scratch, ops, leaf)?;

    // M7 = (A12 - A22)(B21 + B22)
    mat_sub(&a12, &a22, &mut t1, ops)?;
    mat_add(&b21, &b22, &mut t2, ops)?;
    strassen_rec(t1.as_view(), t2.as_view(), &mut m7, &mut scratch, ops, leaf)?;

    let (m1, m2, m3, m4) = (m1.into_view(), m2.into_view(), m3.into_view(), m4.into_view());
    let (m5, m6, m7) = (m5.into_view(), m6.into_view(), m7.into_view());

    write_quadrant(c, 0, 0, m, |i, j| {
        m1[(i, j)] + m4[(i, j)] - m5[(i, j)] + m7[(i, j)]
    })?;
    write_quadrant(c, 0, m, m, |i, j| m3[(i, j)] + m5[(i, j)])?;
    write_quadrant(c, m, 0, m, |i, j| m2[(i, j)] + m4[(i, j)])?;
    write_quadrant(c, m, m, m, |i, j| {
        m1[(i, j)] - m2[(i, j)] + m3[(i, j)] + m6[(i, j)]
    })?;
    // 3 + 1 + 1 + 3 adds per quadrant element.
    OpCounter::record_add(ops, 8 * (m * m) as u64);

    // Rolls the arena back to this level's entry offset.
    drop(scratch);
    Ok(())
}
