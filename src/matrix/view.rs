//! Non-owning strided views over row-major storage.
//!
//! A view is a `(storage, rows, cols, stride)` descriptor: element `(r, c)`
//! lives at `storage[r * stride + c]`. Subviews slice the parent's storage
//! and keep its stride, so they alias the parent without copying.
//!
//! ```
//! use matmul::matrix::view::MatrixView;
//!
//! let data = [1.0, 2.0, 3.0,
//!             4.0, 5.0, 6.0];
//! let m = MatrixView::new(&data, 2, 3, 3).unwrap();
//! let right = m.subview(0, 1, 2, 2).unwrap();
//!
//! assert_eq!(right[(1, 0)], 5.0);
//! assert_eq!(right.stride(), 3);
//! ```

use crate::error::{MatmulError, Result};
use crate::scalar::Scalar;
use std::ops::{Index, IndexMut};

/// Number of storage elements spanned by a `rows x cols` view.
#[inline]
fn extent(rows: usize, cols: usize, stride: usize) -> Option<usize> {
    if rows == 0 || cols == 0 {
        return Some(0);
    }
    (rows - 1).checked_mul(stride)?.checked_add(cols)
}

fn validate(len: usize, rows: usize, cols: usize, stride: usize) -> Result<usize> {
    if stride < cols {
        return Err(MatmulError::InvalidArgument(format!(
            "stride {stride} is smaller than cols {cols}"
        )));
    }
    let needed = extent(rows, cols, stride).ok_or(MatmulError::SizeOverflow("view extent"))?;
    if needed > len {
        return Err(MatmulError::InvalidArgument(format!(
            "{rows}x{cols} view with stride {stride} needs {needed} elements, storage has {len}"
        )));
    }
    Ok(needed)
}

/// Storage range of the `(r0, c0, rows, cols)` subview of a parent view.
fn sub_range(
    parent: (usize, usize, usize),
    r0: usize,
    c0: usize,
    rows: usize,
    cols: usize,
) -> Result<std::ops::Range<usize>> {
    let (p_rows, p_cols, stride) = parent;
    let fits = r0.checked_add(rows).is_some_and(|end| end <= p_rows)
        && c0.checked_add(cols).is_some_and(|end| end <= p_cols);
    if !fits {
        return Err(MatmulError::SubviewOutOfBounds {
            row: r0,
            col: c0,
            sub_rows: rows,
            sub_cols: cols,
            rows: p_rows,
            cols: p_cols,
        });
    }
    if rows == 0 || cols == 0 {
        return Ok(0..0);
    }
    let start = r0 * stride + c0;
    Ok(start..start + (rows - 1) * stride + cols)
}

/// Coordinate assertion behind every indexing operator; compiled out without
/// the `bounds-checks` feature.
#[inline(always)]
pub(crate) fn check_index(r: usize, c: usize, rows: usize, cols: usize) {
    if cfg!(feature = "bounds-checks") {
        assert!(
            r < rows && c < cols,
            "index ({r}, {c}) out of range for {rows}x{cols} view"
        );
    }
}

/// Read-only view. `Copy`, so views can be passed around freely and may
/// alias each other.
#[derive(Debug, Clone, Copy)]
pub struct MatrixView<'a, T> {
    data: &'a [T],
    rows: usize,
    cols: usize,
    stride: usize,
}

/// Mutable view. Subviews reborrow it, so a write through a subview is
/// visible through the parent once the subview goes out of scope.
#[derive(Debug)]
pub struct MatrixViewMut<'a, T> {
    data: &'a mut [T],
    rows: usize,
    cols: usize,
    stride: usize,
}

impl<'a, T: Scalar> MatrixView<'a, T> {
    /// View `rows x cols` elements of `data` with the given row stride.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `stride < cols` or `data` is too short.
    pub fn new(data: &'a [T], rows: usize, cols: usize, stride: usize) -> Result<Self> {
        let len = validate(data.len(), rows, cols, stride)?;
        Ok(Self {
            data: &data[..len],
            rows,
            cols,
            stride,
        })
    }

    /// Contiguous view over exactly `rows * cols` elements.
    pub(crate) fn contiguous(data: &'a [T], rows: usize, cols: usize) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self {
            data,
            rows,
            cols,
            stride: cols,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Bounds-checked element read.
    pub fn get(&self, r: usize, c: usize) -> Result<T> {
        if r >= self.rows || c >= self.cols {
            return Err(MatmulError::IndexOutOfBounds {
                row: r,
                col: c,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self.data[r * self.stride + c])
    }

    /// Row `r` as a contiguous slice of `cols` elements.
    #[inline]
    pub fn row(&self, r: usize) -> &'a [T] {
        check_index(r, 0, self.rows, 1);
        if self.cols == 0 {
            return &[];
        }
        let start = r * self.stride;
        &self.data[start..start + self.cols]
    }

    /// Aliasing subview; shares this view's storage and stride.
    pub fn subview(&self, r0: usize, c0: usize, rows: usize, cols: usize) -> Result<Self> {
        let range = sub_range((self.rows, self.cols, self.stride), r0, c0, rows, cols)?;
        Ok(Self {
            data: &self.data[range],
            rows,
            cols,
            stride: self.stride,
        })
    }

    /// The four `(n/2) x (n/2)` quadrants `[X11, X12, X21, X22]` of a square
    /// view with even size.
    pub fn quadrants(&self) -> Result<[Self; 4]> {
        let m = self.rows / 2;
        if !self.is_square() || self.rows % 2 != 0 {
            return Err(MatmulError::InvalidArgument(format!(
                "cannot split {}x{} view into quadrants",
                self.rows, self.cols
            )));
        }
        Ok([
            self.subview(0, 0, m, m)?,
            self.subview(0, m, m, m)?,
            self.subview(m, 0, m, m)?,
            self.subview(m, m, m, m)?,
        ])
    }
}

impl<T: Scalar> Index<(usize, usize)> for MatrixView<'_, T> {
    type Output = T;

    #[inline]
    fn index(&self, (r, c): (usize, usize)) -> &T {
        check_index(r, c, self.rows, self.cols);
        &self.data[r * self.stride + c]
    }
}

impl<'a, T: Scalar> MatrixViewMut<'a, T> {
    pub fn new(data: &'a mut [T], rows: usize, cols: usize, stride: usize) -> Result<Self> {
        let len = validate(data.len(), rows, cols, stride)?;
        Ok(Self {
            data: &mut data[..len],
            rows,
            cols,
            stride,
        })
    }

    /// Contiguous view over exactly `rows * cols` elements.
    pub(crate) fn contiguous(data: &'a mut [T], rows: usize, cols: usize) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self {
            data,
            rows,
            cols,
            stride: cols,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Shared reborrow.
    #[inline]
    pub fn as_view(&self) -> MatrixView<'_, T> {
        MatrixView {
            data: &*self.data,
            rows: self.rows,
            cols: self.cols,
            stride: self.stride,
        }
    }

    /// Mutable reborrow with a shorter lifetime.
    #[inline]
    pub fn reborrow(&mut self) -> MatrixViewMut<'_, T> {
        MatrixViewMut {
            data: &mut *self.data,
            rows: self.rows,
            cols: self.cols,
            stride: self.stride,
        }
    }

    /// Converts into a read-only view for the full lifetime `'a`.
    #[inline]
    pub fn into_view(self) -> MatrixView<'a, T> {
        MatrixView {
            data: self.data,
            rows: self.rows,
            cols: self.cols,
            stride: self.stride,
        }
    }

    pub fn get(&self, r: usize, c: usize) -> Result<T> {
        self.as_view().get(r, c)
    }

    /// Bounds-checked element write.
    pub fn set(&mut self, r: usize, c: usize, value: T) -> Result<()> {
        if r >= self.rows || c >= self.cols {
            return Err(MatmulError::IndexOutOfBounds {
                row: r,
                col: c,
                rows: self.rows,
                cols: self.cols,
            });
        }
        self.data[r * self.stride + c] = value;
        Ok(())
    }

    #[inline]
    pub fn row_mut(&mut self, r: usize) -> &mut [T] {
        check_index(r, 0, self.rows, 1);
        if self.cols == 0 {
            return &mut [];
        }
        let start = r * self.stride;
        &mut self.data[start..start + self.cols]
    }

    pub fn subview(&self, r0: usize, c0: usize, rows: usize, cols: usize) -> Result<MatrixView<'_, T>> {
        self.as_view().subview(r0, c0, rows, cols)
    }

    /// Mutable aliasing subview; borrows `self` until it is dropped.
    pub fn subview_mut(
        &mut self,
        r0: usize,
        c0: usize,
        rows: usize,
        cols: usize,
    ) -> Result<MatrixViewMut<'_, T>> {
        let range = sub_range((self.rows, self.cols, self.stride), r0, c0, rows, cols)?;
        Ok(MatrixViewMut {
            data: &mut self.data[range],
            rows,
            cols,
            stride: self.stride,
        })
    }

    pub fn fill(&mut self, value: T) {
        for r in 0..self.rows {
            self.row_mut(r).fill(value);
        }
    }

    /// Copies `src` element-wise into this view.
    pub fn copy_from(&mut self, src: &MatrixView<'_, T>) -> Result<()> {
        if src.shape() != self.shape() {
            return Err(MatmulError::mismatch("copy_from", src.shape(), self.shape()));
        }
        for r in 0..self.rows {
            self.row_mut(r).copy_from_slice(src.row(r));
        }
        Ok(())
    }
}

impl<T: Scalar> Index<(usize, usize)> for MatrixViewMut<'_, T> {
    type Output = T;

    #[inline]
    fn index(&self, (r, c): (usize, usize)) -> &T {
        check_index(r, c, self.rows, self.cols);
        &self.data[r * self.stride + c]
    }
}

impl<T: Scalar> IndexMut<(usize, usize)> for MatrixViewMut<'_, T> {
    #[inline]
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut T {
        check_index(r, c, self.rows, self.cols);
        &mut self.data[r * self.stride + c]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn indexing_follows_stride() {
        // 2x2 view inside a 2x4 buffer
        let data = [1.0, 2.0, 9.0, 9.0, 3.0, 4.0, 9.0, 9.0];
        let v = MatrixView::new(&data, 2, 2, 4).unwrap();
        assert_eq!(v[(0, 1)], 2.0);
        assert_eq!(v[(1, 0)], 3.0);
        assert_eq!(v.row(1), &[3.0, 4.0]);
    }

    #[test]
    fn rejects_short_storage_and_small_stride() {
        let data = [0.0f64; 5];
        assert!(MatrixView::new(&data, 2, 3, 3).is_err());
        assert!(MatrixView::new(&data, 1, 3, 2).is_err());
        assert!(MatrixView::new(&data, 2, 2, 3).is_ok());
    }

    #[test]
    fn get_reports_out_of_range() {
        let data = [0.0f64; 4];
        let v = MatrixView::new(&data, 2, 2, 2).unwrap();
        let err = v.get(2, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
        assert!(v.get(1, 1).is_ok());
    }

    #[cfg(feature = "bounds-checks")]
    #[test]
    #[should_panic(expected = "out of range")]
    fn index_operator_checks_columns() {
        let data = [0.0f64; 8];
        let v = MatrixView::new(&data, 2, 2, 4).unwrap();
        // (0, 2) is inside the storage but outside the view.
        let _ = v[(0, 2)];
    }

    #[test]
    fn subview_out_of_range_is_an_error() {
        let data = [0.0f64; 9];
        let v = MatrixView::new(&data, 3, 3, 3).unwrap();
        let err = v.subview(2, 2, 2, 1).unwrap_err();
        assert!(matches!(err, MatmulError::SubviewOutOfBounds { .. }));
        assert!(v.subview(usize::MAX, 0, 2, 1).is_err());
        assert!(v.subview(3, 3, 0, 0).is_ok());
    }

    #[test]
    fn subview_write_is_visible_in_parent() {
        let mut data = vec![0.0f64; 16];
        let mut parent = MatrixViewMut::new(&mut data, 4, 4, 4).unwrap();
        {
            let mut sub = parent.subview_mut(2, 1, 2, 2).unwrap();
            sub[(1, 1)] = 7.0;
        }
        assert_eq!(parent[(3, 2)], 7.0);

        parent[(2, 1)] = 5.0;
        let sub = parent.subview(2, 1, 2, 2).unwrap();
        assert_eq!(sub[(0, 0)], 5.0);
    }

    #[test]
    fn quadrants_split_at_the_midpoint() {
        let data: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let v = MatrixView::new(&data, 4, 4, 4).unwrap();
        let [q11, q12, q21, q22] = v.quadrants().unwrap();
        assert_eq!(q11[(0, 0)], 0.0);
        assert_eq!(q12[(0, 0)], 2.0);
        assert_eq!(q21[(0, 0)], 8.0);
        assert_eq!(q22[(1, 1)], 15.0);
        assert_eq!(q22.stride(), 4);

        let odd = MatrixView::new(&data[..9], 3, 3, 3).unwrap();
        assert!(odd.quadrants().is_err());
    }

    #[test]
    fn copy_from_requires_equal_shapes() {
        let src_data = [1.0, 2.0, 3.0, 4.0];
        let src = MatrixView::new(&src_data, 2, 2, 2).unwrap();
        let mut dst_data = [0.0; 6];
        let mut dst = MatrixViewMut::new(&mut dst_data, 2, 2, 3).unwrap();
        dst.copy_from(&src).unwrap();
        assert_eq!(dst_data, [1.0, 2.0, 0.0, 3.0, 4.0, 0.0]);

        let mut wrong = [0.0; 3];
        let mut wrong = MatrixViewMut::new(&mut wrong, 1, 3, 3).unwrap();
        assert!(wrong.copy_from(&src).is_err());
    }
}
