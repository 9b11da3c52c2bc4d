//! Owning row-major matrix backed by an [`AlignedBuffer`].

use super::view::{MatrixView, MatrixViewMut, check_index};
use crate::error::{MatmulError, Result};
use crate::memory::aligned::AlignedBuffer;
use crate::scalar::Scalar;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Contiguous (`stride == cols`) matrix. Storage is zero-initialised on every
/// [`resize`](Matrix::resize).
pub struct Matrix<T> {
    buf: AlignedBuffer,
    rows: usize,
    cols: usize,
    _marker: PhantomData<T>,
}

impl<T: Scalar> Matrix<T> {
    /// An empty 0x0 matrix.
    pub fn new() -> Self {
        Self {
            buf: AlignedBuffer::new(),
            rows: 0,
            cols: 0,
            _marker: PhantomData,
        }
    }

    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        let mut m = Self::new();
        m.resize(rows, cols)?;
        Ok(m)
    }

    /// Builds a matrix from equally long rows.
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut m = Self::zeros(rows.len(), cols)?;
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(MatmulError::InvalidArgument(format!(
                    "row {i} has {} elements, expected {cols}",
                    row.len()
                )));
            }
            m.as_mut_slice()[i * cols..(i + 1) * cols].copy_from_slice(row);
        }
        Ok(m)
    }

    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Result<Self> {
        let mut m = Self::zeros(rows, cols)?;
        let data = m.as_mut_slice();
        for i in 0..rows {
            for j in 0..cols {
                data[i * cols + j] = f(i, j);
            }
        }
        Ok(m)
    }

    /// Reallocates fresh zeroed `rows x cols` storage. Previous contents are
    /// discarded.
    pub fn resize(&mut self, rows: usize, cols: usize) -> Result<()> {
        let bytes = rows
            .checked_mul(cols)
            .and_then(|n| n.checked_mul(size_of::<T>()))
            .ok_or(MatmulError::SizeOverflow("matrix storage"))?;
        self.buf.allocate(bytes)?;
        self.rows = rows;
        self.cols = cols;
        Ok(())
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
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn as_slice(&self) -> &[T] {
        if self.buf.is_empty() {
            return &[];
        }
        bytemuck::cast_slice(self.buf.as_bytes())
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        if self.buf.is_empty() {
            return &mut [];
        }
        bytemuck::cast_slice_mut(self.buf.as_bytes_mut())
    }

    pub fn view(&self) -> MatrixView<'_, T> {
        let (rows, cols) = self.shape();
        MatrixView::contiguous(self.as_slice(), rows, cols)
    }

    pub fn view_mut(&mut self) -> MatrixViewMut<'_, T> {
        let (rows, cols) = self.shape();
        MatrixViewMut::contiguous(self.as_mut_slice(), rows, cols)
    }

    pub fn fill(&mut self, value: T) {
        self.as_mut_slice().fill(value);
    }
}

impl<T: Scalar> Default for Matrix<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    #[inline]
    fn index(&self, (r, c): (usize, usize)) -> &T {
        check_index(r, c, self.rows, self.cols);
        &self.as_slice()[r * self.cols + c]
    }
}

impl<T: Scalar> IndexMut<(usize, usize)> for Matrix<T> {
    #[inline]
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut T {
        check_index(r, c, self.rows, self.cols);
        let cols = self.cols;
        &mut self.as_mut_slice()[r * cols + c]
    }
}

impl<T: Scalar> std::fmt::Debug for Matrix<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matrix")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("data", &self.as_slice())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_discards_contents() {
        let mut m = Matrix::<f64>::zeros(2, 2).unwrap();
        m.fill(3.0);
        m.resize(3, 2).unwrap();
        assert_eq!(m.shape(), (3, 2));
        assert!(m.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn from_rows_is_row_major() {
        let m = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert_eq!(m[(1, 0)], 3.0);
        assert_eq!(m.view().row(0), &[1.0, 2.0]);
        assert!(Matrix::from_rows(&[vec![1.0], vec![2.0, 3.0]]).is_err());
    }

    #[test]
    fn views_share_storage() {
        let mut m = Matrix::<f32>::zeros(4, 4).unwrap();
        m.view_mut()[(2, 3)] = 1.5;
        assert_eq!(m[(2, 3)], 1.5);
        assert_eq!(m.view().stride(), 4);
    }

    #[cfg(feature = "bounds-checks")]
    #[test]
    #[should_panic(expected = "index (0, 3) out of range for 2x3 view")]
    fn column_past_the_end_is_caught() {
        // Row-major offset 3 is inside the buffer, so only the coordinate
        // check can catch this.
        let m = Matrix::<f64>::zeros(2, 3).unwrap();
        let _ = m[(0, 3)];
    }

    #[test]
    fn storage_is_reported_to_the_global_tracker() {
        use crate::memory::aligned::tracked_alloc_stats;

        let bytes = 64 * 64 * size_of::<f64>();
        let m = Matrix::<f64>::zeros(64, 64).unwrap();
        let during = tracked_alloc_stats();
        // Other tests allocate concurrently, so only lower bounds hold.
        assert!(during.current_bytes >= bytes);
        assert!(during.peak_bytes >= bytes);
        assert!(during.peak_bytes >= during.current_bytes);
        drop(m);
    }

    #[test]
    fn empty_matrix_has_empty_views() {
        let m = Matrix::<f64>::new();
        assert!(m.view().is_empty());
        assert!(m.as_slice().is_empty());
    }
}
