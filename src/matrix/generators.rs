//! Seeded test/benchmark matrix generators.

use super::owned::Matrix;
use super::view::MatrixViewMut;
use crate::error::{MatmulError, Result};
use crate::scalar::Scalar;
use num_complex::Complex;
use rand::distributions::uniform::SampleUniform;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixKind {
    Zeros,
    /// Square only.
    Identity,
    /// i.i.d. uniform entries (both parts for complex).
    RandomUniform,
    /// Square only: `A = Aᵀ`, mirrored without conjugation.
    SymmetricUniform,
    /// Square only: `A = Aᴴ` with a real diagonal. Same as symmetric for
    /// real scalars.
    HermitianUniform,
}

/// Scalars that can be drawn from a uniform distribution over their real
/// component type.
pub trait RandomScalar: Scalar {
    type Real: SampleUniform + PartialOrd + Copy + std::fmt::Debug + From<f32>;

    fn from_real(re: Self::Real) -> Self;

    fn sample<R: Rng + ?Sized>(dist: &Uniform<Self::Real>, rng: &mut R) -> Self;
}

macro_rules! impl_random_real {
    ($($t:ty),*) => {
        $(
            impl RandomScalar for $t {
                type Real = $t;

                fn from_real(re: $t) -> Self {
                    re
                }

                fn sample<R: Rng + ?Sized>(dist: &Uniform<$t>, rng: &mut R) -> Self {
                    dist.sample(rng)
                }
            }

            impl RandomScalar for Complex<$t> {
                type Real = $t;

                fn from_real(re: $t) -> Self {
                    Complex::new(re, 0.0)
                }

                fn sample<R: Rng + ?Sized>(dist: &Uniform<$t>, rng: &mut R) -> Self {
                    let re = dist.sample(rng);
                    Complex::new(re, dist.sample(rng))
                }
            }
        )*
    };
}

impl_random_real!(f32, f64);

fn require_square<T: Scalar>(m: &MatrixViewMut<'_, T>, kind: MatrixKind) -> Result<()> {
    if m.is_square() {
        Ok(())
    } else {
        Err(MatmulError::InvalidArgument(format!(
            "{kind:?} requires a square matrix, got {}x{}",
            m.rows(),
            m.cols()
        )))
    }
}

fn sampler<T: RandomScalar>(seed: u64, lo: T::Real, hi: T::Real) -> Result<(Uniform<T::Real>, StdRng)> {
    if !(lo < hi) {
        return Err(MatmulError::InvalidArgument(format!(
            "empty sampling range [{lo:?}, {hi:?})"
        )));
    }
    Ok((Uniform::new(lo, hi), StdRng::seed_from_u64(seed)))
}

/// Fills `m` according to `kind`, drawing entries uniformly from `[lo, hi)`
/// with an RNG seeded by `seed`.
///
/// # Errors
///
/// `InvalidArgument` for a non-square shape where `kind` needs one, or an
/// empty `[lo, hi)` range for the random kinds.
pub fn fill_matrix<T: RandomScalar>(
    m: &mut MatrixViewMut<'_, T>,
    kind: MatrixKind,
    seed: u64,
    lo: T::Real,
    hi: T::Real,
) -> Result<()> {
    let n = m.rows();
    match kind {
        MatrixKind::Zeros => m.fill(T::zero()),
        MatrixKind::Identity => {
            require_square(m, kind)?;
            m.fill(T::zero());
            for i in 0..n {
                m[(i, i)] = T::one();
            }
        }
        MatrixKind::RandomUniform => {
            let (dist, mut rng) = sampler::<T>(seed, lo, hi)?;
            for i in 0..n {
                for v in m.row_mut(i) {
                    *v = T::sample(&dist, &mut rng);
                }
            }
        }
        MatrixKind::SymmetricUniform => {
            require_square(m, kind)?;
            let (dist, mut rng) = sampler::<T>(seed, lo, hi)?;
            for i in 0..n {
                for j in i..n {
                    let v = T::sample(&dist, &mut rng);
                    m[(i, j)] = v;
                    m[(j, i)] = v;
                }
            }
        }
        MatrixKind::HermitianUniform => {
            require_square(m, kind)?;
            let (dist, mut rng) = sampler::<T>(seed, lo, hi)?;
            for i in 0..n {
                m[(i, i)] = T::from_real(dist.sample(&mut rng));
                for j in i + 1..n {
                    let v = T::sample(&dist, &mut rng);
                    m[(i, j)] = v;
                    m[(j, i)] = v.conj();
                }
            }
        }
    }
    Ok(())
}

/// Allocates a `rows x cols` matrix and fills it with [`fill_matrix`].
pub fn make_matrix<T: RandomScalar>(
    rows: usize,
    cols: usize,
    kind: MatrixKind,
    seed: u64,
    lo: T::Real,
    hi: T::Real,
) -> Result<Matrix<T>> {
    let mut m = Matrix::zeros(rows, cols)?;
    fill_matrix(&mut m.view_mut(), kind, seed, lo, hi)?;
    Ok(m)
}

/// [`make_matrix`] over the default `[-1, 1)` range.
pub fn make_unit_matrix<T: RandomScalar>(
    rows: usize,
    cols: usize,
    kind: MatrixKind,
    seed: u64,
) -> Result<Matrix<T>> {
    make_matrix(rows, cols, kind, seed, (-1.0f32).into(), 1.0f32.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_has_unit_diagonal() {
        let m = make_unit_matrix::<f64>(3, 3, MatrixKind::Identity, 0).unwrap();
        assert_eq!(m.as_slice(), &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn square_kinds_reject_rectangles() {
        for kind in [
            MatrixKind::Identity,
            MatrixKind::SymmetricUniform,
            MatrixKind::HermitianUniform,
        ] {
            let err = make_unit_matrix::<f64>(2, 3, kind, 1).unwrap_err();
            assert!(matches!(err, MatmulError::InvalidArgument(_)));
        }
        assert!(make_unit_matrix::<f64>(2, 3, MatrixKind::RandomUniform, 1).is_ok());
    }

    #[test]
    fn same_seed_same_matrix() {
        let a = make_unit_matrix::<f32>(4, 4, MatrixKind::RandomUniform, 7).unwrap();
        let b = make_unit_matrix::<f32>(4, 4, MatrixKind::RandomUniform, 7).unwrap();
        let c = make_unit_matrix::<f32>(4, 4, MatrixKind::RandomUniform, 8).unwrap();
        assert_eq!(a.as_slice(), b.as_slice());
        assert_ne!(a.as_slice(), c.as_slice());
    }

    #[test]
    fn random_entries_stay_in_range() {
        let m = make_matrix::<f64>(8, 8, MatrixKind::RandomUniform, 3, 2.0, 5.0).unwrap();
        assert!(m.as_slice().iter().all(|&x| (2.0..5.0).contains(&x)));
        assert!(make_matrix::<f64>(2, 2, MatrixKind::RandomUniform, 3, 1.0, 1.0).is_err());
    }

    #[test]
    fn symmetric_mirrors_without_conjugation() {
        let m = make_unit_matrix::<Complex<f64>>(5, 5, MatrixKind::SymmetricUniform, 11).unwrap();
        for i in 0..5 {
            for j in 0..5 {
                assert_eq!(m[(i, j)], m[(j, i)]);
            }
        }
    }

    #[test]
    fn hermitian_mirrors_with_conjugation() {
        let m = make_unit_matrix::<Complex<f64>>(5, 5, MatrixKind::HermitianUniform, 11).unwrap();
        for i in 0..5 {
            assert_eq!(m[(i, i)].im, 0.0);
            for j in 0..5 {
                assert_eq!(m[(i, j)], m[(j, i)].conj());
            }
        }
    }

    #[test]
    fn real_hermitian_is_symmetric() {
        let h = make_unit_matrix::<f64>(6, 6, MatrixKind::HermitianUniform, 5).unwrap();
        let s = make_unit_matrix::<f64>(6, 6, MatrixKind::SymmetricUniform, 5).unwrap();
        assert_eq!(h.as_slice(), s.as_slice());
    }
}
