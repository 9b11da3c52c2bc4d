//! Element types the kernels can multiply.

use num_complex::Complex;
use num_traits::{One, Zero};
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul, Sub};

/// A scalar supporting ring arithmetic and conjugation.
///
/// `bytemuck::Pod` lets scratch storage be carved out of a raw aligned byte
/// buffer without copying.
pub trait Scalar:
    Copy
    + Debug
    + Default
    + PartialEq
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + AddAssign
    + bytemuck::Pod
    + Send
    + Sync
    + 'static
{
    /// True for complex fields; used for real-equivalent operation counts.
    const IS_COMPLEX: bool;

    /// Complex conjugate. Identity for real scalars.
    fn conj(self) -> Self;

    /// Absolute value (modulus for complex) as `f64`.
    fn magnitude(self) -> f64;

    /// Real part as `f64`.
    fn re(self) -> f64;
}

macro_rules! impl_real_scalar {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                const IS_COMPLEX: bool = false;

                #[inline]
                fn conj(self) -> Self {
                    self
                }

                #[inline]
                fn magnitude(self) -> f64 {
                    (self as f64).abs()
                }

                #[inline]
                fn re(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_real_scalar!(f32, f64, i32, i64);

impl Scalar for Complex<f32> {
    const IS_COMPLEX: bool = true;

    #[inline]
    fn conj(self) -> Self {
        Complex::conj(&self)
    }

    #[inline]
    fn magnitude(self) -> f64 {
        f64::from(self.norm())
    }

    #[inline]
    fn re(self) -> f64 {
        f64::from(self.re)
    }
}

impl Scalar for Complex<f64> {
    const IS_COMPLEX: bool = true;

    #[inline]
    fn conj(self) -> Self {
        Complex::conj(&self)
    }

    #[inline]
    fn magnitude(self) -> f64 {
        self.norm()
    }

    #[inline]
    fn re(self) -> f64 {
        self.re
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conj_flips_imaginary_part() {
        let z = Complex::new(1.0f64, -2.0);
        assert_eq!(Scalar::conj(z), Complex::new(1.0, 2.0));
        assert_eq!(Scalar::conj(3.5f64), 3.5);
    }

    #[test]
    fn magnitude_is_modulus() {
        assert_eq!(Complex::new(3.0f64, 4.0).magnitude(), 5.0);
        assert_eq!((-7i32).magnitude(), 7.0);
    }
}
