//! Matrix storage, views, and the naive reference kernel.
//!
//! [`owned::Matrix`] owns aligned storage; [`view::MatrixView`] and
//! [`view::MatrixViewMut`] are the strided windows every kernel works on.

pub mod generators;
pub mod naive;
pub mod owned;
pub mod view;
