//! Strassen matrix multiplication in Rust, built from scratch.
//!
//! I built this to see where Strassen actually pays off against the
//! textbook triple loop, and what it costs in memory. Every temporary lives
//! in a single pre-sized scratch arena, so the recursion never touches the
//! heap and its peak footprint can be checked against a closed-form budget.
//!
//! ## Usage
//!
//! ```
//! use matmul::{Matrix, StrassenConfig, gemm_strassen};
//!
//! let a = Matrix::from_fn(100, 100, |i, j| (i + j) as f64).unwrap();
//! let b = Matrix::from_fn(100, 100, |i, j| (i * j % 7) as f64).unwrap();
//! let mut c = Matrix::zeros(100, 100).unwrap();
//!
//! // 100 is padded to 128 behind the scenes.
//! let cfg = StrassenConfig::default().with_leaf_size(16);
//! gemm_strassen(&a.view(), &b.view(), &mut c.view_mut(), None, cfg).unwrap();
//! ```
//!
//! For benchmark loops, size an arena once and reuse it:
//!
//! ```
//! use matmul::{Matrix, OpCounter, ScratchArena, StrassenConfig};
//! use matmul::{gemm_strassen_pow2_prealloc, strassen_scratch_bytes};
//!
//! let n = 64;
//! let a = Matrix::from_fn(n, n, |i, j| (i as f64) - (j as f64)).unwrap();
//! let mut c = Matrix::zeros(n, n).unwrap();
//! let mut arena = ScratchArena::with_capacity(strassen_scratch_bytes::<f64>(n).unwrap()).unwrap();
//! let mut ops = OpCounter::new();
//!
//! let cfg = StrassenConfig::default().with_leaf_size(8).with_padding(false);
//! gemm_strassen_pow2_prealloc(&a.view(), &a.view(), &mut c.view_mut(), &mut arena, Some(&mut ops), cfg)
//!     .unwrap();
//! assert_eq!(arena.used_bytes(), 0);
//! ```
//!
//! ## What's inside
//!
//! - Naive i-j-k kernel (reference and recursion base case)
//! - Strassen recursion with zero-padding for arbitrary square sizes
//! - Bump-allocated scratch arena with LIFO frames and a peak watermark
//! - Field-operation counting (`op-count` feature)
//! - Seeded generators and a CSV benchmark harness

pub mod error;
pub mod harness;
pub mod matrix;
pub mod memory;
pub mod ops;
pub mod scalar;
pub mod strassen;

pub use error::{ErrorKind, MatmulError, Result};
pub use matrix::generators::{MatrixKind, fill_matrix, make_matrix};
pub use matrix::naive::gemm_naive;
pub use matrix::owned::Matrix;
pub use matrix::view::{MatrixView, MatrixViewMut};
pub use memory::aligned::{ALIGNMENT_BYTES, TrackedAllocStats, tracked_alloc_stats};
pub use memory::arena::{ArenaMark, SCRATCH_ALIGNMENT_BYTES, ScratchArena};
pub use memory::process::{ProcessMemoryInfo, process_memory_info};
pub use ops::OpCounter;
pub use scalar::Scalar;
pub use strassen::{
    StrassenConfig, gemm_strassen, gemm_strassen_pow2_prealloc, is_power_of_two,
    next_power_of_two, strassen_scratch_bytes,
};
