//! Error type shared by every fallible operation in the crate.

/// Coarse classification of a [`MatmulError`], used by callers (and tests)
/// that only care which family of failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The inputs or the arena were not in the state the operation requires.
    Precondition,
    /// Scratch capacity ran out or a size computation overflowed.
    Capacity,
    /// An index or subview fell outside a view's extent.
    Bounds,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatmulError {
    #[error("{op}: dimension mismatch ({lhs} vs {rhs})")]
    DimensionMismatch {
        op: &'static str,
        lhs: String,
        rhs: String,
    },

    #[error("{op}: expected square operands, got {rows}x{cols}")]
    NotSquare {
        op: &'static str,
        rows: usize,
        cols: usize,
    },

    #[error("{op}: n={n} is not a power of two")]
    NotPowerOfTwo { op: &'static str, n: usize },

    #[error("n={n} is odd and above the leaf size {leaf}; pad the operands first")]
    OddDimension { n: usize, leaf: usize },

    #[error("leaf size must be at least 1")]
    InvalidLeafSize,

    #[error("arena has {available} free bytes, {required} required for n={n}")]
    ArenaTooSmall {
        n: usize,
        required: usize,
        available: usize,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("scratch arena exhausted: {requested} bytes at offset {offset}, capacity {capacity}")]
    CapacityExceeded {
        requested: usize,
        offset: usize,
        capacity: usize,
    },

    #[error("size computation overflowed: {0}")]
    SizeOverflow(&'static str),

    #[error("index ({row}, {col}) out of range for {rows}x{cols} view")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("subview at ({row}, {col}) of {sub_rows}x{sub_cols} exceeds {rows}x{cols} parent")]
    SubviewOutOfBounds {
        row: usize,
        col: usize,
        sub_rows: usize,
        sub_cols: usize,
        rows: usize,
        cols: usize,
    },

    #[error("rollback mark {mark} is beyond the current offset {offset}")]
    MarkOutOfRange { mark: usize, offset: usize },

    #[error("rollback mark was issued by a different arena")]
    ForeignMark,
}

impl MatmulError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatmulError::CapacityExceeded { .. } | MatmulError::SizeOverflow(_) => {
                ErrorKind::Capacity
            }
            MatmulError::IndexOutOfBounds { .. } | MatmulError::SubviewOutOfBounds { .. } => {
                ErrorKind::Bounds
            }
            _ => ErrorKind::Precondition,
        }
    }

    pub(crate) fn mismatch(op: &'static str, lhs: (usize, usize), rhs: (usize, usize)) -> Self {
        MatmulError::DimensionMismatch {
            op,
            lhs: format!("{}x{}", lhs.0, lhs.1),
            rhs: format!("{}x{}", rhs.0, rhs.1),
        }
    }
}

pub type Result<T> = std::result::Result<T, MatmulError>;
