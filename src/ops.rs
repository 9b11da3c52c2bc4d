//! Field-operation accounting.

/// Counts "field" operations: one multiply or one add at the element type
/// level. Subtraction is counted as an add.
///
/// Kernels take `Option<&mut OpCounter>` and only ever increment it. With the
/// `op-count` feature disabled the increments compile away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpCounter {
    pub mul: u64,
    pub add: u64,
}

impl OpCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.mul = 0;
        self.add = 0;
    }

    pub fn total(&self) -> u64 {
        self.mul + self.add
    }

    #[inline(always)]
    pub(crate) fn record_mul(ops: &mut Option<&mut OpCounter>, n: u64) {
        if cfg!(feature = "op-count") {
            if let Some(ops) = ops.as_deref_mut() {
                ops.mul += n;
            }
        }
    }

    #[inline(always)]
    pub(crate) fn record_add(ops: &mut Option<&mut OpCounter>, n: u64) {
        if cfg!(feature = "op-count") {
            if let Some(ops) = ops.as_deref_mut() {
                ops.add += n;
            }
        }
    }
}
