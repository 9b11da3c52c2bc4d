//! Memory plumbing: aligned heap blocks with allocation tracking, the scratch
//! arena used by the recursive kernels, and a process working-set probe.

pub mod aligned;
pub mod arena;
pub mod process;
