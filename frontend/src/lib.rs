//! TCG frontend: guest architecture state and runtime helpers.
//!
//! Each guest lives in its own module. Generated code holds a
//! pointer to the guest CPU state and calls the helpers here for
//! anything it does not inline.

pub mod sparc;
