//! Numeric helpers shared by the sampler and the optimiser
mod func;

pub use func::*;
