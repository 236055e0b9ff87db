//! Numeric constants of the sampler

/// Lower bound applied to every entry of α during fixed-point updates
pub const MIN_ALPHA: f64 = 1e-5;

/// Minka fixed-point sub-iterations per optimiser call
pub const OPTIM_FIXED_POINT_ITERS: usize = 10;

/// Stripes handed to each worker in the epoch schedule
pub const STRIPES_PER_WORKER: usize = 8;
