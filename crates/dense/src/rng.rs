#![forbid(unsafe_code)]

use rand::distributions::Uniform;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeded RNG used for reproducible initialization.
pub fn make_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Uniform distribution over `[-limit, limit]`.
///
/// Returns `None` for a negative or non-finite limit, e.g. the weight range of a
/// layer with no inputs.
pub fn symmetric_uniform(limit: f64) -> Option<Uniform<f64>> {
    if limit.is_finite() && limit >= 0.0 {
        Some(Uniform::new_inclusive(-limit, limit))
    } else {
        None
    }
}
