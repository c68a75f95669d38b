//! Process-wide random source.
//!
//! Every random draw in the crate (`Matrix::randomize`, layer mutation,
//! survivor resampling) goes through [`with_rng`]. The generator lives in a
//! thread-local so the single-threaded training loop never contends on a lock,
//! and it starts from OS entropy. [`seed`] replaces the current thread's
//! generator with a deterministic one.

use std::cell::RefCell;

use rand::rngs::StdRng;
use rand::SeedableRng;

thread_local! {
    static RNG: RefCell<StdRng> = RefCell::new(StdRng::from_entropy());
}

/// Reseeds the calling thread's generator.
pub fn seed(seed: u64) {
    RNG.with(|rng| *rng.borrow_mut() = StdRng::seed_from_u64(seed));
}

/// Runs `f` with exclusive access to the calling thread's generator.
///
/// `f` must not call back into `with_rng`.
pub fn with_rng<T>(f: impl FnOnce(&mut StdRng) -> T) -> T {
    RNG.with(|rng| f(&mut rng.borrow_mut()))
}
