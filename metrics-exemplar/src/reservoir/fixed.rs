use std::time::SystemTime;

use opentelemetry::{Context, KeyValue};
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use tracing::{debug, trace};

use crate::{Exemplar, Reservoir, Storage, Value};

/// Algorithm L bookkeeping for a single sampling window.
#[derive(Debug)]
struct Sampler<R = Xoshiro256StarStar> {
    /// Number of measurements offered in the current window.
    count: u64,
    /// Value of `count` at which the next replacement happens.
    next: u64,
    /// Current order statistic.
    w: f64,
    rng: R,
}

impl<R: Rng> Sampler<R> {
    fn new(rng: R, capacity: usize) -> Self {
        let mut sampler = Self { count: 0, next: 0, w: 1.0, rng };
        sampler.reset(capacity);
        sampler
    }

    /// Returns a uniformly distributed float in the open interval `(0, 1)`.
    fn random_unit(&mut self) -> f64 {
        loop {
            let u: f64 = self.rng.random();
            if u != 0.0 {
                return u;
            }
        }
    }

    /// Starts a new window.
    ///
    /// `w` starts from the empty product so that the first call to `advance` draws the initial order statistic, and
    /// `next` starts from the last filling index so that the first replacement candidate is offer `capacity` or later.
    fn reset(&mut self, capacity: usize) {
        self.count = 0;
        self.w = 1.0;
        self.next = (capacity as u64).saturating_sub(1);
        self.advance(capacity);
    }

    /// Draws the next order statistic and skips ahead to the next replacement.
    fn advance(&mut self, capacity: usize) {
        let k = capacity as f64;
        self.w *= (self.random_unit().ln() / k).exp();

        // `ln_1p(-w)` is `ln(1 - w)` without losing precision as `w` approaches zero.
        let skip = (self.random_unit().ln() / (-self.w).ln_1p()).floor();
        self.next = self.next.saturating_add(skip as u64).saturating_add(1);
    }

    /// Counts an offered measurement, returning the slot it should be stored in, if any.
    fn sample(&mut self, capacity: usize) -> Option<usize> {
        let idx = if self.count < capacity as u64 {
            Some(self.count as usize)
        } else if self.count == self.next {
            let idx = self.rng.random_range(0..capacity);
            self.advance(capacity);
            Some(idx)
        } else {
            None
        };

        self.count = self.count.saturating_add(1);
        idx
    }
}

/// A reservoir holding a uniform random sample of a fixed size.
///
/// Uses [reservoir sampling][rs], based on Li's ["Algorithm L"][algorithm_l], to keep a statistically representative
/// sample of every measurement offered since the last collection: each of the `n` measurements offered in a window
/// ends up in the collected sample with probability `capacity / n`. Once the reservoir is full, the algorithm computes
/// how many measurements to skip before the next replacement, so rejected measurements cost a counter increment and
/// nothing else.
///
/// Each collection starts a new, independent sampling window.
///
/// Every reservoir owns its own [Xoshiro256**][xoshiro256starstar] generator. Seeding it with
/// [`with_seed`][FixedSizeReservoir::with_seed] makes sampling decisions reproducible.
///
/// ## Concurrency
///
/// The sampling state is guarded by a single lock that is held while deciding which slot, if any, a measurement goes
/// into, and until the lock of that slot has been acquired. Writing the measurement happens under the slot lock alone.
/// A measurement is therefore always stored in the window it was counted in.
///
/// [rs]: https://en.wikipedia.org/wiki/Reservoir_sampling
/// [algorithm_l]: https://doi.org/10.1145/198429.198435
/// [xoshiro256starstar]: https://prng.di.unimi.it
#[derive(Debug)]
pub struct FixedSizeReservoir {
    storage: Storage,
    sampler: Mutex<Sampler>,
}

impl FixedSizeReservoir {
    /// Creates a new `FixedSizeReservoir` that retains up to `capacity` exemplars per window.
    ///
    /// The random number generator is seeded from the thread-local generator.
    ///
    /// A reservoir with a capacity of zero discards every measurement.
    pub fn new(capacity: usize) -> Self {
        Self::from_rng(capacity, Xoshiro256StarStar::from_rng(&mut rand::rng()))
    }

    /// Creates a new `FixedSizeReservoir` whose random number generator is seeded with `seed`.
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::from_rng(capacity, Xoshiro256StarStar::seed_from_u64(seed))
    }

    fn from_rng(capacity: usize, rng: Xoshiro256StarStar) -> Self {
        debug!(capacity, "Creating fixed-size exemplar reservoir.");
        Self { storage: Storage::new(capacity), sampler: Mutex::new(Sampler::new(rng, capacity)) }
    }

    /// Returns the maximum number of exemplars retained per window.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }
}

impl Reservoir for FixedSizeReservoir {
    fn offer(&self, cx: &Context, time: SystemTime, value: Value, dropped: &[KeyValue]) {
        if self.storage.is_empty() {
            return;
        }

        let mut sampler = self.sampler.lock();
        let Some(idx) = sampler.sample(self.storage.len()) else {
            return;
        };

        let mut slot = self.storage.lock(idx);
        drop(sampler);
        slot.record(cx, time, value, dropped);
    }

    fn collect(&self, dest: &mut Vec<Exemplar>) {
        let mut sampler = self.sampler.lock();
        let offered = sampler.count;
        self.storage.drain(dest);
        sampler.reset(self.storage.len());
        trace!(offered, collected = dest.len(), next = sampler.next, "Reset fixed-size exemplar reservoir.");
    }
}
