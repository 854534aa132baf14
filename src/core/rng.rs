//! Deterministic random number generation.
//!
//! Every random draw the engine makes (stochastic rule branches, dice rolls,
//! shuffles) goes through a `GameRng` owned by the game state, so a position
//! plus its RNG stream fully determines the generated moves.
//!
//! ```
//! use rust_ludeme::core::GameRng;
//!
//! let mut a = GameRng::new(7);
//! let mut b = GameRng::new(7);
//! assert_eq!(a.next_int(100), b.next_int(100));
//!
//! // Forks are independent but reproducible.
//! let mut fa = a.fork();
//! let mut fb = b.fork();
//! assert_eq!(fa.next_int(1000), fb.next_int(1000));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Deterministic RNG backed by ChaCha8.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// Fork this RNG into an independent stream.
    ///
    /// Used when a caller runs simulations from a shared position and wants
    /// each simulation to draw its own sequence.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        let seed = self
            .seed
            .wrapping_add(self.fork_counter.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Self::new(seed)
    }

    /// Uniform integer in `0..bound`. Returns 0 when `bound <= 0`.
    pub fn next_int(&mut self, bound: i32) -> i32 {
        if bound <= 0 {
            return 0;
        }
        self.inner.gen_range(0..bound)
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_double(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Roll a die with `faces` faces, returning a value in `1..=faces`.
    pub fn roll(&mut self, faces: u32) -> u32 {
        if faces == 0 {
            return 0;
        }
        self.inner.gen_range(1..=faces)
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }

    /// Pick an index with probability proportional to its weight.
    ///
    /// Weights do not need to be normalized. Non-positive and non-finite
    /// weights never win. Returns `None` when no weight is positive.
    pub fn choose_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        let usable = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let total: f64 = weights.iter().copied().map(usable).sum();
        if total <= 0.0 {
            return None;
        }

        let mut threshold = self.next_double() * total;
        let mut last = None;
        for (i, &weight) in weights.iter().enumerate() {
            let weight = usable(weight);
            if weight == 0.0 {
                continue;
            }
            last = Some(i);
            if threshold < weight {
                return Some(i);
            }
            threshold -= weight;
        }

        // Rounding can leave a sliver past the final weight.
        last
    }

    /// Capture the current position in the stream.
    #[must_use]
    pub fn state(&self) -> GameRngState {
        GameRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
            fork_counter: self.fork_counter,
        }
    }

    /// Restore a stream captured with [`GameRng::state`].
    #[must_use]
    pub fn from_state(state: &GameRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
            fork_counter: state.fork_counter,
        }
    }
}

/// Serializable RNG position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRngState {
    /// Original seed
    pub seed: u64,
    /// ChaCha8 word position
    pub word_pos: u128,
    /// Number of forks taken so far
    pub fork_counter: u64,
}
