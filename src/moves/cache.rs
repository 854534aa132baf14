//! Per-node action cache.
//!
//! Placement nodes build the same move over and over for the same
//! (mover, component, state, site). The cache keeps one `Arc<Move>` per key
//! in a dense arena so repeated evaluations hand out the very same move.
//!
//! ## Layout
//!
//! Keys are interned to a dense index
//! `((mover * components + component) * states + state + 1) * sites + site`.
//! Local state `-1` (unset) maps to state slot 0. Each slot is a `OnceLock`,
//! so a tree with an enabled cache can be read from several threads.
//!
//! ## Lifecycle
//!
//! Allocated by the compile pass once dimensions are known. Stacking games
//! never allocate one. Callers can switch a cache off at any time with
//! [`ActionCache::disable`]; clearing needs exclusive access.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use super::game_move::Move;
use crate::components::ComponentId;
use crate::core::{PlayerId, Site};

/// Cache key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub mover: PlayerId,
    pub component: ComponentId,
    /// Local state, `-1` when unset.
    pub state: i32,
    pub site: Site,
}

/// Cache dimensions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheDims {
    pub players: usize,
    pub components: usize,
    /// Number of state slots, including the unset slot.
    pub states: usize,
    pub sites: usize,
}

impl CacheDims {
    /// Total slots, or `None` on overflow.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        self.players
            .checked_mul(self.components)?
            .checked_mul(self.states)?
            .checked_mul(self.sites)
    }

    /// Whether the arena would have no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Dense index of a key, `None` when any coordinate is out of range.
    #[must_use]
    pub fn index(&self, key: &CacheKey) -> Option<usize> {
        let mover = key.mover.index();
        let component = key.component.index();
        let state = usize::try_from(key.state.checked_add(1)?).ok()?;
        let site = key.site.index();
        if mover >= self.players
            || component >= self.components
            || state >= self.states
            || site >= self.sites
        {
            return None;
        }
        Some(((mover * self.components + component) * self.states + state) * self.sites + site)
    }
}

/// Dense arena of shared moves.
pub struct ActionCache {
    slots: Box<[OnceLock<Arc<Move>>]>,
    dims: CacheDims,
    enabled: AtomicBool,
}

impl ActionCache {
    /// An unallocated, disabled cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Box::default(),
            dims: CacheDims::default(),
            enabled: AtomicBool::new(false),
        }
    }

    /// Allocate for `dims`. Stays disabled when the arena would exceed
    /// `max_slots`.
    #[must_use]
    pub fn allocate(dims: CacheDims, max_slots: usize) -> Self {
        match dims.len() {
            Some(len) if len > 0 && len <= max_slots => {
                log::debug!("action cache allocated: {len} slots ({dims:?})");
                Self {
                    slots: (0..len).map(|_| OnceLock::new()).collect(),
                    dims,
                    enabled: AtomicBool::new(true),
                }
            }
            len => {
                log::debug!("action cache not allocated: {len:?} slots exceeds {max_slots}");
                Self::new()
            }
        }
    }

    /// Whether lookups may hit.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Stop serving cached moves. Already handed-out moves stay valid.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    /// Drop every cached move.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.take();
        }
    }

    /// Dimensions the cache was allocated with.
    #[must_use]
    pub fn dims(&self) -> CacheDims {
        self.dims
    }

    /// Number of filled slots.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.get().is_some()).count()
    }

    /// The cached move for `key`, building and storing it on first use.
    ///
    /// Falls through to `build` (without storing) when disabled or when the
    /// key is outside the allocated dimensions.
    pub fn get_or_insert_with(&self, key: CacheKey, build: impl FnOnce() -> Move) -> Arc<Move> {
        if !self.is_enabled() {
            return Arc::new(build());
        }
        match self.dims.index(&key).and_then(|i| self.slots.get(i)) {
            Some(slot) => Arc::clone(slot.get_or_init(|| Arc::new(build()))),
            None => Arc::new(build()),
        }
    }
}

impl Default for ActionCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloning a rule tree gives each copy its own empty cache.
impl Clone for ActionCache {
    fn clone(&self) -> Self {
        if self.slots.is_empty() {
            return Self::new();
        }
        let fresh = Self::allocate(self.dims, usize::MAX);
        if !self.is_enabled() {
            fresh.disable();
        }
        fresh
    }
}

impl std::fmt::Debug for ActionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionCache")
            .field("dims", &self.dims)
            .field("enabled", &self.is_enabled())
            .field("occupied", &self.occupied())
            .finish()
    }
}
