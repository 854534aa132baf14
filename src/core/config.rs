//! Game configuration.
//!
//! `GameConfig` carries the game-wide settings the rule nodes consult while
//! generating moves:
//! - player count and per-player facing (for relative directions)
//! - whether sites hold stacks or counted piles
//! - the default element kind used by nodes that don't name one
//! - action cache switches and dimensions
//! - dice and card zones
//!
//! The engine never hardcodes these; games set them up front.

use serde::{Deserialize, Serialize};

use super::error::EngineError;
use super::player::{PlayerId, PlayerMap};
use super::site::SiteType;
use crate::topology::Compass;

/// Card zone identifier (decks and hands).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId(pub u16);

impl ZoneId {
    /// Create a new zone ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Zone({})", self.0)
    }
}

/// Largest dense action cache a node may allocate, in slots.
pub const DEFAULT_MAX_CACHE_SLOTS: usize = 1 << 20;

/// Complete game configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameConfig {
    /// Number of players (1-255).
    pub player_count: usize,

    /// Sites hold ordered stacks instead of counted piles.
    pub stacking: bool,

    /// Element kind used by nodes that don't name one.
    pub default_site_type: SiteType,

    /// Allow placement nodes to reuse previously built moves.
    pub use_action_cache: bool,

    /// Highest local piece state a placement may set (cache dimension).
    pub max_state: i32,

    /// Upper bound on slots in one node's action cache.
    pub max_cache_slots: usize,

    /// Direction each player's pieces face before rotation.
    pub facing: PlayerMap<Compass>,

    /// Number of faces of each die, in roll order.
    pub dice: Vec<u32>,

    /// Zone that cards are dealt from.
    pub deck: ZoneId,

    /// Maximum nesting of effect continuations fired by one applied move.
    pub max_continuation_depth: usize,
}

impl GameConfig {
    /// Create a configuration with engine defaults.
    ///
    /// Player facings default to N, S, E, W for the first four players and
    /// N for the rest.
    ///
    /// # Panics
    ///
    /// Panics if `player_count` is 0 or greater than 255.
    #[must_use]
    pub fn new(player_count: usize) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 255, "At most 255 players supported");

        Self {
            player_count,
            stacking: false,
            default_site_type: SiteType::Cell,
            use_action_cache: true,
            max_state: 0,
            max_cache_slots: DEFAULT_MAX_CACHE_SLOTS,
            facing: PlayerMap::new(player_count, |p| match p.index() {
                1 => Compass::S,
                2 => Compass::E,
                3 => Compass::W,
                _ => Compass::N,
            }),
            dice: Vec::new(),
            deck: ZoneId::new(0),
            max_continuation_depth: 64,
        }
    }

    /// Use stacks of pieces on each site.
    #[must_use]
    pub fn with_stacking(mut self) -> Self {
        self.stacking = true;
        self
    }

    /// Set the default element kind.
    #[must_use]
    pub fn with_site_type(mut self, site_type: SiteType) -> Self {
        self.default_site_type = site_type;
        self
    }

    /// Turn the action cache off for every node.
    #[must_use]
    pub fn without_action_cache(mut self) -> Self {
        self.use_action_cache = false;
        self
    }

    /// Set the highest local state value pieces may carry.
    #[must_use]
    pub fn with_max_state(mut self, max_state: i32) -> Self {
        self.max_state = max_state;
        self
    }

    /// Set the facing of one player's pieces.
    #[must_use]
    pub fn with_facing(mut self, player: PlayerId, facing: Compass) -> Self {
        if let Some(slot) = self.facing.get_mut(player) {
            *slot = facing;
        }
        self
    }

    /// Add a die with `faces` faces.
    #[must_use]
    pub fn with_die(mut self, faces: u32) -> Self {
        self.dice.push(faces);
        self
    }

    /// Set the continuation depth limit.
    #[must_use]
    pub fn with_max_continuation_depth(mut self, depth: usize) -> Self {
        self.max_continuation_depth = depth;
        self
    }

    /// Hand zone of a player. Hands follow the deck: player `i` uses zone
    /// `deck + 1 + i`.
    #[must_use]
    pub fn hand(&self, player: PlayerId) -> ZoneId {
        ZoneId(self.deck.0 + 1 + u16::from(player.0))
    }

    /// Check values that deserialization or manual edits could break.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.player_count == 0 || self.player_count > 255 {
            return Err(EngineError::InvalidPlayerCount(self.player_count));
        }
        if self.facing.player_count() != self.player_count {
            return Err(EngineError::InvalidConfig(format!(
                "{} facings for {} players",
                self.facing.player_count(),
                self.player_count
            )));
        }
        if self.max_state < 0 {
            return Err(EngineError::InvalidConfig(format!(
                "max_state must not be negative, got {}",
                self.max_state
            )));
        }
        if let Some(i) = self.dice.iter().position(|&faces| faces == 0) {
            return Err(EngineError::InvalidConfig(format!("die {i} has no faces")));
        }
        Ok(())
    }
}
