//! Engine error type.
//!
//! Structural problems found while building equipment or compiling a game
//! are returned as `EngineError`. Move generation itself never fails: guards
//! produce empty move lists instead.

use thiserror::Error;

use super::config::ZoneId;
use super::player::PlayerId;
use super::site::{Site, SiteType};

/// Errors raised while assembling or compiling a game.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A site index does not exist in the graph it refers to.
    #[error("{site} is out of range for the {site_type:?} graph ({len} sites)")]
    SiteOutOfRange {
        site: Site,
        site_type: SiteType,
        len: usize,
    },

    /// No track with this name.
    #[error("no track named `{0}`")]
    UnknownTrack(String),

    /// No component with this name.
    #[error("no component named `{0}`")]
    UnknownComponent(String),

    /// The board has no graph for this element kind.
    #[error("the board has no {0:?} graph")]
    MissingGraph(SiteType),

    /// Player count outside 1..=255.
    #[error("player count must be between 1 and 255, got {0}")]
    InvalidPlayerCount(usize),

    /// A deal asked for more cards than the deck holds.
    #[error("cannot deal {requested} cards from {zone}: only {available} left")]
    DeckExhausted {
        zone: ZoneId,
        available: usize,
        requested: usize,
    },

    /// The same (name, owner) pair was registered twice.
    #[error("component `{name}` is already registered for {owner:?}")]
    DuplicateComponent {
        name: String,
        owner: Option<PlayerId>,
    },

    /// Any other inconsistent configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
