//! Core engine types: players, sites, RNG, configuration, errors.
//!
//! These are the game-agnostic building blocks every other module uses.
//! Games configure them via `GameConfig` rather than modifying the core.

pub mod config;
pub mod error;
pub mod player;
pub mod rng;
pub mod site;

pub use config::{GameConfig, ZoneId};
pub use error::EngineError;
pub use player::{PlayerId, PlayerMap};
pub use rng::{GameRng, GameRngState};
pub use site::{Site, SiteType};
