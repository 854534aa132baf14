//! # rust-ludeme
//!
//! A general move-generation engine for board and card games.
//!
//! ## Design Principles
//!
//! 1. **Game-Agnostic**: No hardcoded boards, pieces or capture rules.
//!    A game is equipment plus a tree of rule nodes.
//!
//! 2. **One Generator Per Node**: Every node emits moves into a sink.
//!    Collecting them, stopping at the first one or stopping at the first
//!    one reaching a site are all the same walk.
//!
//! 3. **Scratch Is Scoped**: Nodes bind `from`, `to` and `between` through
//!    RAII scopes, so the evaluation context is the same on exit as on entry.
//!
//! ## Architecture
//!
//! - **Persistent State**: `GameState` clones in O(1) via `im-rs`, which
//!   makes hypothetical evaluation (sowing captures, search rollouts) cheap.
//!
//! - **Compile Once**: [`Game::compile`] preprocesses the tree, allocates
//!   action caches and runs the validation passes. The tree is immutable
//!   afterwards and can be shared between threads.
//!
//! ## Modules
//!
//! - `core`: Players, sites, RNG, configuration, errors
//! - `topology`: Board graphs, directions, tracks and regions
//! - `components`: Pieces, cards and dice
//! - `state`: Position storage and the accessors rules read
//! - `context`: The evaluation environment
//! - `functions`: Site, integer, boolean and region expressions
//! - `moves`: Actions, moves, move lists and action caches
//! - `rules`: The rule-node algebra and every move-generation node
//! - `game`: Compiled games and the driver that plays them
//! - `games`: Reference games
//!
//! ## Example
//!
//! ```
//! use rust_ludeme::games::go;
//!
//! let game = go::game(9).unwrap();
//! let mut state = game.new_state(42);
//! let moves = game.legal_moves(&mut state);
//! assert_eq!(moves.len(), 82);
//! game.apply(&mut state, moves.get(40).unwrap());
//! assert_eq!(game.legal_moves(&mut state).len(), 81);
//! ```

pub mod components;
pub mod context;
pub mod core;
pub mod functions;
pub mod game;
pub mod games;
pub mod moves;
pub mod rules;
pub mod state;
pub mod topology;

// Re-export commonly used types
pub use crate::core::{EngineError, GameConfig, GameRng, PlayerId, PlayerMap, Site, SiteType};

pub use crate::components::{Component, ComponentId, ComponentRegistry, PieceRef};

pub use crate::context::Context;

pub use crate::functions::{BoolFn, IntFn, RegionFn, SiteFn, Who};

pub use crate::game::{Equipment, Game};

pub use crate::moves::{Action, Move, MoveList};

pub use crate::rules::{Report, RuleNode};

pub use crate::state::{GameState, Piece};

pub use crate::topology::{Compass, Directions, Graph, Topology};
