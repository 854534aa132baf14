//! Actions, moves and move lists.
//!
//! ## Key Components
//!
//! - [`Action`]: One primitive state mutation
//! - [`Undo`]: What applied actions overwrote
//! - [`Move`]: Ordered actions plus mover, sites and continuations
//! - [`MoveList`]: Ordered, shareable collection of moves
//! - [`ActionCache`]: Per-node arena of reusable moves
//! - [`merge`], [`cross_product`]: Move composition

pub mod action;
pub mod cache;
pub mod compose;
pub mod game_move;
pub mod list;

pub use action::{Action, Undo};
pub use cache::{ActionCache, CacheDims, CacheKey};
pub use compose::{combine, cross_product, merge, with_effects_after, with_effects_before};
pub use game_move::{Continuations, LevelRange, Move};
pub use list::MoveList;
