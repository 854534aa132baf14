//! Game components: pieces, cards and dice.
//!
//! - `Component`: static description (name, owner, kind, flip states)
//! - `ComponentRegistry`: dense ID assignment and name lookup
//! - `PieceRef`: how rules refer to components

pub mod definition;
pub mod registry;

pub use definition::{Component, ComponentId, ComponentKind};
pub use registry::{ComponentRegistry, PieceRef};
