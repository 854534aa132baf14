//! Reference games built from the rule nodes.
//!
//! Each module exposes its equipment, its rule tree and a compiled
//! [`Game`](crate::game::Game). They double as end-to-end checks of the
//! engine and as starting points for new rule sets.
//!
//! - [`draughts`]: steps, compulsory hop captures and chained continuations
//! - [`go`]: placement with enclosure capture and passing
//! - [`oware`]: sowing along a looped track with backtracking capture
//! - [`amazons`]: sliding followed by a second decision

pub mod amazons;
pub mod draughts;
pub mod go;
pub mod oware;
