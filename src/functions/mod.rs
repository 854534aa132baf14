//! Expression language used inside rule nodes.
//!
//! ## Key Components
//!
//! - [`SiteFn`]: A site, usually read from a scratch field
//! - [`IntFn`]: Counts, piece values, dice and arithmetic
//! - [`RegionFn`]: Sets of sites (empty, occupied, named regions, tracks)
//! - [`BoolFn`]: Conditions gating movement and selecting capture targets
//! - [`Who`]: Players described relative to the mover
//!
//! Every function reports the scratch fields it reads and whether it is
//! static (independent of position and scratch), so the compile pass can
//! decide which nodes may cache their moves.

mod condition;
mod int;
mod region;
mod site;
mod who;

pub use condition::BoolFn;
pub use int::IntFn;
pub use region::RegionFn;
pub use site::SiteFn;
pub use who::Who;
