//! Capture and group nodes.
//!
//! Every node here finds a set of sites to capture around a seed site
//! (usually the site just moved to) and applies its effect to all of them,
//! with `between` bound to each captured site in turn. Everything captured
//! by one evaluation is folded into a single effect move.
//!
//! | Node | Captures |
//! |------|----------|
//! | [`Custodial`] | runs of targets closed off by a friend |
//! | [`Intervene`] | targets on both sides of the seed |
//! | [`Directional`] | the run of targets in the direction of travel |
//! | [`Enclose`] | groups of targets with no liberty left |
//! | [`Surround`] | neighbours hemmed in by friends |

mod custodial;
mod directional;
mod enclose;
mod intervene;
mod surround;

pub use custodial::Custodial;
pub use directional::Directional;
pub use enclose::Enclose;
pub use intervene::Intervene;
pub use surround::Surround;

use std::ops::ControlFlow;

use super::emitter::Emitter;
use super::walk::capture_all;
use super::{Concept, GameFlags, Remove, RuleNode, StaticInfo};
use crate::context::Context;
use crate::core::Site;
use crate::functions::{BoolFn, RegionFn, SiteFn};

/// Remove whatever stands on the captured site.
pub(crate) fn remove_between() -> Box<RuleNode> {
    Box::new(RuleNode::from(Remove::at(RegionFn::Site(SiteFn::Between))))
}

/// An enemy piece on the captured site.
pub(crate) fn enemy_between() -> BoolFn {
    BoolFn::is_enemy(SiteFn::Between)
}

/// Apply `effect` to every site in `sites` and emit the result as one move.
pub(crate) fn emit_captures(
    ctx: &mut Context<'_>,
    effect: &RuleNode,
    sites: &mut Vec<Site>,
    out: &mut Emitter<'_>,
) -> ControlFlow<()> {
    if sites.is_empty() {
        return ControlFlow::Continue(());
    }
    sites.sort_unstable();
    sites.dedup();
    match capture_all(ctx, effect, sites) {
        Some(mv) => out.emit(mv),
        None => ControlFlow::Continue(()),
    }
}

pub(crate) fn capture_info(concept: Concept, at: &SiteFn) -> StaticInfo {
    StaticInfo::dynamic(concept)
        .reading(at.reads())
        .with_flags(GameFlags::CAPTURE)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::components::ComponentRegistry;
    use crate::core::{GameConfig, PlayerId, Site, SiteType};
    use crate::game::Equipment;
    use crate::state::{GameState, Piece};
    use crate::topology::Topology;

    pub(crate) struct Board {
        pub eq: Equipment,
        pub state: GameState,
        pub black: Piece,
        pub white: Piece,
    }

    impl Board {
        /// Empty `rows` x `cols` board; player 0 (black) to move.
        pub(crate) fn new(rows: usize, cols: usize) -> Self {
            let mut components = ComponentRegistry::new();
            let ids = components.register_per_player("Stone", 2).unwrap();
            let eq = Equipment::new(GameConfig::new(2), Topology::square(rows, cols), components);
            let state = GameState::new(&eq, 0);
            Self {
                eq,
                state,
                black: Piece::new(ids[0], Some(PlayerId::new(0))),
                white: Piece::new(ids[1], Some(PlayerId::new(1))),
            }
        }

        pub(crate) fn black(&mut self, sites: &[u32]) -> &mut Self {
            for &s in sites {
                self.state.put(SiteType::Cell, Site(s), self.black, 1);
            }
            self
        }

        pub(crate) fn white(&mut self, sites: &[u32]) -> &mut Self {
            for &s in sites {
                self.state.put(SiteType::Cell, Site(s), self.white, 1);
            }
            self
        }

        pub(crate) fn occupied(&self) -> Vec<u32> {
            self.state.occupied(SiteType::Cell).map(|s| s.0).collect()
        }
    }
}
