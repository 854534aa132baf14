//! Push and Attract: shift lines of pieces along a ray.

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::emitter::Emitter;
use super::walk::Origin;
use super::{check_graph, Concept, NodeKind, Report, StaticInfo};
use crate::context::Context;
use crate::core::{Site, SiteType};
use crate::functions::SiteFn;
use crate::game::Equipment;
use crate::moves::{Action, Move};
use crate::state::{GameState, Piece};
use crate::topology::{Directions, Relative};

/// Top piece of a site with the units that move with it.
fn top(state: &GameState, st: SiteType, site: Site) -> Option<(Piece, u32)> {
    let piece = state.piece(st, site, None)?;
    let count = if state.is_stacking() { 1 } else { state.count(st, site) };
    Some((piece, count))
}

/// Remove the top of `from` and put it (with its count) on `to`.
fn shift(state: &GameState, st: SiteType, from: Site, to: Option<Site>, actions: &mut Vec<Action>) {
    let Some((piece, count)) = top(state, st, from) else {
        return;
    };
    actions.push(Action::remove(st, from));
    if let Some(to) = to {
        actions.push(Action::add(st, to, piece, count));
    }
}

// =============================================================================
// Push
// =============================================================================

/// Shift the piece on `from` and every piece directly in line behind it one
/// site along each direction. The first empty site absorbs the line; a line
/// running off the board loses its last piece. On a closed loop with no
/// empty site the last piece moves onto the vacated origin.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Push {
    pub from: SiteFn,
    pub directions: Directions,
}

impl Default for Push {
    fn default() -> Self {
        Self {
            from: SiteFn::To,
            directions: Directions::Relative(Relative::Forward),
        }
    }
}

impl Push {
    #[must_use]
    pub fn new(from: SiteFn, directions: Directions) -> Self {
        Self { from, directions }
    }
}

impl NodeKind for Push {
    const NAME: &'static str = "Push";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let Some(origin) = Origin::resolve(ctx, &self.from) else {
            return ControlFlow::Continue(());
        };
        let st = origin.site_type;
        let state = ctx.state();
        if state.is_empty(st, origin.site) {
            return ControlFlow::Continue(());
        }
        let mut moves = Vec::new();
        for dir in origin.directions(&self.directions) {
            let ray = origin.radial(dir);
            let line: SmallVec<[Site; 8]> = std::iter::once(origin.site)
                .chain(ray.iter().copied().take_while(|&s| !state.is_empty(st, s)))
                .collect();
            let tail = line[line.len() - 1];
            let wraps = line.len() > ray.len() && origin.graph.step(tail, dir) == Some(origin.site);
            let mut actions = Vec::new();
            let mut wrapped = None;
            for (i, &site) in line.iter().enumerate().rev() {
                if ray.get(i).is_none() && wraps {
                    wrapped = top(state, st, site);
                }
                shift(state, st, site, ray.get(i).copied(), &mut actions);
            }
            // The origin is empty only once its own piece has moved on.
            if let Some((piece, count)) = wrapped {
                actions.push(Action::add(st, origin.site, piece, count));
            }
            let mv = Move::new(actions)
                .with_from(origin.site)
                .with_site_type(st)
                .with_between(line.iter().skip(1).copied());
            moves.push(match ray.first() {
                Some(&to) => mv.with_to(to),
                None => mv,
            });
        }
        for mv in moves {
            out.emit(mv)?;
        }
        ControlFlow::Continue(())
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::dynamic(Concept::Push).reading(self.from.reads())
    }

    fn will_crash(&self, equipment: &Equipment, report: &mut Report) {
        check_graph(equipment, Self::NAME, report);
    }
}

// =============================================================================
// Attract
// =============================================================================

/// Pull the pieces on every ray from `from` toward it until each line is
/// contiguous. All rays make one move.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Attract {
    pub from: SiteFn,
    pub directions: Directions,
}

impl Default for Attract {
    fn default() -> Self {
        Self {
            from: SiteFn::To,
            directions: Directions::Adjacent,
        }
    }
}

impl Attract {
    #[must_use]
    pub fn new(from: SiteFn, directions: Directions) -> Self {
        Self { from, directions }
    }
}

impl NodeKind for Attract {
    const NAME: &'static str = "Attract";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let Some(origin) = Origin::resolve(ctx, &self.from) else {
            return ControlFlow::Continue(());
        };
        let st = origin.site_type;
        let state = ctx.state();
        let mut actions = Vec::new();
        for dir in origin.directions(&self.directions) {
            let ray = origin.radial(dir);
            let occupied = ray.iter().copied().filter(|&s| !state.is_empty(st, s));
            for (slot, site) in occupied.enumerate() {
                if ray[slot] != site {
                    shift(state, st, site, Some(ray[slot]), &mut actions);
                }
            }
        }
        if actions.is_empty() {
            return ControlFlow::Continue(());
        }
        out.emit(Move::new(actions).with_from(origin.site).with_site_type(st))
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::dynamic(Concept::Attract).reading(self.from.reads())
    }

    fn will_crash(&self, equipment: &Equipment, report: &mut Report) {
        check_graph(equipment, Self::NAME, report);
    }
}
