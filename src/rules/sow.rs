//! Sow: distribute the units of a hole along a track.
//!
//! Units are lifted from the start hole and dropped `per_hole` at a time
//! into the following holes. The capture test runs on a clone of the state
//! with the sowing applied, starting at the last hole sown and optionally
//! chaining backward or forward along the track.

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};

use super::emitter::Emitter;
use super::walk::{effects_at, holds, At};
use super::{Concept, GameFlags, NodeKind, Remove, Report, RuleNode, StaticInfo};
use crate::context::{Context, EnvField, EnvFields};
use crate::core::Site;
use crate::functions::{BoolFn, IntFn, RegionFn, SiteFn};
use crate::game::Equipment;
use crate::moves::{combine, merge, Action, Move, MoveList};
use crate::topology::Track;

/// Sowing parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sow {
    pub start: SiteFn,
    /// Units to sow; all units of the start hole when unset.
    pub count: Option<IntFn>,
    pub per_hole: u32,
    /// Track name; the mover's own track, then the first track, when unset.
    pub track: Option<String>,
    /// Drop the first batch into the start hole.
    pub origin: bool,
    /// The start hole receives units when lapped.
    pub include_self: bool,
    /// Holes passed over, evaluated with `to` bound.
    pub skip: Option<BoolFn>,
    /// Capture test at the last hole, with `to` bound.
    pub capture_if: Option<BoolFn>,
    /// Applied to every captured hole; removes its units when unset.
    pub capture_effect: Option<Box<RuleNode>>,
    /// Keep capturing toward the start while the test holds.
    pub backtracking: bool,
    /// Keep capturing away from the start while the test holds.
    pub forward: bool,
}

impl Default for Sow {
    fn default() -> Self {
        Self {
            start: SiteFn::To,
            count: None,
            per_hole: 1,
            track: None,
            origin: false,
            include_self: true,
            skip: None,
            capture_if: None,
            capture_effect: None,
            backtracking: false,
            forward: false,
        }
    }
}

impl Sow {
    #[must_use]
    pub fn from(mut self, site: SiteFn) -> Self {
        self.start = site;
        self
    }

    #[must_use]
    pub fn count(mut self, count: IntFn) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub fn per_hole(mut self, n: u32) -> Self {
        self.per_hole = n;
        self
    }

    #[must_use]
    pub fn track(mut self, name: impl Into<String>) -> Self {
        self.track = Some(name.into());
        self
    }

    #[must_use]
    pub fn origin(mut self) -> Self {
        self.origin = true;
        self
    }

    #[must_use]
    pub fn exclude_self(mut self) -> Self {
        self.include_self = false;
        self
    }

    #[must_use]
    pub fn with_skip(mut self, skip: BoolFn) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Capture at the last hole when `cond` holds.
    #[must_use]
    pub fn capture_if(mut self, cond: BoolFn) -> Self {
        self.capture_if = Some(cond);
        self
    }

    #[must_use]
    pub fn with_capture_effect(mut self, effect: impl Into<RuleNode>) -> Self {
        self.capture_effect = Some(Box::new(effect.into()));
        self
    }

    #[must_use]
    pub fn backtracking(mut self) -> Self {
        self.backtracking = true;
        self
    }

    #[must_use]
    pub fn forward(mut self) -> Self {
        self.forward = true;
        self
    }

    fn resolve_track<'a>(&self, ctx: &Context<'a>) -> Option<&'a Track> {
        let topology = ctx.topology();
        match &self.track {
            Some(name) => topology.track(name),
            None => topology
                .owned_track(ctx.mover())
                .or_else(|| topology.tracks().first()),
        }
    }

    /// Captures starting at `last` on the sown position.
    fn captures(&self, ctx: &mut Context<'_>, track: &Track, last: Site) -> MoveList {
        let mut found = MoveList::new();
        let (Some(cond), Some(mut index)) = (&self.capture_if, track.position(last)) else {
            return found;
        };
        let default_effect;
        let effect = match &self.capture_effect {
            Some(effect) => effect.as_ref(),
            None => {
                default_effect = RuleNode::from(Remove::at(RegionFn::Site(SiteFn::To)));
                &default_effect
            }
        };
        for _ in 0..track.len() {
            let Some(site) = track.site(index) else {
                break;
            };
            let at = At::to_only(site);
            if !holds(ctx, cond, at) {
                break;
            }
            found.extend(effects_at(ctx, effect, at));
            let next = if self.backtracking {
                track.prev_index(index)
            } else if self.forward {
                track.next_index(index)
            } else {
                None
            };
            match next {
                Some(next) => index = next,
                None => break,
            }
        }
        found
    }
}

impl NodeKind for Sow {
    const NAME: &'static str = "Sow";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let st = ctx.site_type();
        let Some(track) = self.resolve_track(ctx) else {
            return ControlFlow::Continue(());
        };
        let Some(start) = self.start.eval(ctx) else {
            return ControlFlow::Continue(());
        };
        let Some(start_index) = track.position(start) else {
            return ControlFlow::Continue(());
        };
        let Some(piece) = ctx.state().piece(st, start, None) else {
            return ControlFlow::Continue(());
        };
        let total = match &self.count {
            Some(count) => count.eval(ctx),
            None => i64::from(ctx.state().count(st, start)),
        };
        let Ok(total) = u32::try_from(total) else {
            return ControlFlow::Continue(());
        };
        if total == 0 || self.per_hole == 0 {
            return ControlFlow::Continue(());
        }

        let mut drops = Vec::new();
        let mut remaining = total;
        let mut place = |site: Site, remaining: &mut u32| {
            let n = self.per_hole.min(*remaining);
            drops.push(Action::add(st, site, piece, n));
            *remaining -= n;
        };
        if self.origin {
            place(start, &mut remaining);
        }
        let mut last = start;
        let mut index = start_index;
        let mut idle = 0;
        while remaining > 0 && idle < track.len() {
            let Some(next) = track.next_index(index) else {
                break;
            };
            index = next;
            let Some(hole) = track.site(index) else {
                break;
            };
            let skipped = (hole == start && !self.include_self)
                || self.skip.as_ref().is_some_and(|s| holds(ctx, s, At::to_only(hole)));
            if skipped {
                idle += 1;
                continue;
            }
            place(hole, &mut remaining);
            last = hole;
            idle = 0;
        }
        let sown = total - remaining;
        if sown == 0 {
            return ControlFlow::Continue(());
        }

        let mut actions = Vec::with_capacity(drops.len() + 1);
        actions.push(Action::Remove {
            site_type: st,
            site: start,
            level: None,
            count: Some(sown),
            stack: false,
        });
        actions.extend(drops);
        let base = Move::new(actions).with_from(start).with_to(last).with_site_type(st);

        if self.capture_if.is_none() {
            return out.emit(base);
        }
        let mut sown_state = ctx.state().clone();
        base.apply(&mut sown_state);
        let captured = ctx.hypothetical(&mut sown_state, |h| self.captures(h, track, last));
        match combine(&captured) {
            Some(capture) => out.emit(merge(&base, &capture)),
            None => out.emit(base),
        }
    }

    fn own_info(&self) -> StaticInfo {
        let mut info = StaticInfo::dynamic(Concept::Sow)
            .reading(self.start.reads())
            .writing(EnvFields::of(EnvField::To))
            .with_flags(GameFlags::SOWING);
        if let Some(count) = &self.count {
            info = info.reading(count.reads());
        }
        if self.capture_if.is_some() {
            info = info
                .with_concept(Concept::SowCapture)
                .with_flags(GameFlags::CAPTURE);
        }
        info
    }

    fn nodes(&self) -> Vec<&RuleNode> {
        self.capture_effect.as_deref().into_iter().collect()
    }

    fn nodes_mut(&mut self) -> Vec<&mut RuleNode> {
        self.capture_effect.as_deref_mut().into_iter().collect()
    }

    fn conditions(&self) -> Vec<&BoolFn> {
        self.skip.iter().chain(self.capture_if.as_ref()).collect()
    }

    fn conditions_mut(&mut self) -> Vec<&mut BoolFn> {
        self.skip.iter_mut().chain(self.capture_if.as_mut()).collect()
    }

    fn missing_requirement(&self, equipment: &Equipment, report: &mut Report) {
        let topology = &equipment.topology;
        match &self.track {
            Some(name) if topology.track(name).is_none() => {
                report.missing(Self::NAME, format!("track {name} is not defined"));
            }
            None if topology.tracks().is_empty() => {
                report.missing(Self::NAME, "no track to sow along");
            }
            _ => {}
        }
    }

    fn will_crash(&self, _equipment: &Equipment, report: &mut Report) {
        if self.per_hole == 0 {
            report.crash(Self::NAME, "sowing zero units per hole never ends");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Component, ComponentRegistry};
    use crate::core::{GameConfig, SiteType};
    use crate::state::{GameState, Piece};
    use crate::topology::{Graph, Topology};

    fn equipment(holes: usize) -> (Equipment, Piece) {
        let mut components = ComponentRegistry::new();
        let seed = components.register(Component::piece("Seed", None)).unwrap();
        let track = Track::new("Loop", (0..holes as u32).map(Site).collect()).looped();
        let topology = Topology::new()
            .with_graph(SiteType::Cell, Graph::ring(holes))
            .with_track(track)
            .unwrap();
        (
            Equipment::new(GameConfig::new(2), topology, components),
            Piece::new(seed, None),
        )
    }

    fn counts(state: &GameState, holes: u32) -> Vec<u32> {
        (0..holes).map(|s| state.count(SiteType::Cell, Site(s))).collect()
    }

    fn sow_once(eq: &Equipment, state: &GameState, rule: Sow) -> Option<GameState> {
        let mut scratch = state.clone();
        let moves = RuleNode::from(rule.from(SiteFn::Const(Site(0)))).evaluate(&mut Context::new(eq, &mut scratch));
        let mv = moves.get(0)?;
        let mut after = state.clone();
        mv.apply(&mut after);
        Some(after)
    }

    #[test]
    fn test_sow_four_units_excluding_self() {
        let (eq, seed) = equipment(5);
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(0), seed, 4);
        let after = sow_once(&eq, &state, Sow::default().exclude_self()).unwrap();
        assert_eq!(counts(&after, 5), vec![0, 1, 1, 1, 1]);
    }

    #[test]
    fn test_sow_laps_past_start() {
        let (eq, seed) = equipment(3);
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(0), seed, 5);

        let with_self = sow_once(&eq, &state, Sow::default()).unwrap();
        assert_eq!(counts(&with_self, 3), vec![1, 2, 2]);

        let without_self = sow_once(&eq, &state, Sow::default().exclude_self()).unwrap();
        assert_eq!(counts(&without_self, 3), vec![0, 3, 2]);
    }

    #[test]
    fn test_sow_origin_and_batches() {
        let (eq, seed) = equipment(4);
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(0), seed, 4);
        let after = sow_once(&eq, &state, Sow::default().origin().per_hole(2)).unwrap();
        assert_eq!(counts(&after, 4), vec![2, 2, 0, 0]);
    }

    #[test]
    fn test_sow_skipping_everything_terminates() {
        let (eq, seed) = equipment(3);
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(0), seed, 4);
        assert!(sow_once(&eq, &state, Sow::default().with_skip(BoolFn::True)).is_none());
    }

    #[test]
    fn test_sow_backtracking_capture() {
        let (eq, seed) = equipment(6);
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(0), seed, 3);
        state.put(SiteType::Cell, Site(1), seed, 1);
        state.put(SiteType::Cell, Site(2), seed, 2);
        state.put(SiteType::Cell, Site(3), seed, 1);
        // Capture holes that reach two or three after sowing.
        let two_or_three = BoolFn::all([
            BoolFn::Ge(IntFn::Count(SiteFn::To), IntFn::Const(2)),
            BoolFn::Le(IntFn::Count(SiteFn::To), IntFn::Const(3)),
        ]);
        let rule = Sow::default().capture_if(two_or_three).backtracking();
        let after = sow_once(&eq, &state, rule).unwrap();
        assert_eq!(counts(&after, 6), vec![0, 0, 0, 0, 0, 0]);

        let sown_only = sow_once(&eq, &state, Sow::default()).unwrap();
        assert_eq!(counts(&sown_only, 6), vec![0, 2, 3, 2, 0, 0]);
    }

    #[test]
    fn test_sow_requires_track() {
        let eq = Equipment::new(GameConfig::new(2), Topology::square(2, 2), ComponentRegistry::new());
        let mut report = Report::new();
        assert!(RuleNode::from(Sow::default()).missing_requirement(&eq, &mut report));
        assert!(RuleNode::from(Sow::default().track("Nope")).missing_requirement(&eq, &mut report));
        assert_eq!(report.len(), 2);
    }
}
