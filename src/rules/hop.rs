//! Hop: jump over a run of hurdles.

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::emitter::Emitter;
use super::walk::{effects_at, holds, level_reads, run_of, At, Origin};
use super::{check_graph, Concept, GameFlags, NodeKind, Report, RuleNode, StaticInfo};
use crate::context::{Context, EnvField, EnvFields};
use crate::core::Site;
use crate::functions::{BoolFn, IntFn, SiteFn};
use crate::game::Equipment;
use crate::moves::{cross_product, with_effects_after, with_effects_before, Move, MoveList};
use crate::topology::Directions;

/// Jump over a contiguous run of hurdle sites and land just beyond it.
///
/// The run must be `min..=max` long and every hurdle must satisfy `hurdle`
/// with `between` bound to it. Up to `before` empty sites may precede the
/// run and up to `after` further landing sites may follow the first one
/// (flying pieces). A zero-length run is a plain step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Hop {
    pub from: SiteFn,
    pub directions: Directions,
    pub before: usize,
    pub min: usize,
    pub max: usize,
    pub after: usize,
    pub hurdle: BoolFn,
    pub to: BoolFn,
    /// Evaluated at every hurdle with `between` bound; actions follow the
    /// hop.
    pub hurdle_effect: Option<Box<RuleNode>>,
    /// Evaluated at the landing site; actions precede the hop.
    pub to_effect: Option<Box<RuleNode>>,
    pub stack: bool,
    /// Stack level moved from; the bound level when unset.
    #[serde(default)]
    pub level: Option<IntFn>,
    pub decision: bool,
}

impl Hop {
    #[must_use]
    pub fn new(directions: Directions) -> Self {
        Self {
            from: SiteFn::From,
            directions,
            before: 0,
            min: 1,
            max: 1,
            after: 0,
            hurdle: BoolFn::is_enemy(SiteFn::Between),
            to: BoolFn::is_empty(SiteFn::To),
            hurdle_effect: None,
            to_effect: None,
            stack: false,
            level: None,
            decision: true,
        }
    }

    #[must_use]
    pub fn from(mut self, site: SiteFn) -> Self {
        self.from = site;
        self
    }

    #[must_use]
    pub fn hurdles(mut self, min: usize, max: usize) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Allow empty sites before the hurdle and extra landing sites after.
    #[must_use]
    pub fn flying(mut self, before: usize, after: usize) -> Self {
        self.before = before;
        self.after = after;
        self
    }

    #[must_use]
    pub fn with_hurdle(mut self, hurdle: BoolFn) -> Self {
        self.hurdle = hurdle;
        self
    }

    #[must_use]
    pub fn with_to(mut self, to: BoolFn) -> Self {
        self.to = to;
        self
    }

    #[must_use]
    pub fn with_hurdle_effect(mut self, effect: impl Into<RuleNode>) -> Self {
        self.hurdle_effect = Some(Box::new(effect.into()));
        self
    }

    #[must_use]
    pub fn with_to_effect(mut self, effect: impl Into<RuleNode>) -> Self {
        self.to_effect = Some(Box::new(effect.into()));
        self
    }

    #[must_use]
    pub fn stack(mut self) -> Self {
        self.stack = true;
        self
    }

    /// Move the piece at this stack level.
    #[must_use]
    pub fn at_level(mut self, level: IntFn) -> Self {
        self.level = Some(level);
        self
    }

    /// Effects of a run of hurdles, one combination per result. A hurdle
    /// whose effect produces nothing leaves the others untouched.
    fn hurdle_moves(&self, ctx: &mut Context<'_>, from: Site, run: &[Site]) -> MoveList {
        let Some(effect) = &self.hurdle_effect else {
            return MoveList::new();
        };
        let mut product: Option<MoveList> = None;
        for &site in run {
            let moves = effects_at(ctx, effect, At::between(from, site));
            if moves.is_empty() {
                continue;
            }
            product = Some(match product {
                None => moves,
                Some(acc) => cross_product(&acc, &moves),
            });
        }
        product.unwrap_or_default()
    }

    fn land(
        &self,
        ctx: &mut Context<'_>,
        out: &mut Emitter<'_>,
        origin: &Origin<'_>,
        to: Site,
        run: &[Site],
    ) -> ControlFlow<()> {
        let base = origin.move_to(to, self.stack).with_between(run.iter().copied());
        let hurdles = self.hurdle_moves(ctx, origin.site, run);
        let hopped: Vec<Move> = with_effects_after(&base, &hurdles);
        let landing = match &self.to_effect {
            Some(effect) => effects_at(ctx, effect, At::to(origin.site, to)),
            None => MoveList::new(),
        };
        for mv in &hopped {
            for full in with_effects_before(mv, &landing) {
                out.emit(full)?;
            }
        }
        ControlFlow::Continue(())
    }
}

impl NodeKind for Hop {
    const NAME: &'static str = "Hop";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let Some(origin) = Origin::resolve_at(ctx, &self.from, self.level.as_ref()) else {
            return ControlFlow::Continue(());
        };
        let st = origin.site_type;
        for dir in origin.directions(&self.directions) {
            let ray = origin.radial(dir);
            let mut landed: SmallVec<[Site; 4]> = SmallVec::new();
            for lead in 0..=self.before.min(ray.len()) {
                if lead > 0 && !ctx.state().is_empty(st, ray[lead - 1]) {
                    break;
                }
                let run = run_of(ctx, origin.site, &ray[lead..], &self.hurdle, self.max);
                for len in self.min..=run.len() {
                    let first = lead + len;
                    for &to in ray.iter().skip(first).take(self.after + 1) {
                        if !holds(ctx, &self.to, At::to(origin.site, to)) {
                            break;
                        }
                        if landed.contains(&to) {
                            continue;
                        }
                        landed.push(to);
                        self.land(ctx, out, &origin, to, &run[..len])?;
                    }
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn own_info(&self) -> StaticInfo {
        let mut info = StaticInfo::dynamic(Concept::Hop)
            .reading(self.from.reads() | level_reads(self.level.as_ref()))
            .writing(EnvFields::of(EnvField::From) | EnvField::To | EnvField::Between);
        if self.hurdle_effect.is_some() {
            info = info.with_concept(Concept::HopCapture).with_flags(GameFlags::CAPTURE);
        }
        info
    }

    fn is_decision(&self) -> bool {
        self.decision
    }

    fn nodes(&self) -> Vec<&RuleNode> {
        [&self.hurdle_effect, &self.to_effect]
            .into_iter()
            .filter_map(|n| n.as_deref())
            .collect()
    }

    fn nodes_mut(&mut self) -> Vec<&mut RuleNode> {
        [&mut self.hurdle_effect, &mut self.to_effect]
            .into_iter()
            .filter_map(|n| n.as_deref_mut())
            .collect()
    }

    fn conditions(&self) -> Vec<&BoolFn> {
        vec![&self.hurdle, &self.to]
    }

    fn conditions_mut(&mut self) -> Vec<&mut BoolFn> {
        vec![&mut self.hurdle, &mut self.to]
    }

    fn will_crash(&self, equipment: &Equipment, report: &mut Report) {
        check_graph(equipment, Self::NAME, report);
        if self.min > self.max {
            report.crash(
                Self::NAME,
                format!("minimum hurdle length {} exceeds maximum {}", self.min, self.max),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentRegistry;
    use crate::core::{GameConfig, PlayerId, SiteType};
    use crate::functions::RegionFn;
    use crate::moves::Action;
    use crate::rules::{If, Or, Remove};
    use crate::state::{GameState, Piece};
    use crate::topology::{Compass, Topology};

    fn setup(len: usize) -> (Equipment, Piece, Piece) {
        let mut components = ComponentRegistry::new();
        let ids = components.register_per_player("Man", 2).unwrap();
        let eq = Equipment::new(GameConfig::new(2), Topology::square(1, len), components);
        (
            eq,
            Piece::new(ids[0], Some(PlayerId::new(0))),
            Piece::new(ids[1], Some(PlayerId::new(1))),
        )
    }

    fn hop_east() -> Hop {
        Hop::new(Directions::Compass(Compass::E)).from(SiteFn::Const(Site(0)))
    }

    #[test]
    fn test_hop_captures_hurdle() {
        let (eq, mine, theirs) = setup(4);
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(0), mine, 1);
        state.put(SiteType::Cell, Site(1), theirs, 1);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(hop_east().with_hurdle_effect(Remove::at(RegionFn::Site(SiteFn::Between))));
        let moves = rule.evaluate(&mut ctx);
        assert_eq!(moves.len(), 1);
        let mv = moves.get(0).unwrap();
        assert_eq!(mv.to, Some(Site(2)));
        assert_eq!(mv.between.as_slice(), &[Site(1)]);
        assert!(matches!(mv.actions[0], Action::Move { .. }));
        assert!(matches!(mv.actions[1], Action::Remove { site: Site(1), .. }));
        assert!(rule.declared_concepts().contains(Concept::HopCapture));
    }

    #[test]
    fn test_hop_capture_reverts() {
        let (eq, mine, theirs) = setup(4);
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(0), mine, 1);
        state.put(SiteType::Cell, Site(1), theirs, 1);
        let rule = RuleNode::from(hop_east().with_hurdle_effect(Remove::at(RegionFn::Site(SiteFn::Between))));
        let moves = rule.evaluate(&mut Context::new(&eq, &mut state));
        let before = state.clone();

        let undo = moves.get(0).unwrap().apply_recorded(&mut state);
        assert!(state.is_empty(SiteType::Cell, Site(1)));
        assert_eq!(state.piece(SiteType::Cell, Site(2), None), Some(mine));

        undo.revert(&mut state);
        for site in 0..4 {
            assert_eq!(state.slot(SiteType::Cell, Site(site)), before.slot(SiteType::Cell, Site(site)));
        }
    }

    #[test]
    fn test_hop_needs_hurdle_and_landing() {
        let (eq, mine, theirs) = setup(4);
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(0), mine, 1);
        state.put(SiteType::Cell, Site(1), theirs, 1);
        state.put(SiteType::Cell, Site(2), theirs, 1);
        let mut ctx = Context::new(&eq, &mut state);
        assert!(RuleNode::from(hop_east()).evaluate(&mut ctx).is_empty());
        // Two hurdles allowed.
        let long = RuleNode::from(hop_east().hurdles(1, 2));
        assert_eq!(long.evaluate(&mut ctx).destinations(), vec![Site(3)]);
    }

    #[test]
    fn test_zero_length_hop_is_step() {
        let (eq, mine, _) = setup(3);
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(0), mine, 1);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(hop_east().hurdles(0, 1));
        assert_eq!(rule.evaluate(&mut ctx).destinations(), vec![Site(1)]);
    }

    #[test]
    fn test_flying_hop() {
        let (eq, mine, theirs) = setup(7);
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(0), mine, 1);
        state.put(SiteType::Cell, Site(3), theirs, 1);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(hop_east().flying(2, 2));
        assert_eq!(rule.evaluate(&mut ctx).destinations(), vec![Site(4), Site(5), Site(6)]);
        let grounded = RuleNode::from(hop_east().flying(1, 0));
        assert!(grounded.evaluate(&mut ctx).is_empty());
    }

    #[test]
    fn test_mixed_run_captures_only_enemies() {
        let (eq, mine, theirs) = setup(5);
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(0), mine, 1);
        state.put(SiteType::Cell, Site(1), mine, 1);
        state.put(SiteType::Cell, Site(2), theirs, 1);
        let mut ctx = Context::new(&eq, &mut state);
        let capture_enemy = If::new(
            BoolFn::is_enemy(SiteFn::Between),
            Remove::at(RegionFn::Site(SiteFn::Between)),
        );
        let rule = RuleNode::from(
            hop_east()
                .hurdles(2, 2)
                .with_hurdle(BoolFn::IsOccupied(SiteFn::Between))
                .with_hurdle_effect(capture_enemy),
        );
        let moves = rule.evaluate(&mut ctx);
        assert_eq!(moves.len(), 1);
        let mv = moves.get(0).unwrap();
        assert_eq!(mv.to, Some(Site(3)));
        assert_eq!(mv.between.as_slice(), &[Site(1), Site(2)]);
        let removed: Vec<Site> = mv
            .actions
            .iter()
            .filter_map(|a| match a {
                Action::Remove { site, .. } => Some(*site),
                _ => None,
            })
            .collect();
        assert_eq!(removed, vec![Site(2)]);
    }

    #[test]
    fn test_per_hurdle_effects_multiply() {
        // Each enemy hurdle may be removed or promoted; friends add nothing.
        let (eq, mine, theirs) = setup(6);
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(0), mine, 1);
        state.put(SiteType::Cell, Site(1), theirs, 1);
        state.put(SiteType::Cell, Site(2), mine, 1);
        state.put(SiteType::Cell, Site(3), theirs, 1);
        let mut ctx = Context::new(&eq, &mut state);
        let either = If::new(
            BoolFn::is_enemy(SiteFn::Between),
            Or::new([
                RuleNode::from(Remove::at(RegionFn::Site(SiteFn::Between))),
                RuleNode::from(Remove::at(RegionFn::Site(SiteFn::Between)).count(IntFn::Const(1))),
            ]),
        );
        let rule = RuleNode::from(
            hop_east()
                .hurdles(3, 3)
                .with_hurdle(BoolFn::IsOccupied(SiteFn::Between))
                .with_hurdle_effect(either),
        );
        let moves = rule.evaluate(&mut ctx);
        // Two choices at site 1 times two at site 3.
        assert_eq!(moves.len(), 4);
        for mv in moves.iter() {
            assert_eq!(mv.to, Some(Site(4)));
            let removed: Vec<Site> = mv
                .actions
                .iter()
                .filter_map(|a| match a {
                    Action::Remove { site, .. } => Some(*site),
                    _ => None,
                })
                .collect();
            assert_eq!(removed, vec![Site(1), Site(3)]);
        }
    }

    #[test]
    fn test_hop_min_above_max_reported() {
        let (eq, _, _) = setup(3);
        let mut report = Report::new();
        assert!(RuleNode::from(hop_east().hurdles(2, 1)).will_crash(&eq, &mut report));
    }
}
