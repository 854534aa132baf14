//! Slide: move any distance along a ray.

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::emitter::Emitter;
use super::walk::{effects_at, holds, level_reads, resolve_piece, At, Origin};
use super::{check_graph, Concept, NodeKind, Report, RuleNode, StaticInfo};
use crate::components::PieceRef;
use crate::context::{Context, EnvField, EnvFields};
use crate::core::Site;
use crate::functions::{BoolFn, IntFn, SiteFn};
use crate::game::Equipment;
use crate::moves::{combine, with_effects_before, Action, Move, MoveList};
use crate::topology::Directions;

/// Walk each ray while `go` holds (with `to` and `between` bound to the
/// site), emitting a move for every distance in `[min, max]`.
///
/// The first site where `go` fails is tested against `stop`; if it holds,
/// one more move ends there with `stop_effect` applied instead of
/// `to_effect`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Slide {
    pub from: SiteFn,
    pub directions: Directions,
    pub min: usize,
    pub max: Option<usize>,
    pub go: BoolFn,
    pub stop: Option<BoolFn>,
    pub stop_effect: Option<Box<RuleNode>>,
    pub to_effect: Option<Box<RuleNode>>,
    /// Applied at every site passed over, with `between` bound.
    pub between_effect: Option<Box<RuleNode>>,
    /// Piece left on the vacated origin and every site passed over.
    pub trail: Option<PieceRef>,
    pub stack: bool,
    /// Stack level moved from; the bound level when unset.
    #[serde(default)]
    pub level: Option<IntFn>,
    pub decision: bool,
}

impl Slide {
    #[must_use]
    pub fn new(directions: Directions) -> Self {
        Self {
            from: SiteFn::From,
            directions,
            min: 1,
            max: None,
            go: BoolFn::is_empty(SiteFn::Between),
            stop: None,
            stop_effect: None,
            to_effect: None,
            between_effect: None,
            trail: None,
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
    pub fn distance(mut self, min: usize, max: Option<usize>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    #[must_use]
    pub fn with_go(mut self, go: BoolFn) -> Self {
        self.go = go;
        self
    }

    /// End on the first blocked site when `stop` holds there.
    #[must_use]
    pub fn with_stop(mut self, stop: BoolFn, effect: Option<RuleNode>) -> Self {
        self.stop = Some(stop);
        self.stop_effect = effect.map(Box::new);
        self
    }

    #[must_use]
    pub fn with_to_effect(mut self, effect: impl Into<RuleNode>) -> Self {
        self.to_effect = Some(Box::new(effect.into()));
        self
    }

    #[must_use]
    pub fn with_between_effect(mut self, effect: impl Into<RuleNode>) -> Self {
        self.between_effect = Some(Box::new(effect.into()));
        self
    }

    #[must_use]
    pub fn with_trail(mut self, piece: PieceRef) -> Self {
        self.trail = Some(piece);
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

    fn within_max(&self, distance: usize) -> bool {
        self.max.map_or(true, |max| distance <= max)
    }

    /// Base move to `to` having passed over `passed`.
    fn base(&self, ctx: &mut Context<'_>, origin: &Origin<'_>, to: Site, passed: &[Site]) -> Move {
        let mut mv = origin.move_to(to, self.stack).with_between(passed.iter().copied());
        if let Some(piece) = self.trail.as_ref().and_then(|p| resolve_piece(ctx, p)) {
            let st = origin.site_type;
            mv.actions
                .extend(std::iter::once(origin.site).chain(passed.iter().copied()).map(|s| Action::add(st, s, piece, 1)));
        }
        if let Some(effect) = &self.between_effect {
            let mut effects = MoveList::new();
            for &site in passed {
                effects.extend(effects_at(ctx, effect, At::between(origin.site, site)));
            }
            if let Some(all) = combine(&effects) {
                mv.actions.extend(all.actions.iter().cloned());
            }
        }
        mv
    }

    fn emit_to(
        &self,
        ctx: &mut Context<'_>,
        out: &mut Emitter<'_>,
        base: &Move,
        effect: Option<&RuleNode>,
        at: At,
    ) -> ControlFlow<()> {
        match effect {
            None => out.emit(base.clone()),
            Some(effect) => {
                let effects = effects_at(ctx, effect, at);
                for mv in with_effects_before(base, &effects) {
                    out.emit(mv)?;
                }
                ControlFlow::Continue(())
            }
        }
    }
}

impl NodeKind for Slide {
    const NAME: &'static str = "Slide";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let Some(origin) = Origin::resolve_at(ctx, &self.from, self.level.as_ref()) else {
            return ControlFlow::Continue(());
        };
        for dir in origin.directions(&self.directions) {
            let mut passed: SmallVec<[Site; 8]> = SmallVec::new();
            for (i, &site) in origin.radial(dir).iter().enumerate() {
                let distance = i + 1;
                if !self.within_max(distance) {
                    break;
                }
                let at = At {
                    from: Some(origin.site),
                    to: Some(site),
                    between: Some(site),
                };
                if !holds(ctx, &self.go, at) {
                    if let Some(stop) = &self.stop {
                        if distance >= self.min && holds(ctx, stop, at) {
                            let base = self.base(ctx, &origin, site, &passed);
                            self.emit_to(ctx, out, &base, self.stop_effect.as_deref(), at)?;
                        }
                    }
                    break;
                }
                if distance >= self.min {
                    let base = self.base(ctx, &origin, site, &passed);
                    self.emit_to(ctx, out, &base, self.to_effect.as_deref(), at)?;
                }
                passed.push(site);
            }
        }
        ControlFlow::Continue(())
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::dynamic(Concept::Slide)
            .reading(self.from.reads() | level_reads(self.level.as_ref()))
            .writing(EnvFields::of(EnvField::From) | EnvField::To | EnvField::Between)
    }

    fn is_decision(&self) -> bool {
        self.decision
    }

    fn nodes(&self) -> Vec<&RuleNode> {
        [&self.stop_effect, &self.to_effect, &self.between_effect]
            .into_iter()
            .filter_map(|n| n.as_deref())
            .collect()
    }

    fn nodes_mut(&mut self) -> Vec<&mut RuleNode> {
        [&mut self.stop_effect, &mut self.to_effect, &mut self.between_effect]
            .into_iter()
            .filter_map(|n| n.as_deref_mut())
            .collect()
    }

    fn conditions(&self) -> Vec<&BoolFn> {
        std::iter::once(&self.go).chain(self.stop.as_ref()).collect()
    }

    fn conditions_mut(&mut self) -> Vec<&mut BoolFn> {
        std::iter::once(&mut self.go).chain(self.stop.as_mut()).collect()
    }

    fn missing_requirement(&self, equipment: &Equipment, report: &mut Report) {
        if let Some(PieceRef::Named(name)) = &self.trail {
            if !equipment.components.has_name(name) {
                report.missing(Self::NAME, format!("trail piece {name} is not defined"));
            }
        }
    }

    fn will_crash(&self, equipment: &Equipment, report: &mut Report) {
        check_graph(equipment, Self::NAME, report);
        if self.max.is_some_and(|max| max < self.min) {
            report.crash(Self::NAME, "maximum distance is below the minimum");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentRegistry;
    use crate::core::{GameConfig, PlayerId, SiteType};
    use crate::functions::RegionFn;
    use crate::rules::Remove;
    use crate::state::{GameState, Piece};
    use crate::topology::{Compass, Topology};

    fn setup(rows: usize, cols: usize) -> (Equipment, Piece, Piece) {
        let mut components = ComponentRegistry::new();
        let ids = components.register_per_player("Rook", 2).unwrap();
        components
            .register(crate::components::Component::piece("Arrow", None))
            .unwrap();
        let eq = Equipment::new(GameConfig::new(2), Topology::square(rows, cols), components);
        let mine = Piece::new(ids[0], Some(PlayerId::new(0)));
        let theirs = Piece::new(ids[1], Some(PlayerId::new(1)));
        (eq, mine, theirs)
    }

    fn east_from(site: u32) -> Slide {
        Slide::new(Directions::Compass(Compass::E)).from(SiteFn::Const(Site(site)))
    }

    #[test]
    fn test_slide_min_max_distance() {
        let (eq, mine, _) = setup(1, 8);
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(0), mine, 1);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(east_from(0).distance(2, Some(3)));
        let moves = rule.evaluate(&mut ctx);
        assert_eq!(moves.destinations(), vec![Site(2), Site(3)]);
        assert_eq!(moves.get(1).unwrap().between.as_slice(), &[Site(1), Site(2)]);
        assert!(!rule.can_move_to(&mut ctx, Site(1)));
        assert!(!rule.can_move_to(&mut ctx, Site(4)));
    }

    #[test]
    fn test_slide_stops_before_blocker() {
        let (eq, mine, theirs) = setup(1, 6);
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(0), mine, 1);
        state.put(SiteType::Cell, Site(3), theirs, 1);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(east_from(0));
        assert_eq!(rule.evaluate(&mut ctx).destinations(), vec![Site(1), Site(2)]);
    }

    #[test]
    fn test_slide_stop_captures_blocker() {
        let (eq, mine, theirs) = setup(1, 6);
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(0), mine, 1);
        state.put(SiteType::Cell, Site(3), theirs, 1);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(east_from(0).with_stop(
            BoolFn::is_enemy(SiteFn::To),
            Some(RuleNode::from(Remove::at(RegionFn::Site(SiteFn::To)))),
        ));
        let moves = rule.evaluate(&mut ctx);
        assert_eq!(moves.destinations(), vec![Site(1), Site(2), Site(3)]);
        let capture = moves.get(2).unwrap();
        assert_eq!(capture.actions.len(), 2);
        assert_eq!(capture.between.as_slice(), &[Site(1), Site(2)]);
    }

    #[test]
    fn test_slide_leaves_trail() {
        let (eq, mine, _) = setup(1, 3);
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(0), mine, 1);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(east_from(0).with_trail(PieceRef::named("Arrow")));
        let moves = rule.evaluate(&mut ctx);
        let far = moves.get(1).unwrap();
        let mut after = ctx.state().clone();
        far.apply(&mut after);
        assert_eq!(after.piece(SiteType::Cell, Site(2), None), Some(mine));
        assert!(!after.is_empty(SiteType::Cell, Site(0)));
        assert!(!after.is_empty(SiteType::Cell, Site(1)));
        assert_eq!(after.who(SiteType::Cell, Site(1), None), None);
    }

    #[test]
    fn test_slide_validation() {
        let (eq, _, _) = setup(1, 3);
        let mut report = Report::new();
        let rule = RuleNode::from(east_from(0).distance(3, Some(2)).with_trail(PieceRef::named("Ghost")));
        assert!(rule.will_crash(&eq, &mut report));
        assert!(rule.missing_requirement(&eq, &mut report));
        assert_eq!(report.len(), 2);
    }
}
