//! Leap: jump to sites reached by fixed walks.

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::emitter::Emitter;
use super::walk::{effects_at, holds, At, Origin};
use super::{check_graph, Concept, NodeKind, Report, RuleNode, StaticInfo};
use crate::context::{Context, EnvField, EnvFields};
use crate::core::Site;
use crate::functions::{BoolFn, SiteFn};
use crate::game::Equipment;
use crate::moves::with_effects_before;
use crate::topology::{Compass, Graph, StepType};

/// Jump to the end of each walk, ignoring what lies in between.
///
/// Walks start from every orthogonal direction, or only from the piece's
/// facing when `rotations` is off. `forward_only` keeps destinations ahead
/// of the piece; boards without coordinates skip that filter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Leap {
    pub from: SiteFn,
    pub walks: Vec<Vec<StepType>>,
    pub forward_only: bool,
    pub rotations: bool,
    pub to: BoolFn,
    pub to_effect: Option<Box<RuleNode>>,
    pub stack: bool,
    pub decision: bool,
}

impl Leap {
    #[must_use]
    pub fn new(walks: Vec<Vec<StepType>>) -> Self {
        Self {
            from: SiteFn::From,
            walks,
            forward_only: false,
            rotations: true,
            to: BoolFn::is_friend(SiteFn::To).negate(),
            to_effect: None,
            stack: false,
            decision: true,
        }
    }

    /// The chess knight's walks.
    #[must_use]
    pub fn knight() -> Self {
        use StepType::{F, L, R};
        Self::new(vec![vec![F, F, R, F], vec![F, F, L, F]])
    }

    #[must_use]
    pub fn from(mut self, site: SiteFn) -> Self {
        self.from = site;
        self
    }

    #[must_use]
    pub fn forward_only(mut self) -> Self {
        self.forward_only = true;
        self
    }

    /// Only walk from the piece's facing.
    #[must_use]
    pub fn without_rotations(mut self) -> Self {
        self.rotations = false;
        self
    }

    #[must_use]
    pub fn with_to(mut self, to: BoolFn) -> Self {
        self.to = to;
        self
    }

    #[must_use]
    pub fn with_to_effect(mut self, effect: impl Into<RuleNode>) -> Self {
        self.to_effect = Some(Box::new(effect.into()));
        self
    }
}

/// End of a walk, or `None` if it leaves the board.
fn walk_from(graph: &Graph, start: Site, mut dir: Compass, walk: &[StepType]) -> Option<Site> {
    let mut site = start;
    for step in walk {
        match step {
            StepType::F => site = graph.step(site, dir)?,
            StepType::B => site = graph.step(site, dir.opposite())?,
            StepType::L => dir = dir.rotate(-2),
            StepType::R => dir = dir.rotate(2),
        }
    }
    Some(site)
}

fn is_ahead(graph: &Graph, from: Site, to: Site, facing: Compass) -> bool {
    let (Some((fx, fy)), Some((tx, ty))) = (graph.coords(from), graph.coords(to)) else {
        return true;
    };
    let (dx, dy) = facing.offset();
    f64::from(dx) * (tx - fx) + f64::from(dy) * (ty - fy) > 0.0
}

impl NodeKind for Leap {
    const NAME: &'static str = "Leap";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let Some(origin) = Origin::resolve(ctx, &self.from) else {
            return ControlFlow::Continue(());
        };
        let starts: SmallVec<[Compass; 4]> = if self.rotations {
            Compass::ORTHOGONAL.into_iter().collect()
        } else {
            std::iter::once(origin.facing).collect()
        };
        let mut seen: SmallVec<[Site; 8]> = SmallVec::new();
        for start in starts {
            for walk in &self.walks {
                let Some(to) = walk_from(origin.graph, origin.site, start, walk) else {
                    continue;
                };
                if to == origin.site || seen.contains(&to) {
                    continue;
                }
                if self.forward_only && !is_ahead(origin.graph, origin.site, to, origin.facing) {
                    continue;
                }
                seen.push(to);
                let at = At::to(origin.site, to);
                if !holds(ctx, &self.to, at) {
                    continue;
                }
                let base = origin.move_to(to, self.stack);
                match &self.to_effect {
                    None => out.emit(base)?,
                    Some(effect) => {
                        let effects = effects_at(ctx, effect, at);
                        for mv in with_effects_before(&base, &effects) {
                            out.emit(mv)?;
                        }
                    }
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::dynamic(Concept::Leap)
            .reading(self.from.reads())
            .writing(EnvFields::of(EnvField::From) | EnvField::To)
    }

    fn is_decision(&self) -> bool {
        self.decision
    }

    fn nodes(&self) -> Vec<&RuleNode> {
        self.to_effect.as_deref().into_iter().collect()
    }

    fn nodes_mut(&mut self) -> Vec<&mut RuleNode> {
        self.to_effect.as_deref_mut().into_iter().collect()
    }

    fn conditions(&self) -> Vec<&BoolFn> {
        vec![&self.to]
    }

    fn conditions_mut(&mut self) -> Vec<&mut BoolFn> {
        vec![&mut self.to]
    }

    fn will_crash(&self, equipment: &Equipment, report: &mut Report) {
        check_graph(equipment, Self::NAME, report);
        if self.walks.iter().all(Vec::is_empty) {
            report.crash(Self::NAME, "no walk moves the piece");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentRegistry;
    use crate::core::{GameConfig, PlayerId, SiteType};
    use crate::state::{GameState, Piece};
    use crate::topology::Topology;

    fn setup() -> (Equipment, Piece, Piece) {
        let mut components = ComponentRegistry::new();
        let ids = components.register_per_player("Knight", 2).unwrap();
        let eq = Equipment::new(GameConfig::new(2), Topology::square(5, 5), components);
        (
            eq,
            Piece::new(ids[0], Some(PlayerId::new(0))),
            Piece::new(ids[1], Some(PlayerId::new(1))),
        )
    }

    #[test]
    fn test_knight_from_centre() {
        let (eq, mine, theirs) = setup();
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(12), mine, 1);
        state.put(SiteType::Cell, Site(23), mine, 1);
        state.put(SiteType::Cell, Site(21), theirs, 1);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(Leap::knight().from(SiteFn::Const(Site(12))));
        let mut dests = rule.evaluate(&mut ctx).destinations();
        dests.sort();
        // (1,2) is friendly, (-1,2) is an enemy and can be taken.
        assert_eq!(dests, vec![Site(1), Site(3), Site(5), Site(9), Site(15), Site(19), Site(21)]);
    }

    #[test]
    fn test_knight_forward_only() {
        let (eq, mine, _) = setup();
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(12), mine, 1);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(Leap::knight().from(SiteFn::Const(Site(12))).forward_only());
        let mut dests = rule.evaluate(&mut ctx).destinations();
        dests.sort();
        assert_eq!(dests, vec![Site(15), Site(19), Site(21), Site(23)]);
    }

    #[test]
    fn test_leap_from_corner_stays_on_board() {
        let (eq, mine, _) = setup();
        let mut state = GameState::new(&eq, 0);
        state.put(SiteType::Cell, Site(0), mine, 1);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(Leap::knight().from(SiteFn::Const(Site(0))));
        let mut dests = rule.evaluate(&mut ctx).destinations();
        dests.sort();
        assert_eq!(dests, vec![Site(7), Site(11)]);
    }

    #[test]
    fn test_empty_walks_reported() {
        let (eq, _, _) = setup();
        let mut report = Report::new();
        assert!(RuleNode::from(Leap::new(vec![vec![]])).will_crash(&eq, &mut report));
    }
}
