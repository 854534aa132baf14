use std::collections::VecDeque;
use std::ops::ControlFlow;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::{capture_info, emit_captures, enemy_between, remove_between};
use crate::context::Context;
use crate::core::Site;
use crate::functions::{BoolFn, SiteFn};
use crate::game::Equipment;
use crate::rules::emitter::Emitter;
use crate::rules::walk::{holds, At, Origin};
use crate::rules::{check_graph, Concept, NodeKind, Report, RuleNode, StaticInfo};
use crate::topology::Directions;

/// Go-style group capture.
///
/// Every neighbour of `at` satisfying `target` seeds a flood fill over
/// connected targets. A group touching more than `exceptions` distinct
/// liberties survives; the others are captured. With `include_empty`,
/// empty sites join the group instead of counting as liberties, which
/// captures whole enclosed territories.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Enclose {
    pub at: SiteFn,
    pub directions: Directions,
    /// Evaluated with `between` bound.
    pub target: BoolFn,
    /// Evaluated with `between` bound on sites outside the group.
    pub liberty: BoolFn,
    pub exceptions: usize,
    pub include_empty: bool,
    pub effect: Box<RuleNode>,
}

impl Default for Enclose {
    fn default() -> Self {
        Self {
            at: SiteFn::To,
            directions: Directions::Orthogonal,
            target: enemy_between(),
            liberty: BoolFn::is_empty(SiteFn::Between),
            exceptions: 0,
            include_empty: false,
            effect: remove_between(),
        }
    }
}

impl Enclose {
    #[must_use]
    pub fn at(mut self, site: SiteFn) -> Self {
        self.at = site;
        self
    }

    #[must_use]
    pub fn directions(mut self, directions: Directions) -> Self {
        self.directions = directions;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: BoolFn) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn with_liberty(mut self, liberty: BoolFn) -> Self {
        self.liberty = liberty;
        self
    }

    /// Groups with up to `n` liberties are still captured.
    #[must_use]
    pub fn exceptions(mut self, n: usize) -> Self {
        self.exceptions = n;
        self
    }

    #[must_use]
    pub fn include_empty(mut self) -> Self {
        self.include_empty = true;
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: impl Into<RuleNode>) -> Self {
        self.effect = Box::new(effect.into());
        self
    }

    fn is_member(&self, ctx: &mut Context<'_>, site: Site) -> bool {
        if self.include_empty && ctx.state().is_empty(ctx.site_type(), site) {
            return true;
        }
        holds(ctx, &self.target, At::between_only(site))
    }

    /// Flood fill the whole group around `seed`. Liberties stop being
    /// tested once the group is known to survive.
    fn group(&self, ctx: &mut Context<'_>, origin: &Origin<'_>, seed: Site) -> Group {
        let dirs = origin.directions(&self.directions);
        let mut sites = vec![seed];
        let mut visited: FxHashSet<Site> = FxHashSet::default();
        visited.insert(seed);
        let mut liberties: FxHashSet<Site> = FxHashSet::default();
        let mut captured = true;
        let mut queue = VecDeque::from([seed]);
        while let Some(site) = queue.pop_front() {
            for n in origin.graph.neighbours(site, &dirs) {
                if visited.contains(&n) || liberties.contains(&n) {
                    continue;
                }
                if self.is_member(ctx, n) {
                    visited.insert(n);
                    sites.push(n);
                    queue.push_back(n);
                } else if captured && holds(ctx, &self.liberty, At::between_only(n)) {
                    liberties.insert(n);
                    captured = liberties.len() <= self.exceptions;
                }
            }
        }
        Group { sites, captured }
    }
}

/// A connected group and whether it is short of liberties.
struct Group {
    sites: Vec<Site>,
    captured: bool,
}

impl NodeKind for Enclose {
    const NAME: &'static str = "Enclose";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let Some(origin) = Origin::resolve(ctx, &self.at) else {
            return ControlFlow::Continue(());
        };
        let dirs = origin.directions(&self.directions);
        let mut checked: FxHashSet<Site> = FxHashSet::default();
        let mut captured = Vec::new();
        for seed in origin.graph.neighbours(origin.site, &dirs) {
            if checked.contains(&seed) || !holds(ctx, &self.target, At::between_only(seed)) {
                continue;
            }
            let group = self.group(ctx, &origin, seed);
            checked.extend(group.sites.iter().copied());
            if group.captured {
                captured.extend(group.sites);
            }
        }
        captured.retain(|&s| s != origin.site);
        emit_captures(ctx, &self.effect, &mut captured, out)
    }

    fn own_info(&self) -> StaticInfo {
        capture_info(Concept::EncloseCapture, &self.at)
    }

    fn nodes(&self) -> Vec<&RuleNode> {
        vec![&self.effect]
    }

    fn nodes_mut(&mut self) -> Vec<&mut RuleNode> {
        vec![&mut self.effect]
    }

    fn conditions(&self) -> Vec<&BoolFn> {
        vec![&self.target, &self.liberty]
    }

    fn conditions_mut(&mut self) -> Vec<&mut BoolFn> {
        vec![&mut self.target, &mut self.liberty]
    }

    fn will_crash(&self, equipment: &Equipment, report: &mut Report) {
        check_graph(equipment, Self::NAME, report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentRegistry;
    use crate::core::{GameConfig, PlayerId, SiteType};
    use crate::rules::capture::fixtures::Board;
    use crate::state::{GameState, Piece};
    use crate::topology::{Graph, Topology};

    fn captures(board: &mut Board, rule: Enclose, at: u32) -> Vec<u32> {
        let mut ctx = Context::new(&board.eq, &mut board.state);
        let moves = RuleNode::from(rule.at(SiteFn::Const(Site(at)))).evaluate(&mut ctx);
        moves
            .get(0)
            .map(|m| m.between.iter().map(|s| s.0).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_go_single_stone_in_the_middle() {
        // White in the centre of a 3x3 board, black on three sides plays the fourth.
        let mut board = Board::new(3, 3);
        board.white(&[4]).black(&[1, 3, 5, 7]);
        assert_eq!(captures(&mut board, Enclose::default(), 7), vec![4]);
    }

    #[test]
    fn test_go_group_with_liberty_survives() {
        let mut board = Board::new(3, 3);
        board.white(&[4, 5]).black(&[1, 3, 7]);
        // 8 and 2 are still free.
        assert!(captures(&mut board, Enclose::default(), 7).is_empty());
        board.black(&[2, 8]);
        assert_eq!(captures(&mut board, Enclose::default(), 8), vec![4, 5]);
    }

    #[test]
    fn test_surviving_group_is_filled_once() {
        // White wraps around the corner next to 4 on two sides; 2 and 6 are free.
        let mut board = Board::new(3, 3);
        board.white(&[0, 1, 3]).black(&[4]);
        let rule = Enclose::default();
        let mut ctx = Context::new(&board.eq, &mut board.state);
        let origin = Origin::resolve(&ctx, &SiteFn::Const(Site(4))).unwrap();
        let group = rule.group(&mut ctx, &origin, Site(1));
        assert!(!group.captured);
        let mut sites: Vec<u32> = group.sites.iter().map(|s| s.0).collect();
        sites.sort_unstable();
        // Both seeds next to 4 are covered by the one fill.
        assert_eq!(sites, vec![0, 1, 3]);
        drop(ctx);
        assert!(captures(&mut board, Enclose::default(), 4).is_empty());
    }

    #[test]
    fn test_exceptions_allow_liberties() {
        let mut board = Board::new(3, 3);
        board.white(&[0]).black(&[1]);
        assert!(captures(&mut board, Enclose::default(), 1).is_empty());
        assert_eq!(captures(&mut board, Enclose::default().exceptions(1), 1), vec![0]);
    }

    #[test]
    fn test_include_empty_captures_territory() {
        // Black wall on column 1 closes off column 0 with one white stone in it.
        let mut board = Board::new(3, 3);
        board.black(&[1, 4, 7]).white(&[3]);
        let rule = Enclose::default().include_empty().with_liberty(BoolFn::False);
        assert_eq!(captures(&mut board, rule, 4), vec![0, 3, 6]);
    }

    #[test]
    fn test_flood_fill_terminates_on_ring() {
        let mut components = ComponentRegistry::new();
        let ids = components.register_per_player("Stone", 2).unwrap();
        let topology = Topology::new().with_graph(SiteType::Cell, Graph::ring(6));
        let eq = Equipment::new(GameConfig::new(2), topology, components);
        let mut state = GameState::new(&eq, 0);
        let white = Piece::new(ids[1], Some(PlayerId::new(1)));
        state.put(SiteType::Cell, Site(0), Piece::new(ids[0], Some(PlayerId::new(0))), 1);
        for s in 1..6 {
            state.put(SiteType::Cell, Site(s), white, 1);
        }
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(
            Enclose::default()
                .at(SiteFn::Const(Site(0)))
                .directions(Directions::Adjacent),
        );
        let moves = rule.evaluate(&mut ctx);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves.get(0).unwrap().between.len(), 5);
    }
}
