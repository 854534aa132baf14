use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{capture_info, emit_captures, enemy_between, remove_between};
use crate::context::Context;
use crate::functions::{BoolFn, SiteFn};
use crate::game::Equipment;
use crate::rules::emitter::Emitter;
use crate::rules::walk::{run_of, Origin};
use crate::rules::{check_graph, Concept, NodeKind, Report, RuleNode, StaticInfo};
use crate::topology::{Compass, Directions};

/// Capture by stepping in between. For each pair of opposite directions,
/// if both rays from `at` start with a run of 1 to `max_length` targets,
/// both runs are captured.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Intervene {
    pub at: SiteFn,
    pub directions: Directions,
    pub max_length: usize,
    /// Evaluated with `between` bound.
    pub target: BoolFn,
    pub effect: Box<RuleNode>,
}

impl Default for Intervene {
    fn default() -> Self {
        Self {
            at: SiteFn::To,
            directions: Directions::Adjacent,
            max_length: 1,
            target: enemy_between(),
            effect: remove_between(),
        }
    }
}

impl Intervene {
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
    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = n;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: BoolFn) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: impl Into<RuleNode>) -> Self {
        self.effect = Box::new(effect.into());
        self
    }
}

impl NodeKind for Intervene {
    const NAME: &'static str = "Intervene";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let Some(origin) = Origin::resolve(ctx, &self.at) else {
            return ControlFlow::Continue(());
        };
        let dirs = origin.directions(&self.directions);
        let mut done: SmallVec<[Compass; 8]> = SmallVec::new();
        let mut captured = Vec::new();
        for &dir in &dirs {
            let back = dir.opposite();
            if done.contains(&dir) || !dirs.contains(&back) {
                continue;
            }
            done.extend([dir, back]);
            let ahead = run_of(ctx, origin.site, origin.radial(dir), &self.target, self.max_length);
            if ahead.is_empty() {
                continue;
            }
            let behind = run_of(ctx, origin.site, origin.radial(back), &self.target, self.max_length);
            if behind.is_empty() {
                continue;
            }
            captured.extend(ahead);
            captured.extend(behind);
        }
        emit_captures(ctx, &self.effect, &mut captured, out)
    }

    fn own_info(&self) -> StaticInfo {
        capture_info(Concept::InterveneCapture, &self.at)
    }

    fn nodes(&self) -> Vec<&RuleNode> {
        vec![&self.effect]
    }

    fn nodes_mut(&mut self) -> Vec<&mut RuleNode> {
        vec![&mut self.effect]
    }

    fn conditions(&self) -> Vec<&BoolFn> {
        vec![&self.target]
    }

    fn conditions_mut(&mut self) -> Vec<&mut BoolFn> {
        vec![&mut self.target]
    }

    fn will_crash(&self, equipment: &Equipment, report: &mut Report) {
        check_graph(equipment, Self::NAME, report);
        if self.max_length == 0 {
            report.crash(Self::NAME, "a run of length zero captures nothing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Site;
    use crate::rules::capture::fixtures::Board;

    fn evaluate(board: &mut Board, rule: Intervene) -> Vec<Site> {
        let mut ctx = Context::new(&board.eq, &mut board.state);
        let moves = RuleNode::from(rule.at(SiteFn::Const(Site(4)))).evaluate(&mut ctx);
        moves.get(0).map(|m| m.between.to_vec()).unwrap_or_default()
    }

    #[test]
    fn test_needs_both_sides() {
        let mut board = Board::new(3, 3);
        board.white(&[3, 5, 1]);
        // W/E pair flanks; N/S only has one side.
        assert_eq!(evaluate(&mut board, Intervene::default()), vec![Site(3), Site(5)]);
    }

    #[test]
    fn test_one_side_is_not_enough() {
        let mut board = Board::new(3, 3);
        board.white(&[3, 1]);
        assert!(evaluate(&mut board, Intervene::default()).is_empty());
    }

    #[test]
    fn test_diagonal_pairs() {
        let mut board = Board::new(3, 3);
        board.white(&[0, 8, 2]).black(&[6]);
        assert_eq!(evaluate(&mut board, Intervene::default()), vec![Site(0), Site(8)]);
        let orthogonal = Intervene::default().directions(Directions::Orthogonal);
        assert!(evaluate(&mut board, orthogonal).is_empty());
    }
}
