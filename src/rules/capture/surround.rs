use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};

use super::{capture_info, emit_captures, enemy_between, remove_between};
use crate::components::PieceRef;
use crate::context::Context;
use crate::functions::{BoolFn, SiteFn};
use crate::game::Equipment;
use crate::rules::emitter::Emitter;
use crate::rules::walk::{holds, At, Origin};
use crate::rules::{check_graph, Concept, NodeKind, Report, RuleNode, StaticInfo};
use crate::topology::Directions;

/// Capture neighbours of `at` that are hemmed in.
///
/// A neighbour satisfying `target` is captured when at most `exceptions`
/// of its own neighbours fail `friend`. With `with_piece`, one of those
/// neighbours must also hold that piece.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Surround {
    pub at: SiteFn,
    pub directions: Directions,
    /// Evaluated with `between` bound to the threatened site.
    pub target: BoolFn,
    /// Evaluated with `between` bound to the threatened site and `to` to
    /// each of its neighbours.
    pub friend: BoolFn,
    pub exceptions: usize,
    pub with_piece: Option<PieceRef>,
    pub effect: Box<RuleNode>,
}

impl Default for Surround {
    fn default() -> Self {
        Self {
            at: SiteFn::To,
            directions: Directions::Orthogonal,
            target: enemy_between(),
            friend: BoolFn::is_friend(SiteFn::To),
            exceptions: 0,
            with_piece: None,
            effect: remove_between(),
        }
    }
}

impl Surround {
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
    pub fn with_friend(mut self, friend: BoolFn) -> Self {
        self.friend = friend;
        self
    }

    #[must_use]
    pub fn exceptions(mut self, n: usize) -> Self {
        self.exceptions = n;
        self
    }

    #[must_use]
    pub fn with_piece(mut self, piece: PieceRef) -> Self {
        self.with_piece = Some(piece);
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: impl Into<RuleNode>) -> Self {
        self.effect = Box::new(effect.into());
        self
    }
}

impl NodeKind for Surround {
    const NAME: &'static str = "Surround";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let Some(origin) = Origin::resolve(ctx, &self.at) else {
            return ControlFlow::Continue(());
        };
        let st = origin.site_type;
        let dirs = origin.directions(&self.directions);
        let mut captured = Vec::new();
        for threatened in origin.graph.neighbours(origin.site, &dirs) {
            if !holds(ctx, &self.target, At::between_only(threatened)) {
                continue;
            }
            let mut failures = 0;
            let mut has_piece = self.with_piece.is_none();
            for n in origin.graph.neighbours(threatened, &dirs) {
                let at = At {
                    from: None,
                    to: Some(n),
                    between: Some(threatened),
                };
                if !holds(ctx, &self.friend, at) {
                    failures += 1;
                    if failures > self.exceptions {
                        break;
                    }
                }
                if let Some(piece) = &self.with_piece {
                    let registry = ctx.components();
                    has_piece |= ctx
                        .state()
                        .what(st, n, None)
                        .is_some_and(|what| piece.matches(registry, what));
                }
            }
            if failures <= self.exceptions && has_piece {
                captured.push(threatened);
            }
        }
        emit_captures(ctx, &self.effect, &mut captured, out)
    }

    fn own_info(&self) -> StaticInfo {
        capture_info(Concept::SurroundCapture, &self.at)
    }

    fn nodes(&self) -> Vec<&RuleNode> {
        vec![&self.effect]
    }

    fn nodes_mut(&mut self) -> Vec<&mut RuleNode> {
        vec![&mut self.effect]
    }

    fn conditions(&self) -> Vec<&BoolFn> {
        vec![&self.target, &self.friend]
    }

    fn conditions_mut(&mut self) -> Vec<&mut BoolFn> {
        vec![&mut self.target, &mut self.friend]
    }

    fn missing_requirement(&self, equipment: &Equipment, report: &mut Report) {
        if let Some(PieceRef::Named(name)) = &self.with_piece {
            if !equipment.components.has_name(name) {
                report.missing(Self::NAME, format!("piece {name} is not defined"));
            }
        }
    }

    fn will_crash(&self, equipment: &Equipment, report: &mut Report) {
        check_graph(equipment, Self::NAME, report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Site;
    use crate::rules::capture::fixtures::Board;

    fn captures(board: &mut Board, rule: Surround, at: u32) -> Vec<u32> {
        let mut ctx = Context::new(&board.eq, &mut board.state);
        let moves = RuleNode::from(rule.at(SiteFn::Const(Site(at)))).evaluate(&mut ctx);
        moves
            .get(0)
            .map(|m| m.between.iter().map(|s| s.0).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_fully_surrounded_neighbour() {
        // 5x5, white at 12 boxed in by black on all four sides once 17 is played.
        let mut board = Board::new(5, 5);
        board.white(&[12]).black(&[7, 11, 13, 17]);
        assert_eq!(captures(&mut board, Surround::default(), 17), vec![12]);
    }

    #[test]
    fn test_edges_count_as_nothing() {
        // Corner white at 0 has only two neighbours, both black.
        let mut board = Board::new(3, 3);
        board.white(&[0]).black(&[1, 3]);
        assert_eq!(captures(&mut board, Surround::default(), 1), vec![0]);
    }

    #[test]
    fn test_exceptions_and_required_piece() {
        let mut board = Board::new(5, 5);
        board.white(&[12]).black(&[7, 11, 17]);
        assert!(captures(&mut board, Surround::default(), 17).is_empty());
        assert_eq!(captures(&mut board, Surround::default().exceptions(1), 17), vec![12]);

        let needs_king = Surround::default()
            .exceptions(1)
            .with_piece(PieceRef::named("King"));
        assert!(captures(&mut board, needs_king, 17).is_empty());
    }
}
