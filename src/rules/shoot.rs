//! Shoot: place a piece at range.

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::emitter::Emitter;
use super::walk::{holds, resolve_piece, At, Origin};
use super::{check_graph, Concept, NodeKind, Report, RuleNode, StaticInfo};
use crate::components::PieceRef;
use crate::context::{Context, EnvField, EnvFields};
use crate::core::Site;
use crate::functions::{BoolFn, SiteFn};
use crate::game::Equipment;
use crate::moves::{Action, Move};
use crate::topology::Directions;

/// Walk each ray from `from` while `go` holds, placing `piece` at every
/// reachable site. With `between_piece`, every site passed on the way gets
/// one as well.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Shoot {
    pub from: SiteFn,
    pub directions: Directions,
    pub piece: PieceRef,
    pub go: BoolFn,
    pub between_piece: Option<PieceRef>,
    pub decision: bool,
}

impl Shoot {
    #[must_use]
    pub fn new(piece: PieceRef) -> Self {
        Self {
            from: SiteFn::To,
            directions: Directions::Adjacent,
            piece,
            go: BoolFn::is_empty(SiteFn::To),
            between_piece: None,
            decision: true,
        }
    }

    #[must_use]
    pub fn from(mut self, site: SiteFn) -> Self {
        self.from = site;
        self
    }

    #[must_use]
    pub fn directions(mut self, directions: Directions) -> Self {
        self.directions = directions;
        self
    }

    #[must_use]
    pub fn with_between_piece(mut self, piece: PieceRef) -> Self {
        self.between_piece = Some(piece);
        self
    }
}

impl NodeKind for Shoot {
    const NAME: &'static str = "Shoot";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let Some(origin) = Origin::resolve(ctx, &self.from) else {
            return ControlFlow::Continue(());
        };
        let Some(piece) = resolve_piece(ctx, &self.piece) else {
            return ControlFlow::Continue(());
        };
        let trail = self.between_piece.as_ref().and_then(|p| resolve_piece(ctx, p));
        let st = origin.site_type;
        for dir in origin.directions(&self.directions) {
            let mut passed: SmallVec<[Site; 8]> = SmallVec::new();
            for &site in origin.radial(dir) {
                if !holds(ctx, &self.go, At::to(origin.site, site)) {
                    break;
                }
                let mut actions = vec![Action::add(st, site, piece, 1)];
                if let Some(trail) = trail {
                    actions.extend(passed.iter().map(|&s| Action::add(st, s, trail, 1)));
                }
                let mv = Move::new(actions)
                    .with_from(origin.site)
                    .with_to(site)
                    .with_site_type(st)
                    .with_between(passed.iter().copied());
                out.emit(mv)?;
                passed.push(site);
            }
        }
        ControlFlow::Continue(())
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::dynamic(Concept::Shoot)
            .with_concept(Concept::Placement)
            .reading(self.from.reads())
            .writing(EnvFields::of(EnvField::From) | EnvField::To)
    }

    fn is_decision(&self) -> bool {
        self.decision
    }

    fn conditions(&self) -> Vec<&BoolFn> {
        vec![&self.go]
    }

    fn conditions_mut(&mut self) -> Vec<&mut BoolFn> {
        vec![&mut self.go]
    }

    fn missing_requirement(&self, equipment: &Equipment, report: &mut Report) {
        for piece in std::iter::once(&self.piece).chain(self.between_piece.as_ref()) {
            if let PieceRef::Named(name) = piece {
                if !equipment.components.has_name(name) {
                    report.missing(Self::NAME, format!("piece {name} is not defined"));
                }
            }
        }
    }

    fn will_crash(&self, equipment: &Equipment, report: &mut Report) {
        check_graph(equipment, Self::NAME, report);
    }
}
