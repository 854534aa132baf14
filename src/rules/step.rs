//! Step: move one site in each allowed direction.

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::emitter::Emitter;
use super::walk::{effects_at, holds, level_reads, At, Origin};
use super::{check_graph, Concept, NodeKind, Report, RuleNode, StaticInfo};
use crate::context::{Context, EnvField, EnvFields};
use crate::core::Site;
use crate::functions::{BoolFn, IntFn, SiteFn};
use crate::game::Equipment;
use crate::moves::with_effects_before;
use crate::topology::Directions;

/// One adjacency step from `from`, gated by `go` with `to` bound.
///
/// Directions that lead to the same site (wheel-shaped boards) produce a
/// single move.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Step {
    pub from: SiteFn,
    pub directions: Directions,
    pub go: BoolFn,
    /// Evaluated at the destination; its actions come before the step.
    pub to_effect: Option<Box<RuleNode>>,
    pub stack: bool,
    /// Stack level moved from; the bound level when unset.
    #[serde(default)]
    pub level: Option<IntFn>,
    pub decision: bool,
}

impl Step {
    #[must_use]
    pub fn new(directions: Directions) -> Self {
        Self {
            from: SiteFn::From,
            directions,
            go: BoolFn::is_empty(SiteFn::To),
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
    pub fn with_go(mut self, go: BoolFn) -> Self {
        self.go = go;
        self
    }

    #[must_use]
    pub fn with_to_effect(mut self, effect: impl Into<RuleNode>) -> Self {
        self.to_effect = Some(Box::new(effect.into()));
        self
    }

    /// Move whole stacks.
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
}

impl NodeKind for Step {
    const NAME: &'static str = "Step";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let Some(origin) = Origin::resolve_at(ctx, &self.from, self.level.as_ref()) else {
            return ControlFlow::Continue(());
        };
        let mut seen: SmallVec<[Site; 8]> = SmallVec::new();
        for dir in origin.directions(&self.directions) {
            let Some(to) = origin.graph.step(origin.site, dir) else {
                continue;
            };
            if seen.contains(&to) {
                continue;
            }
            seen.push(to);

            let at = At::to(origin.site, to);
            if !holds(ctx, &self.go, at) {
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
        ControlFlow::Continue(())
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::dynamic(Concept::Step)
            .reading(self.from.reads() | level_reads(self.level.as_ref()))
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
        vec![&self.go]
    }

    fn conditions_mut(&mut self) -> Vec<&mut BoolFn> {
        vec![&mut self.go]
    }

    fn will_crash(&self, equipment: &Equipment, report: &mut Report) {
        check_graph(equipment, Self::NAME, report);
    }
}
