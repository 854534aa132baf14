use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};

use super::{capture_info, emit_captures, enemy_between, remove_between};
use crate::context::Context;
use crate::functions::{BoolFn, SiteFn};
use crate::game::Equipment;
use crate::rules::emitter::Emitter;
use crate::rules::walk::{run_of, Origin};
use crate::rules::{check_graph, Concept, NodeKind, Report, RuleNode, StaticInfo};
use crate::topology::{DirectionList, Directions};

/// Capture the run of targets starting next to `at`.
///
/// Without explicit directions the run is taken in the direction of travel,
/// from `from` to `at`. The run stops at the first site failing the target
/// test; no closing friend is needed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Directional {
    pub at: SiteFn,
    pub directions: Option<Directions>,
    /// Longest run captured; unbounded when unset.
    pub max_length: Option<usize>,
    /// Evaluated with `between` bound.
    pub target: BoolFn,
    pub effect: Box<RuleNode>,
}

impl Default for Directional {
    fn default() -> Self {
        Self {
            at: SiteFn::To,
            directions: None,
            max_length: None,
            target: enemy_between(),
            effect: remove_between(),
        }
    }
}

impl Directional {
    #[must_use]
    pub fn at(mut self, site: SiteFn) -> Self {
        self.at = site;
        self
    }

    #[must_use]
    pub fn directions(mut self, directions: Directions) -> Self {
        self.directions = Some(directions);
        self
    }

    #[must_use]
    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
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

impl NodeKind for Directional {
    const NAME: &'static str = "Directional";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let Some(origin) = Origin::resolve(ctx, &self.at) else {
            return ControlFlow::Continue(());
        };
        let dirs = match &self.directions {
            Some(directions) => origin.directions(directions),
            None => {
                let travel = ctx
                    .from()
                    .and_then(|from| origin.graph.direction_between(from, origin.site));
                travel.into_iter().collect::<DirectionList>()
            }
        };
        let max = self.max_length.unwrap_or(usize::MAX);
        let mut captured = Vec::new();
        for dir in dirs {
            captured.extend(run_of(ctx, origin.site, origin.radial(dir), &self.target, max));
        }
        emit_captures(ctx, &self.effect, &mut captured, out)
    }

    fn own_info(&self) -> StaticInfo {
        let info = capture_info(Concept::DirectionalCapture, &self.at);
        match self.directions {
            Some(_) => info,
            None => info.reading(SiteFn::From.reads()),
        }
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
    }
}
