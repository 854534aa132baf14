use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};

use super::{capture_info, emit_captures, enemy_between, remove_between};
use crate::context::Context;
use crate::functions::{BoolFn, SiteFn};
use crate::game::Equipment;
use crate::rules::emitter::Emitter;
use crate::rules::walk::{holds, run_of, At, Origin};
use crate::rules::{check_graph, Concept, NodeKind, Report, RuleNode, StaticInfo};
use crate::topology::Directions;

/// Sandwich capture. On each ray from `at`, a run of 1 to `max_length`
/// targets followed by a friend is captured.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Custodial {
    pub at: SiteFn,
    pub directions: Directions,
    pub max_length: usize,
    /// Evaluated with `between` bound to each site of the run.
    pub target: BoolFn,
    /// Evaluated with `to` bound to the site closing the run.
    pub friend: BoolFn,
    pub effect: Box<RuleNode>,
}

impl Default for Custodial {
    fn default() -> Self {
        Self {
            at: SiteFn::To,
            directions: Directions::Orthogonal,
            max_length: 1,
            target: enemy_between(),
            friend: BoolFn::is_friend(SiteFn::To),
            effect: remove_between(),
        }
    }
}

impl Custodial {
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
    pub fn with_friend(mut self, friend: BoolFn) -> Self {
        self.friend = friend;
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: impl Into<RuleNode>) -> Self {
        self.effect = Box::new(effect.into());
        self
    }
}

impl NodeKind for Custodial {
    const NAME: &'static str = "Custodial";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let Some(origin) = Origin::resolve(ctx, &self.at) else {
            return ControlFlow::Continue(());
        };
        let mut captured = Vec::new();
        for dir in origin.directions(&self.directions) {
            let ray = origin.radial(dir);
            let run = run_of(ctx, origin.site, ray, &self.target, self.max_length);
            if run.is_empty() {
                continue;
            }
            let Some(&closer) = ray.get(run.len()) else {
                continue;
            };
            if holds(ctx, &self.friend, At::to(origin.site, closer)) {
                captured.extend(run);
            }
        }
        emit_captures(ctx, &self.effect, &mut captured, out)
    }

    fn own_info(&self) -> StaticInfo {
        capture_info(Concept::CustodialCapture, &self.at)
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

    fn will_crash(&self, equipment: &Equipment, report: &mut Report) {
        check_graph(equipment, Self::NAME, report);
        if self.max_length == 0 {
            report.crash(Self::NAME, "a run of length zero captures nothing");
        }
    }
}
