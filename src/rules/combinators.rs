//! Combinators: nodes that route to subtrees.
//!
//! ## Key Types
//!
//! - [`Or`]: Every alternative, in order
//! - [`Priority`]: The first alternative with any move
//! - [`Sequence`]: Cross-product of the children's moves
//! - [`If`] / [`Apply`]: Guarded subtrees
//! - [`Random`]: One randomly drawn branch
//! - [`Bind`]: Scoped assignment of one scratch field
//! - [`ForEachPiece`]: Run a subtree from every site holding a mover piece

use std::ops::ControlFlow;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::emitter::Emitter;
use super::{Concept, GameFlags, NodeKind, Report, RuleNode, StaticInfo};
use crate::components::PieceRef;
use crate::context::{Context, EnvField, EnvFields};
use crate::core::Site;
use crate::functions::{BoolFn, IntFn, SiteFn, Who};
use crate::game::Equipment;
use crate::moves::{cross_product, Move};

fn forward(ctx: &mut Context<'_>, node: &RuleNode, out: &mut Emitter<'_>) -> ControlFlow<()> {
    node.visit(ctx, &mut |mv: Arc<Move>| out.emit_shared(mv))
}

// =============================================================================
// Or / Priority / Sequence
// =============================================================================

/// Union of alternatives, in order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Or {
    pub nodes: Vec<RuleNode>,
}

impl Or {
    #[must_use]
    pub fn new(nodes: impl IntoIterator<Item = RuleNode>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
        }
    }
}

impl NodeKind for Or {
    const NAME: &'static str = "Or";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        for node in &self.nodes {
            forward(ctx, node, out)?;
        }
        ControlFlow::Continue(())
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::NEUTRAL
    }

    fn nodes(&self) -> Vec<&RuleNode> {
        self.nodes.iter().collect()
    }

    fn nodes_mut(&mut self) -> Vec<&mut RuleNode> {
        self.nodes.iter_mut().collect()
    }
}

/// Moves of the first alternative that has any.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Priority {
    pub nodes: Vec<RuleNode>,
}

impl Priority {
    #[must_use]
    pub fn new(nodes: impl IntoIterator<Item = RuleNode>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
        }
    }
}

impl NodeKind for Priority {
    const NAME: &'static str = "Priority";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        for node in &self.nodes {
            let mut any = false;
            node.visit(ctx, &mut |mv: Arc<Move>| {
                any = true;
                out.emit_shared(mv)
            })?;
            if any {
                break;
            }
        }
        ControlFlow::Continue(())
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::NEUTRAL.with_concept(Concept::Priority)
    }

    fn nodes(&self) -> Vec<&RuleNode> {
        self.nodes.iter().collect()
    }

    fn nodes_mut(&mut self) -> Vec<&mut RuleNode> {
        self.nodes.iter_mut().collect()
    }
}

/// Cross-product of the children's moves.
///
/// Every child is evaluated against the same position. Actions are
/// concatenated left to right; `from`, `to` and levels take the first
/// defined value; `between` and continuations are concatenated; the mover
/// and decision flag come from the leftmost move.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Sequence {
    pub nodes: Vec<RuleNode>,
}

impl Sequence {
    #[must_use]
    pub fn new(nodes: impl IntoIterator<Item = RuleNode>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
        }
    }
}

impl NodeKind for Sequence {
    const NAME: &'static str = "Sequence";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let mut nodes = self.nodes.iter();
        let Some(first) = nodes.next() else {
            return ControlFlow::Continue(());
        };
        let mut product = first.evaluate(ctx);
        for node in nodes {
            if product.is_empty() {
                return ControlFlow::Continue(());
            }
            product = cross_product(&product, &node.evaluate(ctx));
        }
        for mv in product {
            out.emit_shared(mv)?;
        }
        ControlFlow::Continue(())
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::NEUTRAL.with_concept(Concept::Sequence)
    }

    fn nodes(&self) -> Vec<&RuleNode> {
        self.nodes.iter().collect()
    }

    fn nodes_mut(&mut self) -> Vec<&mut RuleNode> {
        self.nodes.iter_mut().collect()
    }
}

// =============================================================================
// Guards
// =============================================================================

/// `branch` when the condition holds, else `otherwise`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct If {
    pub cond: BoolFn,
    pub branch: Box<RuleNode>,
    #[serde(default)]
    pub otherwise: Option<Box<RuleNode>>,
}

impl If {
    #[must_use]
    pub fn new(cond: BoolFn, branch: impl Into<RuleNode>) -> Self {
        Self {
            cond,
            branch: Box::new(branch.into()),
            otherwise: None,
        }
    }

    #[must_use]
    pub fn otherwise(mut self, node: impl Into<RuleNode>) -> Self {
        self.otherwise = Some(Box::new(node.into()));
        self
    }
}

impl NodeKind for If {
    const NAME: &'static str = "If";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        if self.cond.eval(ctx) {
            forward(ctx, &self.branch, out)
        } else if let Some(otherwise) = &self.otherwise {
            forward(ctx, otherwise, out)
        } else {
            ControlFlow::Continue(())
        }
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::NEUTRAL.with_concept(Concept::Conditional)
    }

    fn nodes(&self) -> Vec<&RuleNode> {
        std::iter::once(&*self.branch)
            .chain(self.otherwise.as_deref())
            .collect()
    }

    fn nodes_mut(&mut self) -> Vec<&mut RuleNode> {
        std::iter::once(&mut *self.branch)
            .chain(self.otherwise.as_deref_mut())
            .collect()
    }

    fn conditions(&self) -> Vec<&BoolFn> {
        vec![&self.cond]
    }

    fn conditions_mut(&mut self) -> Vec<&mut BoolFn> {
        vec![&mut self.cond]
    }
}

/// An effect behind an optional guard, evaluated once.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Apply {
    #[serde(default)]
    pub guard: Option<BoolFn>,
    pub effect: Box<RuleNode>,
}

impl Apply {
    #[must_use]
    pub fn new(effect: impl Into<RuleNode>) -> Self {
        Self {
            guard: None,
            effect: Box::new(effect.into()),
        }
    }

    #[must_use]
    pub fn when(mut self, guard: BoolFn) -> Self {
        self.guard = Some(guard);
        self
    }
}

impl NodeKind for Apply {
    const NAME: &'static str = "Apply";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        if self.guard.as_ref().map_or(true, |g| g.eval(ctx)) {
            forward(ctx, &self.effect, out)
        } else {
            ControlFlow::Continue(())
        }
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::NEUTRAL
    }

    fn nodes(&self) -> Vec<&RuleNode> {
        vec![&self.effect]
    }

    fn nodes_mut(&mut self) -> Vec<&mut RuleNode> {
        vec![&mut self.effect]
    }

    fn conditions(&self) -> Vec<&BoolFn> {
        self.guard.iter().collect()
    }

    fn conditions_mut(&mut self) -> Vec<&mut BoolFn> {
        self.guard.iter_mut().collect()
    }
}

// =============================================================================
// Random
// =============================================================================

/// One weighted alternative of [`Random`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Branch {
    pub probability: f64,
    pub node: RuleNode,
}

/// Draws one branch with the state's RNG and evaluates only that one.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Random {
    pub branches: Vec<Branch>,
}

impl Random {
    #[must_use]
    pub fn new(branches: impl IntoIterator<Item = (f64, RuleNode)>) -> Self {
        Self {
            branches: branches
                .into_iter()
                .map(|(probability, node)| Branch { probability, node })
                .collect(),
        }
    }

    fn total(&self) -> f64 {
        self.branches
            .iter()
            .map(|b| b.probability)
            .filter(|p| p.is_finite() && *p > 0.0)
            .sum()
    }
}

impl NodeKind for Random {
    const NAME: &'static str = "Random";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let weights: Vec<f64> = self.branches.iter().map(|b| b.probability).collect();
        match ctx.rng().choose_weighted(&weights) {
            Some(index) => forward(ctx, &self.branches[index].node, out),
            None => ControlFlow::Continue(()),
        }
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::dynamic(Concept::Random).with_flags(GameFlags::STOCHASTIC)
    }

    fn nodes(&self) -> Vec<&RuleNode> {
        self.branches.iter().map(|b| &b.node).collect()
    }

    fn nodes_mut(&mut self) -> Vec<&mut RuleNode> {
        self.branches.iter_mut().map(|b| &mut b.node).collect()
    }

    fn will_crash(&self, _equipment: &Equipment, report: &mut Report) {
        if self.total() <= 0.0 {
            report.crash(Self::NAME, "no branch has a positive probability");
        }
    }
}

// =============================================================================
// Bind / ForEachPiece
// =============================================================================

/// Value a [`Bind`] assigns.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Binding {
    From(SiteFn),
    To(SiteFn),
    Between(SiteFn),
    Level(IntFn),
    Value(IntFn),
}

impl Binding {
    fn field(&self) -> EnvField {
        match self {
            Binding::From(_) => EnvField::From,
            Binding::To(_) => EnvField::To,
            Binding::Between(_) => EnvField::Between,
            Binding::Level(_) => EnvField::Level,
            Binding::Value(_) => EnvField::Value,
        }
    }

    fn reads(&self) -> EnvFields {
        match self {
            Binding::From(s) | Binding::To(s) | Binding::Between(s) => s.reads(),
            Binding::Level(i) | Binding::Value(i) => i.reads(),
        }
    }
}

/// Assign one scratch field for the duration of a subtree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bind {
    pub binding: Binding,
    pub node: Box<RuleNode>,
}

impl Bind {
    #[must_use]
    pub fn new(binding: Binding, node: impl Into<RuleNode>) -> Self {
        Self {
            binding,
            node: Box::new(node.into()),
        }
    }
}

impl NodeKind for Bind {
    const NAME: &'static str = "Bind";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let mut scope = ctx.scope();
        match &self.binding {
            Binding::From(site) => {
                let site = site.eval(&scope);
                scope.set_from(site);
            }
            Binding::To(site) => {
                let site = site.eval(&scope);
                scope.set_to(site);
            }
            Binding::Between(site) => {
                let site = site.eval(&scope);
                scope.set_between(site);
            }
            Binding::Level(level) => {
                let level = usize::try_from(level.eval(&scope)).ok();
                scope.set_level(level);
            }
            Binding::Value(value) => {
                let value = value.eval(&scope);
                scope.set_value(Some(value));
            }
        }
        forward(&mut scope, &self.node, out)
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::NEUTRAL
            .reading(self.binding.reads())
            .writing(EnvFields::of(self.binding.field()))
    }

    fn nodes(&self) -> Vec<&RuleNode> {
        vec![&self.node]
    }

    fn nodes_mut(&mut self) -> Vec<&mut RuleNode> {
        vec![&mut self.node]
    }
}

/// Run a subtree with `from` bound to every site holding a matching piece.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForEachPiece {
    #[serde(default)]
    pub who: Who,
    /// Restrict to one component.
    #[serde(default)]
    pub piece: Option<PieceRef>,
    pub node: Box<RuleNode>,
}

impl ForEachPiece {
    #[must_use]
    pub fn new(node: impl Into<RuleNode>) -> Self {
        Self {
            who: Who::Mover,
            piece: None,
            node: Box::new(node.into()),
        }
    }

    #[must_use]
    pub fn of(mut self, piece: PieceRef) -> Self {
        self.piece = Some(piece);
        self
    }

    fn sites(&self, ctx: &Context<'_>) -> Vec<Site> {
        let st = ctx.site_type();
        let state = ctx.state();
        let registry = ctx.components();
        state
            .occupied(st)
            .filter(|&site| {
                let Some(piece) = state.piece(st, site, None) else {
                    return false;
                };
                self.who.matches(piece.who, ctx.mover(), state.player_count())
                    && self
                        .piece
                        .as_ref()
                        .map_or(true, |p| p.matches(registry, piece.what))
            })
            .collect()
    }
}

impl NodeKind for ForEachPiece {
    const NAME: &'static str = "ForEachPiece";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        for site in self.sites(ctx) {
            let mut scope = ctx.scope();
            scope.set_from(Some(site));
            forward(&mut scope, &self.node, out)?;
        }
        ControlFlow::Continue(())
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::dynamic(Concept::ForEachPiece).writing(EnvFields::of(EnvField::From))
    }

    fn nodes(&self) -> Vec<&RuleNode> {
        vec![&self.node]
    }

    fn nodes_mut(&mut self) -> Vec<&mut RuleNode> {
        vec![&mut self.node]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentRegistry;
    use crate::core::{GameConfig, PlayerId, SiteType};
    use crate::functions::RegionFn;
    use crate::rules::{Add, Pass, Remove, SetSite, SiteProperty};
    use crate::state::{GameState, Piece};
    use crate::topology::Topology;

    fn equipment() -> Equipment {
        let mut components = ComponentRegistry::new();
        components.register_per_player("Stone", 2).unwrap();
        Equipment::new(GameConfig::new(2), Topology::square(2, 2), components)
    }

    fn stone() -> PieceRef {
        PieceRef::named("Stone")
    }

    #[test]
    fn test_or_keeps_order() {
        let eq = equipment();
        let mut state = GameState::new(&eq, 0);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(Or::new([
            RuleNode::from(Pass::default()),
            RuleNode::from(Add::piece(stone())),
        ]));
        let moves = rule.evaluate(&mut ctx);
        assert_eq!(moves.len(), 5);
        assert!(moves.get(0).unwrap().is_pass());
    }

    #[test]
    fn test_priority_takes_first_non_empty() {
        let eq = equipment();
        let mut state = GameState::new(&eq, 0);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(Priority::new([
            RuleNode::from(Remove::at(RegionFn::Occupied).decision()),
            RuleNode::from(Add::piece(stone())),
            RuleNode::from(Pass::default()),
        ]));
        let moves = rule.evaluate(&mut ctx);
        assert_eq!(moves.len(), 4);
        assert!(moves.iter().all(|m| !m.is_pass()));
    }

    #[test]
    fn test_sequence_is_cross_product() {
        let eq = equipment();
        let mut state = GameState::new(&eq, 0);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(Sequence::new([
            RuleNode::from(Add::piece(stone()).to(RegionFn::Sites(vec![Site(0), Site(1)]))),
            RuleNode::from(Add::piece(stone()).to(RegionFn::Sites(vec![Site(2), Site(3)]))),
        ]));
        let moves = rule.evaluate(&mut ctx);
        assert_eq!(moves.len(), 4);
        let first = moves.get(0).unwrap();
        assert_eq!(first.actions.len(), 2);
        assert_eq!(first.to, Some(Site(0)));
    }

    #[test]
    fn test_if_and_apply_guards() {
        let eq = equipment();
        let mut state = GameState::new(&eq, 0);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(
            If::new(BoolFn::False, Add::piece(stone())).otherwise(Pass::default()),
        );
        assert_eq!(rule.evaluate(&mut ctx).len(), 1);

        let guarded = RuleNode::from(Apply::new(Pass::default()).when(BoolFn::Continuing));
        assert!(!guarded.can_move(&mut ctx));
        let open = RuleNode::from(Apply::new(Pass::default()));
        assert!(open.can_move(&mut ctx));
    }

    #[test]
    fn test_random_is_deterministic_per_seed() {
        let eq = equipment();
        let rule = RuleNode::from(Random::new([
            (1.0, RuleNode::from(Pass::default())),
            (1.0, RuleNode::from(Add::piece(stone()))),
        ]));
        let mut a = GameState::new(&eq, 42);
        let mut b = GameState::new(&eq, 42);
        let la = rule.evaluate(&mut Context::new(&eq, &mut a)).len();
        let lb = rule.evaluate(&mut Context::new(&eq, &mut b)).len();
        assert_eq!(la, lb);

        let dead = RuleNode::from(Random::new([(0.0, RuleNode::from(Pass::default()))]));
        assert!(dead.evaluate(&mut Context::new(&eq, &mut a)).is_empty());
        let mut report = Report::new();
        assert!(dead.will_crash(&eq, &mut report));
    }

    #[test]
    fn test_bind_restores_scratch() {
        let eq = equipment();
        let mut state = GameState::new(&eq, 0);
        let stone0 = eq.components.find("Stone", Some(PlayerId::new(0))).unwrap();
        state.put(SiteType::Cell, Site(0), Piece::new(stone0, Some(PlayerId::new(0))), 1);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(Bind::new(
            Binding::To(SiteFn::Const(Site(3))),
            Add::piece(stone()).to(RegionFn::Site(SiteFn::To)),
        ));
        let moves = rule.evaluate(&mut ctx);
        assert_eq!(moves.destinations(), vec![Site(3)]);
        assert_eq!(ctx.to(), None);

        let value = RuleNode::from(Bind::new(
            Binding::Value(IntFn::Const(5)),
            SetSite::new(SiteFn::Const(Site(0)), SiteProperty::Value, IntFn::Value),
        ));
        assert_eq!(value.evaluate(&mut ctx).len(), 1);
        assert_eq!(ctx.value(), None);
    }

    #[test]
    fn test_for_each_piece_binds_from() {
        let eq = equipment();
        let mut state = GameState::new(&eq, 0);
        let p0 = PlayerId::new(0);
        let mine = eq.components.find("Stone", Some(p0)).unwrap();
        let theirs = eq.components.find("Stone", Some(PlayerId::new(1))).unwrap();
        state.put(SiteType::Cell, Site(0), Piece::new(mine, Some(p0)), 1);
        state.put(SiteType::Cell, Site(3), Piece::new(theirs, Some(PlayerId::new(1))), 1);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(ForEachPiece::new(Remove::at(RegionFn::Site(SiteFn::From))));
        let moves = rule.evaluate(&mut ctx);
        assert_eq!(moves.len(), 1);
        assert_eq!(ctx.from(), None);
    }
}
