//! Rule trees: the move-generation nodes and their algebra.
//!
//! A game's rules are a tree of [`RuleNode`]s. Each node generates moves
//! for the current position; combinators route to subtrees; continuations
//! ([`Then`]) are recorded on generated moves and fired by the driver once
//! the move is committed.
//!
//! ## Key Components
//!
//! - [`RuleNode`]: A node plus its optional continuation
//! - [`Rule`]: One variant per node kind, each with a parameter struct
//! - [`Then`]: A continuation subtree
//! - [`Report`]: Diagnostics from the validation passes
//! - [`StaticInfo`]: Flags, concepts and scratch reads/writes of a subtree
//!
//! ## Evaluation
//!
//! Every node has exactly one generator pushing moves into a sink.
//! [`RuleNode::evaluate`] collects everything, [`RuleNode::can_move`] stops
//! at the first move and [`RuleNode::can_move_to`] at the first move to a
//! given site, so the three always agree.
//!
//! ## Example
//!
//! ```
//! use rust_ludeme::components::{ComponentRegistry, PieceRef};
//! use rust_ludeme::context::Context;
//! use rust_ludeme::core::{GameConfig, Site};
//! use rust_ludeme::game::Equipment;
//! use rust_ludeme::rules::{Add, RuleNode};
//! use rust_ludeme::state::GameState;
//! use rust_ludeme::topology::Topology;
//!
//! let mut components = ComponentRegistry::new();
//! components.register_per_player("Stone", 2).unwrap();
//! let equipment = Equipment::new(GameConfig::new(2), Topology::square(3, 3), components);
//!
//! let rule = RuleNode::from(Add::piece(PieceRef::named("Stone")));
//! let mut state = GameState::new(&equipment, 0);
//! let mut ctx = Context::new(&equipment, &mut state);
//!
//! let moves = rule.evaluate(&mut ctx);
//! assert_eq!(moves.len(), 9);
//! assert!(rule.can_move_to(&mut ctx, Site(4)));
//! ```

mod analysis;
mod capture;
mod combinators;
mod deal;
mod emitter;
mod hop;
mod leap;
mod place;
mod push;
mod report;
mod shoot;
mod slide;
mod social;
mod sow;
mod step;
mod walk;

pub use analysis::{Concept, ConceptSet, GameFlags, StaticInfo};
pub use capture::{Custodial, Directional, Enclose, Intervene, Surround};
pub use combinators::{Apply, Bind, Binding, Branch, ForEachPiece, If, Or, Priority, Random, Sequence};
pub use deal::{Deal, Roll};
pub use emitter::Sink;
pub use hop::Hop;
pub use leap::Leap;
pub use place::{Add, Flip, FromTo, Promote, Remove, Select, SetSite, SiteProperty};
pub use push::{Attract, Push};
pub use report::{Diagnostic, DiagnosticKind, Report};
pub use shoot::Shoot;
pub use slide::Slide;
pub use social::{Bet, Message, MessageKind, MoveAgain, Pass};
pub use sow::Sow;
pub use step::Step;

use std::ops::ControlFlow;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::{Context, EnvField, EnvFields};
use crate::core::Site;
use crate::functions::BoolFn;
use crate::game::{Equipment, StringTable};
use crate::moves::{Move, MoveList};
use emitter::Emitter;

/// Behaviour every node kind provides.
pub(crate) trait NodeKind {
    /// Name used in diagnostics.
    const NAME: &'static str;

    /// Push this node's moves into `out`.
    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()>;

    /// Declarations of this node alone. Reads listed here are taken from the
    /// caller; reads of conditions and child nodes are added afterwards,
    /// minus what this node writes.
    fn own_info(&self) -> StaticInfo;

    /// Whether moves of this node are player decisions.
    fn is_decision(&self) -> bool {
        false
    }

    /// Direct child nodes.
    fn nodes(&self) -> Vec<&RuleNode> {
        Vec::new()
    }

    fn nodes_mut(&mut self) -> Vec<&mut RuleNode> {
        Vec::new()
    }

    /// Conditions evaluated by this node.
    fn conditions(&self) -> Vec<&BoolFn> {
        Vec::new()
    }

    fn conditions_mut(&mut self) -> Vec<&mut BoolFn> {
        Vec::new()
    }

    /// One-time compile step, run after the children are compiled.
    fn preprocess(&mut self, _equipment: &Equipment, _strings: &mut StringTable) {}

    fn missing_requirement(&self, _equipment: &Equipment, _report: &mut Report) {}

    fn will_crash(&self, _equipment: &Equipment, _report: &mut Report) {}

    /// Switch off any action cache.
    fn disable_cache(&self) {}

    /// Drop cached moves.
    fn clear_cache(&mut self) {}
}

/// A continuation: a subtree evaluated after a move is committed, with
/// `from` and `to` bound to that move.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Then {
    pub node: RuleNode,
}

impl Then {
    #[must_use]
    pub fn new(node: impl Into<RuleNode>) -> Self {
        Self { node: node.into() }
    }
}

macro_rules! rules {
    ($($variant:ident),* $(,)?) => {
        /// Every node kind.
        #[derive(Clone, Debug, Serialize, Deserialize)]
        pub enum Rule {
            $($variant($variant),)*
        }

        $(
            impl From<$variant> for RuleNode {
                fn from(node: $variant) -> Self {
                    RuleNode::new(Rule::$variant(node))
                }
            }
        )*

        macro_rules! dispatch {
            ($rule:expr, $n:ident => $body:expr) => {
                match $rule {
                    $(Rule::$variant($n) => $body,)*
                }
            };
        }
    };
}

rules! {
    // Combinators
    Or, Priority, Sequence, If, Apply, Random, Bind, ForEachPiece,
    // Movement
    Step, Slide, Hop, Leap, Shoot, Push, Attract,
    // Placement and pieces
    Add, Remove, FromTo, Flip, Promote, SetSite, Select,
    // Sowing, cards, dice
    Sow, Deal, Roll,
    // Social and turn
    Bet, Message, Pass, MoveAgain,
    // Capture
    Custodial, Intervene, Directional, Enclose, Surround,
}

fn name_of<N: NodeKind>(_: &N) -> &'static str {
    N::NAME
}

impl Rule {
    /// Node kind name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        dispatch!(self, n => name_of(n))
    }

    /// Whether moves of this node are player decisions.
    #[must_use]
    pub fn is_decision(&self) -> bool {
        dispatch!(self, n => n.is_decision())
    }

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        dispatch!(self, n => n.generate(ctx, out))
    }

    fn own_info(&self) -> StaticInfo {
        dispatch!(self, n => n.own_info())
    }

    fn nodes(&self) -> Vec<&RuleNode> {
        dispatch!(self, n => n.nodes())
    }

    fn nodes_mut(&mut self) -> Vec<&mut RuleNode> {
        dispatch!(self, n => n.nodes_mut())
    }

    fn conditions(&self) -> Vec<&BoolFn> {
        dispatch!(self, n => n.conditions())
    }

    fn conditions_mut(&mut self) -> Vec<&mut BoolFn> {
        dispatch!(self, n => n.conditions_mut())
    }

    fn preprocess(&mut self, equipment: &Equipment, strings: &mut StringTable) {
        dispatch!(self, n => n.preprocess(equipment, strings))
    }

    fn missing_requirement(&self, equipment: &Equipment, report: &mut Report) {
        dispatch!(self, n => n.missing_requirement(equipment, report))
    }

    fn will_crash(&self, equipment: &Equipment, report: &mut Report) {
        dispatch!(self, n => n.will_crash(equipment, report))
    }

    fn disable_cache(&self) {
        dispatch!(self, n => n.disable_cache())
    }

    fn clear_cache(&mut self) {
        dispatch!(self, n => n.clear_cache())
    }
}

/// A rule node with its optional continuation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleNode {
    pub rule: Rule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then: Option<Arc<Then>>,
    /// Folded analysis, filled by the compile pass.
    #[serde(skip)]
    info: Option<StaticInfo>,
}

impl RuleNode {
    #[must_use]
    pub fn new(rule: Rule) -> Self {
        Self {
            rule,
            then: None,
            info: None,
        }
    }

    /// Attach a continuation, replacing any previous one.
    #[must_use]
    pub fn then(mut self, next: impl Into<RuleNode>) -> Self {
        self.then = Some(Arc::new(Then::new(next)));
        self
    }

    // === Evaluation ===

    /// Push every move into `sink`, stopping when it breaks.
    pub fn visit(&self, ctx: &mut Context<'_>, sink: &mut Sink<'_>) -> ControlFlow<()> {
        let mut out = Emitter::new(ctx.mover(), self.rule.is_decision(), self.then.as_ref(), sink);
        self.rule.generate(ctx, &mut out)
    }

    /// All legal moves, in generation order.
    pub fn evaluate(&self, ctx: &mut Context<'_>) -> MoveList {
        let mut moves = MoveList::new();
        let _ = self.visit(ctx, &mut |mv: Arc<Move>| {
            moves.push_shared(mv);
            ControlFlow::Continue(())
        });
        moves
    }

    /// Whether at least one move exists.
    pub fn can_move(&self, ctx: &mut Context<'_>) -> bool {
        self.visit(ctx, &mut |_: Arc<Move>| ControlFlow::Break(())).is_break()
    }

    /// Whether some move ends on `site`.
    pub fn can_move_to(&self, ctx: &mut Context<'_>, site: Site) -> bool {
        self.visit(ctx, &mut |mv: Arc<Move>| {
            if mv.to == Some(site) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .is_break()
    }

    // === Static analysis ===

    /// Folded analysis of this subtree.
    #[must_use]
    pub fn info(&self) -> StaticInfo {
        self.info.unwrap_or_else(|| self.compute_info())
    }

    fn compute_info(&self) -> StaticInfo {
        let mut info = self.rule.own_info();
        for cond in self.rule.conditions() {
            info.reads = info.reads | cond.reads().without(info.writes);
            info.is_static &= cond.is_static();
            for nested in cond.rules() {
                info.absorb(nested.info());
            }
        }
        for child in self.rule.nodes() {
            info.absorb(child.info());
        }
        if let Some(then) = &self.then {
            let mut tail = then.node.info();
            tail.reads = tail
                .reads
                .without(EnvFields::of(EnvField::From) | EnvField::To);
            info.absorb(tail);
        }
        info
    }

    #[must_use]
    pub fn declared_flags(&self) -> GameFlags {
        self.info().flags
    }

    #[must_use]
    pub fn declared_concepts(&self) -> ConceptSet {
        self.info().concepts
    }

    #[must_use]
    pub fn reads_env_fields(&self) -> EnvFields {
        self.info().reads
    }

    #[must_use]
    pub fn writes_env_fields(&self) -> EnvFields {
        self.info().writes
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.info().is_static
    }

    // === Compile pass ===

    /// Resolve defaults, allocate caches and register strings. Runs once,
    /// children first; stores the folded analysis on every node.
    pub fn preprocess(&mut self, equipment: &Equipment, strings: &mut StringTable) {
        for child in self.rule.nodes_mut() {
            child.preprocess(equipment, strings);
        }
        for cond in self.rule.conditions_mut() {
            for nested in cond.rules_mut() {
                nested.preprocess(equipment, strings);
            }
        }
        if let Some(then) = &mut self.then {
            Arc::make_mut(then).node.preprocess(equipment, strings);
        }
        self.rule.preprocess(equipment, strings);
        self.info = None;
        self.info = Some(self.compute_info());
    }

    /// Every node of the subtree, continuations and conditions included.
    fn walk<'r>(&'r self, f: &mut dyn FnMut(&'r RuleNode)) {
        f(self);
        for cond in self.rule.conditions() {
            for nested in cond.rules() {
                nested.walk(f);
            }
        }
        for child in self.rule.nodes() {
            child.walk(f);
        }
        if let Some(then) = &self.then {
            then.node.walk(f);
        }
    }

    /// Report requirements the equipment doesn't meet. Returns whether
    /// anything was reported.
    pub fn missing_requirement(&self, equipment: &Equipment, report: &mut Report) -> bool {
        let before = report.len();
        self.walk(&mut |node| node.rule.missing_requirement(equipment, report));
        report.len() > before
    }

    /// Report parameters that would misbehave at runtime. Returns whether
    /// anything was reported.
    pub fn will_crash(&self, equipment: &Equipment, report: &mut Report) -> bool {
        let before = report.len();
        self.walk(&mut |node| node.rule.will_crash(equipment, report));
        report.len() > before
    }

    // === Caches ===

    /// Switch off every action cache in the subtree.
    pub fn disable_cache(&self) {
        self.walk(&mut |node| node.rule.disable_cache());
    }

    /// Drop every cached move in the subtree.
    pub fn clear_cache(&mut self) {
        self.rule.clear_cache();
        for child in self.rule.nodes_mut() {
            child.clear_cache();
        }
        for cond in self.rule.conditions_mut() {
            for nested in cond.rules_mut() {
                nested.clear_cache();
            }
        }
        if let Some(then) = &mut self.then {
            Arc::make_mut(then).node.clear_cache();
        }
    }
}

impl From<Rule> for RuleNode {
    fn from(rule: Rule) -> Self {
        RuleNode::new(rule)
    }
}

/// Report a node that walks a graph the board doesn't have.
pub(crate) fn check_graph(equipment: &Equipment, node: &'static str, report: &mut Report) {
    let site_type = equipment.config.default_site_type;
    if equipment.topology.graph(site_type).is_none() {
        report.crash(node, format!("board has no {site_type:?} graph"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ComponentRegistry, PieceRef};
    use crate::core::{GameConfig, PlayerId, SiteType};
    use crate::functions::{RegionFn, SiteFn};
    use crate::state::{GameState, Piece};
    use crate::topology::{Directions, Topology};

    fn equipment() -> Equipment {
        let mut components = ComponentRegistry::new();
        components.register_per_player("Man", 2).unwrap();
        Equipment::new(GameConfig::new(2), Topology::square(3, 3), components)
    }

    #[test]
    fn test_evaluate_and_can_move_agree() {
        let eq = equipment();
        let mut state = GameState::new(&eq, 0);
        let man = eq.components.find("Man", Some(PlayerId::new(0))).unwrap();
        state.put(SiteType::Cell, Site(4), Piece::new(man, Some(PlayerId::new(0))), 1);
        let mut ctx = Context::new(&eq, &mut state);

        let rule = RuleNode::from(ForEachPiece::new(Step::new(Directions::Orthogonal)));
        let moves = rule.evaluate(&mut ctx);
        assert_eq!(moves.len(), 4);
        assert!(rule.can_move(&mut ctx));
        for to in [1, 3, 5, 7] {
            assert!(rule.can_move_to(&mut ctx, Site(to)));
        }
        assert!(!rule.can_move_to(&mut ctx, Site(0)));
    }

    #[test]
    fn test_then_is_recorded_not_fired() {
        let eq = equipment();
        let mut state = GameState::new(&eq, 0);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(Add::piece(PieceRef::named("Man"))).then(MoveAgain::default());
        let moves = rule.evaluate(&mut ctx);
        assert_eq!(moves.len(), 9);
        assert!(moves.iter().all(|m| m.then.len() == 1 && m.decision));
        assert!(!ctx.state().move_again());
        assert!(ctx.state().is_empty(SiteType::Cell, Site(0)));
    }

    #[test]
    fn test_static_info_folds_children() {
        let rule = RuleNode::from(ForEachPiece::new(
            Step::new(Directions::Orthogonal).with_to_effect(Remove::at(RegionFn::Site(SiteFn::To))),
        ));
        let info = rule.info();
        assert!(info.concepts.contains(Concept::Step));
        assert!(info.concepts.contains(Concept::Removal));
        assert!(info.concepts.contains(Concept::ForEachPiece));
        assert!(!info.is_static);
        // The step binds `to` for its effect and ForEachPiece binds `from`.
        assert!(info.reads.is_empty());
        assert!(info.writes.contains(EnvField::From));
    }

    #[test]
    fn test_preprocess_stores_info_and_serde_round_trip() {
        let eq = equipment();
        let mut strings = StringTable::new();
        let mut rule = RuleNode::from(Or::new([
            RuleNode::from(Pass::default()),
            RuleNode::from(Message::vote("draw")),
        ]));
        rule.preprocess(&eq, &mut strings);
        assert_eq!(strings.lookup("draw"), Some(crate::game::StringId(0)));
        assert!(rule.declared_concepts().contains(Concept::Vote));

        let json = serde_json::to_string(&rule).unwrap();
        let back: RuleNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back.rule.name(), "Or");
        assert_eq!(back.declared_concepts(), rule.declared_concepts());
    }

    #[test]
    fn test_validation_passes_walk_the_tree() {
        let eq = equipment();
        let mut report = Report::new();
        let rule = RuleNode::from(Or::new([
            RuleNode::from(Add::piece(PieceRef::named("Queen"))),
            RuleNode::from(Sow::default()),
        ]));
        assert!(rule.missing_requirement(&eq, &mut report));
        assert_eq!(report.len(), 2);
        assert!(!rule.will_crash(&eq, &mut report));
    }
}
