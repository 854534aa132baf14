//! Boolean conditions.
//!
//! Conditions gate movement (a step's "go" test, a hop's hurdle test) and
//! select capture targets. Tests on undefined or off-board sites are false.

use serde::{Deserialize, Serialize};

use super::int::IntFn;
use super::region::RegionFn;
use super::site::SiteFn;
use super::who::Who;
use crate::components::PieceRef;
use crate::context::{Context, EnvFields};
use crate::rules::RuleNode;

/// A condition evaluated against the current position and scratch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BoolFn {
    // === Constants ===

    True,
    False,

    // === Site tests ===

    /// The site exists and holds nothing.
    IsEmpty(SiteFn),

    /// The site exists and holds something.
    IsOccupied(SiteFn),

    /// The top piece belongs to the mover.
    IsFriend(SiteFn),

    /// The top piece belongs to another player.
    IsEnemy(SiteFn),

    /// The top piece belongs to a role.
    IsOwnedBy { site: SiteFn, who: Who },

    /// The top piece is a given component.
    IsPiece { site: SiteFn, piece: PieceRef },

    /// The site lies in a region.
    IsIn { site: SiteFn, region: RegionFn },

    // === Comparisons ===

    Eq(IntFn, IntFn),
    Ne(IntFn, IntFn),
    Lt(IntFn, IntFn),
    Le(IntFn, IntFn),
    Gt(IntFn, IntFn),
    Ge(IntFn, IntFn),

    // === Combinators ===

    /// Condition must be false.
    Not(Box<BoolFn>),

    /// All conditions must be true.
    All(Vec<BoolFn>),

    /// At least one condition must be true.
    Any(Vec<BoolFn>),

    // === Moves ===

    /// The rule produces at least one move.
    CanMove(Box<RuleNode>),

    /// The previous move asked for another move by the same player.
    Continuing,
}

impl BoolFn {
    pub fn is_empty(site: SiteFn) -> Self {
        Self::IsEmpty(site)
    }

    pub fn is_friend(site: SiteFn) -> Self {
        Self::IsFriend(site)
    }

    pub fn is_enemy(site: SiteFn) -> Self {
        Self::IsEnemy(site)
    }

    pub fn is_piece(site: SiteFn, piece: PieceRef) -> Self {
        Self::IsPiece { site, piece }
    }

    pub fn is_in(site: SiteFn, region: RegionFn) -> Self {
        Self::IsIn { site, region }
    }

    /// Whether the rule can produce a move.
    pub fn can_move(rule: impl Into<RuleNode>) -> Self {
        Self::CanMove(Box::new(rule.into()))
    }

    /// Create an AND condition.
    pub fn all(conditions: impl IntoIterator<Item = BoolFn>) -> Self {
        Self::All(conditions.into_iter().collect())
    }

    /// Create an OR condition.
    pub fn any(conditions: impl IntoIterator<Item = BoolFn>) -> Self {
        Self::Any(conditions.into_iter().collect())
    }

    /// Negate this condition.
    pub fn negate(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    /// Add another condition with AND.
    pub fn and(self, other: BoolFn) -> Self {
        match self {
            Self::All(mut conditions) => {
                conditions.push(other);
                Self::All(conditions)
            }
            _ => Self::All(vec![self, other]),
        }
    }

    /// Add another condition with OR.
    pub fn or(self, other: BoolFn) -> Self {
        match self {
            Self::Any(mut conditions) => {
                conditions.push(other);
                Self::Any(conditions)
            }
            _ => Self::Any(vec![self, other]),
        }
    }

    /// Evaluate the condition.
    pub fn eval(&self, ctx: &mut Context<'_>) -> bool {
        let st = ctx.site_type();
        match self {
            Self::True => true,
            Self::False => false,

            Self::IsEmpty(site) => site.eval(ctx).is_some_and(|s| ctx.state().is_empty(st, s)),
            Self::IsOccupied(site) => site
                .eval(ctx)
                .and_then(|s| ctx.state().slot(st, s))
                .is_some_and(|slot| !slot.is_empty()),
            Self::IsFriend(site) => {
                let mover = ctx.mover();
                owner(ctx, site).is_some_and(|o| o == mover)
            }
            Self::IsEnemy(site) => {
                let mover = ctx.mover();
                owner(ctx, site).is_some_and(|o| o != mover)
            }
            Self::IsOwnedBy { site, who } => {
                let Some(s) = site.eval(ctx) else {
                    return false;
                };
                let state = ctx.state();
                state.slot(st, s).is_some_and(|slot| !slot.is_empty())
                    && who.matches(state.who(st, s, ctx.level()), ctx.mover(), state.player_count())
            }
            Self::IsPiece { site, piece } => site
                .eval(ctx)
                .and_then(|s| ctx.state().what(st, s, ctx.level()))
                .is_some_and(|what| piece.matches(ctx.components(), what)),
            Self::IsIn { site, region } => {
                site.eval(ctx).is_some_and(|s| region.contains(ctx, s))
            }

            Self::Eq(a, b) => a.eval(ctx) == b.eval(ctx),
            Self::Ne(a, b) => a.eval(ctx) != b.eval(ctx),
            Self::Lt(a, b) => a.eval(ctx) < b.eval(ctx),
            Self::Le(a, b) => a.eval(ctx) <= b.eval(ctx),
            Self::Gt(a, b) => a.eval(ctx) > b.eval(ctx),
            Self::Ge(a, b) => a.eval(ctx) >= b.eval(ctx),

            Self::Not(inner) => !inner.eval(ctx),
            Self::All(conditions) => conditions.iter().all(|c| c.eval(ctx)),
            Self::Any(conditions) => conditions.iter().any(|c| c.eval(ctx)),

            Self::CanMove(rule) => rule.can_move(ctx),
            Self::Continuing => ctx.state().move_again(),
        }
    }

    /// Scratch fields read.
    #[must_use]
    pub fn reads(&self) -> EnvFields {
        match self {
            Self::True | Self::False | Self::Continuing => EnvFields::EMPTY,
            Self::IsEmpty(s)
            | Self::IsOccupied(s)
            | Self::IsFriend(s)
            | Self::IsEnemy(s)
            | Self::IsOwnedBy { site: s, .. }
            | Self::IsPiece { site: s, .. } => s.reads(),
            Self::IsIn { site, region } => site.reads() | region.reads(),
            Self::Eq(a, b)
            | Self::Ne(a, b)
            | Self::Lt(a, b)
            | Self::Le(a, b)
            | Self::Gt(a, b)
            | Self::Ge(a, b) => a.reads() | b.reads(),
            Self::Not(inner) => inner.reads(),
            Self::All(cs) | Self::Any(cs) => cs.iter().fold(EnvFields::EMPTY, |acc, c| acc | c.reads()),
            Self::CanMove(rule) => rule.reads_env_fields(),
        }
    }

    /// Whether the result is the same in every position and scratch.
    #[must_use]
    pub fn is_static(&self) -> bool {
        match self {
            Self::True | Self::False => true,
            Self::Eq(a, b)
            | Self::Ne(a, b)
            | Self::Lt(a, b)
            | Self::Le(a, b)
            | Self::Gt(a, b)
            | Self::Ge(a, b) => a.is_static() && b.is_static(),
            Self::Not(inner) => inner.is_static(),
            Self::All(cs) | Self::Any(cs) => cs.iter().all(BoolFn::is_static),
            _ => false,
        }
    }

    /// Rule trees nested in this condition.
    pub(crate) fn rules(&self) -> Vec<&RuleNode> {
        let mut out = Vec::new();
        self.collect_rules(&mut out);
        out
    }

    fn collect_rules<'r>(&'r self, out: &mut Vec<&'r RuleNode>) {
        match self {
            Self::CanMove(rule) => out.push(rule),
            Self::Not(inner) => inner.collect_rules(out),
            Self::All(cs) | Self::Any(cs) => cs.iter().for_each(|c| c.collect_rules(out)),
            _ => {}
        }
    }

    /// Mutable access to nested rule trees, for the compile pass.
    pub(crate) fn rules_mut(&mut self) -> Vec<&mut RuleNode> {
        let mut out = Vec::new();
        self.collect_rules_mut(&mut out);
        out
    }

    fn collect_rules_mut<'r>(&'r mut self, out: &mut Vec<&'r mut RuleNode>) {
        match self {
            Self::CanMove(rule) => out.push(rule),
            Self::Not(inner) => inner.collect_rules_mut(out),
            Self::All(cs) | Self::Any(cs) => cs.iter_mut().for_each(|c| c.collect_rules_mut(out)),
            _ => {}
        }
    }
}

impl Default for BoolFn {
    fn default() -> Self {
        Self::True
    }
}

fn owner(ctx: &Context<'_>, site: &SiteFn) -> Option<crate::core::PlayerId> {
    let s = site.eval(ctx)?;
    ctx.state().who(ctx.site_type(), s, ctx.level())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Component, ComponentRegistry};
    use crate::core::{GameConfig, PlayerId, Site, SiteType};
    use crate::game::Equipment;
    use crate::state::{GameState, Piece};
    use crate::topology::Topology;

    fn setup() -> (Equipment, GameState) {
        let mut components = ComponentRegistry::new();
        components.register_per_player("Man", 2).unwrap();
        components.register(Component::piece("Wall", None)).unwrap();
        let eq = Equipment::new(GameConfig::new(2), Topology::square(3, 3), components);
        let mut state = GameState::new(&eq, 0);
        let man = |p: u8| {
            let id = eq.components.find("Man", Some(PlayerId::new(p))).unwrap();
            Piece::new(id, Some(PlayerId::new(p)))
        };
        state.put(SiteType::Cell, Site(0), man(0), 1);
        state.put(SiteType::Cell, Site(1), man(1), 1);
        let wall = eq.components.find("Wall", None).unwrap();
        state.put(SiteType::Cell, Site(2), Piece::new(wall, None), 1);
        (eq, state)
    }

    fn at(site: u32) -> SiteFn {
        SiteFn::Const(Site(site))
    }

    #[test]
    fn test_ownership_tests() {
        let (eq, mut state) = setup();
        let mut ctx = Context::new(&eq, &mut state);

        assert!(BoolFn::is_friend(at(0)).eval(&mut ctx));
        assert!(BoolFn::is_enemy(at(1)).eval(&mut ctx));
        // Neutral pieces are neither friend nor enemy.
        assert!(!BoolFn::is_enemy(at(2)).eval(&mut ctx));
        assert!(!BoolFn::is_friend(at(2)).eval(&mut ctx));
        assert!(BoolFn::IsOwnedBy { site: at(2), who: Who::Neutral }.eval(&mut ctx));
        assert!(!BoolFn::IsOwnedBy { site: at(5), who: Who::Neutral }.eval(&mut ctx));
        assert!(BoolFn::is_piece(at(1), PieceRef::named("Man")).eval(&mut ctx));
        assert!(!BoolFn::is_piece(at(2), PieceRef::named("Man")).eval(&mut ctx));
    }

    #[test]
    fn test_undefined_sites_are_false() {
        let (eq, mut state) = setup();
        let mut ctx = Context::new(&eq, &mut state);
        for cond in [
            BoolFn::is_empty(SiteFn::To),
            BoolFn::IsOccupied(SiteFn::To),
            BoolFn::is_enemy(SiteFn::Between),
            BoolFn::is_empty(at(99)),
            BoolFn::is_in(SiteFn::To, RegionFn::All),
        ] {
            assert!(!cond.eval(&mut ctx), "{cond:?}");
        }
        assert!(BoolFn::is_empty(at(99)).negate().eval(&mut ctx));
    }

    #[test]
    fn test_combinators() {
        let (eq, mut state) = setup();
        let mut ctx = Context::new(&eq, &mut state);
        let c = BoolFn::is_empty(at(4)).and(BoolFn::is_friend(at(0)));
        assert!(c.eval(&mut ctx));
        let d = BoolFn::False.or(BoolFn::Gt(IntFn::Count(at(0)), IntFn::Const(0)));
        assert!(d.eval(&mut ctx));
        assert!(!BoolFn::all([BoolFn::True, BoolFn::False]).eval(&mut ctx));
        assert!(BoolFn::any([BoolFn::False, BoolFn::True]).is_static());
        assert!(!c.is_static());
        assert_eq!(BoolFn::True.negate().negate().reads(), EnvFields::EMPTY);
    }
}
