//! Integer-valued functions.

use serde::{Deserialize, Serialize};

use super::region::RegionFn;
use super::site::SiteFn;
use super::who::Who;
use crate::context::{Context, EnvField, EnvFields};

/// Expression producing an integer.
///
/// Reads on undefined or missing sites yield 0.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntFn {
    // === Constants and scratch ===

    Const(i64),

    /// The `value` scratch field (0 when unset).
    Value,

    /// The `level` scratch field (0 when unset).
    Level,

    /// Index of the mover.
    Mover,

    /// Index of the next player.
    Next,

    // === Site reads ===

    /// Units on a site.
    Count(SiteFn),

    /// Stack height on a site.
    StackSize(SiteFn),

    /// Local state of the top piece.
    StateAt(SiteFn),

    /// Rotation of the top piece.
    RotationAt(SiteFn),

    /// Value of the top piece.
    ValueAt(SiteFn),

    /// Number of sites in a region.
    Size(Box<RegionFn>),

    // === Dice and stakes ===

    /// Face value of one die.
    Die(usize),

    /// Sum of all dice.
    DiceSum,

    /// Total staked.
    Pot,

    /// Amount staked by a player.
    Bet(Who),

    // === Arithmetic ===

    Add(Box<IntFn>, Box<IntFn>),
    Sub(Box<IntFn>, Box<IntFn>),
    Mul(Box<IntFn>, Box<IntFn>),
}

impl IntFn {
    pub fn add(a: IntFn, b: IntFn) -> Self {
        IntFn::Add(Box::new(a), Box::new(b))
    }

    pub fn sub(a: IntFn, b: IntFn) -> Self {
        IntFn::Sub(Box::new(a), Box::new(b))
    }

    pub fn mul(a: IntFn, b: IntFn) -> Self {
        IntFn::Mul(Box::new(a), Box::new(b))
    }

    /// Number of sites in a region.
    pub fn size(region: RegionFn) -> Self {
        IntFn::Size(Box::new(region))
    }

    #[must_use]
    pub fn eval(&self, ctx: &Context<'_>) -> i64 {
        let state = ctx.state();
        let st = ctx.site_type();
        let at = |site: &SiteFn| site.eval(ctx);
        match self {
            IntFn::Const(v) => *v,
            IntFn::Value => ctx.value().unwrap_or(0),
            IntFn::Level => ctx.level().map_or(0, |l| l as i64),
            IntFn::Mover => ctx.mover().index() as i64,
            IntFn::Next => state.next_player().index() as i64,
            IntFn::Count(site) => at(site).map_or(0, |s| i64::from(state.count(st, s))),
            IntFn::StackSize(site) => at(site).map_or(0, |s| state.stack_size(st, s) as i64),
            IntFn::StateAt(site) => at(site).map_or(0, |s| i64::from(state.state_at(st, s, ctx.level()))),
            IntFn::RotationAt(site) => {
                at(site).map_or(0, |s| i64::from(state.rotation_at(st, s, ctx.level())))
            }
            IntFn::ValueAt(site) => at(site).map_or(0, |s| state.value_at(st, s, ctx.level())),
            IntFn::Size(region) => region.eval(ctx).len() as i64,
            IntFn::Die(i) => state.dice().get(*i).map_or(0, |&d| i64::from(d)),
            IntFn::DiceSum => state.dice().iter().map(|&d| i64::from(d)).sum(),
            IntFn::Pot => state.pot(),
            IntFn::Bet(who) => who
                .resolve(ctx.mover(), state.player_count())
                .map_or(0, |p| state.bet(p)),
            IntFn::Add(a, b) => a.eval(ctx).saturating_add(b.eval(ctx)),
            IntFn::Sub(a, b) => a.eval(ctx).saturating_sub(b.eval(ctx)),
            IntFn::Mul(a, b) => a.eval(ctx).saturating_mul(b.eval(ctx)),
        }
    }

    /// Scratch fields read.
    #[must_use]
    pub fn reads(&self) -> EnvFields {
        match self {
            IntFn::Value => EnvFields::of(EnvField::Value),
            IntFn::Level => EnvFields::of(EnvField::Level),
            IntFn::Count(s) | IntFn::StackSize(s) => s.reads(),
            IntFn::StateAt(s) | IntFn::RotationAt(s) | IntFn::ValueAt(s) => {
                s.reads().with(EnvField::Level)
            }
            IntFn::Size(region) => region.reads(),
            IntFn::Add(a, b) | IntFn::Sub(a, b) | IntFn::Mul(a, b) => a.reads() | b.reads(),
            _ => EnvFields::EMPTY,
        }
    }

    /// Whether the result is the same in every position and scratch.
    #[must_use]
    pub fn is_static(&self) -> bool {
        match self {
            IntFn::Const(_) => true,
            IntFn::Add(a, b) | IntFn::Sub(a, b) | IntFn::Mul(a, b) => a.is_static() && b.is_static(),
            _ => false,
        }
    }
}

impl From<i64> for IntFn {
    fn from(v: i64) -> Self {
        IntFn::Const(v)
    }
}
