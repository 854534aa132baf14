//! Helpers shared by directional and capture nodes.

use smallvec::SmallVec;

use super::RuleNode;
use crate::components::PieceRef;
use crate::context::{Context, EnvFields};
use crate::core::{Site, SiteType};
use crate::functions::{BoolFn, IntFn, SiteFn};
use crate::moves::{combine, Action, LevelRange, Move, MoveList};
use crate::state::Piece;
use crate::topology::{Compass, DirectionList, Directions, Graph};

/// Sites a predicate or effect is evaluated at. `None` leaves the field as
/// the caller had it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct At {
    pub from: Option<Site>,
    pub to: Option<Site>,
    pub between: Option<Site>,
}

impl At {
    /// `from` and `to` bound.
    pub(crate) fn to(from: Site, to: Site) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            between: None,
        }
    }

    /// `from` and `between` bound.
    pub(crate) fn between(from: Site, between: Site) -> Self {
        Self {
            from: Some(from),
            to: None,
            between: Some(between),
        }
    }

    /// Only `to` bound.
    pub(crate) fn to_only(to: Site) -> Self {
        Self {
            to: Some(to),
            ..Self::default()
        }
    }

    /// Only `between` bound.
    pub(crate) fn between_only(between: Site) -> Self {
        Self {
            between: Some(between),
            ..Self::default()
        }
    }
}

/// Run `f` with the sites of `at` bound, restoring them afterwards.
pub(crate) fn bind<R>(ctx: &mut Context<'_>, at: At, f: impl FnOnce(&mut Context<'_>) -> R) -> R {
    let mut scope = ctx.scope();
    if at.from.is_some() {
        scope.set_from(at.from);
    }
    if at.to.is_some() {
        scope.set_to(at.to);
    }
    if at.between.is_some() {
        scope.set_between(at.between);
    }
    f(&mut *scope)
}

/// Evaluate a condition with sites bound.
pub(crate) fn holds(ctx: &mut Context<'_>, cond: &BoolFn, at: At) -> bool {
    bind(ctx, at, |c| cond.eval(c))
}

/// Evaluate an effect subtree with sites bound.
pub(crate) fn effects_at(ctx: &mut Context<'_>, node: &RuleNode, at: At) -> MoveList {
    bind(ctx, at, |c| node.evaluate(c))
}

/// Evaluate an effect at each captured site (bound to `between`) and fold
/// everything into one move.
pub(crate) fn capture_all(ctx: &mut Context<'_>, effect: &RuleNode, sites: &[Site]) -> Option<Move> {
    let mut all = MoveList::new();
    for &site in sites {
        all.extend(effects_at(ctx, effect, At::between_only(site)));
    }
    combine(&all).map(|mut mv| {
        mv.between = sites.iter().copied().collect();
        mv
    })
}

/// Stack level a node acts on: `level` when given, else the bound level.
/// Always `None` (the top) outside stacking games.
pub(crate) fn level_at(ctx: &Context<'_>, level: Option<&IntFn>) -> Option<usize> {
    if !ctx.state().is_stacking() {
        return None;
    }
    match level {
        Some(f) => usize::try_from(f.eval(ctx)).ok(),
        None => ctx.level(),
    }
}

/// Fields read by an explicit stack level.
pub(crate) fn level_reads(level: Option<&IntFn>) -> EnvFields {
    level.map_or(EnvFields::EMPTY, IntFn::reads)
}

/// A resolved starting site on the board.
pub(crate) struct Origin<'a> {
    pub site: Site,
    pub site_type: SiteType,
    pub graph: &'a Graph,
    pub facing: Compass,
    /// Stack level moved from; the top for `None`.
    pub level: Option<usize>,
}

impl<'a> Origin<'a> {
    /// Resolve `site` against the context's element kind. `None` when the
    /// site is undefined or off the board.
    pub(crate) fn resolve(ctx: &Context<'a>, site: &SiteFn) -> Option<Self> {
        Self::resolve_at(ctx, site, None)
    }

    /// Like [`Origin::resolve`], moving from an explicit stack level.
    pub(crate) fn resolve_at(ctx: &Context<'a>, site: &SiteFn, level: Option<&IntFn>) -> Option<Self> {
        let level = level_at(ctx, level);
        let site = site.eval(ctx)?;
        let site_type = ctx.site_type();
        let graph = ctx.graph(site_type)?;
        if !graph.contains(site) {
            return None;
        }
        Some(Self {
            site,
            site_type,
            graph,
            facing: ctx.facing_at(site_type, site),
            level,
        })
    }

    pub(crate) fn directions(&self, directions: &Directions) -> DirectionList {
        directions.resolve(self.facing)
    }

    pub(crate) fn radial(&self, dir: Compass) -> &'a [Site] {
        self.graph.radial(self.site, dir)
    }

    /// Move the piece (or stack) at the origin's level to `to`.
    pub(crate) fn move_to(&self, to: Site, stack: bool) -> Move {
        let action = Action::move_piece(self.site_type, self.site, to, stack).at_level(self.level);
        let mv = Move::new(vec![action])
            .with_from(self.site)
            .with_to(to)
            .with_site_type(self.site_type);
        match self.level {
            Some(level) => mv.with_levels(LevelRange::at(level)),
            None => mv,
        }
    }
}

/// Resolve a piece reference to a concrete piece for the mover.
pub(crate) fn resolve_piece(ctx: &Context<'_>, piece: &PieceRef) -> Option<Piece> {
    let registry = ctx.components();
    let id = piece.resolve(registry, ctx.mover())?;
    let owner = registry.get(id)?.owner;
    Some(Piece::new(id, owner))
}

/// Sites of a contiguous run from the start of `ray` satisfying `cond`
/// (bound to `between`), up to `max` long.
pub(crate) fn run_of(
    ctx: &mut Context<'_>,
    from: Site,
    ray: &[Site],
    cond: &BoolFn,
    max: usize,
) -> SmallVec<[Site; 4]> {
    let mut run = SmallVec::new();
    for &site in ray.iter().take(max) {
        if !holds(ctx, cond, At::between(from, site)) {
            break;
        }
        run.push(site);
    }
    run
}
