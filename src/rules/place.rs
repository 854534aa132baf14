//! Placement and piece nodes.
//!
//! [`Add`] is the placement decision and the only node with an action
//! cache: with static parameters, the move placing a given piece on a given
//! site is built once and handed out again on every later evaluation.

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::emitter::Emitter;
use super::walk::{bind, effects_at, holds, level_at, level_reads, At};
use super::{Concept, GameFlags, NodeKind, Report, RuleNode, StaticInfo};
use crate::components::{ComponentId, PieceRef};
use crate::context::{Context, EnvField, EnvFields};
use crate::core::{PlayerId, Site, SiteType};
use crate::functions::{BoolFn, IntFn, RegionFn, SiteFn};
use crate::game::{Equipment, StringTable};
use crate::moves::{with_effects_before, Action, ActionCache, CacheDims, CacheKey, LevelRange, Move};
use crate::state::Piece;

fn report_unknown(equipment: &Equipment, node: &'static str, piece: &PieceRef, report: &mut Report) {
    match piece {
        PieceRef::Named(name) if !equipment.components.has_name(name) => {
            report.missing(node, format!("piece {name} is not defined"));
        }
        PieceRef::Id(id) if equipment.components.get(*id).is_none() => {
            report.missing(node, format!("component {id} is not defined"));
        }
        _ => {}
    }
}

fn unit_count(count: Option<&IntFn>, ctx: &Context<'_>) -> Option<Option<u32>> {
    match count {
        None => Some(None),
        Some(f) => u32::try_from(f.eval(ctx)).ok().filter(|&n| n > 0).map(Some),
    }
}

// =============================================================================
// Add
// =============================================================================

/// Place a piece on each site of a region.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Add {
    /// `None` places any of the mover's pieces.
    pub piece: Option<PieceRef>,
    pub to: RegionFn,
    pub count: IntFn,
    /// Local state given to the placed piece.
    pub state: Option<IntFn>,
    /// Element kind; the game default when unset.
    pub site_type: Option<SiteType>,
    /// Evaluated at the destination; its actions precede the placement.
    pub to_effect: Option<Box<RuleNode>>,
    pub stack: bool,
    /// Stack level to insert at; the bound level, else the top, when unset.
    #[serde(default)]
    pub level: Option<IntFn>,
    pub decision: bool,
    #[serde(skip)]
    cache: ActionCache,
}

impl Add {
    /// Place `piece` on any empty site.
    #[must_use]
    pub fn piece(piece: PieceRef) -> Self {
        Self {
            piece: Some(piece),
            ..Self::any()
        }
    }

    /// Place any of the mover's pieces on any empty site.
    #[must_use]
    pub fn any() -> Self {
        Self {
            piece: None,
            to: RegionFn::Empty,
            count: IntFn::Const(1),
            state: None,
            site_type: None,
            to_effect: None,
            stack: false,
            level: None,
            decision: true,
            cache: ActionCache::new(),
        }
    }

    #[must_use]
    pub fn to(mut self, region: RegionFn) -> Self {
        self.to = region;
        self
    }

    #[must_use]
    pub fn count(mut self, count: IntFn) -> Self {
        self.count = count;
        self
    }

    #[must_use]
    pub fn with_state(mut self, state: IntFn) -> Self {
        self.state = Some(state);
        self
    }

    #[must_use]
    pub fn on(mut self, site_type: SiteType) -> Self {
        self.site_type = Some(site_type);
        self
    }

    #[must_use]
    pub fn with_to_effect(mut self, effect: impl Into<RuleNode>) -> Self {
        self.to_effect = Some(Box::new(effect.into()));
        self
    }

    /// Place on top of existing stacks.
    #[must_use]
    pub fn stack(mut self) -> Self {
        self.stack = true;
        self
    }

    /// Insert at this stack level.
    #[must_use]
    pub fn at_level(mut self, level: IntFn) -> Self {
        self.level = Some(level);
        self
    }

    /// Make the placement a consequence rather than a decision.
    #[must_use]
    pub fn effect(mut self) -> Self {
        self.decision = false;
        self
    }

    /// The action cache, for inspection.
    #[must_use]
    pub fn cache(&self) -> &ActionCache {
        &self.cache
    }

    fn components(&self, ctx: &Context<'_>) -> SmallVec<[ComponentId; 4]> {
        let registry = ctx.components();
        match &self.piece {
            Some(piece) => piece.resolve(registry, ctx.mover()).into_iter().collect(),
            None => registry.pieces_of(ctx.mover()).map(|c| c.id).collect(),
        }
    }

    fn cacheable(&self, equipment: &Equipment) -> bool {
        let config = &equipment.config;
        config.use_action_cache
            && !config.stacking
            && !self.stack
            && self.to_effect.is_none()
            && self.count.is_static()
            && self.state.as_ref().map_or(true, IntFn::is_static)
    }
}

impl NodeKind for Add {
    const NAME: &'static str = "Add";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let st = self.site_type.unwrap_or(ctx.site_type());
        let mut scope = ctx.scope();
        scope.set_site_type(st);
        let ctx = &mut *scope;

        let Ok(count) = u32::try_from(self.count.eval(ctx)) else {
            return ControlFlow::Continue(());
        };
        if count == 0 {
            return ControlFlow::Continue(());
        }
        let state = self
            .state
            .as_ref()
            .map(|f| i32::try_from(f.eval(ctx)).unwrap_or(i32::MAX));
        let mover = ctx.mover();
        let level = level_at(ctx, self.level.as_ref());
        let sites = self.to.eval(ctx);

        for what in self.components(ctx) {
            let owner = ctx.components().get(what).and_then(|c| c.owner);
            let mut piece = Piece::new(what, owner);
            if let Some(state) = state {
                piece = piece.with_state(state);
            }
            for &site in &sites {
                let build = || {
                    Move::new(vec![Action::Add {
                        site_type: st,
                        site,
                        piece,
                        count,
                        level,
                    }])
                    .with_to(site)
                    .with_site_type(st)
                };
                if let Some(effect) = &self.to_effect {
                    let effects = effects_at(ctx, effect, At::to_only(site));
                    for mv in with_effects_before(&build(), &effects) {
                        out.emit(mv)?;
                    }
                } else if self.cache.is_enabled() {
                    let key = CacheKey {
                        mover,
                        component: what,
                        state: state.unwrap_or(-1),
                        site,
                    };
                    let mv = self.cache.get_or_insert_with(key, || out.finish(build()));
                    out.emit_finished(mv)?;
                } else {
                    out.emit(build())?;
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn own_info(&self) -> StaticInfo {
        let mut info = StaticInfo::dynamic(Concept::Placement)
            .reading(self.to.reads() | self.count.reads() | level_reads(self.level.as_ref()))
            .writing(EnvFields::of(EnvField::To));
        if let Some(state) = &self.state {
            info = info.reading(state.reads()).with_flags(GameFlags::PIECE_STATE);
        }
        if self.stack {
            info = info.with_flags(GameFlags::STACKING);
        }
        info
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

    fn preprocess(&mut self, equipment: &Equipment, _strings: &mut StringTable) {
        let config = &equipment.config;
        let st = *self.site_type.get_or_insert(config.default_site_type);
        self.cache = if self.cacheable(equipment) {
            let dims = CacheDims {
                players: config.player_count,
                components: equipment.components.len(),
                states: usize::try_from(config.max_state.saturating_add(2)).unwrap_or(1),
                sites: equipment.topology.num_sites(st),
            };
            ActionCache::allocate(dims, config.max_cache_slots)
        } else {
            ActionCache::new()
        };
    }

    fn missing_requirement(&self, equipment: &Equipment, report: &mut Report) {
        match &self.piece {
            Some(piece) => report_unknown(equipment, Self::NAME, piece, report),
            None => {
                for player in PlayerId::all(equipment.config.player_count) {
                    if equipment.components.pieces_of(player).next().is_none() {
                        report.missing(
                            Self::NAME,
                            format!("piece of the mover added but player {player} has no piece"),
                        );
                    }
                }
            }
        }
    }

    fn disable_cache(&self) {
        self.cache.disable();
    }

    fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

// =============================================================================
// Remove
// =============================================================================

/// Remove pieces from the occupied sites of a region.
///
/// As an effect (the default) all sites go into one move; as a decision
/// each site is its own move.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Remove {
    pub region: RegionFn,
    /// Units to remove from a pile; everything when unset.
    pub count: Option<IntFn>,
    pub stack: bool,
    /// Stack level removed; the bound level, else the top, when unset.
    #[serde(default)]
    pub level: Option<IntFn>,
    pub site_type: Option<SiteType>,
    pub decision: bool,
}

impl Remove {
    #[must_use]
    pub fn at(region: RegionFn) -> Self {
        Self {
            region,
            count: None,
            stack: false,
            level: None,
            site_type: None,
            decision: false,
        }
    }

    #[must_use]
    pub fn count(mut self, count: IntFn) -> Self {
        self.count = Some(count);
        self
    }

    /// Remove whole stacks.
    #[must_use]
    pub fn stack(mut self) -> Self {
        self.stack = true;
        self
    }

    /// Remove the piece at this stack level.
    #[must_use]
    pub fn at_level(mut self, level: IntFn) -> Self {
        self.level = Some(level);
        self
    }

    #[must_use]
    pub fn decision(mut self) -> Self {
        self.decision = true;
        self
    }
}

impl NodeKind for Remove {
    const NAME: &'static str = "Remove";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let st = self.site_type.unwrap_or(ctx.site_type());
        let mut scope = ctx.scope();
        scope.set_site_type(st);
        let ctx = &mut *scope;

        let Some(count) = unit_count(self.count.as_ref(), ctx) else {
            return ControlFlow::Continue(());
        };
        let level = level_at(ctx, self.level.as_ref());
        let sites: Vec<Site> = self
            .region
            .eval(ctx)
            .into_iter()
            .filter(|&s| !ctx.state().is_empty(st, s))
            .collect();
        let action = |site| Action::Remove {
            site_type: st,
            site,
            level,
            count,
            stack: self.stack,
        };

        if self.decision {
            for &site in &sites {
                out.emit(Move::new(vec![action(site)]).with_to(site).with_site_type(st))?;
            }
            return ControlFlow::Continue(());
        }
        match sites.as_slice() {
            [] => ControlFlow::Continue(()),
            [site] => out.emit(Move::new(vec![action(*site)]).with_to(*site).with_site_type(st)),
            many => out.emit(Move::new(many.iter().map(|&s| action(s)).collect()).with_site_type(st)),
        }
    }

    fn own_info(&self) -> StaticInfo {
        let mut info = StaticInfo::dynamic(Concept::Removal)
            .reading(self.region.reads() | level_reads(self.level.as_ref()));
        if let Some(count) = &self.count {
            info = info.reading(count.reads());
        }
        info
    }

    fn is_decision(&self) -> bool {
        self.decision
    }

    fn preprocess(&mut self, equipment: &Equipment, _strings: &mut StringTable) {
        self.site_type.get_or_insert(equipment.config.default_site_type);
    }
}

// =============================================================================
// FromTo
// =============================================================================

/// Move a piece from any site of one region to any site of another.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FromTo {
    pub from: RegionFn,
    /// Evaluated with `from` bound.
    pub to: RegionFn,
    pub go: BoolFn,
    pub count: Option<IntFn>,
    pub stack: bool,
    /// Stack level moved from; the bound level, else the top, when unset.
    #[serde(default)]
    pub level: Option<IntFn>,
    pub to_effect: Option<Box<RuleNode>>,
    pub decision: bool,
}

impl FromTo {
    #[must_use]
    pub fn new(from: RegionFn, to: RegionFn) -> Self {
        Self {
            from,
            to,
            go: BoolFn::True,
            count: None,
            stack: false,
            level: None,
            to_effect: None,
            decision: true,
        }
    }

    #[must_use]
    pub fn with_go(mut self, go: BoolFn) -> Self {
        self.go = go;
        self
    }

    #[must_use]
    pub fn count(mut self, count: IntFn) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub fn with_to_effect(mut self, effect: impl Into<RuleNode>) -> Self {
        self.to_effect = Some(Box::new(effect.into()));
        self
    }

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

impl Default for FromTo {
    fn default() -> Self {
        Self::new(RegionFn::Site(SiteFn::From), RegionFn::Empty)
    }
}

impl NodeKind for FromTo {
    const NAME: &'static str = "FromTo";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let st = ctx.site_type();
        let Some(count) = unit_count(self.count.as_ref(), ctx) else {
            return ControlFlow::Continue(());
        };
        let level = level_at(ctx, self.level.as_ref());
        let origins: Vec<Site> = self
            .from
            .eval(ctx)
            .into_iter()
            .filter(|&s| !ctx.state().is_empty(st, s))
            .collect();
        for from in origins {
            let targets = bind(ctx, At { from: Some(from), ..At::default() }, |c| self.to.eval(c));
            for to in targets.into_iter().filter(|&t| t != from) {
                let at = At::to(from, to);
                if !holds(ctx, &self.go, at) {
                    continue;
                }
                let base = Move::new(vec![Action::Move {
                    from_type: st,
                    from,
                    level_from: level,
                    to_type: st,
                    to,
                    level_to: None,
                    count,
                    stack: self.stack,
                }])
                .with_from(from)
                .with_to(to)
                .with_site_type(st);
                let base = match level {
                    Some(l) => base.with_levels(LevelRange::at(l)),
                    None => base,
                };
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
        }
        ControlFlow::Continue(())
    }

    fn own_info(&self) -> StaticInfo {
        let mut info = StaticInfo::dynamic(Concept::FromTo)
            .reading(self.from.reads() | level_reads(self.level.as_ref()))
            .reading(self.to.reads().without(EnvFields::of(EnvField::From)))
            .writing(EnvFields::of(EnvField::From) | EnvField::To);
        if let Some(count) = &self.count {
            info = info.reading(count.reads());
        }
        info
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
}

// =============================================================================
// Flip / Promote / SetSite
// =============================================================================

/// Turn a flippable piece over.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Flip {
    pub site: SiteFn,
    /// Stack level flipped; the bound level, else the top, when unset.
    #[serde(default)]
    pub level: Option<IntFn>,
}

impl Flip {
    #[must_use]
    pub fn at(site: SiteFn) -> Self {
        Self { site, level: None }
    }

    /// Flip the piece at this stack level.
    #[must_use]
    pub fn at_level(mut self, level: IntFn) -> Self {
        self.level = Some(level);
        self
    }
}

impl Default for Flip {
    fn default() -> Self {
        Self::at(SiteFn::To)
    }
}

impl NodeKind for Flip {
    const NAME: &'static str = "Flip";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let st = ctx.site_type();
        let Some(site) = self.site.eval(ctx) else {
            return ControlFlow::Continue(());
        };
        let level = level_at(ctx, self.level.as_ref());
        let Some(piece) = ctx.state().piece(st, site, level) else {
            return ControlFlow::Continue(());
        };
        let Some(state) = ctx.components().get(piece.what).and_then(|c| c.flipped(piece.state)) else {
            return ControlFlow::Continue(());
        };
        out.emit(
            Move::new(vec![Action::SetState {
                site_type: st,
                site,
                level,
                state,
            }])
            .with_to(site)
            .with_site_type(st),
        )
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::dynamic(Concept::Flip)
            .reading(self.site.reads() | level_reads(self.level.as_ref()))
            .with_flags(GameFlags::PIECE_STATE)
    }

    fn missing_requirement(&self, equipment: &Equipment, report: &mut Report) {
        if equipment.components.iter().all(|c| c.flips.is_none()) {
            report.missing(Self::NAME, "no component can be flipped");
        }
    }
}

/// Replace the piece on a site by another component.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Promote {
    pub site: SiteFn,
    /// Resolved for the owner of the promoted piece.
    pub into: PieceRef,
}

impl Promote {
    #[must_use]
    pub fn new(site: SiteFn, into: PieceRef) -> Self {
        Self { site, into }
    }
}

impl NodeKind for Promote {
    const NAME: &'static str = "Promote";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let st = ctx.site_type();
        let Some(site) = self.site.eval(ctx) else {
            return ControlFlow::Continue(());
        };
        let level = level_at(ctx, None);
        let Some(piece) = ctx.state().piece(st, site, level) else {
            return ControlFlow::Continue(());
        };
        let registry = ctx.components();
        let owner = piece.who.unwrap_or(ctx.mover());
        let Some(what) = self.into.resolve(registry, owner) else {
            return ControlFlow::Continue(());
        };
        let who = registry.get(what).and_then(|c| c.owner);
        out.emit(
            Move::new(vec![Action::Promote {
                site_type: st,
                site,
                level,
                what,
                who,
            }])
            .with_to(site)
            .with_site_type(st),
        )
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::dynamic(Concept::Promotion).reading(self.site.reads())
    }

    fn missing_requirement(&self, equipment: &Equipment, report: &mut Report) {
        report_unknown(equipment, Self::NAME, &self.into, report);
    }
}

/// Per-piece property written by [`SetSite`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteProperty {
    State,
    Rotation,
    Value,
    Count,
}

/// Set a property of the piece on a site.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetSite {
    pub site: SiteFn,
    pub property: SiteProperty,
    pub value: IntFn,
}

impl SetSite {
    #[must_use]
    pub fn new(site: SiteFn, property: SiteProperty, value: IntFn) -> Self {
        Self {
            site,
            property,
            value,
        }
    }
}

impl NodeKind for SetSite {
    const NAME: &'static str = "SetSite";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let st = ctx.site_type();
        let Some(site) = self.site.eval(ctx) else {
            return ControlFlow::Continue(());
        };
        if ctx.state().is_empty(st, site) {
            return ControlFlow::Continue(());
        }
        let value = self.value.eval(ctx);
        let action = match self.property {
            SiteProperty::State => Action::SetState {
                site_type: st,
                site,
                level: ctx.level(),
                state: i32::try_from(value).unwrap_or(0),
            },
            SiteProperty::Rotation => Action::SetRotation {
                site_type: st,
                site,
                level: ctx.level(),
                rotation: value.rem_euclid(8) as u8,
            },
            SiteProperty::Value => Action::SetValue {
                site_type: st,
                site,
                level: ctx.level(),
                value,
            },
            SiteProperty::Count => {
                let Ok(count) = u32::try_from(value) else {
                    return ControlFlow::Continue(());
                };
                Action::SetCount {
                    site_type: st,
                    site,
                    count,
                }
            }
        };
        out.emit(Move::new(vec![action]).with_to(site).with_site_type(st))
    }

    fn own_info(&self) -> StaticInfo {
        let flags = match self.property {
            SiteProperty::State => GameFlags::PIECE_STATE,
            SiteProperty::Rotation => GameFlags::ROTATION,
            SiteProperty::Value => GameFlags::PIECE_VALUE,
            SiteProperty::Count => GameFlags::EMPTY,
        };
        StaticInfo::dynamic(Concept::SetSite)
            .reading(self.site.reads() | self.value.reads())
            .with_flags(flags)
    }
}

// =============================================================================
// Select
// =============================================================================

/// Choose a site, or a pair of sites. Changes nothing itself; continuations
/// see the choice as `from` and `to`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Select {
    pub from: RegionFn,
    /// Second site, evaluated with `from` bound.
    pub to: Option<RegionFn>,
    pub go: BoolFn,
    pub site_type: Option<SiteType>,
    pub decision: bool,
}

impl Select {
    #[must_use]
    pub fn new(from: RegionFn) -> Self {
        Self {
            from,
            to: None,
            go: BoolFn::True,
            site_type: None,
            decision: true,
        }
    }

    #[must_use]
    pub fn to(mut self, region: RegionFn) -> Self {
        self.to = Some(region);
        self
    }

    #[must_use]
    pub fn with_go(mut self, go: BoolFn) -> Self {
        self.go = go;
        self
    }
}

impl NodeKind for Select {
    const NAME: &'static str = "Select";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let st = self.site_type.unwrap_or(ctx.site_type());
        let mut scope = ctx.scope();
        scope.set_site_type(st);
        let ctx = &mut *scope;

        for from in self.from.eval(ctx) {
            let targets = match &self.to {
                None => vec![from],
                Some(region) => bind(ctx, At { from: Some(from), ..At::default() }, |c| region.eval(c)),
            };
            for to in targets {
                if !holds(ctx, &self.go, At::to(from, to)) {
                    continue;
                }
                let mut actions = vec![Action::Select { site_type: st, site: from }];
                if to != from {
                    actions.push(Action::Select { site_type: st, site: to });
                }
                out.emit(Move::new(actions).with_from(from).with_to(to).with_site_type(st))?;
            }
        }
        ControlFlow::Continue(())
    }

    fn own_info(&self) -> StaticInfo {
        let mut info = StaticInfo::dynamic(Concept::Select)
            .reading(self.from.reads())
            .writing(EnvFields::of(EnvField::From) | EnvField::To);
        if let Some(to) = &self.to {
            info = info.reading(to.reads().without(EnvFields::of(EnvField::From)));
        }
        info
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

    fn preprocess(&mut self, equipment: &Equipment, _strings: &mut StringTable) {
        self.site_type.get_or_insert(equipment.config.default_site_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Component, ComponentRegistry};
    use std::sync::Arc;

    use crate::core::GameConfig;
    use crate::rules::{Bind, Binding, Rule};
    use crate::state::GameState;
    use crate::topology::Topology;

    fn equipment(config: GameConfig) -> Equipment {
        let mut components = ComponentRegistry::new();
        components.register_per_player("Stone", 2).unwrap();
        components.register(Component::piece("Disc", None).with_flips(0, 1)).unwrap();
        components.register_per_player("King", 2).unwrap();
        Equipment::new(config, Topology::square(3, 3), components)
    }

    fn compiled(eq: &Equipment, node: impl Into<RuleNode>) -> RuleNode {
        let mut rule = node.into();
        rule.preprocess(eq, &mut StringTable::new());
        rule
    }

    fn p(i: u8) -> PlayerId {
        PlayerId::new(i)
    }

    #[test]
    fn test_add_any_mover_piece() {
        let eq = equipment(GameConfig::new(2));
        let mut state = GameState::new(&eq, 0);
        let mut ctx = Context::new(&eq, &mut state);
        // Stone and King for player 0, on nine empty sites.
        let moves = RuleNode::from(Add::any()).evaluate(&mut ctx);
        assert_eq!(moves.len(), 18);
        assert!(moves.iter().all(|m| m.decision && m.mover == p(0)));
    }

    #[test]
    fn test_add_cache_returns_same_move() {
        let eq = equipment(GameConfig::new(2));
        let rule = compiled(&eq, Add::piece(PieceRef::named("Stone")));
        let Rule::Add(add) = &rule.rule else { unreachable!() };
        assert!(add.cache().is_enabled());

        let mut state = GameState::new(&eq, 0);
        let first = rule.evaluate(&mut Context::new(&eq, &mut state));
        let second = rule.evaluate(&mut Context::new(&eq, &mut state));
        for (a, b) in first.shared().iter().zip(second.shared()) {
            assert!(Arc::ptr_eq(a, b));
        }
        // Distinct keys give distinct moves.
        assert!(!Arc::ptr_eq(&first.shared()[0], &first.shared()[1]));

        state.set_mover(p(1));
        let other = rule.evaluate(&mut Context::new(&eq, &mut state));
        assert!(!Arc::ptr_eq(&first.shared()[0], &other.shared()[0]));
        assert_eq!(other.get(0).unwrap().mover, p(1));
    }

    #[test]
    fn test_add_cache_disabled_when_stacking_or_dynamic() {
        let stacking = equipment(GameConfig::new(2).with_stacking());
        let rule = compiled(&stacking, Add::piece(PieceRef::named("Stone")));
        let Rule::Add(add) = &rule.rule else { unreachable!() };
        assert!(!add.cache().is_enabled());

        let eq = equipment(GameConfig::new(2));
        let rule = compiled(&eq, Add::piece(PieceRef::named("Stone")).count(IntFn::Mover));
        let Rule::Add(add) = &rule.rule else { unreachable!() };
        assert!(!add.cache().is_enabled());

        let rule = compiled(&eq, Add::piece(PieceRef::named("Stone")));
        rule.disable_cache();
        let Rule::Add(add) = &rule.rule else { unreachable!() };
        assert!(!add.cache().is_enabled());
        let mut state = GameState::new(&eq, 0);
        assert_eq!(rule.evaluate(&mut Context::new(&eq, &mut state)).len(), 9);
    }

    #[test]
    fn test_remove_effect_combines_sites() {
        let eq = equipment(GameConfig::new(2));
        let mut state = GameState::new(&eq, 0);
        let stone = Piece::new(eq.components.find("Stone", Some(p(1))).unwrap(), Some(p(1)));
        state.put(SiteType::Cell, Site(0), stone, 1);
        state.put(SiteType::Cell, Site(8), stone, 1);
        let mut ctx = Context::new(&eq, &mut state);

        let effect = RuleNode::from(Remove::at(RegionFn::Occupied)).evaluate(&mut ctx);
        assert_eq!(effect.len(), 1);
        assert_eq!(effect.get(0).unwrap().actions.len(), 2);
        assert!(!effect.get(0).unwrap().decision);

        let choice = RuleNode::from(Remove::at(RegionFn::Occupied).decision()).evaluate(&mut ctx);
        assert_eq!(choice.destinations(), vec![Site(0), Site(8)]);
    }

    #[test]
    fn test_from_to_binds_from_for_targets() {
        let eq = equipment(GameConfig::new(2));
        let mut state = GameState::new(&eq, 0);
        let stone = Piece::new(eq.components.find("Stone", Some(p(0))).unwrap(), Some(p(0)));
        state.put(SiteType::Cell, Site(4), stone, 1);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(FromTo::new(
            RegionFn::Site(SiteFn::Const(Site(4))),
            RegionFn::Neighbours {
                site: SiteFn::From,
                directions: crate::topology::Directions::Orthogonal,
            },
        ));
        assert_eq!(rule.evaluate(&mut ctx).destinations(), vec![Site(1), Site(3), Site(5), Site(7)]);
        assert_eq!(ctx.from(), None);
    }

    #[test]
    fn test_flip_promote_and_set_site() {
        let eq = equipment(GameConfig::new(2));
        let mut state = GameState::new(&eq, 0);
        let disc = Piece::new(eq.components.find("Disc", None).unwrap(), None);
        let stone = Piece::new(eq.components.find("Stone", Some(p(1))).unwrap(), Some(p(1)));
        state.put(SiteType::Cell, Site(0), disc, 1);
        state.put(SiteType::Cell, Site(1), stone, 1);
        let mut ctx = Context::new(&eq, &mut state);

        let flip = RuleNode::from(Flip::at(SiteFn::Const(Site(0)))).evaluate(&mut ctx);
        let mut after = ctx.state().clone();
        flip.get(0).unwrap().apply(&mut after);
        assert_eq!(after.state_at(SiteType::Cell, Site(0), None), 1);

        let promote = RuleNode::from(Promote::new(SiteFn::Const(Site(1)), PieceRef::named("King")));
        promote.evaluate(&mut ctx).get(0).unwrap().apply(&mut after);
        let king = eq.components.find("King", Some(p(1))).unwrap();
        assert_eq!(after.what(SiteType::Cell, Site(1), None), Some(king));

        let set = RuleNode::from(SetSite::new(SiteFn::Const(Site(1)), SiteProperty::Value, IntFn::Const(7)));
        set.evaluate(&mut ctx).get(0).unwrap().apply(&mut after);
        assert_eq!(after.value_at(SiteType::Cell, Site(1), None), 7);
        assert!(RuleNode::from(Flip::at(SiteFn::Const(Site(5)))).evaluate(&mut ctx).is_empty());
    }

    #[test]
    fn test_select_pairs() {
        let eq = equipment(GameConfig::new(2));
        let mut state = GameState::new(&eq, 0);
        let mut ctx = Context::new(&eq, &mut state);
        let single = RuleNode::from(Select::new(RegionFn::Sites(vec![Site(2), Site(6)])));
        let moves = single.evaluate(&mut ctx);
        assert_eq!(moves.len(), 2);
        assert_eq!(moves.get(0).unwrap().from, Some(Site(2)));

        let pairs = RuleNode::from(
            Select::new(RegionFn::Sites(vec![Site(0)])).to(RegionFn::Neighbours {
                site: SiteFn::From,
                directions: crate::topology::Directions::Adjacent,
            }),
        );
        assert_eq!(pairs.evaluate(&mut ctx).destinations(), vec![Site(1), Site(3), Site(4)]);
    }

    fn stacked(eq: &Equipment) -> GameState {
        let mut state = GameState::new(eq, 0);
        for who in [p(0), p(1)] {
            let stone = Piece::new(eq.components.find("Stone", Some(who)).unwrap(), Some(who));
            state.put(SiteType::Cell, Site(0), stone, 1);
        }
        state
    }

    fn corner() -> RegionFn {
        RegionFn::Site(SiteFn::Const(Site(0)))
    }

    #[test]
    fn test_remove_takes_bound_level() {
        let eq = equipment(GameConfig::new(2).with_stacking());
        let mut state = stacked(&eq);
        let mut ctx = Context::new(&eq, &mut state);

        let bottom = RuleNode::from(Bind::new(Binding::Level(IntFn::Const(0)), Remove::at(corner())));
        let moves = bottom.evaluate(&mut ctx);
        let mv = moves.get(0).unwrap();
        assert!(matches!(mv.actions[0], Action::Remove { level: Some(0), .. }));
        let mut after = ctx.state().clone();
        mv.apply(&mut after);
        assert_eq!(after.stack_size(SiteType::Cell, Site(0)), 1);
        assert_eq!(after.who(SiteType::Cell, Site(0), None), Some(p(1)));

        // Without a level the top piece goes.
        let top = RuleNode::from(Remove::at(corner())).evaluate(&mut ctx);
        let mut after = ctx.state().clone();
        top.get(0).unwrap().apply(&mut after);
        assert_eq!(after.who(SiteType::Cell, Site(0), None), Some(p(0)));
    }

    #[test]
    fn test_stacking_nodes_take_explicit_level() {
        let eq = equipment(GameConfig::new(2).with_stacking());
        let mut state = stacked(&eq);
        let mut ctx = Context::new(&eq, &mut state);

        let from_to = RuleNode::from(
            FromTo::new(corner(), RegionFn::Site(SiteFn::Const(Site(1)))).at_level(IntFn::Const(0)),
        );
        let moves = from_to.evaluate(&mut ctx);
        let mv = moves.get(0).unwrap();
        assert_eq!(mv.levels, Some(LevelRange::at(0)));
        let mut after = ctx.state().clone();
        mv.apply(&mut after);
        assert_eq!(after.who(SiteType::Cell, Site(1), None), Some(p(0)));
        assert_eq!(after.who(SiteType::Cell, Site(0), None), Some(p(1)));
        assert_eq!(after.stack_size(SiteType::Cell, Site(0)), 1);

        // Put a disc under the stack, then flip it there.
        let add = RuleNode::from(Add::piece(PieceRef::named("Disc")).to(corner()).at_level(IntFn::Const(0)));
        let mut after = ctx.state().clone();
        add.evaluate(&mut ctx).get(0).unwrap().apply(&mut after);
        let disc = eq.components.find("Disc", None).unwrap();
        assert_eq!(after.stack_size(SiteType::Cell, Site(0)), 3);
        assert_eq!(after.what(SiteType::Cell, Site(0), Some(0)), Some(disc));

        let mut ctx = Context::new(&eq, &mut after);
        let flip = RuleNode::from(Flip::at(SiteFn::Const(Site(0))).at_level(IntFn::Const(0)));
        let moves = flip.evaluate(&mut ctx);
        assert_eq!(moves.len(), 1);
        let mut flipped = ctx.state().clone();
        moves.get(0).unwrap().apply(&mut flipped);
        assert_eq!(flipped.state_at(SiteType::Cell, Site(0), Some(0)), 1);
        assert_eq!(flipped.state_at(SiteType::Cell, Site(0), None), 0);
        // The top stone cannot be flipped.
        assert!(RuleNode::from(Flip::at(SiteFn::Const(Site(0)))).evaluate(&mut ctx).is_empty());
    }

    #[test]
    fn test_level_ignored_without_stacking() {
        let eq = equipment(GameConfig::new(2));
        let mut state = GameState::new(&eq, 0);
        let stone = Piece::new(eq.components.find("Stone", Some(p(1))).unwrap(), Some(p(1)));
        state.put(SiteType::Cell, Site(0), stone, 1);
        let mut ctx = Context::new(&eq, &mut state);
        let rule = RuleNode::from(Bind::new(Binding::Level(IntFn::Const(3)), Remove::at(corner())));
        let moves = rule.evaluate(&mut ctx);
        assert!(matches!(moves.get(0).unwrap().actions[0], Action::Remove { level: None, .. }));
    }

    #[test]
    fn test_add_reports_players_without_pieces() {
        let mut components = ComponentRegistry::new();
        components.register(Component::piece("Stone", Some(p(0)))).unwrap();
        let eq = Equipment::new(GameConfig::new(2), Topology::square(2, 2), components);
        let mut report = Report::new();
        assert!(RuleNode::from(Add::any()).missing_requirement(&eq, &mut report));
        assert_eq!(report.len(), 1);
        assert!(report.diagnostics()[0].message.contains("player"));
    }
}
