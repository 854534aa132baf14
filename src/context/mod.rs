//! Evaluation context.
//!
//! A [`Context`] is what every rule node evaluates against: the shared
//! [`Equipment`], the caller's [`GameState`] and a small set of scratch
//! fields (`from`, `to`, `between`, `level`, `value`, plus the current
//! element kind).
//!
//! ## Scratch discipline
//!
//! Scratch fields at exit must equal those at entry. Nodes never assign a
//! field and hope to undo it: they open a [`Scope`], which snapshots the
//! scratch and puts it back when dropped, on every exit path.
//!
//! ```
//! use rust_ludeme::components::ComponentRegistry;
//! use rust_ludeme::context::Context;
//! use rust_ludeme::core::{GameConfig, Site};
//! use rust_ludeme::game::Equipment;
//! use rust_ludeme::state::GameState;
//! use rust_ludeme::topology::Topology;
//!
//! let equipment = Equipment::new(GameConfig::new(2), Topology::square(3, 3), ComponentRegistry::new());
//! let mut state = GameState::new(&equipment, 7);
//! let mut ctx = Context::new(&equipment, &mut state);
//!
//! {
//!     let mut scope = ctx.scope();
//!     scope.set_to(Some(Site(4)));
//!     assert_eq!(scope.to(), Some(Site(4)));
//! }
//! assert_eq!(ctx.to(), None);
//! ```

mod scratch;

pub use scratch::{EnvField, EnvFields, Scratch};

use std::ops::{Deref, DerefMut};

use crate::components::ComponentRegistry;
use crate::core::{GameConfig, GameRng, PlayerId, Site, SiteType};
use crate::game::Equipment;
use crate::state::GameState;
use crate::topology::{Compass, Graph, Topology};

/// Environment one evaluation runs in.
pub struct Context<'a> {
    equipment: &'a Equipment,
    state: &'a mut GameState,
    scratch: Scratch,
}

impl<'a> Context<'a> {
    /// A context with empty scratch fields over `state`.
    pub fn new(equipment: &'a Equipment, state: &'a mut GameState) -> Self {
        let scratch = Scratch {
            site_type: equipment.config.default_site_type,
            ..Scratch::default()
        };
        Self {
            equipment,
            state,
            scratch,
        }
    }

    // === Equipment ===

    #[must_use]
    pub fn equipment(&self) -> &'a Equipment {
        self.equipment
    }

    #[must_use]
    pub fn topology(&self) -> &'a Topology {
        &self.equipment.topology
    }

    #[must_use]
    pub fn config(&self) -> &'a GameConfig {
        &self.equipment.config
    }

    #[must_use]
    pub fn components(&self) -> &'a ComponentRegistry {
        &self.equipment.components
    }

    /// Graph of an element kind, if the board has one.
    #[must_use]
    pub fn graph(&self, site_type: SiteType) -> Option<&'a Graph> {
        self.equipment.topology.graph(site_type)
    }

    // === State ===

    #[must_use]
    pub fn state(&self) -> &GameState {
        self.state
    }

    /// The RNG of the position being evaluated.
    pub fn rng(&mut self) -> &mut GameRng {
        self.state.rng_mut()
    }

    #[must_use]
    pub fn mover(&self) -> PlayerId {
        self.state.mover()
    }

    /// Direction the piece on a site faces: its owner's facing turned by the
    /// piece rotation. Unowned pieces and empty sites face north.
    #[must_use]
    pub fn facing_at(&self, site_type: SiteType, site: Site) -> Compass {
        let Some(piece) = self.state.piece(site_type, site, None) else {
            return Compass::N;
        };
        let base = piece
            .who
            .and_then(|p| self.config().facing.get(p).copied())
            .unwrap_or(Compass::N);
        base.rotate(i32::from(piece.rotation))
    }

    // === Scratch ===

    #[must_use]
    pub fn scratch(&self) -> Scratch {
        self.scratch
    }

    #[must_use]
    pub fn from(&self) -> Option<Site> {
        self.scratch.from
    }

    #[must_use]
    pub fn to(&self) -> Option<Site> {
        self.scratch.to
    }

    #[must_use]
    pub fn between(&self) -> Option<Site> {
        self.scratch.between
    }

    #[must_use]
    pub fn level(&self) -> Option<usize> {
        self.scratch.level
    }

    #[must_use]
    pub fn value(&self) -> Option<i64> {
        self.scratch.value
    }

    #[must_use]
    pub fn site_type(&self) -> SiteType {
        self.scratch.site_type
    }

    // Setters are only reachable through a `Scope`, which undoes them.

    fn set_from(&mut self, site: Option<Site>) {
        self.scratch.from = site;
    }

    fn set_to(&mut self, site: Option<Site>) {
        self.scratch.to = site;
    }

    fn set_between(&mut self, site: Option<Site>) {
        self.scratch.between = site;
    }

    fn set_level(&mut self, level: Option<usize>) {
        self.scratch.level = level;
    }

    fn set_value(&mut self, value: Option<i64>) {
        self.scratch.value = value;
    }

    fn set_site_type(&mut self, site_type: SiteType) {
        self.scratch.site_type = site_type;
    }

    /// Open a scope; scratch changes made through it are undone when it
    /// drops.
    pub fn scope(&mut self) -> Scope<'_, 'a> {
        let saved = self.scratch;
        Scope { ctx: self, saved }
    }

    /// Run `f` with `to` bound.
    pub fn with_to<R>(&mut self, site: Option<Site>, f: impl FnOnce(&mut Context<'a>) -> R) -> R {
        let mut scope = self.scope();
        scope.set_to(site);
        f(&mut *scope)
    }

    /// Run `f` with `from` bound.
    pub fn with_from<R>(&mut self, site: Option<Site>, f: impl FnOnce(&mut Context<'a>) -> R) -> R {
        let mut scope = self.scope();
        scope.set_from(site);
        f(&mut *scope)
    }

    /// Run `f` with `between` bound.
    pub fn with_between<R>(
        &mut self,
        site: Option<Site>,
        f: impl FnOnce(&mut Context<'a>) -> R,
    ) -> R {
        let mut scope = self.scope();
        scope.set_between(site);
        f(&mut *scope)
    }

    /// Run `f` with `level` bound.
    pub fn with_level<R>(
        &mut self,
        level: Option<usize>,
        f: impl FnOnce(&mut Context<'a>) -> R,
    ) -> R {
        let mut scope = self.scope();
        scope.set_level(level);
        f(&mut *scope)
    }

    /// Run `f` with `value` bound.
    pub fn with_value<R>(&mut self, value: Option<i64>, f: impl FnOnce(&mut Context<'a>) -> R) -> R {
        let mut scope = self.scope();
        scope.set_value(value);
        f(&mut *scope)
    }

    /// Run `f` with another default element kind.
    pub fn with_site_type<R>(
        &mut self,
        site_type: SiteType,
        f: impl FnOnce(&mut Context<'a>) -> R,
    ) -> R {
        let mut scope = self.scope();
        scope.set_site_type(site_type);
        f(&mut *scope)
    }

    /// Evaluate `f` against another state with the same equipment and
    /// scratch, e.g. a clone with tentative actions applied.
    pub fn hypothetical<R>(&self, state: &mut GameState, f: impl FnOnce(&mut Context<'_>) -> R) -> R {
        let mut ctx = Context {
            equipment: self.equipment,
            state,
            scratch: self.scratch,
        };
        f(&mut ctx)
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("mover", &self.mover())
            .field("scratch", &self.scratch)
            .finish_non_exhaustive()
    }
}

/// Scratch snapshot restored on drop.
///
/// Derefs to the context, and is the only place scratch fields can be
/// written.
pub struct Scope<'c, 'a> {
    ctx: &'c mut Context<'a>,
    saved: Scratch,
}

impl<'a> Scope<'_, 'a> {
    pub fn set_from(&mut self, site: Option<Site>) {
        self.ctx.set_from(site);
    }

    pub fn set_to(&mut self, site: Option<Site>) {
        self.ctx.set_to(site);
    }

    pub fn set_between(&mut self, site: Option<Site>) {
        self.ctx.set_between(site);
    }

    pub fn set_level(&mut self, level: Option<usize>) {
        self.ctx.set_level(level);
    }

    pub fn set_value(&mut self, value: Option<i64>) {
        self.ctx.set_value(value);
    }

    pub fn set_site_type(&mut self, site_type: SiteType) {
        self.ctx.set_site_type(site_type);
    }
}

impl<'a> Deref for Scope<'_, 'a> {
    type Target = Context<'a>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl<'a> DerefMut for Scope<'_, 'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for Scope<'_, '_> {
    fn drop(&mut self) {
        self.ctx.scratch = self.saved;
    }
}
