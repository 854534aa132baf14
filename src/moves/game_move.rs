//! Moves: ordered actions plus metadata.
//!
//! A `Move` is what a rule node produces. Besides its actions it records who
//! makes it, whether it is a player decision, the sites involved and the
//! continuations to fire once its actions are committed. Continuations are
//! references into the rule tree; generating a move only records them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::action::{Action, Undo};
use crate::core::{PlayerId, Site, SiteType};
use crate::rules::Then;
use crate::state::GameState;

/// Inclusive range of stack levels a move operates on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelRange {
    /// Lowest level.
    pub min: usize,
    /// Highest level.
    pub max: usize,
}

impl LevelRange {
    /// A single level.
    #[must_use]
    pub const fn at(level: usize) -> Self {
        Self { min: level, max: level }
    }
}

/// Continuations recorded on a move, fired in order after commit.
///
/// Compared by identity: two moves carry the same continuations when they
/// point at the same rule subtrees.
#[derive(Clone, Default)]
pub struct Continuations(Vec<Arc<Then>>);

impl Continuations {
    /// No continuations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a continuation.
    pub fn push(&mut self, then: Arc<Then>) {
        self.0.push(then);
    }

    /// Append all of `other`.
    pub fn extend_from(&mut self, other: &Continuations) {
        self.0.extend(other.0.iter().cloned());
    }

    /// Iterate in firing order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Then>> {
        self.0.iter()
    }

    /// Number of continuations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are none.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for Continuations {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(&other.0).all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

impl std::fmt::Debug for Continuations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Continuations({})", self.0.len())
    }
}

/// A generated move.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Move {
    /// Mutations in application order.
    pub actions: Vec<Action>,
    /// Player making the move.
    pub mover: PlayerId,
    /// Chosen by a player, as opposed to a consequence of another move.
    pub decision: bool,
    /// Element kind of `from`, `to` and `between`.
    pub site_type: SiteType,
    /// Origin site.
    pub from: Option<Site>,
    /// Destination site.
    pub to: Option<Site>,
    /// Sites passed over or affected on the way.
    pub between: SmallVec<[Site; 2]>,
    /// Stack levels involved.
    pub levels: Option<LevelRange>,
    /// Subtrees to evaluate after this move is committed.
    #[serde(skip)]
    pub then: Continuations,
}

impl Move {
    /// A move made of `actions` with no sites recorded yet.
    #[must_use]
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            actions,
            mover: PlayerId::new(0),
            decision: false,
            site_type: SiteType::Cell,
            from: None,
            to: None,
            between: SmallVec::new(),
            levels: None,
            then: Continuations::new(),
        }
    }

    /// Set the origin.
    #[must_use]
    pub fn with_from(mut self, from: Site) -> Self {
        self.from = Some(from);
        self
    }

    /// Set the destination.
    #[must_use]
    pub fn with_to(mut self, to: Site) -> Self {
        self.to = Some(to);
        self
    }

    /// Set the element kind.
    #[must_use]
    pub fn with_site_type(mut self, site_type: SiteType) -> Self {
        self.site_type = site_type;
        self
    }

    /// Set the sites passed over.
    #[must_use]
    pub fn with_between(mut self, between: impl IntoIterator<Item = Site>) -> Self {
        self.between = between.into_iter().collect();
        self
    }

    /// Set the stack levels.
    #[must_use]
    pub fn with_levels(mut self, levels: LevelRange) -> Self {
        self.levels = Some(levels);
        self
    }

    /// Mark as a player decision.
    #[must_use]
    pub fn decision(mut self) -> Self {
        self.decision = true;
        self
    }

    /// Apply every action in order. Continuations are not fired here; see
    /// `Game::apply`.
    pub fn apply(&self, state: &mut GameState) {
        for action in &self.actions {
            action.apply(state);
        }
    }

    /// Apply every action in order and return what reverts them.
    pub fn apply_recorded(&self, state: &mut GameState) -> Undo {
        let mut undo = Undo::new();
        for action in &self.actions {
            action.apply_recorded(state, &mut undo);
        }
        undo
    }

    /// Whether the move consists only of a pass.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        !self.actions.is_empty() && self.actions.iter().all(|a| matches!(a, Action::Pass { .. }))
    }
}
