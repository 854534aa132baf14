//! Primitive state mutations.
//!
//! An `Action` carries only the data needed to apply itself to a
//! `GameState`. Actions never refer back to the rules that produced them.
//!
//! `apply_recorded` also fills an [`Undo`] with whatever the action
//! overwrote: the previous contents of the sites it touches, or for
//! non-board actions a snapshot of the state (O(1) with the persistent
//! containers).

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::components::ComponentId;
use crate::core::{PlayerId, Site, SiteType, ZoneId};
use crate::game::StringId;
use crate::state::{GameState, Piece, Slot};

/// A primitive mutation of the game state.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    // === Board ===

    /// Add `count` units of `piece` at `level` (top for `None`).
    Add {
        site_type: SiteType,
        site: Site,
        piece: Piece,
        count: u32,
        level: Option<usize>,
    },

    /// Insert a piece at a stack level.
    Insert {
        site_type: SiteType,
        site: Site,
        level: usize,
        piece: Piece,
    },

    /// Remove units from a site. Piles lose `count` units (all for `None`);
    /// stacks lose the piece at `level`, or everything from `level` upward
    /// when `stack` is set.
    Remove {
        site_type: SiteType,
        site: Site,
        level: Option<usize>,
        count: Option<u32>,
        stack: bool,
    },

    /// Move units or pieces between sites. Piles move `count` units (all for
    /// `None`); stacks move the top piece, or the whole stack with `stack`.
    Move {
        from_type: SiteType,
        from: Site,
        level_from: Option<usize>,
        to_type: SiteType,
        to: Site,
        level_to: Option<usize>,
        count: Option<u32>,
        stack: bool,
    },

    /// Set the local state of a piece.
    SetState {
        site_type: SiteType,
        site: Site,
        level: Option<usize>,
        state: i32,
    },

    /// Set the rotation of a piece.
    SetRotation {
        site_type: SiteType,
        site: Site,
        level: Option<usize>,
        rotation: u8,
    },

    /// Set the value of a piece.
    SetValue {
        site_type: SiteType,
        site: Site,
        level: Option<usize>,
        value: i64,
    },

    /// Set the unit count of a pile (0 empties it).
    SetCount {
        site_type: SiteType,
        site: Site,
        count: u32,
    },

    /// Replace a piece's component and owner, keeping its values.
    Promote {
        site_type: SiteType,
        site: Site,
        level: Option<usize>,
        what: ComponentId,
        who: Option<PlayerId>,
    },

    /// Marks a chosen site. Changes nothing.
    Select { site_type: SiteType, site: Site },

    // === Social ===

    /// Stake an amount.
    Bet { player: PlayerId, amount: i64 },

    /// Cast a vote.
    Vote { player: PlayerId, message: StringId },

    /// Make a proposal.
    Propose { player: PlayerId, message: StringId },

    /// Send a note to a player.
    Note { player: PlayerId, message: StringId },

    /// Raise an event for a player.
    Trigger { player: PlayerId, event: StringId },

    /// Pass the turn.
    Pass { player: PlayerId },

    // === Dice, cards, turn ===

    /// Set dice faces.
    SetDice { values: SmallVec<[u32; 4]> },

    /// Move the top card of one zone onto another.
    Draw { from: ZoneId, to: ZoneId },

    /// The mover moves again after this move.
    MoveAgain,
}

impl Action {
    /// Move the top piece (or whole pile) from one site to another of the
    /// same kind.
    #[must_use]
    pub fn move_piece(site_type: SiteType, from: Site, to: Site, stack: bool) -> Self {
        Action::Move {
            from_type: site_type,
            from,
            level_from: None,
            to_type: site_type,
            to,
            level_to: None,
            count: None,
            stack,
        }
    }

    /// Remove everything at a site (the top piece in stacking games).
    #[must_use]
    pub fn remove(site_type: SiteType, site: Site) -> Self {
        Action::Remove {
            site_type,
            site,
            level: None,
            count: None,
            stack: false,
        }
    }

    /// Add units of a piece on top of a site.
    #[must_use]
    pub fn add(site_type: SiteType, site: Site, piece: Piece, count: u32) -> Self {
        Action::Add {
            site_type,
            site,
            piece,
            count,
            level: None,
        }
    }

    /// The same action on stack level `at` (the origin level for moves).
    /// Actions without a level are returned unchanged.
    #[must_use]
    pub fn at_level(mut self, at: Option<usize>) -> Self {
        match &mut self {
            Action::Add { level, .. }
            | Action::Remove { level, .. }
            | Action::SetState { level, .. }
            | Action::SetRotation { level, .. }
            | Action::SetValue { level, .. }
            | Action::Promote { level, .. } => *level = at,
            Action::Move { level_from, .. } => *level_from = at,
            _ => {}
        }
        self
    }

    /// Apply this action, recording into `undo` what it overwrites.
    pub fn apply_recorded(&self, state: &mut GameState, undo: &mut Undo) {
        undo.record(self, state);
        self.apply(state);
    }

    /// Whether this action changes the board.
    #[must_use]
    pub fn touches_board(&self) -> bool {
        matches!(
            self,
            Action::Add { .. }
                | Action::Insert { .. }
                | Action::Remove { .. }
                | Action::Move { .. }
                | Action::SetState { .. }
                | Action::SetRotation { .. }
                | Action::SetValue { .. }
                | Action::SetCount { .. }
                | Action::Promote { .. }
        )
    }

    /// Apply this action.
    ///
    /// Actions on missing sites or empty slots do nothing.
    pub fn apply(&self, state: &mut GameState) {
        let stacking = state.is_stacking();
        match self {
            Action::Add {
                site_type,
                site,
                piece,
                count,
                level,
            } => {
                if let Some(slot) = state.slot_mut(*site_type, *site) {
                    slot.add(*piece, *count, *level, stacking);
                }
            }
            Action::Insert {
                site_type,
                site,
                level,
                piece,
            } => {
                if let Some(slot) = state.slot_mut(*site_type, *site) {
                    slot.add(*piece, 1, Some(*level), stacking);
                }
            }
            Action::Remove {
                site_type,
                site,
                level,
                count,
                stack,
            } => {
                if let Some(slot) = state.slot_mut(*site_type, *site) {
                    slot.lift(*level, *count, *stack, stacking);
                }
            }
            Action::Move {
                from_type,
                from,
                level_from,
                to_type,
                to,
                level_to,
                count,
                stack,
            } => {
                let lifted = state
                    .slot_mut(*from_type, *from)
                    .and_then(|slot| slot.lift(*level_from, *count, *stack, stacking));
                if let Some((pieces, units)) = lifted {
                    match state.slot_mut(*to_type, *to) {
                        Some(slot) => slot.drop_lifted(pieces, units, *level_to, stacking),
                        None => log::debug!("move to missing {to_type:?} {to}: pieces dropped"),
                    }
                }
            }
            Action::SetState {
                site_type,
                site,
                level,
                state: value,
            } => update(state, *site_type, *site, *level, |p| p.state = *value),
            Action::SetRotation {
                site_type,
                site,
                level,
                rotation,
            } => update(state, *site_type, *site, *level, |p| p.rotation = *rotation),
            Action::SetValue {
                site_type,
                site,
                level,
                value,
            } => update(state, *site_type, *site, *level, |p| p.value = *value),
            Action::SetCount {
                site_type,
                site,
                count,
            } => {
                if let Some(slot) = state.slot_mut(*site_type, *site) {
                    slot.set_count(*count);
                }
            }
            Action::Promote {
                site_type,
                site,
                level,
                what,
                who,
            } => update(state, *site_type, *site, *level, |p| {
                p.what = *what;
                p.who = *who;
            }),
            Action::Select { .. } => {}
            Action::Bet { player, amount } => state.place_bet(*player, *amount),
            Action::Vote { player, message } => state.push_vote(*player, *message),
            Action::Propose { player, message } => state.push_proposal(*player, *message),
            Action::Note { player, message } => state.push_note(*player, *message),
            Action::Trigger { player, event } => state.trigger(*player, *event),
            Action::Pass { .. } => {}
            Action::SetDice { values } => state.set_dice(values),
            Action::Draw { from, to } => {
                state.zones_mut().draw(*from, *to);
            }
            Action::MoveAgain => state.set_move_again(true),
        }
    }
}

/// One overwritten value.
#[derive(Clone, Debug)]
enum Saved {
    Slot(SiteType, Site, Slot),
    State(Box<GameState>),
}

/// What applied actions overwrote, enough to put the state back.
///
/// Reverting restores entries newest first, so an `Undo` built over a whole
/// move reverts the move.
#[derive(Clone, Debug, Default)]
pub struct Undo {
    saved: SmallVec<[Saved; 2]>,
}

impl Undo {
    /// Nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    fn save_slot(&mut self, state: &GameState, site_type: SiteType, site: Site) {
        if let Some(slot) = state.slot(site_type, site) {
            self.saved.push(Saved::Slot(site_type, site, slot.clone()));
        }
    }

    /// Record what `action` is about to overwrite.
    fn record(&mut self, action: &Action, state: &GameState) {
        match action {
            Action::Add { site_type, site, .. }
            | Action::Insert { site_type, site, .. }
            | Action::Remove { site_type, site, .. }
            | Action::SetState { site_type, site, .. }
            | Action::SetRotation { site_type, site, .. }
            | Action::SetValue { site_type, site, .. }
            | Action::SetCount { site_type, site, .. }
            | Action::Promote { site_type, site, .. } => self.save_slot(state, *site_type, *site),
            Action::Move {
                from_type,
                from,
                to_type,
                to,
                ..
            } => {
                self.save_slot(state, *from_type, *from);
                self.save_slot(state, *to_type, *to);
            }
            Action::Select { .. } | Action::Pass { .. } => {}
            _ => self.saved.push(Saved::State(Box::new(state.clone()))),
        }
    }

    /// Put back everything recorded, newest first.
    pub fn revert(self, state: &mut GameState) {
        for saved in self.saved.into_iter().rev() {
            match saved {
                Saved::Slot(site_type, site, slot) => {
                    if let Some(current) = state.slot_mut(site_type, site) {
                        *current = slot;
                    }
                }
                Saved::State(previous) => *state = *previous,
            }
        }
    }
}

fn update(
    state: &mut GameState,
    site_type: SiteType,
    site: Site,
    level: Option<usize>,
    f: impl FnOnce(&mut Piece),
) {
    if let Some(piece) = state.slot_mut(site_type, site).and_then(|s| s.at_mut(level)) {
        f(piece);
    }
}
