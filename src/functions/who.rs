//! Player roles relative to the mover.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;

/// A player, or a set of owners, described relative to the mover.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Who {
    /// The player to move.
    #[default]
    Mover,
    /// The player after the mover.
    Next,
    /// Any player other than the mover.
    Enemy,
    /// No owner.
    Neutral,
    /// Any owner, or none.
    Any,
    /// A fixed player.
    Player(PlayerId),
}

impl Who {
    /// The single player this denotes, if it denotes one.
    #[must_use]
    pub fn resolve(self, mover: PlayerId, player_count: usize) -> Option<PlayerId> {
        match self {
            Who::Mover => Some(mover),
            Who::Next => Some(mover.next(player_count)),
            Who::Player(p) => Some(p),
            Who::Enemy | Who::Neutral | Who::Any => None,
        }
    }

    /// Whether a piece with this owner belongs to the role.
    #[must_use]
    pub fn matches(self, owner: Option<PlayerId>, mover: PlayerId, player_count: usize) -> bool {
        match self {
            Who::Mover => owner == Some(mover),
            Who::Next => owner == Some(mover.next(player_count)),
            Who::Enemy => owner.is_some_and(|o| o != mover),
            Who::Neutral => owner.is_none(),
            Who::Any => true,
            Who::Player(p) => owner == Some(p),
        }
    }
}
