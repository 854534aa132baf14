//! Site contents.
//!
//! ## Piece
//!
//! One occupant: its component, owner and the per-piece values (local state,
//! rotation, value).
//!
//! ## Slot
//!
//! What one site holds. In counted-pile games (the default) a slot holds at
//! most one piece kind with a unit count; adding a different kind replaces
//! the pile. In stacking games a slot is an ordered stack, bottom at level 0,
//! and the count is the stack height.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::components::ComponentId;
use crate::core::PlayerId;

/// One occupant of a site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    /// Component.
    pub what: ComponentId,
    /// Owner, `None` for neutral pieces.
    pub who: Option<PlayerId>,
    /// Local state.
    pub state: i32,
    /// Rotation in eighths of a turn, clockwise.
    pub rotation: u8,
    /// Free integer value.
    pub value: i64,
}

impl Piece {
    /// Create a piece with zeroed per-piece values.
    #[must_use]
    pub const fn new(what: ComponentId, who: Option<PlayerId>) -> Self {
        Self {
            what,
            who,
            state: 0,
            rotation: 0,
            value: 0,
        }
    }

    /// Set the local state.
    #[must_use]
    pub const fn with_state(mut self, state: i32) -> Self {
        self.state = state;
        self
    }

    /// Set the rotation.
    #[must_use]
    pub const fn with_rotation(mut self, rotation: u8) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the value.
    #[must_use]
    pub const fn with_value(mut self, value: i64) -> Self {
        self.value = value;
        self
    }

    /// Same component and owner (per-piece values may differ).
    #[must_use]
    pub fn same_kind(&self, other: &Piece) -> bool {
        self.what == other.what && self.who == other.who
    }
}

/// Pieces lifted off a site.
pub type Lifted = SmallVec<[Piece; 4]>;

/// Contents of one site.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Slot {
    pieces: SmallVec<[Piece; 1]>,
    count: u32,
}

impl Slot {
    /// Whether nothing is here.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Unit count (stack height in stacking games).
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Number of stacked pieces (0 or 1 for piles).
    #[must_use]
    pub fn height(&self) -> usize {
        self.pieces.len()
    }

    /// Piece at `level`, or the top piece for `None`.
    #[must_use]
    pub fn at(&self, level: Option<usize>) -> Option<&Piece> {
        match level {
            Some(l) => self.pieces.get(l),
            None => self.pieces.last(),
        }
    }

    pub(crate) fn at_mut(&mut self, level: Option<usize>) -> Option<&mut Piece> {
        match level {
            Some(l) => self.pieces.get_mut(l),
            None => self.pieces.last_mut(),
        }
    }

    /// All pieces bottom to top.
    #[must_use]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Add `n` units of `piece`.
    pub(crate) fn add(&mut self, piece: Piece, n: u32, level: Option<usize>, stacking: bool) {
        if n == 0 {
            return;
        }
        if stacking {
            let at = level.map_or(self.pieces.len(), |l| l.min(self.pieces.len()));
            for _ in 0..n {
                self.pieces.insert(at, piece);
            }
            self.count = self.pieces.len() as u32;
            return;
        }
        match self.pieces.first_mut() {
            Some(current) if current.same_kind(&piece) => {
                self.count = self.count.saturating_add(n);
            }
            _ => {
                self.pieces.clear();
                self.pieces.push(piece);
                self.count = n;
            }
        }
    }

    /// Put lifted pieces back on top of (or into) this slot.
    pub(crate) fn drop_lifted(&mut self, lifted: Lifted, units: u32, level: Option<usize>, stacking: bool) {
        if stacking {
            let mut at = level.map_or(self.pieces.len(), |l| l.min(self.pieces.len()));
            for piece in lifted {
                self.pieces.insert(at, piece);
                at += 1;
            }
            self.count = self.pieces.len() as u32;
        } else if let Some(piece) = lifted.first() {
            self.add(*piece, units, None, false);
        }
    }

    /// Lift pieces off this slot.
    ///
    /// Piles give up `n` units (all for `None`). Stacks give up the piece at
    /// `level` (top for `None`), or with `whole` everything from `level`
    /// upward. Returns the lifted pieces and the unit count.
    pub(crate) fn lift(
        &mut self,
        level: Option<usize>,
        n: Option<u32>,
        whole: bool,
        stacking: bool,
    ) -> Option<(Lifted, u32)> {
        if self.pieces.is_empty() {
            return None;
        }
        if stacking {
            let len = self.pieces.len();
            let start = match (whole, level) {
                (true, l) => l.unwrap_or(0),
                (false, Some(l)) => l,
                (false, None) => len - 1,
            };
            if start >= len {
                return None;
            }
            let end = if whole {
                len
            } else {
                (start + n.unwrap_or(1) as usize).min(len)
            };
            let lifted: Lifted = self.pieces.drain(start..end).collect();
            self.count = self.pieces.len() as u32;
            let units = lifted.len() as u32;
            return Some((lifted, units));
        }
        let piece = self.pieces[0];
        let units = n.map_or(self.count, |n| n.min(self.count));
        self.count -= units;
        if self.count == 0 {
            self.pieces.clear();
        }
        let mut lifted = Lifted::new();
        lifted.push(piece);
        Some((lifted, units))
    }

    /// Set the unit count of a pile; 0 empties it.
    pub(crate) fn set_count(&mut self, count: u32) {
        if self.pieces.is_empty() {
            return;
        }
        if count == 0 {
            self.pieces.clear();
        }
        self.count = count;
    }

    /// Replace a pile or stack with exactly this content.
    pub(crate) fn replace(&mut self, piece: Option<Piece>, count: u32) {
        self.pieces.clear();
        self.count = 0;
        if let Some(piece) = piece.filter(|_| count > 0) {
            self.pieces.push(piece);
            self.count = count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn man(who: u8) -> Piece {
        Piece::new(ComponentId::new(who as u16), Some(PlayerId::new(who)))
    }

    #[test]
    fn test_pile_add_same_kind_accumulates() {
        let mut slot = Slot::default();
        slot.add(man(0), 2, None, false);
        slot.add(man(0).with_state(3), 1, None, false);
        assert_eq!(slot.count(), 3);
        assert_eq!(slot.height(), 1);
        assert_eq!(slot.at(None).map(|p| p.state), Some(0));
    }

    #[test]
    fn test_pile_add_other_kind_replaces() {
        let mut slot = Slot::default();
        slot.add(man(0), 4, None, false);
        slot.add(man(1), 1, None, false);
        assert_eq!(slot.count(), 1);
        assert_eq!(slot.at(None).and_then(|p| p.who), Some(PlayerId::new(1)));
    }

    #[test]
    fn test_pile_lift_partial_and_all() {
        let mut slot = Slot::default();
        slot.add(man(0), 5, None, false);
        let (lifted, units) = slot.lift(None, Some(2), false, false).unwrap();
        assert_eq!((lifted.len(), units, slot.count()), (1, 2, 3));
        let (_, units) = slot.lift(None, None, false, false).unwrap();
        assert_eq!(units, 3);
        assert!(slot.is_empty());
        assert!(slot.lift(None, None, false, false).is_none());
    }

    #[test]
    fn test_stack_insert_and_lift_levels() {
        let mut slot = Slot::default();
        slot.add(man(0), 1, None, true);
        slot.add(man(1), 1, None, true);
        slot.add(man(0).with_value(9), 1, Some(1), true);
        assert_eq!(slot.count(), 3);
        assert_eq!(slot.at(Some(1)).map(|p| p.value), Some(9));

        let (lifted, _) = slot.lift(None, None, false, true).unwrap();
        assert_eq!(lifted[0].who, Some(PlayerId::new(1)));
        assert_eq!(slot.height(), 2);

        let (lifted, units) = slot.lift(Some(0), None, true, true).unwrap();
        assert_eq!((lifted.len(), units), (2, 2));
        assert!(slot.is_empty());
    }

    #[test]
    fn test_drop_lifted_onto_stack_keeps_order() {
        let mut slot = Slot::default();
        slot.add(man(1), 1, None, true);
        let mut lifted = Lifted::new();
        lifted.push(man(0).with_value(1));
        lifted.push(man(0).with_value(2));
        slot.drop_lifted(lifted, 2, None, true);
        let values: Vec<_> = slot.pieces().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![0, 1, 2]);
    }

    #[test]
    fn test_set_count_and_replace() {
        let mut slot = Slot::default();
        slot.set_count(4);
        assert!(slot.is_empty());
        slot.replace(Some(man(1)), 2);
        assert_eq!(slot.count(), 2);
        slot.set_count(0);
        assert!(slot.is_empty());
        slot.replace(Some(man(1)), 0);
        assert!(slot.is_empty());
    }
}
