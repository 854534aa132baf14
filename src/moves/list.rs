//! Ordered move lists.
//!
//! Moves are held behind `Arc` so a cached move can be handed out many times
//! without copying. Anything that needs to change a shared move goes through
//! `Arc::make_mut` and gets its own copy.

use std::sync::Arc;

use super::game_move::Move;
use crate::core::Site;

/// Ordered collection of generated moves.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MoveList {
    moves: Vec<Arc<Move>>,
}

impl MoveList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fresh move.
    pub fn push(&mut self, mv: Move) {
        self.moves.push(Arc::new(mv));
    }

    /// Append a shared move.
    pub fn push_shared(&mut self, mv: Arc<Move>) {
        self.moves.push(mv);
    }

    /// Append all moves of `other`.
    pub fn extend(&mut self, other: MoveList) {
        self.moves.extend(other.moves);
    }

    /// Number of moves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Whether there are no moves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Move at an index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Move> {
        self.moves.get(index).map(Arc::as_ref)
    }

    /// Iterate over the moves.
    pub fn iter(&self) -> impl Iterator<Item = &Move> {
        self.moves.iter().map(Arc::as_ref)
    }

    /// The shared handles, for identity checks.
    #[must_use]
    pub fn shared(&self) -> &[Arc<Move>] {
        &self.moves
    }

    /// Whether some move ends on `site`.
    #[must_use]
    pub fn contains_to(&self, site: Site) -> bool {
        self.iter().any(|m| m.to == Some(site))
    }

    /// Destinations in order, skipping moves without one.
    #[must_use]
    pub fn destinations(&self) -> Vec<Site> {
        self.iter().filter_map(|m| m.to).collect()
    }
}

impl IntoIterator for MoveList {
    type Item = Arc<Move>;
    type IntoIter = std::vec::IntoIter<Arc<Move>>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.into_iter()
    }
}

impl FromIterator<Move> for MoveList {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        Self {
            moves: iter.into_iter().map(Arc::new).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::Action;

    #[test]
    fn test_push_and_query() {
        let mut list = MoveList::new();
        assert!(list.is_empty());
        list.push(Move::new(vec![Action::MoveAgain]).with_to(Site(3)));
        list.push(Move::new(vec![]));
        assert_eq!(list.len(), 2);
        assert!(list.contains_to(Site(3)));
        assert!(!list.contains_to(Site(4)));
        assert_eq!(list.destinations(), vec![Site(3)]);
        assert!(list.get(1).is_some_and(|m| m.actions.is_empty()));
    }

    #[test]
    fn test_shared_handles_survive_extend() {
        let shared = Arc::new(Move::new(vec![]).with_to(Site(1)));
        let mut a = MoveList::new();
        a.push_shared(Arc::clone(&shared));
        let mut b = MoveList::new();
        b.extend(a);
        assert!(Arc::ptr_eq(&b.shared()[0], &shared));
    }

    #[test]
    fn test_collect() {
        let list: MoveList = (0..3).map(|i| Move::new(vec![]).with_to(Site(i))).collect();
        assert_eq!(list.destinations(), vec![Site(0), Site(1), Site(2)]);
    }
}
