//! Move composition.
//!
//! Rule nodes combine independently generated moves instead of building
//! bespoke multi-part moves:
//! - [`merge`] joins two moves into one (actions in order, first defined
//!   site wins)
//! - [`cross_product`] joins every move of one list with every move of
//!   another
//! - [`with_effects_before`] / [`with_effects_after`] attach the moves of an
//!   effect subtree to a base move, one result per effect move
//! - [`combine`] folds a whole effect list into a single move

use super::game_move::Move;
use super::list::MoveList;

/// Join `first` and `second` into one move.
///
/// Actions run `first` then `second`. `from`, `to` and `levels` keep the
/// first defined value; `between` and continuations are concatenated.
/// Mover, decision flag and element kind come from `first`.
#[must_use]
pub fn merge(first: &Move, second: &Move) -> Move {
    let mut out = first.clone();
    out.actions.extend(second.actions.iter().cloned());
    out.from = first.from.or(second.from);
    out.to = first.to.or(second.to);
    out.levels = first.levels.or(second.levels);
    out.between.extend(second.between.iter().copied());
    out.then.extend_from(&second.then);
    out
}

/// Every move of `left` joined with every move of `right`.
///
/// The result has exactly `left.len() * right.len()` moves, ordered by
/// `left` first. An empty side gives an empty result.
#[must_use]
pub fn cross_product(left: &MoveList, right: &MoveList) -> MoveList {
    let mut out = MoveList::new();
    for a in left.iter() {
        for b in right.iter() {
            out.push(merge(a, b));
        }
    }
    out
}

/// `base` with each effect's actions placed before its own.
///
/// Sites and flags stay those of `base`. No effects leaves `base` alone.
#[must_use]
pub fn with_effects_before(base: &Move, effects: &MoveList) -> Vec<Move> {
    if effects.is_empty() {
        return vec![base.clone()];
    }
    effects
        .iter()
        .map(|effect| {
            let mut out = base.clone();
            out.actions = effect
                .actions
                .iter()
                .chain(base.actions.iter())
                .cloned()
                .collect();
            out.between.extend(effect.between.iter().copied());
            out.then.extend_from(&effect.then);
            out
        })
        .collect()
}

/// `base` with each effect's actions appended.
///
/// No effects leaves `base` alone.
#[must_use]
pub fn with_effects_after(base: &Move, effects: &MoveList) -> Vec<Move> {
    if effects.is_empty() {
        return vec![base.clone()];
    }
    effects.iter().map(|effect| merge(base, effect)).collect()
}

/// Fold all moves of `effects` into one move, or `None` if there are none.
#[must_use]
pub fn combine(effects: &MoveList) -> Option<Move> {
    let mut iter = effects.iter();
    let first = iter.next()?.clone();
    Some(iter.fold(first, |acc, mv| merge(&acc, mv)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Site, SiteType};
    use crate::moves::Action;

    fn marker(site: u32) -> Action {
        Action::Select {
            site_type: SiteType::Cell,
            site: Site(site),
        }
    }

    fn mv(site: u32) -> Move {
        Move::new(vec![marker(site)])
    }

    #[test]
    fn test_merge_first_defined_wins() {
        let a = mv(1).with_to(Site(5));
        let b = mv(2).with_from(Site(3)).with_to(Site(6)).with_between([Site(9)]);
        let m = merge(&a, &b);
        assert_eq!(m.actions, vec![marker(1), marker(2)]);
        assert_eq!(m.from, Some(Site(3)));
        assert_eq!(m.to, Some(Site(5)));
        assert_eq!(m.between.as_slice(), &[Site(9)]);
    }

    #[test]
    fn test_cross_product_sizes() {
        let left: MoveList = (0..3).map(mv).collect();
        let right: MoveList = (10..12).map(mv).collect();
        let out = cross_product(&left, &right);
        assert_eq!(out.len(), 6);
        assert_eq!(out.get(0).unwrap().actions, vec![marker(0), marker(10)]);
        assert_eq!(out.get(5).unwrap().actions, vec![marker(2), marker(11)]);
        assert!(cross_product(&left, &MoveList::new()).is_empty());
    }

    #[test]
    fn test_effects_before_keep_base_sites() {
        let base = mv(0).with_from(Site(0)).with_to(Site(1)).decision();
        let effects: MoveList = [mv(7), mv(8)].into_iter().collect();
        let out = with_effects_before(&base, &effects);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].actions, vec![marker(8), marker(0)]);
        assert_eq!(out[1].to, Some(Site(1)));
        assert!(out[1].decision);
        assert_eq!(with_effects_before(&base, &MoveList::new()), vec![base]);
    }

    #[test]
    fn test_effects_after_and_combine() {
        let base = mv(0);
        let effects: MoveList = [mv(7), mv(8)].into_iter().collect();
        let out = with_effects_after(&base, &effects);
        assert_eq!(out[0].actions, vec![marker(0), marker(7)]);

        let all = combine(&effects).unwrap();
        assert_eq!(all.actions, vec![marker(7), marker(8)]);
        assert!(combine(&MoveList::new()).is_none());
    }
}
