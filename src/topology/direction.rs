//! Absolute and relative directions.
//!
//! ## Compass
//!
//! The eight absolute directions, indexed clockwise from north. Every graph
//! stores its steps and radials per compass direction.
//!
//! ## Directions
//!
//! What a rule node asks for: a single compass point, a family such as
//! `Orthogonal`, or a direction relative to the way a piece faces. Relative
//! directions are resolved against the facing at evaluation time:
//!
//! ```
//! use rust_ludeme::topology::{Compass, Directions};
//!
//! let forwards = Directions::Forwards.resolve(Compass::S);
//! assert_eq!(forwards.as_slice(), &[Compass::S, Compass::SW, Compass::SE]);
//! ```

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Resolved absolute directions.
pub type DirectionList = SmallVec<[Compass; 8]>;

/// Absolute direction, clockwise from north.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Compass {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Compass {
    /// All directions in clockwise order starting at north.
    pub const ALL: [Compass; 8] = [
        Compass::N,
        Compass::NE,
        Compass::E,
        Compass::SE,
        Compass::S,
        Compass::SW,
        Compass::W,
        Compass::NW,
    ];

    /// N, E, S, W.
    pub const ORTHOGONAL: [Compass; 4] = [Compass::N, Compass::E, Compass::S, Compass::W];

    /// NE, SE, SW, NW.
    pub const DIAGONAL: [Compass; 4] = [Compass::NE, Compass::SE, Compass::SW, Compass::NW];

    /// Position in clockwise order (N = 0).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Direction at a clockwise index, wrapping modulo 8.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % 8]
    }

    /// Turn clockwise by `steps` eighths of a full turn (negative turns
    /// counter-clockwise).
    #[must_use]
    pub fn rotate(self, steps: i32) -> Self {
        Self::from_index((self.index() as i32 + steps).rem_euclid(8) as usize)
    }

    /// The reverse direction.
    #[must_use]
    pub fn opposite(self) -> Self {
        self.rotate(4)
    }

    /// N, E, S or W.
    #[must_use]
    pub const fn is_orthogonal(self) -> bool {
        self.index() % 2 == 0
    }

    /// Unit offset `(dx, dy)` on a grid where north increases `y`.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Compass::N => (0, 1),
            Compass::NE => (1, 1),
            Compass::E => (1, 0),
            Compass::SE => (1, -1),
            Compass::S => (0, -1),
            Compass::SW => (-1, -1),
            Compass::W => (-1, 0),
            Compass::NW => (-1, 1),
        }
    }
}

/// Direction relative to the way a piece faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relative {
    Forward,
    ForwardRight,
    Rightward,
    BackwardRight,
    Backward,
    BackwardLeft,
    Leftward,
    ForwardLeft,
}

impl Relative {
    /// Clockwise eighths from the facing.
    #[must_use]
    pub const fn turn(self) -> i32 {
        match self {
            Relative::Forward => 0,
            Relative::ForwardRight => 1,
            Relative::Rightward => 2,
            Relative::BackwardRight => 3,
            Relative::Backward => 4,
            Relative::BackwardLeft => 5,
            Relative::Leftward => 6,
            Relative::ForwardLeft => 7,
        }
    }

    /// The absolute direction for a piece facing `facing`.
    #[must_use]
    pub fn resolve(self, facing: Compass) -> Compass {
        facing.rotate(self.turn())
    }
}

/// Directions requested by a rule node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directions {
    /// One absolute direction.
    Compass(Compass),
    /// One direction relative to the facing.
    Relative(Relative),
    /// N, E, S, W.
    Orthogonal,
    /// NE, SE, SW, NW.
    Diagonal,
    /// All eight directions.
    #[default]
    Adjacent,
    /// Forward plus the two forward diagonals.
    Forwards,
    /// Backward plus the two backward diagonals.
    Backwards,
    /// Leftward and rightward.
    Sideways,
    /// Concatenation of several specifications.
    Union(Vec<Directions>),
}

impl Directions {
    /// Resolve to absolute directions for a piece facing `facing`.
    ///
    /// Order follows the specification and duplicates are removed, so a
    /// union of overlapping families yields each direction once.
    #[must_use]
    pub fn resolve(&self, facing: Compass) -> DirectionList {
        let mut out = DirectionList::new();
        self.resolve_into(facing, &mut out);
        out
    }

    fn resolve_into(&self, facing: Compass, out: &mut DirectionList) {
        let mut push = |c: Compass| {
            if !out.contains(&c) {
                out.push(c);
            }
        };
        match self {
            Directions::Compass(c) => push(*c),
            Directions::Relative(r) => push(r.resolve(facing)),
            Directions::Orthogonal => Compass::ORTHOGONAL.into_iter().for_each(push),
            Directions::Diagonal => Compass::DIAGONAL.into_iter().for_each(push),
            Directions::Adjacent => Compass::ALL.into_iter().for_each(push),
            Directions::Forwards => {
                [Relative::Forward, Relative::ForwardRight, Relative::ForwardLeft]
                    .into_iter()
                    .for_each(|r| push(r.resolve(facing)));
            }
            Directions::Backwards => {
                [Relative::Backward, Relative::BackwardLeft, Relative::BackwardRight]
                    .into_iter()
                    .for_each(|r| push(r.resolve(facing)));
            }
            Directions::Sideways => {
                [Relative::Leftward, Relative::Rightward]
                    .into_iter()
                    .for_each(|r| push(r.resolve(facing)));
            }
            Directions::Union(parts) => {
                for part in parts {
                    part.resolve_into(facing, out);
                }
            }
        }
    }

    /// Whether the result depends on the facing.
    #[must_use]
    pub fn is_relative(&self) -> bool {
        match self {
            Directions::Relative(_)
            | Directions::Forwards
            | Directions::Backwards
            | Directions::Sideways => true,
            Directions::Union(parts) => parts.iter().any(Directions::is_relative),
            _ => false,
        }
    }
}

impl From<Compass> for Directions {
    fn from(c: Compass) -> Self {
        Directions::Compass(c)
    }
}

/// One instruction of a leap walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepType {
    /// Move one site in the current direction.
    F,
    /// Move one site against the current direction.
    B,
    /// Turn a quarter left without moving.
    L,
    /// Turn a quarter right without moving.
    R,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_wraps_both_ways() {
        assert_eq!(Compass::NW.rotate(1), Compass::N);
        assert_eq!(Compass::N.rotate(-1), Compass::NW);
        assert_eq!(Compass::E.rotate(10), Compass::S);
        assert_eq!(Compass::SW.opposite(), Compass::NE);
    }

    #[test]
    fn test_orthogonal_flags() {
        let orth: Vec<_> = Compass::ALL.iter().filter(|c| c.is_orthogonal()).copied().collect();
        assert_eq!(orth, Compass::ORTHOGONAL.to_vec());
    }

    #[test]
    fn test_relative_resolution() {
        assert_eq!(Relative::Forward.resolve(Compass::S), Compass::S);
        assert_eq!(Relative::Leftward.resolve(Compass::N), Compass::W);
        assert_eq!(Relative::Rightward.resolve(Compass::N), Compass::E);
        assert_eq!(Relative::BackwardLeft.resolve(Compass::E), Compass::NW);
    }

    #[test]
    fn test_union_dedupes_in_order() {
        let dirs = Directions::Union(vec![
            Directions::Compass(Compass::E),
            Directions::Orthogonal,
            Directions::Relative(Relative::Forward),
        ]);
        let resolved = dirs.resolve(Compass::N);
        assert_eq!(
            resolved.as_slice(),
            &[Compass::E, Compass::N, Compass::S, Compass::W]
        );
        assert!(dirs.is_relative());
        assert!(!Directions::Adjacent.is_relative());
    }

    #[test]
    fn test_families() {
        assert_eq!(Directions::Adjacent.resolve(Compass::N).len(), 8);
        assert_eq!(
            Directions::Sideways.resolve(Compass::E).as_slice(),
            &[Compass::N, Compass::S]
        );
        assert_eq!(
            Directions::Backwards.resolve(Compass::N).as_slice(),
            &[Compass::S, Compass::SW, Compass::SE]
        );
    }
}
