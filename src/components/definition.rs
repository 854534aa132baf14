//! Component definitions: pieces, cards and dice.
//!
//! A `Component` is the static description of a kind of game object
//! ("White Man", "Arrow", "Ace of Spades"). Which component sits where is
//! game state; what a component is never changes during play.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;

/// Identifier of a registered component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u16);

impl ComponentId {
    /// Create a new component ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Index as `usize`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Component({})", self.0)
    }
}

/// What kind of object a component is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// A board piece.
    Piece,
    /// A card kept in zones.
    Card,
    /// A die with the given number of faces.
    Die { faces: u32 },
}

/// Static description of one component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Assigned by the registry.
    pub id: ComponentId,
    /// Name shared by all owners' variants ("Man", "Stone").
    pub name: String,
    /// Owning player, `None` for neutral components.
    pub owner: Option<PlayerId>,
    /// Piece, card or die.
    pub kind: ComponentKind,
    /// The two local states a flip alternates between, if flippable.
    pub flips: Option<(i32, i32)>,
}

impl Component {
    /// A piece owned by `owner` (or neutral).
    pub fn piece(name: impl Into<String>, owner: Option<PlayerId>) -> Self {
        Self {
            id: ComponentId::new(0),
            name: name.into(),
            owner,
            kind: ComponentKind::Piece,
            flips: None,
        }
    }

    /// A neutral card.
    pub fn card(name: impl Into<String>) -> Self {
        Self {
            kind: ComponentKind::Card,
            ..Self::piece(name, None)
        }
    }

    /// A neutral die.
    pub fn die(name: impl Into<String>, faces: u32) -> Self {
        Self {
            kind: ComponentKind::Die { faces },
            ..Self::piece(name, None)
        }
    }

    /// Make the component flippable between two local states.
    #[must_use]
    pub fn with_flips(mut self, a: i32, b: i32) -> Self {
        self.flips = Some((a, b));
        self
    }

    /// Whether this is a board piece.
    #[must_use]
    pub fn is_piece(&self) -> bool {
        self.kind == ComponentKind::Piece
    }

    /// Whether this is a card.
    #[must_use]
    pub fn is_card(&self) -> bool {
        self.kind == ComponentKind::Card
    }

    /// The state a flip turns `state` into, if this component flips.
    #[must_use]
    pub fn flipped(&self, state: i32) -> Option<i32> {
        let (a, b) = self.flips?;
        Some(if state == a { b } else { a })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_id() {
        let id = ComponentId::new(4);
        assert_eq!(id.raw(), 4);
        assert_eq!(id.index(), 4);
        assert_eq!(format!("{}", id), "Component(4)");
    }

    #[test]
    fn test_constructors() {
        let man = Component::piece("Man", Some(PlayerId::new(1)));
        assert!(man.is_piece());
        assert_eq!(man.owner, Some(PlayerId::new(1)));

        let card = Component::card("Ace");
        assert!(card.is_card());
        assert_eq!(card.owner, None);

        let die = Component::die("D6", 6);
        assert_eq!(die.kind, ComponentKind::Die { faces: 6 });
    }

    #[test]
    fn test_flipped() {
        let disc = Component::piece("Disc", None).with_flips(1, 2);
        assert_eq!(disc.flipped(1), Some(2));
        assert_eq!(disc.flipped(2), Some(1));
        assert_eq!(disc.flipped(0), Some(1));
        assert_eq!(Component::piece("Man", None).flipped(1), None);
    }
}
