//! Component registry and name lookup.
//!
//! Rule nodes name pieces the way game descriptions do ("Man", "Arrow"),
//! without saying whose. `PieceRef::Named` resolves to the mover's variant
//! and falls back to the neutral one.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::definition::{Component, ComponentId};
use crate::core::{EngineError, PlayerId};

/// Registry of all components of a game.
///
/// ```
/// use rust_ludeme::components::{Component, ComponentRegistry, PieceRef};
/// use rust_ludeme::core::PlayerId;
///
/// let mut registry = ComponentRegistry::new();
/// let white = registry.register(Component::piece("Man", Some(PlayerId::new(0)))).unwrap();
/// let black = registry.register(Component::piece("Man", Some(PlayerId::new(1)))).unwrap();
///
/// let man = PieceRef::named("Man");
/// assert_eq!(man.resolve(&registry, PlayerId::new(0)), Some(white));
/// assert_eq!(man.resolve(&registry, PlayerId::new(1)), Some(black));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ComponentRegistry {
    components: Vec<Component>,
    by_name: FxHashMap<String, SmallVec<[(Option<PlayerId>, ComponentId); 4]>>,
}

impl ComponentRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component, assigning the next ID.
    ///
    /// Fails if a component with the same name and owner exists.
    pub fn register(&mut self, mut component: Component) -> Result<ComponentId, EngineError> {
        let variants = self.by_name.entry(component.name.clone()).or_default();
        if variants.iter().any(|(owner, _)| *owner == component.owner) {
            return Err(EngineError::DuplicateComponent {
                name: component.name,
                owner: component.owner,
            });
        }
        let id = ComponentId::new(self.components.len() as u16);
        component.id = id;
        variants.push((component.owner, id));
        self.components.push(component);
        Ok(id)
    }

    /// Register one piece per player under the same name.
    pub fn register_per_player(
        &mut self,
        name: &str,
        player_count: usize,
    ) -> Result<Vec<ComponentId>, EngineError> {
        PlayerId::all(player_count)
            .map(|p| self.register(Component::piece(name, Some(p))))
            .collect()
    }

    /// Component by ID.
    #[must_use]
    pub fn get(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.index())
    }

    /// Component by exact name and owner.
    #[must_use]
    pub fn find(&self, name: &str, owner: Option<PlayerId>) -> Option<ComponentId> {
        self.by_name
            .get(name)?
            .iter()
            .find(|(o, _)| *o == owner)
            .map(|(_, id)| *id)
    }

    /// Whether any component has this name.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Iterate over all components in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    /// Pieces owned by `player`.
    pub fn pieces_of(&self, player: PlayerId) -> impl Iterator<Item = &Component> {
        self.components
            .iter()
            .filter(move |c| c.is_piece() && c.owner == Some(player))
    }

    /// Number of card components.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.components.iter().filter(|c| c.is_card()).count()
    }
}

/// Reference to a component from inside a rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceRef {
    /// A specific component.
    Id(ComponentId),
    /// The mover's component with this name, else the neutral one.
    Named(String),
}

impl PieceRef {
    /// Reference by name.
    pub fn named(name: impl Into<String>) -> Self {
        PieceRef::Named(name.into())
    }

    /// Resolve for the given mover.
    #[must_use]
    pub fn resolve(&self, registry: &ComponentRegistry, mover: PlayerId) -> Option<ComponentId> {
        match self {
            PieceRef::Id(id) => registry.get(*id).map(|c| c.id),
            PieceRef::Named(name) => registry
                .find(name, Some(mover))
                .or_else(|| registry.find(name, None)),
        }
    }

    /// Whether `component` is what this reference denotes for some owner.
    #[must_use]
    pub fn matches(&self, registry: &ComponentRegistry, component: ComponentId) -> bool {
        match self {
            PieceRef::Id(id) => *id == component,
            PieceRef::Named(name) => registry.get(component).is_some_and(|c| &c.name == name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ComponentRegistry {
        let mut r = ComponentRegistry::new();
        r.register_per_player("Man", 2).unwrap();
        r.register(Component::piece("Arrow", None)).unwrap();
        r.register(Component::card("Ace")).unwrap();
        r
    }

    #[test]
    fn test_ids_are_dense() {
        let r = registry();
        assert_eq!(r.len(), 4);
        for (i, c) in r.iter().enumerate() {
            assert_eq!(c.id.index(), i);
        }
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut r = registry();
        let err = r
            .register(Component::piece("Man", Some(PlayerId::new(0))))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::DuplicateComponent {
                name: "Man".into(),
                owner: Some(PlayerId::new(0)),
            }
        );
    }

    #[test]
    fn test_named_falls_back_to_neutral() {
        let r = registry();
        let arrow = PieceRef::named("Arrow");
        assert_eq!(arrow.resolve(&r, PlayerId::new(1)), Some(ComponentId::new(2)));
        assert_eq!(PieceRef::named("Queen").resolve(&r, PlayerId::new(0)), None);
        assert_eq!(PieceRef::Id(ComponentId::new(9)).resolve(&r, PlayerId::new(0)), None);
    }

    #[test]
    fn test_matches_any_owner() {
        let r = registry();
        let man = PieceRef::named("Man");
        assert!(man.matches(&r, ComponentId::new(0)));
        assert!(man.matches(&r, ComponentId::new(1)));
        assert!(!man.matches(&r, ComponentId::new(2)));
    }

    #[test]
    fn test_filters() {
        let r = registry();
        assert_eq!(r.pieces_of(PlayerId::new(1)).count(), 1);
        assert_eq!(r.card_count(), 1);
        assert!(r.has_name("Arrow"));
        assert!(!r.has_name("Queen"));
    }
}
