//! Card zones.
//!
//! Decks and hands are ordered lists of card components; the end of the list
//! is the top. Backed by `im` so cloning a position stays O(1).

use im::{HashMap as ImHashMap, Vector};

use crate::components::ComponentId;
use crate::core::{GameRng, ZoneId};

/// Ordered card lists keyed by zone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Zones {
    zones: ImHashMap<ZoneId, Vector<ComponentId>>,
}

impl Zones {
    /// Create with no cards anywhere.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cards in a zone.
    #[must_use]
    pub fn len(&self, zone: ZoneId) -> usize {
        self.zones.get(&zone).map_or(0, Vector::len)
    }

    /// Whether a zone holds no cards.
    #[must_use]
    pub fn is_empty(&self, zone: ZoneId) -> bool {
        self.len(zone) == 0
    }

    /// Top card of a zone.
    #[must_use]
    pub fn top(&self, zone: ZoneId) -> Option<ComponentId> {
        self.zones.get(&zone)?.last().copied()
    }

    /// Cards of a zone, bottom to top.
    pub fn cards(&self, zone: ZoneId) -> impl Iterator<Item = ComponentId> + '_ {
        self.zones.get(&zone).into_iter().flat_map(|v| v.iter().copied())
    }

    /// Put a card on top of a zone.
    pub fn push(&mut self, zone: ZoneId, card: ComponentId) {
        self.zones.entry(zone).or_insert_with(Vector::new).push_back(card);
    }

    /// Take the top card of a zone.
    pub fn pop(&mut self, zone: ZoneId) -> Option<ComponentId> {
        self.zones.get_mut(&zone)?.pop_back()
    }

    /// Move the top card of `from` onto `to`. Returns the card moved.
    pub fn draw(&mut self, from: ZoneId, to: ZoneId) -> Option<ComponentId> {
        let card = self.pop(from)?;
        self.push(to, card);
        Some(card)
    }

    /// Shuffle a zone with the game RNG.
    pub fn shuffle(&mut self, zone: ZoneId, rng: &mut GameRng) {
        if let Some(cards) = self.zones.get_mut(&zone) {
            let mut order: Vec<_> = cards.iter().copied().collect();
            rng.shuffle(&mut order);
            *cards = order.into_iter().collect();
        }
    }
}
