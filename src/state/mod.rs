//! Game state: what is where, whose turn it is, and the RNG.
//!
//! ## Accessor contract
//!
//! Rule nodes observe a position only through the read accessors below
//! (`what`, `who`, `state_at`, `rotation_at`, `value_at`, `count`,
//! `stack_size`, `is_empty`, `mover`) and draw randomness through
//! `rng_mut`. Positions change only by applying actions.
//!
//! ## Persistence
//!
//! Containers are `im` vectors, so cloning a `GameState` is O(1) and clones
//! share structure until written. Hypothetical evaluation (sowing captures,
//! search rollouts) clones freely.

pub mod piece;
pub mod zones;

pub use piece::{Lifted, Piece, Slot};
pub use zones::Zones;

use im::{HashSet as ImHashSet, Vector};
use smallvec::SmallVec;

use crate::components::ComponentId;
use crate::core::{GameRng, PlayerId, PlayerMap, Site, SiteType, ZoneId};
use crate::game::{Equipment, StringId};

/// Complete mutable game state.
#[derive(Clone, Debug)]
pub struct GameState {
    // === Configuration ===
    player_count: usize,
    stacking: bool,

    // === Turn ===
    mover: PlayerId,
    move_again: bool,
    consecutive_passes: u32,
    last_from: Option<Site>,
    last_to: Option<Site>,

    // === Board ===
    containers: [Vector<Slot>; 3],

    // === Cards and dice ===
    zones: Zones,
    dice: SmallVec<[u32; 4]>,

    // === Social ===
    pot: i64,
    bets: PlayerMap<i64>,
    votes: Vector<(PlayerId, StringId)>,
    proposals: Vector<(PlayerId, StringId)>,
    notes: Vector<(PlayerId, StringId)>,
    triggered: ImHashSet<(PlayerId, StringId)>,

    rng: GameRng,
}

impl GameState {
    /// Create the empty starting position for `equipment`.
    ///
    /// Player 0 moves first.
    #[must_use]
    pub fn new(equipment: &Equipment, seed: u64) -> Self {
        let config = &equipment.config;
        let container = |t: SiteType| {
            let n = equipment.topology.num_sites(t);
            Vector::from(vec![Slot::default(); n])
        };
        Self {
            player_count: config.player_count,
            stacking: config.stacking,
            mover: PlayerId::new(0),
            move_again: false,
            consecutive_passes: 0,
            last_from: None,
            last_to: None,
            containers: [
                container(SiteType::Cell),
                container(SiteType::Vertex),
                container(SiteType::Edge),
            ],
            zones: Zones::new(),
            dice: config.dice.iter().map(|_| 0).collect(),
            pot: 0,
            bets: PlayerMap::with_value(config.player_count, 0),
            votes: Vector::new(),
            proposals: Vector::new(),
            notes: Vector::new(),
            triggered: ImHashSet::new(),
            rng: GameRng::new(seed),
        }
    }

    // === Players ===

    /// Number of players.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    /// Whether sites hold stacks.
    #[must_use]
    pub fn is_stacking(&self) -> bool {
        self.stacking
    }

    /// Player to move.
    #[must_use]
    pub fn mover(&self) -> PlayerId {
        self.mover
    }

    /// Player after the mover.
    #[must_use]
    pub fn next_player(&self) -> PlayerId {
        self.mover.next(self.player_count)
    }

    /// Set the player to move.
    pub fn set_mover(&mut self, player: PlayerId) {
        self.mover = player;
    }

    /// Hand the turn to the next player.
    pub fn advance_mover(&mut self) {
        self.mover = self.next_player();
    }

    /// The last applied move asked for another move by the same player.
    #[must_use]
    pub fn move_again(&self) -> bool {
        self.move_again
    }

    pub(crate) fn set_move_again(&mut self, again: bool) {
        self.move_again = again;
    }

    /// Passes in a row since the last non-pass move.
    #[must_use]
    pub fn consecutive_passes(&self) -> u32 {
        self.consecutive_passes
    }

    pub(crate) fn record_pass(&mut self, passed: bool) {
        self.consecutive_passes = if passed { self.consecutive_passes + 1 } else { 0 };
    }

    /// Origin of the last decision move.
    #[must_use]
    pub fn last_from(&self) -> Option<Site> {
        self.last_from
    }

    /// Destination of the last decision move.
    #[must_use]
    pub fn last_to(&self) -> Option<Site> {
        self.last_to
    }

    pub(crate) fn set_last(&mut self, from: Option<Site>, to: Option<Site>) {
        self.last_from = from;
        self.last_to = to;
    }

    /// The RNG for this position.
    pub fn rng_mut(&mut self) -> &mut GameRng {
        &mut self.rng
    }

    // === Board reads ===

    /// Contents of a site.
    #[must_use]
    pub fn slot(&self, site_type: SiteType, site: Site) -> Option<&Slot> {
        self.containers[site_type.index()].get(site.index())
    }

    /// Number of sites of an element kind.
    #[must_use]
    pub fn num_sites(&self, site_type: SiteType) -> usize {
        self.containers[site_type.index()].len()
    }

    /// Piece at `level` (top for `None`).
    #[must_use]
    pub fn piece(&self, site_type: SiteType, site: Site, level: Option<usize>) -> Option<Piece> {
        self.slot(site_type, site)?.at(level).copied()
    }

    /// Component at a site.
    #[must_use]
    pub fn what(&self, site_type: SiteType, site: Site, level: Option<usize>) -> Option<ComponentId> {
        self.piece(site_type, site, level).map(|p| p.what)
    }

    /// Owner of the piece at a site.
    #[must_use]
    pub fn who(&self, site_type: SiteType, site: Site, level: Option<usize>) -> Option<PlayerId> {
        self.piece(site_type, site, level).and_then(|p| p.who)
    }

    /// Local state at a site (0 when empty).
    #[must_use]
    pub fn state_at(&self, site_type: SiteType, site: Site, level: Option<usize>) -> i32 {
        self.piece(site_type, site, level).map_or(0, |p| p.state)
    }

    /// Rotation at a site (0 when empty).
    #[must_use]
    pub fn rotation_at(&self, site_type: SiteType, site: Site, level: Option<usize>) -> u8 {
        self.piece(site_type, site, level).map_or(0, |p| p.rotation)
    }

    /// Value at a site (0 when empty).
    #[must_use]
    pub fn value_at(&self, site_type: SiteType, site: Site, level: Option<usize>) -> i64 {
        self.piece(site_type, site, level).map_or(0, |p| p.value)
    }

    /// Units at a site.
    #[must_use]
    pub fn count(&self, site_type: SiteType, site: Site) -> u32 {
        self.slot(site_type, site).map_or(0, Slot::count)
    }

    /// Stack height at a site.
    #[must_use]
    pub fn stack_size(&self, site_type: SiteType, site: Site) -> usize {
        self.slot(site_type, site).map_or(0, Slot::height)
    }

    /// Whether a site exists and holds nothing.
    #[must_use]
    pub fn is_empty(&self, site_type: SiteType, site: Site) -> bool {
        self.slot(site_type, site).is_some_and(Slot::is_empty)
    }

    /// Occupied sites, in index order.
    pub fn occupied(&self, site_type: SiteType) -> impl Iterator<Item = Site> + '_ {
        self.containers[site_type.index()]
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.is_empty())
            .map(|(i, _)| Site(i as u32))
    }

    /// Sites whose top piece belongs to `player`.
    pub fn occupied_by(&self, site_type: SiteType, player: PlayerId) -> impl Iterator<Item = Site> + '_ {
        self.containers[site_type.index()]
            .iter()
            .enumerate()
            .filter(move |(_, slot)| slot.at(None).is_some_and(|p| p.who == Some(player)))
            .map(|(i, _)| Site(i as u32))
    }

    // === Board writes ===

    pub(crate) fn slot_mut(&mut self, site_type: SiteType, site: Site) -> Option<&mut Slot> {
        self.containers[site_type.index()].get_mut(site.index())
    }

    /// Put `count` units of `piece` on a site (setup and action application).
    pub fn put(&mut self, site_type: SiteType, site: Site, piece: Piece, count: u32) {
        let stacking = self.stacking;
        if let Some(slot) = self.slot_mut(site_type, site) {
            slot.add(piece, count, None, stacking);
        }
    }

    /// Empty a site.
    pub fn clear(&mut self, site_type: SiteType, site: Site) {
        if let Some(slot) = self.slot_mut(site_type, site) {
            slot.replace(None, 0);
        }
    }

    // === Cards, dice, social ===

    /// Card zones.
    #[must_use]
    pub fn zones(&self) -> &Zones {
        &self.zones
    }

    /// Mutable card zones.
    pub fn zones_mut(&mut self) -> &mut Zones {
        &mut self.zones
    }

    /// Fill a zone with cards, bottom first.
    pub fn fill_zone(&mut self, zone: ZoneId, cards: impl IntoIterator<Item = ComponentId>) {
        for card in cards {
            self.zones.push(zone, card);
        }
    }

    /// Current face values of the dice.
    #[must_use]
    pub fn dice(&self) -> &[u32] {
        &self.dice
    }

    pub(crate) fn set_dice(&mut self, values: &[u32]) {
        self.dice = values.iter().copied().collect();
    }

    /// Total staked.
    #[must_use]
    pub fn pot(&self) -> i64 {
        self.pot
    }

    /// Amount a player has staked.
    #[must_use]
    pub fn bet(&self, player: PlayerId) -> i64 {
        self.bets.get(player).copied().unwrap_or(0)
    }

    pub(crate) fn place_bet(&mut self, player: PlayerId, amount: i64) {
        if let Some(b) = self.bets.get_mut(player) {
            *b += amount;
            self.pot += amount;
        }
    }

    /// Votes cast, in order.
    #[must_use]
    pub fn votes(&self) -> &Vector<(PlayerId, StringId)> {
        &self.votes
    }

    /// Proposals made, in order.
    #[must_use]
    pub fn proposals(&self) -> &Vector<(PlayerId, StringId)> {
        &self.proposals
    }

    /// Notes sent, in order.
    #[must_use]
    pub fn notes(&self) -> &Vector<(PlayerId, StringId)> {
        &self.notes
    }

    /// Whether an event has been triggered for a player.
    #[must_use]
    pub fn is_triggered(&self, player: PlayerId, event: StringId) -> bool {
        self.triggered.contains(&(player, event))
    }

    pub(crate) fn push_vote(&mut self, player: PlayerId, message: StringId) {
        self.votes.push_back((player, message));
    }

    pub(crate) fn push_proposal(&mut self, player: PlayerId, message: StringId) {
        self.proposals.push_back((player, message));
    }

    pub(crate) fn push_note(&mut self, player: PlayerId, message: StringId) {
        self.notes.push_back((player, message));
    }

    pub(crate) fn trigger(&mut self, player: PlayerId, event: StringId) {
        self.triggered.insert((player, event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentRegistry;
    use crate::core::GameConfig;
    use crate::topology::Topology;

    fn equipment() -> Equipment {
        Equipment::new(GameConfig::new(2), Topology::square(3, 3), ComponentRegistry::new())
    }

    fn stone(who: u8) -> Piece {
        Piece::new(ComponentId::new(who as u16), Some(PlayerId::new(who)))
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = GameState::new(&equipment(), 1);
        assert_eq!(state.num_sites(SiteType::Cell), 9);
        assert_eq!(state.num_sites(SiteType::Vertex), 0);
        assert!(state.is_empty(SiteType::Cell, Site(4)));
        assert!(!state.is_empty(SiteType::Cell, Site(40)));
        assert_eq!(state.mover(), PlayerId::new(0));
        assert_eq!(state.occupied(SiteType::Cell).count(), 0);
    }

    #[test]
    fn test_accessors_after_put() {
        let mut state = GameState::new(&equipment(), 1);
        state.put(SiteType::Cell, Site(4), stone(1).with_state(2).with_value(7), 3);
        assert_eq!(state.what(SiteType::Cell, Site(4), None), Some(ComponentId::new(1)));
        assert_eq!(state.who(SiteType::Cell, Site(4), None), Some(PlayerId::new(1)));
        assert_eq!(state.state_at(SiteType::Cell, Site(4), None), 2);
        assert_eq!(state.value_at(SiteType::Cell, Site(4), Some(0)), 7);
        assert_eq!(state.count(SiteType::Cell, Site(4)), 3);
        assert_eq!(state.stack_size(SiteType::Cell, Site(4)), 1);
        assert_eq!(
            state.occupied_by(SiteType::Cell, PlayerId::new(1)).collect::<Vec<_>>(),
            vec![Site(4)]
        );
        state.clear(SiteType::Cell, Site(4));
        assert!(state.is_empty(SiteType::Cell, Site(4)));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut state = GameState::new(&equipment(), 1);
        let snapshot = state.clone();
        state.put(SiteType::Cell, Site(0), stone(0), 1);
        state.advance_mover();
        assert!(snapshot.is_empty(SiteType::Cell, Site(0)));
        assert_eq!(snapshot.mover(), PlayerId::new(0));
        assert_eq!(state.mover(), PlayerId::new(1));
    }

    #[test]
    fn test_bets_accumulate_in_pot() {
        let mut state = GameState::new(&equipment(), 1);
        state.place_bet(PlayerId::new(0), 5);
        state.place_bet(PlayerId::new(1), 3);
        state.place_bet(PlayerId::new(0), 2);
        assert_eq!(state.bet(PlayerId::new(0)), 7);
        assert_eq!(state.pot(), 10);
        assert_eq!(state.bet(PlayerId::new(7)), 0);
    }
}
