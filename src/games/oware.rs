//! Oware (Abapa) sowing.
//!
//! The mover picks up every seed from a non-empty hole on their own row
//! and sows them anticlockwise, skipping the emptied hole on laps. If the
//! last seed lands in an opponent hole that then holds two or three seeds,
//! that hole is captured along with the unbroken run of such holes before
//! it.

use crate::components::{Component, ComponentRegistry};
use crate::core::{EngineError, GameConfig, PlayerId, Site, SiteType};
use crate::functions::{BoolFn, IntFn, RegionFn, SiteFn, Who};
use crate::game::{Equipment, Game};
use crate::rules::{RuleNode, Select, Sow};
use crate::state::{GameState, Piece};
use crate::topology::{Region, Topology, Track};

pub const HOLES: usize = 6;

pub const SEEDS_PER_HOLE: u32 = 4;

#[must_use]
pub fn rules() -> RuleNode {
    let count = || IntFn::Count(SiteFn::To);
    let capture = BoolFn::all([
        BoolFn::is_in(SiteFn::To, RegionFn::region("Home", Who::Next)),
        BoolFn::Ge(count(), IntFn::Const(2)),
        BoolFn::Le(count(), IntFn::Const(3)),
    ]);
    let pick = Select::new(RegionFn::region("Home", Who::Mover))
        .with_go(BoolFn::Gt(count(), IntFn::Const(0)));
    RuleNode::from(pick).then(
        Sow::default()
            .track("Track")
            .exclude_self()
            .capture_if(capture)
            .backtracking(),
    )
}

/// Two rows of holes joined into one anticlockwise loop. Row 0 belongs to
/// the first player.
pub fn equipment() -> Result<Equipment, EngineError> {
    let hole = |row: usize, col: usize| Site((row * HOLES + col) as u32);
    let lap = (0..HOLES)
        .map(|c| hole(0, c))
        .chain((0..HOLES).rev().map(|c| hole(1, c)))
        .collect();
    let topology = Topology::square(2, HOLES)
        .with_track(Track::new("Track", lap).looped())?
        .with_region(
            Region::new("Home", (0..HOLES).map(|c| hole(0, c)).collect()).with_owner(PlayerId::new(0)),
        )?
        .with_region(
            Region::new("Home", (0..HOLES).map(|c| hole(1, c)).collect()).with_owner(PlayerId::new(1)),
        )?;
    let mut components = ComponentRegistry::new();
    components.register(Component::piece("Seed", None))?;
    Ok(Equipment::new(GameConfig::new(2), topology, components))
}

pub fn game() -> Result<Game, EngineError> {
    Game::compile(equipment()?, rules())
}

/// Four seeds in every hole.
#[must_use]
pub fn initial_state(game: &Game, seed: u64) -> GameState {
    let mut state = game.new_state(seed);
    if let Some(id) = game.equipment().components.find("Seed", None) {
        for site in 0..(2 * HOLES) as u32 {
            state.put(SiteType::Cell, Site(site), Piece::new(id, None), SEEDS_PER_HOLE);
        }
    }
    state
}
