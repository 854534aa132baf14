//! Game of the Amazons.
//!
//! A turn is a queen move followed by an arrow shot from the landing
//! square. The shot is a second decision by the same player.

use crate::components::{Component, ComponentRegistry, PieceRef};
use crate::core::{EngineError, GameConfig, PlayerId, Site, SiteType};
use crate::game::{Equipment, Game};
use crate::rules::{ForEachPiece, RuleNode, Shoot, Slide};
use crate::state::{GameState, Piece};
use crate::topology::{Directions, Topology};

pub const SIZE: usize = 10;

#[must_use]
pub fn rules() -> RuleNode {
    RuleNode::from(ForEachPiece::new(Slide::new(Directions::Adjacent)))
        .then(Shoot::new(PieceRef::named("Arrow")))
}

pub fn equipment() -> Result<Equipment, EngineError> {
    let mut components = ComponentRegistry::new();
    components.register_per_player("Queen", 2)?;
    components.register(Component::piece("Arrow", None))?;
    Ok(Equipment::new(GameConfig::new(2), Topology::square(SIZE, SIZE), components))
}

pub fn game() -> Result<Game, EngineError> {
    Game::compile(equipment()?, rules())
}

/// The standard four queens each.
#[must_use]
pub fn initial_state(game: &Game, seed: u64) -> GameState {
    const WHITE: [(usize, usize); 4] = [(0, 3), (0, 6), (3, 0), (3, 9)];
    let mut state = game.new_state(seed);
    let components = &game.equipment().components;
    for player in PlayerId::all(2) {
        let Some(queen) = components.find("Queen", Some(player)) else {
            continue;
        };
        for (row, col) in WHITE {
            let row = if player.index() == 0 { row } else { SIZE - 1 - row };
            let site = Site((row * SIZE + col) as u32);
            state.put(SiteType::Cell, site, Piece::new(queen, Some(player)), 1);
        }
    }
    state
}
