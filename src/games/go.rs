//! Go without ko or scoring.
//!
//! Players place a stone on any empty point or pass. Enemy groups left
//! without liberties by a placement are removed.

use crate::components::{ComponentRegistry, PieceRef};
use crate::core::{EngineError, GameConfig};
use crate::game::{Equipment, Game};
use crate::rules::{Add, Enclose, Or, Pass, RuleNode};
use crate::topology::Topology;

pub const DEFAULT_SIZE: usize = 9;

#[must_use]
pub fn rules() -> RuleNode {
    RuleNode::from(Or::new([
        RuleNode::from(Add::piece(PieceRef::named("Stone"))).then(Enclose::default()),
        RuleNode::from(Pass),
    ]))
}

pub fn equipment(size: usize) -> Result<Equipment, EngineError> {
    let mut components = ComponentRegistry::new();
    components.register_per_player("Stone", 2)?;
    Ok(Equipment::new(GameConfig::new(2), Topology::square(size, size), components))
}

pub fn game(size: usize) -> Result<Game, EngineError> {
    Game::compile(equipment(size)?, rules())
}
