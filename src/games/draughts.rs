//! Draughts with men only.
//!
//! Men step diagonally forward and capture by hopping over an adjacent
//! enemy in any diagonal direction. Captures are compulsory, and a man
//! that captured keeps hopping while it can: the continuation grants
//! another move and the next turn is restricted to hops from the last
//! landing site.

use crate::components::{ComponentRegistry, PieceRef};
use crate::core::{EngineError, GameConfig, PlayerId, Site, SiteType};
use crate::functions::{BoolFn, RegionFn, SiteFn};
use crate::game::{Equipment, Game};
use crate::rules::{ForEachPiece, Hop, If, MoveAgain, Priority, Remove, RuleNode, Step};
use crate::state::{GameState, Piece};
use crate::topology::{Directions, Relative, Topology};

/// Board side.
pub const SIZE: usize = 8;

/// Rows of men each player starts with.
pub const ROWS: usize = 3;

fn capture(from: SiteFn) -> Hop {
    Hop::new(Directions::Diagonal)
        .from(from)
        .with_hurdle_effect(Remove::at(RegionFn::Site(SiteFn::Between)))
}

fn keep_capturing() -> RuleNode {
    RuleNode::from(If::new(BoolFn::can_move(capture(SiteFn::To)), MoveAgain))
}

/// The rule tree.
#[must_use]
pub fn rules() -> RuleNode {
    let forward = Directions::Union(vec![
        Directions::Relative(Relative::ForwardLeft),
        Directions::Relative(Relative::ForwardRight),
    ]);
    let continue_chain = RuleNode::from(capture(SiteFn::LastTo)).then(keep_capturing());
    let fresh = Priority::new([
        RuleNode::from(ForEachPiece::new(capture(SiteFn::From))).then(keep_capturing()),
        RuleNode::from(ForEachPiece::new(Step::new(forward))),
    ]);
    RuleNode::from(If::new(BoolFn::Continuing, continue_chain).otherwise(fresh))
}

/// Board and one kind of man per player.
pub fn equipment() -> Result<Equipment, EngineError> {
    let mut components = ComponentRegistry::new();
    components.register_per_player("Man", 2)?;
    Ok(Equipment::new(GameConfig::new(2), Topology::square(SIZE, SIZE), components))
}

pub fn game() -> Result<Game, EngineError> {
    Game::compile(equipment()?, rules())
}

/// Men on the dark squares of each player's first rows.
#[must_use]
pub fn initial_state(game: &Game, seed: u64) -> GameState {
    let mut state = game.new_state(seed);
    let components = &game.equipment().components;
    for player in PlayerId::all(2) {
        let Some(man) = PieceRef::named("Man").resolve(components, player) else {
            continue;
        };
        let rows = match player.index() {
            0 => 0..ROWS,
            _ => SIZE - ROWS..SIZE,
        };
        for row in rows {
            for col in (0..SIZE).filter(|c| (row + c) % 2 == 0) {
                let site = Site((row * SIZE + col) as u32);
                state.put(SiteType::Cell, site, Piece::new(man, Some(player)), 1);
            }
        }
    }
    state
}
