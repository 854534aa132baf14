//! Reference game tests.
//!
//! Random playouts through the `Game` driver, checking the invariants each
//! game must keep, plus serialization of whole rule trees.

use rust_ludeme::core::{GameRng, Site, SiteType};
use rust_ludeme::game::Game;
use rust_ludeme::games::{amazons, draughts, go, oware};
use rust_ludeme::moves::MoveList;
use rust_ludeme::rules::RuleNode;
use rust_ludeme::state::GameState;

fn pick(rng: &mut GameRng, moves: &MoveList) -> usize {
    rng.next_int(moves.len() as i32) as usize
}

/// Play one full turn: a move plus any follow-up decisions it leaves.
/// Returns false when the mover has no legal move.
fn play_turn(game: &Game, state: &mut GameState, rng: &mut GameRng) -> bool {
    let moves = game.legal_moves(state);
    if moves.is_empty() {
        return false;
    }
    let mut pending = game.apply(state, &moves.shared()[pick(rng, &moves)]);
    while !pending.is_empty() {
        let choice = pending.shared()[pick(rng, &pending)].clone();
        pending = game.apply(state, &choice);
    }
    true
}

fn pieces(state: &GameState) -> usize {
    state.occupied(SiteType::Cell).count()
}

fn units(state: &GameState, sites: usize) -> u32 {
    (0..sites as u32).map(|s| state.count(SiteType::Cell, Site(s))).sum()
}

// =============================================================================
// Playout Tests
// =============================================================================

/// Test that draughts playouts never add men and keep captures compulsory.
#[test]
fn test_draughts_playouts() {
    let game = draughts::game().unwrap();
    for seed in 0..5 {
        let mut rng = GameRng::new(seed);
        let mut state = draughts::initial_state(&game, seed);
        let mut before = pieces(&state);
        for _ in 0..80 {
            if !play_turn(&game, &mut state, &mut rng) {
                break;
            }
            let after = pieces(&state);
            assert!(after <= before, "a move added men: {before} -> {after}");
            before = after;
        }
    }
}

/// Test that oware playouts conserve or capture seeds, never create them.
#[test]
fn test_oware_playouts() {
    let game = oware::game().unwrap();
    let holes = 2 * oware::HOLES;
    for seed in 0..5 {
        let mut rng = GameRng::new(seed);
        let mut state = oware::initial_state(&game, seed);
        let mut total = units(&state, holes);
        assert_eq!(total, 48);
        for _ in 0..200 {
            let mover = state.mover();
            if !play_turn(&game, &mut state, &mut rng) {
                break;
            }
            let now = units(&state, holes);
            assert!(now <= total);
            total = now;
            assert_eq!(state.mover(), mover.next(2));
        }
    }
}

/// Test that go playouts add at most one stone per turn.
#[test]
fn test_go_playouts() {
    let game = go::game(5).unwrap();
    for seed in 0..5 {
        let mut rng = GameRng::new(seed);
        let mut state = game.new_state(seed);
        for _ in 0..60 {
            let before = pieces(&state);
            assert!(play_turn(&game, &mut state, &mut rng), "passing is always legal");
            assert!(pieces(&state) <= before + 1);
        }
    }
}

/// Test that every amazons turn leaves exactly one new arrow.
#[test]
fn test_amazons_playouts() {
    let game = amazons::game().unwrap();
    let arrow = game.equipment().components.find("Arrow", None).unwrap();
    let sites = amazons::SIZE * amazons::SIZE;
    let arrows = |state: &GameState| {
        (0..sites as u32)
            .filter(|&s| state.what(SiteType::Cell, Site(s), None) == Some(arrow))
            .count()
    };
    let mut rng = GameRng::new(11);
    let mut state = amazons::initial_state(&game, 11);
    for turn in 1..=10 {
        let mover = state.mover();
        assert!(play_turn(&game, &mut state, &mut rng));
        assert_eq!(arrows(&state), turn);
        assert_eq!(pieces(&state), 8 + turn);
        assert_ne!(state.mover(), mover);
    }
}

// =============================================================================
// Serialization Tests
// =============================================================================

/// Test that rule trees survive a JSON round trip and generate the same moves.
#[test]
fn test_rule_trees_round_trip() {
    let cases: Vec<(Game, GameState)> = vec![
        {
            let game = draughts::game().unwrap();
            let state = draughts::initial_state(&game, 0);
            (game, state)
        },
        {
            let game = oware::game().unwrap();
            let state = oware::initial_state(&game, 0);
            (game, state)
        },
        {
            let game = amazons::game().unwrap();
            let state = amazons::initial_state(&game, 0);
            (game, state)
        },
        {
            let game = go::game(5).unwrap();
            let state = game.new_state(0);
            (game, state)
        },
    ];
    let equipment = [
        draughts::equipment().unwrap(),
        oware::equipment().unwrap(),
        amazons::equipment().unwrap(),
        go::equipment(5).unwrap(),
    ];

    for ((game, mut state), eq) in cases.into_iter().zip(equipment) {
        let json = serde_json::to_string(game.rules()).unwrap();
        let rules: RuleNode = serde_json::from_str(&json).unwrap();
        let copy = Game::compile(eq, rules).unwrap();
        assert!(copy.is_safe());

        let expected = game.legal_moves(&mut state);
        let actual = copy.legal_moves(&mut state);
        assert_eq!(expected.len(), actual.len());
        assert_eq!(expected.destinations(), actual.destinations());
    }
}

// =============================================================================
// Sharing Tests
// =============================================================================

/// Test that a compiled game can be shared between threads.
#[test]
fn test_game_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Game>();
    assert_send_sync::<RuleNode>();

    let game = std::sync::Arc::new(go::game(5).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|seed| {
            let game = std::sync::Arc::clone(&game);
            std::thread::spawn(move || {
                let mut state = game.new_state(seed);
                game.legal_moves(&mut state).len()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 26);
    }
}
