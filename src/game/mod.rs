//! Compiled games and the driver that plays them.
//!
//! [`Game::compile`] takes equipment and a rule tree, runs the one-time
//! preprocessing pass and both validation passes. The compiled game then
//! answers legal-move queries and commits chosen moves, firing their
//! continuations.
//!
//! ## Applying a move
//!
//! 1. The move's actions are applied to the state.
//! 2. Each recorded continuation is evaluated with `from`/`to` bound to the
//!    committed move. Effect moves it produces are applied at once and their
//!    own continuations fired in turn, up to
//!    [`GameConfig::max_continuation_depth`](crate::core::GameConfig) levels.
//! 3. Decision moves produced by continuations are not applied. They are
//!    returned to the caller, and the same player must choose one of them.
//! 4. Otherwise the turn passes on, unless the move asked to move again.

pub mod equipment;
pub mod strings;

pub use equipment::Equipment;
pub use strings::{StringId, StringTable};

use std::sync::Arc;

use crate::context::Context;
use crate::core::EngineError;
use crate::moves::{Move, MoveList};
use crate::rules::{Report, RuleNode, Then};
use crate::state::GameState;

/// A compiled game: equipment plus a preprocessed, validated rule tree.
#[derive(Debug)]
pub struct Game {
    equipment: Equipment,
    rules: RuleNode,
    report: Report,
}

impl Game {
    /// Preprocess `rules` against `equipment` and validate the result.
    ///
    /// Only structural problems with the configuration are errors.
    /// Problems with the rules are collected in [`Game::report`] and leave
    /// the game loadable but unsafe.
    pub fn compile(mut equipment: Equipment, mut rules: RuleNode) -> Result<Self, EngineError> {
        equipment.config.validate()?;

        let mut strings = std::mem::take(&mut equipment.strings);
        rules.preprocess(&equipment, &mut strings);
        equipment.strings = strings;

        let mut report = Report::new();
        rules.missing_requirement(&equipment, &mut report);
        rules.will_crash(&equipment, &mut report);

        log::debug!(
            "compiled {}: {} concepts, flags {:#x}, {} strings, {} diagnostics",
            rules.rule.name(),
            rules.declared_concepts().len(),
            rules.declared_flags().bits(),
            equipment.strings.len(),
            report.len(),
        );

        Ok(Self {
            equipment,
            rules,
            report,
        })
    }

    #[must_use]
    pub fn equipment(&self) -> &Equipment {
        &self.equipment
    }

    #[must_use]
    pub fn rules(&self) -> &RuleNode {
        &self.rules
    }

    /// Diagnostics from the validation passes.
    #[must_use]
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Whether validation found nothing.
    #[must_use]
    pub fn is_safe(&self) -> bool {
        self.report.is_empty()
    }

    /// A fresh position with the given RNG seed.
    #[must_use]
    pub fn new_state(&self, seed: u64) -> GameState {
        GameState::new(&self.equipment, seed)
    }

    /// Every legal move of the player to move, in generation order.
    pub fn legal_moves(&self, state: &mut GameState) -> MoveList {
        let mover = state.mover();
        let moves = self.rules.evaluate(&mut Context::new(&self.equipment, state));
        log::trace!("{} legal moves for {mover}", moves.len());
        moves
    }

    /// Whether the player to move has any legal move.
    pub fn can_move(&self, state: &mut GameState) -> bool {
        self.rules.can_move(&mut Context::new(&self.equipment, state))
    }

    /// Commit `mv` and fire its continuations.
    ///
    /// Returns the decisions the continuations leave to the same player.
    /// When the list is non-empty the mover does not change and the caller
    /// should pick one of them and apply it next.
    pub fn apply(&self, state: &mut GameState, mv: &Move) -> MoveList {
        state.set_move_again(false);
        mv.apply(state);
        if mv.decision {
            state.set_last(mv.from, mv.to);
        }
        state.record_pass(mv.is_pass());

        let mut pending = MoveList::new();
        self.fire(state, mv, 1, &mut pending);

        if pending.is_empty() && !state.move_again() {
            state.advance_mover();
        }
        pending
    }

    fn fire(&self, state: &mut GameState, mv: &Move, depth: usize, pending: &mut MoveList) {
        if mv.then.is_empty() {
            return;
        }
        let limit = self.equipment.config.max_continuation_depth;
        if depth > limit {
            log::warn!("continuations nested deeper than {limit}; the rest are dropped");
            return;
        }
        for then in mv.then.iter() {
            for next in self.continuation(state, then, mv).iter() {
                if next.decision {
                    pending.push(next.clone());
                } else {
                    next.apply(state);
                    self.fire(state, next, depth + 1, pending);
                }
            }
        }
    }

    /// Moves of a continuation, generated with the committed move's sites
    /// bound.
    fn continuation(&self, state: &mut GameState, then: &Arc<Then>, mv: &Move) -> MoveList {
        let mut ctx = Context::new(&self.equipment, state);
        let mut scope = ctx.scope();
        scope.set_from(mv.from);
        scope.set_to(mv.to);
        scope.set_site_type(mv.site_type);
        then.node.evaluate(&mut scope)
    }
}
