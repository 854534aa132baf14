//! Card and dice effects.

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::emitter::Emitter;
use super::{Concept, GameFlags, NodeKind, Report, StaticInfo};
use crate::context::Context;
use crate::core::{EngineError, PlayerId};
use crate::functions::IntFn;
use crate::game::Equipment;
use crate::moves::{Action, Move};

/// Deal `count` cards from the deck to every player, one round at a time.
///
/// # Panics
///
/// Evaluation panics with [`EngineError::DeckExhausted`] when the deck holds
/// fewer cards than the deal needs. The game definition is broken at that
/// point and the simulation must be abandoned.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Deal {
    pub count: IntFn,
}

impl Default for Deal {
    fn default() -> Self {
        Self { count: IntFn::Const(1) }
    }
}

impl Deal {
    #[must_use]
    pub fn new(count: IntFn) -> Self {
        Self { count }
    }
}

impl NodeKind for Deal {
    const NAME: &'static str = "Deal";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let Ok(rounds) = usize::try_from(self.count.eval(ctx)) else {
            return ControlFlow::Continue(());
        };
        if rounds == 0 {
            return ControlFlow::Continue(());
        }
        let config = ctx.config();
        let requested = rounds * config.player_count;
        let available = ctx.state().zones().len(config.deck);
        if available < requested {
            let err = EngineError::DeckExhausted {
                zone: config.deck,
                available,
                requested,
            };
            panic!("{err}");
        }
        let mut actions = Vec::with_capacity(requested);
        for _ in 0..rounds {
            actions.extend(PlayerId::all(config.player_count).map(|p| Action::Draw {
                from: config.deck,
                to: config.hand(p),
            }));
        }
        out.emit(Move::new(actions))
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::dynamic(Concept::Deal)
            .reading(self.count.reads())
            .with_flags(GameFlags::CARDS)
    }

    fn missing_requirement(&self, equipment: &Equipment, report: &mut Report) {
        if equipment.components.card_count() == 0 {
            report.missing(Self::NAME, "cards are dealt but no card is defined");
        }
    }
}

/// Roll every die of the game.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Roll;

impl NodeKind for Roll {
    const NAME: &'static str = "Roll";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let dice = &ctx.config().dice;
        if dice.is_empty() {
            return ControlFlow::Continue(());
        }
        let rng = ctx.rng();
        let values: SmallVec<[u32; 4]> = dice.iter().map(|&faces| rng.roll(faces)).collect();
        out.emit(Move::new(vec![Action::SetDice { values }]))
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::dynamic(Concept::Roll).with_flags(GameFlags::DICE.union(GameFlags::STOCHASTIC))
    }

    fn missing_requirement(&self, equipment: &Equipment, report: &mut Report) {
        if equipment.config.dice.is_empty() {
            report.missing(Self::NAME, "dice are rolled but the game has no dice");
        }
    }
}
