//! Betting, messages and turn control.

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};

use super::emitter::Emitter;
use super::{Concept, GameFlags, NodeKind, Report, StaticInfo};
use crate::context::Context;
use crate::core::PlayerId;
use crate::functions::{IntFn, Who};
use crate::game::{Equipment, StringId, StringTable};
use crate::moves::{Action, Move};

// =============================================================================
// Bet
// =============================================================================

/// Stake any amount in `min..=max`. One move per amount.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bet {
    pub who: Who,
    pub min: IntFn,
    pub max: IntFn,
}

impl Bet {
    #[must_use]
    pub fn new(min: IntFn, max: IntFn) -> Self {
        Self { who: Who::Mover, min, max }
    }

    #[must_use]
    pub fn by(mut self, who: Who) -> Self {
        self.who = who;
        self
    }
}

impl NodeKind for Bet {
    const NAME: &'static str = "Bet";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let Some(player) = self.who.resolve(ctx.mover(), ctx.config().player_count) else {
            return ControlFlow::Continue(());
        };
        let (min, max) = (self.min.eval(ctx), self.max.eval(ctx));
        for amount in min..=max {
            out.emit(Move::new(vec![Action::Bet { player, amount }]))?;
        }
        ControlFlow::Continue(())
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::dynamic(Concept::Bet)
            .reading(self.min.reads() | self.max.reads())
            .with_flags(GameFlags::BETTING)
    }

    fn is_decision(&self) -> bool {
        true
    }

    fn will_crash(&self, _equipment: &Equipment, report: &mut Report) {
        if let (IntFn::Const(min), IntFn::Const(max)) = (&self.min, &self.max) {
            if max < min {
                report.crash(Self::NAME, format!("no amount between {min} and {max}"));
            }
        }
    }
}

// =============================================================================
// Messages
// =============================================================================

/// What a message does once sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Vote,
    Propose,
    Note,
    Trigger,
}

/// A vote, proposal, note or event.
///
/// Votes and proposals are chosen by the mover and sent in its own name.
/// Notes and triggers are effects addressed to `who`. The text is interned
/// in the game's string table when the tree is compiled; an uncompiled
/// message generates nothing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
    pub who: Who,
    #[serde(skip)]
    id: Option<StringId>,
}

impl Message {
    #[must_use]
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            who: Who::Mover,
            id: None,
        }
    }

    #[must_use]
    pub fn vote(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Vote, text)
    }

    #[must_use]
    pub fn propose(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Propose, text)
    }

    #[must_use]
    pub fn note(text: impl Into<String>, to: Who) -> Self {
        Self::new(MessageKind::Note, text).to(to)
    }

    #[must_use]
    pub fn trigger(event: impl Into<String>, to: Who) -> Self {
        Self::new(MessageKind::Trigger, event).to(to)
    }

    #[must_use]
    pub fn to(mut self, who: Who) -> Self {
        self.who = who;
        self
    }

    /// Interned text, once compiled.
    #[must_use]
    pub fn id(&self) -> Option<StringId> {
        self.id
    }

    fn action(&self, player: PlayerId, message: StringId) -> Action {
        match self.kind {
            MessageKind::Vote => Action::Vote { player, message },
            MessageKind::Propose => Action::Propose { player, message },
            MessageKind::Note => Action::Note { player, message },
            MessageKind::Trigger => Action::Trigger { player, event: message },
        }
    }
}

impl NodeKind for Message {
    const NAME: &'static str = "Message";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        let Some(id) = self.id else {
            return ControlFlow::Continue(());
        };
        let player = match self.kind {
            MessageKind::Vote | MessageKind::Propose => Some(ctx.mover()),
            MessageKind::Note | MessageKind::Trigger => {
                self.who.resolve(ctx.mover(), ctx.config().player_count)
            }
        };
        match player {
            Some(player) => out.emit(Move::new(vec![self.action(player, id)])),
            None => ControlFlow::Continue(()),
        }
    }

    fn own_info(&self) -> StaticInfo {
        let concept = match self.kind {
            MessageKind::Vote => Concept::Vote,
            MessageKind::Propose => Concept::Propose,
            MessageKind::Note => Concept::Note,
            MessageKind::Trigger => Concept::Trigger,
        };
        StaticInfo::dynamic(concept).with_flags(GameFlags::MESSAGES)
    }

    fn is_decision(&self) -> bool {
        matches!(self.kind, MessageKind::Vote | MessageKind::Propose)
    }

    fn preprocess(&mut self, _equipment: &Equipment, strings: &mut StringTable) {
        self.id = Some(strings.intern(&self.text));
    }

    fn missing_requirement(&self, _equipment: &Equipment, report: &mut Report) {
        if self.text.is_empty() {
            report.missing(Self::NAME, "message has no text");
        }
    }
}

// =============================================================================
// Turn control
// =============================================================================

/// Give up the turn.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Pass;

impl NodeKind for Pass {
    const NAME: &'static str = "Pass";

    fn generate(&self, ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        out.emit(Move::new(vec![Action::Pass { player: ctx.mover() }]))
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::dynamic(Concept::Pass)
    }

    fn is_decision(&self) -> bool {
        true
    }
}

/// The mover plays again after the current move.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MoveAgain;

impl NodeKind for MoveAgain {
    const NAME: &'static str = "MoveAgain";

    fn generate(&self, _ctx: &mut Context<'_>, out: &mut Emitter<'_>) -> ControlFlow<()> {
        out.emit(Move::new(vec![Action::MoveAgain]))
    }

    fn own_info(&self) -> StaticInfo {
        StaticInfo::dynamic(Concept::MoveAgain).with_flags(GameFlags::MOVE_AGAIN)
    }
}
