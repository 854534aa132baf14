//! Move sink shared by all nodes.
//!
//! Every node has a single generator that pushes moves into an `Emitter`.
//! The emitter stamps the node's mover, decision flag and continuation onto
//! each move before handing it to the caller's sink. The sink decides
//! whether generation goes on, which is how `can_move` stops at the first
//! move while `evaluate` collects them all.

use std::ops::ControlFlow;
use std::sync::Arc;

use super::Then;
use crate::core::PlayerId;
use crate::moves::Move;

/// Caller-side receiver of generated moves.
pub type Sink<'s> = dyn FnMut(Arc<Move>) -> ControlFlow<()> + 's;

pub(crate) struct Emitter<'s> {
    mover: PlayerId,
    decision: bool,
    then: Option<&'s Arc<Then>>,
    sink: &'s mut Sink<'s>,
}

impl<'s> Emitter<'s> {
    pub(crate) fn new(
        mover: PlayerId,
        decision: bool,
        then: Option<&'s Arc<Then>>,
        sink: &'s mut Sink<'s>,
    ) -> Self {
        Self {
            mover,
            decision,
            then,
            sink,
        }
    }

    /// Stamp this node's metadata onto a move.
    pub(crate) fn finish(&self, mut mv: Move) -> Move {
        self.stamp(&mut mv);
        mv
    }

    fn stamp(&self, mv: &mut Move) {
        mv.mover = self.mover;
        mv.decision |= self.decision;
        if let Some(then) = self.then {
            mv.then.push(Arc::clone(then));
        }
    }

    fn needs_stamp(&self, mv: &Move) -> bool {
        mv.mover != self.mover || (self.decision && !mv.decision) || self.then.is_some()
    }

    /// Emit a fresh move.
    pub(crate) fn emit(&mut self, mv: Move) -> ControlFlow<()> {
        let mv = self.finish(mv);
        (self.sink)(Arc::new(mv))
    }

    /// Emit a move produced by a child node. Copies it only when this node
    /// has something to add.
    pub(crate) fn emit_shared(&mut self, mut mv: Arc<Move>) -> ControlFlow<()> {
        if self.needs_stamp(&mv) {
            self.stamp(Arc::make_mut(&mut mv));
        }
        (self.sink)(mv)
    }

    /// Emit a move that already went through [`Emitter::finish`].
    pub(crate) fn emit_finished(&mut self, mv: Arc<Move>) -> ControlFlow<()> {
        (self.sink)(mv)
    }
}
