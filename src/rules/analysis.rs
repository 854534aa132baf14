//! Static analysis of rule trees.
//!
//! Each node declares game flags, concepts and the scratch fields it reads
//! and writes. The compile pass folds these bottom-up once and stores the
//! result on every node, so queries never walk the tree during play.

use serde::{Deserialize, Serialize};

use crate::context::EnvFields;

/// Game-level properties implied by the rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameFlags(u32);

impl GameFlags {
    pub const EMPTY: GameFlags = GameFlags(0);
    /// Uses the RNG (dice, random branches).
    pub const STOCHASTIC: GameFlags = GameFlags(1 << 0);
    /// Moves pieces on stacks.
    pub const STACKING: GameFlags = GameFlags(1 << 1);
    /// Uses tracks for sowing.
    pub const SOWING: GameFlags = GameFlags(1 << 2);
    /// Deals cards.
    pub const CARDS: GameFlags = GameFlags(1 << 3);
    /// Rolls dice.
    pub const DICE: GameFlags = GameFlags(1 << 4);
    /// Places bets.
    pub const BETTING: GameFlags = GameFlags(1 << 5);
    /// Votes, proposals, notes or triggers.
    pub const MESSAGES: GameFlags = GameFlags(1 << 6);
    /// Removes pieces as a consequence of moves.
    pub const CAPTURE: GameFlags = GameFlags(1 << 7);
    /// Lets the mover move again.
    pub const MOVE_AGAIN: GameFlags = GameFlags(1 << 8);
    /// Depends on piece facing.
    pub const ROTATION: GameFlags = GameFlags(1 << 9);
    /// Uses piece local state.
    pub const PIECE_STATE: GameFlags = GameFlags(1 << 10);
    /// Uses piece values or counts.
    pub const PIECE_VALUE: GameFlags = GameFlags(1 << 11);

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: GameFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn union(self, other: GameFlags) -> Self {
        GameFlags(self.0 | other.0)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for GameFlags {
    type Output = GameFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for GameFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// A game concept a rule exhibits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Concept {
    // === Movement ===
    Step,
    Slide,
    Hop,
    Leap,
    Shoot,
    Push,
    Attract,
    FromTo,

    // === Placement and pieces ===
    Placement,
    Removal,
    Flip,
    Promotion,
    SetSite,
    Select,

    // === Capture ===
    HopCapture,
    ReplacementCapture,
    CustodialCapture,
    InterveneCapture,
    DirectionalCapture,
    EncloseCapture,
    SurroundCapture,

    // === Sowing, cards, dice ===
    Sow,
    SowCapture,
    Deal,
    Roll,

    // === Social ===
    Bet,
    Vote,
    Propose,
    Note,
    Trigger,
    Pass,

    // === Control ===
    MoveAgain,
    Priority,
    Sequence,
    Random,
    Conditional,
    ForEachPiece,
}

impl Concept {
    const fn bit(self) -> u64 {
        1 << self as u8
    }
}

/// Set of concepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConceptSet(u64);

impl ConceptSet {
    pub const EMPTY: ConceptSet = ConceptSet(0);

    #[must_use]
    pub const fn of(concept: Concept) -> Self {
        ConceptSet(concept.bit())
    }

    #[must_use]
    pub const fn with(self, concept: Concept) -> Self {
        ConceptSet(self.0 | concept.bit())
    }

    #[must_use]
    pub const fn union(self, other: ConceptSet) -> Self {
        ConceptSet(self.0 | other.0)
    }

    #[must_use]
    pub const fn contains(self, concept: Concept) -> bool {
        self.0 & concept.bit() != 0
    }

    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Concept> for ConceptSet {
    fn from_iter<I: IntoIterator<Item = Concept>>(iter: I) -> Self {
        iter.into_iter().fold(ConceptSet::EMPTY, ConceptSet::with)
    }
}

/// Folded static properties of a node and its subtree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaticInfo {
    pub flags: GameFlags,
    pub concepts: ConceptSet,
    /// Scratch fields read from the caller.
    pub reads: EnvFields,
    /// Scratch fields bound for subtrees.
    pub writes: EnvFields,
    /// Independent of position and scratch.
    pub is_static: bool,
}

impl StaticInfo {
    /// A node with no declarations of its own.
    pub const NEUTRAL: StaticInfo = StaticInfo {
        flags: GameFlags::EMPTY,
        concepts: ConceptSet::EMPTY,
        reads: EnvFields::EMPTY,
        writes: EnvFields::EMPTY,
        is_static: true,
    };

    /// Position-dependent node exhibiting `concept`.
    #[must_use]
    pub const fn dynamic(concept: Concept) -> Self {
        StaticInfo {
            concepts: ConceptSet::of(concept),
            is_static: false,
            ..Self::NEUTRAL
        }
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: GameFlags) -> Self {
        self.flags = self.flags.union(flags);
        self
    }

    #[must_use]
    pub const fn with_concept(mut self, concept: Concept) -> Self {
        self.concepts = self.concepts.with(concept);
        self
    }

    #[must_use]
    pub const fn reading(mut self, fields: EnvFields) -> Self {
        self.reads = self.reads.union(fields);
        self
    }

    #[must_use]
    pub const fn writing(mut self, fields: EnvFields) -> Self {
        self.writes = self.writes.union(fields);
        self
    }

    /// Fold in a subtree whose reads of `self.writes` are satisfied here.
    pub fn absorb(&mut self, child: StaticInfo) {
        self.flags |= child.flags;
        self.concepts = self.concepts.union(child.concepts);
        self.reads = self.reads | child.reads.without(self.writes);
        self.is_static &= child.is_static;
    }
}

impl Default for StaticInfo {
    fn default() -> Self {
        Self::NEUTRAL
    }
}
