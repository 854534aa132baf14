//! Equipment: everything static a game is played with.
//!
//! Configuration, board topology, component registry and the message string
//! table. Shared read-only by every evaluation.

use super::strings::StringTable;
use crate::components::ComponentRegistry;
use crate::core::GameConfig;
use crate::topology::Topology;

/// Static game equipment.
#[derive(Clone, Debug)]
pub struct Equipment {
    /// Game-wide settings.
    pub config: GameConfig,
    /// Board graphs, tracks and regions.
    pub topology: Topology,
    /// Pieces, cards and dice.
    pub components: ComponentRegistry,
    /// Message strings registered by the compile pass.
    pub strings: StringTable,
}

impl Equipment {
    /// Bundle equipment with an empty string table.
    #[must_use]
    pub fn new(config: GameConfig, topology: Topology, components: ComponentRegistry) -> Self {
        Self {
            config,
            topology,
            components,
            strings: StringTable::new(),
        }
    }
}
