//! Board topology: element graphs, directions, tracks and regions.
//!
//! The topology is built once with the equipment and is read-only during
//! move generation. Rule nodes use it for:
//! - single steps and radials per compass direction
//! - resolving relative directions against a facing
//! - named tracks (sowing) and regions (player areas)

pub mod direction;
pub mod graph;
pub mod track;

pub use direction::{Compass, DirectionList, Directions, Relative, StepType};
pub use graph::Graph;
pub use track::{Region, Track};

use serde::{Deserialize, Serialize};

use crate::core::{EngineError, PlayerId, Site, SiteType};

/// All graphs of a board plus its tracks and regions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    graphs: [Option<Graph>; 3],
    tracks: Vec<Track>,
    regions: Vec<Region>,
}

impl Topology {
    /// Create an empty topology.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A board whose cells form a `rows` x `cols` grid.
    #[must_use]
    pub fn square(rows: usize, cols: usize) -> Self {
        Self::new().with_graph(SiteType::Cell, Graph::square(rows, cols))
    }

    /// Set the graph for one element kind.
    #[must_use]
    pub fn with_graph(mut self, site_type: SiteType, graph: Graph) -> Self {
        self.graphs[site_type.index()] = Some(graph);
        self
    }

    /// Add a track over cells.
    pub fn with_track(mut self, track: Track) -> Result<Self, EngineError> {
        self.check_sites(&track.sites)?;
        self.tracks.push(track);
        Ok(self)
    }

    /// Add a region over cells.
    pub fn with_region(mut self, region: Region) -> Result<Self, EngineError> {
        self.check_sites(&region.sites)?;
        self.regions.push(region);
        Ok(self)
    }

    fn check_sites(&self, sites: &[Site]) -> Result<(), EngineError> {
        let graph = self
            .graph(SiteType::Cell)
            .ok_or(EngineError::MissingGraph(SiteType::Cell))?;
        match sites.iter().find(|s| !graph.contains(**s)) {
            Some(&site) => Err(EngineError::SiteOutOfRange {
                site,
                site_type: SiteType::Cell,
                len: graph.num_sites(),
            }),
            None => Ok(()),
        }
    }

    /// Graph for an element kind.
    #[must_use]
    pub fn graph(&self, site_type: SiteType) -> Option<&Graph> {
        self.graphs[site_type.index()].as_ref()
    }

    /// Number of sites of an element kind (0 when the board has none).
    #[must_use]
    pub fn num_sites(&self, site_type: SiteType) -> usize {
        self.graph(site_type).map_or(0, Graph::num_sites)
    }

    /// All tracks.
    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Track by name.
    #[must_use]
    pub fn track(&self, name: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.name == name)
    }

    /// First track owned by `player`.
    #[must_use]
    pub fn owned_track(&self, player: PlayerId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.owner == Some(player))
    }

    /// Region by name and owner.
    #[must_use]
    pub fn region(&self, name: &str, owner: Option<PlayerId>) -> Option<&Region> {
        self.regions
            .iter()
            .find(|r| r.name == name && r.owner == owner)
    }

    /// Whether any region has this name.
    #[must_use]
    pub fn has_region(&self, name: &str) -> bool {
        self.regions.iter().any(|r| r.name == name)
    }
}
