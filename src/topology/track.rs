//! Named tracks and regions.
//!
//! A track is a predefined ordering of sites (the sowing loop of a mancala
//! board, the running track of a race game). A region is a named, possibly
//! player-owned set of sites (a player's row of holes, a home zone).

use serde::{Deserialize, Serialize};

use crate::core::{PlayerId, Site};

/// A named ordering of sites.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Track name.
    pub name: String,
    /// Owning player, `None` for shared tracks.
    pub owner: Option<PlayerId>,
    /// Sites in walking order.
    pub sites: Vec<Site>,
    /// Walking past the last site continues at the first.
    pub looped: bool,
}

impl Track {
    /// Create an open (non-looping) shared track.
    pub fn new(name: impl Into<String>, sites: Vec<Site>) -> Self {
        Self {
            name: name.into(),
            owner: None,
            sites,
            looped: false,
        }
    }

    /// Set the owner.
    #[must_use]
    pub fn with_owner(mut self, owner: PlayerId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Make the track wrap around.
    #[must_use]
    pub fn looped(mut self) -> Self {
        self.looped = true;
        self
    }

    /// Number of positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Whether the track has no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// First position of `site` on the track.
    #[must_use]
    pub fn position(&self, site: Site) -> Option<usize> {
        self.sites.iter().position(|&s| s == site)
    }

    /// Site at a position.
    #[must_use]
    pub fn site(&self, index: usize) -> Option<Site> {
        self.sites.get(index).copied()
    }

    /// Position after `index`, wrapping on looped tracks.
    #[must_use]
    pub fn next_index(&self, index: usize) -> Option<usize> {
        if index + 1 < self.sites.len() {
            Some(index + 1)
        } else if self.looped && !self.sites.is_empty() {
            Some(0)
        } else {
            None
        }
    }

    /// Position before `index`, wrapping on looped tracks.
    #[must_use]
    pub fn prev_index(&self, index: usize) -> Option<usize> {
        if index > 0 {
            Some(index - 1)
        } else if self.looped && !self.sites.is_empty() {
            Some(self.sites.len() - 1)
        } else {
            None
        }
    }
}

/// A named set of sites.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Region name; several players may each own a region with the same name.
    pub name: String,
    /// Owning player, `None` for shared regions.
    pub owner: Option<PlayerId>,
    /// Member sites.
    pub sites: Vec<Site>,
}

impl Region {
    /// Create a shared region.
    pub fn new(name: impl Into<String>, sites: Vec<Site>) -> Self {
        Self {
            name: name.into(),
            owner: None,
            sites,
        }
    }

    /// Set the owner.
    #[must_use]
    pub fn with_owner(mut self, owner: PlayerId) -> Self {
        self.owner = Some(owner);
        self
    }
}
