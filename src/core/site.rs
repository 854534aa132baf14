//! Board site identifiers.
//!
//! A board is made of up to three kinds of graph element (cells, vertices and
//! edges). Each kind has its own dense index space, so a site is always read
//! together with its [`SiteType`].

use serde::{Deserialize, Serialize};

/// Index of a board element within one [`SiteType`] graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Site(pub u32);

impl Site {
    /// Create a new site.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw index.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Index as `usize`, for container lookups.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Site {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Site({})", self.0)
    }
}

/// Kind of graph element a site refers to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SiteType {
    /// Faces of the board graph (squares of a chessboard).
    #[default]
    Cell,
    /// Corners of the board graph (intersections of a Go board).
    Vertex,
    /// Lines between two vertices.
    Edge,
}

impl SiteType {
    /// All element kinds, in storage order.
    pub const ALL: [SiteType; 3] = [SiteType::Cell, SiteType::Vertex, SiteType::Edge];

    /// Storage slot of this element kind.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            SiteType::Cell => 0,
            SiteType::Vertex => 1,
            SiteType::Edge => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_basics() {
        let s = Site::new(12);
        assert_eq!(s.raw(), 12);
        assert_eq!(s.index(), 12);
        assert_eq!(Site::from(12), s);
        assert_eq!(format!("{}", s), "Site(12)");
    }

    #[test]
    fn test_site_type_storage_slots() {
        for (i, t) in SiteType::ALL.iter().enumerate() {
            assert_eq!(t.index(), i);
        }
        assert_eq!(SiteType::default(), SiteType::Cell);
    }
}
