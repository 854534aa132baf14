//! Board graphs with precomputed steps and radials.
//!
//! A `Graph` stores, for every site and compass direction, the adjacent site
//! one step away and the full radial: the ordered sites met walking outward
//! in that direction. Radials are built once, so rule nodes only slice into
//! them.
//!
//! ## Termination
//!
//! Radials follow the same compass direction from step to step and stop as
//! soon as a site repeats. On a wrap-around board a radial therefore visits
//! every site of its cycle once and ends before returning to its origin.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::direction::Compass;
use crate::core::{EngineError, Site, SiteType};

const DIRS: usize = 8;

/// One element graph of a board.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    num_sites: usize,
    /// `site * 8 + dir` -> adjacent site.
    steps: Vec<Option<Site>>,
    /// `site * 8 + dir` -> sites walking outward, origin excluded.
    radials: Vec<Vec<Site>>,
    /// Planar coordinates, when the board has a geometry.
    coords: Option<Vec<(f64, f64)>>,
}

impl Graph {
    /// A `rows` x `cols` grid. Site `r * cols + c` sits at `(c, r)`; north
    /// is increasing row.
    #[must_use]
    pub fn square(rows: usize, cols: usize) -> Self {
        let num_sites = rows * cols;
        let mut steps = vec![None; num_sites * DIRS];
        let mut coords = Vec::with_capacity(num_sites);
        for r in 0..rows {
            for c in 0..cols {
                let site = r * cols + c;
                coords.push((c as f64, r as f64));
                for dir in Compass::ALL {
                    let (dx, dy) = dir.offset();
                    let nc = c as i64 + i64::from(dx);
                    let nr = r as i64 + i64::from(dy);
                    if nc >= 0 && nr >= 0 && (nc as usize) < cols && (nr as usize) < rows {
                        steps[site * DIRS + dir.index()] =
                            Some(Site((nr as usize * cols + nc as usize) as u32));
                    }
                }
            }
        }
        Self::from_parts(num_sites, steps, Some(coords))
    }

    /// A single row of `len` sites running west to east.
    #[must_use]
    pub fn line(len: usize) -> Self {
        Self::square(1, len)
    }

    /// `len` sites in a loop: east from the last site returns to the first.
    ///
    /// No coordinates are attached since the loop has no planar layout.
    #[must_use]
    pub fn ring(len: usize) -> Self {
        let mut steps = vec![None; len * DIRS];
        for i in 0..len {
            let next = Site(((i + 1) % len) as u32);
            let prev = Site(((i + len - 1) % len) as u32);
            if len > 1 {
                steps[i * DIRS + Compass::E.index()] = Some(next);
                steps[i * DIRS + Compass::W.index()] = Some(prev);
            }
        }
        Self::from_parts(len, steps, None)
    }

    /// Build from explicit `(from, direction, to)` steps.
    ///
    /// Steps are directed; add both directions for an undirected link.
    pub fn from_steps(num_sites: usize, links: &[(Site, Compass, Site)]) -> Result<Self, EngineError> {
        let mut steps = vec![None; num_sites * DIRS];
        for &(from, dir, to) in links {
            for site in [from, to] {
                if site.index() >= num_sites {
                    return Err(EngineError::SiteOutOfRange {
                        site,
                        site_type: SiteType::Cell,
                        len: num_sites,
                    });
                }
            }
            steps[from.index() * DIRS + dir.index()] = Some(to);
        }
        Ok(Self::from_parts(num_sites, steps, None))
    }

    /// Attach planar coordinates, one per site.
    pub fn with_coords(mut self, coords: Vec<(f64, f64)>) -> Result<Self, EngineError> {
        if coords.len() != self.num_sites {
            return Err(EngineError::InvalidConfig(format!(
                "{} coordinates for {} sites",
                coords.len(),
                self.num_sites
            )));
        }
        self.coords = Some(coords);
        Ok(self)
    }

    fn from_parts(num_sites: usize, steps: Vec<Option<Site>>, coords: Option<Vec<(f64, f64)>>) -> Self {
        let mut radials = Vec::with_capacity(num_sites * DIRS);
        for site in 0..num_sites {
            for dir in 0..DIRS {
                let mut ray = Vec::new();
                let mut current = site;
                while let Some(next) = steps[current * DIRS + dir] {
                    if next.index() == site || ray.contains(&next) {
                        break;
                    }
                    ray.push(next);
                    current = next.index();
                }
                radials.push(ray);
            }
        }
        Self {
            num_sites,
            steps,
            radials,
            coords,
        }
    }

    /// Number of sites.
    #[must_use]
    pub fn num_sites(&self) -> usize {
        self.num_sites
    }

    /// Whether `site` exists in this graph.
    #[must_use]
    pub fn contains(&self, site: Site) -> bool {
        site.index() < self.num_sites
    }

    /// The site one step away, if any.
    #[must_use]
    pub fn step(&self, site: Site, dir: Compass) -> Option<Site> {
        if !self.contains(site) {
            return None;
        }
        self.steps[site.index() * DIRS + dir.index()]
    }

    /// Sites met walking outward from `site` (origin excluded). Empty for
    /// sites outside the graph.
    #[must_use]
    pub fn radial(&self, site: Site, dir: Compass) -> &[Site] {
        if !self.contains(site) {
            return &[];
        }
        &self.radials[site.index() * DIRS + dir.index()]
    }

    /// Adjacent sites in the given directions, in direction order, without
    /// duplicates.
    #[must_use]
    pub fn neighbours(&self, site: Site, dirs: &[Compass]) -> SmallVec<[Site; 8]> {
        let mut out = SmallVec::new();
        for &dir in dirs {
            if let Some(n) = self.step(site, dir) {
                if !out.contains(&n) {
                    out.push(n);
                }
            }
        }
        out
    }

    /// The first direction whose radial from `from` reaches `to`.
    #[must_use]
    pub fn direction_between(&self, from: Site, to: Site) -> Option<Compass> {
        Compass::ALL
            .into_iter()
            .find(|&dir| self.radial(from, dir).contains(&to))
    }

    /// Planar coordinates of a site.
    #[must_use]
    pub fn coords(&self, site: Site) -> Option<(f64, f64)> {
        self.coords.as_ref()?.get(site.index()).copied()
    }

    /// Iterate over all sites.
    pub fn sites(&self) -> impl Iterator<Item = Site> {
        (0..self.num_sites as u32).map(Site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_steps() {
        let g = Graph::square(3, 3);
        assert_eq!(g.num_sites(), 9);
        assert_eq!(g.step(Site(4), Compass::N), Some(Site(7)));
        assert_eq!(g.step(Site(4), Compass::E), Some(Site(5)));
        assert_eq!(g.step(Site(4), Compass::SW), Some(Site(0)));
        assert_eq!(g.step(Site(0), Compass::S), None);
        assert_eq!(g.step(Site(42), Compass::N), None);
    }

    #[test]
    fn test_square_radials() {
        let g = Graph::square(4, 4);
        assert_eq!(g.radial(Site(0), Compass::E), &[Site(1), Site(2), Site(3)]);
        assert_eq!(g.radial(Site(0), Compass::NE), &[Site(5), Site(10), Site(15)]);
        assert!(g.radial(Site(3), Compass::E).is_empty());
        assert!(g.radial(Site(99), Compass::E).is_empty());
    }

    #[test]
    fn test_ring_radial_stops_before_origin() {
        let g = Graph::ring(5);
        assert_eq!(
            g.radial(Site(3), Compass::E),
            &[Site(4), Site(0), Site(1), Site(2)]
        );
        assert_eq!(g.radial(Site(0), Compass::W).len(), 4);
    }

    #[test]
    fn test_from_steps_with_cycle_not_through_origin() {
        // 0 -> 1 -> 2 -> 1 (cycle that never returns to 0)
        let g = Graph::from_steps(
            3,
            &[
                (Site(0), Compass::E, Site(1)),
                (Site(1), Compass::E, Site(2)),
                (Site(2), Compass::E, Site(1)),
            ],
        )
        .unwrap();
        assert_eq!(g.radial(Site(0), Compass::E), &[Site(1), Site(2)]);
    }

    #[test]
    fn test_from_steps_rejects_bad_site() {
        let err = Graph::from_steps(2, &[(Site(0), Compass::E, Site(5))]).unwrap_err();
        assert!(matches!(err, EngineError::SiteOutOfRange { len: 2, .. }));
    }

    #[test]
    fn test_neighbours_and_direction_between() {
        let g = Graph::square(3, 3);
        let n = g.neighbours(Site(4), &Compass::ORTHOGONAL);
        assert_eq!(n.as_slice(), &[Site(7), Site(5), Site(1), Site(3)]);
        assert_eq!(g.direction_between(Site(0), Site(8)), Some(Compass::NE));
        assert_eq!(g.direction_between(Site(0), Site(5)), None);
    }

    #[test]
    fn test_coords() {
        let g = Graph::square(2, 3);
        assert_eq!(g.coords(Site(5)), Some((2.0, 1.0)));
        assert_eq!(Graph::ring(3).coords(Site(0)), None);
        assert!(Graph::ring(2).with_coords(vec![(0.0, 0.0)]).is_err());
    }
}
