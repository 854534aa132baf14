//! Region-valued functions.

use serde::{Deserialize, Serialize};

use super::site::SiteFn;
use super::who::Who;
use crate::context::{Context, EnvFields};
use crate::core::Site;
use crate::topology::Directions;

/// Expression producing a set of sites.
///
/// Results are sorted and free of duplicates. Sites that don't exist on
/// the board are dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionFn {
    /// Fixed sites.
    Sites(Vec<Site>),
    /// The site of a site function (empty when undefined).
    Site(SiteFn),
    /// Every site.
    All,
    /// Empty sites.
    Empty,
    /// Occupied sites.
    Occupied,
    /// Sites whose top piece belongs to a role.
    OccupiedBy(Who),
    /// Sites of a named track.
    Track(String),
    /// A named region, picked by owner (falls back to the unowned one).
    Region { name: String, owner: Who },
    /// Adjacent sites of a site in the given directions.
    Neighbours { site: SiteFn, directions: Directions },
    Union(Vec<RegionFn>),
    Difference(Box<RegionFn>, Box<RegionFn>),
}

impl RegionFn {
    /// A named region owned by `owner`.
    pub fn region(name: impl Into<String>, owner: Who) -> Self {
        RegionFn::Region {
            name: name.into(),
            owner,
        }
    }

    /// Sites of `a` not in `b`.
    pub fn difference(a: RegionFn, b: RegionFn) -> Self {
        RegionFn::Difference(Box::new(a), Box::new(b))
    }

    #[must_use]
    pub fn eval(&self, ctx: &Context<'_>) -> Vec<Site> {
        let mut sites = self.eval_unsorted(ctx);
        let len = ctx.state().num_sites(ctx.site_type());
        sites.retain(|s| s.index() < len);
        sites.sort_unstable();
        sites.dedup();
        sites
    }

    fn eval_unsorted(&self, ctx: &Context<'_>) -> Vec<Site> {
        let state = ctx.state();
        let st = ctx.site_type();
        let all = || (0..state.num_sites(st) as u32).map(Site);
        match self {
            RegionFn::Sites(sites) => sites.clone(),
            RegionFn::Site(site) => site.eval(ctx).into_iter().collect(),
            RegionFn::All => all().collect(),
            RegionFn::Empty => all().filter(|&s| state.is_empty(st, s)).collect(),
            RegionFn::Occupied => state.occupied(st).collect(),
            RegionFn::OccupiedBy(who) => {
                let mover = ctx.mover();
                let n = state.player_count();
                state
                    .occupied(st)
                    .filter(|&s| who.matches(state.who(st, s, None), mover, n))
                    .collect()
            }
            RegionFn::Track(name) => ctx
                .topology()
                .track(name)
                .map(|t| t.sites.clone())
                .unwrap_or_default(),
            RegionFn::Region { name, owner } => {
                let topology = ctx.topology();
                let player = owner.resolve(ctx.mover(), state.player_count());
                topology
                    .region(name, player)
                    .or_else(|| topology.region(name, None))
                    .map(|r| r.sites.clone())
                    .unwrap_or_default()
            }
            RegionFn::Neighbours { site, directions } => {
                let (Some(origin), Some(graph)) = (site.eval(ctx), ctx.graph(st)) else {
                    return Vec::new();
                };
                let dirs = directions.resolve(ctx.facing_at(st, origin));
                graph.neighbours(origin, &dirs).into_vec()
            }
            RegionFn::Union(parts) => parts.iter().flat_map(|p| p.eval_unsorted(ctx)).collect(),
            RegionFn::Difference(a, b) => {
                let minus = b.eval(ctx);
                a.eval_unsorted(ctx)
                    .into_iter()
                    .filter(|s| minus.binary_search(s).is_err())
                    .collect()
            }
        }
    }

    /// Whether `site` is in the region.
    #[must_use]
    pub fn contains(&self, ctx: &Context<'_>, site: Site) -> bool {
        match self {
            RegionFn::Site(f) => f.eval(ctx) == Some(site),
            RegionFn::Sites(sites) => sites.contains(&site),
            _ => self.eval(ctx).binary_search(&site).is_ok(),
        }
    }

    /// Scratch fields read.
    #[must_use]
    pub fn reads(&self) -> EnvFields {
        match self {
            RegionFn::Site(site) | RegionFn::Neighbours { site, .. } => site.reads(),
            RegionFn::Union(parts) => parts.iter().fold(EnvFields::EMPTY, |acc, p| acc | p.reads()),
            RegionFn::Difference(a, b) => a.reads() | b.reads(),
            _ => EnvFields::EMPTY,
        }
    }

    /// Whether the region is the same in every position and scratch.
    #[must_use]
    pub fn is_static(&self) -> bool {
        match self {
            RegionFn::Sites(_) | RegionFn::All | RegionFn::Track(_) => true,
            RegionFn::Site(site) => site.is_static(),
            RegionFn::Union(parts) => parts.iter().all(RegionFn::is_static),
            RegionFn::Difference(a, b) => a.is_static() && b.is_static(),
            _ => false,
        }
    }
}

impl From<Vec<Site>> for RegionFn {
    fn from(sites: Vec<Site>) -> Self {
        RegionFn::Sites(sites)
    }
}
