//! Site-valued functions.

use serde::{Deserialize, Serialize};

use crate::context::{Context, EnvField, EnvFields};
use crate::core::Site;
use crate::topology::Compass;

/// Expression producing a site, or nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteFn {
    /// The `from` scratch field.
    From,
    /// The `to` scratch field.
    To,
    /// The `between` scratch field.
    Between,
    /// A fixed site.
    Const(Site),
    /// Origin of the last decision move.
    LastFrom,
    /// Destination of the last decision move.
    LastTo,
    /// One step from another site.
    Step { site: Box<SiteFn>, direction: Compass },
}

impl SiteFn {
    /// One step from `site` in `direction`.
    pub fn step(site: SiteFn, direction: Compass) -> Self {
        SiteFn::Step {
            site: Box::new(site),
            direction,
        }
    }

    /// Evaluate against the context's default element kind. Sites outside
    /// the board are returned as-is; consumers check range.
    #[must_use]
    pub fn eval(&self, ctx: &Context<'_>) -> Option<Site> {
        match self {
            SiteFn::From => ctx.from(),
            SiteFn::To => ctx.to(),
            SiteFn::Between => ctx.between(),
            SiteFn::Const(site) => Some(*site),
            SiteFn::LastFrom => ctx.state().last_from(),
            SiteFn::LastTo => ctx.state().last_to(),
            SiteFn::Step { site, direction } => {
                let origin = site.eval(ctx)?;
                ctx.graph(ctx.site_type())?.step(origin, *direction)
            }
        }
    }

    /// Scratch fields read.
    #[must_use]
    pub fn reads(&self) -> EnvFields {
        match self {
            SiteFn::From => EnvFields::of(EnvField::From),
            SiteFn::To => EnvFields::of(EnvField::To),
            SiteFn::Between => EnvFields::of(EnvField::Between),
            SiteFn::Step { site, .. } => site.reads(),
            SiteFn::Const(_) | SiteFn::LastFrom | SiteFn::LastTo => EnvFields::EMPTY,
        }
    }

    /// Whether the result is the same in every position and scratch.
    #[must_use]
    pub fn is_static(&self) -> bool {
        match self {
            SiteFn::Const(_) => true,
            SiteFn::Step { site, .. } => site.is_static(),
            _ => false,
        }
    }
}

impl From<Site> for SiteFn {
    fn from(site: Site) -> Self {
        SiteFn::Const(site)
    }
}
