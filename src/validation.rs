//! Reachability queries and assignment validation.

use std::collections::BTreeSet;

use crate::context::ObservingContext;
use crate::coords::SkyCoord;
use crate::patrol::patrol_field;
use crate::probe::Probe;
use crate::star::CandidateStar;
use crate::vignetting::{validate_vignetting, vignetting};

/// Outcome of a geometric check.
///
/// Combining results with [`Validation::and`] keeps the most severe one:
/// `Invalid` over `Undefined` over `Valid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Validation {
    Valid,
    Invalid,
    /// The geometry needed to decide is not available.
    Undefined,
}

impl Validation {
    pub fn and(self, other: Validation) -> Validation {
        use Validation::*;
        match (self, other) {
            (Invalid, _) | (_, Invalid) => Invalid,
            (Undefined, _) | (_, Undefined) => Undefined,
            _ => Valid,
        }
    }

    pub fn is_valid(self) -> bool {
        self == Validation::Valid
    }
}

/// Probes whose current patrol field contains `coord`.
///
/// Probes with an undefined patrol field are never included. Empty without a base
/// position.
pub fn probes_in_range(coord: &SkyCoord, ctx: &ObservingContext) -> BTreeSet<Probe> {
    let Some(offset) = ctx.offset_of(coord) else {
        return BTreeSet::new();
    };
    ctx.probe_table()
        .descriptors()
        .iter()
        .map(|d| d.probe)
        .filter(|&p| patrol_field(p, ctx).contains(&offset) == Some(true))
        .collect()
}

fn reach(probe: Probe, ctx: &ObservingContext) -> Validation {
    let Some(offset) = ctx.assigned_offset(probe) else {
        return Validation::Undefined;
    };
    match patrol_field(probe, ctx).contains(&offset) {
        Some(true) => Validation::Valid,
        Some(false) => Validation::Invalid,
        None => Validation::Undefined,
    }
}

/// Check assigning `star` to `probe` against the other assignments in `ctx`.
///
/// The star must lie in the probe's patrol field, and no declared vignetting
/// between `probe` and an occupied probe may occur in either direction.
pub fn validate_guide_star(
    probe: Probe,
    star: &CandidateStar,
    ctx: &ObservingContext,
) -> Validation {
    let ctx = ctx.with_assignment(probe, star.clone());
    ctx.occupied()
        .into_iter()
        .filter(|&other| other != probe)
        .fold(reach(probe, &ctx), |v, other| {
            v.and(vignetting(probe, other, &ctx))
                .and(vignetting(other, probe, &ctx))
        })
}

/// Validate every assignment in `ctx`: each star in its probe's patrol field and
/// no declared vignetting among occupied probes.
///
/// Pure function of the context, so validating the same context twice gives the
/// same answer.
pub fn validate_assignment(ctx: &ObservingContext) -> Validation {
    let occupied = ctx.occupied();
    let mut v = Validation::Valid;
    for &a in &occupied {
        v = v.and(reach(a, ctx));
        if v == Validation::Invalid {
            return v;
        }
    }
    v.and(validate_vignetting(ctx))
}
