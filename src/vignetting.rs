//! Probe-arm shadowing.
//!
//! An arm is modelled as a strip of the arm's width from its pivot to the
//! assigned star, plus a disc for the probe head centered on the star. Arms are
//! stacked: a probe can only shadow the probes its descriptor lists in
//! `vignettes`, so every check below is directional.

use crate::context::ObservingContext;
use crate::geometry::Region;
use crate::patrol::arm_origin;
use crate::probe::Probe;
use crate::validation::Validation;
use crate::Vector2;

/// Shape of `probe`'s arm while it is on its assigned star.
///
/// `None` for probes without an arm, without an assigned star, or without a
/// base position.
pub fn probe_arm(probe: Probe, ctx: &ObservingContext) -> Option<Region> {
    let arm = ctx.probe_table().get(probe)?.arm?;
    let origin = arm_origin(probe, ctx)?;
    let star = ctx.assigned_offset(probe)?.to_vector();
    let head = Region::circle(star, arm.head_diameter / 2.0);

    let along = star - origin;
    let length = along.norm();
    if length <= f64::EPSILON {
        return Some(head);
    }
    let half = Vector2::new(-along.y, along.x) * (arm.width / 2.0 / length);
    let body = Region::polygon(&[origin + half, star + half, star - half, origin - half]);
    Some(body.union(&head))
}

/// Whether `a`'s arm covers the star assigned to `b`.
pub fn arm_covers_star(a: Probe, b: Probe, ctx: &ObservingContext) -> Option<bool> {
    let arm = probe_arm(a, ctx)?;
    let star = ctx.assigned_offset(b)?;
    Some(arm.contains_offset(&star))
}

/// Whether the arms of `a` and `b` overlap with non-zero area.
pub fn arms_cross(a: Probe, b: Probe, ctx: &ObservingContext) -> Option<bool> {
    let arm_a = probe_arm(a, ctx)?;
    let arm_b = probe_arm(b, ctx)?;
    Some(arm_a.overlaps(&arm_b))
}

/// Does `a` vignette `b`?
///
/// Only checked when `b` is listed in `a`'s `vignettes`. Missing stars or arms
/// cannot shadow anything, so they pass.
pub fn vignetting(a: Probe, b: Probe, ctx: &ObservingContext) -> Validation {
    if a == b || !ctx.probe_table().can_vignette(a, b) {
        return Validation::Valid;
    }
    if ctx.base().is_none() {
        return Validation::Undefined;
    }
    if arm_covers_star(a, b, ctx) == Some(true) || arms_cross(a, b, ctx) == Some(true) {
        tracing::debug!("{} vignettes {}", a, b);
        return Validation::Invalid;
    }
    Validation::Valid
}

/// Every declared vignetting direction among the occupied probes.
pub fn validate_vignetting(ctx: &ObservingContext) -> Validation {
    let occupied = ctx.occupied();
    let mut v = Validation::Valid;
    for &a in &occupied {
        for &b in &occupied {
            v = v.and(vignetting(a, b, ctx));
            if v == Validation::Invalid {
                return v;
            }
        }
    }
    v
}
