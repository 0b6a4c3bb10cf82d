//! Reachable region ("patrol field") of each guide probe.
//!
//! All regions are expressed as offsets from the base position in the sky frame,
//! in arcseconds. The instrument frame is rotated by the total rotation `t`
//! (position angle plus port rotation) relative to the sky, so a footprint given
//! in the instrument frame is brought to the sky by rotating it by `-t`.

use crate::angle::Offset;
use crate::context::ObservingContext;
use crate::geometry::{PatrolField, Region};
use crate::probe::{Footprint, Probe, ProbeDescriptor};
use crate::Vector2;

/// Pivot of `probe`'s arm in the sky frame, or `None` for probes without an arm.
pub fn arm_origin(probe: Probe, ctx: &ObservingContext) -> Option<Vector2> {
    let desc = ctx.probe_table().get(probe)?;
    let arm = desc.arm?;
    Some(origin_of(desc, arm.origin_distance, ctx))
}

fn origin_of(desc: &ProbeDescriptor, distance: f64, ctx: &ObservingContext) -> Vector2 {
    let a = (desc.arm_angle - ctx.total_rotation()).to_radians();
    Vector2::new(distance * a.cos(), distance * a.sin())
}

/// Footprint of `probe` at the base pointing, ignoring science offsets and
/// dependencies.
pub fn base_range(probe: Probe, ctx: &ObservingContext) -> PatrolField {
    let Some(desc) = ctx.probe_table().get(probe) else {
        return PatrolField::Undefined;
    };
    let t = ctx.total_rotation();
    match &desc.footprint {
        Footprint::ArmReach { reach } => match desc.arm {
            Some(arm) => {
                let origin = origin_of(desc, arm.origin_distance, ctx);
                let field = Region::circle(Vector2::zeros(), ctx.probe_table().field_radius);
                PatrolField::Defined(Region::circle(origin, *reach).intersection(&field))
            }
            None => PatrolField::Undefined,
        },
        Footprint::Circle { center, radius } => {
            PatrolField::Defined(Region::circle(*center, *radius).rotate(-t))
        }
        Footprint::Polygon(vertices) => PatrolField::Defined(Region::polygon(vertices).rotate(-t)),
        Footprint::Undefined => PatrolField::Undefined,
    }
}

/// Region reachable at every science offset, before any sibling dependency.
///
/// A science offset moves the instrument, and the footprint with it, by the
/// offset expressed in the instrument frame.
pub fn unconstrained_range(probe: Probe, ctx: &ObservingContext) -> PatrolField {
    let field = base_range(probe, ctx);
    let offsets = ctx.science_offsets();
    if offsets.iter().all(Offset::is_zero) {
        return field;
    }
    let Some(region) = field.region() else {
        return PatrolField::Undefined;
    };
    let t = ctx.total_rotation();
    let shifted = offsets
        .iter()
        .map(|o| region.translate(o.rotate(-t).to_vector()))
        .reduce(|acc, r| acc.intersection(&r))
        .unwrap_or_else(Region::empty);
    PatrolField::Defined(shifted)
}

/// The region in which `probe` can currently acquire a star.
///
/// Starts from [`unconstrained_range`] and, for probes that depend on a sibling,
/// keeps only the disc around the sibling's star (or around the center of the
/// sibling's own range while the sibling is unassigned).
pub fn patrol_field(probe: Probe, ctx: &ObservingContext) -> PatrolField {
    let field = unconstrained_range(probe, ctx);
    let Some(dep) = ctx.probe_table().get(probe).and_then(|d| d.depends_on) else {
        return field;
    };
    if !field.is_defined() {
        return field;
    }

    let center = if ctx.assigned(dep.sibling).is_some() {
        match ctx.assigned_offset(dep.sibling) {
            Some(o) => o.to_vector(),
            None => return PatrolField::Undefined,
        }
    } else {
        match unconstrained_range(dep.sibling, ctx) {
            PatrolField::Defined(r) if r.is_empty() => return PatrolField::Defined(Region::empty()),
            PatrolField::Defined(r) => match r.centroid() {
                Some(c) => c,
                None => return PatrolField::Undefined,
            },
            PatrolField::Undefined => return PatrolField::Undefined,
        }
    };
    field.intersect(&PatrolField::Defined(Region::circle(center, dep.radius)))
}
