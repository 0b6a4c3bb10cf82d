//! Shared synthetic star fields for the integration tests.
//!
//! Stars are placed by offset from a fixed base so every scenario knows exactly
//! where each star falls in the focal plane.

#![allow(dead_code)]

use std::sync::Arc;

use asterism::{
    CandidateStar, Footprint, Instrument, MagnitudeBand, ObservingContext, Offset, Probe,
    ProbeDescriptor, ProbeGroup, ProbeTable, SkyCoord, Vector2,
};

pub fn base() -> SkyCoord {
    SkyCoord::from_degrees(150.1, 2.2)
}

/// Star `id` at offset `(p, q)` arcsec from [`base`] with R and H magnitudes.
pub fn star_at(id: u64, p: f64, q: f64, mag: f64) -> CandidateStar {
    CandidateStar::new(id, base().offset_by(&Offset::from_arcsec(p, q)))
        .with_magnitude(MagnitudeBand::R, mag)
        .with_magnitude(MagnitudeBand::H, mag - 1.0)
}

/// Standard probe table at [`base`], position angle 0, up-looking port.
pub fn standard_context() -> ObservingContext {
    ObservingContext::new(base(), Instrument::Imager)
}

fn circle(radius: f64) -> Footprint {
    Footprint::Circle {
        center: Vector2::zeros(),
        radius,
    }
}

/// Only OIWFS1, with a 60" disc around the base as its footprint.
pub fn single_probe_context() -> ObservingContext {
    let table = ProbeTable::new(
        60.0,
        vec![ProbeDescriptor::fixed(Probe::Oiwfs1, ProbeGroup::Oiwfs, circle(60.0))],
    );
    standard_context().with_probe_table(Arc::new(table))
}

/// OIWFS1 and ODGW1, both with 60" disc footprints and no arms.
pub fn two_group_context() -> ObservingContext {
    let table = ProbeTable::new(
        60.0,
        vec![
            ProbeDescriptor::fixed(Probe::Oiwfs1, ProbeGroup::Oiwfs, circle(60.0)),
            ProbeDescriptor::fixed(Probe::Odgw1, ProbeGroup::Odgw, circle(60.0)),
        ],
    );
    standard_context().with_probe_table(Arc::new(table))
}

/// The standard OIWFS1 arm, without its sibling dependency, above a 60" ODGW1
/// disc. The arm is declared to shadow ODGW1.
pub fn arm_over_window_context() -> ObservingContext {
    let mut oiwfs1 = ProbeTable::standard()
        .get(Probe::Oiwfs1)
        .cloned()
        .expect("standard table has OIWFS1");
    oiwfs1.depends_on = None;
    let table = ProbeTable::new(
        60.0,
        vec![
            oiwfs1,
            ProbeDescriptor::fixed(Probe::Odgw1, ProbeGroup::Odgw, circle(60.0)),
        ],
    );
    standard_context().with_probe_table(Arc::new(table))
}

/// Quality that prefers bright stars: `20 - R`.
pub fn brightness(star: &CandidateStar, _probe: Probe) -> f64 {
    star.magnitude(MagnitudeBand::R).map_or(0.0, |m| 20.0 - m)
}
