//! Sky positions and the sky → focal-plane offset transform.
//!
//! Offsets are computed on the sphere (separation and position angle seen from the
//! base) and laid onto the tangent plane azimuthally, so `coordinate_diff` is defined
//! for every pair of positions and `SkyCoord::offset_by` is its exact inverse.

use std::f64::consts::PI;

use crate::angle::{Angle, Offset, ARCSEC_PER_RAD};

/// A position on the celestial sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyCoord {
    pub ra_rad: f64,
    pub dec_rad: f64,
}

impl SkyCoord {
    pub fn new(ra_rad: f64, dec_rad: f64) -> Self {
        Self { ra_rad, dec_rad }
    }

    pub fn from_degrees(ra_deg: f64, dec_deg: f64) -> Self {
        Self::new(ra_deg.to_radians(), dec_deg.to_radians())
    }

    pub fn ra(&self) -> Angle {
        Angle::from_radians(self.ra_rad)
    }

    pub fn ra_deg(&self) -> f64 {
        self.ra().to_degrees()
    }

    pub fn dec_deg(&self) -> f64 {
        self.dec_rad.to_degrees()
    }

    /// Great-circle separation from `other`, in radians (haversine form).
    pub fn separation(&self, other: &SkyCoord) -> f64 {
        let dra = other.ra_rad - self.ra_rad;
        let ddec = other.dec_rad - self.dec_rad;
        let a = (ddec / 2.0).sin().powi(2)
            + self.dec_rad.cos() * other.dec_rad.cos() * (dra / 2.0).sin().powi(2);
        2.0 * a.sqrt().min(1.0).asin()
    }

    /// Position reached by moving `offset` away from this position.
    ///
    /// Inverse of [`coordinate_diff`]: `coordinate_diff(b, b.offset_by(o)) == o`.
    pub fn offset_by(&self, offset: &Offset) -> SkyCoord {
        let p = offset.p_arcsec() / ARCSEC_PER_RAD;
        let q = offset.q_arcsec() / ARCSEC_PER_RAD;
        let d = p.hypot(q);
        if d == 0.0 {
            return *self;
        }
        let pa = p.atan2(q);
        let (sin_dec0, cos_dec0) = self.dec_rad.sin_cos();
        let (sin_d, cos_d) = d.sin_cos();
        let sin_dec = (sin_dec0 * cos_d + cos_dec0 * sin_d * pa.cos()).clamp(-1.0, 1.0);
        let dec = sin_dec.asin();
        let dra = (pa.sin() * sin_d * cos_dec0).atan2(cos_d - sin_dec0 * sin_dec);
        SkyCoord::new(self.ra_rad + dra, dec)
    }
}

/// Offset of `target` relative to `base`, in the east/north tangent-plane convention.
///
/// Returns exactly [`Offset::ZERO`] when `target == base`.
pub fn coordinate_diff(base: &SkyCoord, target: &SkyCoord) -> Offset {
    let d = base.separation(target);
    if d == 0.0 {
        return Offset::ZERO;
    }
    let pa = position_angle(base, target);
    let d_arcsec = d * ARCSEC_PER_RAD;
    Offset::from_arcsec(d_arcsec * pa.sin(), d_arcsec * pa.cos())
}

/// Position angle of `target` seen from `base`, east of north, in radians.
fn position_angle(base: &SkyCoord, target: &SkyCoord) -> f64 {
    let dra = target.ra_rad - base.ra_rad;
    let y = dra.sin() * target.dec_rad.cos();
    let x = base.dec_rad.cos() * target.dec_rad.sin()
        - base.dec_rad.sin() * target.dec_rad.cos() * dra.cos();
    let pa = y.atan2(x);
    if pa < 0.0 {
        pa + 2.0 * PI
    } else {
        pa
    }
}
