//! Angles and tangent-plane offsets.
//!
//! `Angle` is an immutable scalar normalized to `[0, 2π)` on construction. Signed
//! views (`to_signed_degrees`, `to_signed_arcsec`) map it back into `(-180°, 180°]`,
//! which is how offset components are read.
//!
//! `Offset` is a `(p, q)` displacement on the tangent plane, p pointing east and
//! q pointing north of a base position. All focal-plane geometry in this crate is
//! expressed in arcseconds of offset from the base.

use std::f64::consts::{PI, TAU};
use std::fmt;
use std::ops::{Add, Neg, Sub};

use nalgebra::Rotation2;

use crate::Vector2;

/// Arcseconds per radian.
pub const ARCSEC_PER_RAD: f64 = 180.0 * 3600.0 / PI;

/// Unit attached to a raw angular value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AngleUnit {
    Radians,
    Degrees,
    Arcmin,
    Arcsec,
}

impl AngleUnit {
    /// Multiplier converting a value in this unit to radians.
    fn to_radians_factor(self) -> f64 {
        match self {
            AngleUnit::Radians => 1.0,
            AngleUnit::Degrees => PI / 180.0,
            AngleUnit::Arcmin => PI / (180.0 * 60.0),
            AngleUnit::Arcsec => 1.0 / ARCSEC_PER_RAD,
        }
    }
}

/// An angle normalized to `[0, 2π)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Angle {
    rad: f64,
}

impl Angle {
    pub const ZERO: Angle = Angle { rad: 0.0 };

    /// Create an angle from a value in the given unit.
    pub fn new(value: f64, unit: AngleUnit) -> Self {
        Self::from_radians(value * unit.to_radians_factor())
    }

    pub fn from_radians(rad: f64) -> Self {
        let mut r = rad.rem_euclid(TAU);
        // rem_euclid can round up to exactly TAU for tiny negative inputs
        if r >= TAU {
            r = 0.0;
        }
        Self { rad: r }
    }

    pub fn from_degrees(deg: f64) -> Self {
        Self::new(deg, AngleUnit::Degrees)
    }

    pub fn from_arcmin(arcmin: f64) -> Self {
        Self::new(arcmin, AngleUnit::Arcmin)
    }

    pub fn from_arcsec(arcsec: f64) -> Self {
        Self::new(arcsec, AngleUnit::Arcsec)
    }

    /// Value in the given unit, within the canonical `[0, 2π)` range.
    pub fn value_in(&self, unit: AngleUnit) -> f64 {
        self.rad / unit.to_radians_factor()
    }

    pub fn to_radians(&self) -> f64 {
        self.rad
    }

    pub fn to_degrees(&self) -> f64 {
        self.value_in(AngleUnit::Degrees)
    }

    pub fn to_arcsec(&self) -> f64 {
        self.value_in(AngleUnit::Arcsec)
    }

    /// Signed value in radians, in `(-π, π]`.
    pub fn to_signed_radians(&self) -> f64 {
        if self.rad > PI {
            self.rad - TAU
        } else {
            self.rad
        }
    }

    /// Signed value in degrees, in `(-180, 180]`.
    pub fn to_signed_degrees(&self) -> f64 {
        self.to_signed_radians().to_degrees()
    }

    /// Signed value in arcseconds, in `(-648000, 648000]`.
    pub fn to_signed_arcsec(&self) -> f64 {
        self.to_signed_radians() * ARCSEC_PER_RAD
    }

    /// `true` when the two angles differ by less than `tol_rad` around the circle.
    pub fn approx_eq(&self, other: &Angle, tol_rad: f64) -> bool {
        (*self - *other).to_signed_radians().abs() < tol_rad
    }
}

impl Add for Angle {
    type Output = Angle;
    fn add(self, rhs: Angle) -> Angle {
        Angle::from_radians(self.rad + rhs.rad)
    }
}

impl Sub for Angle {
    type Output = Angle;
    fn sub(self, rhs: Angle) -> Angle {
        Angle::from_radians(self.rad - rhs.rad)
    }
}

impl Neg for Angle {
    type Output = Angle;
    fn neg(self) -> Angle {
        Angle::from_radians(-self.rad)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}°", self.to_degrees())
    }
}

// ── Offset ──────────────────────────────────────────────────────────────────

/// Tangent-plane displacement `(p, q)` east/north of a base position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    p: Angle,
    q: Angle,
}

impl Offset {
    pub const ZERO: Offset = Offset {
        p: Angle::ZERO,
        q: Angle::ZERO,
    };

    pub fn new(p: Angle, q: Angle) -> Self {
        Self { p, q }
    }

    /// Build an offset from signed arcsecond components.
    pub fn from_arcsec(p: f64, q: f64) -> Self {
        Self::new(Angle::from_arcsec(p), Angle::from_arcsec(q))
    }

    pub fn p(&self) -> Angle {
        self.p
    }

    pub fn q(&self) -> Angle {
        self.q
    }

    /// Signed east component in arcseconds.
    pub fn p_arcsec(&self) -> f64 {
        self.p.to_signed_arcsec()
    }

    /// Signed north component in arcseconds.
    pub fn q_arcsec(&self) -> f64 {
        self.q.to_signed_arcsec()
    }

    /// `(p, q)` in signed arcseconds as a vector.
    pub fn to_vector(&self) -> Vector2 {
        Vector2::new(self.p_arcsec(), self.q_arcsec())
    }

    pub fn from_vector(v: &Vector2) -> Self {
        Self::from_arcsec(v.x, v.y)
    }

    /// Rotate counter-clockwise in the p/q plane. Preserves the offset's magnitude.
    pub fn rotate(&self, angle: Angle) -> Offset {
        let rot = Rotation2::new(angle.to_radians());
        Offset::from_vector(&(rot * self.to_vector()))
    }

    /// Length of the offset in arcseconds.
    pub fn distance_arcsec(&self) -> f64 {
        self.to_vector().norm()
    }

    pub fn is_zero(&self) -> bool {
        self.p.to_radians() == 0.0 && self.q.to_radians() == 0.0
    }
}

impl Add for Offset {
    type Output = Offset;
    fn add(self, rhs: Offset) -> Offset {
        Offset::new(self.p + rhs.p, self.q + rhs.q)
    }
}

impl Sub for Offset {
    type Output = Offset;
    fn sub(self, rhs: Offset) -> Offset {
        Offset::new(self.p - rhs.p, self.q - rhs.q)
    }
}

impl Neg for Offset {
    type Output = Offset;
    fn neg(self) -> Offset {
        Offset::new(-self.p, -self.q)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}\", {:.3}\")", self.p_arcsec(), self.q_arcsec())
    }
}
