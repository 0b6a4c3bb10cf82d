//! Planar regions in arcsecond offset space.
//!
//! `Region` wraps a `geo::MultiPolygon` and exposes only the operations the probe
//! model needs: boolean set operations, rigid motions, and point containment. Discs
//! are approximated by regular polygons with [`CIRCLE_SEGMENTS`] vertices, which at
//! the sizes involved here (a few arcminutes) keeps the boundary within a few
//! milliarcseconds of the true circle.

use std::f64::consts::TAU;

use geo::{
    Area, BooleanOps, Centroid, Contains, LineString, MultiPolygon, Point, Polygon, Rotate,
    Translate,
};

use crate::angle::{Angle, Offset};
use crate::Vector2;

/// Vertices used to approximate a circle.
pub const CIRCLE_SEGMENTS: usize = 180;

/// Overlaps with less area than this (arcsec²) are treated as touching, not overlapping.
pub const AREA_EPSILON: f64 = 1e-6;

/// A possibly disconnected region of the focal plane, in arcseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    shape: MultiPolygon<f64>,
}

impl Region {
    pub fn empty() -> Self {
        Self {
            shape: MultiPolygon::new(Vec::new()),
        }
    }

    /// Disc of `radius` arcsec centered at `center`.
    pub fn circle(center: Vector2, radius: f64) -> Self {
        Self::ellipse(center, radius, radius)
    }

    /// Axis-aligned ellipse with semi-axes `rx`, `ry`.
    pub fn ellipse(center: Vector2, rx: f64, ry: f64) -> Self {
        if rx <= 0.0 || ry <= 0.0 {
            return Self::empty();
        }
        let ring: Vec<(f64, f64)> = (0..CIRCLE_SEGMENTS)
            .map(|i| {
                let t = TAU * i as f64 / CIRCLE_SEGMENTS as f64;
                (center.x + rx * t.cos(), center.y + ry * t.sin())
            })
            .collect();
        Self::from_polygon(Polygon::new(LineString::from(ring), Vec::new()))
    }

    /// Simple polygon through `vertices` (closed automatically).
    pub fn polygon(vertices: &[Vector2]) -> Self {
        if vertices.len() < 3 {
            return Self::empty();
        }
        let ring: Vec<(f64, f64)> = vertices.iter().map(|v| (v.x, v.y)).collect();
        Self::from_polygon(Polygon::new(LineString::from(ring), Vec::new()))
    }

    fn from_polygon(polygon: Polygon<f64>) -> Self {
        Self {
            shape: MultiPolygon::new(vec![polygon]),
        }
    }

    pub fn intersection(&self, other: &Region) -> Region {
        if self.is_empty() || other.is_empty() {
            return Region::empty();
        }
        Self {
            shape: self.shape.intersection(&other.shape),
        }
    }

    pub fn union(&self, other: &Region) -> Region {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        Self {
            shape: self.shape.union(&other.shape),
        }
    }

    pub fn translate(&self, by: Vector2) -> Region {
        Self {
            shape: self.shape.translate(by.x, by.y),
        }
    }

    /// Rotate counter-clockwise about the origin.
    pub fn rotate(&self, angle: Angle) -> Region {
        if self.is_empty() {
            return self.clone();
        }
        Self {
            shape: self
                .shape
                .rotate_around_point(angle.to_degrees(), Point::new(0.0, 0.0)),
        }
    }

    /// Strict containment: points on the boundary are outside.
    pub fn contains(&self, point: Vector2) -> bool {
        self.shape.contains(&Point::new(point.x, point.y))
    }

    pub fn contains_offset(&self, offset: &Offset) -> bool {
        self.contains(offset.to_vector())
    }

    /// `true` when the two regions share a positive area.
    pub fn overlaps(&self, other: &Region) -> bool {
        self.intersection(other).area() > AREA_EPSILON
    }

    pub fn area(&self) -> f64 {
        self.shape.unsigned_area()
    }

    pub fn is_empty(&self) -> bool {
        self.shape.0.is_empty() || self.area() <= AREA_EPSILON
    }

    pub fn centroid(&self) -> Option<Vector2> {
        self.shape.centroid().map(|p| Vector2::new(p.x(), p.y()))
    }

    pub fn as_multi_polygon(&self) -> &MultiPolygon<f64> {
        &self.shape
    }
}

/// Reachable region of one guide probe.
///
/// `Undefined` is reserved for probes whose footprint has not been characterized
/// (or when the geometry cannot be computed). It is never the same thing as an
/// empty region, which means "reachable nowhere".
#[derive(Debug, Clone, PartialEq)]
pub enum PatrolField {
    Defined(Region),
    Undefined,
}

impl PatrolField {
    /// `Some(containment)` for a defined field, `None` when undefined.
    pub fn contains(&self, offset: &Offset) -> Option<bool> {
        match self {
            PatrolField::Defined(r) => Some(r.contains_offset(offset)),
            PatrolField::Undefined => None,
        }
    }

    pub fn region(&self) -> Option<&Region> {
        match self {
            PatrolField::Defined(r) => Some(r),
            PatrolField::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, PatrolField::Defined(_))
    }

    /// Intersect with another field; undefined on either side stays undefined.
    pub fn intersect(&self, other: &PatrolField) -> PatrolField {
        match (self, other) {
            (PatrolField::Defined(a), PatrolField::Defined(b)) => {
                PatrolField::Defined(a.intersection(b))
            }
            _ => PatrolField::Undefined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_containment_and_area() {
        let c = Region::circle(Vector2::new(0.0, 0.0), 60.0);
        assert!(c.contains(Vector2::new(0.0, 0.0)));
        assert!(c.contains(Vector2::new(59.0, 0.0)));
        assert!(!c.contains(Vector2::new(70.0, 0.0)));
        let exact = std::f64::consts::PI * 3600.0;
        assert!((c.area() - exact).abs() / exact < 1e-3);
    }

    #[test]
    fn test_boolean_ops() {
        let a = Region::circle(Vector2::new(-10.0, 0.0), 20.0);
        let b = Region::circle(Vector2::new(10.0, 0.0), 20.0);
        let i = a.intersection(&b);
        assert!(!i.is_empty());
        assert!(i.contains(Vector2::new(0.0, 0.0)));
        assert!(!i.contains(Vector2::new(-25.0, 0.0)));
        let u = a.union(&b);
        assert!(u.contains(Vector2::new(-25.0, 0.0)));
        assert!(u.contains(Vector2::new(25.0, 0.0)));
        assert!(a.overlaps(&b));

        let far = Region::circle(Vector2::new(100.0, 0.0), 5.0);
        assert!(!a.overlaps(&far));
        assert!(a.intersection(&far).is_empty());
    }

    #[test]
    fn test_rigid_motions() {
        let square = Region::polygon(&[
            Vector2::new(10.0, -1.0),
            Vector2::new(12.0, -1.0),
            Vector2::new(12.0, 1.0),
            Vector2::new(10.0, 1.0),
        ]);
        let rotated = square.rotate(Angle::from_degrees(90.0));
        assert!(rotated.contains(Vector2::new(0.0, 11.0)));
        assert!(!rotated.contains(Vector2::new(11.0, 0.0)));
        let moved = square.translate(Vector2::new(-11.0, 5.0));
        assert!(moved.contains(Vector2::new(0.0, 5.0)));
        let c = moved.centroid().unwrap();
        assert!(c.x.abs() < 1e-9 && (c.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_undefined_is_not_empty() {
        let empty = PatrolField::Defined(Region::empty());
        assert_eq!(empty.contains(&Offset::ZERO), Some(false));
        assert_eq!(PatrolField::Undefined.contains(&Offset::ZERO), None);
        assert_ne!(empty, PatrolField::Undefined);
        let full = PatrolField::Defined(Region::circle(Vector2::zeros(), 5.0));
        assert_eq!(full.intersect(&PatrolField::Undefined), PatrolField::Undefined);
    }
}
