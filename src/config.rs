//! Instrument port rotations.
//!
//! The rotation of each instrument port relative to the AO bench is a
//! site-configured constant. It is read once, before any search runs, and is never
//! changed in place: updating a port produces a new [`PortRotations`] value, and
//! only contexts built afterwards see it.

use std::fmt;

use crate::angle::Angle;

/// Instrument port on the AO bench.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    SideLooking,
    UpLooking,
}

impl Port {
    pub const ALL: [Port; 2] = [Port::SideLooking, Port::UpLooking];
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Port::SideLooking => f.write_str("side-looking"),
            Port::UpLooking => f.write_str("up-looking"),
        }
    }
}

/// Rotation of every port, in the instrument frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortRotations {
    /// Default: 90°
    side_looking: Angle,
    /// Default: 0°
    up_looking: Angle,
}

impl Default for PortRotations {
    fn default() -> Self {
        Self {
            side_looking: Angle::from_degrees(90.0),
            up_looking: Angle::ZERO,
        }
    }
}

impl PortRotations {
    pub fn rotation(&self, port: Port) -> Angle {
        match port {
            Port::SideLooking => self.side_looking,
            Port::UpLooking => self.up_looking,
        }
    }

    /// Copy of this table with `port` set to `rotation`.
    pub fn with_rotation(mut self, port: Port, rotation: Angle) -> Self {
        tracing::info!("Setting {} port rotation to {:.3}°", port, rotation.to_degrees());
        match port {
            Port::SideLooking => self.side_looking = rotation,
            Port::UpLooking => self.up_looking = rotation,
        }
        self
    }
}
