//! Guide probes and their constant mechanical description.
//!
//! Probes differ only by data (arm angle, footprint, vignetting order, group), so
//! each one is described by a [`ProbeDescriptor`] in a [`ProbeTable`] and every
//! geometry routine is a free function taking the probe id.
//!
//! # Standard table
//!
//! The three AO probe arms (OIWFS 1-3) are mounted at 90°, 210° and 330° around
//! the AO field. Each arm pivots at 280 mm from the field center, reaches 300 mm,
//! and carries a 12.5 mm head; the plate scale in the probe plane is
//! 2.182 mm/arcsec and the AO field is a 60 arcsec radius disc. Arm 1 sits
//! above arm 2, which sits above arm 3, so an arm can only shadow probes mounted
//! below it. All AO arms sit above the imager's detector guide windows.
//!
//! The footprints of the detector guide windows (ODGW 1-4) and of the
//! spectrograph's on-instrument probe have not been characterized and are
//! `Footprint::Undefined`.

use std::fmt;

use crate::angle::Angle;
use crate::Vector2;

// ── Mechanical constants ────────────────────────────────────────────────────

/// Radius of the AO field of view (arcsec).
pub const AO_FIELD_RADIUS_ARCSEC: f64 = 60.0;
/// Maximum extension of an AO probe arm (mm).
pub const ARM_MAX_EXTENSION_MM: f64 = 300.0;
/// Distance by which a fully extended arm overshoots the field center (mm).
pub const ARM_OVERSHOOT_MM: f64 = 20.0;
/// Distance of the arm pivot from the field center (mm).
pub const ARM_ORIGIN_MM: f64 = ARM_MAX_EXTENSION_MM - ARM_OVERSHOOT_MM;
/// Diameter of the probe head (mm).
pub const ARM_HEAD_DIAMETER_MM: f64 = 12.5;
/// Plate scale in the probe plane (mm/arcsec).
pub const PLATE_SCALE_MM_PER_ARCSEC: f64 = 2.182;
/// Width of the arm body (arcsec).
pub const ARM_WIDTH_ARCSEC: f64 = 3.0;
/// Radius around the OIWFS3 star within which OIWFS1 and OIWFS2 must stay (arcsec).
pub const SIBLING_RANGE_ARCSEC: f64 = 60.0;

// ── Identifiers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Probe {
    Oiwfs1,
    Oiwfs2,
    Oiwfs3,
    Odgw1,
    Odgw2,
    Odgw3,
    Odgw4,
    F2Oiwfs,
}

impl Probe {
    pub const ALL: [Probe; 8] = [
        Probe::Oiwfs1,
        Probe::Oiwfs2,
        Probe::Oiwfs3,
        Probe::Odgw1,
        Probe::Odgw2,
        Probe::Odgw3,
        Probe::Odgw4,
        Probe::F2Oiwfs,
    ];

    /// Stable ordinal used for deterministic ordering.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn key(self) -> &'static str {
        match self {
            Probe::Oiwfs1 => "OIWFS1",
            Probe::Oiwfs2 => "OIWFS2",
            Probe::Oiwfs3 => "OIWFS3",
            Probe::Odgw1 => "ODGW1",
            Probe::Odgw2 => "ODGW2",
            Probe::Odgw3 => "ODGW3",
            Probe::Odgw4 => "ODGW4",
            Probe::F2Oiwfs => "F2OIWFS",
        }
    }

    /// Group the probe belongs to in the standard table.
    pub fn group(self) -> ProbeGroup {
        match self {
            Probe::Oiwfs1 | Probe::Oiwfs2 | Probe::Oiwfs3 => ProbeGroup::Oiwfs,
            Probe::Odgw1 | Probe::Odgw2 | Probe::Odgw3 | Probe::Odgw4 => ProbeGroup::Odgw,
            Probe::F2Oiwfs => ProbeGroup::F2Oiwfs,
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProbeGroup {
    /// AO on-instrument wavefront sensor arms.
    Oiwfs,
    /// On-detector guide windows of the imager.
    Odgw,
    /// On-instrument probe of the spectrograph.
    F2Oiwfs,
}

impl ProbeGroup {
    pub fn key(self) -> &'static str {
        match self {
            ProbeGroup::Oiwfs => "OIWFS",
            ProbeGroup::Odgw => "ODGW",
            ProbeGroup::F2Oiwfs => "F2OIWFS",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ProbeGroup::Oiwfs => "AO wavefront sensor",
            ProbeGroup::Odgw => "On-detector guide window",
            ProbeGroup::F2Oiwfs => "Spectrograph on-instrument WFS",
        }
    }

    /// Radius around the base within which catalog stars are considered.
    pub fn radius_limit(self) -> Angle {
        Angle::from_arcmin(1.0)
    }
}

impl fmt::Display for ProbeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Science instrument behind the AO system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    /// Near-infrared imager with on-detector guide windows.
    Imager,
    /// Near-infrared spectrograph with one on-instrument probe.
    Spectrograph,
}

impl Instrument {
    /// Guide-probe group provided by the instrument itself.
    pub fn guiders(self) -> ProbeGroup {
        match self {
            Instrument::Imager => ProbeGroup::Odgw,
            Instrument::Spectrograph => ProbeGroup::F2Oiwfs,
        }
    }
}

// ── Descriptors ─────────────────────────────────────────────────────────────

/// Shape of the region a probe can reach, before rotation and offsets.
#[derive(Debug, Clone, PartialEq)]
pub enum Footprint {
    /// Disc of radius `reach` arcsec around the rotated arm origin, clipped to
    /// the AO field.
    ArmReach { reach: f64 },
    /// Disc in the instrument frame.
    Circle { center: Vector2, radius: f64 },
    /// Polygon in the instrument frame.
    Polygon(Vec<Vector2>),
    /// Not characterized yet.
    Undefined,
}

/// Physical arm dimensions, all in arcsec.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmGeometry {
    pub origin_distance: f64,
    pub width: f64,
    pub head_diameter: f64,
}

impl ArmGeometry {
    pub fn standard() -> Self {
        Self {
            origin_distance: ARM_ORIGIN_MM / PLATE_SCALE_MM_PER_ARCSEC,
            width: ARM_WIDTH_ARCSEC,
            head_diameter: ARM_HEAD_DIAMETER_MM / PLATE_SCALE_MM_PER_ARCSEC,
        }
    }
}

/// The probe's range is further limited to a disc around a sibling's star.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dependency {
    pub sibling: Probe,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeDescriptor {
    pub probe: Probe,
    pub group: ProbeGroup,
    /// Direction of the arm origin in the instrument frame.
    pub arm_angle: Angle,
    pub arm: Option<ArmGeometry>,
    pub footprint: Footprint,
    /// Probes whose star or arm this probe's arm can shadow.
    pub vignettes: Vec<Probe>,
    pub depends_on: Option<Dependency>,
}

impl ProbeDescriptor {
    /// A probe with no arm, no dependency and the given footprint.
    pub fn fixed(probe: Probe, group: ProbeGroup, footprint: Footprint) -> Self {
        Self {
            probe,
            group,
            arm_angle: Angle::ZERO,
            arm: None,
            footprint,
            vignettes: Vec::new(),
            depends_on: None,
        }
    }
}

/// Constant description of every probe an instrument configuration can use.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeTable {
    /// AO field radius (arcsec); `ArmReach` footprints are clipped to it.
    pub field_radius: f64,
    descriptors: Vec<ProbeDescriptor>,
}

impl ProbeTable {
    pub fn new(field_radius: f64, descriptors: Vec<ProbeDescriptor>) -> Self {
        let mut descriptors = descriptors;
        descriptors.sort_by_key(|d| d.probe);
        descriptors.dedup_by_key(|d| d.probe);
        Self {
            field_radius,
            descriptors,
        }
    }

    /// Shipped geometry: three AO arms plus the uncharacterized instrument probes.
    pub fn standard() -> Self {
        let arm = ArmGeometry::standard();
        let reach = ARM_MAX_EXTENSION_MM / PLATE_SCALE_MM_PER_ARCSEC;
        let odgw = [Probe::Odgw1, Probe::Odgw2, Probe::Odgw3, Probe::Odgw4];
        let ao_arm = |probe: Probe, deg: f64, below: &[Probe], depends: bool| ProbeDescriptor {
            probe,
            group: ProbeGroup::Oiwfs,
            arm_angle: Angle::from_degrees(deg),
            arm: Some(arm),
            footprint: Footprint::ArmReach { reach },
            vignettes: below.iter().copied().chain(odgw).collect(),
            depends_on: depends.then_some(Dependency {
                sibling: Probe::Oiwfs3,
                radius: SIBLING_RANGE_ARCSEC,
            }),
        };

        let mut descriptors = vec![
            ao_arm(Probe::Oiwfs1, 90.0, &[Probe::Oiwfs2, Probe::Oiwfs3], true),
            ao_arm(Probe::Oiwfs2, 210.0, &[Probe::Oiwfs3], true),
            ao_arm(Probe::Oiwfs3, 330.0, &[], false),
        ];
        descriptors.extend(
            odgw.iter()
                .map(|&p| ProbeDescriptor::fixed(p, ProbeGroup::Odgw, Footprint::Undefined)),
        );
        descriptors.push(ProbeDescriptor::fixed(
            Probe::F2Oiwfs,
            ProbeGroup::F2Oiwfs,
            Footprint::Undefined,
        ));
        Self::new(AO_FIELD_RADIUS_ARCSEC, descriptors)
    }

    pub fn get(&self, probe: Probe) -> Option<&ProbeDescriptor> {
        self.descriptors
            .binary_search_by_key(&probe, |d| d.probe)
            .ok()
            .map(|i| &self.descriptors[i])
    }

    pub fn descriptors(&self) -> &[ProbeDescriptor] {
        &self.descriptors
    }

    /// Members of `group`, in probe order.
    pub fn members(&self, group: ProbeGroup) -> Vec<Probe> {
        self.descriptors
            .iter()
            .filter(|d| d.group == group)
            .map(|d| d.probe)
            .collect()
    }

    /// `true` if `a`'s arm is declared able to shadow `b`.
    pub fn can_vignette(&self, a: Probe, b: Probe) -> bool {
        self.get(a).is_some_and(|d| d.vignettes.contains(&b))
    }
}

impl Default for ProbeTable {
    fn default() -> Self {
        Self::standard()
    }
}
