//! The observing context every geometric query is evaluated against.
//!
//! A context is a value: every `with_*` method returns a new context and leaves
//! the receiver untouched, so trial configurations built during a search never
//! leak into the caller's context. The probe table and port rotations are shared
//! behind `Arc`s and are cheap to clone.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::angle::{Angle, Offset};
use crate::config::{Port, PortRotations};
use crate::coords::{coordinate_diff, SkyCoord};
use crate::probe::{Instrument, Probe, ProbeTable};
use crate::star::CandidateStar;

#[derive(Debug, Clone)]
pub struct ObservingContext {
    base: Option<SkyCoord>,
    position_angle: Angle,
    port: Port,
    rotations: Arc<PortRotations>,
    science_offsets: Vec<Offset>,
    instrument: Instrument,
    table: Arc<ProbeTable>,
    assignments: BTreeMap<Probe, CandidateStar>,
}

impl ObservingContext {
    /// Context at `base` with the standard probe table, default port rotations,
    /// the up-looking port, position angle 0 and no science offsets.
    pub fn new(base: SkyCoord, instrument: Instrument) -> Self {
        Self {
            base: Some(base),
            position_angle: Angle::ZERO,
            port: Port::UpLooking,
            rotations: Arc::new(PortRotations::default()),
            science_offsets: vec![Offset::ZERO],
            instrument,
            table: Arc::new(ProbeTable::standard()),
            assignments: BTreeMap::new(),
        }
    }

    // ── Modifiers ───────────────────────────────────────────────────────────

    pub fn with_base(&self, base: Option<SkyCoord>) -> Self {
        Self {
            base,
            ..self.clone()
        }
    }

    pub fn with_position_angle(&self, position_angle: Angle) -> Self {
        Self {
            position_angle,
            ..self.clone()
        }
    }

    pub fn with_port(&self, port: Port) -> Self {
        Self {
            port,
            ..self.clone()
        }
    }

    pub fn with_port_rotations(&self, rotations: Arc<PortRotations>) -> Self {
        Self {
            rotations,
            ..self.clone()
        }
    }

    pub fn with_instrument(&self, instrument: Instrument) -> Self {
        Self {
            instrument,
            ..self.clone()
        }
    }

    pub fn with_probe_table(&self, table: Arc<ProbeTable>) -> Self {
        Self {
            table,
            ..self.clone()
        }
    }

    /// Replace the science offsets. An empty list means "no offsets" and is
    /// stored as the single zero offset.
    pub fn with_science_offsets(&self, offsets: Vec<Offset>) -> Self {
        let science_offsets = if offsets.is_empty() {
            vec![Offset::ZERO]
        } else {
            offsets
        };
        Self {
            science_offsets,
            ..self.clone()
        }
    }

    pub fn with_assignment(&self, probe: Probe, star: CandidateStar) -> Self {
        let mut ctx = self.clone();
        ctx.assignments.insert(probe, star);
        ctx
    }

    pub fn with_assignments<I>(&self, assignments: I) -> Self
    where
        I: IntoIterator<Item = (Probe, CandidateStar)>,
    {
        let mut ctx = self.clone();
        ctx.assignments.extend(assignments);
        ctx
    }

    pub fn without_assignment(&self, probe: Probe) -> Self {
        let mut ctx = self.clone();
        ctx.assignments.remove(&probe);
        ctx
    }

    pub fn without_assignments(&self) -> Self {
        Self {
            assignments: BTreeMap::new(),
            ..self.clone()
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn base(&self) -> Option<&SkyCoord> {
        self.base.as_ref()
    }

    pub fn position_angle(&self) -> Angle {
        self.position_angle
    }

    pub fn port(&self) -> Port {
        self.port
    }

    pub fn port_rotations(&self) -> &Arc<PortRotations> {
        &self.rotations
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn probe_table(&self) -> &Arc<ProbeTable> {
        &self.table
    }

    pub fn science_offsets(&self) -> &[Offset] {
        &self.science_offsets
    }

    /// Position angle plus the rotation of the configured port.
    pub fn total_rotation(&self) -> Angle {
        self.position_angle + self.rotations.rotation(self.port)
    }

    /// Offset of `coord` from the base, or `None` without a base position.
    pub fn offset_of(&self, coord: &SkyCoord) -> Option<Offset> {
        self.base.as_ref().map(|base| coordinate_diff(base, coord))
    }

    pub fn assigned(&self, probe: Probe) -> Option<&CandidateStar> {
        self.assignments.get(&probe)
    }

    /// Offset of the star assigned to `probe`.
    pub fn assigned_offset(&self, probe: Probe) -> Option<Offset> {
        self.assigned(probe).and_then(|s| self.offset_of(&s.coord))
    }

    /// Assigned probes in probe order.
    pub fn assignments(&self) -> impl Iterator<Item = (Probe, &CandidateStar)> + '_ {
        self.assignments.iter().map(|(p, s)| (*p, s))
    }

    pub fn occupied(&self) -> Vec<Probe> {
        self.assignments.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_do_not_mutate() {
        let base = SkyCoord::from_degrees(10.0, 20.0);
        let ctx = ObservingContext::new(base, Instrument::Imager);
        let star = CandidateStar::new(1, base.offset_by(&Offset::from_arcsec(5.0, 0.0)));
        let assigned = ctx
            .with_position_angle(Angle::from_degrees(90.0))
            .with_assignment(Probe::Oiwfs1, star);
        assert!(ctx.assigned(Probe::Oiwfs1).is_none());
        assert_eq!(ctx.position_angle(), Angle::ZERO);
        assert!(assigned.assigned(Probe::Oiwfs1).is_some());
        let off = assigned.assigned_offset(Probe::Oiwfs1).unwrap();
        assert!((off.p_arcsec() - 5.0).abs() < 1e-6);
        assert!(assigned.without_assignments().occupied().is_empty());
    }

    #[test]
    fn test_total_rotation_and_offsets() {
        let ctx = ObservingContext::new(SkyCoord::from_degrees(0.0, 0.0), Instrument::Imager)
            .with_port(Port::SideLooking)
            .with_position_angle(Angle::from_degrees(30.0));
        assert!((ctx.total_rotation().to_degrees() - 120.0).abs() < 1e-9);
        assert_eq!(ctx.with_science_offsets(vec![]).science_offsets(), &[Offset::ZERO]);
        let no_base = ctx.with_base(None);
        assert!(no_base.offset_of(&SkyCoord::from_degrees(0.0, 0.0)).is_none());
    }
}
