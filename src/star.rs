use std::fmt;

use crate::coords::SkyCoord;

/// Photometric band of a catalog magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MagnitudeBand {
    R,
    UC,
    J,
    H,
    K,
}

impl MagnitudeBand {
    /// Parse a band name as found in catalog files ("R", "UC", "J", "H", "K").
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "R" => Some(MagnitudeBand::R),
            "UC" => Some(MagnitudeBand::UC),
            "J" => Some(MagnitudeBand::J),
            "H" => Some(MagnitudeBand::H),
            "K" | "KS" => Some(MagnitudeBand::K),
            _ => None,
        }
    }
}

impl fmt::Display for MagnitudeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MagnitudeBand::R => "R",
            MagnitudeBand::UC => "UC",
            MagnitudeBand::J => "J",
            MagnitudeBand::H => "H",
            MagnitudeBand::K => "K",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Magnitude {
    pub band: MagnitudeBand,
    pub value: f64,
}

/// A guide-star candidate as returned by a catalog query.
///
/// Candidates are read-only; the search never modifies them, it only assigns them
/// to probes.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateStar {
    pub id: u64,
    pub name: String,
    pub coord: SkyCoord,
    pub magnitudes: Vec<Magnitude>,
}

impl CandidateStar {
    pub fn new(id: u64, coord: SkyCoord) -> Self {
        Self {
            id,
            name: format!("{id}"),
            coord,
            magnitudes: Vec::new(),
        }
    }

    pub fn with_magnitude(mut self, band: MagnitudeBand, value: f64) -> Self {
        self.magnitudes.retain(|m| m.band != band);
        self.magnitudes.push(Magnitude { band, value });
        self
    }

    pub fn magnitude(&self, band: MagnitudeBand) -> Option<f64> {
        self.magnitudes
            .iter()
            .find(|m| m.band == band)
            .map(|m| m.value)
    }
}

/// Magnitude window for one band.
///
/// A star passes when it has a magnitude in `band` that is no fainter than
/// `faintness` and, if set, no brighter than `saturation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnitudeConstraints {
    pub band: MagnitudeBand,
    pub faintness: f64,
    pub saturation: Option<f64>,
}

impl MagnitudeConstraints {
    pub fn new(band: MagnitudeBand, faintness: f64, saturation: Option<f64>) -> Self {
        Self {
            band,
            faintness,
            saturation,
        }
    }

    pub fn accepts(&self, star: &CandidateStar) -> bool {
        match star.magnitude(self.band) {
            Some(m) => m <= self.faintness && self.saturation.map_or(true, |s| m >= s),
            None => false,
        }
    }

    /// Same window moved to another band.
    pub fn in_band(self, band: MagnitudeBand) -> Self {
        Self { band, ..self }
    }
}
