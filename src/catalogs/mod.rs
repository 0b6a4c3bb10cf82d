//! Guide-star catalog access.
//!
//! The search only needs a cone query with magnitude limits; where the stars come
//! from (a remote service, a file, a test fixture) is up to the [`Catalog`]
//! implementation. Query failures are surfaced verbatim and never retried here.

pub mod csv_file;

use thiserror::Error;

use crate::angle::Angle;
use crate::coords::SkyCoord;
use crate::star::{CandidateStar, MagnitudeConstraints};

pub use self::csv_file::{read_catalog_csv, read_catalog_csv_from_reader};

/// Failure reported by a catalog collaborator.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog query failed: {0:#}")]
    Query(anyhow::Error),
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// A source of guide-star candidates.
pub trait Catalog {
    /// Stars within `radius` of `base` passing `constraints`, in catalog order.
    fn query(
        &self,
        base: &SkyCoord,
        radius: Angle,
        constraints: &MagnitudeConstraints,
    ) -> Result<Vec<CandidateStar>, CatalogError>;
}

/// In-memory catalog with a linear cone search.
///
/// Query results keep the order in which stars were added, which makes search
/// output reproducible for a fixed input list.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    stars: Vec<CandidateStar>,
}

impl StaticCatalog {
    pub fn new(stars: Vec<CandidateStar>) -> Self {
        Self { stars }
    }

    /// Load a catalog from a CSV file (see [`read_catalog_csv`] for the format).
    pub fn from_csv<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self::new(read_catalog_csv(path)?))
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn stars(&self) -> &[CandidateStar] {
        &self.stars
    }
}

impl Catalog for StaticCatalog {
    fn query(
        &self,
        base: &SkyCoord,
        radius: Angle,
        constraints: &MagnitudeConstraints,
    ) -> Result<Vec<CandidateStar>, CatalogError> {
        let radius_rad = radius.to_radians();
        Ok(self
            .stars
            .iter()
            .filter(|s| base.separation(&s.coord) <= radius_rad && constraints.accepts(s))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::Offset;
    use crate::star::MagnitudeBand;

    #[test]
    fn test_static_catalog_cone_and_magnitude() {
        let base = SkyCoord::from_degrees(120.0, -30.0);
        let star = |id: u64, p: f64, q: f64, r: f64| {
            CandidateStar::new(id, base.offset_by(&Offset::from_arcsec(p, q)))
                .with_magnitude(MagnitudeBand::R, r)
        };
        let catalog = StaticCatalog::new(vec![
            star(1, 10.0, 10.0, 12.0),
            star(2, 100.0, 0.0, 12.0),
            star(3, -20.0, 5.0, 19.0),
            star(4, 0.0, -50.0, 13.0),
        ]);
        let c = MagnitudeConstraints::new(MagnitudeBand::R, 17.0, None);
        let found = catalog.query(&base, Angle::from_arcmin(1.0), &c).unwrap();
        let ids: Vec<u64> = found.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }
}
