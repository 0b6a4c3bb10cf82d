//! CSV guide-star catalogs.
//!
//! Expected header: `id,ra_deg,dec_deg` plus an optional `name` column and one
//! column per magnitude band (`R`, `UC`, `J`, `H`, `K`). Empty magnitude cells mean
//! the band was not measured. Unknown columns are ignored.

use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context};

use crate::coords::SkyCoord;
use crate::star::{CandidateStar, Magnitude, MagnitudeBand};

pub fn read_catalog_csv<P: AsRef<Path>>(file: P) -> anyhow::Result<Vec<CandidateStar>> {
    let path = file.as_ref();
    let f = std::fs::File::open(path)
        .with_context(|| format!("opening catalog {}", path.display()))?;
    read_catalog_csv_from_reader(f).with_context(|| format!("reading catalog {}", path.display()))
}

pub fn read_catalog_csv_from_reader<R: Read>(reader: R) -> anyhow::Result<Vec<CandidateStar>> {
    let mut rdr = ::csv::ReaderBuilder::new().trim(::csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let id_col = column("id").ok_or_else(|| anyhow!("missing `id` column"))?;
    let ra_col = column("ra_deg").ok_or_else(|| anyhow!("missing `ra_deg` column"))?;
    let dec_col = column("dec_deg").ok_or_else(|| anyhow!("missing `dec_deg` column"))?;
    let name_col = column("name");
    let band_cols: Vec<(usize, MagnitudeBand)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| MagnitudeBand::parse(h).map(|b| (i, b)))
        .collect();

    rdr.records()
        .enumerate()
        .map(|(row, result)| -> anyhow::Result<CandidateStar> {
            let record = result?;
            let field = |i: usize| record.get(i).unwrap_or("");
            let id: u64 = field(id_col)
                .parse()
                .with_context(|| format!("row {}: bad id {:?}", row + 1, field(id_col)))?;
            let ra: f64 = field(ra_col)
                .parse()
                .with_context(|| format!("row {}: bad ra_deg", row + 1))?;
            let dec: f64 = field(dec_col)
                .parse()
                .with_context(|| format!("row {}: bad dec_deg", row + 1))?;
            let magnitudes = band_cols
                .iter()
                .filter_map(|&(i, band)| match field(i) {
                    "" => None,
                    s => s.parse().ok().map(|value| Magnitude { band, value }),
                })
                .collect();
            let name = match name_col.map(|i| field(i)) {
                Some(n) if !n.is_empty() => n.to_string(),
                _ => id.to_string(),
            };
            Ok(CandidateStar {
                id,
                name,
                coord: SkyCoord::from_degrees(ra, dec),
                magnitudes,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_catalog_csv() {
        let data = "\
id,name,ra_deg,dec_deg,R,H,notes
1,alpha,10.5,-20.25,13.2,,bright
2,,10.51,-20.26,,11.0,
";
        let stars = read_catalog_csv_from_reader(data.as_bytes()).unwrap();
        assert_eq!(stars.len(), 2);
        assert_eq!(stars[0].name, "alpha");
        assert_eq!(stars[0].magnitude(MagnitudeBand::R), Some(13.2));
        assert_eq!(stars[0].magnitude(MagnitudeBand::H), None);
        assert_eq!(stars[1].name, "2");
        assert_eq!(stars[1].magnitude(MagnitudeBand::H), Some(11.0));
        assert!((stars[1].coord.dec_deg() + 20.26).abs() < 1e-9);
    }

    #[test]
    fn test_missing_columns_rejected() {
        let data = "id,ra\n1,2.0\n";
        assert!(read_catalog_csv_from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn test_bad_row_reports_error() {
        let data = "id,ra_deg,dec_deg\nx,1.0,2.0\n";
        let err = read_catalog_csv_from_reader(data.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("row 1"));
    }
}
