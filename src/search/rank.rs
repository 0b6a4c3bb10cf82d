//! Deterministic ordering of accepted asterisms.

use std::cmp::Ordering;

use super::Asterism;

/// An accepted asterism with the keys it is ordered by.
#[derive(Debug, Clone)]
pub struct Ranked {
    pub asterism: Asterism,
    /// Position of the asterism's angle in the tried-angle list.
    pub angle_index: usize,
    /// `(probe index, catalog index)` per assignment, in probe order.
    pub key: Vec<(usize, usize)>,
}

fn compare(a: &Ranked, b: &Ranked) -> Ordering {
    b.asterism
        .score()
        .total_cmp(&a.asterism.score())
        .then(a.angle_index.cmp(&b.angle_index))
        .then_with(|| a.key.cmp(&b.key))
}

/// Sort best-first (score descending, then angle order, then assignment key) and
/// keep at most `max_results`.
pub fn rank_asterisms(mut ranked: Vec<Ranked>, max_results: Option<usize>) -> Vec<Asterism> {
    ranked.sort_by(compare);
    if let Some(max) = max_results {
        ranked.truncate(max);
    }
    ranked.into_iter().map(|r| r.asterism).collect()
}
