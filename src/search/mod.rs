//! Asterism search and ranking.
//!
//! Given an observing context with a base position, the search:
//!
//! 1. **Catalog query**: fetches candidates once per participating probe group,
//!    within the group's radius limit widened by the largest science offset.
//! 2. **Position angles**: tries the context's position angle and, optionally,
//!    the four cardinal angles.
//! 3. **Partial assignments**: per angle and group, enumerates brightest-first
//!    star subsets and every injective probe assignment, keeping the ones that
//!    pass reach and vignetting checks within the group. With a single group
//!    these are scored directly.
//! 4. **Full assignments**: with several groups, combines partials across
//!    groups, re-validates the whole assignment (cross-group vignetting
//!    included) and applies the composition rules.
//!
//! Every assignment tried in steps 3 and 4 is reported to the progress sink,
//! which may cancel the search after any of them.
//! 5. **Ranking**: scores by mean per-star quality and sorts deterministically.

pub mod combinations;
pub mod find;
pub mod rank;

use std::fmt;
use std::ops::ControlFlow;

use thiserror::Error;

use crate::angle::Angle;
use crate::catalogs::CatalogError;
use crate::context::ObservingContext;
use crate::probe::{Instrument, Probe, ProbeGroup, ProbeTable};
use crate::rules::CompositionProblem;
use crate::star::{CandidateStar, MagnitudeBand, MagnitudeConstraints};
use crate::validation::Validation;

pub use self::find::find_asterisms;

// ── Modes ───────────────────────────────────────────────────────────────────

/// Which probe groups provide tip-tilt correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TipTiltMode {
    /// AO wavefront sensor probes only.
    #[default]
    Ao,
    /// The instrument's own guide probes only.
    Instrument,
    /// Both.
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GuideStarRole {
    TipTilt,
    Flexure,
}

impl fmt::Display for GuideStarRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuideStarRole::TipTilt => f.write_str("tip-tilt"),
            GuideStarRole::Flexure => f.write_str("flexure"),
        }
    }
}

/// Near-infrared band used for instrument-probe magnitude limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NirBand {
    J,
    #[default]
    H,
    K,
}

impl NirBand {
    pub fn band(self) -> MagnitudeBand {
        match self {
            NirBand::J => MagnitudeBand::J,
            NirBand::H => MagnitudeBand::H,
            NirBand::K => MagnitudeBand::K,
        }
    }
}

// ── Options ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Groups used for tip-tilt. Forced to `Ao` for the spectrograph.
    pub tip_tilt_mode: TipTiltMode,
    /// Also require one flexure star from the group not used for tip-tilt.
    /// Ignored in `Both` mode. Default: false.
    pub include_flexure: bool,
    /// Limits for AO probe stars. Default: R ≤ 18.
    pub ao_constraints: MagnitudeConstraints,
    /// Limits for instrument probe stars; the band is replaced by `nir_band`.
    /// Default: ≤ 22.
    pub instrument_constraints: MagnitudeConstraints,
    /// Default: H.
    pub nir_band: NirBand,
    /// Also try position angles 0°, 90°, 180° and 270°. Default: true.
    pub include_cardinal_angles: bool,
    /// Present the candidates at the best position angle for review instead of
    /// committing the best one. Default: false.
    pub review_before_commit: bool,
    /// Brightest candidates kept per group and position angle. Default: 10.
    pub max_candidates_per_group: usize,
    /// Maximum asterisms returned. None = all. Default: None.
    pub max_results: Option<usize>,
    /// Catalog search radius. None = the group's radius limit. Default: None.
    pub search_radius: Option<Angle>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            tip_tilt_mode: TipTiltMode::Ao,
            include_flexure: false,
            ao_constraints: MagnitudeConstraints::new(MagnitudeBand::R, 18.0, None),
            instrument_constraints: MagnitudeConstraints::new(MagnitudeBand::H, 22.0, None),
            nir_band: NirBand::H,
            include_cardinal_angles: true,
            review_before_commit: false,
            max_candidates_per_group: 10,
            max_results: None,
            search_radius: None,
        }
    }
}

impl SearchOptions {
    /// Magnitude limits applied to catalog stars for `group`.
    pub fn constraints_for(&self, group: ProbeGroup) -> MagnitudeConstraints {
        match group {
            ProbeGroup::Oiwfs => self.ao_constraints,
            ProbeGroup::Odgw | ProbeGroup::F2Oiwfs => {
                self.instrument_constraints.in_band(self.nir_band.band())
            }
        }
    }

    /// Tip-tilt mode after `instrument`'s restrictions.
    pub fn effective_tip_tilt_mode(&self, instrument: Instrument) -> TipTiltMode {
        match instrument {
            Instrument::Spectrograph => TipTiltMode::Ao,
            Instrument::Imager => self.tip_tilt_mode,
        }
    }
}

// ── Requirements ────────────────────────────────────────────────────────────

/// Stars a probe group must contribute to an asterism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRequirement {
    pub group: ProbeGroup,
    pub role: GuideStarRole,
    pub min_stars: usize,
    pub max_stars: usize,
}

/// Requirements implied by `options` for `instrument`, tip-tilt groups first.
pub fn requirements(
    options: &SearchOptions,
    instrument: Instrument,
    table: &ProbeTable,
) -> Vec<GroupRequirement> {
    let mode = options.effective_tip_tilt_mode(instrument);
    let instrument = instrument.guiders();
    let tip_tilt: &[ProbeGroup] = match mode {
        TipTiltMode::Ao => &[ProbeGroup::Oiwfs],
        TipTiltMode::Instrument => &[instrument],
        TipTiltMode::Both => &[ProbeGroup::Oiwfs, instrument],
    };

    let mut reqs: Vec<GroupRequirement> = tip_tilt
        .iter()
        .map(|&group| GroupRequirement {
            group,
            role: GuideStarRole::TipTilt,
            min_stars: 1,
            max_stars: table.members(group).len(),
        })
        .collect();

    let flexure = match mode {
        TipTiltMode::Ao => Some(instrument),
        TipTiltMode::Instrument => Some(ProbeGroup::Oiwfs),
        TipTiltMode::Both => None,
    };
    if let Some(group) = flexure.filter(|_| options.include_flexure) {
        reqs.push(GroupRequirement {
            group,
            role: GuideStarRole::Flexure,
            min_stars: 1,
            max_stars: 1,
        });
    }
    reqs
}

/// Position angles to try: `current`, plus the cardinal angles when requested,
/// deduplicated and in ascending order.
pub fn position_angles(current: Angle, include_cardinal: bool) -> Vec<Angle> {
    let mut angles = vec![current];
    if include_cardinal {
        angles.extend([0.0, 90.0, 180.0, 270.0].map(Angle::from_degrees));
    }
    angles.sort_by(|a, b| a.to_degrees().total_cmp(&b.to_degrees()));
    angles.dedup_by(|a, b| a.approx_eq(b, 1e-9));
    angles
}

// ── Results ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub probe: Probe,
    pub star: CandidateStar,
    pub role: GuideStarRole,
}

/// A ranked, validated set of guide stars at one position angle.
#[derive(Debug, Clone, PartialEq)]
pub struct Asterism {
    position_angle: Angle,
    assignments: Vec<Assignment>,
    score: f64,
    validation: Validation,
    warnings: Vec<CompositionProblem>,
}

impl Asterism {
    pub(crate) fn new(
        position_angle: Angle,
        mut assignments: Vec<Assignment>,
        score: f64,
        validation: Validation,
        warnings: Vec<CompositionProblem>,
    ) -> Self {
        assignments.sort_by_key(|a| a.probe);
        Self {
            position_angle,
            assignments,
            score,
            validation,
            warnings,
        }
    }

    pub fn position_angle(&self) -> Angle {
        self.position_angle
    }

    /// Assignments in probe order.
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn star_for(&self, probe: Probe) -> Option<&CandidateStar> {
        self.assignments
            .iter()
            .find(|a| a.probe == probe)
            .map(|a| &a.star)
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn validation(&self) -> Validation {
        self.validation
    }

    /// Composition warnings that did not reject the asterism.
    pub fn warnings(&self) -> &[CompositionProblem] {
        &self.warnings
    }

    /// `template` at this asterism's position angle with exactly its assignments.
    pub fn context(&self, template: &ObservingContext) -> ObservingContext {
        template
            .with_position_angle(self.position_angle)
            .without_assignments()
            .with_assignments(self.assignments.iter().map(|a| (a.probe, a.star.clone())))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Assignments evaluated, one per progress update.
    pub evaluated: usize,
    /// Assignments rejected by reach, vignetting or composition.
    pub invalid: usize,
    /// Assignments skipped because their geometry is undefined.
    pub undefined_geometry: usize,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best first; never empty.
    pub asterisms: Vec<Asterism>,
    /// The search was stopped early by the progress callback.
    pub cancelled: bool,
    pub stats: SearchStats,
    pub review_before_commit: bool,
}

/// What to do with a successful search.
#[derive(Debug, Clone)]
pub enum Selection<'a> {
    /// Apply this asterism.
    Commit(&'a Asterism),
    /// Let the operator pick among these.
    Review(Vec<&'a Asterism>),
}

impl SearchOutcome {
    pub fn best(&self) -> Option<&Asterism> {
        self.asterisms.first()
    }

    /// Asterisms at the best asterism's position angle, best first.
    pub fn at_best_position_angle(&self) -> Vec<&Asterism> {
        let Some(best) = self.best() else {
            return Vec::new();
        };
        self.asterisms
            .iter()
            .filter(|a| a.position_angle == best.position_angle)
            .collect()
    }

    pub fn selection(&self) -> Option<Selection<'_>> {
        if self.review_before_commit {
            let candidates = self.at_best_position_angle();
            (!candidates.is_empty()).then_some(Selection::Review(candidates))
        } else {
            self.best().map(Selection::Commit)
        }
    }

    /// Hand the best asterism to `target`.
    pub fn commit_best<T: CommitTarget + ?Sized>(&self, target: &mut T) -> Option<&Asterism> {
        let best = self.best()?;
        target.commit(best.position_angle, &best.assignments);
        Some(best)
    }
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("search cancelled before any valid asterism was found")]
    Cancelled,
    #[error("no {group} guide stars were found")]
    NoValidAsterism { group: ProbeGroup },
    #[error("observation has no base position")]
    MissingBasePosition,
}

// ── Collaborators ───────────────────────────────────────────────────────────

/// Per-star optical quality; higher is better.
pub trait StarQuality {
    fn quality(&self, star: &CandidateStar, probe: Probe) -> f64;
}

impl<F> StarQuality for F
where
    F: Fn(&CandidateStar, Probe) -> f64,
{
    fn quality(&self, star: &CandidateStar, probe: Probe) -> f64 {
        self(star, probe)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    /// Assignments evaluated so far.
    pub count: usize,
    /// Assignments known to need evaluating. With several probe groups the
    /// cross-group combinations are added once every group's assignments are known.
    pub total: usize,
    /// Score of the best asterism so far.
    pub best_score: Option<f64>,
    /// Whether at least one usable asterism has been found.
    pub usable: bool,
    /// Asterisms accepted so far.
    pub accepted: usize,
}

/// Receives progress after every evaluated assignment; `Break` cancels.
pub trait SearchProgress {
    fn progress(&mut self, update: &ProgressUpdate) -> ControlFlow<()>;
}

impl<F> SearchProgress for F
where
    F: FnMut(&ProgressUpdate) -> ControlFlow<()>,
{
    fn progress(&mut self, update: &ProgressUpdate) -> ControlFlow<()> {
        self(update)
    }
}

/// Progress sink that never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreProgress;

impl SearchProgress for IgnoreProgress {
    fn progress(&mut self, _update: &ProgressUpdate) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// Receives the chosen asterism.
pub trait CommitTarget {
    fn commit(&mut self, position_angle: Angle, assignments: &[Assignment]);
}

impl CommitTarget for ObservingContext {
    fn commit(&mut self, position_angle: Angle, assignments: &[Assignment]) {
        *self = self
            .with_position_angle(position_angle)
            .without_assignments()
            .with_assignments(assignments.iter().map(|a| (a.probe, a.star.clone())));
    }
}
