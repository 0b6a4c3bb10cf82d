//! Composition rules for a complete set of guide stars.
//!
//! Geometry says whether each probe can reach its star; these rules say whether
//! the *mix* of probes makes a usable AO configuration. Errors make an asterism
//! unusable, warnings are reported but do not reject it.

use std::fmt;

use crate::context::ObservingContext;
use crate::probe::{Instrument, ProbeGroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositionProblem {
    /// The combination of AO and instrument probes cannot be configured.
    UnsupportedCombination,
    /// Too few stars to correct tip-tilt across the field.
    TipTiltUncorrected,
    /// No AO probe star to sense slow focus.
    SlowFocusUncorrected,
}

impl CompositionProblem {
    pub fn severity(self) -> Severity {
        match self {
            CompositionProblem::UnsupportedCombination => Severity::Error,
            CompositionProblem::TipTiltUncorrected | CompositionProblem::SlowFocusUncorrected => {
                Severity::Warning
            }
        }
    }
}

impl fmt::Display for CompositionProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            CompositionProblem::UnsupportedCombination => {
                "unsupported combination of AO and on-detector guide stars"
            }
            CompositionProblem::TipTiltUncorrected => {
                "tip-tilt will not be fully corrected with the selected guide stars"
            }
            CompositionProblem::SlowFocusUncorrected => {
                "slow focus will not be corrected without an AO wavefront sensor star"
            }
        };
        f.write_str(msg)
    }
}

/// Composition problems of the guide stars assigned in `ctx`.
pub fn check_composition(ctx: &ObservingContext) -> Vec<CompositionProblem> {
    let table = ctx.probe_table();
    let count = |group: ProbeGroup| {
        ctx.assignments()
            .filter(|(p, _)| table.get(*p).is_some_and(|d| d.group == group))
            .count()
    };
    let oiwfs = count(ProbeGroup::Oiwfs);
    let odgw = count(ProbeGroup::Odgw);
    let f2 = count(ProbeGroup::F2Oiwfs);

    let mut problems = Vec::new();
    match ctx.instrument() {
        Instrument::Imager => {
            if (oiwfs == 3 && odgw > 1)
                || (odgw == 2 && oiwfs == 2)
                || odgw == 4
                || (odgw == 3 && oiwfs > 1)
            {
                problems.push(CompositionProblem::UnsupportedCombination);
            }
            if (odgw <= 1 && oiwfs < 3) || (oiwfs <= 1 && odgw < 3) {
                problems.push(CompositionProblem::TipTiltUncorrected);
            }
            if (odgw == 2 || odgw == 3) && oiwfs == 0 {
                problems.push(CompositionProblem::SlowFocusUncorrected);
            }
        }
        Instrument::Spectrograph => {
            if f2 > 0 && oiwfs < 3 {
                problems.push(CompositionProblem::TipTiltUncorrected);
            }
        }
    }
    problems
}

/// `true` when none of the problems is an error.
pub fn is_usable(problems: &[CompositionProblem]) -> bool {
    problems.iter().all(|p| p.severity() < Severity::Error)
}
