//! The search loop.

use std::ops::{ControlFlow, RangeInclusive};
use std::time::Instant;

use tracing::{debug, info};

use super::combinations::{assignment_count, injective_assignments, BreadthFirstSubsets};
use super::rank::{rank_asterisms, Ranked};
use super::{
    position_angles, requirements, Asterism, Assignment, GroupRequirement, ProgressUpdate,
    SearchError, SearchOptions, SearchOutcome, SearchProgress, SearchStats, StarQuality,
};
use crate::angle::{Angle, Offset};
use crate::catalogs::Catalog;
use crate::context::ObservingContext;
use crate::geometry::PatrolField;
use crate::patrol::unconstrained_range;
use crate::probe::{Probe, ProbeGroup};
use crate::rules::{check_composition, is_usable};
use crate::star::CandidateStar;
use crate::validation::{validate_assignment, Validation};

/// One star placed on one probe. `star` indexes the requirement's query result.
#[derive(Debug, Clone, Copy)]
struct Slot {
    probe: Probe,
    req: usize,
    star: usize,
}

/// A valid assignment for a single requirement.
#[derive(Debug)]
struct Partial {
    slots: Vec<Slot>,
}

/// Stars one requirement may use at one position angle.
struct Candidates {
    members: Vec<Probe>,
    /// Indices into the requirement's query result, brightest first.
    stars: Vec<usize>,
    /// `reach[c][m]`: candidate `c` is not ruled out for member `m`.
    reach: Vec<Vec<bool>>,
    sizes: RangeInclusive<usize>,
}

impl Candidates {
    fn assignment_count(&self) -> usize {
        assignment_count(self.stars.len(), self.sizes.clone(), self.members.len())
    }
}

/// Per-angle state.
struct Trial {
    angle_index: usize,
    angle: Angle,
    ctx: ObservingContext,
    candidates: Vec<Candidates>,
    partials: Vec<Vec<Partial>>,
}

/// Search for guide-star asterisms around `template`'s base position.
///
/// `template` supplies the base, position angle, port, instrument, science
/// offsets and probe table; its assignments are ignored. Returns the accepted
/// asterisms best-first, or why none could be found.
///
/// Every assignment tried is reported to `progress`. Cancelling returns the
/// asterisms accepted so far with `cancelled` set, or [`SearchError::Cancelled`]
/// if there are none.
pub fn find_asterisms<C, Q, P>(
    template: &ObservingContext,
    catalog: &C,
    options: &SearchOptions,
    quality: &Q,
    progress: &mut P,
) -> Result<SearchOutcome, SearchError>
where
    C: Catalog + ?Sized,
    Q: StarQuality + ?Sized,
    P: SearchProgress + ?Sized,
{
    let t0 = Instant::now();
    let base = *template.base().ok_or(SearchError::MissingBasePosition)?;
    let template = template.without_assignments();
    let reqs = requirements(options, template.instrument(), template.probe_table());

    // ── Catalog ──
    let max_offset = template
        .science_offsets()
        .iter()
        .map(Offset::distance_arcsec)
        .fold(0.0, f64::max);
    let mut stars: Vec<Vec<CandidateStar>> = Vec::with_capacity(reqs.len());
    for req in &reqs {
        let radius = options
            .search_radius
            .unwrap_or_else(|| req.group.radius_limit())
            + Angle::from_arcsec(max_offset);
        let found = catalog.query(&base, radius, &options.constraints_for(req.group))?;
        debug!(
            "{} {} candidates within {:.1}\"",
            found.len(),
            req.group,
            radius.to_arcsec()
        );
        if found.is_empty() {
            return Err(SearchError::NoValidAsterism { group: req.group });
        }
        stars.push(found);
    }

    // ── Candidates per angle ──
    let angles = position_angles(template.position_angle(), options.include_cardinal_angles);
    let mut trials: Vec<Trial> = angles
        .iter()
        .enumerate()
        .map(|(angle_index, &angle)| {
            let ctx = template.with_position_angle(angle);
            let candidates = reqs
                .iter()
                .zip(&stars)
                .map(|(req, found)| reachable_candidates(req, found, &ctx, options))
                .collect();
            Trial {
                angle_index,
                angle,
                ctx,
                candidates,
                partials: Vec::with_capacity(reqs.len()),
            }
        })
        .collect();

    let mut search = Search {
        reqs: &reqs,
        stars: &stars,
        quality,
        progress,
        count: 0,
        total: trials
            .iter()
            .flat_map(|t| &t.candidates)
            .map(Candidates::assignment_count)
            .sum(),
        best_score: None,
        ranked: Vec::new(),
        stats: SearchStats::default(),
        cancelled: false,
    };

    // ── Phase 1: partial assignments per angle and requirement ──
    let mut group_found = vec![false; reqs.len()];
    'angles: for trial in &mut trials {
        for (ri, found) in group_found.iter_mut().enumerate() {
            let mut partials = Vec::new();
            let flow = search.partial_assignments(ri, trial, &mut partials);
            *found |= !partials.is_empty();
            trial.partials.push(partials);
            if flow.is_break() {
                break 'angles;
            }
        }
        debug!(
            "PA {}: partials per group {:?}",
            trial.angle,
            trial.partials.iter().map(Vec::len).collect::<Vec<_>>()
        );
    }

    // ── Phase 2: full assignments ──
    if reqs.len() > 1 && !search.cancelled {
        search.total += trials
            .iter()
            .map(|t| t.partials.iter().map(Vec::len).product::<usize>())
            .sum::<usize>();
        for trial in &trials {
            if search.combine(trial).is_break() {
                break;
            }
        }
    }

    let Search {
        ranked,
        mut stats,
        count,
        cancelled,
        ..
    } = search;
    stats.evaluated = count;
    let asterisms = rank_asterisms(ranked, options.max_results);
    info!(
        "Found {} asterisms from {} assignments in {:.1} ms ({} invalid, {} undefined)",
        asterisms.len(),
        stats.evaluated,
        t0.elapsed().as_secs_f64() * 1000.0,
        stats.invalid,
        stats.undefined_geometry
    );

    if asterisms.is_empty() {
        if cancelled {
            return Err(SearchError::Cancelled);
        }
        let group = reqs
            .iter()
            .zip(&group_found)
            .find(|(_, found)| !**found)
            .map(|(r, _)| r)
            .or(reqs.last())
            .map_or(ProbeGroup::Oiwfs, |r| r.group);
        return Err(SearchError::NoValidAsterism { group });
    }

    Ok(SearchOutcome {
        asterisms,
        cancelled,
        stats,
        review_before_commit: options.review_before_commit,
    })
}

/// Brightest stars for `req` that at least one member's unconstrained range
/// does not rule out.
fn reachable_candidates(
    req: &GroupRequirement,
    stars: &[CandidateStar],
    ctx: &ObservingContext,
    options: &SearchOptions,
) -> Candidates {
    let members = ctx.probe_table().members(req.group);
    let ranges: Vec<PatrolField> = members
        .iter()
        .map(|&p| unconstrained_range(p, ctx))
        .collect();
    // Undefined ranges cannot rule a star out
    let reach_of = |star: &CandidateStar| -> Vec<bool> {
        match ctx.offset_of(&star.coord) {
            Some(o) => ranges.iter().map(|r| r.contains(&o) != Some(false)).collect(),
            None => vec![true; ranges.len()],
        }
    };

    let band = options.constraints_for(req.group).band;
    let brightness = |i: usize| stars[i].magnitude(band).unwrap_or(f64::INFINITY);
    let mut reachable: Vec<(usize, Vec<bool>)> = stars
        .iter()
        .enumerate()
        .map(|(i, s)| (i, reach_of(s)))
        .filter(|(_, reach)| reach.iter().any(|&r| r))
        .collect();
    reachable.sort_by(|(a, _), (b, _)| brightness(*a).total_cmp(&brightness(*b)).then(a.cmp(b)));
    reachable.truncate(options.max_candidates_per_group);

    let max = req.max_stars.min(members.len());
    let (stars, reach): (Vec<usize>, Vec<Vec<bool>>) = reachable.into_iter().unzip();
    Candidates {
        members,
        stars,
        reach,
        sizes: req.min_stars..=max,
    }
}

/// Running state of one search.
struct Search<'a, Q: ?Sized, P: ?Sized> {
    reqs: &'a [GroupRequirement],
    stars: &'a [Vec<CandidateStar>],
    quality: &'a Q,
    progress: &'a mut P,
    count: usize,
    total: usize,
    best_score: Option<f64>,
    ranked: Vec<Ranked>,
    stats: SearchStats,
    cancelled: bool,
}

impl<Q, P> Search<'_, Q, P>
where
    Q: StarQuality + ?Sized,
    P: SearchProgress + ?Sized,
{
    /// Count one evaluated assignment, keeping `accepted` if any, and ask the
    /// progress sink whether to go on.
    fn record(&mut self, accepted: Option<Ranked>) -> ControlFlow<()> {
        if let Some(r) = accepted {
            let score = r.asterism.score();
            self.best_score = Some(self.best_score.map_or(score, |b| b.max(score)));
            self.ranked.push(r);
        }
        self.count += 1;
        let update = ProgressUpdate {
            count: self.count,
            total: self.total,
            best_score: self.best_score,
            usable: !self.ranked.is_empty(),
            accepted: self.ranked.len(),
        };
        if self.progress.progress(&update).is_break() {
            info!(
                "Search cancelled after {} of {} assignments",
                self.count, self.total
            );
            self.cancelled = true;
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }

    /// Try every assignment for requirement `ri` at `trial`'s angle, collecting
    /// the valid ones in `partials`. A lone requirement's valid assignments are
    /// complete asterisms and are scored straight away.
    fn partial_assignments(
        &mut self,
        ri: usize,
        trial: &Trial,
        partials: &mut Vec<Partial>,
    ) -> ControlFlow<()> {
        let all = self.stars;
        let stars = &all[ri];
        let group = self.reqs[ri].group;
        let cand = &trial.candidates[ri];
        let single = self.reqs.len() == 1;

        for subset in BreadthFirstSubsets::new(cand.stars.len(), cand.sizes.clone()) {
            for perm in injective_assignments(subset.len(), cand.members.len()) {
                let mut accepted = None;
                if subset.iter().zip(&perm).any(|(&c, &m)| !cand.reach[c][m]) {
                    self.stats.invalid += 1;
                } else {
                    let slots: Vec<Slot> = subset
                        .iter()
                        .zip(&perm)
                        .map(|(&c, &m)| Slot {
                            probe: cand.members[m],
                            req: ri,
                            star: cand.stars[c],
                        })
                        .collect();
                    let ctx = trial
                        .ctx
                        .with_assignments(slots.iter().map(|s| (s.probe, stars[s.star].clone())));
                    match validate_assignment(&ctx) {
                        Validation::Valid => {
                            let partial = Partial { slots };
                            if single {
                                accepted = self.evaluate(trial, &[&partial]);
                            }
                            partials.push(partial);
                        }
                        Validation::Invalid => self.stats.invalid += 1,
                        Validation::Undefined => {
                            debug!("Undefined geometry for {} assignment", group);
                            self.stats.undefined_geometry += 1;
                        }
                    }
                }
                self.record(accepted)?;
            }
        }
        ControlFlow::Continue(())
    }

    /// Evaluate every cross-group combination of `trial`'s partials.
    fn combine(&mut self, trial: &Trial) -> ControlFlow<()> {
        let lens: Vec<usize> = trial.partials.iter().map(Vec::len).collect();
        if lens.len() < self.reqs.len() || lens.iter().any(|&n| n == 0) {
            return ControlFlow::Continue(());
        }
        let mut idx = vec![0usize; lens.len()];
        loop {
            let chosen: Vec<&Partial> = idx
                .iter()
                .enumerate()
                .map(|(ri, &i)| &trial.partials[ri][i])
                .collect();
            let accepted = self.evaluate(trial, &chosen);
            self.record(accepted)?;
            if !advance(&mut idx, &lens) {
                return ControlFlow::Continue(());
            }
        }
    }

    /// Validate, check and score one combination of partials.
    fn evaluate(&mut self, trial: &Trial, chosen: &[&Partial]) -> Option<Ranked> {
        let stars = self.stars;
        let reqs = self.reqs;
        let mut slots: Vec<Slot> = chosen
            .iter()
            .flat_map(|p| p.slots.iter().copied())
            .collect();
        slots.sort_by_key(|s| s.probe);
        let star_of = |s: Slot| &stars[s.req][s.star];

        let mut ids: Vec<u64> = slots.iter().map(|s| star_of(*s).id).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|w| w[0] == w[1]) {
            self.stats.invalid += 1;
            return None;
        }

        let ctx = trial
            .ctx
            .with_assignments(slots.iter().map(|s| (s.probe, star_of(*s).clone())));
        // A single requirement's partials were already validated in full
        let validation = if reqs.len() > 1 {
            validate_assignment(&ctx)
        } else {
            Validation::Valid
        };
        match validation {
            Validation::Valid => {}
            Validation::Invalid => {
                self.stats.invalid += 1;
                return None;
            }
            Validation::Undefined => {
                debug!("Undefined geometry at PA {}", trial.angle);
                self.stats.undefined_geometry += 1;
                return None;
            }
        }

        let problems = check_composition(&ctx);
        if !is_usable(&problems) {
            debug!("Rejected at PA {}: {:?}", trial.angle, problems);
            self.stats.invalid += 1;
            return None;
        }

        let score = slots
            .iter()
            .map(|s| self.quality.quality(star_of(*s), s.probe))
            .sum::<f64>()
            / slots.len() as f64;
        let assignments = slots
            .iter()
            .map(|s| Assignment {
                probe: s.probe,
                star: star_of(*s).clone(),
                role: reqs[s.req].role,
            })
            .collect();
        Some(Ranked {
            asterism: Asterism::new(trial.angle, assignments, score, validation, problems),
            angle_index: trial.angle_index,
            key: slots.iter().map(|s| (s.probe.index(), s.star)).collect(),
        })
    }
}

/// Step the mixed-radix counter `idx`; `false` once it wraps around.
fn advance(idx: &mut [usize], lens: &[usize]) -> bool {
    for r in (0..idx.len()).rev() {
        idx[r] += 1;
        if idx[r] < lens[r] {
            return true;
        }
        idx[r] = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_visits_every_combination() {
        let lens = [2, 3];
        let mut idx = vec![0, 0];
        let mut seen = vec![idx.clone()];
        while advance(&mut idx, &lens) {
            seen.push(idx.clone());
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[1], vec![0, 1]);
        assert_eq!(seen[5], vec![1, 2]);
    }
}
