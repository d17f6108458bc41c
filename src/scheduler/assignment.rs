use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info};

use super::conflicts::{self, Rejection, RejectionCause};
use super::constraints::{self, ScheduleState};
use super::scoring::{ScoreBreakdown, ScoringModel, Workload};
use super::types::{
    AssignmentAttempt, GenerateOptions, GenerateRequest, InputIssue, ScheduleConflict,
    ScheduleError, ScheduleGenerationResult, Strategy,
};
use super::util;
use crate::availability::{AvailabilityIndex, WorkerEntry};
use crate::model::{Assignment, ShiftRequirement};
use crate::rules::{ConstraintViolation, RuleSet, Severity};

/// Générateur mono-passe : un créneau traité n'est jamais réouvert.
///
/// Aucun état partagé entre deux appels à [`AssignmentGenerator::generate`] ; l'état
/// courant (créneaux posés, charge par personne) vit dans la pile de l'appel.
#[derive(Debug, Clone)]
pub struct AssignmentGenerator<'r> {
    rules: &'r RuleSet,
    model: ScoringModel,
    options: GenerateOptions,
}

struct Candidate<'e> {
    entry: &'e WorkerEntry,
    violations: Vec<ConstraintViolation>,
    score: ScoreBreakdown,
    load: f64,
}

impl Candidate<'_> {
    fn needs_override(&self) -> bool {
        self.violations.iter().any(|v| v.severity == Severity::Hard)
    }
}

struct Search<'e> {
    examined: usize,
    chosen: Option<Candidate<'e>>,
    rejected: Vec<Rejection>,
}

struct ShiftOutcome {
    placed: Vec<Assignment>,
    conflict: Option<ScheduleConflict>,
}

impl<'r> AssignmentGenerator<'r> {
    pub fn new(rules: &'r RuleSet, model: ScoringModel, options: GenerateOptions) -> Self {
        Self {
            rules,
            model,
            options,
        }
    }

    pub fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<ScheduleGenerationResult, ScheduleError> {
        let started = Instant::now();
        check_request(request)?;

        info!(
            organization = %request.organization_id,
            strategy = %request.strategy,
            shifts = request.shifts.len(),
            workers = request.workers.len(),
            "generating schedule"
        );

        let index = AvailabilityIndex::build(&request.workers);
        let mut order: Vec<&ShiftRequirement> = request.shifts.iter().collect();
        order.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.date.cmp(&b.date))
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut state = ScheduleState::new();
        let mut workload = Workload::new(index.len());
        let mut assignments = Vec::new();
        let mut conflicts = Vec::new();
        let mut assigned_shifts = 0usize;

        for shift in order {
            let outcome = self.fill_shift(shift, &index, request, &mut state, &mut workload);
            if outcome.conflict.is_none() {
                assigned_shifts += 1;
            }
            assignments.extend(outcome.placed);
            conflicts.extend(outcome.conflict);
        }

        let total_shifts = request.shifts.len();
        let (hard, soft) = assignments.iter().fold((0, 0), |(h, s), a: &Assignment| {
            let hard = a.violations.iter().filter(|v| v.severity == Severity::Hard).count();
            (h + hard, s + a.violations.len() - hard)
        });
        let coverage_percentage = if total_shifts == 0 {
            0.0
        } else {
            assigned_shifts as f64 / total_shifts as f64 * 100.0
        };

        let result = ScheduleGenerationResult {
            assignments,
            conflicts,
            total_shifts,
            assigned_shifts,
            unassigned_shifts: total_shifts - assigned_shifts,
            coverage_percentage,
            total_hard_violations: hard,
            total_soft_violations: soft,
            algorithm_used: request.strategy,
            generation_time_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            assigned = result.assigned_shifts,
            conflicts = result.conflicts.len(),
            coverage = result.coverage_percentage,
            "schedule generated"
        );
        Ok(result)
    }

    fn fill_shift(
        &self,
        shift: &ShiftRequirement,
        index: &AvailabilityIndex,
        request: &GenerateRequest,
        state: &mut ScheduleState,
        workload: &mut Workload,
    ) -> ShiftOutcome {
        let target = shift.staff_target() as usize;
        let mut placed: Vec<Assignment> = Vec::new();

        while placed.len() < target {
            let search = self.search(shift, index, request, state, workload, &placed);
            let Some(candidate) = search.chosen else {
                debug!(shift = %shift.id, examined = search.examined, "no candidate qualifies");
                let conflict = conflicts::build_conflict(
                    shift,
                    placed.len() as u32,
                    search.examined,
                    search.rejected,
                    self.options.max_attempts_per_conflict,
                );
                return ShiftOutcome {
                    placed,
                    conflict: Some(conflict),
                };
            };

            let mut assignment = Assignment::for_shift(shift, candidate.entry.id());
            assignment.match_score = candidate.score.total;
            assignment.skill_match = util::round2(candidate.score.skill_match);
            assignment.overridden = candidate.needs_override();
            assignment.violations = candidate.violations;

            state.place(&assignment.worker_id, shift);
            if request.strategy.tracks_workload() {
                workload.add(&assignment.worker_id, assignment.duration_hours);
            }
            debug!(
                shift = %shift.id,
                worker = %assignment.worker_id,
                score = assignment.match_score,
                overridden = assignment.overridden,
                "shift assigned"
            );
            placed.push(assignment);
        }

        ShiftOutcome {
            placed,
            conflict: None,
        }
    }

    fn search<'e>(
        &self,
        shift: &ShiftRequirement,
        index: &'e AvailabilityIndex,
        request: &GenerateRequest,
        state: &ScheduleState,
        workload: &Workload,
        placed: &[Assignment],
    ) -> Search<'e> {
        let mut examined = 0usize;
        let mut eligible = Vec::new();
        let mut rejected = Vec::new();

        for entry in index.candidates_for(shift) {
            if placed.iter().any(|a| &a.worker_id == entry.id()) {
                continue;
            }
            examined += 1;

            let violations = constraints::evaluate(self.rules, entry, shift, state);
            let score = self.model.score(entry, shift, workload);
            let hard = violations
                .iter()
                .filter(|v| v.severity == Severity::Hard)
                .count();
            let soft = violations.len() - hard;

            let cause = if hard > 0 && !request.allow_hard_overrides {
                Some(RejectionCause::HardViolations)
            } else if request.max_soft_violations.is_some_and(|max| soft > max) {
                Some(RejectionCause::TooManySoftViolations)
            } else {
                None
            };

            match cause {
                Some(cause) => rejected.push(reject(shift, entry, violations, score, cause)),
                None => eligible.push(Candidate {
                    entry,
                    violations,
                    score,
                    load: workload.hours_of(entry.id()),
                }),
            }
        }

        // une dérogation n'est retenue que faute de candidat sans violation bloquante
        let (clean, forced): (Vec<_>, Vec<_>) =
            eligible.into_iter().partition(|c| !c.needs_override());
        let chosen = match self.select(request.strategy, shift, clean, &mut rejected) {
            Some(c) => Some(c),
            None => self.select(request.strategy, shift, forced, &mut rejected),
        };
        Search {
            examined,
            chosen,
            rejected,
        }
    }

    fn select<'e>(
        &self,
        strategy: Strategy,
        shift: &ShiftRequirement,
        mut eligible: Vec<Candidate<'e>>,
        rejected: &mut Vec<Rejection>,
    ) -> Option<Candidate<'e>> {
        match strategy {
            Strategy::Greedy => {
                let threshold = self.options.greedy_min_score;
                match eligible.iter().position(|c| c.score.total >= threshold) {
                    Some(i) => Some(eligible.swap_remove(i)),
                    None => {
                        rejected.extend(eligible.into_iter().map(|c| {
                            reject(
                                shift,
                                c.entry,
                                c.violations,
                                c.score,
                                RejectionCause::BelowMinimumScore,
                            )
                        }));
                        None
                    }
                }
            }
            // score décroissant, puis charge croissante, puis identifiant
            Strategy::Balanced => eligible.into_iter().min_by(|a, b| {
                util::desc(a.score.total, b.score.total)
                    .then_with(|| a.load.total_cmp(&b.load))
                    .then_with(|| a.entry.id().cmp(b.entry.id()))
            }),
            Strategy::SkillsFirst => eligible.into_iter().min_by(|a, b| {
                util::desc(a.score.total, b.score.total)
                    .then_with(|| util::desc(a.score.skill_match, b.score.skill_match))
                    .then_with(|| a.load.total_cmp(&b.load))
                    .then_with(|| a.entry.id().cmp(b.entry.id()))
            }),
        }
    }
}

fn reject(
    shift: &ShiftRequirement,
    entry: &WorkerEntry,
    violations: Vec<ConstraintViolation>,
    score: ScoreBreakdown,
    cause: RejectionCause,
) -> Rejection {
    let reason = match cause {
        RejectionCause::HardViolations => {
            let kinds: Vec<&str> = violations
                .iter()
                .filter(|v| v.severity == Severity::Hard)
                .map(|v| v.kind.as_str())
                .collect();
            format!("hard violation(s): {}", kinds.join(", "))
        }
        RejectionCause::TooManySoftViolations => "too many soft violations".to_string(),
        RejectionCause::BelowMinimumScore => format!("score {:.2} below minimum", score.total),
    };
    Rejection {
        attempt: AssignmentAttempt {
            shift_id: shift.id.clone(),
            employee_id: entry.id().clone(),
            success: false,
            violations,
            score: score.total,
            reason,
        },
        cause,
    }
}

/// Rejette les demandes mal formées avant toute tentative de génération.
pub(crate) fn check_request(request: &GenerateRequest) -> Result<(), ScheduleError> {
    let mut issues = Vec::new();

    if request.organization_id.trim().is_empty() {
        issues.push(InputIssue::new("organization_id", "must not be empty"));
    }
    if request.shifts.is_empty() {
        issues.push(InputIssue::new("shifts", "at least one shift is required"));
    }
    if request.workers.is_empty() {
        issues.push(InputIssue::new("workers", "at least one worker is required"));
    }
    if let (Some(start), Some(end)) = (request.period_start, request.period_end) {
        if end < start {
            issues.push(InputIssue::new("period_end", "must not precede period_start"));
        }
    }

    let mut worker_ids = HashSet::new();
    for worker in &request.workers {
        if worker.id.as_str().trim().is_empty() {
            issues.push(InputIssue::new("workers", "worker id must not be empty"));
        } else if !worker_ids.insert(&worker.id) {
            issues.push(InputIssue::new("workers", format!("duplicate worker id {}", worker.id)));
        }
    }

    let mut shift_ids = HashSet::new();
    for shift in &request.shifts {
        if shift.id.as_str().trim().is_empty() {
            issues.push(InputIssue::new("shifts", "shift id must not be empty"));
        } else if !shift_ids.insert(&shift.id) {
            issues.push(InputIssue::new("shifts", format!("duplicate shift id {}", shift.id)));
        }
        if shift.start_time == shift.end_time {
            issues.push(InputIssue::new("shifts", format!("shift {} has zero duration", shift.id)));
        }
        if shift.min_staff > shift.max_staff {
            issues.push(InputIssue::new(
                "shifts",
                format!("shift {} has min_staff above max_staff", shift.id),
            ));
        }
        let before = request.period_start.is_some_and(|s| shift.date < s);
        let after = request.period_end.is_some_and(|e| shift.date > e);
        if before || after {
            issues.push(InputIssue::new(
                "shifts",
                format!("shift {} falls outside the requested period", shift.id),
            ));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ScheduleError::InvalidInput(issues))
    }
}
