//! Évaluateur de contraintes : fonction pure qui confronte un couple
//! (personne, créneau) à l'ensemble des règles, étant donné l'état partiel du planning.

use std::collections::{BTreeMap, HashMap};

use super::util;
use crate::availability::{AvailabilityIndex, WorkerEntry};
use crate::model::{
    Assignment, AssignmentId, ShiftId, ShiftRequirement, ShiftWindow, WorkerAvailability, WorkerId,
};
use crate::rules::{ConstraintRule, ConstraintViolation, RuleKind, RuleSet};

/// Créneau déjà occupé par une personne.
#[derive(Debug, Clone)]
pub struct PlacedShift {
    pub assignment: Option<AssignmentId>,
    pub shift_id: ShiftId,
    pub window: ShiftWindow,
}

/// État partiel du planning, indexé par personne.
#[derive(Debug, Clone, Default)]
pub struct ScheduleState {
    by_worker: HashMap<WorkerId, Vec<PlacedShift>>,
}

impl ScheduleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seules les affectations occupées (assigned / tentative) comptent.
    pub fn from_assignments(assignments: &[Assignment]) -> Self {
        let mut state = Self::default();
        for a in assignments.iter().filter(|a| a.status.is_staffed()) {
            state.by_worker.entry(a.worker_id.clone()).or_default().push(PlacedShift {
                assignment: Some(a.id.clone()),
                shift_id: a.shift_id.clone(),
                window: a.window(),
            });
        }
        state
    }

    pub fn place(&mut self, worker: &WorkerId, shift: &ShiftRequirement) {
        self.by_worker.entry(worker.clone()).or_default().push(PlacedShift {
            assignment: None,
            shift_id: shift.id.clone(),
            window: shift.window(),
        });
    }

    pub fn placed(&self, worker: &WorkerId) -> &[PlacedShift] {
        self.by_worker.get(worker).map_or(&[], Vec::as_slice)
    }
}

/// Évalue un candidat ; violations ordonnées selon l'ordre des règles.
pub fn evaluate(
    rules: &RuleSet,
    worker: &WorkerEntry,
    shift: &ShiftRequirement,
    state: &ScheduleState,
) -> Vec<ConstraintViolation> {
    evaluate_excluding(rules, worker, shift, state, None)
}

/// Réévalue chaque affectation occupée contre toutes les autres.
pub fn evaluate_assignments(
    rules: &RuleSet,
    index: &AvailabilityIndex,
    assignments: &[Assignment],
) -> BTreeMap<AssignmentId, Vec<ConstraintViolation>> {
    let state = ScheduleState::from_assignments(assignments);
    let mut out = BTreeMap::new();
    for a in assignments.iter().filter(|a| a.status.is_staffed()) {
        let fallback;
        let entry = match index.get(&a.worker_id) {
            Some(e) => e,
            None => {
                // personne inconnue : aucune compétence ni préférence connue
                fallback = WorkerEntry::new(WorkerAvailability::new(a.worker_id.as_str(), ""));
                &fallback
            }
        };
        let shift = a.as_requirement();
        out.insert(
            a.id.clone(),
            evaluate_excluding(rules, entry, &shift, &state, Some(&a.id)),
        );
    }
    out
}

pub(crate) fn evaluate_excluding(
    rules: &RuleSet,
    worker: &WorkerEntry,
    shift: &ShiftRequirement,
    state: &ScheduleState,
    exclude: Option<&AssignmentId>,
) -> Vec<ConstraintViolation> {
    let window = shift.window();
    let placed: Vec<&PlacedShift> = state
        .placed(worker.id())
        .iter()
        .filter(|p| exclude.map_or(true, |id| p.assignment.as_ref() != Some(id)))
        .collect();

    rules
        .active()
        .filter(|rule| rule.scope.admits(&worker.worker, shift))
        .filter_map(|rule| {
            check_rule(rule, worker, shift, &window, &placed).map(|message| ConstraintViolation {
                rule_id: rule.id.clone(),
                kind: rule.kind.kind(),
                severity: rule.severity,
                message,
                worker_id: worker.id().clone(),
                shift_id: shift.id.clone(),
            })
        })
        .collect()
}

fn check_rule(
    rule: &ConstraintRule,
    worker: &WorkerEntry,
    shift: &ShiftRequirement,
    window: &ShiftWindow,
    placed: &[&PlacedShift],
) -> Option<String> {
    match &rule.kind {
        RuleKind::DoubleBooking => placed
            .iter()
            .find(|p| p.window.date == window.date && p.window.overlaps(window))
            .map(|p| {
                format!(
                    "{} already holds overlapping shift {} on {}",
                    worker.id(),
                    p.shift_id,
                    window.date
                )
            }),
        RuleKind::MaxConsecutiveShifts { max_days } => {
            let run = util::run_through(window.date, |d| placed.iter().any(|p| p.window.date == d));
            (run > *max_days)
                .then(|| format!("{run} consecutive working days exceeds limit of {max_days}"))
        }
        RuleKind::MinRest { hours } => placed
            .iter()
            // les chevauchements du même jour relèvent du double booking
            .filter(|p| !(p.window.date == window.date && p.window.overlaps(window)))
            .map(|p| (p, rest_hours(&p.window, window)))
            .find(|(_, rest)| rest < hours)
            .map(|(p, rest)| {
                format!(
                    "only {:.1}h rest next to shift {} (minimum {hours}h)",
                    rest, p.shift_id
                )
            }),
        RuleKind::MaxHoursPerDay { hours } => {
            let total = window.hours()
                + placed
                    .iter()
                    .filter(|p| p.window.date == window.date)
                    .map(|p| p.window.hours())
                    .sum::<f64>();
            (total > *hours)
                .then(|| format!("{total:.1}h on {} exceeds daily cap of {hours}h", window.date))
        }
        RuleKind::MaxHoursPerWeek { hours } => {
            let total = week_hours(window, placed);
            (total > *hours).then(|| format!("{total:.1}h in week exceeds weekly cap of {hours}h"))
        }
        RuleKind::MaxShiftsPerWeek { default_max } => {
            let cap = worker.worker.max_shifts_per_week.or(*default_max)?;
            let week = util::iso_week(window.date);
            let count = 1 + placed
                .iter()
                .filter(|p| util::iso_week(p.window.date) == week)
                .count() as u32;
            (count > cap).then(|| format!("{count} shifts in week exceeds cap of {cap}"))
        }
        RuleKind::RequiredSkill => {
            let missing = worker.missing_skills(&shift.required_skills);
            (!missing.is_empty())
                .then(|| format!("missing required skill(s): {}", missing.join(", ")))
        }
        RuleKind::Availability => (!worker.is_available(shift.date))
            .then(|| format!("{} is unavailable on {}", worker.id(), shift.date)),
        RuleKind::ShiftPreference => (worker.prefers_shift_type(&shift.shift_type) == Some(false))
            .then(|| format!("shift type {} is not preferred", shift.shift_type)),
        RuleKind::LocationPreference => {
            (worker.prefers_department(&shift.department) == Some(false))
                .then(|| format!("department {} is not preferred", shift.department))
        }
        RuleKind::NearHoursThreshold { weekly_hours, ratio } => {
            let total = week_hours(window, placed);
            let threshold = weekly_hours * ratio;
            (total > threshold && total <= *weekly_hours).then(|| {
                format!("{total:.1}h in week is close to the {weekly_hours}h limit")
            })
        }
    }
}

fn week_hours(window: &ShiftWindow, placed: &[&PlacedShift]) -> f64 {
    let week = util::iso_week(window.date);
    window.hours()
        + placed
            .iter()
            .filter(|p| util::iso_week(p.window.date) == week)
            .map(|p| p.window.hours())
            .sum::<f64>()
}

/// Repos entre deux créneaux ; 0 s'ils se chevauchent.
fn rest_hours(a: &ShiftWindow, b: &ShiftWindow) -> f64 {
    let gap = if a.end <= b.start {
        b.start - a.end
    } else if b.end <= a.start {
        a.start - b.end
    } else {
        return 0.0;
    };
    gap.num_minutes() as f64 / 60.0
}
