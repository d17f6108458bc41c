use std::collections::BTreeMap;

use super::types::{AssignmentAttempt, ScheduleConflict};
use super::util;
use crate::model::ShiftRequirement;
use crate::rules::{ConstraintKind, Severity};

/// Candidat examiné puis écarté pour un créneau.
#[derive(Debug, Clone)]
pub(super) struct Rejection {
    pub attempt: AssignmentAttempt,
    pub cause: RejectionCause,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum RejectionCause {
    HardViolations,
    TooManySoftViolations,
    BelowMinimumScore,
}

/// Construit l'entrée de conflit d'un créneau non (ou partiellement) pourvu.
pub(super) fn build_conflict(
    shift: &ShiftRequirement,
    placed: u32,
    examined: usize,
    mut rejected: Vec<Rejection>,
    max_attempts: usize,
) -> ScheduleConflict {
    let mut reasons = Vec::new();
    let required = shift.staff_target();

    if examined == 0 && placed > 0 {
        reasons.push("no further eligible employee".to_string());
    } else if examined == 0 {
        reasons.push("no eligible employee".to_string());
        reasons.push(match &shift.required_role {
            Some(role) => format!("no worker with role {role} available on {}", shift.date),
            None => format!("no worker available on {}", shift.date),
        });
    } else {
        reasons.extend(rejection_reasons(&rejected));
    }
    if placed > 0 {
        reasons.push(format!("understaffed: placed {placed} of {required}"));
    }

    rejected.sort_by(|a, b| {
        util::desc(a.attempt.score, b.attempt.score)
            .then_with(|| a.attempt.employee_id.cmp(&b.attempt.employee_id))
    });
    let attempts = rejected
        .into_iter()
        .take(max_attempts)
        .map(|r| r.attempt)
        .collect();

    ScheduleConflict {
        shift_id: shift.id.clone(),
        date: shift.date,
        required,
        placed,
        reasons,
        attempts,
    }
}

fn rejection_reasons(rejected: &[Rejection]) -> Vec<String> {
    if rejected.is_empty() {
        // tous les candidats éligibles sont déjà placés sur ce créneau
        return vec!["no further eligible employee".to_string()];
    }

    let hard: Vec<&Rejection> = rejected
        .iter()
        .filter(|r| r.cause == RejectionCause::HardViolations)
        .collect();

    if hard.len() == rejected.len() {
        let all_missing_skill = hard.iter().all(|r| {
            r.attempt
                .violations
                .iter()
                .any(|v| v.kind == ConstraintKind::RequiredSkill && v.severity == Severity::Hard)
        });
        if all_missing_skill {
            return vec!["all candidates violate required-skill".to_string()];
        }
    }

    let mut by_kind: BTreeMap<ConstraintKind, usize> = BTreeMap::new();
    for r in &hard {
        let mut kinds: Vec<ConstraintKind> = r
            .attempt
            .violations
            .iter()
            .filter(|v| v.severity == Severity::Hard)
            .map(|v| v.kind)
            .collect();
        kinds.sort();
        kinds.dedup();
        for k in kinds {
            *by_kind.entry(k).or_default() += 1;
        }
    }

    let mut reasons: Vec<String> = by_kind
        .into_iter()
        .map(|(kind, n)| format!("{n} candidate(s) violate {kind}"))
        .collect();

    let soft = rejected
        .iter()
        .filter(|r| r.cause == RejectionCause::TooManySoftViolations)
        .count();
    if soft > 0 {
        reasons.push(format!("{soft} candidate(s) exceed max soft violations"));
    }
    let low = rejected
        .iter()
        .filter(|r| r.cause == RejectionCause::BelowMinimumScore)
        .count();
    if low > 0 {
        reasons.push(format!("{low} candidate(s) below minimum score"));
    }
    reasons
}
