//! Contrôle local d'un déplacement d'affectation (glisser-déposer), sans relancer
//! le générateur. Ne modifie jamais la liste reçue.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::availability::AvailabilityIndex;
use crate::model::{Assignment, ShiftWindow, WorkerId};
use crate::rules::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropThresholds {
    pub warn_hours: f64,
    pub max_hours: f64,
    pub min_skill_match: f64,
    /// Au-delà de ce nombre d'erreurs, aucune dérogation n'est possible.
    pub max_overridable_errors: usize,
}

impl Default for DropThresholds {
    fn default() -> Self {
        Self {
            warn_hours: 40.0,
            max_hours: 50.0,
            min_skill_match: 50.0,
            max_overridable_errors: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropIssueKind {
    NoOp,
    Duplicate,
    TimeOverlap,
    HardViolation,
    SoftViolation,
    SkillMismatch,
    Workload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropIssue {
    pub kind: DropIssueKind,
    pub message: String,
}

impl DropIssue {
    pub fn new(kind: DropIssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropValidationResult {
    pub is_valid: bool,
    pub errors: Vec<DropIssue>,
    pub warnings: Vec<DropIssue>,
    pub can_override: bool,
}

impl DropValidationResult {
    /// Le déplacement peut être appliqué : valide, ou dérogeable et confirmé.
    pub fn permits(&self, override_confirmed: bool) -> bool {
        self.is_valid || (self.can_override && override_confirmed)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DropMoveValidator {
    pub thresholds: DropThresholds,
}

impl DropMoveValidator {
    pub fn new(thresholds: DropThresholds) -> Self {
        Self { thresholds }
    }

    pub fn validate(
        &self,
        assignment: &Assignment,
        target_worker: &WorkerId,
        target_date: NaiveDate,
        existing: &[Assignment],
        index: &AvailabilityIndex,
    ) -> DropValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if &assignment.worker_id == target_worker && assignment.date == target_date {
            errors.push(DropIssue::new(
                DropIssueKind::NoOp,
                "no-op move: assignment is already at this worker and date",
            ));
        }

        let others: Vec<&Assignment> = existing
            .iter()
            .filter(|a| {
                a.id != assignment.id && a.status.is_staffed() && &a.worker_id == target_worker
            })
            .collect();

        let same_day: Vec<&Assignment> = others
            .iter()
            .copied()
            .filter(|a| a.date == target_date)
            .collect();

        if let Some(dup) = same_day.iter().find(|a| a.shift_id == assignment.shift_id) {
            errors.push(DropIssue::new(
                DropIssueKind::Duplicate,
                format!(
                    "{target_worker} already holds shift {} on {target_date} ({})",
                    assignment.shift_id, dup.id
                ),
            ));
        }

        let moved = ShiftWindow::new(target_date, assignment.start_time, assignment.end_time);
        let overlapping: Vec<String> = same_day
            .iter()
            .filter(|a| a.shift_id != assignment.shift_id && a.window().overlaps(&moved))
            .map(|a| a.id.to_string())
            .collect();
        if !overlapping.is_empty() {
            errors.push(DropIssue::new(
                DropIssueKind::TimeOverlap,
                format!(
                    "time overlap with {} on {target_date}",
                    overlapping.join(", ")
                ),
            ));
        }

        let hard: Vec<&str> = assignment
            .violations
            .iter()
            .filter(|v| v.severity == Severity::Hard)
            .map(|v| v.message.as_str())
            .collect();
        if !hard.is_empty() {
            errors.push(DropIssue::new(
                DropIssueKind::HardViolation,
                format!("carries hard violation(s): {}", hard.join("; ")),
            ));
        }

        let soft: Vec<&str> = assignment
            .violations
            .iter()
            .filter(|v| v.severity != Severity::Hard)
            .map(|v| v.message.as_str())
            .collect();
        if !soft.is_empty() {
            warnings.push(DropIssue::new(
                DropIssueKind::SoftViolation,
                format!("carries soft violation(s): {}", soft.join("; ")),
            ));
        }

        let skill_match = match index.get(target_worker) {
            Some(entry) => entry.skill_match(&assignment.required_skills),
            None if assignment.required_skills.is_empty() => 100.0,
            None => 0.0,
        };
        if skill_match < self.thresholds.min_skill_match {
            warnings.push(DropIssue::new(
                DropIssueKind::SkillMismatch,
                format!("{target_worker} matches only {skill_match:.0}% of required skills"),
            ));
        }

        let hours =
            assignment.duration_hours + others.iter().map(|a| a.duration_hours).sum::<f64>();
        if hours > self.thresholds.warn_hours {
            warnings.push(DropIssue::new(
                DropIssueKind::Workload,
                format!(
                    "{target_worker} would work {hours:.1}h (above {:.0}h)",
                    self.thresholds.warn_hours
                ),
            ));
        }
        if hours > self.thresholds.max_hours {
            errors.push(DropIssue::new(
                DropIssueKind::Workload,
                format!(
                    "{target_worker} would work {hours:.1}h (limit {:.0}h)",
                    self.thresholds.max_hours
                ),
            ));
        }

        let can_override =
            !errors.is_empty() && errors.len() <= self.thresholds.max_overridable_errors;
        DropValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            can_override,
        }
    }
}

/// Raccourci avec les seuils par défaut.
pub fn validate_drop(
    assignment: &Assignment,
    target_worker: &WorkerId,
    target_date: NaiveDate,
    existing: &[Assignment],
    index: &AvailabilityIndex,
) -> DropValidationResult {
    DropMoveValidator::default().validate(assignment, target_worker, target_date, existing, index)
}
