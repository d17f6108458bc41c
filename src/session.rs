//! Session d'édition d'un planning : unique écrivain de la liste d'affectations.
//!
//! Les lecteurs (validateurs, score de couverture) reçoivent toujours une tranche
//! stable ; chaque mutation relance l'anti-rebond du balayage complet.

use chrono::NaiveDate;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::availability::AvailabilityIndex;
use crate::config::EngineConfig;
use crate::model::{
    Assignment, AssignmentId, AssignmentStatus, Schedule, ShiftRequirement, WorkerAvailability,
    WorkerId,
};
use crate::scheduler::{
    evaluate_assignments, ScheduleError, ScheduleGenerationResult, ScoringModel, Workload,
};
use crate::rules::Severity;
use crate::storage::StoredSession;
use crate::validation::{
    CoverageMetrics, CoverageScorer, Debouncer, DropIssue, DropIssueKind, DropMoveValidator,
    DropValidationResult, RealtimeValidator, ValidationWarning,
};

/// Résultat d'une demande de déplacement.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    pub applied: bool,
    pub validation: DropValidationResult,
}

#[derive(Debug, Clone)]
pub struct EditingSession {
    schedule: Schedule,
    shifts: Vec<ShiftRequirement>,
    workers: Vec<WorkerAvailability>,
    index: AvailabilityIndex,
    assignments: Vec<Assignment>,
    config: EngineConfig,
    debouncer: Debouncer,
    warnings: Vec<ValidationWarning>,
}

impl EditingSession {
    pub fn new(
        schedule: Schedule,
        shifts: Vec<ShiftRequirement>,
        workers: Vec<WorkerAvailability>,
        assignments: Vec<Assignment>,
        config: EngineConfig,
    ) -> Self {
        Self {
            index: AvailabilityIndex::build(&workers),
            debouncer: Debouncer::from_millis(config.debounce_ms),
            schedule,
            shifts,
            workers,
            assignments,
            config,
            warnings: Vec::new(),
        }
    }

    pub fn from_generation(
        schedule: Schedule,
        shifts: Vec<ShiftRequirement>,
        workers: Vec<WorkerAvailability>,
        result: ScheduleGenerationResult,
        config: EngineConfig,
    ) -> Self {
        Self::new(schedule, shifts, workers, result.assignments, config)
    }

    pub fn from_stored(stored: StoredSession, config: EngineConfig) -> Self {
        let mut session = Self::new(
            stored.schedule,
            stored.shifts,
            stored.workers,
            stored.assignments,
            config,
        );
        session.warnings = stored.warnings;
        session
    }

    pub fn to_stored(&self) -> StoredSession {
        StoredSession {
            schedule: self.schedule.clone(),
            shifts: self.shifts.clone(),
            workers: self.workers.clone(),
            assignments: self.assignments.clone(),
            warnings: self.warnings.clone(),
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Derniers avertissements calculés (éventuellement périmés si un balayage est en attente).
    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    pub fn validation_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn find(&self, id: &AssignmentId) -> Option<&Assignment> {
        self.assignments.iter().find(|a| &a.id == id)
    }

    fn position(&self, id: &AssignmentId) -> Result<usize, ScheduleError> {
        self.assignments
            .iter()
            .position(|a| &a.id == id)
            .ok_or_else(|| ScheduleError::UnknownAssignment(id.to_string()))
    }

    /// Contrôle rapide, sans mutation.
    pub fn validate_move(
        &self,
        id: &AssignmentId,
        target_worker: &WorkerId,
        target_date: NaiveDate,
    ) -> Result<DropValidationResult, ScheduleError> {
        let pos = self.position(id)?;
        if self.index.get(target_worker).is_none() {
            return Err(ScheduleError::UnknownWorker(target_worker.to_string()));
        }
        Ok(DropMoveValidator::new(self.config.drop_move).validate(
            &self.assignments[pos],
            target_worker,
            target_date,
            &self.assignments,
            &self.index,
        ))
    }

    /// Applique le déplacement si valide, ou si dérogeable et confirmé.
    ///
    /// Une violation bloquante apparue à la réévaluation complète exige aussi la
    /// confirmation ; sans elle, la liste est restaurée telle quelle.
    pub fn apply_move(
        &mut self,
        id: &AssignmentId,
        target_worker: &WorkerId,
        target_date: NaiveDate,
        override_confirmed: bool,
        now: Instant,
    ) -> Result<MoveOutcome, ScheduleError> {
        let validation = self.validate_move(id, target_worker, target_date)?;
        if !validation.permits(override_confirmed) {
            debug!(
                assignment = %id,
                errors = validation.errors.len(),
                "move rejected"
            );
            return Ok(MoveOutcome {
                applied: false,
                validation,
            });
        }

        let pos = self.position(id)?;
        let previous = self.assignments.clone();
        {
            let moved = &mut self.assignments[pos];
            moved.worker_id = target_worker.clone();
            moved.date = target_date;
        }
        self.rescore(pos);
        let gained = self.refresh_violations(Some(id));

        // le contrôle rapide ne couvre pas toutes les règles bloquantes
        if !gained.is_empty() && !override_confirmed {
            let messages: Vec<String> = self
                .assignments
                .iter()
                .filter(|a| gained.contains(&a.id))
                .flat_map(|a| a.violations.iter())
                .filter(|v| v.severity == Severity::Hard)
                .map(|v| v.message.clone())
                .collect();
            self.assignments = previous;

            let mut validation = validation;
            validation.errors.push(DropIssue::new(
                DropIssueKind::HardViolation,
                format!("move would introduce hard violation(s): {}", messages.join("; ")),
            ));
            validation.is_valid = false;
            validation.can_override =
                validation.errors.len() <= self.config.drop_move.max_overridable_errors;
            debug!(assignment = %id, gained = gained.len(), "move rejected by rule check");
            return Ok(MoveOutcome {
                applied: false,
                validation,
            });
        }

        let overriding = override_confirmed && (!validation.is_valid || !gained.is_empty());
        if overriding {
            for a in self.assignments.iter_mut().filter(|a| gained.contains(&a.id)) {
                a.overridden = true;
            }
        }
        self.debouncer.trigger(now);

        if overriding {
            warn!(assignment = %id, worker = %target_worker, "move applied with override");
        } else {
            info!(assignment = %id, worker = %target_worker, date = %target_date, "move applied");
        }
        Ok(MoveOutcome {
            applied: true,
            validation,
        })
    }

    pub fn cancel(&mut self, id: &AssignmentId, now: Instant) -> Result<(), ScheduleError> {
        let pos = self.position(id)?;
        self.assignments[pos].status = AssignmentStatus::Cancelled;
        self.refresh_violations(None);
        self.debouncer.trigger(now);
        Ok(())
    }

    pub fn remove(&mut self, id: &AssignmentId, now: Instant) -> Result<Assignment, ScheduleError> {
        let pos = self.position(id)?;
        let removed = self.assignments.remove(pos);
        self.refresh_violations(None);
        self.debouncer.trigger(now);
        Ok(removed)
    }

    /// Exécute le balayage complet si l'anti-rebond est échu.
    pub fn poll_validation(&mut self, now: Instant) -> Option<&[ValidationWarning]> {
        let generation = self.debouncer.poll(now)?;
        debug!(generation, "running debounced validation");
        self.revalidate();
        Some(self.warnings.as_slice())
    }

    /// Balayage immédiat ; annule tout balayage en attente.
    pub fn validate_now(&mut self) -> &[ValidationWarning] {
        self.debouncer.cancel();
        self.revalidate();
        &self.warnings
    }

    pub fn coverage(&self) -> CoverageMetrics {
        CoverageScorer::new(self.config.scoring).score(&self.shifts, &self.assignments)
    }

    fn revalidate(&mut self) {
        self.warnings = RealtimeValidator::new(self.config.validator)
            .validate(&self.schedule, &self.assignments);
    }

    /// Recalcule score et adéquation de compétences d'une affectation déplacée.
    fn rescore(&mut self, pos: usize) {
        let mut workload = Workload::new(self.index.len());
        for (i, a) in self.assignments.iter().enumerate() {
            if i != pos && a.status.is_staffed() {
                workload.add(&a.worker_id, a.duration_hours);
            }
        }
        let moved = &self.assignments[pos];
        let Some(entry) = self.index.get(&moved.worker_id) else {
            return;
        };
        let breakdown = ScoringModel::new(self.config.scoring).score(
            entry,
            &moved.as_requirement(),
            &workload,
        );
        let moved = &mut self.assignments[pos];
        moved.match_score = breakdown.total;
        moved.skill_match = breakdown.skill_match;
    }

    /// Réévalue chaque affectation occupée contre toute la liste, en O(n²) par édition ;
    /// renvoie celles qui viennent d'acquérir une violation bloquante.
    ///
    /// Les affectations annulées ou non pourvues gardent violations et dérogation.
    fn refresh_violations(&mut self, moved: Option<&AssignmentId>) -> Vec<AssignmentId> {
        let before: HashSet<AssignmentId> = self
            .assignments
            .iter()
            .filter(|a| a.has_hard_violation())
            .map(|a| a.id.clone())
            .collect();

        let mut fresh = evaluate_assignments(&self.config.rules, &self.index, &self.assignments);
        let mut gained = Vec::new();
        for a in self.assignments.iter_mut() {
            let Some(violations) = fresh.remove(&a.id) else {
                continue;
            };
            a.violations = violations;
            if !a.has_hard_violation() {
                a.overridden = false;
            } else if moved == Some(&a.id) || !before.contains(&a.id) {
                gained.push(a.id.clone());
            }
        }
        gained
    }
}
