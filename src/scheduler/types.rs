use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::{Assignment, ShiftId, ShiftRequirement, WorkerAvailability, WorkerId};
use crate::rules::ConstraintViolation;

/// Stratégie de sélection parmi les candidats retenus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Premier candidat au-dessus du seuil, sans équilibrage de charge.
    Greedy,
    Balanced,
    SkillsFirst,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Balanced
    }
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Greedy => "greedy",
            Strategy::Balanced => "balanced",
            Strategy::SkillsFirst => "skills_first",
        }
    }

    /// Toutes les stratégies sauf `greedy` tiennent la charge à jour.
    pub fn tracks_workload(self) -> bool {
        !matches!(self, Strategy::Greedy)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "greedy" => Ok(Strategy::Greedy),
            "balanced" => Ok(Strategy::Balanced),
            "skills_first" => Ok(Strategy::SkillsFirst),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

/// Options de génération
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Score minimal exigé par la stratégie `greedy`.
    pub greedy_min_score: f64,
    /// Nombre de tentatives rejetées conservées par conflit.
    pub max_attempts_per_conflict: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            greedy_min_score: 50.0,
            max_attempts_per_conflict: 3,
        }
    }
}

/// Demande de génération ; possède ses propres copies des entrées.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub organization_id: String,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub period_start: Option<NaiveDate>,
    #[serde(default)]
    pub period_end: Option<NaiveDate>,
    pub shifts: Vec<ShiftRequirement>,
    pub workers: Vec<WorkerAvailability>,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub max_soft_violations: Option<usize>,
    #[serde(default)]
    pub allow_hard_overrides: bool,
}

impl GenerateRequest {
    pub fn new<S: Into<String>>(
        organization_id: S,
        shifts: Vec<ShiftRequirement>,
        workers: Vec<WorkerAvailability>,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            department_id: None,
            period_start: None,
            period_end: None,
            shifts,
            workers,
            strategy: Strategy::default(),
            max_soft_violations: None,
            allow_hard_overrides: false,
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Diagnostic d'un candidat évalué pour un créneau.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentAttempt {
    pub shift_id: ShiftId,
    pub employee_id: WorkerId,
    pub success: bool,
    pub violations: Vec<ConstraintViolation>,
    pub score: f64,
    pub reason: String,
}

/// Créneau resté (partiellement) non pourvu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConflict {
    pub shift_id: ShiftId,
    pub date: NaiveDate,
    pub required: u32,
    pub placed: u32,
    pub reasons: Vec<String>,
    pub attempts: Vec<AssignmentAttempt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleGenerationResult {
    pub assignments: Vec<Assignment>,
    pub conflicts: Vec<ScheduleConflict>,
    pub total_shifts: usize,
    pub assigned_shifts: usize,
    pub unassigned_shifts: usize,
    pub coverage_percentage: f64,
    pub total_hard_violations: usize,
    pub total_soft_violations: usize,
    pub algorithm_used: Strategy,
    pub generation_time_ms: u64,
}

/// Champ de la demande rejeté avant toute génération.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputIssue {
    pub field: String,
    pub message: String,
}

impl InputIssue {
    pub fn new<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for InputIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("invalid request: {}", join_issues(.0))]
    InvalidInput(Vec<InputIssue>),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unknown assignment: {0}")]
    UnknownAssignment(String),
    #[error("unknown worker: {0}")]
    UnknownWorker(String),
}

fn join_issues(issues: &[InputIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
