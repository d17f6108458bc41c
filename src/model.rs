use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::rules::{ConstraintViolation, Severity};

/// Identifiant fort pour un membre du personnel
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkerId(String);

impl WorkerId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifiant fort pour un créneau à pourvoir
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShiftId(String);

impl ShiftId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifiant d'une affectation.
///
/// Le générateur dérive l'identifiant du couple (créneau, personne, rang) pour que
/// deux exécutions sur les mêmes entrées produisent exactement la même sortie.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssignmentId(String);

impl AssignmentId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn for_slot(shift: &ShiftId, worker: &WorkerId) -> Self {
        Self(format!("{}:{}", shift.as_str(), worker.as_str()))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Priorité d'un créneau ; l'ordre de déclaration est l'ordre de traitement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Normal,
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }

    pub fn is_elevated(self) -> bool {
        matches!(self, Priority::Critical | Priority::High)
    }
}

/// Disponibilités et compétences d'une personne pour une demande de génération.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerAvailability {
    pub id: WorkerId,
    #[serde(default)]
    pub name: String,
    pub role: String,
    /// Vide = disponible tous les jours non exclus.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_dates: Vec<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub max_shifts_per_week: Option<u32>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_shift_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_departments: Vec<String>,
}

impl WorkerAvailability {
    pub fn new<I: AsRef<str>, R: Into<String>>(id: I, role: R) -> Self {
        Self {
            id: WorkerId::new(id),
            name: String::new(),
            role: role.into(),
            available_dates: Vec::new(),
            unavailable_dates: Vec::new(),
            max_shifts_per_week: None,
            skills: Vec::new(),
            preferred_shift_types: Vec::new(),
            preferred_departments: Vec::new(),
        }
    }

    pub fn with_skills<S: Into<String>>(mut self, skills: impl IntoIterator<Item = S>) -> Self {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }
}

/// Créneau à pourvoir. `end_time <= start_time` signifie que le créneau passe minuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftRequirement {
    pub id: ShiftId,
    pub department: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub required_role: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default = "default_staff")]
    pub min_staff: u32,
    #[serde(default = "default_staff")]
    pub max_staff: u32,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_shift_type")]
    pub shift_type: String,
}

fn default_staff() -> u32 {
    1
}

fn default_shift_type() -> String {
    "regular".to_string()
}

impl ShiftRequirement {
    pub fn new<I: AsRef<str>, D: Into<String>>(
        id: I,
        department: D,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            id: ShiftId::new(id),
            department: department.into(),
            date,
            start_time,
            end_time,
            required_role: None,
            required_skills: Vec::new(),
            min_staff: 1,
            max_staff: 1,
            priority: Priority::Normal,
            shift_type: default_shift_type(),
        }
    }

    pub fn window(&self) -> ShiftWindow {
        ShiftWindow::new(self.date, self.start_time, self.end_time)
    }

    /// Nombre de personnes à placer pour considérer le créneau pourvu.
    pub fn staff_target(&self) -> u32 {
        self.min_staff.max(1)
    }
}

/// Intervalle [start, end) d'un créneau, ancré sur sa date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ShiftWindow {
    pub fn new(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        let start = date.and_time(start_time);
        let mut end = date.and_time(end_time);
        if end_time <= start_time {
            end += Duration::days(1);
        }
        Self { date, start, end }
    }

    pub fn hours(&self) -> f64 {
        (self.end - self.start).num_minutes() as f64 / 60.0
    }

    /// Chevauchement semi-ouvert, sans tolérance.
    pub fn overlaps(&self, other: &ShiftWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Tranche horaire dérivée de l'heure de début.
pub fn time_period(start: NaiveTime) -> &'static str {
    match start.hour() {
        5..=11 => "morning",
        12..=16 => "afternoon",
        17..=20 => "evening",
        _ => "night",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    /// Proposée mais pas encore confirmée par la personne.
    Tentative,
    Conflict,
    Unassigned,
    Cancelled,
}

impl AssignmentStatus {
    /// Une affectation « occupée » compte pour la charge et la couverture.
    pub fn is_staffed(self) -> bool {
        matches!(self, AssignmentStatus::Assigned | AssignmentStatus::Tentative)
    }
}

/// Affectation d'une personne à un créneau, dénormalisée pour la validation locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub shift_id: ShiftId,
    pub worker_id: WorkerId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub department: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default = "default_shift_type")]
    pub shift_type: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub status: AssignmentStatus,
    pub match_score: f64,
    pub skill_match: f64,
    #[serde(default)]
    pub violations: Vec<ConstraintViolation>,
    pub duration_hours: f64,
    /// Vrai quand une violation bloquante a été acceptée explicitement.
    #[serde(default)]
    pub overridden: bool,
}

impl Assignment {
    /// Construit une affectation `assigned` pour un créneau, sans score.
    pub fn for_shift(shift: &ShiftRequirement, worker: &WorkerId) -> Self {
        Self {
            id: AssignmentId::for_slot(&shift.id, worker),
            shift_id: shift.id.clone(),
            worker_id: worker.clone(),
            date: shift.date,
            start_time: shift.start_time,
            end_time: shift.end_time,
            department: shift.department.clone(),
            role: shift.required_role.clone(),
            shift_type: shift.shift_type.clone(),
            priority: shift.priority,
            required_skills: shift.required_skills.clone(),
            status: AssignmentStatus::Assigned,
            match_score: 0.0,
            skill_match: 100.0,
            violations: Vec::new(),
            duration_hours: shift.window().hours(),
            overridden: false,
        }
    }

    pub fn window(&self) -> ShiftWindow {
        ShiftWindow::new(self.date, self.start_time, self.end_time)
    }

    /// Vue « créneau » de l'affectation, pour réutiliser l'évaluateur de contraintes.
    pub fn as_requirement(&self) -> ShiftRequirement {
        ShiftRequirement {
            id: self.shift_id.clone(),
            department: self.department.clone(),
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            required_role: self.role.clone(),
            required_skills: self.required_skills.clone(),
            min_staff: 1,
            max_staff: 1,
            priority: self.priority,
            shift_type: self.shift_type.clone(),
        }
    }

    pub fn has_hard_violation(&self) -> bool {
        self.violations.iter().any(|v| v.severity == Severity::Hard)
    }

    pub fn has_soft_violation(&self) -> bool {
        self.violations.iter().any(|v| v.severity != Severity::Hard)
    }
}

/// Période couverte par un planning (bornes incluses).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub organization_id: String,
    #[serde(default)]
    pub department_id: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Schedule {
    pub fn new<S: Into<String>, O: Into<String>>(
        id: S,
        organization_id: O,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, String> {
        if end_date < start_date {
            return Err("schedule end date must not precede start date".to_string());
        }
        Ok(Self {
            id: id.into(),
            organization_id: organization_id.into(),
            department_id: None,
            start_date,
            end_date,
        })
    }

    /// Planning neuf, identifié par un UUID v4.
    pub fn with_random_id<O: Into<String>>(
        organization_id: O,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, String> {
        Self::new(Uuid::new_v4().to_string(), organization_id, start_date, end_date)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |d| *d <= self.end_date)
    }
}
