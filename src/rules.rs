//! Règles métier d'affectation.
//!
//! Chaque règle est une variante typée de [`RuleKind`], décodée une seule fois au
//! chargement de la configuration ; l'évaluateur ne manipule jamais de sac de
//! paramètres non typé.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::model::{ShiftId, ShiftRequirement, WorkerAvailability, WorkerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Bloque l'affectation sauf dérogation explicite.
    Hard,
    Soft,
    Warning,
}

/// Étiquette plate d'une règle, portée par chaque violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    DoubleBooking,
    MaxConsecutiveShifts,
    MinRest,
    MaxHoursPerDay,
    MaxHoursPerWeek,
    MaxShiftsPerWeek,
    RequiredSkill,
    Availability,
    ShiftPreference,
    LocationPreference,
    NearHoursThreshold,
}

impl ConstraintKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintKind::DoubleBooking => "double-booking",
            ConstraintKind::MaxConsecutiveShifts => "max-consecutive-shifts",
            ConstraintKind::MinRest => "min-rest",
            ConstraintKind::MaxHoursPerDay => "max-hours-per-day",
            ConstraintKind::MaxHoursPerWeek => "max-hours-per-week",
            ConstraintKind::MaxShiftsPerWeek => "max-shifts-per-week",
            ConstraintKind::RequiredSkill => "required-skill",
            ConstraintKind::Availability => "availability",
            ConstraintKind::ShiftPreference => "shift-preference",
            ConstraintKind::LocationPreference => "location-preference",
            ConstraintKind::NearHoursThreshold => "near-hours-threshold",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paramètres typés de chaque famille de règle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleKind {
    DoubleBooking,
    /// Nombre maximal de jours calendaires consécutifs travaillés.
    MaxConsecutiveShifts { max_days: u32 },
    MinRest { hours: f64 },
    MaxHoursPerDay { hours: f64 },
    /// Semaine ISO (lundi → dimanche).
    MaxHoursPerWeek { hours: f64 },
    /// Plafond hebdomadaire de créneaux ; la valeur de la fiche personne prime.
    MaxShiftsPerWeek {
        #[serde(default)]
        default_max: Option<u32>,
    },
    RequiredSkill,
    Availability,
    ShiftPreference,
    LocationPreference,
    /// Se déclenche quand le total hebdomadaire dépasse `ratio * weekly_hours`.
    NearHoursThreshold { weekly_hours: f64, ratio: f64 },
}

impl RuleKind {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            RuleKind::DoubleBooking => ConstraintKind::DoubleBooking,
            RuleKind::MaxConsecutiveShifts { .. } => ConstraintKind::MaxConsecutiveShifts,
            RuleKind::MinRest { .. } => ConstraintKind::MinRest,
            RuleKind::MaxHoursPerDay { .. } => ConstraintKind::MaxHoursPerDay,
            RuleKind::MaxHoursPerWeek { .. } => ConstraintKind::MaxHoursPerWeek,
            RuleKind::MaxShiftsPerWeek { .. } => ConstraintKind::MaxShiftsPerWeek,
            RuleKind::RequiredSkill => ConstraintKind::RequiredSkill,
            RuleKind::Availability => ConstraintKind::Availability,
            RuleKind::ShiftPreference => ConstraintKind::ShiftPreference,
            RuleKind::LocationPreference => ConstraintKind::LocationPreference,
            RuleKind::NearHoursThreshold { .. } => ConstraintKind::NearHoursThreshold,
        }
    }
}

/// Périmètre d'application d'une règle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum RuleScope {
    Organization,
    Department { ids: Vec<String> },
    Role { roles: Vec<String> },
    Workers { ids: Vec<WorkerId> },
}

impl Default for RuleScope {
    fn default() -> Self {
        RuleScope::Organization
    }
}

impl RuleScope {
    pub fn admits(&self, worker: &WorkerAvailability, shift: &ShiftRequirement) -> bool {
        match self {
            RuleScope::Organization => true,
            RuleScope::Department { ids } => {
                ids.iter().any(|d| d.eq_ignore_ascii_case(&shift.department))
            }
            RuleScope::Role { roles } => roles.iter().any(|r| r.eq_ignore_ascii_case(&worker.role)),
            RuleScope::Workers { ids } => ids.contains(&worker.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRule {
    pub id: String,
    #[serde(flatten)]
    pub kind: RuleKind,
    pub severity: Severity,
    #[serde(default)]
    pub scope: RuleScope,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl ConstraintRule {
    pub fn new<S: Into<String>>(id: S, kind: RuleKind, severity: Severity) -> Self {
        Self {
            id: id.into(),
            kind,
            severity,
            scope: RuleScope::Organization,
            enabled: true,
        }
    }

    pub fn with_scope(mut self, scope: RuleScope) -> Self {
        self.scope = scope;
        self
    }
}

/// Ensemble ordonné de règles ; l'ordre fixe celui des violations produites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<ConstraintRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            rules: vec![
                ConstraintRule::new("availability", RuleKind::Availability, Severity::Hard),
                ConstraintRule::new("required-skill", RuleKind::RequiredSkill, Severity::Hard),
                ConstraintRule::new("double-booking", RuleKind::DoubleBooking, Severity::Hard),
                ConstraintRule::new("min-rest", RuleKind::MinRest { hours: 8.0 }, Severity::Hard),
                ConstraintRule::new(
                    "max-consecutive-shifts",
                    RuleKind::MaxConsecutiveShifts { max_days: 6 },
                    Severity::Hard,
                ),
                ConstraintRule::new(
                    "max-hours-per-day",
                    RuleKind::MaxHoursPerDay { hours: 12.0 },
                    Severity::Hard,
                ),
                ConstraintRule::new(
                    "max-hours-per-week",
                    RuleKind::MaxHoursPerWeek { hours: 48.0 },
                    Severity::Hard,
                ),
                ConstraintRule::new(
                    "max-shifts-per-week",
                    RuleKind::MaxShiftsPerWeek { default_max: None },
                    Severity::Hard,
                ),
                ConstraintRule::new("shift-preference", RuleKind::ShiftPreference, Severity::Soft),
                ConstraintRule::new(
                    "location-preference",
                    RuleKind::LocationPreference,
                    Severity::Soft,
                ),
                ConstraintRule::new(
                    "near-hours-threshold",
                    RuleKind::NearHoursThreshold { weekly_hours: 40.0, ratio: 0.9 },
                    Severity::Warning,
                ),
            ],
        }
    }
}

impl RuleSet {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn active(&self) -> impl Iterator<Item = &ConstraintRule> {
        self.rules.iter().filter(|r| r.enabled)
    }

    /// Vérifie la cohérence des paramètres ; renvoie les anomalies détectées.
    pub fn check(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.id.as_str()) {
                issues.push(format!("duplicate rule id: {}", rule.id));
            }
            let bad = match &rule.kind {
                RuleKind::MinRest { hours }
                | RuleKind::MaxHoursPerDay { hours }
                | RuleKind::MaxHoursPerWeek { hours } => !(hours.is_finite() && *hours >= 0.0),
                RuleKind::NearHoursThreshold { weekly_hours, ratio } => {
                    !(weekly_hours.is_finite() && *weekly_hours > 0.0 && *ratio > 0.0)
                }
                RuleKind::MaxConsecutiveShifts { max_days } => *max_days == 0,
                _ => false,
            };
            if bad {
                issues.push(format!("rule {} has invalid parameters", rule.id));
            }
        }
        issues
    }
}

/// Résultat d'un contrôle de règle ; jamais modifié après création.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub rule_id: String,
    pub kind: ConstraintKind,
    pub severity: Severity,
    pub message: String,
    pub worker_id: WorkerId,
    pub shift_id: ShiftId,
}
