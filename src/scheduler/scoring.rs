//! Score de correspondance 0–100 d'un couple (personne, créneau).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::util;
use crate::availability::WorkerEntry;
use crate::model::{Priority, ShiftRequirement, WorkerId};

/// Pondération des composantes, en points sur 100.
///
/// Partagée avec le score de couverture : `coverage` pondère la disponibilité d'un
/// candidat, `quality` l'adéquation des compétences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub coverage: f64,
    pub quality: f64,
    pub balance: f64,
    pub priority: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            coverage: 40.0,
            quality: 35.0,
            balance: 15.0,
            priority: 10.0,
        }
    }
}

impl ScoringWeights {
    pub fn check(&self) -> Result<(), String> {
        let parts = [self.coverage, self.quality, self.balance, self.priority];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("weights must be finite and non-negative".to_string());
        }
        let sum: f64 = parts.iter().sum();
        if (sum - 100.0).abs() > 1e-6 {
            return Err(format!("weights must sum to 100, got {sum}"));
        }
        Ok(())
    }

    /// Combine quatre composantes, chacune bornée à [0, 100] au préalable.
    pub fn combine(&self, coverage: f64, quality: f64, balance: f64, priority: f64) -> f64 {
        (util::clamp_pct(coverage) * self.coverage
            + util::clamp_pct(quality) * self.quality
            + util::clamp_pct(balance) * self.balance
            + util::clamp_pct(priority) * self.priority)
            / 100.0
    }
}

/// Heures déjà attribuées par personne, propre à une génération.
#[derive(Debug, Clone)]
pub struct Workload {
    hours: HashMap<WorkerId, f64>,
    total: f64,
    workers: usize,
}

impl Workload {
    pub fn new(workers: usize) -> Self {
        Self {
            hours: HashMap::new(),
            total: 0.0,
            workers: workers.max(1),
        }
    }

    pub fn hours_of(&self, worker: &WorkerId) -> f64 {
        self.hours.get(worker).copied().unwrap_or(0.0)
    }

    pub fn add(&mut self, worker: &WorkerId, hours: f64) {
        *self.hours.entry(worker.clone()).or_insert(0.0) += hours;
        self.total += hours;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skill_match: f64,
    pub availability: f64,
    pub balance: f64,
    pub priority: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringModel {
    pub weights: ScoringWeights,
}

impl ScoringModel {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn score(
        &self,
        worker: &WorkerEntry,
        shift: &ShiftRequirement,
        workload: &Workload,
    ) -> ScoreBreakdown {
        let skill_match = worker.skill_match(&shift.required_skills);
        let availability = availability_fit(worker, shift);
        let balance = balance_score(workload, worker.id(), shift.window().hours());
        let priority = priority_score(shift.priority);
        ScoreBreakdown {
            skill_match,
            availability,
            balance,
            priority,
            total: util::round2(
                self.weights
                    .combine(availability, skill_match, balance, priority),
            ),
        }
    }
}

fn availability_fit(worker: &WorkerEntry, shift: &ShiftRequirement) -> f64 {
    if !worker.is_available(shift.date) {
        return 0.0;
    }
    match worker.prefers_shift_type(&shift.shift_type) {
        Some(false) => 75.0,
        _ => 100.0,
    }
}

/// 100 quand la charge après affectation coïncide avec la moyenne.
fn balance_score(workload: &Workload, worker: &WorkerId, hours: f64) -> f64 {
    let post = workload.hours_of(worker) + hours;
    let mean = (workload.total + hours) / workload.workers as f64;
    let scale = mean.max(hours);
    if scale <= 0.0 {
        return 100.0;
    }
    util::clamp_pct(100.0 * (1.0 - (post - mean).abs() / scale))
}

fn priority_score(priority: Priority) -> f64 {
    match priority {
        Priority::Critical => 100.0,
        Priority::High => 75.0,
        Priority::Normal => 50.0,
        Priority::Low => 25.0,
    }
}
