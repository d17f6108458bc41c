//! Couverture par dimension et score composite de qualité d'un planning.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::model::{time_period, Assignment, ShiftId, ShiftRequirement, WorkerId};
use crate::scheduler::{util, ScoringWeights};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionCoverage {
    pub total: usize,
    pub covered: usize,
    pub coverage_percentage: f64,
    pub average_match_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadDistribution {
    pub workers: usize,
    pub mean_hours: f64,
    pub std_dev_hours: f64,
    pub min_hours: f64,
    pub max_hours: f64,
    /// 100 = charge parfaitement uniforme.
    pub balance_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageMetrics {
    pub total_shifts: usize,
    pub assigned_shifts: usize,
    pub unassigned_shifts: usize,
    pub coverage_percentage: f64,
    pub by_role: BTreeMap<String, DimensionCoverage>,
    pub by_department: BTreeMap<String, DimensionCoverage>,
    pub by_shift_type: BTreeMap<String, DimensionCoverage>,
    pub by_time_period: BTreeMap<String, DimensionCoverage>,
    pub by_priority: BTreeMap<String, DimensionCoverage>,
    pub workload: WorkloadDistribution,
    pub quality_score: f64,
    pub priority_score: f64,
    pub overall_coverage_score: f64,
}

/// Accumulateur d'une valeur de dimension.
#[derive(Default)]
struct Tally {
    total: usize,
    covered: usize,
    score_sum: f64,
    scored: usize,
}

impl Tally {
    fn finish(&self) -> DimensionCoverage {
        DimensionCoverage {
            total: self.total,
            covered: self.covered,
            coverage_percentage: util::round2(pct(self.covered, self.total)),
            average_match_score: if self.scored == 0 {
                0.0
            } else {
                util::round2(self.score_sum / self.scored as f64)
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageScorer {
    pub weights: ScoringWeights,
}

impl CoverageScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Fonction pure : deux appels sur les mêmes entrées donnent le même résultat.
    pub fn score(
        &self,
        shifts: &[ShiftRequirement],
        assignments: &[Assignment],
    ) -> CoverageMetrics {
        let staffed: Vec<&Assignment> = assignments
            .iter()
            .filter(|a| a.status.is_staffed())
            .collect();

        let mut by_shift: HashMap<&ShiftId, Vec<&Assignment>> = HashMap::new();
        for a in staffed.iter().copied() {
            by_shift.entry(&a.shift_id).or_default().push(a);
        }

        let mut dims: [BTreeMap<String, Tally>; 5] = Default::default();
        let mut covered_total = 0usize;
        let mut elevated = (0usize, 0usize);

        for shift in shifts {
            let placed = by_shift.get(&shift.id).map_or(&[][..], Vec::as_slice);
            let covered = placed.len() >= shift.staff_target() as usize;
            if covered {
                covered_total += 1;
            }
            if shift.priority.is_elevated() {
                elevated.0 += 1;
                if covered {
                    elevated.1 += 1;
                }
            }

            let keys = [
                shift.required_role.clone().unwrap_or_else(|| "any".to_string()),
                shift.department.clone(),
                shift.shift_type.clone(),
                time_period(shift.start_time).to_string(),
                shift.priority.as_str().to_string(),
            ];
            for (dim, key) in dims.iter_mut().zip(keys) {
                let tally = dim.entry(key).or_default();
                tally.total += 1;
                if covered {
                    tally.covered += 1;
                }
                for a in placed {
                    tally.score_sum += a.match_score;
                    tally.scored += 1;
                }
            }
        }

        let [by_role, by_department, by_shift_type, by_time_period, by_priority] =
            dims.map(|d| {
                d.into_iter()
                    .map(|(k, t)| (k, t.finish()))
                    .collect::<BTreeMap<String, DimensionCoverage>>()
            });

        let total_shifts = shifts.len();
        let coverage_percentage = pct(covered_total, total_shifts);
        let quality_score = if staffed.is_empty() {
            0.0
        } else {
            staffed.iter().map(|a| a.match_score).sum::<f64>() / staffed.len() as f64
        };
        // sans créneau prioritaire, rien ne manque
        let priority_score = if elevated.0 == 0 {
            100.0
        } else {
            pct(elevated.1, elevated.0)
        };
        let workload = workload_distribution(&staffed);
        let overall = self.weights.combine(
            coverage_percentage,
            quality_score,
            workload.balance_score,
            priority_score,
        );

        CoverageMetrics {
            total_shifts,
            assigned_shifts: covered_total,
            unassigned_shifts: total_shifts - covered_total,
            coverage_percentage: util::round2(coverage_percentage),
            by_role,
            by_department,
            by_shift_type,
            by_time_period,
            by_priority,
            workload,
            quality_score: util::round2(quality_score),
            priority_score: util::round2(priority_score),
            overall_coverage_score: util::round2(overall),
        }
    }
}

fn workload_distribution(staffed: &[&Assignment]) -> WorkloadDistribution {
    let mut hours: BTreeMap<&WorkerId, f64> = BTreeMap::new();
    for a in staffed {
        *hours.entry(&a.worker_id).or_insert(0.0) += a.duration_hours;
    }
    if hours.is_empty() {
        return WorkloadDistribution {
            balance_score: 100.0,
            ..WorkloadDistribution::default()
        };
    }
    let values: Vec<f64> = hours.values().copied().collect();
    let (mean, std) = util::mean_std(&values);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let balance = if mean > 0.0 {
        util::clamp_pct(100.0 * (1.0 - std / mean))
    } else {
        100.0
    };
    WorkloadDistribution {
        workers: values.len(),
        mean_hours: util::round2(mean),
        std_dev_hours: util::round2(std),
        min_hours: util::round2(min),
        max_hours: util::round2(max),
        balance_score: util::round2(balance),
    }
}

fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
