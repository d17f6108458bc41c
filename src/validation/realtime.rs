//! Balayage complet d'un planning : détecte les problèmes systémiques (trous de
//! couverture, surcharge, compétences, risque d'épuisement) et produit des
//! avertissements catégorisés.
//!
//! Les avertissements sont recalculés intégralement à chaque passage ; leur
//! identifiant est dérivé de la catégorie et du sujet, ce qui permet de comparer
//! deux instantanés sans état caché.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::model::{Assignment, AssignmentId, AssignmentStatus, Schedule, WorkerId};
use crate::scheduler::util;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCategory {
    Violation,
    Workload,
    Coverage,
    SkillMatch,
    Availability,
    Pattern,
}

impl WarningCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            WarningCategory::Violation => "violation",
            WarningCategory::Workload => "workload",
            WarningCategory::Coverage => "coverage",
            WarningCategory::SkillMatch => "skill_match",
            WarningCategory::Availability => "availability",
            WarningCategory::Pattern => "pattern",
        }
    }
}

impl fmt::Display for WarningCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    Info,
    Warning,
    Critical,
}

impl WarningSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            WarningSeverity::Info => "info",
            WarningSeverity::Warning => "warning",
            WarningSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for WarningSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub id: String,
    pub category: WarningCategory,
    pub severity: WarningSeverity,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub affected_assignments: Vec<AssignmentId>,
    #[serde(default)]
    pub affected_workers: Vec<WorkerId>,
    #[serde(default)]
    pub suggested_action: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl ValidationWarning {
    fn new(
        id: impl Into<String>,
        category: WarningCategory,
        severity: WarningSeverity,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            severity,
            title: title.into(),
            message: message.into(),
            affected_assignments: Vec::new(),
            affected_workers: Vec::new(),
            suggested_action: None,
            metadata: BTreeMap::new(),
        }
    }

    fn assignments<'a>(mut self, items: impl IntoIterator<Item = &'a Assignment>) -> Self {
        let mut workers = BTreeSet::new();
        for a in items {
            self.affected_assignments.push(a.id.clone());
            workers.insert(a.worker_id.clone());
        }
        self.affected_workers = workers.into_iter().collect();
        self
    }

    fn action(mut self, action: impl Into<String>) -> Self {
        self.suggested_action = Some(action.into());
        self
    }

    fn meta(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Seuils du balayage ; les défauts reprennent les valeurs de référence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorThresholds {
    pub overload_hours: f64,
    /// Écart-type / moyenne au-delà duquel la charge est jugée déséquilibrée.
    pub imbalance_ratio: f64,
    /// Une date avec 1..=low_coverage_max affectations est sous-couverte.
    pub low_coverage_max: usize,
    pub skill_critical_below: f64,
    pub skill_warning_below: f64,
    pub burnout_days: u32,
}

impl Default for ValidatorThresholds {
    fn default() -> Self {
        Self {
            overload_hours: 50.0,
            imbalance_ratio: 0.4,
            low_coverage_max: 2,
            skill_critical_below: 30.0,
            skill_warning_below: 50.0,
            burnout_days: 8,
        }
    }
}

/// Contexte construit en une passe sur les affectations.
struct ValidationContext<'a> {
    staffed: Vec<&'a Assignment>,
    hard: Vec<&'a Assignment>,
    soft: Vec<&'a Assignment>,
    worker_hours: BTreeMap<&'a WorkerId, f64>,
    worker_dates: BTreeMap<&'a WorkerId, BTreeSet<NaiveDate>>,
    date_counts: BTreeMap<NaiveDate, usize>,
}

impl<'a> ValidationContext<'a> {
    fn build(assignments: &'a [Assignment]) -> Self {
        let mut ctx = Self {
            staffed: Vec::new(),
            hard: Vec::new(),
            soft: Vec::new(),
            worker_hours: BTreeMap::new(),
            worker_dates: BTreeMap::new(),
            date_counts: BTreeMap::new(),
        };
        for a in assignments {
            if a.status == AssignmentStatus::Cancelled {
                continue;
            }
            if a.has_hard_violation() {
                ctx.hard.push(a);
            }
            if a.has_soft_violation() {
                ctx.soft.push(a);
            }
            if !a.status.is_staffed() {
                continue;
            }
            ctx.staffed.push(a);
            *ctx.worker_hours.entry(&a.worker_id).or_insert(0.0) += a.duration_hours;
            ctx.worker_dates.entry(&a.worker_id).or_default().insert(a.date);
            *ctx.date_counts.entry(a.date).or_insert(0) += 1;
        }
        ctx
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RealtimeValidator {
    pub thresholds: ValidatorThresholds,
}

impl RealtimeValidator {
    pub fn new(thresholds: ValidatorThresholds) -> Self {
        Self { thresholds }
    }

    /// Fonction pure de (planning, affectations) ; aucune E/S.
    pub fn validate(
        &self,
        schedule: &Schedule,
        assignments: &[Assignment],
    ) -> Vec<ValidationWarning> {
        let ctx = ValidationContext::build(assignments);
        let mut out = Vec::new();
        out.extend(self.check_violations(&ctx));
        out.extend(self.check_workload(&ctx));
        out.extend(self.check_coverage(&ctx, schedule));
        out.extend(self.check_skill_match(&ctx));
        out.extend(check_availability(&ctx));
        out.extend(self.check_patterns(&ctx));
        out
    }

    fn check_violations(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationWarning> {
        let mut out = Vec::new();
        if !ctx.hard.is_empty() {
            let overridden = ctx.hard.iter().filter(|a| a.overridden).count();
            out.push(
                ValidationWarning::new(
                    "violations-hard",
                    WarningCategory::Violation,
                    WarningSeverity::Critical,
                    "Hard constraint violations",
                    format!("{} assignment(s) break a hard constraint", ctx.hard.len()),
                )
                .assignments(ctx.hard.iter().copied())
                .action("Reassign or explicitly confirm the override for each flagged assignment")
                .meta("overridden", json!(overridden)),
            );
        }
        if !ctx.soft.is_empty() {
            out.push(
                ValidationWarning::new(
                    "violations-soft",
                    WarningCategory::Violation,
                    WarningSeverity::Warning,
                    "Soft constraint violations",
                    format!("{} assignment(s) break a preference or soft rule", ctx.soft.len()),
                )
                .assignments(ctx.soft.iter().copied())
                .action("Review preferences before publishing"),
            );
        }
        out
    }

    fn check_workload(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationWarning> {
        let mut out = Vec::new();
        for (worker, hours) in &ctx.worker_hours {
            if *hours <= self.thresholds.overload_hours {
                continue;
            }
            let owned = ctx.staffed.iter().copied().filter(|a| &a.worker_id == *worker);
            out.push(
                ValidationWarning::new(
                    format!("workload-overload-{worker}"),
                    WarningCategory::Workload,
                    WarningSeverity::Critical,
                    "Worker overloaded",
                    format!(
                        "{worker} is scheduled for {hours:.1}h (limit {:.0}h)",
                        self.thresholds.overload_hours
                    ),
                )
                .assignments(owned)
                .action("Move some of these shifts to a less loaded worker")
                .meta("hours", json!(util::round2(*hours))),
            );
        }

        let hours: Vec<f64> = ctx.worker_hours.values().copied().collect();
        let (mean, std) = util::mean_std(&hours);
        if hours.len() >= 2 && mean > 0.0 && std / mean > self.thresholds.imbalance_ratio {
            let ratio = std / mean;
            out.push(
                ValidationWarning::new(
                    "workload-imbalance",
                    WarningCategory::Workload,
                    WarningSeverity::Warning,
                    "Unbalanced workload",
                    format!("workload spread is {:.0}% of the mean", ratio * 100.0),
                )
                .action("Rebalance hours across the team")
                .meta("mean_hours", json!(util::round2(mean)))
                .meta("std_dev_hours", json!(util::round2(std)))
                .meta("ratio", json!(util::round2(ratio))),
            );
        }
        out
    }

    fn check_coverage(
        &self,
        ctx: &ValidationContext<'_>,
        schedule: &Schedule,
    ) -> Vec<ValidationWarning> {
        let mut empty = Vec::new();
        let mut low = Vec::new();
        for date in schedule.dates() {
            match ctx.date_counts.get(&date).copied().unwrap_or(0) {
                0 => empty.push(date),
                n if n <= self.thresholds.low_coverage_max => low.push(date),
                _ => {}
            }
        }

        let mut out = Vec::new();
        if !empty.is_empty() {
            out.push(
                ValidationWarning::new(
                    "coverage-none",
                    WarningCategory::Coverage,
                    WarningSeverity::Critical,
                    "No coverage",
                    format!("no assignments on {}", join_dates(&empty)),
                )
                .action("Assign staff to the uncovered dates")
                .meta("dates", json!(date_strings(&empty))),
            );
        }
        if !low.is_empty() {
            let affected = ctx.staffed.iter().copied().filter(|a| low.contains(&a.date));
            out.push(
                ValidationWarning::new(
                    "coverage-low",
                    WarningCategory::Coverage,
                    WarningSeverity::Warning,
                    "Low coverage",
                    format!(
                        "only 1-{} assignments on {}",
                        self.thresholds.low_coverage_max,
                        join_dates(&low)
                    ),
                )
                .assignments(affected)
                .action("Consider adding staff on these dates")
                .meta("dates", json!(date_strings(&low))),
            );
        }
        out
    }

    fn check_skill_match(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationWarning> {
        let t = &self.thresholds;
        let critical: Vec<&Assignment> = ctx
            .staffed
            .iter()
            .copied()
            .filter(|a| a.skill_match < t.skill_critical_below)
            .collect();
        let weak: Vec<&Assignment> = ctx
            .staffed
            .iter()
            .copied()
            .filter(|a| {
                a.skill_match >= t.skill_critical_below && a.skill_match < t.skill_warning_below
            })
            .collect();

        let mut out = Vec::new();
        if !critical.is_empty() {
            out.push(
                ValidationWarning::new(
                    "skill-critical",
                    WarningCategory::SkillMatch,
                    WarningSeverity::Critical,
                    "Severe skill mismatch",
                    format!(
                        "{} assignment(s) below {:.0}% skill match",
                        critical.len(),
                        t.skill_critical_below
                    ),
                )
                .assignments(critical)
                .action("Replace with qualified workers"),
            );
        }
        if !weak.is_empty() {
            out.push(
                ValidationWarning::new(
                    "skill-low",
                    WarningCategory::SkillMatch,
                    WarningSeverity::Warning,
                    "Partial skill match",
                    format!(
                        "{} assignment(s) between {:.0}% and {:.0}% skill match",
                        weak.len(),
                        t.skill_critical_below,
                        t.skill_warning_below
                    ),
                )
                .assignments(weak)
                .action("Pair with a qualified colleague or reassign"),
            );
        }
        out
    }

    fn check_patterns(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationWarning> {
        let mut out = Vec::new();
        for (worker, dates) in &ctx.worker_dates {
            let longest = longest_run(dates);
            if longest < self.thresholds.burnout_days {
                continue;
            }
            let owned = ctx.staffed.iter().copied().filter(|a| &a.worker_id == *worker);
            out.push(
                ValidationWarning::new(
                    format!("pattern-burnout-{worker}"),
                    WarningCategory::Pattern,
                    WarningSeverity::Warning,
                    "Burnout risk",
                    format!("{worker} works {longest} consecutive days"),
                )
                .assignments(owned)
                .action("Insert a rest day")
                .meta("consecutive_days", json!(longest)),
            );
        }
        out
    }
}

fn check_availability(ctx: &ValidationContext<'_>) -> Vec<ValidationWarning> {
    let tentative: Vec<&Assignment> = ctx
        .staffed
        .iter()
        .copied()
        .filter(|a| a.status == AssignmentStatus::Tentative)
        .collect();
    if tentative.is_empty() {
        return Vec::new();
    }
    vec![ValidationWarning::new(
        "availability-tentative",
        WarningCategory::Availability,
        WarningSeverity::Info,
        "Unconfirmed assignments",
        format!("{} assignment(s) await confirmation", tentative.len()),
    )
    .assignments(tentative)
    .action("Ask the workers to confirm")]
}

/// Plus longue série de dates consécutives ; toute autre différence que 1 jour
/// relance la série.
fn longest_run(dates: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;
    for &d in dates {
        run = match prev {
            Some(p) if (d - p).num_days() == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(d);
    }
    longest
}

fn date_strings(dates: &[NaiveDate]) -> Vec<String> {
    dates.iter().map(ToString::to_string).collect()
}

fn join_dates(dates: &[NaiveDate]) -> String {
    date_strings(dates).join(", ")
}
