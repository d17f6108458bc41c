//! Configuration du moteur, chargée depuis un fichier JSON.
//!
//! Tous les champs sont optionnels ; les valeurs absentes reprennent les défauts.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::rules::RuleSet;
use crate::scheduler::{GenerateOptions, ScheduleError, ScoringWeights};
use crate::validation::{DropThresholds, ValidatorThresholds};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rules: RuleSet,
    pub scoring: ScoringWeights,
    pub generate: GenerateOptions,
    pub validator: ValidatorThresholds,
    #[serde(rename = "drop")]
    pub drop_move: DropThresholds,
    pub debounce_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules: RuleSet::default(),
            scoring: ScoringWeights::default(),
            generate: GenerateOptions::default(),
            validator: ValidatorThresholds::default(),
            drop_move: DropThresholds::default(),
            debounce_ms: 300,
        }
    }
}

impl EngineConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
        let config: EngineConfig = serde_json::from_slice(&data)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<(), ScheduleError> {
        let mut problems = self.rules.check();
        if let Err(e) = self.scoring.check() {
            problems.push(e);
        }
        if !(self.generate.greedy_min_score.is_finite()
            && (0.0..=100.0).contains(&self.generate.greedy_min_score))
        {
            problems.push("greedy_min_score must lie in [0, 100]".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ScheduleError::InvalidConfig(problems.join("; ")))
        }
    }
}
