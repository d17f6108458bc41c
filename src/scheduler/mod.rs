mod assignment;
mod conflicts;
mod constraints;
mod scoring;
mod types;
pub(crate) mod util;

pub use assignment::AssignmentGenerator;
pub use constraints::{evaluate, evaluate_assignments, PlacedShift, ScheduleState};
pub use scoring::{ScoreBreakdown, ScoringModel, ScoringWeights, Workload};
pub use types::{
    AssignmentAttempt, GenerateOptions, GenerateRequest, InputIssue, ScheduleConflict,
    ScheduleError, ScheduleGenerationResult, Strategy,
};

use crate::config::EngineConfig;

/// Point d'entrée : valide la configuration puis génère le planning.
pub fn generate_schedule(
    request: &GenerateRequest,
    config: &EngineConfig,
) -> Result<ScheduleGenerationResult, ScheduleError> {
    config.check()?;
    AssignmentGenerator::new(&config.rules, ScoringModel::new(config.scoring), config.generate)
        .generate(request)
}
