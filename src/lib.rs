#![forbid(unsafe_code)]
//! Affectation : moteur local d'affectation de personnel à des créneaux.
//!
//! - Index de disponibilité et règles déclaratives (bloquantes, souples, avertissements).
//! - Génération gloutonne avec score pondéré et diagnostic des créneaux non pourvus.
//! - Validation en continu d'un planning édité, contrôle rapide des déplacements.
//! - Métriques de couverture ; persistance JSON atomique des sessions.

pub mod availability;
pub mod config;
pub mod model;
pub mod notification;
pub mod rules;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod validation;

pub use availability::{AvailabilityIndex, WorkerEntry};
pub use config::EngineConfig;
pub use model::{
    Assignment, AssignmentId, AssignmentStatus, Priority, Schedule, ShiftId, ShiftRequirement,
    ShiftWindow, WorkerAvailability, WorkerId,
};
pub use notification::{diff_warnings, TextWarningRenderer, WarningDiff, WarningRenderer};
pub use rules::{
    ConstraintKind, ConstraintRule, ConstraintViolation, RuleKind, RuleScope, RuleSet, Severity,
};
pub use scheduler::{
    generate_schedule, AssignmentGenerator, GenerateRequest, ScheduleConflict, ScheduleError,
    ScheduleGenerationResult, ScoringModel, ScoringWeights, Strategy,
};
pub use session::{EditingSession, MoveOutcome};
pub use storage::{JsonStorage, Storage, StoredSession};
pub use validation::{
    validate_drop, CoverageMetrics, CoverageScorer, DropMoveValidator, DropValidationResult,
    RealtimeValidator, ValidationWarning, WarningCategory, WarningSeverity,
};
