//! Diagnostics dérivés d'un ensemble d'affectations : balayage complet, contrôle
//! local d'un déplacement, couverture.

mod coverage;
mod debounce;
mod drop_move;
mod realtime;

pub use coverage::{CoverageMetrics, CoverageScorer, DimensionCoverage, WorkloadDistribution};
pub use debounce::Debouncer;
pub use drop_move::{
    validate_drop, DropIssue, DropIssueKind, DropMoveValidator, DropThresholds,
    DropValidationResult,
};
pub use realtime::{
    RealtimeValidator, ValidationWarning, ValidatorThresholds, WarningCategory, WarningSeverity,
};
