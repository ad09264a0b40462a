//! Outcomes of compensating actions.

use crate::error::ServiceError;
use crate::handlers::StepKind;

/// What a compensating action achieved.
///
/// Compensation is best effort: a failed call is reported here and logged,
/// never propagated, so a rollback sequence always runs to the end.
#[derive(Debug, Clone, PartialEq)]
pub enum CompensationOutcome {
    /// Every compensating call succeeded.
    Applied { attempted: usize },

    /// There was nothing to undo.
    Skipped,

    /// Some compensating calls failed.
    Degraded {
        attempted: usize,
        errors: Vec<ServiceError>,
    },
}

impl CompensationOutcome {
    /// Builds an outcome from the errors of `attempted` compensating calls.
    pub fn from_errors(attempted: usize, errors: Vec<ServiceError>) -> Self {
        if errors.is_empty() {
            CompensationOutcome::Applied { attempted }
        } else {
            CompensationOutcome::Degraded { attempted, errors }
        }
    }

    /// Returns true if at least one compensating call failed.
    pub fn is_degraded(&self) -> bool {
        matches!(self, CompensationOutcome::Degraded { .. })
    }

    /// Number of compensating calls that succeeded.
    pub fn succeeded(&self) -> usize {
        match self {
            CompensationOutcome::Applied { attempted } => *attempted,
            CompensationOutcome::Skipped => 0,
            CompensationOutcome::Degraded { attempted, errors } => {
                attempted.saturating_sub(errors.len())
            }
        }
    }

    /// Label used for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompensationOutcome::Applied { .. } => "applied",
            CompensationOutcome::Skipped => "skipped",
            CompensationOutcome::Degraded { .. } => "degraded",
        }
    }
}

/// A compensating action that ran during a saga.
#[derive(Debug, Clone, PartialEq)]
pub struct CompensationRecord {
    pub step: StepKind,
    pub outcome: CompensationOutcome,
}
