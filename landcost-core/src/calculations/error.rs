use thiserror::Error;

use crate::db::{ApplyError, RepositoryError};
use crate::models::{Category, EditTarget, IndicatorKey, LineKey};

/// Coarse classification of a [`RecalculationError`], used by callers to
/// choose a response without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Lookup,
    Aggregation,
    Store,
    PartialApplication,
    Pipeline,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecalculationError {
    #[error("category must be between 1 and 4, got {0}")]
    InvalidCategory(i32),

    #[error("computing method must be 1 or 2 for category 1, got {0}")]
    InvalidComputingMethod(i32),

    #[error("{0} does not exist")]
    MissingIndicator(IndicatorKey),

    #[error("{0} does not exist")]
    MissingLine(LineKey),

    #[error("{0} appears more than once")]
    DuplicateIndicator(IndicatorKey),

    #[error("{0} appears more than once")]
    DuplicateLine(LineKey),

    #[error("no indicator in category {category} matches {target}")]
    UnknownEditTarget {
        category: Category,
        target: EditTarget,
    },

    #[error("indicator name '{name}' is not unique in category {category}")]
    AmbiguousIndicatorName { category: Category, name: String },

    #[error("aggregate over {0} matched no rows")]
    EmptyAggregate(String),

    #[error("{0} is out of range for the decimal type")]
    Overflow(String),

    #[error("step '{step}' reads {cell} which step '{writer}' writes later")]
    StepOrder {
        step: String,
        cell: String,
        writer: String,
    },

    #[error("store error: {0}")]
    Store(#[from] RepositoryError),

    #[error("recalculation partially applied: {0}")]
    PartiallyApplied(ApplyError),
}

impl RecalculationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCategory(_) | Self::InvalidComputingMethod(_) | Self::Overflow(_) => {
                ErrorKind::Validation
            }
            Self::MissingIndicator(_)
            | Self::MissingLine(_)
            | Self::DuplicateIndicator(_)
            | Self::DuplicateLine(_)
            | Self::UnknownEditTarget { .. }
            | Self::AmbiguousIndicatorName { .. } => ErrorKind::Lookup,
            Self::EmptyAggregate(_) => ErrorKind::Aggregation,
            Self::Store(_) => ErrorKind::Store,
            Self::PartiallyApplied(_) => ErrorKind::PartialApplication,
            Self::StepOrder { .. } => ErrorKind::Pipeline,
        }
    }
}

impl From<ApplyError> for RecalculationError {
    fn from(err: ApplyError) -> Self {
        if err.applied == 0 {
            Self::Store(err.source)
        } else {
            Self::PartiallyApplied(err)
        }
    }
}
