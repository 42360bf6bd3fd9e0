use std::fmt;

use crate::core::{ProcessId, Ticks};

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidInput {
    NonPositiveId(i64),
    DuplicateId(ProcessId),
    ZeroBurst(ProcessId),
    NegativeBurst { id: ProcessId, burst: i64 },
    EmptyQuanta,
    ZeroQuantum { level: usize },
    ZeroThreshold,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Rejected before the first tick; no events have been emitted.
    InvalidInput(InvalidInput),
    /// Scheduling-logic bug detected mid-run. The run is aborted.
    InvariantViolation { at: Ticks, detail: String },
    Config(String),
}

impl SimError {
    pub(crate) fn invariant(at: Ticks, detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            at,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveId(id) => write!(f, "process id must be positive, got {id}"),
            Self::DuplicateId(id) => write!(f, "duplicate process id P{id}"),
            Self::ZeroBurst(id) => write!(f, "P{id}: burst time must be positive"),
            Self::NegativeBurst { id, burst } => {
                write!(f, "P{id}: burst time must be positive, got {burst}")
            }
            Self::EmptyQuanta => write!(f, "at least one queue quantum is required"),
            Self::ZeroQuantum { level } => write!(f, "quantum for queue {level} must be positive"),
            Self::ZeroThreshold => write!(f, "promotion threshold must be positive"),
        }
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(e) => write!(f, "invalid input: {e}"),
            Self::InvariantViolation { at, detail } => {
                write!(f, "scheduler invariant violated at t={at}: {detail}")
            }
            Self::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for InvalidInput {}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidInput(e) => Some(e),
            _ => None,
        }
    }
}

impl From<InvalidInput> for SimError {
    fn from(e: InvalidInput) -> Self {
        Self::InvalidInput(e)
    }
}
