//! Error taxonomy for the alignment engine (see spec §7).
//!
//! Invariant violations are fatal to the job that raised them and propagate to
//! the caller unchanged. `Unreachable` and `ScoreOverflow` are expected to be
//! handled by the caller (GAM) as "degrade this job", not as hard failures.

use crate::model::{CalcId, StateId, TransitionId};
use crate::region::Region;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
  #[error("model invariant violated: {0}")]
  ModelInvariantViolated(#[from] ModelInvariantKind),

  #[error("sequence alphabet incompatible with model: expected {expected}, got {got}")]
  IncompatibleAlphabets { expected: String, got: String },

  #[error("Viterbi end state never reached for region {region:?}")]
  Unreachable { region: Region },

  #[error("score overflow in calc {calc:?} at ({qpos}, {tpos}), clamped")]
  ScoreOverflow { calc: CalcId, qpos: i64, tpos: i64 },

  #[error("resource exceeded: {0}")]
  ResourceExceeded(String),

  #[error("invalid argument: {0}")]
  InvalidArgument(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelInvariantKind {
  #[error("model is open and must be closed before use")]
  ModelNotClosed,

  #[error("attempted to mutate a closed model")]
  ModelAlreadyClosed,

  #[error("start state is not reachable from any transition")]
  UnreachableStart,

  #[error("end state is not reachable from any transition")]
  UnreachableEnd,

  #[error("orphan state {0:?} has no input or output transitions")]
  OrphanState(StateId),

  #[error("transition {0:?} has zero advance and no calc")]
  DegenerateTransition(TransitionId),

  #[error("model has no start state configured")]
  MissingStart,

  #[error("model has no end state configured")]
  MissingEnd,
}

pub type Result<T> = std::result::Result<T, EngineError>;
