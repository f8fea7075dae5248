use super::{StateId, TransitionId};

/// A deferred accumulator: fires `start_func` (via
/// [`crate::scoring::ScoringContext::shadow_start`]) when the path crosses a
/// source state, and `end_func` when it crosses a destination transition
/// (spec §3 "Shadow").
#[derive(Debug, Clone)]
pub struct Shadow {
  pub sources: Vec<StateId>,
  pub destinations: Vec<TransitionId>,
  /// Assigned at model-close; indexes the per-cell shadow slot vector.
  pub designation: usize,
}
