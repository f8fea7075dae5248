//! The result type the engine produces (spec §6 "External interfaces").

use crate::model::{ClosedC4Model, TransitionId};
use crate::region::Region;
use std::collections::HashMap;
use std::sync::Arc;

/// One gapped alignment: a score, the rectangle it covers, and the sequence
/// of (transition, length) operations a traceback produced.
#[derive(Debug, Clone)]
pub struct Alignment {
  pub score: i64,
  pub region: Region,
  pub operations: Vec<(TransitionId, i64)>,
  pub model: Arc<ClosedC4Model>,
}

impl Alignment {
  pub fn new(score: i64, region: Region, operations: Vec<(TransitionId, i64)>, model: Arc<ClosedC4Model>) -> Self {
    Self { score, region, operations, model }
  }

  /// Every `(qpos, tpos, advance_q, advance_t)` word-step of this
  /// alignment's match operations, at per-word granularity — the shape
  /// [`crate::region::SubOpt::add_alignment`] consumes.
  pub fn match_word_steps(&self) -> Vec<(i64, i64, i64, i64)> {
    let mut out = Vec::new();
    let mut qpos = self.region.qs;
    let mut tpos = self.region.ts;
    for &(tid, length) in &self.operations {
      let t = self.model.transition(tid);
      if t.is_match() {
        for _ in 0..length {
          out.push((qpos, tpos, t.advance_q, t.advance_t));
          qpos += t.advance_q;
          tpos += t.advance_t;
        }
      } else {
        qpos += t.advance_q * length;
        tpos += t.advance_t * length;
      }
    }
    out
  }

  pub fn overlaps_region(&self, other: &Region) -> bool {
    let qend = self.region.qend().min(other.qend());
    let qs = self.region.qs.max(other.qs);
    let tend = self.region.tend().min(other.tend());
    let ts = self.region.ts.max(other.ts);
    qend > qs && tend > ts
  }

  /// Import a traceback produced on a [`crate::model::DerivedModel`] back
  /// onto the host model it was derived from, translating each operation's
  /// transition id through `transition_map` (spec §4.C).
  pub fn import_derived(
    derived_alignment: &Alignment,
    transition_map: &HashMap<TransitionId, TransitionId>,
    host_model: Arc<ClosedC4Model>,
  ) -> Alignment {
    let operations = derived_alignment
      .operations
      .iter()
      .map(|&(tid, len)| (*transition_map.get(&tid).expect("derived transition must be in transition_map"), len))
      .collect();
    Alignment { score: derived_alignment.score, region: derived_alignment.region, operations, model: host_model }
  }
}
