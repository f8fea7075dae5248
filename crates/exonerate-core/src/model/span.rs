use super::{StateId, TransitionId};

/// A state in which the path may emit bounded free content, priced by a
/// separate loop model rather than materialising every intervening cell —
/// used for introns and NER regions (spec §3 "Span", glossary).
#[derive(Debug, Clone)]
pub struct Span {
  pub span_state: StateId,
  pub min_q: i64,
  pub max_q: i64,
  pub min_t: i64,
  pub max_t: i64,
  pub query_loop: Option<TransitionId>,
  pub target_loop: Option<TransitionId>,
}

impl Span {
  pub fn admits(&self, advance_q: i64, advance_t: i64) -> bool {
    advance_q >= self.min_q && advance_q <= self.max_q && advance_t >= self.min_t && advance_t <= self.max_t
  }
}
