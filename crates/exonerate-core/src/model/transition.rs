use super::{CalcId, StateId};

/// Semantic label of a transition (spec §3 "Transition").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Label {
  #[default]
  None,
  Match,
  Gap,
  Ner,
  Ss5,
  Ss3,
  Intron,
  SplitCodon,
  Frameshift,
}

/// Payload carried by a `Match`-labelled transition: the word size it
/// advances by. Per-position self score and "masked?" are looked up from
/// the `ScoringContext` keyed by the owning transition id, since they are
/// sequence data concerns the engine never inspects directly (spec §4.D).
#[derive(Debug, Clone, Copy)]
pub struct MatchPayload {
  pub advance_q: i64,
  pub advance_t: i64,
}

#[derive(Debug, Clone)]
pub struct Transition {
  pub input: StateId,
  pub output: StateId,
  pub advance_q: i64,
  pub advance_t: i64,
  pub calc: Option<CalcId>,
  pub label: Label,
  pub match_payload: Option<MatchPayload>,
}

impl Transition {
  pub fn is_match(&self) -> bool {
    self.label == Label::Match
  }

  pub fn is_span(&self) -> bool {
    false // spans are declared separately (see `Span`); kept for parity with
          // the original `C4_Transition_is_span` macro name.
  }
}
