//! Affine-gap models (spec §4.K): one match state and two gap states
//! (query-insert, target-insert), gap-open scored on the match→gap
//! transition, gap-extend on gap→gap, gap-close free (gap→match at 0). The
//! four `AffineKind` variants share this skeleton and differ only in which
//! corners of the DP rectangle a path may start/end at.

use crate::error::Result;
use crate::model::{Calc, ClosedC4Model, Label, MatchPayload, OpenC4Model, Scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffineKind {
  /// Free ends nowhere: classic global (Needleman-Wunsch) alignment.
  Global,
  /// Free ends on whichever axis is longer, so the shorter sequence aligns
  /// entirely within the longer one without edge penalties.
  Bestfit,
  /// Free ends anywhere in the rectangle: Smith-Waterman local alignment.
  Local,
  /// Free ends on the rectangle's edge (either axis), but not the interior:
  /// semi-global/overlap alignment.
  Overlap,
}

impl AffineKind {
  fn scope(self) -> Scope {
    match self {
      AffineKind::Global => Scope::Corner,
      AffineKind::Bestfit => Scope::Target,
      AffineKind::Local => Scope::Anywhere,
      AffineKind::Overlap => Scope::Edge,
    }
  }
}

#[derive(Debug, Clone, Copy)]
pub struct AffineCalcs {
  pub match_calc: crate::model::CalcId,
  pub gap_open_calc: crate::model::CalcId,
  pub gap_extend_calc: crate::model::CalcId,
}

pub fn build(kind: AffineKind, args: &super::ModelArgs) -> Result<(ClosedC4Model, AffineCalcs)> {
  let mut m = OpenC4Model::new(match kind {
    AffineKind::Global => "affine:global",
    AffineKind::Bestfit => "affine:bestfit",
    AffineKind::Local => "affine:local",
    AffineKind::Overlap => "affine:overlap",
  });
  let match_calc = m.add_calc(Calc::new("match", 0, false, false));
  let gap_open_calc = m.add_calc(Calc::new("gap_open", args.gap_open.max(0), false, true));
  let gap_extend_calc = m.add_calc(Calc::new("gap_extend", args.gap_extend.max(0), false, true));

  let body = m.add_state();
  let qgap = m.add_state();
  let tgap = m.add_state();

  m.add_transition(None, Some(body), 0, 0, None, Label::None, None);
  m.add_transition(Some(body), Some(body), 1, 1, Some(match_calc), Label::Match, Some(MatchPayload { advance_q: 1, advance_t: 1 }));

  m.add_transition(Some(body), Some(qgap), 1, 0, Some(gap_open_calc), Label::Gap, None);
  m.add_transition(Some(qgap), Some(qgap), 1, 0, Some(gap_extend_calc), Label::Gap, None);
  m.add_transition(Some(qgap), Some(body), 0, 0, None, Label::None, None);

  m.add_transition(Some(body), Some(tgap), 0, 1, Some(gap_open_calc), Label::Gap, None);
  m.add_transition(Some(tgap), Some(tgap), 0, 1, Some(gap_extend_calc), Label::Gap, None);
  m.add_transition(Some(tgap), Some(body), 0, 0, None, Label::None, None);

  m.add_transition(Some(body), None, 0, 0, None, Label::None, None);

  let scope = kind.scope();
  m.configure_start_state(scope);
  m.configure_end_state(scope);

  Ok((m.close()?, AffineCalcs { match_calc, gap_open_calc, gap_extend_calc }))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn local_alignment_allows_free_start_anywhere() {
    let (model, _) = build(AffineKind::Local, &super::super::ModelArgs::default()).unwrap();
    assert_eq!(model.start_scope(), Scope::Anywhere);
    assert!(model.start_scope().admits(5, 5, 10, 10));
  }

  #[test]
  fn global_alignment_requires_corner_start_and_end() {
    let (model, _) = build(AffineKind::Global, &super::super::ModelArgs::default()).unwrap();
    assert!(!model.start_scope().admits(5, 5, 10, 10));
    assert!(model.end_scope().admits(10, 10, 10, 10));
  }

  #[test]
  fn gap_states_reach_match_and_back() {
    let (model, _) = build(AffineKind::Overlap, &super::super::ModelArgs::default()).unwrap();
    assert_eq!(model.select_transitions(Label::Gap).len(), 4); // open+extend, both axes
    assert_eq!(model.select_transitions(Label::None).len(), 4); // start/end + two gap-closes
  }
}
