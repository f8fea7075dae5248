//! `coding2coding` (spec §4.K): the codon skeleton from `protein2dna`
//! generalised to DNA×DNA — both sequences are coding, so the match
//! advances `(3, 3)` and frameshift recovery is offered on the target axis
//! only (a simplification: the original also allows query-side
//! frameshifts, rare in practice since the query is usually the better-
//! assembled sequence; see `DESIGN.md`).

use crate::error::Result;
use crate::model::{Calc, ClosedC4Model, Label, MatchPayload, OpenC4Model, Scope};

#[derive(Debug, Clone, Copy)]
pub struct Coding2codingCalcs {
  pub match_calc: crate::model::CalcId,
  pub gap_open_calc: crate::model::CalcId,
  pub gap_extend_calc: crate::model::CalcId,
  pub frameshift_calc: crate::model::CalcId,
}

/// Builds the shared codon-match + frameshift core used by `coding2coding`,
/// `coding2genome`, `cdna2genome` and `genome2genome`. Returns the open
/// model (not yet closed) plus the states/calcs later builders hang
/// introns or UTR states off of.
pub(super) struct CodingCore {
  pub model: OpenC4Model,
  pub body: crate::model::StateId,
  pub calcs: Coding2codingCalcs,
}

pub(super) fn build_core(name: &str, args: &super::ModelArgs) -> CodingCore {
  let mut m = OpenC4Model::new(name);
  let match_calc = m.add_calc(Calc::new("match", 0, false, false));
  let gap_open_calc = m.add_calc(Calc::new("gap_open", args.gap_open.max(0), false, true));
  let gap_extend_calc = m.add_calc(Calc::new("gap_extend", args.gap_extend.max(0), false, true));
  let frameshift_calc = m.add_calc(Calc::new("frameshift", args.frameshift_penalty.max(0), false, true));

  let body = m.add_state();
  let qgap = m.add_state();
  let tgap = m.add_state();
  let fs1 = m.add_state();
  let fs2 = m.add_state();

  m.add_transition(Some(body), Some(body), 3, 3, Some(match_calc), Label::Match, Some(MatchPayload { advance_q: 3, advance_t: 3 }));

  m.add_transition(Some(body), Some(qgap), 3, 0, Some(gap_open_calc), Label::Gap, None);
  m.add_transition(Some(qgap), Some(qgap), 3, 0, Some(gap_extend_calc), Label::Gap, None);
  m.add_transition(Some(qgap), Some(body), 0, 0, None, Label::None, None);

  m.add_transition(Some(body), Some(tgap), 0, 3, Some(gap_open_calc), Label::Gap, None);
  m.add_transition(Some(tgap), Some(tgap), 0, 3, Some(gap_extend_calc), Label::Gap, None);
  m.add_transition(Some(tgap), Some(body), 0, 0, None, Label::None, None);

  m.add_transition(Some(body), Some(fs1), 0, 1, Some(frameshift_calc), Label::Frameshift, None);
  m.add_transition(Some(fs1), Some(body), 0, 0, None, Label::None, None);
  m.add_transition(Some(fs1), Some(body), 0, 3, None, Label::None, None);

  m.add_transition(Some(body), Some(fs2), 0, 2, Some(frameshift_calc), Label::Frameshift, None);
  m.add_transition(Some(fs2), Some(body), 0, 0, None, Label::None, None);
  m.add_transition(Some(fs2), Some(body), 0, 3, None, Label::None, None);

  CodingCore { model: m, body, calcs: Coding2codingCalcs { match_calc, gap_open_calc, gap_extend_calc, frameshift_calc } }
}

pub fn build(args: &super::ModelArgs) -> Result<(ClosedC4Model, Coding2codingCalcs)> {
  let mut core = build_core("coding2coding", args);
  core.model.add_transition(None, Some(core.body), 0, 0, None, Label::None, None);
  core.model.add_transition(Some(core.body), None, 0, 0, None, Label::None, None);
  core.model.configure_start_state(Scope::Corner);
  core.model.configure_end_state(Scope::Corner);
  Ok((core.model.close()?, core.calcs))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn match_transition_advances_one_codon_each_side() {
    let (model, calcs) = build(&super::super::ModelArgs::default()).unwrap();
    let t = model.transition(model.select_transitions(Label::Match)[0]);
    assert_eq!((t.advance_q, t.advance_t), (3, 3));
    assert_eq!(t.calc, Some(calcs.match_calc));
  }
}
