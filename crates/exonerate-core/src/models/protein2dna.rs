//! `protein2dna` / `protein2dna:bestfit` (spec §4.K): match is
//! codon-to-amino-acid (`advance_q = 1, advance_t = 3`). A frameshift
//! helper state lets a path absorb a 1- or 2-base insertion/deletion in the
//! DNA sequence and resume in frame: `body` enters either of two
//! frameshift states via a `(0, 1)` or `(0, 2)` transition (scored), and
//! each can return to `body` either immediately (`(0, 0)`, the shift was
//! the whole recovery) or after one more shifted codon (`(0, 3)`).

use crate::error::Result;
use crate::model::{Calc, ClosedC4Model, Label, MatchPayload, OpenC4Model, Scope};

#[derive(Debug, Clone, Copy)]
pub struct Protein2dnaCalcs {
  pub match_calc: crate::model::CalcId,
  pub gap_open_calc: crate::model::CalcId,
  pub gap_extend_calc: crate::model::CalcId,
  pub frameshift_calc: crate::model::CalcId,
}

pub fn build(args: &super::ModelArgs, bestfit: bool) -> Result<(ClosedC4Model, Protein2dnaCalcs)> {
  let mut m = OpenC4Model::new(if bestfit { "protein2dna:bestfit" } else { "protein2dna" });
  let match_calc = m.add_calc(Calc::new("match", 0, false, false));
  let gap_open_calc = m.add_calc(Calc::new("gap_open", args.gap_open.max(0), false, true));
  let gap_extend_calc = m.add_calc(Calc::new("gap_extend", args.gap_extend.max(0), false, true));
  let frameshift_calc = m.add_calc(Calc::new("frameshift", args.frameshift_penalty.max(0), false, true));

  let body = m.add_state();
  let qgap = m.add_state();
  let tgap = m.add_state();
  let fs1 = m.add_state();
  let fs2 = m.add_state();

  m.add_transition(None, Some(body), 0, 0, None, Label::None, None);
  m.add_transition(Some(body), Some(body), 1, 3, Some(match_calc), Label::Match, Some(MatchPayload { advance_q: 1, advance_t: 3 }));

  m.add_transition(Some(body), Some(qgap), 1, 0, Some(gap_open_calc), Label::Gap, None);
  m.add_transition(Some(qgap), Some(qgap), 1, 0, Some(gap_extend_calc), Label::Gap, None);
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

  m.add_transition(Some(body), None, 0, 0, None, Label::None, None);

  // The protein is fully consumed; the DNA (target) may run past it on
  // either side. `bestfit` additionally allows the protein itself to be
  // only partially matched — modelled the same way here since both cases
  // need the target axis free; the distinction is in scoring, not scope.
  let scope = if bestfit { Scope::Anywhere } else { Scope::Target };
  m.configure_start_state(scope);
  m.configure_end_state(scope);

  Ok((m.close()?, Protein2dnaCalcs { match_calc, gap_open_calc, gap_extend_calc, frameshift_calc }))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn match_transition_advances_one_codon() {
    let (model, calcs) = build(&super::super::ModelArgs::default(), false).unwrap();
    let t = model.select_transitions(Label::Match);
    assert_eq!(t.len(), 1);
    let transition = model.transition(t[0]);
    assert_eq!((transition.advance_q, transition.advance_t), (1, 3));
    assert_eq!(transition.calc, Some(calcs.match_calc));
  }

  #[test]
  fn frameshift_states_recover_immediately_or_after_one_more_codon() {
    let (model, _) = build(&super::super::ModelArgs::default(), false).unwrap();
    let entries = model.select_transitions(Label::Frameshift);
    assert_eq!(entries.len(), 2);
    let advances: Vec<_> = entries.iter().map(|&id| model.transition(id).advance_t).collect();
    assert!(advances.contains(&1) && advances.contains(&2));
  }
}
