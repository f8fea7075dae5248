//! `est2genome` (spec §4.K): affine plus a single intron state. Entering
//! the intron scores a five-prime splice site, the interior loops free
//! (consuming target only), and leaving scores a three-prime splice site.
//! A [`crate::model::Span`] bounds the intron's target-axis length to
//! `min_intron..max_intron`. DNA×DNA only.

use crate::error::Result;
use crate::model::{Calc, ClosedC4Model, Label, MatchPayload, OpenC4Model, Scope};

#[derive(Debug, Clone, Copy)]
pub struct Est2genomeCalcs {
  pub match_calc: crate::model::CalcId,
  pub gap_open_calc: crate::model::CalcId,
  pub gap_extend_calc: crate::model::CalcId,
  pub five_prime_calc: crate::model::CalcId,
  pub three_prime_calc: crate::model::CalcId,
}

pub fn build(args: &super::ModelArgs) -> Result<(ClosedC4Model, Est2genomeCalcs)> {
  let mut m = OpenC4Model::new("est2genome");
  let match_calc = m.add_calc(Calc::new("match", 0, false, false));
  let gap_open_calc = m.add_calc(Calc::new("gap_open", args.gap_open.max(0), false, true));
  let gap_extend_calc = m.add_calc(Calc::new("gap_extend", args.gap_extend.max(0), false, true));
  let five_prime_calc = m.add_calc(Calc::new("five_prime_ss", args.five_prime_ss.max(0), true, false));
  let three_prime_calc = m.add_calc(Calc::new("three_prime_ss", args.three_prime_ss.max(0), true, false));

  let body = m.add_state();
  let qgap = m.add_state();
  let tgap = m.add_state();
  let intron = m.add_state();

  m.add_transition(None, Some(body), 0, 0, None, Label::None, None);
  m.add_transition(Some(body), Some(body), 1, 1, Some(match_calc), Label::Match, Some(MatchPayload { advance_q: 1, advance_t: 1 }));

  m.add_transition(Some(body), Some(qgap), 1, 0, Some(gap_open_calc), Label::Gap, None);
  m.add_transition(Some(qgap), Some(qgap), 1, 0, Some(gap_extend_calc), Label::Gap, None);
  m.add_transition(Some(qgap), Some(body), 0, 0, None, Label::None, None);

  m.add_transition(Some(body), Some(tgap), 0, 1, Some(gap_open_calc), Label::Gap, None);
  m.add_transition(Some(tgap), Some(tgap), 0, 1, Some(gap_extend_calc), Label::Gap, None);
  m.add_transition(Some(tgap), Some(body), 0, 0, None, Label::None, None);

  m.add_transition(Some(body), Some(intron), 0, 1, Some(five_prime_calc), Label::Ss5, None);
  let intron_loop = m.add_transition(Some(intron), Some(intron), 0, 1, None, Label::Intron, None);
  m.add_transition(Some(intron), Some(body), 0, 1, Some(three_prime_calc), Label::Ss3, None);

  m.add_transition(Some(body), None, 0, 0, None, Label::None, None);

  m.add_span(intron, 0, 0, args.min_intron, args.max_intron, None, Some(intron_loop));

  // An EST may match only part of the genomic sequence (free ends on the
  // target axis), but the query (EST) must be fully consumed.
  m.configure_start_state(Scope::Target);
  m.configure_end_state(Scope::Target);

  Ok((m.close()?, Est2genomeCalcs { match_calc, gap_open_calc, gap_extend_calc, five_prime_calc, three_prime_calc }))
}
