//! `protein2genome` / `protein2genome:bestfit` (spec §4.K): `protein2dna`'s
//! codon-match and frameshift skeleton, plus an intron state on the target
//! (genomic) axis so frame-preserving splice sites can appear between
//! codons, the same way `est2genome` adds introns to the plain affine
//! skeleton.

use crate::error::Result;
use crate::model::{Calc, ClosedC4Model, Label, MatchPayload, OpenC4Model, Scope};

#[derive(Debug, Clone, Copy)]
pub struct Protein2genomeCalcs {
  pub match_calc: crate::model::CalcId,
  pub gap_open_calc: crate::model::CalcId,
  pub gap_extend_calc: crate::model::CalcId,
  pub frameshift_calc: crate::model::CalcId,
  pub five_prime_calc: crate::model::CalcId,
  pub three_prime_calc: crate::model::CalcId,
}

pub fn build(args: &super::ModelArgs, bestfit: bool) -> Result<(ClosedC4Model, Protein2genomeCalcs)> {
  let mut m = OpenC4Model::new(if bestfit { "protein2genome:bestfit" } else { "protein2genome" });
  let match_calc = m.add_calc(Calc::new("match", 0, false, false));
  let gap_open_calc = m.add_calc(Calc::new("gap_open", args.gap_open.max(0), false, true));
  let gap_extend_calc = m.add_calc(Calc::new("gap_extend", args.gap_extend.max(0), false, true));
  let frameshift_calc = m.add_calc(Calc::new("frameshift", args.frameshift_penalty.max(0), false, true));
  let five_prime_calc = m.add_calc(Calc::new("five_prime_ss", args.five_prime_ss.max(0), true, false));
  let three_prime_calc = m.add_calc(Calc::new("three_prime_ss", args.three_prime_ss.max(0), true, false));

  let body = m.add_state();
  let qgap = m.add_state();
  let tgap = m.add_state();
  let fs1 = m.add_state();
  let fs2 = m.add_state();
  let intron = m.add_state();

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

  m.add_transition(Some(body), Some(intron), 0, 1, Some(five_prime_calc), Label::Ss5, None);
  let intron_loop = m.add_transition(Some(intron), Some(intron), 0, 1, None, Label::Intron, None);
  m.add_transition(Some(intron), Some(body), 0, 1, Some(three_prime_calc), Label::Ss3, None);

  m.add_transition(Some(body), None, 0, 0, None, Label::None, None);

  m.add_span(intron, 0, 0, args.min_intron, args.max_intron, None, Some(intron_loop));

  let scope = if bestfit { Scope::Anywhere } else { Scope::Target };
  m.configure_start_state(scope);
  m.configure_end_state(scope);

  Ok((
    m.close()?,
    Protein2genomeCalcs { match_calc, gap_open_calc, gap_extend_calc, frameshift_calc, five_prime_calc, three_prime_calc },
  ))
}
