//! `coding2genome` (spec §4.K): `coding2coding`'s codon/frameshift core plus
//! an intron state on the target (genomic) axis, the same splice-site
//! scoring `est2genome` and `protein2genome` use.

use super::coding2coding::{build_core, Coding2codingCalcs, CodingCore};
use crate::error::Result;
use crate::model::{Calc, CalcId, ClosedC4Model, Label, Scope};

#[derive(Debug, Clone, Copy)]
pub struct Coding2genomeCalcs {
  pub coding: Coding2codingCalcs,
  pub five_prime_calc: CalcId,
  pub three_prime_calc: CalcId,
}

/// Adds the intron state (entry/exit splice scoring + bounding span) to a
/// coding core's `body` state, without wiring start/end transitions —
/// `cdna2genome` and `genome2genome` reuse this to hang UTR states off the
/// same coding region instead of wiring straight to start/end.
pub(super) fn add_intron(core: &mut CodingCore, args: &super::ModelArgs) -> (CalcId, CalcId) {
  let m = &mut core.model;
  let five_prime_calc = m.add_calc(Calc::new("five_prime_ss", args.five_prime_ss.max(0), true, false));
  let three_prime_calc = m.add_calc(Calc::new("three_prime_ss", args.three_prime_ss.max(0), true, false));

  let intron = m.add_state();
  m.add_transition(Some(core.body), Some(intron), 0, 1, Some(five_prime_calc), Label::Ss5, None);
  let intron_loop = m.add_transition(Some(intron), Some(intron), 0, 1, None, Label::Intron, None);
  m.add_transition(Some(intron), Some(core.body), 0, 1, Some(three_prime_calc), Label::Ss3, None);
  m.add_span(intron, 0, 0, args.min_intron, args.max_intron, None, Some(intron_loop));

  (five_prime_calc, three_prime_calc)
}

pub fn build(args: &super::ModelArgs) -> Result<(ClosedC4Model, Coding2genomeCalcs)> {
  let mut core = build_core("coding2genome", args);
  let (five_prime_calc, three_prime_calc) = add_intron(&mut core, args);

  core.model.add_transition(None, Some(core.body), 0, 0, None, Label::None, None);
  core.model.add_transition(Some(core.body), None, 0, 0, None, Label::None, None);

  // The coding query must be fully consumed; the genomic target may
  // extend past it on either side.
  core.model.configure_start_state(Scope::Target);
  core.model.configure_end_state(Scope::Target);

  Ok((core.model.close()?, Coding2genomeCalcs { coding: core.calcs, five_prime_calc, three_prime_calc }))
}
