//! `cdna2genome` (spec §4.K): `coding2genome`'s intron-bearing codon core,
//! wrapped in a pair of UTR states so a full-length cDNA query (UTR +
//! coding region + UTR) aligns against genomic target, with the UTRs
//! matched plainly (`insert`, spec's term for a non-codon sub-model spliced
//! in at the sequence ends) rather than at codon granularity.

use super::coding2coding::build_core;
use super::coding2genome::add_intron;
use crate::error::Result;
use crate::model::{Calc, CalcId, ClosedC4Model, Label, MatchPayload, Scope};

#[derive(Debug, Clone, Copy)]
pub struct Cdna2genomeCalcs {
  pub coding: super::coding2coding::Coding2codingCalcs,
  pub five_prime_calc: CalcId,
  pub three_prime_calc: CalcId,
  pub utr_calc: CalcId,
}

pub fn build(args: &super::ModelArgs) -> Result<(ClosedC4Model, Cdna2genomeCalcs)> {
  let mut core = build_core("cdna2genome", args);
  let (five_prime_calc, three_prime_calc) = add_intron(&mut core, args);
  let utr_calc = core.model.add_calc(Calc::new("utr_match", 0, false, false));

  let m = &mut core.model;
  let utr5 = m.add_state();
  let utr3 = m.add_state();

  m.add_transition(None, Some(utr5), 0, 0, None, Label::None, None);
  m.add_transition(Some(utr5), Some(utr5), 1, 1, Some(utr_calc), Label::Match, Some(MatchPayload { advance_q: 1, advance_t: 1 }));
  m.add_transition(Some(utr5), Some(core.body), 0, 0, None, Label::None, None);

  m.add_transition(Some(core.body), Some(utr3), 0, 0, None, Label::None, None);
  m.add_transition(Some(utr3), Some(utr3), 1, 1, Some(utr_calc), Label::Match, Some(MatchPayload { advance_q: 1, advance_t: 1 }));
  m.add_transition(Some(utr3), None, 0, 0, None, Label::None, None);

  // The cDNA query (UTR + coding + UTR) is consumed fully; the genome may
  // extend on either side.
  m.configure_start_state(Scope::Target);
  m.configure_end_state(Scope::Target);

  Ok((core.model.close()?, Cdna2genomeCalcs { coding: core.calcs, five_prime_calc, three_prime_calc, utr_calc }))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn utr_states_flank_the_coding_core_with_their_own_calc() {
    let (model, calcs) = build(&super::super::ModelArgs::default()).unwrap();
    let matches = model.select_transitions(Label::Match);
    // one codon match (3,3) from the coding core, two (1,1) UTR matches
    assert_eq!(matches.len(), 3);
    let utr_matches: Vec<_> = matches.iter().filter(|&&t| model.transition(t).calc == Some(calcs.utr_calc)).collect();
    assert_eq!(utr_matches.len(), 2);
  }
}
