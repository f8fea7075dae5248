//! `genome2genome` (spec §4.K): the coding core with introns on *both*
//! sides — query and target are both genomic, so either may splice. The
//! query-side intron mirrors the target-side one from `coding2genome`,
//! consuming the query axis instead of the target axis, with its own span.

use super::coding2coding::build_core;
use super::coding2genome::add_intron;
use crate::error::Result;
use crate::model::{Calc, CalcId, ClosedC4Model, Label, Scope};

#[derive(Debug, Clone, Copy)]
pub struct Genome2genomeCalcs {
  pub coding: super::coding2coding::Coding2codingCalcs,
  pub target_five_prime_calc: CalcId,
  pub target_three_prime_calc: CalcId,
  pub query_five_prime_calc: CalcId,
  pub query_three_prime_calc: CalcId,
}

pub fn build(args: &super::ModelArgs) -> Result<(ClosedC4Model, Genome2genomeCalcs)> {
  let mut core = build_core("genome2genome", args);
  let (target_five_prime_calc, target_three_prime_calc) = add_intron(&mut core, args);

  let m = &mut core.model;
  let query_five_prime_calc = m.add_calc(Calc::new("query_five_prime_ss", args.five_prime_ss.max(0), true, false));
  let query_three_prime_calc = m.add_calc(Calc::new("query_three_prime_ss", args.three_prime_ss.max(0), true, false));

  let query_intron = m.add_state();
  m.add_transition(Some(core.body), Some(query_intron), 1, 0, Some(query_five_prime_calc), Label::Ss5, None);
  let query_intron_loop = m.add_transition(Some(query_intron), Some(query_intron), 1, 0, None, Label::Intron, None);
  m.add_transition(Some(query_intron), Some(core.body), 1, 0, Some(query_three_prime_calc), Label::Ss3, None);
  m.add_span(query_intron, args.min_intron, args.max_intron, 0, 0, Some(query_intron_loop), None);

  m.add_transition(None, Some(core.body), 0, 0, None, Label::None, None);
  m.add_transition(Some(core.body), None, 0, 0, None, Label::None, None);

  m.configure_start_state(Scope::Corner);
  m.configure_end_state(Scope::Corner);

  Ok((
    core.model.close()?,
    Genome2genomeCalcs {
      coding: core.calcs,
      target_five_prime_calc,
      target_three_prime_calc,
      query_five_prime_calc,
      query_three_prime_calc,
    },
  ))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn declares_an_intron_span_on_each_axis() {
    let (model, _) = build(&super::super::ModelArgs::default()).unwrap();
    assert_eq!(model.spans().len(), 2);
    let query_span = model.spans().iter().map(|(_, s)| s).find(|s| s.min_q > 0).unwrap();
    let target_span = model.spans().iter().map(|(_, s)| s).find(|s| s.min_t > 0).unwrap();
    assert_eq!(query_span.min_q, 30);
    assert_eq!(target_span.min_t, 30);
  }
}
