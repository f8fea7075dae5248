//! `ungapped` / `ungapped:trans` (spec §4.K): the simplest model in the
//! library — one state, one match transition, no gaps. `translated` selects
//! the `(1, 3)` codon-to-amino-acid advance used by `ungapped:trans`
//! instead of the plain `(1, 1)` nucleotide/protein advance.

use crate::error::Result;
use crate::model::{Calc, ClosedC4Model, Label, MatchPayload, OpenC4Model, Scope};

#[derive(Debug, Clone, Copy)]
pub struct UngappedCalcs {
  pub match_calc: crate::model::CalcId,
}

pub fn build(translated: bool) -> Result<(ClosedC4Model, UngappedCalcs)> {
  let mut m = OpenC4Model::new(if translated { "ungapped:trans" } else { "ungapped" });
  let match_calc = m.add_calc(Calc::new("match", 0, false, false));
  let body = m.add_state();
  let (advance_q, advance_t) = if translated { (1, 3) } else { (1, 1) };

  m.add_transition(None, Some(body), 0, 0, None, Label::None, None);
  m.add_transition(Some(body), Some(body), advance_q, advance_t, Some(match_calc), Label::Match, Some(MatchPayload { advance_q, advance_t }));
  m.add_transition(Some(body), None, 0, 0, None, Label::None, None);

  // No gaps, so a path's start/end can only be the rectangle's corners.
  m.configure_start_state(Scope::Corner);
  m.configure_end_state(Scope::Corner);

  Ok((m.close()?, UngappedCalcs { match_calc }))
}
