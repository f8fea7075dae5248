//! `ner` (spec §4.K): affine plus a non-equivalenced-region state — a
//! region where query and target advance together but are not claimed to
//! match, priced at a flat per-position penalty instead of the
//! substitution score.

use crate::error::Result;
use crate::model::{Calc, ClosedC4Model, Label, MatchPayload, OpenC4Model, Scope};

#[derive(Debug, Clone, Copy)]
pub struct NerCalcs {
  pub match_calc: crate::model::CalcId,
  pub gap_open_calc: crate::model::CalcId,
  pub gap_extend_calc: crate::model::CalcId,
  pub ner_calc: crate::model::CalcId,
}

pub fn build(args: &super::ModelArgs) -> Result<(ClosedC4Model, NerCalcs)> {
  let mut m = OpenC4Model::new("ner");
  let match_calc = m.add_calc(Calc::new("match", 0, false, false));
  let gap_open_calc = m.add_calc(Calc::new("gap_open", args.gap_open.max(0), false, true));
  let gap_extend_calc = m.add_calc(Calc::new("gap_extend", args.gap_extend.max(0), false, true));
  let ner_calc = m.add_calc(Calc::new("ner", args.ner_penalty.max(0), false, true));

  let body = m.add_state();
  let qgap = m.add_state();
  let tgap = m.add_state();
  let ner = m.add_state();

  m.add_transition(None, Some(body), 0, 0, None, Label::None, None);
  m.add_transition(Some(body), Some(body), 1, 1, Some(match_calc), Label::Match, Some(MatchPayload { advance_q: 1, advance_t: 1 }));

  m.add_transition(Some(body), Some(qgap), 1, 0, Some(gap_open_calc), Label::Gap, None);
  m.add_transition(Some(qgap), Some(qgap), 1, 0, Some(gap_extend_calc), Label::Gap, None);
  m.add_transition(Some(qgap), Some(body), 0, 0, None, Label::None, None);

  m.add_transition(Some(body), Some(tgap), 0, 1, Some(gap_open_calc), Label::Gap, None);
  m.add_transition(Some(tgap), Some(tgap), 0, 1, Some(gap_extend_calc), Label::Gap, None);
  m.add_transition(Some(tgap), Some(body), 0, 0, None, Label::None, None);

  m.add_transition(Some(body), Some(ner), 0, 0, None, Label::None, None);
  m.add_transition(Some(ner), Some(ner), 1, 1, Some(ner_calc), Label::Ner, None);
  m.add_transition(Some(ner), Some(body), 0, 0, None, Label::None, None);

  m.add_transition(Some(body), None, 0, 0, None, Label::None, None);

  m.configure_start_state(Scope::Corner);
  m.configure_end_state(Scope::Corner);

  Ok((m.close()?, NerCalcs { match_calc, gap_open_calc, gap_extend_calc, ner_calc }))
}
