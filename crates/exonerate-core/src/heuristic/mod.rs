//! Heuristic bounds & SAR (spec §4.H): per-match-transition bound matrices
//! built once at model-open time, and the region arithmetic ([`sar`]) that
//! turns an HSP or HSP pair into a DP sub-problem consistent with them.

pub mod bound_matrix;
pub mod sar;

pub use bound_matrix::BoundMatrix;
pub use sar::{SarRegion, Side};

use crate::comparison::Hsp;
use crate::error::Result;
use crate::model::{ClosedC4Model, Scope, StateId, TransitionId};
use crate::scoring::ScoringContext;
use std::collections::HashMap;

/// Terminal, join and span bound matrices for one model, keyed by the
/// match transitions (and, for joins, pairs of them) that HPair's portals
/// actually use.
pub struct Heuristic {
  pub terminal_start: HashMap<TransitionId, BoundMatrix>,
  pub terminal_end: HashMap<TransitionId, BoundMatrix>,
  pub join: HashMap<(TransitionId, TransitionId), BoundMatrix>,
  pub internal: (i64, i64),
  pub external: (i64, i64),
  pub quality_pct: i64,
}

impl Heuristic {
  /// Builds terminal and join bound matrices for every pair of match
  /// transitions the model has, sized `internal + external` on each axis
  /// (spec §4.H: "sized to `(internal+external)_q × (internal+external)_t`").
  pub fn build(
    model: &ClosedC4Model,
    matches: &[TransitionId],
    internal: (i64, i64),
    external: (i64, i64),
    quality_pct: i64,
    ctx: &mut dyn ScoringContext,
  ) -> Result<Heuristic> {
    let qext = internal.0 + external.0;
    let text = internal.1 + external.1;

    let mut terminal_start = HashMap::new();
    let mut terminal_end = HashMap::new();
    for &m in matches {
      let match_state = model.transition(m).input;
      let start_derived = crate::model::DerivedModel::create(model, model.start_state(), match_state, Scope::Corner, Scope::Corner)?;
      terminal_start.insert(m, BoundMatrix::build(&start_derived.model, qext, text, ctx)?);

      let match_out = model.transition(m).output;
      let end_derived = crate::model::DerivedModel::create(model, match_out, model.end_state(), Scope::Corner, Scope::Corner)?;
      terminal_end.insert(m, BoundMatrix::build(&end_derived.model, qext, text, ctx)?);
    }

    let mut join = HashMap::new();
    for &src in matches {
      for &dst in matches {
        let src_out = model.transition(src).output;
        let dst_out = model.transition(dst).output;
        if let Ok(derived) = crate::model::DerivedModel::create(model, src_out, dst_out, Scope::Corner, Scope::Corner) {
          join.insert((src, dst), BoundMatrix::build(&derived.model, qext, text, ctx)?);
        }
      }
    }

    Ok(Heuristic { terminal_start, terminal_end, join, internal, external, quality_pct })
  }

  #[allow(clippy::too_many_arguments)]
  pub fn terminal(
    &self,
    hsp: &Hsp,
    advance_q: i64,
    advance_t: i64,
    half: i64,
    max: i64,
    transition: TransitionId,
    side: Side,
    qlen: i64,
    tlen: i64,
  ) -> Option<SarRegion> {
    let matrix = match side {
      Side::Start => self.terminal_start.get(&transition)?,
      Side::End => self.terminal_end.get(&transition)?,
    };
    sar::terminal_region(hsp, advance_q, advance_t, half, max, side, qlen, tlen, self.internal, self.external, self.quality_pct, matrix)
  }

  #[allow(clippy::too_many_arguments)]
  pub fn join(
    &self,
    src: &Hsp,
    dst: &Hsp,
    advance_q: i64,
    advance_t: i64,
    src_half: i64,
    dst_half: i64,
    src_transition: TransitionId,
    dst_transition: TransitionId,
  ) -> Option<SarRegion> {
    let matrix = self.join.get(&(src_transition, dst_transition))?;
    sar::join_region(src, dst, advance_q, advance_t, src_half, dst_half, self.internal, self.external, matrix)
  }
}

/// A span bound: the same max-region-converted matrix idea, built over the
/// two halves `src_match -> span_state` and `span_state -> dst_match`
/// (spec §4.H). Kept separate from [`Heuristic::join`] since spans price a
/// free interior the join case has none of.
pub struct SpanBound {
  pub entry: BoundMatrix,
  pub exit: BoundMatrix,
}

impl SpanBound {
  pub fn build(
    model: &ClosedC4Model,
    src_match_out: StateId,
    span_state: StateId,
    dst_match_in: StateId,
    qext: i64,
    text: i64,
    ctx: &mut dyn ScoringContext,
  ) -> Result<SpanBound> {
    let entry_derived = crate::model::DerivedModel::create(model, src_match_out, span_state, Scope::Corner, Scope::Corner)?;
    let exit_derived = crate::model::DerivedModel::create(model, span_state, dst_match_in, Scope::Corner, Scope::Corner)?;
    Ok(SpanBound {
      entry: BoundMatrix::build(&entry_derived.model, qext, text, ctx)?,
      exit: BoundMatrix::build(&exit_derived.model, qext, text, ctx)?,
    })
  }
}
