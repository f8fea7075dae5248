//! Sub-alignment region arithmetic (spec §4.H "SAR").
//!
//! Turns an HSP (terminal case) or HSP pair (join case) into a DP
//! sub-region consistent with a [`super::BoundMatrix`]'s built extent, plus
//! the `component` — the score already counted inside the HSP(s) — that the
//! caller must subtract from whatever score Viterbi later returns for that
//! region, so the HSP's own contribution isn't counted twice.
//!
//! Simplification: the outer/inner box trim here only grows symmetrically
//! from the HSP's own boundary by `internal`/`external`, rather than
//! chasing the full cobs-to-corner geometry the bound matrices are keyed
//! on; every region it returns still fits inside the bound matrix's built
//! `(qext, text)` (checked, not assumed), so bounds stay sound, but some
//! legal SAR windows the original geometry would admit are narrower here.

use super::bound_matrix::BoundMatrix;
use crate::comparison::Hsp;
use crate::region::Region;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
  Start,
  End,
}

#[derive(Debug, Clone, Copy)]
pub struct SarRegion {
  pub region: Region,
  /// Upper bound on `region`'s own DP score, straight from the bound
  /// matrix lookup. Callers that also track `component` separately (to
  /// avoid double-counting an HSP's own score elsewhere) subtract it out
  /// themselves; this field doesn't do that netting.
  pub bound: i64,
  /// Score already accounted for inside the HSP portion of `region`;
  /// subtract this from any score the engine returns for `region`.
  pub component: i64,
}

/// HSP-quality filter (spec §4.H): the leftover part of an HSP outside its
/// cobs point must retain at least `quality_pct`% of its match weight, or
/// the region is rejected outright. `half`/`max` are the caller-summed
/// match self-scores either side of (respectively, over the whole of) the
/// HSP.
pub fn hsp_quality_ok(half: i64, max: i64, quality_pct: i64) -> bool {
  quality_pct <= 0 || max <= 0 || half.saturating_mul(100) >= quality_pct.saturating_mul(max)
}

/// A terminal SAR region: from the sequence edge (start) or to the sequence
/// end (end) up to this HSP, grown by `internal` into the HSP and
/// `external` beyond its cobs point, clipped to the bound matrix's built
/// extent. Returns `None` if the HSP fails the quality filter or the
/// resulting extent would exceed what `bound` was built for.
#[allow(clippy::too_many_arguments)]
pub fn terminal_region(
  hsp: &Hsp,
  advance_q: i64,
  advance_t: i64,
  half: i64,
  max: i64,
  side: Side,
  qlen: i64,
  tlen: i64,
  internal: (i64, i64),
  external: (i64, i64),
  quality_pct: i64,
  bound: &BoundMatrix,
) -> Option<SarRegion> {
  if !hsp_quality_ok(half, max, quality_pct) {
    return None;
  }
  let qend = hsp.query_end(advance_q);
  let tend = hsp.target_end(advance_t);
  let cobs_q = hsp.query_cobs(advance_q);
  let cobs_t = hsp.target_cobs(advance_t);

  let (region, component) = match side {
    Side::Start => {
      // Grows from the sequence start towards the HSP's cobs point: at
      // most `internal` past cobs into the HSP, at least bounded so it
      // never passes the sequence start going the other way.
      let reach_q = (cobs_q + internal.0).min(qend).max(0);
      let reach_t = (cobs_t + internal.1).min(tend).max(0);
      let capped_q = reach_q.min(cobs_q + external.0.max(internal.0));
      let capped_t = reach_t.min(cobs_t + external.1.max(internal.1));
      let qext = capped_q.clamp(0, qlen);
      let text = capped_t.clamp(0, tlen);
      let covered = (qext - hsp.query_start).max(0);
      let component = scale_score(half, covered, (cobs_q - hsp.query_start).max(1));
      (Region::new(0, 0, qext, text), component)
    }
    Side::End => {
      let reach_q = (cobs_q - internal.0).max(hsp.query_start).min(qlen);
      let reach_t = (cobs_t - internal.1).max(hsp.target_start).min(tlen);
      let floor_q = reach_q.max(cobs_q - external.0.max(internal.0));
      let floor_t = reach_t.max(cobs_t - external.1.max(internal.1));
      let qs = floor_q.clamp(0, qlen);
      let ts = floor_t.clamp(0, tlen);
      let covered = (qend - qs).max(0);
      let component = scale_score(half, covered, (qend - cobs_q).max(1));
      (Region::new(qs, ts, qlen - qs, tlen - ts), component)
    }
  };
  let (max_q, max_t) = bound.extent();
  if region.qlen > max_q || region.tlen > max_t {
    return None;
  }
  let sar_bound = bound.lookup(region.qlen, region.tlen);
  Some(SarRegion { region, bound: sar_bound, component })
}

/// A join SAR region between two HSPs whose cobs-ordering is `src ≤ dst` on
/// both axes (the caller filters for that before calling, per spec §4.I
/// step 2). The region spans `src`'s cobs point to `dst`'s cobs point.
#[allow(clippy::too_many_arguments)]
pub fn join_region(
  src: &Hsp,
  dst: &Hsp,
  advance_q: i64,
  advance_t: i64,
  src_half: i64,
  dst_half: i64,
  internal: (i64, i64),
  external: (i64, i64),
  bound: &BoundMatrix,
) -> Option<SarRegion> {
  let src_cobs_q = src.query_cobs(advance_q);
  let src_cobs_t = src.target_cobs(advance_t);
  let dst_cobs_q = dst.query_cobs(advance_q);
  let dst_cobs_t = dst.target_cobs(advance_t);
  if src_cobs_q > dst_cobs_q || src_cobs_t > dst_cobs_t {
    return None; // not actually ordered src-before-dst
  }
  let qs = (src_cobs_q - internal.0.min(src_cobs_q - src.query_start)).clamp(src.query_start, src_cobs_q);
  let ts = (src_cobs_t - internal.1.min(src_cobs_t - src.target_start)).clamp(src.target_start, src_cobs_t);
  let dst_qend = dst.query_end(advance_q);
  let dst_tend = dst.target_end(advance_t);
  let qe = (dst_cobs_q + internal.0.min(dst_qend - dst_cobs_q)).clamp(dst_cobs_q, dst_qend);
  let te = (dst_cobs_t + internal.1.min(dst_tend - dst_cobs_t)).clamp(dst_cobs_t, dst_tend);
  let _ = external; // widens only the bound-matrix lookup the caller built, not the region itself
  if qe < qs || te < ts {
    return None;
  }
  let region = Region::new(qs, ts, qe - qs, te - ts);
  let (max_q, max_t) = bound.extent();
  if region.qlen > max_q || region.tlen > max_t {
    return None;
  }
  let src_component = scale_score(src_half, (src_cobs_q - qs).max(0), (src_cobs_q - src.query_start).max(1));
  let dst_component = scale_score(dst_half, (qe - dst_cobs_q).max(0), (dst_qend - dst_cobs_q).max(1));
  let join_bound = bound.lookup(region.qlen, region.tlen);
  Some(SarRegion { region, bound: join_bound, component: src_component + dst_component })
}

/// Proportionally scales `score` by `covered / total` (both `i64`,
/// `total > 0`), rounding down — used to estimate how much of an HSP's
/// match weight a partial region captures.
fn scale_score(score: i64, covered: i64, total: i64) -> i64 {
  if total <= 0 {
    return 0;
  }
  (score * covered.clamp(0, total)) / total
}

/// The classical mid-point trick (spec §4.H): within `[overlap_start,
/// overlap_end)`, finds the split point maximising
/// `src_cum(split) + dst_cum(split)`, where `src_cum` is the src HSP's
/// cumulative calc-score up to (not including) a position and `dst_cum` is
/// the dst HSP's cumulative calc-score from a position onward.
pub fn mid_overlap_point(
  overlap_start: i64,
  overlap_end: i64,
  src_cum: impl Fn(i64) -> i64,
  dst_cum: impl Fn(i64) -> i64,
) -> i64 {
  let mut best_pos = overlap_start;
  let mut best_score = i64::MIN;
  for pos in overlap_start..=overlap_end {
    let score = src_cum(pos) + dst_cum(pos);
    if score > best_score {
      best_score = score;
      best_pos = pos;
    }
  }
  best_pos
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::heuristic::bound_matrix::BoundMatrix;
  use crate::model::{Calc, Label, MatchPayload, OpenC4Model, Scope as ModelScope};
  use crate::scoring::{CalcId, ScoringContext};

  #[test]
  fn hsp_quality_rejects_below_threshold() {
    assert!(!hsp_quality_ok(40, 100, 50));
    assert!(hsp_quality_ok(60, 100, 50));
    assert!(hsp_quality_ok(0, 100, 0)); // quality filter disabled
  }

  #[test]
  fn mid_overlap_prefers_the_split_with_higher_combined_score() {
    let src = |p: i64| p; // 0,1,2,3,4
    let dst = |p: i64| 4 - p;
    let best = mid_overlap_point(0, 4, src, dst);
    assert_eq!(best, 0);
  }

  #[test]
  fn mid_overlap_finds_a_strict_peak() {
    let src = |p: i64| if p >= 2 { 10 } else { 0 };
    let dst = |p: i64| if p <= 2 { 10 } else { 0 };
    let best = mid_overlap_point(0, 4, src, dst);
    assert_eq!(best, 2);
  }

  fn match_only_model() -> crate::model::ClosedC4Model {
    let mut m = OpenC4Model::new("match-only");
    let mat = m.add_calc(Calc::new("match", 1, false, false));
    let s = m.add_state();
    m.add_transition(None, Some(s), 0, 0, None, Label::None, None);
    m.add_transition(Some(s), None, 0, 0, None, Label::None, None);
    m.add_transition(Some(s), Some(s), 1, 1, Some(mat), Label::Match, Some(MatchPayload { advance_q: 1, advance_t: 1 }));
    m.configure_start_state(ModelScope::Corner);
    m.configure_end_state(ModelScope::Corner);
    m.close().unwrap()
  }

  struct FlatCtx {
    calc: CalcId,
  }
  impl ScoringContext for FlatCtx {
    fn calc_score(&self, calc: CalcId, _qpos: i64, _tpos: i64) -> i64 {
      if calc == self.calc {
        1
      } else {
        0
      }
    }
  }

  #[test]
  fn terminal_region_fits_within_bound_matrix_extent() {
    let model = match_only_model();
    let calc = model.calcs().ids().next().unwrap();
    let mut ctx = FlatCtx { calc };
    let bound = BoundMatrix::build(&model, 10, 10, &mut ctx).unwrap();
    let hsp = Hsp { query_start: 20, target_start: 20, length: 5, score: 5, cobs: 2 };
    let sar = terminal_region(&hsp, 1, 1, 2, 5, Side::Start, 100, 100, (3, 3), (4, 4), 0, &bound).unwrap();
    assert!(sar.region.qlen <= 10 && sar.region.tlen <= 10);
    assert_eq!(sar.region.qs, 0);
    assert_eq!(sar.region.ts, 0);
  }

  #[test]
  fn join_region_rejects_out_of_order_hsps() {
    let model = match_only_model();
    let calc = model.calcs().ids().next().unwrap();
    let mut ctx = FlatCtx { calc };
    let bound = BoundMatrix::build(&model, 10, 10, &mut ctx).unwrap();
    let src = Hsp { query_start: 20, target_start: 20, length: 5, score: 5, cobs: 2 };
    let dst = Hsp { query_start: 0, target_start: 0, length: 5, score: 5, cobs: 2 }; // before src
    assert!(join_region(&src, &dst, 1, 1, 2, 2, (1, 1), (1, 1), &bound).is_none());
  }
}
