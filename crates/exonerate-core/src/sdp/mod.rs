//! Seeded DP (spec §4.F): Viterbi restricted to cells reachable from a seed
//! and within a score dropoff of the best seen so far. Forward and reverse
//! schedulers are the same generic walk over [`Direction`] rather than two
//! bespoke loops (spec §9 "Codegen and macros").

pub mod boundary;
pub mod lookahead;
pub mod span_history;
pub mod straceback;

use crate::alignment::Alignment;
use crate::arena::Id;
use crate::error::{EngineError, Result};
use crate::model::{ClosedC4Model, Label, TransitionId};
use crate::region::{Region, SubOptIndex};
use crate::scoring::{add_scores, ScoringContext, IMPOSSIBLY_LOW};
use boundary::{Boundary, Run};
use span_history::SparseCache;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::rc::Rc;

pub enum SeedMarker {}
pub type SeedId = Id<SeedMarker>;

#[derive(Debug, Clone, Copy)]
pub struct Seed {
  pub id: SeedId,
  pub qpos: i64,
  pub tpos: i64,
  pub state: usize,
  pub score: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  /// Plants seeds at HSP start positions, propagates to increasing (qpos,
  /// tpos).
  Forward,
  /// Plants seeds at HSP end positions, propagates to decreasing (qpos,
  /// tpos) — the symmetric walk traceback needs.
  Reverse,
}

struct Candidate {
  score: i64,
  qpos: i64,
  tpos: i64,
  state: usize,
  seed: SeedId,
  /// The full chain of operations taken to reach this cell, `None` at a
  /// seed cell itself.
  chain: Option<Rc<straceback::TracebackCell>>,
}

impl PartialEq for Candidate {
  fn eq(&self, other: &Self) -> bool {
    self.score == other.score
  }
}
impl Eq for Candidate {}
impl PartialOrd for Candidate {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}
impl Ord for Candidate {
  fn cmp(&self, other: &Self) -> Ordering {
    self.score.cmp(&other.score)
  }
}

/// The winning cell at each sink (an `end_scope`-admitting cell for
/// `Forward`, a `start_scope`-admitting cell for `Reverse`), plus the
/// reconstructed alignment.
pub struct SdpResult {
  pub score: i64,
  pub seed: SeedId,
  pub alignment: Alignment,
}

pub struct Sdp;

impl Sdp {
  /// Runs one scheduler pass over `region`, seeded at `seeds`, discarding
  /// any frontier cell that falls more than `dropoff` below the best score
  /// seen so far (spec §4.F: "within a score dropoff of the best seen so
  /// far").
  pub fn run(
    model: &std::sync::Arc<ClosedC4Model>,
    region: &Region,
    seeds: &[Seed],
    direction: Direction,
    dropoff: i64,
    ctx: &mut dyn ScoringContext,
    mut subopt: Option<&mut SubOptIndex>,
  ) -> Result<SdpResult> {
    if seeds.is_empty() {
      return Err(EngineError::InvalidArgument("SDP requires at least one seed".to_string()));
    }
    let n_states = model.states().len();

    // Group transitions by the state the walk is leaving, in the walk's own
    // direction: forward groups by source state, reverse by destination
    // state (walking a transition backward).
    let mut by_leave: Vec<Vec<TransitionId>> = vec![Vec::new(); n_states];
    for (tid, t) in model.transitions().iter() {
      match direction {
        Direction::Forward => by_leave[t.input.index()].push(tid),
        Direction::Reverse => by_leave[t.output.index()].push(tid),
      }
    }

    let mut best: HashMap<(i64, i64, usize), (i64, SeedId, Option<Rc<straceback::TracebackCell>>)> = HashMap::new();
    let mut heap: BinaryHeap<Candidate> = BinaryHeap::new();
    let mut row_boundaries: HashMap<i64, Boundary> = HashMap::new();
    let mut span_cache = SparseCache::new();
    let mut best_seen = IMPOSSIBLY_LOW;

    for seed in seeds {
      let key = (seed.qpos, seed.tpos, seed.state);
      if best.get(&key).map_or(true, |(s, _, _)| seed.score > *s) {
        best.insert(key, (seed.score, seed.id, None));
      }
      heap.push(Candidate { score: seed.score, qpos: seed.qpos, tpos: seed.tpos, state: seed.state, seed: seed.id, chain: None });
      best_seen = best_seen.max(seed.score);
    }

    let sink_state = match direction {
      Direction::Forward => model.end_state().index(),
      Direction::Reverse => model.start_state().index(),
    };
    let mut sink: Option<(i64, i64, i64, usize, SeedId)> = None; // score, qpos, tpos, state, seed

    while let Some(cand) = heap.pop() {
      if cand.score < best_seen.saturating_sub(dropoff) {
        continue; // fell out of the dropoff window, prune
      }
      let key = (cand.qpos, cand.tpos, cand.state);
      match best.get(&key) {
        Some((s, seed, _)) if *s == cand.score && *seed == cand.seed => {}
        _ => continue, // stale entry, a better one already won this cell
      }
      best_seen = best_seen.max(cand.score);

      row_boundaries.entry(cand.tpos).or_default().insert(Run { qstart: cand.qpos, qend: cand.qpos + 1, seed: cand.seed });
      for span in model.spans().iter().filter(|(_, sp)| sp.span_state.index() == cand.state) {
        span_cache.record(span.0, cand.qpos, cand.tpos, cand.score);
      }

      let admits_sink = cand.state == sink_state
        && match direction {
          Direction::Forward => model.end_scope().admits(cand.qpos - region.qs, cand.tpos - region.ts, region.qlen, region.tlen),
          Direction::Reverse => model.start_scope().admits(cand.qpos - region.qs, cand.tpos - region.ts, region.qlen, region.tlen),
        };
      if admits_sink {
        let is_better = sink.map_or(true, |(s, ..)| cand.score > s);
        if is_better {
          sink = Some((cand.score, cand.qpos, cand.tpos, cand.state, cand.seed));
        }
      }

      for &tid in &by_leave[cand.state] {
        let t = model.transition(tid);
        let (dq, dt, dest_state) = match direction {
          Direction::Forward => (t.advance_q, t.advance_t, t.output.index()),
          Direction::Reverse => (-t.advance_q, -t.advance_t, t.input.index()),
        };
        let nq = cand.qpos + dq;
        let nt = cand.tpos + dt;
        if nq < region.qs || nt < region.ts || nq > region.qend() || nt > region.tend() {
          continue;
        }
        if t.label == Label::Match {
          if let Some(idx) = subopt.as_deref_mut() {
            idx.set_row(nt - region.ts);
            if idx.is_blocked(nq - region.qs) {
              continue;
            }
          }
        }
        let calc_score = t.calc.map_or(0, |c| ctx.calc_score(c, nq, nt));
        let candidate_score = add_scores(cand.score, calc_score);
        if candidate_score <= IMPOSSIBLY_LOW {
          continue;
        }
        let next_key = (nq, nt, dest_state);
        let improves = best.get(&next_key).map_or(true, |(s, _, _)| candidate_score > *s);
        if improves {
          let next_chain = Some(straceback::push(cand.chain.clone(), tid));
          best.insert(next_key, (candidate_score, cand.seed, next_chain.clone()));
          heap.push(Candidate { score: candidate_score, qpos: nq, tpos: nt, state: dest_state, seed: cand.seed, chain: next_chain });
        }
      }
    }

    let (score, sq, st, sstate, seed) = sink.ok_or(EngineError::Unreachable { region: *region })?;
    let (_, _, chain) = best[&(sq, st, sstate)].clone();
    let ops = chain.map(|c| straceback::linearize(&c)).unwrap_or_default();

    let (region_qs, region_qe, region_ts, region_te) = match direction {
      Direction::Forward => {
        let seed_cell = seeds.iter().find(|s| s.id == seed).expect("sink's seed must be in the seed list");
        (seed_cell.qpos, sq, seed_cell.tpos, st)
      }
      Direction::Reverse => {
        let seed_cell = seeds.iter().find(|s| s.id == seed).expect("sink's seed must be in the seed list");
        (sq, seed_cell.qpos, st, seed_cell.tpos)
      }
    };
    let ops = if direction == Direction::Reverse { ops.into_iter().rev().collect() } else { ops };
    let alignment =
      Alignment::new(score, Region::new(region_qs, region_ts, region_qe - region_qs, region_te - region_ts), ops, model.clone());

    Ok(SdpResult { score, seed, alignment })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{Calc, CalcId, Label as ModelLabel, MatchPayload, OpenC4Model, Scope};
  use crate::scoring::ScoringContext;
  use std::sync::Arc;

  fn edit_distance_model() -> Arc<ClosedC4Model> {
    let mut m = OpenC4Model::new("edit_distance");
    let mat = m.add_calc(Calc::new("match", 0, false, false));
    let gap = m.add_calc(Calc::new("gap", 0, false, false));
    let s = m.add_state();
    m.add_transition(None, Some(s), 0, 0, None, ModelLabel::None, None);
    m.add_transition(Some(s), None, 0, 0, None, ModelLabel::None, None);
    m.add_transition(Some(s), Some(s), 1, 1, Some(mat), ModelLabel::Match, Some(MatchPayload { advance_q: 1, advance_t: 1 }));
    m.add_transition(Some(s), Some(s), 1, 0, Some(gap), ModelLabel::Gap, None);
    m.add_transition(Some(s), Some(s), 0, 1, Some(gap), ModelLabel::Gap, None);
    m.configure_start_state(Scope::Corner);
    m.configure_end_state(Scope::Corner);
    Arc::new(m.close().unwrap())
  }

  struct EditDistanceCtx<'a> {
    query: &'a [u8],
    target: &'a [u8],
    match_calc: CalcId,
    gap_calc: CalcId,
  }

  impl ScoringContext for EditDistanceCtx<'_> {
    fn calc_score(&self, calc: CalcId, qpos: i64, tpos: i64) -> i64 {
      if calc == self.match_calc {
        if self.query[(qpos - 1) as usize] == self.target[(tpos - 1) as usize] {
          0
        } else {
          -1
        }
      } else if calc == self.gap_calc {
        -1
      } else {
        0
      }
    }
  }

  #[test]
  fn forward_scheduler_seeded_at_origin_finds_full_alignment() {
    let model = edit_distance_model();
    let match_calc = model.calcs().ids().next().unwrap();
    let gap_calc = model.calcs().ids().nth(1).unwrap();
    let query = b"acgtacgtacgtacgt";
    let target = b"acgtacctacgtacgt";
    let region = Region::new(0, 0, query.len() as i64, target.len() as i64);
    let match_tid = model.select_transitions(ModelLabel::Match)[0];
    let s = model.transition(match_tid).input.index();
    let seed = Seed { id: Id::from_index(0), qpos: 0, tpos: 0, state: s, score: 0 };
    let mut ctx = EditDistanceCtx { query, target, match_calc, gap_calc };

    let result = Sdp::run(&model, &region, &[seed], Direction::Forward, 100, &mut ctx, None).unwrap();
    assert_eq!(result.score, -1); // single mismatch
    assert_eq!(result.alignment.region.qend(), query.len() as i64);
  }
}
