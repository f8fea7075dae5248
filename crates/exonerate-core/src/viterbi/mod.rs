//! Viterbi driver over a closed C4 model (spec §4.E).
//!
//! Four modes share one inner loop: score only, score+traceback, the
//! minimal region containing the optimal path, and reduced-space
//! checkpointing (the last lives in [`reduced_space`]).

pub mod reduced_space;

use crate::alignment::Alignment;
use crate::error::{EngineError, Result};
use crate::model::{ClosedC4Model, Label, ShadowId, StateId, TransitionId};
use crate::region::{Region, SubOptIndex};
use crate::scoring::{add_scores, protected_add, ScoringContext, IMPOSSIBLY_LOW};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Score,
  Path,
  Region,
}

pub enum ViterbiResult {
  Score(i64),
  Path(i64, Alignment),
  Region(i64, Region),
}

/// One DP cell: its score, (in `Path`/`Region` mode) the transition that
/// produced it, and one slot per shadow designation the model declares
/// (spec §3 "Cell" is `(score, shadow_0 … shadow_{K-1})`) — carried forward
/// from the source cell on every transition and overwritten whenever the
/// path crosses a shadow's source state (spec §4.E step 3).
#[derive(Debug, Clone)]
pub(crate) struct Cell {
  pub(crate) score: i64,
  pub(crate) back: Option<TransitionId>,
  pub(crate) shadows: Vec<i64>,
}

impl Cell {
  fn impossible(n_shadows: usize) -> Self {
    Self { score: IMPOSSIBLY_LOW, back: None, shadows: vec![0; n_shadows] }
  }
}

/// Dense grid indexed `[tpos_rel][qpos_rel][state_idx]`. Sized for the
/// whole region — the reduced-space variant in [`reduced_space`] sections
/// this to bound memory.
pub(crate) struct Grid {
  qlen: i64,
  n_states: usize,
  cells: Vec<Cell>,
}

impl Grid {
  pub(crate) fn new(qlen: i64, tlen: i64, n_states: usize, n_shadows: usize) -> Self {
    let size = ((qlen + 1) * (tlen + 1)) as usize * n_states;
    Self { qlen, n_states, cells: vec![Cell::impossible(n_shadows); size] }
  }

  #[inline]
  fn index(&self, qpos: i64, tpos: i64, state: usize) -> usize {
    ((tpos * (self.qlen + 1) + qpos) as usize) * self.n_states + state
  }

  pub(crate) fn get(&self, qpos: i64, tpos: i64, state: usize) -> Cell {
    self.cells[self.index(qpos, tpos, state)].clone()
  }

  pub(crate) fn set(&mut self, qpos: i64, tpos: i64, state: usize, cell: Cell) {
    let idx = self.index(qpos, tpos, state);
    self.cells[idx] = cell;
  }
}

/// A continuation row: per-state scores at `tpos = 0` of a sub-region,
/// carried over from a checkpoint taken during a previous reduced-space
/// pass (spec §4.E "Reduced-space"). When present it replaces the normal
/// start-state seeding for that row.
pub(crate) struct Seed {
  pub(crate) n_states: usize,
  pub(crate) scores: Vec<i64>, // (qpos_rel, state) -> score, flattened qpos*n_states+state
}

impl Seed {
  pub(crate) fn score(&self, qpos: i64, state: usize) -> i64 {
    self.scores[qpos as usize * self.n_states + state]
  }
}

/// Forces the DP to report a specific `(qpos, state)` at `tpos = region.tlen`
/// as the end cell, instead of scanning `end_scope` — used to stitch a
/// reduced-space section onto the continuation point a later section
/// already committed to.
pub(crate) struct ForcedEnd {
  pub(crate) qpos: i64,
  pub(crate) state_idx: usize,
}

pub struct Viterbi;

impl Viterbi {
  pub fn calculate(
    model: &Arc<ClosedC4Model>,
    region: &Region,
    mode: Mode,
    ctx: &mut dyn ScoringContext,
    subopt: Option<&mut SubOptIndex>,
  ) -> Result<ViterbiResult> {
    let (grid, score, end_q_rel, end_t_rel, end_idx) = run_dense(model, region, ctx, subopt, None, None)?;
    let end_q = region.qs + end_q_rel;
    let end_t = region.ts + end_t_rel;

    match mode {
      Mode::Score => Ok(ViterbiResult::Score(score)),
      Mode::Path => {
        let (ops, start_q, start_t, _start_state) = traceback(model, &grid, region, end_q_rel, end_t_rel, end_idx);
        let path_region = Region::new(start_q, start_t, end_q - start_q, end_t - start_t);
        let alignment = Alignment::new(score, path_region, ops, model.clone());
        Ok(ViterbiResult::Path(score, alignment))
      }
      Mode::Region => {
        let (_ops, start_q, start_t, _start_state) = traceback(model, &grid, region, end_q_rel, end_t_rel, end_idx);
        let path_region = Region::new(start_q, start_t, end_q - start_q, end_t - start_t);
        Ok(ViterbiResult::Region(score, path_region))
      }
    }
  }
}

/// The shared inner loop: fills a dense grid over `region` and locates the
/// best end cell, honouring an optional continuation `seed` (replacing
/// start-state seeding at `tpos = 0`) and an optional `forced_end` (bypassing
/// the `end_scope` scan) — the two hooks [`reduced_space`] needs to stitch
/// sections together.
pub(crate) fn run_dense(
  model: &ClosedC4Model,
  region: &Region,
  ctx: &mut dyn ScoringContext,
  subopt: Option<&mut SubOptIndex>,
  seed: Option<&Seed>,
  forced_end: Option<&ForcedEnd>,
) -> Result<(Grid, i64, i64, i64, usize)> {
  let n_states = model.states().len();
  let n_shadows = model.total_shadow_designations();
  let start_idx = model.start_state().index();
  let end_idx = model.end_state().index();

  for (id, _) in model.calcs().iter() {
    ctx.calc_init(id, region);
  }

  let mut grid = Grid::new(region.qlen, region.tlen, n_states, n_shadows);

  // Group transitions by destination state so the inner relaxation loop
  // only visits relevant edges.
  let mut by_output: Vec<Vec<TransitionId>> = vec![Vec::new(); n_states];
  for (tid, t) in model.transitions().iter() {
    by_output[t.output.index()].push(tid);
  }

  // Which shadows start at each state, and which end at each transition —
  // looked up once per cell/edge rather than scanning the shadow arena.
  let mut shadows_starting_at: Vec<Vec<ShadowId>> = vec![Vec::new(); n_states];
  for sid in model.states().ids() {
    shadows_starting_at[sid.index()] = model.state(sid).shadows_starting_here.clone();
  }
  let mut shadows_ending_at: Vec<Vec<ShadowId>> = vec![Vec::new(); model.transitions().len()];
  for (sid, shadow) in model.shadows().iter() {
    for &tid in &shadow.destinations {
      shadows_ending_at[tid.index()].push(sid);
    }
  }

  let mut best_end: Option<(i64, i64, i64)> = None; // (score, qpos, tpos) relative
  let mut subopt = subopt;

  for tpos in 0..=region.tlen {
    if let Some(idx) = subopt.as_deref_mut() {
      idx.set_row(tpos);
    }
    for qpos in 0..=region.qlen {
      let abs_q = region.qs + qpos;
      let abs_t = region.ts + tpos;
      if tpos == 0 {
        if let Some(seed) = seed {
          for state in 0..n_states {
            grid.set(qpos, 0, state, Cell { score: seed.score(qpos, state), back: None, shadows: vec![0; n_shadows] });
          }
        }
      }
      // Relax all states at this cell until fixpoint; bounded by
      // `n_states` passes, which suffices for any acyclic epsilon graph.
      for _pass in 0..n_states.max(1) {
        let mut changed = false;
        for state in 0..n_states {
          let mut best = grid.get(qpos, tpos, state);
          if state == start_idx && seed.is_none() {
            if model.start_scope().admits(qpos, tpos, region.qlen, region.tlen) {
              let seed_score = ctx.start_cell_score(abs_q, abs_t);
              if seed_score > best.score {
                best = Cell { score: seed_score, back: None, shadows: vec![0; n_shadows] };
                changed = true;
              }
            }
          }
          for &tid in &by_output[state] {
            let t = model.transition(tid);
            let sq = qpos - t.advance_q;
            let st = tpos - t.advance_t;
            if sq < 0 || st < 0 {
              continue;
            }
            let src_cell = grid.get(sq, st, t.input.index());
            if src_cell.score <= IMPOSSIBLY_LOW {
              continue;
            }
            if t.label == Label::Match {
              if let Some(idx) = subopt.as_deref_mut() {
                if idx.is_blocked(qpos) {
                  continue;
                }
              }
            }
            let calc_score = t.calc.map_or(0, |c| ctx.calc_score(c, abs_q, abs_t));
            let candidate = match t.calc {
              Some(cid) => {
                let calc = &model.calcs()[cid];
                match protected_add(src_cell.score, calc_score, calc.overflow_protect, calc.underflow_protect) {
                  Some(v) => v,
                  None => return Err(EngineError::ScoreOverflow { calc: cid, qpos: abs_q, tpos: abs_t }),
                }
              }
              None => add_scores(src_cell.score, calc_score),
            };
            if candidate > best.score {
              let mut shadows = src_cell.shadows.clone();
              for &sid in &shadows_ending_at[tid.index()] {
                let designation = model.shadows()[sid].designation;
                let payload = shadows[designation];
                ctx.shadow_end(sid, abs_q, abs_t, payload);
              }
              best = Cell { score: candidate, back: Some(tid), shadows };
              changed = true;
            }
          }
          if changed {
            for &sid in &shadows_starting_at[state] {
              let designation = model.shadows()[sid].designation;
              best.shadows[designation] = ctx.shadow_start(sid, abs_q, abs_t);
            }
            grid.set(qpos, tpos, state, best);
          }
        }
        if !changed {
          break;
        }
      }

      if forced_end.is_none() && model.end_scope().admits(qpos, tpos, region.qlen, region.tlen) {
        let end_cell = grid.get(qpos, tpos, end_idx);
        if end_cell.score > IMPOSSIBLY_LOW {
          let is_better = best_end.map_or(true, |(s, _, _)| end_cell.score > s);
          if is_better {
            best_end = Some((end_cell.score, qpos, tpos));
          }
        }
      }
    }
  }

  for (id, _) in model.calcs().iter() {
    ctx.calc_exit(id, region);
  }

  let (score, end_q, end_t, end_state) = if let Some(forced) = forced_end {
    let cell = grid.get(forced.qpos, region.tlen, forced.state_idx);
    if cell.score <= IMPOSSIBLY_LOW {
      return Err(EngineError::Unreachable { region: *region });
    }
    (cell.score, forced.qpos, region.tlen, forced.state_idx)
  } else {
    let (score, q, t) = best_end.ok_or(EngineError::Unreachable { region: *region })?;
    (score, q, t, end_idx)
  };

  Ok((grid, score, end_q, end_t, end_state))
}

/// Walk back-pointers from `(qpos_rel, tpos_rel)` in `end_state` to the
/// chosen start cell, returning run-length-encoded operations in forward
/// order, the absolute start position, and the state at which the walk
/// stopped (the continuation point, for reduced-space stitching).
pub(crate) fn traceback(
  model: &ClosedC4Model,
  grid: &Grid,
  region: &Region,
  mut qpos: i64,
  mut tpos: i64,
  mut state_idx: usize,
) -> (Vec<(TransitionId, i64)>, i64, i64, usize) {
  let mut rev_ops: Vec<TransitionId> = Vec::new();
  loop {
    let cell = grid.get(qpos, tpos, state_idx);
    match cell.back {
      None => break,
      Some(tid) => {
        let t = model.transition(tid);
        rev_ops.push(tid);
        qpos -= t.advance_q;
        tpos -= t.advance_t;
        state_idx = t.input.index();
      }
    }
  }
  rev_ops.reverse();

  // Run-length encode, dropping (q,t)=(0,0) structural transitions (their
  // own input/output are the same zero-advance epsilon wiring and carry no
  // alignment content) unless they carry a calc (meaning they do matter,
  // e.g. a zero-cost gap-close).
  let mut ops: Vec<(TransitionId, i64)> = Vec::new();
  for tid in rev_ops {
    let t = model.transition(tid);
    if t.advance_q == 0 && t.advance_t == 0 && t.calc.is_none() {
      continue;
    }
    if let Some(last) = ops.last_mut() {
      if last.0 == tid {
        last.1 += 1;
        continue;
      }
    }
    ops.push((tid, 1));
  }
  (ops, region.qs + qpos, region.ts + tpos, state_idx)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{Calc, MatchPayload, OpenC4Model, Scope};
  use crate::scoring::TableScoringContext;
  use std::collections::HashMap;

  fn edit_distance_model() -> Arc<ClosedC4Model> {
    let mut m = OpenC4Model::new("edit_distance");
    let mat = m.add_calc(Calc::new("match", 0, false, false));
    let gap = m.add_calc(Calc::new("gap", 0, false, false));
    let s = m.add_state();
    m.add_transition(None, Some(s), 0, 0, None, Label::None, None);
    m.add_transition(Some(s), None, 0, 0, None, Label::None, None);
    m.add_transition(Some(s), Some(s), 1, 1, Some(mat), Label::Match, Some(MatchPayload { advance_q: 1, advance_t: 1 }));
    m.add_transition(Some(s), Some(s), 1, 0, Some(gap), Label::Gap, None);
    m.add_transition(Some(s), Some(s), 0, 1, Some(gap), Label::Gap, None);
    m.configure_start_state(Scope::Corner);
    m.configure_end_state(Scope::Corner);
    Arc::new(m.close().unwrap())
  }

  struct EditDistanceCtx<'a> {
    query: &'a [u8],
    target: &'a [u8],
    match_calc: crate::model::CalcId,
    gap_calc: crate::model::CalcId,
  }

  impl ScoringContext for EditDistanceCtx<'_> {
    fn calc_score(&self, calc: crate::model::CalcId, qpos: i64, tpos: i64) -> i64 {
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
  fn score_and_path_modes_agree() {
    let model = edit_distance_model();
    let match_calc = model.calcs().ids().next().unwrap();
    let gap_calc = model.calcs().ids().nth(1).unwrap();
    let query = b"gtgcactacgtacgtnatcgtgcttnaacgcgtacgtgatngtgcttgaacgtacgtacgtgatcgtgcttga";
    let target = b"actacgtacgtgatcgtgcaacgcactacgtacgtgancttgaacgcactacgtacgtgatcgtgcntgaacgn";
    let region = Region::new(0, 0, query.len() as i64, target.len() as i64);
    let mut ctx = EditDistanceCtx { query, target, match_calc, gap_calc };

    let score = match Viterbi::calculate(&model, &region, Mode::Score, &mut ctx, None).unwrap() {
      ViterbiResult::Score(s) => s,
      _ => unreachable!(),
    };
    assert_eq!(score, -23);

    let path_score = match Viterbi::calculate(&model, &region, Mode::Path, &mut ctx, None).unwrap() {
      ViterbiResult::Path(s, _) => s,
      _ => unreachable!(),
    };
    assert_eq!(path_score, score);
  }

  #[test]
  fn table_context_defaults_to_zero() {
    let mut m = OpenC4Model::new("x");
    let c = m.add_calc(Calc::new("c", 0, false, false));
    let ctx = TableScoringContext { scores: HashMap::new() };
    assert_eq!(ctx.calc_score(c, 0, 0), 0);
  }

  struct ShadowCtx<'a> {
    query: &'a [u8],
    target: &'a [u8],
    match_calc: crate::model::CalcId,
    gap_calc: crate::model::CalcId,
    starts: std::cell::RefCell<Vec<(i64, i64)>>,
    ends: std::cell::RefCell<Vec<(i64, i64, i64)>>,
  }

  impl ScoringContext for ShadowCtx<'_> {
    fn calc_score(&self, calc: crate::model::CalcId, qpos: i64, tpos: i64) -> i64 {
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

    fn shadow_start(&self, _shadow: ShadowId, qpos: i64, tpos: i64) -> i64 {
      self.starts.borrow_mut().push((qpos, tpos));
      qpos
    }

    fn shadow_end(&mut self, _shadow: ShadowId, qpos: i64, tpos: i64, payload: i64) {
      self.ends.borrow_mut().push((qpos, tpos, payload));
    }
  }

  /// The one state in `edit_distance_model` both starts and ends every
  /// shadow here, so every pass through the state fires both hooks.
  fn edit_distance_model_with_shadow() -> (Arc<ClosedC4Model>, crate::model::CalcId, crate::model::CalcId) {
    let mut m = OpenC4Model::new("edit_distance_shadow");
    let mat = m.add_calc(Calc::new("match", 0, false, false));
    let gap = m.add_calc(Calc::new("gap", 0, false, false));
    let s = m.add_state();
    m.add_transition(None, Some(s), 0, 0, None, Label::None, None);
    m.add_transition(Some(s), None, 0, 0, None, Label::None, None);
    let match_t = m.add_transition(Some(s), Some(s), 1, 1, Some(mat), Label::Match, Some(MatchPayload { advance_q: 1, advance_t: 1 }));
    m.add_transition(Some(s), Some(s), 1, 0, Some(gap), Label::Gap, None);
    m.add_transition(Some(s), Some(s), 0, 1, Some(gap), Label::Gap, None);
    m.add_shadow(vec![s], vec![match_t]);
    m.configure_start_state(Scope::Corner);
    m.configure_end_state(Scope::Corner);
    (Arc::new(m.close().unwrap()), mat, gap)
  }

  #[test]
  fn shadow_hooks_fire_on_winning_match_transitions() {
    let (model, match_calc, gap_calc) = edit_distance_model_with_shadow();
    let query = b"gattaca";
    let target = b"gattaca";
    let region = Region::new(0, 0, query.len() as i64, target.len() as i64);
    let mut ctx = ShadowCtx {
      query,
      target,
      match_calc,
      gap_calc,
      starts: std::cell::RefCell::new(Vec::new()),
      ends: std::cell::RefCell::new(Vec::new()),
    };

    let score = match Viterbi::calculate(&model, &region, Mode::Score, &mut ctx, None).unwrap() {
      ViterbiResult::Score(s) => s,
      _ => unreachable!(),
    };
    assert_eq!(score, 0);
    assert!(!ctx.starts.borrow().is_empty(), "shadow_start never fired");
    assert!(!ctx.ends.borrow().is_empty(), "shadow_end never fired");
    assert_eq!(ctx.starts.borrow().len(), ctx.ends.borrow().len());
  }
}
