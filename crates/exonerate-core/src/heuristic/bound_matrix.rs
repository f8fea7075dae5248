//! Bound matrices (spec §4.H): a derived model is run once, dense, over a
//! small `(qext, text)` rectangle, and every cell landing on the derived
//! model's end state is kept rather than just the single best — giving an
//! upper bound for any smaller terminal/join/span, not just the full-size
//! one.

use crate::error::Result;
use crate::model::ClosedC4Model;
use crate::region::Region;
use crate::scoring::{ScoringContext, IMPOSSIBLY_LOW};
use crate::viterbi::run_dense;

/// A `(qext+1) x (text+1)` table of upper bounds, row-major by `qpos` then
/// `tpos`. After [`BoundMatrix::max_region_convert`], `lookup(q, t)` is a
/// valid upper bound for a terminal/join/span of extent `≤ (q, t)` (spec
/// invariant 5: monotone non-decreasing in both axes).
#[derive(Debug, Clone)]
pub struct BoundMatrix {
  qext: i64,
  text: i64,
  cells: Vec<i64>,
}

impl BoundMatrix {
  fn new(qext: i64, text: i64) -> Self {
    Self { qext, text, cells: vec![IMPOSSIBLY_LOW; ((qext + 1) * (text + 1)) as usize] }
  }

  fn index(&self, q: i64, t: i64) -> usize {
    (q * (self.text + 1) + t) as usize
  }

  fn get(&self, q: i64, t: i64) -> i64 {
    self.cells[self.index(q, t)]
  }

  fn set(&mut self, q: i64, t: i64, v: i64) {
    let i = self.index(q, t);
    self.cells[i] = v;
  }

  /// In place, replace each cell by the max of itself and its three
  /// upper-left neighbours (spec §4.H "max-region-convert"), so that
  /// `lookup(qlen, tlen)` bounds *any* smaller region too.
  fn max_region_convert(&mut self) {
    for q in 0..=self.qext {
      for t in 0..=self.text {
        let mut best = self.get(q, t);
        if q > 0 {
          best = best.max(self.get(q - 1, t));
        }
        if t > 0 {
          best = best.max(self.get(q, t - 1));
        }
        if q > 0 && t > 0 {
          best = best.max(self.get(q - 1, t - 1));
        }
        self.set(q, t, best);
      }
    }
  }

  /// Upper bound for a region of extent `(qlen, tlen)`, clamped to this
  /// matrix's built range — callers must only ask for extents that fit
  /// within `(qext, text)`, which SAR enforces by construction.
  pub fn lookup(&self, qlen: i64, tlen: i64) -> i64 {
    let q = qlen.clamp(0, self.qext);
    let t = tlen.clamp(0, self.text);
    self.get(q, t)
  }

  /// The `(qext, text)` this matrix was built for — SAR checks a region
  /// fits within this before trusting a `lookup` bound for it.
  pub fn extent(&self) -> (i64, i64) {
    (self.qext, self.text)
  }

  /// Runs `model` densely over a `(qext, text)` rectangle and records, for
  /// every cell, the score of landing on `model`'s own end state there —
  /// this is the terminal/join/span bound before max-region-convert.
  pub fn build(model: &ClosedC4Model, qext: i64, text: i64, ctx: &mut dyn ScoringContext) -> Result<BoundMatrix> {
    let region = Region::new(0, 0, qext, text);
    let (grid, _score, _eq, _et, _es) = run_dense(model, &region, ctx, None, None, None)?;
    let end_idx = model.end_state().index();
    let mut matrix = BoundMatrix::new(qext, text);
    for q in 0..=qext {
      for t in 0..=text {
        matrix.set(q, t, grid.get(q, t, end_idx).score);
      }
    }
    matrix.max_region_convert();
    Ok(matrix)
  }
}
