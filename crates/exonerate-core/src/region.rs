//! Rectangle arithmetic over the (query, target) DP plane, plus the SubOpt
//! range index that blocks previously-used match cells (spec §4.A).

use std::cmp::Ordering;

/// A rectangle `[qs, qs+qlen) x [ts, ts+tlen)` in the DP plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Region {
  pub qs: i64,
  pub ts: i64,
  pub qlen: i64,
  pub tlen: i64,
}

impl Region {
  pub fn new(qs: i64, ts: i64, qlen: i64, tlen: i64) -> Self {
    Self { qs, ts, qlen, tlen }
  }

  pub fn qend(&self) -> i64 {
    self.qs + self.qlen
  }

  pub fn tend(&self) -> i64 {
    self.ts + self.tlen
  }

  pub fn area(&self) -> i64 {
    self.qlen * self.tlen
  }

  /// True iff `self` is entirely contained within `other`.
  pub fn is_within(&self, other: &Region) -> bool {
    self.qs >= other.qs
      && self.ts >= other.ts
      && self.qend() <= other.qend()
      && self.tend() <= other.tend()
  }

  pub fn is_same(&self, other: &Region) -> bool {
    self == other
  }

  pub fn contains_cell(&self, qpos: i64, tpos: i64) -> bool {
    qpos >= self.qs && qpos < self.qend() && tpos >= self.ts && tpos < self.tend()
  }

  /// Grow the region by `int_q`/`int_t` inward and `ext_q`/`ext_t` outward,
  /// clipped to `bounds`. Used by SAR to expand an HSP-derived inner box.
  pub fn grow_clipped(&self, ext_q: i64, ext_t: i64, bounds: &Region) -> Region {
    let qs = (self.qs - ext_q).max(bounds.qs);
    let ts = (self.ts - ext_t).max(bounds.ts);
    let qend = (self.qend() + ext_q).min(bounds.qend());
    let tend = (self.tend() + ext_t).min(bounds.tend());
    Region::new(qs, ts, (qend - qs).max(0), (tend - ts).max(0))
  }
}

/// A single blocked cell recorded by a previously emitted alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockedCell {
  qpos: i64,
  tpos: i64,
  path_id: u64,
}

/// Records match cells visited by already-emitted alignments so that later
/// suboptimal search avoids reusing them (spec §3 "SubOpt index", §4.A).
#[derive(Debug, Default, Clone)]
pub struct SubOpt {
  cells: Vec<BlockedCell>,
  path_count: u64,
}

impl SubOpt {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn path_count(&self) -> u64 {
    self.path_count
  }

  /// Block every cell touched by a match operation, plus the lead-in cell
  /// just before the operation's first step on the same diagonal (spec §4.A,
  /// Open Question 2: the active C behaviour blocks `(qp, tp)`, not
  /// `(qp+advance_q, tp+advance_t)` — we follow that behaviour deliberately).
  pub fn add_alignment(&mut self, ops: &[(i64, i64, i64, i64)]) {
    // ops: (qpos, tpos, advance_q, advance_t) one entry per DP step already
    // expanded by the caller (alignment.rs) to per-word-step granularity for
    // match transitions only.
    self.path_count += 1;
    let id = self.path_count;
    for &(qpos, tpos, advance_q, advance_t) in ops {
      if let Some((lead_q, lead_t)) = lead_in(qpos, tpos, advance_q, advance_t) {
        self.cells.push(BlockedCell { qpos: lead_q, tpos: lead_t, path_id: id });
      }
      self.cells.push(BlockedCell { qpos, tpos, path_id: id });
    }
  }

  /// True iff any blocked cell within `region` satisfies `predicate(path_id)`.
  pub fn find(&self, region: &Region, predicate: impl Fn(u64) -> bool) -> bool {
    self
      .cells
      .iter()
      .any(|c| region.contains_cell(c.qpos, c.tpos) && predicate(c.path_id))
  }

  pub fn overlaps_region(&self, region: &Region) -> bool {
    self.find(region, |_| true)
  }

  pub fn create_index(&self, region: &Region) -> SubOptIndex {
    let mut rows: Vec<(i64, i64)> = self
      .cells
      .iter()
      .filter(|c| region.contains_cell(c.qpos, c.tpos))
      .map(|c| (c.tpos - region.ts, c.qpos - region.qs))
      .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    SubOptIndex { cells: rows, row_start: 0, row_end: 0, cursor: 0, current_row: i64::MIN }
  }
}

fn lead_in(qpos: i64, tpos: i64, advance_q: i64, advance_t: i64) -> Option<(i64, i64)> {
  if advance_q == 0 && advance_t == 0 {
    return None;
  }
  Some((qpos - advance_q, tpos - advance_t))
}

/// Row-indexed, amortised O(1) "is this cell blocked" view over one region's
/// worth of previously blocked cells (spec §4.A).
#[derive(Debug, Clone)]
pub struct SubOptIndex {
  /// Sorted by `(tpos, qpos)`, coordinates relative to the originating region.
  cells: Vec<(i64, i64)>,
  row_start: usize,
  row_end: usize,
  cursor: usize,
  current_row: i64,
}

impl SubOptIndex {
  /// Advance the row pointer. Must be called with monotonically increasing
  /// `tpos` values (one call per DP row).
  pub fn set_row(&mut self, tpos: i64) {
    debug_assert!(tpos >= self.current_row || self.current_row == i64::MIN);
    self.current_row = tpos;
    let start = self.cells.partition_point(|&(t, _)| t < tpos);
    let end = self.cells.partition_point(|&(t, _)| t <= tpos);
    self.row_start = start;
    self.row_end = end;
    self.cursor = start;
  }

  /// Amortised O(1): may be called multiple times per `qpos` (a model may
  /// have several match states visiting the same cell).
  pub fn is_blocked(&mut self, qpos: i64) -> bool {
    while self.cursor < self.row_end && self.cells[self.cursor].1 < qpos {
      self.cursor += 1;
    }
    self.cursor < self.row_end && self.cells[self.cursor].1 == qpos
  }
}

impl PartialOrd for Region {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some((self.qs, self.ts, self.qlen, self.tlen).cmp(&(other.qs, other.ts, other.qlen, other.tlen)))
  }
}

impl Ord for Region {
  fn cmp(&self, other: &Self) -> Ordering {
    self.partial_cmp(other).unwrap()
  }
}
