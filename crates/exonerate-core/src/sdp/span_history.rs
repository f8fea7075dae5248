//! Span entry/exit bookkeeping (spec §4.F "Span history"): while the
//! forward scheduler is inside a span state, candidate cells are recorded
//! here rather than materialised on the dense grid; on exit, the best entry
//! within the span's window is chosen.

use crate::model::SpanId;
use std::collections::HashMap;

/// A candidate cell recorded while traversing a span, keyed by where it
/// entered.
#[derive(Debug, Clone, Copy)]
pub struct SpanEntry {
  pub qpos: i64,
  pub tpos: i64,
  pub score: i64,
}

/// Keyed by `(span, qpos, tpos)` exactly as spec'd — a `HashMap` rather than
/// a dense array since only visited cells are ever recorded, which for large
/// genomic spans (introns) is a small fraction of the span's bounding box.
#[derive(Debug, Clone, Default)]
pub struct SparseCache {
  entries: HashMap<(SpanId, i64, i64), SpanEntry>,
}

impl SparseCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn record(&mut self, span: SpanId, qpos: i64, tpos: i64, score: i64) {
    let slot = self.entries.entry((span, qpos, tpos)).or_insert(SpanEntry { qpos, tpos, score });
    if score > slot.score {
      *slot = SpanEntry { qpos, tpos, score };
    }
  }

  /// The best entry recorded for `span` within `[min_q, max_q] x [min_t,
  /// max_t]`, if any.
  pub fn best_in_window(&self, span: SpanId, min_q: i64, max_q: i64, min_t: i64, max_t: i64) -> Option<SpanEntry> {
    self
      .entries
      .iter()
      .filter(|((s, q, t), _)| *s == span && *q >= min_q && *q <= max_q && *t >= min_t && *t <= max_t)
      .map(|(_, e)| *e)
      .max_by_key(|e| e.score)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::arena::Id;

  fn span(n: u32) -> SpanId {
    Id::from_index(n)
  }

  #[test]
  fn best_in_window_picks_the_highest_score_inside_bounds() {
    let mut cache = SparseCache::new();
    cache.record(span(0), 5, 10, 3);
    cache.record(span(0), 6, 11, 9);
    cache.record(span(0), 100, 200, 99); // outside the window
    let best = cache.best_in_window(span(0), 0, 20, 0, 20).unwrap();
    assert_eq!(best.score, 9);
  }

  #[test]
  fn record_keeps_the_higher_score_for_the_same_cell() {
    let mut cache = SparseCache::new();
    cache.record(span(0), 1, 1, 5);
    cache.record(span(0), 1, 1, 2);
    assert_eq!(cache.best_in_window(span(0), 0, 5, 0, 5).unwrap().score, 5);
  }
}
