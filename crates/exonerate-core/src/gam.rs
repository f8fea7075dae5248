//! GAM — the gapped alignment manager (spec §4.J): per-query best-N
//! bookkeeping, percent-of-self thresholding, refinement, and the ordering
//! suboptimal enumeration must respect. Alignment production itself is
//! delegated to an [`Aligner`] — HPair/SDP/BSDP (components H/I) build the
//! candidate; GAM decides whether to keep it.

use crate::alignment::Alignment;
use crate::error::{EngineError, Result};
use crate::model::ClosedC4Model;
use crate::scoring::ScoringContext;
use indexmap::IndexMap;
use std::sync::{Arc, Mutex};

pub type QueryId = u64;

/// Per spec §7: `Unreachable` and `ScoreOverflow` degrade a job to "no
/// alignment" rather than aborting the run; every other `EngineError`
/// propagates as a hard failure.
fn degrades(e: &EngineError) -> bool {
  matches!(e, EngineError::Unreachable { .. } | EngineError::ScoreOverflow { .. })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refinement {
  None,
  Full,
  Region,
}

#[derive(Debug, Clone, Copy)]
pub enum SubmodelType {
  Ungapped,
  UngappedTrans,
  AffineGlobal,
  AffineBestfit,
  AffineLocal,
  AffineOverlap,
  Est2genome,
  Ner,
  Protein2dna,
  Protein2genome,
  Protein2dnaBestfit,
  Protein2genomeBestfit,
  Coding2coding,
  Coding2genome,
  Cdna2genome,
  Genome2genome,
}

#[derive(Debug, Clone, Copy)]
pub struct Args {
  pub threshold: i64,
  pub percent_threshold: i64,
  pub best_n: usize,
  pub use_subopt: bool,
  pub use_gapped_extension: bool,
  pub refinement: Refinement,
  pub refinement_boundary: i64,
}

impl Default for Args {
  fn default() -> Self {
    Self {
      threshold: i64::MIN / 4,
      percent_threshold: 0,
      best_n: 0,
      use_subopt: false,
      use_gapped_extension: true,
      refinement: Refinement::None,
      refinement_boundary: 0,
    }
  }
}

/// Produces a candidate alignment given a query/target pair (and,
/// optionally, a refined region to re-run on) — the work BSDP/HPair/SDP do.
/// GAM only ever calls this; it never builds alignments itself.
pub trait Aligner {
  fn align(&mut self, query_id: QueryId, ctx: &mut dyn ScoringContext) -> Result<Vec<Alignment>>;

  /// Re-runs on the full rectangle or a grown region (spec §4.J
  /// "refinement"); returns `None` if refinement isn't applicable.
  fn refine(&mut self, query_id: QueryId, alignment: &Alignment, refinement: Refinement, boundary: i64, ctx: &mut dyn ScoringContext) -> Result<Option<Alignment>>;
}

/// Per-query bounded best-N heap, kept sorted ascending by score so
/// `worst()` is O(1) (spec §4.J "Per-query best-N").
///
/// Submission rules, verbatim from the spec:
/// - new score == tie_score: push, tie_count += 1.
/// - new score < tie_score: push iff under capacity; otherwise dropped.
/// - new score > tie_score: push; if `size - tie_count >= N`, drop all
///   ties en bloc and recompute tie_score/tie_count at the new worst.
#[derive(Debug, Clone, Default)]
struct BestN {
  capacity: usize,
  entries: Vec<Alignment>,
  tie_score: i64,
  tie_count: usize,
}

impl BestN {
  fn new(capacity: usize) -> Self {
    Self { capacity, entries: Vec::new(), tie_score: i64::MIN, tie_count: 0 }
  }

  fn submit(&mut self, alignment: Alignment) {
    if self.capacity == 0 {
      self.entries.push(alignment);
      return;
    }
    let score = alignment.score;
    if self.entries.is_empty() {
      self.tie_score = score;
      self.tie_count = 1;
      self.entries.push(alignment);
      return;
    }
    if score == self.tie_score {
      self.entries.push(alignment);
      self.tie_count += 1;
    } else if score < self.tie_score {
      if self.entries.len() < self.capacity {
        self.entries.push(alignment);
        self.tie_score = score;
        self.tie_count = 1;
      }
    } else {
      self.entries.push(alignment);
      if self.entries.len() - self.tie_count >= self.capacity {
        self.entries.retain(|a| a.score != self.tie_score);
        self.recompute_ties();
      }
    }
  }

  fn recompute_ties(&mut self) {
    self.tie_score = self.entries.iter().map(|a| a.score).min().unwrap_or(i64::MIN);
    self.tie_count = self.entries.iter().filter(|a| a.score == self.tie_score).count();
  }

  fn into_sorted_desc(self) -> Vec<Alignment> {
    let mut v = self.entries;
    v.sort_by(|a, b| b.score.cmp(&a.score));
    v
  }
}

struct QueryState {
  self_score: Option<i64>,
  best_n: BestN,
  unbounded: Vec<Alignment>,
}

pub struct Gam {
  pub model: Arc<ClosedC4Model>,
  pub args: Args,
  state: Mutex<IndexMap<QueryId, QueryState>>,
}

impl Gam {
  pub fn new(model: Arc<ClosedC4Model>, args: Args) -> Self {
    Self { model, args, state: Mutex::new(IndexMap::new()) }
  }

  /// The effective floor for `query_id`: `max(threshold, percent *
  /// self_score / 100)` (spec §4.J). `self_score` is cached per query so
  /// repeated submissions for the same query don't recompute it.
  fn effective_threshold(&self, query_id: QueryId, self_score: i64) -> i64 {
    if self.args.percent_threshold <= 0 {
      return self.args.threshold;
    }
    let _ = query_id;
    let percent_floor = (self.args.percent_threshold * self_score) / 100;
    self.args.threshold.max(percent_floor)
  }

  /// Runs `aligner` for `query_id`, applies the threshold and (if
  /// configured) refinement, and submits survivors to that query's best-N
  /// heap.
  ///
  /// `Unreachable`/`ScoreOverflow` from the aligner degrade this job to "no
  /// alignment" rather than failing the whole run (spec §7): logged at
  /// warning level, `submit` returns `Ok(())` with nothing added for this
  /// query. Every other error propagates.
  pub fn submit(&self, query_id: QueryId, self_score: i64, aligner: &mut dyn Aligner, ctx: &mut dyn ScoringContext) -> Result<()> {
    let threshold = self.effective_threshold(query_id, self_score);
    let mut candidates = match aligner.align(query_id, ctx) {
      Ok(candidates) => candidates,
      Err(e) if degrades(&e) => {
        log::warn!("query {query_id} produced no alignment: {e}");
        return Ok(());
      }
      Err(e) => return Err(e),
    };
    if !self.args.use_subopt {
      candidates.truncate(1);
    }

    let mut guard = self.state.lock().expect("GAM state mutex poisoned");
    let entry = guard.entry(query_id).or_insert_with(|| QueryState {
      self_score: Some(self_score),
      best_n: BestN::new(self.args.best_n),
      unbounded: Vec::new(),
    });

    for candidate in candidates {
      if candidate.score < threshold {
        continue;
      }
      let refined = if matches!(self.args.refinement, Refinement::None) {
        candidate
      } else {
        match aligner.refine(query_id, &candidate, self.args.refinement, self.args.refinement_boundary, ctx) {
          Ok(Some(better)) if better.score >= candidate.score => better,
          Ok(_) => candidate,
          Err(e) if degrades(&e) => {
            log::warn!("query {query_id} refinement produced no alignment, keeping unrefined candidate: {e}");
            candidate
          }
          Err(e) => return Err(e),
        }
      };
      if refined.score < threshold {
        continue;
      }
      if self.args.best_n > 0 {
        entry.best_n.submit(refined);
      } else {
        entry.unbounded.push(refined);
      }
    }
    Ok(())
  }

  /// Drains all queries' results in query-id (insertion) order, each
  /// query's alignments by descending score (spec §4.J "Reporting order").
  pub fn report(&self) -> Vec<Alignment> {
    let mut guard = self.state.lock().expect("GAM state mutex poisoned");
    let mut out = Vec::new();
    for (_, state) in guard.drain(..) {
      if self.args.best_n > 0 {
        out.extend(state.best_n.into_sorted_desc());
      } else {
        let mut v = state.unbounded;
        v.sort_by(|a, b| b.score.cmp(&a.score));
        out.extend(v);
      }
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{OpenC4Model, Scope};
  use crate::region::Region;

  fn dummy_model() -> Arc<ClosedC4Model> {
    let mut m = OpenC4Model::new("dummy");
    let s = m.add_state();
    m.add_transition(None, Some(s), 0, 0, None, crate::model::Label::None, None);
    m.add_transition(Some(s), None, 0, 0, None, crate::model::Label::None, None);
    m.configure_start_state(Scope::Corner);
    m.configure_end_state(Scope::Corner);
    Arc::new(m.close().unwrap())
  }

  fn alignment(model: &Arc<ClosedC4Model>, score: i64) -> Alignment {
    Alignment::new(score, Region::new(0, 0, 0, 0), Vec::new(), model.clone())
  }

  #[test]
  fn best_n_keeps_only_the_top_n_scores() {
    let model = dummy_model();
    let mut heap = BestN::new(2);
    for s in [5, 10, 3, 8] {
      heap.submit(alignment(&model, s));
    }
    let scores: Vec<i64> = heap.into_sorted_desc().iter().map(|a| a.score).collect();
    assert_eq!(scores, vec![10, 8]);
  }

  #[test]
  fn best_n_keeps_all_ties_at_the_admission_frontier() {
    let model = dummy_model();
    let mut heap = BestN::new(2);
    for s in [10, 8, 8, 8] {
      heap.submit(alignment(&model, s));
    }
    // frontier score is 8; all three 8s are kept together per the spec's
    // "never partially" tie rule, even though that's 3 entries for N=2.
    let scores: Vec<i64> = heap.into_sorted_desc().iter().map(|a| a.score).collect();
    assert_eq!(scores, vec![10, 8, 8, 8]);
  }

  #[test]
  fn best_n_keeps_a_tie_group_until_enough_higher_scores_displace_it() {
    let model = dummy_model();
    let mut heap = BestN::new(2);
    heap.submit(alignment(&model, 5));
    heap.submit(alignment(&model, 5)); // tie at worst, size=2, non-tied=0 < N: kept
    heap.submit(alignment(&model, 9)); // size=3, non-tied=1 < N: still kept (transiently over capacity)
    let scores: Vec<i64> = heap.into_sorted_desc().iter().map(|a| a.score).collect();
    assert_eq!(scores, vec![9, 5, 5]);

    heap.submit(alignment(&model, 9)); // size=4, non-tied=2 >= N: the 5-tie is dropped en bloc
    let scores: Vec<i64> = heap.into_sorted_desc().iter().map(|a| a.score).collect();
    assert_eq!(scores, vec![9, 9]);
  }

  struct FailingAligner(EngineError);

  impl Aligner for FailingAligner {
    fn align(&mut self, _query_id: QueryId, _ctx: &mut dyn ScoringContext) -> Result<Vec<Alignment>> {
      Err(self.0.clone())
    }

    fn refine(
      &mut self,
      _query_id: QueryId,
      _alignment: &Alignment,
      _refinement: Refinement,
      _boundary: i64,
      _ctx: &mut dyn ScoringContext,
    ) -> Result<Option<Alignment>> {
      Ok(None)
    }
  }

  struct NoopCtx;
  impl ScoringContext for NoopCtx {
    fn calc_score(&self, _calc: crate::model::CalcId, _qpos: i64, _tpos: i64) -> i64 {
      0
    }
  }

  #[test]
  fn submit_degrades_unreachable_to_no_alignment() {
    let model = dummy_model();
    let gam = Gam::new(model, Args::default());
    let mut aligner = FailingAligner(EngineError::Unreachable { region: Region::new(0, 0, 1, 1) });
    let mut ctx = NoopCtx;
    gam.submit(0, 0, &mut aligner, &mut ctx).unwrap();
    assert!(gam.report().is_empty());
  }

  #[test]
  fn submit_propagates_non_degrading_errors() {
    let model = dummy_model();
    let gam = Gam::new(model, Args::default());
    let mut aligner = FailingAligner(EngineError::InvalidArgument("boom".to_string()));
    let mut ctx = NoopCtx;
    assert!(gam.submit(0, 0, &mut aligner, &mut ctx).is_err());
  }

  #[test]
  fn effective_threshold_uses_percent_of_self_when_higher() {
    let model = dummy_model();
    let args = Args { threshold: 10, percent_threshold: 50, ..Default::default() };
    let gam = Gam::new(model, args);
    assert_eq!(gam.effective_threshold(0, 100), 50); // 50% of 100 beats the flat 10
    assert_eq!(gam.effective_threshold(0, 10), 10); // 50% of 10 is 5, flat floor wins
  }
}
