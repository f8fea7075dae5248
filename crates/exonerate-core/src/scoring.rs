//! Scoring interface (spec §4.D): an opaque carrier threaded through every
//! calc, shadow and match lookup. The engine never inspects its contents —
//! substitution matrices, frameshift/intron/NER penalties, and GC-content or
//! splice-site preprocessing all live behind this trait, owned by the
//! caller.
//!
//! Contract: `calc_score` must be pure with respect to `(qpos, tpos)` within
//! one `calc_init` .. `calc_exit` bracket of the same calc; the engine never
//! calls it outside that bracket.

use crate::model::{CalcId, ShadowId, TransitionId};
use crate::region::Region;

pub const IMPOSSIBLY_LOW: i64 = i64::MIN / 4;
pub const IMPOSSIBLY_HIGH: i64 = -IMPOSSIBLY_LOW;

#[inline]
pub fn add_scores(a: i64, b: i64) -> i64 {
  if a <= IMPOSSIBLY_LOW || b <= IMPOSSIBLY_LOW {
    IMPOSSIBLY_LOW
  } else {
    a.saturating_add(b)
  }
}

/// Like [`add_scores`], but for a calc with `overflow_protect` and/or
/// `underflow_protect` set: returns `None` instead of silently saturating
/// once the accumulator reaches or passes `IMPOSSIBLY_HIGH`/`IMPOSSIBLY_LOW`
/// in the protected direction (spec §4.E step 3, §7 `ScoreOverflow`). The
/// caller surfaces `None` as `EngineError::ScoreOverflow`.
#[inline]
pub fn protected_add(a: i64, b: i64, overflow_protect: bool, underflow_protect: bool) -> Option<i64> {
  if a <= IMPOSSIBLY_LOW || b <= IMPOSSIBLY_LOW {
    return Some(IMPOSSIBLY_LOW);
  }
  let sum = a.checked_add(b)?;
  if overflow_protect && sum >= IMPOSSIBLY_HIGH {
    return None;
  }
  if underflow_protect && sum <= IMPOSSIBLY_LOW {
    return None;
  }
  Some(sum)
}

pub trait ScoringContext {
  /// Called once before any `calc_score` call for `calc` within `region`.
  fn calc_init(&mut self, _calc: CalcId, _region: &Region) {}

  /// Called once after the last `calc_score` call for `calc` within
  /// `region`.
  fn calc_exit(&mut self, _calc: CalcId, _region: &Region) {}

  /// The score contributed by taking the transition owning `calc` landing
  /// at `(qpos, tpos)`.
  fn calc_score(&self, calc: CalcId, qpos: i64, tpos: i64) -> i64;

  /// Per-position self-score of a match transition, used by SAR's
  /// HSP-quality filter and by the join mid-point search (spec §4.H).
  /// Default: falls back to `calc_score` of the transition's own calc, which
  /// is correct whenever a match's self-score equals its alignment score
  /// (true for plain substitution-matrix models).
  fn match_self_score(&self, transition: TransitionId, calc: Option<CalcId>, qpos: i64, tpos: i64) -> i64 {
    let _ = transition;
    calc.map_or(0, |c| self.calc_score(c, qpos, tpos))
  }

  /// Whether `(qpos, tpos)` is masked for `transition` (e.g. a repeat-masked
  /// or lowercase position); masked matches do not count toward HSP quality.
  fn is_masked(&self, _transition: TransitionId, _qpos: i64, _tpos: i64) -> bool {
    false
  }

  /// Score to seed the start state with at `(qpos, tpos)`. Default: the
  /// zero vector, as §4.E describes for models without a custom start
  /// hook.
  fn start_cell_score(&self, _qpos: i64, _tpos: i64) -> i64 {
    0
  }

  /// Shadow start hook: records a payload when the path crosses a shadow's
  /// source state.
  fn shadow_start(&self, _shadow: ShadowId, qpos: i64, tpos: i64) -> i64 {
    // Default payload is the crossing position, packed as qpos (the most
    // common use: "remember where we entered").
    let _ = tpos;
    qpos
  }

  /// Shadow end hook: invoked when the path crosses a shadow's destination
  /// transition, with the payload recorded by `shadow_start`.
  fn shadow_end(&mut self, _shadow: ShadowId, _qpos: i64, _tpos: i64, _payload: i64) {}
}

/// A trivial context usable by models whose calcs never need init/exit
/// bracketing and whose scores come from a flat lookup table — good enough
/// for the edit-distance model and for unit tests of the engine itself.
#[derive(Debug, Clone, Default)]
pub struct TableScoringContext {
  pub scores: std::collections::HashMap<CalcId, i64>,
}

impl ScoringContext for TableScoringContext {
  fn calc_score(&self, calc: CalcId, _qpos: i64, _tpos: i64) -> i64 {
    *self.scores.get(&calc).unwrap_or(&0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn protected_add_passes_through_when_unprotected() {
    assert_eq!(protected_add(5, 3, false, false), Some(8));
    assert_eq!(protected_add(IMPOSSIBLY_HIGH, 1, false, false), Some(IMPOSSIBLY_HIGH.saturating_add(1)));
  }

  #[test]
  fn protected_add_flags_overflow() {
    assert_eq!(protected_add(IMPOSSIBLY_HIGH - 1, 2, true, false), None);
    assert_eq!(protected_add(5, 3, true, false), Some(8));
  }

  #[test]
  fn protected_add_flags_underflow() {
    assert_eq!(protected_add(IMPOSSIBLY_LOW + 1, -2, false, true), None);
    assert_eq!(protected_add(-5, -3, false, true), Some(-8));
  }

  #[test]
  fn protected_add_propagates_impossibly_low_regardless_of_flags() {
    assert_eq!(protected_add(IMPOSSIBLY_LOW, 10, true, true), Some(IMPOSSIBLY_LOW));
  }
}
