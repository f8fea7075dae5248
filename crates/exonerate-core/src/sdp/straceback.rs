//! Traceback DAG with reference-counted cells (spec §4.F "STraceback"):
//! multiple in-flight paths may share tail suffixes, so a cell is pushed by
//! reference rather than by cloning the whole chain.

use crate::model::TransitionId;
use std::rc::Rc;

pub struct TracebackCell {
  pub transition: TransitionId,
  pub length: i64,
  pub prev: Option<Rc<TracebackCell>>,
}

/// Extends `prev` by one step of `transition`, run-length-encoding into the
/// existing tail cell when it's the same transition.
pub fn push(prev: Option<Rc<TracebackCell>>, transition: TransitionId) -> Rc<TracebackCell> {
  if let Some(tail) = &prev {
    if tail.transition == transition {
      return Rc::new(TracebackCell { transition, length: tail.length + 1, prev: tail.prev.clone() });
    }
  }
  Rc::new(TracebackCell { transition, length: 1, prev })
}

/// Walks a cell chain from tail to head, returning `(transition, length)`
/// operations in forward (head-to-tail) order.
pub fn linearize(tail: &Rc<TracebackCell>) -> Vec<(TransitionId, i64)> {
  let mut ops = Vec::new();
  let mut cur = Some(tail.clone());
  while let Some(cell) = cur {
    ops.push((cell.transition, cell.length));
    cur = cell.prev.clone();
  }
  ops.reverse();
  ops
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::arena::Id;

  fn tid(n: u32) -> TransitionId {
    Id::from_index(n)
  }

  #[test]
  fn push_run_length_encodes_repeated_transitions() {
    let mut chain = None;
    chain = Some(push(chain, tid(0)));
    chain = Some(push(chain, tid(0)));
    chain = Some(push(chain, tid(1)));
    let ops = linearize(&chain.unwrap());
    assert_eq!(ops, vec![(tid(0), 2), (tid(1), 1)]);
  }

  #[test]
  fn two_chains_share_a_common_prefix_without_cloning_it() {
    let mut base = None;
    base = Some(push(base, tid(0)));
    let a = push(base.clone(), tid(1));
    let b = push(base.clone(), tid(2));
    assert_eq!(linearize(&a), vec![(tid(0), 1), (tid(1), 1)]);
    assert_eq!(linearize(&b), vec![(tid(0), 1), (tid(2), 1)]);
    // Both tails point at the very same prefix allocation.
    assert!(Rc::ptr_eq(a.prev.as_ref().unwrap(), b.prev.as_ref().unwrap()));
  }
}
