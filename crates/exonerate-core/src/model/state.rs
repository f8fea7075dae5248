use super::{ShadowId, TransitionId};

/// Where in the DP rectangle a path may start or end (spec glossary "Scope").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
  #[default]
  Anywhere,
  Edge,
  Query,
  Target,
  Corner,
}

impl Scope {
  /// True iff a path may start/end at `(qpos, tpos)` within a region of
  /// shape `(qlen, tlen)`.
  pub fn admits(self, qpos: i64, tpos: i64, qlen: i64, tlen: i64) -> bool {
    match self {
      Scope::Anywhere => true,
      Scope::Edge => qpos == 0 || tpos == 0 || qpos == qlen || tpos == tlen,
      Scope::Query => qpos == 0 || qpos == qlen,
      Scope::Target => tpos == 0 || tpos == tlen,
      Scope::Corner => (qpos == 0 || qpos == qlen) && (tpos == 0 || tpos == tlen),
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct State {
  pub inputs: Vec<TransitionId>,
  pub outputs: Vec<TransitionId>,
  pub shadows_starting_here: Vec<ShadowId>,
}

impl State {
  pub fn new() -> Self {
    Self::default()
  }
}
