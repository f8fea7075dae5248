//! BSDP node state machine (spec §4.G): `IS_NEW -> IS_INITIALISED ->
//! IS_USED`, represented as a tagged enum per §9's explicit design note
//! ("the three-shape node union becomes a tagged sum") rather than a
//! C-style union distinguishing shape by a side flag.

use super::EdgeId;
use crate::scoring::IMPOSSIBLY_LOW;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
  Start,
  End,
  Both,
  Neither,
}

impl Validity {
  pub fn valid_start(self) -> bool {
    matches!(self, Validity::Start | Validity::Both)
  }
  pub fn valid_end(self) -> bool {
    matches!(self, Validity::End | Validity::Both)
  }
}

pub struct NodeScores {
  pub node_score: i64,
  pub start_score: i64,
  pub end_score: i64,
  pub start_confirmed: bool,
  pub end_confirmed: bool,
  pub validity: Validity,
  /// `mailbox` at which `start_score`/`end_score` were last confirmed, so a
  /// later `region_check_since` can tell whether a newer suboptimal clash
  /// applies (spec §4.I).
  pub start_mailbox: u64,
  pub end_mailbox: u64,
}

pub enum NodeState {
  /// Freshly built; `out_edges` not yet filtered by the join filter.
  Pending,
  /// Initialised: `out_edges` is this node's final outgoing edge set.
  Open,
  /// Used as part of some extracted path.
  Closed { chosen: Option<EdgeId> },
}

pub struct Node {
  pub scores: NodeScores,
  pub state: NodeState,
  pub out_edges: Vec<EdgeId>,
}

impl Node {
  pub fn new(node_score: i64, start_score: i64, end_score: i64, validity: Validity) -> Self {
    Self {
      scores: NodeScores {
        node_score,
        start_score,
        end_score,
        start_confirmed: false,
        end_confirmed: false,
        validity,
        start_mailbox: 0,
        end_mailbox: 0,
      },
      state: NodeState::Pending,
      out_edges: Vec::new(),
    }
  }

  pub fn is_used(&self) -> bool {
    matches!(self.state, NodeState::Closed { .. })
  }

  /// `node_score + end_score` when this node may terminate a path here,
  /// else the sentinel low score.
  pub fn terminal_value(&self) -> i64 {
    if self.scores.validity.valid_end() {
      self.scores.node_score.saturating_add(self.scores.end_score)
    } else {
      IMPOSSIBLY_LOW
    }
  }
}
