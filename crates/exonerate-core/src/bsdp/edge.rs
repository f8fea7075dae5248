//! BSDP join edges (spec §4.G).

use super::NodeId;

/// A possible join between two HSP nodes. `join_score` starts as an
/// optimistic upper bound and may only be lowered by [`super::Confirm`]
/// callbacks.
pub struct Edge {
  pub src: NodeId,
  pub dst: NodeId,
  pub join_score: i64,
  pub confirmed: bool,
  /// `path_count` as of the last confirmation, for `update_edge`'s
  /// "has a newer suboptimal clashed since" check.
  pub mailbox: u64,
}

impl Edge {
  pub fn new(src: NodeId, dst: NodeId, join_score: i64) -> Self {
    Self { src, dst, join_score, confirmed: false, mailbox: 0 }
  }
}
