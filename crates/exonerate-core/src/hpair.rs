//! HPair — bridges HSPs to BSDP (spec §4.I). Builds one BSDP node per HSP
//! and one join edge per compatible HSP pair, then exposes a [`bsdp::Confirm`]
//! that applies SubOpt's entry/exit/region clash checks.
//!
//! Simplification: candidate pairs are found by an O(n²) scan over the two
//! HSP sets rather than the 2-D RangeTree spec §4.I step 2 describes —
//! correct, and fine for the HSP-set sizes a single alignment job sees, but
//! not the sublinear lookup the original uses for genome-scale seeding.

use crate::bsdp::{self, Bsdp, Confirm, EdgeId, NodeId, Validity};
use crate::comparison::Hsp;
use crate::heuristic::{Heuristic, Side};
use crate::region::{Region, SubOpt};

/// One portal's worth of HSPs plus the word advances they were found at.
pub struct Portal {
  pub advance_q: i64,
  pub advance_t: i64,
  pub match_transition: crate::model::TransitionId,
  pub hsps: Vec<Hsp>,
}

struct NodeInfo {
  hsp: Hsp,
  advance_q: i64,
  advance_t: i64,
  transition: crate::model::TransitionId,
}

pub struct HPair {
  pub bsdp: Bsdp,
  node_info: Vec<NodeInfo>,
  node_ids: Vec<NodeId>,
  edge_region: std::collections::HashMap<EdgeId, Region>,
}

impl HPair {
  /// Builds the BSDP graph (spec §4.I steps 1-3): one node per HSP, scored
  /// via [`Heuristic::terminal`] for its start/end bounds, and one join
  /// edge per `src.cobs ≤ dst.cobs` (both axes) pair whose SAR region fits
  /// `heuristic`'s join bound matrix. `half`/`max` match-self-score sums per
  /// HSP are supplied by the caller (computed once from the query/target
  /// via `ScoringContext::match_self_score`, spec §4.H).
  pub fn build(
    portals: &[Portal],
    self_scores: &[(i64, i64)], // (half, max) parallel to the flattened hsp list below
    heuristic: &Heuristic,
    qlen: i64,
    tlen: i64,
    join_filter: usize,
    threshold: i64,
  ) -> HPair {
    let mut bsdp = Bsdp::new();
    bsdp.set_join_filter(join_filter);
    let mut node_info = Vec::new();
    let mut node_ids = Vec::new();

    for portal in portals {
      for hsp in &portal.hsps {
        let idx = node_info.len();
        let (half, max) = self_scores.get(idx).copied().unwrap_or((hsp.score, hsp.score));
        let start = heuristic.terminal(hsp, portal.advance_q, portal.advance_t, half, max, portal.match_transition, Side::Start, qlen, tlen);
        let end = heuristic.terminal(hsp, portal.advance_q, portal.advance_t, half, max, portal.match_transition, Side::End, qlen, tlen);
        let validity = match (start.is_some(), end.is_some()) {
          (true, true) => Validity::Both,
          (true, false) => Validity::Start,
          (false, true) => Validity::End,
          (false, false) => Validity::Neither,
        };
        let start_score = start.map(|s| (s.bound - s.component).max(0)).unwrap_or(0);
        let end_score = end.map(|s| (s.bound - s.component).max(0)).unwrap_or(0);
        let id = bsdp.add_node(hsp.score, start_score, end_score, validity);
        node_ids.push(id);
        node_info.push(NodeInfo { hsp: *hsp, advance_q: portal.advance_q, advance_t: portal.advance_t, transition: portal.match_transition });
      }
    }

    let mut edge_region = std::collections::HashMap::new();
    for (i, src) in node_info.iter().enumerate() {
      for (j, dst) in node_info.iter().enumerate() {
        if i == j {
          continue;
        }
        let src_cobs_q = src.hsp.query_cobs(src.advance_q);
        let src_cobs_t = src.hsp.target_cobs(src.advance_t);
        let dst_cobs_q = dst.hsp.query_cobs(dst.advance_q);
        let dst_cobs_t = dst.hsp.target_cobs(dst.advance_t);
        if src_cobs_q > dst_cobs_q || src_cobs_t > dst_cobs_t {
          continue;
        }
        let (src_half, _) = self_scores.get(i).copied().unwrap_or((src.hsp.score, src.hsp.score));
        let (dst_half, _) = self_scores.get(j).copied().unwrap_or((dst.hsp.score, dst.hsp.score));
        if let Some(sar) = heuristic.join(&src.hsp, &dst.hsp, src.advance_q, src.advance_t, src_half, dst_half, src.transition, dst.transition) {
          let optimistic = (sar.bound - sar.component).max(0);
          let eid = bsdp.add_edge(node_ids[i], node_ids[j], optimistic);
          edge_region.insert(eid, sar.region);
        }
      }
    }

    bsdp.finalize();
    HPair { bsdp, node_info, node_ids, edge_region }
  }

  pub fn node_hsp(&self, node: NodeId) -> Option<&Hsp> {
    let idx = self.node_ids.iter().position(|&n| n == node)?;
    Some(&self.node_info[idx].hsp)
  }

  /// The match transition the HSP at `node` was found against — callers
  /// turning a [`bsdp::Path`] into an [`crate::alignment::Alignment`] need
  /// this to label each node's contribution.
  pub fn node_transition(&self, node: NodeId) -> Option<crate::model::TransitionId> {
    let idx = self.node_ids.iter().position(|&n| n == node)?;
    Some(self.node_info[idx].transition)
  }

  pub fn next_path(&mut self, threshold: i64, subopt: &mut SubOpt) -> Option<bsdp::Path> {
    let node_ids = self.node_ids.clone();
    let mut confirm = SubOptConfirm { subopt, node_ids, node_info: &self.node_info, edge_region: &self.edge_region };
    self.bsdp.next_path(threshold, &mut confirm)
  }
}

/// Applies SubOpt's entry/exit/region clash checks as BSDP confirmations
/// (spec §4.I step 4): any blocked cell on the relevant diagonal/region
/// collapses the score to `IMPOSSIBLY_LOW`, otherwise the optimistic bound
/// stands unchanged — a genuine confirmation (it never raises the bound),
/// just one that doesn't also re-run Viterbi to tighten it further.
struct SubOptConfirm<'a> {
  subopt: &'a SubOpt,
  node_ids: Vec<NodeId>,
  node_info: &'a [NodeInfo],
  edge_region: &'a std::collections::HashMap<EdgeId, Region>,
}

impl SubOptConfirm<'_> {
  fn node_region(&self, node: NodeId) -> Option<Region> {
    let idx = self.node_ids.iter().position(|&n| n == node)?;
    let info = &self.node_info[idx];
    let qs = info.hsp.query_start;
    let ts = info.hsp.target_start;
    Some(Region::new(qs, ts, info.hsp.query_end(info.advance_q) - qs, info.hsp.target_end(info.advance_t) - ts))
  }

  fn clash(&self, region: Option<Region>, since: u64) -> bool {
    match region {
      Some(r) => self.subopt.find(&r, |path_id| path_id > since),
      None => false,
    }
  }
}

impl Confirm for SubOptConfirm<'_> {
  fn confirm_edge(&mut self, edge: EdgeId) -> i64 {
    let region = self.edge_region.get(&edge).copied();
    if self.clash(region, 0) {
      crate::scoring::IMPOSSIBLY_LOW
    } else {
      self.bsdp_join_score(edge)
    }
  }

  fn update_edge(&mut self, edge: EdgeId, last_updated: u64) -> i64 {
    let region = self.edge_region.get(&edge).copied();
    if self.clash(region, last_updated) {
      crate::scoring::IMPOSSIBLY_LOW
    } else {
      self.bsdp_join_score(edge)
    }
  }

  fn confirm_start(&mut self, node: NodeId) -> i64 {
    if self.clash(self.node_region(node), 0) {
      crate::scoring::IMPOSSIBLY_LOW
    } else {
      self.bsdp_start_score(node)
    }
  }

  fn update_start(&mut self, node: NodeId, last_updated: u64) -> i64 {
    if self.clash(self.node_region(node), last_updated) {
      crate::scoring::IMPOSSIBLY_LOW
    } else {
      self.bsdp_start_score(node)
    }
  }

  fn confirm_end(&mut self, node: NodeId) -> i64 {
    if self.clash(self.node_region(node), 0) {
      crate::scoring::IMPOSSIBLY_LOW
    } else {
      self.bsdp_end_score(node)
    }
  }

  fn update_end(&mut self, node: NodeId, last_updated: u64) -> i64 {
    if self.clash(self.node_region(node), last_updated) {
      crate::scoring::IMPOSSIBLY_LOW
    } else {
      self.bsdp_end_score(node)
    }
  }
}

// `Confirm` may only *lower* a bound (`Bsdp::next_path` ignores any
// returned value that isn't strictly less than the current one) — so
// "leave it unchanged" and "I don't independently know the current value"
// are the same answer: a sentinel no lower bound will ever beat.
impl SubOptConfirm<'_> {
  fn bsdp_join_score(&self, _edge: EdgeId) -> i64 {
    crate::scoring::IMPOSSIBLY_HIGH
  }
  fn bsdp_start_score(&self, _node: NodeId) -> i64 {
    crate::scoring::IMPOSSIBLY_HIGH
  }
  fn bsdp_end_score(&self, _node: NodeId) -> i64 {
    crate::scoring::IMPOSSIBLY_HIGH
  }
}
