//! A minimal exact-k-mer seeder — a stand-in for the external HSP seeder
//! spec.md's OVERVIEW explicitly treats as out of scope (§1, §6). This is
//! the one place the CLI fills an externally-owned role, only enough to
//! make the binary runnable end to end; it never claims to replace a real
//! seeder (no mismatches, no scoring matrix, no gapped extension).
//!
//! Finds every exact match of length `k` between query and target, merges
//! adjacent matches on the same diagonal into one HSP, and sets `cobs` to
//! the HSP's midpoint (word units).

use exonerate_core::Hsp;
use std::collections::HashMap;

pub fn find_exact_kmers(query: &[u8], target: &[u8], k: usize, match_score: i64) -> Vec<Hsp> {
  if k == 0 || query.len() < k || target.len() < k {
    return Vec::new();
  }

  let mut target_index: HashMap<&[u8], Vec<i64>> = HashMap::new();
  for i in 0..=target.len() - k {
    target_index.entry(&target[i..i + k]).or_default().push(i as i64);
  }

  let mut raw = Vec::new();
  for qi in 0..=query.len() - k {
    let word = &query[qi..qi + k];
    if let Some(positions) = target_index.get(word) {
      for &ti in positions {
        raw.push((qi as i64, ti));
      }
    }
  }
  raw.sort_unstable_by_key(|&(qi, ti)| (ti - qi, qi));

  // Merge consecutive same-diagonal k-mer hits into maximal runs, each one
  // HSP of `length` word units at `advance_q = advance_t = 1`.
  let mut hsps = Vec::new();
  let mut i = 0;
  while i < raw.len() {
    let (diag, mut run_end_q) = (raw[i].0 - raw[i].1, raw[i].0);
    let start_q = raw[i].0;
    let start_t = raw[i].1;
    let mut j = i + 1;
    while j < raw.len() && raw[j].0 - raw[j].1 == diag && raw[j].0 <= run_end_q + 1 {
      run_end_q = raw[j].0;
      j += 1;
    }
    let length = (run_end_q - start_q) + k as i64;
    hsps.push(Hsp { query_start: start_q, target_start: start_t, length, score: length * match_score, cobs: length / 2 });
    i = j;
  }
  hsps
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn finds_an_exact_match() {
    let query = b"ACGTACGT";
    let target = b"TTTTACGTACGTTTTT";
    let hsps = find_exact_kmers(query, target, 4, 1);
    assert!(!hsps.is_empty());
    assert!(hsps.iter().any(|h| h.target_start == 4 && h.length >= 8));
  }

  #[test]
  fn no_match_below_k_yields_nothing() {
    assert!(find_exact_kmers(b"AC", b"ACGTACGT", 4, 1).is_empty());
  }
}
