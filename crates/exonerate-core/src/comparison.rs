//! HSPs and the orientation bookkeeping that wraps them (spec §3 "HSP
//! (external)", glossary "HSP"/"cobs"). HSPs themselves are produced by an
//! external seeder (out of scope, §1); this module is the data shape the
//! rest of the engine consumes.

/// A high-scoring segment pair: a short ungapped alignment.
///
/// `cobs` (Centre Offset By Score) is an index within the HSP, in word
/// units, locating the score centre — SAR uses it to split the HSP into an
/// "already scored" part and a "still to score" part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsp {
  pub query_start: i64,
  pub target_start: i64,
  /// Length in word (portal) units, not bases.
  pub length: i64,
  pub score: i64,
  pub cobs: i64,
}

impl Hsp {
  pub fn query_end(&self, advance_q: i64) -> i64 {
    self.query_start + self.length * advance_q
  }

  pub fn target_end(&self, advance_t: i64) -> i64 {
    self.target_start + self.length * advance_t
  }

  pub fn query_cobs(&self, advance_q: i64) -> i64 {
    self.query_start + self.cobs * advance_q
  }

  pub fn target_cobs(&self, advance_t: i64) -> i64 {
    self.target_start + self.cobs * advance_t
  }

  /// The HSP's diagonal in the (query, target) plane. Recomputed on demand
  /// rather than cached on the HSP (spec §9 Open Question 4): `Hsp` is
  /// small and `Copy`, shared read-only across threads, so recomputation is
  /// O(1) and avoids the latent-cache hazard the original flags.
  pub fn diagonal(&self) -> i64 {
    self.target_start - self.query_start
  }
}

/// A set of HSPs for one (query, target) pair, sharing one portal's
/// advance-pair.
#[derive(Debug, Clone)]
pub struct HspSet {
  pub advance_q: i64,
  pub advance_t: i64,
  pub hsps: Vec<Hsp>,
}

impl HspSet {
  pub fn new(advance_q: i64, advance_t: i64, hsps: Vec<Hsp>) -> Self {
    Self { advance_q, advance_t, hsps }
  }
}

/// Orientation of a (query, target) comparison: whether the pair has been
/// swapped (target treated as query) and/or reverse-complemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Comparison {
  pub swapped: bool,
  pub revcomped: bool,
}

impl Comparison {
  /// Swapping query and target is its own inverse.
  pub fn swap(self) -> Comparison {
    Comparison { swapped: !self.swapped, revcomped: self.revcomped }
  }

  pub fn revcomp(self) -> Comparison {
    Comparison { swapped: self.swapped, revcomped: !self.revcomped }
  }
}

/// Reverse-complement an HSP's query-side coordinates within a query of
/// length `query_len`. Applying this twice returns the original
/// coordinates (spec §8 invariant 10).
pub fn revcomp_hsp(hsp: &Hsp, query_len: i64) -> Hsp {
  Hsp {
    query_start: query_len - (hsp.query_start + hsp.length),
    target_start: hsp.target_start,
    length: hsp.length,
    score: hsp.score,
    cobs: hsp.length - 1 - hsp.cobs,
  }
}
