//! A library of named C4 models (spec §4.K): each submodule builds a closed
//! model plus a "calcs" struct naming the [`crate::model::CalcId`]s the
//! caller's [`crate::scoring::ScoringContext`] must know how to score.
//!
//! None of these models pick their own penalties — every builder takes a
//! [`ModelArgs`], and [`ModelArgs::default()`] is the one source of truth
//! for default scoring constants the CLI and tests both build from,
//! mirroring nextclade's `AlignPairwiseParams::default()`.

pub mod affine;
pub mod cdna2genome;
pub mod coding2coding;
pub mod coding2genome;
pub mod est2genome;
pub mod genome2genome;
pub mod ner;
pub mod protein2dna;
pub mod protein2genome;
pub mod ungapped;

/// Shared scoring constants across the library. Not every model uses every
/// field — `affine_local` ignores the intron/frameshift fields entirely —
/// but one struct keeps the CLI's argument surface and the models'
/// defaults from drifting apart.
#[derive(Debug, Clone, Copy)]
pub struct ModelArgs {
  pub gap_open: i64,
  pub gap_extend: i64,
  pub frameshift_penalty: i64,
  pub min_intron: i64,
  pub max_intron: i64,
  pub five_prime_ss: i64,
  pub three_prime_ss: i64,
  pub ner_penalty: i64,
}

impl Default for ModelArgs {
  fn default() -> Self {
    Self {
      gap_open: -12,
      gap_extend: -4,
      frameshift_penalty: -28,
      min_intron: 30,
      max_intron: 200_000,
      five_prime_ss: 4,
      three_prime_ss: 4,
      ner_penalty: -5,
    }
  }
}
