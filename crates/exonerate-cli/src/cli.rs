//! Command-line argument surface (spec §6 "Argument surface"), as
//! `#[clap(long)]` fields the way nextclade-cli's args structs are laid
//! out: one flat struct, one doc comment per field becoming its `--help`
//! text.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ModelKind {
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

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum RefineMode {
  #[default]
  None,
  Region,
  Full,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "exonerate-rs", about = "Sequence-alignment dynamic-programming engine")]
pub struct Args {
  /// FASTA file of query sequences.
  #[arg(long)]
  pub query: PathBuf,

  /// FASTA file of target sequences.
  #[arg(long)]
  pub target: PathBuf,

  /// Selects one of the twelve predefined C4 models.
  #[arg(long, value_enum, default_value_t = ModelKind::AffineLocal)]
  pub model: ModelKind,

  /// Absolute score threshold.
  #[arg(long, default_value_t = i64::MIN / 4)]
  pub score: i64,

  /// Percent-of-self score threshold.
  #[arg(long, default_value_t = 0)]
  pub percent: i64,

  /// Keep N best alignments per query (0 = unbounded).
  #[arg(long, default_value_t = 0)]
  pub bestn: usize,

  /// Enable suboptimal enumeration.
  #[arg(long, default_value_t = false)]
  pub subopt: bool,

  /// Use SDP (true) or BSDP (false) for gapped models.
  #[arg(long, default_value_t = true)]
  pub gappedextension: bool,

  /// Refinement pass after a heuristic alignment: none, region, or full.
  #[arg(long, value_enum, default_value_t = RefineMode::None)]
  pub refine: RefineMode,

  /// Grow the alignment region by this many positions when refining.
  #[arg(long, default_value_t = 0)]
  pub refineboundary: i64,

  /// BSDP per-node edge-admission cap (0 = unlimited).
  #[arg(long, default_value_t = 0)]
  pub joinfilter: usize,

  /// Heuristic terminal bound-matrix internal range.
  #[arg(long, default_value_t = 12)]
  pub terminalrangeint: i64,

  /// Heuristic terminal bound-matrix external range.
  #[arg(long, default_value_t = 32)]
  pub terminalrangeext: i64,

  /// Heuristic join bound-matrix internal range.
  #[arg(long, default_value_t = 12)]
  pub joinrangeint: i64,

  /// Heuristic join bound-matrix external range.
  #[arg(long, default_value_t = 32)]
  pub joinrangeext: i64,

  /// Heuristic span bound-matrix internal range.
  #[arg(long, default_value_t = 12)]
  pub spanrangeint: i64,

  /// Heuristic span bound-matrix external range.
  #[arg(long, default_value_t = 32)]
  pub spanrangeext: i64,

  /// Frameshift penalty (negative).
  #[arg(long, default_value_t = -28)]
  pub frameshift: i64,

  /// HSP-quality percent threshold in SAR.
  #[arg(long, default_value_t = 0)]
  pub quality: i64,

  /// SDP dropoff below best.
  #[arg(long, default_value_t = i64::MIN / 4)]
  pub dropoff: i64,

  /// SDP single-pass suboptimal mode.
  #[arg(long, default_value_t = false)]
  pub singlepasssubopt: bool,

  /// Byte cap before Viterbi switches to reduced-space.
  #[arg(long, default_value_t = 100_000_000)]
  pub traceback_memory_limit: u64,

  /// Number of worker threads (0 = available parallelism).
  #[arg(long, default_value_t = 0)]
  pub num_threads: usize,

  /// Verbosity: repeat for more detail (-v, -vv, -vvv).
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,
}
