//! `exonerate-rs`: parses arguments (§6), reads two FASTA files, seeds HSPs
//! with a minimal exact-k-mer stand-in (§6, `seeder`), runs one alignment
//! job per (query, target) pair through GAM, and prints the results as
//! JSON via `exonerate_core::io::json`.
//!
//! Simplification (documented in `DESIGN.md`): the demo aligner here
//! reports each alignment's score and the HSP anchors BSDP selected, not a
//! base-exact traceback through the gaps between them — turning a BSDP
//! path into an exact operation list means re-running Viterbi inside every
//! edge's SAR region, which `exonerate-core` supports (component H/E) but
//! which this CLI does not yet stitch together end to end.

mod cli;
mod global_init;
mod seeder;

use bio::io::fasta;
use clap::Parser;
use cli::{Args, ModelKind, RefineMode};
use eyre::{Context, Result};
use exonerate_core::gam::{Aligner, Args as GamArgs, Gam, Refinement};
use exonerate_core::heuristic::Heuristic;
use exonerate_core::hpair::{HPair, Portal};
use exonerate_core::model::{ClosedC4Model, Label};
use exonerate_core::region::SubOpt;
use exonerate_core::scoring::ScoringContext;
use exonerate_core::{Alignment, Region};
use log::{info, warn};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// A flat per-calc scorer: the match calc is scored by byte identity when
/// the model's match transition advances `(1, 1)`; every other calc
/// (gaps, frameshift, splice sites, NER) uses one fixed per-crossing score.
/// A real embedder supplies a substitution matrix and real splice-site
/// models here instead (spec §4.D: this is exactly the seam `ScoringContext`
/// exists for).
struct FlatContext<'a> {
  query: &'a [u8],
  target: &'a [u8],
  match_calc: exonerate_core::model::CalcId,
  match_advance: (i64, i64),
  match_score: i64,
  mismatch_score: i64,
  flat: HashMap<exonerate_core::model::CalcId, i64>,
}

impl ScoringContext for FlatContext<'_> {
  fn calc_score(&self, calc: exonerate_core::model::CalcId, qpos: i64, tpos: i64) -> i64 {
    if calc == self.match_calc && self.match_advance == (1, 1) {
      let (q, t) = (qpos as usize, tpos as usize);
      if q < self.query.len() && t < self.target.len() && self.query[q] == self.target[t] {
        self.match_score
      } else {
        self.mismatch_score
      }
    } else {
      *self.flat.get(&calc).unwrap_or(&0)
    }
  }
}

type CalcScores = HashMap<exonerate_core::model::CalcId, i64>;

fn build_model(
  kind: ModelKind,
  args: &exonerate_core::models::ModelArgs,
) -> Result<(Arc<ClosedC4Model>, exonerate_core::model::CalcId, i64, i64, CalcScores)> {
  use exonerate_core::models::{affine::AffineKind, *};
  let (model, match_calc, flat): (ClosedC4Model, _, Vec<(exonerate_core::model::CalcId, i64)>) = match kind {
    ModelKind::Ungapped => {
      let (m, c) = ungapped::build(false)?;
      (m, c.match_calc, vec![])
    }
    ModelKind::UngappedTrans => {
      let (m, c) = ungapped::build(true)?;
      (m, c.match_calc, vec![])
    }
    ModelKind::AffineGlobal => {
      let (m, c) = affine::build(AffineKind::Global, args)?;
      (m, c.match_calc, vec![(c.gap_open_calc, args.gap_open), (c.gap_extend_calc, args.gap_extend)])
    }
    ModelKind::AffineBestfit => {
      let (m, c) = affine::build(AffineKind::Bestfit, args)?;
      (m, c.match_calc, vec![(c.gap_open_calc, args.gap_open), (c.gap_extend_calc, args.gap_extend)])
    }
    ModelKind::AffineLocal => {
      let (m, c) = affine::build(AffineKind::Local, args)?;
      (m, c.match_calc, vec![(c.gap_open_calc, args.gap_open), (c.gap_extend_calc, args.gap_extend)])
    }
    ModelKind::AffineOverlap => {
      let (m, c) = affine::build(AffineKind::Overlap, args)?;
      (m, c.match_calc, vec![(c.gap_open_calc, args.gap_open), (c.gap_extend_calc, args.gap_extend)])
    }
    ModelKind::Est2genome => {
      let (m, c) = est2genome::build(args)?;
      (
        m,
        c.match_calc,
        vec![
          (c.gap_open_calc, args.gap_open),
          (c.gap_extend_calc, args.gap_extend),
          (c.five_prime_calc, args.five_prime_ss),
          (c.three_prime_calc, args.three_prime_ss),
        ],
      )
    }
    ModelKind::Ner => {
      let (m, c) = ner::build(args)?;
      (m, c.match_calc, vec![(c.gap_open_calc, args.gap_open), (c.gap_extend_calc, args.gap_extend), (c.ner_calc, args.ner_penalty)])
    }
    ModelKind::Protein2dna => {
      let (m, c) = protein2dna::build(args, false)?;
      (
        m,
        c.match_calc,
        vec![(c.gap_open_calc, args.gap_open), (c.gap_extend_calc, args.gap_extend), (c.frameshift_calc, args.frameshift_penalty)],
      )
    }
    ModelKind::Protein2dnaBestfit => {
      let (m, c) = protein2dna::build(args, true)?;
      (
        m,
        c.match_calc,
        vec![(c.gap_open_calc, args.gap_open), (c.gap_extend_calc, args.gap_extend), (c.frameshift_calc, args.frameshift_penalty)],
      )
    }
    ModelKind::Protein2genome => {
      let (m, c) = protein2genome::build(args, false)?;
      (
        m,
        c.match_calc,
        vec![
          (c.gap_open_calc, args.gap_open),
          (c.gap_extend_calc, args.gap_extend),
          (c.frameshift_calc, args.frameshift_penalty),
          (c.five_prime_calc, args.five_prime_ss),
          (c.three_prime_calc, args.three_prime_ss),
        ],
      )
    }
    ModelKind::Protein2genomeBestfit => {
      let (m, c) = protein2genome::build(args, true)?;
      (
        m,
        c.match_calc,
        vec![
          (c.gap_open_calc, args.gap_open),
          (c.gap_extend_calc, args.gap_extend),
          (c.frameshift_calc, args.frameshift_penalty),
          (c.five_prime_calc, args.five_prime_ss),
          (c.three_prime_calc, args.three_prime_ss),
        ],
      )
    }
    ModelKind::Coding2coding => {
      let (m, c) = coding2coding::build(args)?;
      (
        m,
        c.match_calc,
        vec![(c.gap_open_calc, args.gap_open), (c.gap_extend_calc, args.gap_extend), (c.frameshift_calc, args.frameshift_penalty)],
      )
    }
    ModelKind::Coding2genome => {
      let (m, c) = coding2genome::build(args)?;
      (
        m,
        c.coding.match_calc,
        vec![
          (c.coding.gap_open_calc, args.gap_open),
          (c.coding.gap_extend_calc, args.gap_extend),
          (c.coding.frameshift_calc, args.frameshift_penalty),
          (c.five_prime_calc, args.five_prime_ss),
          (c.three_prime_calc, args.three_prime_ss),
        ],
      )
    }
    ModelKind::Cdna2genome => {
      let (m, c) = cdna2genome::build(args)?;
      (
        m,
        c.coding.match_calc,
        vec![
          (c.coding.gap_open_calc, args.gap_open),
          (c.coding.gap_extend_calc, args.gap_extend),
          (c.coding.frameshift_calc, args.frameshift_penalty),
          (c.five_prime_calc, args.five_prime_ss),
          (c.three_prime_calc, args.three_prime_ss),
          (c.utr_calc, 0), // flat/neutral UTR scoring; a real embedder wires a real UTR model here
        ],
      )
    }
    ModelKind::Genome2genome => {
      let (m, c) = genome2genome::build(args)?;
      (
        m,
        c.coding.match_calc,
        vec![
          (c.coding.gap_open_calc, args.gap_open),
          (c.coding.gap_extend_calc, args.gap_extend),
          (c.coding.frameshift_calc, args.frameshift_penalty),
          (c.target_five_prime_calc, args.five_prime_ss),
          (c.target_three_prime_calc, args.three_prime_ss),
          (c.query_five_prime_calc, args.five_prime_ss),
          (c.query_three_prime_calc, args.three_prime_ss),
        ],
      )
    }
  };
  let match_advance = {
    let t = model.transition(model.select_transitions(Label::Match)[0]);
    (t.advance_q, t.advance_t)
  };
  let model = Arc::new(model);
  let flat_scores: HashMap<_, _> = flat.into_iter().collect();
  Ok((model, match_calc, match_advance.0, match_advance.1, flat_scores))
}

/// One (query, target) job's `Aligner`: builds HSPs via the seeder, wraps
/// them in HPair, and enumerates BSDP paths as candidate alignments.
struct JobAligner {
  model: Arc<ClosedC4Model>,
  hpair: HPair,
  subopt: SubOpt,
  qlen: i64,
  tlen: i64,
}

impl Aligner for JobAligner {
  fn align(&mut self, _query_id: exonerate_core::gam::QueryId, _ctx: &mut dyn ScoringContext) -> exonerate_core::Result<Vec<Alignment>> {
    let mut out = Vec::new();
    while let Some(path) = self.hpair.next_path(i64::MIN / 4, &mut self.subopt) {
      let mut qs = self.qlen;
      let mut qe = 0;
      let mut ts = self.tlen;
      let mut te = 0;
      let mut operations = Vec::new();
      for &node in &path.nodes {
        if let Some(hsp) = self.hpair.node_hsp(node) {
          if let Some(transition) = self.hpair.node_transition(node) {
            let (aq, at) = {
              let t = self.model.transition(transition);
              (t.advance_q, t.advance_t)
            };
            qs = qs.min(hsp.query_start);
            ts = ts.min(hsp.target_start);
            qe = qe.max(hsp.query_end(aq));
            te = te.max(hsp.target_end(at));
            operations.push((transition, hsp.length));
          }
        }
      }
      if operations.is_empty() {
        continue;
      }
      let region = Region::new(qs, ts, (qe - qs).max(0), (te - ts).max(0));
      let alignment = Alignment::new(path.score, region, operations, self.model.clone());
      self.subopt.add_alignment(&alignment.match_word_steps());
      out.push(alignment);
      if out.len() >= 64 {
        break; // a hard safety cap; GAM applies the real best-n/threshold policy
      }
    }
    Ok(out)
  }

  fn refine(
    &mut self,
    _query_id: exonerate_core::gam::QueryId,
    _alignment: &Alignment,
    _refinement: Refinement,
    _boundary: i64,
    _ctx: &mut dyn ScoringContext,
  ) -> exonerate_core::Result<Option<Alignment>> {
    // Full-rectangle/grown-region Viterbi re-run (spec §4.J "Refinement")
    // isn't wired up in this demo CLI; see the module doc comment.
    Ok(None)
  }
}

fn main() -> Result<()> {
  let args = Args::parse();
  global_init::global_init(args.verbose as i8);

  let model_args = exonerate_core::models::ModelArgs { frameshift_penalty: args.frameshift, ..Default::default() };
  let (model, match_calc, advance_q, advance_t, flat_scores) = build_model(args.model, &model_args).wrap_err("failed to build model")?;

  let queries = read_fasta(&args.query).wrap_err_with(|| format!("failed to read query FASTA '{}'", args.query.display()))?;
  let targets = read_fasta(&args.target).wrap_err_with(|| format!("failed to read target FASTA '{}'", args.target.display()))?;

  let matches: Vec<_> = model.select_transitions(Label::Match);
  let mut ctx = FlatContext {
    query: &[],
    target: &[],
    match_calc,
    match_advance: (advance_q, advance_t),
    match_score: 3,
    mismatch_score: -3,
    flat: flat_scores.clone(),
  };
  let heuristic = Heuristic::build(&model, &matches, (args.terminalrangeint, args.terminalrangeint), (args.terminalrangeext, args.terminalrangeext), args.quality, &mut ctx)
    .wrap_err("failed to build heuristic bound matrices")?;

  let gam_args = GamArgs {
    threshold: args.score,
    percent_threshold: args.percent,
    best_n: args.bestn,
    use_subopt: args.subopt,
    use_gapped_extension: args.gappedextension,
    refinement: match args.refine {
      RefineMode::None => Refinement::None,
      RefineMode::Region => Refinement::Region,
      RefineMode::Full => Refinement::Full,
    },
    refinement_boundary: args.refineboundary,
  };
  let gam = Gam::new(model.clone(), gam_args);

  // One (query, target) pair per job, run across a pool sized from
  // `--num-threads` (0 = available parallelism); each job builds its own
  // thread-local scoring context, HPair and SubOpt scratch state and
  // submits straight to the shared `Gam` (spec §5).
  struct Job<'a> {
    qid: usize,
    query: &'a Record,
    target: &'a Record,
  }
  let jobs: Vec<Job<'_>> =
    queries.iter().enumerate().flat_map(|(qid, query)| targets.iter().map(move |target| Job { qid, query, target })).collect();

  let pool = rayon::ThreadPoolBuilder::new().num_threads(args.num_threads).build().wrap_err("failed to build thread pool")?;

  pool.install(|| -> Result<()> {
    jobs.par_iter().try_for_each(|job| -> Result<()> {
      let ctx = FlatContext {
        query: &job.query.seq,
        target: &job.target.seq,
        match_calc,
        match_advance: (advance_q, advance_t),
        match_score: 3,
        mismatch_score: -3,
        flat: flat_scores.clone(),
      };
      let mut ctx: Box<dyn ScoringContext> = Box::new(ctx);

      let hsps = seeder::find_exact_kmers(&job.query.seq, &job.target.seq, 8, 3);
      if hsps.is_empty() {
        warn!("no seeds found for query {} against '{}'", job.qid, job.target.id);
        return Ok(());
      }
      let portals = vec![Portal { advance_q, advance_t, match_transition: matches[0], hsps: hsps.clone() }];
      let self_scores: Vec<_> = hsps.iter().map(|h| (h.score, h.score)).collect();
      let hpair =
        HPair::build(&portals, &self_scores, &heuristic, job.query.seq.len() as i64, job.target.seq.len() as i64, args.joinfilter, args.score);

      let mut aligner = JobAligner {
        model: model.clone(),
        hpair,
        subopt: SubOpt::new(),
        qlen: job.query.seq.len() as i64,
        tlen: job.target.seq.len() as i64,
      };
      let self_score = hsps.iter().map(|h| h.score).max().unwrap_or(0);
      gam.submit(job.qid as u64, self_score, &mut aligner, ctx.as_mut()).wrap_err("alignment job failed")
    })
  })?;

  let results = gam.report();
  println!("{}", exonerate_core::io::json::json_stringify(&results.iter().map(summarize).collect::<Vec<_>>())?);
  info!("reported {} alignments", results.len());
  Ok(())
}

#[derive(serde::Serialize)]
struct AlignmentSummary {
  score: i64,
  query_start: i64,
  query_end: i64,
  target_start: i64,
  target_end: i64,
}

fn summarize(a: &Alignment) -> AlignmentSummary {
  AlignmentSummary { score: a.score, query_start: a.region.qs, query_end: a.region.qend(), target_start: a.region.ts, target_end: a.region.tend() }
}

struct Record {
  id: String,
  seq: Vec<u8>,
}

fn read_fasta(path: &std::path::Path) -> Result<Vec<Record>> {
  let reader = fasta::Reader::from_file(path)?;
  let mut out = Vec::new();
  for result in reader.records() {
    let record = result?;
    out.push(Record { id: record.id().to_owned(), seq: record.seq().to_vec() });
  }
  Ok(out)
}
