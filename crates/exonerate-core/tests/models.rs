//! One smoke test per model in the library (spec §4.K): every builder must
//! close successfully, expose exactly the match transition its docs claim
//! (advance pair, scope), and name the calc its own `*Calcs` struct says it
//! does.

use exonerate_core::model::Label;
use exonerate_core::models::{
  affine, cdna2genome, coding2coding, coding2genome, est2genome, genome2genome, ner, protein2dna, protein2genome, ungapped, ModelArgs,
};

fn only_match_advance(model: &exonerate_core::ClosedC4Model) -> (i64, i64) {
  let matches = model.select_transitions(Label::Match);
  assert_eq!(matches.len(), 1, "expected exactly one match transition");
  let t = model.transition(matches[0]);
  (t.advance_q, t.advance_t)
}

#[test]
fn ungapped_has_a_single_one_to_one_match_and_no_gaps() {
  let (model, calcs) = ungapped::build(false).unwrap();
  assert_eq!(only_match_advance(&model), (1, 1));
  assert!(model.select_transitions(Label::Gap).is_empty());
  assert_eq!(model.transition(model.select_transitions(Label::Match)[0]).calc, Some(calcs.match_calc));
}

#[test]
fn ungapped_trans_matches_one_codon_to_one_residue() {
  let (model, _) = ungapped::build(true).unwrap();
  assert_eq!(only_match_advance(&model), (1, 3));
}

#[test]
fn affine_variants_all_build_with_gapped_states() {
  let args = ModelArgs::default();
  for kind in [affine::AffineKind::Global, affine::AffineKind::Bestfit, affine::AffineKind::Local, affine::AffineKind::Overlap] {
    let (model, calcs) = affine::build(kind, &args).unwrap();
    assert_eq!(only_match_advance(&model), (1, 1));
    assert!(!model.select_transitions(Label::Gap).is_empty());
    assert_eq!(model.transition(model.select_transitions(Label::Match)[0]).calc, Some(calcs.match_calc));
  }
}

#[test]
fn est2genome_has_one_intron_and_affine_gaps() {
  let (model, calcs) = est2genome::build(&ModelArgs::default()).unwrap();
  assert_eq!(only_match_advance(&model), (1, 1));
  assert_eq!(model.select_transitions(Label::Ss5).len(), 1);
  assert_eq!(model.select_transitions(Label::Ss3).len(), 1);
  assert_eq!(model.spans().len(), 1);
  let _ = calcs.five_prime_calc;
}

#[test]
fn ner_has_a_non_equivalenced_region_transition() {
  let (model, calcs) = ner::build(&ModelArgs::default()).unwrap();
  assert_eq!(only_match_advance(&model), (1, 1));
  assert_eq!(model.transition(model.select_transitions(Label::Match)[0]).calc, Some(calcs.match_calc));
  // the NER state advances both axes together but isn't itself a Match
  // transition - only the genuine substitution match is.
  assert_eq!(model.select_transitions(Label::Match).len(), 1);
}

#[test]
fn protein2dna_codon_match_with_frameshift_recovery() {
  for bestfit in [false, true] {
    let (model, calcs) = protein2dna::build(&ModelArgs::default(), bestfit).unwrap();
    assert_eq!(only_match_advance(&model), (1, 3));
    assert!(!model.select_transitions(Label::Frameshift).is_empty());
    let _ = calcs.frameshift_calc;
  }
}

#[test]
fn protein2genome_codon_match_with_introns_and_frameshift() {
  for bestfit in [false, true] {
    let (model, calcs) = protein2genome::build(&ModelArgs::default(), bestfit).unwrap();
    assert_eq!(only_match_advance(&model), (1, 3));
    assert!(!model.select_transitions(Label::Frameshift).is_empty());
    assert_eq!(model.select_transitions(Label::Ss5).len(), 1);
    let _ = calcs.three_prime_calc;
  }
}

#[test]
fn coding2coding_matches_codon_to_codon() {
  let (model, calcs) = coding2coding::build(&ModelArgs::default()).unwrap();
  assert_eq!(only_match_advance(&model), (3, 3));
  assert!(!model.select_transitions(Label::Frameshift).is_empty());
  let _ = calcs.gap_open_calc;
}

#[test]
fn coding2genome_adds_a_target_side_intron_to_the_coding_core() {
  let (model, calcs) = coding2genome::build(&ModelArgs::default()).unwrap();
  assert_eq!(only_match_advance(&model), (3, 3));
  assert_eq!(model.select_transitions(Label::Ss5).len(), 1);
  assert_eq!(model.spans().len(), 1);
  let _ = calcs.coding.match_calc;
}

#[test]
fn cdna2genome_wraps_the_coding_core_in_utr_matches() {
  let (model, calcs) = cdna2genome::build(&ModelArgs::default()).unwrap();
  // two UTR match transitions (1,1) plus the coding core's (3,3) match.
  let matches = model.select_transitions(Label::Match);
  assert_eq!(matches.len(), 3);
  let advances: Vec<(i64, i64)> = matches.iter().map(|&t| {
    let t = model.transition(t);
    (t.advance_q, t.advance_t)
  }).collect();
  assert!(advances.contains(&(3, 3)));
  assert!(advances.iter().filter(|&&a| a == (1, 1)).count() == 2);
  let _ = calcs.utr_calc;
}

#[test]
fn genome2genome_has_introns_on_both_axes() {
  let (model, calcs) = genome2genome::build(&ModelArgs::default()).unwrap();
  assert_eq!(only_match_advance(&model), (3, 3));
  assert_eq!(model.select_transitions(Label::Ss5).len(), 2);
  assert_eq!(model.spans().len(), 2);
  let _ = calcs.query_five_prime_calc;
  let _ = calcs.target_five_prime_calc;
}
