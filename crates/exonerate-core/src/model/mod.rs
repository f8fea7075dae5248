//! C4: a declarative finite-state machine over pairs of (query, target)
//! positions (spec §3 "C4 model", §4.C).
//!
//! A model is mutable while *open* ([`OpenC4Model`]) and immutable while
//! *closed* ([`ClosedC4Model`]) — the typestate split makes "mutate a closed
//! model" and "run Viterbi over an open model" compile errors rather than
//! the runtime `g_error` the original engine raises (spec §9).

mod calc;
mod derived;
mod shadow;
mod span;
mod state;
mod transition;

pub use calc::Calc;
pub use derived::DerivedModel;
pub use shadow::Shadow;
pub use span::Span;
pub use state::{Scope, State};
pub use transition::{Label, MatchPayload, Transition};

use crate::arena::{Arena, Id};
use crate::error::{EngineError, ModelInvariantKind, Result};
use std::collections::VecDeque;

pub type StateId = Id<State>;
pub type TransitionId = Id<Transition>;
pub type CalcId = Id<Calc>;
pub type ShadowId = Id<Shadow>;
pub type PortalId = Id<Portal>;
pub type SpanId = Id<Span>;

/// Names an advance-pair and the transitions that use it; seeders use this
/// to pick a word length, SAR uses it to check HSP/transition compatibility.
#[derive(Debug, Clone)]
pub struct Portal {
  pub advance_q: i64,
  pub advance_t: i64,
  pub transitions: Vec<TransitionId>,
}

#[derive(Debug, Clone, Default)]
struct ModelData {
  name: String,
  states: Arena<State>,
  transitions: Arena<Transition>,
  calcs: Arena<Calc>,
  shadows: Arena<Shadow>,
  portals: Arena<Portal>,
  spans: Arena<Span>,
  start: Option<StateId>,
  end: Option<StateId>,
  start_scope: Scope,
  end_scope: Scope,
}

/// A model under construction. All mutators are fallible in the sense that
/// `close()` performs the real validation; mutators themselves only reject
/// structurally impossible requests (unknown ids).
#[derive(Debug, Clone)]
pub struct OpenC4Model {
  data: ModelData,
}

impl OpenC4Model {
  pub fn new(name: impl Into<String>) -> Self {
    let mut data = ModelData { name: name.into(), ..Default::default() };
    let start = data.states.push(State::new());
    let end = data.states.push(State::new());
    data.start = Some(start);
    data.end = Some(end);
    Self { data }
  }

  pub fn start_state(&self) -> StateId {
    self.data.start.unwrap()
  }

  pub fn end_state(&self) -> StateId {
    self.data.end.unwrap()
  }

  pub fn add_state(&mut self) -> StateId {
    self.data.states.push(State::new())
  }

  pub fn add_calc(&mut self, calc: Calc) -> CalcId {
    self.data.calcs.push(calc)
  }

  pub fn configure_start_state(&mut self, scope: Scope) {
    self.data.start_scope = scope;
  }

  pub fn configure_end_state(&mut self, scope: Scope) {
    self.data.end_scope = scope;
  }

  /// `input = None` means the start state; `output = None` means the end
  /// state, per the original C4 convention.
  #[allow(clippy::too_many_arguments)]
  pub fn add_transition(
    &mut self,
    input: Option<StateId>,
    output: Option<StateId>,
    advance_q: i64,
    advance_t: i64,
    calc: Option<CalcId>,
    label: Label,
    match_payload: Option<MatchPayload>,
  ) -> TransitionId {
    let input = input.unwrap_or(self.data.start.unwrap());
    let output = output.unwrap_or(self.data.end.unwrap());
    let id = self.data.transitions.push(Transition { input, output, advance_q, advance_t, calc, label, match_payload });
    self.data.states[input].outputs.push(id);
    self.data.states[output].inputs.push(id);
    id
  }

  pub fn add_shadow(&mut self, sources: Vec<StateId>, destinations: Vec<TransitionId>) -> ShadowId {
    let id = self.data.shadows.push(Shadow { sources: sources.clone(), destinations, designation: 0 });
    for s in sources {
      self.data.states[s].shadows_starting_here.push(id);
    }
    id
  }

  pub fn add_portal(&mut self, advance_q: i64, advance_t: i64, transitions: Vec<TransitionId>) -> PortalId {
    self.data.portals.push(Portal { advance_q, advance_t, transitions })
  }

  #[allow(clippy::too_many_arguments)]
  pub fn add_span(
    &mut self,
    span_state: StateId,
    min_q: i64,
    max_q: i64,
    min_t: i64,
    max_t: i64,
    query_loop: Option<TransitionId>,
    target_loop: Option<TransitionId>,
  ) -> SpanId {
    self.data.spans.push(Span { span_state, min_q, max_q, min_t, max_t, query_loop, target_loop })
  }

  pub fn rename(&mut self, name: impl Into<String>) {
    self.data.name = name.into();
  }

  pub fn remove_state(&mut self, state: StateId) {
    self.data.states[state].inputs.clear();
    self.data.states[state].outputs.clear();
  }

  pub fn remove_transition(&mut self, transition: TransitionId) {
    let t = self.data.transitions[transition].clone();
    self.data.states[t.input].outputs.retain(|&x| x != transition);
    self.data.states[t.output].inputs.retain(|&x| x != transition);
  }

  pub fn remove_all_shadows(&mut self) {
    self.data.shadows = Arena::new();
    for id in self.data.states.ids() {
      self.data.states[id].shadows_starting_here.clear();
    }
  }

  pub fn select_transitions(&self, label: Label) -> Vec<TransitionId> {
    self.data.transitions.iter().filter(|(_, t)| t.label == label).map(|(id, _)| id).collect()
  }

  pub fn select_single_transition(&self, label: Label) -> Option<TransitionId> {
    let matches = self.select_transitions(label);
    (matches.len() == 1).then(|| matches[0])
  }

  /// Reachability search in the transition graph, ignoring advances.
  pub fn path_is_possible(&self, src: StateId, dst: StateId) -> bool {
    if src == dst {
      return true;
    }
    let mut seen = vec![false; self.data.states.len()];
    let mut queue = VecDeque::from([src]);
    seen[src.index()] = true;
    while let Some(s) = queue.pop_front() {
      for &t in &self.data.states[s].outputs {
        let next = self.data.transitions[t].output;
        if next == dst {
          return true;
        }
        if !seen[next.index()] {
          seen[next.index()] = true;
          queue.push_back(next);
        }
      }
    }
    false
  }

  /// Finalise the model: assign derived quantities and validate the
  /// invariants spec §3 requires of a closed model.
  pub fn close(self) -> Result<ClosedC4Model> {
    let data = self.data;
    let start = data.start.ok_or(ModelInvariantKind::MissingStart)?;
    let end = data.end.ok_or(ModelInvariantKind::MissingEnd)?;

    if !self.reachable_from(start, &data).contains(&end.index()) {
      return Err(EngineError::ModelInvariantViolated(ModelInvariantKind::UnreachableEnd));
    }
    let reachable_to_end = self.reachable_to(end, &data);
    if !reachable_to_end.contains(&start.index()) {
      return Err(EngineError::ModelInvariantViolated(ModelInvariantKind::UnreachableStart));
    }

    for id in data.states.ids() {
      let s = &data.states[id];
      if id != start && id != end && s.inputs.is_empty() && s.outputs.is_empty() {
        return Err(EngineError::ModelInvariantViolated(ModelInvariantKind::OrphanState(id)));
      }
    }

    // A transition that changes state (even without advancing) wires the
    // graph together and is meaningful (e.g. "start to main"); only a true
    // self-loop that neither advances nor scores is a no-op.
    for (id, t) in data.transitions.iter() {
      if t.input == t.output && t.advance_q == 0 && t.advance_t == 0 && t.calc.is_none() {
        return Err(EngineError::ModelInvariantViolated(ModelInvariantKind::DegenerateTransition(id)));
      }
    }

    let max_query_advance = data.transitions.iter().map(|(_, t)| t.advance_q).max().unwrap_or(0);
    let max_target_advance = data.transitions.iter().map(|(_, t)| t.advance_t).max().unwrap_or(0);

    let mut data = data;
    let mut next_designation = 0usize;
    for id in data.shadows.ids() {
      data.shadows[id].designation = next_designation;
      next_designation += 1;
    }
    let total_shadow_designations = next_designation;

    Ok(ClosedC4Model { data, max_query_advance, max_target_advance, total_shadow_designations })
  }

  fn reachable_from(&self, from: StateId, data: &ModelData) -> std::collections::HashSet<usize> {
    let mut seen = std::collections::HashSet::new();
    let mut queue = VecDeque::from([from]);
    seen.insert(from.index());
    while let Some(s) = queue.pop_front() {
      for &t in &data.states[s].outputs {
        let next = data.transitions[t].output;
        if seen.insert(next.index()) {
          queue.push_back(next);
        }
      }
    }
    seen
  }

  fn reachable_to(&self, to: StateId, data: &ModelData) -> std::collections::HashSet<usize> {
    let mut seen = std::collections::HashSet::new();
    let mut queue = VecDeque::from([to]);
    seen.insert(to.index());
    while let Some(s) = queue.pop_front() {
      for &t in &data.states[s].inputs {
        let prev = data.transitions[t].input;
        if seen.insert(prev.index()) {
          queue.push_back(prev);
        }
      }
    }
    seen
  }
}

/// A validated, immutable model. Cheaply `Clone`-able and safe to share
/// across threads (spec §5: "treated as immutable after construction and
/// freely shared").
#[derive(Debug, Clone)]
pub struct ClosedC4Model {
  data: ModelData,
  max_query_advance: i64,
  max_target_advance: i64,
  total_shadow_designations: usize,
}

impl ClosedC4Model {
  pub fn name(&self) -> &str {
    &self.data.name
  }

  pub fn open(self) -> OpenC4Model {
    OpenC4Model { data: self.data }
  }

  pub fn copy(&self) -> ClosedC4Model {
    self.clone()
  }

  pub fn start_state(&self) -> StateId {
    self.data.start.unwrap()
  }

  pub fn end_state(&self) -> StateId {
    self.data.end.unwrap()
  }

  pub fn start_scope(&self) -> Scope {
    self.data.start_scope
  }

  pub fn end_scope(&self) -> Scope {
    self.data.end_scope
  }

  pub fn max_query_advance(&self) -> i64 {
    self.max_query_advance
  }

  pub fn max_target_advance(&self) -> i64 {
    self.max_target_advance
  }

  pub fn total_shadow_designations(&self) -> usize {
    self.total_shadow_designations
  }

  pub fn states(&self) -> &Arena<State> {
    &self.data.states
  }

  pub fn transitions(&self) -> &Arena<Transition> {
    &self.data.transitions
  }

  pub fn calcs(&self) -> &Arena<Calc> {
    &self.data.calcs
  }

  pub fn shadows(&self) -> &Arena<Shadow> {
    &self.data.shadows
  }

  pub fn portals(&self) -> &Arena<Portal> {
    &self.data.portals
  }

  pub fn spans(&self) -> &Arena<Span> {
    &self.data.spans
  }

  pub fn transition(&self, id: TransitionId) -> &Transition {
    &self.data.transitions[id]
  }

  pub fn state(&self, id: StateId) -> &State {
    &self.data.states[id]
  }

  pub fn select_transitions(&self, label: Label) -> Vec<TransitionId> {
    self.data.transitions.iter().filter(|(_, t)| t.label == label).map(|(id, _)| id).collect()
  }

  pub fn path_is_possible(&self, src: StateId, dst: StateId) -> bool {
    OpenC4Model { data: self.data.clone() }.path_is_possible(src, dst)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn trivial_edit_distance_model() -> ClosedC4Model {
    let mut m = OpenC4Model::new("edit_distance");
    let mat = m.add_calc(Calc::new("match", 0, false, false));
    let gap = m.add_calc(Calc::new("gap", 0, false, false));
    let match_state = m.add_state();
    m.add_transition(None, Some(match_state), 0, 0, None, Label::None, None);
    m.add_transition(
      Some(match_state),
      Some(match_state),
      1,
      1,
      Some(mat),
      Label::Match,
      Some(MatchPayload { advance_q: 1, advance_t: 1 }),
    );
    m.add_transition(Some(match_state), Some(match_state), 1, 0, Some(gap), Label::Gap, None);
    m.add_transition(Some(match_state), Some(match_state), 0, 1, Some(gap), Label::Gap, None);
    m.add_transition(Some(match_state), None, 0, 0, None, Label::None, None);
    m.configure_start_state(Scope::Corner);
    m.configure_end_state(Scope::Corner);
    m.close().unwrap()
  }

  #[test]
  fn close_computes_advances_and_designations() {
    let model = trivial_edit_distance_model();
    assert_eq!(model.max_query_advance(), 1);
    assert_eq!(model.max_target_advance(), 1);
    assert_eq!(model.total_shadow_designations(), 0);
  }

  #[test]
  fn orphan_state_rejected() {
    let mut m = OpenC4Model::new("broken");
    m.add_state();
    let err = m.close().unwrap_err();
    assert!(matches!(err, EngineError::ModelInvariantViolated(ModelInvariantKind::OrphanState(_))));
  }

  #[test]
  fn degenerate_self_loop_rejected() {
    let mut m = OpenC4Model::new("broken");
    let s = m.add_state();
    m.add_transition(None, Some(s), 0, 0, None, Label::None, None);
    m.add_transition(Some(s), None, 0, 0, None, Label::None, None);
    m.add_transition(Some(s), Some(s), 0, 0, None, Label::None, None);
    let err = m.close().unwrap_err();
    assert!(matches!(err, EngineError::ModelInvariantViolated(ModelInvariantKind::DegenerateTransition(_))));
  }

  #[test]
  fn reopen_allows_mutation_again() {
    let model = trivial_edit_distance_model();
    let mut reopened = model.open();
    reopened.add_state();
    let reclosed = reopened.close();
    assert!(reclosed.is_err()); // new orphan state
  }

  #[test]
  fn path_is_possible_reports_reachability() {
    let model = trivial_edit_distance_model();
    assert!(model.path_is_possible(model.start_state(), model.end_state()));
  }
}
