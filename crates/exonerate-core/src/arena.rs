//! Pooled, index-addressed node storage (spec §9 "pointer graphs & cyclic
//! structures"). Every BSDP node/edge, C4 state/transition/calc/shadow/
//! portal/span, and STraceback cell lives in one of these instead of behind
//! a raw pointer; cycles become index pairs, never reference cycles.

use std::marker::PhantomData;

/// A typed, 32-bit index into an [`Arena<T>`]. Carries the element type in a
/// `PhantomData` so indices from different arenas cannot be swapped at
/// compile time.
pub struct Id<T> {
  index: u32,
  _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
  fn new(index: u32) -> Self {
    Self { index, _marker: PhantomData }
  }

  pub fn index(self) -> usize {
    self.index as usize
  }

  /// Constructs an id directly from a raw index, bypassing the owning
  /// arena — for tests and for the rare case (e.g. `DerivedModel`) where an
  /// id is reconstructed rather than freshly allocated.
  pub(crate) fn from_index(index: u32) -> Self {
    Self::new(index)
  }
}

impl<T> Clone for Id<T> {
  fn clone(&self) -> Self {
    *self
  }
}
impl<T> Copy for Id<T> {}
impl<T> PartialEq for Id<T> {
  fn eq(&self, other: &Self) -> bool {
    self.index == other.index
  }
}
impl<T> Eq for Id<T> {}
impl<T> std::hash::Hash for Id<T> {
  fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
    self.index.hash(state);
  }
}
impl<T> std::fmt::Debug for Id<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Id({})", self.index)
  }
}
impl<T> PartialOrd for Id<T> {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}
impl<T> Ord for Id<T> {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    self.index.cmp(&other.index)
  }
}

/// A simple append-only arena. Elements are never removed individually —
/// owners (BSDP run, STraceback, one C4 model) are freed in bulk when the
/// arena itself is dropped, which is materially faster than per-node free
/// for the hot structures this backs (PQ nodes, traceback cells, BSDP
/// edges).
#[derive(Debug, Clone)]
pub struct Arena<T> {
  items: Vec<T>,
}

impl<T> Default for Arena<T> {
  fn default() -> Self {
    Self { items: Vec::new() }
  }
}

impl<T> Arena<T> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, value: T) -> Id<T> {
    let index = self.items.len() as u32;
    self.items.push(value);
    Id::new(index)
  }

  pub fn get(&self, id: Id<T>) -> &T {
    &self.items[id.index()]
  }

  pub fn get_mut(&mut self, id: Id<T>) -> &mut T {
    &mut self.items[id.index()]
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> {
    self.items.iter().enumerate().map(|(i, v)| (Id::new(i as u32), v))
  }

  pub fn ids(&self) -> impl Iterator<Item = Id<T>> + '_ {
    (0..self.items.len() as u32).map(Id::new)
  }
}

impl<T> std::ops::Index<Id<T>> for Arena<T> {
  type Output = T;
  fn index(&self, id: Id<T>) -> &T {
    self.get(id)
  }
}

impl<T> std::ops::IndexMut<Id<T>> for Arena<T> {
  fn index_mut(&mut self, id: Id<T>) -> &mut T {
    self.get_mut(id)
  }
}
