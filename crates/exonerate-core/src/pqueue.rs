//! Pairing heap priority queue with in-place key decrease and arbitrary node
//! removal, backed by a pooled arena (spec component B).
//!
//! BSDP needs both: the node queue is re-pushed with a lower bound after a
//! confirmation lowers a score, and the per-node edge queue drops edges whose
//! destination has already been used.

use crate::arena::{Arena, Id};

struct Node<K, V> {
  key: K,
  value: Option<V>,
  parent: Option<Id<Node<K, V>>>,
  children: Vec<Id<Node<K, V>>>,
  removed: bool,
}

/// Handle to a live entry in a [`PairingHeap`]. Remains a valid arena index
/// even after the entry is removed or re-keyed.
pub struct Handle<K, V>(Id<Node<K, V>>);
impl<K, V> Clone for Handle<K, V> {
  fn clone(&self) -> Self {
    *self
  }
}
impl<K, V> Copy for Handle<K, V> {}
impl<K, V> std::fmt::Debug for Handle<K, V> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Handle({:?})", self.0)
  }
}

pub struct PairingHeap<K: Ord + Clone, V> {
  arena: Arena<Node<K, V>>,
  root: Option<Id<Node<K, V>>>,
  len: usize,
}

impl<K: Ord + Clone, V> Default for PairingHeap<K, V> {
  fn default() -> Self {
    Self { arena: Arena::new(), root: None, len: 0 }
  }
}

impl<K: Ord + Clone, V> PairingHeap<K, V> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn peek_min(&self) -> Option<(&K, &V)> {
    let root = self.root?;
    let node = &self.arena[root];
    node.value.as_ref().map(|v| (&node.key, v))
  }

  pub fn push(&mut self, key: K, value: V) -> Handle<K, V> {
    let id = self.arena.push(Node { key, value: Some(value), parent: None, children: Vec::new(), removed: false });
    self.root = Some(match self.root {
      None => id,
      Some(root) => self.merge_trees(root, id),
    });
    self.len += 1;
    Handle(id)
  }

  pub fn pop_min(&mut self) -> Option<(K, V)> {
    let root_id = self.root?;
    self.root = self.collapse_children(root_id);
    self.len -= 1;
    let node = &mut self.arena[root_id];
    node.removed = true;
    node.parent = None;
    node.children.clear();
    Some((node.key.clone(), node.value.take().unwrap()))
  }

  /// Lower the key of an existing entry. `new_key` must be `<=` the current
  /// key (this is a min-heap decrease-key, not an arbitrary re-key).
  pub fn decrease_key(&mut self, handle: Handle<K, V>, new_key: K) {
    let id = handle.0;
    if self.arena[id].removed {
      return;
    }
    self.arena[id].key = new_key;
    let parent = self.arena[id].parent;
    if let Some(p) = parent {
      if self.arena[id].key < self.arena[p].key {
        self.detach_from_parent(id, p);
        self.root = Some(match self.root {
          Some(root) => self.merge_trees(root, id),
          None => id,
        });
      }
    }
    // If `id` is already the root, nothing else can change.
  }

  /// Remove an arbitrary entry from the heap.
  pub fn remove(&mut self, handle: Handle<K, V>) -> Option<V> {
    let id = handle.0;
    if self.arena[id].removed {
      return None;
    }
    if Some(id) == self.root {
      return self.pop_min().map(|(_, v)| v);
    }
    let parent = self.arena[id].parent;
    if let Some(p) = parent {
      self.detach_from_parent(id, p);
    }
    let collapsed = self.collapse_children(id);
    if let Some(subtree) = collapsed {
      self.root = Some(match self.root {
        Some(root) => self.merge_trees(root, subtree),
        None => subtree,
      });
    }
    self.len -= 1;
    let node = &mut self.arena[id];
    node.removed = true;
    node.children.clear();
    node.parent = None;
    node.value.take()
  }

  fn detach_from_parent(&mut self, id: Id<Node<K, V>>, parent: Id<Node<K, V>>) {
    let siblings = &mut self.arena[parent].children;
    if let Some(pos) = siblings.iter().position(|&c| c == id) {
      siblings.swap_remove(pos);
    }
    self.arena[id].parent = None;
  }

  /// Merge two heap-ordered trees into one, making the smaller-keyed root the
  /// parent of the other.
  fn merge_trees(&mut self, a: Id<Node<K, V>>, b: Id<Node<K, V>>) -> Id<Node<K, V>> {
    let (parent, child) = if self.arena[a].key <= self.arena[b].key { (a, b) } else { (b, a) };
    self.arena[child].parent = Some(parent);
    self.arena[parent].children.push(child);
    parent
  }

  /// Two-pass pairwise merge of `id`'s children into a single tree, becoming
  /// the node that replaces `id` in its position.
  fn collapse_children(&mut self, id: Id<Node<K, V>>) -> Option<Id<Node<K, V>>> {
    let children = std::mem::take(&mut self.arena[id].children);
    for &c in &children {
      self.arena[c].parent = None;
    }
    self.merge_pairs(&children)
  }

  fn merge_pairs(&mut self, trees: &[Id<Node<K, V>>]) -> Option<Id<Node<K, V>>> {
    if trees.is_empty() {
      return None;
    }
    let mut pass1 = Vec::with_capacity(trees.len().div_ceil(2));
    let mut it = trees.iter().copied();
    while let Some(a) = it.next() {
      if let Some(b) = it.next() {
        pass1.push(self.merge_trees(a, b));
      } else {
        pass1.push(a);
      }
    }
    let mut acc = pass1.pop();
    while let Some(t) = pass1.pop() {
      acc = Some(match acc {
        Some(a) => self.merge_trees(a, t),
        None => t,
      });
    }
    acc
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn push_pop_is_sorted() {
    let mut heap = PairingHeap::new();
    for v in [5, 3, 8, 1, 9, 2] {
      heap.push(v, v);
    }
    let mut out = Vec::new();
    while let Some((k, _)) = heap.pop_min() {
      out.push(k);
    }
    assert_eq!(out, vec![1, 2, 3, 5, 8, 9]);
  }

  #[test]
  fn decrease_key_moves_entry_to_front() {
    let mut heap = PairingHeap::new();
    let _a = heap.push(10, "a");
    let b = heap.push(20, "b");
    let _c = heap.push(30, "c");
    heap.decrease_key(b, 1);
    assert_eq!(heap.pop_min(), Some((1, "b")));
  }

  #[test]
  fn remove_arbitrary_node() {
    let mut heap = PairingHeap::new();
    let a = heap.push(1, "a");
    let _b = heap.push(2, "b");
    let _c = heap.push(3, "c");
    assert_eq!(heap.remove(a), Some("a"));
    assert_eq!(heap.len(), 2);
    let mut out = Vec::new();
    while let Some((k, _)) = heap.pop_min() {
      out.push(k);
    }
    assert_eq!(out, vec![2, 3]);
  }

  #[test]
  fn remove_nonroot_keeps_heap_valid() {
    let mut heap = PairingHeap::new();
    let ids: Vec<_> = (0..20).map(|i| heap.push(i, i)).collect();
    heap.remove(ids[10]);
    heap.remove(ids[5]);
    let mut out = Vec::new();
    while let Some((k, _)) = heap.pop_min() {
      out.push(k);
    }
    let mut expected: Vec<i32> = (0..20).filter(|&i| i != 10 && i != 5).collect();
    expected.sort_unstable();
    assert_eq!(out, expected);
  }
}
