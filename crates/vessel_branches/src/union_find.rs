//! Union-find over provisional labels.
//!
//! Element 0 is reserved for background and is never merged, so provisional
//! labels can be used as element ids directly.

use std::cmp::Ordering;

use crate::grid::Label;

/// Disjoint-set forest with union by rank and path halving.
#[derive(Clone, Debug)]
pub struct UnionFind {
  /// Parent pointers (self if root).
  parent: Vec<Label>,
  /// Rank for union by rank.
  rank: Vec<u8>,
}

impl Default for UnionFind {
  fn default() -> Self {
    Self::new()
  }
}

impl UnionFind {
  /// Forest holding only the background element.
  pub fn new() -> Self {
    Self::with_len(0)
  }

  /// Forest with singleton sets `1..=len` (plus background).
  pub fn with_len(len: usize) -> Self {
    Self {
      parent: (0..=len as Label).collect(),
      rank: vec![0; len + 1],
    }
  }

  /// Number of non-background elements.
  #[inline]
  pub fn len(&self) -> usize {
    self.parent.len() - 1
  }

  /// Add a singleton set and return its element id.
  #[inline]
  pub fn make_set(&mut self) -> Label {
    let id = self.parent.len() as Label;
    self.parent.push(id);
    self.rank.push(0);
    id
  }

  /// Root of the set containing `x`.
  #[inline]
  pub fn find(&mut self, mut x: Label) -> Label {
    while self.parent[x as usize] != x {
      let grandparent = self.parent[self.parent[x as usize] as usize];
      self.parent[x as usize] = grandparent;
      x = grandparent;
    }
    x
  }

  /// Merge the sets containing `x` and `y`. Returns false if already merged.
  pub fn union(&mut self, x: Label, y: Label) -> bool {
    let root_x = self.find(x);
    let root_y = self.find(y);
    if root_x == root_y {
      return false;
    }

    match self.rank[root_x as usize].cmp(&self.rank[root_y as usize]) {
      Ordering::Less => self.parent[root_x as usize] = root_y,
      Ordering::Greater => self.parent[root_y as usize] = root_x,
      Ordering::Equal => {
        self.parent[root_y as usize] = root_x;
        self.rank[root_x as usize] += 1;
      }
    }
    true
  }
}
