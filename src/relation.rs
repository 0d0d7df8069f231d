// Copyright 2026 Pierre Talbot (IRCAM)

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at

//     http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Square boolean matrix representing a relation over expression indices.
//!
//! The left-recursion analysis builds the "first expression" relation here
//! and takes its transitive closure. Matrices stay small: one row per
//! nonterminal plus a sentinel shared by all terminals, so the cubic closure
//! is cheap.

use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct Relation
{
  size: usize,
  rows: Vec<Vec<bool>>
}

impl Relation
{
  /// The empty relation over `size` indices.
  pub fn empty(size: usize) -> Relation {
    Relation {
      size,
      rows: vec![vec![false; size]; size]
    }
  }

  /// The identity relation.
  pub fn unit(size: usize) -> Relation {
    let mut unit = Relation::empty(size);
    for i in 0..size {
      unit.rows[i][i] = true;
    }
    unit
  }

  pub fn size(&self) -> usize {
    self.size
  }

  pub fn at(&self, i: usize, j: usize) -> bool {
    self.rows[i][j]
  }

  pub fn set(&mut self, i: usize, j: usize) {
    self.rows[i][j] = true;
  }

  pub fn assign(&mut self, i: usize, j: usize, value: bool) {
    self.rows[i][j] = value;
  }

  pub fn row(&self, i: usize) -> &[bool] {
    &self.rows[i]
  }

  pub fn column(&self, j: usize) -> Vec<bool> {
    (0..self.size).map(|i| self.rows[i][j]).collect()
  }

  pub fn transpose(&self) -> Relation {
    let mut result = Relation::empty(self.size);
    for i in 0..self.size {
      for j in 0..self.size {
        result.rows[j][i] = self.rows[i][j];
      }
    }
    result
  }

  pub fn and(&self, other: &Relation) -> Relation {
    let mut result = self.clone();
    result.and_into(other);
    result
  }

  pub fn and_into(&mut self, other: &Relation) {
    assert_eq!(self.size, other.size, "relations must have the same size");
    for i in 0..self.size {
      for j in 0..self.size {
        self.rows[i][j] &= other.rows[i][j];
      }
    }
  }

  pub fn or(&self, other: &Relation) -> Relation {
    let mut result = self.clone();
    result.or_into(other);
    result
  }

  pub fn or_into(&mut self, other: &Relation) {
    assert_eq!(self.size, other.size, "relations must have the same size");
    for i in 0..self.size {
      for j in 0..self.size {
        self.rows[i][j] |= other.rows[i][j];
      }
    }
  }

  /// Boolean matrix product: `result[i][j]` iff some `k` relates `i` to `k`
  /// in `self` and `k` to `j` in `other`.
  pub fn times(&self, other: &Relation) -> Relation {
    assert_eq!(self.size, other.size, "relations must have the same size");
    let mut result = Relation::empty(self.size);
    for i in 0..self.size {
      for k in 0..self.size {
        if self.rows[i][k] {
          for j in 0..self.size {
            result.rows[i][j] |= other.rows[k][j];
          }
        }
      }
    }
    result
  }

  /// Transitive closure by triple-nested relaxation (Warshall).
  pub fn closure(&self) -> Relation {
    let mut result = self.clone();
    for k in 0..result.size {
      for i in 0..result.size {
        if result.rows[i][k] {
          for j in 0..result.size {
            let reach = result.rows[k][j];
            result.rows[i][j] |= reach;
          }
        }
      }
    }
    result
  }

  /// Reflexive transitive closure.
  pub fn star(&self) -> Relation {
    self.closure().or(&Relation::unit(self.size))
  }
}

impl fmt::Debug for Relation
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    for row in &self.rows {
      for &bit in row {
        write!(f, "{}", if bit { '1' } else { '0' })?;
      }
      writeln!(f)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod test
{
  use super::*;
  use pretty_assertions::assert_eq;

  fn of(edges: &[(usize, usize)], size: usize) -> Relation {
    let mut m = Relation::empty(size);
    for &(i, j) in edges {
      m.set(i, j);
    }
    m
  }

  #[test]
  fn unit_is_reflexive_only() {
    let u = Relation::unit(3);
    for i in 0..3 {
      for j in 0..3 {
        assert_eq!(u.at(i, j), i == j);
      }
    }
  }

  #[test]
  fn transpose_swaps() {
    let m = of(&[(0, 1), (1, 2)], 3);
    let t = m.transpose();
    assert!(t.at(1, 0) && t.at(2, 1));
    assert!(!t.at(0, 1) && !t.at(1, 2));
  }

  #[test]
  fn times_composes() {
    let m = of(&[(0, 1)], 3);
    let n = of(&[(1, 2)], 3);
    let p = m.times(&n);
    assert!(p.at(0, 2));
    assert!(!p.at(0, 1));
    assert!(!p.at(1, 2));
  }

  #[test]
  fn closure_of_a_chain() {
    let m = of(&[(0, 1), (1, 2), (2, 3)], 4);
    let c = m.closure();
    assert!(c.at(0, 3));
    assert!(c.at(1, 3));
    assert!(!c.at(3, 0));
    assert!(!c.at(0, 0));
  }

  #[test]
  fn closure_of_a_cycle_is_reflexive_on_the_cycle() {
    let m = of(&[(0, 1), (1, 0), (1, 2)], 3);
    let c = m.closure();
    assert!(c.at(0, 0));
    assert!(c.at(1, 1));
    assert!(!c.at(2, 2));
    assert!(c.at(0, 2));
  }

  #[test]
  fn star_adds_the_unit() {
    let m = of(&[(0, 1)], 2);
    let s = m.star();
    assert!(s.at(0, 0) && s.at(1, 1) && s.at(0, 1));
  }

  #[test]
  fn elementwise_and_or() {
    let m = of(&[(0, 1), (1, 0)], 2);
    let n = of(&[(0, 1)], 2);
    assert_eq!(m.and(&n), n);
    assert_eq!(m.or(&n), m);
  }
}
