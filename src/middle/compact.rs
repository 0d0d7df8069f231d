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

//! Duplicate-subexpression elimination.
//!
//! Walks depth-first from each rule with a map from canonical text to the
//! first node carrying that text. A child slot whose text was seen before is
//! redirected to the first-seen node and the replaced subtree is not entered.
//! Structurally identical subexpressions thereby collapse to one shared node
//! and the tree becomes an acyclic graph. Rules are never deduplicated, even
//! when spelled identically.
//!
//! Must run strictly after the analysis passes, which assume each node has
//! one parent, and strictly before code generation, which profits from the
//! sharing by emitting one procedure per distinct subexpression.

use crate::ast::*;
use crate::ast::Expression::*;
use crate::middle::lists;
use std::collections::HashMap;
use tracing::debug;

impl Grammar
{
  pub fn compact(&mut self) {
    let mut seen = HashMap::new();
    let mut merged = 0;
    for rule in self.rules.clone() {
      self.compact_children(rule, &mut seen, &mut merged);
    }
    lists::rebuild(self);
    debug!(merged, subs = self.subs.len(), "eliminated duplicate subexpressions");
  }

  fn compact_children(&mut self, this: usize,
    seen: &mut HashMap<String, usize>, merged: &mut usize)
  {
    let mut children = lists::children(&self.exprs[this]);
    for slot in children.iter_mut() {
      let child = *slot;
      let text = self[child].canonical.clone();
      match seen.get(&text) {
        Some(&original) => {
          if original != child {
            *slot = original;
            *merged += 1;
          }
        }
        None => {
          seen.insert(text, child);
          self.compact_children(child, seen, merged);
        }
      }
    }
    self.replace_children(this, children);
  }

  fn replace_children(&mut self, this: usize, children: Vec<usize>) {
    match &mut self.exprs[this] {
      Rule { rhs, .. } => *rhs = children,
      Choice(kids) | Sequence(kids) => *kids = children,
      And(child) | Not(child) | Plus(child) | Star(child) | Query(child) => {
        *child = children[0];
      }
      PlusPlus(body, until) | StarPlus(body, until) => {
        *body = children[0];
        *until = children[1];
      }
      Ref{..} | StrLiteral(_) | CharClass{..} | Range(..) | Any => {
        debug_assert!(children.is_empty());
      }
    }
  }
}
