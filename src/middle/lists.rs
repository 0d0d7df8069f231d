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

//! Node enumeration.
//!
//! Walks every rule depth-first and records each distinct node exactly once:
//! compound subexpressions in `subs`, references in `refs`, and terminals in
//! `terms` (one entry per distinct terminal text). The visited set is keyed
//! by node identity (the arena index), which keeps the walk cycle-safe once
//! compaction has turned the tree into a DAG. Compaction reruns this pass to
//! refresh the lists.

use crate::ast::*;
use crate::ast::Expression::*;
use crate::middle::canonical::terminal_text;
use partial::Partial;
use partial::Partial::*;
use std::collections::HashSet;

pub fn build(mut grammar: Grammar) -> Partial<Grammar> {
  if grammar.errors > 0 {
    return Fake(grammar);
  }
  rebuild(&mut grammar);
  Value(grammar)
}

pub fn rebuild(grammar: &mut Grammar) {
  grammar.subs.clear();
  grammar.terms.clear();
  grammar.refs.clear();
  let mut visited = HashSet::new();
  let mut term_texts = HashSet::new();
  for rule in grammar.rules.clone() {
    visit(grammar, rule, &mut visited, &mut term_texts);
  }
}

fn visit(grammar: &mut Grammar, this: usize,
  visited: &mut HashSet<usize>, term_texts: &mut HashSet<String>)
{
  if !visited.insert(this) {
    return;
  }
  let expr = grammar.expr_by_index(this);
  match &expr {
    Rule{..} => (),
    Ref{..} => grammar.refs.push(this),
    terminal if terminal.is_terminal() => {
      if term_texts.insert(terminal_text(terminal)) {
        grammar.terms.push(this);
      }
    }
    _ => grammar.subs.push(this)
  }
  for child in children(&expr) {
    visit(grammar, child, visited, term_texts);
  }
}

/// The value-level children of a node. A `Ref` has none: its rule link is a
/// name-level edge, not a subtree.
pub fn children(expr: &Expression) -> Vec<usize> {
  match expr {
    Rule { rhs, .. } => rhs.clone(),
    Choice(children) | Sequence(children) => children.clone(),
    And(child) | Not(child) | Plus(child) | Star(child) | Query(child) => vec![*child],
    PlusPlus(body, until) | StarPlus(body, until) => vec![*body, *until],
    Ref{..} | StrLiteral(_) | CharClass{..} | Range(..) | Any => vec![]
  }
}

#[cfg(test)]
mod test
{
  use super::*;

  #[test]
  fn each_node_listed_once() {
    let mut g = Grammar::new();
    let digit = g.push(Range('0', '9'));
    let digits = g.push(Plus(digit));
    let a_ref1 = g.push(Ref { name: String::from("a"), rule: None });
    let a_ref2 = g.push(Ref { name: String::from("a"), rule: None });
    let plus = g.push(StrLiteral(String::from("+")));
    let seq = g.push(Sequence(vec![a_ref1, plus, a_ref2]));
    g.push_rule("s", vec![seq]);
    g.push_rule("a", vec![digits]);
    rebuild(&mut g);
    assert_eq!(g.subs, vec![seq, digits]);
    assert_eq!(g.refs, vec![a_ref1, a_ref2]);
    assert_eq!(g.terms, vec![plus, digit]);
  }

  #[test]
  fn terminals_deduplicate_by_text() {
    let mut g = Grammar::new();
    let c1 = g.push(StrLiteral(String::from(",")));
    let c2 = g.push(StrLiteral(String::from(",")));
    let seq = g.push(Sequence(vec![c1, c2]));
    g.push_rule("r", vec![seq]);
    rebuild(&mut g);
    assert_eq!(g.terms, vec![c1]);
  }

  #[test]
  fn shared_nodes_visited_once() {
    let mut g = Grammar::new();
    let a = g.push(StrLiteral(String::from("a")));
    let star = g.push(Star(a));
    // Both alternatives alias the same node, as after compaction.
    let choice = g.push(Choice(vec![star, star]));
    g.push_rule("r", vec![choice]);
    rebuild(&mut g);
    assert_eq!(g.subs, vec![choice, star]);
  }
}
