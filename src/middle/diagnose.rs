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

//! Left-recursion and reachability diagnostics.
//!
//! Builds the "first expression" relation over the nonterminals: an edge from
//! `i` to `j` means that `i`, at the start of a match attempt, may directly
//! invoke `j`. Rules and subexpressions own one matrix row each, a reference
//! borrows the row of its target rule, and every terminal shares one sentinel
//! row. A rule is left-recursive iff the transitive closure of the relation
//! relates it to itself.
//!
//! Findings are keyed by their message text, so structurally identical
//! subexpressions are reported once. When the grammar is not well-formed,
//! only the nullable-loop and left-recursion findings are reported: the
//! secondary attributes are not trustworthy in that case. Left recursion
//! carries error severity but counts toward the well-formedness gate, not
//! the fatal-error counter; the grammar resolved cleanly, it only cannot be
//! compiled.

use crate::ast::*;
use crate::ast::Expression::*;
use crate::relation::Relation;
use crate::visitor::*;
use partial::Partial;
use partial::Partial::*;
use std::collections::{HashMap, HashSet};

pub fn diagnose(mut grammar: Grammar) -> Partial<Grammar> {
  if grammar.errors > 0 {
    return Fake(grammar);
  }
  let mut pass = FirstSets::new(&grammar);
  for idx in pass.exprs.clone() {
    pass.visit_expr(idx);
  }
  let recursion = pass.left_recursion();
  let always_fails = pass.always_fails();
  // The findings move out of the pass, releasing its borrow of the grammar.
  let FirstSets { nullable_loops, hidden_alternatives, redundant_options, .. } = pass;

  if grammar.not_wf > 0 {
    grammar.warn(String::from("the grammar is not well-formed"));
    for message in nullable_loops.messages {
      grammar.warn(message);
    }
    for message in recursion {
      // Error severity, but the fatal counter stays untouched: this gate
      // blocks code generation only.
      grammar.diagnostics.push(Diagnostic::error(message));
    }
    return Value(grammar);
  }

  for message in always_fails {
    grammar.warn(message);
  }
  for message in hidden_alternatives.messages {
    grammar.warn(message);
  }
  for message in redundant_options.messages {
    grammar.note(message);
  }
  Value(grammar)
}

/// Finding messages in first-seen order, one entry per distinct text.
#[derive(Default)]
struct Findings
{
  seen: HashSet<String>,
  messages: Vec<String>
}

impl Findings
{
  fn add(&mut self, message: String) {
    if self.seen.insert(message.clone()) {
      self.messages.push(message);
    }
  }
}

struct FirstSets<'a>
{
  grammar: &'a Grammar,
  /// Rules then subexpressions, in matrix-row order.
  exprs: Vec<usize>,
  /// Matrix row of every rule and subexpression, keyed by arena index.
  rows: HashMap<usize, usize>,
  /// The row shared by all terminals.
  sentinel: usize,
  first: Relation,
  nullable_loops: Findings,
  hidden_alternatives: Findings,
  redundant_options: Findings
}

impl<'a> FirstSets<'a>
{
  fn new(grammar: &'a Grammar) -> FirstSets<'a> {
    let exprs: Vec<usize> = grammar.rules.iter()
      .chain(grammar.subs.iter())
      .cloned().collect();
    let rows = exprs.iter().enumerate()
      .map(|(row, &idx)| (idx, row))
      .collect();
    let sentinel = exprs.len();
    FirstSets {
      grammar,
      exprs,
      rows,
      sentinel,
      first: Relation::empty(sentinel + 1),
      nullable_loops: Findings::default(),
      hidden_alternatives: Findings::default(),
      redundant_options: Findings::default()
    }
  }

  fn diag_name(&self, idx: usize) -> String {
    match &self.grammar[idx].name {
      Some(name) => name.clone(),
      None => self.grammar[idx].canonical.clone()
    }
  }

  fn row_of(&self, idx: usize) -> usize {
    match &self.grammar.exprs[idx] {
      Ref { rule: Some(rule), .. } => self.rows[rule],
      Ref { rule: None, .. } => unreachable!("diagnostics run on a resolved grammar"),
      expr if expr.is_terminal() => self.sentinel,
      _ => self.rows[&idx]
    }
  }

  fn edge(&mut self, from: usize, to: usize) {
    let from = self.rows[&from];
    let to = self.row_of(to);
    self.first.set(from, to);
  }

  fn nullable_loop(&mut self, parent: usize, child: usize) {
    if self.grammar[child].nul {
      self.nullable_loops.add(format!("`{}` in `{}` may match the empty string",
        self.diag_name(child), self.diag_name(parent)));
    }
  }

  fn always_fails(&self) -> Vec<String> {
    let mut findings = Findings::default();
    for &idx in &self.exprs {
      let info = &self.grammar[idx];
      if !info.nul && !info.adv {
        findings.add(format!("`{}` always fails", self.diag_name(idx)));
      }
    }
    findings.messages
  }

  /// A rule related to itself by the closure of `first` is left-recursive;
  /// the report names every direct successor lying on a cycle back to it.
  fn left_recursion(&self) -> Vec<String> {
    let closure = self.first.closure();
    let mut findings = Findings::default();
    for (i, &rule) in self.grammar.rules.iter().enumerate() {
      if closure.at(i, i) {
        let via: Vec<_> = self.exprs.iter().enumerate()
          .filter(|&(j, _)| self.first.at(i, j) && closure.at(j, i))
          .map(|(_, &idx)| format!("`{}`", self.diag_name(idx)))
          .collect();
        findings.add(format!("rule `{}` is left-recursive via {}",
          self.grammar.rule_name(rule), via.join(" and ")));
      }
    }
    findings.messages
  }
}

impl<'a> ExprByIndex for FirstSets<'a>
{
  fn expr_by_index(&self, index: usize) -> Expression {
    self.grammar.exprs[index].clone()
  }
}

/// Visits every rule and subexpression exactly once from the outer loop;
/// nothing recurses into children, their rows are filled by their own visit.
impl<'a> Visitor<()> for FirstSets<'a>
{
  fn visit_choice(&mut self, this: usize, children: Vec<usize>) {
    let last = children.len() - 1;
    for (i, &child) in children.iter().enumerate() {
      if i < last && !self.grammar[child].fal {
        self.hidden_alternatives.add(
          format!("`{}` in `{}` never fails and hides the following alternatives",
            self.diag_name(child), self.diag_name(this)));
      }
      self.edge(this, child);
    }
  }

  fn visit_sequence(&mut self, this: usize, children: Vec<usize>) {
    for &child in &children {
      self.edge(this, child);
      if !self.grammar[child].nul {
        break;
      }
    }
  }

  fn visit_syntactic_predicate(&mut self, this: usize, child: usize) {
    self.edge(this, child);
  }

  fn visit_repeat(&mut self, this: usize, child: usize) {
    self.nullable_loop(this, child);
    self.edge(this, child);
  }

  fn visit_optional(&mut self, this: usize, child: usize) {
    self.nullable_loop(this, child);
    if !self.grammar[child].fal {
      self.redundant_options.add(
        format!("as `{}` never fails, the `?` in `{}` can be dropped",
          self.diag_name(child), self.diag_name(this)));
    }
    self.edge(this, child);
  }

  /// From the desugaring `(!e2 e1)* e2`: the guard invokes `e2` first, and
  /// the body is only reached when the guard can fail.
  fn visit_until(&mut self, this: usize, body: usize, until: usize) {
    self.nullable_loop(this, body);
    self.edge(this, until);
    if self.grammar[until].fal {
      self.edge(this, body);
    }
  }
}
