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

//! AST of a parsing expression grammar, shared across all the compiling steps.
//!
//! Expressions live in a single arena (`Grammar::exprs`) and reference their
//! children by index. Node identity is the index: after `compact` two parent
//! slots may hold the same index, which turns the tree into a DAG without any
//! shared-ownership machinery. A `Ref` keeps an index to its target rule;
//! this is a name-level edge resolved once, never an ownership edge, so the
//! value graph stays acyclic even for recursive grammars.

use std::fmt;
use std::ops::{Index, IndexMut};

pub use crate::diagnostic::{Diagnostic, Severity};
pub use partial::Partial;

use crate::ast::Expression::*;

/// A semantic callback attached to the success or failure of a rule
/// alternative. `boolean` marks the predicate form: the action returns a
/// truth value and can itself reject the alternative.
///
/// An absent action (`None` in the rule's action vectors) is distinct from a
/// present action with an empty name; empty names are filled in by the
/// builder from the rule name and alternative index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Action
{
  pub name: String,
  pub boolean: bool
}

impl Action
{
  pub fn new(name: &str) -> Action {
    Action { name: String::from(name), boolean: false }
  }

  pub fn boolean(name: &str) -> Action {
    Action { name: String::from(name), boolean: true }
  }
}

#[derive(Clone, Debug)]
pub enum Expression
{
  /// `name [diag] = rhs[0] {on_succ[0]} {~on_fail[0]} / rhs[1] ...`
  /// The three vectors run in parallel, one entry per alternative.
  Rule {
    name: String,
    diag_name: Option<String>,
    rhs: Vec<usize>,
    on_succ: Vec<Option<Action>>,
    on_fail: Vec<Option<Action>>
  },
  Choice(Vec<usize>), // e1 / e2
  Sequence(Vec<usize>), // e1 e2
  And(usize), // &e
  Not(usize), // !e
  Plus(usize), // e+
  Star(usize), // e*
  Query(usize), // e?
  PlusPlus(usize, usize), // e1++ e2, sugar for (!e2 e1)(!e2 e1)* e2
  StarPlus(usize, usize), // e1*+ e2, sugar for (!e2 e1)* e2
  /// Named reference to a rule; `rule` is bound by reference resolution.
  Ref { name: String, rule: Option<usize> },
  StrLiteral(String), // "match me"
  CharClass { chars: String, negated: bool }, // [abc] or ^[abc]
  Range(char, char), // [a-z]
  Any // _
}

impl Expression
{
  /// How tightly the operator binds, used only by canonical-text
  /// reconstruction: a child is parenthesized iff its own strength is no
  /// greater than the strength its context demands.
  pub fn binding_strength(&self) -> u8 {
    match *self {
      Rule{..} | Choice(_) => 0,
      Sequence(_) => 1,
      And(_) | Not(_) => 3,
      Plus(_) | Star(_) | Query(_) | PlusPlus(..) | StarPlus(..) => 4,
      Ref{..} | StrLiteral(_) | CharClass{..} | Range(..) | Any => 5
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(*self, StrLiteral(_) | CharClass{..} | Range(..) | Any)
  }

  pub fn is_predicate(&self) -> bool {
    matches!(*self, And(_) | Not(_))
  }
}

/// Derivation attributes and naming of one expression, stored apart from the
/// node itself (the expression vector stays immutable once built, the info
/// vector is refined in place by the analysis passes).
#[derive(Clone, Debug, Default)]
pub struct ExprInfo
{
  /// Reconstructed, parenthesization-normalized source form. This is the
  /// structural-equality key used by compaction and diagnostics.
  pub canonical: String,
  /// Procedure name: preset for rules, assigned on demand for shared
  /// subexpressions and terminals during code generation.
  pub name: Option<String>,
  /// May match the empty string.
  pub nul: bool,
  /// May consume at least one character.
  pub adv: bool,
  /// May fail.
  pub fal: bool,
  /// Bounded-recursion guarantee.
  pub wf: bool
}

impl ExprInfo
{
  fn of(expr: &Expression) -> ExprInfo {
    let mut info = ExprInfo::default();
    if expr.is_terminal() {
      info.adv = true;
      info.fal = true;
      info.wf = true;
      // The empty literal matches without consuming and cannot fail.
      if let StrLiteral(lit) = expr {
        if lit.is_empty() {
          info.nul = true;
          info.adv = false;
          info.fal = false;
        }
      }
    }
    info
  }

  fn flags(&self) -> String {
    let mut s = String::new();
    for (on, tag) in [(self.nul, "nul"), (self.adv, "adv"),
                      (self.fal, "fal"), (self.wf, "WF")] {
      if on {
        if !s.is_empty() { s.push(' '); }
        s.push_str(tag);
      }
    }
    s
  }
}

pub trait ExprByIndex
{
  fn expr_by_index(&self, index: usize) -> Expression;
}

/// A grammar under analysis: the expression arena, the node lists maintained
/// by the builder, and the diagnostics gathered so far.
///
/// The entry rule is `rules[0]`. `subs` holds every non-rule, non-terminal
/// node exactly once (listed by identity, so it may still contain duplicate
/// *content* until `compact` runs); `terms` holds one terminal per distinct
/// terminal text; `refs` holds every reference node.
pub struct Grammar
{
  pub exprs: Vec<Expression>,
  pub infos: Vec<ExprInfo>,
  pub rules: Vec<usize>,
  pub subs: Vec<usize>,
  pub terms: Vec<usize>,
  pub refs: Vec<usize>,
  pub diagnostics: Vec<Diagnostic>,
  /// Fatal build errors (duplicate rule name, undefined reference), plus any
  /// error count handed over by the front end.
  pub errors: usize,
  /// Number of rules and subexpressions that failed the well-formedness
  /// analysis. Nonzero blocks code generation only.
  pub not_wf: usize
}

impl Grammar
{
  pub fn new() -> Grammar {
    Grammar {
      exprs: vec![],
      infos: vec![],
      rules: vec![],
      subs: vec![],
      terms: vec![],
      refs: vec![],
      diagnostics: vec![],
      errors: 0,
      not_wf: 0
    }
  }

  /// Adds an expression to the arena and returns its index. Terminals get
  /// their attributes preset here.
  pub fn push(&mut self, expr: Expression) -> usize {
    let idx = self.exprs.len();
    self.infos.push(ExprInfo::of(&expr));
    self.exprs.push(expr);
    idx
  }

  /// Adds a rule where every alternative succeeds and fails silently.
  pub fn push_rule(&mut self, name: &str, rhs: Vec<usize>) -> usize {
    let arity = rhs.len();
    self.push_rule_with(name, None, rhs, vec![None; arity], vec![None; arity])
  }

  pub fn push_rule_with(&mut self, name: &str, diag_name: Option<String>,
    rhs: Vec<usize>, on_succ: Vec<Option<Action>>, on_fail: Vec<Option<Action>>) -> usize
  {
    assert!(!rhs.is_empty(), "a rule must have at least one alternative");
    assert!(rhs.len() == on_succ.len() && rhs.len() == on_fail.len(),
      "one action pair per alternative");
    let idx = self.push(Rule {
      name: String::from(name),
      diag_name,
      rhs, on_succ, on_fail
    });
    self[idx].name = Some(String::from(name));
    self.rules.push(idx);
    idx
  }

  pub fn rule_name(&self, rule: usize) -> &str {
    match &self.exprs[rule] {
      Rule { name, .. } => name,
      _ => panic!("expression {} is not a rule", rule)
    }
  }

  pub fn find_rule_by_name(&self, name: &str) -> Option<usize> {
    self.rules.iter().cloned()
      .find(|&r| self.rule_name(r) == name)
  }

  pub fn canonical(&self, expr: usize) -> &str {
    &self.infos[expr].canonical
  }

  pub fn err(&mut self, msg: String) {
    self.errors += 1;
    self.diagnostics.push(Diagnostic::error(msg));
  }

  pub fn warn(&mut self, msg: String) {
    self.diagnostics.push(Diagnostic::warning(msg));
  }

  pub fn note(&mut self, msg: String) {
    self.diagnostics.push(Diagnostic::note(msg));
  }
}

impl Default for Grammar
{
  fn default() -> Grammar {
    Grammar::new()
  }
}

impl ExprByIndex for Grammar
{
  fn expr_by_index(&self, index: usize) -> Expression {
    self.exprs[index].clone()
  }
}

impl Index<usize> for Grammar
{
  type Output = ExprInfo;

  fn index(&self, index: usize) -> &ExprInfo {
    &self.infos[index]
  }
}

impl IndexMut<usize> for Grammar
{
  fn index_mut(&mut self, index: usize) -> &mut ExprInfo {
    &mut self.infos[index]
  }
}

/// Lists the rules and subexpressions together with their attributes, in the
/// manner of a grammar checker's display mode.
impl fmt::Display for Grammar
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    for &rule in &self.rules {
      writeln!(f, "{};   // {}", self[rule].canonical, self[rule].flags())?;
    }
    for &sub in &self.subs {
      writeln!(f, "  {}   // {}", self[sub].canonical, self[sub].flags())?;
    }
    Ok(())
  }
}
