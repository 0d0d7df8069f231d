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

//! Well-formedness: the bounded-recursion guarantee.
//!
//! A second monotone fixpoint over the `wf` flag, seeded true at terminals
//! and false everywhere else. A repetition whose operand may match the empty
//! string never terminates, and a left-recursive rule can never reach the
//! `wf == true` side of the fixpoint, so both surface here as rules or
//! subexpressions that stay ill-formed. The number of such nodes is recorded
//! in `Grammar::not_wf` and blocks code generation only.

use crate::ast::*;
use crate::middle::attribute::{self, Attrs};
use crate::visitor::*;
use partial::Partial;
use partial::Partial::*;
use tracing::debug;

/// Attributes and well-formedness of a node, possibly one synthesized by the
/// until-operator desugaring.
type Wf = (Attrs, bool);

fn wf_seq(items: &[Wf]) -> bool {
  let mut wf = true;
  for &(attrs, well_formed) in items {
    wf &= well_formed;
    if !attrs.nul {
      break;
    }
  }
  wf
}

fn wf_repeat(child: Wf) -> bool {
  child.1 && !child.0.nul
}

fn until_parts(body: Wf, until: Wf) -> (Wf, Wf) {
  let not_until = (attribute::not(until.0), until.1);
  let step = (attribute::seq(&[not_until.0, body.0]), wf_seq(&[not_until, body]));
  let steps = (attribute::star(step.0), wf_repeat(step));
  (step, steps)
}

fn wf_one_or_more_until(body: Wf, until: Wf) -> bool {
  let (step, steps) = until_parts(body, until);
  wf_seq(&[step, steps, until])
}

fn wf_zero_or_more_until(body: Wf, until: Wf) -> bool {
  let (_, steps) = until_parts(body, until);
  wf_seq(&[steps, until])
}

pub fn infer(mut grammar: Grammar) -> Partial<Grammar> {
  if grammar.errors > 0 {
    return Fake(grammar);
  }
  let mut order = grammar.refs.clone();
  order.extend(&grammar.subs);
  order.extend(&grammar.rules);
  let mut count = wf_count(&grammar);
  let mut iterations = 0usize;
  loop {
    WellFormedness { grammar: &mut grammar }.run(&order);
    iterations += 1;
    let grown = wf_count(&grammar);
    if grown == count {
      break;
    }
    count = grown;
  }
  grammar.not_wf = grammar.rules.iter().chain(grammar.subs.iter())
    .filter(|&&idx| !grammar[idx].wf)
    .count();
  debug!(iterations, not_wf = grammar.not_wf, "well-formedness fixpoint converged");
  Value(grammar)
}

fn wf_count(grammar: &Grammar) -> usize {
  grammar.rules.iter().chain(grammar.subs.iter())
    .filter(|&&idx| grammar[idx].wf)
    .count()
}

struct WellFormedness<'a>
{
  grammar: &'a mut Grammar
}

impl<'a> WellFormedness<'a>
{
  fn run(&mut self, order: &[usize]) {
    for &idx in order {
      let wf = self.visit_expr(idx);
      self.grammar[idx].wf = wf;
    }
  }

  fn wf(&self, idx: usize) -> Wf {
    let info = &self.grammar[idx];
    (Attrs::of(info), info.wf)
  }
}

impl<'a> ExprByIndex for WellFormedness<'a>
{
  fn expr_by_index(&self, index: usize) -> Expression {
    self.grammar.exprs[index].clone()
  }
}

impl<'a> Visitor<bool> for WellFormedness<'a>
{
  fn visit_sequence(&mut self, _this: usize, children: Vec<usize>) -> bool {
    let items: Vec<_> = children.iter().map(|&c| self.wf(c)).collect();
    wf_seq(&items)
  }

  fn visit_choice(&mut self, _this: usize, children: Vec<usize>) -> bool {
    children.iter().all(|&c| self.wf(c).1)
  }

  fn visit_syntactic_predicate(&mut self, _this: usize, child: usize) -> bool {
    self.wf(child).1
  }

  fn visit_repeat(&mut self, _this: usize, child: usize) -> bool {
    wf_repeat(self.wf(child))
  }

  fn visit_optional(&mut self, _this: usize, child: usize) -> bool {
    self.wf(child).1
  }

  fn visit_one_or_more_until(&mut self, _this: usize, body: usize, until: usize) -> bool {
    wf_one_or_more_until(self.wf(body), self.wf(until))
  }

  fn visit_zero_or_more_until(&mut self, _this: usize, body: usize, until: usize) -> bool {
    wf_zero_or_more_until(self.wf(body), self.wf(until))
  }

  fn visit_ref(&mut self, _this: usize, _name: String, rule: Option<usize>) -> bool {
    match rule {
      Some(rule) => self.wf(rule).1,
      None => false
    }
  }
}
