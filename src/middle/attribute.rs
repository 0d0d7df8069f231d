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

//! Derivation attributes: nullable, advancing, fallible.
//!
//! The per-variant combination rules are monotone, so sweeping them over the
//! references, subexpressions and rules until the number of true flags stops
//! growing reaches the least fixpoint; the iteration count is bounded by the
//! depth of the grammar. Terminals are preset at construction and excluded
//! from both the sweep and the convergence count.
//!
//! The until-operators are attributed through their desugaring,
//! `e1++ e2 == (!e2 e1)(!e2 e1)* e2` and `e1*+ e2 == (!e2 e1)* e2`, by
//! composing the `not`/`seq`/`star` combinators on synthesized attribute
//! values instead of transcribing the expanded boolean formulas.

use crate::ast::*;
use crate::visitor::*;
use partial::Partial;
use partial::Partial::*;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Attrs
{
  pub nul: bool,
  pub adv: bool,
  pub fal: bool
}

impl Attrs
{
  pub fn of(info: &ExprInfo) -> Attrs {
    Attrs { nul: info.nul, adv: info.adv, fal: info.fal }
  }

  fn store(self, info: &mut ExprInfo) {
    info.nul = self.nul;
    info.adv = self.adv;
    info.fal = self.fal;
  }

  pub fn trues(self) -> usize {
    self.nul as usize + self.adv as usize + self.fal as usize
  }
}

pub(crate) fn seq(children: &[Attrs]) -> Attrs {
  let nul = children.iter().all(|c| c.nul);
  let adv = children.iter().all(|c| c.nul || c.adv)
         && children.iter().any(|c| c.adv);
  // A failure can only surface from the prefix ending at the first child
  // that must consume input.
  let mut fal = false;
  for child in children {
    fal |= child.fal;
    if !child.nul { break; }
  }
  Attrs { nul, adv, fal }
}

pub(crate) fn choice(children: &[Attrs]) -> Attrs {
  Attrs {
    nul: children.iter().any(|c| c.nul),
    adv: children.iter().any(|c| c.adv),
    fal: children.iter().all(|c| c.fal)
  }
}

pub(crate) fn and(child: Attrs) -> Attrs {
  Attrs { nul: child.nul || child.adv, adv: false, fal: child.fal }
}

pub(crate) fn not(child: Attrs) -> Attrs {
  Attrs { nul: child.fal, adv: false, fal: child.nul || child.adv }
}

pub(crate) fn plus(child: Attrs) -> Attrs {
  Attrs { nul: child.nul, adv: child.adv, fal: child.fal }
}

pub(crate) fn star(child: Attrs) -> Attrs {
  Attrs { nul: child.fal, adv: child.adv, fal: false }
}

pub(crate) fn query(child: Attrs) -> Attrs {
  Attrs { nul: child.nul || child.fal, adv: child.adv, fal: false }
}

/// One guarded step `!e2 e1` of an until-loop.
fn guarded_step(body: Attrs, until: Attrs) -> Attrs {
  seq(&[not(until), body])
}

pub(crate) fn one_or_more_until(body: Attrs, until: Attrs) -> Attrs {
  let step = guarded_step(body, until);
  seq(&[step, star(step), until])
}

pub(crate) fn zero_or_more_until(body: Attrs, until: Attrs) -> Attrs {
  let step = guarded_step(body, until);
  seq(&[star(step), until])
}

pub fn infer(mut grammar: Grammar) -> Partial<Grammar> {
  if grammar.errors > 0 {
    return Fake(grammar);
  }
  let mut order = grammar.refs.clone();
  order.extend(&grammar.subs);
  order.extend(&grammar.rules);
  let mut count = flag_count(&grammar);
  let mut iterations = 0usize;
  loop {
    AttributeSweep { grammar: &mut grammar }.run(&order);
    iterations += 1;
    let grown = flag_count(&grammar);
    if grown == count {
      break;
    }
    count = grown;
  }
  debug!(iterations, flags = count, "attribute fixpoint converged");
  Value(grammar)
}

fn flag_count(grammar: &Grammar) -> usize {
  grammar.rules.iter().chain(grammar.subs.iter())
    .map(|&idx| Attrs::of(&grammar[idx]).trues())
    .sum()
}

struct AttributeSweep<'a>
{
  grammar: &'a mut Grammar
}

impl<'a> AttributeSweep<'a>
{
  fn run(&mut self, order: &[usize]) {
    for &idx in order {
      let attrs = self.visit_expr(idx);
      attrs.store(&mut self.grammar[idx]);
    }
  }

  fn attrs(&self, idx: usize) -> Attrs {
    Attrs::of(&self.grammar[idx])
  }

  fn attrs_of(&self, children: &[usize]) -> Vec<Attrs> {
    children.iter().map(|&c| self.attrs(c)).collect()
  }
}

impl<'a> ExprByIndex for AttributeSweep<'a>
{
  fn expr_by_index(&self, index: usize) -> Expression {
    self.grammar.exprs[index].clone()
  }
}

/// Each method combines the attributes its children carry right now; nothing
/// recurses, the outer loop supplies the iteration.
impl<'a> Visitor<Attrs> for AttributeSweep<'a>
{
  fn visit_sequence(&mut self, _this: usize, children: Vec<usize>) -> Attrs {
    seq(&self.attrs_of(&children))
  }

  fn visit_choice(&mut self, _this: usize, children: Vec<usize>) -> Attrs {
    choice(&self.attrs_of(&children))
  }

  fn visit_and_predicate(&mut self, _this: usize, child: usize) -> Attrs {
    and(self.attrs(child))
  }

  fn visit_not_predicate(&mut self, _this: usize, child: usize) -> Attrs {
    not(self.attrs(child))
  }

  fn visit_one_or_more(&mut self, _this: usize, child: usize) -> Attrs {
    plus(self.attrs(child))
  }

  fn visit_zero_or_more(&mut self, _this: usize, child: usize) -> Attrs {
    star(self.attrs(child))
  }

  fn visit_optional(&mut self, _this: usize, child: usize) -> Attrs {
    query(self.attrs(child))
  }

  fn visit_one_or_more_until(&mut self, _this: usize, body: usize, until: usize) -> Attrs {
    one_or_more_until(self.attrs(body), self.attrs(until))
  }

  fn visit_zero_or_more_until(&mut self, _this: usize, body: usize, until: usize) -> Attrs {
    zero_or_more_until(self.attrs(body), self.attrs(until))
  }

  fn visit_ref(&mut self, _this: usize, _name: String, rule: Option<usize>) -> Attrs {
    match rule {
      Some(rule) => self.attrs(rule),
      None => Attrs::default()
    }
  }
}

#[cfg(test)]
mod test
{
  use super::*;
  use crate::ast::Expression::*;
  use crate::middle::{lists, resolve};
  use pretty_assertions::assert_eq;
  use proptest::prelude::*;

  pub fn analysed(grammar: Grammar) -> Grammar {
    let analysed = lists::build(grammar)
      .and_then(resolve::resolve)
      .and_then(infer);
    match analysed {
      Value(grammar) => grammar,
      _ => panic!("attribute inference on a broken grammar")
    }
  }

  #[test]
  fn repetition_of_digits() {
    let mut g = Grammar::new();
    let digit = g.push(Range('0', '9'));
    let digits = g.push(Plus(digit));
    g.push_rule("number", vec![digits]);
    let g = analysed(g);
    let number = g.rules[0];
    assert!(!g[number].nul && g[number].adv && g[number].fal);
    assert!(!g[digits].nul && g[digits].adv && g[digits].fal);
  }

  #[test]
  fn star_never_fails_but_may_match_nothing() {
    let mut g = Grammar::new();
    let a = g.push(StrLiteral(String::from("a")));
    let stars = g.push(Star(a));
    g.push_rule("r", vec![stars]);
    let g = analysed(g);
    assert!(g[stars].nul && g[stars].adv && !g[stars].fal);
  }

  #[test]
  fn infallible_alternative_absorbs_choice_failure() {
    let mut g = Grammar::new();
    let a = g.push(StrLiteral(String::from("a")));
    let b = g.push(StrLiteral(String::from("b")));
    let opt = g.push(Query(b));
    let alts = g.push(Choice(vec![a, opt]));
    g.push_rule("r", vec![alts]);
    let g = analysed(g);
    assert!(!g[alts].fal);
    assert!(g[alts].nul && g[alts].adv);
  }

  #[test]
  fn sequence_failure_stops_at_first_mandatory_item() {
    let mut g = Grammar::new();
    let a = g.push(StrLiteral(String::from("a")));
    let b = g.push(StrLiteral(String::from("b")));
    let opt_a = g.push(Query(a));
    let seq = g.push(Sequence(vec![opt_a, b]));
    g.push_rule("r", vec![seq]);
    let g = analysed(g);
    assert!(g[seq].fal && g[seq].adv && !g[seq].nul);
  }

  #[test]
  fn reference_copies_rule_attributes() {
    let mut g = Grammar::new();
    let r = g.push(Ref { name: String::from("lit"), rule: None });
    g.push_rule("entry", vec![r]);
    let x = g.push(StrLiteral(String::from("x")));
    g.push_rule("lit", vec![x]);
    let g = analysed(g);
    assert!(!g[r].nul && g[r].adv && g[r].fal);
  }

  #[test]
  fn until_loop_matches_its_desugared_form() {
    // _*+ "." against ( (!"." _)* "." ) built by hand.
    let mut g = Grammar::new();
    let any = g.push(Any);
    let dot = g.push(StrLiteral(String::from(".")));
    let until = g.push(StarPlus(any, dot));
    g.push_rule("sugar", vec![until]);

    let any2 = g.push(Any);
    let dot2 = g.push(StrLiteral(String::from(".")));
    let dot3 = g.push(StrLiteral(String::from(".")));
    let not_dot = g.push(Not(dot2));
    let step = g.push(Sequence(vec![not_dot, any2]));
    let steps = g.push(Star(step));
    let desugared = g.push(Sequence(vec![steps, dot3]));
    g.push_rule("plain", vec![desugared]);

    let g = analysed(g);
    assert_eq!(Attrs::of(&g[until]), Attrs::of(&g[desugared]));
  }

  fn attrs_strategy() -> impl Strategy<Value = Attrs> {
    (any::<bool>(), any::<bool>(), any::<bool>())
      .prop_map(|(nul, adv, fal)| Attrs { nul, adv, fal })
  }

  fn le(small: Attrs, big: Attrs) -> bool {
    (!small.nul || big.nul) && (!small.adv || big.adv) && (!small.fal || big.fal)
  }

  proptest! {
    #![proptest_config(ProptestConfig { max_global_rejects: 65536, ..ProptestConfig::default() })]
    /// Growing inputs can only grow outputs, the property the fixpoint
    /// termination argument rests on.
    #[test]
    fn combinators_are_monotone(a in attrs_strategy(), b in attrs_strategy(),
      c in attrs_strategy(), d in attrs_strategy())
    {
      prop_assume!(le(a, b) && le(c, d));
      prop_assert!(le(seq(&[a, c]), seq(&[b, d])));
      prop_assert!(le(choice(&[a, c]), choice(&[b, d])));
      prop_assert!(le(and(a), and(b)));
      prop_assert!(le(not(a), not(b)));
      prop_assert!(le(plus(a), plus(b)));
      prop_assert!(le(star(a), star(b)));
      prop_assert!(le(query(a), query(b)));
      prop_assert!(le(one_or_more_until(a, c), one_or_more_until(b, d)));
      prop_assert!(le(zero_or_more_until(a, c), zero_or_more_until(b, d)));
    }
  }
}
