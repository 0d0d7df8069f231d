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

//! Parser generation from the analysed (and preferably compacted) grammar.
//!
//! Four cooperating visitors walk the graph. The reference visitor turns a
//! child expression into the call that invokes it: terminals become terminal
//! primitive calls, references call their target rule, and any other
//! compound node is named `<rule>_<n>` on first sight and queued for its own
//! procedure. The procedure-body visitor emits the full body of a queued
//! subexpression; the inline visitor emits code that falls through on
//! success and leaves through a caller-supplied exit on failure, used for
//! sequence items and single-alternative rules; the terminal visitor maps a
//! terminal to its primitive operation. Draining the queue can queue further
//! subexpressions, so the drain loop runs until no procedure is missing.
//!
//! All naming state lives in the generator; the grammar is never written to,
//! and a fixed rule order makes the emitted names reproducible.

use crate::ast::*;
use crate::ast::Expression::*;
use crate::back::ast::*;
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub fn generate(grammar: &Grammar, kind: ParserKind) -> ParserUnit {
  assert!(grammar.errors == 0 && grammar.not_wf == 0,
    "code generation requires a successfully analysed grammar");
  let mut gen = Generator::new(grammar, kind);
  for &rule in &grammar.rules {
    gen.rule_name = grammar.rule_name(rule).to_string();
    gen.sub_num = 0;
    let procedure = gen.rule_procedure(rule);
    gen.procedures.push(procedure);
    gen.drain_pending();
  }
  let (caches, cache_list) = gen.caches();
  debug!(rules = grammar.rules.len(), unnamed = gen.pending.len(),
    terminals = grammar.terms.len(), "generated parsing procedures");
  ParserUnit {
    kind,
    entry: grammar.rule_name(grammar.rules[0]).to_string(),
    procedures: gen.procedures,
    caches,
    cache_list
  }
}

struct Generator<'a>
{
  grammar: &'a Grammar,
  kind: ParserKind,
  /// Names assigned on demand, keyed by node identity.
  names: HashMap<usize, String>,
  /// Counter handles of the terminals, keyed by terminal text; filled only
  /// for instrumented parsers, the one kind that declares them.
  term_names: HashMap<String, String>,
  /// Every name handed out so far. Rule names, subexpression names and
  /// terminal handles share one namespace, and a rule named `term` would
  /// otherwise mint the same `term_<n>` twice.
  taken: HashSet<String>,
  /// Subexpressions named but not yet given a procedure; `done` marks how
  /// far the drain loop has come.
  pending: Vec<usize>,
  done: usize,
  /// Rule whose procedures are being generated, and the number of the next
  /// subexpression named within it.
  rule_name: String,
  sub_num: usize,
  procedures: Vec<Procedure>
}

impl<'a> Generator<'a>
{
  fn new(grammar: &'a Grammar, kind: ParserKind) -> Generator<'a> {
    let mut taken: HashSet<String> = grammar.rules.iter()
      .map(|&rule| grammar.rule_name(rule).to_string())
      .collect();
    let mut term_names = HashMap::new();
    if kind == ParserKind::Instrumented {
      let mut num = 0;
      for &term in &grammar.terms {
        let name = loop {
          let candidate = format!("term_{}", num);
          num += 1;
          if !taken.contains(&candidate) {
            break candidate;
          }
        };
        taken.insert(name.clone());
        term_names.insert(grammar[term].canonical.clone(), name);
      }
    }
    Generator {
      grammar,
      kind,
      names: HashMap::new(),
      term_names,
      taken,
      pending: vec![],
      done: 0,
      rule_name: String::new(),
      sub_num: 0,
      procedures: vec![]
    }
  }

  fn rule_procedure(&mut self, rule: usize) -> Procedure {
    let (name, diag_name, rhs, on_succ, on_fail) =
      match self.grammar.expr_by_index(rule) {
        Rule { name, diag_name, rhs, on_succ, on_fail } => {
          (name, diag_name, rhs, on_succ, on_fail)
        }
        _ => unreachable!("rules list holds a non-rule node")
      };
    let entry = match self.kind {
      ParserKind::Plain => Entry::Begin { name: name.clone(), diag: diag_name },
      _ => Entry::Saved { cache: name.clone() }
    };
    let mut body = vec![];
    if rhs.len() == 1 && on_fail[0].is_none() {
      // A single alternative with no failure action needs no choice wrapper:
      // the alternative is inlined and only the success action remains.
      self.inline(rhs[0], Exit::Reject, &mut body);
      body.push(Stmt::AcceptWith { action: on_succ[0].clone() });
    }
    else {
      for (i, &alt) in rhs.iter().enumerate() {
        let call = self.reference(alt);
        body.push(Stmt::Alternative {
          call,
          on_succ: on_succ[i].clone(),
          on_fail: on_fail[i].clone()
        });
      }
      body.push(Stmt::Return(Exit::Reject));
    }
    Procedure {
      name: name.clone(),
      comment: self.grammar[rule].canonical.clone(),
      cache: self.cache_handle(&name),
      entry,
      body
    }
  }

  /// Generating a procedure can name new subexpressions, so the loop keeps
  /// going until the queue runs dry.
  fn drain_pending(&mut self) {
    while self.done < self.pending.len() {
      let expr = self.pending[self.done];
      self.done += 1;
      let name = self.names[&expr].clone();
      let pred = self.grammar.exprs[expr].is_predicate();
      let entry = match self.kind {
        ParserKind::Plain => Entry::BeginInner {
          diag: pred.then(|| self.diag_pred(expr))
        },
        _ => Entry::SavedInner { cache: name.clone(), pred }
      };
      let body = self.procedure_body(expr);
      self.procedures.push(Procedure {
        name: name.clone(),
        comment: self.grammar[expr].canonical.clone(),
        cache: self.cache_handle(&name),
        entry,
        body
      });
    }
  }

  fn cache_handle(&self, name: &str) -> Option<String> {
    match self.kind {
      ParserKind::Instrumented => Some(name.to_string()),
      _ => None
    }
  }

  /// Reference visitor: the call invoking `expr` from its parent. Rules are
  /// always reached through a `Ref`, never directly.
  fn reference(&mut self, expr: usize) -> Call {
    match self.grammar.expr_by_index(expr) {
      Rule { name, .. } => unreachable!("rule `{}` invoked without a reference", name),
      Ref { name, .. } => Call::Proc(name),
      terminal if terminal.is_terminal() => Call::Term(self.terminal(expr)),
      _ => Call::Proc(self.name_of(expr))
    }
  }

  fn name_of(&mut self, expr: usize) -> String {
    if let Some(name) = self.names.get(&expr) {
      return name.clone();
    }
    let name = loop {
      let candidate = format!("{}_{}", self.rule_name, self.sub_num);
      self.sub_num += 1;
      if !self.taken.contains(&candidate) {
        break candidate;
      }
    };
    self.taken.insert(name.clone());
    self.names.insert(expr, name.clone());
    self.pending.push(expr);
    name
  }

  /// Procedure-body visitor: the full body of a named subexpression.
  fn procedure_body(&mut self, expr: usize) -> Vec<Stmt> {
    let mut body = vec![];
    match self.grammar.expr_by_index(expr) {
      Rule { name, .. } => unreachable!("rule `{}` queued as a subexpression", name),
      Choice(children) => {
        for &child in &children {
          let call = self.reference(child);
          body.push(Stmt::ReturnIf(call, Exit::AcceptInner));
        }
        body.push(Stmt::Return(Exit::RejectInner));
      }
      Sequence(children) => {
        for &child in &children {
          self.inline(child, Exit::RejectInner, &mut body);
        }
        body.push(Stmt::Return(Exit::AcceptInner));
      }
      And(child) => {
        let call = self.reference(child);
        body.push(Stmt::ReturnUnless(call, Exit::RejectAnd));
        body.push(Stmt::Return(Exit::AcceptAnd));
      }
      Not(child) => {
        let call = self.reference(child);
        body.push(Stmt::ReturnIf(call, Exit::RejectNot));
        body.push(Stmt::Return(Exit::AcceptNot));
      }
      Plus(child) => {
        let call = self.reference(child);
        body.push(Stmt::ReturnUnless(call.clone(), Exit::RejectInner));
        body.push(Stmt::RepeatWhile(call));
        body.push(Stmt::Return(Exit::AcceptInner));
      }
      Star(child) => {
        body.push(Stmt::RepeatWhile(self.reference(child)));
        body.push(Stmt::Return(Exit::AcceptInner));
      }
      Query(child) => {
        body.push(Stmt::Attempt(self.reference(child)));
        body.push(Stmt::Return(Exit::AcceptInner));
      }
      PlusPlus(until_body, until) => {
        body.push(Stmt::RepeatUntil {
          body: self.reference(until_body),
          until: self.reference(until),
          at_least_once: true,
          reject: Exit::RejectInner
        });
        body.push(Stmt::Return(Exit::AcceptInner));
      }
      StarPlus(until_body, until) => {
        body.push(Stmt::RepeatUntil {
          body: self.reference(until_body),
          until: self.reference(until),
          at_least_once: false,
          reject: Exit::RejectInner
        });
        body.push(Stmt::Return(Exit::AcceptInner));
      }
      Ref { name, .. } => {
        if self.grammar[expr].fal {
          body.push(Stmt::ReturnUnless(Call::Proc(name), Exit::RejectInner));
        }
        else {
          body.push(Stmt::Attempt(Call::Proc(name)));
        }
        body.push(Stmt::Return(Exit::AcceptInner));
      }
      _ => {
        let call = Call::Term(self.terminal(expr));
        body.push(Stmt::ReturnUnless(call, Exit::RejectInner));
        body.push(Stmt::Return(Exit::AcceptInner));
      }
    }
    body
  }

  /// Inline visitor: code that falls through on success and leaves through
  /// `reject` on failure, without a procedure of its own. A predicate over a
  /// bare terminal short-circuits to a lookahead primitive.
  fn inline(&mut self, expr: usize, reject: Exit, out: &mut Vec<Stmt>) {
    match self.grammar.expr_by_index(expr) {
      Rule { name, .. } => unreachable!("rule `{}` inlined without a reference", name),
      Choice(children) => {
        let calls = children.iter().map(|&child| self.reference(child)).collect();
        out.push(Stmt::ReturnIfNone(calls, reject));
      }
      Sequence(children) => {
        for &child in &children {
          self.inline(child, reject, out);
        }
      }
      And(child) => {
        if self.grammar.exprs[child].is_terminal() {
          out.push(Stmt::ReturnUnless(Call::Ahead(self.terminal(child)), reject));
        }
        else {
          let call = self.reference(expr);
          out.push(Stmt::ReturnUnless(call, reject));
        }
      }
      Not(child) => {
        if self.grammar.exprs[child].is_terminal() {
          out.push(Stmt::ReturnUnless(Call::AheadNot(self.terminal(child)), reject));
        }
        else {
          let call = self.reference(expr);
          out.push(Stmt::ReturnUnless(call, reject));
        }
      }
      Plus(child) => {
        let call = self.reference(child);
        out.push(Stmt::ReturnUnless(call.clone(), reject));
        out.push(Stmt::RepeatWhile(call));
      }
      Star(child) => {
        out.push(Stmt::RepeatWhile(self.reference(child)));
      }
      Query(child) => {
        out.push(Stmt::Attempt(self.reference(child)));
      }
      PlusPlus(until_body, until) => {
        out.push(Stmt::RepeatUntil {
          body: self.reference(until_body),
          until: self.reference(until),
          at_least_once: true,
          reject
        });
      }
      StarPlus(until_body, until) => {
        out.push(Stmt::RepeatUntil {
          body: self.reference(until_body),
          until: self.reference(until),
          at_least_once: false,
          reject
        });
      }
      Ref { name, .. } => {
        if self.grammar[expr].fal {
          out.push(Stmt::ReturnUnless(Call::Proc(name), reject));
        }
        else {
          out.push(Stmt::Attempt(Call::Proc(name)));
        }
      }
      _ => {
        out.push(Stmt::ReturnUnless(Call::Term(self.terminal(expr)), reject));
      }
    }
  }

  /// Terminal visitor: the primitive operation matching a terminal, with the
  /// single-character fast path and the counter handle of instrumented
  /// parsers.
  fn terminal(&self, expr: usize) -> TermOp {
    let test = match self.grammar.expr_by_index(expr) {
      StrLiteral(lit) => {
        let mut chars = lit.chars();
        match (chars.next(), chars.next()) {
          (Some(c), None) => TermTest::Char(c),
          _ => TermTest::Str(lit)
        }
      }
      CharClass { chars, negated } => {
        let mut iter = chars.chars();
        match (iter.next(), iter.next(), negated) {
          (Some(c), None, false) => TermTest::Char(c),
          (Some(c), None, true) => TermTest::NotChar(c),
          (_, _, false) => TermTest::OneOf(chars),
          (_, _, true) => TermTest::NoneOf(chars)
        }
      }
      Range(lo, hi) => TermTest::Range(lo, hi),
      Any => TermTest::Any,
      other => unreachable!("terminal call on `{:?}`", other)
    };
    TermOp { test, counter: self.counter(expr) }
  }

  fn counter(&self, expr: usize) -> Option<String> {
    match self.kind {
      ParserKind::Instrumented => {
        self.term_names.get(self.grammar.canonical(expr)).cloned()
      }
      _ => None
    }
  }

  fn diag_rule(&self, rule: usize) -> String {
    match self.grammar.expr_by_index(rule) {
      Rule { name, diag_name, .. } => diag_name.unwrap_or(name),
      _ => unreachable!("diagnostic name of a non-rule node")
    }
  }

  /// Diagnostic string of a predicate, shown when the predicate is the
  /// failure reported to the user.
  fn diag_pred(&self, expr: usize) -> String {
    match self.grammar.expr_by_index(expr) {
      And(child) => match self.grammar.expr_by_index(child) {
        Ref { rule: Some(rule), .. } => self.diag_rule(rule),
        _ => self.grammar.canonical(child).to_string()
      },
      Not(child) => match self.grammar.expr_by_index(child) {
        Ref { rule: Some(rule), .. } => format!("not {}", self.diag_rule(rule)),
        Any => String::from("end of text"),
        _ => format!("not {}", self.grammar.canonical(child))
      },
      other => unreachable!("diagnostic string for a non-predicate `{:?}`", other)
    }
  }

  /// Cache declarations of the memoizing and instrumented kinds: one per
  /// rule, one per named subexpression, and for instrumented parsers one per
  /// terminal; the list keeps declaration order.
  fn caches(&self) -> (Vec<CacheDecl>, Vec<String>) {
    if self.kind == ParserKind::Plain {
      return (vec![], vec![]);
    }
    let mut caches = vec![];
    for &rule in &self.grammar.rules {
      let name = self.grammar.rule_name(rule).to_string();
      caches.push(CacheDecl {
        name: name.clone(),
        display: name,
        diag: Some(self.diag_rule(rule)),
        comment: None
      });
    }
    for &sub in &self.pending {
      let name = self.names[&sub].clone();
      let diag = self.grammar.exprs[sub].is_predicate()
        .then(|| self.diag_pred(sub));
      caches.push(CacheDecl {
        name: name.clone(),
        display: name,
        diag,
        comment: Some(self.grammar[sub].canonical.clone())
      });
    }
    if self.kind == ParserKind::Instrumented {
      for &term in &self.grammar.terms {
        let text = self.grammar[term].canonical.clone();
        caches.push(CacheDecl {
          name: self.term_names[&text].clone(),
          display: text,
          diag: None,
          comment: None
        });
      }
    }
    let list = caches.iter().map(|cache| cache.name.clone()).collect();
    (caches, list)
  }
}

#[cfg(test)]
mod test
{
  use super::*;
  use crate::middle::analyse;
  use partial::Partial::*;
  use pretty_assertions::assert_eq;

  fn compiled(grammar: Grammar, kind: ParserKind) -> ParserUnit {
    let mut grammar = match analyse(grammar) {
      Value(grammar) => grammar,
      _ => panic!("generation tests need a clean grammar")
    };
    grammar.compact();
    generate(&grammar, kind)
  }

  /// s = a "+" a; a = [0-9]+
  fn sum_grammar() -> Grammar {
    let mut g = Grammar::new();
    let a1 = g.push(Ref { name: String::from("a"), rule: None });
    let plus = g.push(StrLiteral(String::from("+")));
    let a2 = g.push(Ref { name: String::from("a"), rule: None });
    let seq = g.push(Sequence(vec![a1, plus, a2]));
    g.push_rule("s", vec![seq]);
    let digit = g.push(Range('0', '9'));
    let digits = g.push(Plus(digit));
    g.push_rule("a", vec![digits]);
    g
  }

  fn proc_names(unit: &ParserUnit) -> Vec<&str> {
    unit.procedures.iter().map(|p| p.name.as_str()).collect()
  }

  fn called_procs(unit: &ParserUnit) -> Vec<String> {
    fn of_call(call: &Call, out: &mut Vec<String>) {
      if let Call::Proc(name) = call {
        out.push(name.clone());
      }
    }
    let mut out = vec![];
    for procedure in &unit.procedures {
      for stmt in &procedure.body {
        match stmt {
          Stmt::Attempt(call) | Stmt::ReturnIf(call, _)
          | Stmt::ReturnUnless(call, _) | Stmt::RepeatWhile(call)
          | Stmt::Alternative { call, .. } => of_call(call, &mut out),
          Stmt::ReturnIfNone(calls, _) => {
            for call in calls {
              of_call(call, &mut out);
            }
          }
          Stmt::RepeatUntil { body, until, .. } => {
            of_call(body, &mut out);
            of_call(until, &mut out);
          }
          Stmt::Return(_) | Stmt::AcceptWith { .. } => ()
        }
      }
    }
    out
  }

  #[test]
  fn sum_grammar_inlines_both_rules() {
    let unit = compiled(sum_grammar(), ParserKind::Plain);
    assert_eq!(unit.entry, "s");
    assert_eq!(proc_names(&unit), vec!["s", "a"]);

    let s = &unit.procedures[0];
    assert_eq!(s.entry, Entry::Begin { name: String::from("s"), diag: None });
    assert_eq!(s.body, vec![
      Stmt::ReturnUnless(Call::Proc(String::from("a")), Exit::Reject),
      Stmt::ReturnUnless(Call::Term(TermOp {
        test: TermTest::Char('+'), counter: None
      }), Exit::Reject),
      Stmt::ReturnUnless(Call::Proc(String::from("a")), Exit::Reject),
      Stmt::AcceptWith { action: None }
    ]);

    let a = &unit.procedures[1];
    let digit = Call::Term(TermOp {
      test: TermTest::Range('0', '9'), counter: None
    });
    assert_eq!(a.body, vec![
      Stmt::ReturnUnless(digit.clone(), Exit::Reject),
      Stmt::RepeatWhile(digit),
      Stmt::AcceptWith { action: None }
    ]);
  }

  #[test]
  fn multi_alternative_rule_names_its_subexpressions() {
    // r = "a" "b" / "c"+
    let mut g = Grammar::new();
    let a = g.push(StrLiteral(String::from("a")));
    let b = g.push(StrLiteral(String::from("b")));
    let seq = g.push(Sequence(vec![a, b]));
    let c = g.push(StrLiteral(String::from("c")));
    let cs = g.push(Plus(c));
    g.push_rule("r", vec![seq, cs]);
    let unit = compiled(g, ParserKind::Plain);
    assert_eq!(proc_names(&unit), vec!["r", "r_0", "r_1"]);
    let r = &unit.procedures[0];
    assert_eq!(r.body, vec![
      Stmt::Alternative {
        call: Call::Proc(String::from("r_0")), on_succ: None, on_fail: None
      },
      Stmt::Alternative {
        call: Call::Proc(String::from("r_1")), on_succ: None, on_fail: None
      },
      Stmt::Return(Exit::Reject)
    ]);
  }

  #[test]
  fn queued_subexpressions_queue_their_own() {
    // r = ("a" / "b")+ / "x" — the plus gets a procedure whose body names
    // the choice, which must be drained in the same pass.
    let mut g = Grammar::new();
    let a = g.push(StrLiteral(String::from("a")));
    let b = g.push(StrLiteral(String::from("b")));
    let choice = g.push(Choice(vec![a, b]));
    let plus = g.push(Plus(choice));
    let x = g.push(StrLiteral(String::from("x")));
    g.push_rule("r", vec![plus, x]);
    let unit = compiled(g, ParserKind::Plain);
    assert_eq!(proc_names(&unit), vec!["r", "r_0", "r_1"]);
    // Every called procedure exists exactly once.
    let names: Vec<_> = proc_names(&unit);
    for called in called_procs(&unit) {
      assert_eq!(names.iter().filter(|&&n| n == called).count(), 1,
        "procedure `{}` must be emitted exactly once", called);
    }
  }

  #[test]
  fn shared_subexpression_generates_one_procedure() {
    // s = [0-9]+ / "z"; a = [0-9]+ / "y" — after compaction both rules hold
    // the same repetition node, named once under the first rule.
    let mut g = Grammar::new();
    let d1 = g.push(Range('0', '9'));
    let p1 = g.push(Plus(d1));
    let z = g.push(StrLiteral(String::from("z")));
    g.push_rule("s", vec![p1, z]);
    let d2 = g.push(Range('0', '9'));
    let p2 = g.push(Plus(d2));
    let y = g.push(StrLiteral(String::from("y")));
    g.push_rule("a", vec![p2, y]);
    let unit = compiled(g, ParserKind::Plain);
    assert_eq!(proc_names(&unit), vec!["s", "s_0", "a"]);
    let a = &unit.procedures[2];
    assert_eq!(a.body[0], Stmt::Alternative {
      call: Call::Proc(String::from("s_0")), on_succ: None, on_fail: None
    });
  }

  #[test]
  fn predicate_over_terminal_becomes_a_lookahead() {
    // r = !"a" "b"
    let mut g = Grammar::new();
    let a = g.push(StrLiteral(String::from("a")));
    let not = g.push(Not(a));
    let b = g.push(StrLiteral(String::from("b")));
    let seq = g.push(Sequence(vec![not, b]));
    g.push_rule("r", vec![seq]);
    let unit = compiled(g, ParserKind::Plain);
    assert_eq!(proc_names(&unit), vec!["r"]);
    assert_eq!(unit.procedures[0].body[0],
      Stmt::ReturnUnless(Call::AheadNot(TermOp {
        test: TermTest::Char('a'), counter: None
      }), Exit::Reject));
  }

  #[test]
  fn predicate_over_compound_gets_a_procedure_with_diagnostic() {
    // r = !("a" "b") "c"
    let mut g = Grammar::new();
    let a = g.push(StrLiteral(String::from("a")));
    let b = g.push(StrLiteral(String::from("b")));
    let seq = g.push(Sequence(vec![a, b]));
    let not = g.push(Not(seq));
    let c = g.push(StrLiteral(String::from("c")));
    let rhs = g.push(Sequence(vec![not, c]));
    g.push_rule("r", vec![rhs]);
    let unit = compiled(g, ParserKind::Plain);
    assert_eq!(proc_names(&unit), vec!["r", "r_0", "r_1"]);
    let r_0 = &unit.procedures[1];
    assert_eq!(r_0.entry, Entry::BeginInner {
      diag: Some(String::from("not \"a\" \"b\""))
    });
    assert_eq!(r_0.body, vec![
      Stmt::ReturnIf(Call::Proc(String::from("r_1")), Exit::RejectNot),
      Stmt::Return(Exit::AcceptNot)
    ]);
  }

  #[test]
  fn not_any_reports_end_of_text() {
    // r = "a" / !_
    let mut g = Grammar::new();
    let a = g.push(StrLiteral(String::from("a")));
    let any = g.push(Any);
    let eot = g.push(Not(any));
    g.push_rule("r", vec![a, eot]);
    let unit = compiled(g, ParserKind::Plain);
    let r_0 = &unit.procedures[1];
    assert_eq!(r_0.entry, Entry::BeginInner {
      diag: Some(String::from("end of text"))
    });
  }

  #[test]
  fn infallible_reference_is_called_without_a_test() {
    // s = a "x"; a = "y"*
    let mut g = Grammar::new();
    let a_ref = g.push(Ref { name: String::from("a"), rule: None });
    let x = g.push(StrLiteral(String::from("x")));
    let seq = g.push(Sequence(vec![a_ref, x]));
    g.push_rule("s", vec![seq]);
    let y = g.push(StrLiteral(String::from("y")));
    let star = g.push(Star(y));
    g.push_rule("a", vec![star]);
    let unit = compiled(g, ParserKind::Plain);
    assert_eq!(unit.procedures[0].body[0],
      Stmt::Attempt(Call::Proc(String::from("a"))));
  }

  #[test]
  fn until_loops_emit_the_guarded_loop() {
    // comment = "/*" _*+ "*/"
    let mut g = Grammar::new();
    let open = g.push(StrLiteral(String::from("/*")));
    let any = g.push(Any);
    let close = g.push(StrLiteral(String::from("*/")));
    let tail = g.push(StarPlus(any, close));
    let seq = g.push(Sequence(vec![open, tail]));
    g.push_rule("comment", vec![seq]);
    let unit = compiled(g, ParserKind::Plain);
    assert_eq!(unit.procedures[0].body[1], Stmt::RepeatUntil {
      body: Call::Term(TermOp { test: TermTest::Any, counter: None }),
      until: Call::Term(TermOp { test: TermTest::Str(String::from("*/")), counter: None }),
      at_least_once: false,
      reject: Exit::Reject
    });
  }

  #[test]
  fn actions_follow_the_alternatives() {
    // r = "a" {build} {~recover} / "b" {&check}
    let mut g = Grammar::new();
    let a = g.push(StrLiteral(String::from("a")));
    let b = g.push(StrLiteral(String::from("b")));
    g.push_rule_with("r", None, vec![a, b],
      vec![Some(Action::new("build")), Some(Action::boolean("check"))],
      vec![Some(Action::new("recover")), None]);
    let unit = compiled(g, ParserKind::Plain);
    let r = &unit.procedures[0];
    assert_eq!(r.body, vec![
      Stmt::Alternative {
        call: Call::Term(TermOp { test: TermTest::Char('a'), counter: None }),
        on_succ: Some(Action::new("build")),
        on_fail: Some(Action::new("recover"))
      },
      Stmt::Alternative {
        call: Call::Term(TermOp { test: TermTest::Char('b'), counter: None }),
        on_succ: Some(Action::boolean("check")),
        on_fail: None
      },
      Stmt::Return(Exit::Reject)
    ]);
  }

  #[test]
  fn single_alternative_boolean_action_can_reject() {
    let mut g = Grammar::new();
    let a = g.push(StrLiteral(String::from("a")));
    g.push_rule_with("r", None, vec![a],
      vec![Some(Action::boolean("verify"))], vec![None]);
    let unit = compiled(g, ParserKind::Plain);
    assert_eq!(unit.procedures[0].body[1],
      Stmt::AcceptWith { action: Some(Action::boolean("verify")) });
  }

  #[test]
  fn memo_parser_guards_every_procedure_and_lists_caches() {
    let mut g = Grammar::new();
    let a = g.push(StrLiteral(String::from("a")));
    let b = g.push(StrLiteral(String::from("b")));
    let seq = g.push(Sequence(vec![a, b]));
    let c = g.push(StrLiteral(String::from("c")));
    g.push_rule_with("r", Some(String::from("letter")), vec![seq, c],
      vec![None, None], vec![None, None]);
    let unit = compiled(g, ParserKind::Memo);
    assert_eq!(unit.procedures[0].entry,
      Entry::Saved { cache: String::from("r") });
    assert_eq!(unit.procedures[1].entry,
      Entry::SavedInner { cache: String::from("r_0"), pred: false });
    // No counters outside the instrumented kind.
    assert!(unit.procedures.iter().all(|p| p.cache.is_none()));
    assert_eq!(unit.cache_list, vec!["r", "r_0"]);
    assert_eq!(unit.caches[0].diag, Some(String::from("letter")));
    assert_eq!(unit.caches[1].comment, Some(String::from("\"a\" \"b\"")));
  }

  #[test]
  fn instrumented_parser_counts_terminals() {
    let unit = compiled(sum_grammar(), ParserKind::Instrumented);
    assert!(unit.procedures.iter().all(|p| p.cache.as_deref() == Some(p.name.as_str())));
    // Rules then subexpressions then terminals.
    assert_eq!(unit.cache_list, vec!["s", "a", "term_0", "term_1"]);
    assert_eq!(unit.caches[2].display, "\"+\"");
    assert_eq!(unit.caches[3].display, "[0-9]");
    let plus = &unit.procedures[0].body[1];
    assert_eq!(*plus, Stmt::ReturnUnless(Call::Term(TermOp {
      test: TermTest::Char('+'), counter: Some(String::from("term_0"))
    }), Exit::Reject));
  }
}
