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

//! Readable rendering of the abstract parser.
//!
//! This is a debugging aid, not a target backend: procedures print as
//! pseudo-code close to the statement model, one statement per line. The
//! terminal primitives print under the same names the Rust target calls
//! (`next`, `ahead`, `ahead_not` with a payload suffix).

use crate::back::ast::*;
use std::fmt;

impl fmt::Display for ParserKind
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      ParserKind::Plain => write!(f, "plain"),
      ParserKind::Memo => write!(f, "memo"),
      ParserKind::Instrumented => write!(f, "instrumented")
    }
  }
}

impl fmt::Display for Exit
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let name = match self {
      Exit::Accept => "accept",
      Exit::Reject => "reject",
      Exit::AcceptInner => "accept_inner",
      Exit::RejectInner => "reject_inner",
      Exit::AcceptAnd => "accept_and",
      Exit::RejectAnd => "reject_and",
      Exit::AcceptNot => "accept_not",
      Exit::RejectNot => "reject_not"
    };
    write!(f, "{}", name)
  }
}

/// The method suffix and argument list of a terminal primitive, shared in
/// spirit with the Rust target's method names.
pub fn term_parts(op: &TermOp) -> (&'static str, Vec<String>) {
  let (suffix, mut args) = match &op.test {
    TermTest::Char(c) => ("", vec![format!("{:?}", c)]),
    TermTest::Str(s) => ("_str", vec![format!("{:?}", s)]),
    TermTest::OneOf(s) => ("_in", vec![format!("{:?}", s)]),
    TermTest::NotChar(c) => ("_not", vec![format!("{:?}", c)]),
    TermTest::NoneOf(s) => ("_not_in", vec![format!("{:?}", s)]),
    TermTest::Range(lo, hi) => ("_range", vec![format!("{:?}", lo), format!("{:?}", hi)]),
    TermTest::Any => ("_any", vec![])
  };
  if let Some(counter) = &op.counter {
    args.push(counter.clone());
  }
  (suffix, args)
}

fn term_call(prefix: &str, op: &TermOp) -> String {
  let (suffix, args) = term_parts(op);
  format!("{}{}({})", prefix, suffix, args.join(", "))
}

impl fmt::Display for Call
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Call::Proc(name) => write!(f, "{}()", name),
      Call::Term(op) => write!(f, "{}", term_call("next", op)),
      Call::Ahead(op) => write!(f, "{}", term_call("ahead", op)),
      Call::AheadNot(op) => write!(f, "{}", term_call("ahead_not", op))
    }
  }
}

impl fmt::Display for Entry
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Entry::Begin { name, diag: None } => write!(f, "begin {:?}", name),
      Entry::Begin { name, diag: Some(diag) } => {
        write!(f, "begin {:?} {:?}", name, diag)
      }
      Entry::BeginInner { diag: None } => write!(f, "begin \"\""),
      Entry::BeginInner { diag: Some(diag) } => write!(f, "begin \"\" {:?}", diag),
      Entry::Saved { cache } => {
        write!(f, "if saved({}) return reuse", cache)
      }
      Entry::SavedInner { cache, pred: false } => {
        write!(f, "if saved_inner({}) return reuse_inner", cache)
      }
      Entry::SavedInner { cache, pred: true } => {
        write!(f, "if saved_inner({}) return reuse_pred", cache)
      }
    }
  }
}

impl fmt::Display for Stmt
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Stmt::Attempt(call) => write!(f, "{}", call),
      Stmt::ReturnIf(call, exit) => write!(f, "if {} return {}", call, exit),
      Stmt::ReturnUnless(call, exit) => write!(f, "if !{} return {}", call, exit),
      Stmt::ReturnIfNone(calls, exit) => {
        let calls: Vec<_> = calls.iter()
          .map(|call| format!("!{}", call))
          .collect();
        write!(f, "if {} return {}", calls.join(" && "), exit)
      }
      Stmt::RepeatWhile(call) => write!(f, "while {}", call),
      Stmt::RepeatUntil { body, until, at_least_once: true, reject } => {
        writeln!(f, "if {} return {}", until, reject)?;
        write!(f, "  do if !{} return {} while !{}", body, reject, until)
      }
      Stmt::RepeatUntil { body, until, at_least_once: false, reject } => {
        write!(f, "while !{} if !{} return {}", until, body, reject)
      }
      Stmt::Return(exit) => write!(f, "return {}", exit),
      Stmt::Alternative { call, on_succ, on_fail } => {
        match on_succ {
          None => write!(f, "if {} return accept", call)?,
          Some(action) if action.boolean => {
            write!(f, "if {} && sem.{}() return accept", call, action.name)?
          }
          Some(action) => {
            write!(f, "if {} {{ sem.{}(); return accept }}", call, action.name)?
          }
        }
        if let Some(action) = on_fail {
          write!(f, " else sem.{}()", action.name)?;
        }
        Ok(())
      }
      Stmt::AcceptWith { action: None } => write!(f, "return accept"),
      Stmt::AcceptWith { action: Some(action) } if action.boolean => {
        writeln!(f, "if sem.{}() return accept", action.name)?;
        write!(f, "  bool_reject; return reject")
      }
      Stmt::AcceptWith { action: Some(action) } => {
        write!(f, "sem.{}(); return accept", action.name)
      }
    }
  }
}

impl fmt::Display for Procedure
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    writeln!(f, "{}:   // {}", self.name, self.comment)?;
    writeln!(f, "  {}", self.entry)?;
    for stmt in &self.body {
      writeln!(f, "  {}", stmt)?;
    }
    Ok(())
  }
}

impl fmt::Display for CacheDecl
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "cache {} {:?}", self.name, self.display)?;
    if let Some(diag) = &self.diag {
      write!(f, " expected {:?}", diag)?;
    }
    if let Some(comment) = &self.comment {
      write!(f, "   // {}", comment)?;
    }
    Ok(())
  }
}

impl fmt::Display for ParserUnit
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    writeln!(f, "{} parser, entry {}", self.kind, self.entry)?;
    for procedure in &self.procedures {
      writeln!(f)?;
      write!(f, "{}", procedure)?;
    }
    if !self.caches.is_empty() {
      writeln!(f)?;
      for cache in &self.caches {
        writeln!(f, "{}", cache)?;
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod test
{
  use super::*;
  use crate::ast::*;
  use crate::ast::Expression::*;
  use crate::back::generate::generate;
  use crate::middle::analyse;
  use partial::Partial::*;
  use pretty_assertions::assert_eq;

  fn printed(grammar: Grammar, kind: ParserKind) -> String {
    let mut grammar = match analyse(grammar) {
      Value(grammar) => grammar,
      _ => panic!("printer tests need a clean grammar")
    };
    grammar.compact();
    generate(&grammar, kind).to_string()
  }

  #[test]
  fn sum_grammar_prints_as_pseudo_code() {
    // s = a "+" a; a = [0-9]+
    let mut g = Grammar::new();
    let a1 = g.push(Ref { name: String::from("a"), rule: None });
    let plus = g.push(StrLiteral(String::from("+")));
    let a2 = g.push(Ref { name: String::from("a"), rule: None });
    let seq = g.push(Sequence(vec![a1, plus, a2]));
    g.push_rule("s", vec![seq]);
    let digit = g.push(Range('0', '9'));
    let digits = g.push(Plus(digit));
    g.push_rule("a", vec![digits]);
    assert_eq!(printed(g, ParserKind::Plain), "\
plain parser, entry s

s:   // s = a \"+\" a
  begin \"s\"
  if !a() return reject
  if !next('+') return reject
  if !a() return reject
  return accept

a:   // a = [0-9]+
  begin \"a\"
  if !next_range('0', '9') return reject
  while next_range('0', '9')
  return accept
");
  }

  #[test]
  fn memo_caches_are_listed() {
    let mut g = Grammar::new();
    let x = g.push(StrLiteral(String::from("x")));
    g.push_rule("r", vec![x]);
    let out = printed(g, ParserKind::Memo);
    assert!(out.contains("if saved(r) return reuse"));
    assert!(out.contains("cache r \"r\" expected \"r\""));
  }

  #[test]
  fn until_loop_prints_its_guard() {
    let mut g = Grammar::new();
    let any = g.push(Any);
    let dot = g.push(StrLiteral(String::from(".")));
    let tail = g.push(PlusPlus(any, dot));
    g.push_rule("r", vec![tail]);
    let out = printed(g, ParserKind::Plain);
    assert!(out.contains("if next('.') return reject"));
    assert!(out.contains("do if !next_any() return reject while !next('.')"));
  }
}
