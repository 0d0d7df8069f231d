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

//! Abstract form of the generated parser.
//!
//! The generator emits one parameter-free boolean procedure per rule and per
//! named subexpression, expressed in the statement forms below; a target
//! backend renders them into concrete source. The vocabulary mirrors the
//! backtracking protocol of the runtime: a procedure opens a frame
//! (`Entry`), runs its statements, and leaves through one of the `Exit`
//! forms, which accept or reject the frame at the right nesting level.

use crate::ast::Action;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParserKind
{
  /// Plain backtracking parser.
  Plain,
  /// Memoizing parser: a procedure reuses the outcome cached at the current
  /// position instead of reparsing.
  Memo,
  /// Instrumented parser: memoizing, and every cache handle doubles as a
  /// call counter threaded through exits and terminal calls.
  Instrumented
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParserUnit
{
  pub kind: ParserKind,
  /// Procedure name of the entry rule.
  pub entry: String,
  pub procedures: Vec<Procedure>,
  /// Cache declarations, for the memoizing and instrumented kinds.
  pub caches: Vec<CacheDecl>,
  /// The names of `caches` in declaration order; the runtime iterates this
  /// list to reset and report them.
  pub cache_list: Vec<String>
}

#[derive(Clone, Debug, PartialEq)]
pub struct Procedure
{
  pub name: String,
  /// Canonical text of the expression this procedure parses.
  pub comment: String,
  /// Cache handle threaded through exits and terminal calls; present only
  /// in instrumented parsers.
  pub cache: Option<String>,
  pub entry: Entry,
  pub body: Vec<Stmt>
}

#[derive(Clone, Debug, PartialEq)]
pub enum Entry
{
  /// Open a rule frame.
  Begin { name: String, diag: Option<String> },
  /// Open a subexpression frame; predicates carry their diagnostic string.
  BeginInner { diag: Option<String> },
  /// Memoized rule: return the cached outcome when one applies at the
  /// current position.
  Saved { cache: String },
  /// Memoized subexpression; predicates reuse through the predicate path,
  /// which restores the position instead of advancing it.
  SavedInner { cache: String, pred: bool }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt
{
  /// Evaluate a call for its effect on the parsing state, ignoring the
  /// outcome.
  Attempt(Call),
  /// Leave through `exit` if the call succeeds.
  ReturnIf(Call, Exit),
  /// Leave through `exit` if the call fails.
  ReturnUnless(Call, Exit),
  /// Inlined ordered choice: try each alternative in order, leave through
  /// `exit` only if every one of them failed.
  ReturnIfNone(Vec<Call>, Exit),
  /// Repeat the call while it succeeds.
  RepeatWhile(Call),
  /// Until-loop: repeat `body` until `until` matches; a failing body leaves
  /// through `reject`. With `at_least_once` the body runs before the first
  /// guard test.
  RepeatUntil { body: Call, until: Call, at_least_once: bool, reject: Exit },
  /// Unconditional exit.
  Return(Exit),
  /// One alternative of a multi-alternative rule: on success fire the
  /// success action and accept (a boolean action may veto the acceptance),
  /// on failure fire the failure action and fall through.
  Alternative { call: Call, on_succ: Option<Action>, on_fail: Option<Action> },
  /// Tail of a single-alternative rule reached when the inlined body
  /// succeeded: fire the action, if any, and accept; a boolean action may
  /// instead force the rejection of the whole rule.
  AcceptWith { action: Option<Action> }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call
{
  /// Another parsing procedure.
  Proc(String),
  /// Consume a terminal.
  Term(TermOp),
  /// Look a terminal ahead without consuming it.
  Ahead(TermOp),
  /// Negative terminal lookahead.
  AheadNot(TermOp)
}

#[derive(Clone, Debug, PartialEq)]
pub struct TermOp
{
  pub test: TermTest,
  /// Counter handle, for instrumented parsers.
  pub counter: Option<String>
}

#[derive(Clone, Debug, PartialEq)]
pub enum TermTest
{
  /// Single-character literal fast path.
  Char(char),
  Str(String),
  /// One character of the class.
  OneOf(String),
  /// Any character but this one.
  NotChar(char),
  /// Any character outside the class.
  NoneOf(String),
  Range(char, char),
  Any
}

/// Exits of the backtracking protocol, by frame level: `Accept`/`Reject`
/// close a rule frame, the `Inner` pair closes a subexpression frame, and
/// the predicate pairs restore the starting position (inverting the outcome
/// for `Not`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Exit
{
  Accept,
  Reject,
  AcceptInner,
  RejectInner,
  AcceptAnd,
  RejectAnd,
  AcceptNot,
  RejectNot
}

#[derive(Clone, Debug, PartialEq)]
pub struct CacheDecl
{
  /// Handle referenced by procedures and constants.
  pub name: String,
  /// Display name shown by the runtime's statistics.
  pub display: String,
  /// Diagnostic string used in error messages.
  pub diag: Option<String>,
  /// Canonical text of the cached expression, carried as a comment.
  pub comment: Option<String>
}
