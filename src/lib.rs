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

//! Analysis and code-generation core of a parser generator for Parsing
//! Expression Grammar (PEG).
//!
//! An external front end parses grammar text into the expression arena of
//! [`ast::Grammar`]; this crate classifies and validates the grammar
//! (derivation attributes, well-formedness, left recursion, redundant
//! alternatives), deduplicates structurally identical subexpressions, and
//! compiles the result into recursive-descent parsing procedures, rendered
//! for Rust by [`back::rust`] on top of an external runtime.
//!
//! The pipeline is [`compile`]: analyse, refuse invalid or ill-formed
//! grammars, compact, generate. [`check`] stops after the analysis, for
//! grammar linting without a parser.

pub mod ast;
pub mod visitor;
pub mod diagnostic;
pub mod relation;
pub mod middle;
pub mod back;

pub use crate::ast::{Action, Expression, ExprInfo, Grammar};
pub use crate::back::ast::{ParserKind, ParserUnit};
pub use crate::diagnostic::{Diagnostic, Severity};
pub use partial::Partial;

use thiserror::Error;
use tracing::debug;

/// How the parser is generated and where it plugs in. The `runtime` and
/// `semantics` paths and the parser name must be valid Rust paths or
/// identifiers; they are spliced verbatim into the generated items.
#[derive(Clone, Debug)]
pub struct Config
{
  pub parser_name: String,
  pub kind: ParserKind,
  /// Type holding the semantic actions; the runtime's no-op semantics when
  /// absent.
  pub semantics: Option<String>,
  /// Crate or module the generated parser builds on.
  pub runtime: String,
  /// Deduplicate identical subexpressions before generation.
  pub compact: bool
}

impl Default for Config
{
  fn default() -> Config {
    Config {
      parser_name: String::from("Parser"),
      kind: ParserKind::Plain,
      semantics: None,
      runtime: String::from("peg_runtime"),
      compact: true
    }
  }
}

#[derive(Clone, Debug, Error)]
pub enum CompileError
{
  /// The grammar did not resolve: duplicate rule names, undeclared
  /// references, or no rule at all.
  #[error("the grammar has {errors} fatal error(s)")]
  Invalid { errors: usize, diagnostics: Vec<Diagnostic> },
  /// The grammar resolved but left recursion or a nullable repetition makes
  /// it unsuitable for a recursive-descent parser.
  #[error("{not_wf} rule(s) or subexpression(s) are not well-formed")]
  NotWellFormed { not_wf: usize, diagnostics: Vec<Diagnostic> }
}

impl CompileError
{
  pub fn diagnostics(&self) -> &[Diagnostic] {
    match self {
      CompileError::Invalid { diagnostics, .. } => diagnostics,
      CompileError::NotWellFormed { diagnostics, .. } => diagnostics
    }
  }
}

/// Runs the analysis pipeline without generating a parser; diagnostics are
/// on the returned grammar, `Fake` marks a grammar with fatal errors.
pub fn check(grammar: Grammar) -> Partial<Grammar> {
  middle::analyse(grammar)
}

/// Compiles an analysed grammar into the abstract parser. No parser is
/// produced from a grammar with fatal errors or one that is not
/// well-formed; the collected diagnostics travel with the error.
pub fn compile(grammar: Grammar, config: &Config) -> Result<ParserUnit, CompileError> {
  let mut grammar = match middle::analyse(grammar) {
    Partial::Value(grammar) => grammar,
    Partial::Fake(grammar) => {
      return Err(CompileError::Invalid {
        errors: grammar.errors,
        diagnostics: grammar.diagnostics
      });
    }
    Partial::Nothing => unreachable!("the analysis pipeline always carries the grammar")
  };
  if grammar.not_wf > 0 {
    return Err(CompileError::NotWellFormed {
      not_wf: grammar.not_wf,
      diagnostics: grammar.diagnostics
    });
  }
  if config.compact {
    grammar.compact();
  }
  debug!(kind = %config.kind, "generating parser");
  Ok(back::generate::generate(&grammar, config.kind))
}
