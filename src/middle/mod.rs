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

//! Analysis pipeline of the grammar, from the raw expression tree delivered
//! by a front end to a fully attributed, diagnosed grammar ready for code
//! generation.
//!
//! The stages run in a fixed order and each one is gated on the previous
//! stages producing zero fatal errors; a failed stage still hands the
//! grammar forward as `Fake` so that every error is collected and reported
//! before the pipeline decides to halt.

pub mod lists;
pub mod resolve;
pub mod canonical;
pub mod attribute;
pub mod well_formedness;
pub mod diagnose;
pub mod compact;

use crate::ast::*;
use partial::Partial;
use partial::Partial::*;
use tracing::debug;

pub fn analyse(grammar: Grammar) -> Partial<Grammar> {
  debug!(rules = grammar.rules.len(), exprs = grammar.exprs.len(),
    "grammar analysis");
  Value(grammar)
    .and_then(at_least_one_rule)
    .and_then(lists::build)
    .and_then(resolve::resolve)
    .and_then(canonical::reconstruct)
    .and_then(attribute::infer)
    .and_then(well_formedness::infer)
    .and_then(diagnose::diagnose)
}

fn at_least_one_rule(mut grammar: Grammar) -> Partial<Grammar> {
  if grammar.rules.is_empty() {
    grammar.err(String::from("at least one rule must be declared"));
    Fake(grammar)
  }
  else {
    Value(grammar)
  }
}
