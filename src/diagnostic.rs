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

//! Diagnostics reported by the analysis passes.
//!
//! The front end delivers no source positions, so findings carry the rule
//! name or the canonical text of the offending expression instead of a span.
//! Everything is collected and reported in full before any decision to halt;
//! no pass aborts mid-traversal on a user-data condition.

use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity
{
  Error,
  Warning,
  Note
}

impl fmt::Display for Severity
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Severity::Error => write!(f, "error"),
      Severity::Warning => write!(f, "warning"),
      Severity::Note => write!(f, "note")
    }
  }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Diagnostic
{
  pub severity: Severity,
  pub message: String
}

impl Diagnostic
{
  pub fn error(message: String) -> Diagnostic {
    Diagnostic { severity: Severity::Error, message }
  }

  pub fn warning(message: String) -> Diagnostic {
    Diagnostic { severity: Severity::Warning, message }
  }

  pub fn note(message: String) -> Diagnostic {
    Diagnostic { severity: Severity::Note, message }
  }

  pub fn is_error(&self) -> bool {
    self.severity == Severity::Error
  }
}

impl fmt::Display for Diagnostic
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}: {}", self.severity, self.message)
  }
}
