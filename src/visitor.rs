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

use crate::ast::*;
use crate::ast::Expression::*;

/// Double dispatch over the closed expression set. `walk_expr` matches every
/// variant, so a pass that forgets a kind does not compile.
pub trait Visitor<R: Default> : ExprByIndex
{
  fn visit_expr(&mut self, this: usize) -> R {
    walk_expr(self, this)
  }

  /// Rules combine their alternatives exactly like an ordered choice unless
  /// a pass says otherwise.
  fn visit_rule(&mut self, this: usize, rhs: Vec<usize>) -> R {
    self.visit_choice(this, rhs)
  }

  fn visit_sequence(&mut self, _this: usize, children: Vec<usize>) -> R;
  fn visit_choice(&mut self, _this: usize, children: Vec<usize>) -> R;

  fn visit_terminal(&mut self, _this: usize) -> R { R::default() }

  fn visit_str_literal(&mut self, this: usize, _lit: String) -> R {
    self.visit_terminal(this)
  }

  fn visit_char_class(&mut self, this: usize, _chars: String, _negated: bool) -> R {
    self.visit_terminal(this)
  }

  fn visit_range(&mut self, this: usize, _lo: char, _hi: char) -> R {
    self.visit_terminal(this)
  }

  fn visit_any(&mut self, this: usize) -> R {
    self.visit_terminal(this)
  }

  fn visit_ref(&mut self, _this: usize, _name: String, _rule: Option<usize>) -> R {
    R::default()
  }

  fn visit_syntactic_predicate(&mut self, _this: usize, child: usize) -> R {
    self.visit_expr(child)
  }

  fn visit_and_predicate(&mut self, this: usize, child: usize) -> R {
    self.visit_syntactic_predicate(this, child)
  }

  fn visit_not_predicate(&mut self, this: usize, child: usize) -> R {
    self.visit_syntactic_predicate(this, child)
  }

  fn visit_repeat(&mut self, _this: usize, child: usize) -> R {
    self.visit_expr(child)
  }

  fn visit_one_or_more(&mut self, this: usize, child: usize) -> R {
    self.visit_repeat(this, child)
  }

  fn visit_zero_or_more(&mut self, this: usize, child: usize) -> R {
    self.visit_repeat(this, child)
  }

  fn visit_optional(&mut self, _this: usize, child: usize) -> R {
    self.visit_expr(child)
  }

  /// Until-operators: repeat `body` until `until` matches.
  fn visit_until(&mut self, _this: usize, body: usize, until: usize) -> R {
    self.visit_expr(body);
    self.visit_expr(until)
  }

  fn visit_one_or_more_until(&mut self, this: usize, body: usize, until: usize) -> R {
    self.visit_until(this, body, until)
  }

  fn visit_zero_or_more_until(&mut self, this: usize, body: usize, until: usize) -> R {
    self.visit_until(this, body, until)
  }
}

pub fn walk_expr<R: Default, V: ?Sized>(visitor: &mut V, this: usize) -> R where
  V: Visitor<R>
{
  match visitor.expr_by_index(this) {
    Rule { rhs, .. } => {
      visitor.visit_rule(this, rhs)
    }
    Choice(choices) => {
      visitor.visit_choice(this, choices)
    }
    Sequence(seq) => {
      visitor.visit_sequence(this, seq)
    }
    And(child) => {
      visitor.visit_and_predicate(this, child)
    }
    Not(child) => {
      visitor.visit_not_predicate(this, child)
    }
    Plus(child) => {
      visitor.visit_one_or_more(this, child)
    }
    Star(child) => {
      visitor.visit_zero_or_more(this, child)
    }
    Query(child) => {
      visitor.visit_optional(this, child)
    }
    PlusPlus(body, until) => {
      visitor.visit_one_or_more_until(this, body, until)
    }
    StarPlus(body, until) => {
      visitor.visit_zero_or_more_until(this, body, until)
    }
    Ref { name, rule } => {
      visitor.visit_ref(this, name, rule)
    }
    StrLiteral(lit) => {
      visitor.visit_str_literal(this, lit)
    }
    CharClass { chars, negated } => {
      visitor.visit_char_class(this, chars, negated)
    }
    Range(lo, hi) => {
      visitor.visit_range(this, lo, hi)
    }
    Any => {
      visitor.visit_any(this)
    }
  }
}

pub fn walk_exprs<R: Default, V: ?Sized>(visitor: &mut V, exprs: Vec<usize>) -> Vec<R> where
  V: Visitor<R>
{
  exprs.into_iter().map(|expr| visitor.visit_expr(expr)).collect()
}
