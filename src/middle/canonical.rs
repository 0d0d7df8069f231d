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

//! Canonical-text reconstruction.
//!
//! Rebuilds the printable source form of every node, bottom-up, with
//! parenthesization normalized from the binding strengths: a child is
//! parenthesized iff its own strength is no greater than the strength the
//! context demands. The resulting text is the structural-equality key used
//! by compaction and by diagnostic deduplication, so it must be a pure
//! function of the tree.

use crate::ast::*;
use crate::ast::Expression::*;
use partial::Partial;
use partial::Partial::*;

pub fn reconstruct(mut grammar: Grammar) -> Partial<Grammar> {
  if grammar.errors > 0 {
    return Fake(grammar);
  }
  for rule in grammar.rules.clone() {
    text_of(&mut grammar, rule);
  }
  Value(grammar)
}

fn text_of(grammar: &mut Grammar, this: usize) -> String {
  if !grammar[this].canonical.is_empty() {
    return grammar[this].canonical.clone();
  }
  let text = match grammar.expr_by_index(this) {
    Rule { name, rhs, .. } => {
      let alts: Vec<_> = rhs.into_iter()
        .map(|alt| child_text(grammar, alt, 0))
        .collect();
      format!("{} = {}", name, alts.join(" / "))
    }
    Choice(children) => {
      let alts: Vec<_> = children.into_iter()
        .map(|child| child_text(grammar, child, 0))
        .collect();
      alts.join(" / ")
    }
    Sequence(children) => {
      let items: Vec<_> = children.into_iter()
        .map(|child| child_text(grammar, child, 1))
        .collect();
      items.join(" ")
    }
    And(child) => format!("&{}", child_text(grammar, child, 3)),
    Not(child) => format!("!{}", child_text(grammar, child, 3)),
    Plus(child) => format!("{}+", child_text(grammar, child, 4)),
    Star(child) => format!("{}*", child_text(grammar, child, 4)),
    Query(child) => format!("{}?", child_text(grammar, child, 4)),
    PlusPlus(body, until) => {
      format!("{}++ {}", child_text(grammar, body, 4), child_text(grammar, until, 4))
    }
    StarPlus(body, until) => {
      format!("{}*+ {}", child_text(grammar, body, 4), child_text(grammar, until, 4))
    }
    Ref { name, .. } => name,
    terminal => terminal_text(&terminal)
  };
  grammar[this].canonical = text.clone();
  text
}

fn child_text(grammar: &mut Grammar, child: usize, demand: u8) -> String {
  let text = text_of(grammar, child);
  if grammar.exprs[child].binding_strength() <= demand {
    format!("({})", text)
  }
  else {
    text
  }
}

/// Terminals print without looking at the rest of the tree, which lets the
/// list-building step deduplicate them before the full reconstruction runs.
pub fn terminal_text(expr: &Expression) -> String {
  match expr {
    StrLiteral(lit) => format!("\"{}\"", escape(lit)),
    CharClass { chars, negated } => {
      format!("{}[{}]", if *negated { "^" } else { "" }, escape(chars))
    }
    Range(lo, hi) => format!("[{}-{}]", escape_char(*lo), escape_char(*hi)),
    Any => String::from("_"),
    _ => panic!("terminal_text on a nonterminal expression")
  }
}

fn escape(text: &str) -> String {
  text.chars().map(escape_char).collect()
}

fn escape_char(c: char) -> String {
  match c {
    '\\' => String::from("\\\\"),
    '"' => String::from("\\\""),
    '[' => String::from("\\["),
    ']' => String::from("\\]"),
    '\n' => String::from("\\n"),
    '\r' => String::from("\\r"),
    '\t' => String::from("\\t"),
    c => c.to_string()
  }
}

#[cfg(test)]
mod test
{
  use super::*;
  use pretty_assertions::assert_eq;

  fn reconstructed(grammar: Grammar) -> Grammar {
    match reconstruct(grammar) {
      Value(grammar) => grammar,
      _ => panic!("reconstruction reported errors")
    }
  }

  #[test]
  fn parenthesization_follows_binding_strength() {
    let mut g = Grammar::new();
    let a = g.push(StrLiteral(String::from("a")));
    let b = g.push(StrLiteral(String::from("b")));
    let c = g.push(StrLiteral(String::from("c")));
    let choice = g.push(Choice(vec![a, b]));
    let star = g.push(Star(choice));
    let seq = g.push(Sequence(vec![star, c]));
    let not = g.push(Not(seq));
    g.push_rule("r", vec![not]);
    let g = reconstructed(g);
    assert_eq!(g.canonical(star), "(\"a\" / \"b\")*");
    assert_eq!(g.canonical(seq), "(\"a\" / \"b\")* \"c\"");
    assert_eq!(g.canonical(not), "!((\"a\" / \"b\")* \"c\")");
  }

  #[test]
  fn suffix_operators_chain_with_parentheses() {
    let mut g = Grammar::new();
    let a = g.push(Range('0', '9'));
    let plus = g.push(Plus(a));
    let query = g.push(Query(plus));
    g.push_rule("r", vec![query]);
    let g = reconstructed(g);
    assert_eq!(g.canonical(plus), "[0-9]+");
    assert_eq!(g.canonical(query), "([0-9]+)?");
  }

  #[test]
  fn until_operators_print_both_operands() {
    let mut g = Grammar::new();
    let any = g.push(Any);
    let stop = g.push(StrLiteral(String::from("*/")));
    let body = g.push(StarPlus(any, stop));
    g.push_rule("comment_tail", vec![body]);
    let g = reconstructed(g);
    assert_eq!(g.canonical(body), "_*+ \"*/\"");
  }

  #[test]
  fn rule_text_joins_alternatives() {
    let mut g = Grammar::new();
    let a = g.push(Ref { name: String::from("a"), rule: None });
    let b = g.push(StrLiteral(String::from("b")));
    let r = g.push_rule("r", vec![a, b]);
    let g = reconstructed(g);
    assert_eq!(g.canonical(r), "r = a / \"b\"");
  }

  #[test]
  fn reconstruction_is_idempotent() {
    let mut g = Grammar::new();
    let a = g.push(StrLiteral(String::from("a")));
    let not = g.push(Not(a));
    let r = g.push_rule("r", vec![not]);
    let g = reconstructed(g);
    let before = g.canonical(r).to_string();
    let g = reconstructed(g);
    assert_eq!(g.canonical(r), before);
  }

  #[test]
  fn terminal_escapes() {
    assert_eq!(terminal_text(&StrLiteral(String::from("a\"b\\"))), "\"a\\\"b\\\\\"");
    assert_eq!(terminal_text(&CharClass { chars: String::from("+-"), negated: true }), "^[+-]");
    assert_eq!(terminal_text(&Any), "_");
  }
}
