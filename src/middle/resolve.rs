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

//! Reference resolution.
//!
//! Binds every reference to its target rule, reports duplicate rule
//! definitions and undeclared names as fatal errors, warns about rules that
//! nothing references, and performs the single action-name-synthesis pass:
//! an action present with an empty name receives a name derived from its
//! rule and alternative position.

use crate::ast::*;
use crate::ast::Expression::*;
use partial::Partial;
use partial::Partial::*;
use std::collections::{HashMap, HashSet};

pub fn resolve(mut grammar: Grammar) -> Partial<Grammar> {
  if grammar.errors > 0 {
    return Fake(grammar);
  }
  let table = rule_table(&mut grammar);
  bind_refs(&mut grammar, &table);
  warn_unused(&mut grammar);
  synthesize_action_names(&mut grammar);
  if grammar.errors > 0 {
    Fake(grammar)
  }
  else {
    Value(grammar)
  }
}

/// First definition wins; later definitions of the same name are reported
/// and ignored.
fn rule_table(grammar: &mut Grammar) -> HashMap<String, usize> {
  let mut table = HashMap::with_capacity(grammar.rules.len());
  for rule in grammar.rules.clone() {
    let name = grammar.rule_name(rule).to_string();
    if table.contains_key(&name) {
      grammar.err(format!("duplicate definition of rule `{}`", name));
    }
    else {
      table.insert(name, rule);
    }
  }
  table
}

fn bind_refs(grammar: &mut Grammar, table: &HashMap<String, usize>) {
  let mut undeclared = HashSet::new();
  for r in grammar.refs.clone() {
    let name = match &grammar.exprs[r] {
      Ref { name, .. } => name.clone(),
      _ => unreachable!("refs list holds a non-reference node")
    };
    match table.get(&name) {
      Some(&target) => {
        if let Ref { rule, .. } = &mut grammar.exprs[r] {
          *rule = Some(target);
        }
      }
      None => {
        if undeclared.insert(name.clone()) {
          grammar.err(format!("undeclared rule `{}`", name));
        }
      }
    }
  }
}

/// Every rule except the entry rule must be referenced somewhere.
fn warn_unused(grammar: &mut Grammar) {
  let referenced: HashSet<String> = grammar.refs.iter()
    .map(|&r| match &grammar.exprs[r] {
      Ref { name, .. } => name.clone(),
      _ => unreachable!("refs list holds a non-reference node")
    })
    .collect();
  for rule in grammar.rules[1..].to_vec() {
    let name = grammar.rule_name(rule).to_string();
    if !referenced.contains(&name) {
      grammar.warn(format!("rule `{}` is never used", name));
    }
  }
}

fn synthesize_action_names(grammar: &mut Grammar) {
  for rule in grammar.rules.clone() {
    if let Rule { name, on_succ, on_fail, .. } = &mut grammar.exprs[rule] {
      for (i, action) in on_succ.iter_mut().enumerate() {
        if let Some(action) = action {
          if action.name.is_empty() {
            action.name = format!("{}_{}", name, i);
          }
        }
      }
      for (i, action) in on_fail.iter_mut().enumerate() {
        if let Some(action) = action {
          if action.name.is_empty() {
            action.name = format!("{}_{}_failed", name, i);
          }
        }
      }
    }
  }
}

#[cfg(test)]
mod test
{
  use super::*;
  use crate::middle::lists;

  fn resolved(grammar: Grammar) -> Partial<Grammar> {
    match lists::build(grammar) {
      Value(grammar) => resolve(grammar),
      _ => panic!("list building failed")
    }
  }

  #[test]
  fn binds_references_to_their_rule() {
    let mut g = Grammar::new();
    let r = g.push(Ref { name: String::from("b"), rule: None });
    g.push_rule("a", vec![r]);
    let lit = g.push(StrLiteral(String::from("x")));
    let b = g.push_rule("b", vec![lit]);
    match resolved(g) {
      Value(g) => match &g.exprs[r] {
        Ref { rule, .. } => assert_eq!(*rule, Some(b)),
        _ => unreachable!()
      },
      _ => panic!("expected a clean resolution")
    }
  }

  #[test]
  fn undeclared_rule_is_fatal() {
    let mut g = Grammar::new();
    let r = g.push(Ref { name: String::from("nowhere"), rule: None });
    g.push_rule("a", vec![r]);
    match resolved(g) {
      Fake(g) => {
        assert_eq!(g.errors, 1);
        assert!(g.diagnostics[0].message.contains("undeclared rule `nowhere`"));
      }
      _ => panic!("expected a fatal error")
    }
  }

  #[test]
  fn duplicate_rule_is_fatal_and_first_wins() {
    let mut g = Grammar::new();
    let x = g.push(StrLiteral(String::from("x")));
    let y = g.push(StrLiteral(String::from("y")));
    let r = g.push(Ref { name: String::from("a"), rule: None });
    g.push_rule("entry", vec![r]);
    let first = g.push_rule("a", vec![x]);
    g.push_rule("a", vec![y]);
    match resolved(g) {
      Fake(g) => {
        assert_eq!(g.errors, 1);
        match &g.exprs[r] {
          Ref { rule, .. } => assert_eq!(*rule, Some(first)),
          _ => unreachable!()
        }
      }
      _ => panic!("expected a fatal error")
    }
  }

  #[test]
  fn unused_rule_warns_but_entry_does_not() {
    let mut g = Grammar::new();
    let x = g.push(StrLiteral(String::from("x")));
    let y = g.push(StrLiteral(String::from("y")));
    g.push_rule("entry", vec![x]);
    g.push_rule("orphan", vec![y]);
    match resolved(g) {
      Value(g) => {
        assert_eq!(g.diagnostics.len(), 1);
        assert_eq!(g.diagnostics[0].severity, Severity::Warning);
        assert!(g.diagnostics[0].message.contains("`orphan`"));
      }
      _ => panic!("warnings are not fatal")
    }
  }

  #[test]
  fn empty_action_names_are_synthesized() {
    let mut g = Grammar::new();
    let x = g.push(StrLiteral(String::from("x")));
    let y = g.push(StrLiteral(String::from("y")));
    g.push_rule_with("a", None, vec![x, y],
      vec![Some(Action::new("")), Some(Action::new("keep"))],
      vec![None, Some(Action::new(""))]);
    match resolved(g) {
      Value(g) => match &g.exprs[g.rules[0]] {
        Rule { on_succ, on_fail, .. } => {
          assert_eq!(on_succ[0].as_ref().map(|a| a.name.as_str()), Some("a_0"));
          assert_eq!(on_succ[1].as_ref().map(|a| a.name.as_str()), Some("keep"));
          assert_eq!(on_fail[1].as_ref().map(|a| a.name.as_str()), Some("a_1_failed"));
        }
        _ => unreachable!()
      },
      _ => panic!("expected a clean resolution")
    }
  }
}
