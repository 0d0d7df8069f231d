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

//! Semantics skeleton: an empty implementation of every action the grammar
//! declares, to be filled in by hand.
//!
//! Each action appears once, documented with every rule alternative that
//! triggers it; boolean actions return `true` so the skeleton accepts
//! everything until refined.

use crate::Config;
use crate::ast::*;
use crate::ast::Expression::*;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use std::collections::HashMap;

pub fn render(grammar: &Grammar, config: &Config) -> TokenStream {
  let name = config.semantics.as_deref().unwrap_or("Semantics");
  let semantics = format_ident!("{}", name);
  let mut order: Vec<Action> = vec![];
  let mut docs: HashMap<String, Vec<String>> = HashMap::new();
  for &rule in &grammar.rules {
    if let Rule { name, rhs, on_succ, on_fail, .. } = grammar.expr_by_index(rule) {
      for (i, &alt) in rhs.iter().enumerate() {
        if let Some(action) = &on_succ[i] {
          let doc = format!("{} = {}", name, grammar.canonical(alt));
          record(action, doc, &mut order, &mut docs);
        }
        if let Some(action) = &on_fail[i] {
          let doc = format!("failed {} = {}", name, grammar.canonical(alt));
          record(action, doc, &mut order, &mut docs);
        }
      }
    }
  }
  let methods = order.iter().map(|action| {
    let lines = docs[&action.name].iter().map(|line| quote!(#[doc = #line]));
    let method = format_ident!("{}", action.name);
    if action.boolean {
      quote! {
        #(#lines)*
        pub fn #method(&mut self) -> bool {
          true
        }
      }
    }
    else {
      quote! {
        #(#lines)*
        pub fn #method(&mut self) {
        }
      }
    }
  });
  quote! {
    pub struct #semantics;

    impl #semantics
    {
      pub fn new() -> #semantics {
        #semantics
      }

      pub fn init(&mut self) {
      }

      #(#methods)*
    }
  }
}

fn record(action: &Action, doc: String,
  order: &mut Vec<Action>, docs: &mut HashMap<String, Vec<String>>)
{
  if !docs.contains_key(&action.name) {
    order.push(action.clone());
  }
  docs.entry(action.name.clone()).or_default().push(doc);
}
