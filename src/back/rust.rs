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

//! Rust target: renders the abstract parser into a token stream.
//!
//! The generated item set is a parser struct wrapping the runtime base
//! (`ParserBase`, `ParserMemo` or `ParserTest` depending on the parser
//! kind) next to the semantics object, with `new`/`parse`/`semantics` and
//! one private boolean procedure per abstract procedure. Memoizing and
//! instrumented parsers additionally carry one cache-index constant per
//! cache and the `CACHES` descriptor array handed to the base at
//! construction. Rule, parser and semantics names must be valid Rust
//! identifiers; that is the front end's naming contract.

use crate::Config;
use crate::ast::Action;
use crate::back::ast::*;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

pub fn render(unit: &ParserUnit, config: &Config) -> TokenStream {
  let parser = format_ident!("{}", config.parser_name);
  let runtime = path(&config.runtime);
  let semantics = match &config.semantics {
    Some(name) => path(name),
    None => quote!(#runtime::SemanticsBase)
  };
  let base = match unit.kind {
    ParserKind::Plain => format_ident!("ParserBase"),
    ParserKind::Memo => format_ident!("ParserMemo"),
    ParserKind::Instrumented => format_ident!("ParserTest")
  };
  let entry = format_ident!("{}", unit.entry);
  let procedures = unit.procedures.iter().map(procedure);
  let caches = cache_items(unit, &runtime);
  let base_new = if unit.caches.is_empty() {
    quote!(#runtime::#base::new())
  }
  else {
    quote!(#runtime::#base::new(&Self::CACHES))
  };
  quote! {
    pub struct #parser
    {
      base: #runtime::#base,
      sem: #semantics
    }

    impl #parser
    {
      pub fn new() -> #parser {
        #parser {
          base: #base_new,
          sem: #semantics::new()
        }
      }

      pub fn parse(&mut self, source: #runtime::Source) -> bool {
        self.base.init(source);
        self.sem.init();
        if self.#entry() { return true; }
        self.base.failure()
      }

      pub fn semantics(&self) -> &#semantics {
        &self.sem
      }

      #(#procedures)*

      #caches
    }
  }
}

fn procedure(procedure: &Procedure) -> TokenStream {
  let name = format_ident!("{}", procedure.name);
  let cache = procedure.cache.as_deref().map(cache_const);
  let entry = entry_tokens(&procedure.entry);
  let body = procedure.body.iter().map(|stmt| stmt_tokens(stmt, &cache));
  quote! {
    fn #name(&mut self) -> bool {
      #entry
      #(#body)*
    }
  }
}

fn entry_tokens(entry: &Entry) -> TokenStream {
  match entry {
    Entry::Begin { name, diag: None } => quote!(self.base.begin(#name);),
    Entry::Begin { name, diag: Some(diag) } => {
      quote!(self.base.begin_with(#name, #diag);)
    }
    Entry::BeginInner { diag: None } => quote!(self.base.begin("");),
    Entry::BeginInner { diag: Some(diag) } => {
      quote!(self.base.begin_with("", #diag);)
    }
    Entry::Saved { cache } => {
      let cache = cache_const(cache);
      quote!(if self.base.saved(Self::#cache) { return self.base.reuse(); })
    }
    Entry::SavedInner { cache, pred } => {
      let reuse = if *pred { quote!(reuse_pred) } else { quote!(reuse_inner) };
      let cache = cache_const(cache);
      quote!(if self.base.saved_inner(Self::#cache) { return self.base.#reuse(); })
    }
  }
}

fn stmt_tokens(stmt: &Stmt, cache: &Option<Ident>) -> TokenStream {
  match stmt {
    Stmt::Attempt(call) => {
      let call = call_tokens(call);
      quote!(#call;)
    }
    Stmt::ReturnIf(call, exit) => {
      let call = call_tokens(call);
      let exit = exit_tokens(*exit, cache);
      quote!(if #call { return #exit; })
    }
    Stmt::ReturnUnless(call, exit) => {
      let call = call_tokens(call);
      let exit = exit_tokens(*exit, cache);
      quote!(if !#call { return #exit; })
    }
    Stmt::ReturnIfNone(calls, exit) => {
      let exit = exit_tokens(*exit, cache);
      let mut none = TokenStream::new();
      for (i, call) in calls.iter().enumerate() {
        let call = call_tokens(call);
        none = if i == 0 { quote!(!#call) } else { quote!(#none && !#call) };
      }
      quote!(if #none { return #exit; })
    }
    Stmt::RepeatWhile(call) => {
      let call = call_tokens(call);
      quote!(while #call {})
    }
    Stmt::RepeatUntil { body, until, at_least_once, reject } => {
      let body = call_tokens(body);
      let until = call_tokens(until);
      let reject = exit_tokens(*reject, cache);
      if *at_least_once {
        quote! {
          if #until { return #reject; }
          loop {
            if !#body { return #reject; }
            if #until { break; }
          }
        }
      }
      else {
        quote! {
          while !#until {
            if !#body { return #reject; }
          }
        }
      }
    }
    Stmt::Return(exit) => {
      let exit = exit_tokens(*exit, cache);
      quote!(return #exit;)
    }
    Stmt::Alternative { call, on_succ, on_fail } => {
      let call = call_tokens(call);
      let accept = exit_tokens(Exit::Accept, cache);
      let fail = on_fail.as_ref().map(|action| {
        let action = action_ident(action);
        quote!(else { self.sem.#action(); })
      });
      match on_succ {
        None => quote!(if #call { return #accept; } #fail),
        Some(action) if action.boolean => {
          let action = action_ident(action);
          quote! {
            if #call && (self.sem.#action() || self.base.bool_reject()) {
              return #accept;
            }
            #fail
          }
        }
        Some(action) => {
          let action = action_ident(action);
          quote!(if #call { self.sem.#action(); return #accept; } #fail)
        }
      }
    }
    Stmt::AcceptWith { action } => {
      let accept = exit_tokens(Exit::Accept, cache);
      match action {
        None => quote!(return #accept;),
        Some(action) if action.boolean => {
          let reject = exit_tokens(Exit::Reject, cache);
          let action = action_ident(action);
          quote! {
            if self.sem.#action() { return #accept; }
            self.base.bool_reject();
            return #reject;
          }
        }
        Some(action) => {
          let action = action_ident(action);
          quote!(self.sem.#action(); return #accept;)
        }
      }
    }
  }
}

fn call_tokens(call: &Call) -> TokenStream {
  match call {
    Call::Proc(name) => {
      let name = format_ident!("{}", name);
      quote!(self.#name())
    }
    Call::Term(op) => term_tokens("next", op),
    Call::Ahead(op) => term_tokens("ahead", op),
    Call::AheadNot(op) => term_tokens("ahead_not", op)
  }
}

fn term_tokens(prefix: &str, op: &TermOp) -> TokenStream {
  let (suffix, mut args): (&str, Vec<TokenStream>) = match &op.test {
    TermTest::Char(c) => ("", vec![quote!(#c)]),
    TermTest::Str(s) => ("_str", vec![quote!(#s)]),
    TermTest::OneOf(s) => ("_in", vec![quote!(#s)]),
    TermTest::NotChar(c) => ("_not", vec![quote!(#c)]),
    TermTest::NoneOf(s) => ("_not_in", vec![quote!(#s)]),
    TermTest::Range(lo, hi) => ("_range", vec![quote!(#lo), quote!(#hi)]),
    TermTest::Any => ("_any", vec![])
  };
  if let Some(counter) = &op.counter {
    let counter = cache_const(counter);
    args.push(quote!(Self::#counter));
  }
  let method = format_ident!("{}{}", prefix, suffix);
  quote!(self.base.#method(#(#args),*))
}

fn exit_tokens(exit: Exit, cache: &Option<Ident>) -> TokenStream {
  let method = match exit {
    Exit::Accept => format_ident!("accept"),
    Exit::Reject => format_ident!("reject"),
    Exit::AcceptInner => format_ident!("accept_inner"),
    Exit::RejectInner => format_ident!("reject_inner"),
    Exit::AcceptAnd => format_ident!("accept_and"),
    Exit::RejectAnd => format_ident!("reject_and"),
    Exit::AcceptNot => format_ident!("accept_not"),
    Exit::RejectNot => format_ident!("reject_not")
  };
  match cache {
    Some(cache) => quote!(self.base.#method(Self::#cache)),
    None => quote!(self.base.#method())
  }
}

fn cache_items(unit: &ParserUnit, runtime: &TokenStream) -> TokenStream {
  if unit.caches.is_empty() {
    return TokenStream::new();
  }
  let consts = unit.caches.iter().enumerate().map(|(i, cache)| {
    let name = cache_const(&cache.name);
    quote!(const #name: usize = #i;)
  });
  let entries = unit.caches.iter().map(|cache| {
    let display = &cache.display;
    let diag = match &cache.diag {
      Some(diag) => quote!(Some(#diag)),
      None => quote!(None)
    };
    quote!(#runtime::CacheEntry { name: #display, diag: #diag })
  });
  let len = unit.caches.len();
  quote! {
    #(#consts)*

    const CACHES: [#runtime::CacheEntry; #len] = [
      #(#entries),*
    ];
  }
}

fn cache_const(name: &str) -> Ident {
  format_ident!("CACHE_{}", name.to_uppercase())
}

fn action_ident(action: &Action) -> Ident {
  format_ident!("{}", action.name)
}

fn path(path: &str) -> TokenStream {
  let segments = path.split("::").map(|segment| format_ident!("{}", segment));
  quote!(#(#segments)::*)
}
