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

//! Back end: from the analysed grammar to a parser.
//!
//! `generate` produces the target-independent abstract parser of `ast`;
//! `rust` renders it into a token stream, `code_printer` into readable
//! pseudo-code, and `skeleton` emits the companion semantics skeleton.

pub mod ast;
pub mod generate;
pub mod code_printer;
pub mod rust;
pub mod skeleton;
