// Copyright 2022-2024, The Tremor Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tremor grok
//!
//! Compiles logstash style grok expressions like
//! `%{IP:client} %{WORD:method} %{NUMBER:bytes:long}` into regular
//! expressions and turns matching text into typed, named fields.
//!
//! ```
//! use tremor_grok::{Compiler, PatternLibrary, Value};
//!
//! let compiler = Compiler::new(PatternLibrary::new(), true);
//! let matcher = compiler
//!     .compile("%{IP:client} %{WORD:method} %{NUMBER:bytes:long}")
//!     .expect("valid expression");
//! let captures = matcher
//!     .captures(b"55.3.244.1 GET 15824")
//!     .expect("no error")
//!     .expect("a match");
//! assert_eq!(Some(&Value::from("55.3.244.1")), captures.get("client"));
//! assert_eq!(Some(&Value::Long(15824)), captures.get("bytes"));
//! ```

#![forbid(warnings)]
#![deny(missing_docs)]
#![deny(
    clippy::all,
    clippy::unwrap_used,
    clippy::unnecessary_unwrap,
    clippy::pedantic
)]
#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

#[macro_use]
extern crate log;

mod compiler;
mod data;
mod engine;
pub mod errors;
mod library;
mod matcher;
mod transform;

pub use compiler::{Compiler, GrokPattern};
pub use data::{captures_to_value, parse_duration, Captures, Type, Value};
pub use engine::{EngineOptions, Offsets, Oniguruma, RegexEngine};
pub use errors::{Error, Result};
pub use library::{Builder as LibraryBuilder, PatternLibrary};
pub use matcher::{CaptureGroup, Matcher};
pub use transform::{Config, Transform};
