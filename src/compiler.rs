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

//! Expands grok expressions into regular expressions.
//!
//! A grok expression is a regular expression that may contain references of
//! the form `%{SYNTAX}`, `%{SYNTAX:SEMANTIC}` or `%{SYNTAX:SEMANTIC:TYPE}`.
//! Every reference is replaced by the (recursively expanded) definition of
//! `SYNTAX`. If a `SEMANTIC` is given the definition is wrapped in a named
//! group of that name, otherwise it is wrapped in a group named `SYNTAX`
//! unless only named captures are requested.
//!
//! ```
//! use tremor_grok::{Compiler, PatternLibrary};
//!
//! let compiler = Compiler::new(PatternLibrary::new(), true);
//! let matcher = compiler.compile("%{NUMBER:duration:double}").expect("valid expression");
//! assert_eq!(
//!     "(?<duration>(?:(?<![0-9.+-])(?>[+-]?(?:(?:[0-9]+(?:\\.[0-9]+)?)|(?:\\.[0-9]+)))))",
//!     matcher.expression()
//! );
//! ```

use crate::data::Type;
use crate::engine::{EngineOptions, Oniguruma, RegexEngine};
use crate::errors::{Error, Result};
use crate::library::PatternLibrary;
use crate::matcher::Matcher;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

lazy_static! {
    // ALLOW: this is a constant, valid regex
    static ref REFERENCE: Regex = Regex::new(r"%\{([A-Z0-9_]+)(?::([\w\-]+))?(?::([\w\-]+))?\}")
        .expect("invalid grok reference regex");
}

/// A single `%{SYNTAX:SEMANTIC:TYPE}` reference found in an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrokPattern {
    syntax: String,
    semantic: Option<String>,
    ty: Type,
}

impl GrokPattern {
    /// Creates a reference, unknown type names fall back to `string`
    pub fn new(syntax: &str, semantic: Option<&str>, ty: Option<&str>) -> Self {
        let ty = ty.map_or(Type::String, |name| {
            Type::from_name(name).unwrap_or_else(|| {
                warn!("Unknown grok type `{name}` for `{syntax}`, falling back to `string`");
                Type::String
            })
        });
        Self {
            syntax: syntax.to_string(),
            semantic: semantic.map(ToString::to_string),
            ty,
        }
    }

    /// Name of the referenced pattern
    pub fn syntax(&self) -> &str {
        &self.syntax
    }

    /// Output field name, if one was given
    pub fn semantic(&self) -> Option<&str> {
        self.semantic.as_deref()
    }

    /// Declared type
    pub fn ty(&self) -> Type {
        self.ty
    }
}

impl fmt::Display for GrokPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{{{}", self.syntax)?;
        if let Some(semantic) = &self.semantic {
            write!(f, ":{semantic}:{}", self.ty)?;
        }
        f.write_str("}")
    }
}

/// State threaded through one expansion
#[derive(Default)]
struct Expansion {
    /// every reference, depth first in textual order
    patterns: Vec<GrokPattern>,
    /// names currently being expanded
    stack: Vec<String>,
}

/// Compiles grok expressions into [`Matcher`]s
#[derive(Debug, Clone)]
pub struct Compiler {
    library: Arc<PatternLibrary>,
    named_captures_only: bool,
    options: EngineOptions,
}

impl Compiler {
    /// Creates a compiler resolving references against `library`.
    ///
    /// With `named_captures_only` references without a semantic are not captured.
    pub fn new<L: Into<Arc<PatternLibrary>>>(library: L, named_captures_only: bool) -> Self {
        Self {
            library: library.into(),
            named_captures_only,
            options: EngineOptions::default(),
        }
    }

    /// Sets the options compiled matchers are executed with
    #[must_use]
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// The library references are resolved against
    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    /// Are references without a semantic left uncaptured
    pub fn named_captures_only(&self) -> bool {
        self.named_captures_only
    }

    /// Compiles an expression into a matcher backed by oniguruma
    ///
    /// # Errors
    ///   * if a referenced pattern is unknown or references itself
    ///   * if the expanded expression is not a valid regex
    pub fn compile(&self, expression: &str) -> Result<Matcher> {
        self.compile_with::<Oniguruma>(expression)
    }

    /// Compiles an expression into a matcher backed by the engine `E`
    ///
    /// # Errors
    ///   * if a referenced pattern is unknown or references itself
    ///   * if the expanded expression is not valid for the engine
    pub fn compile_with<E: RegexEngine>(&self, expression: &str) -> Result<Matcher<E>> {
        trace!("Starting to compile grok expression: {expression}");
        let mut expansion = Expansion::default();
        let regex = self.expand_into(expression, &mut expansion)?;
        trace!("Grok expression compiled to regex: {regex}");
        Matcher::new(expansion.patterns, regex, self.options)
    }

    /// Expands all references in `expression` without compiling the result
    ///
    /// # Errors
    ///   * if a referenced pattern is unknown or references itself
    pub fn expand(&self, expression: &str) -> Result<String> {
        self.expand_into(expression, &mut Expansion::default())
    }

    fn expand_into(&self, expression: &str, expansion: &mut Expansion) -> Result<String> {
        let mut regex = String::with_capacity(expression.len());
        let mut last = 0;
        for caps in REFERENCE.captures_iter(expression) {
            let (Some(reference), Some(syntax)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let syntax = syntax.as_str();
            let semantic = caps.get(2).map(|m| m.as_str());
            expansion.patterns.push(GrokPattern::new(
                syntax,
                semantic,
                caps.get(3).map(|m| m.as_str()),
            ));

            if expansion.stack.iter().any(|s| s == syntax) {
                return Err(Error::CyclicPattern(syntax.to_string()));
            }
            let definition = self.library.resolve(syntax)?;
            expansion.stack.push(syntax.to_string());
            let fragment = self.expand_into(definition, expansion)?;
            expansion.stack.pop();

            regex.push_str(&expression[last..reference.start()]);
            match semantic {
                Some(name) => capture(&mut regex, name, &fragment),
                None if !self.named_captures_only => capture(&mut regex, syntax, &fragment),
                None => regex.push_str(&fragment),
            }
            last = reference.end();
        }
        regex.push_str(&expression[last..]);
        Ok(regex)
    }
}

/// The fragment is inserted verbatim, `\` and `$` need no escaping
fn capture(regex: &mut String, name: &str, fragment: &str) {
    regex.push_str("(?<");
    regex.push_str(name);
    regex.push('>');
    regex.push_str(fragment);
    regex.push(')');
}
