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

//! Matching records against a list of grok expressions.
//!
//! ```
//! use tremor_grok::{Config, Transform, Value};
//!
//! let config = Config::from_yaml(
//!     r#"
//! patterns:
//!   - "%{INT:status:int} %{WORD:verb}"
//!   - "%{WORD:verb}"
//! "#,
//! )
//! .expect("valid config");
//! let transform = Transform::new(&config).expect("valid patterns");
//! let captures = transform.matches(b"200 GET").expect("no error");
//! assert_eq!(Some(&Value::Int(200)), captures.get("status"));
//! ```

use crate::compiler::Compiler;
use crate::data::{captures_to_value, Captures};
use crate::engine::EngineOptions;
use crate::errors::{Error, Result};
use crate::library::PatternLibrary;
use crate::matcher::Matcher;
use serde::Deserialize;
use simd_json::prelude::*;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;

fn default_true() -> bool {
    true
}

/// Grok transform configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// A single grok expression, takes precedence over `patterns`
    #[serde(default)]
    pub pattern: Option<String>,
    /// Grok expressions tried in order
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Directories with additional pattern definition files
    #[serde(default)]
    pub patterns_dir: Vec<PathBuf>,
    /// Additional pattern definitions, override everything else
    #[serde(default)]
    pub pattern_definitions: BTreeMap<String, String>,
    /// Only capture references that have a semantic
    #[serde(default = "default_true")]
    pub named_captures_only: bool,
    /// Stop at the first expression that matches
    #[serde(default = "default_true")]
    pub break_on_first_match: bool,
    /// Backtracking limit per match attempt
    #[serde(default)]
    pub retry_limit: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pattern: None,
            patterns: Vec::new(),
            patterns_dir: Vec::new(),
            pattern_definitions: BTreeMap::new(),
            named_captures_only: true,
            break_on_first_match: true,
            retry_limit: None,
        }
    }
}

impl Config {
    /// Reads a configuration from yaml
    ///
    /// # Errors
    ///   * if the yaml is invalid or has unknown keys
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// The configured expressions, `pattern` wins over `patterns`
    pub fn expressions(&self) -> Vec<&str> {
        match &self.pattern {
            Some(pattern) => vec![pattern.as_str()],
            None => self.patterns.iter().map(String::as_str).collect(),
        }
    }
}

/// Matches records against a list of compiled expressions
#[derive(Debug)]
pub struct Transform {
    matchers: Vec<Matcher>,
    break_on_first_match: bool,
}

impl Transform {
    /// Builds the pattern library and compiles all configured expressions
    ///
    /// # Errors
    ///   * if no expression is configured
    ///   * if a pattern directory can't be read
    ///   * if an expression fails to compile
    pub fn new(config: &Config) -> Result<Self> {
        let expressions = config.expressions();
        if expressions.is_empty() {
            return Err(Error::MissingConfiguration);
        }
        let library = PatternLibrary::builder()
            .directories(config.patterns_dir.iter().cloned())
            .definitions(config.pattern_definitions.clone())
            .build()?;
        let compiler = Compiler::new(library, config.named_captures_only).with_options(
            EngineOptions {
                retry_limit: config.retry_limit,
            },
        );
        let matchers = expressions
            .into_iter()
            .map(|e| compiler.compile(e))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            matchers,
            break_on_first_match: config.break_on_first_match,
        })
    }

    /// The compiled expressions in configuration order
    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// Matches a record against every expression and merges all captures,
    /// later expressions overwrite fields of earlier ones.
    ///
    /// Returns an empty map if nothing matched.
    ///
    /// # Errors
    ///   * if a match attempt is interrupted or a value fails to convert
    pub fn matches(&self, bytes: &[u8]) -> Result<Captures> {
        let mut merged = Captures::new();
        for matcher in &self.matchers {
            if let Some(captures) = matcher.captures(bytes)? {
                for (name, value) in captures {
                    merged.insert(name, value);
                }
                if self.break_on_first_match {
                    break;
                }
            }
        }
        Ok(merged)
    }

    /// Matches every line of `reader` and writes the captures of each as one
    /// json object per line to `writer`. Returns the number of records.
    ///
    /// Lines are split on `\n`, a trailing `\r` is dropped. Lines are not
    /// required to be valid UTF-8.
    ///
    /// # Errors
    ///   * on IO errors
    ///   * on the first record that fails to match, see [`Transform::matches`]
    pub fn transform_items<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> Result<u64> {
        let mut n = 0;
        for line in reader.split(b'\n') {
            let line = line?;
            let line = line.strip_suffix(b"\r").unwrap_or(line.as_slice());
            let captures = self.matches(line)?;
            writer.write_all(captures_to_value(captures).encode().as_bytes())?;
            writer.write_all(b"\n")?;
            n += 1;
        }
        writer.flush()?;
        debug!("Transformed {n} records");
        Ok(n)
    }
}
