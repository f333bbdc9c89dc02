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

//! The regex engine grok expressions are executed with.
//!
//! Grok needs more than most regex engines offer: several capture groups may
//! share one name (one per alternation branch) and every group has to be
//! addressable by index after a match. [`Oniguruma`] provides both.

use crate::errors::{Error, Result};
use onig::{MatchParam, Regex, RegexOptions, Region, SearchOptions, Syntax};
use std::time::Instant;

/// Options applied to every match attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Upper bound on backtracking steps for a single match attempt,
    /// exceeding it interrupts the attempt
    pub retry_limit: Option<u32>,
}

/// Start and end offsets of every capture group after a successful match,
/// index 0 is the whole match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Offsets(Vec<Option<(usize, usize)>>);

impl Offsets {
    /// Offsets of group `idx`, `None` if the group did not take part in the match
    pub fn get(&self, idx: usize) -> Option<(usize, usize)> {
        self.0.get(idx).copied().flatten()
    }

    /// Number of groups including the whole match
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No groups at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Option<(usize, usize)>>> for Offsets {
    fn from(v: Vec<Option<(usize, usize)>>) -> Self {
        Self(v)
    }
}

/// A compiled regular expression with named group introspection
pub trait RegexEngine: Sized + Send + Sync {
    /// Compiles an expanded grok expression
    ///
    /// # Errors
    ///   * if the engine rejects the expression
    fn compile(expression: &str, options: EngineOptions) -> Result<Self>;

    /// Every named group with all group indexes that carry the name
    fn named_groups(&self) -> Vec<(String, Vec<usize>)>;

    /// Searches `input` for the first match.
    ///
    /// Returns `Ok(None)` if nothing matches.
    ///
    /// # Errors
    ///   * if the match attempt was interrupted
    fn search(&self, input: &str) -> Result<Option<Offsets>>;
}

/// Oniguruma backed engine, using ruby syntax
pub struct Oniguruma {
    regex: Regex,
    options: EngineOptions,
}

impl std::fmt::Debug for Oniguruma {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Oniguruma")
            .field("groups", &self.regex.capture_names_len())
            .field("options", &self.options)
            .finish()
    }
}

impl RegexEngine for Oniguruma {
    fn compile(expression: &str, options: EngineOptions) -> Result<Self> {
        let regex = Regex::with_options(
            expression,
            RegexOptions::REGEX_OPTION_NONE,
            Syntax::ruby(),
        )
        .map_err(|e| Error::InvalidExpression {
            expression: expression.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { regex, options })
    }

    fn named_groups(&self) -> Vec<(String, Vec<usize>)> {
        let mut groups = Vec::with_capacity(self.regex.capture_names_len());
        self.regex.foreach_name(|name, indexes| {
            groups.push((
                name.to_string(),
                indexes.iter().map(|i| *i as usize).collect(),
            ));
            true
        });
        groups
    }

    fn search(&self, input: &str) -> Result<Option<Offsets>> {
        let start = Instant::now();
        let mut region = Region::new();
        let mut param = MatchParam::default();
        if let Some(limit) = self.options.retry_limit {
            param.set_retry_limit_in_match(limit);
        }
        let found = self
            .regex
            .search_with_param(
                input,
                0,
                input.len(),
                SearchOptions::SEARCH_OPTION_NONE,
                Some(&mut region),
                param,
            )
            .map_err(|e| Error::MatchInterrupted {
                elapsed_ms: start.elapsed().as_millis(),
                reason: e.to_string(),
            })?;
        Ok(found.map(|_| {
            (0..region.len())
                .map(|i| region.pos(i))
                .collect::<Vec<_>>()
                .into()
        }))
    }
}
