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

//! Grok errors

use crate::data::Type;

/// Grok error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `%{SYNTAX}` reference names a pattern that has no definition
    #[error("No definition found for grok pattern `{0}`")]
    UnknownPattern(String),
    /// A pattern expands into itself
    #[error("Grok pattern `{0}` references itself")]
    CyclicPattern(String),
    /// The expanded expression was rejected by the regex engine
    #[error("Invalid grok expression `{expression}`: {reason}")]
    InvalidExpression {
        /// fully expanded expression
        expression: String,
        /// engine error message
        reason: String,
    },
    /// The regex engine gave up before the match attempt completed
    #[error("Grok pattern matching was interrupted before completion ({elapsed_ms} ms): {reason}")]
    MatchInterrupted {
        /// time spent in the match attempt
        elapsed_ms: u128,
        /// engine error message
        reason: String,
    },
    /// A captured value does not fit its declared type
    #[error("Failed to convert field `{field}` with value `{value}` to {ty}")]
    TypeConversion {
        /// output field name
        field: String,
        /// raw captured text
        value: String,
        /// declared type
        ty: Type,
    },
    /// Neither `pattern` nor `patterns` was configured
    #[error("Missing required configuration, either `pattern` or `patterns` must not be empty")]
    MissingConfiguration,
    /// A pattern definition file could not be read
    #[error("Failed to read pattern file `{1}`: {0}")]
    PatternFile(#[source] std::io::Error, String),
    /// A pattern directory could not be listed
    #[error("Failed to read pattern directory `{1}`: {0}")]
    PatternDir(#[source] std::io::Error, String),
    /// Invalid configuration
    #[error("Invalid grok configuration: {0}")]
    Config(#[from] serde_yaml::Error),
    /// IO error while reading or writing records
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Grok result type
pub type Result<T> = std::result::Result<T, Error>;
