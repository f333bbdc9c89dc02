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

//! Grok pattern definitions.
//!
//! A library is built from three layers, each overriding definitions of the
//! same name from the layer before:
//!
//! 1. the built-in definitions shipped in `patterns/`
//! 2. pattern directories, every file in a directory is a definition file
//! 3. explicit name to pattern definitions
//!
//! Definition files contain one definition per line, `NAME pattern`, where
//! `NAME` is made of `[A-Z0-9_]`. Empty lines and lines starting with `#` are
//! skipped. Definitions are not checked when loaded, a definition may refer
//! to patterns that are only defined later on.

use crate::errors::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Definition files shipped with the crate, in load order
const BUILTIN: [(&str, &str); 10] = [
    ("grok-patterns", include_str!("../patterns/grok-patterns")),
    ("aws", include_str!("../patterns/aws")),
    ("haproxy", include_str!("../patterns/haproxy")),
    ("httpd", include_str!("../patterns/httpd")),
    ("java", include_str!("../patterns/java")),
    ("linux-syslog", include_str!("../patterns/linux-syslog")),
    ("postgresql", include_str!("../patterns/postgresql")),
    ("redis", include_str!("../patterns/redis")),
    ("ruby", include_str!("../patterns/ruby")),
    ("squid", include_str!("../patterns/squid")),
];

/// A read only table of grok pattern definitions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternLibrary {
    definitions: BTreeMap<String, String>,
}

impl PatternLibrary {
    /// A library with the built-in definitions only
    pub fn new() -> Self {
        let mut library = Self::empty();
        for (source, content) in BUILTIN {
            let n = library.load_str(content);
            debug!("Loaded {n} built-in grok definitions from `{source}`");
        }
        library
    }

    /// A library without any definitions
    pub fn empty() -> Self {
        Self::default()
    }

    /// Starts building a library on top of the built-in definitions
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// The unexpanded pattern registered under `name`
    ///
    /// # Errors
    ///   * if there is no definition for `name`
    pub fn resolve(&self, name: &str) -> Result<&str> {
        self.definitions
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownPattern(name.to_string()))
    }

    /// Is there a definition for `name`
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// All definitions, ordered by name
    pub fn definitions(&self) -> &BTreeMap<String, String> {
        &self.definitions
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Is the library empty
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Logs every definition at debug level
    pub fn log_definitions(&self) {
        for (name, pattern) in &self.definitions {
            debug!("{name} {pattern}");
        }
    }

    /// Parses definition file content and merges it, returns the number of definitions read.
    fn load_str(&mut self, content: &str) -> usize {
        let mut n = 0;
        for line in content.lines() {
            if let Some((name, pattern)) = parse_line(line) {
                self.definitions.insert(name.to_string(), pattern.to_string());
                n += 1;
            }
        }
        n
    }

    fn load_file(&mut self, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::PatternFile(e, path.to_string_lossy().to_string()))?;
        Ok(self.load_str(&content))
    }

    /// Loads all files in `dir`, not descending into sub directories.
    /// Files are loaded ordered by name.
    fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let dir_err = |e| Error::PatternDir(e, dir.to_string_lossy().to_string());
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(dir_err)? {
            let path = entry.map_err(dir_err)?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        let mut n = 0;
        for file in files {
            let loaded = self.load_file(&file)?;
            debug!("Loaded {loaded} grok definitions from `{}`", file.display());
            n += loaded;
        }
        Ok(n)
    }
}

/// Builder for a [`PatternLibrary`]
#[derive(Debug, Clone)]
pub struct Builder {
    builtin: bool,
    dirs: Vec<PathBuf>,
    definitions: Vec<(String, String)>,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            builtin: true,
            dirs: Vec::new(),
            definitions: Vec::new(),
        }
    }
}

impl Builder {
    /// Leave out the built-in definitions
    #[must_use]
    pub fn without_builtin(mut self) -> Self {
        self.builtin = false;
        self
    }

    /// Adds a directory of definition files
    #[must_use]
    pub fn directory<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.dirs.push(dir.into());
        self
    }

    /// Adds several directories of definition files
    #[must_use]
    pub fn directories<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Adds a single definition
    #[must_use]
    pub fn definition<N: Into<String>, P: Into<String>>(mut self, name: N, pattern: P) -> Self {
        self.definitions.push((name.into(), pattern.into()));
        self
    }

    /// Adds definitions from a name to pattern map
    #[must_use]
    pub fn definitions<I, N, P>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: Into<String>,
    {
        self.definitions.extend(
            definitions
                .into_iter()
                .map(|(name, pattern)| (name.into(), pattern.into())),
        );
        self
    }

    /// Loads all layers into a library
    ///
    /// # Errors
    ///   * if a pattern directory or one of its files can't be read
    pub fn build(self) -> Result<PatternLibrary> {
        let mut library = if self.builtin {
            PatternLibrary::new()
        } else {
            PatternLibrary::empty()
        };
        for dir in &self.dirs {
            let n = library.load_dir(dir)?;
            debug!("Loaded {n} grok definitions from directory `{}`", dir.display());
        }
        let n = self.definitions.len();
        library.definitions.extend(self.definitions);
        debug!(
            "Grok pattern library ready with {} definitions ({n} custom)",
            library.len()
        );
        Ok(library)
    }
}

/// Splits a definition line into name and pattern
fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let Some((name, pattern)) = line.split_once(char::is_whitespace) else {
        trace!("Ignoring grok definition without pattern: {line}");
        return None;
    };
    let pattern = pattern.trim_start();
    if pattern.is_empty() || !is_pattern_name(name) {
        trace!("Ignoring malformed grok definition: {line}");
        return None;
    }
    Some((name, pattern))
}

/// `[A-Z0-9_]+`
pub(crate) fn is_pattern_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}
