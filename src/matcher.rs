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

//! Compiled grok expressions and capture extraction.

use crate::compiler::GrokPattern;
use crate::data::{Captures, Type, Value};
use crate::engine::{EngineOptions, Oniguruma, Offsets, RegexEngine};
use crate::errors::{Error, Result};
use std::fmt;

/// A named group of the compiled expression.
///
/// Alternations can produce several groups with the same name, a descriptor
/// holds the indexes of all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureGroup {
    name: String,
    backrefs: Vec<usize>,
    ty: Type,
}

impl CaptureGroup {
    /// Output field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Indexes of all groups carrying the name, ascending
    pub fn backrefs(&self) -> &[usize] {
        &self.backrefs
    }

    /// Type captured text is converted to
    pub fn ty(&self) -> Type {
        self.ty
    }

    /// The value of the first participating group, `None` if no group took part
    fn extract(&self, input: &str, offsets: &Offsets) -> Result<Option<Value>> {
        let Some(raw) = self
            .backrefs
            .iter()
            .find_map(|i| offsets.get(*i))
            .and_then(|(start, end)| input.get(start..end))
        else {
            return Ok(None);
        };
        self.ty
            .convert(raw)
            .map(Some)
            .ok_or_else(|| Error::TypeConversion {
                field: self.name.clone(),
                value: raw.to_string(),
                ty: self.ty,
            })
    }
}

/// A compiled grok expression
#[derive(Debug)]
pub struct Matcher<E = Oniguruma> {
    patterns: Vec<GrokPattern>,
    expression: String,
    engine: E,
    groups: Vec<CaptureGroup>,
}

impl<E: RegexEngine> Matcher<E> {
    pub(crate) fn new(
        patterns: Vec<GrokPattern>,
        expression: String,
        options: EngineOptions,
    ) -> Result<Self> {
        let engine = E::compile(&expression, options)?;
        let mut groups: Vec<CaptureGroup> = engine
            .named_groups()
            .into_iter()
            .map(|(name, mut backrefs)| {
                backrefs.sort_unstable();
                let ty = group_type(&patterns, &name);
                CaptureGroup { name, backrefs, ty }
            })
            .collect();
        groups.sort_by_key(|g| g.backrefs.first().copied().unwrap_or_default());
        debug!(
            "Compiled grok matcher with {} capture groups from {} pattern references",
            groups.len(),
            patterns.len()
        );
        Ok(Self {
            patterns,
            expression,
            engine,
            groups,
        })
    }

    /// Matches `bytes` and extracts all captured fields.
    ///
    /// Returns `Ok(None)` if the expression does not match. Groups that did
    /// not take part in the match are left out.
    ///
    /// Invalid UTF-8 sequences are replaced with `U+FFFD` before matching.
    ///
    /// # Errors
    ///   * if the match attempt was interrupted
    ///   * if a captured value does not fit its declared type
    pub fn captures(&self, bytes: &[u8]) -> Result<Option<Captures>> {
        match simdutf8::basic::from_utf8(bytes) {
            Ok(input) => self.captures_str(input),
            Err(_) => self.captures_str(&String::from_utf8_lossy(bytes)),
        }
    }

    /// Same as [`Matcher::captures`] for text input
    ///
    /// # Errors
    ///   * if the match attempt was interrupted
    ///   * if a captured value does not fit its declared type
    pub fn captures_str(&self, input: &str) -> Result<Option<Captures>> {
        let Some(offsets) = self.engine.search(input)? else {
            return Ok(None);
        };
        let mut captures = Captures::with_capacity(self.groups.len());
        for group in &self.groups {
            if let Some(value) = group.extract(input, &offsets)? {
                captures.insert(group.name.clone(), value);
            }
        }
        Ok(Some(captures))
    }
}

impl<E> Matcher<E> {
    /// The reference at position `i` in expansion order
    pub fn pattern_at(&self, i: usize) -> Option<&GrokPattern> {
        self.patterns.get(i)
    }

    /// A reference to the pattern `syntax`.
    ///
    /// When the pattern is referenced more than once the first reference
    /// carrying a semantic wins, otherwise the last one.
    pub fn pattern_by_name(&self, syntax: &str) -> Option<&GrokPattern> {
        self.patterns
            .iter()
            .filter(|p| p.syntax() == syntax)
            .fold(None, |found, p| match found {
                Some(f) if f.semantic().is_some() => Some(f),
                _ => Some(p),
            })
    }

    /// All references in expansion order
    pub fn patterns(&self) -> &[GrokPattern] {
        &self.patterns
    }

    /// Capture group descriptors, ordered by position in the expression
    pub fn capture_groups(&self) -> &[CaptureGroup] {
        &self.groups
    }

    /// The descriptor for the group `name`
    pub fn capture_group(&self, name: &str) -> Option<&CaptureGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// The expanded regular expression
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl<E> fmt::Display for Matcher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Matcher{patterns=[")?;
        for (i, p) in self.patterns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, "], expression={}}}", self.expression)
    }
}

fn group_type(patterns: &[GrokPattern], name: &str) -> Type {
    patterns
        .iter()
        .find(|p| p.semantic() == Some(name))
        .or_else(|| {
            patterns
                .iter()
                .find(|p| p.syntax() == name && p.semantic().is_some())
        })
        .map_or(Type::String, GrokPattern::ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::library::PatternLibrary;
    use pretty_assertions::assert_eq;

    fn compile(expression: &str) -> Result<Matcher> {
        Compiler::new(PatternLibrary::new(), false).compile(expression)
    }

    fn string(s: &str) -> Value {
        Value::from(s)
    }

    #[test]
    fn is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Matcher>();
    }

    #[test]
    fn email_address() -> Result<()> {
        let matcher = compile("%{EMAILADDRESS}")?;
        let captures = matcher.captures(b"test@kafka.org")?.unwrap_or_default();
        assert_eq!(3, captures.len());
        assert_eq!(Some(&string("kafka.org")), captures.get("HOSTNAME"));
        assert_eq!(Some(&string("test@kafka.org")), captures.get("EMAILADDRESS"));
        assert_eq!(Some(&string("test")), captures.get("EMAILLOCALPART"));
        Ok(())
    }

    #[test]
    fn no_match() -> Result<()> {
        let matcher = compile("^%{INT}$")?;
        assert_eq!(None, matcher.captures_str("snot")?);
        Ok(())
    }

    #[test]
    fn typed_fields() -> Result<()> {
        let matcher = compile(
            "%{INT:status:int} %{NUMBER:took:double} %{WORD:ok:boolean} %{NOTSPACE:ttl:duration}",
        )?;
        let captures = matcher
            .captures_str("200 0.25 true PT5M")?
            .unwrap_or_default();
        assert_eq!(Some(&Value::Int(200)), captures.get("status"));
        assert_eq!(Some(&Value::Double(0.25)), captures.get("took"));
        assert_eq!(Some(&Value::Bool(true)), captures.get("ok"));
        assert_eq!(
            Some(&Value::Duration(chrono::Duration::minutes(5))),
            captures.get("ttl")
        );
        Ok(())
    }

    #[test]
    fn conversion_errors_name_the_field() -> Result<()> {
        let matcher = compile("%{WORD:flag:boolean}")?;
        let r = matcher.captures_str("maybe");
        assert!(matches!(
            r,
            Err(Error::TypeConversion { field, value, ty: Type::Boolean })
                if field == "flag" && value == "maybe"
        ));
        Ok(())
    }

    #[test]
    fn alternation_uses_participating_branch() -> Result<()> {
        let matcher = compile("%{DATE}")?;
        let group = matcher.capture_group("MONTHDAY");
        assert_eq!(Some(2), group.map(|g| g.backrefs().len()));

        let us = matcher.captures_str("10/17/2026")?.unwrap_or_default();
        assert_eq!(Some(&string("10/17/2026")), us.get("DATE_US"));
        assert_eq!(Some(&string("10")), us.get("MONTHNUM"));
        assert_eq!(Some(&string("17")), us.get("MONTHDAY"));
        assert_eq!(None, us.get("DATE_EU"));

        let eu = matcher.captures_str("17.10.2026")?.unwrap_or_default();
        assert_eq!(Some(&string("17.10.2026")), eu.get("DATE_EU"));
        assert_eq!(Some(&string("10")), eu.get("MONTHNUM"));
        assert_eq!(Some(&string("17")), eu.get("MONTHDAY"));
        assert_eq!(Some(&string("2026")), eu.get("YEAR"));
        assert_eq!(None, eu.get("DATE_US"));
        Ok(())
    }

    #[test]
    fn groups_are_ordered_by_position() -> Result<()> {
        let matcher = compile("%{WORD:first} %{INT:second} %{WORD:third}")?;
        let names: Vec<_> = matcher
            .capture_groups()
            .iter()
            .map(CaptureGroup::name)
            .collect();
        assert_eq!(vec!["first", "second", "third"], names);
        Ok(())
    }

    #[test]
    fn type_follows_semantic_reference() -> Result<()> {
        let matcher = compile("%{INT:n:long} %{INT:n}")?;
        assert_eq!(Some(Type::Long), matcher.capture_group("n").map(CaptureGroup::ty));
        // only the first participating group is reported
        let captures = matcher.captures_str("1 2")?.unwrap_or_default();
        assert_eq!(Some(&Value::Long(1)), captures.get("n"));
        Ok(())
    }

    #[test]
    fn syntax_named_groups_are_strings() -> Result<()> {
        let matcher = compile("%{INT}")?;
        let captures = matcher.captures_str("42")?.unwrap_or_default();
        assert_eq!(Some(&string("42")), captures.get("INT"));
        Ok(())
    }

    #[test]
    fn pattern_lookup() -> Result<()> {
        let matcher = compile("%{WORD} %{WORD:verb} %{WORD:path}")?;
        assert_eq!(
            Some("verb"),
            matcher.pattern_by_name("WORD").and_then(GrokPattern::semantic)
        );
        let matcher = compile("%{WORD} %{INT} %{WORD}")?;
        // without a semantic the last reference is reported
        let last = matcher.pattern_at(2);
        assert!(matcher
            .pattern_by_name("WORD")
            .zip(last)
            .is_some_and(|(p, q)| std::ptr::eq(p, q)));
        assert_eq!(None, matcher.pattern_by_name("SNOT"));
        assert_eq!(None, matcher.pattern_at(3));
        Ok(())
    }

    #[test]
    fn invalid_utf8_is_replaced() -> Result<()> {
        let matcher = compile("%{WORD:verb} %{INT:status:int} %{GREEDYDATA:rest}")?;
        let captures = matcher.captures(b"GET 200 caf\xe9")?.unwrap_or_default();
        assert_eq!(Some(&string("GET")), captures.get("verb"));
        assert_eq!(Some(&Value::Int(200)), captures.get("status"));
        assert_eq!(Some(&string("caf\u{fffd}")), captures.get("rest"));
        Ok(())
    }

    #[test]
    fn display() -> Result<()> {
        let matcher = Compiler::new(PatternLibrary::new(), true).compile("%{WORD:verb:string}")?;
        assert_eq!(
            "Matcher{patterns=[%{WORD:verb:string}], expression=(?<verb>\\b\\w+\\b)}",
            matcher.to_string()
        );
        Ok(())
    }

    /// An engine that never finishes a match attempt
    struct Stuck;

    impl RegexEngine for Stuck {
        fn compile(_expression: &str, _options: EngineOptions) -> Result<Self> {
            Ok(Self)
        }
        fn named_groups(&self) -> Vec<(String, Vec<usize>)> {
            vec![("snot".to_string(), vec![1])]
        }
        fn search(&self, _input: &str) -> Result<Option<Offsets>> {
            Err(Error::MatchInterrupted {
                elapsed_ms: 42,
                reason: "interrupted".to_string(),
            })
        }
    }

    #[test]
    fn interrupted_match() -> Result<()> {
        let matcher = Compiler::new(PatternLibrary::new(), true)
            .compile_with::<Stuck>("%{WORD:snot}")?;
        assert_eq!(1, matcher.capture_groups().len());
        let r = matcher.captures_str("badger");
        assert!(matches!(r, Err(Error::MatchInterrupted { elapsed_ms: 42, .. })));
        Ok(())
    }
}
