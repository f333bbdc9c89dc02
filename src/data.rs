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

//! Typed values extracted from grok captures.
//!
//! A capture is declared with an optional type as the third part of a
//! reference, e.g. `%{NUMBER:bytes:long}`. Undeclared captures are strings.

mod duration;

pub use duration::parse as parse_duration;

use simd_json::OwnedValue;
use std::fmt;
use std::str::FromStr;

/// The scalar kind a captured field is converted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Type {
    /// 16 bit signed integer
    Short,
    /// 32 bit signed integer
    Int,
    /// 64 bit signed integer
    Long,
    /// 32 bit float
    Float,
    /// 64 bit float
    Double,
    /// `true` or `false`
    Boolean,
    /// the raw captured text
    #[default]
    String,
    /// ISO-8601 duration, e.g. `PT1H30M`
    Duration,
}

impl Type {
    /// All supported types
    pub const ALL: [Type; 8] = [
        Type::Short,
        Type::Int,
        Type::Long,
        Type::Float,
        Type::Double,
        Type::Boolean,
        Type::String,
        Type::Duration,
    ];

    /// Name of the type as written in a grok reference
    pub fn name(self) -> &'static str {
        match self {
            Type::Short => "short",
            Type::Int => "int",
            Type::Long => "long",
            Type::Float => "float",
            Type::Double => "double",
            Type::Boolean => "boolean",
            Type::String => "string",
            Type::Duration => "duration",
        }
    }

    /// Looks up a type by name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    /// Looks up a type by name, ignoring case, and returns `default` for unknown names
    pub fn from_name_or(name: &str, default: Self) -> Self {
        Self::from_name(name).unwrap_or(default)
    }

    /// Converts raw captured text into a value of this type.
    ///
    /// Returns `None` if the text is not a valid literal for the type.
    pub fn convert(self, raw: &str) -> Option<Value> {
        let bytes = raw.as_bytes();
        Some(match self {
            Type::Short => Value::Short(lexical::parse(bytes).ok()?),
            Type::Int => Value::Int(lexical::parse(bytes).ok()?),
            Type::Long => Value::Long(lexical::parse(bytes).ok()?),
            Type::Float => Value::Float(lexical::parse(bytes).ok()?),
            Type::Double => Value::Double(lexical::parse(bytes).ok()?),
            Type::Boolean => match raw {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => return None,
            },
            Type::String => Value::String(raw.to_string()),
            Type::Duration => Value::Duration(parse_duration(raw)?),
        })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Type {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("Unknown grok type `{s}`"))
    }
}

/// Captured fields by name
pub type Captures = halfbrown::HashMap<String, Value>;

/// Turns captured fields into a json object
pub fn captures_to_value(captures: Captures) -> OwnedValue {
    OwnedValue::from(
        captures
            .into_iter()
            .map(|(k, v)| (k, OwnedValue::from(v)))
            .collect::<simd_json::owned::Object>(),
    )
}

/// A typed captured value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// short
    Short(i16),
    /// int
    Int(i32),
    /// long
    Long(i64),
    /// float
    Float(f32),
    /// double
    Double(f64),
    /// boolean
    Bool(bool),
    /// string
    String(String),
    /// duration
    Duration(chrono::Duration),
}

impl Value {
    /// The type this value was converted to
    pub fn value_type(&self) -> Type {
        match self {
            Value::Short(_) => Type::Short,
            Value::Int(_) => Type::Int,
            Value::Long(_) => Type::Long,
            Value::Float(_) => Type::Float,
            Value::Double(_) => Type::Double,
            Value::Bool(_) => Type::Boolean,
            Value::String(_) => Type::String,
            Value::Duration(_) => Type::Duration,
        }
    }

    /// Returns the string if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        if let Value::String(s) = self {
            Some(s)
        } else {
            None
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Short(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Duration(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Value> for OwnedValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Short(v) => OwnedValue::from(i64::from(v)),
            Value::Int(v) => OwnedValue::from(i64::from(v)),
            Value::Long(v) => OwnedValue::from(v),
            Value::Float(v) => OwnedValue::from(f64::from(v)),
            Value::Double(v) => OwnedValue::from(v),
            Value::Bool(v) => OwnedValue::from(v),
            Value::String(v) => OwnedValue::from(v),
            // durations are nanoseconds, like every other time value in tremor
            Value::Duration(d) => d
                .num_nanoseconds()
                .map_or_else(|| OwnedValue::from(d.to_string()), OwnedValue::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simd_json::prelude::*;
    use test_case::test_case;

    #[test_case("int", Some(Type::Int); "lower case")]
    #[test_case("INT", Some(Type::Int); "upper case")]
    #[test_case("Boolean", Some(Type::Boolean); "mixed case")]
    #[test_case("duration", Some(Type::Duration); "duration")]
    #[test_case("integer", None; "unknown")]
    #[test_case("", None; "empty")]
    fn lookup_by_name(name: &str, expected: Option<Type>) {
        assert_eq!(expected, Type::from_name(name));
    }

    #[test]
    fn unknown_name_falls_back() {
        assert_eq!(Type::String, Type::from_name_or("snot", Type::String));
        assert_eq!(Type::Long, Type::from_name_or("long", Type::String));
        assert!("badger".parse::<Type>().is_err());
        assert_eq!(Ok(Type::Float), "float".parse::<Type>());
    }

    #[test]
    fn convert_numbers() {
        assert_eq!(Some(Value::Short(-42)), Type::Short.convert("-42"));
        assert_eq!(Some(Value::Int(42)), Type::Int.convert("42"));
        assert_eq!(Some(Value::Long(8_589_934_592)), Type::Long.convert("8589934592"));
        assert_eq!(Some(Value::Float(0.5)), Type::Float.convert("0.5"));
        assert_eq!(Some(Value::Double(1.25)), Type::Double.convert("1.25"));
    }

    #[test]
    fn convert_rejects_bad_numbers() {
        assert_eq!(None, Type::Short.convert("40000"));
        assert_eq!(None, Type::Int.convert("4.2"));
        assert_eq!(None, Type::Int.convert("snot"));
        assert_eq!(None, Type::Int.convert(""));
        assert_eq!(None, Type::Long.convert("42 "));
        assert_eq!(None, Type::Double.convert("badger"));
    }

    #[test]
    fn convert_booleans() {
        assert_eq!(Some(Value::Bool(true)), Type::Boolean.convert("true"));
        assert_eq!(Some(Value::Bool(false)), Type::Boolean.convert("false"));
        assert_eq!(None, Type::Boolean.convert("TRUE"));
        assert_eq!(None, Type::Boolean.convert("yes"));
    }

    #[test]
    fn convert_strings_and_durations() {
        assert_eq!(Some(Value::from("snot badger")), Type::String.convert("snot badger"));
        assert_eq!(
            Some(Value::Duration(chrono::Duration::minutes(90))),
            Type::Duration.convert("PT1H30M")
        );
        assert_eq!(None, Type::Duration.convert("90 minutes"));
    }

    #[test]
    fn into_simd_json() {
        assert_eq!(OwnedValue::from(42_i64), OwnedValue::from(Value::Int(42)));
        assert_eq!(OwnedValue::from("snot"), OwnedValue::from(Value::from("snot")));
        assert_eq!(
            OwnedValue::from(1_500_000_000_i64),
            OwnedValue::from(Value::Duration(chrono::Duration::milliseconds(1500)))
        );
    }

    #[test]
    fn captures_into_object() {
        let mut captures = Captures::new();
        captures.insert("status".to_string(), Value::Int(200));
        captures.insert("verb".to_string(), Value::from("GET"));
        let value = captures_to_value(captures);
        assert_eq!(Some(&OwnedValue::from(200_i64)), value.get("status"));
        assert_eq!(Some(&OwnedValue::from("GET")), value.get("verb"));
        assert_eq!(None, value.get("snot"));
    }
}
