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

use chrono::Duration;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // ALLOW: this is a constant, valid regex
    static ref ISO8601_DURATION: Regex = Regex::new(
        r"(?i)^([-+]?)P(?:([-+]?[0-9]+)D)?(T(?:([-+]?[0-9]+)H)?(?:([-+]?[0-9]+)M)?(?:([-+]?[0-9]+)(?:[.,]([0-9]{0,9}))?S)?)?$",
    )
    .expect("invalid duration regex");
}

/// Parses an ISO-8601 duration of the form `PnDTnHnMn.nS`.
///
/// Every component may carry its own sign and the whole duration may be
/// negated with a leading `-`. Returns `None` for anything else, including
/// `P` and `PT` without components.
pub fn parse(s: &str) -> Option<Duration> {
    let caps = ISO8601_DURATION.captures(s)?;
    let days = caps.get(2);
    let time = caps.get(3);
    let hours = caps.get(4);
    let minutes = caps.get(5);
    let seconds = caps.get(6);
    let fraction = caps.get(7);

    if days.is_none() && hours.is_none() && minutes.is_none() && seconds.is_none() {
        return None;
    }
    // a `T` has to be followed by at least one time component
    if time.is_some_and(|t| t.as_str().len() == 1) {
        return None;
    }

    let mut total = Duration::zero();
    if let Some(d) = days {
        total = total.checked_add(&Duration::try_days(component(d.as_str())?)?)?;
    }
    if let Some(h) = hours {
        total = total.checked_add(&Duration::try_hours(component(h.as_str())?)?)?;
    }
    if let Some(m) = minutes {
        total = total.checked_add(&Duration::try_minutes(component(m.as_str())?)?)?;
    }
    if let Some(sec) = seconds {
        let sec = sec.as_str();
        total = total.checked_add(&Duration::try_seconds(component(sec)?)?)?;
        if let Some(frac) = fraction {
            let mut nanos = fraction_nanos(frac.as_str())?;
            if sec.starts_with('-') {
                nanos = -nanos;
            }
            total = total.checked_add(&Duration::nanoseconds(nanos))?;
        }
    }

    if caps.get(1).is_some_and(|sign| sign.as_str() == "-") {
        Some(-total)
    } else {
        Some(total)
    }
}

fn component(s: &str) -> Option<i64> {
    lexical::parse(s.strip_prefix('+').unwrap_or(s).as_bytes()).ok()
}

/// right-pads the fraction to nanosecond precision
fn fraction_nanos(s: &str) -> Option<i64> {
    if s.is_empty() {
        return Some(0);
    }
    let padded = format!("{s:0<9}");
    lexical::parse(padded.as_bytes()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("PT20.345S", Duration::milliseconds(20_345); "seconds with fraction")]
    #[test_case("PT15M", Duration::minutes(15); "minutes")]
    #[test_case("PT10H", Duration::hours(10); "hours")]
    #[test_case("P2D", Duration::days(2); "days")]
    #[test_case("P2DT3H4M", Duration::days(2) + Duration::hours(3) + Duration::minutes(4); "mixed")]
    #[test_case("pt1h30m", Duration::minutes(90); "lower case")]
    #[test_case("PT-6H3M", Duration::hours(-6) + Duration::minutes(3); "negative component")]
    #[test_case("-PT6H3M", -(Duration::hours(6) + Duration::minutes(3)); "negated")]
    #[test_case("-PT-6H+3M", Duration::hours(6) - Duration::minutes(3); "negated negative component")]
    #[test_case("PT-0.5S", Duration::milliseconds(-500); "negative fraction")]
    #[test_case("PT1,000000001S", Duration::seconds(1) + Duration::nanoseconds(1); "comma fraction")]
    fn valid(input: &str, expected: Duration) {
        assert_eq!(Some(expected), parse(input));
    }

    #[test_case(""; "empty")]
    #[test_case("P"; "no components")]
    #[test_case("PT"; "no time components")]
    #[test_case("P1DT"; "dangling time designator")]
    #[test_case("PT.5S"; "fraction without seconds")]
    #[test_case("1H"; "missing period designator")]
    #[test_case("P1Y"; "years are not supported")]
    #[test_case("PT1.1234567891S"; "more than nanosecond precision")]
    fn invalid(input: &str) {
        assert_eq!(None, parse(input));
    }
}
