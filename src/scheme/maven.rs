//! Maven and Gradle requirement grammar
//!
//! - Soft version: `1.2.3` (satisfied only by that version)
//! - Hard pin: `[1.2.3]`
//! - Ranges: `[1.0,2.0)`, `(,1.0]`, `[1.5,)` and unions `(,1.0],[1.2,)`
//! - Gradle dynamic versions: `1.+`, `1.2+`, `+`
//! - `latest.release` / `latest.integration`

use super::java;
use super::requirement::{Comparator, Op, PrereleasePolicy, VersionReq};
use super::Version;

const ANY_KEYWORDS: [&str; 6] = [
    "+",
    "*",
    "latest.release",
    "latest.integration",
    "LATEST",
    "RELEASE",
];

fn version(text: &str) -> Result<Version, String> {
    java::parse(text).ok_or_else(|| format!("invalid version '{}'", text))
}

/// Splits `(,1.0],[1.2,)` into its bracketed ranges
fn split_ranges(text: &str) -> Result<Vec<&str>, String> {
    let mut ranges = Vec::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        if !rest.starts_with(['[', '(']) {
            return Err(format!("expected '[' or '(' at '{}'", rest));
        }
        let end = rest
            .find([']', ')'])
            .ok_or_else(|| "unterminated range".to_string())?;
        ranges.push(&rest[..=end]);
        rest = rest[end + 1..].trim_start();
        if let Some(stripped) = rest.strip_prefix(',') {
            rest = stripped.trim_start();
            if rest.is_empty() {
                return Err("trailing ','".to_string());
            }
        }
    }
    Ok(ranges)
}

fn parse_range(range: &str) -> Result<Vec<Comparator>, String> {
    let inclusive_lower = range.starts_with('[');
    let inclusive_upper = range.ends_with(']');
    let inner = &range[1..range.len() - 1];

    let Some((lower, upper)) = inner.split_once(',') else {
        let pinned = inner.trim();
        if !(inclusive_lower && inclusive_upper) || pinned.is_empty() {
            return Err(format!("invalid pin '{}'", range));
        }
        return Ok(vec![Comparator::new(Op::Eq, version(pinned)?)]);
    };

    let mut comparators = Vec::new();
    let lower = lower.trim();
    if !lower.is_empty() {
        let op = if inclusive_lower { Op::Ge } else { Op::Gt };
        comparators.push(Comparator::new(op, version(lower)?));
    }
    let upper = upper.trim();
    if !upper.is_empty() {
        let op = if inclusive_upper { Op::Le } else { Op::Lt };
        comparators.push(Comparator::new(op, version(upper)?));
    }
    Ok(comparators)
}

/// Expands a Gradle dynamic prefix (`1.2` of `1.2+`) into a half-open range
fn parse_dynamic(prefix: &str) -> Result<Vec<Comparator>, String> {
    let prefix = prefix.trim_end_matches('.');
    let floor = version(prefix)?;
    let mut segments = floor.segments();
    if segments.is_empty() || segments.len() != prefix.split('.').count() {
        return Err(format!("invalid dynamic version '{}+'", prefix));
    }
    if let Some(last) = segments.last_mut() {
        *last = last.saturating_add(1);
    }
    let ceiling_text = segments
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".");
    Ok(vec![
        Comparator::new(Op::Ge, floor),
        Comparator::new(Op::Lt, version(&ceiling_text)?),
    ])
}

/// Parses Maven or Gradle requirement text
pub(crate) fn parse(text: Option<&str>) -> Result<VersionReq, String> {
    let text = match text.map(str::trim) {
        None | Some("") => return Ok(VersionReq::any()),
        Some(text) if ANY_KEYWORDS.contains(&text) => return Ok(VersionReq::any()),
        Some(text) => text,
    };

    let alternatives = if text.starts_with(['[', '(']) {
        split_ranges(text)?
            .into_iter()
            .map(parse_range)
            .collect::<Result<Vec<_>, _>>()?
    } else if let Some(prefix) = text.strip_suffix('+') {
        vec![parse_dynamic(prefix)?]
    } else {
        vec![vec![Comparator::new(Op::Eq, version(text)?)]]
    };

    Ok(VersionReq::new(alternatives, PrereleasePolicy::Ordinary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn satisfies(req: &str, candidate: &str) -> bool {
        parse(Some(req))
            .unwrap()
            .matches(&java::parse(candidate).unwrap())
    }

    #[rstest]
    #[case("1.2.3", "1.2.3", true)]
    #[case("1.2.3", "1.2.4", false)]
    #[case("1.0", "1.0.0", true)]
    #[case("[1.2.3]", "1.2.3", true)]
    #[case("[1.2.3]", "1.2.4", false)]
    #[case("[1.0,2.0)", "1.9.9", true)]
    #[case("[1.0,2.0)", "2.0", false)]
    #[case("[1.0,2.0]", "2.0", true)]
    #[case("(1.0,2.0]", "1.0", false)]
    #[case("(,1.0]", "0.5", true)]
    #[case("[1.5,)", "9.0", true)]
    #[case("(,1.0],[1.2,)", "1.1", false)]
    #[case("(,1.0],[1.2,)", "1.3", true)]
    #[case("[1.0,2.0)", "2.0-rc1", true)]
    fn test_ranges(#[case] req: &str, #[case] candidate: &str, #[case] expected: bool) {
        assert_eq!(satisfies(req, candidate), expected, "{} vs {}", req, candidate);
    }

    #[rstest]
    #[case("1.+", "1.9", true)]
    #[case("1.+", "2.0", false)]
    #[case("22.1+", "22.1.5", true)]
    #[case("22.1+", "22.2", false)]
    #[case("+", "99.0", true)]
    #[case("latest.release", "1.0", true)]
    fn test_dynamic(#[case] req: &str, #[case] candidate: &str, #[case] expected: bool) {
        assert_eq!(satisfies(req, candidate), expected, "{} vs {}", req, candidate);
    }

    #[test]
    fn test_blank_means_any() {
        assert!(parse(None).unwrap().is_any());
        assert!(parse(Some("")).unwrap().is_any());
    }

    #[rstest]
    #[case("[1.0")]
    #[case("[1.0,2.0),")]
    #[case("(1.0)")]
    #[case("${foo.version}")]
    #[case("abc+")]
    fn test_invalid(#[case] req: &str) {
        assert!(parse(Some(req)).is_err(), "{} should be invalid", req);
    }
}
