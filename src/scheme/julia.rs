//! Julia compat grammar
//!
//! Comma-separated specifiers are OR-ed. A bare version is a caret
//! specifier, `=` pins exactly and `~` allows patch (or minor, for `0.0.x`)
//! releases. Runs of inequality specifiers (`>= 1.2, < 2`) are AND-ed
//! together into one range.

use super::node::{self, BareVersion, CaretRule, Partial};
use super::requirement::{Comparator, Op, PrereleasePolicy, VersionReq};
use super::Version;

const INEQUALITIES: [&str; 7] = [">=", "<=", ">", "<", "≥", "≤", "!="];

fn is_inequality(op: &str) -> bool {
    INEQUALITIES.contains(&op)
}

fn tilde(partial: &Partial) -> Result<Vec<Comparator>, String> {
    let floor = partial
        .floor()
        .ok_or_else(|| "version component out of range".to_string())?;
    let major = partial.major.ok_or_else(|| "'~' needs a version".to_string())?;
    let ceiling = match (partial.minor, partial.patch) {
        (None, _) => Version::from_parts(major.saturating_add(1), 0, 0),
        (Some(minor), None) => Version::from_parts(major, minor.saturating_add(1), 0),
        (Some(0), Some(patch)) if major == 0 => Version::from_parts(0, 0, patch.saturating_add(1)),
        (Some(minor), Some(_)) => Version::from_parts(major, minor.saturating_add(1), 0),
    };
    Ok(vec![
        Comparator::new(Op::Ge, floor),
        Comparator::new(Op::Lt, ceiling),
    ])
}

fn specifier(op: &str, version: &str) -> Result<Vec<Comparator>, String> {
    let partial = Partial::parse(version).ok_or_else(|| format!("invalid version '{}'", version))?;
    match op {
        "~" => tilde(&partial),
        "=" if !partial.is_full() => {
            // Julia pins `=1.2` to exactly 1.2.0
            let floor = partial
                .floor()
                .ok_or_else(|| "version component out of range".to_string())?;
            Ok(vec![Comparator::new(Op::Eq, floor)])
        }
        _ => node::expand(op, &partial, BareVersion::Caret, CaretRule::FirstNonZero),
    }
}

/// Parses Julia compat text
pub(crate) fn parse(text: Option<&str>) -> Result<VersionReq, String> {
    let text = match text.map(str::trim) {
        None | Some("") | Some("*") => return Ok(VersionReq::any()),
        Some(text) => text,
    };

    let mut alternatives: Vec<Vec<Comparator>> = Vec::new();
    let mut open_range: Option<Vec<Comparator>> = None;

    for part in text.split(',').map(str::trim) {
        if part.is_empty() {
            return Err("empty specifier".to_string());
        }

        if let Some((lower, upper)) = node::split_hyphen(part) {
            alternatives.extend(open_range.take());
            alternatives.push(node::expand_hyphen(lower, upper)?);
            continue;
        }

        let (op, version) = node::split_operator(part);
        if version.is_empty() {
            return Err(format!("operator '{}' without a version", op));
        }
        let comparators = specifier(&op, &version)?;

        if is_inequality(&op) {
            open_range.get_or_insert_with(Vec::new).extend(comparators);
        } else {
            alternatives.extend(open_range.take());
            alternatives.push(comparators);
        }
    }
    alternatives.extend(open_range);

    Ok(VersionReq::new(alternatives, PrereleasePolicy::Ordinary))
}
