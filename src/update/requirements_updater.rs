//! Requirement text rewriting
//!
//! Rewrites keep the original operator style: the width of each version
//! (`^1.2` stays two components), wildcard positions (`1.2.x`), a leading
//! `v`, and the whitespace around operators. Only the version tokens that
//! need to move are touched.

use crate::domain::{PackageManager, Requirement, RequirementSource, UpdateStrategy};
use crate::scheme::node::{self, BareVersion, CaretRule, NodeDialect, Partial};
use crate::scheme::{scheme_for, Grammar, Scheme, Version, VersionReq};
use regex::Regex;
use std::cmp::Ordering;
use std::ops::Range;
use std::sync::LazyLock;
use tracing::debug;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?<op>\^|~>|~|>=|<=|!=|>|<|=|≥|≤)?(?<ws>\s*)(?<ver>[vV]?(?:\d+|[xX*])(?:\.(?:\d+|[xX*]))*(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?)",
    )
    .unwrap()
});

/// An operator and version found in requirement text, with byte offsets
#[derive(Debug, Clone)]
struct VersionToken {
    op: String,
    start: usize,
    version_start: usize,
    end: usize,
    raw: String,
}

impl VersionToken {
    fn is_upper_bound(&self) -> bool {
        matches!(self.op.as_str(), "<" | "<=" | "≤")
    }

    fn is_lower_bound(&self) -> bool {
        matches!(self.op.as_str(), ">" | ">=" | "≥")
    }

    /// Returns true if the clause alone admits `version`
    fn admits(&self, version: &Version) -> bool {
        Partial::parse(&self.raw)
            .and_then(|p| node::expand(&self.op, &p, BareVersion::Exact, CaretRule::FirstNonZero).ok())
            .is_some_and(|comparators| comparators.iter().all(|c| c.matches(version)))
    }
}

fn version_tokens(text: &str) -> Vec<VersionToken> {
    TOKEN_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let version = caps.name("ver")?;
            let op = caps.name("op");
            Some(VersionToken {
                op: op.map(|m| m.as_str().to_string()).unwrap_or_default(),
                start: op.map_or(version.start(), |m| m.start()),
                version_start: version.start(),
                end: version.end(),
                raw: version.as_str().to_string(),
            })
        })
        .collect()
}

struct Edit {
    range: Range<usize>,
    replacement: String,
}

impl Edit {
    fn version(token: &VersionToken, replacement: String) -> Self {
        Self {
            range: token.version_start..token.end,
            replacement,
        }
    }

    fn clause(token: &VersionToken, replacement: String) -> Self {
        Self {
            range: token.start..token.end,
            replacement,
        }
    }
}

fn apply_edits(text: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| b.range.start.cmp(&a.range.start));
    let mut out = text.to_string();
    for edit in edits {
        out.replace_range(edit.range, &edit.replacement);
    }
    out
}

/// Replaces the last occurrence of `old` in `text`
fn replace_last(text: &str, old: &str, new: &str) -> String {
    match text.rfind(old) {
        Some(index) => format!("{}{}{}", &text[..index], new, &text[index + old.len()..]),
        None => new.to_string(),
    }
}

fn split_v_prefix(raw: &str) -> (&str, &str) {
    match raw.chars().next() {
        Some(c @ ('v' | 'V')) => raw.split_at(c.len_utf8()),
        _ => ("", raw),
    }
}

fn is_wildcard(part: &str) -> bool {
    matches!(part, "x" | "X" | "*")
}

/// Numeric segments of `version`, zero-padded to at least `width`
fn padded_segments(version: &Version, width: usize) -> Vec<u64> {
    let mut segments = version.segments();
    while segments.len() < width.max(3) {
        segments.push(0);
    }
    segments
}

/// Writes `new` in the shape of `raw` (width, wildcards, `v` prefix)
fn format_like(raw: &str, new: &Version) -> String {
    let (prefix, body) = split_v_prefix(raw);
    if new.is_prerelease() || body.contains(['-', '+']) {
        return format!("{}{}", prefix, new);
    }
    let parts: Vec<&str> = body.split('.').collect();
    if parts.len() >= 3 && !parts.iter().any(|p| is_wildcard(p)) {
        return format!("{}{}", prefix, new);
    }
    let numbers = padded_segments(new, parts.len());
    let rendered: Vec<String> = parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            if is_wildcard(part) {
                part.to_string()
            } else {
                numbers[i].to_string()
            }
        })
        .collect();
    format!("{}{}", prefix, rendered.join("."))
}

/// Widens an exclusive upper bound so it admits `new`
///
/// The most significant non-zero component of the bound is set one above
/// `new`'s component at that position; earlier components come from `new`
/// and later ones are zeroed. `<2.0.0` with 3.1.0 gives `<4.0.0`, `<0.3`
/// with 0.5.2 gives `<0.6`.
fn update_greatest_version(bound_raw: &str, new: &Version) -> String {
    let (prefix, body) = split_v_prefix(bound_raw);
    let body = body.split(['-', '+']).next().unwrap_or(body);
    let bound: Vec<u64> = body.split('.').map(|p| p.parse().unwrap_or(0)).collect();
    let target = padded_segments(new, bound.len());
    let index = bound
        .iter()
        .position(|s| *s != 0)
        .unwrap_or(bound.len().saturating_sub(1));

    let rendered: Vec<String> = (0..bound.len())
        .map(|i| match i.cmp(&index) {
            Ordering::Less => target[i],
            Ordering::Equal => target[i].saturating_add(1),
            Ordering::Greater => 0,
        })
        .map(|n| n.to_string())
        .collect();
    format!("{}{}", prefix, rendered.join("."))
}

/// Moves one clause of a bumped requirement to `new`
fn bump_token(token: &VersionToken, new: &Version, lone: bool) -> Option<Edit> {
    match token.op.as_str() {
        "" | "=" | "^" | "~" | "~>" | ">=" | "≥" => {
            Some(Edit::version(token, format_like(&token.raw, new)))
        }
        ">" if lone => None,
        ">" => Some(Edit::clause(token, format!(">={}", format_like(&token.raw, new)))),
        "<" if !token.admits(new) => Some(Edit::version(
            token,
            update_greatest_version(&token.raw, new),
        )),
        "<=" | "≤" if !token.admits(new) => Some(Edit::version(token, format_like(&token.raw, new))),
        _ => None,
    }
}

/// Widens the upper-bound clauses of a range that do not admit `new`
fn widen_upper_bounds(tokens: &[VersionToken], new: &Version) -> Vec<Edit> {
    tokens
        .iter()
        .filter(|t| t.is_upper_bound() && !t.admits(new))
        .map(|t| match t.op.as_str() {
            "<" => Edit::version(t, update_greatest_version(&t.raw, new)),
            _ => Edit::version(t, format_like(&t.raw, new)),
        })
        .collect()
}

fn hyphen_upper_admits(upper: &str, new: &Version) -> bool {
    let Some(partial) = Partial::parse(upper) else {
        return false;
    };
    match (partial.ceiling(), partial.floor()) {
        (Some(ceiling), _) => new < &ceiling,
        (None, Some(floor)) => new <= &floor,
        (None, None) => false,
    }
}

fn bump_alternative(alternative: &str, new: &Version) -> Option<String> {
    if let Some((lower, upper)) = node::split_hyphen(alternative) {
        let upper = if hyphen_upper_admits(upper, new) {
            upper.to_string()
        } else {
            format_like(upper, new)
        };
        return Some(format!("{} - {}", format_like(lower, new), upper));
    }
    let tokens = version_tokens(alternative);
    if tokens.is_empty() {
        return None;
    }
    let lone = tokens.len() == 1;
    let edits = tokens.iter().filter_map(|t| bump_token(t, new, lone)).collect();
    Some(apply_edits(alternative, edits))
}

fn rewrite_node(
    text: &str,
    requirement: &VersionReq,
    new: &Version,
    strategy: UpdateStrategy,
    dialect: &NodeDialect,
) -> Option<String> {
    let trimmed = text.trim();
    let alternatives: Vec<&str> = if dialect.or_operator {
        trimmed.split("||").map(str::trim).collect()
    } else {
        vec![trimmed]
    };
    let last = *alternatives.last()?;

    if strategy != UpdateStrategy::WidenRanges {
        // Bumping collapses alternatives into the newest one
        return bump_alternative(last, new);
    }

    if let Some((lower, upper)) = node::split_hyphen(last) {
        let widened = format!("{} - {}", lower, format_like(upper, new));
        return Some(replace_last(trimmed, last, &widened));
    }

    let tokens = version_tokens(last);
    if tokens.iter().any(VersionToken::is_upper_bound) {
        let widened = apply_edits(last, widen_upper_bounds(&tokens, new));
        return Some(replace_last(trimmed, last, &widened));
    }

    if let [token] = tokens.as_slice() {
        let op = token.op.as_str();
        let caret_like = matches!(op, "^" | "~" | "~>")
            || (op.is_empty() && dialect.bare == BareVersion::Caret);
        if caret_like {
            if dialect.or_operator {
                return Some(format!("{} || ^{}", trimmed, format_like(&token.raw, new)));
            }
            let ceiling = requirement.upper_bound()?;
            return Some(format!(
                ">={}{}<{}",
                token.raw,
                dialect.and_separator,
                update_greatest_version(ceiling.version.as_str(), new)
            ));
        }
        if matches!(op, "" | "=") {
            let pinned = apply_edits(last, vec![Edit::version(token, format_like(&token.raw, new))]);
            return Some(replace_last(trimmed, last, &pinned));
        }
    }

    if dialect.or_operator {
        Some(format!("{} || ^{}", trimmed, new))
    } else {
        bump_alternative(last, new)
    }
}

fn is_inequality_part(part: &str) -> bool {
    [">=", "<=", ">", "<", "≥", "≤", "!="]
        .iter()
        .any(|op| part.starts_with(op))
}

fn rewrite_julia(text: &str, new: &Version, strategy: UpdateStrategy) -> Option<String> {
    let trimmed = text.trim();
    let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
    let is_range = parts.iter().all(|p| is_inequality_part(p));
    let tokens = version_tokens(trimmed);

    if is_range {
        let edits = match strategy {
            UpdateStrategy::WidenRanges => widen_upper_bounds(&tokens, new),
            _ => tokens
                .iter()
                .filter_map(|t| bump_token(t, new, tokens.len() == 1))
                .collect(),
        };
        return Some(apply_edits(trimmed, edits));
    }

    let last = *parts.last()?;
    let last_tokens = version_tokens(last);
    let [token] = last_tokens.as_slice() else {
        return None;
    };

    match strategy {
        UpdateStrategy::WidenRanges => Some(format!("{}, {}", trimmed, format_like(&token.raw, new))),
        _ => bump_token(token, new, true).map(|edit| apply_edits(last, vec![edit])),
    }
}

fn rewrite_java(text: &str, requirement: &VersionReq, new: &Version) -> Option<String> {
    let trimmed = text.trim();

    if trimmed.starts_with(['[', '(']) {
        let is_pin = trimmed.starts_with('[') && trimmed.ends_with(']') && !trimmed.contains(',');
        if is_pin {
            return Some(format!("[{}]", new));
        }
        if requirement.matches(new) {
            return None;
        }
        let start = trimmed.rfind(['[', '('])?;
        let last = &trimmed[start..];
        let (open, close) = (&last[..1], &last[last.len() - 1..]);
        let (lower, upper) = last[1..last.len() - 1].split_once(',')?;
        if upper.trim().is_empty() {
            return None;
        }
        let widened_upper = if close == ")" {
            update_greatest_version(upper.trim(), new)
        } else {
            new.to_string()
        };
        let widened = format!("{}{},{}{}", open, lower, widened_upper, close);
        return Some(format!("{}{}", &trimmed[..start], widened));
    }

    if let Some(prefix) = trimmed.strip_suffix('+') {
        if prefix.is_empty() {
            return None;
        }
        let dotted = prefix.ends_with('.');
        let digits = prefix.trim_end_matches('.');
        let width = digits.split('.').count();
        let numbers = padded_segments(new, width);
        let rendered: Vec<String> = numbers[..width].iter().map(u64::to_string).collect();
        return Some(format!(
            "{}{}+",
            rendered.join("."),
            if dotted { "." } else { "" }
        ));
    }

    Some(new.to_string())
}

/// Rewrites requirements for a new version under an update strategy
pub struct RequirementsUpdater {
    scheme: &'static dyn Scheme,
}

impl RequirementsUpdater {
    pub fn new(package_manager: PackageManager) -> Self {
        Self {
            scheme: scheme_for(package_manager),
        }
    }

    /// Rewrite every requirement, preserving order and file/group metadata
    pub fn update(
        &self,
        requirements: &[Requirement],
        new_version: &Version,
        strategy: UpdateStrategy,
        new_source: Option<&RequirementSource>,
    ) -> Vec<Requirement> {
        requirements
            .iter()
            .map(|r| self.update_one(r, new_version, strategy, new_source))
            .collect()
    }

    fn update_one(
        &self,
        requirement: &Requirement,
        new: &Version,
        strategy: UpdateStrategy,
        new_source: Option<&RequirementSource>,
    ) -> Requirement {
        if strategy == UpdateStrategy::LockfileOnly {
            return requirement.clone();
        }

        let mut updated = requirement.clone();

        if let (Some(old), Some(source)) = (&requirement.source, new_source) {
            if !old.same_kind(source) {
                updated.requirement = Some(self.fresh_requirement(new));
                updated.source = Some(source.clone());
                return updated;
            }
        }

        if let Some(RequirementSource::Git {
            url,
            reference: Some(reference),
        }) = &requirement.source
        {
            if let Some(tag) = self.moved_tag(reference, new) {
                updated.source = Some(RequirementSource::Git {
                    url: url.clone(),
                    reference: Some(tag),
                });
            }
        }

        if let Some(text) = requirement.text() {
            if let Some(rewritten) = self.rewrite(text, new, strategy) {
                updated.requirement = Some(rewritten);
            }
        }

        updated
    }

    /// Rewritten text, or `None` if the text stays as it is
    pub fn rewrite(&self, text: &str, new: &Version, strategy: UpdateStrategy) -> Option<String> {
        let requirement = match self.scheme.parse_requirement(Some(text)) {
            Ok(requirement) => requirement,
            Err(e) => {
                debug!("leaving requirement unchanged: {}", e);
                return None;
            }
        };
        if requirement.is_any() {
            return None;
        }

        let satisfied = requirement.matches(new);
        let rewritten = match strategy {
            UpdateStrategy::LockfileOnly => return None,
            UpdateStrategy::WidenRanges | UpdateStrategy::BumpVersionsIfNecessary if satisfied => {
                return None
            }
            _ => match self.scheme.grammar() {
                Grammar::Node(dialect) => rewrite_node(text, &requirement, new, strategy, &dialect),
                Grammar::Julia => rewrite_julia(text, new, strategy),
                Grammar::Java => rewrite_java(text, &requirement, new),
            },
        }?;

        (rewritten != text.trim()).then_some(rewritten)
    }

    /// A caret-style requirement for a dependency that changed source kind
    fn fresh_requirement(&self, new: &Version) -> String {
        match self.scheme.grammar() {
            Grammar::Node(_) => format!("^{}", new),
            Grammar::Julia | Grammar::Java => new.to_string(),
        }
    }

    /// Moves a version-tag git reference to `new`, keeping its `v` prefix
    fn moved_tag(&self, reference: &str, new: &Version) -> Option<String> {
        let (prefix, body) = split_v_prefix(reference);
        let current = self.scheme.parse_version(body).ok()?;
        if &current == new {
            return None;
        }
        Some(format!("{}{}", prefix, new))
    }
}
