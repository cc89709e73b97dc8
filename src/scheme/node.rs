//! Node-style requirement grammar shared by npm, Cargo and Pub
//!
//! Handles:
//! - Caret: `^1.2.3`, `^0.2`, `^0.0.3`
//! - Tilde: `~1.2.3`, `~>1.2`
//! - Comparators: `>=1.0.0 <2.0.0`, `>= 1.0, < 2.0`
//! - Wildcards: `1.2.x`, `1.*`, `*`
//! - Hyphen ranges: `1.2.3 - 2.3.4`
//! - Alternatives: `^1.0.0 || ^2.0.0` (npm only)
//!
//! Dialects differ in what a bare version means and in how caret treats a
//! zero major version.

use super::requirement::{Comparator, Op, PrereleasePolicy, VersionReq};
use super::{semantic, Version};
use regex::Regex;
use std::sync::LazyLock;

static PARTIAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d+|[xX*])(?:\.(\d+|[xX*]))?(?:\.(\d+|[xX*]))?(?:-([0-9A-Za-z.-]+))?(?:\+([0-9A-Za-z.-]+))?$",
    )
    .unwrap()
});

static DIST_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9._-]*$").unwrap());

static OPERATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(>=|<=|!=|~>|>|<|=|\^|~)$").unwrap());

static CLAUSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(>=|<=|!=|~>|>|<|=|\^|~|≥|≤)?\s*(.+)$").unwrap());

/// What an operator-less version means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BareVersion {
    /// `1.2.3` pins exactly (npm, Pub)
    Exact,
    /// `1.2.3` behaves like `^1.2.3` (Cargo, Julia)
    Caret,
}

/// Upper bound rule for caret requirements on `0.x` versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretRule {
    /// Compatible within the first non-zero component: `^0.0.3` is `<0.0.4`
    FirstNonZero,
    /// Next breaking version: `^0.0.3` is `<0.1.0` (Pub)
    NextBreaking,
}

/// Syntax variations of the node-style grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeDialect {
    pub bare: BareVersion,
    pub caret: CaretRule,
    /// `||` separates alternatives
    pub or_operator: bool,
    /// Separator used when rendering AND-ed clauses
    pub and_separator: &'static str,
    /// Keyword meaning "any version"
    pub any_keyword: Option<&'static str>,
    /// Bare names such as `latest` or `next` refer to registry dist-tags
    pub dist_tags: bool,
}

pub const NPM: NodeDialect = NodeDialect {
    bare: BareVersion::Exact,
    caret: CaretRule::FirstNonZero,
    or_operator: true,
    and_separator: " ",
    any_keyword: None,
    dist_tags: true,
};

pub const CARGO: NodeDialect = NodeDialect {
    bare: BareVersion::Caret,
    caret: CaretRule::FirstNonZero,
    or_operator: false,
    and_separator: ", ",
    any_keyword: None,
    dist_tags: false,
};

pub const PUB: NodeDialect = NodeDialect {
    bare: BareVersion::Exact,
    caret: CaretRule::NextBreaking,
    or_operator: false,
    and_separator: " ",
    any_keyword: Some("any"),
    dist_tags: false,
};

/// A possibly incomplete version such as `1.2`, `1.x` or `*`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Partial {
    pub major: Option<u64>,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
    pub pre: Option<String>,
}

impl Partial {
    pub(crate) fn parse(text: &str) -> Option<Partial> {
        let canonical = semantic::canonicalize(text);
        let caps = PARTIAL_RE.captures(canonical)?;

        let mut wildcard_seen = false;
        let mut component = |index: usize| -> Option<Option<u64>> {
            match caps.get(index) {
                None => {
                    wildcard_seen = true;
                    Some(None)
                }
                Some(m) if matches!(m.as_str(), "x" | "X" | "*") => {
                    wildcard_seen = true;
                    Some(None)
                }
                Some(_) if wildcard_seen => Some(None),
                Some(m) => m.as_str().parse::<u64>().ok().map(Some),
            }
        };

        let major = component(1)?;
        let minor = component(2)?;
        let patch = component(3)?;
        let pre = match patch {
            Some(_) => caps.get(4).map(|m| m.as_str().to_string()),
            None => None,
        };

        Some(Partial {
            major,
            minor,
            patch,
            pre,
        })
    }

    pub(crate) fn is_full(&self) -> bool {
        self.major.is_some() && self.minor.is_some() && self.patch.is_some()
    }

    pub(crate) fn is_wildcard(&self) -> bool {
        self.major.is_none()
    }

    /// Lowest version the partial can denote
    pub(crate) fn floor(&self) -> Option<Version> {
        let text = format!(
            "{}.{}.{}",
            self.major.unwrap_or(0),
            self.minor.unwrap_or(0),
            self.patch.unwrap_or(0)
        );
        match &self.pre {
            Some(pre) => semantic::parse(&format!("{}-{}", text, pre)),
            None => semantic::parse(&text),
        }
    }

    /// First version above everything the partial denotes (`1.2` gives `1.3.0`)
    pub(crate) fn ceiling(&self) -> Option<Version> {
        match (self.major, self.minor, self.patch) {
            (Some(major), None, _) => Some(Version::from_parts(major.saturating_add(1), 0, 0)),
            (Some(major), Some(minor), None) => Some(Version::from_parts(major, minor.saturating_add(1), 0)),
            _ => None,
        }
    }

    fn caret_ceiling(&self, rule: CaretRule) -> Option<Version> {
        let major = self.major?;
        if major > 0 {
            return Some(Version::from_parts(major.saturating_add(1), 0, 0));
        }
        let Some(minor) = self.minor else {
            return Some(Version::from_parts(1, 0, 0));
        };
        match rule {
            CaretRule::NextBreaking => Some(Version::from_parts(0, minor.saturating_add(1), 0)),
            CaretRule::FirstNonZero => {
                if minor > 0 {
                    return Some(Version::from_parts(0, minor.saturating_add(1), 0));
                }
                match self.patch {
                    None => Some(Version::from_parts(0, 1, 0)),
                    Some(patch) => Some(Version::from_parts(0, 0, patch.saturating_add(1))),
                }
            }
        }
    }

    fn tilde_ceiling(&self) -> Option<Version> {
        let major = self.major?;
        match self.minor {
            None => Some(Version::from_parts(major.saturating_add(1), 0, 0)),
            Some(minor) => Some(Version::from_parts(major, minor.saturating_add(1), 0)),
        }
    }
}

/// Expands `op partial` into comparators under the given caret rule
pub(crate) fn expand(
    op: &str,
    partial: &Partial,
    bare: BareVersion,
    caret: CaretRule,
) -> Result<Vec<Comparator>, String> {
    let floor = || {
        partial
            .floor()
            .ok_or_else(|| "version component out of range".to_string())
    };

    if partial.is_wildcard() {
        return match op {
            "" | "=" | ">=" | "^" | "~" | "~>" | "≥" => Ok(Vec::new()),
            _ => Ok(vec![Comparator::new(Op::Lt, Version::from_parts(0, 0, 0))]),
        };
    }

    let bounded = |ceiling: Option<Version>| -> Result<Vec<Comparator>, String> {
        let mut comparators = vec![Comparator::new(Op::Ge, floor()?)];
        if let Some(ceiling) = ceiling {
            comparators.push(Comparator::new(Op::Lt, ceiling));
        }
        Ok(comparators)
    };

    match op {
        "" if bare == BareVersion::Caret => bounded(partial.caret_ceiling(caret)),
        "" | "=" => {
            if partial.is_full() {
                Ok(vec![Comparator::new(Op::Eq, floor()?)])
            } else {
                bounded(partial.ceiling())
            }
        }
        "^" => bounded(partial.caret_ceiling(caret)),
        "~" | "~>" => bounded(partial.tilde_ceiling()),
        ">=" | "≥" => Ok(vec![Comparator::new(Op::Ge, floor()?)]),
        ">" => match partial.ceiling() {
            Some(ceiling) => Ok(vec![Comparator::new(Op::Ge, ceiling)]),
            None => Ok(vec![Comparator::new(Op::Gt, floor()?)]),
        },
        "<" => Ok(vec![Comparator::new(Op::Lt, floor()?)]),
        "<=" | "≤" => match partial.ceiling() {
            Some(ceiling) => Ok(vec![Comparator::new(Op::Lt, ceiling)]),
            None => Ok(vec![Comparator::new(Op::Le, floor()?)]),
        },
        "!=" if partial.is_full() => Ok(vec![Comparator::new(Op::Ne, floor()?)]),
        "!=" => Err("'!=' needs a complete version".to_string()),
        other => Err(format!("unknown operator '{}'", other)),
    }
}

/// Expands a hyphen range `lower - upper`
pub(crate) fn expand_hyphen(lower: &str, upper: &str) -> Result<Vec<Comparator>, String> {
    let lower = Partial::parse(lower).ok_or_else(|| format!("invalid version '{}'", lower))?;
    let upper = Partial::parse(upper).ok_or_else(|| format!("invalid version '{}'", upper))?;

    let mut comparators = Vec::new();
    if !lower.is_wildcard() {
        let floor = lower
            .floor()
            .ok_or_else(|| "version component out of range".to_string())?;
        comparators.push(Comparator::new(Op::Ge, floor));
    }
    if !upper.is_wildcard() {
        match upper.ceiling() {
            Some(ceiling) => comparators.push(Comparator::new(Op::Lt, ceiling)),
            None => {
                let top = upper
                    .floor()
                    .ok_or_else(|| "version component out of range".to_string())?;
                comparators.push(Comparator::new(Op::Le, top));
            }
        }
    }
    Ok(comparators)
}

/// Splits a hyphen range into its two ends
pub(crate) fn split_hyphen(text: &str) -> Option<(&str, &str)> {
    let (lower, upper) = text.split_once(" - ")?;
    let (lower, upper) = (lower.trim(), upper.trim());
    if lower.is_empty() || upper.is_empty() || lower.contains(' ') || upper.contains(' ') {
        return None;
    }
    Some((lower, upper))
}

/// Splits one alternative into `(operator, version)` clause strings
///
/// Operators separated from their version by whitespace are re-attached,
/// and commas are accepted as AND separators.
pub(crate) fn split_clauses(text: &str) -> Vec<(String, String)> {
    let normalized = text.replace(',', " ");
    let mut clauses = Vec::new();
    let mut pending_op: Option<String> = None;

    for token in normalized.split_whitespace() {
        if OPERATOR_RE.is_match(token) || token == "≥" || token == "≤" {
            pending_op = Some(token.to_string());
            continue;
        }
        let token = match pending_op.take() {
            Some(op) => format!("{}{}", op, token),
            None => token.to_string(),
        };
        clauses.push(split_operator(&token));
    }
    if let Some(op) = pending_op {
        clauses.push((op, String::new()));
    }
    clauses
}

/// Splits `>=1.2.3` into `(">=", "1.2.3")`
pub(crate) fn split_operator(clause: &str) -> (String, String) {
    match CLAUSE_RE.captures(clause.trim()) {
        Some(caps) => (
            caps.get(1).map(|m| m.as_str()).unwrap_or("").to_string(),
            caps[2].trim().to_string(),
        ),
        None => (String::new(), clause.trim().to_string()),
    }
}

fn parse_alternative(dialect: &NodeDialect, text: &str) -> Result<Vec<Comparator>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    if let Some((lower, upper)) = split_hyphen(text) {
        return expand_hyphen(lower, upper);
    }

    let mut comparators = Vec::new();
    for (op, version) in split_clauses(text) {
        if version.is_empty() {
            return Err(format!("operator '{}' without a version", op));
        }
        let partial =
            Partial::parse(&version).ok_or_else(|| format!("invalid version '{}'", version))?;
        comparators.extend(expand(&op, &partial, dialect.bare, dialect.caret)?);
    }
    Ok(comparators)
}

/// Returns true if `text` names a dist-tag rather than a version or range
pub fn is_dist_tag(text: &str) -> bool {
    let mut chars = text.chars();
    let versionlike = matches!(chars.next(), Some('v' | 'V' | 'x' | 'X'))
        && chars.next().map_or(true, |c| c.is_ascii_digit() || c == '.');
    DIST_TAG_RE.is_match(text) && !versionlike
}

/// Parses requirement text under `dialect`
pub(crate) fn parse(dialect: &NodeDialect, text: Option<&str>) -> Result<VersionReq, String> {
    let text = match text.map(str::trim) {
        None | Some("") | Some("*") => return Ok(VersionReq::any()),
        Some(text) => text,
    };
    if dialect.any_keyword == Some(text) {
        return Ok(VersionReq::any());
    }
    // The tag's target is only known from registry metadata
    if dialect.dist_tags && is_dist_tag(text) {
        return Ok(VersionReq::any());
    }

    let alternatives: Vec<&str> = if text.contains("||") {
        if !dialect.or_operator {
            return Err("'||' is not supported here".to_string());
        }
        text.split("||").collect()
    } else {
        vec![text]
    };

    let alternatives = alternatives
        .into_iter()
        .map(|alternative| parse_alternative(dialect, alternative))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(VersionReq::new(alternatives, PrereleasePolicy::SameTuple))
}
