//! Semver-like versions (npm, Cargo, Pub, Julia)
//!
//! Accepts one to three numeric components, an optional pre-release after
//! `-` and optional build metadata after `+`. Missing components are padded
//! with zeros for ordering but remembered for display and rewriting.

use super::Version;
use regex::Regex;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:-([0-9A-Za-z.-]+))?(?:\+([0-9A-Za-z.-]+))?$")
        .unwrap()
});

/// Strips surrounding whitespace and a leading `=` or `v`
pub(crate) fn canonicalize(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_prefix('=').unwrap_or(trimmed).trim_start();
    trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed)
}

/// Parse a semantic version, returning `None` if the text is not one
pub(crate) fn parse(text: &str) -> Option<Version> {
    let canonical = canonicalize(text);
    let caps = VERSION_RE.captures(canonical)?;

    let component = |index: usize| -> Option<Option<u64>> {
        match caps.get(index) {
            Some(m) => m.as_str().parse::<u64>().ok().map(Some),
            None => Some(None),
        }
    };

    let major = component(1)??;
    let minor = component(2)?;
    let patch = component(3)?;
    let precision = 1 + usize::from(minor.is_some()) + usize::from(patch.is_some());

    let mut version = semver::Version::new(major, minor.unwrap_or(0), patch.unwrap_or(0));
    if let Some(pre) = caps.get(4) {
        version.pre = semver::Prerelease::new(pre.as_str()).ok()?;
    }
    if let Some(build) = caps.get(5) {
        version.build = semver::BuildMetadata::new(build.as_str()).ok()?;
    }

    Some(Version::from_semver(canonical, version, precision))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.2.3", "1.2.3")]
    #[case("v1.2.3", "1.2.3")]
    #[case("=1.2.3", "1.2.3")]
    #[case(" 1.2 ", "1.2")]
    #[case("1", "1")]
    #[case("1.2.3-beta.1", "1.2.3-beta.1")]
    #[case("1.2.3-canary-52684925-20251110", "1.2.3-canary-52684925-20251110")]
    #[case("1.0.0+20130313144700", "1.0.0+20130313144700")]
    fn test_parse_valid(#[case] input: &str, #[case] canonical: &str) {
        let version = parse(input).unwrap();
        assert_eq!(version.as_str(), canonical);
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("1.2.3.4")]
    #[case("1.2.x")]
    #[case("^1.2.3")]
    #[case("1.2.3-01")]
    #[case("1.2.3-")]
    fn test_parse_invalid(#[case] input: &str) {
        assert!(parse(input).is_none(), "{} should be invalid", input);
    }

    #[rstest]
    #[case("1.0.0", "2.0.0")]
    #[case("1.9.0", "1.10.0")]
    #[case("0.9.1", "0.13.0")]
    #[case("1.0.0-alpha", "1.0.0")]
    #[case("1.0.0-alpha", "1.0.0-alpha.1")]
    #[case("1.0.0-beta.2", "1.0.0-beta.11")]
    #[case("1.0.0-rc.1", "1.0.0")]
    fn test_ordering(#[case] lower: &str, #[case] higher: &str) {
        assert!(parse(lower).unwrap() < parse(higher).unwrap());
    }

    #[test]
    fn test_prerelease_detection() {
        assert!(parse("19.3.0-canary-123").unwrap().is_prerelease());
        assert!(!parse("19.3.0").unwrap().is_prerelease());
        assert!(!parse("1.0.0+build").unwrap().is_prerelease());
    }
}
