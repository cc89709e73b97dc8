//! Release cooldown configuration
//!
//! A release must be at least N days old before it becomes a candidate. N is
//! chosen by the size of the step from the current version.

use crate::scheme::BumpKind;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Minimum release ages, bucketed by bump size
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    /// Fallback threshold, also used when the current version is unknown
    pub default_days: u32,
    /// Threshold for major bumps (0 falls back to `default_days`)
    pub semver_major_days: u32,
    /// Threshold for minor bumps
    pub semver_minor_days: u32,
    /// Threshold for patch bumps
    pub semver_patch_days: u32,
    /// Dependency name patterns to apply the cooldown to (empty means all)
    pub include: Vec<String>,
    /// Dependency name patterns exempt from the cooldown
    pub exclude: Vec<String>,
}

impl CooldownConfig {
    /// Create a cooldown with the same threshold for every bucket
    pub fn new(default_days: u32) -> Self {
        Self {
            default_days,
            ..Self::default()
        }
    }

    /// Set the major bump threshold (builder pattern)
    pub fn with_major_days(mut self, days: u32) -> Self {
        self.semver_major_days = days;
        self
    }

    /// Set the minor bump threshold (builder pattern)
    pub fn with_minor_days(mut self, days: u32) -> Self {
        self.semver_minor_days = days;
        self
    }

    /// Set the patch bump threshold (builder pattern)
    pub fn with_patch_days(mut self, days: u32) -> Self {
        self.semver_patch_days = days;
        self
    }

    /// Limit the cooldown to matching dependency names (builder pattern)
    pub fn with_include(mut self, patterns: Vec<String>) -> Self {
        self.include = patterns;
        self
    }

    /// Exempt matching dependency names (builder pattern)
    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }

    /// Check if the cooldown applies to a dependency (exclude wins)
    pub fn applies_to(&self, name: &str) -> bool {
        if self.exclude.iter().any(|p| wildcard_match(p, name)) {
            return false;
        }
        if self.include.is_empty() {
            return true;
        }
        self.include.iter().any(|p| wildcard_match(p, name))
    }

    /// Threshold in days for a bump of the given size
    ///
    /// `None` means the current version is unknown. A zero bucket falls back
    /// to `default_days`.
    pub fn days_for(&self, bump: Option<BumpKind>) -> u32 {
        let bucket = match bump {
            Some(BumpKind::Major) => self.semver_major_days,
            Some(BumpKind::Minor) => self.semver_minor_days,
            Some(BumpKind::Patch) => self.semver_patch_days,
            None => 0,
        };
        if bucket == 0 {
            self.default_days
        } else {
            bucket
        }
    }

    /// Returns true if a release is too young to be a candidate
    pub fn is_cooling(
        &self,
        released_at: Option<DateTime<Utc>>,
        bump: Option<BumpKind>,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(released_at) = released_at else {
            return false;
        };
        let days = self.days_for(bump);
        if days == 0 {
            return false;
        }
        released_at > now - Duration::days(i64::from(days))
    }

    /// Returns true if no bucket holds anything back
    pub fn is_disabled(&self) -> bool {
        self.default_days == 0
            && self.semver_major_days == 0
            && self.semver_minor_days == 0
            && self.semver_patch_days == 0
    }
}

/// Matches a name against a pattern where `*` matches any run of characters
fn wildcard_match(pattern: &str, name: &str) -> bool {
    let regex = format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"));
    Regex::new(&regex).is_ok_and(|re| re.is_match(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_cooldown() {
        let cooldown = CooldownConfig::new(7);
        assert_eq!(cooldown.default_days, 7);
        assert!(cooldown.include.is_empty());
        assert!(cooldown.exclude.is_empty());
        assert!(!cooldown.is_disabled());
        assert!(CooldownConfig::default().is_disabled());
    }

    #[rstest]
    #[case(Some(BumpKind::Major), 30)]
    #[case(Some(BumpKind::Minor), 14)]
    #[case(Some(BumpKind::Patch), 3)]
    #[case(None, 3)]
    fn test_days_for_bucket(#[case] bump: Option<BumpKind>, #[case] expected: u32) {
        let cooldown = CooldownConfig::new(3)
            .with_major_days(30)
            .with_minor_days(14);
        assert_eq!(cooldown.days_for(bump), expected);
    }

    #[test]
    fn test_is_cooling() {
        let now = fixed_time();
        let cooldown = CooldownConfig::new(7);

        let recent = Some(now - Duration::days(3));
        let old = Some(now - Duration::days(10));

        assert!(cooldown.is_cooling(recent, Some(BumpKind::Patch), now));
        assert!(!cooldown.is_cooling(old, Some(BumpKind::Patch), now));
        assert!(!cooldown.is_cooling(None, Some(BumpKind::Patch), now));
    }

    #[rstest]
    #[case(vec![], vec![], "lodash", true)]
    #[case(vec!["@types/*"], vec![], "@types/node", true)]
    #[case(vec!["@types/*"], vec![], "lodash", false)]
    #[case(vec![], vec!["lodash"], "lodash", false)]
    #[case(vec!["*"], vec!["react*"], "react-dom", false)]
    #[case(vec!["*"], vec!["react*"], "vue", true)]
    fn test_applies_to(
        #[case] include: Vec<&str>,
        #[case] exclude: Vec<&str>,
        #[case] name: &str,
        #[case] expected: bool,
    ) {
        let cooldown = CooldownConfig::new(7)
            .with_include(include.into_iter().map(String::from).collect())
            .with_exclude(exclude.into_iter().map(String::from).collect());
        assert_eq!(cooldown.applies_to(name), expected);
    }

    #[test]
    fn test_deserialize_partial() {
        let cooldown: CooldownConfig = toml::from_str("default_days = 5\nexclude = [\"internal-*\"]").unwrap();
        assert_eq!(cooldown.default_days, 5);
        assert_eq!(cooldown.semver_major_days, 0);
        assert!(!cooldown.applies_to("internal-tools"));
    }
}
