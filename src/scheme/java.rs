//! Maven/Gradle versions with qualifier ordering
//!
//! A version is a chain of segments. `-` and every digit/letter transition
//! open a new segment; `.` and `_` separate tokens inside one. Null tokens
//! (`0`, `ga`, `final`, `release`) are dropped from the end of each
//! segment, so `1.0.0-alpha == 1-alpha` and `1-ga-1 == 1-1`. Qualifiers rank:
//!
//! dev < alpha < beta < milestone < rc < snapshot < (release) < sp < unknown
//!
//! Numbers rank above every qualifier at the same position and `+` ranks
//! above everything. Where one side has a token and the other starts its
//! next segment, a number wins and a qualifier loses (`1.foo < 1-foo < 1-1 < 1.1`).

use super::Version;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z][0-9A-Za-z._+-]*$").unwrap());

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-?(\d{2})-?(\d{2})$").unwrap());

const RELEASE_RANK: u8 = 6;
const UNKNOWN_RANK: u8 = 8;

fn qualifier_rank(name: &str) -> u8 {
    match name {
        "dev" => 0,
        "alpha" | "a" => 1,
        "beta" | "b" => 2,
        "milestone" | "m" => 3,
        "rc" | "cr" | "pr" | "pre" | "preview" | "eap" => 4,
        "snapshot" => 5,
        "" | "ga" | "final" | "release" => RELEASE_RANK,
        "sp" => 7,
        _ => UNKNOWN_RANK,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// Digits with leading zeros removed
    Number(String),
    Qualifier { rank: u8, name: String },
    Plus,
}

impl Token {
    fn number(digits: &str) -> Self {
        let trimmed = digits.trim_start_matches('0');
        Token::Number(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
    }

    fn qualifier(name: &str) -> Self {
        Token::Qualifier {
            rank: qualifier_rank(name),
            name: name.to_string(),
        }
    }

    fn is_null(&self) -> bool {
        match self {
            Token::Number(n) => n == "0",
            Token::Qualifier { rank, .. } => *rank == RELEASE_RANK,
            Token::Plus => false,
        }
    }

    fn is_prerelease(&self) -> bool {
        matches!(self, Token::Qualifier { rank, .. } if *rank < RELEASE_RANK)
    }

    fn cmp_token(&self, other: &Token) -> Ordering {
        match (self, other) {
            (Token::Plus, Token::Plus) => Ordering::Equal,
            (Token::Plus, _) => Ordering::Greater,
            (_, Token::Plus) => Ordering::Less,
            (Token::Number(a), Token::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Token::Number(_), Token::Qualifier { .. }) => Ordering::Greater,
            (Token::Qualifier { .. }, Token::Number(_)) => Ordering::Less,
            (
                Token::Qualifier { rank: ra, name: na },
                Token::Qualifier { rank: rb, name: nb },
            ) => ra.cmp(rb).then_with(|| {
                if *ra == UNKNOWN_RANK {
                    na.cmp(nb)
                } else {
                    Ordering::Equal
                }
            }),
        }
    }

    /// Compares a token against the other side's end of segment
    fn cmp_absent(&self, other_continues: bool) -> Ordering {
        match self {
            Token::Plus => Ordering::Greater,
            Token::Number(_) if other_continues => Ordering::Greater,
            Token::Qualifier { .. } if other_continues => Ordering::Less,
            Token::Number(n) if n == "0" => Ordering::Equal,
            Token::Number(_) => Ordering::Greater,
            Token::Qualifier { rank, .. } => rank.cmp(&RELEASE_RANK),
        }
    }
}

/// Tokens up to the next `-` or transition, followed by the rest
#[derive(Debug, Clone, Default)]
struct Segment {
    tokens: Vec<Token>,
    tail: Option<Box<Segment>>,
}

impl Segment {
    fn parse(text: &str) -> Self {
        let mut segments = vec![Segment::default()];
        let mut current = String::new();

        for c in text.chars() {
            let Some(segment) = segments.last_mut() else {
                break;
            };
            match c {
                '.' | '_' => {
                    if current.is_empty() {
                        segment.tokens.push(Token::number("0"));
                    } else {
                        segment.tokens.push(Self::token(&current));
                        current.clear();
                    }
                }
                '-' => {
                    if !current.is_empty() {
                        segment.tokens.push(Self::token(&current));
                        current.clear();
                    }
                    segments.push(Segment::default());
                }
                '+' => {
                    if !current.is_empty() {
                        segment.tokens.push(Self::token(&current));
                        current.clear();
                    }
                    segment.tokens.push(Token::Plus);
                }
                _ => {
                    let switches = current
                        .chars()
                        .last()
                        .is_some_and(|last| last.is_ascii_digit() != c.is_ascii_digit());
                    if switches {
                        segment.tokens.push(Self::token(&current));
                        current.clear();
                        segments.push(Segment::default());
                    }
                    current.push(c);
                }
            }
        }
        if let Some(segment) = segments.last_mut() {
            if !current.is_empty() {
                segment.tokens.push(Self::token(&current));
            }
        }

        let mut chain = segments.pop().unwrap_or_default();
        while let Some(mut head) = segments.pop() {
            head.tail = Some(Box::new(chain));
            chain = head;
        }
        chain.normalize();
        chain
    }

    fn token(text: &str) -> Token {
        if text.as_bytes()[0].is_ascii_digit() {
            Token::number(text)
        } else {
            Token::qualifier(text)
        }
    }

    /// Drops trailing nulls here and collapses emptied segments after this one
    fn normalize(&mut self) {
        while self.tokens.last().is_some_and(Token::is_null) {
            self.tokens.pop();
        }
        if let Some(mut tail) = self.tail.take() {
            tail.normalize();
            self.tail = if tail.tokens.is_empty() {
                tail.tail
            } else {
                Some(tail)
            };
        }
    }

    fn is_prerelease(&self) -> bool {
        self.tokens.iter().any(Token::is_prerelease)
            || self.tail.as_ref().is_some_and(|tail| tail.is_prerelease())
    }

    fn cmp(&self, other: &Segment) -> Ordering {
        let len = self.tokens.len().max(other.tokens.len());
        for i in 0..len {
            let ordering = match (self.tokens.get(i), other.tokens.get(i)) {
                (Some(a), Some(b)) => a.cmp_token(b),
                (Some(a), None) => a.cmp_absent(other.tail.is_some()),
                (None, Some(b)) => b.cmp_absent(self.tail.is_some()).reverse(),
                (None, None) => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        match (&self.tail, &other.tail) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(a), None) => a.cmp(&Segment::default()),
            (None, Some(b)) => Segment::default().cmp(b),
            (None, None) => Ordering::Equal,
        }
    }
}

/// Comparison key for a Maven/Gradle version
#[derive(Debug, Clone)]
pub(crate) struct JavaVersion {
    segments: Segment,
    numeric_prefix: Vec<u64>,
    date: Option<String>,
}

impl JavaVersion {
    fn new(text: &str) -> Self {
        let lower = text.to_ascii_lowercase();
        let lower = match lower.strip_prefix('v') {
            Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest.to_string(),
            _ => lower,
        };

        let date = DATE_RE
            .captures(&lower)
            .map(|caps| format!("{}{}{}", &caps[1], &caps[2], &caps[3]));

        Self {
            segments: Segment::parse(&lower),
            numeric_prefix: numeric_prefix(&lower),
            date,
        }
    }

    pub(crate) fn numeric_prefix(&self) -> &[u64] {
        &self.numeric_prefix
    }

    pub(crate) fn is_prerelease(&self) -> bool {
        self.segments.is_prerelease()
    }

    pub(crate) fn cmp(&self, other: &JavaVersion) -> Ordering {
        if let (Some(a), Some(b)) = (&self.date, &other.date) {
            return a.cmp(b);
        }
        self.segments.cmp(&other.segments)
    }
}

/// Leading dot-separated numeric components (`23.6-jre` gives `[23, 6]`)
fn numeric_prefix(text: &str) -> Vec<u64> {
    let mut segments = Vec::new();
    for part in text.split('.') {
        let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
        match digits.parse::<u64>() {
            Ok(n) => segments.push(n),
            Err(_) => break,
        }
        if digits.len() != part.len() {
            break;
        }
    }
    segments
}

/// Parse a Maven/Gradle version, returning `None` if the text is not one
pub(crate) fn parse(text: &str) -> Option<Version> {
    let trimmed = text.trim();
    if !VERSION_RE.is_match(trimmed) {
        return None;
    }
    Some(Version::from_java(trimmed, JavaVersion::new(trimmed)))
}
