//! Quality checks for objective text and test metadata.
//!
//! Every check returns a list of issues and never fails. An empty list means
//! the item is clean; callers decide what a non-empty list does to the
//! validation status.

use std::fmt;

use serde::Serialize;

use certdb_core::drafts::{NewObjective, NewTest};
use certdb_core::enums::ValidationStatus;

/// Objectives with fewer words are reported as too short.
pub const MIN_WORDS: usize = 6;

/// Matched as case-insensitive substrings, so `"develops"` and
/// `"development"` both count for `"develop"`.
pub const ACTION_VERBS: &[&str] = &[
    "understand",
    "demonstrate",
    "apply",
    "analyze",
    "evaluate",
    "identify",
    "explain",
    "describe",
    "compare",
    "create",
    "develop",
    "design",
    "implement",
    "use",
    "integrate",
    "teach",
    "assess",
    "plan",
    "collaborate",
    "communicate",
    "construct",
];

pub const BOILERPLATE_PHRASES: &[&str] = &[
    "click here",
    "read more",
    "download",
    "next page",
    "table of contents",
    "copyright",
    "all rights reserved",
];

/// Navigation fragments removed from discovered text wherever they appear.
const NAVIGATION_PHRASES: &[&str] = &["click here", "read more", "download", "next page"];

/// Everything from the first of these markers to the end of the text is dropped.
const TRAILER_MARKERS: &[&str] = &["copyright", "\u{a9}", "all rights reserved"];

pub const RECOGNIZED_PROVIDERS: &[&str] = &["ETS", "Pearson", "State DOE", "edTPA", "NES", "Unknown"];

const AUTHORITATIVE_HOST_PATTERNS: &[&str] = &[
    ".gov",
    ".edu",
    "ets.org",
    "pearson.com",
    "nesinc.com",
    "edtpa.com",
    "act.org",
    "state.",
    "doe.",
    "education.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveIssue {
    TooShort,
    MissingActionVerb,
    Boilerplate,
    MissingRationale,
    ConfidenceOutOfRange,
}

impl ObjectiveIssue {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TooShort => "too short",
            Self::MissingActionVerb => "missing action verb",
            Self::Boilerplate => "boilerplate",
            Self::MissingRationale => "missing rationale",
            Self::ConfidenceOutOfRange => "confidence out of range",
        }
    }
}

impl fmt::Display for ObjectiveIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum TestIssue {
    MissingTestName,
    TestNameTooShort,
    MissingTestSystem,
    MalformedUrl(String),
    NonAuthoritativeDomain(String),
    UnrecognizedProvider(String),
}

impl fmt::Display for TestIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTestName => f.write_str("missing test name"),
            Self::TestNameTooShort => f.write_str("test name too short"),
            Self::MissingTestSystem => f.write_str("missing test system"),
            Self::MalformedUrl(url) => write!(f, "malformed source url: {url}"),
            Self::NonAuthoritativeDomain(host) => write!(f, "non-authoritative domain: {host}"),
            Self::UnrecognizedProvider(p) => write!(f, "unrecognized provider: {p}"),
        }
    }
}

/// Check one objective's text: length, then action verb, then boilerplate.
#[must_use]
pub fn validate_objective(text: &str) -> Vec<ObjectiveIssue> {
    let mut issues = Vec::new();
    let lower = text.to_lowercase();

    if text.split_whitespace().count() < MIN_WORDS {
        issues.push(ObjectiveIssue::TooShort);
    }
    if !ACTION_VERBS.iter().any(|verb| lower.contains(verb)) {
        issues.push(ObjectiveIssue::MissingActionVerb);
    }
    if BOILERPLATE_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        issues.push(ObjectiveIssue::Boilerplate);
    }
    issues
}

/// Text checks plus the extra requirements on inferred objectives: a
/// non-empty rationale and a confidence inside `[0, 1]`.
#[must_use]
pub fn validate_draft(objective: &NewObjective) -> Vec<ObjectiveIssue> {
    let mut issues = validate_objective(&objective.text);
    if objective.is_inferred {
        if objective
            .rationale
            .as_deref()
            .is_none_or(|r| r.trim().is_empty())
        {
            issues.push(ObjectiveIssue::MissingRationale);
        }
        if !(0.0..=1.0).contains(&objective.confidence) {
            issues.push(ObjectiveIssue::ConfidenceOutOfRange);
        }
    }
    issues
}

/// Validate `objective` in place. Clean drafts keep their status; any issue
/// marks the draft `flagged` and records the issues as validator notes.
pub fn apply_validation(objective: &mut NewObjective) -> Vec<ObjectiveIssue> {
    let issues = validate_draft(objective);
    if !issues.is_empty() {
        objective.validation_status = ValidationStatus::Flagged;
        objective.validator_notes = Some(join_issues(&issues));
    }
    issues
}

/// Join issues into validator notes (`"too short; boilerplate"`).
#[must_use]
pub fn join_issues<T: fmt::Display>(issues: &[T]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check a test's metadata. A bad URL or provider never blocks persistence.
#[must_use]
pub fn validate_test(test: &NewTest) -> Vec<TestIssue> {
    let mut issues = Vec::new();

    let name = test.test_name.trim();
    if name.is_empty() {
        issues.push(TestIssue::MissingTestName);
    } else if name.chars().count() < 3 {
        issues.push(TestIssue::TestNameTooShort);
    }
    if test.test_system.trim().is_empty() {
        issues.push(TestIssue::MissingTestSystem);
    }

    if let Some(url) = test.official_source_url.as_deref().filter(|u| !u.trim().is_empty()) {
        match url_host(url) {
            Some(host) if !is_authoritative_host(host) => {
                issues.push(TestIssue::NonAuthoritativeDomain(host.to_string()));
            }
            Some(_) => {}
            None => issues.push(TestIssue::MalformedUrl(url.to_string())),
        }
    }

    let provider = test.provider.trim();
    if !provider.is_empty() && !RECOGNIZED_PROVIDERS.contains(&provider) {
        issues.push(TestIssue::UnrecognizedProvider(provider.to_string()));
    }
    issues
}

/// Host part of an absolute URL, or `None` when the scheme or host is missing.
#[must_use]
pub fn url_host(url: &str) -> Option<&str> {
    let (scheme, rest) = url.trim().split_once("://")?;
    let mut scheme_chars = scheme.chars();
    if !scheme_chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        || !scheme_chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return None;
    }

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = if host_port.starts_with('[') {
        host_port.split_inclusive(']').next().unwrap_or_default()
    } else {
        host_port.split(':').next().unwrap_or_default()
    };
    if host.is_empty() || host.chars().any(char::is_whitespace) {
        None
    } else {
        Some(host)
    }
}

#[must_use]
pub fn is_authoritative_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    AUTHORITATIVE_HOST_PATTERNS
        .iter()
        .any(|pattern| host.contains(pattern))
}

/// Strip navigation fragments and copyright trailers from discovered text
/// and collapse whitespace.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let mut text = text.to_string();

    if let Some(cut) = TRAILER_MARKERS
        .iter()
        .filter_map(|marker| find_ignore_ascii_case(&text, marker))
        .min()
    {
        text.truncate(cut);
    }

    for phrase in NAVIGATION_PHRASES {
        while let Some(at) = find_ignore_ascii_case(&text, phrase) {
            text.replace_range(at..at + phrase.len(), " ");
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    if !needle.is_ascii() {
        return haystack.find(needle);
    }
    let needle = needle.as_bytes();
    haystack
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| {
            haystack
                .as_bytes()
                .get(i..i + needle.len())
                .is_some_and(|window| window.eq_ignore_ascii_case(needle))
        })
}
