//! The 50 U.S. states and their postal abbreviations.

/// A state name paired with its two-letter abbreviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jurisdiction {
    pub name: &'static str,
    pub abbrev: &'static str,
}

const fn j(name: &'static str, abbrev: &'static str) -> Jurisdiction {
    Jurisdiction { name, abbrev }
}

/// All 50 states, alphabetical by name.
pub const US_STATES: [Jurisdiction; 50] = [
    j("Alabama", "AL"),
    j("Alaska", "AK"),
    j("Arizona", "AZ"),
    j("Arkansas", "AR"),
    j("California", "CA"),
    j("Colorado", "CO"),
    j("Connecticut", "CT"),
    j("Delaware", "DE"),
    j("Florida", "FL"),
    j("Georgia", "GA"),
    j("Hawaii", "HI"),
    j("Idaho", "ID"),
    j("Illinois", "IL"),
    j("Indiana", "IN"),
    j("Iowa", "IA"),
    j("Kansas", "KS"),
    j("Kentucky", "KY"),
    j("Louisiana", "LA"),
    j("Maine", "ME"),
    j("Maryland", "MD"),
    j("Massachusetts", "MA"),
    j("Michigan", "MI"),
    j("Minnesota", "MN"),
    j("Mississippi", "MS"),
    j("Missouri", "MO"),
    j("Montana", "MT"),
    j("Nebraska", "NE"),
    j("Nevada", "NV"),
    j("New Hampshire", "NH"),
    j("New Jersey", "NJ"),
    j("New Mexico", "NM"),
    j("New York", "NY"),
    j("North Carolina", "NC"),
    j("North Dakota", "ND"),
    j("Ohio", "OH"),
    j("Oklahoma", "OK"),
    j("Oregon", "OR"),
    j("Pennsylvania", "PA"),
    j("Rhode Island", "RI"),
    j("South Carolina", "SC"),
    j("South Dakota", "SD"),
    j("Tennessee", "TN"),
    j("Texas", "TX"),
    j("Utah", "UT"),
    j("Vermont", "VT"),
    j("Virginia", "VA"),
    j("Washington", "WA"),
    j("West Virginia", "WV"),
    j("Wisconsin", "WI"),
    j("Wyoming", "WY"),
];

/// Number of states processed when no explicit list is configured.
pub const DEFAULT_DEMO_STATES: usize = 10;

/// Find a state by full name or abbreviation, ignoring case and surrounding
/// whitespace.
#[must_use]
pub fn lookup(name_or_abbrev: &str) -> Option<Jurisdiction> {
    let needle = name_or_abbrev.trim();
    US_STATES.iter().copied().find(|state| {
        state.name.eq_ignore_ascii_case(needle) || state.abbrev.eq_ignore_ascii_case(needle)
    })
}

/// Abbreviation for a state name; unknown names fall back to their first two
/// letters upper-cased.
#[must_use]
pub fn abbrev_for(name: &str) -> String {
    lookup(name).map_or_else(
        || name.trim().chars().take(2).collect::<String>().to_uppercase(),
        |state| state.abbrev.to_string(),
    )
}

/// The default demonstration subset: the first ten states alphabetically.
#[must_use]
pub fn demo_states() -> &'static [Jurisdiction] {
    &US_STATES[..DEFAULT_DEMO_STATES]
}

/// File-name stem for a state (`New_York`). Anything but ASCII letters,
/// digits, `_` and `-` becomes `_`, so the stem never leaves its directory.
#[must_use]
pub fn file_stem(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
