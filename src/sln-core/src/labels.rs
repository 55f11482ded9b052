//! Code-to-label lookups
//!
//! Each lookup is total: codes outside its table resolve to `None` (an absent
//! label) instead of failing. Matching is exact and case-sensitive.

/// Experience level codes in seniority order
pub const EXPERIENCE_LEVELS: [(&str, &str); 4] = [
    ("EN", "Entry-level"),
    ("MI", "Mid-level"),
    ("SE", "Senior-level"),
    ("EX", "Executive-level"),
];

/// Remote ratios and their work arrangement
pub const REMOTE_TYPES: [(i64, &str); 3] = [
    (0, "No Remote"),
    (50, "Partially Remote"),
    (100, "Fully Remote"),
];

/// Company locations that get a display name
pub const COUNTRIES: [(&str, &str); 13] = [
    ("US", "United States"),
    ("GB", "United Kingdom"),
    ("CA", "Canada"),
    ("DE", "Germany"),
    ("IN", "India"),
    ("FR", "France"),
    ("ES", "Spain"),
    ("BR", "Brazil"),
    ("AU", "Australia"),
    ("JP", "Japan"),
    ("CN", "China"),
    ("SG", "Singapore"),
    ("NL", "Netherlands"),
];

/// Employment type codes
pub const EMPLOYMENT_TYPES: [(&str, &str); 4] = [
    ("FT", "Full-Time"),
    ("PT", "Part-Time"),
    ("CT", "Contract"),
    ("FL", "Freelance"),
];

fn lookup(table: &[(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(code, _)| *code == key)
        .map(|(_, label)| *label)
}

/// Label for an experience level code (`EN` → `Entry-level`)
#[must_use]
pub fn experience_level(code: &str) -> Option<&'static str> {
    lookup(&EXPERIENCE_LEVELS, code)
}

/// Label for a remote ratio (`50` → `Partially Remote`)
#[must_use]
pub fn remote_type(ratio: i64) -> Option<&'static str> {
    REMOTE_TYPES
        .iter()
        .find(|(value, _)| *value == ratio)
        .map(|(_, label)| *label)
}

/// Country name for a company location code
#[must_use]
pub fn country(code: &str) -> Option<&'static str> {
    lookup(&COUNTRIES, code)
}

/// Label for an employment type code (`FT` → `Full-Time`)
#[must_use]
pub fn employment_type(code: &str) -> Option<&'static str> {
    lookup(&EMPLOYMENT_TYPES, code)
}

/// Position of an experience label in seniority order, if it is one
#[must_use]
pub fn seniority_rank(label: &str) -> Option<usize> {
    EXPERIENCE_LEVELS.iter().position(|(_, l)| *l == label)
}
