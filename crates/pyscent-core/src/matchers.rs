//! Candidate-word matching strategies for completion filtering.
//!
//! Each strategy is a predicate factory: given the partial word the user has
//! typed (the base), it returns a closure that decides per candidate word.
//! The closure captures everything derived from the base up front, so per
//! candidate work stays cheap.
//!
//! ## Strategies
//!
//! - `case-sensitive` / `case-insensitive`: plain prefix checks
//! - `camel-case` / `camel-case-sensitive`: the base's camel groups must
//!   prefix-match the candidate's groups pairwise
//! - `smartass`: the base's letters must appear in order across the
//!   candidate's camel groups
//! - `fuzzy-cs` / `fuzzy-ci`: the base's characters must appear in order
//!   anywhere in the candidate, starting from the front

use regex::RegexBuilder;

// ============================================================================
// Camel grouping
// ============================================================================

/// Split a word into camel groups.
///
/// A group is one unconditional leading character plus the longest following
/// run that stays lowercase alphanumeric. Uppercase letters start a new
/// group; an underscore attaches to the group it introduces.
pub fn camel_groups(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut groups = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let rest = &chars[start..];
        let limit = rest.len();
        let mut i = 0;
        while i < limit {
            if i > 0 && !span_is_lower_alnum(&rest[1..i + 1]) {
                break;
            }
            i += 1;
        }
        groups.push(rest[..i].iter().collect());
        start += i;
    }
    groups
}

/// True when the span is wholly alphanumeric, contains no uppercase, and has
/// at least one lowercase character.
fn span_is_lower_alnum(span: &[char]) -> bool {
    let mut has_cased = false;
    for &c in span {
        if !c.is_alphanumeric() || c.is_uppercase() {
            return false;
        }
        if c.is_lowercase() {
            has_cased = true;
        }
    }
    has_cased
}

// ============================================================================
// Match modes
// ============================================================================

/// Matching strategy selected by name. Unrecognized names fall back to
/// case-insensitive prefix matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    CaseSensitive,
    #[default]
    CaseInsensitive,
    CamelCase,
    CamelCaseSensitive,
    Smartass,
    FuzzyCi,
    FuzzyCs,
}

impl MatchMode {
    pub fn from_name(name: &str) -> MatchMode {
        match name {
            "case-sensitive" => MatchMode::CaseSensitive,
            "case-insensitive" => MatchMode::CaseInsensitive,
            "camel-case" => MatchMode::CamelCase,
            "camel-case-sensitive" => MatchMode::CamelCaseSensitive,
            "smartass" => MatchMode::Smartass,
            "fuzzy-ci" => MatchMode::FuzzyCi,
            "fuzzy-cs" => MatchMode::FuzzyCs,
            _ => MatchMode::CaseInsensitive,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::CaseSensitive => "case-sensitive",
            MatchMode::CaseInsensitive => "case-insensitive",
            MatchMode::CamelCase => "camel-case",
            MatchMode::CamelCaseSensitive => "camel-case-sensitive",
            MatchMode::Smartass => "smartass",
            MatchMode::FuzzyCi => "fuzzy-ci",
            MatchMode::FuzzyCs => "fuzzy-cs",
        }
    }
}

/// Predicate over candidate words, built once per completion request.
pub type MatchFn = Box<dyn Fn(&str) -> bool>;

/// Build the candidate predicate for a base under the given mode.
pub fn matcher(mode: MatchMode, base: &str) -> MatchFn {
    match mode {
        MatchMode::CaseSensitive => {
            let base = base.to_string();
            Box::new(move |word| word.starts_with(&base))
        }
        MatchMode::CaseInsensitive => {
            let base = base.to_lowercase();
            Box::new(move |word| word.to_lowercase().starts_with(&base))
        }
        MatchMode::CamelCase => {
            let base_groups: Vec<String> =
                camel_groups(base).iter().map(|g| g.to_lowercase()).collect();
            Box::new(move |word| {
                let word_groups = camel_groups(word);
                base_groups.len() <= word_groups.len()
                    && base_groups
                        .iter()
                        .zip(&word_groups)
                        .all(|(b, w)| w.to_lowercase().starts_with(b))
            })
        }
        MatchMode::CamelCaseSensitive => {
            let base_groups = camel_groups(base);
            Box::new(move |word| {
                let word_groups = camel_groups(word);
                base_groups.len() <= word_groups.len()
                    && base_groups
                        .iter()
                        .zip(&word_groups)
                        .all(|(b, w)| w.starts_with(b.as_str()))
            })
        }
        MatchMode::Smartass => {
            let reversed: Vec<char> = base.to_lowercase().chars().rev().collect();
            Box::new(move |word| {
                let mut stack = reversed.clone();
                for group in camel_groups(word) {
                    for letter in group.to_lowercase().chars() {
                        if stack.is_empty() {
                            break;
                        }
                        if stack.last() == Some(&letter) {
                            stack.pop();
                        }
                    }
                }
                stack.is_empty()
            })
        }
        MatchMode::FuzzyCs => fuzzy_matcher(base, false),
        MatchMode::FuzzyCi => fuzzy_matcher(base, true),
    }
}

/// Chain the base's characters with `.*` gaps, anchored at the front of the
/// candidate. Characters are escaped so bases containing regex syntax still
/// match literally.
fn fuzzy_matcher(base: &str, case_insensitive: bool) -> MatchFn {
    let pattern: String = base
        .chars()
        .map(|c| regex::escape(&c.to_string()))
        .collect::<Vec<_>>()
        .join(".*");
    let built = RegexBuilder::new(&format!("^{pattern}"))
        .case_insensitive(case_insensitive)
        .build();
    match built {
        Ok(regex) => Box::new(move |word| regex.is_match(word)),
        Err(_) => Box::new(|_| false),
    }
}

// ============================================================================
// Tests
// ============================================================================
