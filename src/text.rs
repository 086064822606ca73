use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// A full name split into its given-name and surname parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Splits a single full-name field into first and last name.
///
/// Western name order treats the last whitespace-separated token as the
/// surname and everything before it as the given name. Locales with
/// family-name-first order (currently Hungarian) split on the first token
/// instead. A single token becomes the first name, an empty field neither.
pub fn parse_full_name(full_name: &str, locale: &str) -> NameParts {
    let tokens: Vec<&str> = full_name.split_whitespace().collect();
    match tokens.len() {
        0 => NameParts::default(),
        1 => NameParts {
            first_name: Some(tokens[0].to_string()),
            last_name: None,
        },
        _ if family_name_first(locale) => NameParts {
            first_name: Some(tokens[1..].join(" ")),
            last_name: Some(tokens[0].to_string()),
        },
        _ => NameParts {
            first_name: Some(tokens[..tokens.len() - 1].join(" ")),
            last_name: Some(tokens[tokens.len() - 1].to_string()),
        },
    }
}

fn family_name_first(locale: &str) -> bool {
    locale.starts_with("hu")
}

/// Splits a multi-value phone field on the given delimiters, trimming each
/// fragment and discarding empty ones.
pub fn split_phone_numbers(raw: &str, delimiters: &[char]) -> Vec<String> {
    raw.split(|c| delimiters.contains(&c))
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalizes a phone field to a single comma-joined value, or `None` when
/// nothing usable remains.
pub fn normalize_phone_field(raw: &str, delimiters: &[char]) -> Option<String> {
    let numbers = split_phone_numbers(raw, delimiters);
    if numbers.is_empty() {
        None
    } else {
        Some(numbers.join(", "))
    }
}

pub fn is_valid_email(address: &str) -> bool {
    EMAIL_PATTERN.is_match(address.trim())
}

/// Splits a ';'-delimited "set" option field into its non-empty values.
pub fn split_set_field(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses a date in any of the formats desktop exports have been seen to use.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m-%d-%Y"))
        .ok()
}

/// Parses a timestamp, accepting date-only values as midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .ok()
        .or_else(|| parse_day(raw).and_then(|day| day.and_hms_opt(0, 0, 0)))
}
