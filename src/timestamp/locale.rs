//! Locale tables consumed by the format compiler.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::FormatError;

const MONTH_KEYS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

const MONTH_SHORT_KEYS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const WEEKDAY_KEYS: [&str; 7] = [
    "sunday", "monday", "tuesday", "wednesday", "thursday", "friday", "saturday",
];

const WEEKDAY_SHORT_KEYS: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const MONTH_SHORT_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

const WEEKDAY_SHORT_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Which name table a name code draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameTable {
    MonthLong,
    MonthShort,
    MonthGenitive,
    WeekdayLong,
    WeekdayShort,
}

/// Locale data for one site: digits, timezone labels and name overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateLocale {
    /// Ten localized digit glyphs, `0` through `9`
    #[serde(default)]
    pub digits: Option<Vec<String>>,

    /// Displayed timezone abbreviation -> normalized abbreviation
    #[serde(default)]
    pub timezone_abbreviations: BTreeMap<String, String>,

    /// Month/day name overrides keyed by message key (`january`, `jan`, `january-gen`, `sun`, ...)
    #[serde(default)]
    pub messages: HashMap<String, String>,
}

impl DateLocale {
    /// English names, ASCII digits, UTC only
    pub fn english_utc() -> Self {
        Self {
            digits: None,
            timezone_abbreviations: [("UTC".to_string(), "UTC".to_string())].into_iter().collect(),
            messages: HashMap::new(),
        }
    }

    /// Validated digit glyphs, or `None` for plain ASCII digits
    pub fn digit_glyphs(&self) -> Result<Option<&[String]>, FormatError> {
        match &self.digits {
            Some(digits) if digits.len() != 10 || digits.iter().any(|d| d.is_empty()) => {
                Err(FormatError::InvalidDigits { count: digits.len() })
            }
            Some(digits) => Ok(Some(digits.as_slice())),
            None => Ok(None),
        }
    }

    /// Resolved names for a table, overrides first, English fallback
    pub fn names(&self, table: NameTable) -> Vec<String> {
        match table {
            NameTable::MonthLong => self.resolve(&MONTH_KEYS, &MONTH_NAMES),
            NameTable::MonthShort => self.resolve(&MONTH_SHORT_KEYS, &MONTH_SHORT_NAMES),
            // Genitive falls back to the full month name
            NameTable::MonthGenitive => MONTH_KEYS
                .iter()
                .zip(MONTH_NAMES.iter())
                .map(|(key, english)| {
                    self.messages
                        .get(&format!("{}-gen", key))
                        .or_else(|| self.messages.get(*key))
                        .cloned()
                        .unwrap_or_else(|| english.to_string())
                })
                .collect(),
            NameTable::WeekdayLong => self.resolve(&WEEKDAY_KEYS, &WEEKDAY_NAMES),
            NameTable::WeekdayShort => self.resolve(&WEEKDAY_SHORT_KEYS, &WEEKDAY_SHORT_NAMES),
        }
    }

    fn resolve(&self, keys: &[&str], fallback: &[&str]) -> Vec<String> {
        keys.iter()
            .zip(fallback.iter())
            .map(|(key, english)| {
                self.messages
                    .get(*key)
                    .cloned()
                    .unwrap_or_else(|| english.to_string())
            })
            .collect()
    }

    /// Displayed label for a normalized abbreviation (first match in key order)
    pub fn displayed_abbreviation(&self, normalized: &str) -> Option<&str> {
        self.timezone_abbreviations
            .iter()
            .find(|(_, value)| value.as_str() == normalized)
            .map(|(key, _)| key.as_str())
    }

    /// Stable string identifying this locale, used as part of the cache key
    pub fn fingerprint(&self) -> String {
        let mut out = String::new();
        if let Some(digits) = &self.digits {
            out.push_str(&digits.concat());
        }
        out.push('\u{1F}');
        for (k, v) in &self.timezone_abbreviations {
            let _ = write!(out, "{}={};", k, v);
        }
        out.push('\u{1F}');
        let mut messages: Vec<_> = self.messages.iter().collect();
        messages.sort();
        for (k, v) in messages {
            let _ = write!(out, "{}={};", k, v);
        }
        out
    }
}
