//! Timestamp format compiler
//!
//! Compiles a site's date-format pattern plus its locale tables into:
//! - a matcher (`regex::Regex`) that finds rendered signature timestamps in wikitext
//! - a parser that turns a successful match back into an absolute instant
//! - a formatter that renders new timestamps the way the site's signatures do
//!
//! # Group alignment
//!
//! The matcher and the parser are built from the same left-to-right walk over
//! the tokenized format. Every value-bearing code contributes exactly one capture
//! group to the matcher and exactly one [`Field`] to the parser, in the same
//! order, followed by one trailing group for the timezone label.
//!
//! # Example
//!
//! ```ignore
//! use reactwiki::timestamp::{CompiledFormat, DateLocale};
//!
//! let format = CompiledFormat::compile("H:i, j M Y", &DateLocale::english_utc(), "UTC")?;
//! let parsed = format.parse("12:30, 31 Dec 2025 (UTC)");
//! ```

pub mod cache;
pub mod codes;
pub mod locale;
pub mod matcher;
pub mod parser;
pub mod render;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub use cache::FormatCache;
pub use codes::{tokenize, FormatCode};
pub use locale::{DateLocale, NameTable};
pub use matcher::compile_matcher;
pub use parser::{compile_parser, Field, ParseWarning, ParsedTimestamp, TimestampParser};
pub use render::TimestampFormatter;

/// Errors raised while compiling a date format
#[derive(Debug, Clone, Error)]
pub enum FormatError {
    #[error("Timezone abbreviation table is empty; a format needs at least one zone label")]
    EmptyTimezoneTable,

    #[error("Unknown timezone: {name}")]
    UnknownTimezone { name: String },

    #[error("Digit table must contain exactly 10 non-empty glyphs, got {count}")]
    InvalidDigits { count: usize },

    #[error("Compiled timestamp pattern is not a valid regex: {0}")]
    Regex(#[from] regex::Error),
}

/// Resolve an IANA timezone name
pub fn parse_timezone(name: &str) -> Result<Tz, FormatError> {
    name.parse::<Tz>().map_err(|_| FormatError::UnknownTimezone {
        name: name.to_string(),
    })
}

/// A timestamp found in text
#[derive(Debug, Clone, Serialize)]
pub struct TimestampMatch {
    /// Byte offset range of the whole timestamp, timezone label included
    pub range: (usize, usize),
    /// The matched text
    pub text: String,
    /// Parsed instant, `None` if the match is not a valid calendar date
    pub parsed: Option<ParsedTimestamp>,
}

/// Matcher, parser and formatter compiled from one (format, locale, timezone)
#[derive(Debug)]
pub struct CompiledFormat {
    format: String,
    matcher: Regex,
    parser: TimestampParser,
    formatter: TimestampFormatter,
}

impl CompiledFormat {
    /// Compile a format for the given locale and IANA timezone name
    pub fn compile(format: &str, locale: &DateLocale, timezone: &str) -> Result<Self, FormatError> {
        let tz = parse_timezone(timezone)?;
        let pattern = compile_matcher(format, locale)?;
        let matcher = Regex::new(&pattern)?;
        let parser = compile_parser(format, locale, tz)?;
        let formatter = TimestampFormatter::new(format, locale, tz)?;

        debug!(
            format,
            timezone,
            groups = matcher.captures_len() - 1,
            fields = parser.fields().len(),
            "Compiled timestamp format"
        );

        Ok(Self {
            format: format.to_string(),
            matcher,
            parser,
            formatter,
        })
    }

    /// The source format string
    pub fn format(&self) -> &str {
        &self.format
    }

    /// The compiled matcher
    pub fn matcher(&self) -> &Regex {
        &self.matcher
    }

    /// The compiled parser
    pub fn parser(&self) -> &TimestampParser {
        &self.parser
    }

    /// Parse the first timestamp found in `text`
    pub fn parse(&self, text: &str) -> Option<ParsedTimestamp> {
        let caps = self.matcher.captures(text)?;
        self.parser.parse(&caps)
    }

    /// Every timestamp in `text`, in document order
    pub fn find_all(&self, text: &str) -> Vec<TimestampMatch> {
        self.matcher
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some(TimestampMatch {
                    range: (whole.start(), whole.end()),
                    text: whole.as_str().to_string(),
                    parsed: self.parser.parse(&caps),
                })
            })
            .collect()
    }

    /// Render an instant as a signature timestamp, timezone label included
    pub fn render(&self, instant: DateTime<Utc>) -> String {
        self.formatter.render(instant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_compile_and_parse_english() {
        let format = CompiledFormat::compile("H:i, j M Y", &DateLocale::english_utc(), "UTC").unwrap();
        let parsed = format.parse("Signed 12:30, 31 Dec 2025 (UTC)").unwrap();
        assert_eq!(parsed.instant, Utc.with_ymd_and_hms(2025, 12, 31, 12, 30, 0).unwrap());
        assert!(parsed.warning.is_none());
    }

    #[test]
    fn test_unknown_timezone() {
        let result = CompiledFormat::compile("H:i", &DateLocale::english_utc(), "Mars/Olympus");
        assert!(matches!(result, Err(FormatError::UnknownTimezone { .. })));
    }

    #[test]
    fn test_find_all_in_order() {
        let format = CompiledFormat::compile("H:i, j M Y", &DateLocale::english_utc(), "UTC").unwrap();
        let text = "a 10:00, 1 Jan 2024 (UTC) b 11:00, 2 Jan 2024 (UTC)";
        let found = format.find_all(text);
        assert_eq!(found.len(), 2);
        assert!(found[0].range.0 < found[1].range.0);
        assert_eq!(found[1].text, "11:00, 2 Jan 2024 (UTC)");
        assert_eq!(&text[found[0].range.0..found[0].range.1], "10:00, 1 Jan 2024 (UTC)");
    }

    #[test]
    fn test_invalid_calendar_date_parses_to_none() {
        let format = CompiledFormat::compile("H:i, j M Y", &DateLocale::english_utc(), "UTC").unwrap();
        assert!(format.parse("10:00, 31 Feb 2024 (UTC)").is_none());
        // Still found by the matcher
        assert_eq!(format.find_all("10:00, 31 Feb 2024 (UTC)").len(), 1);
    }
}
