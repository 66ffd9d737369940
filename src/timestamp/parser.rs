//! Match -> instant conversion.
//!
//! The parser walks the format in the same order as the matcher and records one
//! [`Field`] per value code. Capture group `N + 1` always holds field `N`; the
//! group after the last field holds the displayed timezone label.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::{OffsetName, Tz};
use regex::Captures;
use serde::Serialize;
use tracing::warn;

use super::codes::{tokenize, FormatCode};
use super::locale::{DateLocale, NameTable};
use super::FormatError;

/// Semantic role of one capture group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Day,
    Month,
    MonthName(NameTable),
    Year,
    ThaiYear,
    Hour,
    Minute,
    Second,
    Weekday,
}

/// Non-fatal issue attached to a successful parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseWarning {
    /// Local time was ambiguous across a DST change; the later instant was chosen
    AmbiguousDst,
    /// The zone label in the text does not match the zone in effect at that time
    WrongAbbreviation,
}

/// A parsed timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedTimestamp {
    pub instant: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<ParseWarning>,
}

/// Parser compiled from a format; see [`compile_parser`]
#[derive(Debug, Clone)]
pub struct TimestampParser {
    fields: Vec<Field>,
    digit_values: HashMap<String, u32>,
    month_names: HashMap<NameTable, Vec<String>>,
    timezone: Tz,
    abbreviations: BTreeMap<String, String>,
}

/// Build the parser for a format, in the same traversal order as the matcher
pub fn compile_parser(format: &str, locale: &DateLocale, timezone: Tz) -> Result<TimestampParser, FormatError> {
    if locale.timezone_abbreviations.is_empty() {
        return Err(FormatError::EmptyTimezoneTable);
    }

    let mut fields = Vec::new();
    for code in tokenize(format) {
        let field = match code {
            FormatCode::DayPadded | FormatCode::Day => Field::Day,
            FormatCode::MonthPadded | FormatCode::Month => Field::Month,
            FormatCode::MonthLong => Field::MonthName(NameTable::MonthLong),
            FormatCode::MonthShort => Field::MonthName(NameTable::MonthShort),
            FormatCode::MonthGenitive => Field::MonthName(NameTable::MonthGenitive),
            FormatCode::Year => Field::Year,
            FormatCode::ThaiYear => Field::ThaiYear,
            FormatCode::Hour | FormatCode::HourPadded => Field::Hour,
            FormatCode::Minute => Field::Minute,
            FormatCode::Second => Field::Second,
            FormatCode::WeekdayShort | FormatCode::WeekdayLong => Field::Weekday,
            FormatCode::RawDigits | FormatCode::Literal(_) => continue,
        };
        fields.push(field);
    }

    let digit_values: HashMap<String, u32> = locale
        .digit_glyphs()?
        .map(|glyphs| {
            glyphs
                .iter()
                .enumerate()
                .map(|(i, g)| (g.clone(), i as u32))
                .collect()
        })
        .unwrap_or_default();

    let month_names: HashMap<NameTable, Vec<String>> = [NameTable::MonthLong, NameTable::MonthShort, NameTable::MonthGenitive]
        .into_iter()
        .map(|table| (table, locale.names(table)))
        .collect();

    Ok(TimestampParser {
        fields,
        digit_values,
        month_names,
        timezone,
        abbreviations: locale.timezone_abbreviations.clone(),
    })
}

impl TimestampParser {
    /// Roles of the capture groups, in group order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Undo digit localization; ASCII digits pass through
    fn number(&self, text: &str) -> Option<u32> {
        let mut value: u32 = 0;
        let mut rest = text;
        while !rest.is_empty() {
            let (digit, len) = self
                .digit_values
                .iter()
                .find(|(glyph, _)| rest.starts_with(glyph.as_str()))
                .map(|(glyph, d)| (*d, glyph.len()))
                .or_else(|| {
                    let c = rest.chars().next()?;
                    c.to_digit(10).map(|d| (d, c.len_utf8()))
                })?;
            value = value.checked_mul(10)?.checked_add(digit)?;
            rest = &rest[len..];
        }
        Some(value)
    }

    /// Convert a matcher capture into an instant; `None` for invalid dates
    pub fn parse(&self, caps: &Captures<'_>) -> Option<ParsedTimestamp> {
        let mut year = None;
        let mut month = None;
        let mut day = 1;
        let mut hour = 0;
        let mut minute = 0;
        let mut second = 0;

        for (i, field) in self.fields.iter().enumerate() {
            let text = caps.get(i + 1)?.as_str();
            match field {
                Field::Day => day = self.number(text)?,
                Field::Month => month = Some(self.number(text)?),
                Field::MonthName(table) => {
                    let names = self.month_names.get(table)?;
                    let index = names.iter().position(|n| n == text)?;
                    month = Some(index as u32 + 1);
                }
                Field::Year => year = Some(self.number(text)? as i32),
                Field::ThaiYear => year = Some(self.number(text)? as i32 - 543),
                Field::Hour => hour = self.number(text)?,
                Field::Minute => minute = self.number(text)?,
                Field::Second => second = self.number(text)?,
                Field::Weekday => {}
            }
        }

        let label = caps.get(self.fields.len() + 1)?.as_str();
        let expected = self.abbreviations.get(label).map(String::as_str).unwrap_or(label);

        let naive = NaiveDate::from_ymd_opt(year?, month.unwrap_or(1), day)?.and_hms_opt(hour, minute, second)?;
        Some(self.resolve(naive, expected))
    }

    /// Pin a local time to the site timezone, checking the zone label
    fn resolve(&self, naive: NaiveDateTime, expected: &str) -> ParsedTimestamp {
        let (first, forward) = match self.timezone.from_local_datetime(&naive) {
            LocalResult::Single(dt) => (dt, dt),
            LocalResult::Ambiguous(earliest, latest) => (earliest, latest),
            // Skipped by a DST gap: move forward past it
            LocalResult::None => {
                let shifted = naive + chrono::Duration::hours(1);
                match self.timezone.from_local_datetime(&shifted).earliest() {
                    Some(dt) => (dt, dt),
                    None => {
                        let utc = Utc.from_utc_datetime(&naive);
                        return ParsedTimestamp {
                            instant: utc,
                            warning: Some(ParseWarning::WrongAbbreviation),
                        };
                    }
                }
            }
        };

        let abbreviation = |dt: &DateTime<Tz>| dt.offset().abbreviation().unwrap_or_default().to_string();

        if abbreviation(&first) == expected {
            return ParsedTimestamp {
                instant: first.with_timezone(&Utc),
                warning: None,
            };
        }

        if abbreviation(&forward) == expected {
            ParsedTimestamp {
                instant: forward.with_timezone(&Utc),
                warning: Some(ParseWarning::AmbiguousDst),
            }
        } else {
            warn!(%naive, expected, actual = %abbreviation(&first), "Timestamp zone label does not match timezone");
            ParsedTimestamp {
                instant: first.with_timezone(&Utc),
                warning: Some(ParseWarning::WrongAbbreviation),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::compile_matcher;
    use regex::Regex;

    fn compile(format: &str, locale: &DateLocale, tz: Tz) -> (Regex, TimestampParser) {
        let regex = Regex::new(&compile_matcher(format, locale).unwrap()).unwrap();
        let parser = compile_parser(format, locale, tz).unwrap();
        (regex, parser)
    }

    fn parse(regex: &Regex, parser: &TimestampParser, text: &str) -> Option<ParsedTimestamp> {
        parser.parse(&regex.captures(text)?)
    }

    #[test]
    fn test_field_order() {
        let parser = compile_parser("D, j F Y H:i", &DateLocale::english_utc(), Tz::UTC).unwrap();
        assert_eq!(
            parser.fields(),
            &[
                Field::Weekday,
                Field::Day,
                Field::MonthName(NameTable::MonthLong),
                Field::Year,
                Field::Hour,
                Field::Minute,
            ]
        );
    }

    #[test]
    fn test_parse_numeric_month_and_seconds() {
        let (regex, parser) = compile("Y-m-d H:i:s", &DateLocale::english_utc(), Tz::UTC);
        let parsed = parse(&regex, &parser, "2024-03-05 07:08:09 (UTC)").unwrap();
        assert_eq!(parsed.instant, Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap());
    }

    #[test]
    fn test_parse_localized_digits() {
        let mut locale = DateLocale::english_utc();
        locale.digits = Some(
            ["०", "१", "२", "३", "४", "५", "६", "७", "८", "९"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        let (regex, parser) = compile("H:i, j F Y", &locale, Tz::UTC);
        let parsed = parse(&regex, &parser, "१४:०५, ३ March २०२४ (UTC)").unwrap();
        assert_eq!(parsed.instant, Utc.with_ymd_and_hms(2024, 3, 3, 14, 5, 0).unwrap());
    }

    #[test]
    fn test_parse_thai_year() {
        let (regex, parser) = compile("j M xkY H:i", &DateLocale::english_utc(), Tz::UTC);
        let parsed = parse(&regex, &parser, "1 Jan 2567 10:00 (UTC)").unwrap();
        assert_eq!(parsed.instant, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_genitive_month() {
        let mut locale = DateLocale::english_utc();
        locale.messages.insert("march-gen".into(), "marca".into());
        let (regex, parser) = compile("H:i, j xg Y", &locale, Tz::UTC);
        let parsed = parse(&regex, &parser, "09:15, 2 marca 2024 (UTC)").unwrap();
        assert_eq!(parsed.instant, Utc.with_ymd_and_hms(2024, 3, 2, 9, 15, 0).unwrap());
    }

    #[test]
    fn test_invalid_day_is_none() {
        let (regex, parser) = compile("H:i, j M Y", &DateLocale::english_utc(), Tz::UTC);
        assert!(parse(&regex, &parser, "10:00, 32 Jan 2024 (UTC)").is_none());
        assert!(parse(&regex, &parser, "25:00, 1 Jan 2024 (UTC)").is_none());
    }

    fn berlin_locale() -> DateLocale {
        let mut locale = DateLocale::english_utc();
        locale.timezone_abbreviations = [
            ("MEZ".to_string(), "CET".to_string()),
            ("MESZ".to_string(), "CEST".to_string()),
        ]
        .into_iter()
        .collect();
        locale
    }

    #[test]
    fn test_dst_ambiguous_moves_forward() {
        let (regex, parser) = compile("H:i, j M Y", &berlin_locale(), chrono_tz::Europe::Berlin);

        // 27 Oct 2024 02:30 happens twice in Berlin: first CEST, then CET
        let summer = parse(&regex, &parser, "02:30, 27 Oct 2024 (MESZ)").unwrap();
        assert_eq!(summer.instant, Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap());
        assert!(summer.warning.is_none());

        let winter = parse(&regex, &parser, "02:30, 27 Oct 2024 (MEZ)").unwrap();
        assert_eq!(winter.instant, Utc.with_ymd_and_hms(2024, 10, 27, 1, 30, 0).unwrap());
        assert_eq!(winter.warning, Some(ParseWarning::AmbiguousDst));
    }

    #[test]
    fn test_wrong_abbreviation_warning() {
        let (regex, parser) = compile("H:i, j M Y", &berlin_locale(), chrono_tz::Europe::Berlin);
        // July is summer time; "MEZ" is wrong
        let parsed = parse(&regex, &parser, "12:00, 1 Jul 2024 (MEZ)").unwrap();
        assert_eq!(parsed.instant, Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap());
        assert_eq!(parsed.warning, Some(ParseWarning::WrongAbbreviation));
    }

    #[test]
    fn test_dst_gap_moves_forward_one_hour() {
        let (regex, parser) = compile("H:i, j M Y", &berlin_locale(), chrono_tz::Europe::Berlin);

        // 31 Mar 2024 02:30 never happens in Berlin; it reads as 03:30 CEST
        let parsed = parse(&regex, &parser, "02:30, 31 Mar 2024 (MESZ)").unwrap();
        assert_eq!(parsed.instant, Utc.with_ymd_and_hms(2024, 3, 31, 1, 30, 0).unwrap());
        assert!(parsed.warning.is_none());

        let parsed = parse(&regex, &parser, "02:30, 31 Mar 2024 (MEZ)").unwrap();
        assert_eq!(parsed.instant, Utc.with_ymd_and_hms(2024, 3, 31, 1, 30, 0).unwrap());
        assert_eq!(parsed.warning, Some(ParseWarning::WrongAbbreviation));
    }
}
