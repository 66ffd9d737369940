//! Instant -> signature timestamp text.

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::{OffsetName, Tz};

use super::codes::{tokenize, FormatCode};
use super::locale::{DateLocale, NameTable};
use super::matcher::name_table;
use super::FormatError;

/// Renders instants the way the site's signatures show them
#[derive(Debug, Clone)]
pub struct TimestampFormatter {
    codes: Vec<FormatCode>,
    digits: Option<Vec<String>>,
    locale: DateLocale,
    timezone: Tz,
}

impl TimestampFormatter {
    pub fn new(format: &str, locale: &DateLocale, timezone: Tz) -> Result<Self, FormatError> {
        let digits = locale.digit_glyphs()?.map(|d| d.to_vec());
        Ok(Self {
            codes: tokenize(format),
            digits,
            locale: locale.clone(),
            timezone,
        })
    }

    fn localize(&self, number: String, raw: bool) -> String {
        match (&self.digits, raw) {
            (Some(glyphs), false) => number
                .chars()
                .map(|c| match c.to_digit(10) {
                    Some(d) => glyphs[d as usize].clone(),
                    None => c.to_string(),
                })
                .collect(),
            _ => number,
        }
    }

    /// Render `instant` in the site timezone, followed by ` (<zone label>)`
    pub fn render(&self, instant: DateTime<Utc>) -> String {
        let local = instant.with_timezone(&self.timezone);
        let mut out = String::new();
        let mut raw = false;

        for code in &self.codes {
            if let Some(table) = name_table(code) {
                let names = self.locale.names(table);
                let index = match table {
                    NameTable::WeekdayLong | NameTable::WeekdayShort => {
                        local.weekday().num_days_from_sunday() as usize
                    }
                    _ => local.month0() as usize,
                };
                out.push_str(&names[index]);
                continue;
            }

            let number = match code {
                FormatCode::RawDigits => {
                    raw = true;
                    continue;
                }
                FormatCode::Literal(text) => {
                    out.push_str(text);
                    continue;
                }
                FormatCode::DayPadded => format!("{:02}", local.day()),
                FormatCode::Day => local.day().to_string(),
                FormatCode::MonthPadded => format!("{:02}", local.month()),
                FormatCode::Month => local.month().to_string(),
                FormatCode::Year => format!("{:04}", local.year()),
                FormatCode::ThaiYear => format!("{:04}", local.year() + 543),
                FormatCode::Hour => local.hour().to_string(),
                FormatCode::HourPadded => format!("{:02}", local.hour()),
                FormatCode::Minute => format!("{:02}", local.minute()),
                FormatCode::Second => format!("{:02}", local.second()),
                _ => continue,
            };
            out.push_str(&self.localize(number, raw));
            raw = false;
        }

        let abbreviation = local.offset().abbreviation().unwrap_or_default();
        let label = self
            .locale
            .displayed_abbreviation(abbreviation)
            .unwrap_or(abbreviation);
        format!("{} ({})", out, label)
    }
}
