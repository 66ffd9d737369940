//! Format -> regular expression compilation.

use super::codes::{tokenize, FormatCode};
use super::locale::{DateLocale, NameTable};
use super::FormatError;

/// Optional bidirectional-text marks the renderer may intersperse (LRM, RLM)
pub const INVISIBLE_MARKS: &str = "[\u{200E}\u{200F}]?";

/// Regex fragment matching one localized digit
pub(crate) fn digit_class(glyphs: Option<&[String]>) -> String {
    match glyphs {
        Some(glyphs) => {
            let alternatives: Vec<String> = glyphs.iter().map(|g| regex::escape(g)).collect();
            format!("(?:{})", alternatives.join("|"))
        }
        None => "[0-9]".to_string(),
    }
}

/// Regex fragment alternating over a name table
fn name_alternation(names: &[String]) -> String {
    let escaped: Vec<String> = names.iter().map(|n| regex::escape(n)).collect();
    format!("({})", escaped.join("|"))
}

/// Name table behind a name code
pub(crate) fn name_table(code: &FormatCode) -> Option<NameTable> {
    match code {
        FormatCode::WeekdayShort => Some(NameTable::WeekdayShort),
        FormatCode::WeekdayLong => Some(NameTable::WeekdayLong),
        FormatCode::MonthLong => Some(NameTable::MonthLong),
        FormatCode::MonthShort => Some(NameTable::MonthShort),
        FormatCode::MonthGenitive => Some(NameTable::MonthGenitive),
        _ => None,
    }
}

/// Compile a date format into a regex pattern string
///
/// Capture groups follow the format's value codes in order, then one group for
/// the displayed timezone label. Fails if the locale has no timezone labels.
pub fn compile_matcher(format: &str, locale: &DateLocale) -> Result<String, FormatError> {
    if locale.timezone_abbreviations.is_empty() {
        return Err(FormatError::EmptyTimezoneTable);
    }

    let localized = digit_class(locale.digit_glyphs()?);
    let mut pattern = String::new();
    let mut raw_digits = false;

    for code in tokenize(format) {
        match &code {
            FormatCode::RawDigits => {
                raw_digits = true;
                continue;
            }
            FormatCode::Literal(text) => pattern.push_str(&regex::escape(text)),
            _ => {
                if let Some(table) = name_table(&code) {
                    pattern.push_str(&name_alternation(&locale.names(table)));
                } else if let Some((min, max)) = code.digit_width() {
                    let digits = if raw_digits { "[0-9]" } else { localized.as_str() };
                    raw_digits = false;
                    if min == max {
                        pattern.push_str(&format!("({}{{{}}})", digits, min));
                    } else {
                        pattern.push_str(&format!("({}{{{},{}}})", digits, min, max));
                    }
                }
            }
        }
        pattern.push_str(INVISIBLE_MARKS);
    }

    let labels: Vec<String> = locale
        .timezone_abbreviations
        .keys()
        .map(|k| regex::escape(k))
        .collect();
    pattern.push_str(&format!(
        "{marks} {marks}\\(({labels})\\)",
        marks = INVISIBLE_MARKS,
        labels = labels.join("|")
    ));

    Ok(pattern)
}
