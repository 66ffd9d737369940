//! Tokenizer for the date-format mini-language.
//!
//! The format language is the subset of MediaWiki's `sprintfDate` codes that
//! can appear in a signature timestamp. Codes are recognised greedily: the
//! three-character `xkY` first, then two-character codes, then single letters.
//! Anything unrecognised is a literal character.

/// A single unit of a tokenized date format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatCode {
    /// `d`: day of month, two digits
    DayPadded,
    /// `j`: day of month, one or two digits
    Day,
    /// `D`: abbreviated weekday name
    WeekdayShort,
    /// `l`: full weekday name
    WeekdayLong,
    /// `F`: full month name
    MonthLong,
    /// `M`: abbreviated month name
    MonthShort,
    /// `xg`: month name in the genitive case
    MonthGenitive,
    /// `m`: month number, two digits
    MonthPadded,
    /// `n`: month number, one or two digits
    Month,
    /// `Y`: four-digit year
    Year,
    /// `xkY`: four-digit Thai solar year (Gregorian + 543)
    ThaiYear,
    /// `G`: hour (24h), one or two digits
    Hour,
    /// `H`: hour (24h), two digits
    HourPadded,
    /// `i`: minutes, two digits
    Minute,
    /// `s`: seconds, two digits
    Second,
    /// `xn`: the next numeric code uses ASCII digits
    RawDigits,
    /// Literal text (from `\x`, `"..."`, `xx` or an unrecognised character)
    Literal(String),
}

impl FormatCode {
    /// Whether this code produces a capture group in the matcher
    pub fn is_value(&self) -> bool {
        !matches!(self, FormatCode::RawDigits | FormatCode::Literal(_))
    }

    /// Digit width bounds for numeric codes
    pub fn digit_width(&self) -> Option<(usize, usize)> {
        match self {
            FormatCode::DayPadded
            | FormatCode::MonthPadded
            | FormatCode::HourPadded
            | FormatCode::Minute
            | FormatCode::Second => Some((2, 2)),
            FormatCode::Day | FormatCode::Month | FormatCode::Hour => Some((1, 2)),
            FormatCode::Year | FormatCode::ThaiYear => Some((4, 4)),
            _ => None,
        }
    }
}

/// Split a format string into codes, left to right
pub fn tokenize(format: &str) -> Vec<FormatCode> {
    let chars: Vec<char> = format.chars().collect();
    let mut codes = Vec::new();
    let mut p = 0;

    while p < chars.len() {
        let rest = &chars[p..];

        if rest.starts_with(&['x', 'k', 'Y']) {
            codes.push(FormatCode::ThaiYear);
            p += 3;
            continue;
        }

        if rest.len() >= 2 && rest[0] == 'x' {
            let two = match rest[1] {
                'x' => Some(FormatCode::Literal("x".to_string())),
                'g' => Some(FormatCode::MonthGenitive),
                'n' => Some(FormatCode::RawDigits),
                _ => None,
            };
            if let Some(code) = two {
                codes.push(code);
                p += 2;
                continue;
            }
        }

        let code = match rest[0] {
            'd' => FormatCode::DayPadded,
            'j' => FormatCode::Day,
            'D' => FormatCode::WeekdayShort,
            'l' => FormatCode::WeekdayLong,
            'F' => FormatCode::MonthLong,
            'M' => FormatCode::MonthShort,
            'm' => FormatCode::MonthPadded,
            'n' => FormatCode::Month,
            'Y' => FormatCode::Year,
            'G' => FormatCode::Hour,
            'H' => FormatCode::HourPadded,
            'i' => FormatCode::Minute,
            's' => FormatCode::Second,
            '\\' => {
                // Escape: the next character is literal; a trailing backslash is itself literal
                if let Some(&next) = rest.get(1) {
                    p += 1;
                    FormatCode::Literal(next.to_string())
                } else {
                    FormatCode::Literal("\\".to_string())
                }
            }
            '"' => match rest[1..].iter().position(|&c| c == '"') {
                Some(len) => {
                    let quoted: String = rest[1..1 + len].iter().collect();
                    p += len + 1;
                    FormatCode::Literal(quoted)
                }
                // Unterminated quote is a literal quote character
                None => FormatCode::Literal("\"".to_string()),
            },
            other => FormatCode::Literal(other.to_string()),
        };
        codes.push(code);
        p += 1;
    }

    codes
}
