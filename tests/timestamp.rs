//! Timestamp Format Integration Tests
//!
//! Tests for matcher/parser alignment, localized formats and rendering.

use chrono::{TimeZone, Utc};
use reactwiki::timestamp::{tokenize, CompiledFormat, DateLocale, FormatCache, FormatError, ParseWarning};
use std::collections::{BTreeMap, HashMap};

fn locale_with(abbreviations: &[(&str, &str)], messages: &[(&str, &str)]) -> DateLocale {
    DateLocale {
        digits: None,
        timezone_abbreviations: abbreviations
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
        messages: messages
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>(),
    }
}

#[test]
fn test_group_alignment_across_formats() {
    let locale = DateLocale::english_utc();
    let formats = [
        "H:i, j M Y",
        "H:i, j F Y",
        "D, d M Y H:i:s",
        "l j xg Y, G:i",
        "xkY-m-d H:i",
        "Y\"年\"n\"月\"j\"日\" (D) H:i",
        "j. n. Y, H:i",
        "xnH:i, j M Y",
    ];

    for format in formats {
        let compiled = CompiledFormat::compile(format, &locale, "UTC").unwrap();
        let value_codes = tokenize(format).iter().filter(|c| c.is_value()).count();

        // One group per value code, plus the timezone label
        assert_eq!(compiled.parser().fields().len(), value_codes, "format {}", format);
        assert_eq!(
            compiled.matcher().captures_len() - 1,
            compiled.parser().fields().len() + 1,
            "format {}",
            format
        );
    }
}

#[test]
fn test_parse_default_english_signature() {
    let format = CompiledFormat::compile("H:i, j M Y", &DateLocale::english_utc(), "UTC").unwrap();
    let parsed = format.parse("12:30, 31 Dec 2025 (UTC)").unwrap();
    assert_eq!(parsed.instant, Utc.with_ymd_and_hms(2025, 12, 31, 12, 30, 0).unwrap());
    assert_eq!(parsed.warning, None);
}

#[test]
fn test_invisible_marks_are_tolerated() {
    let format = CompiledFormat::compile("H:i, j M Y", &DateLocale::english_utc(), "UTC").unwrap();
    let text = "12:30,\u{200E} 31\u{200F} Dec 2025\u{200E} (UTC)";
    let parsed = format.parse(text).unwrap();
    assert_eq!(parsed.instant, Utc.with_ymd_and_hms(2025, 12, 31, 12, 30, 0).unwrap());
}

#[test]
fn test_invalid_calendar_date_does_not_parse() {
    let format = CompiledFormat::compile("H:i, j M Y", &DateLocale::english_utc(), "UTC").unwrap();
    assert!(format.parse("12:30, 31 Feb 2025 (UTC)").is_none());
}

#[test]
fn test_unknown_zone_label_does_not_match() {
    let format = CompiledFormat::compile("H:i, j M Y", &DateLocale::english_utc(), "UTC").unwrap();
    assert!(format.parse("12:30, 31 Dec 2025 (PST)").is_none());
}

#[test]
fn test_empty_timezone_table_is_error() {
    let locale = locale_with(&[], &[]);
    let result = CompiledFormat::compile("H:i, j M Y", &locale, "UTC");
    assert!(matches!(result, Err(FormatError::EmptyTimezoneTable)));
}

#[test]
fn test_berlin_dst_labels() {
    let locale = locale_with(&[("MEZ", "CET"), ("MESZ", "CEST")], &[]);
    let format = CompiledFormat::compile("H:i, j. M Y", &locale, "Europe/Berlin").unwrap();

    // Winter time
    let parsed = format.parse("10:00, 15. Jan 2024 (MEZ)").unwrap();
    assert_eq!(parsed.instant, Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap());
    assert_eq!(parsed.warning, None);

    // Fall-back hour happens twice; the label picks the second one
    let parsed = format.parse("02:30, 27. Oct 2024 (MEZ)").unwrap();
    assert_eq!(parsed.instant, Utc.with_ymd_and_hms(2024, 10, 27, 1, 30, 0).unwrap());
    assert_eq!(parsed.warning, Some(ParseWarning::AmbiguousDst));

    // Summer label on a winter date
    let parsed = format.parse("10:00, 15. Jan 2024 (MESZ)").unwrap();
    assert_eq!(parsed.warning, Some(ParseWarning::WrongAbbreviation));
}

#[test]
fn test_render_is_recognised_by_own_matcher() {
    let locale = locale_with(
        &[("CST", "CST")],
        &[("sun", "日"), ("mon", "一"), ("tue", "二"), ("wed", "三"), ("thu", "四"), ("fri", "五"), ("sat", "六")],
    );
    let format = CompiledFormat::compile("Y\"年\"n\"月\"j\"日\" (D) H:i", &locale, "Asia/Shanghai").unwrap();

    let instant = Utc.with_ymd_and_hms(2024, 3, 5, 6, 7, 0).unwrap();
    let rendered = format.render(instant);
    assert_eq!(rendered, "2024年3月5日 (二) 14:07 (CST)");
    assert_eq!(format.parse(&rendered).unwrap().instant, instant);
}

#[test]
fn test_find_all_reports_ranges() {
    let format = CompiledFormat::compile("H:i, j M Y", &DateLocale::english_utc(), "UTC").unwrap();
    let text = "a 10:00, 1 Jan 2024 (UTC) b 11:00, 2 Jan 2024 (UTC)";
    let found = format.find_all(text);
    assert_eq!(found.len(), 2);
    assert_eq!(&text[found[0].range.0..found[0].range.1], "10:00, 1 Jan 2024 (UTC)");
    assert_eq!(found[1].text, "11:00, 2 Jan 2024 (UTC)");
    assert!(found.iter().all(|m| m.parsed.is_some()));
}

#[test]
fn test_cache_returns_shared_entry() {
    let cache = FormatCache::new();
    let locale = DateLocale::english_utc();
    let a = cache.get_or_compile("H:i, j M Y", &locale, "UTC").unwrap();
    let b = cache.get_or_compile("H:i, j M Y", &locale, "UTC").unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));

    cache.get_or_compile("H:i, j F Y", &locale, "UTC").unwrap();
    assert_eq!(cache.len(), 2);
}
