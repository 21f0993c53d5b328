//! Unit and format normalization shared by every provider mapping.
//!
//! Providers report wind in m/s, temperatures as floats, air quality as a
//! 1-5 category and timestamps as unix seconds or RFC 3339 strings. These
//! helpers turn all of that into the integer/string shape of the canonical
//! model.

use std::fmt::Display;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Condition code used when a provider omits one.
pub const DEFAULT_CONDITION_CODE: &str = "01d";

/// Display string for a missing publish date.
pub const MISSING_DATE: &str = "N/A";

pub fn round_temp(value: f64) -> i32 {
    value.round() as i32
}

pub fn mps_to_kmh(speed_mps: f64) -> i32 {
    (speed_mps * 3.6).round() as i32
}

/// Maps a provider's 1-5 air quality category onto a 0-300+ display scale.
///
/// Category midpoints are a rough heuristic, not an official AQI conversion.
pub fn aqi_from_category(category: u32) -> u32 {
    match category {
        1 => 25,
        2 => 75,
        3 => 125,
        4 => 175,
        5 => 250,
        other => other.saturating_mul(50),
    }
}

/// Upper-cases the first letter of every word: `"light rain"` -> `"Light Rain"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;

    for ch in text.chars() {
        if at_word_start && ch.is_alphanumeric() {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = !(ch.is_alphanumeric() || ch == '_');
    }

    out
}

/// OpenWeather icon codes (`01d`, `10n`) carry the flag in their last letter.
/// Anything else is a MET symbol, which is daytime only with a `day` variant;
/// suffix-less symbols such as `cloudy` count as night.
pub fn is_day_code(code: &str) -> bool {
    let code = code.trim();
    let bytes = code.as_bytes();
    let is_icon = bytes.len() == 3
        && bytes[..2].iter().all(u8::is_ascii_digit)
        && matches!(bytes[2], b'd' | b'n');

    if is_icon { bytes[2] == b'd' } else { code.contains("day") }
}

/// Falls back to [`DEFAULT_CONDITION_CODE`] for blank codes.
pub fn condition_or_default(code: Option<&str>) -> String {
    match code.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => DEFAULT_CONDITION_CODE.to_string(),
    }
}

pub fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

pub fn unix_to_local(ts: i64) -> Option<DateTime<Local>> {
    unix_to_utc(ts).map(|t| t.with_timezone(&Local))
}

/// `"3:05 PM, Monday, September 16"`
pub fn observation_time<Tz: TimeZone>(t: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    t.format("%-I:%M %p, %A, %B %-d").to_string()
}

/// `"6:42 AM"`
pub fn clock_time<Tz: TimeZone>(t: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    t.format("%-I:%M %p").to_string()
}

/// `"3PM"`
pub fn hour_label<Tz: TimeZone>(t: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    t.format("%-I%p").to_string()
}

/// Formatted `(date, day_name, short_date)` triple, e.g. `("Mon, Sep 16", "Monday", "9/16")`.
pub fn day_labels(date: NaiveDate) -> (String, String, String) {
    (
        date.format("%a, %b %-d").to_string(),
        date.format("%A").to_string(),
        date.format("%-m/%-d").to_string(),
    )
}

/// `"Sep 16, 2024"`, used for news items.
pub fn news_date<Tz: TimeZone>(t: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    t.format("%b %-d, %Y").to_string()
}

/// Parses RFC 3339 / ISO 8601 timestamps as sent by news and video APIs.
///
/// Also accepts a bare `YYYY-MM-DDTHH:MM:SS` (interpreted as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() || raw == MISSING_DATE {
        return None;
    }

    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

/// Milliseconds since the epoch, with unparsable input sorting as the oldest possible item.
pub fn sort_millis(raw: Option<&str>) -> i64 {
    raw.and_then(parse_timestamp).map(|t| t.timestamp_millis()).unwrap_or(0)
}

/// Formats an ISO timestamp for display, or `"N/A"`.
pub fn display_news_date(raw: Option<&str>) -> String {
    raw.and_then(parse_timestamp)
        .map(|t| news_date(&t.with_timezone(&Local)))
        .unwrap_or_else(|| MISSING_DATE.to_string())
}

pub fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn aqi_category_midpoints() {
        assert_eq!(aqi_from_category(1), 25);
        assert_eq!(aqi_from_category(3), 125);
        assert_eq!(aqi_from_category(5), 250);
    }

    #[test]
    fn aqi_out_of_range_scales_linearly() {
        assert_eq!(aqi_from_category(6), 300);
        assert_eq!(aqi_from_category(0), 0);
    }

    #[test]
    fn wind_is_converted_to_kmh() {
        assert_eq!(mps_to_kmh(10.0), 36);
        assert_eq!(mps_to_kmh(4.2), 15);
        assert_eq!(mps_to_kmh(0.0), 0);
    }

    #[test]
    fn temperatures_round_to_nearest() {
        assert_eq!(round_temp(21.5), 22);
        assert_eq!(round_temp(-3.4), -3);
        assert_eq!(round_temp(-3.6), -4);
    }

    #[test]
    fn title_case_capitalizes_each_word() {
        assert_eq!(title_case("overcast clouds"), "Overcast Clouds");
        assert_eq!(title_case("  new york"), "  New York");
        assert_eq!(title_case("são paulo"), "São Paulo");
    }

    #[test]
    fn day_flag_from_icon_and_symbol() {
        assert!(is_day_code("01d"));
        assert!(!is_day_code("10n"));
        assert!(is_day_code("partlycloudy_day"));
        assert!(!is_day_code("clearsky_night"));
        assert!(!is_day_code("fair_polartwilight"));
    }

    #[test]
    fn symbols_without_day_variant_are_night() {
        assert!(!is_day_code("cloudy"));
        assert!(!is_day_code("heavyrainandthunder"));
        assert!(!is_day_code("sleetandthunder"));
        assert!(!is_day_code("fog"));
        assert!(!is_day_code(""));
    }

    #[test]
    fn blank_condition_gets_default() {
        assert_eq!(condition_or_default(None), DEFAULT_CONDITION_CODE);
        assert_eq!(condition_or_default(Some("  ")), DEFAULT_CONDITION_CODE);
        assert_eq!(condition_or_default(Some("04n")), "04n");
    }

    #[test]
    fn formats_match_dashboard_labels() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let t = tz.with_ymd_and_hms(2024, 9, 16, 15, 5, 0).unwrap();

        assert_eq!(observation_time(&t), "3:05 PM, Monday, September 16");
        assert_eq!(clock_time(&t), "3:05 PM");
        assert_eq!(hour_label(&t), "3PM");
        assert_eq!(news_date(&t), "Sep 16, 2024");

        let (date, day, short) = day_labels(t.date_naive());
        assert_eq!(date, "Mon, Sep 16");
        assert_eq!(day, "Monday");
        assert_eq!(short, "9/16");
    }

    #[test]
    fn parse_timestamp_variants() {
        assert!(parse_timestamp("2024-05-01T10:00:00Z").is_some());
        assert!(parse_timestamp("2024-05-01T10:00:00+02:00").is_some());
        assert!(parse_timestamp("2024-05-01T10:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp(MISSING_DATE).is_none());
    }

    #[test]
    fn unparsable_sorts_as_zero() {
        assert_eq!(sort_millis(None), 0);
        assert_eq!(sort_millis(Some("garbage")), 0);
        assert_eq!(sort_millis(Some("1970-01-01T00:00:01Z")), 1000);
    }

    #[test]
    fn truncate_body_limits_length() {
        let long = "x".repeat(250);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.len(), 203);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
