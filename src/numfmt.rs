//! Number and date format parsing and application
//!
//! Numeric format codes follow the numeral-style mini-language used by the
//! page (`0,0.00`, `0.000%`, `$0,0.00`, `0.00e+0`). Date format codes follow
//! moment-style tokens (`YYYY-MM-DD HH:mm:ss`, `[Q]Q`, `ddd D MMM`).
//!
//! Both compile once into a token form and then format many values. A code
//! that does not compile yields `None`, and the caller falls back to the raw
//! value.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::types::RawValue;

/// Notation used for numeric columns without a custom format code
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum Notation {
    #[default]
    Standard,
    Scientific,
    Engineering,
}

/// Compiled numeric format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericFormat {
    pub decimals: usize,
    pub thousands: bool,
    pub percent: bool,
    pub currency: Option<char>,
    pub notation: Notation,
}

/// Upper bound on decimals; larger precisions are clamped to it
pub const MAX_DECIMALS: usize = 20;

impl NumericFormat {
    /// Plain fixed-precision format
    pub fn fixed(decimals: usize) -> Self {
        Self {
            decimals: decimals.min(MAX_DECIMALS),
            thousands: false,
            percent: false,
            currency: None,
            notation: Notation::Standard,
        }
    }

    /// Compile a numeral-style format code.
    ///
    /// Returns `None` for codes with no digit placeholder, more than one
    /// decimal point, unbalanced optional-decimal brackets or characters
    /// outside the supported set.
    pub fn parse(format_code: &str) -> Option<Self> {
        let code = format_code.trim();
        if code.is_empty() {
            return None;
        }
        if !code
            .chars()
            .all(|c| matches!(c, '0' | '#' | ',' | '.' | '%' | '$' | '€' | '£' | 'e' | 'E' | '+' | '-' | '[' | ']' | ' '))
        {
            return None;
        }
        if !code.contains('0') && !code.contains('#') {
            return None;
        }
        if code.matches('.').count() > 1 || code.matches('[').count() != code.matches(']').count() {
            return None;
        }

        let lower = code.to_lowercase();
        let scientific = lower.contains("e+") || lower.contains("e-");
        let mantissa = lower.split('e').next().unwrap_or("");

        // Optional decimals (`0.[00]`) are rendered as fixed decimals
        let decimals = mantissa.find('.').map_or(0, |pos| {
            mantissa
                .get(pos..)
                .unwrap_or("")
                .chars()
                .filter(|&c| c == '0' || c == '#')
                .count()
        });

        let currency = ['$', '€', '£'].into_iter().find(|c| code.contains(*c));

        Some(Self {
            decimals: decimals.min(MAX_DECIMALS),
            thousands: mantissa.contains(','),
            percent: code.contains('%'),
            currency,
            notation: if scientific {
                Notation::Scientific
            } else {
                Notation::Standard
            },
        })
    }

    /// Format a finite or non-finite value.
    pub fn format(&self, value: f64) -> String {
        if value.is_nan() {
            return "NaN".to_string();
        }
        if value.is_infinite() {
            return if value > 0.0 { "inf" } else { "-inf" }.to_string();
        }

        let base = if self.percent { value * 100.0 } else { value };

        let mut out = match self.notation {
            Notation::Scientific => format_scientific(base, self.decimals),
            Notation::Engineering => format_engineering(base, self.decimals),
            Notation::Standard => {
                if self.thousands {
                    format_with_thousands(base, self.decimals)
                } else {
                    format!("{:.prec$}", base, prec = self.decimals)
                }
            }
        };

        if let Some(currency) = self.currency {
            if let Some(stripped) = out.strip_prefix('-') {
                out = format!("-{currency}{stripped}");
            } else {
                out.insert(0, currency);
            }
        }
        if self.percent {
            out.push('%');
        }
        out
    }
}

/// Mantissa/exponent split with the mantissa rounded to `decimals`.
///
/// Rounding can push the mantissa to the next power of ten (9.999 -> 10.00),
/// in which case the exponent is bumped by `step`.
#[allow(clippy::cast_possible_truncation)]
fn split_exponent(abs_value: f64, decimals: usize, step: i32) -> (String, i32) {
    let raw_exp = abs_value.log10().floor() as i32;
    let mut exponent = raw_exp - raw_exp.rem_euclid(step);
    let limit = 10_f64.powi(step);
    let mut mantissa = abs_value / 10_f64.powi(exponent);
    let mut text = format!("{mantissa:.decimals$}");
    if text.parse::<f64>().is_ok_and(|m| m >= limit) {
        exponent += step;
        mantissa = abs_value / 10_f64.powi(exponent);
        text = format!("{mantissa:.decimals$}");
    }
    (text, exponent)
}

fn join_exponent(mantissa: &str, exponent: i32, negative: bool) -> String {
    let sign = if exponent < 0 { '-' } else { '+' };
    let out = format!("{mantissa}e{sign}{}", exponent.unsigned_abs());
    if negative {
        format!("-{out}")
    } else {
        out
    }
}

/// Format a number in scientific notation (`1.23e+6`)
fn format_scientific(value: f64, decimals: usize) -> String {
    if value == 0.0 {
        return join_exponent(&format!("{:.decimals$}", 0.0), 0, false);
    }
    let (mantissa, exponent) = split_exponent(value.abs(), decimals, 1);
    join_exponent(&mantissa, exponent, value < 0.0)
}

/// Format a number in engineering notation (exponent a multiple of 3)
fn format_engineering(value: f64, decimals: usize) -> String {
    if value == 0.0 {
        return join_exponent(&format!("{:.decimals$}", 0.0), 0, false);
    }
    let (mantissa, exponent) = split_exponent(value.abs(), decimals, 3);
    join_exponent(&mantissa, exponent, value < 0.0)
}

/// Format number with thousands separators
pub fn format_with_thousands(value: f64, decimals: usize) -> String {
    let is_negative = value < 0.0;
    let formatted = format!("{:.prec$}", value.abs(), prec = decimals);
    let mut parts = formatted.split('.');

    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next();

    let mut with_sep = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_sep.push(',');
        }
        with_sep.push(c);
    }
    let int_with_sep: String = with_sep.chars().rev().collect();

    let result = match dec_part {
        Some(dec) => format!("{int_with_sep}.{dec}"),
        None => int_with_sep,
    };

    // "-0.00" is not worth a sign
    if is_negative && result.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{result}")
    } else {
        result
    }
}

/// Token types for moment-style date formats
#[derive(Debug, Clone, PartialEq, Eq)]
enum DateToken {
    Year4,           // YYYY
    Year2,           // YY
    Month1,          // M
    Month2,          // MM
    Month3,          // MMM
    Month4,          // MMMM
    Day1,            // D
    Day2,            // DD
    Weekday1,        // d (0-6)
    Weekday3,        // ddd
    Weekday4,        // dddd
    Hour24_1,        // H
    Hour24_2,        // HH
    Hour12_1,        // h
    Hour12_2,        // hh
    Minute1,         // m
    Minute2,         // mm
    Second1,         // s
    Second2,         // ss
    Millis,          // SSS
    Quarter,         // Q
    AmPmUpper,       // A
    AmPmLower,       // a
    EpochSeconds,    // X
    EpochMillis,     // x
    Literal(String), // separators and [escaped] text
}

impl DateToken {
    fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

/// Compiled date format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    tokens: Vec<DateToken>,
}

/// Default format for midnight values
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";

/// Default format for values with a time component
pub const DEFAULT_DATETIME_FORMAT: &str = "YYYY-MM-DD HH:mm:ss";

impl DateFormat {
    /// Compile a moment-style format code.
    ///
    /// Returns `None` for an unterminated `[` escape or a code that holds no
    /// date/time token at all.
    pub fn parse(format_code: &str) -> Option<Self> {
        let tokens = parse_date_format_tokens(format_code)?;
        if tokens.iter().all(DateToken::is_literal) {
            return None;
        }
        Some(Self { tokens })
    }

    /// Format a timestamp
    #[allow(clippy::cast_possible_truncation)]
    pub fn format(&self, dt: &NaiveDateTime) -> String {
        let hour = dt.hour();
        let hour12 = match hour {
            0 => 12,
            1..=12 => hour,
            _ => hour - 12,
        };
        let weekday = dt.weekday().num_days_from_sunday();

        let mut result = String::new();
        for token in &self.tokens {
            match token {
                DateToken::Year4 => result.push_str(&format!("{:04}", dt.year())),
                DateToken::Year2 => result.push_str(&format!("{:02}", dt.year().rem_euclid(100))),
                DateToken::Month1 => result.push_str(&dt.month().to_string()),
                DateToken::Month2 => result.push_str(&format!("{:02}", dt.month())),
                DateToken::Month3 => result.push_str(month_abbrev(dt.month())),
                DateToken::Month4 => result.push_str(month_full(dt.month())),
                DateToken::Day1 => result.push_str(&dt.day().to_string()),
                DateToken::Day2 => result.push_str(&format!("{:02}", dt.day())),
                DateToken::Weekday1 => result.push_str(&weekday.to_string()),
                DateToken::Weekday3 => result.push_str(day_abbrev(weekday)),
                DateToken::Weekday4 => result.push_str(day_full(weekday)),
                DateToken::Hour24_1 => result.push_str(&hour.to_string()),
                DateToken::Hour24_2 => result.push_str(&format!("{hour:02}")),
                DateToken::Hour12_1 => result.push_str(&hour12.to_string()),
                DateToken::Hour12_2 => result.push_str(&format!("{hour12:02}")),
                DateToken::Minute1 => result.push_str(&dt.minute().to_string()),
                DateToken::Minute2 => result.push_str(&format!("{:02}", dt.minute())),
                DateToken::Second1 => result.push_str(&dt.second().to_string()),
                DateToken::Second2 => result.push_str(&format!("{:02}", dt.second())),
                DateToken::Millis => {
                    result.push_str(&format!("{:03}", dt.nanosecond() / 1_000_000 % 1000));
                }
                DateToken::Quarter => result.push_str(&((dt.month() - 1) / 3 + 1).to_string()),
                DateToken::AmPmUpper => result.push_str(if hour >= 12 { "PM" } else { "AM" }),
                DateToken::AmPmLower => result.push_str(if hour >= 12 { "pm" } else { "am" }),
                DateToken::EpochSeconds => {
                    result.push_str(&dt.and_utc().timestamp().to_string());
                }
                DateToken::EpochMillis => {
                    result.push_str(&dt.and_utc().timestamp_millis().to_string());
                }
                DateToken::Literal(s) => result.push_str(s),
            }
        }
        result
    }
}

/// Format with the default format: date only at midnight, date + time otherwise
pub fn format_date_default(dt: &NaiveDateTime) -> String {
    let code = if dt.time() == chrono::NaiveTime::MIN {
        DEFAULT_DATE_FORMAT
    } else {
        DEFAULT_DATETIME_FORMAT
    };
    DateFormat::parse(code).map_or_else(|| dt.to_string(), |fmt| fmt.format(dt))
}

/// Parse a moment-style format code into tokens
///
/// # Indexing safety
/// Manual bounds checks (`i + count < chars.len()`) guard every index.
#[allow(clippy::indexing_slicing)]
fn parse_date_format_tokens(format_code: &str) -> Option<Vec<DateToken>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = format_code.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // [escaped text]
        if c == '[' {
            let mut literal = String::new();
            i += 1;
            while i < chars.len() && chars[i] != ']' {
                literal.push(chars[i]);
                i += 1;
            }
            if i >= chars.len() {
                return None;
            }
            i += 1; // skip closing bracket
            tokens.push(DateToken::Literal(literal));
            continue;
        }

        // Count consecutive same characters (case sensitive)
        let mut count = 1;
        while i + count < chars.len() && chars[i + count] == c {
            count += 1;
        }

        let token = match (c, count) {
            ('Y', 4..) => Some(DateToken::Year4),
            ('Y', 2..=3) => Some(DateToken::Year2),
            ('M', 1) => Some(DateToken::Month1),
            ('M', 2) => Some(DateToken::Month2),
            ('M', 3) => Some(DateToken::Month3),
            ('M', 4..) => Some(DateToken::Month4),
            ('D', 1) => Some(DateToken::Day1),
            ('D', 2..) => Some(DateToken::Day2),
            ('d', 1) => Some(DateToken::Weekday1),
            ('d', 2..=3) => Some(DateToken::Weekday3),
            ('d', 4..) => Some(DateToken::Weekday4),
            ('H', 1) => Some(DateToken::Hour24_1),
            ('H', 2..) => Some(DateToken::Hour24_2),
            ('h', 1) => Some(DateToken::Hour12_1),
            ('h', 2..) => Some(DateToken::Hour12_2),
            ('m', 1) => Some(DateToken::Minute1),
            ('m', 2..) => Some(DateToken::Minute2),
            ('s', 1) => Some(DateToken::Second1),
            ('s', 2..) => Some(DateToken::Second2),
            ('S', _) => Some(DateToken::Millis),
            ('Q', 1) => Some(DateToken::Quarter),
            ('A', 1) => Some(DateToken::AmPmUpper),
            ('a', 1) => Some(DateToken::AmPmLower),
            ('X', 1) => Some(DateToken::EpochSeconds),
            ('x', 1) => Some(DateToken::EpochMillis),
            _ => None,
        };

        match token {
            Some(token) => {
                tokens.push(token);
                i += count;
            }
            None => {
                tokens.push(DateToken::Literal(c.to_string()));
                i += 1;
            }
        }
    }

    Some(tokens)
}

/// Interpret a raw cell value as a timestamp.
///
/// Numbers are epoch milliseconds; strings may be ISO dates, ISO date-times
/// (space or `T` separated, optional fraction) or RFC 3339.
#[allow(clippy::cast_possible_truncation)]
pub fn parse_date(raw: &RawValue) -> Option<NaiveDateTime> {
    match raw {
        RawValue::Int(ms) => DateTime::from_timestamp_millis(*ms).map(|d| d.naive_utc()),
        RawValue::Float(ms) if ms.is_finite() && ms.abs() < 9.0e15 => {
            DateTime::from_timestamp_millis(ms.round() as i64).map(|d| d.naive_utc())
        }
        RawValue::String(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%d", "%Y%m%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn month_abbrev(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        _ => "???",
    }
}

fn month_full(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "???",
    }
}

fn day_abbrev(day_of_week: u32) -> &'static str {
    match day_of_week {
        0 => "Sun",
        1 => "Mon",
        2 => "Tue",
        3 => "Wed",
        4 => "Thu",
        5 => "Fri",
        6 => "Sat",
        _ => "???",
    }
}

fn day_full(day_of_week: u32) -> &'static str {
    match day_of_week {
        0 => "Sunday",
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        6 => "Saturday",
        _ => "???",
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_thousands_and_decimals() {
        let fmt = NumericFormat::parse("0,0.00").unwrap();
        assert_eq!(fmt.decimals, 2);
        assert!(fmt.thousands);
        assert_eq!(fmt.format(1_234_567.891), "1,234,567.89");
    }

    #[test]
    fn test_percentage() {
        let fmt = NumericFormat::parse("0.0%").unwrap();
        assert_eq!(fmt.format(0.125), "12.5%");
    }

    #[test]
    fn test_currency_negative() {
        let fmt = NumericFormat::parse("$0,0.00").unwrap();
        assert_eq!(fmt.format(-1234.5), "-$1,234.50");
    }

    #[test]
    fn test_malformed_codes() {
        assert!(NumericFormat::parse("").is_none());
        assert!(NumericFormat::parse("abc").is_none());
        assert!(NumericFormat::parse("0.0.0").is_none());
        assert!(NumericFormat::parse("0.[00").is_none());
        assert!(NumericFormat::parse(",.").is_none());
    }

    #[test]
    fn test_scientific() {
        assert_eq!(format_scientific(1_234_567.0, 2), "1.23e+6");
        assert_eq!(format_scientific(0.000_123, 2), "1.23e-4");
        assert_eq!(format_scientific(-1_234_567.0, 1), "-1.2e+6");
        assert_eq!(format_scientific(0.0, 2), "0.00e+0");
        // mantissa rounding carries into the exponent
        assert_eq!(format_scientific(9.999, 2), "1.00e+1");
    }

    #[test]
    fn test_engineering() {
        assert_eq!(format_engineering(123_456.0, 2), "123.46e+3");
        assert_eq!(format_engineering(0.001_5, 1), "1.5e-3");
        assert_eq!(format_engineering(999_999.0, 1), "1.0e+6");
    }

    #[test]
    fn test_thousands_negative_zero() {
        assert_eq!(format_with_thousands(-0.001, 2), "0.00");
        assert_eq!(format_with_thousands(-1234.0, 0), "-1,234");
    }

    #[test]
    fn test_date_tokens() {
        let fmt = DateFormat::parse("YYYY-MM-DD HH:mm:ss").unwrap();
        let dt = NaiveDate::from_ymd_opt(2021, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 7)
            .unwrap();
        assert_eq!(fmt.format(&dt), "2021-03-04 05:06:07");
    }

    #[test]
    fn test_date_twelve_hour() {
        let fmt = DateFormat::parse("h:mm A").unwrap();
        let dt = NaiveDate::from_ymd_opt(2021, 3, 4)
            .unwrap()
            .and_hms_opt(0, 5, 0)
            .unwrap();
        assert_eq!(fmt.format(&dt), "12:05 AM");
    }

    #[test]
    fn test_date_escaped_literal() {
        let fmt = DateFormat::parse("[Q]Q YYYY").unwrap();
        let dt = NaiveDate::from_ymd_opt(2020, 8, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(fmt.format(&dt), "Q3 2020");
    }

    #[test]
    fn test_date_format_rejects() {
        assert!(DateFormat::parse("[unterminated").is_none());
        assert!(DateFormat::parse("---").is_none());
    }

    #[test]
    fn test_parse_date_inputs() {
        let expected = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_date(&RawValue::Int(946_684_800_000)), Some(expected));
        assert_eq!(
            parse_date(&RawValue::String("2000-01-01".into())),
            Some(expected)
        );
        assert_eq!(
            parse_date(&RawValue::String("2000-01-01 00:00:00".into())),
            Some(expected)
        );
        assert_eq!(parse_date(&RawValue::String("not a date".into())), None);
        assert_eq!(parse_date(&RawValue::Null), None);
    }

    #[test]
    fn test_default_date_format() {
        let midnight = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(format_date_default(&midnight), "2000-01-01");
        let afternoon = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(13, 30, 0)
            .unwrap();
        assert_eq!(format_date_default(&afternoon), "2000-01-01 13:30:00");
    }
}
