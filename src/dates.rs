// ABOUTME: Date helpers: OA-date conversions, basic date parsing and the
// yyyy/MM/dd-style format token handling used by format_date and parse_date

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

const DAYS_PER_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const DAYS_EPOCH: f64 = 25569.0;

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0) && ((year % 100 != 0) || (year % 400 == 0))
}

fn year_days(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

fn month_days(year: i32, month0: usize) -> u32 {
    if is_leap_year(year) && month0 == 1 {
        29
    } else {
        DAYS_PER_MONTH[month0]
    }
}

pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Convert a date to a fractional day number (25569.0 at 1970-01-01).
pub fn to_oa_date(date: &NaiveDateTime) -> f64 {
    let year = date.year();
    let mut result = 1.0;
    for y in 1900..year {
        result += year_days(y) as f64;
    }
    for m in 0..date.month0() as usize {
        result += month_days(year, m) as f64;
    }
    result += date.day() as f64;
    result += date.hour() as f64 / 24.0;
    result += date.minute() as f64 / 24.0 / 60.0;
    result += date.second() as f64 / 24.0 / 60.0 / 60.0;
    result += (date.nanosecond() / 1000) as f64 / 24.0 / 60.0 / 60.0 / 1000.0 / 1000.0;
    result
}

/// Convert a fractional day number back to a date.
pub fn to_date(oadate: f64) -> NaiveDateTime {
    let mut value = oadate - DAYS_EPOCH;
    let mut year = 1970;
    while value > year_days(year) as f64 {
        value -= year_days(year) as f64;
        year += 1;
    }
    let mut month0 = 0usize;
    while value >= month_days(year, month0) as f64 {
        value -= month_days(year, month0) as f64;
        month0 += 1;
    }
    let day = value.trunc() as u32 + 1;
    value -= value.trunc();
    let hours = (value * 24.0).trunc();
    value = value * 24.0 - hours;
    let minutes = (value * 60.0).trunc();
    value = value * 60.0 - minutes;
    let seconds = (value * 60.0).trunc();
    value = value * 60.0 - seconds;
    let micros = (value * 1000.0 * 1000.0).trunc();
    NaiveDate::from_ymd_opt(year, month0 as u32 + 1, day)
        .and_then(|d| {
            d.and_hms_micro_opt(hours as u32, minutes as u32, seconds as u32, micros as u32)
        })
        .unwrap_or(NaiveDateTime::UNIX_EPOCH)
}

/// Date from a Unix timestamp in (possibly fractional) seconds.
pub fn from_timestamp(seconds: f64) -> Option<NaiveDateTime> {
    chrono::DateTime::from_timestamp_micros((seconds * 1_000_000.0) as i64)
        .map(|d| d.naive_utc())
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Strict conversion of `yyyyMMdd`, `yyyyMMddHH` and `yyyyMMddHHmmss`
/// strings; any other length fails.
pub fn parse_basic_date(s: &str) -> Option<NaiveDateTime> {
    if !all_digits(s) {
        return None;
    }
    if s.len() != 8 && s.len() != 10 && s.len() != 14 {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[4..6].parse().ok()?;
    let day: u32 = s[6..8].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    match s.len() {
        8 => date.and_hms_opt(0, 0, 0),
        10 => {
            let hour: u32 = s[8..10].parse().ok()?;
            date.and_hms_opt(hour, 0, 0)
        }
        14 => {
            let hour: u32 = s[8..10].parse().ok()?;
            let minute: u32 = s[10..12].parse().ok()?;
            let second: u32 = s[12..14].parse().ok()?;
            date.and_hms_opt(hour, minute, second)
        }
        _ => None,
    }
}

fn fill(value: i64, length: usize) -> String {
    let mut result = value.to_string();
    while result.len() < length {
        result.insert(0, '0');
    }
    result
}

const FORMAT_PARTS: [&str; 7] = ["yyyy", "yy", "MM", "dd", "HH", "mm", "ss"];

/// Render a date using the yyyy/yy/MM/dd/HH/mm/ss format tokens.
pub fn format_date(date: &NaiveDateTime, fmt: &str) -> String {
    let mut result = fmt.to_string();
    if result.contains("yyyy") {
        result = result.replace("yyyy", &fill(date.year() as i64, 4));
    }
    if result.contains("yy") {
        result = result.replace("yy", &fill((date.year() % 100) as i64, 2));
    }
    if result.contains("MM") {
        result = result.replace("MM", &fill(date.month() as i64, 2));
    }
    if result.contains("dd") {
        result = result.replace("dd", &fill(date.day() as i64, 2));
    }
    if result.contains("HH") {
        result = result.replace("HH", &fill(date.hour() as i64, 2));
    }
    if result.contains("mm") {
        result = result.replace("mm", &fill(date.minute() as i64, 2));
    }
    if result.contains("ss") {
        result = result.replace("ss", &fill(date.second() as i64, 2));
    }
    result
}

/// Parse a string against one format. Succeeds only when the format and
/// the input are both fully consumed and the components form a valid date.
pub fn parse_date(text: &str, fmt: &str) -> Option<NaiveDateTime> {
    let mut s: Vec<char> = text.chars().collect();
    let mut fmt: Vec<char> = fmt.chars().collect();
    let mut vals: Vec<(&'static str, u32)> = Vec::new();

    for part in FORMAT_PARTS {
        let part_chars: Vec<char> = part.chars().collect();
        let idx = match find_subslice(&fmt, &part_chars) {
            Some(idx) => idx,
            None => continue,
        };
        if idx + part.len() > s.len() {
            return None;
        }
        let digits: String = s[idx..idx + part.len()].iter().collect();
        let value: u32 = digits.parse().ok()?;
        vals.push((part, value));
        s.drain(idx..idx + part.len());
        fmt.drain(idx..idx + part.len());
        if s.is_empty() {
            break;
        }
    }

    if !s.is_empty() || fmt.iter().any(|c| "yMdHms".contains(*c)) {
        return None;
    }

    let mut date = NaiveDateTime::UNIX_EPOCH;
    for (part, value) in vals {
        date = match part {
            "yyyy" => date.with_year(value as i32)?,
            "yy" => date.with_year(2000 + value as i32)?,
            "MM" => date.with_month(value)?,
            "dd" => date.with_day(value)?,
            "HH" => date.with_hour(value)?,
            "mm" => date.with_minute(value)?,
            "ss" => date.with_second(value)?,
            _ => date,
        };
    }
    Some(date)
}

/// Try formats in order, returning the first one that fully parses.
pub fn parse_date_multi(text: &str, fmts: &[String]) -> Option<NaiveDateTime> {
    fmts.iter().find_map(|fmt| parse_date(text, fmt))
}

fn find_subslice(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).find(|&i| &haystack[i..i + needle.len()] == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(year: i32, month: u32, day: u32, h: u32, m: u32, s: u32, micro: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_micro_opt(h, m, s, micro)
            .unwrap()
    }

    #[test]
    fn test_is_leap_year() {
        assert!(!is_leap_year(1999));
        assert!(is_leap_year(1980));
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(2000));
    }

    #[test]
    fn test_to_oa_date() {
        assert_eq!(to_oa_date(&dt(1970, 1, 1, 0, 0, 0, 0)), 25569.0);
        assert_eq!(to_oa_date(&dt(2000, 6, 1, 0, 0, 0, 0)), 36678.0);
        assert_eq!(to_oa_date(&dt(2000, 6, 10, 0, 0, 0, 0)), 36687.0);
        assert_eq!(to_oa_date(&dt(1970, 1, 1, 12, 0, 0, 0)), 25569.5);
        assert_eq!(to_oa_date(&dt(2000, 6, 1, 12, 48, 36, 0)), 36678.53375);
    }

    #[test]
    fn test_to_date() {
        assert_eq!(to_date(25569.0), dt(1970, 1, 1, 0, 0, 0, 0));
        assert_eq!(to_date(36678.0), dt(2000, 6, 1, 0, 0, 0, 0));
        assert_eq!(to_date(36687.0), dt(2000, 6, 10, 0, 0, 0, 0));
        assert_eq!(to_date(25569.5), dt(1970, 1, 1, 12, 0, 0, 0));
        assert_eq!(to_date(36678.53375), dt(2000, 6, 1, 12, 48, 36, 0));
    }

    #[test]
    fn test_round_trip() {
        let date = dt(2017, 4, 5, 0, 0, 0, 0);
        assert_eq!(to_date(to_oa_date(&date)), date);
        assert_eq!(to_date(to_oa_date(&date) - 3.0), dt(2017, 4, 2, 0, 0, 0, 0));
    }

    #[test]
    fn test_format_date() {
        let date = dt(2017, 1, 2, 12, 34, 56, 0);
        assert_eq!(format_date(&date, "yyyyMMddHHmmss"), "20170102123456");
        assert_eq!(format_date(&date, "yyyy-MM-dd HH:mm:ss"), "2017-01-02 12:34:56");
        assert_eq!(format_date(&date, "HH"), "12");
        assert_eq!(format_date(&date, "yy"), "17");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("20170102", "yyyyMMdd"),
            Some(dt(2017, 1, 2, 0, 0, 0, 0))
        );
        assert_eq!(parse_date("2017010222", "yyyyMMdd"), None);
        assert_eq!(parse_date("20170102", "yyyyMMddHH"), None);
        assert_eq!(parse_date("20170144", "yyyyMMdd"), None);
        assert_eq!(parse_date("20170229", "yyyyMMdd"), None);
        assert_eq!(
            parse_date("20160229", "yyyyMMdd"),
            Some(dt(2016, 2, 29, 0, 0, 0, 0))
        );
    }

    #[test]
    fn test_parse_date_multi() {
        let fmts: Vec<String> = ["yyyyMMddHHmm", "yyyyMMddHH", "yyyyMMdd"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            parse_date_multi("201701022015", &fmts),
            Some(dt(2017, 1, 2, 20, 15, 0, 0))
        );
        let fmts: Vec<String> = ["yyyyMM", "yyyy"].iter().map(|s| s.to_string()).collect();
        assert_eq!(parse_date_multi("20170112", &fmts), None);
    }

    #[test]
    fn test_parse_time_formats() {
        assert!(parse_date("1245", "HHmm").is_some());
        assert!(parse_date("2512", "HHmm").is_none());
    }
}
