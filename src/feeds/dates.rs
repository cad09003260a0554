//! Feed date negotiation.
//!
//! Feeds in the wild mix RFC 1123, RFC 3339 and a handful of looser
//! variants. Candidates are tried in a fixed order and the first format
//! that parses wins; every result is normalized to UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// One accepted date shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `2006-01-02T15:04:05Z07:00`, with or without fractional seconds.
    Rfc3339,
    /// `Mon, 02 Jan 2006 15:04:05 -0700` and named zones such as `GMT`.
    Rfc1123,
    /// `Mon, 2 Jan 2006 15:04:05 XYZ` with an unrecognized zone, read as UTC.
    Rfc1123UnknownZone,
    /// `Mon, 02 Jan 2006 15:04:05` with no zone, read as UTC.
    Rfc1123NoZone,
    /// `2006-01-02 15:04:05 -0700`.
    SpacedWithOffset,
    /// `2006-01-02 15:04:05`, read as UTC.
    SpacedNoZone,
    /// `2006-01-02T15:04:05`, read as UTC.
    IsoNoZone,
    /// `2006-01-02`, midnight UTC.
    DateOnly,
}

/// Candidate formats in priority order.
pub const DATE_FORMATS: &[DateFormat] = &[
    DateFormat::Rfc3339,
    DateFormat::Rfc1123,
    DateFormat::Rfc1123UnknownZone,
    DateFormat::Rfc1123NoZone,
    DateFormat::SpacedWithOffset,
    DateFormat::SpacedNoZone,
    DateFormat::IsoNoZone,
    DateFormat::DateOnly,
];

impl DateFormat {
    /// Try to parse `s` in this format.
    pub fn parse(self, s: &str) -> Option<DateTime<Utc>> {
        match self {
            DateFormat::Rfc3339 => DateTime::parse_from_rfc3339(s).ok().map(|d| d.to_utc()),
            DateFormat::Rfc1123 => DateTime::parse_from_rfc2822(without_weekday(s))
                .ok()
                .map(|d| d.to_utc()),
            DateFormat::Rfc1123UnknownZone => {
                let (head, zone) = without_weekday(s).rsplit_once(' ')?;
                if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
                    return None;
                }
                parse_naive_utc(head, &["%d %b %Y %H:%M:%S"])
            }
            DateFormat::Rfc1123NoZone => {
                parse_naive_utc(without_weekday(s), &["%d %b %Y %H:%M:%S"])
            }
            DateFormat::SpacedWithOffset => DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z")
                .ok()
                .map(|d| d.to_utc()),
            DateFormat::SpacedNoZone => {
                parse_naive_utc(s, &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"])
            }
            DateFormat::IsoNoZone => {
                parse_naive_utc(s, &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"])
            }
            DateFormat::DateOnly => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| Utc.from_utc_datetime(&naive)),
        }
    }
}

/// Drop a leading `Mon, ` so a weekday that disagrees with the date is ignored.
fn without_weekday(s: &str) -> &str {
    match s.split_once(',') {
        Some((day, rest)) if !day.is_empty() && day.chars().all(|c| c.is_ascii_alphabetic()) => {
            rest.trim_start()
        }
        _ => s,
    }
}

fn parse_naive_utc(s: &str, patterns: &[&str]) -> Option<DateTime<Utc>> {
    patterns
        .iter()
        .find_map(|p| NaiveDateTime::parse_from_str(s, p).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parse a feed date, returning the first successful candidate.
///
/// Returns `None` for empty input or when no format matches; callers keep
/// the item and leave its date empty.
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS.iter().find_map(|format| format.parse(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_rfc1123_with_numeric_zone() {
        assert_eq!(
            parse_feed_date("Mon, 02 Jan 2006 15:04:05 -0700"),
            Some(utc(2006, 1, 2, 22, 4, 5))
        );
    }

    #[test]
    fn test_rfc3339_zulu() {
        assert_eq!(
            parse_feed_date("2006-01-02T15:04:05Z"),
            Some(utc(2006, 1, 2, 15, 4, 5))
        );
    }

    #[test]
    fn test_spaced_without_zone_is_utc() {
        assert_eq!(
            parse_feed_date("2006-01-02 15:04:05"),
            Some(utc(2006, 1, 2, 15, 4, 5))
        );
    }

    #[test]
    fn test_rfc3339_fractional_and_offset() {
        assert_eq!(
            parse_feed_date("2006-01-02T15:04:05.123+02:00"),
            Some(utc(2006, 1, 2, 13, 4, 5) + chrono::Duration::milliseconds(123))
        );
    }

    #[test]
    fn test_rfc1123_named_and_unknown_zones() {
        assert_eq!(
            parse_feed_date("Mon, 02 Jan 2006 15:04:05 GMT"),
            Some(utc(2006, 1, 2, 15, 4, 5))
        );
        assert_eq!(
            parse_feed_date("Mon, 2 Jan 2006 15:04:05 CEST"),
            Some(utc(2006, 1, 2, 15, 4, 5))
        );
    }

    #[test]
    fn test_rfc1123_ignores_mismatched_weekday() {
        assert_eq!(
            parse_feed_date("Tue, 02 Jan 2006 15:04:05 -0700"),
            Some(utc(2006, 1, 2, 22, 4, 5))
        );
        assert_eq!(
            parse_feed_date("Tue, 02 Jan 2006 15:04:05 GMT"),
            Some(utc(2006, 1, 2, 15, 4, 5))
        );
        assert_eq!(
            parse_feed_date("Fri, 2 Jan 2006 15:04:05 CEST"),
            Some(utc(2006, 1, 2, 15, 4, 5))
        );
        assert_eq!(
            parse_feed_date("Sun, 02 Jan 2006 15:04:05"),
            Some(utc(2006, 1, 2, 15, 4, 5))
        );
    }

    #[test]
    fn test_spaced_with_offset() {
        assert_eq!(
            parse_feed_date("2006-01-02 15:04:05 +0100"),
            Some(utc(2006, 1, 2, 14, 4, 5))
        );
    }

    #[test]
    fn test_date_only_and_iso_without_zone() {
        assert_eq!(parse_feed_date("2006-01-02"), Some(utc(2006, 1, 2, 0, 0, 0)));
        assert_eq!(
            parse_feed_date(" 2006-01-02T15:04:05 "),
            Some(utc(2006, 1, 2, 15, 4, 5))
        );
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(parse_feed_date(""), None);
        assert_eq!(parse_feed_date("last tuesday"), None);
    }
}
