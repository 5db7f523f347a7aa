// src/timeutil.rs
// Timestamp and season helpers. Every kickoff in the system is normalized to
// Europe/Berlin before comparison or display.

use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::FeedError;

pub const BERLIN: Tz = chrono_tz::Europe::Berlin;

const WEEKDAYS_DE: [&str; 7] = ["Mo", "Di", "Mi", "Do", "Fr", "Sa", "So"];

/// Parses an ISO-8601 timestamp, with or without an offset/`Z` marker, into
/// Berlin time. Bare timestamps (OpenLigaDB omits the marker) are read as
/// UTC, so both styles of the same instant convert identically.
pub fn to_berlin(raw: &str) -> Result<DateTime<Tz>, FeedError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&BERLIN));
    }

    // ESPN abbreviates to whole minutes ("2025-08-29T18:45Z"); OpenLigaDB
    // omits the marker entirely. Both normalize through UTC.
    let bare = raw.strip_suffix('Z').unwrap_or(raw);
    let naive = NaiveDateTime::parse_from_str(bare, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(bare, "%Y-%m-%dT%H:%M"))
        .map_err(|_| FeedError::Parse(raw.to_string()))?;
    Ok(Utc.from_utc_datetime(&naive).with_timezone(&BERLIN))
}

/// Season year for Bundesliga/Pokal: a season spanning two calendar years is
/// named after the year it starts in (July cutoff).
pub fn season_year(now: DateTime<Tz>) -> i32 {
    if now.month() >= 7 {
        now.year()
    } else {
        now.year() - 1
    }
}

/// Three-letter German weekday, Monday-first.
pub fn weekday_german(ts: DateTime<Tz>) -> &'static str {
    WEEKDAYS_DE[ts.weekday().num_days_from_monday() as usize]
}

/// Cache bucket key: the current hour. Two calls within the same clock hour
/// share a key; the rollover is what expires cache entries.
pub fn hour_key(now: DateTime<Tz>) -> String {
    now.format("%Y%m%d%H").to_string()
}

/// Start of the given instant's local day (placeholder kickoffs).
pub fn start_of_day(now: DateTime<Tz>) -> DateTime<Tz> {
    now.with_hour(0)
        .and_then(|d| d.with_minute(0))
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_berlin_handles_utc_marker() {
        let dt = to_berlin("2025-08-23T14:00:00Z").unwrap();
        // CEST is UTC+2 in August.
        assert_eq!(dt.hour(), 16);
        assert_eq!(dt.day(), 23);
    }

    #[test]
    fn to_berlin_handles_explicit_offset() {
        let dt = to_berlin("2025-08-23T16:00:00+02:00").unwrap();
        assert_eq!(dt.hour(), 16);
    }

    #[test]
    fn bare_and_marked_inputs_agree_on_the_instant() {
        let marked = to_berlin("2025-01-10T18:30:00Z").unwrap();
        let bare = to_berlin("2025-01-10T18:30:00").unwrap();
        assert_eq!(marked, bare);
        // CET is UTC+1 in January.
        assert_eq!(bare.hour(), 19);
    }

    #[test]
    fn to_berlin_handles_minute_precision_utc() {
        // ESPN scoreboard dates carry no seconds.
        let dt = to_berlin("2025-08-29T18:45Z").unwrap();
        assert_eq!(dt.hour(), 20);
        assert_eq!(dt.minute(), 45);
    }

    #[test]
    fn to_berlin_rejects_garbage() {
        assert!(to_berlin("next tuesday").is_err());
        assert!(to_berlin("").is_err());
    }

    #[test]
    fn season_year_uses_july_cutoff() {
        let june = to_berlin("2025-06-30T12:00:00Z").unwrap();
        let july = to_berlin("2025-07-01T12:00:00Z").unwrap();
        assert_eq!(season_year(june), 2024);
        assert_eq!(season_year(july), 2025);
    }

    #[test]
    fn season_year_is_stable_across_a_season() {
        for raw in [
            "2024-07-01T00:00:00Z",
            "2024-12-31T23:00:00Z",
            "2025-03-15T12:00:00Z",
            "2025-06-30T20:00:00Z",
        ] {
            assert_eq!(season_year(to_berlin(raw).unwrap()), 2024, "{raw}");
        }
    }

    #[test]
    fn weekday_labels_are_german_and_monday_first() {
        // 2025-08-18 is a Monday.
        let mon = to_berlin("2025-08-18T10:00:00Z").unwrap();
        let sun = to_berlin("2025-08-24T10:00:00Z").unwrap();
        assert_eq!(weekday_german(mon), "Mo");
        assert_eq!(weekday_german(sun), "So");
    }

    #[test]
    fn hour_key_truncates_to_the_hour() {
        let a = to_berlin("2025-08-23T14:01:00Z").unwrap();
        let b = to_berlin("2025-08-23T14:59:59Z").unwrap();
        let c = to_berlin("2025-08-23T15:00:00Z").unwrap();
        assert_eq!(hour_key(a), hour_key(b));
        assert_ne!(hour_key(b), hour_key(c));
    }

    #[test]
    fn start_of_day_zeroes_the_time() {
        let dt = to_berlin("2025-08-23T14:31:07Z").unwrap();
        let sod = start_of_day(dt);
        assert_eq!(sod.hour(), 0);
        assert_eq!(sod.minute(), 0);
        assert_eq!(sod.second(), 0);
        assert_eq!(sod.date_naive(), dt.date_naive());
    }
}
