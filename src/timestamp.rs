//! Timestamp formats for the two supported engines.
//!
//! Everything is written in one canonical text form (`2021-03-04T12:00:00.000Z`).
//! Engines may hand values back in their own rendering, so every read path runs
//! stored values through [`Dialect::normalize`] before they reach callers.

use chrono::{DateTime, Datelike, NaiveDateTime, ParseError, TimeDelta, Utc};

/// Canonical write format: UTC, millisecond precision, literal `Z`.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

const CANONICAL_READ_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// `2021-03-04 12:00:00.000+00:00`
const SQLITE_READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%:z";

/// `2021-03-04 12:00:00.000+00`, the text rendering of `timestamptz`.
const POSTGRES_READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%#z";

/// Render an instant in the canonical write format.
pub fn format_canonical(instant: DateTime<Utc>) -> String {
    instant.format(CANONICAL_FORMAT).to_string()
}

/// Latest instant the canonical text can express.
const LATEST_CANONICAL: &str = "9999-12-31T23:59:59.999Z";

/// Render a range bound for text comparison against stored timestamps.
///
/// Years past 9999 render with a leading `+` and would sort before every
/// stored row, so they are clamped to the last representable millisecond.
pub fn format_range_bound(instant: DateTime<Utc>) -> String {
    if instant.year() > 9999 {
        LATEST_CANONICAL.to_string()
    } else {
        format_canonical(instant)
    }
}

/// The instant `hours` hours before `now`.
///
/// Windows reaching past the earliest representable instant start there
/// instead, which covers every stored row.
pub fn hours_before(now: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    TimeDelta::try_hours(hours)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Parse a canonical timestamp.
pub fn parse_canonical(value: &str) -> Result<DateTime<Utc>, ParseError> {
    NaiveDateTime::parse_from_str(value, CANONICAL_READ_FORMAT).map(|naive| naive.and_utc())
}

/// Backing engine, selecting how stored timestamps are read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Embedded file database.
    Sqlite,
    /// Client-server database.
    Postgres,
}

impl Dialect {
    /// Engine-specific rendering this dialect may return for a stored timestamp.
    fn read_format(self) -> &'static str {
        match self {
            Dialect::Sqlite => SQLITE_READ_FORMAT,
            Dialect::Postgres => POSTGRES_READ_FORMAT,
        }
    }

    /// Parse a stored timestamp in either the engine rendering or canonical form.
    pub fn parse(self, value: &str) -> Result<DateTime<Utc>, ParseError> {
        DateTime::parse_from_str(value, self.read_format())
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| parse_canonical(value))
    }

    /// Re-render a stored timestamp into the canonical write format.
    pub fn normalize(self, value: &str) -> Result<String, ParseError> {
        self.parse(value).map(format_canonical)
    }

    /// Normalize in place, leaving the original text when it does not parse.
    pub(crate) fn normalize_lossy(self, value: &mut String) {
        match self.normalize(value) {
            Ok(canonical) => *value = canonical,
            Err(err) => {
                tracing::debug!(value = %value, error = %err, "leaving stored timestamp as-is");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn canonical_format_keeps_millis() {
        let instant = Utc.with_ymd_and_hms(2021, 3, 4, 12, 0, 0).unwrap();
        assert_eq!(format_canonical(instant), "2021-03-04T12:00:00.000Z");

        let instant = instant + chrono::Duration::milliseconds(7);
        assert_eq!(format_canonical(instant), "2021-03-04T12:00:00.007Z");
    }

    #[test]
    fn huge_windows_start_at_the_earliest_instant() {
        let now = Utc.with_ymd_and_hms(2021, 3, 4, 12, 0, 0).unwrap();

        assert_eq!(hours_before(now, 24), now - TimeDelta::hours(24));
        assert_eq!(hours_before(now, i64::MAX), DateTime::<Utc>::MIN_UTC);
        assert_eq!(hours_before(now, 10_000_000_000), DateTime::<Utc>::MIN_UTC);

        // The earliest bound sorts before any stored timestamp.
        let earliest = format_range_bound(hours_before(now, i64::MAX));
        assert!(earliest.as_str() < "0000-01-01T00:00:00.000Z");
    }

    #[test]
    fn far_future_bounds_are_clamped() {
        assert_eq!(
            format_range_bound(DateTime::<Utc>::MAX_UTC),
            "9999-12-31T23:59:59.999Z"
        );
        let now = Utc.with_ymd_and_hms(2021, 3, 4, 12, 0, 0).unwrap();
        assert_eq!(format_range_bound(now), "2021-03-04T12:00:00.000Z");
    }

    #[test]
    fn sqlite_rendering_is_normalized() {
        let normalized = Dialect::Sqlite
            .normalize("2021-03-04 12:00:00.250+00:00")
            .unwrap();
        assert_eq!(normalized, "2021-03-04T12:00:00.250Z");
    }

    #[test]
    fn sqlite_rendering_with_offset_is_shifted_to_utc() {
        let normalized = Dialect::Sqlite
            .normalize("2021-03-04 14:00:00.000+02:00")
            .unwrap();
        assert_eq!(normalized, "2021-03-04T12:00:00.000Z");
    }

    #[test]
    fn postgres_rendering_is_normalized() {
        let normalized = Dialect::Postgres
            .normalize("2021-03-04 12:00:00.5+00")
            .unwrap();
        assert_eq!(normalized, "2021-03-04T12:00:00.500Z");
    }

    #[test]
    fn canonical_input_round_trips() {
        for dialect in [Dialect::Sqlite, Dialect::Postgres] {
            assert_eq!(
                dialect.normalize("2021-03-04T12:00:00.000Z").unwrap(),
                "2021-03-04T12:00:00.000Z"
            );
        }
    }

    #[test]
    fn garbage_is_left_alone_by_lossy_normalization() {
        let mut value = "yesterday".to_string();
        Dialect::Sqlite.normalize_lossy(&mut value);
        assert_eq!(value, "yesterday");
        assert!(Dialect::Sqlite.normalize("yesterday").is_err());
    }
}
