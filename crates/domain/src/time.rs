//! Timestamps.

use chrono::{DateTime, SecondsFormat, Utc};

/// UTC timestamp used for hub bookkeeping, entity updates and event times.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Render a timestamp the way it is persisted (RFC 3339, microsecond precision).
#[must_use]
pub fn format(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a persisted RFC 3339 timestamp back into UTC.
///
/// # Errors
///
/// Returns the chrono parse error when `raw` is not RFC 3339.
pub fn parse(raw: &str) -> Result<Timestamp, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|ts| ts.to_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        assert!(ts >= before);
    }

    #[test]
    fn should_parse_what_format_produces() {
        let ts = now();
        let parsed = parse(&format(ts)).unwrap();
        assert_eq!(parsed.timestamp_micros(), ts.timestamp_micros());
    }

    #[test]
    fn should_reject_garbage_timestamp() {
        assert!(parse("yesterday").is_err());
    }
}
