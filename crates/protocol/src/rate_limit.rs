//! Rate-limit wire conventions.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// HTTP status the server uses to signal rate limiting.
pub const RATE_LIMIT_STATUS: u16 = 429;

/// Parses a `Retry-After` header value into a delay.
///
/// Whole seconds (`"3"`) are the documented form. An HTTP-date
/// (`"Wed, 21 Oct 2015 07:28:00 GMT"`) is also accepted and measured from
/// `now`; dates in the past yield a zero delay. Anything else yields `None`
/// so the caller falls back to its default back-off.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_millis(seconds.saturating_mul(1000)));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?;
    Some(
        (at.with_timezone(&Utc) - now)
            .to_std()
            .unwrap_or(Duration::ZERO),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap()
    }

    #[test]
    fn seconds_are_converted_to_milliseconds() {
        assert_eq!(
            parse_retry_after("3", fixed_now()),
            Some(Duration::from_millis(3000))
        );
        assert_eq!(
            parse_retry_after(" 0 ", fixed_now()),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn http_date_is_measured_from_now() {
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:28:10 GMT", fixed_now()),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn past_http_date_means_no_wait() {
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:00:00 GMT", fixed_now()),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_retry_after("soon", fixed_now()), None);
        assert_eq!(parse_retry_after("-5", fixed_now()), None);
        assert_eq!(parse_retry_after("", fixed_now()), None);
    }
}
