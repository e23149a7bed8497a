//! HTTP cache validation module
//!
//! `Last-Modified` / `If-Modified-Since` handling with HTTP-date formatting.

use chrono::{DateTime, Utc};
use std::time::SystemTime;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Format a timestamp as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an HTTP-date; `None` when malformed
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// True when the client copy is at least as new as `modified` (second precision)
pub fn is_not_modified(if_modified_since: Option<&str>, modified: SystemTime) -> bool {
    let Some(since) = if_modified_since.and_then(parse_http_date) else {
        return false;
    };

    DateTime::<Utc>::from(modified).timestamp() <= since.timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_format_http_date() {
        assert_eq!(format_http_date(at(784_111_777)), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn test_parse_round_trip() {
        let parsed = parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
        assert_eq!(parsed.timestamp(), 784_111_777);
        assert!(parse_http_date("yesterday").is_none());
    }

    #[test]
    fn test_not_modified() {
        let modified = at(784_111_777) + Duration::from_millis(400);
        assert!(is_not_modified(Some("Sun, 06 Nov 1994 08:49:37 GMT"), modified));
        assert!(is_not_modified(Some("Mon, 07 Nov 1994 00:00:00 GMT"), modified));
        assert!(!is_not_modified(Some("Sat, 05 Nov 1994 00:00:00 GMT"), modified));
        assert!(!is_not_modified(Some("garbage"), modified));
        assert!(!is_not_modified(None, modified));
    }
}
