//! Small HTTP helpers shared by the service clients.

use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Fallback delay when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Seconds from a `Retry-After` header. HTTP-date values are not honored.
pub(crate) fn retry_after_secs(headers: &HeaderMap) -> u64 {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn parses_delta_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("12"));
        assert_eq!(retry_after_secs(&headers), 12);
    }

    #[test]
    fn falls_back_when_missing_or_date() {
        assert_eq!(retry_after_secs(&HeaderMap::new()), DEFAULT_RETRY_AFTER_SECS);

        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after_secs(&headers), DEFAULT_RETRY_AFTER_SECS);
    }
}
