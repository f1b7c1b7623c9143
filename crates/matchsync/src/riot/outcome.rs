//! Classified result of a single upstream call.

use thiserror::Error;

/// Status reported by [`UpstreamError::status_code`] when no HTTP status exists
/// (timeouts, connection failures, undecodable bodies).
pub const NO_STATUS: u16 = 0;

/// A non-rate-limit failure of an upstream call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-2xx, non-429 status.
    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The call did not complete within its timeout.
    #[error("upstream request timed out: {url}")]
    Timeout { url: String },

    /// Connection-level failure before any response was received.
    #[error("upstream transport error: {message}")]
    Transport { message: String },

    /// A 2xx response whose body could not be decoded.
    #[error("malformed upstream response: {message}")]
    Malformed { message: String },
}

impl UpstreamError {
    /// HTTP status of the failure, or [`NO_STATUS`] for non-HTTP failures.
    #[inline]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Status { status, .. } => *status,
            _ => NO_STATUS,
        }
    }

    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Outcome of one upstream call: exactly one of success, rate-limited, or error.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum FetchOutcome<T> {
    Success(T),
    /// HTTP 429. `retry_after_secs` is the parsed `Retry-After` header (0 when
    /// absent or non-numeric).
    RateLimited { retry_after_secs: u64 },
    Error(UpstreamError),
}

impl<T> FetchOutcome<T> {
    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Parse a `Retry-After` value in whole seconds.
///
/// HTTP-date forms and garbage both map to 0; the value is advisory only.
pub fn parse_retry_after(value: Option<&str>) -> u64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_is_sentinel_for_non_http_failures() {
        let status = UpstreamError::Status {
            status: 503,
            body: "down".to_string(),
        };
        assert_eq!(status.status_code(), 503);

        let timeout = UpstreamError::Timeout {
            url: "https://x/y".to_string(),
        };
        assert_eq!(timeout.status_code(), NO_STATUS);
        assert!(timeout.is_timeout());

        let transport = UpstreamError::Transport {
            message: "refused".to_string(),
        };
        assert_eq!(transport.status_code(), NO_STATUS);
        assert!(!transport.is_timeout());
    }

    #[test]
    fn display_preserves_status_and_body() {
        let err = UpstreamError::Status {
            status: 403,
            body: "Forbidden".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("Forbidden"));
    }

    #[test]
    fn parse_retry_after_defaults_to_zero() {
        assert_eq!(parse_retry_after(Some("12")), 12);
        assert_eq!(parse_retry_after(Some(" 7 ")), 7);
        assert_eq!(parse_retry_after(Some("1.9")), 1);
        assert_eq!(parse_retry_after(Some("Wed, 21 Oct 2015 07:28:00 GMT")), 0);
        assert_eq!(parse_retry_after(Some("-3")), 0);
        assert_eq!(parse_retry_after(None), 0);
    }
}
