//! Request and trace identifiers used to correlate log records.
//!
//! The request ID is scoped to this service: it is taken verbatim from an
//! inbound `X-Request-ID` header (any bytes, including non-UTF-8) or freshly
//! generated. The trace ID comes
//! from a distributed-tracing propagation header when a valid one is present:
//!
//! 1. W3C `traceparent` (`00-<32 hex trace id>-<16 hex parent id>-<2 hex flags>`)
//! 2. B3 `X-B3-TraceId` (16 or 32 lowercase hex)
//! 3. otherwise empty
//!
//! Neither identifier is an authentication mechanism; callers may send anything.

use http::{HeaderMap, HeaderName, HeaderValue};
use rand::rngs::OsRng;
use rand::RngCore;

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
pub static TRACEPARENT_HEADER: HeaderName = HeaderName::from_static("traceparent");
pub static B3_TRACE_ID_HEADER: HeaderName = HeaderName::from_static("x-b3-traceid");

/// Random bytes in a generated request ID (hex-encoded to twice this length).
const REQUEST_ID_BYTES: usize = 16;

/// Timestamp layout used when the OS random source is unavailable.
const FALLBACK_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%.9f";

// version "-" trace-id "-" parent-id "-" flags
const TRACEPARENT_LEN: usize = 2 + 1 + 32 + 1 + 16 + 1 + 2;

/// Correlation identifiers attached to a single request.
///
/// Inserted into request extensions by the correlation middleware so handlers
/// can reach it through `Extension<RequestCorrelation>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestCorrelation {
    /// Printable form of the request ID, used in spans and log fields.
    pub request_id: String,
    /// Exact bytes echoed in the response `X-Request-ID` header.
    pub request_id_header: Option<HeaderValue>,
    /// Empty when no valid propagation header was supplied.
    pub trace_id: String,
}

impl RequestCorrelation {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let (request_id, request_id_header) = match inbound_request_id(headers) {
            // Inbound bytes are kept as sent; only the log form is made UTF-8.
            Some(value) => (
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
                Some(value.clone()),
            ),
            None => {
                let id = new_request_id();
                let header = HeaderValue::from_str(&id).ok();
                (id, header)
            }
        };

        Self {
            request_id,
            request_id_header,
            trace_id: extract_trace_id(headers),
        }
    }
}

/// Inbound `X-Request-ID` if present and non-empty. No other validation.
pub fn inbound_request_id(headers: &HeaderMap) -> Option<&HeaderValue> {
    headers.get(&REQUEST_ID_HEADER).filter(|v| !v.is_empty())
}

/// 16 random bytes as 32 lowercase hex characters.
pub fn new_request_id() -> String {
    let mut bytes = [0u8; REQUEST_ID_BYTES];
    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => hex::encode(bytes),
        Err(e) => {
            tracing::debug!(error = %e, "OS random source unavailable, using timestamp request ID");
            fallback_request_id(chrono::Utc::now())
        }
    }
}

fn fallback_request_id(now: chrono::DateTime<chrono::Utc>) -> String {
    hex::encode(now.format(FALLBACK_TIMESTAMP_FORMAT).to_string())
}

/// Trace ID from `traceparent`, falling back to `X-B3-TraceId`, else empty.
pub fn extract_trace_id(headers: &HeaderMap) -> String {
    let header = |name: &HeaderName| headers.get(name).and_then(|v| v.to_str().ok());

    header(&TRACEPARENT_HEADER)
        .and_then(parse_traceparent)
        .or_else(|| header(&B3_TRACE_ID_HEADER).and_then(parse_b3_trace_id))
        .map(str::to_string)
        .unwrap_or_default()
}

/// Validates a W3C `traceparent` value and returns its trace-id field.
///
/// Surrounding whitespace is ignored, as are any fields after the flags.
/// All-zero trace or parent IDs are invalid.
pub fn parse_traceparent(value: &str) -> Option<&str> {
    let value = value.trim();
    if value.len() < TRACEPARENT_LEN || !value.is_char_boundary(TRACEPARENT_LEN) {
        return None;
    }

    let (head, rest) = value.split_at(TRACEPARENT_LEN);
    if !rest.is_empty() && !rest.starts_with('-') {
        return None;
    }

    let mut fields = head.split('-');
    let version = fields.next()?;
    let trace_id = fields.next()?;
    let parent_id = fields.next()?;
    let flags = fields.next()?;
    if fields.next().is_some() {
        return None;
    }

    let well_formed = is_lower_hex(version, 2)
        && is_lower_hex(trace_id, 32)
        && is_lower_hex(parent_id, 16)
        && is_lower_hex(flags, 2);
    if !well_formed || all_zeros(trace_id) || all_zeros(parent_id) {
        return None;
    }

    Some(trace_id)
}

/// Accepts a B3 trace ID of exactly 16 or 32 lowercase hex characters.
pub fn parse_b3_trace_id(value: &str) -> Option<&str> {
    let value = value.trim();
    (is_lower_hex(value, 16) || is_lower_hex(value, 32)).then_some(value)
}

fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn all_zeros(s: &str) -> bool {
    s.bytes().all(|b| b == b'0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use http::HeaderValue;

    const TRACEPARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";
    const TRACE_ID: &str = "4bf92f3577b34da6a3ce929d0e0e4736";
    const B3_TRACE_ID: &str = "463ac35c9f6413ad48485a3953bb6124";

    fn headers(pairs: &[(&HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert((*name).clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn generated_request_ids_are_32_lower_hex_and_distinct() {
        let a = new_request_id();
        let b = new_request_id();
        assert!(is_lower_hex(&a, 32), "unexpected id {a}");
        assert!(is_lower_hex(&b, 32), "unexpected id {b}");
        assert_ne!(a, b);
    }

    #[test]
    fn fallback_request_id_is_hex_of_timestamp() {
        let now = chrono::Utc.with_ymd_and_hms(2025, 10, 5, 12, 34, 56).unwrap();
        let id = fallback_request_id(now);
        assert!(!id.is_empty());
        let decoded = String::from_utf8(hex::decode(&id).unwrap()).unwrap();
        assert_eq!(decoded, "20251005123456.000000000");
    }

    #[test]
    fn inbound_request_id_is_used_verbatim() {
        let map = headers(&[(&REQUEST_ID_HEADER, "fixed-id-123")]);
        let correlation = RequestCorrelation::from_headers(&map);
        assert_eq!(correlation.request_id, "fixed-id-123");
        assert_eq!(
            correlation.request_id_header,
            Some(HeaderValue::from_static("fixed-id-123"))
        );
    }

    #[test]
    fn non_utf8_request_id_keeps_raw_bytes() {
        let raw = HeaderValue::from_bytes(b"req-\xe9t\xe9-42").unwrap();
        let mut map = HeaderMap::new();
        map.insert(REQUEST_ID_HEADER.clone(), raw.clone());

        let correlation = RequestCorrelation::from_headers(&map);
        assert_eq!(correlation.request_id_header, Some(raw));
        assert_eq!(correlation.request_id, "req-\u{fffd}t\u{fffd}-42");
    }

    #[test]
    fn empty_request_id_is_replaced() {
        let map = headers(&[(&REQUEST_ID_HEADER, "")]);
        assert!(inbound_request_id(&map).is_none());

        let correlation = RequestCorrelation::from_headers(&map);
        assert!(is_lower_hex(&correlation.request_id, 32));
        assert_eq!(
            correlation.request_id_header.as_ref().map(HeaderValue::as_bytes),
            Some(correlation.request_id.as_bytes())
        );
    }

    #[test]
    fn traceparent_yields_trace_id() {
        assert_eq!(parse_traceparent(TRACEPARENT), Some(TRACE_ID));
        assert_eq!(parse_traceparent(&format!("  {TRACEPARENT}\t")), Some(TRACE_ID));
        assert_eq!(
            parse_traceparent(&format!("{TRACEPARENT}-future-field")),
            Some(TRACE_ID)
        );
    }

    #[test]
    fn malformed_traceparent_is_rejected() {
        let cases = [
            "",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7",
            "00-4BF92F3577B34DA6A3CE929D0E0E4736-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01x",
            "00_4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
            "0-04bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e473g-00f067aa0ba902b7-01",
        ];
        for case in cases {
            assert_eq!(parse_traceparent(case), None, "accepted {case:?}");
        }
    }

    #[test]
    fn all_zero_ids_are_rejected() {
        assert_eq!(
            parse_traceparent("00-00000000000000000000000000000000-00f067aa0ba902b7-01"),
            None
        );
        assert_eq!(
            parse_traceparent("00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01"),
            None
        );
    }

    #[test]
    fn b3_accepts_16_or_32_lower_hex() {
        assert_eq!(parse_b3_trace_id(B3_TRACE_ID), Some(B3_TRACE_ID));
        assert_eq!(parse_b3_trace_id(" a3ce929d0e0e4736 "), Some("a3ce929d0e0e4736"));
        assert_eq!(parse_b3_trace_id("a3ce929d0e0e47"), None);
        assert_eq!(parse_b3_trace_id("463ac35c9f6413ad48485a3953bb6124ff"), None);
        assert_eq!(parse_b3_trace_id("463AC35C9F6413AD48485A3953BB6124"), None);
    }

    #[test]
    fn traceparent_takes_precedence_over_b3() {
        let map = headers(&[
            (&TRACEPARENT_HEADER, TRACEPARENT),
            (&B3_TRACE_ID_HEADER, B3_TRACE_ID),
        ]);
        assert_eq!(extract_trace_id(&map), TRACE_ID);
    }

    #[test]
    fn invalid_traceparent_falls_back_to_b3() {
        let map = headers(&[
            (
                &TRACEPARENT_HEADER,
                "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
            ),
            (&B3_TRACE_ID_HEADER, B3_TRACE_ID),
        ]);
        assert_eq!(extract_trace_id(&map), B3_TRACE_ID);
    }

    #[test]
    fn missing_headers_yield_empty_trace_id() {
        assert_eq!(extract_trace_id(&HeaderMap::new()), "");
        let map = headers(&[(&B3_TRACE_ID_HEADER, "not-a-trace-id")]);
        assert_eq!(extract_trace_id(&map), "");
    }

    #[test]
    fn correlation_from_headers_combines_both() {
        let map = headers(&[
            (&REQUEST_ID_HEADER, "abc"),
            (&B3_TRACE_ID_HEADER, B3_TRACE_ID),
        ]);
        let correlation = RequestCorrelation::from_headers(&map);
        assert_eq!(correlation.request_id, "abc");
        assert_eq!(correlation.trace_id, B3_TRACE_ID);
    }
}
