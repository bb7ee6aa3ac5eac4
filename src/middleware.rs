//! Request correlation middleware.
//!
//! Resolves a request ID (inbound `X-Request-ID` or freshly generated) and a
//! trace ID (`traceparent` / `X-B3-TraceId`), then wraps the rest of the stack
//! in a tracing span carrying both. All logs emitted while handling the
//! request inherit those fields. After the inner service returns, the request
//! ID is echoed on the response and exactly one `request completed` record is
//! logged with status, timing, client details and any internal error text.

use std::fmt;
use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use http::header::{HeaderName, USER_AGENT};
use tracing::Instrument;

use crate::correlation::{RequestCorrelation, REQUEST_ID_HEADER};

static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
static X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Private error details attached to a response by a handler.
///
/// Never sent to the client; the correlation middleware logs them in the
/// `errors` field of the completion record.
#[derive(Clone, Debug, Default)]
pub struct InternalErrors(Vec<String>);

impl InternalErrors {
    pub fn new(message: impl Into<String>) -> Self {
        Self(vec![message.into()])
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    /// Appends to the errors already on `response`, creating the extension if needed.
    pub fn record(response: &mut Response, message: impl Into<String>) {
        match response.extensions_mut().get_mut::<InternalErrors>() {
            Some(errors) => errors.push(message),
            None => {
                response.extensions_mut().insert(InternalErrors::new(message));
            }
        }
    }
}

impl fmt::Display for InternalErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, message) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "Error #{:02}: {}", i + 1, message)?;
        }
        Ok(())
    }
}

/// Middleware that assigns correlation IDs and logs request completion.
///
/// This should be the outermost layer so the span and the latency measurement
/// cover all other middleware and the handler.
pub async fn request_correlation_layer(mut request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = request.uri().query().unwrap_or_default().to_string();
    let ip = client_ip(&request);
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let correlation = RequestCorrelation::from_headers(request.headers());

    let span = tracing::info_span!(
        "request",
        request_id = %correlation.request_id,
        trace_id = %correlation.trace_id,
        method = %method,
        path = %path,
    );

    request.extensions_mut().insert(correlation.clone());

    async move {
        let mut response = next.run(request).await;

        if let Some(value) = correlation.request_id_header.clone() {
            response
                .headers_mut()
                .insert(REQUEST_ID_HEADER.clone(), value);
        }

        let latency = start.elapsed();
        let errors = response
            .extensions()
            .get::<InternalErrors>()
            .map(ToString::to_string)
            .unwrap_or_default();

        tracing::info!(
            status = response.status().as_u16(),
            method = %method,
            path = %path,
            query = %query,
            ip = %ip,
            user_agent = %user_agent,
            latency = ?latency,
            errors = %errors,
            request_id = %correlation.request_id,
            trace_id = %correlation.trace_id,
            "request completed"
        );

        response
    }
    .instrument(span)
    .await
}

/// Best-effort client address: proxy headers first, then the socket peer.
fn client_ip(request: &Request) -> String {
    let header = |name: &HeaderName| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(forwarded) = header(&X_FORWARDED_FOR) {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
            return first.to_string();
        }
    }

    if let Some(real_ip) = header(&X_REAL_IP) {
        return real_ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}
