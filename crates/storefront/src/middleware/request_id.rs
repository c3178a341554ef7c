//! Request ID middleware.
//!
//! Every request carries an ID in `x-request-id`. An upstream value is
//! reused when it is short printable ASCII; anything else is replaced by a
//! fresh UUID v4. The ID is recorded on the `http_request` span, tagged on
//! the Sentry scope, stored in request extensions as [`RequestId`], and
//! echoed on the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream ID accepted as-is.
const MAX_UPSTREAM_LEN: usize = 128;

/// The ID assigned to the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Reuse an acceptable upstream header value, or generate a new ID.
    fn from_header(value: Option<&HeaderValue>) -> Self {
        value
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| is_acceptable(v))
            .map_or_else(
                || Self(Uuid::new_v4().to_string()),
                |v| Self(v.to_owned()),
            )
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_acceptable(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_UPSTREAM_LEN && id.bytes().all(|b| b.is_ascii_graphic())
}

/// Assign a [`RequestId`] to the request and echo it on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_header(request.headers().get(REQUEST_ID_HEADER));

    Span::current().record("request_id", request_id.0.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", &request_id));

    let header = HeaderValue::from_str(&request_id.0).ok();
    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;
    if let Some(value) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_reuses_upstream_id() {
        let header = HeaderValue::from_static("cf-ray-8a1b2c");
        assert_eq!(RequestId::from_header(Some(&header)).0, "cf-ray-8a1b2c");
    }

    #[test]
    fn test_generates_when_missing_or_unacceptable() {
        let generated = RequestId::from_header(None);
        assert!(Uuid::parse_str(&generated.0).is_ok());

        let spaced = HeaderValue::from_static("two words");
        assert_ne!(RequestId::from_header(Some(&spaced)).0, "two words");

        let long = HeaderValue::from_str(&"r".repeat(MAX_UPSTREAM_LEN + 1)).unwrap();
        assert!(Uuid::parse_str(&RequestId::from_header(Some(&long)).0).is_ok());
    }
}
