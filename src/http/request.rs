//! Request handling.
//!
//! # Responsibilities
//! - Read the request ID assigned by the request-id layer
//! - Resolve the upstream URI a request is forwarded to
//!
//! # Design Decisions
//! - A configured upstream always wins (reverse mode)
//! - Otherwise the absolute-form URI, then the Host header (forward mode)

use axum::http::header::HOST;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{HeaderMap, HeaderName, Uri};

/// Header carrying the per-transaction request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Request ID of a transaction, or "unknown" if the header is missing.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Build the URI to forward a request to.
///
/// Returns `None` when no authority can be determined.
pub fn upstream_uri(uri: &Uri, headers: &HeaderMap, upstream: Option<&str>) -> Option<Uri> {
    let authority: Authority = match upstream {
        Some(address) => address.parse().ok()?,
        None => match uri.authority() {
            Some(authority) => authority.clone(),
            None => headers.get(HOST)?.to_str().ok()?.parse().ok()?,
        },
    };

    let path_and_query = uri
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));

    Uri::builder()
        .scheme(Scheme::HTTP)
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
        .ok()
}
