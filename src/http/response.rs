//! Responses produced by the proxy itself.
//!
//! # Responsibilities
//! - Synthesize the placeholder response used when a modifier skips the
//!   round trip (response modifiers then fill it in)
//! - Map host-side failures to status codes (400 no target, 502 upstream)

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};

/// Empty `200 OK` standing in for an upstream response.
pub fn synthetic_response() -> Response<Body> {
    let mut response = Response::new(Body::empty());
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(0usize));
    response
}

/// Plain-text error generated by the proxy.
pub fn error_response(status: StatusCode, message: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(message));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
