//! Response body override.
//!
//! Replaces the body of a response with a fixed payload. When attached to
//! the request phase as well, it tells the host to skip the upstream round
//! trip so the payload is served without touching the network.
//!
//! # Example declaration
//! ```text
//! {
//!   "scope": ["request", "response"],
//!   "contentType": "text/plain",
//!   "body": "c29tZSBkYXRhIHdpdGggACBhbmQg77u/"
//! }
//! ```

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Request, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

use crate::modifier::{Context, Modifier, ModifierError, ModifierResult, ParsedModifier, Scope};

/// Registered type name of [`BodyModifier`].
pub const BODY_MODIFIER: &str = "body.Modifier";

/// Substitutes the body on an HTTP response.
#[derive(Debug, Clone)]
pub struct BodyModifier {
    content_type: HeaderValue,
    body: Bytes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BodyModifierJson {
    #[serde(default)]
    content_type: String,
    /// Standard base64 with padding.
    #[serde(default)]
    body: String,
    #[serde(default)]
    scope: Vec<Scope>,
}

impl BodyModifier {
    /// Create a modifier serving `body` with the given content type.
    pub fn new(body: impl Into<Bytes>, content_type: HeaderValue) -> Self {
        Self {
            content_type,
            body: body.into(),
        }
    }

    pub fn content_type(&self) -> &HeaderValue {
        &self.content_type
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

impl Modifier for BodyModifier {
    fn name(&self) -> &'static str {
        BODY_MODIFIER
    }

    /// Signals the host to skip the round trip.
    fn modify_request(&self, ctx: &mut Context, _req: &mut Request<Body>) {
        ctx.set_skip_round_trip();
    }

    /// Sets the Content-Type header and overrides the response body.
    fn modify_response(&self, ctx: &mut Context, res: &mut Response<Body>) {
        // Release the previous body before anything else.
        drop(std::mem::take(res.body_mut()));

        let headers = res.headers_mut();
        headers.insert(header::CONTENT_TYPE, self.content_type.clone());
        // The replacement is never encoded, and its length is known up front.
        headers.remove(header::CONTENT_ENCODING);
        headers.remove(header::TRANSFER_ENCODING);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(self.body.len()));

        *res.body_mut() = Body::from(self.body.clone());

        tracing::debug!(
            request_id = %ctx.id(),
            content_length = self.body.len(),
            "Response body overridden"
        );
    }
}

/// Decode a `body.Modifier` declaration.
pub fn body_modifier_from_json(bytes: &[u8]) -> ModifierResult<ParsedModifier> {
    let msg: BodyModifierJson = serde_json::from_slice(bytes)?;

    let body = STANDARD.decode(msg.body.as_bytes())?;

    let content_type = HeaderValue::from_str(&msg.content_type).map_err(|_| {
        ModifierError::MalformedConfig(format!(
            "contentType {:?} is not a valid header value",
            msg.content_type
        ))
    })?;

    let modifier = BodyModifier::new(body, content_type);
    Ok(ParsedModifier::new(Arc::new(modifier), msg.scope))
}
