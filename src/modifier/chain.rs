//! Scope-aware modifier chain.
//!
//! # Responsibilities
//! - Hold request-phase and response-phase modifiers in declaration order
//! - Invoke the relevant hook for each phase, independent of concrete type
//! - Build itself from a modifier document via a [`Registry`]
//!
//! # Design Decisions
//! - Built once at startup, shared via Arc, never mutated afterwards
//! - A modifier scoped to both phases appears in both lists (same Arc)

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use serde_json::value::RawValue;

use crate::modifier::{Context, Modifier, ModifierResult, ParsedModifier, Registry, Scope};

/// Ordered modifiers split by the phase they are attached to.
#[derive(Debug, Clone, Default)]
pub struct ModifierChain {
    request: Vec<Arc<dyn Modifier>>,
    response: Vec<Arc<dyn Modifier>>,
}

impl ModifierChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain from a document holding either one declaration or an
    /// array of declarations.
    pub fn from_json(bytes: &[u8], registry: &Registry) -> ModifierResult<Self> {
        let mut chain = Self::new();

        let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
        if first == Some(&b'[') {
            let declarations: Vec<Box<RawValue>> = serde_json::from_slice(bytes)?;
            for declaration in declarations {
                chain.push(registry.parse(declaration.get().as_bytes())?);
            }
        } else {
            chain.push(registry.parse(bytes)?);
        }

        tracing::info!(
            request_modifiers = chain.request_len(),
            response_modifiers = chain.response_len(),
            "Modifier chain built"
        );
        Ok(chain)
    }

    /// Append a decoded modifier to every phase it is scoped to.
    pub fn push(&mut self, parsed: ParsedModifier) {
        if parsed.applies_to(Scope::Request) {
            self.request.push(parsed.modifier().clone());
        }
        if parsed.applies_to(Scope::Response) {
            self.response.push(parsed.modifier().clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.request.is_empty() && self.response.is_empty()
    }

    pub fn request_len(&self) -> usize {
        self.request.len()
    }

    pub fn response_len(&self) -> usize {
        self.response.len()
    }

    /// Run every request-phase modifier in order.
    pub fn modify_request(&self, ctx: &mut Context, req: &mut Request<Body>) {
        for modifier in &self.request {
            tracing::trace!(request_id = %ctx.id(), modifier = modifier.name(), "modify_request");
            modifier.modify_request(ctx, req);
        }
    }

    /// Run every response-phase modifier in order.
    pub fn modify_response(&self, ctx: &mut Context, res: &mut Response<Body>) {
        for modifier in &self.response {
            tracing::trace!(request_id = %ctx.id(), modifier = modifier.name(), "modify_response");
            modifier.modify_response(ctx, res);
        }
    }
}
