//! Request/response modifier subsystem.
//!
//! # Data Flow
//! ```text
//! modifier document (JSON)
//!     → registry.rs (type name → decoder)
//!     → body.rs (decode declaration, build BodyModifier)
//!     → ParsedModifier (modifier + scope)
//!     → chain.rs (split into request / response lists)
//!     → shared via Arc with the HTTP server
//!
//! Per transaction:
//!     Context + Request  → chain.modify_request
//!     [round trip unless ctx.skip_round_trip()]
//!     Context + Response → chain.modify_response
//! ```
//!
//! # Design Decisions
//! - Modifiers are immutable once decoded; hooks take `&self`
//! - All fallible work happens at decode time; hooks never fail
//! - Scope is interpreted by the chain, never by the modifier itself
//! - The registry is an explicit value built by the caller, not a global

pub mod body;
pub mod chain;
pub mod error;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use serde::{Deserialize, Serialize};

pub use body::BodyModifier;
pub use chain::ModifierChain;
pub use error::{ModifierError, ModifierResult};
pub use registry::Registry;

/// Per-transaction flag storage shared by every modifier in the chain.
#[derive(Debug, Clone, Default)]
pub struct Context {
    id: String,
    skip_round_trip: bool,
}

impl Context {
    /// Create a context for the transaction identified by `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            skip_round_trip: false,
        }
    }

    /// Transaction identifier (the request ID).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ask the host to skip the upstream round trip.
    pub fn set_skip_round_trip(&mut self) {
        self.skip_round_trip = true;
    }

    /// Whether the upstream round trip should be skipped.
    pub fn skip_round_trip(&self) -> bool {
        self.skip_round_trip
    }
}

/// A unit that mutates a request and/or response during a transaction.
///
/// Implementations must be immutable so one instance can serve many
/// concurrent transactions. Hooks the modifier does not care about keep
/// the default no-op.
pub trait Modifier: Send + Sync + fmt::Debug {
    /// Registered type name, used for logging.
    fn name(&self) -> &'static str;

    /// Request-phase hook.
    fn modify_request(&self, _ctx: &mut Context, _req: &mut Request<Body>) {}

    /// Response-phase hook.
    fn modify_response(&self, _ctx: &mut Context, _res: &mut Response<Body>) {}
}

/// Pipeline phase a modifier is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Request,
    Response,
}

/// A decoded modifier together with the phases it was declared for.
#[derive(Debug, Clone)]
pub struct ParsedModifier {
    modifier: Arc<dyn Modifier>,
    scope: Vec<Scope>,
}

impl ParsedModifier {
    /// Wrap a modifier with its declared scope.
    ///
    /// An empty scope attaches the modifier to both phases. Duplicate
    /// entries are collapsed.
    pub fn new(modifier: Arc<dyn Modifier>, scope: Vec<Scope>) -> Self {
        let mut normalized = Vec::with_capacity(2);
        for s in scope {
            if !normalized.contains(&s) {
                normalized.push(s);
            }
        }
        if normalized.is_empty() {
            normalized = vec![Scope::Request, Scope::Response];
        }

        Self {
            modifier,
            scope: normalized,
        }
    }

    pub fn modifier(&self) -> &Arc<dyn Modifier> {
        &self.modifier
    }

    pub fn scope(&self) -> &[Scope] {
        &self.scope
    }

    /// Returns true if the modifier is attached to `phase`.
    pub fn applies_to(&self, phase: Scope) -> bool {
        self.scope.contains(&phase)
    }
}
