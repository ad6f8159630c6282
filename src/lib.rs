//! Intercepting HTTP proxy with a response-body override modifier.

pub mod config;
pub mod http;
pub mod modifier;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use modifier::{BodyModifier, ModifierChain, Registry};
