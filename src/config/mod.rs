//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!
//! modifier document (JSON, path from ProxyConfig)
//!     → loader.rs (read)
//!     → modifier::Registry (decode each declaration)
//!     → ModifierChain (shared via Arc with the server)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_modifiers, parse_config, ConfigError};
pub use schema::ProxyConfig;
pub use schema::{ListenerConfig, ModifiersConfig, ObservabilityConfig, TimeoutConfig, UpstreamConfig};
