//! Modifier configuration errors.

use thiserror::Error;

/// Errors raised while decoding modifier declarations.
///
/// All of these happen at load time. Hooks on a constructed modifier
/// have no failure modes.
#[derive(Debug, Error)]
pub enum ModifierError {
    /// The declaration does not match the expected document shape.
    #[error("malformed modifier config: {0}")]
    MalformedConfig(String),

    /// The `body` field is not valid standard base64.
    #[error("invalid body encoding: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    /// No decoder is registered for the declared type name.
    #[error("unknown modifier type: {0}")]
    UnknownModifier(String),
}

impl From<serde_json::Error> for ModifierError {
    fn from(err: serde_json::Error) -> Self {
        ModifierError::MalformedConfig(err.to_string())
    }
}

/// Result type for modifier decoding.
pub type ModifierResult<T> = Result<T, ModifierError>;
