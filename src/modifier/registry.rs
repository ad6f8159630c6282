//! Modifier type registry.
//!
//! Maps a declaration's type name to the function that decodes it. The
//! composition root builds one registry and hands it to whatever loads
//! modifier documents, so new modifier types plug in without touching the
//! chain or the server.

use std::collections::HashMap;
use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::value::RawValue;

use crate::modifier::body::{body_modifier_from_json, BODY_MODIFIER};
use crate::modifier::{ModifierError, ModifierResult, ParsedModifier};

/// Decoder for a single modifier type. Receives the raw JSON of the
/// declaration body (the value under the type-name key).
pub type ParseFn = fn(&[u8]) -> ModifierResult<ParsedModifier>;

/// Lookup table from type name to decoder.
#[derive(Clone, Default)]
pub struct Registry {
    parsers: HashMap<String, ParseFn>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.names())
            .finish()
    }
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every modifier type shipped by this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(BODY_MODIFIER, body_modifier_from_json);
        registry
    }

    /// Associate `name` with a decoder. Registering a name again replaces
    /// the previous decoder.
    pub fn register(&mut self, name: impl Into<String>, parse: ParseFn) {
        self.parsers.insert(name.into(), parse);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parsers.contains_key(name)
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Decode a declaration of the form `{"<type name>": { ... }}`.
    pub fn parse(&self, bytes: &[u8]) -> ModifierResult<ParsedModifier> {
        let Declaration(mut entries) = serde_json::from_slice(bytes)?;
        if entries.len() != 1 {
            return Err(ModifierError::MalformedConfig(format!(
                "expected exactly one modifier type per declaration, found {}",
                entries.len()
            )));
        }
        let (name, raw) = entries.remove(0);

        let parse = self
            .parsers
            .get(&name)
            .ok_or_else(|| ModifierError::UnknownModifier(name.clone()))?;

        tracing::debug!(modifier = %name, "Decoding modifier declaration");
        parse(raw.get().as_bytes())
    }
}

/// Every key/value pair of a declaration object, duplicates included.
struct Declaration(Vec<(String, Box<RawValue>)>);

impl<'de> Deserialize<'de> for Declaration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = Declaration;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a modifier declaration object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Declaration, A::Error> {
                let mut entries = Vec::new();
                while let Some(entry) = map.next_entry::<String, Box<RawValue>>()? {
                    entries.push(entry);
                }
                Ok(Declaration(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
