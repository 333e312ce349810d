//! Config types for data-driven rule-set construction.
//!
//! These types mirror the built-in rules but are serde-deserializable, so a rule
//! set can live in JSON or YAML and be loaded via
//! [`RuleLoader::load()`](crate::RuleLoader::load).
//!
//! # Relationship to runtime types
//!
//! | Config variant | Runtime rule |
//! |----------------|--------------|
//! | `object_create` | [`ObjectCreate`](crate::rules::ObjectCreate) |
//! | `set_next` | [`SetNext`](crate::rules::SetNext) |
//! | `call_method` | [`CallMethod`](crate::rules::CallMethod) |
//! | `call_param` | [`CallParam`](crate::rules::CallParam) |
//! | `set_top` | [`SetTop`](crate::rules::SetTop) |
//! | `set_properties` | [`SetProperties`](crate::rules::SetProperties) |
//! | `validate_once` | [`ValidateOnce`](crate::rules::ValidateOnce) |
//! | `set_public_id` | [`SetPublicId`](crate::rules::SetPublicId) |
//! | `custom` | via loader factory ([`IntoRule`](crate::IntoRule)) |

use std::collections::HashMap;

use serde::Deserialize;

use crate::{DigestError, Literal};

/// A complete rule set.
///
/// ```json
/// {
///   "prefix": "",
///   "rules": [
///     { "pattern": "shelf", "type": "object_create", "type_name": "Shelf" },
///     { "pattern": "shelf/book/title", "type": "call_method", "method": "setTitle" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSetConfig {
    /// Prepended to every non-wildcard pattern.
    #[serde(default)]
    pub prefix: String,

    /// Namespace URI applied to every rule that does not name its own.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Bindings, in registration order.
    pub rules: Vec<RuleConfig>,
}

impl RuleSetConfig {
    /// Parse from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::InvalidConfig`] on malformed input.
    pub fn from_json(json: &str) -> Result<Self, DigestError> {
        serde_json::from_str(json).map_err(|e| DigestError::InvalidConfig {
            reason: e.to_string(),
        })
    }

    /// The effective pattern for a binding, with the prefix applied.
    #[must_use]
    pub fn full_pattern(&self, pattern: &str) -> String {
        if pattern.starts_with('*') {
            pattern.to_owned()
        } else {
            format!("{}{pattern}", self.prefix)
        }
    }
}

/// One pattern → rule binding.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    /// Path pattern (`a/b`, `*/b`, `a/*`, `*`).
    pub pattern: String,

    /// Namespace URI this rule is limited to.
    #[serde(default)]
    pub namespace: Option<String>,

    /// The rule itself, discriminated by `type`.
    #[serde(flatten)]
    pub rule: RuleKindConfig,
}

/// Configuration for one rule.
///
/// Uses `#[serde(tag = "type")]` for discriminated union deserialization:
///
/// ```json
/// { "type": "object_create", "type_name": "webapp.FilterDef" }
/// { "type": "set_next", "method": "addFilterDef", "param_type": "webapp.FilterDef" }
/// { "type": "call_method", "method": "setTimeout", "param_count": 1, "param_types": ["int"] }
/// { "type": "custom", "type_url": "acme.Audit", "config": { "level": "info" } }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleKindConfig {
    /// [`ObjectCreate`](crate::rules::ObjectCreate).
    ObjectCreate {
        /// Type to instantiate.
        type_name: String,
        /// Attribute overriding the type name.
        #[serde(default)]
        attribute: Option<String>,
    },

    /// [`SetNext`](crate::rules::SetNext).
    SetNext {
        /// Method on the parent.
        method: String,
        /// Declared type of the child.
        param_type: String,
        /// Resource holder type, for the holder-aware variant.
        #[serde(default)]
        holder_type: Option<String>,
    },

    /// [`CallMethod`](crate::rules::CallMethod).
    CallMethod {
        /// Method on the top object.
        method: String,
        /// Parameter slots (0 = body text).
        #[serde(default)]
        param_count: usize,
        /// Declared parameter types, defaulting to `String`.
        #[serde(default)]
        param_types: Vec<String>,
    },

    /// [`CallParam`](crate::rules::CallParam).
    CallParam {
        /// Slot to fill.
        index: usize,
        /// Attribute to read instead of body text.
        #[serde(default)]
        attribute: Option<String>,
    },

    /// [`SetTop`](crate::rules::SetTop).
    SetTop {
        /// Method on the top object.
        method: String,
        /// Literal argument.
        value: LiteralConfig,
        /// Fire on end instead of begin.
        #[serde(default)]
        on_end: bool,
    },

    /// [`SetProperties`](crate::rules::SetProperties).
    SetProperties {
        /// Attribute → property renames. An empty property ignores the attribute.
        #[serde(default)]
        aliases: HashMap<String, String>,
    },

    /// [`ValidateOnce`](crate::rules::ValidateOnce).
    ValidateOnce {
        /// Element name (the occurrence key).
        element: String,
    },

    /// [`SetPublicId`](crate::rules::SetPublicId).
    SetPublicId {
        /// Method on the top object.
        method: String,
    },

    /// A rule registered with the loader under `type_url`.
    Custom {
        /// Must match a `type_url` registered in the [`RuleLoader`](crate::RuleLoader).
        type_url: String,
        /// Deserialized as the `Config` associated type of the registered [`IntoRule`](crate::IntoRule).
        #[serde(default = "default_config")]
        config: serde_json::Value,
    },
}

fn default_config() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// A literal in config: `true`, `42`, or `"text"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LiteralConfig {
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Text literal.
    String(String),
}

impl From<LiteralConfig> for Literal {
    fn from(config: LiteralConfig) -> Self {
        match config {
            LiteralConfig::Bool(b) => Self::Bool(b),
            LiteralConfig::Int(i) => Self::Int(i),
            LiteralConfig::String(s) => Self::String(s),
        }
    }
}
