//! Rule loader: config-driven construction of a [`PatternRegistry`].
//!
//! # Architecture (axum `BoxedIntoRoute` pattern)
//!
//! ```text
//! Registration time                    Load time
//! ─────────────────                    ─────────
//! .rule::<AuditRule>("acme.Audit")
//!   ↓ monomorphize                     RuleSetConfig { rules: [...] }
//!   ↓ erase into closure                 ↓ built-in kinds → rules::*
//!   ↓ store in HashMap                   ↓ custom → lookup type_url → call closure
//!                                        ↓ deserialize T::Config → T::from_config()
//!                                      PatternRegistry
//! ```
//!
//! Built-in rule kinds need no registration. Custom rules are registered by type
//! URL with [`RuleLoaderBuilder::rule`]; the loader is immutable after `build()`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::rules::{
    CallMethod, CallParam, ObjectCreate, SetNext, SetProperties, SetPublicId, SetTop,
    ValidateOnce,
};
use crate::{
    DigestError, Literal, PatternRegistry, Rule, RuleKindConfig, RuleSetConfig, MAX_CALL_PARAMS,
};

/// Converts a deserialized config into a rule.
///
/// # Example
///
/// ```ignore
/// struct AuditRule { level: String }
///
/// impl IntoRule for AuditRule {
///     type Config = AuditConfig;
///     fn from_config(config: Self::Config) -> Result<Arc<dyn Rule>, DigestError> {
///         Ok(Arc::new(AuditRule { level: config.level }))
///     }
/// }
/// ```
pub trait IntoRule: Send + Sync + 'static {
    /// The deserialized configuration type.
    type Config: DeserializeOwned + Send + Sync;

    /// Build the rule.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::InvalidConfig`] if the config is semantically invalid.
    fn from_config(config: Self::Config) -> Result<Arc<dyn Rule>, DigestError>;
}

/// Type-erased rule factory closure.
type BoxedRuleFactory =
    Box<dyn Fn(&serde_json::Value) -> Result<Arc<dyn Rule>, DigestError> + Send + Sync>;

/// Builder for a [`RuleLoader`].
#[derive(Default)]
pub struct RuleLoaderBuilder {
    factories: HashMap<String, BoxedRuleFactory>,
}

impl RuleLoaderBuilder {
    /// Create a builder that knows only the built-in rule kinds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom rule type under `type_url`.
    ///
    /// `T` is monomorphized here and erased behind a closure. At load time the
    /// payload is deserialized as `T::Config` and passed to `T::from_config()`.
    #[must_use]
    pub fn rule<T: IntoRule>(mut self, type_url: &str) -> Self {
        self.factories.insert(
            type_url.to_owned(),
            Box::new(|value: &serde_json::Value| {
                let config: T::Config =
                    serde_json::from_value(value.clone()).map_err(|e| {
                        DigestError::InvalidConfig {
                            reason: e.to_string(),
                        }
                    })?;
                T::from_config(config)
            }),
        );
        self
    }

    /// Freeze the loader.
    #[must_use]
    pub fn build(self) -> RuleLoader {
        RuleLoader {
            factories: self.factories,
        }
    }
}

/// Immutable loader turning [`RuleSetConfig`]s into registries.
pub struct RuleLoader {
    factories: HashMap<String, BoxedRuleFactory>,
}

impl RuleLoader {
    /// Number of registered custom rule types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if no custom rule types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Returns `true` if `type_url` is registered.
    #[must_use]
    pub fn contains(&self, type_url: &str) -> bool {
        self.factories.contains_key(type_url)
    }

    /// Registered type URLs (sorted).
    #[must_use]
    pub fn type_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        urls.sort_unstable();
        urls
    }

    /// Build a new registry from config.
    ///
    /// # Errors
    ///
    /// - [`DigestError::UnknownRuleType`] for an unregistered custom `type_url`
    /// - [`DigestError::InvalidConfig`] for a malformed payload or an out-of-range
    ///   parameter count or index
    pub fn load(&self, config: RuleSetConfig) -> Result<PatternRegistry, DigestError> {
        let mut registry = PatternRegistry::new();
        self.load_into(config, &mut registry)?;
        Ok(registry)
    }

    /// Append config bindings to an existing registry.
    ///
    /// Nothing is added unless every rule builds.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_into(
        &self,
        config: RuleSetConfig,
        registry: &mut PatternRegistry,
    ) -> Result<(), DigestError> {
        let mut built = Vec::with_capacity(config.rules.len());
        for rule in &config.rules {
            if rule.pattern.trim().is_empty() {
                return Err(DigestError::InvalidConfig {
                    reason: "rule pattern must not be empty".into(),
                });
            }
            let pattern = config.full_pattern(&rule.pattern);
            let namespace = rule.namespace.clone().or_else(|| config.namespace.clone());
            built.push((pattern, namespace, self.build_rule(rule.rule.clone())?));
        }
        for (pattern, namespace, rule) in built {
            match namespace {
                Some(ns) => registry.add_arc_ns(&pattern, &ns, rule),
                None => registry.add_arc(&pattern, rule),
            };
        }
        tracing::debug!(rules = registry.len(), "rule set loaded");
        Ok(())
    }

    fn build_rule(&self, kind: RuleKindConfig) -> Result<Arc<dyn Rule>, DigestError> {
        Ok(match kind {
            RuleKindConfig::ObjectCreate {
                type_name,
                attribute,
            } => {
                let rule = ObjectCreate::new(&type_name);
                match attribute {
                    Some(attr) => Arc::new(rule.with_attribute(&attr)),
                    None => Arc::new(rule),
                }
            }
            RuleKindConfig::SetNext {
                method,
                param_type,
                holder_type,
            } => {
                let rule = SetNext::new(&method, &param_type);
                match holder_type {
                    Some(holder) => Arc::new(rule.via_holder(&holder)),
                    None => Arc::new(rule),
                }
            }
            RuleKindConfig::CallMethod {
                method,
                param_count,
                param_types,
            } => {
                check_param_index("param_count", param_count, MAX_CALL_PARAMS + 1)?;
                let types: Vec<&str> = param_types.iter().map(String::as_str).collect();
                Arc::new(CallMethod::new(&method, param_count).with_param_types(&types))
            }
            RuleKindConfig::CallParam { index, attribute } => {
                check_param_index("index", index, MAX_CALL_PARAMS)?;
                match attribute {
                    Some(attr) => Arc::new(CallParam::from_attribute(index, &attr)),
                    None => Arc::new(CallParam::new(index)),
                }
            }
            RuleKindConfig::SetTop {
                method,
                value,
                on_end,
            } => {
                let rule = SetTop::new(&method, Literal::from(value));
                if on_end {
                    Arc::new(rule.on_end())
                } else {
                    Arc::new(rule)
                }
            }
            RuleKindConfig::SetProperties { aliases } => {
                let mut rule = SetProperties::new();
                for (attribute, property) in &aliases {
                    rule = rule.alias(attribute, property);
                }
                Arc::new(rule)
            }
            RuleKindConfig::ValidateOnce { element } => Arc::new(ValidateOnce::new(&element)),
            RuleKindConfig::SetPublicId { method } => Arc::new(SetPublicId::new(&method)),
            RuleKindConfig::Custom { type_url, config } => {
                let factory =
                    self.factories
                        .get(&type_url)
                        .ok_or_else(|| DigestError::UnknownRuleType {
                            type_url: type_url.clone(),
                            available: self.type_urls().into_iter().map(String::from).collect(),
                        })?;
                factory(&config)?
            }
        })
    }
}

fn check_param_index(field: &str, value: usize, limit: usize) -> Result<(), DigestError> {
    if value >= limit {
        return Err(DigestError::InvalidConfig {
            reason: format!("{field} is {value}, but must be below {limit}"),
        });
    }
    Ok(())
}

impl std::fmt::Debug for RuleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleLoader")
            .field("type_urls", &self.type_urls())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Attributes, BeanType, ClassBuilder, ClassResolverBuilder, Context, Digester, Event,
    };
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static AUDITED: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug)]
    struct AuditRule {
        weight: usize,
    }

    #[derive(Deserialize)]
    struct AuditConfig {
        weight: usize,
    }

    impl Rule for AuditRule {
        fn begin(&self, _: &mut Context<'_>, _: &Attributes) -> Result<(), DigestError> {
            AUDITED.fetch_add(self.weight, Ordering::SeqCst);
            Ok(())
        }
    }

    impl IntoRule for AuditRule {
        type Config = AuditConfig;
        fn from_config(config: Self::Config) -> Result<Arc<dyn Rule>, DigestError> {
            Ok(Arc::new(AuditRule {
                weight: config.weight,
            }))
        }
    }

    #[derive(Debug, Clone, Default)]
    struct Book {
        title: String,
    }
    impl BeanType for Book {
        const TYPE_NAME: &'static str = "Book";
    }

    #[test]
    fn builtin_rules_load_and_run() {
        let config = RuleSetConfig::from_json(
            r#"{
                "rules": [
                    { "pattern": "book", "type": "object_create", "type_name": "Book" },
                    { "pattern": "book/title", "type": "call_method", "method": "setTitle" }
                ]
            }"#,
        )
        .unwrap();
        let registry = RuleLoaderBuilder::new().build().load(config).unwrap();
        assert_eq!(registry.len(), 2);

        let resolver = ClassResolverBuilder::new()
            .class(
                ClassBuilder::<Book>::new()
                    .default_constructor()
                    .method("setTitle", |b: &mut Book, t: String| b.title = t)
                    .build(),
            )
            .build();
        let mut d = Digester::new(Arc::new(registry), Arc::new(resolver));
        let book = d
            .parse_events(vec![
                Event::start("book"),
                Event::start("title"),
                Event::text("Dune"),
                Event::end("title"),
                Event::end("book"),
            ])
            .unwrap()
            .unwrap();
        assert_eq!(book.with(|b: &Book| b.title.clone()).unwrap(), "Dune");
    }

    #[test]
    fn custom_rule_by_type_url() {
        let loader = RuleLoaderBuilder::new()
            .rule::<AuditRule>("acme.Audit")
            .build();
        assert!(loader.contains("acme.Audit"));
        let config = RuleSetConfig::from_json(
            r#"{"rules":[{"pattern":"*","type":"custom","type_url":"acme.Audit","config":{"weight":5}}]}"#,
        )
        .unwrap();
        let registry = loader.load(config).unwrap();
        let mut d = Digester::new(Arc::new(registry), Arc::new(crate::ClassResolver::empty()));
        let before = AUDITED.load(Ordering::SeqCst);
        d.parse_events(vec![Event::start("x"), Event::end("x")]).unwrap();
        assert_eq!(AUDITED.load(Ordering::SeqCst) - before, 5);
    }

    #[test]
    fn unknown_type_url_lists_registered() {
        let loader = RuleLoaderBuilder::new()
            .rule::<AuditRule>("acme.Audit")
            .build();
        let config = RuleSetConfig::from_json(
            r#"{"rules":[{"pattern":"a","type":"custom","type_url":"acme.Nope"}]}"#,
        )
        .unwrap();
        let err = loader.load(config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown rule type URL \"acme.Nope\" — registered: acme.Audit"
        );
    }

    #[test]
    fn malformed_custom_payload_is_invalid_config() {
        let loader = RuleLoaderBuilder::new()
            .rule::<AuditRule>("acme.Audit")
            .build();
        let config = RuleSetConfig::from_json(
            r#"{"rules":[{"pattern":"a","type":"custom","type_url":"acme.Audit","config":{"weight":"heavy"}}]}"#,
        )
        .unwrap();
        assert!(matches!(
            loader.load(config),
            Err(DigestError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn param_limits_are_enforced_and_nothing_is_added() {
        let config = RuleSetConfig::from_json(&format!(
            r#"{{"rules":[
                {{"pattern":"a","type":"validate_once","element":"a"}},
                {{"pattern":"a","type":"call_method","method":"m","param_count":{}}}
            ]}}"#,
            MAX_CALL_PARAMS + 1
        ))
        .unwrap();
        let mut registry = PatternRegistry::new();
        let err = RuleLoaderBuilder::new()
            .build()
            .load_into(config, &mut registry)
            .unwrap_err();
        assert!(matches!(err, DigestError::InvalidConfig { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn prefix_and_namespace_apply() {
        let config = RuleSetConfig::from_json(
            r#"{"prefix":"root/","namespace":"urn:x","rules":[
                {"pattern":"a","type":"validate_once","element":"a"},
                {"pattern":"*/b","namespace":"urn:y","type":"validate_once","element":"b"}
            ]}"#,
        )
        .unwrap();
        let registry = RuleLoaderBuilder::new().build().load(config).unwrap();
        let bound: Vec<(&str, Option<&str>)> =
            registry.rules().map(|(p, ns, _)| (p, ns)).collect();
        assert_eq!(
            bound,
            vec![("root/a", Some("urn:x")), ("*/b", Some("urn:y"))]
        );
    }
}
