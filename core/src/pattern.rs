//! Path patterns and the pattern → rules registry.
//!
//! # Precedence
//!
//! For a given path, exactly one pattern wins and ALL of its rules fire:
//!
//! 1. Exact path (`web-app/servlet`)
//! 2. Suffix wildcard (`*/init-param`), longest matching suffix first
//! 3. Prefix wildcard (`web-app/*`), longest matching prefix first
//! 4. Catch-all `*`
//!
//! A path with no winning pattern is ignored. That is not an error.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::path_trie::PathTrie;
use crate::Rule;

/// A parsed path pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// Literal path.
    Exact(Vec<String>),
    /// `*/a/b`: the path `a/b` itself or any path ending in `/a/b`.
    Suffix(Vec<String>),
    /// `a/b/*`: `a/b` followed by one or more segments.
    Prefix(Vec<String>),
    /// `*`: any path.
    Any,
}

impl Pattern {
    /// Parse a pattern string. Empty segments are ignored.
    ///
    /// ```
    /// use trellis::Pattern;
    ///
    /// assert_eq!(Pattern::parse("*/param"), Pattern::Suffix(vec!["param".into()]));
    /// assert_eq!(Pattern::parse("a/*"), Pattern::Prefix(vec!["a".into()]));
    /// assert_eq!(Pattern::parse("a/b").to_string(), "a/b");
    /// ```
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        let trimmed = pattern.trim().trim_matches('/');
        if trimmed == "*" {
            return Self::Any;
        }
        if let Some(rest) = trimmed.strip_prefix("*/") {
            return Self::Suffix(segments(rest));
        }
        if let Some(rest) = trimmed.strip_suffix("/*") {
            return Self::Prefix(segments(rest));
        }
        Self::Exact(segments(trimmed))
    }

    /// Returns `true` if the pattern matches the path (segments root first).
    #[must_use]
    pub fn matches(&self, path: &[&str]) -> bool {
        match self {
            Self::Exact(p) => p.iter().map(String::as_str).eq(path.iter().copied()),
            Self::Suffix(p) => {
                path.len() >= p.len()
                    && p.iter()
                        .map(String::as_str)
                        .eq(path[path.len() - p.len()..].iter().copied())
            }
            Self::Prefix(p) => {
                path.len() > p.len()
                    && p.iter().map(String::as_str).eq(path[..p.len()].iter().copied())
            }
            Self::Any => true,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(p) => write!(f, "{}", p.join("/")),
            Self::Suffix(p) => write!(f, "*/{}", p.join("/")),
            Self::Prefix(p) => write!(f, "{}/*", p.join("/")),
            Self::Any => f.write_str("*"),
        }
    }
}

fn segments(s: &str) -> Vec<String> {
    s.split('/')
        .filter(|seg| !seg.is_empty())
        .map(str::to_owned)
        .collect()
}

/// The rules bound to one pattern, each with an optional namespace filter.
#[derive(Debug, Clone, Default)]
struct Bindings {
    pattern: String,
    rules: Vec<(Option<String>, Arc<dyn Rule>)>,
}

impl Bindings {
    fn resolve(&self, namespace: Option<&str>) -> Option<MatchedRules> {
        let rules: Vec<Arc<dyn Rule>> = self
            .rules
            .iter()
            .filter(|(ns, _)| ns.is_none() || ns.as_deref() == namespace)
            .map(|(_, rule)| Arc::clone(rule))
            .collect();
        (!rules.is_empty()).then(|| MatchedRules {
            pattern: self.pattern.clone(),
            rules,
        })
    }
}

/// The winning pattern for a path and the rules to fire, in registration order.
#[derive(Debug, Clone)]
pub struct MatchedRules {
    /// The winning pattern, in canonical form.
    pub pattern: String,
    /// Its rules, in registration order, after namespace filtering.
    pub rules: Vec<Arc<dyn Rule>>,
}

/// A group of related bindings added in one go.
///
/// If [`namespace()`](Self::namespace) returns a URI, every rule the set adds only
/// fires for elements in that namespace.
pub trait RuleSet {
    /// Namespace URI applied to every rule added by this set.
    fn namespace(&self) -> Option<&str> {
        None
    }

    /// Register this set's bindings.
    fn add_rule_instances(&self, registry: &mut PatternRegistry);
}

/// Pattern → ordered rules.
///
/// Built once during setup, then shared (behind an `Arc`) by every engine that
/// processes documents with it. Registration is additive: the same pattern may be
/// registered any number of times and its rules accumulate in order.
#[derive(Debug, Default)]
pub struct PatternRegistry {
    exact: HashMap<Vec<String>, Bindings>,
    /// Suffix patterns, keyed by reversed segments.
    suffix: PathTrie<Bindings>,
    prefix: PathTrie<Bindings>,
    any: Option<Bindings>,
    /// Every registration in order, for introspection.
    all: Vec<(String, Option<String>, Arc<dyn Rule>)>,
    /// Namespace applied while a [`RuleSet`] is being added.
    current_namespace: Option<String>,
}

impl PatternRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `rule` to `pattern`, after any rules already bound to it.
    pub fn add(&mut self, pattern: &str, rule: impl Rule + 'static) -> &mut Self {
        self.add_arc(pattern, Arc::new(rule))
    }

    /// Bind an already-shared rule.
    pub fn add_arc(&mut self, pattern: &str, rule: Arc<dyn Rule>) -> &mut Self {
        let namespace = self.current_namespace.clone();
        self.bind(Pattern::parse(pattern), namespace, rule);
        self
    }

    /// Bind `rule` to `pattern`, firing only for elements in `namespace`.
    pub fn add_ns(
        &mut self,
        pattern: &str,
        namespace: &str,
        rule: impl Rule + 'static,
    ) -> &mut Self {
        self.bind(
            Pattern::parse(pattern),
            Some(namespace.to_owned()),
            Arc::new(rule),
        );
        self
    }

    /// Bind an already-shared rule, firing only for elements in `namespace`.
    pub fn add_arc_ns(&mut self, pattern: &str, namespace: &str, rule: Arc<dyn Rule>) -> &mut Self {
        self.bind(Pattern::parse(pattern), Some(namespace.to_owned()), rule);
        self
    }

    /// Add every binding of a [`RuleSet`], applying its namespace.
    pub fn add_rule_set(&mut self, set: &dyn RuleSet) -> &mut Self {
        let previous = std::mem::replace(
            &mut self.current_namespace,
            set.namespace().map(str::to_owned),
        );
        set.add_rule_instances(self);
        self.current_namespace = previous;
        self
    }

    fn bind(&mut self, pattern: Pattern, namespace: Option<String>, rule: Arc<dyn Rule>) {
        let canonical = pattern.to_string();
        let bindings = match &pattern {
            Pattern::Exact(p) => self.exact.entry(p.clone()).or_default(),
            Pattern::Suffix(p) => self.suffix.entry(p.iter().rev().map(String::as_str)),
            Pattern::Prefix(p) => self.prefix.entry(p.iter().map(String::as_str)),
            Pattern::Any => self.any.get_or_insert_with(Bindings::default),
        };
        if bindings.pattern.is_empty() {
            bindings.pattern.clone_from(&canonical);
        }
        bindings.rules.push((namespace.clone(), Arc::clone(&rule)));
        self.all.push((canonical, namespace, rule));
    }

    /// Resolve the rules for a `/`-separated path.
    ///
    /// Returns `None` if no pattern matches, or if every rule of the winning pattern
    /// is filtered out by namespace.
    #[must_use]
    pub fn match_path(&self, path: &str, namespace: Option<&str>) -> Option<MatchedRules> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.match_segments(&segments, namespace)
    }

    /// Resolve the rules for a path given as segments, root first.
    #[must_use]
    pub fn match_segments(&self, path: &[&str], namespace: Option<&str>) -> Option<MatchedRules> {
        if path.is_empty() {
            return None;
        }
        let winner = self
            .exact_lookup(path)
            .or_else(|| self.suffix.find_longest_prefix(path.iter().rev().copied()).map(|(b, _)| b))
            .or_else(|| {
                self.prefix
                    .find_longest_prefix(path[..path.len() - 1].iter().copied())
                    .filter(|(_, depth)| *depth > 0)
                    .map(|(b, _)| b)
            })
            .or(self.any.as_ref())?;
        winner.resolve(namespace)
    }

    fn exact_lookup(&self, path: &[&str]) -> Option<&Bindings> {
        let key: Vec<String> = path.iter().map(|s| (*s).to_owned()).collect();
        self.exact.get(&key)
    }

    /// Every registration as `(pattern, namespace, rule)`, in registration order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, Option<&str>, &Arc<dyn Rule>)> {
        self.all
            .iter()
            .map(|(p, ns, rule)| (p.as_str(), ns.as_deref(), rule))
    }

    /// Distinct patterns, in order of first registration.
    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for (pattern, _, _) in &self.all {
            if !seen.contains(&pattern.as_str()) {
                seen.push(pattern.as_str());
            }
        }
        seen
    }

    /// Total number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}
