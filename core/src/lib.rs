//! trellis - pattern-driven rule dispatch for nested documents
//!
//! Maps a stream of structural events (element start, character data, element end)
//! onto an object graph. Rules are bound to path patterns; as the document is walked,
//! the matching rules fire and manipulate an explicit object stack.
//!
//! # Architecture
//!
//! - [`PatternRegistry`] — Path pattern → ordered rules (exact, `*/suffix`, `prefix/*`)
//! - [`ObjectStack`] — In-progress objects plus the pattern that pushed each one
//! - [`Digester`] — Consumes events, resolves rules, drives begin/body/end callbacks
//! - [`Rule`] — The extension point; built-in variants live in [`rules`]
//! - [`MethodInvoker`] — Name + declared-type method resolution over a [`ClassResolver`]
//!
//! # Key Design Insights
//!
//! 1. **Type erasure at registration**: typed setters (`|f: &mut Filter, name: String|`)
//!    are monomorphized into closures when a [`Class`] is built, then invoked by name.
//!
//! 2. **Explicit context**: every callback receives a [`Context`] carrying the stack,
//!    the current path, and the class resolver. There is no ambient engine state.
//!
//! 3. **Unmatched elements are ignored**: an element with no matching pattern is not
//!    an error. Documents may carry content the rule set does not care about.
//!
//! # Example
//!
//! ```
//! use trellis::prelude::*;
//! use trellis::rules::{CallMethod, ObjectCreate, SetNext};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, Default)]
//! struct Book { title: String }
//! impl BeanType for Book { const TYPE_NAME: &'static str = "Book"; }
//!
//! #[derive(Debug, Default)]
//! struct Shelf { books: Vec<Book> }
//! impl BeanType for Shelf { const TYPE_NAME: &'static str = "Shelf"; }
//!
//! let resolver = ClassResolverBuilder::new()
//!     .class(ClassBuilder::<Book>::new()
//!         .default_constructor()
//!         .method("setTitle", |b: &mut Book, title: String| b.title = title)
//!         .build())
//!     .class(ClassBuilder::<Shelf>::new()
//!         .default_constructor()
//!         .method("addBook", |s: &mut Shelf, Child(book): Child<Book>| s.books.push(book))
//!         .build())
//!     .build();
//!
//! let mut rules = PatternRegistry::new();
//! rules.add("shelf", ObjectCreate::new("Shelf"));
//! rules.add("shelf/book", ObjectCreate::new("Book"));
//! rules.add("shelf/book", SetNext::new("addBook", "Book"));
//! rules.add("shelf/book/title", CallMethod::new("setTitle", 0));
//!
//! let mut digester = Digester::new(Arc::new(rules), Arc::new(resolver));
//! let events = vec![
//!     Event::start("shelf"),
//!     Event::start("book"),
//!     Event::start("title"),
//!     Event::text("Dune"),
//!     Event::end("title"),
//!     Event::end("book"),
//!     Event::end("shelf"),
//! ];
//! let shelf = digester.parse_events(events).unwrap().unwrap();
//! let titles = shelf.with(|s: &Shelf| s.books.len());
//! assert_eq!(titles, Some(1));
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod bean;
mod class;
mod context;
mod digester;
mod event;
mod invoker;
mod path_trie;
mod pattern;
mod rule;
pub mod rules;
mod stack;
mod trace;
mod value;

#[cfg(feature = "xml")]
mod xml;

#[cfg(feature = "config")]
mod config;
#[cfg(feature = "config")]
mod loader;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use bean::{Bean, BeanType, ObjectRef};
pub use class::{
    Child, Class, ClassBuilder, ClassResolver, ClassResolverBuilder, FromValue, IntoMethod,
    Method, MethodOutcome,
};
pub use context::Context;
pub use digester::{Digester, DigesterState};
pub use event::{Attribute, Attributes, Event};
pub use invoker::MethodInvoker;
pub use pattern::{MatchedRules, Pattern, PatternRegistry, RuleSet};
pub use rule::Rule;
pub use stack::ObjectStack;
pub use value::{Literal, ParamType, Value};

// Trace types
pub use trace::{DispatchTrace, Phase, TraceStep};

// Config (feature-gated)
#[cfg(feature = "config")]
pub use config::{LiteralConfig, RuleConfig, RuleKindConfig, RuleSetConfig};
#[cfg(feature = "config")]
pub use loader::{IntoRule, RuleLoader, RuleLoaderBuilder};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use trellis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Objects
        Bean,
        BeanType,
        Child,
        // Classes
        ClassBuilder,
        ClassResolver,
        ClassResolverBuilder,
        // Engine
        Context,
        // Errors
        DigestError,
        Digester,
        DigesterState,
        Event,
        ObjectRef,
        ObjectStack,
        ParamType,
        PatternRegistry,
        Rule,
        RuleSet,
        Value,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum element nesting depth for a single document.
///
/// Guards the path and text stacks against runaway input from the event source.
pub const MAX_DEPTH: usize = 256;

/// Maximum number of objects on the [`ObjectStack`] at once.
///
/// A well-behaved rule set pushes at most one object per element, so exceeding this
/// means a rule is pushing without a matching pop.
pub const MAX_STACK_DEPTH: usize = 256;

/// Maximum positional arguments for a single call-method invocation.
pub const MAX_CALL_PARAMS: usize = 16;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from document processing and rule-set construction.
///
/// Everything except [`NoSuchMethod`](Self::NoSuchMethod) aborts the current document.
/// Recycle the [`Digester`] before reusing it for another document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DigestError {
    /// Pop or peek beyond the bottom of the object stack.
    #[error(
        "{operation} needs {requested} object(s) but the stack holds {depth} \
         — a rule popped more than it pushed"
    )]
    StackUnderflow {
        /// The stack operation that failed (`"pop"` or `"peek"`).
        operation: &'static str,
        /// Stack depth at the time of the call.
        depth: usize,
        /// Number of entries the operation needed.
        requested: usize,
    },

    /// Object stack grew past [`MAX_STACK_DEPTH`].
    #[error("object stack depth is {depth}, but maximum allowed is {max} — a rule pushes without popping")]
    StackOverflow {
        /// Depth that was reached.
        depth: usize,
        /// Maximum allowed depth.
        max: usize,
    },

    /// Element nesting exceeds [`MAX_DEPTH`].
    #[error("element nesting depth is {depth}, but maximum allowed is {max}")]
    NestingTooDeep {
        /// Nesting depth that was reached.
        depth: usize,
        /// Maximum allowed depth.
        max: usize,
    },

    /// An element limited to one occurrence appeared again.
    #[error("<{element}> element is limited to 1 occurrence")]
    DuplicateElement {
        /// The element name.
        element: String,
    },

    /// No method matched the requested name, arity and declared types.
    ///
    /// Non-fatal: built-in rules log it and carry on.
    #[error("no method {type_name}.{method}({}) found", .params.join(", "))]
    NoSuchMethod {
        /// Type the method was looked up on.
        type_name: String,
        /// Requested method name.
        method: String,
        /// Declared argument type names.
        params: Vec<String>,
    },

    /// The method was found but argument coercion or the method body failed.
    #[error("{type_name}.{method} failed: {reason}")]
    InvocationFailure {
        /// Receiver type.
        type_name: String,
        /// Method name.
        method: String,
        /// The underlying error message.
        reason: String,
    },

    /// A type name was not found in the class resolver.
    #[error("unknown type \"{type_name}\"{}", format_available(.available))]
    UnknownType {
        /// The unregistered type name.
        type_name: String,
        /// Type names that ARE registered.
        available: Vec<String>,
    },

    /// The engine or a rule was used out of order.
    #[error("illegal state: {message}")]
    IllegalState {
        /// What went wrong.
        message: String,
    },

    /// The XML event source failed.
    #[error("malformed document at byte {position}: {reason}")]
    Xml {
        /// Byte offset reported by the reader.
        position: u64,
        /// The underlying error message.
        reason: String,
    },

    /// Rule-set configuration deserialization or validation failed.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// The underlying error message.
        reason: String,
    },

    /// A custom rule type URL was not found in the loader.
    #[error("unknown rule type URL \"{type_url}\"{}", format_available(.available))]
    UnknownRuleType {
        /// The unregistered type URL.
        type_url: String,
        /// Type URLs that ARE registered.
        available: Vec<String>,
    },
}

impl DigestError {
    /// Returns `false` for errors a rule may absorb and keep going.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NoSuchMethod { .. })
    }

    pub(crate) fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        " — nothing is registered".to_string()
    } else {
        format!(" — registered: {}", available.join(", "))
    }
}
