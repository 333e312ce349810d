//! trellis-test: test domain for conformance testing
//!
//! Provides a single generic bean, [`Node`], and a [`ClassResolver`] exposing its
//! setters by name. Fixtures describe rule sets and documents as data and assert on
//! the resulting `Node` tree, so the engine can be exercised without a real domain.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis::prelude::*;
//! use trellis::rules::{CallMethod, ObjectCreate, SetNext};
//! use trellis_test::{resolver, Node};
//!
//! let mut rules = PatternRegistry::new();
//! rules.add("tree", ObjectCreate::new(Node::TYPE_NAME));
//! rules.add("tree/leaf", ObjectCreate::new(Node::TYPE_NAME));
//! rules.add("tree/leaf", CallMethod::new("setText", 0));
//! rules.add("tree/leaf", SetNext::new("addChild", Node::TYPE_NAME));
//!
//! let mut digester = Digester::new(Arc::new(rules), Arc::new(resolver()));
//! let tree = digester
//!     .parse_events(vec![
//!         Event::start("tree"),
//!         Event::start("leaf"),
//!         Event::text("hello"),
//!         Event::end("leaf"),
//!         Event::end("tree"),
//!     ])
//!     .unwrap()
//!     .unwrap();
//!
//! let tree = tree.downcast_clone::<Node>().unwrap();
//! assert_eq!(tree.children[0].text.as_deref(), Some("hello"));
//! ```

use std::collections::BTreeMap;

use trellis::prelude::*;

#[cfg(feature = "fixtures")]
pub mod fixture;

/// Supertype every [`Node`] is assignable to.
pub const CONTAINER_TYPE: &str = "test.Container";

/// A generic tree node.
///
/// Every field is reachable through a named setter, so a rule set can build any
/// shape of tree from configuration alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct Node {
    pub kind: String,
    pub id: Option<String>,
    pub text: Option<String>,
    pub count: i32,
    pub total: i64,
    pub enabled: bool,
    pub public_id: Option<String>,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Node {
    /// Create an empty node of the given kind.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// First child with the given id.
    #[must_use]
    pub fn child(&self, id: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.id.as_deref() == Some(id))
    }
}

impl BeanType for Node {
    const TYPE_NAME: &'static str = "test.Node";
}

/// Register [`Node`] with a resolver builder.
///
/// | Method | Parameters |
/// |--------|------------|
/// | `setKind`, `setId`, `setText`, `setPublicId` | `String` |
/// | `setCount` | `int` |
/// | `setTotal` | `long` |
/// | `setEnabled` | `boolean` |
/// | `setAttribute` | `String, String` |
/// | `addChild` | `test.Node` |
/// | `reject` | `String`, always fails with that message |
#[must_use]
pub fn register_classes(builder: ClassResolverBuilder) -> ClassResolverBuilder {
    builder.class(
        ClassBuilder::<Node>::new()
            .implements(CONTAINER_TYPE)
            .default_constructor()
            .method("setKind", |n: &mut Node, kind: String| n.kind = kind)
            .method("setId", |n: &mut Node, id: String| n.id = Some(id))
            .method("setText", |n: &mut Node, text: String| n.text = Some(text))
            .method("setPublicId", |n: &mut Node, id: String| n.public_id = Some(id))
            .method("setCount", |n: &mut Node, count: i32| n.count = count)
            .method("setTotal", |n: &mut Node, total: i64| n.total = total)
            .method("setEnabled", |n: &mut Node, enabled: bool| n.enabled = enabled)
            .method("setAttribute", |n: &mut Node, key: String, value: String| {
                n.attributes.insert(key, value);
            })
            .method("addChild", |n: &mut Node, Child(child): Child<Node>| {
                n.children.push(child)
            })
            .method("reject", |_: &mut Node, reason: String| Err::<(), _>(reason))
            .build(),
    )
}

/// A resolver knowing only [`Node`].
#[must_use]
pub fn resolver() -> ClassResolver {
    register_classes(ClassResolverBuilder::new()).build()
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{register_classes, resolver, Node, CONTAINER_TYPE};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use trellis::rules::{ObjectCreate, SetNext, SetProperties};
    use trellis::Attributes;

    #[test]
    fn node_is_a_container() {
        let r = resolver();
        assert_eq!(r.class_names(), vec!["test.Node"]);
        assert!(r.is_assignable("test.Node", CONTAINER_TYPE));
        assert!(!r.is_assignable(CONTAINER_TYPE, "test.Node"));
    }

    #[test]
    fn attributes_become_properties() {
        let mut rules = PatternRegistry::new();
        rules.add("n", ObjectCreate::new(Node::TYPE_NAME));
        rules.add("n", SetProperties::new().alias("type", "kind"));
        let mut d = Digester::new(Arc::new(rules), Arc::new(resolver()));
        let n = d
            .parse_events(vec![
                Event::start_with(
                    "n",
                    Attributes::new()
                        .with("id", "x")
                        .with("type", "leaf")
                        .with("color", "red"),
                ),
                Event::end("n"),
            ])
            .unwrap()
            .unwrap()
            .downcast_clone::<Node>()
            .unwrap();
        assert_eq!(n.id.as_deref(), Some("x"));
        assert_eq!(n.kind, "leaf");
        assert!(n.attributes.is_empty());
    }

    #[test]
    fn children_attach_bottom_up() {
        let mut rules = PatternRegistry::new();
        rules.add("n", ObjectCreate::new(Node::TYPE_NAME));
        rules.add("*/c", ObjectCreate::new(Node::TYPE_NAME));
        rules.add("*/c", SetNext::new("addChild", Node::TYPE_NAME));
        let mut d = Digester::new(Arc::new(rules), Arc::new(resolver()));
        let n = d
            .parse_events(vec![
                Event::start("n"),
                Event::start("c"),
                Event::start("c"),
                Event::end("c"),
                Event::end("c"),
                Event::end("n"),
            ])
            .unwrap()
            .unwrap()
            .downcast_clone::<Node>()
            .unwrap();
        assert_eq!(n.children.len(), 1);
        assert_eq!(n.children[0].children.len(), 1);
    }

    #[test]
    fn reject_surfaces_as_invocation_failure() {
        let mut rules = PatternRegistry::new();
        rules.add("n", ObjectCreate::new(Node::TYPE_NAME));
        rules.add("n", trellis::rules::CallMethod::new("reject", 0));
        let mut d = Digester::new(Arc::new(rules), Arc::new(resolver()));
        let err = d
            .parse_events(vec![Event::start("n"), Event::text("nope"), Event::end("n")])
            .unwrap_err();
        assert!(
            matches!(&err, DigestError::InvocationFailure { method, reason, .. }
                if method == "reject" && reason.contains("nope")),
            "{err}"
        );
    }
}
