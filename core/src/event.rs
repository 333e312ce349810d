//! Structural events delivered by an event source.
//!
//! The engine does not parse bytes. Any source that can deliver strictly nested
//! start / characters / end events drives it; the `xml` feature provides one.

/// A single attribute on a start element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Local name.
    pub name: String,
    /// Namespace URI, if the attribute is qualified.
    pub namespace: Option<String>,
    /// Unescaped value.
    pub value: String,
}

/// Attributes of a start element, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    items: Vec<Attribute>,
}

impl Attributes {
    /// No attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unqualified attribute (builder style).
    #[must_use]
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.push(Attribute {
            name: name.to_owned(),
            namespace: None,
            value: value.to_owned(),
        });
        self
    }

    /// Append an attribute.
    pub fn push(&mut self, attribute: Attribute) {
        self.items.push(attribute);
    }

    /// Value of the first attribute with the given local name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Iterate in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.items.iter()
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if there are no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<Attribute> for Attributes {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// A structural document event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// An element opened.
    StartElement {
        /// Local name.
        name: String,
        /// Namespace URI, if the element is qualified.
        namespace: Option<String>,
        /// Attributes in document order.
        attributes: Attributes,
    },
    /// Character data inside the current element. May arrive in several chunks.
    Characters(String),
    /// The current element closed.
    EndElement {
        /// Local name. Must match the open element.
        name: String,
    },
}

impl Event {
    /// Start of an unqualified element without attributes.
    #[must_use]
    pub fn start(name: &str) -> Self {
        Self::start_with(name, Attributes::new())
    }

    /// Start of an unqualified element with attributes.
    #[must_use]
    pub fn start_with(name: &str, attributes: Attributes) -> Self {
        Self::StartElement {
            name: name.to_owned(),
            namespace: None,
            attributes,
        }
    }

    /// Start of a namespace-qualified element.
    #[must_use]
    pub fn start_ns(name: &str, namespace: &str) -> Self {
        Self::StartElement {
            name: name.to_owned(),
            namespace: Some(namespace.to_owned()),
            attributes: Attributes::new(),
        }
    }

    /// Character data.
    #[must_use]
    pub fn text(text: &str) -> Self {
        Self::Characters(text.to_owned())
    }

    /// End of an element.
    #[must_use]
    pub fn end(name: &str) -> Self {
        Self::EndElement {
            name: name.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_lookup_takes_first_match() {
        let attrs = Attributes::new().with("a", "1").with("b", "2").with("a", "3");
        assert_eq!(attrs.get("a"), Some("1"));
        assert_eq!(attrs.get("c"), None);
        assert_eq!(attrs.len(), 3);
    }

    #[test]
    fn constructors_build_expected_variants() {
        assert_eq!(
            Event::start_ns("x", "urn:y"),
            Event::StartElement {
                name: "x".into(),
                namespace: Some("urn:y".into()),
                attributes: Attributes::new(),
            }
        );
        assert_eq!(Event::end("x"), Event::EndElement { name: "x".into() });
    }
}
