//! XML event source backed by `quick-xml`.
//!
//! Namespace-aware: element and attribute names are reported by local name with
//! their resolved URI. `xmlns` declarations are not reported as attributes. A
//! `PUBLIC` identifier in the DOCTYPE is recorded on the engine before the root
//! element opens.

use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::{Attribute, Attributes, DigestError, Digester, ObjectRef};

impl Digester {
    /// Parse a complete XML document.
    ///
    /// # Errors
    ///
    /// - [`DigestError::Xml`] if the text is not well-formed
    /// - any rule error; the engine is then `Failed`
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use trellis::prelude::*;
    /// use trellis::rules::ValidateOnce;
    ///
    /// let mut rules = PatternRegistry::new();
    /// rules.add("a/b", ValidateOnce::new("b"));
    /// let mut digester = Digester::new(Arc::new(rules), Arc::new(ClassResolver::empty()));
    ///
    /// assert!(digester.parse_str("<a><b/><c/></a>").is_ok());
    ///
    /// digester.recycle();
    /// assert!(matches!(
    ///     digester.parse_str("<a><b></a>"),
    ///     Err(DigestError::Xml { .. })
    /// ));
    /// assert_eq!(digester.state(), DigesterState::Failed);
    /// ```
    pub fn parse_str(&mut self, xml: &str) -> Result<Option<ObjectRef>, DigestError> {
        self.start_document()?;
        match self.feed_xml(xml) {
            Err(err @ DigestError::Xml { .. }) => {
                self.abort(&err);
                Err(err)
            }
            other => other,
        }
    }

    fn feed_xml(&mut self, xml: &str) -> Result<Option<ObjectRef>, DigestError> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(false);
        reader.config_mut().expand_empty_elements = true;

        loop {
            let event = reader.read_event().map_err(|e| xml_error(&reader, &e))?;
            match event {
                XmlEvent::Start(start) => {
                    let (resolved, local) = reader.resolve_element(start.name());
                    let name = decode(&reader, local.as_ref())?;
                    let namespace = namespace_uri(&reader, &resolved)?;
                    let attributes = attributes(&reader, &start)?;
                    self.start_element(&name, namespace.as_deref(), &attributes)?;
                }
                XmlEvent::End(end) => {
                    let name = decode(&reader, end.local_name().as_ref())?;
                    self.end_element(&name)?;
                }
                XmlEvent::Text(text) => {
                    let text = text.unescape().map_err(|e| xml_error(&reader, &e))?;
                    self.characters(&text)?;
                }
                XmlEvent::CData(cdata) => {
                    let text = decode(&reader, &cdata)?;
                    self.characters(&text)?;
                }
                XmlEvent::DocType(doctype) => {
                    let text = decode(&reader, &doctype)?;
                    if let Some(public_id) = public_id(&text) {
                        tracing::debug!(public_id, "doctype public identifier");
                        self.set_public_id(public_id);
                    }
                }
                XmlEvent::Eof => break,
                // Declarations, comments and processing instructions carry no content.
                _ => {}
            }
        }

        self.end_document()
    }
}

fn attributes(reader: &NsReader<&[u8]>, start: &BytesStart<'_>) -> Result<Attributes, DigestError> {
    let mut attributes = Attributes::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_error(reader, &e))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attr.key);
        let value = attr.unescape_value().map_err(|e| xml_error(reader, &e))?;
        attributes.push(Attribute {
            name: decode(reader, local.as_ref())?,
            namespace: namespace_uri(reader, &resolved)?,
            value: value.into_owned(),
        });
    }
    Ok(attributes)
}

fn namespace_uri(
    reader: &NsReader<&[u8]>,
    resolved: &ResolveResult<'_>,
) -> Result<Option<String>, DigestError> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(decode(reader, ns.0)?)),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(DigestError::Xml {
            position: reader.buffer_position() as u64,
            reason: format!(
                "unbound namespace prefix \"{}\"",
                String::from_utf8_lossy(prefix)
            ),
        }),
    }
}

fn decode(reader: &NsReader<&[u8]>, bytes: &[u8]) -> Result<String, DigestError> {
    reader
        .decoder()
        .decode(bytes)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| xml_error(reader, &e))
}

fn xml_error(reader: &NsReader<&[u8]>, err: &dyn std::fmt::Display) -> DigestError {
    DigestError::Xml {
        position: reader.buffer_position() as u64,
        reason: err.to_string(),
    }
}

/// The first quoted literal after `PUBLIC` in a DOCTYPE body.
fn public_id(doctype: &str) -> Option<&str> {
    let (_, rest) = doctype.split_once("PUBLIC")?;
    let rest = rest.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &rest[1..];
    rest.find(quote).map(|end| &rest[..end])
}
