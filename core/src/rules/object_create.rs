use crate::{Attributes, Context, DigestError, Rule};

/// Instantiate a registered type on begin and push it; pop it on end.
///
/// ```
/// use trellis::rules::ObjectCreate;
///
/// // Type taken from the `className` attribute when present.
/// let rule = ObjectCreate::new("webapp.Listener").with_attribute("className");
/// ```
#[derive(Debug, Clone)]
pub struct ObjectCreate {
    type_name: String,
    attribute: Option<String>,
}

impl ObjectCreate {
    /// Create objects of `type_name`.
    #[must_use]
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_owned(),
            attribute: None,
        }
    }

    /// Let the element's `attribute` override the type name.
    #[must_use]
    pub fn with_attribute(mut self, attribute: &str) -> Self {
        self.attribute = Some(attribute.to_owned());
        self
    }

    /// The configured type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl Rule for ObjectCreate {
    fn begin(&self, ctx: &mut Context<'_>, attributes: &Attributes) -> Result<(), DigestError> {
        let type_name = self
            .attribute
            .as_deref()
            .and_then(|attr| attributes.get(attr))
            .unwrap_or(&self.type_name);
        let object = ctx.instantiate(type_name)?;
        ctx.push(object)
    }

    fn end(&self, ctx: &mut Context<'_>) -> Result<(), DigestError> {
        ctx.pop().map(drop)
    }
}
