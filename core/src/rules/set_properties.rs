use std::collections::HashMap;

use crate::{Attributes, Context, DigestError, ParamType, Rule, Value};

/// On begin, call a setter on the top object for every attribute.
///
/// Attribute `foo-bar` (or `fooBar`) maps to `setFooBar(String)`. Aliases rename
/// an attribute before the mapping; an alias to the empty string ignores it.
/// Attributes without a matching setter are skipped.
#[derive(Debug, Clone, Default)]
pub struct SetProperties {
    aliases: HashMap<String, String>,
}

impl SetProperties {
    /// Map every attribute by name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `attribute` onto `property` instead of its own name.
    #[must_use]
    pub fn alias(mut self, attribute: &str, property: &str) -> Self {
        self.aliases
            .insert(attribute.to_owned(), property.to_owned());
        self
    }

    /// Never map `attribute`.
    #[must_use]
    pub fn ignore(self, attribute: &str) -> Self {
        self.alias(attribute, "")
    }
}

/// `foo-bar` → `setFooBar`.
fn setter_name(property: &str) -> String {
    let mut name = String::with_capacity(property.len() + 3);
    name.push_str("set");
    let mut upper = true;
    for c in property.chars() {
        if c == '-' || c == '_' || c == '.' {
            upper = true;
        } else if upper {
            name.extend(c.to_uppercase());
            upper = false;
        } else {
            name.push(c);
        }
    }
    name
}

impl Rule for SetProperties {
    fn begin(&self, ctx: &mut Context<'_>, attributes: &Attributes) -> Result<(), DigestError> {
        let target = ctx.peek(0)?;
        for attribute in attributes.iter() {
            let property = self
                .aliases
                .get(&attribute.name)
                .map_or(attribute.name.as_str(), String::as_str);
            if property.is_empty() {
                continue;
            }
            ctx.invoke(
                &target,
                &setter_name(property),
                vec![Value::from(attribute.value.as_str())],
                &[ParamType::String],
            )?;
        }
        Ok(())
    }
}
