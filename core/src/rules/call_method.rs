use crate::{Attributes, Context, DigestError, ParamType, Rule, Value};

/// Call a method on the top object when the element closes.
///
/// With `param_count == 0` the element's trimmed body text is the single argument.
/// Otherwise the rule opens a parameter frame on begin; [`CallParam`] rules on this
/// element or its descendants fill the slots, and the call fires on end only if
/// every slot was filled.
///
/// ```
/// use trellis::rules::{CallMethod, CallParam};
/// use trellis::PatternRegistry;
///
/// let mut rules = PatternRegistry::new();
/// rules.add("web-app/servlet-mapping", CallMethod::new("addServletMapping", 2));
/// rules.add("web-app/servlet-mapping/servlet-name", CallParam::new(1));
/// rules.add("web-app/servlet-mapping/url-pattern", CallParam::new(0));
/// ```
#[derive(Debug, Clone)]
pub struct CallMethod {
    method: String,
    param_count: usize,
    param_types: Vec<ParamType>,
}

impl CallMethod {
    /// Call `method` with `param_count` `String` parameters (body text if 0).
    #[must_use]
    pub fn new(method: &str, param_count: usize) -> Self {
        Self {
            method: method.to_owned(),
            param_count,
            param_types: vec![ParamType::String; param_count.max(1)],
        }
    }

    /// Declare parameter types by name (`"int"`, `"Boolean"`, a bean type, …).
    ///
    /// Missing trailing types default to `String`; extra types are ignored.
    #[must_use]
    pub fn with_param_types(mut self, types: &[&str]) -> Self {
        for (slot, name) in self.param_types.iter_mut().zip(types) {
            *slot = ParamType::from_name(name);
        }
        self
    }

    /// Number of parameter slots (0 = body text).
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.param_count
    }
}

impl Rule for CallMethod {
    fn begin(&self, ctx: &mut Context<'_>, _: &Attributes) -> Result<(), DigestError> {
        if self.param_count > 0 {
            ctx.push_params(self.param_count)?;
        }
        Ok(())
    }

    fn end(&self, ctx: &mut Context<'_>) -> Result<(), DigestError> {
        let args = if self.param_count == 0 {
            vec![Value::from(ctx.body_text().unwrap_or_default().trim())]
        } else {
            let slots = ctx.pop_params()?;
            if let Some(missing) = slots.iter().position(Option::is_none) {
                tracing::debug!(
                    path = ctx.path(),
                    method = %self.method,
                    missing,
                    "call skipped, parameter not supplied"
                );
                return Ok(());
            }
            slots.into_iter().flatten().collect()
        };
        let target = ctx.peek(0)?;
        ctx.invoke(&target, &self.method, args, &self.param_types)
            .map(drop)
    }
}

/// Fill one slot of the enclosing [`CallMethod`]'s parameter frame.
///
/// By default the slot receives this element's trimmed body text.
/// [`from_attribute`](Self::from_attribute) takes an attribute value on begin instead.
#[derive(Debug, Clone)]
pub struct CallParam {
    index: usize,
    attribute: Option<String>,
}

impl CallParam {
    /// Fill slot `index` from body text.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self {
            index,
            attribute: None,
        }
    }

    /// Fill slot `index` from the named attribute. Absent attributes leave the slot empty.
    #[must_use]
    pub fn from_attribute(index: usize, attribute: &str) -> Self {
        Self {
            index,
            attribute: Some(attribute.to_owned()),
        }
    }
}

impl Rule for CallParam {
    fn begin(&self, ctx: &mut Context<'_>, attributes: &Attributes) -> Result<(), DigestError> {
        if let Some(value) = self.attribute.as_deref().and_then(|a| attributes.get(a)) {
            ctx.set_param(self.index, Value::from(value))?;
        }
        Ok(())
    }

    fn body(&self, ctx: &mut Context<'_>, text: &str) -> Result<(), DigestError> {
        if self.attribute.is_none() {
            ctx.set_param(self.index, Value::from(text.trim()))?;
        }
        Ok(())
    }
}
