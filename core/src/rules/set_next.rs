use crate::{Context, DigestError, ObjectRef, ParamType, Rule, Value};

/// On end, call `method` on the parent (`peek(1)`) with the child (`peek(0)`).
///
/// Both objects are taken when the end callback runs, but the call itself waits
/// until the element's remaining end callbacks have returned, so the parent receives
/// the child in its final state. Does not pop: the rule that pushed the child pops it.
///
/// # Resource holders
///
/// [`via_holder`](Self::via_holder) handles parents that delegate children to a
/// sub-object. If the parent exposes a [`resource_holder`](crate::BeanType::resource_holder),
/// the method is called on the holder. Otherwise the parent itself must be
/// assignable to the holder type; if it is not, the call fails with
/// [`DigestError::InvocationFailure`].
#[derive(Debug, Clone)]
pub struct SetNext {
    method: String,
    param_type: ParamType,
    holder_type: Option<String>,
}

impl SetNext {
    /// Call `method`, declaring the child as `param_type`.
    #[must_use]
    pub fn new(method: &str, param_type: &str) -> Self {
        Self {
            method: method.to_owned(),
            param_type: ParamType::from_name(param_type),
            holder_type: None,
        }
    }

    /// Route the call through the parent's resource holder, or require the parent
    /// to be a `holder_type` itself.
    #[must_use]
    pub fn via_holder(mut self, holder_type: &str) -> Self {
        self.holder_type = Some(holder_type.to_owned());
        self
    }
}

impl SetNext {
    fn attach(
        &self,
        ctx: &mut Context<'_>,
        parent: &ObjectRef,
        child: ObjectRef,
    ) -> Result<(), DigestError> {
        let args = vec![Value::Object(child)];
        let declared = std::slice::from_ref(&self.param_type);

        let Some(holder_type) = &self.holder_type else {
            return ctx.invoke(parent, &self.method, args, declared).map(drop);
        };

        let mut bean = parent.try_borrow_mut()?;
        if let Some(holder) = bean.resource_holder() {
            return ctx.invoke_bean(holder, &self.method, args, declared).map(drop);
        }
        if ctx.resolver().is_assignable(bean.type_name(), holder_type) {
            return ctx.invoke_bean(&mut **bean, &self.method, args, declared).map(drop);
        }
        Err(DigestError::InvocationFailure {
            type_name: bean.type_name().to_owned(),
            method: self.method.clone(),
            reason: format!(
                "parent neither exposes a resource holder nor is a {holder_type}"
            ),
        })
    }
}

impl Rule for SetNext {
    fn end(&self, ctx: &mut Context<'_>) -> Result<(), DigestError> {
        let child = ctx.peek(0)?;
        let parent = ctx.peek(1)?;
        let rule = self.clone();
        ctx.defer(move |ctx| rule.attach(ctx, &parent, child));
        Ok(())
    }
}
