use crate::{Attributes, Context, DigestError, Literal, Rule};

/// Call a fixed method on the top object with a literal argument.
///
/// Fires on begin unless [`on_end`](Self::on_end) is set.
///
/// ```
/// use trellis::rules::SetTop;
///
/// let distributable = SetTop::new("setDistributable", true);
/// let auth = SetTop::new("setAuthConstraint", true).on_end();
/// ```
#[derive(Debug, Clone)]
pub struct SetTop {
    method: String,
    value: Literal,
    on_end: bool,
}

impl SetTop {
    /// Call `method(value)` on begin.
    #[must_use]
    pub fn new(method: &str, value: impl Into<Literal>) -> Self {
        Self {
            method: method.to_owned(),
            value: value.into(),
            on_end: false,
        }
    }

    /// Fire on end instead of begin.
    #[must_use]
    pub fn on_end(mut self) -> Self {
        self.on_end = true;
        self
    }

    fn apply(&self, ctx: &mut Context<'_>) -> Result<(), DigestError> {
        let target = ctx.peek(0)?;
        ctx.invoke(
            &target,
            &self.method,
            vec![self.value.to_value()],
            &[self.value.param_type()],
        )
        .map(drop)
    }
}

impl Rule for SetTop {
    fn begin(&self, ctx: &mut Context<'_>, _: &Attributes) -> Result<(), DigestError> {
        if self.on_end {
            return Ok(());
        }
        self.apply(ctx)
    }

    fn end(&self, ctx: &mut Context<'_>) -> Result<(), DigestError> {
        if !self.on_end {
            return Ok(());
        }
        self.apply(ctx)
    }
}
