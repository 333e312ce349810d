use crate::{Attributes, Context, DigestError, ParamType, Rule, Value};

/// On begin, call `method` on the top object with the document's public identifier.
///
/// Does nothing when the event source reported no public identifier.
#[derive(Debug, Clone)]
pub struct SetPublicId {
    method: String,
}

impl SetPublicId {
    /// Call `method(String)`.
    #[must_use]
    pub fn new(method: &str) -> Self {
        Self {
            method: method.to_owned(),
        }
    }
}

impl Rule for SetPublicId {
    fn begin(&self, ctx: &mut Context<'_>, _: &Attributes) -> Result<(), DigestError> {
        let Some(public_id) = ctx.public_id().map(str::to_owned) else {
            return Ok(());
        };
        let target = ctx.peek(0)?;
        ctx.invoke(
            &target,
            &self.method,
            vec![Value::String(public_id)],
            &[ParamType::String],
        )
        .map(drop)
    }
}
