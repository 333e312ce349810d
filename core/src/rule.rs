//! The `Rule` capability.

use std::fmt::Debug;

use crate::{Attributes, Context, DigestError};

/// A unit of begin / body / end behavior bound to a pattern.
///
/// Every phase defaults to a no-op. For one element, begin callbacks of the matched
/// rules run in registration order, body callbacks in registration order, and end
/// callbacks in reverse registration order.
///
/// Rules are shared configuration: they hold no per-document state. Anything that
/// must survive from begin to end lives on the object stack, in a parameter frame,
/// or in the seen-set on the [`Context`].
///
/// `Debug` output is what the dispatch trace records for the rule.
pub trait Rule: Send + Sync + Debug {
    /// Element opened.
    ///
    /// # Errors
    ///
    /// Any error aborts the document.
    fn begin(&self, ctx: &mut Context<'_>, attributes: &Attributes) -> Result<(), DigestError> {
        let _ = (ctx, attributes);
        Ok(())
    }

    /// Element closed; `text` is the element's accumulated character data, untrimmed.
    ///
    /// # Errors
    ///
    /// Any error aborts the document.
    fn body(&self, ctx: &mut Context<'_>, text: &str) -> Result<(), DigestError> {
        let _ = (ctx, text);
        Ok(())
    }

    /// Element closed, after every body callback.
    ///
    /// # Errors
    ///
    /// Any error aborts the document.
    fn end(&self, ctx: &mut Context<'_>) -> Result<(), DigestError> {
        let _ = ctx;
        Ok(())
    }
}
