//! The explicit context handed to every rule callback.

use std::collections::HashSet;
use std::fmt;

use crate::{
    Bean, ClassResolver, DigestError, MethodInvoker, ObjectRef, ObjectStack, ParamType, Value,
    MAX_CALL_PARAMS,
};

/// Per-document mutable state owned by the engine.
#[derive(Debug, Default)]
pub(crate) struct DocumentState {
    pub(crate) stack: ObjectStack,
    /// Open call-method parameter frames, innermost last.
    pub(crate) params: Vec<Vec<Option<Value>>>,
    /// Keys marked by occurs-at-most-once rules. Cleared only by recycle.
    pub(crate) seen: HashSet<String>,
    pub(crate) public_id: Option<String>,
    /// Work scheduled through [`Context::defer`] for the current element.
    pub(crate) deferred: Vec<Deferred>,
}

impl DocumentState {
    /// Reset for a new document, keeping the seen-set.
    pub(crate) fn reset(&mut self) {
        self.stack.clear();
        self.params.clear();
        self.public_id = None;
        self.deferred.clear();
    }
}

/// A callback scheduled to run after the rest of an element's callbacks.
pub(crate) struct Deferred(Box<dyn FnOnce(&mut Context<'_>) -> Result<(), DigestError>>);

impl Deferred {
    pub(crate) fn run(self, ctx: &mut Context<'_>) -> Result<(), DigestError> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred")
    }
}

/// Where the engine currently is in the document.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ElementFrame<'a> {
    pub(crate) name: &'a str,
    pub(crate) namespace: Option<&'a str>,
    pub(crate) path: &'a str,
    pub(crate) pattern: &'a str,
    pub(crate) body_text: Option<&'a str>,
}

/// Everything a rule may touch while handling one callback.
///
/// There is no ambient engine: the object stack, parameter frames, seen-set, and
/// class resolver are all reached through this value.
pub struct Context<'a> {
    state: &'a mut DocumentState,
    resolver: &'a ClassResolver,
    frame: ElementFrame<'a>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        state: &'a mut DocumentState,
        resolver: &'a ClassResolver,
        frame: ElementFrame<'a>,
    ) -> Self {
        Self {
            state,
            resolver,
            frame,
        }
    }

    // ── Element ────────────────────────────────────────────────────────────────

    /// Local name of the current element.
    #[must_use]
    pub fn element_name(&self) -> &str {
        self.frame.name
    }

    /// Namespace URI of the current element.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.frame.namespace
    }

    /// Current path, `/`-separated.
    #[must_use]
    pub fn path(&self) -> &str {
        self.frame.path
    }

    /// The pattern that matched the current element.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.frame.pattern
    }

    /// Accumulated text of the current element. `None` during begin.
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        self.frame.body_text
    }

    /// Public identifier of the document, if the event source reported one.
    #[must_use]
    pub fn public_id(&self) -> Option<&str> {
        self.state.public_id.as_deref()
    }

    // ── Object stack ───────────────────────────────────────────────────────────

    /// Push an object, recording the current pattern against it.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::StackOverflow`] beyond the stack limit.
    pub fn push(&mut self, object: ObjectRef) -> Result<(), DigestError> {
        tracing::debug!(
            path = self.frame.path,
            object = object.type_name(),
            depth = self.state.stack.depth() + 1,
            "push"
        );
        self.state.stack.push(object, self.frame.pattern)
    }

    /// Pop the top object.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::StackUnderflow`] if the stack is empty.
    pub fn pop(&mut self) -> Result<ObjectRef, DigestError> {
        let object = self.state.stack.pop()?;
        tracing::debug!(
            path = self.frame.path,
            object = object.type_name(),
            depth = self.state.stack.depth(),
            "pop"
        );
        Ok(object)
    }

    /// The object `n` entries below the top (0 = top).
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::StackUnderflow`] past the bottom.
    pub fn peek(&self, n: usize) -> Result<ObjectRef, DigestError> {
        self.state.stack.peek(n).cloned()
    }

    /// Nearest object assignable to `type_name`, searching from the top.
    #[must_use]
    pub fn find_assignable(&self, type_name: &str) -> Option<ObjectRef> {
        self.state
            .stack
            .find_assignable(type_name, self.resolver)
            .map(|(_, object)| object.clone())
    }

    /// Read-only view of the stack.
    #[must_use]
    pub fn stack(&self) -> &ObjectStack {
        &self.state.stack
    }

    // ── Classes and methods ────────────────────────────────────────────────────

    /// The class resolution context.
    #[must_use]
    pub fn resolver(&self) -> &ClassResolver {
        self.resolver
    }

    /// Construct a registered type by name.
    ///
    /// # Errors
    ///
    /// See [`ClassResolver::instantiate`].
    pub fn instantiate(&self, type_name: &str) -> Result<ObjectRef, DigestError> {
        self.resolver.instantiate(type_name)
    }

    /// An invoker over the class resolution context.
    #[must_use]
    pub fn invoker(&self) -> MethodInvoker<'_> {
        MethodInvoker::new(self.resolver)
    }

    /// Invoke `method` on the object behind `target`.
    ///
    /// Returns `Ok(false)` if no matching method exists; that case is logged and
    /// otherwise ignored.
    ///
    /// # Errors
    ///
    /// Everything except [`DigestError::NoSuchMethod`].
    pub fn invoke(
        &self,
        target: &ObjectRef,
        method: &str,
        args: Vec<Value>,
        declared: &[ParamType],
    ) -> Result<bool, DigestError> {
        let mut bean = target.try_borrow_mut()?;
        self.invoke_bean(&mut **bean, method, args, declared)
    }

    /// Invoke `method` on an already-borrowed bean. Same policy as [`invoke`](Self::invoke).
    ///
    /// # Errors
    ///
    /// Everything except [`DigestError::NoSuchMethod`].
    pub fn invoke_bean(
        &self,
        target: &mut dyn Bean,
        method: &str,
        args: Vec<Value>,
        declared: &[ParamType],
    ) -> Result<bool, DigestError> {
        match self.invoker().invoke_with(target, method, args, declared) {
            Ok(()) => Ok(true),
            Err(err) if !err.is_fatal() => {
                tracing::warn!(path = self.frame.path, error = %err, "method not found, skipping");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    // ── Call parameters ────────────────────────────────────────────────────────

    /// Open a parameter frame with `count` empty slots.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::IllegalState`] above the parameter limit.
    pub fn push_params(&mut self, count: usize) -> Result<(), DigestError> {
        if count > MAX_CALL_PARAMS {
            return Err(DigestError::illegal_state(format!(
                "{count} call parameters requested, but maximum allowed is {MAX_CALL_PARAMS}"
            )));
        }
        self.state.params.push(vec![None; count]);
        Ok(())
    }

    /// Close the innermost parameter frame.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::IllegalState`] if no frame is open.
    pub fn pop_params(&mut self) -> Result<Vec<Option<Value>>, DigestError> {
        self.state
            .params
            .pop()
            .ok_or_else(|| DigestError::illegal_state("no call parameter frame is open"))
    }

    /// Fill slot `index` of the innermost parameter frame.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::IllegalState`] if no frame is open or the slot does not exist.
    pub fn set_param(&mut self, index: usize, value: Value) -> Result<(), DigestError> {
        let path = self.frame.path;
        let frame = self.state.params.last_mut().ok_or_else(|| {
            DigestError::illegal_state(format!("call parameter at {path} has no enclosing call"))
        })?;
        let len = frame.len();
        let slot = frame.get_mut(index).ok_or_else(|| {
            DigestError::illegal_state(format!(
                "call parameter {index} at {path} is out of range for {len} slot(s)"
            ))
        })?;
        *slot = Some(value);
        Ok(())
    }

    // ── Occurrence tracking ────────────────────────────────────────────────────

    /// Mark `key` as seen. Returns `false` if it was already marked.
    pub fn mark_seen(&mut self, key: &str) -> bool {
        self.state.seen.insert(key.to_owned())
    }

    // ── Scheduling ─────────────────────────────────────────────────────────────

    /// Run `action` once every callback of the current phase for this element has
    /// returned. Work deferred from an end callback therefore sees the effects of
    /// end callbacks that run after it; body-phase work runs after the end phase.
    pub fn defer(
        &mut self,
        action: impl FnOnce(&mut Context<'_>) -> Result<(), DigestError> + 'static,
    ) {
        self.state.deferred.push(Deferred(Box::new(action)));
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("path", &self.frame.path)
            .field("pattern", &self.frame.pattern)
            .field("depth", &self.state.stack.depth())
            .finish_non_exhaustive()
    }
}
