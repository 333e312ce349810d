//! The object stack.

use crate::{ClassResolver, DigestError, ObjectRef, MAX_STACK_DEPTH};

/// In-progress objects, each paired with the pattern whose rule pushed it.
///
/// Index 0 of [`peek`](Self::peek) is the top (current object), 1 its parent, and so
/// on. Misuse (popping an empty stack, peeking past the bottom) is a
/// [`DigestError::StackUnderflow`] and aborts the document.
#[derive(Debug, Default)]
pub struct ObjectStack {
    entries: Vec<(ObjectRef, String)>,
    /// First object pushed since the last clear. Survives the pop that empties the stack.
    root: Option<ObjectRef>,
}

impl ObjectStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an object, recording the pattern responsible.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::StackOverflow`] beyond [`MAX_STACK_DEPTH`].
    pub fn push(&mut self, object: ObjectRef, pattern: &str) -> Result<(), DigestError> {
        if self.entries.len() >= MAX_STACK_DEPTH {
            return Err(DigestError::StackOverflow {
                depth: self.entries.len() + 1,
                max: MAX_STACK_DEPTH,
            });
        }
        if self.root.is_none() {
            self.root = Some(object.clone());
        }
        self.entries.push((object, pattern.to_owned()));
        Ok(())
    }

    /// Pop the top object.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::StackUnderflow`] if the stack is empty.
    pub fn pop(&mut self) -> Result<ObjectRef, DigestError> {
        self.entries
            .pop()
            .map(|(object, _)| object)
            .ok_or(DigestError::StackUnderflow {
                operation: "pop",
                depth: 0,
                requested: 1,
            })
    }

    /// The object `n` entries below the top (0 = top, 1 = parent).
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::StackUnderflow`] if `n` is not below the depth.
    pub fn peek(&self, n: usize) -> Result<&ObjectRef, DigestError> {
        self.entry(n).map(|(object, _)| object)
    }

    /// The pattern that pushed the object `n` entries below the top.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::StackUnderflow`] if `n` is not below the depth.
    pub fn peek_pattern(&self, n: usize) -> Result<&str, DigestError> {
        self.entry(n).map(|(_, pattern)| pattern.as_str())
    }

    fn entry(&self, n: usize) -> Result<&(ObjectRef, String), DigestError> {
        let depth = self.entries.len();
        depth
            .checked_sub(n + 1)
            .and_then(|i| self.entries.get(i))
            .ok_or(DigestError::StackUnderflow {
                operation: "peek",
                depth,
                requested: n + 1,
            })
    }

    /// Nearest object, from the top down, whose type is assignable to `type_name`.
    ///
    /// Returns its distance from the top and the object.
    #[must_use]
    pub fn find_assignable(
        &self,
        type_name: &str,
        resolver: &ClassResolver,
    ) -> Option<(usize, &ObjectRef)> {
        self.iter()
            .enumerate()
            .find(|(_, object)| resolver.is_assignable(object.type_name(), type_name))
    }

    /// Iterate from the top down.
    pub fn iter(&self) -> impl Iterator<Item = &ObjectRef> {
        self.entries.iter().rev().map(|(object, _)| object)
    }

    /// Number of objects on the stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The bottom object, if any.
    #[must_use]
    pub fn bottom(&self) -> Option<&ObjectRef> {
        self.entries.first().map(|(object, _)| object)
    }

    /// The first object pushed since the last [`clear`](Self::clear).
    #[must_use]
    pub fn root(&self) -> Option<&ObjectRef> {
        self.root.as_ref()
    }

    /// Remove every object and forget the root.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.root = None;
    }
}
