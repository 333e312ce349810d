//! Beans — the objects rules build, and the handles the stack holds
//!
//! A domain type opts in by implementing [`BeanType`]. The object-safe [`Bean`]
//! erasure is provided automatically; the engine only ever sees `dyn Bean`.
//!
//! # Resource holders
//!
//! Some containers do not accept children directly but expose a distinguished
//! sub-object that does (an application exposing its naming resources, say).
//! [`BeanType::resource_holder`] is that capability; the holder-aware
//! [`SetNext`](crate::rules::SetNext) rule checks it before calling the parent.

use crate::DigestError;
use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt::{self, Debug};
use std::rc::Rc;

/// A typed domain object that rules can construct and call.
///
/// # Example
///
/// ```
/// use trellis::BeanType;
///
/// #[derive(Debug, Default)]
/// struct ErrorPage { location: String }
///
/// impl BeanType for ErrorPage {
///     const TYPE_NAME: &'static str = "webapp.ErrorPage";
/// }
/// ```
pub trait BeanType: Any + Debug {
    /// Registered type name. Must match the name the [`Class`](crate::Class) is built under.
    const TYPE_NAME: &'static str;

    /// The sub-object that accepts children on this object's behalf, if any.
    fn resource_holder(&mut self) -> Option<&mut dyn Bean> {
        None
    }
}

/// Object-safe erasure of [`BeanType`].
///
/// Implemented for every `BeanType`; do not implement it by hand.
pub trait Bean: Debug {
    /// The registered type name of the concrete type.
    fn type_name(&self) -> &'static str;

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Owned upcast, used to move a finished bean out of its handle.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// See [`BeanType::resource_holder`].
    fn resource_holder(&mut self) -> Option<&mut dyn Bean>;
}

impl<T: BeanType> Bean for T {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn resource_holder(&mut self) -> Option<&mut dyn Bean> {
        BeanType::resource_holder(self)
    }
}

/// Shared handle to a bean on (or popped from) the object stack.
///
/// Processing is single-threaded, so the handle is `Rc<RefCell<_>>`. Cloning the
/// handle shares the object; equality is identity.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Box<dyn Bean>>>);

impl ObjectRef {
    /// Wrap a typed bean.
    pub fn new<T: BeanType>(bean: T) -> Self {
        Self::from_boxed(Box::new(bean))
    }

    /// Wrap an already-erased bean (as produced by a class factory).
    #[must_use]
    pub fn from_boxed(bean: Box<dyn Bean>) -> Self {
        Self(Rc::new(RefCell::new(bean)))
    }

    /// Registered type name of the referenced bean.
    ///
    /// Returns `"<borrowed>"` while the bean is mutably borrowed.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.0
            .try_borrow()
            .map_or("<borrowed>", |bean| bean.type_name())
    }

    /// Returns `true` if the bean's concrete type is `T`.
    #[must_use]
    pub fn is<T: BeanType>(&self) -> bool {
        self.0
            .try_borrow()
            .is_ok_and(|bean| bean.as_any().is::<T>())
    }

    /// Immutably borrow the bean.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::IllegalState`] if the bean is already mutably borrowed.
    pub fn try_borrow(&self) -> Result<Ref<'_, Box<dyn Bean>>, DigestError> {
        self.0.try_borrow().map_err(|_| {
            DigestError::illegal_state("object is already borrowed for mutation")
        })
    }

    /// Mutably borrow the bean.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::IllegalState`] if the bean is already borrowed, which
    /// happens when the same object is both receiver and argument of a call.
    pub fn try_borrow_mut(&self) -> Result<RefMut<'_, Box<dyn Bean>>, DigestError> {
        self.0.try_borrow_mut().map_err(|_| {
            DigestError::illegal_state(format!(
                "{} is already borrowed; an object cannot be passed to itself",
                self.type_name()
            ))
        })
    }

    /// Run `f` against the bean as a `T`.
    ///
    /// Returns `None` if the bean is not a `T` or is currently mutably borrowed.
    pub fn with<T: BeanType, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let bean = self.0.try_borrow().ok()?;
        bean.as_any().downcast_ref::<T>().map(f)
    }

    /// Run `f` against the bean as a mutable `T`.
    pub fn with_mut<T: BeanType, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut bean = self.0.try_borrow_mut().ok()?;
        bean.as_any_mut().downcast_mut::<T>().map(f)
    }

    /// Clone the bean out as a `T`.
    #[must_use]
    pub fn downcast_clone<T: BeanType + Clone>(&self) -> Option<T> {
        self.with(T::clone)
    }

    /// Move the bean out of the handle.
    ///
    /// Returns `None` if the bean is not a `T` or other handles to it still exist.
    #[must_use]
    pub fn into_inner<T: BeanType>(self) -> Option<T> {
        if !self.is::<T>() {
            return None;
        }
        let cell = Rc::try_unwrap(self.0).ok()?;
        cell.into_inner().into_any().downcast::<T>().ok().map(|b| *b)
    }

    /// Returns `true` if both handles refer to the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(bean) => f.debug_tuple("ObjectRef").field(&*bean).finish(),
            Err(_) => f.debug_tuple("ObjectRef").field(&"<borrowed>").finish(),
        }
    }
}
