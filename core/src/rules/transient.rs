use std::fmt;
use std::marker::PhantomData;

use crate::{Attributes, BeanType, Context, DigestError, ObjectRef, Rule};

type Finisher<T, P> = Box<dyn Fn(T, &mut P) -> Result<(), String> + Send + Sync>;

/// Push a fresh `T` on begin; on end, always pop it and hand it to the parent.
///
/// For objects that only carry data from nested elements to their parent (a role
/// name and link, say). Nested rules fill the `T` while it is on top of the stack;
/// at close it is popped unconditionally and `finish(t, &mut parent)` runs.
///
/// The popped object must not be retained elsewhere: a method that stores the
/// [`ObjectRef`] itself keeps a second handle, and the pop then fails.
///
/// ```
/// use trellis::rules::Transient;
/// use trellis::BeanType;
///
/// #[derive(Debug, Default)]
/// struct RoleRef { name: String, link: String }
/// impl BeanType for RoleRef { const TYPE_NAME: &'static str = "webapp.RoleRef"; }
///
/// #[derive(Debug, Default)]
/// struct Servlet { refs: Vec<(String, String)> }
/// impl BeanType for Servlet { const TYPE_NAME: &'static str = "webapp.Servlet"; }
///
/// let rule = Transient::<RoleRef, Servlet>::new(|r, s| {
///     s.refs.push((r.name, r.link));
///     Ok(())
/// });
/// ```
pub struct Transient<T, P> {
    finish: Finisher<T, P>,
    _phantom: PhantomData<fn() -> (T, P)>,
}

impl<T: BeanType + Default, P: BeanType> Transient<T, P> {
    /// Create with the finisher that consumes the popped `T`.
    pub fn new(finish: impl Fn(T, &mut P) -> Result<(), String> + Send + Sync + 'static) -> Self {
        Self {
            finish: Box::new(finish),
            _phantom: PhantomData,
        }
    }
}

impl<T, P> fmt::Debug for Transient<T, P>
where
    T: BeanType,
    P: BeanType,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transient")
            .field("object", &T::TYPE_NAME)
            .field("parent", &P::TYPE_NAME)
            .finish()
    }
}

impl<T: BeanType + Default, P: BeanType> Rule for Transient<T, P> {
    fn begin(&self, ctx: &mut Context<'_>, _: &Attributes) -> Result<(), DigestError> {
        ctx.push(ObjectRef::new(T::default()))
    }

    fn end(&self, ctx: &mut Context<'_>) -> Result<(), DigestError> {
        let object = ctx.pop()?;
        let value = object.into_inner::<T>().ok_or_else(|| {
            DigestError::illegal_state(format!(
                "transient {} at {} was replaced or is still referenced",
                T::TYPE_NAME,
                ctx.path()
            ))
        })?;
        let parent = ctx.peek(0)?;
        let failure = |reason: String| DigestError::InvocationFailure {
            type_name: parent.type_name().to_owned(),
            method: format!("<finish {}>", T::TYPE_NAME),
            reason,
        };
        parent
            .with_mut(|p: &mut P| (self.finish)(value, p))
            .ok_or_else(|| failure(format!("parent is not a {}", P::TYPE_NAME)))?
            .map_err(failure)
    }
}
