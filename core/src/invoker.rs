//! Method invocation by name and declared argument types.

use crate::{Bean, ClassResolver, DigestError, Method, ParamType, Value};

/// Resolves and invokes methods on erased beans.
///
/// Resolution is strict: same name, same arity, and each declared argument type
/// assignable to the formal parameter type. The first registered overload that
/// satisfies all three wins; there is no best-fit ranking.
#[derive(Debug, Clone, Copy)]
pub struct MethodInvoker<'a> {
    resolver: &'a ClassResolver,
}

impl<'a> MethodInvoker<'a> {
    /// Create an invoker over a resolver.
    #[must_use]
    pub fn new(resolver: &'a ClassResolver) -> Self {
        Self { resolver }
    }

    /// Find the method `name` on `type_name` accepting `declared`.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::NoSuchMethod`] if the type is unknown or no overload matches.
    pub fn resolve(
        &self,
        type_name: &str,
        name: &str,
        declared: &[ParamType],
    ) -> Result<&'a Method, DigestError> {
        self.resolver
            .get(type_name)
            .and_then(|class| {
                class.methods().iter().find(|method| {
                    method.name() == name
                        && method.params().len() == declared.len()
                        && method
                            .params()
                            .iter()
                            .zip(declared)
                            .all(|(formal, arg)| formal.is_assignable_from(arg, self.resolver))
                })
            })
            .ok_or_else(|| DigestError::NoSuchMethod {
                type_name: type_name.to_owned(),
                method: name.to_owned(),
                params: declared.iter().map(|p| p.name().to_owned()).collect(),
            })
    }

    /// Invoke a single-argument method.
    ///
    /// # Errors
    ///
    /// See [`invoke_with`](Self::invoke_with).
    pub fn invoke(
        &self,
        target: &mut dyn Bean,
        name: &str,
        arg: Value,
        declared: &ParamType,
    ) -> Result<(), DigestError> {
        self.invoke_with(target, name, vec![arg], std::slice::from_ref(declared))
    }

    /// Invoke a method with positional arguments.
    ///
    /// `args` and `declared` must have the same length.
    ///
    /// # Errors
    ///
    /// - [`DigestError::NoSuchMethod`] if resolution fails (non-fatal; the caller decides)
    /// - [`DigestError::InvocationFailure`] if an argument cannot be coerced or the
    ///   method body returns an error
    pub fn invoke_with(
        &self,
        target: &mut dyn Bean,
        name: &str,
        args: Vec<Value>,
        declared: &[ParamType],
    ) -> Result<(), DigestError> {
        let type_name = target.type_name();
        if args.len() != declared.len() {
            return Err(DigestError::illegal_state(format!(
                "{type_name}.{name}: {} argument(s) but {} declared type(s)",
                args.len(),
                declared.len()
            )));
        }
        let method = self.resolve(type_name, name, declared)?;
        let failure = |reason: String| DigestError::InvocationFailure {
            type_name: type_name.to_owned(),
            method: name.to_owned(),
            reason,
        };

        let coerced = method
            .params()
            .iter()
            .zip(args)
            .map(|(formal, arg)| formal.coerce(arg))
            .collect::<Result<Vec<_>, _>>()
            .map_err(failure)?;

        tracing::trace!(target_type = type_name, method = %method.signature(), "invoke");
        method.call(target, coerced).map_err(failure)
    }
}
