//! Class resolution context: constructors and methods callable by name.
//!
//! Rules refer to types and methods by name (`"webapp.FilterDef"`, `"setFilterName"`).
//! A [`ClassResolver`] maps those names onto real Rust code.
//!
//! # Architecture (axum `Handler` pattern)
//!
//! Methods are registered as ordinary typed closures. At registration time the closure
//! is monomorphized against its argument extractors ([`FromValue`]) and erased behind a
//! boxed `Fn(&mut dyn Bean, Vec<Value>)`. The declared parameter types are captured at
//! the same moment, so lookup by name + declared types needs no runtime reflection.
//!
//! # Example
//!
//! ```
//! use trellis::{BeanType, Child, ClassBuilder, ClassResolverBuilder};
//!
//! #[derive(Debug, Clone, Default)]
//! struct FilterDef { name: String }
//! impl BeanType for FilterDef { const TYPE_NAME: &'static str = "webapp.FilterDef"; }
//!
//! #[derive(Debug, Default)]
//! struct WebApp { filters: Vec<FilterDef>, distributable: bool }
//! impl BeanType for WebApp { const TYPE_NAME: &'static str = "webapp.WebApp"; }
//!
//! let resolver = ClassResolverBuilder::new()
//!     .class(ClassBuilder::<FilterDef>::new()
//!         .default_constructor()
//!         .method("setFilterName", |f: &mut FilterDef, name: String| f.name = name)
//!         .build())
//!     .class(ClassBuilder::<WebApp>::new()
//!         .implements("webapp.Context")
//!         .method("setDistributable", |w: &mut WebApp, d: bool| w.distributable = d)
//!         .method("addFilterDef", |w: &mut WebApp, Child(f): Child<FilterDef>| w.filters.push(f))
//!         .build())
//!     .build();
//!
//! assert!(resolver.is_assignable("webapp.WebApp", "webapp.Context"));
//! assert_eq!(resolver.class_names(), vec!["webapp.FilterDef", "webapp.WebApp"]);
//! ```

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::marker::PhantomData;

use crate::value::OBJECT_TYPE;
use crate::{Bean, BeanType, DigestError, ObjectRef, ParamType, Value};

// ═══════════════════════════════════════════════════════════════════════════════
// Argument extraction
// ═══════════════════════════════════════════════════════════════════════════════

/// Extracts a typed method argument from an already-coerced [`Value`].
///
/// The invoker coerces each argument to [`param_type()`](Self::param_type) before the
/// method runs, so implementations only unwrap the expected variant.
pub trait FromValue: Sized {
    /// The declared parameter type this extractor accepts.
    fn param_type() -> ParamType;

    /// Unwrap the value.
    ///
    /// # Errors
    ///
    /// Returns a message if the value has the wrong shape (including `Null` for
    /// non-optional parameters).
    fn from_value(value: Value) -> Result<Self, String>;
}

impl FromValue for String {
    fn param_type() -> ParamType {
        ParamType::String
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(format!("expected String, got {other:?}")),
        }
    }
}

impl FromValue for i32 {
    fn param_type() -> ParamType {
        ParamType::Integer
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Int(i) => i32::try_from(i).map_err(|e| e.to_string()),
            other => Err(format!("expected Integer, got {other:?}")),
        }
    }
}

impl FromValue for i64 {
    fn param_type() -> ParamType {
        ParamType::Long
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(format!("expected Long, got {other:?}")),
        }
    }
}

impl FromValue for bool {
    fn param_type() -> ParamType {
        ParamType::Boolean
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(format!("expected Boolean, got {other:?}")),
        }
    }
}

/// Any bean, passed as a shared handle.
impl FromValue for ObjectRef {
    fn param_type() -> ParamType {
        ParamType::Object(OBJECT_TYPE.to_string())
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Object(o) => Ok(o),
            other => Err(format!("expected an object, got {other:?}")),
        }
    }
}

/// `Null` becomes `None`; anything else is extracted as `T`.
impl<T: FromValue> FromValue for Option<T> {
    fn param_type() -> ParamType {
        T::param_type()
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// A typed child bean, cloned out of its handle.
///
/// Declares the parameter as `T::TYPE_NAME`, so a set-next rule declaring that type
/// (or a subtype) resolves to this method.
#[derive(Debug, Clone, PartialEq)]
pub struct Child<T>(pub T);

impl<T: BeanType + Clone> FromValue for Child<T> {
    fn param_type() -> ParamType {
        ParamType::Object(T::TYPE_NAME.to_string())
    }

    fn from_value(value: Value) -> Result<Self, String> {
        let object = ObjectRef::from_value(value)?;
        object.downcast_clone::<T>().map(Child).ok_or_else(|| {
            format!(
                "expected {}, got {}",
                T::TYPE_NAME,
                object.type_name()
            )
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Method bodies
// ═══════════════════════════════════════════════════════════════════════════════

/// What a registered method body may return: `()` or `Result<(), E: Display>`.
pub trait MethodOutcome {
    /// Normalize into a result with a printable error.
    ///
    /// # Errors
    ///
    /// Returns the method's own error message.
    fn into_outcome(self) -> Result<(), String>;
}

impl MethodOutcome for () {
    fn into_outcome(self) -> Result<(), String> {
        Ok(())
    }
}

impl<E: Display> MethodOutcome for Result<(), E> {
    fn into_outcome(self) -> Result<(), String> {
        self.map_err(|e| e.to_string())
    }
}

/// Type-erased method body.
type BoxedMethod = Box<dyn Fn(&mut dyn Bean, Vec<Value>) -> Result<(), String> + Send + Sync>;

/// Type-erased constructor.
type BoxedFactory = Box<dyn Fn() -> Box<dyn Bean> + Send + Sync>;

/// A closure that can be registered as a method on `T`.
///
/// Implemented for `Fn(&mut T, A1, .., An) -> R` with up to three arguments, where
/// every `Ai: FromValue` and `R: MethodOutcome`. `Args` is a marker tuple that keeps
/// the arity impls apart.
pub trait IntoMethod<T, Args>: Send + Sync + 'static {
    /// Declared parameter types, in order.
    fn params() -> Vec<ParamType>;

    /// Erase the closure.
    fn into_boxed(self) -> BoxedMethod;
}

macro_rules! impl_into_method {
    ($($arg:ident),*) => {
        impl<T, F, R, $($arg,)*> IntoMethod<T, ($($arg,)*)> for F
        where
            T: BeanType,
            F: Fn(&mut T, $($arg),*) -> R + Send + Sync + 'static,
            R: MethodOutcome,
            $($arg: FromValue,)*
        {
            fn params() -> Vec<ParamType> {
                vec![$(<$arg as FromValue>::param_type()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_boxed(self) -> BoxedMethod {
                Box::new(move |target: &mut dyn Bean, args: Vec<Value>| {
                    let receiver = target.type_name();
                    let target = target
                        .as_any_mut()
                        .downcast_mut::<T>()
                        .ok_or_else(|| format!("receiver is {receiver}, not {}", T::TYPE_NAME))?;
                    let mut args = args.into_iter();
                    $(let $arg = <$arg as FromValue>::from_value(args.next().unwrap_or(Value::Null))?;)*
                    self(target, $($arg),*).into_outcome()
                })
            }
        }
    };
}

impl_into_method!();
impl_into_method!(A1);
impl_into_method!(A1, A2);
impl_into_method!(A1, A2, A3);

/// A named, typed, invocable method.
pub struct Method {
    name: String,
    params: Vec<ParamType>,
    body: BoxedMethod,
}

impl Method {
    /// Method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter types.
    #[must_use]
    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    /// Printable signature, e.g. `addInitParameter(String, String)`.
    #[must_use]
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.params.iter().map(ParamType::name).collect();
        format!("{}({})", self.name, params.join(", "))
    }

    /// Run the method body. Arguments must already be coerced to [`params()`](Self::params).
    pub(crate) fn call(&self, target: &mut dyn Bean, args: Vec<Value>) -> Result<(), String> {
        (self.body)(target, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Class
// ═══════════════════════════════════════════════════════════════════════════════

/// A registered type: name, supertypes, optional constructor, methods.
pub struct Class {
    name: &'static str,
    supertypes: Vec<String>,
    factory: Option<BoxedFactory>,
    methods: Vec<Method>,
}

impl Class {
    /// Registered type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Directly declared supertypes.
    #[must_use]
    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    /// Returns `true` if the class can be instantiated by name.
    #[must_use]
    pub fn is_constructible(&self) -> bool {
        self.factory.is_some()
    }

    /// All methods, in registration order.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Methods with the given name (overloads), in registration order.
    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Method> + 'a {
        self.methods.iter().filter(move |m| m.name == name)
    }

    fn instantiate(&self) -> Option<Box<dyn Bean>> {
        self.factory.as_ref().map(|f| f())
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("supertypes", &self.supertypes)
            .field("constructible", &self.factory.is_some())
            .field("methods", &self.methods)
            .finish()
    }
}

/// Typed builder for a [`Class`].
pub struct ClassBuilder<T> {
    supertypes: Vec<String>,
    factory: Option<BoxedFactory>,
    methods: Vec<Method>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: BeanType> ClassBuilder<T> {
    /// Start a class for `T`, named `T::TYPE_NAME`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            supertypes: Vec::new(),
            factory: None,
            methods: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Declare a supertype. Objects of this class are assignable to it.
    #[must_use]
    pub fn implements(mut self, supertype: &str) -> Self {
        self.supertypes.push(supertype.to_owned());
        self
    }

    /// Make the class constructible by name with the given constructor.
    #[must_use]
    pub fn constructor(mut self, f: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.factory = Some(Box::new(move || Box::new(f()) as Box<dyn Bean>));
        self
    }

    /// Make the class constructible via `T::default()`.
    #[must_use]
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(T::default)
    }

    /// Register a method.
    ///
    /// Overloads (same name, different parameter types or arity) are allowed; the
    /// invoker picks the first one whose declared types accept the call.
    #[must_use]
    pub fn method<Args, F: IntoMethod<T, Args>>(mut self, name: &str, f: F) -> Self {
        self.methods.push(Method {
            name: name.to_owned(),
            params: <F as IntoMethod<T, Args>>::params(),
            body: f.into_boxed(),
        });
        self
    }

    /// Freeze the class.
    #[must_use]
    pub fn build(self) -> Class {
        Class {
            name: T::TYPE_NAME,
            supertypes: self.supertypes,
            factory: self.factory,
            methods: self.methods,
        }
    }
}

impl<T: BeanType> Default for ClassBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Resolver
// ═══════════════════════════════════════════════════════════════════════════════

/// Builder for a [`ClassResolver`].
///
/// Register classes, then call [`build()`](Self::build). The resolver is immutable
/// afterwards and can be shared by any number of engines.
#[derive(Default)]
pub struct ClassResolverBuilder {
    classes: HashMap<&'static str, Class>,
}

impl ClassResolverBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class. A later class with the same name replaces the earlier one.
    #[must_use]
    pub fn class(mut self, class: Class) -> Self {
        self.classes.insert(class.name, class);
        self
    }

    /// Freeze the resolver.
    #[must_use]
    pub fn build(self) -> ClassResolver {
        ClassResolver {
            classes: self.classes,
        }
    }
}

/// Immutable lookup of classes by name.
pub struct ClassResolver {
    classes: HashMap<&'static str, Class>,
}

impl ClassResolver {
    /// A resolver with no classes.
    #[must_use]
    pub fn empty() -> Self {
        ClassResolverBuilder::new().build()
    }

    /// Look up a class.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Class> {
        self.classes.get(name)
    }

    /// Returns `true` if the class is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Number of registered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if no classes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Registered class names (sorted).
    #[must_use]
    pub fn class_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.classes.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Returns `true` if an object of type `from` may be used where `to` is expected.
    ///
    /// Walks declared supertypes transitively. Supertypes need not be registered
    /// classes themselves; they act as capability names.
    #[must_use]
    pub fn is_assignable(&self, from: &str, to: &str) -> bool {
        if from == to || to == OBJECT_TYPE {
            return true;
        }
        let mut pending = vec![from];
        let mut visited = Vec::new();
        while let Some(name) = pending.pop() {
            if visited.contains(&name) {
                continue;
            }
            visited.push(name);
            if let Some(class) = self.classes.get(name) {
                for supertype in &class.supertypes {
                    if supertype == to {
                        return true;
                    }
                    pending.push(supertype);
                }
            }
        }
        false
    }

    /// Construct a new instance by type name.
    ///
    /// # Errors
    ///
    /// - [`DigestError::UnknownType`] if the name is not registered
    /// - [`DigestError::IllegalState`] if the class has no constructor
    pub fn instantiate(&self, name: &str) -> Result<ObjectRef, DigestError> {
        let class = self.get(name).ok_or_else(|| DigestError::UnknownType {
            type_name: name.to_owned(),
            available: self.class_names().into_iter().map(String::from).collect(),
        })?;
        class
            .instantiate()
            .map(ObjectRef::from_boxed)
            .ok_or_else(|| {
                DigestError::illegal_state(format!("class {name} has no constructor"))
            })
    }
}

impl fmt::Debug for ClassResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassResolver")
            .field("classes", &self.class_names())
            .finish()
    }
}
