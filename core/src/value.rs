//! `Value` — Erased argument data flowing from rules into invoked methods
//!
//! Rules never know the concrete type of the object they are calling. They produce
//! `Value`s (body text, attribute values, literals, child objects) and a declared
//! [`ParamType`] for each; the [`MethodInvoker`](crate::MethodInvoker) resolves the
//! method and coerces each `Value` to the formal parameter type.

use crate::{ClassResolver, ObjectRef};
use std::fmt;

/// An argument value passed to an invoked method.
///
/// # Variants
///
/// - `Null` — No value (an unset parameter slot)
/// - `String` — Text, the most common case: body text and attribute values
/// - `Int` — Integer data (coerced from text for `Integer`/`Long` parameters)
/// - `Bool` — Boolean data
/// - `Object` — A bean from the object stack
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value.
    Null,
    /// Text data.
    String(String),
    /// Integer data.
    Int(i64),
    /// Boolean data.
    Bool(bool),
    /// An object handle.
    Object(ObjectRef),
}

impl Value {
    /// Returns `true` if this is the `Null` variant.
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string value if this is a `String` variant.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the object handle if this is an `Object` variant.
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// The [`ParamType`] this value naturally declares.
    ///
    /// Used when a rule passes a value without an explicitly configured type.
    #[must_use]
    pub fn natural_type(&self) -> ParamType {
        match self {
            Self::Null | Self::String(_) => ParamType::String,
            Self::Int(_) => ParamType::Long,
            Self::Bool(_) => ParamType::Boolean,
            Self::Object(o) => ParamType::Object(o.type_name().to_string()),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Self::Object(o)
    }
}

/// A literal argument baked into a rule at configuration time.
///
/// Unlike [`Value`] this is `Send + Sync`, so rules holding one stay shareable
/// across documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Text literal.
    String(String),
    /// Integer literal.
    Int(i64),
    /// Boolean literal.
    Bool(bool),
}

impl Literal {
    /// The declared parameter type of this literal.
    #[must_use]
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::String(_) => ParamType::String,
            Self::Int(_) => ParamType::Long,
            Self::Bool(_) => ParamType::Boolean,
        }
    }

    /// Convert into a runtime [`Value`].
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Int(i) => Value::Int(*i),
            Self::Bool(b) => Value::Bool(*b),
        }
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for Literal {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

/// The declared type of a method parameter.
///
/// Primitive names are canonicalized to their wrapper names, so `int` and
/// `Integer` declare the same parameter type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// `String`.
    String,
    /// `Boolean` (also `boolean`).
    Boolean,
    /// `Integer` (also `int`), a 32-bit integer.
    Integer,
    /// `Long` (also `long`), a 64-bit integer.
    Long,
    /// A registered bean type, or `Object` for any bean.
    Object(String),
}

/// Name of the root object type; every bean is assignable to it.
pub(crate) const OBJECT_TYPE: &str = "Object";

impl ParamType {
    /// Parse a declared type name.
    ///
    /// ```
    /// use trellis::ParamType;
    ///
    /// assert_eq!(ParamType::from_name("int"), ParamType::Integer);
    /// assert_eq!(ParamType::from_name("Integer"), ParamType::Integer);
    /// assert_eq!(ParamType::from_name("webapp.FilterDef"), ParamType::Object("webapp.FilterDef".into()));
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "String" | "string" => Self::String,
            "Boolean" | "boolean" | "bool" => Self::Boolean,
            "Integer" | "int" | "i32" => Self::Integer,
            "Long" | "long" | "i64" => Self::Long,
            other => Self::Object(other.to_string()),
        }
    }

    /// The canonical (wrapper) name of this type.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::String => "String",
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Long => "Long",
            Self::Object(name) => name,
        }
    }

    /// Returns `true` if a parameter of this type accepts an argument declared as `declared`.
    ///
    /// Identical types are assignable, `Long` accepts `Integer` (widening), and object
    /// types follow the resolver's supertype closure. `Object` accepts any bean.
    #[must_use]
    pub fn is_assignable_from(&self, declared: &ParamType, resolver: &ClassResolver) -> bool {
        match (self, declared) {
            (Self::Long, Self::Integer) => true,
            (Self::Object(param), Self::Object(arg)) => {
                param == OBJECT_TYPE || resolver.is_assignable(arg, param)
            }
            (a, b) => a == b,
        }
    }

    /// Coerce a value to this type.
    ///
    /// Text converts to numbers and booleans; scalars convert to text. `Null` passes
    /// through unchanged so optional parameters can receive it.
    ///
    /// # Errors
    ///
    /// Returns a message describing the failed conversion.
    pub fn coerce(&self, value: Value) -> Result<Value, String> {
        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (Self::String, Value::String(s)) => Ok(Value::String(s)),
            (Self::String, Value::Int(i)) => Ok(Value::String(i.to_string())),
            (Self::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),
            (Self::Integer, Value::String(s)) => s
                .trim()
                .parse::<i32>()
                .map(|i| Value::Int(i64::from(i)))
                .map_err(|e| format!("cannot convert \"{s}\" to Integer: {e}")),
            (Self::Integer, Value::Int(i)) => i32::try_from(i)
                .map(|i| Value::Int(i64::from(i)))
                .map_err(|_| format!("{i} does not fit in Integer")),
            (Self::Long, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| format!("cannot convert \"{s}\" to Long: {e}")),
            (Self::Long, Value::Int(i)) => Ok(Value::Int(i)),
            (Self::Boolean, Value::String(s)) => parse_bool(&s)
                .map(Value::Bool)
                .ok_or_else(|| format!("cannot convert \"{s}\" to Boolean")),
            (Self::Boolean, Value::Bool(b)) => Ok(Value::Bool(b)),
            (Self::Object(_), Value::Object(o)) => Ok(Value::Object(o)),
            (ty, value) => Err(format!(
                "cannot pass {} where {} is expected",
                value.natural_type(),
                ty
            )),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for ParamType {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_names_canonicalize_to_wrappers() {
        assert_eq!(ParamType::from_name("boolean"), ParamType::Boolean);
        assert_eq!(ParamType::from_name("long"), ParamType::Long);
        assert_eq!(ParamType::from_name("int").name(), "Integer");
    }

    #[test]
    fn long_accepts_integer_but_not_the_reverse() {
        let resolver = ClassResolver::empty();
        assert!(ParamType::Long.is_assignable_from(&ParamType::Integer, &resolver));
        assert!(!ParamType::Integer.is_assignable_from(&ParamType::Long, &resolver));
        assert!(!ParamType::String.is_assignable_from(&ParamType::Boolean, &resolver));
    }

    #[test]
    fn object_parameter_accepts_any_bean() {
        let resolver = ClassResolver::empty();
        let any = ParamType::Object(OBJECT_TYPE.into());
        assert!(any.is_assignable_from(&ParamType::Object("Whatever".into()), &resolver));
        assert!(!any.is_assignable_from(&ParamType::String, &resolver));
    }

    #[test]
    fn coerce_text_to_numbers() {
        assert_eq!(
            ParamType::Integer.coerce(Value::from(" 30 ")),
            Ok(Value::Int(30))
        );
        assert_eq!(ParamType::Long.coerce(Value::from("-7")), Ok(Value::Int(-7)));
        assert!(ParamType::Integer.coerce(Value::from("thirty")).is_err());
        assert!(ParamType::Integer.coerce(Value::Int(i64::MAX)).is_err());
    }

    #[test]
    fn coerce_text_to_bool() {
        assert_eq!(
            ParamType::Boolean.coerce(Value::from("Yes")),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            ParamType::Boolean.coerce(Value::from("off")),
            Ok(Value::Bool(false))
        );
        assert!(ParamType::Boolean.coerce(Value::from("maybe")).is_err());
    }

    #[test]
    fn coerce_scalars_to_string() {
        assert_eq!(
            ParamType::String.coerce(Value::Bool(true)),
            Ok(Value::from("true"))
        );
        assert_eq!(ParamType::String.coerce(Value::Int(4)), Ok(Value::from("4")));
    }

    #[test]
    fn null_passes_through() {
        assert_eq!(ParamType::Integer.coerce(Value::Null), Ok(Value::Null));
    }

    #[test]
    fn literal_round_trips_into_value() {
        let lit = Literal::from(true);
        assert_eq!(lit.param_type(), ParamType::Boolean);
        assert_eq!(lit.to_value(), Value::Bool(true));
    }
}
