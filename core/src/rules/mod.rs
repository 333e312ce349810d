//! Built-in rules.
//!
//! A small set of generic rules, parameterized by method names, argument counts and
//! declared types. Domain wiring is expressed as data (which rule, which pattern),
//! not as one rule type per element.
//!
//! | Rule | begin | body | end |
//! |------|-------|------|-----|
//! | [`ObjectCreate`] | push new object | | pop |
//! | [`SetNext`] | | | call `peek(1).method(peek(0))` after the element's other end callbacks |
//! | [`CallMethod`] | open parameter frame | | call `peek(0).method(params…)` |
//! | [`CallParam`] | (attribute slot) | fill slot from text | |
//! | [`SetTop`] | call `peek(0).method(literal)` | | (or here) |
//! | [`SetProperties`] | call `peek(0).setX(attr)` per attribute | | |
//! | [`ValidateOnce`] | fail on second occurrence | | |
//! | [`Transient`] | push new `T` | | pop, hand `T` to parent |
//! | [`SetPublicId`] | call `peek(0).method(public_id)` | | |
//!
//! Every rule that invokes a method absorbs a missing method (logged at `warn`)
//! and escalates everything else.

mod call_method;
mod object_create;
mod set_next;
mod set_properties;
mod set_public_id;
mod set_top;
mod transient;
mod validate_once;

pub use call_method::{CallMethod, CallParam};
pub use object_create::ObjectCreate;
pub use set_next::SetNext;
pub use set_properties::SetProperties;
pub use set_public_id::SetPublicId;
pub use set_top::SetTop;
pub use transient::Transient;
pub use validate_once::ValidateOnce;
