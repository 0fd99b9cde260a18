//! Argument and return value typing.
//!
//! Handlers exchange [`serde_json::Value`]s, the tagged-union argument
//! type of the call surface. A method descriptor declares the *kind* of
//! each parameter and return slot as a [`ParamKind`], and the call path
//! checks every supplied argument against its declared kind before the
//! request ever reaches the mailbox.
//!
//! # Assignability
//!
//! A value is assignable to a declared kind when:
//!
//! - its tag equals the declared kind, or
//! - the declared kind is [`ParamKind::Any`], or
//! - the value is `null` (absent values are accepted everywhere)

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared kind of a handler parameter or return slot.
///
/// Kinds mirror the tags of [`serde_json::Value`], plus [`Any`](Self::Any)
/// as an explicit wildcard.
///
/// # Example
///
/// ```
/// use sequent_core::ParamKind;
/// use serde_json::json;
///
/// assert_eq!(ParamKind::of(&json!(true)), ParamKind::Bool);
/// assert_eq!(ParamKind::of(&json!("hi")), ParamKind::String);
/// assert!(ParamKind::Bool.accepts(&json!(false)));
/// assert!(!ParamKind::Bool.accepts(&json!("false")));
/// assert!(ParamKind::Any.accepts(&json!({"k": 1})));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    /// The unit/absent value.
    Null,
    /// A boolean.
    Bool,
    /// Any JSON number (integer or float).
    Number,
    /// A string.
    String,
    /// An ordered list of values.
    Array,
    /// A string-keyed map of values.
    Object,
    /// Wildcard: accepts every value.
    Any,
}

impl ParamKind {
    /// Returns the kind tag of a runtime value.
    #[must_use]
    pub const fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Returns `true` when `value` is assignable to this declared kind.
    #[must_use]
    pub const fn accepts(self, value: &Value) -> bool {
        if matches!(self, Self::Any) || matches!(value, Value::Null) {
            return true;
        }
        matches!(
            (self, value),
            (Self::Bool, Value::Bool(_))
                | (Self::Number, Value::Number(_))
                | (Self::String, Value::String(_))
                | (Self::Array, Value::Array(_))
                | (Self::Object, Value::Object(_))
        )
    }

    /// Returns the lowercase name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Any => "any",
        }
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
