//! Dynamic Values
//!
//! Reactive views intercept property access over an open set of keys, so the
//! state they wrap is dynamically shaped. [`Value`] is the dynamic value that
//! lives in those properties and flows through the public API.
//!
//! # Variants
//!
//! - Primitives: `Null`, `Bool`, `Int`, `Float`, `Str`. These are never
//!   wrapped; passing one to `reactive` returns it unchanged.
//! - `Object`: a raw [`Object`] target. This is the only variant that
//!   `reactive` and `shallow_reactive` wrap.
//! - `Reactive`: a tracked view over an `Object`.
//! - `Ref`: a single-slot reactive box.
//!
//! # Equality
//!
//! Primitives compare by value. `Object`, `Reactive` and `Ref` compare by
//! identity, so two views over the same target in the same mode are equal
//! and a view never equals its raw target.
//!
//! # JSON
//!
//! Values convert from `serde_json::Value` (arrays become objects keyed by
//! index) and serialize through `serde`. Views and refs serialize their
//! current contents without tracking. Cyclic objects cannot be serialized.

mod object;

pub use object::Object;

use std::rc::Rc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{ReactiveError, Result};
use crate::reactive::{Reactive, Ref};

/// A dynamically typed value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absence of a meaningful value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// An immutable string.
    Str(Rc<str>),
    /// A raw, untracked object target.
    Object(Object),
    /// A tracked view over an object target.
    Reactive(Reactive),
    /// A reactive single-slot box.
    Ref(Ref),
}

impl Value {
    /// Name of the held variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
            Value::Reactive(_) => "reactive",
            Value::Ref(_) => "ref",
        }
    }

    /// Whether this is a raw object target, the only kind of value that
    /// gets wrapped.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// JavaScript-style truthiness: null, false, zero, NaN and the empty
    /// string are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Object(_) | Value::Reactive(_) | Value::Ref(_) => true,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value as a float. Integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(&**s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_reactive(&self) -> Option<&Reactive> {
        match self {
            Value::Reactive(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_ref_handle(&self) -> Option<&Ref> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Snapshot this value as JSON without tracking any reads.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Reactive(a), Value::Reactive(b)) => a.ptr_eq(b),
            (Value::Ref(a), Value::Ref(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

// ----------------------------------------------------------------------------
// Conversions
// ----------------------------------------------------------------------------

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Rc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Rc::from(value))
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<Reactive> for Value {
    fn from(value: Reactive) -> Self {
        Value::Reactive(value)
    }
}

impl From<Ref> for Value {
    fn from(value: Ref) -> Self {
        Value::Ref(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => Value::Object(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| (index.to_string(), Value::from(item)))
                    .collect(),
            ),
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, item)| (key, Value::from(item)))
                    .collect(),
            ),
        }
    }
}

macro_rules! impl_try_from_value {
    ($ty:ty, $expected:literal, $pattern:pat => $out:expr) => {
        impl TryFrom<Value> for $ty {
            type Error = ReactiveError;

            fn try_from(value: Value) -> Result<Self> {
                match value {
                    $pattern => Ok($out),
                    other => Err(ReactiveError::TypeMismatch {
                        expected: $expected,
                        found: other.kind(),
                    }),
                }
            }
        }
    };
}

impl_try_from_value!(bool, "bool", Value::Bool(b) => b);
impl_try_from_value!(i64, "int", Value::Int(n) => n);
impl_try_from_value!(f64, "float", Value::Float(n) => n);
impl_try_from_value!(String, "string", Value::Str(s) => s.to_string());
impl_try_from_value!(Object, "object", Value::Object(object) => object);
impl_try_from_value!(Reactive, "reactive", Value::Reactive(view) => view);
impl_try_from_value!(Ref, "ref", Value::Ref(r) => r);

// ----------------------------------------------------------------------------
// Serialization
// ----------------------------------------------------------------------------

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Object(object) => serialize_object(object, serializer),
            Value::Reactive(view) => serialize_object(view.target(), serializer),
            Value::Ref(r) => r.get_untracked().serialize(serializer),
        }
    }
}

fn serialize_object<S: Serializer>(
    object: &Object,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let entries = object.entries();
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (key, value) in &entries {
        map.serialize_entry(&**key, value)?;
    }
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primitives_compare_by_value() {
        assert_eq!(Value::from(1), Value::Int(1));
        assert_eq!(Value::from("hi"), Value::from(String::from("hi")));
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Null, Value::Bool(false));
    }

    #[test]
    fn objects_compare_by_identity() {
        let object = Object::new();
        assert_eq!(Value::from(object.clone()), Value::from(object));
        assert_ne!(Value::from(Object::new()), Value::from(Object::new()));
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(f64::NAN).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::from(Object::new()).is_truthy());
    }

    #[test]
    fn try_from_reports_mismatch() {
        assert_eq!(i64::try_from(Value::Int(7)).unwrap(), 7);

        let err = i64::try_from(Value::from("seven")).unwrap_err();
        match err {
            ReactiveError::TypeMismatch { expected, found } => {
                assert_eq!(expected, "int");
                assert_eq!(found, "string");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn json_round_trip_keeps_shape() {
        let source = json!({"a": 1, "b": {"c": [true, 2.5, "x"]}, "d": null});
        let value = Value::from(source);

        let b = value.as_object().unwrap().get("b").unwrap();
        let c = b.as_object().unwrap().get("c").unwrap();
        assert_eq!(c.as_object().unwrap().get("1"), Some(Value::Float(2.5)));

        assert_eq!(
            value.to_json().unwrap(),
            json!({"a": 1, "b": {"c": {"0": true, "1": 2.5, "2": "x"}}, "d": null})
        );
    }
}
