//! Typed values exchanged between converters, constructors and properties.
//!
//! ## Core Types
//!
//! - [`Value`]: A converted field value (null, bool, integer, float, string, date-time, big integer)
//! - [`ValueKind`]: The declared type of a constructor parameter or property
//! - [`FieldValue`]: Bridges Rust field types and [`Value`]
//!
//! ## Examples
//!
//! ```rust
//! use csv_classmap::{FieldValue, Value, ValueKind};
//!
//! let value = Value::from(42);
//! assert_eq!(value.kind(), Some(ValueKind::Integer));
//!
//! let n: i32 = FieldValue::from_value(value).unwrap();
//! assert_eq!(n, 42);
//!
//! // Nullable slots read an empty field as `None`
//! let missing: Option<i32> = FieldValue::from_value(Value::Null).unwrap();
//! assert_eq!(missing, None);
//! ```

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A dynamically-typed field value.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<Utc>),
    BigInt(BigInt),
}

/// Declared type of a mapped slot; selects the converter used for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Integer,
    Float,
    String,
    DateTime,
    BigInt,
}

impl ValueKind {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::DateTime => "date-time",
            ValueKind::BigInt => "big integer",
        }
    }

    /// The type-appropriate zero value for an unbound, non-nullable slot.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use csv_classmap::{Value, ValueKind};
    ///
    /// assert_eq!(ValueKind::Integer.zero(), Value::Integer(0));
    /// assert_eq!(ValueKind::String.zero(), Value::String(String::new()));
    /// ```
    #[must_use]
    pub fn zero(&self) -> Value {
        match self {
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Integer => Value::Integer(0),
            ValueKind::Float => Value::Float(0.0),
            ValueKind::String => Value::String(String::new()),
            ValueKind::DateTime => Value::DateTime(DateTime::<Utc>::default()),
            ValueKind::BigInt => Value::BigInt(BigInt::from(0)),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the kind of this value, or `None` for null.
    #[must_use]
    pub const fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Integer(_) => Some(ValueKind::Integer),
            Value::Float(_) => Some(ValueKind::Float),
            Value::String(_) => Some(ValueKind::String),
            Value::DateTime(_) => Some(ValueKind::DateTime),
            Value::BigInt(_) => Some(ValueKind::BigInt),
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    fn describe(&self) -> &'static str {
        self.kind().map_or("null", |kind| kind.name())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => f.write_str(s),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::BigInt(bi) => write!(f, "{}", bi),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::DateTime(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            Value::BigInt(bi) => serializer.serialize_str(&bi.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a scalar field value")
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Value, E> {
                Ok(Value::Integer(value))
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Value, E> {
                match i64::try_from(value) {
                    Ok(i) => Ok(Value::Integer(i)),
                    Err(_) => Ok(Value::BigInt(BigInt::from(value))),
                }
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Value, E> {
                Ok(Value::Float(value))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Value, E> {
                Ok(Value::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Value, E> {
                Ok(Value::String(value))
            }

            fn visit_unit<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, _seq: A) -> std::result::Result<Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                Err(de::Error::custom("field values must be scalars"))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// A Rust type that can occupy a mapped slot.
///
/// Implemented for the primitive field types, `String`, `DateTime<Utc>`,
/// `BigInt` and `Option<T>` (nullable).
pub trait FieldValue: Sized {
    const KIND: ValueKind;
    const NULLABLE: bool = false;

    /// Extracts `Self` from a converted value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value has the wrong variant or is out of range.
    fn from_value(value: Value) -> Result<Self>;

    fn to_value(&self) -> Value;
}

macro_rules! integer_field {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                const KIND: ValueKind = ValueKind::Integer;

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Integer(i) => <$ty>::try_from(i).map_err(|_| {
                            Error::custom(format!("{} is out of range for {}", i, stringify!($ty)))
                        }),
                        other => Err(Error::type_mismatch("integer", other.describe())),
                    }
                }

                fn to_value(&self) -> Value {
                    Value::Integer(i64::from(*self))
                }
            }
        )*
    };
}

integer_field!(i8, i16, i32, i64, u8, u16, u32);

impl FieldValue for u64 {
    const KIND: ValueKind = ValueKind::Integer;

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Integer(i) => u64::try_from(i)
                .map_err(|_| Error::custom(format!("{} is out of range for u64", i))),
            Value::BigInt(bi) => u64::try_from(&bi)
                .map_err(|_| Error::custom(format!("{} is out of range for u64", bi))),
            other => Err(Error::type_mismatch("integer", other.describe())),
        }
    }

    fn to_value(&self) -> Value {
        match i64::try_from(*self) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::BigInt(BigInt::from(*self)),
        }
    }
}

impl FieldValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            other => Err(Error::type_mismatch("float", other.describe())),
        }
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FieldValue for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_value(value: Value) -> Result<Self> {
        f64::from_value(value).map(|f| f as f32)
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl FieldValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(Error::type_mismatch("bool", other.describe())),
        }
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FieldValue for String {
    const KIND: ValueKind = ValueKind::String;

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(Error::type_mismatch("string", other.describe())),
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl FieldValue for DateTime<Utc> {
    const KIND: ValueKind = ValueKind::DateTime;

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::DateTime(dt) => Ok(dt),
            other => Err(Error::type_mismatch("date-time", other.describe())),
        }
    }

    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }
}

impl FieldValue for BigInt {
    const KIND: ValueKind = ValueKind::BigInt;

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::BigInt(bi) => Ok(bi),
            Value::Integer(i) => Ok(BigInt::from(i)),
            other => Err(Error::type_mismatch("big integer", other.describe())),
        }
    }

    fn to_value(&self) -> Value {
        Value::BigInt(self.clone())
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    const KIND: ValueKind = T::KIND;
    const NULLABLE: bool = true;

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, FieldValue::to_value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value)
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::BigInt(value)
    }
}
