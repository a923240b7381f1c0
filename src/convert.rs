//! Converters between raw field text and typed [`Value`]s.
//!
//! The mapping engine never parses text itself. For every bound slot it picks a
//! converter (the map's own, or the registry's converter for the slot's
//! [`ValueKind`]) and delegates. Nullable slots read an empty field as
//! [`Value::Null`] before any converter is consulted.
//!
//! ## Examples
//!
//! ```rust
//! use csv_classmap::{ConverterRegistry, CsvOptions, Value, ValueKind};
//!
//! let registry = ConverterRegistry::new();
//! let options = CsvOptions::default();
//!
//! let value = registry.get(ValueKind::Integer).convert("42", ValueKind::Integer, &options).unwrap();
//! assert_eq!(value, Value::Integer(42));
//! ```

use crate::options::CsvOptions;
use crate::value::{Value, ValueKind};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use num_bigint::BigInt;
use std::collections::HashMap;
use std::fmt;
use std::num::IntErrorKind;
use std::sync::Arc;

/// Converts raw field text to a typed value and back.
pub trait Converter: Send + Sync {
    /// Parses `raw` into a value of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] if the text is not a valid `kind`.
    fn convert(&self, raw: &str, kind: ValueKind, options: &CsvOptions) -> Result<Value>;

    /// Formats a value as field text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] if the value cannot be represented.
    fn format(&self, value: &Value, options: &CsvOptions) -> Result<String>;
}

/// Shared handle to a converter.
pub type ConverterHandle = Arc<dyn Converter>;

#[derive(Debug, Clone, Copy, Default)]
pub struct BoolConverter;

impl Converter for BoolConverter {
    fn convert(&self, raw: &str, kind: ValueKind, _options: &CsvOptions) -> Result<Value> {
        match raw.trim() {
            s if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            s if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            _ => Err(Error::conversion(raw, kind.name(), "expected `true` or `false`")),
        }
    }

    fn format(&self, value: &Value, _options: &CsvOptions) -> Result<String> {
        Ok(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerConverter;

impl Converter for IntegerConverter {
    /// Values beyond the `i64` range are read as big integers.
    fn convert(&self, raw: &str, kind: ValueKind, _options: &CsvOptions) -> Result<Value> {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(i) => Ok(Value::Integer(i)),
            Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
                trimmed
                    .parse::<BigInt>()
                    .map(Value::BigInt)
                    .map_err(|_| Error::conversion(raw, kind.name(), e))
            }
            Err(e) => Err(Error::conversion(raw, kind.name(), e)),
        }
    }

    fn format(&self, value: &Value, _options: &CsvOptions) -> Result<String> {
        Ok(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FloatConverter;

impl Converter for FloatConverter {
    fn convert(&self, raw: &str, kind: ValueKind, _options: &CsvOptions) -> Result<Value> {
        raw.trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| Error::conversion(raw, kind.name(), e))
    }

    fn format(&self, value: &Value, _options: &CsvOptions) -> Result<String> {
        Ok(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StringConverter;

impl Converter for StringConverter {
    fn convert(&self, raw: &str, _kind: ValueKind, _options: &CsvOptions) -> Result<Value> {
        Ok(Value::String(raw.to_string()))
    }

    fn format(&self, value: &Value, _options: &CsvOptions) -> Result<String> {
        Ok(value.to_string())
    }
}

/// Parses RFC 3339 by default, or the configured chrono format (interpreted as UTC).
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeConverter;

impl Converter for DateTimeConverter {
    fn convert(&self, raw: &str, kind: ValueKind, options: &CsvOptions) -> Result<Value> {
        let raw_trimmed = raw.trim();
        let parsed = match &options.date_format {
            Some(format) => NaiveDateTime::parse_from_str(raw_trimmed, format)
                .or_else(|e| {
                    // Date-only formats read as midnight.
                    NaiveDate::parse_from_str(raw_trimmed, format)
                        .ok()
                        .and_then(|date| date.and_hms_opt(0, 0, 0))
                        .ok_or(e)
                })
                .map(|naive| Utc.from_utc_datetime(&naive))
                .map_err(|e| Error::conversion(raw, kind.name(), e))?,
            None => DateTime::parse_from_rfc3339(raw_trimmed)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| Error::conversion(raw, kind.name(), e))?,
        };
        Ok(Value::DateTime(parsed))
    }

    fn format(&self, value: &Value, options: &CsvOptions) -> Result<String> {
        match (value, &options.date_format) {
            (Value::DateTime(dt), Some(format)) => Ok(dt.format(format).to_string()),
            (Value::DateTime(dt), None) => Ok(dt.to_rfc3339()),
            (other, _) => Ok(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BigIntConverter;

impl Converter for BigIntConverter {
    fn convert(&self, raw: &str, kind: ValueKind, _options: &CsvOptions) -> Result<Value> {
        raw.trim()
            .parse::<BigInt>()
            .map(Value::BigInt)
            .map_err(|e| Error::conversion(raw, kind.name(), e))
    }

    fn format(&self, value: &Value, _options: &CsvOptions) -> Result<String> {
        Ok(value.to_string())
    }
}

/// Converters keyed by value kind.
///
/// A new registry holds a built-in converter for every [`ValueKind`];
/// [`ConverterRegistry::register`] replaces one.
#[derive(Clone)]
pub struct ConverterRegistry {
    converters: HashMap<ValueKind, ConverterHandle>,
}

impl ConverterRegistry {
    #[must_use]
    pub fn new() -> Self {
        let mut converters: HashMap<ValueKind, ConverterHandle> = HashMap::new();
        converters.insert(ValueKind::Bool, Arc::new(BoolConverter));
        converters.insert(ValueKind::Integer, Arc::new(IntegerConverter));
        converters.insert(ValueKind::Float, Arc::new(FloatConverter));
        converters.insert(ValueKind::String, Arc::new(StringConverter));
        converters.insert(ValueKind::DateTime, Arc::new(DateTimeConverter));
        converters.insert(ValueKind::BigInt, Arc::new(BigIntConverter));
        ConverterRegistry { converters }
    }

    pub fn register<C: Converter + 'static>(&mut self, kind: ValueKind, converter: C) {
        self.converters.insert(kind, Arc::new(converter));
    }

    /// Returns the converter for `kind`, falling back to the string converter.
    #[must_use]
    pub fn get(&self, kind: ValueKind) -> &dyn Converter {
        match self.converters.get(&kind) {
            Some(converter) => converter.as_ref(),
            None => &StringConverter,
        }
    }

    /// Converts one raw field for a slot of `kind`.
    ///
    /// An empty field in a nullable slot yields [`Value::Null`] without consulting a converter.
    pub(crate) fn read_field(
        &self,
        raw: &str,
        kind: ValueKind,
        nullable: bool,
        custom: Option<&ConverterHandle>,
        options: &CsvOptions,
    ) -> Result<Value> {
        if nullable && raw.is_empty() {
            return Ok(Value::Null);
        }
        match custom {
            Some(converter) => converter.convert(raw, kind, options),
            None => self.get(kind).convert(raw, kind, options),
        }
    }

    /// Formats one value for output. Null is always written as an empty field.
    pub(crate) fn write_field(
        &self,
        value: &Value,
        kind: ValueKind,
        custom: Option<&ConverterHandle>,
        options: &CsvOptions,
    ) -> Result<String> {
        if value.is_null() {
            return Ok(String::new());
        }
        match custom {
            Some(converter) => converter.format(value, options),
            None => self.get(kind).format(value, options),
        }
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("kinds", &self.converters.keys().collect::<Vec<_>>())
            .finish()
    }
}
