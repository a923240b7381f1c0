//! Error types for class-map configuration, header resolution and record binding.
//!
//! Failures fall into three tiers that differ in how far they propagate:
//!
//! - **Configuration errors**: the declared mapping cannot be satisfied by the
//!   target type (no matching constructor, duplicate target slot, a parameter
//!   that cannot be written back). Raised when a class map is built or first used.
//! - **Header resolution errors**: a required name found no column in the header,
//!   or the source has no header while name-based maps are required. Raised once
//!   per document.
//! - **Record binding errors**: a single row could not be materialized. Carries
//!   the row number and the failing member so callers can skip and continue.
//!
//! Converter and constructor-argument failures ([`Error::Conversion`],
//! [`Error::Argument`]) are raised by collaborators and wrapped into
//! [`Error::RecordBinding`] by the reader.
//!
//! ## Examples
//!
//! ```rust
//! use csv_classmap::Error;
//!
//! let err = Error::header_resolution("Foo", vec!["Id".to_string()]);
//! assert!(err.is_header_resolution());
//! assert!(err.to_string().contains("Id"));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised while mapping, reading or writing records.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Error reported by the CSV tokenizer
    #[error("CSV error: {0}")]
    Csv(String),

    /// The class map cannot be satisfied against the target type's shape
    #[error("Invalid mapping for `{type_name}`: {msg}")]
    Configuration { type_name: String, msg: String },

    /// One or more required headers could not be located
    #[error("Header resolution failed for `{type_name}`: no column found for {}", .missing.join(", "))]
    HeaderResolution {
        type_name: String,
        missing: Vec<String>,
    },

    /// A single row could not be materialized
    #[error("Cannot bind row {row} to `{type_name}` at `{member}`: {msg}")]
    RecordBinding {
        type_name: String,
        row: usize,
        member: String,
        msg: String,
    },

    /// A converter could not turn a raw field into a typed value (or back)
    #[error("Cannot convert {value:?} to {target}: {msg}")]
    Conversion {
        value: String,
        target: String,
        msg: String,
    },

    /// A constructor factory could not extract one of its arguments
    #[error("Invalid constructor argument {position} (`{name}`): {msg}")]
    Argument {
        position: usize,
        name: String,
        msg: String,
    },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a configuration error for the given target type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use csv_classmap::Error;
    ///
    /// let err = Error::configuration("Foo", "no constructor accepts `id`");
    /// assert!(err.to_string().contains("Foo"));
    /// ```
    pub fn configuration<M: fmt::Display>(type_name: &str, msg: M) -> Self {
        Error::Configuration {
            type_name: type_name.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates a header resolution error listing every header that was not found.
    pub fn header_resolution(type_name: &str, missing: Vec<String>) -> Self {
        Error::HeaderResolution {
            type_name: type_name.to_string(),
            missing,
        }
    }

    /// Creates a record binding error for one row.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use csv_classmap::Error;
    ///
    /// let err = Error::record_binding("Foo", 2, "Id", "invalid digit");
    /// assert!(err.to_string().contains("row 2"));
    /// ```
    pub fn record_binding<M: fmt::Display>(type_name: &str, row: usize, member: &str, msg: M) -> Self {
        Error::RecordBinding {
            type_name: type_name.to_string(),
            row,
            member: member.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates a conversion error for a raw value that does not fit the target kind.
    pub fn conversion<M: fmt::Display>(value: &str, target: &str, msg: M) -> Self {
        Error::Conversion {
            value: value.to_string(),
            target: target.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates a constructor argument error.
    pub fn argument<M: fmt::Display>(position: usize, name: &str, msg: M) -> Self {
        Error::Argument {
            position,
            name: name.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates a type mismatch error when a value has the wrong variant.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use csv_classmap::Error;
    ///
    /// let err = Error::type_mismatch("integer", "string");
    /// assert!(err.to_string().contains("expected integer"));
    /// ```
    pub fn type_mismatch(expected: &str, found: &str) -> Self {
        Error::Custom(format!("type mismatch: expected {}, found {}", expected, found))
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }

    #[must_use]
    pub const fn is_header_resolution(&self) -> bool {
        matches!(self, Error::HeaderResolution { .. })
    }

    #[must_use]
    pub const fn is_record_binding(&self) -> bool {
        matches!(self, Error::RecordBinding { .. })
    }

    /// Returns `true` for errors that abort the whole document rather than one row.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_record_binding()
    }

    /// Wraps a collaborator failure into a [`Error::RecordBinding`] for one row.
    ///
    /// Errors that are already document-level are returned unchanged.
    pub(crate) fn at_row(self, type_name: &str, row: usize, member: &str) -> Self {
        match self {
            Error::Conversion { .. } | Error::Custom(_) => {
                Error::record_binding(type_name, row, member, self)
            }
            Error::Argument { ref name, .. } => {
                let name = name.clone();
                Error::record_binding(type_name, row, &name, self)
            }
            other => other,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            Error::Io(err.to_string())
        } else {
            Error::Csv(err.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
