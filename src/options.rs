//! Configuration options for reading and writing records.
//!
//! - [`CsvOptions`]: Main configuration struct
//! - [`Delimiter`]: Field delimiter (comma, semicolon, tab or pipe)
//! - [`LineTerminator`]: Record terminator used on write
//! - [`HeaderMatch`]: Case policy applied when matching names against a header
//!
//! Options derive `Serialize`/`Deserialize`, so an application can keep them in
//! its own configuration file. Missing keys fall back to the defaults.
//!
//! ## Examples
//!
//! ```rust
//! use csv_classmap::{CsvOptions, Delimiter, HeaderMatch};
//!
//! let options = CsvOptions::new()
//!     .with_delimiter(Delimiter::Semicolon)
//!     .with_header_match(HeaderMatch::CaseInsensitive);
//! assert!(options.has_header);
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Delimiter between fields of a row.
///
/// # Examples
///
/// ```rust
/// use csv_classmap::Delimiter;
///
/// assert_eq!(Delimiter::Comma.as_byte(), b',');
/// assert_eq!(Delimiter::Tab.as_byte(), b'\t');
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
    Tab,
    Pipe,
}

impl Delimiter {
    #[must_use]
    pub const fn as_byte(&self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
            Delimiter::Pipe => b'|',
        }
    }
}

/// Record terminator written after each row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTerminator {
    #[default]
    CrLf,
    Lf,
}

impl LineTerminator {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LineTerminator::CrLf => "\r\n",
            LineTerminator::Lf => "\n",
        }
    }
}

/// How candidate names are compared against header cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMatch {
    #[default]
    CaseSensitive,
    CaseInsensitive,
}

impl HeaderMatch {
    /// Folds `name` into the form compared under this policy.
    ///
    /// Header cells are normalized once per resolution; only candidate names
    /// are folded per lookup.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use csv_classmap::HeaderMatch;
    ///
    /// assert_eq!(HeaderMatch::CaseSensitive.normalize("Id"), "Id");
    /// assert_eq!(HeaderMatch::CaseInsensitive.normalize("ÉTAT"), "état");
    /// ```
    #[must_use]
    pub fn normalize<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match self {
            HeaderMatch::CaseInsensitive if name.chars().any(char::is_uppercase) => {
                Cow::Owned(name.to_lowercase())
            }
            _ => Cow::Borrowed(name),
        }
    }

    /// Returns `true` if `candidate` matches `header` under this policy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use csv_classmap::HeaderMatch;
    ///
    /// assert!(!HeaderMatch::CaseSensitive.matches("id", "Id"));
    /// assert!(HeaderMatch::CaseInsensitive.matches("id", "Id"));
    /// ```
    #[inline]
    #[must_use]
    pub fn matches(&self, candidate: &str, header: &str) -> bool {
        match self {
            HeaderMatch::CaseSensitive => candidate == header,
            HeaderMatch::CaseInsensitive => {
                candidate.eq_ignore_ascii_case(header)
                    || self.normalize(candidate) == self.normalize(header)
            }
        }
    }
}

/// Configuration for readers and writers.
///
/// # Examples
///
/// ```rust
/// use csv_classmap::{CsvOptions, LineTerminator};
///
/// let options = CsvOptions::new()
///     .with_has_header(false)
///     .with_terminator(LineTerminator::Lf);
/// assert!(!options.has_header);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Whether the first row of a document is a header.
    pub has_header: bool,
    pub delimiter: Delimiter,
    pub terminator: LineTerminator,
    pub header_match: HeaderMatch,
    /// Trim surrounding whitespace from header cells before matching.
    pub trim_headers: bool,
    /// Trim surrounding whitespace from data fields before conversion.
    pub trim_fields: bool,
    /// chrono format string for date-time fields. RFC 3339 when unset.
    pub date_format: Option<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            has_header: true,
            delimiter: Delimiter::default(),
            terminator: LineTerminator::default(),
            header_match: HeaderMatch::default(),
            trim_headers: false,
            trim_fields: false,
            date_format: None,
        }
    }
}

impl CsvOptions {
    /// Creates default options (header row, comma delimiter, CRLF, case-sensitive names).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_terminator(mut self, terminator: LineTerminator) -> Self {
        self.terminator = terminator;
        self
    }

    #[must_use]
    pub fn with_header_match(mut self, header_match: HeaderMatch) -> Self {
        self.header_match = header_match;
        self
    }

    #[must_use]
    pub fn with_trim_headers(mut self, trim: bool) -> Self {
        self.trim_headers = trim;
        self
    }

    #[must_use]
    pub fn with_trim_fields(mut self, trim: bool) -> Self {
        self.trim_fields = trim;
        self
    }

    /// Sets a chrono format string used to parse and format date-time fields.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use csv_classmap::CsvOptions;
    ///
    /// let options = CsvOptions::new().with_date_format("%Y-%m-%d %H:%M:%S");
    /// assert_eq!(options.date_format.as_deref(), Some("%Y-%m-%d %H:%M:%S"));
    /// ```
    #[must_use]
    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_format = Some(format.to_string());
        self
    }

    /// Applies the header trimming policy to a header cell.
    #[inline]
    pub(crate) fn prepare_header<'a>(&self, header: &'a str) -> &'a str {
        if self.trim_headers {
            header.trim()
        } else {
            header
        }
    }

    /// Applies the field trimming policy to a data field.
    #[inline]
    pub(crate) fn prepare_field<'a>(&self, field: &'a str) -> &'a str {
        if self.trim_fields {
            field.trim()
        } else {
            field
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CsvOptions::default();
        assert!(options.has_header);
        assert_eq!(options.delimiter, Delimiter::Comma);
        assert_eq!(options.terminator.as_str(), "\r\n");
        assert_eq!(options.header_match, HeaderMatch::CaseSensitive);
    }

    #[test]
    fn test_prepare_header() {
        let options = CsvOptions::new().with_trim_headers(true);
        assert_eq!(options.prepare_header("  Id "), "Id");
        assert_eq!(CsvOptions::new().prepare_header(" Id"), " Id");
    }

    #[test]
    fn test_case_insensitive_unicode() {
        assert!(HeaderMatch::CaseInsensitive.matches("ÉTAT", "état"));
    }

    #[test]
    fn test_normalize_borrows_when_unchanged() {
        assert!(matches!(HeaderMatch::CaseInsensitive.normalize("id"), Cow::Borrowed("id")));
        assert!(matches!(HeaderMatch::CaseSensitive.normalize("ID"), Cow::Borrowed("ID")));
        assert_eq!(HeaderMatch::CaseInsensitive.normalize("ID"), "id");
    }
}
