//! # csv_classmap
//!
//! Class-map driven materialization of CSV records, with constructor injection.
//!
//! ## What is a class map?
//!
//! A class map declares, for one target type, which CSV column feeds which
//! property or constructor parameter. Types whose values can only be supplied
//! through a constructor (immutable records, types without setters) are built
//! by binding columns to the constructor's parameters; the remaining columns
//! are assigned to properties afterwards.
//!
//! ## Key Features
//!
//! - **Constructor injection**: parameter maps by name, by explicit constructor
//!   or by position, with defaults for unbound parameters
//! - **Flexible headers**: aliases, n-th occurrence of repeated names, fixed
//!   indices, case-insensitive matching, prefixed nested records
//! - **Resolve once**: header binding happens before the first row, and every
//!   missing header is reported together
//! - **Row-scoped failures**: a bad row yields an error and reading continues
//! - **Symmetric writing**: the same class map produces the header and rows
//!
//! ## Quick Start
//!
//! ```rust
//! use csv_classmap::{from_str_with_context, to_string_with_context, ClassMap, Context};
//! use csv_classmap::{ConstructorInfo, ParameterInfo, PropertyInfo, Record, TypeInfo};
//!
//! #[derive(Debug, PartialEq)]
//! struct Foo {
//!     id: i32,
//!     name: String,
//! }
//!
//! impl Record for Foo {
//!     fn describe() -> TypeInfo<Self> {
//!         TypeInfo::new("Foo")
//!             .with_constructor(ConstructorInfo::new(
//!                 vec![ParameterInfo::of::<i32>("id"), ParameterInfo::of::<String>("name")],
//!                 |args| Ok(Foo { id: args.take(0)?, name: args.take(1)? }),
//!             ))
//!             .with_property(PropertyInfo::read_only("Id", |f: &Foo| f.id))
//!             .with_property(PropertyInfo::read_only("Name", |f: &Foo| f.name.clone()))
//!     }
//! }
//!
//! let mut map = ClassMap::<Foo>::new();
//! map.parameter("id").name("Id");
//! map.parameter("name").name("Name");
//!
//! let mut context = Context::default();
//! context.register_class_map(map).unwrap();
//!
//! let records: Vec<Foo> = from_str_with_context("Id,Name\r\n1,one\r\n", context.clone()).unwrap();
//! assert_eq!(records, vec![Foo { id: 1, name: "one".to_string() }]);
//!
//! let csv = to_string_with_context(&records, context).unwrap();
//! assert_eq!(csv, "Id,Name\r\n1,one\r\n");
//! ```
//!
//! ### Plain structs
//!
//! Structs with a `Default` impl can use [`impl_record!`] and rely on automatic
//! mapping:
//!
//! ```rust
//! use csv_classmap::{from_str, impl_record};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Product {
//!     id: u32,
//!     name: String,
//!     price: Option<f64>,
//! }
//!
//! impl_record!(Product { id: u32, name: String, price: Option<f64> });
//!
//! let products: Vec<Product> = from_str("name,id,price\nWidget,1,9.99\nGadget,2,\n").unwrap();
//! assert_eq!(products[1].price, None);
//! ```
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Proper error propagation with `Result` types
//! - Sealed class maps are immutable and can be shared across threads
//!
//! The binding rules are documented in [`rules`].

pub mod class_map;
pub mod constructor;
pub mod context;
pub mod convert;
pub mod de;
pub mod describe;
pub mod error;
pub mod header;
pub mod macros;
pub mod member;
pub mod options;
pub mod rows;
pub mod rules;
pub mod ser;
pub mod value;

pub use class_map::{ClassMap, Mapping, ReferenceMap};
pub use constructor::{resolve_constructor, ConstructorHint};
pub use context::Context;
pub use convert::{Converter, ConverterHandle, ConverterRegistry};
pub use de::{Reader, Records};
pub use describe::{
    type_info, Args, ConstructorHandle, ConstructorInfo, ParameterInfo, PropertyInfo, Record,
    TypeInfo,
};
pub use error::{Error, Result};
pub use header::{resolve, Binding, ResolvedBinding};
pub use member::{MapData, MemberMap, MemberReference, NameIndexSpec, ParameterMap};
pub use options::{CsvOptions, Delimiter, HeaderMatch, LineTerminator};
pub use rows::{CsvRowSink, CsvRowSource, MemoryRows, RowSink, RowSource};
pub use ser::Writer;
pub use value::{FieldValue, Value, ValueKind};

use std::io;

/// Reads every record of type `T` from CSV text, auto-mapping `T`.
///
/// # Examples
///
/// ```rust
/// use csv_classmap::{from_str, impl_record};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Point { x: i32, y: i32 }
///
/// impl_record!(Point { x: i32, y: i32 });
///
/// let points: Vec<Point> = from_str("x,y\n1,2\n3,4\n").unwrap();
/// assert_eq!(points.len(), 2);
/// ```
///
/// # Errors
///
/// Returns the first error met: configuration, header resolution, or a row
/// that cannot be materialized.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T: Record>(input: &str) -> Result<Vec<T>> {
    from_str_with_context(input, Context::default())
}

/// Reads every record of type `T` from CSV text, using the class maps and options of `context`.
///
/// # Errors
///
/// See [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str_with_context<T: Record>(input: &str, context: Context) -> Result<Vec<T>> {
    from_reader(input.as_bytes(), context)
}

/// Reads every record of type `T` from an I/O stream of CSV.
///
/// # Examples
///
/// ```rust
/// use csv_classmap::{from_reader, impl_record, Context};
/// use std::io::Cursor;
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Point { x: i32, y: i32 }
///
/// impl_record!(Point { x: i32, y: i32 });
///
/// let cursor = Cursor::new(b"x,y\n1,2\n");
/// let points: Vec<Point> = from_reader(cursor, Context::default()).unwrap();
/// assert_eq!(points, vec![Point { x: 1, y: 2 }]);
/// ```
///
/// # Errors
///
/// Returns an error if reading fails, or see [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(reader: R, context: Context) -> Result<Vec<T>>
where
    R: io::Read,
    T: Record,
{
    let mut reader = Reader::from_reader(reader, context);
    let records = reader.get_records::<T>().collect();
    records
}

/// Writes records as CSV text, auto-mapping `T`.
///
/// # Examples
///
/// ```rust
/// use csv_classmap::{impl_record, to_string};
///
/// #[derive(Default)]
/// struct Point { x: i32, y: i32 }
///
/// impl_record!(Point { x: i32, y: i32 });
///
/// let csv = to_string(&[Point { x: 1, y: 2 }]).unwrap();
/// assert_eq!(csv, "x,y\r\n1,2\r\n");
/// ```
///
/// # Errors
///
/// Returns an error if `T` has no writable class map or a value cannot be formatted.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T: Record>(records: &[T]) -> Result<String> {
    to_string_with_context(records, Context::default())
}

/// Writes records as CSV text, using the class maps and options of `context`.
///
/// # Errors
///
/// See [`to_string`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_context<T: Record>(records: &[T], context: Context) -> Result<String> {
    let mut buffer = Vec::new();
    to_writer(&mut buffer, records, context)?;
    String::from_utf8(buffer).map_err(|e| Error::custom(e.to_string()))
}

/// Writes records as CSV to a writer.
///
/// # Errors
///
/// Returns an error if writing fails, or see [`to_string`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, records: &[T], context: Context) -> Result<()>
where
    W: io::Write,
    T: Record,
{
    let mut writer = Writer::from_writer(writer, context);
    writer.write_records(records)?;
    writer.flush()
}
