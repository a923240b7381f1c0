//! Record serialization.
//!
//! This module provides the [`Writer`], which emits a header and one row per
//! instance according to the instance type's class map.
//!
//! Columns follow map declaration order, each written under the names it is
//! read by. A member map on a property populated through the constructor is
//! written by its parameter map. A parameter map with no mirroring property
//! makes the class map unwritable; writing such a type fails before any output
//! is produced.
//!
//! ```rust
//! use csv_classmap::{impl_record, to_string};
//!
//! #[derive(Default)]
//! struct Point { x: i32, y: i32 }
//!
//! impl_record!(Point { x: i32, y: i32 });
//!
//! let csv = to_string(&[Point { x: 1, y: 2 }]).unwrap();
//! assert_eq!(csv, "x,y\r\n1,2\r\n");
//! ```

use crate::class_map::{Mapping, Slot};
use crate::context::Context;
use crate::convert::ConverterRegistry;
use crate::describe::Record;
use crate::options::CsvOptions;
use crate::rows::{CsvRowSink, RowSink};
use crate::{Error, Result};
use std::io;

pub(crate) struct WriteContext<'a> {
    pub(crate) options: &'a CsvOptions,
    pub(crate) converters: &'a ConverterRegistry,
    /// One-based number of the row being written, header included.
    pub(crate) row: usize,
}

/// Appends the fields of `source` to `out`, following the mapping's write plan.
pub(crate) fn write_fields<T: Record>(
    mapping: &Mapping<T>,
    source: &T,
    out: &mut Vec<String>,
    ctx: &WriteContext<'_>,
) -> Result<()> {
    let info = &mapping.info;
    let type_name = info.name();
    for slot in mapping.write_plan()? {
        match *slot {
            Slot::Member(index) => {
                let member = &mapping.members[index];
                let property = info.property_at(member.property).ok_or_else(|| {
                    Error::configuration(
                        type_name,
                        format!("property `{}` does not exist", member.map.property()),
                    )
                })?;
                let value = match member.map.constant_value() {
                    Some(constant) => constant.clone(),
                    None => property.get(source),
                };
                let field = ctx
                    .converters
                    .write_field(&value, property.kind(), member.map.data().converter(), ctx.options)
                    .map_err(|e| e.at_row(type_name, ctx.row, property.name()))?;
                out.push(field);
            }
            Slot::Parameter(index) => {
                let parameter = &mapping.parameters[index];
                let property = parameter
                    .mirror
                    .and_then(|mirror| info.property_at(mirror))
                    .ok_or_else(|| {
                        Error::configuration(
                            type_name,
                            format!(
                                "parameter `{}` has no mirroring property",
                                parameter.reference.name()
                            ),
                        )
                    })?;
                let value = property.get(source);
                let field = ctx
                    .converters
                    .write_field(&value, property.kind(), parameter.map.data().converter(), ctx.options)
                    .map_err(|e| e.at_row(type_name, ctx.row, parameter.reference.name()))?;
                out.push(field);
            }
            Slot::Reference(index) => {
                mapping.references[index].access.write(source, out, ctx)?;
            }
        }
    }
    Ok(())
}

/// Writes records of any mapped type to a [`RowSink`].
///
/// When [`CsvOptions::has_header`] is set the header of the first type written
/// is emitted exactly once, before its first record.
pub struct Writer<K> {
    sink: K,
    context: Context,
    header_written: bool,
    row: usize,
}

impl<W: io::Write> Writer<CsvRowSink<W>> {
    /// Creates a writer emitting CSV text to `writer` with the context's options.
    pub fn from_writer(writer: W, context: Context) -> Self {
        let sink = CsvRowSink::from_writer(writer, context.options());
        Writer::new(sink, context)
    }
}

impl<K: RowSink> Writer<K> {
    pub fn new(sink: K, context: Context) -> Self {
        Writer {
            sink,
            context,
            header_written: false,
            row: 0,
        }
    }

    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Number of rows written so far, header included.
    #[must_use]
    pub const fn row(&self) -> usize {
        self.row
    }

    /// Writes the header row for `T`. Does nothing if a header was already written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `T` has no writable class map.
    pub fn write_header<T: Record>(&mut self) -> Result<()> {
        let mapping = self.context.mapping_for::<T>()?;
        mapping.check_writable()?;
        if self.header_written {
            return Ok(());
        }
        let names = mapping.header_names()?;
        log::trace!("writing header {:?}", names);
        self.sink.write_row(&names)?;
        self.header_written = true;
        self.row += 1;
        Ok(())
    }

    /// Writes one record, preceded by the header if one is due.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `T` has no writable class map, or a
    /// [`Error::RecordBinding`] if a value cannot be formatted.
    pub fn write_record<T: Record>(&mut self, record: &T) -> Result<()> {
        let mapping = self.context.mapping_for::<T>()?;
        mapping.check_writable()?;
        if self.context.options().has_header && !self.header_written {
            self.write_header::<T>()?;
        }
        let mut fields = Vec::new();
        let ctx = WriteContext {
            options: self.context.options(),
            converters: self.context.converters(),
            row: self.row + 1,
        };
        write_fields(&mapping, record, &mut fields, &ctx)?;
        self.sink.write_row(&fields)?;
        self.row += 1;
        Ok(())
    }

    /// Writes every record. The header is written even when there are none.
    ///
    /// # Errors
    ///
    /// Stops at the first failing record; see [`Writer::write_record`].
    pub fn write_records<'a, T, I>(&mut self, records: I) -> Result<()>
    where
        T: Record + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        if self.context.options().has_header {
            self.write_header::<T>()?;
        }
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the sink fails to flush.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }

    pub fn into_inner(self) -> K {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_map::ClassMap;
    use crate::describe::{ConstructorInfo, ParameterInfo, PropertyInfo, TypeInfo};
    use crate::value::Value;

    #[derive(Debug, Default)]
    struct Line {
        sku: String,
        qty: u32,
        note: Option<String>,
    }

    impl Record for Line {
        fn describe() -> TypeInfo<Self> {
            TypeInfo::new("Line")
                .with_constructor(ConstructorInfo::default_constructor())
                .with_property(PropertyInfo::read_write(
                    "Sku",
                    |l: &Line| l.sku.clone(),
                    |l, v| l.sku = v,
                ))
                .with_property(PropertyInfo::read_write("Qty", |l: &Line| l.qty, |l, v| l.qty = v))
                .with_property(PropertyInfo::read_write(
                    "Note",
                    |l: &Line| l.note.clone(),
                    |l, v| l.note = v,
                ))
        }
    }

    struct Opaque {
        secret: i32,
    }

    impl Record for Opaque {
        fn describe() -> TypeInfo<Self> {
            TypeInfo::new("Opaque").with_constructor(ConstructorInfo::new(
                vec![ParameterInfo::of::<i32>("secret")],
                |args| Ok(Opaque { secret: args.take(0)? }),
            ))
        }
    }

    fn writer() -> Writer<Vec<Vec<String>>> {
        Writer::new(Vec::new(), Context::default())
    }

    #[test]
    fn test_header_written_once() {
        let mut writer = writer();
        let lines = [
            Line {
                sku: "a".to_string(),
                qty: 1,
                note: None,
            },
            Line {
                sku: "b".to_string(),
                qty: 2,
                note: Some("x".to_string()),
            },
        ];
        writer.write_records(&lines).unwrap();
        writer.write_header::<Line>().unwrap();
        let rows = writer.into_inner();
        assert_eq!(
            rows,
            vec![
                vec!["Sku", "Qty", "Note"],
                vec!["a", "1", ""],
                vec!["b", "2", "x"],
            ]
        );
    }

    #[test]
    fn test_constant_is_written_verbatim() {
        let mut map = ClassMap::<Line>::new();
        map.map("Sku");
        map.map("Note").name("Source").constant(Value::from("import"));
        let mut context = Context::default();
        context.register_class_map(map).unwrap();
        let mut writer = Writer::new(Vec::new(), context);
        writer.write_record(&Line::default()).unwrap();
        assert_eq!(writer.into_inner(), vec![vec!["Sku", "Source"], vec!["", "import"]]);
    }

    #[test]
    fn test_unwritable_map_fails_before_output() {
        let mut map = ClassMap::<Opaque>::new();
        map.parameter("secret");
        let mut context = Context::default();
        context.register_class_map(map).unwrap();
        let mut writer = Writer::new(Vec::new(), context);
        let err = writer.write_record(&Opaque { secret: 1 }).unwrap_err();
        assert!(err.is_configuration());
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn test_without_header() {
        let context = Context::new(CsvOptions::new().with_has_header(false));
        let mut writer = Writer::new(Vec::new(), context);
        writer.write_records(&[Line::default()]).unwrap();
        assert_eq!(writer.row(), 1);
        assert_eq!(writer.into_inner(), vec![vec!["", "0", ""]]);
    }
}
