//! Record materialization.
//!
//! This module provides the [`Reader`], which turns rows from a [`RowSource`]
//! into instances of a target type according to its class map.
//!
//! ## Overview
//!
//! - **Resolve once**: the header is bound to the class map before the first
//!   data row is consumed, and the binding is reused for every row
//! - **Constructor first**: bound parameter values are converted and handed
//!   to the selected constructor; unbound parameters receive their default
//! - **Then properties**: member maps are assigned on the constructed
//!   instance, then nested reference maps
//! - **Row-scoped errors**: a conversion or construction failure fails that
//!   row only; header and configuration failures end the document
//!
//! ## Usage
//!
//! Most users should use the high-level functions in the crate root:
//!
//! ```rust
//! use csv_classmap::{from_str, impl_record};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Point { x: i32, y: i32 }
//!
//! impl_record!(Point { x: i32, y: i32 });
//!
//! let points: Vec<Point> = from_str("y,x\n2,1\n").unwrap();
//! assert_eq!(points, vec![Point { x: 1, y: 2 }]);
//! ```

use crate::class_map::Mapping;
use crate::context::Context;
use crate::convert::ConverterRegistry;
use crate::describe::{Args, Record};
use crate::header::{self, Binding, ResolvedBinding};
use crate::member::MapData;
use crate::options::CsvOptions;
use crate::rows::{CsvRowSource, RowSource};
use crate::value::{Value, ValueKind};
use crate::{Error, Result};
use std::any::TypeId;
use std::collections::HashMap;
use std::io;
use std::marker::PhantomData;
use std::sync::Arc;

/// Everything a row needs while being materialized.
pub(crate) struct RowContext<'a> {
    pub(crate) fields: &'a [String],
    /// One-based physical row number, header included.
    pub(crate) row: usize,
    pub(crate) options: &'a CsvOptions,
    pub(crate) converters: &'a ConverterRegistry,
}

impl<'a> RowContext<'a> {
    fn field(&self, binding: Binding) -> Option<&'a str> {
        let column = binding.column()?;
        self.fields
            .get(column)
            .map(|field| self.options.prepare_field(field))
    }
}

/// Reads a slot's value from the row.
///
/// Returns `Ok(None)` when nothing applies and the slot should be left alone.
fn read_slot(
    data: &MapData,
    binding: Binding,
    kind: ValueKind,
    nullable: bool,
    ctx: &RowContext<'_>,
    member: &str,
    type_name: &str,
) -> Result<Option<Value>> {
    match ctx.field(binding) {
        Some(raw) => {
            if raw.is_empty() {
                if let Some(default) = data.default_value() {
                    return Ok(Some(default.clone()));
                }
            }
            ctx.converters
                .read_field(raw, kind, nullable, data.converter(), ctx.options)
                .map(Some)
                .map_err(|e| e.at_row(type_name, ctx.row, member))
        }
        None => {
            if let Binding::Column(column) = binding {
                if !data.is_optional() {
                    return Err(Error::record_binding(
                        type_name,
                        ctx.row,
                        member,
                        format!("row has no field at index {}", column),
                    ));
                }
            }
            Ok(data.default_value().cloned())
        }
    }
}

/// Builds one instance of `T` from the current row.
///
/// Never returns a partially populated instance: any failure discards it.
pub(crate) fn materialize<T: Record>(
    mapping: &Mapping<T>,
    binding: &ResolvedBinding,
    ctx: &RowContext<'_>,
) -> Result<T> {
    let info = &mapping.info;
    let type_name = info.name();
    let ctor = info.constructor(mapping.constructor).ok_or_else(|| {
        Error::configuration(
            type_name,
            format!("constructor #{} does not exist", mapping.constructor.index()),
        )
    })?;

    let parameters = ctor.parameters();
    let mut values: Vec<Value> = parameters.iter().map(|p| p.fallback()).collect();
    for (parameter, bound) in mapping.parameters.iter().zip(&binding.parameters) {
        let descriptor = &parameters[parameter.position];
        let value = read_slot(
            parameter.map.data(),
            *bound,
            descriptor.kind(),
            descriptor.is_nullable(),
            ctx,
            descriptor.name(),
            type_name,
        )?;
        if let Some(value) = value {
            values[parameter.position] = value;
        }
    }

    let mut args = Args::new(values, parameters);
    let mut target = ctor
        .invoke(&mut args)
        .map_err(|e| e.at_row(type_name, ctx.row, "constructor"))?;

    for (member, bound) in mapping.members.iter().zip(&binding.members) {
        if member.map.is_ignored() || !member.read {
            continue;
        }
        let Some(property) = info.property_at(member.property) else {
            continue;
        };
        let value = match member.map.constant_value() {
            Some(constant) => Some(constant.clone()),
            None => read_slot(
                member.map.data(),
                *bound,
                property.kind(),
                property.is_nullable(),
                ctx,
                property.name(),
                type_name,
            )?,
        };
        if let Some(value) = value {
            property
                .set(&mut target, value)
                .map_err(|e| e.at_row(type_name, ctx.row, property.name()))?;
        }
    }

    for (reference, bound) in mapping.references.iter().zip(&binding.references) {
        reference.access.read(&mut target, bound, ctx)?;
    }

    Ok(target)
}

/// Materializes records of any mapped type from a [`RowSource`].
///
/// The header row (when [`CsvOptions::has_header`] is set) is read lazily
/// before the first record, or explicitly through [`Reader::read_header`].
pub struct Reader<S> {
    source: S,
    context: Context,
    header: Option<Vec<String>>,
    header_read: bool,
    row: usize,
    bindings: HashMap<TypeId, Arc<ResolvedBinding>>,
}

impl<R: io::Read> Reader<CsvRowSource<R>> {
    /// Creates a reader tokenizing `reader` with the context's options.
    pub fn from_reader(reader: R, context: Context) -> Self {
        let source = CsvRowSource::from_reader(reader, context.options());
        Reader::new(source, context)
    }
}

impl<S: RowSource> Reader<S> {
    pub fn new(source: S, context: Context) -> Self {
        Reader {
            source,
            context,
            header: None,
            header_read: false,
            row: 0,
            bindings: HashMap::new(),
        }
    }

    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Mutable access to the context, e.g. to register class maps before reading.
    ///
    /// Cached header bindings are discarded, as maps may change.
    pub fn context_mut(&mut self) -> &mut Context {
        self.bindings.clear();
        &mut self.context
    }

    /// The header row, once read.
    #[must_use]
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// One-based number of the last row consumed, header included.
    #[must_use]
    pub const fn row(&self) -> usize {
        self.row
    }

    /// Reads the next row as the header. Returns `false` at the end of the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails.
    pub fn read_header(&mut self) -> Result<bool> {
        self.header_read = true;
        self.bindings.clear();
        self.header = self.source.next_header()?;
        if self.header.is_some() {
            self.row += 1;
        }
        log::trace!("read header {:?}", self.header);
        Ok(self.header.is_some())
    }

    fn ensure_header(&mut self) -> Result<()> {
        if self.context.options().has_header && !self.header_read {
            self.read_header()?;
        }
        self.header_read = true;
        Ok(())
    }

    /// Resolves the header against the mapping for `T`, reusing an earlier resolution.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `T` has no usable class map, or
    /// [`Error::HeaderResolution`] if required headers are missing.
    pub fn binding<T: Record>(&mut self) -> Result<(Arc<Mapping<T>>, Arc<ResolvedBinding>)> {
        self.ensure_header()?;
        let mapping = self.context.mapping_for::<T>()?;
        let key = TypeId::of::<T>();
        if let Some(binding) = self.bindings.get(&key) {
            return Ok((mapping, binding.clone()));
        }
        let binding = Arc::new(header::resolve(
            &mapping,
            self.header.as_deref(),
            self.context.options(),
        )?);
        self.bindings.insert(key, binding.clone());
        Ok((mapping, binding))
    }

    /// Reads and materializes the next record.
    ///
    /// Returns `Ok(None)` at the end of the document. A document that is
    /// empty, header included, yields no records.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordBinding`] for a row that cannot be materialized;
    /// later rows can still be read. Any other error is fatal.
    pub fn get_record<T: Record>(&mut self) -> Result<Option<T>> {
        self.ensure_header()?;
        if self.context.options().has_header && self.header.is_none() {
            return Ok(None);
        }
        let (mapping, binding) = self.binding::<T>()?;
        let Some(fields) = self.source.next_row()? else {
            return Ok(None);
        };
        self.row += 1;
        log::trace!("row {}: {:?}", self.row, fields);
        let ctx = RowContext {
            fields: &fields,
            row: self.row,
            options: self.context.options(),
            converters: self.context.converters(),
        };
        materialize(&mapping, &binding, &ctx).map(Some)
    }

    /// Iterates over the remaining records.
    ///
    /// Row-level failures are yielded as `Err` and iteration continues; a fatal
    /// error is yielded once and ends the iteration.
    pub fn get_records<T: Record>(&mut self) -> Records<'_, S, T> {
        Records {
            reader: self,
            done: false,
            _marker: PhantomData,
        }
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

/// Iterator over the records of a [`Reader`].
pub struct Records<'r, S, T> {
    reader: &'r mut Reader<S>,
    done: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<S: RowSource, T: Record> Iterator for Records<'_, S, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.get_record::<T>() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                if e.is_fatal() {
                    self.done = true;
                }
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_map::ClassMap;
    use crate::describe::{ConstructorInfo, ParameterInfo, PropertyInfo, TypeInfo};
    use crate::rows::MemoryRows;

    #[derive(Debug, PartialEq)]
    struct Account {
        id: i32,
        owner: String,
        balance: Option<f64>,
    }

    impl Record for Account {
        fn describe() -> TypeInfo<Self> {
            TypeInfo::new("Account")
                .with_constructor(ConstructorInfo::new(
                    vec![
                        ParameterInfo::of::<i32>("id"),
                        ParameterInfo::of::<String>("owner").with_default("nobody"),
                    ],
                    |args| {
                        Ok(Account {
                            id: args.take(0)?,
                            owner: args.take(1)?,
                            balance: None,
                        })
                    },
                ))
                .with_property(PropertyInfo::read_only("Id", |a: &Account| a.id))
                .with_property(PropertyInfo::read_only("Owner", |a: &Account| a.owner.clone()))
                .with_property(PropertyInfo::read_write(
                    "Balance",
                    |a: &Account| a.balance,
                    |a, v| a.balance = v,
                ))
        }
    }

    fn reader(rows: &[&[&str]], map: ClassMap<Account>) -> Reader<MemoryRows> {
        let mut context = Context::default();
        context.register_class_map(map).unwrap();
        Reader::new(MemoryRows::from_rows(rows.iter().map(|r| r.iter().copied())), context)
    }

    fn account_map() -> ClassMap<Account> {
        let mut map = ClassMap::new();
        map.parameter("id").name("Id");
        map.parameter("owner").name("Owner").optional();
        map.map("Balance");
        map
    }

    #[test]
    fn test_constructor_then_properties() {
        let mut reader = reader(&[&["Balance", "Id", "Owner"], &["2.5", "7", "ann"]], account_map());
        let account: Account = reader.get_record().unwrap().unwrap();
        assert_eq!(
            account,
            Account {
                id: 7,
                owner: "ann".to_string(),
                balance: Some(2.5)
            }
        );
        assert!(reader.get_record::<Account>().unwrap().is_none());
    }

    #[test]
    fn test_unbound_parameter_uses_default() {
        let mut reader = reader(&[&["Id", "Balance"], &["1", ""]], account_map());
        let account: Account = reader.get_record().unwrap().unwrap();
        assert_eq!(account.owner, "nobody");
        assert_eq!(account.balance, None);
    }

    #[test]
    fn test_conversion_failure_fails_only_that_row() {
        let mut reader = reader(
            &[&["Id", "Balance"], &["x", "1"], &["2", "3"]],
            account_map(),
        );
        let results: Vec<Result<Account>> = reader.get_records().collect();
        assert_eq!(results.len(), 2);
        match &results[0] {
            Err(Error::RecordBinding { row, member, .. }) => {
                assert_eq!(*row, 2);
                assert_eq!(member, "id");
            }
            other => panic!("Expected record binding error, got {:?}", other),
        }
        assert_eq!(results[1].as_ref().unwrap().id, 2);
    }

    #[test]
    fn test_short_row_is_record_binding_error() {
        let mut reader = reader(&[&["Balance", "Id"], &["1.0"]], account_map());
        let err = reader.get_record::<Account>().unwrap_err();
        assert!(err.is_record_binding());
    }

    #[test]
    fn test_missing_header_is_fatal() {
        let mut reader = reader(&[&["Balance"], &["1.0"], &["2.0"]], account_map());
        let results: Vec<Result<Account>> = reader.get_records().collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].as_ref().unwrap_err().is_header_resolution());
    }

    #[test]
    fn test_empty_document_yields_nothing() {
        let mut reader = reader(&[], account_map());
        assert!(reader.get_record::<Account>().unwrap().is_none());
        assert!(reader.header().is_none());
    }

    #[test]
    fn test_header_without_rows() {
        let mut reader = reader(&[&["Id", "Balance"]], account_map());
        assert!(reader.get_record::<Account>().unwrap().is_none());
        assert_eq!(reader.row(), 1);
    }
}
