//! Mapping rules
//!
//! This module documents how class maps bind CSV documents to records, as
//! implemented by this library. It contains no code.
//!
//! # Building a class map
//!
//! A class map is declared through [`ClassMap`](crate::ClassMap) builder calls
//! and sealed by [`ClassMap::build`](crate::ClassMap::build). Sealing fails with
//! [`Error::Configuration`](crate::Error::Configuration) when:
//!
//! - a member map names a property the type does not declare;
//! - two maps target the same property or the same constructor parameter;
//! - a map has neither a candidate name nor a fixed index;
//! - no constructor accepts the declared parameter names;
//! - a read-only property is mapped but no constructor parameter populates it.
//!
//! ## Constructor selection
//!
//! Exactly one constructor is driven per class map, chosen by the first rule
//! that applies:
//!
//! 1. an explicit handle ([`ClassMap::use_constructor`](crate::ClassMap::use_constructor),
//!    or the handle carried by parameter maps declared with
//!    [`ClassMap::parameter_in`](crate::ClassMap::parameter_in) /
//!    [`ClassMap::parameter_at`](crate::ClassMap::parameter_at));
//! 2. [`ClassMap::use_most_parameters`](crate::ClassMap::use_most_parameters):
//!    the constructor with the most parameters, skipping synthesized ones;
//! 3. parameter maps declared by name: the first constructor, in declaration
//!    order, whose parameters include every name;
//! 4. no parameter maps: the parameterless constructor.
//!
//! Two constructors tying for the most parameters resolve to the first declared
//! and log a warning. Declare parameters by name or pass a handle to avoid it.
//!
//! # Resolving the header
//!
//! Before the first data row is read, every map is bound to a column:
//!
//! | Map declares | Header present | Result |
//! |--------------|----------------|--------|
//! | fixed index `i` | either | column `i` |
//! | names | yes | n-th matching cell of the first name that matches |
//! | names | no | unbound |
//!
//! Names are tried primary first, then aliases. Cells are compared under the
//! configured [`HeaderMatch`](crate::HeaderMatch) policy, after trimming when
//! `trim_headers` is set. Reference maps prepend their prefix to every name of
//! the nested map.
//!
//! An unbound map that is neither optional, constant nor ignored fails the
//! document with [`Error::HeaderResolution`](crate::Error::HeaderResolution),
//! which names every missing header of the whole map tree at once.
//!
//! # Materializing a row
//!
//! ```text
//! Id,Name          <- row 1 (header)
//! 1,one            <- row 2
//! ```
//!
//! 1. Each bound parameter field is converted by the map's converter or the
//!    registry's converter for the parameter's kind. An empty field uses the
//!    map's default when one is set; an empty field in a nullable slot is null.
//! 2. Unbound parameters receive the map default, else the parameter's declared
//!    default, else null when nullable, else the zero value of their kind
//!    (`false`, `0`, `0.0`, `""`, the Unix epoch).
//! 3. The constructor is invoked once with all arguments in parameter order.
//! 4. Member maps are applied: constants verbatim, bound fields converted,
//!    unbound optional maps left alone unless they carry a default.
//! 5. Reference maps materialize their nested record and assign it.
//!
//! A conversion, argument or construction failure fails that row with
//! [`Error::RecordBinding`](crate::Error::RecordBinding), carrying the type, the
//! one-based row number (header included) and the member. No partially
//! populated record is ever returned, and later rows can still be read.
//!
//! # Writing
//!
//! The header lists the primary name of every written map in declaration order.
//! Values come from property getters; a parameter map reads the property that
//! mirrors its parameter (same name, or the only case-insensitive match). Every
//! map read back is written under the names it is read by: a member map on a
//! read-only property is populated through its parameter, so the parameter map
//! writes that column. A settable member map and a parameter map with the same
//! spec share one column. A parameter map without a mirroring property makes
//! the class map unwritable, and writing fails before any output.
//!
//! Null values are written as empty fields, constants verbatim, ignored members
//! not at all. Fields are quoted by the `csv` writer when needed and rows end
//! with the configured [`LineTerminator`](crate::LineTerminator).
//!
//! # Round trip
//!
//! For a class map whose every mapped value is readable and writable, reading
//! what was written yields an equal record, given converters that round-trip
//! their values.
