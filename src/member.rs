//! Member and parameter maps: one binding unit each.
//!
//! A [`MemberMap`] binds a property of the target type to a column; a
//! [`ParameterMap`] binds a constructor parameter. Both carry a
//! [`NameIndexSpec`] (candidate header names and/or a fixed index) plus the
//! shared per-map policy in [`MapData`]: optional flag, default value and
//! converter override.
//!
//! Maps are created through [`ClassMap`](crate::ClassMap) builder calls and
//! configured fluently:
//!
//! ```rust
//! use csv_classmap::{ClassMap, impl_record};
//!
//! #[derive(Default)]
//! struct Person {
//!     id: i32,
//!     name: String,
//! }
//!
//! impl_record!(Person { id: i32, name: String });
//!
//! let mut map = ClassMap::<Person>::new();
//! map.map("id").name("Id").alias("ID");
//! map.map("name").name("Name").optional().default("unknown");
//!
//! assert_eq!(map.member_maps()[0].data().names(), ["Id", "ID"]);
//! assert!(map.member_maps()[1].data().is_optional());
//! ```

use crate::convert::{Converter, ConverterHandle};
use crate::describe::ConstructorHandle;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Where a mapped value goes to (on read) and comes from (on write).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberReference {
    /// A property of the target type, by name.
    Property { name: String },
    /// A parameter of a specific constructor.
    Parameter {
        constructor: ConstructorHandle,
        position: usize,
        name: String,
    },
}

impl MemberReference {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            MemberReference::Property { name } | MemberReference::Parameter { name, .. } => name,
        }
    }
}

impl fmt::Display for MemberReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberReference::Property { name } => write!(f, "{}", name),
            MemberReference::Parameter { position, name, .. } => {
                write!(f, "{} (parameter {})", name, position)
            }
        }
    }
}

/// Candidate header names and/or a fixed column index.
///
/// The first name is the primary (written as the header), the rest are
/// aliases tried in order on read. `name_index` selects the n-th occurrence of
/// a name when the header repeats it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameIndexSpec {
    names: Vec<String>,
    name_index: usize,
    index: Option<usize>,
}

impl NameIndexSpec {
    #[must_use]
    pub fn named(name: &str) -> Self {
        NameIndexSpec {
            names: vec![name.to_string()],
            ..Default::default()
        }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    #[must_use]
    pub const fn name_index(&self) -> usize {
        self.name_index
    }

    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        self.index
    }

    /// A spec must name at least one candidate unless it carries a fixed index.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.names.is_empty() || self.index.is_some()
    }
}

/// Per-map settings shared by member and parameter maps.
#[derive(Clone, Default)]
pub struct MapData {
    spec: NameIndexSpec,
    converter: Option<ConverterHandle>,
    optional: bool,
    default: Option<Value>,
}

impl MapData {
    fn new(name: &str) -> Self {
        MapData {
            spec: NameIndexSpec::named(name),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn spec(&self) -> &NameIndexSpec {
        &self.spec
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.spec.names
    }

    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    #[must_use]
    pub fn converter(&self) -> Option<&ConverterHandle> {
        self.converter.as_ref()
    }

    /// Primary header name, or `fallback` for index-only specs.
    pub(crate) fn header_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.spec.primary().unwrap_or(fallback)
    }
}

impl fmt::Debug for MapData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapData")
            .field("spec", &self.spec)
            .field("converter", &self.converter.is_some())
            .field("optional", &self.optional)
            .field("default", &self.default)
            .finish()
    }
}

macro_rules! map_data_setters {
    ($ty:ty) => {
        impl $ty {
            /// Replaces the candidate names with a single primary name.
            pub fn name(&mut self, name: &str) -> &mut Self {
                self.data.spec.names = vec![name.to_string()];
                self
            }

            /// Replaces the candidate names; the first is the primary.
            pub fn names<I, S>(&mut self, names: I) -> &mut Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                self.data.spec.names = names.into_iter().map(Into::into).collect();
                self
            }

            /// Adds an alias tried after the names already declared.
            pub fn alias(&mut self, name: &str) -> &mut Self {
                self.data.spec.names.push(name.to_string());
                self
            }

            /// Selects the n-th occurrence (zero-based) of a repeated header name.
            pub fn name_index(&mut self, name_index: usize) -> &mut Self {
                self.data.spec.name_index = name_index;
                self
            }

            /// Binds to a fixed zero-based column, regardless of header content.
            pub fn index(&mut self, index: usize) -> &mut Self {
                self.data.spec.index = Some(index);
                self
            }

            /// Allows the header to lack this column.
            pub fn optional(&mut self) -> &mut Self {
                self.data.optional = true;
                self
            }

            /// Value used when the column is missing or the field is empty.
            pub fn default(&mut self, value: impl Into<Value>) -> &mut Self {
                self.data.default = Some(value.into());
                self
            }

            /// Overrides the registry converter for this map.
            pub fn converter<C: Converter + 'static>(&mut self, converter: C) -> &mut Self {
                self.data.converter = Some(Arc::new(converter));
                self
            }

            #[must_use]
            pub fn data(&self) -> &MapData {
                &self.data
            }
        }
    };
}

/// Binds one property to a column.
#[derive(Clone, Debug)]
pub struct MemberMap {
    property: String,
    data: MapData,
    constant: Option<Value>,
    ignore: bool,
}

impl MemberMap {
    pub(crate) fn new(property: &str) -> Self {
        MemberMap {
            property: property.to_string(),
            data: MapData::new(property),
            constant: None,
            ignore: false,
        }
    }

    #[must_use]
    pub fn reference(&self) -> MemberReference {
        MemberReference::Property {
            name: self.property.clone(),
        }
    }

    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Always assigns `value` on read and writes it verbatim, ignoring row data.
    pub fn constant(&mut self, value: impl Into<Value>) -> &mut Self {
        self.constant = Some(value.into());
        self
    }

    /// Excludes the property from both reading and writing.
    pub fn ignore(&mut self) -> &mut Self {
        self.ignore = true;
        self
    }

    #[must_use]
    pub fn constant_value(&self) -> Option<&Value> {
        self.constant.as_ref()
    }

    #[must_use]
    pub const fn is_ignored(&self) -> bool {
        self.ignore
    }
}

map_data_setters!(MemberMap);

/// How a parameter map identifies its constructor parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ParameterTarget {
    /// Parameter name only; the constructor is selected when the map is built.
    Named(String),
    /// Parameter of an explicitly supplied constructor, by name.
    NamedIn(ConstructorHandle, String),
    /// Parameter of an explicitly supplied constructor, by position.
    At(ConstructorHandle, usize),
}

/// Binds one constructor parameter to a column.
#[derive(Clone, Debug)]
pub struct ParameterMap {
    target: ParameterTarget,
    data: MapData,
}

impl ParameterMap {
    pub(crate) fn named(name: &str) -> Self {
        ParameterMap {
            target: ParameterTarget::Named(name.to_string()),
            data: MapData::new(name),
        }
    }

    pub(crate) fn named_in(constructor: ConstructorHandle, name: &str) -> Self {
        ParameterMap {
            target: ParameterTarget::NamedIn(constructor, name.to_string()),
            data: MapData::new(name),
        }
    }

    pub(crate) fn at(constructor: ConstructorHandle, position: usize, name: &str) -> Self {
        ParameterMap {
            target: ParameterTarget::At(constructor, position),
            data: MapData::new(name),
        }
    }

    pub(crate) fn target(&self) -> &ParameterTarget {
        &self.target
    }

    /// The parameter name this map was declared with, when declared by name.
    #[must_use]
    pub fn parameter_name(&self) -> Option<&str> {
        match &self.target {
            ParameterTarget::Named(name) | ParameterTarget::NamedIn(_, name) => Some(name),
            ParameterTarget::At(..) => None,
        }
    }

    /// The explicitly supplied constructor, if any.
    #[must_use]
    pub fn constructor(&self) -> Option<ConstructorHandle> {
        match &self.target {
            ParameterTarget::Named(_) => None,
            ParameterTarget::NamedIn(handle, _) | ParameterTarget::At(handle, _) => Some(*handle),
        }
    }
}

map_data_setters!(ParameterMap);
