//! Capability tables describing how a target type is constructed and populated.
//!
//! A class map never inspects a type directly. It references entries of the
//! type's [`TypeInfo`]: the ordered list of constructors (each with ordered
//! parameter descriptors and a factory) and the ordered table of properties
//! (each with a getter and, when writable, a setter).
//!
//! Tables are produced by [`Record::describe`] and built once per type through
//! [`type_info`], which caches them process-wide.
//!
//! ## Examples
//!
//! ```rust
//! use csv_classmap::{ConstructorInfo, ParameterInfo, PropertyInfo, Record, TypeInfo};
//!
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
//! let info = csv_classmap::type_info::<Foo>();
//! assert_eq!(info.constructors().len(), 1);
//! assert!(info.property("Id").is_some());
//! ```

use crate::value::{FieldValue, Value, ValueKind};
use crate::{Error, Result};
use indexmap::IndexMap;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// A type that can be materialized from and serialized to rows.
pub trait Record: Sized + Send + Sync + 'static {
    /// Builds the capability table for this type.
    fn describe() -> TypeInfo<Self>;
}

type Factory<T> = Arc<dyn Fn(&mut Args) -> Result<T> + Send + Sync>;
type Getter<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;
type Setter<T> = Arc<dyn Fn(&mut T, Value) -> Result<()> + Send + Sync>;

/// Identifies one constructor within a [`TypeInfo`] by declaration position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConstructorHandle(pub(crate) usize);

impl ConstructorHandle {
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }
}

/// Describes one constructor parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterInfo {
    name: String,
    kind: ValueKind,
    nullable: bool,
    position: usize,
    default: Option<Value>,
}

impl ParameterInfo {
    /// Describes a parameter of Rust type `V`.
    #[must_use]
    pub fn of<V: FieldValue>(name: &str) -> Self {
        ParameterInfo {
            name: name.to_string(),
            kind: V::KIND,
            nullable: V::NULLABLE,
            position: 0,
            default: None,
        }
    }

    /// Declares the value the parameter receives when nothing is bound to it.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// The value used when the parameter is left unbound: its declared default,
    /// null when nullable, otherwise the kind's zero value.
    pub(crate) fn fallback(&self) -> Value {
        match &self.default {
            Some(value) => value.clone(),
            None if self.nullable => Value::Null,
            None => self.kind.zero(),
        }
    }
}

/// Describes one constructor: its ordered parameters and the factory invoking it.
pub struct ConstructorInfo<T> {
    parameters: Vec<ParameterInfo>,
    synthesized: bool,
    factory: Factory<T>,
}

impl<T: 'static> ConstructorInfo<T> {
    pub fn new<F>(parameters: Vec<ParameterInfo>, factory: F) -> Self
    where
        F: Fn(&mut Args) -> Result<T> + Send + Sync + 'static,
    {
        let parameters = parameters
            .into_iter()
            .enumerate()
            .map(|(position, mut parameter)| {
                parameter.position = position;
                parameter
            })
            .collect();
        ConstructorInfo {
            parameters,
            synthesized: false,
            factory: Arc::new(factory),
        }
    }

    /// A parameterless constructor backed by `Default`.
    #[must_use]
    pub fn default_constructor() -> Self
    where
        T: Default,
    {
        ConstructorInfo::new(Vec::new(), |_| Ok(T::default()))
    }
}

impl<T> ConstructorInfo<T> {
    /// Marks the constructor as generated by the type rather than written by its author.
    ///
    /// Synthesized constructors are skipped by the "most parameters" heuristic.
    #[must_use]
    pub fn synthesized(mut self) -> Self {
        self.synthesized = true;
        self
    }

    #[must_use]
    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.parameters
    }

    #[must_use]
    pub const fn is_synthesized(&self) -> bool {
        self.synthesized
    }

    pub(crate) fn parameter_position(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name == name)
    }

    pub(crate) fn invoke(&self, args: &mut Args) -> Result<T> {
        (self.factory)(args)
    }
}

impl<T> fmt::Debug for ConstructorInfo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("parameters", &self.parameters)
            .field("synthesized", &self.synthesized)
            .finish_non_exhaustive()
    }
}

/// Describes one property: how to read it and, if writable, how to assign it.
pub struct PropertyInfo<T> {
    name: String,
    kind: ValueKind,
    nullable: bool,
    getter: Getter<T>,
    setter: Option<Setter<T>>,
}

impl<T: 'static> PropertyInfo<T> {
    /// A property that can only be read (populated through a constructor).
    pub fn read_only<V, G>(name: &str, get: G) -> Self
    where
        V: FieldValue + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        PropertyInfo {
            name: name.to_string(),
            kind: V::KIND,
            nullable: V::NULLABLE,
            getter: Arc::new(move |target: &T| get(target).to_value()),
            setter: None,
        }
    }

    /// A property that can be read and assigned.
    pub fn read_write<V, G, S>(name: &str, get: G, set: S) -> Self
    where
        V: FieldValue + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let mut property = Self::read_only(name, get);
        property.setter = Some(Arc::new(move |target: &mut T, value: Value| {
            set(target, V::from_value(value)?);
            Ok(())
        }));
        property
    }
}

impl<T> PropertyInfo<T> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    pub(crate) fn get(&self, target: &T) -> Value {
        (self.getter)(target)
    }

    pub(crate) fn set(&self, target: &mut T, value: Value) -> Result<()> {
        match &self.setter {
            Some(setter) => setter(target, value),
            None => Err(Error::custom(format!("property `{}` is read-only", self.name))),
        }
    }
}

impl<T> fmt::Debug for PropertyInfo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("writable", &self.setter.is_some())
            .finish_non_exhaustive()
    }
}

/// The capability table of one target type.
pub struct TypeInfo<T> {
    name: String,
    constructors: Vec<ConstructorInfo<T>>,
    properties: IndexMap<String, PropertyInfo<T>>,
}

impl<T> TypeInfo<T> {
    #[must_use]
    pub fn new(name: &str) -> Self {
        TypeInfo {
            name: name.to_string(),
            constructors: Vec::new(),
            properties: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_constructor(mut self, constructor: ConstructorInfo<T>) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Adds a property. A later property with the same name replaces the earlier one.
    #[must_use]
    pub fn with_property(mut self, property: PropertyInfo<T>) -> Self {
        self.properties.insert(property.name.clone(), property);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn constructors(&self) -> &[ConstructorInfo<T>] {
        &self.constructors
    }

    /// Returns the handle of the constructor declared at `index`.
    #[must_use]
    pub fn constructor_handle(&self, index: usize) -> Option<ConstructorHandle> {
        (index < self.constructors.len()).then_some(ConstructorHandle(index))
    }

    #[must_use]
    pub fn constructor(&self, handle: ConstructorHandle) -> Option<&ConstructorInfo<T>> {
        self.constructors.get(handle.0)
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyInfo<T>> {
        self.properties.values()
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyInfo<T>> {
        self.properties.get(name)
    }

    pub(crate) fn property_at(&self, index: usize) -> Option<&PropertyInfo<T>> {
        self.properties.get_index(index).map(|(_, property)| property)
    }

    /// Exact property lookup, returning its position in the table.
    pub(crate) fn property_index(&self, name: &str) -> Option<usize> {
        self.properties.get_index_of(name)
    }

    /// Finds the property mirroring a constructor parameter: exact name first,
    /// then a unique case-insensitive match (`id` mirrors `Id`).
    pub(crate) fn mirror_property(&self, parameter: &str) -> Option<usize> {
        if let Some(index) = self.properties.get_index_of(parameter) {
            return Some(index);
        }
        let mut matches = self
            .properties
            .keys()
            .enumerate()
            .filter(|(_, name)| name.eq_ignore_ascii_case(parameter));
        match (matches.next(), matches.next()) {
            (Some((index, _)), None) => Some(index),
            _ => None,
        }
    }
}

impl<T> fmt::Debug for TypeInfo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("constructors", &self.constructors)
            .field("properties", &self.properties.values().collect::<Vec<_>>())
            .finish()
    }
}

/// Ordered constructor arguments handed to a factory.
///
/// Each argument can be taken once, converted to the factory's field type.
#[derive(Debug)]
pub struct Args {
    values: Vec<Option<Value>>,
    names: Vec<String>,
}

impl Args {
    pub(crate) fn new(values: Vec<Value>, parameters: &[ParameterInfo]) -> Self {
        Args {
            values: values.into_iter().map(Some).collect(),
            names: parameters.iter().map(|p| p.name.clone()).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Takes the argument at `position`, converting it to `V`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] if the position is out of range, the argument
    /// was already taken, or the value does not fit `V`.
    pub fn take<V: FieldValue>(&mut self, position: usize) -> Result<V> {
        let name = self
            .names
            .get(position)
            .cloned()
            .unwrap_or_else(|| format!("#{}", position));
        let value = self
            .values
            .get_mut(position)
            .and_then(Option::take)
            .ok_or_else(|| Error::argument(position, &name, "argument is missing"))?;
        V::from_value(value).map_err(|e| Error::argument(position, &name, e))
    }
}

type Cache = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

fn cache() -> &'static Cache {
    static CACHE: OnceLock<Cache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Returns the capability table of `T`, building it on first use.
///
/// The table is cached process-wide; later calls share the same instance.
pub fn type_info<T: Record>() -> Arc<TypeInfo<T>> {
    let key = TypeId::of::<T>();
    let cached = cache()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
        .cloned();
    if let Some(info) = cached.and_then(|any| any.downcast::<TypeInfo<T>>().ok()) {
        return info;
    }

    let info = Arc::new(T::describe());
    log::debug!(
        "described `{}`: {} constructor(s), {} propert(ies)",
        info.name,
        info.constructors.len(),
        info.properties.len()
    );
    let mut cache = cache().write().unwrap_or_else(PoisonError::into_inner);
    let entry = cache
        .entry(key)
        .or_insert_with(|| info.clone() as Arc<dyn Any + Send + Sync>);
    entry.clone().downcast::<TypeInfo<T>>().unwrap_or(info)
}
