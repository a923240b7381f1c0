//! Class maps: the full mapping declaration for one target type.
//!
//! A [`ClassMap`] is built once at configuration time through explicit builder
//! calls ([`ClassMap::map`], [`ClassMap::parameter`], [`ClassMap::reference`],
//! ...) or [`ClassMap::auto_map`]. [`ClassMap::build`] validates it against the
//! target's capability table, selects the constructor and seals it into a
//! [`Mapping`]: immutable, shareable across readers and writers.
//!
//! ## Examples
//!
//! ```rust
//! use csv_classmap::{ClassMap, ConstructorInfo, ParameterInfo, PropertyInfo, Record, TypeInfo};
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
//! let mut map = ClassMap::<Foo>::new();
//! map.parameter("id").name("Id");
//! map.parameter("name").name("Name");
//!
//! let mapping = map.build().unwrap();
//! assert_eq!(mapping.header_names().unwrap(), ["Id", "Name"]);
//! ```

use crate::constructor::{self, ConstructorHint};
use crate::de::{self, RowContext};
use crate::describe::{type_info, ConstructorHandle, Record, TypeInfo};
use crate::header::{self, ResolvedBinding};
use crate::member::{MemberMap, MemberReference, ParameterMap, ParameterTarget};
use crate::options::CsvOptions;
use crate::ser::{self, WriteContext};
use crate::{Error, Result};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Position of a map in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    Member(usize),
    Parameter(usize),
    Reference(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConstructorChoice {
    Auto,
    Explicit(ConstructorHandle),
    MostParameters,
}

/// Type-erased access to a nested class map owned by a property of `T`.
pub(crate) trait ReferenceAccess<T>: Send + Sync {
    fn resolve(
        &self,
        header: Option<&[String]>,
        options: &CsvOptions,
        prefix: &str,
        missing: &mut Vec<String>,
    ) -> ResolvedBinding;

    fn read(&self, target: &mut T, binding: &ResolvedBinding, ctx: &RowContext<'_>) -> Result<()>;

    fn header(&self, prefix: &str, out: &mut Vec<String>) -> Result<()>;

    fn write(&self, source: &T, out: &mut Vec<String>, ctx: &WriteContext<'_>) -> Result<()>;

    fn check_writable(&self) -> Result<()>;
}

struct TypedReference<T, U> {
    mapping: Mapping<U>,
    get: Arc<dyn Fn(&T) -> &U + Send + Sync>,
    set: Arc<dyn Fn(&mut T, U) + Send + Sync>,
}

impl<T: Record, U: Record> ReferenceAccess<T> for TypedReference<T, U> {
    fn resolve(
        &self,
        header: Option<&[String]>,
        options: &CsvOptions,
        prefix: &str,
        missing: &mut Vec<String>,
    ) -> ResolvedBinding {
        header::resolve_into(&self.mapping, header, options, prefix, missing)
    }

    fn read(&self, target: &mut T, binding: &ResolvedBinding, ctx: &RowContext<'_>) -> Result<()> {
        let child = de::materialize(&self.mapping, binding, ctx)?;
        (self.set)(target, child);
        Ok(())
    }

    fn header(&self, prefix: &str, out: &mut Vec<String>) -> Result<()> {
        self.mapping.header_into(prefix, out)
    }

    fn write(&self, source: &T, out: &mut Vec<String>, ctx: &WriteContext<'_>) -> Result<()> {
        ser::write_fields(&self.mapping, (self.get)(source), out, ctx)
    }

    fn check_writable(&self) -> Result<()> {
        self.mapping.check_writable()
    }
}

/// Binds a property holding a nested record to that record's own class map.
pub struct ReferenceMap<T> {
    property: String,
    prefix: String,
    access: std::result::Result<Arc<dyn ReferenceAccess<T>>, Error>,
}

impl<T> ReferenceMap<T> {
    /// Prepends `prefix` to every header name of the nested map.
    pub fn prefix(&mut self, prefix: &str) -> &mut Self {
        self.prefix = prefix.to_string();
        self
    }

    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    #[must_use]
    pub fn header_prefix(&self) -> &str {
        &self.prefix
    }
}

impl<T> fmt::Debug for ReferenceMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceMap")
            .field("property", &self.property)
            .field("prefix", &self.prefix)
            .field("valid", &self.access.is_ok())
            .finish()
    }
}

/// Mapping declaration for one target type, under construction.
pub struct ClassMap<T: Record> {
    info: Arc<TypeInfo<T>>,
    members: Vec<MemberMap>,
    parameters: Vec<ParameterMap>,
    references: Vec<ReferenceMap<T>>,
    order: Vec<Slot>,
    constructor: ConstructorChoice,
}

impl<T: Record> ClassMap<T> {
    /// Creates an empty class map for `T`.
    #[must_use]
    pub fn new() -> Self {
        ClassMap {
            info: type_info::<T>(),
            members: Vec::new(),
            parameters: Vec::new(),
            references: Vec::new(),
            order: Vec::new(),
            constructor: ConstructorChoice::Auto,
        }
    }

    /// Creates a class map populated by [`ClassMap::auto_map`].
    #[must_use]
    pub fn auto() -> Self {
        let mut map = Self::new();
        map.auto_map();
        map
    }

    #[must_use]
    pub fn type_info(&self) -> &TypeInfo<T> {
        &self.info
    }

    /// Maps a property, named after itself until configured otherwise.
    ///
    /// Mapping the same property again returns the existing map.
    pub fn map(&mut self, property: &str) -> &mut MemberMap {
        let index = match self.members.iter().position(|m| m.property() == property) {
            Some(index) => index,
            None => {
                self.members.push(MemberMap::new(property));
                self.order.push(Slot::Member(self.members.len() - 1));
                self.members.len() - 1
            }
        };
        &mut self.members[index]
    }

    /// Maps a constructor parameter by name. The constructor is selected at build
    /// time as the first one declaring every mapped parameter name.
    pub fn parameter(&mut self, name: &str) -> &mut ParameterMap {
        self.push_parameter(ParameterMap::named(name))
    }

    /// Maps a parameter, by name, of an explicitly supplied constructor.
    pub fn parameter_in(&mut self, constructor: ConstructorHandle, name: &str) -> &mut ParameterMap {
        self.push_parameter(ParameterMap::named_in(constructor, name))
    }

    /// Maps a parameter, by position, of an explicitly supplied constructor.
    pub fn parameter_at(&mut self, constructor: ConstructorHandle, position: usize) -> &mut ParameterMap {
        let name = self
            .info
            .constructor(constructor)
            .and_then(|ctor| ctor.parameters().get(position))
            .map_or_else(|| format!("#{}", position), |p| p.name().to_string());
        self.push_parameter(ParameterMap::at(constructor, position, &name))
    }

    fn push_parameter(&mut self, map: ParameterMap) -> &mut ParameterMap {
        self.parameters.push(map);
        let index = self.parameters.len() - 1;
        self.order.push(Slot::Parameter(index));
        &mut self.parameters[index]
    }

    /// Drives `constructor` regardless of the parameter maps' names.
    pub fn use_constructor(&mut self, constructor: ConstructorHandle) -> &mut Self {
        self.constructor = ConstructorChoice::Explicit(constructor);
        self
    }

    /// Drives the constructor with the most parameters.
    pub fn use_most_parameters(&mut self) -> &mut Self {
        self.constructor = ConstructorChoice::MostParameters;
        self
    }

    /// Maps a property holding a nested record through the nested record's class map.
    ///
    /// On read the nested record is materialized first and then assigned with
    /// `set`; on write its fields are emitted in place through `get`.
    pub fn reference<U, G, S>(&mut self, property: &str, child: ClassMap<U>, get: G, set: S) -> &mut ReferenceMap<T>
    where
        U: Record,
        G: Fn(&T) -> &U + Send + Sync + 'static,
        S: Fn(&mut T, U) + Send + Sync + 'static,
    {
        let access = child.build().map(|mapping| {
            Arc::new(TypedReference {
                mapping,
                get: Arc::new(get),
                set: Arc::new(set),
            }) as Arc<dyn ReferenceAccess<T>>
        });
        self.references.push(ReferenceMap {
            property: property.to_string(),
            prefix: String::new(),
            access,
        });
        let index = self.references.len() - 1;
        self.order.push(Slot::Reference(index));
        &mut self.references[index]
    }

    /// Maps every property of the type by its own name.
    ///
    /// If the type has no parameterless constructor, the constructor with the
    /// most parameters is mapped too, each parameter using the name of the
    /// property it mirrors (or its own name when none does). Read-only
    /// properties no mapped parameter mirrors are left out.
    pub fn auto_map(&mut self) -> &mut Self {
        let info = self.info.clone();
        let mut mirrored = HashSet::new();
        if constructor::parameterless(&info).is_none() {
            if let Ok(handle) = constructor::most_parameters(&info) {
                self.constructor = ConstructorChoice::Explicit(handle);
                let parameters = info
                    .constructor(handle)
                    .map(|ctor| ctor.parameters().to_vec())
                    .unwrap_or_default();
                for parameter in parameters {
                    let mirror = info.mirror_property(parameter.name());
                    let header = mirror
                        .and_then(|index| info.property_at(index))
                        .map_or_else(|| parameter.name().to_string(), |p| p.name().to_string());
                    mirrored.extend(mirror);
                    self.parameter_in(handle, parameter.name()).name(&header);
                }
            }
        }
        for (index, property) in info.properties().enumerate() {
            let taken = self.references.iter().any(|r| r.property == property.name());
            if !taken && (property.is_writable() || mirrored.contains(&index)) {
                self.map(property.name());
            }
        }
        self
    }

    #[must_use]
    pub fn member_maps(&self) -> &[MemberMap] {
        &self.members
    }

    #[must_use]
    pub fn parameter_maps(&self) -> &[ParameterMap] {
        &self.parameters
    }

    #[must_use]
    pub fn reference_maps(&self) -> &[ReferenceMap<T>] {
        &self.references
    }

    /// Validates the declaration and seals it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when a mapped property does not exist,
    /// two maps target the same slot, a spec has neither names nor index, no
    /// constructor satisfies the parameter maps, or a read-only property is
    /// mapped without a constructor parameter populating it.
    pub fn build(self) -> Result<Mapping<T>> {
        let info = self.info.clone();
        let type_name = info.name().to_string();
        let config = |msg: String| Error::configuration(&type_name, msg);

        let mut claimed = HashSet::new();
        let mut members = Vec::with_capacity(self.members.len());
        for map in self.members {
            let property = info
                .property_index(map.property())
                .ok_or_else(|| config(format!("property `{}` does not exist", map.property())))?;
            if !claimed.insert(map.property().to_string()) {
                return Err(config(format!("property `{}` is mapped twice", map.property())));
            }
            if !map.is_ignored() && map.constant_value().is_none() && !map.data().spec().is_valid() {
                return Err(config(format!(
                    "map for `{}` has neither a name nor an index",
                    map.property()
                )));
            }
            members.push(BoundMember {
                map,
                property,
                read: true,
            });
        }

        let mut references = Vec::with_capacity(self.references.len());
        for reference in self.references {
            if !claimed.insert(reference.property.clone()) {
                return Err(config(format!(
                    "property `{}` is mapped twice",
                    reference.property
                )));
            }
            let access = reference.access.map_err(|e| {
                config(format!("reference `{}` is invalid: {}", reference.property, e))
            })?;
            references.push(BoundReference {
                property: reference.property,
                prefix: reference.prefix,
                access,
            });
        }

        let handle = select_constructor(&info, self.constructor, &self.parameters)?;
        let ctor = info
            .constructor(handle)
            .ok_or_else(|| config(format!("constructor #{} does not exist", handle.index())))?;

        let mut positions = HashSet::new();
        let mut parameters = Vec::with_capacity(self.parameters.len());
        for map in self.parameters {
            let position = match map.target() {
                ParameterTarget::Named(name) => ctor.parameter_position(name),
                ParameterTarget::NamedIn(other, name) => {
                    if *other != handle {
                        return Err(config(format!(
                            "parameter `{}` belongs to constructor #{} but #{} is used",
                            name,
                            other.index(),
                            handle.index()
                        )));
                    }
                    ctor.parameter_position(name)
                }
                ParameterTarget::At(other, position) => {
                    if *other != handle {
                        return Err(config(format!(
                            "parameter #{} belongs to constructor #{} but #{} is used",
                            position,
                            other.index(),
                            handle.index()
                        )));
                    }
                    (*position < ctor.parameters().len()).then_some(*position)
                }
            }
            .ok_or_else(|| {
                config(format!(
                    "constructor #{} has no parameter {:?}",
                    handle.index(),
                    map.target()
                ))
            })?;
            if !positions.insert(position) {
                return Err(config(format!(
                    "constructor parameter `{}` is mapped twice",
                    ctor.parameters()[position].name()
                )));
            }
            if !map.data().spec().is_valid() {
                return Err(config(format!(
                    "map for parameter `{}` has neither a name nor an index",
                    ctor.parameters()[position].name()
                )));
            }
            let name = ctor.parameters()[position].name().to_string();
            parameters.push(BoundParameter {
                mirror: info.mirror_property(&name),
                reference: MemberReference::Parameter {
                    constructor: handle,
                    position,
                    name,
                },
                position,
                map,
            });
        }

        for member in &mut members {
            if member.map.is_ignored() {
                continue;
            }
            let writable = info
                .property_at(member.property)
                .is_some_and(|p| p.is_writable());
            if writable {
                continue;
            }
            if parameters.iter().any(|p| p.mirror == Some(member.property)) {
                member.read = false;
            } else {
                return Err(config(format!(
                    "property `{}` is read-only and no constructor parameter populates it",
                    member.map.property()
                )));
            }
        }

        let write_plan = plan_writes(&members, &parameters, &references, &self.order);
        log::debug!(
            "built mapping for `{}`: {} member(s), {} parameter(s), {} reference(s), constructor #{}",
            type_name,
            members.len(),
            parameters.len(),
            references.len(),
            handle.index()
        );

        Ok(Mapping {
            info,
            constructor: handle,
            members,
            parameters,
            references,
            order: self.order,
            write_plan,
        })
    }
}

impl<T: Record> Default for ClassMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> fmt::Debug for ClassMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassMap")
            .field("type", &self.info.name())
            .field("members", &self.members)
            .field("parameters", &self.parameters)
            .field("references", &self.references)
            .finish()
    }
}

fn select_constructor<T>(
    info: &TypeInfo<T>,
    choice: ConstructorChoice,
    parameters: &[ParameterMap],
) -> Result<ConstructorHandle> {
    let explicit = parameters.iter().find_map(ParameterMap::constructor);
    match (choice, explicit) {
        (ConstructorChoice::Explicit(handle), _) | (ConstructorChoice::Auto, Some(handle)) => {
            constructor::resolve_constructor(info, ConstructorHint::Explicit(handle))
        }
        (ConstructorChoice::MostParameters, _) => {
            constructor::resolve_constructor(info, ConstructorHint::MostParameters)
        }
        (ConstructorChoice::Auto, None) if !parameters.is_empty() => {
            let names: Vec<&str> = parameters
                .iter()
                .filter_map(ParameterMap::parameter_name)
                .collect();
            constructor::resolve_constructor(info, ConstructorHint::ParameterNames(&names))
        }
        (ConstructorChoice::Auto, None) => constructor::parameterless(info).ok_or_else(|| {
            Error::configuration(
                info.name(),
                "type has no parameterless constructor; map its constructor parameters",
            )
        }),
    }
}

fn plan_writes<T>(
    members: &[BoundMember],
    parameters: &[BoundParameter],
    references: &[BoundReference<T>],
    order: &[Slot],
) -> std::result::Result<Vec<Slot>, String> {
    let mut plan = Vec::with_capacity(order.len());
    let mut unwritable = Vec::new();
    for slot in order {
        match *slot {
            Slot::Member(index) => {
                // Members populated through the constructor are written by their parameter.
                let member = &members[index];
                if !member.map.is_ignored() && member.read {
                    plan.push(*slot);
                }
            }
            Slot::Parameter(index) => {
                let parameter = &parameters[index];
                match parameter.mirror {
                    Some(property) => {
                        let same_column = members.iter().any(|m| {
                            m.property == property
                                && m.read
                                && !m.map.is_ignored()
                                && m.map.constant_value().is_none()
                                && m.map.data().spec() == parameter.map.data().spec()
                        });
                        if !same_column {
                            plan.push(*slot);
                        }
                    }
                    None => unwritable.push(parameter.reference.name().to_string()),
                }
            }
            Slot::Reference(index) => match references[index].access.check_writable() {
                Ok(()) => plan.push(*slot),
                Err(e) => unwritable.push(format!("{} ({})", references[index].property, e)),
            },
        }
    }
    if unwritable.is_empty() {
        Ok(plan)
    } else {
        Err(format!(
            "constructor parameter(s) without a mirroring property cannot be written: {}",
            unwritable.join(", ")
        ))
    }
}

pub(crate) struct BoundMember {
    pub(crate) map: MemberMap,
    pub(crate) property: usize,
    /// `false` for read-only properties populated through the constructor.
    pub(crate) read: bool,
}

pub(crate) struct BoundParameter {
    pub(crate) map: ParameterMap,
    pub(crate) reference: MemberReference,
    pub(crate) position: usize,
    pub(crate) mirror: Option<usize>,
}

pub(crate) struct BoundReference<T> {
    pub(crate) property: String,
    pub(crate) prefix: String,
    pub(crate) access: Arc<dyn ReferenceAccess<T>>,
}

/// A sealed class map: validated, constructor selected, immutable.
pub struct Mapping<T> {
    pub(crate) info: Arc<TypeInfo<T>>,
    pub(crate) constructor: ConstructorHandle,
    pub(crate) members: Vec<BoundMember>,
    pub(crate) parameters: Vec<BoundParameter>,
    pub(crate) references: Vec<BoundReference<T>>,
    order: Vec<Slot>,
    write_plan: std::result::Result<Vec<Slot>, String>,
}

impl<T: Record> Mapping<T> {
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.info.name()
    }

    #[must_use]
    pub fn type_info(&self) -> &TypeInfo<T> {
        &self.info
    }

    /// The constructor this mapping drives.
    #[must_use]
    pub const fn constructor(&self) -> ConstructorHandle {
        self.constructor
    }

    pub fn member_maps(&self) -> impl Iterator<Item = &MemberMap> {
        self.members.iter().map(|m| &m.map)
    }

    pub fn parameter_maps(&self) -> impl Iterator<Item = &ParameterMap> {
        self.parameters.iter().map(|p| &p.map)
    }

    /// The resolved constructor-parameter reference of every parameter map, in declaration order.
    #[must_use]
    pub fn parameter_references(&self) -> Vec<&MemberReference> {
        self.parameters.iter().map(|p| &p.reference).collect()
    }

    /// Every member and parameter reference, in declaration order.
    #[must_use]
    pub fn member_references(&self) -> Vec<MemberReference> {
        self.order
            .iter()
            .filter_map(|slot| match *slot {
                Slot::Member(index) => Some(self.members[index].map.reference()),
                Slot::Parameter(index) => Some(self.parameters[index].reference.clone()),
                Slot::Reference(_) => None,
            })
            .collect()
    }

    /// Returns `true` if every mapped value can be read back from an instance.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.write_plan.is_ok()
    }

    /// Fails if the mapping cannot be used for writing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] naming the parameters with no mirroring property.
    pub fn check_writable(&self) -> Result<()> {
        match &self.write_plan {
            Ok(_) => Ok(()),
            Err(msg) => Err(Error::configuration(self.type_name(), msg)),
        }
    }

    pub(crate) fn write_plan(&self) -> Result<&[Slot]> {
        match &self.write_plan {
            Ok(plan) => Ok(plan),
            Err(msg) => Err(Error::configuration(self.type_name(), msg)),
        }
    }

    /// The header row written for this mapping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the mapping is not writable.
    pub fn header_names(&self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        self.header_into("", &mut out)?;
        Ok(out)
    }

    pub(crate) fn header_into(&self, prefix: &str, out: &mut Vec<String>) -> Result<()> {
        for slot in self.write_plan()? {
            match *slot {
                Slot::Member(index) => {
                    let member = &self.members[index];
                    let name = member.map.data().header_name(member.map.property());
                    out.push(format!("{}{}", prefix, name));
                }
                Slot::Parameter(index) => {
                    let parameter = &self.parameters[index];
                    let name = parameter
                        .map
                        .data()
                        .header_name(parameter.reference.name());
                    out.push(format!("{}{}", prefix, name));
                }
                Slot::Reference(index) => {
                    let reference = &self.references[index];
                    let nested = format!("{}{}", prefix, reference.prefix);
                    reference.access.header(&nested, out)?;
                }
            }
        }
        Ok(())
    }
}

impl<T: Record> fmt::Debug for Mapping<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("type", &self.info.name())
            .field("constructor", &self.constructor)
            .field("references", &self.member_references())
            .field("writable", &self.is_writable())
            .finish()
    }
}
