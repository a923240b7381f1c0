//! Header resolution: binding every map of a sealed [`Mapping`] to a column.
//!
//! For each map, in declaration order:
//!
//! 1. a fixed index binds unconditionally;
//! 2. otherwise each candidate name (primary first, then aliases) is tried
//!    against the header, honoring the case policy, header trimming and any
//!    reference prefix; the `name_index`-th occurrence wins;
//! 3. a required map matching nothing is recorded as missing.
//!
//! Resolution runs once per document and type. Every missing header across the
//! whole map tree is reported together in one [`Error::HeaderResolution`].

use crate::class_map::Mapping;
use crate::describe::Record;
use crate::member::MapData;
use crate::options::CsvOptions;
use crate::{Error, Result};

/// The column a single map is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding {
    Column(usize),
    /// Nothing matched; the map is optional, constant, ignored or not read.
    Missing,
}

impl Binding {
    #[must_use]
    pub const fn column(&self) -> Option<usize> {
        match self {
            Binding::Column(index) => Some(*index),
            Binding::Missing => None,
        }
    }
}

/// Column bindings of one mapping, parallel to its maps in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedBinding {
    pub(crate) members: Vec<Binding>,
    pub(crate) parameters: Vec<Binding>,
    pub(crate) references: Vec<ResolvedBinding>,
}

impl ResolvedBinding {
    /// Bindings of the member maps.
    #[must_use]
    pub fn members(&self) -> &[Binding] {
        &self.members
    }

    /// Bindings of the parameter maps.
    #[must_use]
    pub fn parameters(&self) -> &[Binding] {
        &self.parameters
    }

    /// Bindings of the nested reference maps.
    #[must_use]
    pub fn references(&self) -> &[ResolvedBinding] {
        &self.references
    }
}

/// Resolves `mapping` against `header` (`None` when the document has no header row).
///
/// # Errors
///
/// Returns [`Error::HeaderResolution`] listing every required name no header
/// cell matched.
pub fn resolve<T: Record>(
    mapping: &Mapping<T>,
    header: Option<&[String]>,
    options: &CsvOptions,
) -> Result<ResolvedBinding> {
    let normalized = header.map(|cells| normalize_header(cells, options));
    let mut missing = Vec::new();
    let binding = resolve_into(mapping, normalized.as_deref(), options, "", &mut missing);
    if !missing.is_empty() {
        log::debug!(
            "header resolution for `{}` failed, missing [{}]",
            mapping.type_name(),
            missing.join(", ")
        );
        return Err(Error::header_resolution(mapping.type_name(), missing));
    }
    log::debug!("resolved header for `{}`: {:?}", mapping.type_name(), binding);
    Ok(binding)
}

/// Applies header trimming and the case policy to every header cell.
fn normalize_header(cells: &[String], options: &CsvOptions) -> Vec<String> {
    cells
        .iter()
        .map(|cell| {
            options
                .header_match
                .normalize(options.prepare_header(cell))
                .into_owned()
        })
        .collect()
}

/// `header` must already be normalized by [`normalize_header`].
pub(crate) fn resolve_into<T: Record>(
    mapping: &Mapping<T>,
    header: Option<&[String]>,
    options: &CsvOptions,
    prefix: &str,
    missing: &mut Vec<String>,
) -> ResolvedBinding {
    let members = mapping
        .members
        .iter()
        .map(|member| {
            if member.map.is_ignored() || member.map.constant_value().is_some() {
                return Binding::Missing;
            }
            let data = member.map.data();
            let binding = bind(data, header, options, prefix);
            if binding == Binding::Missing && member.read && !data.is_optional() {
                missing.push(missing_name(data, member.map.property(), prefix));
            }
            binding
        })
        .collect();

    let parameters = mapping
        .parameters
        .iter()
        .map(|parameter| {
            let data = parameter.map.data();
            let binding = bind(data, header, options, prefix);
            if binding == Binding::Missing && !data.is_optional() {
                missing.push(missing_name(data, parameter.reference.name(), prefix));
            }
            binding
        })
        .collect();

    let references = mapping
        .references
        .iter()
        .map(|reference| {
            let nested = format!("{}{}", prefix, reference.prefix);
            reference.access.resolve(header, options, &nested, missing)
        })
        .collect();

    ResolvedBinding {
        members,
        parameters,
        references,
    }
}

fn bind(data: &MapData, header: Option<&[String]>, options: &CsvOptions, prefix: &str) -> Binding {
    if let Some(index) = data.spec().index() {
        return Binding::Column(index);
    }
    let Some(header) = header else {
        return Binding::Missing;
    };
    let name_index = data.spec().name_index();
    for name in data.names() {
        let candidate = format!("{}{}", prefix, name);
        let candidate = options.header_match.normalize(&candidate);
        let found = header
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == *candidate)
            .nth(name_index);
        if let Some((column, _)) = found {
            return Binding::Column(column);
        }
    }
    Binding::Missing
}

fn missing_name(data: &MapData, fallback: &str, prefix: &str) -> String {
    format!("{}{}", prefix, data.header_name(fallback))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_map::ClassMap;
    use crate::describe::{ConstructorInfo, PropertyInfo, TypeInfo};
    use crate::options::HeaderMatch;

    #[derive(Debug, Default)]
    struct Row {
        id: i32,
        name: String,
        note: String,
    }

    impl Record for Row {
        fn describe() -> TypeInfo<Self> {
            TypeInfo::new("Row")
                .with_constructor(ConstructorInfo::default_constructor())
                .with_property(PropertyInfo::read_write("Id", |r: &Row| r.id, |r, v| r.id = v))
                .with_property(PropertyInfo::read_write(
                    "Name",
                    |r: &Row| r.name.clone(),
                    |r, v| r.name = v,
                ))
                .with_property(PropertyInfo::read_write(
                    "Note",
                    |r: &Row| r.note.clone(),
                    |r, v| r.note = v,
                ))
        }
    }

    fn header(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_binds_by_name_in_any_order() {
        let mapping = ClassMap::<Row>::auto().build().unwrap();
        let header = header(&["Note", "Id", "Name"]);
        let binding = resolve(&mapping, Some(&header), &CsvOptions::default()).unwrap();
        assert_eq!(
            binding.members(),
            [Binding::Column(1), Binding::Column(2), Binding::Column(0)]
        );
    }

    #[test]
    fn test_alias_and_name_index() {
        let mut map = ClassMap::<Row>::new();
        map.map("Id").name("Key").alias("ID");
        map.map("Name").name("Value").name_index(1);
        let mapping = map.build().unwrap();
        let header = header(&["Value", "ID", "Value"]);
        let binding = resolve(&mapping, Some(&header), &CsvOptions::default()).unwrap();
        assert_eq!(binding.members(), [Binding::Column(1), Binding::Column(2)]);
    }

    #[test]
    fn test_reports_every_missing_header() {
        let mapping = ClassMap::<Row>::auto().build().unwrap();
        let header = header(&["Name"]);
        match resolve(&mapping, Some(&header), &CsvOptions::default()) {
            Err(Error::HeaderResolution { missing, .. }) => assert_eq!(missing, ["Id", "Note"]),
            other => panic!("Expected header resolution error, got {:?}", other),
        }
    }

    #[test]
    fn test_optional_and_constant_need_no_column() {
        let mut map = ClassMap::<Row>::new();
        map.map("Id");
        map.map("Name").optional();
        map.map("Note").constant("fixed");
        let mapping = map.build().unwrap();
        let header = header(&["Id"]);
        let binding = resolve(&mapping, Some(&header), &CsvOptions::default()).unwrap();
        assert_eq!(
            binding.members(),
            [Binding::Column(0), Binding::Missing, Binding::Missing]
        );
    }

    #[test]
    fn test_index_binds_without_header() {
        let mut map = ClassMap::<Row>::new();
        map.map("Id").index(1);
        let mapping = map.build().unwrap();
        let binding = resolve(&mapping, None, &CsvOptions::default()).unwrap();
        assert_eq!(binding.members(), [Binding::Column(1)]);
    }

    #[test]
    fn test_no_header_fails_for_names() {
        let mut map = ClassMap::<Row>::new();
        map.map("Id");
        let mapping = map.build().unwrap();
        let err = resolve(&mapping, None, &CsvOptions::default()).unwrap_err();
        assert!(err.is_header_resolution());
    }

    #[test]
    fn test_case_policy_and_trimming() {
        let mapping = ClassMap::<Row>::auto().build().unwrap();
        let header = header(&[" id ", "NAME", "note"]);
        assert!(resolve(&mapping, Some(&header), &CsvOptions::default()).is_err());

        let options = CsvOptions::new()
            .with_header_match(HeaderMatch::CaseInsensitive)
            .with_trim_headers(true);
        let binding = resolve(&mapping, Some(&header), &options).unwrap();
        assert_eq!(binding.members()[0].column(), Some(0));
    }

    #[test]
    fn test_normalized_header_keeps_occurrence_order() {
        let mut map = ClassMap::<Row>::new();
        map.map("Name").name("Value").name_index(1);
        map.map("Note").name("État");
        let mapping = map.build().unwrap();
        let header = header(&["VALUE", " value", "état"]);
        let options = CsvOptions::new()
            .with_header_match(HeaderMatch::CaseInsensitive)
            .with_trim_headers(true);
        let binding = resolve(&mapping, Some(&header), &options).unwrap();
        assert_eq!(binding.members(), [Binding::Column(1), Binding::Column(2)]);
    }

    #[test]
    fn test_normalize_header_applies_trim_and_case() {
        let options = CsvOptions::new()
            .with_header_match(HeaderMatch::CaseInsensitive)
            .with_trim_headers(true);
        let cells = header(&[" Id ", "NAME"]);
        assert_eq!(normalize_header(&cells, &options), ["id", "name"]);
        assert_eq!(normalize_header(&cells, &CsvOptions::default()), [" Id ", "NAME"]);
    }
}
