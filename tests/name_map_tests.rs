//! Constructor-parameter mapping by name: reading, writing and build-time checks.

use csv_classmap::{
    from_str_with_context, to_string_with_context, type_info, ClassMap, ConstructorInfo, Context,
    CsvOptions, Error, LineTerminator, MemoryRows, ParameterInfo, PropertyInfo, Reader, Record,
    TypeInfo,
};

#[derive(Debug, Clone, PartialEq)]
struct Foo {
    id: i32,
    name: String,
}

impl Record for Foo {
    fn describe() -> TypeInfo<Self> {
        TypeInfo::new("Foo")
            .with_constructor(ConstructorInfo::new(
                vec![
                    ParameterInfo::of::<i32>("id"),
                    ParameterInfo::of::<String>("name"),
                ],
                |args| {
                    Ok(Foo {
                        id: args.take(0)?,
                        name: args.take(1)?,
                    })
                },
            ))
            .with_property(PropertyInfo::read_only("Id", |f: &Foo| f.id))
            .with_property(PropertyInfo::read_only("Name", |f: &Foo| f.name.clone()))
    }
}

fn foo_map() -> ClassMap<Foo> {
    let mut map = ClassMap::new();
    map.parameter("id").name("Id");
    map.parameter("name").name("Name");
    map
}

fn context_with(options: CsvOptions, map: ClassMap<Foo>) -> Context {
    let mut context = Context::new(options);
    context.register_class_map(map).unwrap();
    context
}

fn one() -> Foo {
    Foo {
        id: 1,
        name: "one".to_string(),
    }
}

#[test]
fn test_read_with_parameter_names() {
    let context = context_with(CsvOptions::default(), foo_map());
    let records: Vec<Foo> = from_str_with_context("Id,Name\r\n1,one\r\n", context).unwrap();
    assert_eq!(records, vec![one()]);
}

#[test]
fn test_read_from_rows() {
    let context = context_with(CsvOptions::default(), foo_map());
    let rows = MemoryRows::from_rows([["Id", "Name"], ["1", "one"]]);
    let mut reader = Reader::new(rows, context);
    let records: Vec<Foo> = reader.get_records().collect::<Result<_, _>>().unwrap();
    assert_eq!(records, vec![one()]);
    assert_eq!(reader.header().unwrap(), ["Id", "Name"]);
}

#[test]
fn test_headerless_name_map_fails_before_reading() {
    let context = context_with(CsvOptions::new().with_has_header(false), foo_map());
    let rows = MemoryRows::from_rows([["1", "one"]]);
    let mut reader = Reader::new(rows, context);

    let err = reader.get_record::<Foo>().unwrap_err();
    match err {
        Error::HeaderResolution { ref missing, .. } => assert_eq!(missing, &["Id", "Name"]),
        other => panic!("Expected header resolution error, got {:?}", other),
    }
    assert_eq!(reader.row(), 0);
    assert_eq!(reader.into_inner().len(), 1);
}

#[test]
fn test_write_with_parameter_names() {
    let context = context_with(CsvOptions::default(), foo_map());
    let csv = to_string_with_context(&[one()], context).unwrap();
    assert_eq!(csv, "Id,Name\r\n1,one\r\n");
}

#[test]
fn test_write_uses_configured_terminator() {
    let options = CsvOptions::new().with_terminator(LineTerminator::Lf);
    let context = context_with(options, foo_map());
    let csv = to_string_with_context(&[one()], context).unwrap();
    assert_eq!(csv, "Id,Name\n1,one\n");
}

#[test]
fn test_explicit_constructor_matches_name_lookup() {
    let info = type_info::<Foo>();
    let handle = info.constructor_handle(0).unwrap();

    let mut positional = ClassMap::<Foo>::new();
    positional.parameter_at(handle, 0).name("Id");
    positional.parameter_at(handle, 1).name("Name");
    let positional = positional.build().unwrap();

    let mut by_name_in = ClassMap::<Foo>::new();
    by_name_in.parameter_in(handle, "id").name("Id");
    by_name_in.parameter_in(handle, "name").name("Name");
    let by_name_in = by_name_in.build().unwrap();

    let by_name = foo_map().build().unwrap();

    assert_eq!(positional.constructor(), by_name.constructor());
    assert_eq!(positional.parameter_references(), by_name.parameter_references());
    assert_eq!(by_name_in.parameter_references(), by_name.parameter_references());
    let names = |mapping: &csv_classmap::Mapping<Foo>| -> Vec<Vec<String>> {
        mapping
            .parameter_maps()
            .map(|p| p.data().names().to_vec())
            .collect()
    };
    assert_eq!(names(&positional), names(&by_name));
}

#[test]
fn test_explicit_constructor_reads_same_records() {
    let info = type_info::<Foo>();
    let handle = info.constructor_handle(0).unwrap();
    let mut map = ClassMap::<Foo>::new();
    map.parameter_at(handle, 0).name("Id");
    map.parameter_at(handle, 1).name("Name");

    let context = context_with(CsvOptions::default(), map);
    let records: Vec<Foo> = from_str_with_context("Name,Id\ntwo,2\n", context).unwrap();
    assert_eq!(
        records,
        vec![Foo {
            id: 2,
            name: "two".to_string()
        }]
    );
}

#[test]
fn test_unknown_parameter_names_fail_at_registration() {
    let mut map = ClassMap::<Foo>::new();
    map.parameter("foo");
    map.parameter("bar");
    let mut context = Context::default();
    let err = context.register_class_map(map).unwrap_err();
    assert!(err.is_configuration());
    assert!(!context.has_class_map::<Foo>());
}

#[test]
fn test_member_maps_mirrored_by_parameters() {
    let mut map = ClassMap::<Foo>::new();
    map.map("Id");
    map.map("Name");
    map.parameter("id").name("Id");
    map.parameter("name").name("Name");
    let context = context_with(CsvOptions::default(), map);

    let records: Vec<Foo> = from_str_with_context("Id,Name\r\n1,one\r\n", context.clone()).unwrap();
    assert_eq!(records, vec![one()]);
    let csv = to_string_with_context(&records, context).unwrap();
    assert_eq!(csv, "Id,Name\r\n1,one\r\n");
}

#[test]
fn test_auto_mapped_constructor_type() {
    let records: Vec<Foo> = csv_classmap::from_str("Name,Id\none,1\n").unwrap();
    assert_eq!(records, vec![one()]);
    assert_eq!(csv_classmap::to_string(&records).unwrap(), "Id,Name\r\n1,one\r\n");
}

#[test]
fn test_renamed_constructor_property_round_trips() {
    let mut map = ClassMap::<Foo>::new();
    map.map("Id").name("Key");
    map.parameter("id").name("Id");
    map.parameter("name").name("Name");
    let context = context_with(CsvOptions::default(), map);

    let written = vec![Foo {
        id: 7,
        name: "x".to_string(),
    }];
    let csv = to_string_with_context(&written, context.clone()).unwrap();
    assert_eq!(csv, "Id,Name\r\n7,x\r\n");
    let back: Vec<Foo> = from_str_with_context(&csv, context).unwrap();
    assert_eq!(back, written);
}
