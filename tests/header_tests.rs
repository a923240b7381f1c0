use csv_classmap::{
    from_str_with_context, impl_record, resolve, to_string_with_context, Binding, ClassMap,
    ConstructorInfo, Context, CsvOptions, Error, HeaderMatch, ParameterInfo, Record, TypeInfo,
};

#[derive(Debug, Default, Clone, PartialEq)]
struct Contact {
    id: i32,
    name: String,
    email: Option<String>,
}

impl_record!(Contact {
    id: i32 => "Id",
    name: String => "Name",
    email: Option<String> => "Email",
});

#[derive(Debug, Default, Clone, PartialEq)]
struct Address {
    street: String,
    city: String,
}

impl_record!(Address {
    street: String => "Street",
    city: String => "City",
});

#[derive(Debug, Default, Clone, PartialEq)]
struct Customer {
    id: i32,
    home: Address,
    work: Address,
}

impl_record!(Customer { id: i32 => "Id" });

/// Built from a code that no property exposes.
#[derive(Debug, Default, Clone, PartialEq)]
struct Badge {
    code: String,
}

impl Record for Badge {
    fn describe() -> TypeInfo<Self> {
        TypeInfo::new("Badge").with_constructor(ConstructorInfo::new(
            vec![ParameterInfo::of::<String>("code")],
            |args| Ok(Badge { code: args.take(0)? }),
        ))
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Holder {
    id: i32,
    badge: Badge,
}

impl_record!(Holder { id: i32 => "Id" });

fn holder_context() -> Context {
    let mut map = ClassMap::<Holder>::new();
    map.map("Id");
    map.reference("Badge", ClassMap::<Badge>::auto(), |h: &Holder| &h.badge, |h, b| h.badge = b)
        .prefix("Badge.");
    let mut context = Context::default();
    context.register_class_map(map).unwrap();
    context
}

fn header(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

fn read<T: csv_classmap::Record>(input: &str, map: ClassMap<T>, options: CsvOptions) -> csv_classmap::Result<Vec<T>> {
    let mut context = Context::new(options);
    context.register_class_map(map)?;
    from_str_with_context(input, context)
}

fn customer_map() -> ClassMap<Customer> {
    let mut map = ClassMap::<Customer>::new();
    map.map("Id");
    map.reference("Home", ClassMap::<Address>::auto(), |c: &Customer| &c.home, |c, a| c.home = a)
        .prefix("Home.");
    map.reference("Work", ClassMap::<Address>::auto(), |c: &Customer| &c.work, |c, a| c.work = a)
        .prefix("Work.");
    map
}

#[test]
fn test_aliases_tried_in_order() {
    let mut map = ClassMap::<Contact>::new();
    map.map("Id").name("Id").alias("Identifier").alias("Key");
    map.map("Name");
    let records = read("Key,Identifier,Name\n1,2,ann\n", map, CsvOptions::default()).unwrap();
    assert_eq!(records[0].id, 2);
}

#[test]
fn test_name_index_picks_repeated_header() {
    let mut map = ClassMap::<Contact>::new();
    map.map("Id");
    map.map("Name").name("Name").name_index(0);
    map.map("Email").name("Name").name_index(1);
    let records = read("Id,Name,Name\n1,ann,ann@example.com\n", map, CsvOptions::default()).unwrap();
    assert_eq!(records[0].name, "ann");
    assert_eq!(records[0].email.as_deref(), Some("ann@example.com"));
}

#[test]
fn test_index_wins_over_header_content() {
    let mut map = ClassMap::<Contact>::new();
    map.map("Id").index(2);
    map.map("Name").index(0);
    let records = read("Id,Name,Other\nann,x,5\n", map, CsvOptions::default()).unwrap();
    assert_eq!(records[0].id, 5);
    assert_eq!(records[0].name, "ann");
}

#[test]
fn test_index_binding_without_header() {
    let mut map = ClassMap::<Contact>::new();
    map.map("Id").index(0);
    map.map("Name").index(1);
    let options = CsvOptions::new().with_has_header(false);
    let records = read("1,ann\n2,bob\n", map, options).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].name, "bob");
}

#[test]
fn test_case_insensitive_matching() {
    let options = CsvOptions::new().with_header_match(HeaderMatch::CaseInsensitive);
    let records: Vec<Contact> = read("ID,NAME,EMAIL\n1,ann,\n", ClassMap::auto(), options).unwrap();
    assert_eq!(
        records,
        vec![Contact {
            id: 1,
            name: "ann".to_string(),
            email: None
        }]
    );
}

#[test]
fn test_trimmed_headers_and_fields() {
    let options = CsvOptions::new().with_trim_headers(true).with_trim_fields(true);
    let records: Vec<Contact> = read(" Id , Name ,Email\n 7 , ann ,\n", ClassMap::auto(), options).unwrap();
    assert_eq!(records[0].id, 7);
    assert_eq!(records[0].name, "ann");
}

#[test]
fn test_every_missing_header_reported() {
    let err = read::<Contact>("Other\nx\n", ClassMap::auto(), CsvOptions::default()).unwrap_err();
    match err {
        Error::HeaderResolution { type_name, missing } => {
            assert_eq!(type_name, "Contact");
            assert_eq!(missing, ["Id", "Name", "Email"]);
        }
        other => panic!("Expected header resolution error, got {:?}", other),
    }
}

#[test]
fn test_optional_column_may_be_absent() {
    let mut map = ClassMap::<Contact>::new();
    map.map("Id");
    map.map("Name");
    map.map("Email").optional().default("none@example.com");
    let records = read("Id,Name\n1,ann\n", map, CsvOptions::default()).unwrap();
    assert_eq!(records[0].email.as_deref(), Some("none@example.com"));
}

#[test]
fn test_reference_prefixes() {
    let records = read(
        "Id,Home.Street,Home.City,Work.Street,Work.City\n1,Elm,Oslo,Main,Bergen\n",
        customer_map(),
        CsvOptions::default(),
    )
    .unwrap();
    assert_eq!(records[0].home.city, "Oslo");
    assert_eq!(records[0].work.street, "Main");
}

#[test]
fn test_reference_missing_headers_are_prefixed() {
    let err = read("Id,Home.Street,Home.City\n1,Elm,Oslo\n", customer_map(), CsvOptions::default())
        .unwrap_err();
    match err {
        Error::HeaderResolution { missing, .. } => {
            assert_eq!(missing, ["Work.Street", "Work.City"]);
        }
        other => panic!("Expected header resolution error, got {:?}", other),
    }
}

#[test]
fn test_resolved_binding_is_exposed() {
    let mapping = ClassMap::<Contact>::auto().build().unwrap();
    let binding = resolve(
        &mapping,
        Some(&header(&["Email", "Name", "Id"])),
        &CsvOptions::default(),
    )
    .unwrap();
    assert_eq!(
        binding.members(),
        [Binding::Column(2), Binding::Column(1), Binding::Column(0)]
    );
    assert!(binding.parameters().is_empty());
}

#[test]
fn test_reference_maps_round_trip() {
    let mut context = Context::default();
    context.register_class_map(customer_map()).unwrap();
    let customers = vec![Customer {
        id: 1,
        home: Address {
            street: "Elm".to_string(),
            city: "Oslo".to_string(),
        },
        work: Address {
            street: "Main, 4".to_string(),
            city: "Bergen".to_string(),
        },
    }];

    let csv = to_string_with_context(&customers, context.clone()).unwrap();
    assert_eq!(
        csv,
        "Id,Home.Street,Home.City,Work.Street,Work.City\r\n1,Elm,Oslo,\"Main, 4\",Bergen\r\n"
    );
    let back: Vec<Customer> = from_str_with_context(&csv, context).unwrap();
    assert_eq!(back, customers);
}

#[test]
fn test_unwritable_reference_fails_before_output() {
    let context = holder_context();
    let holders = vec![Holder {
        id: 1,
        badge: Badge {
            code: "x".to_string(),
        },
    }];
    let err = to_string_with_context(&holders, context.clone()).unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("Badge"));

    let back: Vec<Holder> = from_str_with_context("Id,Badge.code\n1,x\n", context).unwrap();
    assert_eq!(back, holders);
}
