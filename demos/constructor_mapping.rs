//! Mapping columns onto constructor parameters of an immutable type.
//!
//! Run with: cargo run --example constructor_mapping

use csv_classmap::{
    from_str_with_context, to_string_with_context, ClassMap, ConstructorInfo, Context, Error,
    ParameterInfo, PropertyInfo, Reader, Record, TypeInfo,
};

#[derive(Debug, PartialEq)]
struct Sensor {
    id: i32,
    label: String,
    threshold: f64,
}

impl Record for Sensor {
    fn describe() -> TypeInfo<Self> {
        TypeInfo::new("Sensor")
            .with_constructor(ConstructorInfo::new(
                vec![
                    ParameterInfo::of::<i32>("id"),
                    ParameterInfo::of::<String>("label"),
                    ParameterInfo::of::<f64>("threshold").with_default(1.0),
                ],
                |args| {
                    Ok(Sensor {
                        id: args.take(0)?,
                        label: args.take(1)?,
                        threshold: args.take(2)?,
                    })
                },
            ))
            .with_property(PropertyInfo::read_only("Id", |s: &Sensor| s.id))
            .with_property(PropertyInfo::read_only("Label", |s: &Sensor| s.label.clone()))
            .with_property(PropertyInfo::read_only("Threshold", |s: &Sensor| s.threshold))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut map = ClassMap::<Sensor>::new();
    map.parameter("id").name("Id").alias("SensorId");
    map.parameter("label").name("Label");
    map.parameter("threshold").name("Threshold").optional();

    let mut context = Context::default();
    context.register_class_map(map)?;

    // The threshold column is optional; the declared default fills it
    let sensors: Vec<Sensor> =
        from_str_with_context("Label,SensorId\nboiler,1\nattic,2\n", context.clone())?;
    println!("Read: {:?}", sensors);

    let csv = to_string_with_context(&sensors, context.clone())?;
    println!("CSV output:\n{}", csv);

    // A bad row fails alone; reading carries on
    let input = "Id,Label,Threshold\n1,boiler,2.5\nx,attic,1.0\n3,cellar,0.5\n";
    let mut reader = Reader::from_reader(input.as_bytes(), context);
    for result in reader.get_records::<Sensor>() {
        match result {
            Ok(sensor) => println!("✓ {:?}", sensor),
            Err(Error::RecordBinding { row, member, msg, .. }) => {
                println!("✗ row {} ({}): {}", row, member, msg)
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
