/// Implements [`Record`](crate::Record) for a plain struct with a `Default` constructor.
///
/// Every listed field becomes a read-write property, named after the field
/// unless a header-style name is given with `=> "Name"`. Field types must
/// implement [`FieldValue`](crate::FieldValue) and `Clone`.
///
/// ```rust
/// use csv_classmap::{impl_record, type_info};
///
/// #[derive(Default)]
/// struct Person {
///     id: i32,
///     name: String,
///     email: Option<String>,
/// }
///
/// impl_record!(Person {
///     id: i32 => "Id",
///     name: String => "Name",
///     email: Option<String>,
/// });
///
/// let info = type_info::<Person>();
/// assert!(info.property("Id").is_some());
/// assert!(info.property("email").unwrap().is_nullable());
/// ```
#[macro_export]
macro_rules! impl_record {
    (@name $field:ident) => {
        stringify!($field)
    };

    (@name $field:ident, $name:literal) => {
        $name
    };

    ($ty:ident { $($field:ident : $fty:ty $(=> $name:literal)?),* $(,)? }) => {
        impl $crate::Record for $ty {
            fn describe() -> $crate::TypeInfo<Self> {
                $crate::TypeInfo::new(stringify!($ty))
                    .with_constructor($crate::ConstructorInfo::default_constructor())
                    $(
                        .with_property($crate::PropertyInfo::read_write(
                            $crate::impl_record!(@name $field $(, $name)?),
                            |record: &$ty| -> $fty { ::std::clone::Clone::clone(&record.$field) },
                            |record: &mut $ty, value: $fty| record.$field = value,
                        ))
                    )*
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{type_info, Value};

    #[derive(Debug, Default, PartialEq)]
    struct Sample {
        id: i64,
        label: String,
        ratio: Option<f64>,
    }

    impl_record!(Sample {
        id: i64 => "Id",
        label: String,
        ratio: Option<f64> => "Ratio",
    });

    #[test]
    fn test_properties_in_field_order() {
        let info = type_info::<Sample>();
        let names: Vec<&str> = info.properties().map(|p| p.name()).collect();
        assert_eq!(names, ["Id", "label", "Ratio"]);
        assert!(info.properties().all(|p| p.is_writable()));
    }

    #[test]
    fn test_default_constructor() {
        let info = type_info::<Sample>();
        assert_eq!(info.constructors().len(), 1);
        assert!(info.constructors()[0].parameters().is_empty());
    }

    #[test]
    fn test_accessors_round_trip_values() {
        let info = type_info::<Sample>();
        let mut sample = Sample::default();
        info.property("Id").unwrap().set(&mut sample, Value::Integer(5)).unwrap();
        info.property("Ratio").unwrap().set(&mut sample, Value::Null).unwrap();
        assert_eq!(sample.id, 5);
        assert_eq!(info.property("label").unwrap().get(&sample), Value::from(""));
    }
}
