//! Per-reader/writer configuration: options, converters and registered class maps.
//!
//! Class maps are registered per target type. Asking for a type with no
//! registered map auto-maps it on first use and caches the result.
//!
//! ```rust
//! use csv_classmap::{impl_record, ClassMap, Context};
//!
//! #[derive(Default)]
//! struct Item {
//!     sku: String,
//!     qty: i32,
//! }
//!
//! impl_record!(Item { sku: String, qty: i32 });
//!
//! let mut map = ClassMap::<Item>::new();
//! map.map("sku").name("SKU");
//! map.map("qty").name("Quantity");
//!
//! let mut context = Context::default();
//! context.register_class_map(map).unwrap();
//! let mapping = context.mapping_for::<Item>().unwrap();
//! assert_eq!(mapping.header_names().unwrap(), ["SKU", "Quantity"]);
//! ```

use crate::class_map::{ClassMap, Mapping};
use crate::convert::ConverterRegistry;
use crate::describe::Record;
use crate::options::CsvOptions;
use crate::Result;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Options, converters and class maps shared by one reader or writer.
#[derive(Clone, Default)]
pub struct Context {
    options: CsvOptions,
    converters: ConverterRegistry,
    maps: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Context {
    #[must_use]
    pub fn new(options: CsvOptions) -> Self {
        Context {
            options,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut CsvOptions {
        &mut self.options
    }

    #[must_use]
    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub fn converters_mut(&mut self) -> &mut ConverterRegistry {
        &mut self.converters
    }

    /// Seals `map` and registers it for its target type, replacing any earlier map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) if the map is invalid.
    pub fn register_class_map<T: Record>(&mut self, map: ClassMap<T>) -> Result<()> {
        let mapping = map.build()?;
        self.register_mapping(Arc::new(mapping));
        Ok(())
    }

    /// Registers an already sealed mapping, typically shared with other contexts.
    pub fn register_mapping<T: Record>(&mut self, mapping: Arc<Mapping<T>>) {
        log::debug!("registered class map for `{}`", mapping.type_name());
        self.maps.insert(TypeId::of::<T>(), mapping);
    }

    /// Removes the map registered for `T`. Returns `true` if one was present.
    pub fn unregister_class_map<T: Record>(&mut self) -> bool {
        self.maps.remove(&TypeId::of::<T>()).is_some()
    }

    #[must_use]
    pub fn has_class_map<T: Record>(&self) -> bool {
        self.maps.contains_key(&TypeId::of::<T>())
    }

    /// Returns the mapping for `T`, auto-mapping and caching it when none is registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) if `T`
    /// cannot be auto-mapped.
    pub fn mapping_for<T: Record>(&mut self) -> Result<Arc<Mapping<T>>> {
        let key = TypeId::of::<T>();
        if let Some(mapping) = self
            .maps
            .get(&key)
            .and_then(|any| any.clone().downcast::<Mapping<T>>().ok())
        {
            return Ok(mapping);
        }
        log::debug!("auto-mapping `{}`", std::any::type_name::<T>());
        let mapping = Arc::new(ClassMap::<T>::auto().build()?);
        self.maps.insert(key, mapping.clone());
        Ok(mapping)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("options", &self.options)
            .field("converters", &self.converters)
            .field("class_maps", &self.maps.len())
            .finish()
    }
}
