//! Custom converters for host values outside the primitive table.
//!
//! Keyed by the host value's runtime type label (`HostValue::type_label`),
//! so a `Tagged` value is looked up by its semantic tag.

use crate::{error::CoerceError, payload::ODataValue, value::HostValue};
use std::{collections::HashMap, fmt, sync::Arc};

/// Conversion function registered for one type label.
pub type Converter = Arc<dyn Fn(&HostValue) -> Result<ODataValue, CoerceError> + Send + Sync>;

///
/// ConverterRegistry
///
/// Populated once by the host before writes; read-only afterwards.
///

#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: HashMap<String, Converter>,
}

impl ConverterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the converter for `tag`.
    #[must_use]
    pub fn register<F>(mut self, tag: impl Into<String>, converter: F) -> Self
    where
        F: Fn(&HostValue) -> Result<ODataValue, CoerceError> + Send + Sync + 'static,
    {
        self.converters.insert(tag.into(), Arc::new(converter));
        self
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&Converter> {
        self.converters.get(tag)
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.converters.contains_key(tag)
    }

    /// Run the converter registered for the value's type label.
    ///
    /// Returns `None` when nothing is registered for it.
    pub fn convert(&self, value: &HostValue) -> Option<Result<ODataValue, CoerceError>> {
        self.get(value.type_label())
            .map(|converter| converter(value))
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.converters.keys().collect();
        tags.sort();

        f.debug_struct("ConverterRegistry")
            .field("tags", &tags)
            .finish()
    }
}

///
/// TESTS
///
