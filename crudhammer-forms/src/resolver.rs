//! Storage type to widget type resolution.

use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::descriptor::FieldDescriptor;
use crate::error::{FormsError, Result};

/// Built-in storage type → widget type definitions.
pub const BUILT_IN_FORM_TYPES: &[(&str, &str)] = &[
    ("string", "text"),
    ("text", "textarea"),
    ("boolean", "checkbox"),
    ("checkbox", "checkbox"),
    ("integer", "integer"),
    ("tinyint", "integer"),
    ("smallint", "integer"),
    ("mediumint", "integer"),
    ("bigint", "integer"),
    ("decimal", "number"),
    ("datetime", "datetime"),
    ("date", "date"),
    ("choice", "choice"),
    ("array", "collection"),
    ("country", "country"),
];

/// Lookup table from storage type to widget type name.
#[derive(Debug, Clone, PartialEq)]
pub struct FormTypeTable {
    types: IndexMap<String, String>,
}

impl FormTypeTable {
    pub fn built_in() -> Self {
        Self {
            types: BUILT_IN_FORM_TYPES
                .iter()
                .map(|(storage, widget)| (storage.to_string(), widget.to_string()))
                .collect(),
        }
    }

    /// Built-in table extended (or overridden) by `extensions`.
    pub fn with_extensions(extensions: &IndexMap<String, String>) -> Self {
        let mut table = Self::built_in();
        for (storage, widget) in extensions {
            if let Some(previous) = table.insert(storage, widget) {
                warn!(
                    storage_type = %storage,
                    previous = %previous,
                    widget = %widget,
                    "form type extension overrides built-in form type"
                );
            }
        }
        table
    }

    /// Register a mapping, returning the widget it replaced.
    pub fn insert(&mut self, storage_type: &str, widget_type: &str) -> Option<String> {
        self.types
            .insert(storage_type.to_string(), widget_type.to_string())
    }

    pub fn get(&self, storage_type: &str) -> Option<&str> {
        self.types.get(storage_type).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Pick the widget type name for a descriptor.
    ///
    /// A descriptor whose declared type was redefined away from its mapping
    /// type (or that has no mapping at all) always uses the table. Otherwise a
    /// non-empty `form_field_type` option wins over the table.
    pub fn resolve(&self, descriptor: &FieldDescriptor) -> Result<String> {
        let declared = descriptor.type_();
        let storage_type = declared.map(|t| t.as_str()).unwrap_or_default();

        let redefined = match descriptor.mapping_type() {
            None => true,
            Some(mapping_type) => Some(&mapping_type) != declared,
        };

        let type_name = if redefined {
            self.get(storage_type)
        } else if let Some(override_type) = descriptor.options.form_field_type_name() {
            Some(override_type)
        } else {
            self.get(storage_type)
        };

        match type_name {
            Some(type_name) => {
                trace!(
                    field = %descriptor.field_name(),
                    storage_type = %storage_type,
                    widget = %type_name,
                    "resolved form type"
                );
                Ok(type_name.to_string())
            }
            None => Err(FormsError::NoWidgetType {
                field_name: descriptor.field_name().to_string(),
                storage_type: storage_type.to_string(),
            }),
        }
    }
}

impl Default for FormTypeTable {
    fn default() -> Self {
        Self::built_in()
    }
}
