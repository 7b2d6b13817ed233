//! Field option bags.
//!
//! Known keys are typed fields on [`FieldOptions`]; anything else lands in the
//! flattened `extra` map so admin configurations can carry keys this crate
//! does not interpret.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::EditMode;

/// Free-form widget options, keyed by option name.
pub type OptionMap = serde_json::Map<String, Value>;

/// Per-field configuration overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<EditMode>,
    /// Widget type name (or widget class for one-to-one) overriding the table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_field_type: Option<String>,
    /// Options handed to the widget
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_field_options: Option<OptionMap>,
    /// Field-group widget for inline one-to-many collections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_form_field: Option<String>,
    /// Minimum number of entries in an inline collection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,
    #[serde(flatten)]
    pub extra: OptionMap,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_edit(mut self, edit: EditMode) -> Self {
        self.edit = Some(edit);
        self
    }

    pub fn with_form_field_type(mut self, type_name: impl Into<String>) -> Self {
        self.form_field_type = Some(type_name.into());
        self
    }

    /// Set a single widget option, creating the widget option map if needed.
    pub fn with_form_field_option(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.form_field_options
            .get_or_insert_with(OptionMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Edit mode, falling back to [`EditMode::Standard`].
    pub fn edit_mode(&self) -> EditMode {
        self.edit.unwrap_or_default()
    }

    /// The `form_field_type` override, ignoring empty strings.
    pub fn form_field_type_name(&self) -> Option<&str> {
        self.form_field_type.as_deref().filter(|t| !t.is_empty())
    }

    /// A copy of the widget options, empty when unset.
    pub fn widget_options(&self) -> OptionMap {
        self.form_field_options.clone().unwrap_or_default()
    }

    /// Shallow merge: every option set in `other` replaces the one here.
    pub fn merge(&mut self, other: FieldOptions) {
        if other.edit.is_some() {
            self.edit = other.edit;
        }
        if other.form_field_type.is_some() {
            self.form_field_type = other.form_field_type;
        }
        if other.form_field_options.is_some() {
            self.form_field_options = other.form_field_options;
        }
        if other.widget_form_field.is_some() {
            self.widget_form_field = other.widget_form_field;
        }
        if other.min.is_some() {
            self.min = other.min;
        }
        self.extra.extend(other.extra);
    }
}

/// Deep merge of `overlay` onto `base`.
///
/// Nested objects merge key by key; any other value in `overlay` replaces
/// the one in `base`.
pub fn merge_recursive(mut base: OptionMap, overlay: &OptionMap) -> OptionMap {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                let merged = merge_recursive(std::mem::take(existing), incoming);
                *existing = merged;
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
    base
}
