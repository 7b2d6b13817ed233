//! Field descriptors: one record per form field of an admin.

use std::fmt;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};

use crate::admin::Admin;
use crate::options::FieldOptions;
use crate::types::{AssociationMapping, EditMode, FieldKind, FieldMapping, FieldType};

/// Describes one field of a model and how it should be edited.
///
/// The owning admin and the associated admin are non-owning back-pointers.
/// Admins are owned by their pool; a descriptor only reads through them and
/// never keeps one alive.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// Property path on the model; empty means "same as `name`"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub field_name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_mapping: Option<FieldMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub association_mapping: Option<AssociationMapping>,
    #[serde(default)]
    pub options: FieldOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip)]
    admin: Option<Weak<dyn Admin>>,
    #[serde(skip)]
    association_admin: Option<Weak<dyn Admin>>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, type_: impl Into<FieldType>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    pub fn with_options(mut self, options: FieldOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_association_mapping(mut self, mapping: AssociationMapping) -> Self {
        self.set_association_mapping(mapping);
        self
    }

    pub fn with_field_mapping(mut self, mapping: FieldMapping) -> Self {
        self.set_field_mapping(mapping);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_name(&self) -> &str {
        if self.field_name.is_empty() {
            &self.name
        } else {
            &self.field_name
        }
    }

    /// Declared storage type, treating an empty string as unset.
    pub fn type_(&self) -> Option<&FieldType> {
        self.type_.as_ref().filter(|t| !t.is_empty())
    }

    pub fn kind(&self) -> FieldKind {
        self.type_().map_or(FieldKind::Scalar, FieldType::kind)
    }

    /// Type reported by the metadata mapping, if one was applied.
    pub fn mapping_type(&self) -> Option<FieldType> {
        if let Some(mapping) = &self.association_mapping {
            return Some(FieldType::Association(mapping.kind));
        }
        self.field_mapping
            .as_ref()
            .map(|mapping| FieldType::from(mapping.type_.as_str()))
    }

    /// Apply a column mapping. The mapping's type only fills an unset type.
    pub fn set_field_mapping(&mut self, mapping: FieldMapping) {
        if self.type_().is_none() {
            self.type_ = Some(FieldType::from(mapping.type_.as_str()));
        }
        self.field_mapping = Some(mapping);
    }

    /// Apply a relation mapping. The mapping's kind only fills an unset type.
    pub fn set_association_mapping(&mut self, mapping: AssociationMapping) {
        if self.type_().is_none() {
            self.type_ = Some(FieldType::Association(mapping.kind));
        }
        self.association_mapping = Some(mapping);
    }

    pub fn target_entity(&self) -> Option<&str> {
        self.association_mapping
            .as_ref()
            .map(|mapping| mapping.target_entity.as_str())
    }

    pub fn edit_mode(&self) -> EditMode {
        self.options.edit_mode()
    }

    pub fn merge_options(&mut self, options: FieldOptions) {
        self.options.merge(options);
    }

    pub fn set_admin(&mut self, admin: &Arc<dyn Admin>) {
        self.admin = Some(Arc::downgrade(admin));
    }

    /// The admin owning this field, if attached and still alive.
    pub fn admin(&self) -> Option<Arc<dyn Admin>> {
        self.admin.as_ref().and_then(Weak::upgrade)
    }

    pub fn set_association_admin(&mut self, admin: &Arc<dyn Admin>) {
        self.association_admin = Some(Arc::downgrade(admin));
    }

    /// The admin governing the related model, if attached and still alive.
    pub fn association_admin(&self) -> Option<Arc<dyn Admin>> {
        self.association_admin.as_ref().and_then(Weak::upgrade)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("field_name", &self.field_name())
            .field("type", &self.type_)
            .field("field_mapping", &self.field_mapping)
            .field("association_mapping", &self.association_mapping)
            .field("options", &self.options)
            .field("template", &self.template)
            .field("admin", &self.admin().map(|a| a.code().to_string()))
            .field(
                "association_admin",
                &self.association_admin().map(|a| a.code().to_string()),
            )
            .finish()
    }
}
