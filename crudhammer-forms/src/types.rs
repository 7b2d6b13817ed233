//! Core mapping types shared by descriptors, metadata and the contractor.
//!
//! Storage types are plain strings for scalar columns and one of four
//! association tags for relational fields. [`FieldType`] keeps that textual
//! form on the wire while exposing the association cardinality as a closed
//! enum to the code that dispatches on it.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Cardinality of a relational field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl AssociationKind {
    pub const ALL: [AssociationKind; 4] = [
        AssociationKind::OneToOne,
        AssociationKind::OneToMany,
        AssociationKind::ManyToOne,
        AssociationKind::ManyToMany,
    ];

    /// Storage-type tag used in descriptors and metadata.
    pub fn tag(&self) -> &'static str {
        match self {
            AssociationKind::OneToOne => "one_to_one",
            AssociationKind::OneToMany => "one_to_many",
            AssociationKind::ManyToOne => "many_to_one",
            AssociationKind::ManyToMany => "many_to_many",
        }
    }

    /// Parse a storage-type tag. Accepts the `orm_` prefixed spelling too.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.strip_prefix("orm_").unwrap_or(tag);
        AssociationKind::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The dispatch key for form construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
    Scalar,
}

impl From<AssociationKind> for FieldKind {
    fn from(kind: AssociationKind) -> Self {
        match kind {
            AssociationKind::OneToOne => FieldKind::OneToOne,
            AssociationKind::OneToMany => FieldKind::OneToMany,
            AssociationKind::ManyToOne => FieldKind::ManyToOne,
            AssociationKind::ManyToMany => FieldKind::ManyToMany,
        }
    }
}

/// Storage type of a field: a scalar column type or an association tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Association(AssociationKind),
    Scalar(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Association(kind) => kind.tag(),
            FieldType::Scalar(name) => name,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldType::Association(kind) => (*kind).into(),
            FieldType::Scalar(_) => FieldKind::Scalar,
        }
    }

    pub fn association(&self) -> Option<AssociationKind> {
        match self {
            FieldType::Association(kind) => Some(*kind),
            FieldType::Scalar(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        match AssociationKind::from_tag(&value) {
            Some(kind) => FieldType::Association(kind),
            None => FieldType::Scalar(value),
        }
    }
}

impl From<&str> for FieldType {
    fn from(value: &str) -> Self {
        FieldType::from(value.to_string())
    }
}

impl From<AssociationKind> for FieldType {
    fn from(kind: AssociationKind) -> Self {
        FieldType::Association(kind)
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        match value {
            FieldType::Association(kind) => kind.tag().to_string(),
            FieldType::Scalar(name) => name,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a related entity is edited from the parent form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    /// Reference picker
    #[default]
    Standard,
    /// Related entity's fields embedded in the parent form
    Inline,
    /// Plain text input holding the identifier
    List,
}

impl EditMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditMode::Standard => "standard",
            EditMode::Inline => "inline",
            EditMode::List => "list",
        }
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column mapping of a scalar field, as reported by model metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub field_name: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default)]
    pub nullable: bool,
}

/// Relation mapping of an association field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationMapping {
    pub field_name: String,
    pub target_entity: String,
    #[serde(rename = "type")]
    pub kind: AssociationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inversed_by: Option<String>,
}

/// Introspected metadata for one model class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetadata {
    pub name: String,
    #[serde(default)]
    pub field_mappings: IndexMap<String, FieldMapping>,
    #[serde(default)]
    pub association_mappings: IndexMap<String, AssociationMapping>,
}

impl ClassMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a scalar column mapping.
    pub fn field(mut self, name: &str, type_: &str) -> Self {
        self.field_mappings.insert(
            name.to_string(),
            FieldMapping {
                field_name: name.to_string(),
                type_: type_.to_string(),
                length: None,
                nullable: false,
            },
        );
        self
    }

    /// Add an association mapping.
    pub fn association(mut self, name: &str, kind: AssociationKind, target_entity: &str) -> Self {
        self.association_mappings.insert(
            name.to_string(),
            AssociationMapping {
                field_name: name.to_string(),
                target_entity: target_entity.to_string(),
                kind,
                mapped_by: None,
                inversed_by: None,
            },
        );
        self
    }
}
