//! Field-to-widget form mapping for admin CRUD panels
//!
//! `crudhammer-forms` decides how each field of a model is edited. Given a
//! [`FieldDescriptor`] (storage type, association mapping, option overrides)
//! the [`FormContractor`] normalizes it against model metadata and then adds a
//! configured widget entry to a [`FormBuilder`].
//!
//! # Architecture
//!
//! - **Closed dispatch**: relational fields dispatch on [`FieldKind`], one handler per cardinality
//! - **Typed options**: known option keys are fields of [`FieldOptions`], the rest stay free-form
//! - **Recursive inline forms**: inline associations embed the related admin's form,
//!   guarded against cycles and bounded by [`FormsConfig::max_inline_depth`]
//! - **Pluggable collaborators**: [`Admin`], [`ModelManager`] and [`WidgetFactory`]
//!   are traits; in-memory implementations ship alongside them

pub mod admin;
pub mod builder;
pub mod config;
pub mod contractor;
pub mod descriptor;
pub mod error;
pub mod options;
pub mod resolver;
pub mod types;

pub use admin::{
    Admin, AdminPool, DefaultWidgetFactory, ModelAdmin, ModelManager, StaticModelManager,
    WidgetFactory,
};
pub use builder::{FormBuilder, ValueTransformer, Widget, WidgetOptions};
pub use config::{FormsConfig, TemplateConfig, YearRange};
pub use contractor::FormContractor;
pub use descriptor::FieldDescriptor;
pub use error::{ErrorSeverity, FormsError, Result};
pub use options::{merge_recursive, FieldOptions, OptionMap};
pub use resolver::{FormTypeTable, BUILT_IN_FORM_TYPES};
pub use types::{
    AssociationKind, AssociationMapping, ClassMetadata, EditMode, FieldKind, FieldMapping,
    FieldType,
};
