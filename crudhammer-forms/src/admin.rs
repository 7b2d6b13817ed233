//! Collaborators of the form contractor.
//!
//! [`Admin`], [`ModelManager`] and [`WidgetFactory`] are the seams the
//! surrounding admin framework plugs into. [`StaticModelManager`],
//! [`DefaultWidgetFactory`], [`AdminPool`] and [`ModelAdmin`] are in-memory
//! implementations good enough to drive a whole admin from YAML.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::builder::{FormBuilder, Widget, WidgetOptions};
use crate::contractor::FormContractor;
use crate::descriptor::FieldDescriptor;
use crate::error::{ErrorSeverity, FormsError, Result};
use crate::options::{FieldOptions, OptionMap};
use crate::types::ClassMetadata;

/// Access to model metadata.
pub trait ModelManager: Send + Sync {
    fn has_metadata(&self, class: &str) -> bool;

    fn metadata(&self, class: &str) -> Option<&ClassMetadata>;

    /// Name of the entity manager handed to relational widgets.
    fn entity_manager(&self) -> &str;
}

/// Builds a widget for a one-to-one field when no override is configured.
pub trait WidgetFactory: Send + Sync {
    fn instance(&self, model_class: &str, field_name: &str, options: &OptionMap) -> Result<Widget>;
}

/// The configuration object governing CRUD behavior for one model type.
pub trait Admin: Send + Sync {
    /// Unique code of this admin.
    fn code(&self) -> &str;

    /// Model class this admin manages.
    fn class(&self) -> &str;

    fn model_manager(&self) -> &dyn ModelManager;

    /// A fresh, unsaved instance of the model.
    fn new_instance(&self) -> Value;

    /// Resolve the admin of the related model and attach it to `descriptor`.
    fn attach_admin_class(&self, descriptor: &mut FieldDescriptor) -> Result<()>;

    /// Add every form field of this admin to `builder`. A scope that does
    /// not already edit this admin's class enters it first.
    fn define_form_builder(&self, builder: &mut FormBuilder) -> Result<()>;
}

/// Model manager backed by metadata held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticModelManager {
    entity_manager: String,
    classes: IndexMap<String, ClassMetadata>,
}

impl StaticModelManager {
    pub fn new(entity_manager: impl Into<String>) -> Self {
        Self {
            entity_manager: entity_manager.into(),
            classes: IndexMap::new(),
        }
    }

    pub fn with_class(mut self, metadata: ClassMetadata) -> Self {
        self.classes.insert(metadata.name.clone(), metadata);
        self
    }

    /// Parse a YAML sequence of class metadata documents.
    pub fn from_yaml(entity_manager: impl Into<String>, yaml: &str) -> Result<Self> {
        let classes: Vec<ClassMetadata> = serde_yaml_ng::from_str(yaml)?;
        let manager = classes
            .into_iter()
            .fold(Self::new(entity_manager), Self::with_class);
        debug!(classes = manager.classes.len(), "loaded model metadata");
        Ok(manager)
    }

    pub fn from_file(entity_manager: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(entity_manager, &content)
    }
}

impl ModelManager for StaticModelManager {
    fn has_metadata(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    fn metadata(&self, class: &str) -> Option<&ClassMetadata> {
        self.classes.get(class)
    }

    fn entity_manager(&self) -> &str {
        &self.entity_manager
    }
}

/// Produces a reference picker bound to the field's property path.
#[derive(Debug, Clone)]
pub struct DefaultWidgetFactory {
    widget_type: String,
}

impl DefaultWidgetFactory {
    pub fn new(widget_type: impl Into<String>) -> Self {
        Self {
            widget_type: widget_type.into(),
        }
    }
}

impl Default for DefaultWidgetFactory {
    fn default() -> Self {
        Self::new("entity")
    }
}

impl WidgetFactory for DefaultWidgetFactory {
    fn instance(&self, model_class: &str, field_name: &str, options: &OptionMap) -> Result<Widget> {
        let mut options = WidgetOptions::from(options.clone());
        options
            .values
            .entry("property_path")
            .or_insert_with(|| Value::from(field_name));
        options
            .values
            .entry("data_class")
            .or_insert_with(|| Value::from(model_class));
        Ok(Widget {
            widget_type: self.widget_type.clone(),
            options,
        })
    }
}

/// Registry of every admin, keyed by code.
#[derive(Default)]
pub struct AdminPool {
    admins: RwLock<IndexMap<String, Arc<dyn Admin>>>,
}

impl AdminPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, admin: Arc<dyn Admin>) {
        debug!(code = %admin.code(), class = %admin.class(), "registered admin");
        self.admins
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(admin.code().to_string(), admin);
    }

    pub fn admin_by_code(&self, code: &str) -> Option<Arc<dyn Admin>> {
        self.admins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(code)
            .cloned()
    }

    /// First registered admin managing `class`.
    pub fn admin_by_class(&self, class: &str) -> Option<Arc<dyn Admin>> {
        self.admins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|admin| admin.class() == class)
            .cloned()
    }

    pub fn codes(&self) -> Vec<String> {
        self.admins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

/// Admin whose form fields are configured programmatically.
///
/// Register it in an [`AdminPool`] before adding association fields, so the
/// related admins can be resolved.
pub struct ModelAdmin {
    code: String,
    class: String,
    model_manager: Arc<dyn ModelManager>,
    contractor: Arc<FormContractor>,
    pool: Weak<AdminPool>,
    blank: Value,
    form_fields: RwLock<Vec<FieldDescriptor>>,
}

impl ModelAdmin {
    pub fn new(
        code: impl Into<String>,
        class: impl Into<String>,
        model_manager: Arc<dyn ModelManager>,
        contractor: Arc<FormContractor>,
        pool: &Arc<AdminPool>,
    ) -> Self {
        Self {
            code: code.into(),
            class: class.into(),
            model_manager,
            contractor,
            pool: Arc::downgrade(pool),
            blank: Value::Object(OptionMap::new()),
            form_fields: RwLock::new(Vec::new()),
        }
    }

    /// Instance returned by [`Admin::new_instance`].
    pub fn with_new_instance(mut self, blank: Value) -> Self {
        self.blank = blank;
        self
    }

    /// Normalize `descriptor` against this admin and append it to the form.
    pub fn add_form_field(
        self: &Arc<Self>,
        descriptor: FieldDescriptor,
        options: FieldOptions,
    ) -> Result<()> {
        let admin: Arc<dyn Admin> = self.clone();
        let mut descriptor = descriptor;
        self.contractor
            .fix_field_description(&admin, &mut descriptor, options)?;
        self.form_fields
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(descriptor);
        Ok(())
    }

    pub fn form_fields(&self) -> Vec<FieldDescriptor> {
        self.form_fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn form_field(&self, name: &str) -> Option<FieldDescriptor> {
        self.form_fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|field| field.name() == name)
            .cloned()
    }

    /// Build the complete edit form for `object`.
    pub fn build_form(&self, object: Value) -> Result<FormBuilder> {
        let mut builder = self.contractor.form_builder(&self.code, object);
        self.define_form_builder(&mut builder)
            .inspect_err(|err| match err.severity() {
                ErrorSeverity::Warning => {
                    warn!(admin = %self.code, error = %err, "form build stopped")
                }
                ErrorSeverity::Error => {
                    error!(admin = %self.code, error = %err, "form build failed")
                }
            })?;
        Ok(builder)
    }
}

impl Admin for ModelAdmin {
    fn code(&self) -> &str {
        &self.code
    }

    fn class(&self) -> &str {
        &self.class
    }

    fn model_manager(&self) -> &dyn ModelManager {
        self.model_manager.as_ref()
    }

    fn new_instance(&self) -> Value {
        self.blank.clone()
    }

    fn attach_admin_class(&self, descriptor: &mut FieldDescriptor) -> Result<()> {
        let target = descriptor
            .target_entity()
            .ok_or_else(|| FormsError::MissingAssociationMapping {
                field_name: descriptor.field_name().to_string(),
            })?
            .to_string();

        let associated = self
            .pool
            .upgrade()
            .and_then(|pool| pool.admin_by_class(&target));

        match associated {
            Some(admin) => {
                debug!(
                    admin = %self.code,
                    field = %descriptor.name(),
                    associated = %admin.code(),
                    "attached association admin"
                );
                descriptor.set_association_admin(&admin);
            }
            None => {
                debug!(
                    admin = %self.code,
                    field = %descriptor.name(),
                    target = %target,
                    "no admin registered for association target"
                );
            }
        }
        Ok(())
    }

    fn define_form_builder(&self, builder: &mut FormBuilder) -> Result<()> {
        if builder.lineage().last().map(String::as_str) != Some(self.class.as_str()) {
            builder.enter(&self.class);
        }
        for field in self.form_fields() {
            self.contractor.add_field(builder, &field)?;
        }
        Ok(())
    }
}
