//! FormContractor — turns field descriptors into form builder entries.
//!
//! Normalization ([`FormContractor::fix_field_description`]) runs once per
//! field while an admin is configured. Construction
//! ([`FormContractor::add_field`]) runs once per field every time a form is
//! built, dispatching on the field's association cardinality. Inline
//! association fields recurse into the related admin's own form definition.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::admin::{Admin, DefaultWidgetFactory, WidgetFactory};
use crate::builder::{FormBuilder, ValueTransformer, WidgetOptions};
use crate::config::FormsConfig;
use crate::descriptor::FieldDescriptor;
use crate::error::{FormsError, Result};
use crate::options::{merge_recursive, FieldOptions, OptionMap};
use crate::resolver::FormTypeTable;
use crate::types::{AssociationKind, EditMode, FieldKind, FieldType};

/// Maps field descriptors to widgets.
pub struct FormContractor {
    config: FormsConfig,
    form_types: FormTypeTable,
    widget_factory: Arc<dyn WidgetFactory>,
}

impl FormContractor {
    pub fn new(config: FormsConfig) -> Self {
        Self {
            form_types: FormTypeTable::with_extensions(&config.form_types),
            config,
            widget_factory: Arc::new(DefaultWidgetFactory::default()),
        }
    }

    pub fn with_widget_factory(mut self, widget_factory: Arc<dyn WidgetFactory>) -> Self {
        self.widget_factory = widget_factory;
        self
    }

    pub fn config(&self) -> &FormsConfig {
        &self.config
    }

    pub fn form_types(&self) -> &FormTypeTable {
        &self.form_types
    }

    /// A root builder holding `data`.
    pub fn form_builder(&self, name: &str, data: Value) -> FormBuilder {
        let mut builder = FormBuilder::new(name, &self.config.child_form_type);
        builder.set_data(data);
        builder
    }

    /// Widget type name for a scalar field.
    pub fn form_type_name(&self, descriptor: &FieldDescriptor) -> Result<String> {
        self.form_types.resolve(descriptor)
    }

    /// Add the entry for `descriptor` to `builder`.
    pub fn add_field(&self, builder: &mut FormBuilder, descriptor: &FieldDescriptor) -> Result<()> {
        trace!(
            field = %descriptor.name(),
            kind = ?descriptor.kind(),
            edit = %descriptor.edit_mode(),
            "adding form field"
        );
        match descriptor.kind() {
            FieldKind::OneToMany => self.add_one_to_many_field(builder, descriptor),
            FieldKind::ManyToMany => self.add_many_to_many_field(builder, descriptor),
            FieldKind::ManyToOne => self.add_many_to_one_field(builder, descriptor),
            FieldKind::OneToOne => self.add_one_to_one_field(builder, descriptor),
            FieldKind::Scalar => {
                let type_name = self.form_type_name(descriptor)?;
                builder.add(
                    descriptor.field_name(),
                    type_name,
                    WidgetOptions::from(descriptor.options.widget_options()),
                );
                Ok(())
            }
        }
    }

    /// Embed the related admin's form under `field_name` (default: the
    /// descriptor's field name) and return the nested builder.
    pub fn define_child_form_builder<'b>(
        &self,
        builder: &'b mut FormBuilder,
        descriptor: &FieldDescriptor,
        field_name: Option<&str>,
    ) -> Result<&'b mut FormBuilder> {
        let field_name = field_name.unwrap_or(descriptor.field_name());
        let child = self.child_form(builder, descriptor, field_name)?;
        Ok(builder.insert(child))
    }

    /// The related admin's form for `descriptor`, not yet registered on
    /// `parent`.
    fn child_form(
        &self,
        parent: &mut FormBuilder,
        descriptor: &FieldDescriptor,
        field_name: &str,
    ) -> Result<FormBuilder> {
        let associated = descriptor.association_admin().ok_or_else(|| {
            FormsError::MissingAssociationAdmin {
                field_name: field_name.to_string(),
            }
        })?;
        if descriptor.association_mapping.is_none() {
            return Err(FormsError::MissingAssociationMapping {
                field_name: field_name.to_string(),
            });
        }

        // a root form edits the owning admin's model
        if parent.lineage().is_empty() {
            if let Some(owner) = descriptor.admin() {
                parent.enter(owner.class());
            }
        }

        let class = associated.class();
        if parent.lineage().iter().any(|entered| entered == class) {
            return Err(FormsError::InlineCycle {
                field_name: field_name.to_string(),
                class: class.to_string(),
            });
        }
        if parent.lineage().len() >= self.config.max_inline_depth {
            return Err(FormsError::InlineDepthExceeded {
                field_name: field_name.to_string(),
                max_depth: self.config.max_inline_depth,
            });
        }

        let mut child = parent.scope(field_name, &self.config.child_form_type);
        child.enter(class);
        child.set_data(associated.new_instance());

        debug!(
            field = %field_name,
            admin = %associated.code(),
            depth = child.lineage().len(),
            "defining inline child form"
        );
        associated.define_form_builder(&mut child)?;
        Ok(child)
    }

    fn add_one_to_one_field(
        &self,
        builder: &mut FormBuilder,
        descriptor: &FieldDescriptor,
    ) -> Result<()> {
        if descriptor.edit_mode() == EditMode::Inline {
            self.define_child_form_builder(builder, descriptor, None)?;
            return Ok(());
        }

        let admin = owning_admin(descriptor)?;
        let target = target_entity(descriptor)?;

        let mut options = WidgetOptions::from(descriptor.options.widget_options());
        if !options.values.contains_key("value_transformer") {
            options.value_transformer = Some(ValueTransformer::EntityToId {
                entity_manager: admin.model_manager().entity_manager().to_string(),
                class_name: target.to_string(),
            });
        }

        if descriptor.edit_mode() == EditMode::List {
            builder.add(descriptor.field_name(), &self.config.list_widget, options);
            return Ok(());
        }

        match descriptor.options.form_field_type_name() {
            Some(class) => {
                builder.add(descriptor.field_name(), class, options);
            }
            None => {
                let widget = self.widget_factory.instance(
                    admin.class(),
                    descriptor.field_name(),
                    &descriptor.options.widget_options(),
                )?;
                builder.add(descriptor.field_name(), widget.widget_type, widget.options);
            }
        }
        Ok(())
    }

    fn add_one_to_many_field(
        &self,
        builder: &mut FormBuilder,
        descriptor: &FieldDescriptor,
    ) -> Result<()> {
        if descriptor.edit_mode() != EditMode::Inline {
            return self.add_many_to_many_field(builder, descriptor);
        }

        // the child form is never registered, it only serves as the collection prototype
        let field_name = descriptor.field_name();
        let prototype = self.child_form(builder, descriptor, field_name)?;

        let mut options = WidgetOptions::from(descriptor.options.widget_options());
        options.prototype = Some(Box::new(prototype));
        builder.add(field_name, &self.config.collection_widget, options);
        Ok(())
    }

    fn add_many_to_many_field(
        &self,
        builder: &mut FormBuilder,
        descriptor: &FieldDescriptor,
    ) -> Result<()> {
        let admin = owning_admin(descriptor)?;
        let target = target_entity(descriptor)?;
        let type_name = descriptor
            .options
            .form_field_type_name()
            .unwrap_or(self.config.relation_widget.as_str());

        let mut options = WidgetOptions::from(descriptor.options.widget_options());
        options.insert("em", admin.model_manager().entity_manager());
        options.insert("class", target);
        options.insert("multiple", true);
        options.field_description = Some(Box::new(descriptor.clone()));

        builder.add(descriptor.name(), type_name, options);
        Ok(())
    }

    fn add_many_to_one_field(
        &self,
        builder: &mut FormBuilder,
        descriptor: &FieldDescriptor,
    ) -> Result<()> {
        if descriptor.edit_mode() == EditMode::Inline {
            self.define_child_form_builder(builder, descriptor, None)?;
            return Ok(());
        }

        let admin = owning_admin(descriptor)?;
        let target = target_entity(descriptor)?;
        let type_name = descriptor
            .options
            .form_field_type_name()
            .unwrap_or(self.config.relation_widget.as_str());

        let mut base = OptionMap::new();
        base.insert("em".into(), admin.model_manager().entity_manager().into());
        base.insert("class".into(), target.into());
        base.insert("expanded".into(), false.into());
        base.insert("edit".into(), descriptor.edit_mode().as_str().into());

        let mut options =
            WidgetOptions::from(merge_recursive(base, &descriptor.options.widget_options()));
        options.field_description = Some(Box::new(descriptor.clone()));

        builder.add(descriptor.name(), type_name, options);
        Ok(())
    }

    /// Normalize `descriptor` for `admin`: merge `options`, apply model
    /// metadata, attach admins and fill defaults.
    pub fn fix_field_description(
        &self,
        admin: &Arc<dyn Admin>,
        descriptor: &mut FieldDescriptor,
        options: FieldOptions,
    ) -> Result<()> {
        descriptor.merge_options(options);

        let model_manager = admin.model_manager();
        if model_manager.has_metadata(admin.class()) {
            if let Some(metadata) = model_manager.metadata(admin.class()) {
                if let Some(mapping) = metadata.field_mappings.get(descriptor.name()) {
                    descriptor.set_field_mapping(mapping.clone());
                }
                if let Some(mapping) = metadata.association_mappings.get(descriptor.name()) {
                    descriptor.set_association_mapping(mapping.clone());
                }
            }
        }

        let Some(field_type) = descriptor.type_().cloned() else {
            return Err(FormsError::MissingType {
                field: descriptor.name().to_string(),
                admin: admin.code().to_string(),
            });
        };

        descriptor.set_admin(admin);
        if descriptor.options.edit.is_none() {
            descriptor.options.edit = Some(EditMode::Standard);
        }

        if descriptor.template.is_none() {
            descriptor.template = Some(match &field_type {
                FieldType::Association(kind) => {
                    self.config.templates.for_association(*kind).to_string()
                }
                FieldType::Scalar(name) => self.config.templates.for_scalar(name),
            });
        }

        match &field_type {
            FieldType::Association(kind) => {
                if *kind == AssociationKind::OneToMany
                    && descriptor.edit_mode() == EditMode::Inline
                    && descriptor.options.widget_form_field.is_none()
                {
                    descriptor.options.widget_form_field =
                        Some(self.config.inline_field_group.clone());
                }
                admin.attach_admin_class(descriptor)?;
            }
            FieldType::Scalar(name) if name == "datetime" => {
                let widget_options = descriptor
                    .options
                    .form_field_options
                    .get_or_insert_with(OptionMap::new);
                if !widget_options.contains_key("years") {
                    widget_options.insert(
                        "years".into(),
                        Value::Array(self.config.datetime_years.years()),
                    );
                }
            }
            FieldType::Scalar(_) => {}
        }

        debug!(
            admin = %admin.code(),
            field = %descriptor.name(),
            storage_type = %field_type,
            template = ?descriptor.template,
            "fixed field description"
        );
        Ok(())
    }

    /// Append a fresh instance of the related model to `object`'s collection.
    pub fn add_new_instance(&self, object: &mut Value, descriptor: &FieldDescriptor) -> Result<()> {
        let field_name = descriptor.field_name();
        let associated = descriptor.association_admin().ok_or_else(|| {
            FormsError::MissingAssociationAdmin {
                field_name: field_name.to_string(),
            }
        })?;
        let mapping = descriptor.association_mapping.as_ref().ok_or_else(|| {
            FormsError::MissingAssociationMapping {
                field_name: field_name.to_string(),
            }
        })?;

        let Value::Object(record) = object else {
            return Err(FormsError::InvalidInstance {
                field_name: field_name.to_string(),
                reason: "object is not a record".into(),
            });
        };

        let instance = associated.new_instance();
        let slot = record
            .entry(mapping.field_name.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        if slot.is_null() {
            *slot = Value::Array(Vec::new());
        }
        match slot.as_array_mut() {
            Some(items) => {
                items.push(instance);
                Ok(())
            }
            None => Err(FormsError::InvalidInstance {
                field_name: field_name.to_string(),
                reason: format!("`{}` is not a collection", mapping.field_name),
            }),
        }
    }

    /// Top up an inline one-to-many collection to its `min` option.
    ///
    /// Returns the number of instances added. Other fields are left alone.
    pub fn ensure_min_instances(
        &self,
        object: &mut Value,
        descriptor: &FieldDescriptor,
    ) -> Result<usize> {
        if descriptor.kind() != FieldKind::OneToMany || descriptor.edit_mode() != EditMode::Inline {
            return Ok(0);
        }
        let min = descriptor.options.min.unwrap_or(0);
        let Some(mapping) = descriptor.association_mapping.as_ref() else {
            return Ok(0);
        };

        let current = object
            .get(&mapping.field_name)
            .and_then(Value::as_array)
            .map_or(0, Vec::len);

        let missing = min.saturating_sub(current);
        for _ in 0..missing {
            self.add_new_instance(object, descriptor)?;
        }
        if missing > 0 {
            debug!(field = %descriptor.name(), added = missing, "filled collection to minimum");
        }
        Ok(missing)
    }
}

impl Default for FormContractor {
    fn default() -> Self {
        Self::new(FormsConfig::default())
    }
}

fn owning_admin(descriptor: &FieldDescriptor) -> Result<Arc<dyn Admin>> {
    descriptor.admin().ok_or_else(|| FormsError::MissingAdmin {
        field_name: descriptor.field_name().to_string(),
    })
}

fn target_entity(descriptor: &FieldDescriptor) -> Result<&str> {
    descriptor
        .target_entity()
        .ok_or_else(|| FormsError::MissingAssociationMapping {
            field_name: descriptor.field_name().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::{AdminPool, ModelAdmin, ModelManager, StaticModelManager};
    use crate::types::{AssociationMapping, ClassMetadata};
    use rstest::rstest;
    use serde_json::json;

    struct Fixture {
        _pool: Arc<AdminPool>,
        posts: Arc<ModelAdmin>,
        contractor: Arc<FormContractor>,
    }

    fn fixture() -> Fixture {
        let manager: Arc<dyn ModelManager> = Arc::new(
            StaticModelManager::new("default")
                .with_class(
                    ClassMetadata::new("Blog\\Post")
                        .field("title", "string")
                        .field("body", "text")
                        .field("published_at", "datetime")
                        .association("author", AssociationKind::ManyToOne, "Blog\\User")
                        .association("tags", AssociationKind::ManyToMany, "Blog\\Tag")
                        .association("cover", AssociationKind::OneToOne, "Blog\\Image")
                        .association("comments", AssociationKind::OneToMany, "Blog\\Comment"),
                )
                .with_class(ClassMetadata::new("Blog\\Comment").field("message", "text")),
        );
        let pool = Arc::new(AdminPool::new());
        let contractor = Arc::new(FormContractor::default());
        let posts = Arc::new(ModelAdmin::new(
            "admin.post",
            "Blog\\Post",
            manager.clone(),
            contractor.clone(),
            &pool,
        ));
        let comments = Arc::new(
            ModelAdmin::new("admin.comment", "Blog\\Comment", manager, contractor.clone(), &pool)
                .with_new_instance(json!({ "message": "" })),
        );
        pool.register(posts.clone());
        pool.register(comments.clone());
        comments
            .add_form_field(FieldDescriptor::new("message"), FieldOptions::new())
            .unwrap();
        Fixture {
            _pool: pool,
            posts,
            contractor,
        }
    }

    fn fixed(fixture: &Fixture, name: &str, options: FieldOptions) -> FieldDescriptor {
        fixture
            .posts
            .add_form_field(FieldDescriptor::new(name), options)
            .unwrap();
        fixture.posts.form_field(name).unwrap()
    }

    #[test]
    fn fix_copies_metadata_mapping() {
        let fixture = fixture();
        let body = fixed(&fixture, "body", FieldOptions::new());
        assert_eq!(body.type_(), Some(&FieldType::from("text")));
        assert_eq!(body.field_mapping.as_ref().unwrap().type_, "text");
        assert_eq!(body.template.as_deref(), Some("CRUD/edit_text.html.twig"));
        assert_eq!(body.options.edit, Some(EditMode::Standard));
        assert_eq!(body.admin().unwrap().code(), "admin.post");
    }

    #[test]
    fn fix_keeps_explicit_type_and_template() {
        let fixture = fixture();
        fixture
            .posts
            .add_form_field(
                FieldDescriptor::new("body")
                    .with_type("string")
                    .with_template("custom.html"),
                FieldOptions::new(),
            )
            .unwrap();
        let body = fixture.posts.form_field("body").unwrap();
        assert_eq!(body.type_(), Some(&FieldType::from("string")));
        assert_eq!(body.mapping_type(), Some(FieldType::from("text")));
        assert_eq!(body.template.as_deref(), Some("custom.html"));
    }

    #[test]
    fn fix_without_type_fails() {
        let fixture = fixture();
        let err = fixture
            .posts
            .add_form_field(FieldDescriptor::new("unmapped"), FieldOptions::new())
            .unwrap_err();
        match err {
            FormsError::MissingType { field, admin } => {
                assert_eq!(field, "unmapped");
                assert_eq!(admin, "admin.post");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(fixture.posts.form_field("unmapped").is_none());
    }

    #[test]
    fn fix_merges_extra_options() {
        let fixture = fixture();
        fixture
            .posts
            .add_form_field(
                FieldDescriptor::new("title")
                    .with_options(FieldOptions::new().with_extra("label", "Title")),
                FieldOptions::new().with_edit(EditMode::List),
            )
            .unwrap();
        let title = fixture.posts.form_field("title").unwrap();
        assert_eq!(title.options.edit, Some(EditMode::List));
        assert_eq!(title.options.extra["label"], json!("Title"));
    }

    #[test]
    fn fix_defaults_datetime_years() {
        let fixture = fixture();
        let published = fixed(&fixture, "published_at", FieldOptions::new());
        let years = published.options.widget_options()["years"].clone();
        let years = years.as_array().unwrap();
        assert_eq!(years.len(), 201);
        assert_eq!(years[0], json!(1900));
        assert_eq!(years[200], json!(2100));
    }

    #[test]
    fn fix_keeps_explicit_datetime_years() {
        let fixture = fixture();
        let published = fixed(
            &fixture,
            "published_at",
            FieldOptions::new().with_form_field_option("years", json!([2020, 2021])),
        );
        assert_eq!(
            published.options.widget_options()["years"],
            json!([2020, 2021])
        );
    }

    #[rstest]
    #[case("author", "CRUD/edit_orm_many_to_one.html.twig")]
    #[case("tags", "CRUD/edit_orm_many_to_many.html.twig")]
    #[case("cover", "CRUD/edit_orm_one_to_one.html.twig")]
    #[case("comments", "CRUD/edit_orm_one_to_many.html.twig")]
    fn fix_sets_association_templates(#[case] name: &str, #[case] template: &str) {
        let fixture = fixture();
        let field = fixed(&fixture, name, FieldOptions::new());
        assert_eq!(field.template.as_deref(), Some(template));
    }

    #[test]
    fn fix_defaults_inline_field_group() {
        let fixture = fixture();
        let comments = fixed(
            &fixture,
            "comments",
            FieldOptions::new().with_edit(EditMode::Inline),
        );
        assert_eq!(
            comments.options.widget_form_field.as_deref(),
            Some("EditableFieldGroup")
        );
        assert_eq!(
            comments.association_admin().unwrap().code(),
            "admin.comment"
        );
    }

    #[test]
    fn scalar_field_uses_resolved_type() {
        let fixture = fixture();
        let title = fixed(
            &fixture,
            "title",
            FieldOptions::new().with_form_field_option("required", false),
        );
        let mut builder = fixture.contractor.form_builder("post", json!({}));
        fixture.contractor.add_field(&mut builder, &title).unwrap();

        let entry = builder.get("title").unwrap();
        assert_eq!(entry.widget_type(), "text");
        assert_eq!(entry.options().get("required"), Some(&json!(false)));
    }

    #[test]
    fn many_to_many_keeps_one_to_many_widget_name() {
        let fixture = fixture();
        let tags = fixed(&fixture, "tags", FieldOptions::new());
        let mut builder = fixture.contractor.form_builder("post", json!({}));
        fixture.contractor.add_field(&mut builder, &tags).unwrap();

        let entry = builder.get("tags").unwrap();
        assert_eq!(entry.widget_type(), "doctrine_orm_one_to_many");
        assert_eq!(entry.options().get("multiple"), Some(&json!(true)));
        assert_eq!(entry.options().get("class"), Some(&json!("Blog\\Tag")));
        assert_eq!(entry.options().get("em"), Some(&json!("default")));
        assert_eq!(
            entry.options().field_description.as_ref().unwrap().name(),
            "tags"
        );
    }

    #[test]
    fn many_to_one_defaults() {
        let fixture = fixture();
        let author = fixed(&fixture, "author", FieldOptions::new());
        let mut builder = fixture.contractor.form_builder("post", json!({}));
        fixture.contractor.add_field(&mut builder, &author).unwrap();

        let entry = builder.get("author").unwrap();
        assert_eq!(entry.widget_type(), "doctrine_orm_one_to_many");
        assert_eq!(entry.options().get("expanded"), Some(&json!(false)));
        assert_eq!(entry.options().get("edit"), Some(&json!("standard")));
        assert_eq!(entry.options().get("class"), Some(&json!("Blog\\User")));
        assert!(entry.options().field_description.is_some());
    }

    #[test]
    fn many_to_one_widget_options_win() {
        let fixture = fixture();
        let author = fixed(
            &fixture,
            "author",
            FieldOptions::new()
                .with_form_field_type("sonata_type_model")
                .with_form_field_option("expanded", true),
        );
        let mut builder = fixture.contractor.form_builder("post", json!({}));
        fixture.contractor.add_field(&mut builder, &author).unwrap();

        let entry = builder.get("author").unwrap();
        assert_eq!(entry.widget_type(), "sonata_type_model");
        assert_eq!(entry.options().get("expanded"), Some(&json!(true)));
    }

    #[test]
    fn one_to_one_list_mode_uses_text_with_transformer() {
        let fixture = fixture();
        let cover = fixed(&fixture, "cover", FieldOptions::new().with_edit(EditMode::List));
        let mut builder = fixture.contractor.form_builder("post", json!({}));
        fixture.contractor.add_field(&mut builder, &cover).unwrap();

        let entry = builder.get("cover").unwrap();
        assert_eq!(entry.widget_type(), "text");
        assert_eq!(
            entry.options().value_transformer,
            Some(ValueTransformer::EntityToId {
                entity_manager: "default".into(),
                class_name: "Blog\\Image".into(),
            })
        );
    }

    #[test]
    fn one_to_one_custom_widget() {
        let fixture = fixture();
        let cover = fixed(
            &fixture,
            "cover",
            FieldOptions::new().with_form_field_type("image_picker"),
        );
        let mut builder = fixture.contractor.form_builder("post", json!({}));
        fixture.contractor.add_field(&mut builder, &cover).unwrap();

        let entry = builder.get("cover").unwrap();
        assert_eq!(entry.widget_type(), "image_picker");
        assert!(entry.options().value_transformer.is_some());
    }

    #[test]
    fn one_to_one_falls_back_to_widget_factory() {
        let fixture = fixture();
        let cover = fixed(&fixture, "cover", FieldOptions::new());
        let mut builder = fixture.contractor.form_builder("post", json!({}));
        fixture.contractor.add_field(&mut builder, &cover).unwrap();

        let entry = builder.get("cover").unwrap();
        assert_eq!(entry.widget_type(), "entity");
        assert_eq!(entry.options().get("property_path"), Some(&json!("cover")));
        assert_eq!(entry.options().get("data_class"), Some(&json!("Blog\\Post")));
    }

    #[test]
    fn one_to_many_inline_becomes_single_collection() {
        let fixture = fixture();
        let comments = fixed(
            &fixture,
            "comments",
            FieldOptions::new()
                .with_edit(EditMode::Inline)
                .with_form_field_option("allow_add", true),
        );
        let mut builder = fixture.contractor.form_builder("post", json!({}));
        fixture.contractor.add_field(&mut builder, &comments).unwrap();

        assert_eq!(builder.len(), 1);
        let entry = builder.get("comments").unwrap();
        assert_eq!(entry.widget_type(), "sonata_admin_collection");
        assert_eq!(entry.options().get("allow_add"), Some(&json!(true)));
        let prototype = entry.options().prototype.as_ref().unwrap();
        assert_eq!(prototype.widget_type(), "form");
        assert_eq!(prototype.data(), Some(&json!({ "message": "" })));
        assert_eq!(prototype.get("message").unwrap().widget_type(), "textarea");
        assert_eq!(prototype.lineage(), ["Blog\\Post", "Blog\\Comment"]);
        assert_eq!(builder.lineage(), ["Blog\\Post"]);
    }

    #[test]
    fn one_to_many_standard_is_a_multi_select() {
        let fixture = fixture();
        let comments = fixed(&fixture, "comments", FieldOptions::new());
        let mut builder = fixture.contractor.form_builder("post", json!({}));
        fixture.contractor.add_field(&mut builder, &comments).unwrap();

        let entry = builder.get("comments").unwrap();
        assert_eq!(entry.widget_type(), "doctrine_orm_one_to_many");
        assert_eq!(entry.options().get("multiple"), Some(&json!(true)));
    }

    #[rstest]
    #[case(AssociationKind::OneToOne)]
    #[case(AssociationKind::OneToMany)]
    #[case(AssociationKind::ManyToOne)]
    #[case(AssociationKind::ManyToMany)]
    fn child_form_requires_association_admin(#[case] kind: AssociationKind) {
        let contractor = FormContractor::default();
        let descriptor = FieldDescriptor::new("related")
            .with_association_mapping(AssociationMapping {
                field_name: "related".into(),
                target_entity: "Blog\\Missing".into(),
                kind,
                mapped_by: None,
                inversed_by: None,
            })
            .with_options(FieldOptions::new().with_edit(EditMode::Inline));
        let mut builder = contractor.form_builder("post", json!({}));

        let err = contractor
            .define_child_form_builder(&mut builder, &descriptor, None)
            .unwrap_err();
        assert!(matches!(
            err,
            FormsError::MissingAssociationAdmin { ref field_name } if field_name == "related"
        ));
        assert!(builder.is_empty());
    }

    #[test]
    fn child_form_uses_explicit_field_name() {
        let fixture = fixture();
        let comments = fixed(
            &fixture,
            "comments",
            FieldOptions::new().with_edit(EditMode::Inline),
        );
        let mut builder = fixture.contractor.form_builder("post", json!({}));
        let child = fixture
            .contractor
            .define_child_form_builder(&mut builder, &comments, Some("new_comment"))
            .unwrap();
        assert!(child.has("message"));
        assert!(builder.has("new_comment"));
        assert!(!builder.has("comments"));
    }

    #[test]
    fn relational_field_without_admin_fails() {
        let contractor = FormContractor::default();
        let descriptor = FieldDescriptor::new("tags").with_type(AssociationKind::ManyToMany);
        let mut builder = contractor.form_builder("post", json!({}));
        assert!(matches!(
            contractor.add_field(&mut builder, &descriptor),
            Err(FormsError::MissingAdmin { .. })
        ));
    }

    #[test]
    fn ensure_min_instances_tops_up_collection() {
        let fixture = fixture();
        let comments = fixed(
            &fixture,
            "comments",
            FieldOptions::new().with_edit(EditMode::Inline).with_min(3),
        );
        let mut post = json!({ "comments": [{ "message": "first" }] });

        let added = fixture
            .contractor
            .ensure_min_instances(&mut post, &comments)
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(
            post["comments"],
            json!([{ "message": "first" }, { "message": "" }, { "message": "" }])
        );

        let added = fixture
            .contractor
            .ensure_min_instances(&mut post, &comments)
            .unwrap();
        assert_eq!(added, 0);
    }

    #[test]
    fn ensure_min_instances_ignores_non_inline_fields() {
        let fixture = fixture();
        let comments = fixed(&fixture, "comments", FieldOptions::new().with_min(2));
        let mut post = json!({});
        assert_eq!(
            fixture
                .contractor
                .ensure_min_instances(&mut post, &comments)
                .unwrap(),
            0
        );
        assert_eq!(post, json!({}));
    }

    #[test]
    fn add_new_instance_creates_missing_collection() {
        let fixture = fixture();
        let comments = fixed(&fixture, "comments", FieldOptions::new());
        let mut post = json!({ "comments": null });
        fixture
            .contractor
            .add_new_instance(&mut post, &comments)
            .unwrap();
        assert_eq!(post["comments"], json!([{ "message": "" }]));
    }

    #[test]
    fn add_new_instance_rejects_non_collections() {
        let fixture = fixture();
        let comments = fixed(&fixture, "comments", FieldOptions::new());

        let mut post = json!({ "comments": "oops" });
        let err = fixture
            .contractor
            .add_new_instance(&mut post, &comments)
            .unwrap_err();
        assert!(matches!(err, FormsError::InvalidInstance { .. }));

        let mut not_a_record = json!([1, 2]);
        assert!(fixture
            .contractor
            .add_new_instance(&mut not_a_record, &comments)
            .is_err());
    }
}
