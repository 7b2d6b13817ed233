//! Form mapping configuration loaded through figment.
//!
//! Precedence, lowest first: built-in defaults, an optional config file
//! (TOML, YAML or JSON, picked by extension), then `CRUDHAMMER_FORMS_*`
//! environment variables. Nested keys use `__` in variable names, e.g.
//! `CRUDHAMMER_FORMS_DATETIME_YEARS__START=1970`.

use std::io;
use std::path::Path;

use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{FormsError, Result};
use crate::types::AssociationKind;

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "CRUDHAMMER_FORMS_";

/// Template names used when a descriptor has none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Scalar field template, `{type}` is replaced with the storage type
    pub pattern: String,
    pub one_to_one: String,
    pub one_to_many: String,
    pub many_to_one: String,
    pub many_to_many: String,
}

impl TemplateConfig {
    pub fn for_association(&self, kind: AssociationKind) -> &str {
        match kind {
            AssociationKind::OneToOne => &self.one_to_one,
            AssociationKind::OneToMany => &self.one_to_many,
            AssociationKind::ManyToOne => &self.many_to_one,
            AssociationKind::ManyToMany => &self.many_to_many,
        }
    }

    pub fn for_scalar(&self, storage_type: &str) -> String {
        self.pattern.replace("{type}", storage_type)
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            pattern: "CRUD/edit_{type}.html.twig".into(),
            one_to_one: "CRUD/edit_orm_one_to_one.html.twig".into(),
            one_to_many: "CRUD/edit_orm_one_to_many.html.twig".into(),
            many_to_one: "CRUD/edit_orm_many_to_one.html.twig".into(),
            many_to_many: "CRUD/edit_orm_many_to_many.html.twig".into(),
        }
    }
}

/// Inclusive range of years offered by datetime widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

/// Widest year range a datetime widget may offer.
pub const MAX_YEAR_SPAN: i64 = 1000;

impl YearRange {
    pub fn years(&self) -> Vec<Value> {
        (self.start..=self.end).map(Value::from).collect()
    }

    /// Reject reversed ranges and ranges wider than [`MAX_YEAR_SPAN`].
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| FormsError::InvalidYearRange {
            start: self.start,
            end: self.end,
            reason,
        };
        if self.start > self.end {
            return Err(invalid("start is after end".into()));
        }
        let span = i64::from(self.end) - i64::from(self.start) + 1;
        if span > MAX_YEAR_SPAN {
            return Err(invalid(format!("spans {span} years, at most {MAX_YEAR_SPAN} allowed")));
        }
        Ok(())
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            start: 1900,
            end: 2100,
        }
    }
}

/// Settings for [`crate::FormContractor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormsConfig {
    /// Extra storage type → widget type entries
    pub form_types: IndexMap<String, String>,
    /// Default picker for many-to-many and many-to-one fields
    pub relation_widget: String,
    /// Widget wrapping inline one-to-many prototypes
    pub collection_widget: String,
    /// Base type of nested child forms
    pub child_form_type: String,
    /// Widget for one-to-one fields in `list` edit mode
    pub list_widget: String,
    /// Default `widget_form_field` for inline one-to-many fields
    pub inline_field_group: String,
    pub templates: TemplateConfig,
    pub datetime_years: YearRange,
    /// Maximum number of model classes on one inline chain, root form included
    pub max_inline_depth: usize,
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            form_types: IndexMap::new(),
            // many-to-many pickers share the one-to-many widget name
            relation_widget: "doctrine_orm_one_to_many".into(),
            collection_widget: "sonata_admin_collection".into(),
            child_form_type: "form".into(),
            list_widget: "text".into(),
            inline_field_group: "EditableFieldGroup".into(),
            templates: TemplateConfig::default(),
            datetime_years: YearRange::default(),
            max_inline_depth: 8,
        }
    }
}

impl FormsConfig {
    /// Defaults overlaid with environment variables.
    pub fn load() -> Result<Self> {
        Self::extract(Self::figment(None)?)
    }

    /// Defaults, then `path`, then environment variables.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::extract(Self::figment(Some(path.as_ref()))?)
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: FormsConfig = figment.extract()?;
        config.datetime_years.validate()?;
        debug!(
            form_types = config.form_types.len(),
            max_inline_depth = config.max_inline_depth,
            "forms configuration loaded"
        );
        Ok(config)
    }

    fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(FormsConfig::default()));

        if let Some(path) = path {
            if !path.exists() {
                return Err(FormsError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("config file not found: {}", path.display()),
                )));
            }
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default()
                .to_lowercase();
            figment = match extension.as_str() {
                "toml" => figment.merge(Toml::file(path)),
                "yaml" | "yml" => figment.merge(Yaml::file(path)),
                "json" => figment.merge(Json::file(path)),
                other => {
                    return Err(FormsError::Io(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("unsupported config format: {other:?}"),
                    )))
                }
            };
            debug!(path = %path.display(), "merged forms config file");
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }
}
