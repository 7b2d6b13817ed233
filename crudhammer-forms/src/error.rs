//! Error types for form construction

use thiserror::Error;

/// Result type for form mapping operations
pub type Result<T> = std::result::Result<T, FormsError>;

/// How bad a [`FormsError`] is for the surrounding admin page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The form can still be rendered, possibly degraded
    Warning,
    /// The current form-build pass cannot complete
    Error,
}

/// Errors raised while normalizing field descriptors or building forms.
///
/// Every variant is a misconfiguration rather than a transient fault, so none
/// of them are retried. They propagate to the page controller as-is.
#[derive(Debug, Error)]
pub enum FormsError {
    /// No storage type after merging metadata into the descriptor
    #[error("please define a type for field `{field}` in `{admin}`")]
    MissingType { field: String, admin: String },

    /// No rule produced a widget type name
    #[error("no known form type for field `{field_name}` (`{storage_type}`)")]
    NoWidgetType {
        field_name: String,
        storage_type: String,
    },

    /// Inline edit requested without a sub-admin definition
    #[error("inline mode for field `{field_name}` requires an admin definition")]
    MissingAssociationAdmin { field_name: String },

    /// Association field used before its mapping was populated
    #[error("field `{field_name}` has no association mapping")]
    MissingAssociationMapping { field_name: String },

    /// Owning admin was never attached, or has been dropped
    #[error("field `{field_name}` is not attached to an admin")]
    MissingAdmin { field_name: String },

    /// Inline form would re-enter a model class already being edited
    #[error("inline field `{field_name}` re-enters `{class}`")]
    InlineCycle { field_name: String, class: String },

    /// Inline forms nested deeper than the configured bound
    #[error("inline field `{field_name}` exceeds the maximum nesting depth of {max_depth}")]
    InlineDepthExceeded { field_name: String, max_depth: usize },

    /// Object handed to a collection operation has the wrong shape
    #[error("cannot add an instance to `{field_name}`: {reason}")]
    InvalidInstance { field_name: String, reason: String },

    /// Datetime year range is reversed or too wide
    #[error("invalid datetime year range {start}..={end}: {reason}")]
    InvalidYearRange { start: i32, end: i32, reason: String },

    /// Configuration could not be loaded or extracted
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormsError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FormsError::Io(_) | FormsError::Yaml(_) | FormsError::Config(_) => ErrorSeverity::Error,
            FormsError::MissingType { .. }
            | FormsError::NoWidgetType { .. }
            | FormsError::MissingAssociationAdmin { .. }
            | FormsError::MissingAssociationMapping { .. }
            | FormsError::MissingAdmin { .. }
            | FormsError::InlineCycle { .. }
            | FormsError::InlineDepthExceeded { .. }
            | FormsError::InvalidYearRange { .. } => ErrorSeverity::Error,
            FormsError::InvalidInstance { .. } => ErrorSeverity::Warning,
        }
    }
}

impl From<figment::Error> for FormsError {
    fn from(error: figment::Error) -> Self {
        FormsError::Config(Box::new(error))
    }
}
