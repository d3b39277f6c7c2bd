//! Registry error types.

use thiserror::Error;

/// Result type for registry construction.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur during registry construction.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Duplicate model name: {0}")]
    DuplicateModelName(String),

    #[error("Duplicate field name: {field} on model {model}")]
    DuplicateFieldName { model: String, field: String },

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Unknown related model {rel_model} for field {model}/{field}")]
    UnknownRelModel {
        model: String,
        field: String,
        rel_model: String,
    },

    #[error("Unknown inverse field {inverse} on {rel_model} for field {model}/{field}")]
    UnknownInverse {
        model: String,
        field: String,
        rel_model: String,
        inverse: String,
    },

    #[error("Inverse of {model}/{field} does not point back: {message}")]
    InverseMismatch {
        model: String,
        field: String,
        message: String,
    },

    #[error("Incompatible inverse for {model}/{field}: {relation} cannot pair with {inverse_relation}")]
    IncompatibleInverse {
        model: String,
        field: String,
        relation: String,
        inverse_relation: String,
    },

    #[error("Field {model}/{field} cannot be causal: only one2many and one2one are")]
    CausalNotAllowed { model: String, field: String },

    #[error("Field {model}/{field} cannot be both computed and related")]
    ComputeAndRelated { model: String, field: String },

    #[error("Invalid related path {path} on field {model}/{field}: {message}")]
    InvalidRelated {
        model: String,
        field: String,
        path: String,
        message: String,
    },

    #[error("Unknown dependency {dependency} of computed field {model}/{field}")]
    UnknownDependency {
        model: String,
        field: String,
        dependency: String,
    },

    #[error("Identifying field {field} of model {model} must be an attribute")]
    InvalidIdentifyingField { model: String, field: String },
}

impl RegistryError {
    pub fn duplicate_field_name(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self::DuplicateFieldName {
            model: model.into(),
            field: field.into(),
        }
    }

    pub fn unknown_rel_model(
        model: impl Into<String>,
        field: impl Into<String>,
        rel_model: impl Into<String>,
    ) -> Self {
        Self::UnknownRelModel {
            model: model.into(),
            field: field.into(),
            rel_model: rel_model.into(),
        }
    }

    pub fn inverse_mismatch(
        model: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InverseMismatch {
            model: model.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_related(
        model: impl Into<String>,
        field: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidRelated {
            model: model.into(),
            field: field.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn unknown_dependency(
        model: impl Into<String>,
        field: impl Into<String>,
        dependency: impl Into<String>,
    ) -> Self {
        Self::UnknownDependency {
            model: model.into(),
            field: field.into(),
            dependency: dependency.into(),
        }
    }
}
