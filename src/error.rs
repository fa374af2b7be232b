// Error types for specification synthesis

use thiserror::Error;

/// Result type alias for synthesis operations.
pub type Result<T> = std::result::Result<T, SpecError>;

/// Errors raised while building or serializing a specification graph.
#[derive(Debug, Error)]
pub enum SpecError {
    /// A tooltip field has no label or value template.
    #[error("No tooltip {kind} template for field '{field}'")]
    MissingTemplate { kind: &'static str, field: String },

    /// A typed reference points at a name that is not declared in scope.
    #[error("Unresolved {kind} reference '{name}' in {context}")]
    UnresolvedReference {
        kind: &'static str,
        name: String,
        context: String,
    },

    /// Two entities of the same kind share a name within one scope.
    #[error("Duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    /// Serialization to the engine's JSON format failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpecError {
    pub fn missing_template(kind: &'static str, field: impl Into<String>) -> Self {
        Self::MissingTemplate {
            kind,
            field: field.into(),
        }
    }

    pub fn unresolved(kind: &'static str, name: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            kind,
            name: name.into(),
            context: context.into(),
        }
    }

    pub fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        Self::DuplicateName {
            kind,
            name: name.into(),
        }
    }
}
