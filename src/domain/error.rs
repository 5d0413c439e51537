//! Domain error types.

/// Top-level error type for grainledger.
///
/// Undefined computations (no contracts, no production estimate, no market
/// data) are not errors; they surface as `None` from the aggregation
/// functions.
#[derive(Debug, thiserror::Error)]
pub enum GrainError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("import error: {reason}")]
    Import { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GrainError {
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        GrainError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        GrainError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Process exit status for this error class.
    pub fn exit_status(&self) -> u8 {
        match self {
            GrainError::Io(_) => 1,
            GrainError::ConfigParse { .. }
            | GrainError::ConfigMissing { .. }
            | GrainError::ConfigInvalid { .. } => 2,
            GrainError::Database { .. } | GrainError::DatabaseQuery { .. } => 3,
            GrainError::Validation { .. } | GrainError::Import { .. } => 4,
            GrainError::NotFound { .. } => 5,
        }
    }
}

impl From<&GrainError> for std::process::ExitCode {
    fn from(err: &GrainError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
