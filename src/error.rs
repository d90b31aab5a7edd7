use crate::exclusivity::ValidationFailure;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for shape resolution, example generation and schema mapping
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Every resolution level missed for the requested key
    #[error("no shape registered for resource `{resource}` ({method} {action}, status {status:?})")]
    ShapeNotFound {
        resource: String,
        method: String,
        action: String,
        status: Option<u16>,
    },

    /// A pattern or constraint set cannot produce a value
    #[error("cannot generate an example for field `{field}`: {reason}")]
    ExampleGeneration { field: String, reason: String },

    /// The field kind has no mapping rule
    #[error("field `{field}` has kind `{kind}` with no registered mapping rule")]
    UnsupportedFieldKind { field: String, kind: String },

    #[error("shape `{shape}` declares field `{field}` more than once")]
    DuplicateField { shape: String, field: String },

    #[error("exclusive group in shape `{shape}` references unknown field `{field}`")]
    UnknownGroupMember { shape: String, field: String },

    #[error("invalid exclusive group in shape `{shape}`: {reason}")]
    InvalidGroup { shape: String, reason: String },

    #[error("invalid registration {key}: {reason}")]
    InvalidRegistration { key: String, reason: String },

    #[error("a shape is already registered for {0}")]
    DuplicateRegistration(String),

    #[error("resource `{0}` has no resource-level default shape")]
    MissingDefault(String),

    #[error("invalid declaration: {0}")]
    InvalidDeclaration(String),

    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub(crate) fn example(field: &str, reason: impl Into<String>) -> Self {
        Error::ExampleGeneration {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(format!("YAML: {}", err))
    }
}
