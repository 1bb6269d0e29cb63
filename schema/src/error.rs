use thiserror::Error;

/// Runtime failures raised while baking a dynamic dictionary or marshalling
/// Lua stack values. Every variant carries a human-readable message; callers
/// distinguish failure categories only by the message content.
#[derive(Debug, Error)]
pub enum BakeError {
    #[error("Missing required field \"{0}\"")]
    MissingField(String),

    #[error("Missing key \"{key}\" in table \"{table}\"")]
    MissingKey { table: String, key: String },

    #[error("Expected {expected} but found {found} for \"{key}\"")]
    TypeMismatch {
        key:      String,
        expected: String,
        found:    String,
    },

    #[error("Expected {expected} elements but found {found} for \"{key}\"")]
    WrongLength {
        key:      String,
        expected: usize,
        found:    usize,
    },

    #[error("No variant alternative matches the stored value for \"{0}\"")]
    NoVariantMatch(String),

    #[error("Missing argument \"{0}\"")]
    MissingArgument(String),

    #[error("Variant types are not supported in function signatures (\"{0}\")")]
    UnsupportedVariant(String),

    #[error("Invalid default expression {0}")]
    BadDefault(String),

    #[error("Invalid name \"{value}\" for enum {enum_name}")]
    InvalidEnumName { enum_name: String, value: String },

    #[error("Internal error: {0}")]
    Internal(String),
}
