use thiserror::Error;

/// Every failure the parsing/validation/generation pipeline can raise.
/// All variants carry human-readable messages and propagate immediately at
/// the point of detection; generation for the offending translation unit is
/// abandoned and the message surfaces verbatim to the driver.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}, column {column}: {msg}")]
    ParseError {
        msg:    String,
        line:   usize,
        column: usize,
    },

    #[error("Unresolved type reference {name} at line {line}, column {column}")]
    UnresolvedReference {
        name:   String,
        line:   usize,
        column: usize,
    },

    #[error("The type {type_name} does not support the attribute \"{attribute}\"")]
    UnsupportedAttribute {
        type_name: String,
        attribute: String,
    },

    #[error("Only one of annotation, non_empty, in_list and not_eq may be used on field \"{0}\"")]
    ExclusiveAttributes(String),

    #[error("The external name {name} is used twice in enum {enum_name}")]
    DuplicateEnumName { enum_name: String, name: String },

    #[error("Generator error: {0}")]
    GenError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
