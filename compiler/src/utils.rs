use crate::error::CompileError;

/// Quotes a string for error messages and generated text (JSON rules).
pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap()
}

pub fn error(msg: &str, line: usize, column: usize) -> CompileError {
    CompileError::ParseError { msg: msg.to_string(), line, column }
}
