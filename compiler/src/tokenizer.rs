use crate::error::CompileError;
use crate::utils::{error, quote};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref TOKEN_REGEX: Regex = Regex::new(
        r#"(///[^\n]*|//[^\n]*|"(?:[^"\\\n]|\\.)*"|->|-?\d+\.\d+|-?\d+|\b[A-Za-z_][A-Za-z0-9_]*\b|[=;{}\[\]()<>,]|\s+)"#
    )
    .unwrap();
    pub static ref WHITESPACE_RX: Regex = Regex::new(r"^\s+$").unwrap();
}

/// One source token. `start..end` is the byte span in the original text,
/// kept so the parser can capture default literals verbatim.
#[derive(Debug, PartialEq)]
pub struct Token {
    pub text:   String,
    pub line:   usize,
    pub column: usize,
    pub start:  usize,
    pub end:    usize,
}

/// Splits source text into tokens. Whitespace and `//` comments are
/// dropped; `///` documentation comments are kept as tokens so the parser
/// can attach them to the following declaration. A zero-length EOF token is
/// appended.
pub fn tokenize(text: &str) -> Result<Vec<Token>, CompileError> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut column = 1;
    let mut last_end = 0;

    for mat in TOKEN_REGEX.find_iter(text) {
        let start = mat.start();
        let end = mat.end();
        let part = mat.as_str();

        if start > last_end {
            let unexpected = &text[last_end..start];
            return Err(error(
                &format!("Syntax error: {}", quote(unexpected)),
                line,
                column,
            ));
        }

        let is_doc = part.starts_with("///");
        let is_comment = part.starts_with("//") && !is_doc;
        if !WHITESPACE_RX.is_match(part) && !is_comment {
            tokens.push(Token {
                text: part.to_string(),
                line,
                column,
                start,
                end,
            });
        }

        let newline_count = part.matches('\n').count();
        if newline_count > 0 {
            line += newline_count;
            if let Some(last_line_part) = part.split('\n').last() {
                column = last_line_part.len() + 1;
            }
        } else {
            column += part.len();
        }

        last_end = end;
    }

    if last_end != text.len() {
        let unexpected = &text[last_end..];
        return Err(error(
            &format!("Syntax error: {}", quote(unexpected)),
            line,
            column,
        ));
    }

    tokens.push(Token {
        text: String::new(),
        line,
        column,
        start: text.len(),
        end: text.len(),
    });
    Ok(tokens)
}
