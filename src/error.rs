use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

pub type UiResult<T> = Result<T, UiError>;

#[derive(Debug, Error, Diagnostic)]
pub enum UiError {
    #[error("narrative engine call failed: {0}")]
    #[diagnostic(code("vn.ui.engine"))]
    Engine(String),
    #[error("choice index out of range")]
    #[diagnostic(code("vn.ui.invalid_choice"))]
    InvalidChoice,
    #[error("narrative exhausted")]
    #[diagnostic(code("vn.ui.end_of_narrative"))]
    EndOfNarrative,
    #[error("no input is currently required")]
    #[diagnostic(code("vn.ui.input_not_required"))]
    InputNotRequired,
    #[error("script validation failed: {0}")]
    #[diagnostic(code("vn.ui.invalid_script"))]
    InvalidScript(String),
    #[error("serialization error: {message}")]
    #[diagnostic(code("vn.ui.serialization"))]
    Serialization {
        message: String,
        #[source_code]
        src: String,
        #[label("here")]
        span: SourceSpan,
    },
    #[error("configuration error: {0}")]
    #[diagnostic(code("vn.ui.config"))]
    Config(String),
    #[error("io error: {0}")]
    #[diagnostic(code("vn.ui.io"))]
    Io(#[from] std::io::Error),
}

impl UiError {
    /// Builds a serialization error pointing at the offending JSON location.
    pub fn from_json(input: &str, err: &serde_json::Error) -> Self {
        let offset = json_error_offset(input, err);
        let length = usize::from(offset < input.len());
        UiError::Serialization {
            message: err.to_string(),
            src: input.to_string(),
            span: (offset, length).into(),
        }
    }
}

/// Byte offset of serde_json's 1-based line/column, clamped to a char boundary.
fn json_error_offset(input: &str, err: &serde_json::Error) -> usize {
    let line_start: usize = input
        .split_inclusive('\n')
        .take(err.line().saturating_sub(1))
        .map(str::len)
        .sum();
    let mut offset = (line_start + err.column().saturating_sub(1)).min(input.len());
    while !input.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
