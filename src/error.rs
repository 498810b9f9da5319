//! Error types for the Dribble compiler.
//!
//! Every compile failure is file-scoped and fatal: the pipeline returns a
//! single [`CompilerError`] and no partial output.

#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_INVALID_HEADER: &str = "DRB001";
pub const ERR_UNTERMINATED_BODY: &str = "DRB002";
pub const ERR_MISSING_RENDER: &str = "DRB003";
pub const ERR_MALFORMED_RENDER: &str = "DRB004";

/// The four ways a component file can fail to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    #[error("Invalid component syntax")]
    InvalidHeader,
    #[error("Unterminated component body")]
    UnterminatedBody,
    #[error("Missing render()")]
    MissingRender,
    #[error("Malformed render()")]
    MalformedRender,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidHeader => ERR_INVALID_HEADER,
            ErrorKind::UnterminatedBody => ERR_UNTERMINATED_BODY,
            ErrorKind::MissingRender => ERR_MISSING_RENDER,
            ErrorKind::MalformedRender => ERR_MALFORMED_RENDER,
        }
    }

    fn hint(self) -> &'static str {
        match self {
            ErrorKind::InvalidHeader => {
                "Declare the component as `export ephemeral Name(...) {` or `export persistent Name(...) {`."
            }
            ErrorKind::UnterminatedBody => {
                "Close the component body with a `}` that balances the header's `{`."
            }
            ErrorKind::MissingRender => {
                "Call `render( ... );` once at the top level of the component body."
            }
            ErrorKind::MalformedRender => {
                "`render( ... );` must be the last statement of the body, and every `@if (...) { ... }` must be closed."
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE LOCATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    /// 1-based line/column of a byte offset. Offsets past the end clamp to it.
    pub fn at(text: &str, offset: usize) -> Self {
        let mut end = offset.min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let before = &text[..end];
        let line = before.matches('\n').count() as u32 + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() as u32 + 1;
        Self { line, column }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerError {
    pub code: String,
    pub kind: ErrorKind,
    pub message: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub context: Option<String>,
    pub hints: Vec<String>,
}

impl CompilerError {
    pub fn new(kind: ErrorKind, file: &str, location: SourceLocation) -> Self {
        Self::with_context(kind, file, location, None)
    }

    pub fn with_context(
        kind: ErrorKind,
        file: &str,
        location: SourceLocation,
        context: Option<String>,
    ) -> Self {
        CompilerError {
            code: kind.code().to_string(),
            kind,
            message: kind.to_string(),
            file: file.to_string(),
            line: location.line,
            column: location.column,
            context,
            hints: vec![kind.hint().to_string()],
        }
    }
}

impl std::fmt::Display for CompilerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} in {}", self.message, self.file)?;
        if let Some(context) = &self.context {
            write!(f, " ({})", context)?;
        }
        Ok(())
    }
}

impl std::error::Error for CompilerError {}

// ═══════════════════════════════════════════════════════════════════════════════
// BUILD ERROR
// ═══════════════════════════════════════════════════════════════════════════════

/// Failures of the file-system front ends (CLI, batch build).
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Compile(#[from] CompilerError),

    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}
