use thiserror::Error;

/// Errors from loading `.proto` schema files into a descriptor pool.
///
/// Every variant names the file it concerns; the analysis layer relies on
/// that when downgrading to its own status kinds.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("{path}: file already registered in source tree")]
    DuplicateFile { path: String },

    #[error("{path}: not found in source tree")]
    FileNotFound { path: String },

    #[error("{path}: content is not valid UTF-8")]
    InvalidUtf8 { path: String },

    /// Lex or parse failure; line/column are 1-indexed for display.
    #[error("{path}:{line}:{column}: {message}")]
    Parse {
        path: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{path}: duplicate symbol '{symbol}'")]
    DuplicateSymbol { path: String, symbol: String },

    #[error("{path}: unresolved type '{type_name}' for '{context}'")]
    UnresolvedType {
        path: String,
        type_name: String,
        context: String,
    },
}

impl SchemaError {
    /// The file the error concerns.
    pub fn path(&self) -> &str {
        match self {
            Self::DuplicateFile { path }
            | Self::FileNotFound { path }
            | Self::InvalidUtf8 { path }
            | Self::Parse { path, .. }
            | Self::DuplicateSymbol { path, .. }
            | Self::UnresolvedType { path, .. } => path,
        }
    }
}
