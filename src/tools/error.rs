use thiserror::Error;

/// Outcome of a single tool operation: either the text handed back to the
/// model, or a typed error.
pub type ToolResult = Result<String, ToolError>;

/// Error kinds a tool operation can report
///
/// These are values, not faults: the dispatcher renders them as
/// `Error: {message}` in the response envelope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("Cannot {action} \"{path}\" as it is outside the permitted working directory")]
    PathEscape { action: &'static str, path: String },

    #[error("\"{0}\" is not a directory")]
    NotADirectory(String),

    #[error("File not found or is not a regular file: \"{0}\"")]
    NotAFile(String),

    #[error("File \"{0}\" not found.")]
    NotFound(String),

    #[error("\"{0}\" is not a Python file.")]
    WrongFileType(String),

    #[error("Unknown function: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("{0}")]
    OperationFailed(String),
}

impl ToolError {
    /// Wrap an underlying failure with a short description of what was attempted.
    pub fn failed(what: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::OperationFailed(format!("{what}: {err}"))
    }
}
