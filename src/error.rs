use thiserror::Error;

/// Failure of a single tool call. Always local to the call that produced it.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Function {0} not found")]
    UnknownTool(String),

    #[error("Malformed arguments for {name}: {reason}")]
    MalformedArguments { name: String, reason: String },

    #[error("Invalid arguments for {name}: {reason}")]
    InvalidArguments { name: String, reason: String },

    #[error("{0}")]
    Execution(String),
}

impl From<StoreError> for ToolError {
    fn from(err: StoreError) -> Self {
        Self::Execution(err.to_string())
    }
}

/// Registry construction errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Tool '{0}' is already registered")]
    DuplicateName(String),
}

/// Errors from the items backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Item {0} not found")]
    NotFound(i64),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Items API error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// The fallback inline-call payload could not be parsed.
///
/// Never shown to the user: the dispatcher returns the raw model text instead.
#[derive(Debug, Error)]
pub enum InlineParseFailure {
    #[error("inline call payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("inline call payload has no string 'name' field")]
    MissingName,

    #[error("inline call 'arguments' must be an object")]
    ArgumentsNotObject,
}

pub type ToolResult<T> = Result<T, ToolError>;
pub type StoreResult<T> = Result<T, StoreError>;
