use thiserror::Error;

/// Errors raised by the builder store when an operation refers to something
/// that does not exist. The store is left untouched whenever one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    #[error("Block '{0}' does not exist in the current fable")]
    UnknownBlock(String),

    #[error("Factory '{factory}' of plugin '{plugin}' is not in the catalogue")]
    UnknownFactory { plugin: String, factory: String },

    #[error("Factory '{factory}' has no configuration option named '{option}'")]
    UnknownOption { factory: String, option: String },

    #[error("Invalid value '{found}' for option '{option}': expected {expected}")]
    InvalidValue {
        option: String,
        expected: String,
        found: String,
    },
}

/// Errors that can occur while talking to the fable backend.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("Request to '{url}' failed: {message}")]
    Transport { url: String, message: String },

    #[error("Request to '{0}' timed out")]
    Timeout(String),

    #[error("Backend answered {status} for '{url}': {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Fable '{0}' was not found")]
    NotFound(String),

    #[error("Malformed response from '{url}': {message}")]
    Schema { url: String, message: String },

    #[error("Failed to serialize request: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Whether the calling layer may sensibly retry the request.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport { .. } | ApiError::Timeout(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Errors that can occur when importing or exporting a fable file.
#[derive(Error, Debug, Clone)]
pub enum FableFileError {
    #[error("Could not access '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse fable JSON: {0}")]
    Parse(String),

    #[error("Failed to serialize fable JSON: {0}")]
    Serialize(String),
}
