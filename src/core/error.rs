use thiserror::Error;

/// Errors that can occur while building, validating or exchanging documents.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EfattureError {
    /// A path segment did not match `Tag` or `Tag[n]`.
    #[error("could not parse segment '{segment}' of path '{path}'")]
    PathSyntax { path: String, segment: String },

    /// The tree is not in the shape an operation expects (a value written on a
    /// branch, a child created under a valued leaf, a missing root).
    #[error("structural error: {0}")]
    Structural(String),

    /// A caller-supplied argument was rejected at the API boundary.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The first violation reported by a document's validators.
    #[error("validation failed: {0}")]
    Validation(ValidationError),

    /// XML parsing or serialization error.
    #[error("XML error: {0}")]
    Xml(String),

    /// The remote service answered outside its contract.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The remote service reported a domain error.
    #[error("API error [{code}]: {message}")]
    Api { code: String, message: String },

    /// Digest mismatch on an inbound message.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Signed content could not be opened.
    #[error("signature error: {0}")]
    Signature(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EfattureError {
    /// The validation code carried by [`EfattureError::Validation`] or
    /// [`EfattureError::Api`], if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Validation(e) => Some(&e.code),
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// A single validation failure: a taxonomy code plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Error code, e.g. "00400" for business rules or "1871" for schema errors.
    pub code: String,
    /// Description including the offending values where available.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl ValidationError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<ValidationError> for EfattureError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}
