use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Failures surfaced by the repositories.
///
/// No variant implies a partial local mutation: every repository returns a
/// fresh snapshot only on success, so the caller's previous snapshot stays
/// valid whenever one of these is returned.
#[derive(Error, Debug)]
pub enum LibraryError {
    /// Input rejected before any remote call
    #[error("Invalid input: {field} - {message}")]
    Validation { field: String, message: String },

    /// No authenticated user, or the session belongs to someone else
    #[error("Not authenticated: {0}")]
    Auth(String),

    /// Query or mutation failed on the back end
    #[error("Remote error: {0}")]
    Remote(#[source] BridgeError),

    /// Catalog read or insert failed; carries the uploaded blob left behind
    /// when the insert fails after a successful upload
    #[error("Catalog error: {source}")]
    Catalog {
        #[source]
        source: BridgeError,
        orphaned_blob: Option<String>,
    },

    /// Blob upload failed; no catalog row was written
    #[error("Upload failed: {0}")]
    Upload(#[source] BridgeError),
}

impl LibraryError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        LibraryError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, LibraryError::Validation { .. })
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, LibraryError::Auth(_))
    }

    /// Path of a blob uploaded by a publish whose insert failed
    pub fn orphaned_blob(&self) -> Option<&str> {
        match self {
            LibraryError::Catalog { orphaned_blob, .. } => orphaned_blob.as_deref(),
            _ => None,
        }
    }
}

impl From<BridgeError> for LibraryError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::Unauthorized(message) => LibraryError::Auth(message),
            other => LibraryError::Remote(other),
        }
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(error: serde_json::Error) -> Self {
        LibraryError::Remote(BridgeError::Serialization(error))
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
