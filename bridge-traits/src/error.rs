use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    #[error("Remote request failed (status {status:?}): {message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },

    #[error("Blob upload failed: {0}")]
    Upload(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// Whether the error means no user session could be resolved.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BridgeError::Unauthorized(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
