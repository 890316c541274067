//! Error types for the Supabase provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Supabase provider errors
#[derive(Error, Debug)]
pub enum SupabaseError {
    /// Provider configuration is unusable
    #[error("Invalid Supabase configuration: {0}")]
    InvalidConfig(String),

    /// No session, or the session was rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// REST or auth API returned an error status
    #[error("Supabase API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Query cannot be expressed in PostgREST syntax
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Storage API rejected an upload
    #[error("Storage upload failed: {0}")]
    StorageError(String),

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Supabase operations
pub type Result<T> = std::result::Result<T, SupabaseError>;

impl From<SupabaseError> for BridgeError {
    fn from(error: SupabaseError) -> Self {
        match error {
            SupabaseError::InvalidConfig(msg) => BridgeError::NotAvailable(msg),
            SupabaseError::AuthenticationFailed(msg) => BridgeError::Unauthorized(msg),
            SupabaseError::ApiError {
                status_code,
                message,
            } => BridgeError::Remote {
                status: Some(status_code),
                message,
            },
            SupabaseError::InvalidQuery(msg) => BridgeError::OperationFailed(msg),
            SupabaseError::StorageError(msg) => BridgeError::Upload(msg),
            SupabaseError::ParseError(msg) => BridgeError::Remote {
                status: None,
                message: format!("Parse error: {}", msg),
            },
            SupabaseError::BridgeError(e) => e,
        }
    }
}
