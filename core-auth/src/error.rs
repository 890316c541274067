use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Account created but profile could not be saved for {user_id}: {source}")]
    ProfileCreation {
        user_id: String,
        #[source]
        source: BridgeError,
    },

    #[error("Auth back end error: {0}")]
    Remote(#[source] BridgeError),
}

impl AuthError {
    pub(crate) fn required(field: &str) -> Self {
        AuthError::Validation {
            field: field.to_string(),
            message: "is required".to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AuthError::Validation { .. } | AuthError::PasswordMismatch
        )
    }
}

impl From<BridgeError> for AuthError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Unauthorized(message) => AuthError::InvalidCredentials(message),
            other => AuthError::Remote(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
