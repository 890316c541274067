use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] core_auth::AuthError),

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),
}

impl CoreError {
    /// Whether the failure came from rejected user input.
    pub fn is_validation(&self) -> bool {
        match self {
            CoreError::Auth(err) => err.is_validation(),
            CoreError::Library(err) => err.is_validation(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
