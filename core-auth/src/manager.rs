//! Account manager

use std::fmt;
use std::sync::Arc;

use bridge_traits::remote::{AuthGateway, AuthUser, RemoteTableClient, Row};
use core_runtime::logging::redact_if_sensitive;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::{AuthError, Result};

const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 20;

/// Check a username: 3 to 20 ASCII letters, digits or underscores.
///
/// ```
/// use core_auth::validate_username;
///
/// assert!(validate_username("fan_123").is_ok());
/// assert!(validate_username("no spaces").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(AuthError::Validation {
            field: "username".to_string(),
            message: format!(
                "must be {} to {} characters long",
                USERNAME_MIN_LEN, USERNAME_MAX_LEN
            ),
        });
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AuthError::Validation {
            field: "username".to_string(),
            message: "may only contain letters, numbers and underscores".to_string(),
        });
    }

    Ok(())
}

/// Sign-up form input.
#[derive(Clone, Default, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignUpRequest {
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("email", &self.email),
            ("username", &self.username),
            ("password", &self.password),
            ("confirm_password", &self.confirm_password),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::required(field));
            }
        }

        validate_username(self.username.trim())?;

        if self.password != self.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        Ok(())
    }
}

impl fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("email", &redact_if_sensitive("email", &self.email))
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("confirm_password", &"[REDACTED]")
            .finish()
    }
}

/// Sign-up, sign-in and session lookup for e-mail accounts.
///
/// Sign-up writes a `profiles` row (`id`, `username`, `email`) after the
/// gateway created the account. The two steps are not atomic: when the
/// profile insert fails the account exists without a profile and the error
/// says so.
pub struct AccountManager {
    gateway: Arc<dyn AuthGateway>,
    remote: Arc<dyn RemoteTableClient>,
    profiles_table: String,
}

impl AccountManager {
    pub fn new(
        gateway: Arc<dyn AuthGateway>,
        remote: Arc<dyn RemoteTableClient>,
        profiles_table: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            remote,
            profiles_table: profiles_table.into(),
        }
    }

    /// Create an account and its profile row.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<AuthUser> {
        request.validate()?;

        let email = request.email.trim();
        let username = request.username.trim();

        let user = self
            .gateway
            .sign_up(email, &request.password)
            .await
            .map_err(|err| {
                warn!(
                    email = %redact_if_sensitive("email", email),
                    error = %err,
                    "Sign-up rejected"
                );
                AuthError::from(err)
            })?;

        let mut profile = Row::new();
        profile.insert("id".to_string(), Value::from(user.id.clone()));
        profile.insert("username".to_string(), Value::from(username));
        profile.insert("email".to_string(), Value::from(email));

        if let Err(source) = self.remote.insert(&self.profiles_table, vec![profile]).await {
            warn!(user_id = %user.id, error = %source, "Profile insert failed after sign-up");
            return Err(AuthError::ProfileCreation {
                user_id: user.id,
                source,
            });
        }

        info!(user_id = %user.id, "Account created");
        Ok(user)
    }

    #[instrument(skip(self, email, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::required("email"));
        }
        if password.is_empty() {
            return Err(AuthError::required("password"));
        }

        let user = self.gateway.sign_in(email, password).await.map_err(|err| {
            warn!(
                email = %redact_if_sensitive("email", email),
                error = %err,
                "Sign-in failed"
            );
            AuthError::from(err)
        })?;

        info!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<()> {
        self.gateway.sign_out().await?;
        info!("Signed out");
        Ok(())
    }

    /// The signed-in user; [`AuthError::NotAuthenticated`] without a session.
    pub async fn current_user(&self) -> Result<AuthUser> {
        match self.remote.current_user().await {
            Ok(user) => {
                debug!(user_id = %user.id, "Resolved session");
                Ok(user)
            }
            Err(err) if err.is_unauthorized() => Err(AuthError::NotAuthenticated),
            Err(err) => Err(AuthError::Remote(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_library::testing::{InMemoryBackend, Operation};

    fn manager(backend: &Arc<InMemoryBackend>) -> AccountManager {
        AccountManager::new(backend.clone(), backend.clone(), "profiles")
    }

    fn request() -> SignUpRequest {
        SignUpRequest::new("fan@example.com", "swiftie_89", "hunter22", "hunter22")
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("abc").is_ok());
        assert!(validate_username("A_b_9").is_ok());
        assert!(validate_username(&"a".repeat(20)).is_ok());

        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(21)).is_err());
        assert!(validate_username("fan-club").is_err());
        assert!(validate_username("café_fan").is_err());
    }

    #[test]
    fn test_request_debug_hides_secrets() {
        let rendered = format!("{:?}", request());
        assert!(!rendered.contains("hunter22"));
        assert!(!rendered.contains("fan@example.com"));
        assert!(rendered.contains("swiftie_89"));
    }

    #[tokio::test]
    async fn test_sign_up_creates_profile() {
        let backend = Arc::new(InMemoryBackend::new());
        let accounts = manager(&backend);

        let user = accounts.sign_up(request()).await.unwrap();

        let profiles = backend.rows("profiles");
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0]["id"], Value::from(user.id.clone()));
        assert_eq!(profiles[0]["username"], "swiftie_89");
        assert_eq!(profiles[0]["email"], "fan@example.com");
    }

    #[tokio::test]
    async fn test_sign_up_validation_makes_no_remote_call() {
        let backend = Arc::new(InMemoryBackend::new());
        let accounts = manager(&backend);

        let mut missing = request();
        missing.email = "  ".to_string();
        let err = accounts.sign_up(missing).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation { ref field, .. } if field == "email"));

        let mut bad_name = request();
        bad_name.username = "x".to_string();
        assert!(accounts.sign_up(bad_name).await.unwrap_err().is_validation());

        let mut mismatch = request();
        mismatch.confirm_password = "hunter23".to_string();
        assert!(matches!(
            accounts.sign_up(mismatch).await,
            Err(AuthError::PasswordMismatch)
        ));

        assert_eq!(backend.calls(Operation::SignUp), 0);
        assert_eq!(backend.calls(Operation::Insert), 0);
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_email() {
        let backend = Arc::new(InMemoryBackend::new());
        let accounts = manager(&backend);

        accounts.sign_up(request()).await.unwrap();
        let err = accounts.sign_up(request()).await.unwrap_err();

        assert!(matches!(err, AuthError::Remote(_)));
        assert_eq!(backend.rows("profiles").len(), 1);
    }

    #[tokio::test]
    async fn test_profile_failure_is_reported() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.fail_on(Operation::Insert);
        let accounts = manager(&backend);

        let err = accounts.sign_up(request()).await.unwrap_err();
        assert!(matches!(err, AuthError::ProfileCreation { .. }));
        assert_eq!(backend.calls(Operation::SignUp), 1);
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.register_account("u-1", "fan@example.com", "hunter22");
        let accounts = manager(&backend);

        assert!(matches!(
            accounts.current_user().await,
            Err(AuthError::NotAuthenticated)
        ));

        let user = accounts.sign_in(" fan@example.com ", "hunter22").await.unwrap();
        assert_eq!(user.id, "u-1");
        assert_eq!(accounts.current_user().await.unwrap().id, "u-1");

        accounts.sign_out().await.unwrap();
        assert!(matches!(
            accounts.current_user().await,
            Err(AuthError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_sign_in_failures() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.register_account("u-1", "fan@example.com", "hunter22");
        let accounts = manager(&backend);

        assert!(accounts.sign_in("", "hunter22").await.unwrap_err().is_validation());
        assert!(accounts.sign_in("fan@example.com", "").await.unwrap_err().is_validation());
        assert_eq!(backend.calls(Operation::SignIn), 0);

        assert!(matches!(
            accounts.sign_in("fan@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials(_))
        ));
    }
}
