//! Wire types for the Supabase auth and storage APIs

use bridge_traits::remote::AuthUser;
use serde::{Deserialize, Serialize};

/// Email/password credentials body for sign-up and sign-in
#[derive(Debug, Serialize)]
pub struct CredentialsRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// User object returned by GoTrue
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<UserResponse> for AuthUser {
    fn from(user: UserResponse) -> Self {
        AuthUser {
            id: user.id,
            email: user.email,
        }
    }
}

/// Session returned by a password grant (and by sign-up when email
/// confirmation is disabled)
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: UserResponse,
}

/// Sign-up returns either a full session or only the created user,
/// depending on whether the project requires email confirmation.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(SessionResponse),
    User(UserResponse),
}

/// Storage upload response
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(rename = "Key")]
    pub key: String,
}

/// Error body; the field carrying the message differs between services.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    /// Most specific message available
    pub fn into_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_response_variants() {
        let with_session: SignUpResponse = serde_json::from_str(
            r#"{"access_token":"tok","token_type":"bearer","user":{"id":"u-1","email":"a@b.c"}}"#,
        )
        .unwrap();
        assert!(matches!(with_session, SignUpResponse::Session(s) if s.access_token == "tok"));

        let user_only: SignUpResponse =
            serde_json::from_str(r#"{"id":"u-2","email":"d@e.f","aud":"authenticated"}"#).unwrap();
        assert!(matches!(user_only, SignUpResponse::User(u) if u.id == "u-2"));
    }

    #[test]
    fn test_error_body_message_precedence() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .unwrap();
        assert_eq!(
            body.into_message().as_deref(),
            Some("Invalid login credentials")
        );

        let body: ApiErrorBody = serde_json::from_str(r#"{"code":"23505","message":"duplicate key"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("duplicate key"));
    }
}
