//! Supabase client implementing the remote table and auth contracts

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::remote::{AuthGateway, AuthUser, Filter, RemoteTableClient, Row, SelectQuery};
use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::SupabaseConfig;
use crate::error::{Result, SupabaseError};
use crate::query;
use crate::types::{
    ApiErrorBody, CredentialsRequest, SessionResponse, SignUpResponse, UploadResponse,
    UserResponse,
};

/// Active auth session, held in memory only
#[derive(Debug, Clone)]
struct Session {
    access_token: String,
    user: AuthUser,
}

/// Supabase back end over an injected [`HttpClient`]
///
/// Requests carry the project's anon key as `apikey`, and the session's
/// access token as bearer once a user has signed in. Every request is sent
/// exactly once.
///
/// # Example
///
/// ```ignore
/// let config = SupabaseConfig::new("https://abc.supabase.co", anon_key)?;
/// let client = SupabaseClient::new(http_client, config);
/// client.sign_in("fan@example.com", "secret").await?;
/// let rows = client.select(SelectQuery::new("artists")).await?;
/// ```
pub struct SupabaseClient {
    http_client: Arc<dyn HttpClient>,
    config: SupabaseConfig,
    session: RwLock<Option<Session>>,
}

impl SupabaseClient {
    pub fn new(http_client: Arc<dyn HttpClient>, config: SupabaseConfig) -> Self {
        Self {
            http_client,
            config,
            session: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    /// Whether a session is currently held
    pub fn is_signed_in(&self) -> bool {
        self.session.read().is_some()
    }

    fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    fn store_session(&self, session: SessionResponse) -> AuthUser {
        let user: AuthUser = session.user.into();
        *self.session.write() = Some(Session {
            access_token: session.access_token,
            user: user.clone(),
        });
        user
    }

    /// Attach project headers and the bearer token
    fn authorize(&self, request: HttpRequest) -> HttpRequest {
        let token = self
            .access_token()
            .unwrap_or_else(|| self.config.anon_key().to_string());

        request
            .header("apikey", self.config.anon_key())
            .bearer_token(token)
            .timeout(self.config.request_timeout())
    }

    /// Send once and map non-success statuses
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method;
        let url = request.url.clone();
        let response = self
            .http_client
            .execute(self.authorize(request))
            .await?;

        if response.is_success() {
            debug!(?method, %url, status = response.status, "Supabase request succeeded");
            return Ok(response);
        }

        let message = error_message(&response);
        warn!(?method, %url, status = response.status, %message, "Supabase request failed");

        match response.status {
            401 | 403 => Err(SupabaseError::AuthenticationFailed(message)),
            status_code => Err(SupabaseError::ApiError {
                status_code,
                message,
            }),
        }
    }

    async fn fetch_user(&self) -> Result<AuthUser> {
        if self.access_token().is_none() {
            return Err(SupabaseError::AuthenticationFailed(
                "no active session".to_string(),
            ));
        }

        let request = HttpRequest::new(HttpMethod::Get, self.config.auth_url("user"));
        let response = self.send(request).await?;
        let user: UserResponse = parse(&response)?;
        Ok(user.into())
    }

    async fn fetch_rows(&self, query: SelectQuery) -> Result<Vec<Row>> {
        let params = query::select_params(&query)?;
        let url = format!(
            "{}?{}",
            self.config.rest_url(&query.table),
            query::encode(&params)
        );

        let response = self.send(HttpRequest::new(HttpMethod::Get, url)).await?;
        let rows = query::retain_literal_matches(&query.filters, parse(&response)?);
        debug!(table = %query.table, count = rows.len(), "Fetched rows");
        Ok(rows)
    }

    async fn insert_rows(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let request = HttpRequest::new(HttpMethod::Post, self.config.rest_url(table))
            .header("Prefer", "return=representation")
            .json(&rows)?;

        let response = self.send(request).await?;
        let stored: Vec<Row> = parse(&response)?;
        debug!(table, count = stored.len(), "Inserted rows");
        Ok(stored)
    }

    async fn delete_rows(&self, table: &str, filters: Vec<Filter>) -> Result<()> {
        if filters.is_empty() {
            return Err(SupabaseError::InvalidQuery(format!(
                "refusing to delete from '{}' without filters",
                table
            )));
        }

        let params = query::filter_params(&filters)?;
        let url = format!("{}?{}", self.config.rest_url(table), query::encode(&params));

        self.send(HttpRequest::new(HttpMethod::Delete, url)).await?;
        debug!(table, "Deleted rows");
        Ok(())
    }

    async fn upload(&self, bucket: &str, name: &str, bytes: Bytes) -> Result<String> {
        let url = self.config.storage_url(&format!(
            "object/{}/{}",
            urlencoding::encode(bucket),
            encode_path(name)
        ));
        let size = bytes.len();

        let request = HttpRequest::new(HttpMethod::Post, url)
            .header("Content-Type", content_type_for(name))
            .header("x-upsert", "false")
            .body(bytes);

        let response = self.send(request).await.map_err(|e| match e {
            SupabaseError::StorageError(_) => e,
            other => SupabaseError::StorageError(other.to_string()),
        })?;

        let uploaded: UploadResponse =
            parse(&response).map_err(|e| SupabaseError::StorageError(e.to_string()))?;
        let prefix = format!("{}/", bucket);
        let path = uploaded
            .key
            .strip_prefix(&prefix)
            .unwrap_or(&uploaded.key)
            .to_string();

        info!(bucket, %path, size, "Uploaded blob");
        Ok(path)
    }

    async fn sign_up_account(&self, email: &str, password: &str) -> Result<AuthUser> {
        let request = HttpRequest::new(HttpMethod::Post, self.config.auth_url("signup"))
            .json(&CredentialsRequest { email, password })?;

        let response = self.send(request).await?;
        let user = match parse::<SignUpResponse>(&response)? {
            SignUpResponse::Session(session) => self.store_session(session),
            SignUpResponse::User(user) => user.into(),
        };

        info!(user_id = %user.id, "Account created");
        Ok(user)
    }

    async fn sign_in_account(&self, email: &str, password: &str) -> Result<AuthUser> {
        let request = HttpRequest::new(
            HttpMethod::Post,
            self.config.auth_url("token?grant_type=password"),
        )
        .json(&CredentialsRequest { email, password })?;

        let response = self.send(request).await.map_err(|e| match e {
            SupabaseError::ApiError {
                status_code: 400,
                message,
            } => SupabaseError::AuthenticationFailed(message),
            other => other,
        })?;

        let user = self.store_session(parse(&response)?);
        info!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    async fn sign_out_account(&self) -> Result<()> {
        if self.access_token().is_none() {
            return Ok(());
        }

        let result = self
            .send(HttpRequest::new(HttpMethod::Post, self.config.auth_url("logout")))
            .await;

        // The local session is dropped even when the server call fails.
        let previous = self.session.write().take();
        if let Some(session) = previous {
            info!(user_id = %session.user.id, "Signed out");
        }

        result.map(|_| ())
    }
}

fn parse<T: serde::de::DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    response
        .json()
        .map_err(|e| SupabaseError::ParseError(e.to_string()))
}

fn error_message(response: &HttpResponse) -> String {
    serde_json::from_slice::<ApiErrorBody>(&response.body)
        .ok()
        .and_then(ApiErrorBody::into_message)
        .or_else(|| {
            response
                .text()
                .ok()
                .filter(|text| !text.trim().is_empty())
        })
        .unwrap_or_else(|| format!("HTTP {}", response.status))
}

/// Percent-encode each segment of an object path, keeping separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn content_type_for(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl RemoteTableClient for SupabaseClient {
    async fn current_user(&self) -> BridgeResult<AuthUser> {
        Ok(self.fetch_user().await?)
    }

    async fn select(&self, query: SelectQuery) -> BridgeResult<Vec<Row>> {
        Ok(self.fetch_rows(query).await?)
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> BridgeResult<Vec<Row>> {
        Ok(self.insert_rows(table, rows).await?)
    }

    async fn delete(&self, table: &str, filters: Vec<Filter>) -> BridgeResult<()> {
        Ok(self.delete_rows(table, filters).await?)
    }

    async fn upload_blob(&self, bucket: &str, name: &str, bytes: Bytes) -> BridgeResult<String> {
        self.upload(bucket, name, bytes)
            .await
            .map_err(BridgeError::from)
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.config.storage_url(&format!(
            "object/public/{}/{}",
            urlencoding::encode(bucket),
            encode_path(path)
        ))
    }
}

#[async_trait]
impl AuthGateway for SupabaseClient {
    async fn sign_up(&self, email: &str, password: &str) -> BridgeResult<AuthUser> {
        Ok(self.sign_up_account(email, password).await?)
    }

    async fn sign_in(&self, email: &str, password: &str) -> BridgeResult<AuthUser> {
        Ok(self.sign_in_account(email, password).await?)
    }

    async fn sign_out(&self) -> BridgeResult<()> {
        Ok(self.sign_out_account().await?)
    }
}
