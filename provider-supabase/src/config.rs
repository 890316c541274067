//! Connection settings for a Supabase project

use std::time::Duration;

use url::Url;

use crate::error::{Result, SupabaseError};

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Supabase project settings
///
/// # Example
///
/// ```
/// use provider_supabase::SupabaseConfig;
///
/// let config = SupabaseConfig::new("https://abc.supabase.co/", "anon-key").unwrap();
/// assert_eq!(config.project_url(), "https://abc.supabase.co");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    project_url: String,
    anon_key: String,
    request_timeout: Duration,
}

impl SupabaseConfig {
    /// Validate and build a configuration.
    ///
    /// The URL must be absolute `http` or `https`; a trailing slash is
    /// dropped. The anon key must not be blank.
    pub fn new(project_url: impl Into<String>, anon_key: impl Into<String>) -> Result<Self> {
        let project_url = project_url.into();
        let anon_key = anon_key.into();

        let parsed = Url::parse(project_url.trim())
            .map_err(|e| SupabaseError::InvalidConfig(format!("project URL: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SupabaseError::InvalidConfig(format!(
                "project URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        if anon_key.trim().is_empty() {
            return Err(SupabaseError::InvalidConfig(
                "anon key cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            project_url: project_url.trim().trim_end_matches('/').to_string(),
            anon_key: anon_key.trim().to_string(),
            request_timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Override the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn project_url(&self) -> &str {
        &self.project_url
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.project_url,
            urlencoding::encode(table)
        )
    }

    pub(crate) fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.project_url, endpoint)
    }

    pub(crate) fn storage_url(&self, endpoint: &str) -> String {
        format!("{}/storage/v1/{}", self.project_url, endpoint)
    }
}
