//! # Core Configuration Module
//!
//! Provides configuration management for the fan-app core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the back-end bridges and the settings the repositories
//! need. It enforces fail-fast validation so a missing back end is reported
//! when the core is wired, not on the first user action.
//!
//! ## Required Dependencies
//!
//! - `RemoteTableClient` - Row reads/writes, blob uploads and user resolution
//!
//! ## Optional Dependencies
//!
//! - `AuthGateway` - Sign-up / sign-in / sign-out (account features are
//!   unavailable without it)
//! - `Clock` - Time source for upload names (default: `SystemClock`)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .remote(supabase.clone())
//!     .auth_gateway(supabase)
//!     .merchandise_table("merchandise")
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // No RemoteTableClient was injected
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing remote client");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{AuthGateway, Clock, RemoteTableClient, SystemClock};
use std::sync::Arc;

/// Placeholder shown when a profile cannot be loaded
pub const DEFAULT_PLACEHOLDER_USERNAME: &str = "Unknown User";

/// Names of the remote tables the repositories read and write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    /// Favorite artists per user (`id`, `user_id`, `artist_name`)
    pub favorites: String,
    /// Artist directory searched for suggestions (`name`)
    pub artists: String,
    /// Per-artist merchandise catalog
    pub merchandise: String,
    /// Purchase orders per user
    pub orders: String,
    /// Display profiles keyed by user id
    pub profiles: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            favorites: "user_favorites".to_string(),
            artists: "artists".to_string(),
            merchandise: "Merchandise".to_string(),
            orders: "orders".to_string(),
            profiles: "profiles".to_string(),
        }
    }
}

impl TableNames {
    pub fn validate(&self) -> Result<()> {
        let tables = [
            ("favorites", &self.favorites),
            ("artists", &self.artists),
            ("merchandise", &self.merchandise),
            ("orders", &self.orders),
            ("profiles", &self.profiles),
        ];

        for (role, name) in tables {
            if name.trim().is_empty() {
                return Err(Error::Config(format!(
                    "Table name for {} cannot be empty",
                    role
                )));
            }
        }

        Ok(())
    }
}

/// Blob storage settings for merchandise images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Bucket receiving uploaded images
    pub bucket: String,
    /// Extension appended to generated blob names
    pub image_extension: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "merch-images".to_string(),
            image_extension: "jpg".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    pub fn with_image_extension(mut self, extension: impl Into<String>) -> Self {
        self.image_extension = extension.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::Config("Storage bucket cannot be empty".to_string()));
        }

        let extension = self.image_extension.trim_start_matches('.');
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::Config(format!(
                "Invalid image extension '{}'",
                self.image_extension
            )));
        }

        Ok(())
    }
}

/// Core configuration for the fan-app core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Remote table and blob store (required)
    pub remote: Arc<dyn RemoteTableClient>,

    /// Account operations (optional)
    pub auth_gateway: Option<Arc<dyn AuthGateway>>,

    /// Time source
    pub clock: Arc<dyn Clock>,

    /// Remote table names
    pub tables: TableNames,

    /// Merchandise image storage
    pub storage: StorageConfig,

    /// Username shown when a profile is missing
    pub placeholder_username: String,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("remote", &"RemoteTableClient { ... }")
            .field(
                "auth_gateway",
                &self.auth_gateway.as_ref().map(|_| "AuthGateway { ... }"),
            )
            .field("clock", &"Clock { ... }")
            .field("tables", &self.tables)
            .field("storage", &self.storage)
            .field("placeholder_username", &self.placeholder_username)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Every table name is non-empty
    /// - The storage bucket and image extension are usable
    /// - The placeholder username is non-empty
    pub fn validate(&self) -> Result<()> {
        self.tables.validate()?;
        self.storage.validate()?;

        if self.placeholder_username.trim().is_empty() {
            return Err(Error::Config(
                "Placeholder username cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns the auth gateway or an actionable error.
    pub fn require_auth_gateway(&self) -> Result<Arc<dyn AuthGateway>> {
        self.auth_gateway
            .clone()
            .ok_or_else(auth_gateway_missing_error)
    }
}

fn remote_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "RemoteTableClient".to_string(),
        message: "RemoteTableClient implementation is required for every repository. \
                 Desktop: build a provider_supabase::SupabaseClient over bridge_desktop::ReqwestHttpClient. \
                 Tests: inject core_library::testing::InMemoryBackend."
            .to_string(),
    }
}

fn auth_gateway_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "AuthGateway".to_string(),
        message: "AuthGateway implementation is required for sign-up, sign-in and sign-out. \
                 Inject it with CoreConfigBuilder::auth_gateway()."
            .to_string(),
    }
}

/// Builder for [`CoreConfig`]
#[derive(Default)]
pub struct CoreConfigBuilder {
    remote: Option<Arc<dyn RemoteTableClient>>,
    auth_gateway: Option<Arc<dyn AuthGateway>>,
    clock: Option<Arc<dyn Clock>>,
    tables: TableNames,
    storage: StorageConfig,
    placeholder_username: Option<String>,
}

impl CoreConfigBuilder {
    /// Sets the remote table client (required).
    pub fn remote(mut self, remote: Arc<dyn RemoteTableClient>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Sets the auth gateway.
    pub fn auth_gateway(mut self, gateway: Arc<dyn AuthGateway>) -> Self {
        self.auth_gateway = Some(gateway);
        self
    }

    /// Sets the time source. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replaces every table name at once.
    pub fn tables(mut self, tables: TableNames) -> Self {
        self.tables = tables;
        self
    }

    pub fn favorites_table(mut self, name: impl Into<String>) -> Self {
        self.tables.favorites = name.into();
        self
    }

    pub fn artists_table(mut self, name: impl Into<String>) -> Self {
        self.tables.artists = name.into();
        self
    }

    pub fn merchandise_table(mut self, name: impl Into<String>) -> Self {
        self.tables.merchandise = name.into();
        self
    }

    pub fn orders_table(mut self, name: impl Into<String>) -> Self {
        self.tables.orders = name.into();
        self
    }

    pub fn profiles_table(mut self, name: impl Into<String>) -> Self {
        self.tables.profiles = name.into();
        self
    }

    /// Sets the merchandise image storage.
    pub fn storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    /// Sets the username shown when a profile cannot be loaded.
    pub fn placeholder_username(mut self, username: impl Into<String>) -> Self {
        self.placeholder_username = Some(username.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No `RemoteTableClient` was provided
    /// - A table name, the bucket or the placeholder username is empty
    pub fn build(self) -> Result<CoreConfig> {
        let remote = self.remote.ok_or_else(remote_missing_error)?;

        let clock = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };

        let config = CoreConfig {
            remote,
            auth_gateway: self.auth_gateway,
            clock,
            tables: self.tables,
            storage: self.storage,
            placeholder_username: self
                .placeholder_username
                .unwrap_or_else(|| DEFAULT_PLACEHOLDER_USERNAME.to_string()),
        };

        config.validate()?;

        Ok(config)
    }
}
