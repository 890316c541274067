//! Core service façade and bootstrap helpers.
//!
//! This crate wires the host-provided remote client (and optionally the auth
//! gateway) into the repositories of `core-library` and the accounts of
//! `core-auth`. Every repository built by one [`CoreService`] shares a single
//! revision counter, so snapshots from different calls can be ordered.
//!
//! Desktop apps typically enable the `desktop` feature, which builds a
//! Supabase client over `bridge-desktop`'s reqwest HTTP client.

pub mod controllers;
pub mod error;

pub use controllers::{ArtistPage, FavoritesController};
pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::remote::{AuthUser, RemoteTableClient};
use core_auth::AccountManager;
use core_library::repositories::{
    CatalogRepository, FavoritesRepository, OrderHistoryView, ProfileLoader,
    RemoteCatalogRepository, RemoteFavoritesRepository, RemoteOrderHistory, RemoteProfileLoader,
    RemoteSuggestionSearch, SuggestionSearch,
};
use core_library::{FavoriteSet, RevisionCounter};
use core_runtime::CoreConfig;
use tracing::{debug, info, instrument};

#[cfg(feature = "desktop")]
pub use provider_supabase::SupabaseConfig;

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    config: Arc<CoreConfig>,
    revisions: Arc<RevisionCounter>,
    favorites: Arc<dyn FavoritesRepository>,
    suggestions: Arc<dyn SuggestionSearch>,
    catalog: Arc<dyn CatalogRepository>,
    orders: Arc<dyn OrderHistoryView>,
    profiles: Arc<dyn ProfileLoader>,
}

impl CoreService {
    /// Create a service from a validated configuration.
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let revisions = Arc::new(RevisionCounter::new());
        let remote = config.remote.clone();
        let tables = &config.tables;

        let favorites = Arc::new(RemoteFavoritesRepository::new(
            remote.clone(),
            &tables.favorites,
            revisions.clone(),
        ));
        let suggestions = Arc::new(RemoteSuggestionSearch::new(remote.clone(), &tables.artists));
        let catalog = Arc::new(RemoteCatalogRepository::new(
            remote.clone(),
            &tables.merchandise,
            config.storage.clone(),
            config.clock.clone(),
            revisions.clone(),
        ));
        let orders = Arc::new(RemoteOrderHistory::new(
            remote.clone(),
            &tables.orders,
            revisions.clone(),
        ));
        let profiles = Arc::new(RemoteProfileLoader::new(
            remote,
            &tables.profiles,
            &config.placeholder_username,
        ));

        info!(accounts = config.auth_gateway.is_some(), "Core service ready");

        Ok(Self {
            config: Arc::new(config),
            revisions,
            favorites,
            suggestions,
            catalog,
            orders,
            profiles,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Counter stamping every snapshot this service hands out.
    pub fn revisions(&self) -> Arc<RevisionCounter> {
        Arc::clone(&self.revisions)
    }

    pub fn favorites(&self) -> Arc<dyn FavoritesRepository> {
        Arc::clone(&self.favorites)
    }

    pub fn suggestions(&self) -> Arc<dyn SuggestionSearch> {
        Arc::clone(&self.suggestions)
    }

    pub fn catalog(&self) -> Arc<dyn CatalogRepository> {
        Arc::clone(&self.catalog)
    }

    pub fn orders(&self) -> Arc<dyn OrderHistoryView> {
        Arc::clone(&self.orders)
    }

    pub fn profiles(&self) -> Arc<dyn ProfileLoader> {
        Arc::clone(&self.profiles)
    }

    /// Account operations; `CapabilityMissing` without an auth gateway.
    pub fn accounts(&self) -> Result<AccountManager> {
        let gateway = self.config.require_auth_gateway()?;
        Ok(AccountManager::new(
            gateway,
            self.config.remote.clone(),
            &self.config.tables.profiles,
        ))
    }

    /// The signed-in user, if any.
    pub async fn current_user(&self) -> Option<AuthUser> {
        match self.config.remote.current_user().await {
            Ok(user) => Some(user),
            Err(err) => {
                debug!(error = %err, "No current user");
                None
            }
        }
    }

    /// Controller for `user_id`'s favorites, starting from an empty set.
    ///
    /// Call [`FavoritesController::refresh`] to load the remote state.
    pub fn favorites_controller(&self, user_id: impl Into<String>) -> FavoritesController {
        FavoritesController::new(
            self.favorites(),
            self.suggestions(),
            FavoriteSet::empty(user_id),
        )
    }

    /// Everything the artist page shows.
    ///
    /// A missing `artist_id` skips the merchandise fetch.
    #[instrument(skip(self, favorites), fields(user_id = %favorites.owner()))]
    pub async fn load_artist_page(
        &self,
        favorites: &FavoriteSet,
        artist_name: &str,
        artist_id: Option<&str>,
    ) -> Result<ArtistPage> {
        controllers::load_artist_page(self.catalog.as_ref(), favorites, artist_name, artist_id)
            .await
    }
}

/// Build a service backed by Supabase over the desktop HTTP client.
///
/// ```no_run
/// # #[cfg(feature = "desktop")]
/// # fn example() -> core_service::Result<()> {
/// use core_service::{bootstrap_desktop, SupabaseConfig};
///
/// let config = SupabaseConfig::new("https://project.supabase.co", "anon-key")
///     .map_err(|err| core_service::CoreError::InitializationFailed(err.to_string()))?;
/// let core = bootstrap_desktop(config)?;
/// let controller = core.favorites_controller("user-id");
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop")]
pub fn bootstrap_desktop(config: SupabaseConfig) -> Result<CoreService> {
    use bridge_desktop::ReqwestHttpClient;
    use provider_supabase::SupabaseClient;

    let http = ReqwestHttpClient::with_timeout(config.request_timeout())
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
    let client = Arc::new(SupabaseClient::new(Arc::new(http), config));
    let remote: Arc<dyn RemoteTableClient> = client.clone();

    let core_config = CoreConfig::builder()
        .remote(remote)
        .auth_gateway(client)
        .build()?;

    CoreService::new(core_config)
}
