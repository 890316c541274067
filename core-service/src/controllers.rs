//! UI-facing state holders built on the repositories

use std::sync::Arc;

use core_library::models::{ArtistSuggestion, FavoriteRequest};
use core_library::repositories::{
    ArtistPicker, CatalogRepository, FavoriteAction, FavoritesRepository, SuggestionSearch,
    ToggleOutcome,
};
use core_library::snapshot::replace_if_newer;
use core_library::{Catalog, FavoriteSet, LibraryError};
use tracing::{debug, info, instrument, warn};

use crate::error::Result;

/// Favorites screen state: the user's [`FavoriteSet`] plus the add-artist
/// picker.
///
/// Mutations replace the set wholesale only when the repository call
/// succeeded, and then reset the picker. On error the set and the picker are
/// left as they were.
pub struct FavoritesController {
    repository: Arc<dyn FavoritesRepository>,
    search: Arc<dyn SuggestionSearch>,
    favorites: FavoriteSet,
    picker: ArtistPicker,
}

impl FavoritesController {
    pub fn new(
        repository: Arc<dyn FavoritesRepository>,
        search: Arc<dyn SuggestionSearch>,
        favorites: FavoriteSet,
    ) -> Self {
        Self {
            repository,
            search,
            favorites,
            picker: ArtistPicker::new(),
        }
    }

    pub fn favorites(&self) -> &FavoriteSet {
        &self.favorites
    }

    pub fn picker(&self) -> &ArtistPicker {
        &self.picker
    }

    pub fn suggestions(&self) -> &[ArtistSuggestion] {
        self.picker.suggestions()
    }

    pub fn is_favorite(&self, artist_name: &str) -> bool {
        self.favorites.contains(artist_name)
    }

    /// Reload the set from the remote store.
    #[instrument(skip(self), fields(user_id = %self.favorites.owner()))]
    pub async fn refresh(&mut self) -> Result<&FavoriteSet> {
        let fresh = self
            .repository
            .list_favorites(self.favorites.owner())
            .await?;
        if !replace_if_newer(&mut self.favorites, fresh) {
            debug!("Dropped stale favorites snapshot");
        }
        Ok(&self.favorites)
    }

    /// Update the draft and fetch suggestions for it.
    ///
    /// A failed search is logged and leaves the previous suggestions in
    /// place. Returns whether new suggestions were installed.
    #[instrument(skip(self))]
    pub async fn type_query(&mut self, text: &str) -> bool {
        let Some(ticket) = self.picker.begin_query(text) else {
            return false;
        };

        match self.search.suggest(ticket.query()).await {
            Ok(results) => self.picker.accept(&ticket, results),
            Err(err) => {
                warn!(query = %ticket.query(), error = %err, "Suggestion search failed");
                false
            }
        }
    }

    /// Add the suggestion at `index`.
    pub async fn select_suggestion(&mut self, index: usize) -> Result<FavoriteAction> {
        let request = self.picker.select(index).ok_or_else(|| {
            LibraryError::validation("suggestion", format!("No suggestion at position {}", index))
        })?;
        let outcome = self.repository.add_favorite(&self.favorites, request).await?;
        Ok(self.apply(outcome))
    }

    /// Add the typed draft as entered.
    pub async fn submit_draft(&mut self) -> Result<FavoriteAction> {
        let request = self
            .picker
            .draft_request()
            .ok_or_else(|| LibraryError::validation("artist_name", "Artist name cannot be empty"))?;
        let outcome = self.repository.add_favorite(&self.favorites, request).await?;
        Ok(self.apply(outcome))
    }

    /// Flip the favorite state of `artist_name`.
    pub async fn toggle(&mut self, artist_name: &str) -> Result<FavoriteAction> {
        let request = FavoriteRequest::typed(artist_name);
        let outcome = self
            .repository
            .toggle_favorite(&self.favorites, request)
            .await?;
        Ok(self.apply(outcome))
    }

    /// Remove `artist_name` if present.
    pub async fn remove(&mut self, artist_name: &str) -> Result<FavoriteAction> {
        let outcome = self
            .repository
            .remove_favorite(&self.favorites, artist_name)
            .await?;
        Ok(self.apply(outcome))
    }

    fn apply(&mut self, outcome: ToggleOutcome) -> FavoriteAction {
        let ToggleOutcome {
            action,
            artist_name,
            snapshot,
        } = outcome;

        if action != FavoriteAction::Unchanged {
            info!(?action, %artist_name, "Favorites updated");
        }
        if !replace_if_newer(&mut self.favorites, snapshot) {
            debug!("Dropped stale favorites snapshot");
        }
        self.picker.clear();
        action
    }
}

/// Artist page content.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistPage {
    pub artist_name: String,
    pub is_favorite: bool,
    /// `None` when the artist has no id to look merchandise up by
    pub catalog: Option<Catalog>,
}

pub(crate) async fn load_artist_page(
    repository: &dyn CatalogRepository,
    favorites: &FavoriteSet,
    artist_name: &str,
    artist_id: Option<&str>,
) -> Result<ArtistPage> {
    let is_favorite = favorites.contains(artist_name);

    let catalog = match artist_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => Some(repository.list_merchandise(id).await?),
        None => {
            debug!(%artist_name, "No artist id, skipping merchandise");
            None
        }
    };

    Ok(ArtistPage {
        artist_name: artist_name.trim().to_string(),
        is_favorite,
        catalog,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_library::repositories::{RemoteFavoritesRepository, RemoteSuggestionSearch};
    use core_library::testing::{InMemoryBackend, Operation};
    use core_library::RevisionCounter;
    use serde_json::json;

    fn controller(backend: &Arc<InMemoryBackend>, user_id: &str) -> FavoritesController {
        let revisions = Arc::new(RevisionCounter::new());
        FavoritesController::new(
            Arc::new(RemoteFavoritesRepository::new(
                backend.clone(),
                "user_favorites",
                revisions,
            )),
            Arc::new(RemoteSuggestionSearch::new(backend.clone(), "artists")),
            FavoriteSet::empty(user_id),
        )
    }

    fn backend() -> Arc<InMemoryBackend> {
        let backend = Arc::new(InMemoryBackend::signed_in("u-1"));
        backend.seed(
            "artists",
            vec![
                json!({ "name": "Taylor Swift" }),
                json!({ "name": "Sabrina Carpenter" }),
            ],
        );
        backend.seed(
            "user_favorites",
            vec![json!({ "id": 100, "user_id": "u-1", "artist_name": "Adele" })],
        );
        backend
    }

    #[tokio::test]
    async fn test_refresh_loads_remote_state() {
        let backend = backend();
        let mut favorites = controller(&backend, "u-1");

        favorites.refresh().await.unwrap();
        assert_eq!(favorites.favorites().names(), vec!["Adele"]);
        assert!(favorites.is_favorite("ADELE"));
    }

    #[tokio::test]
    async fn test_select_suggestion_adds_and_clears_picker() {
        let backend = backend();
        let mut favorites = controller(&backend, "u-1");
        favorites.refresh().await.unwrap();

        assert!(favorites.type_query("tay").await);
        assert_eq!(favorites.suggestions().len(), 1);

        let action = favorites.select_suggestion(0).await.unwrap();
        assert_eq!(action, FavoriteAction::Added);
        assert_eq!(favorites.favorites().names(), vec!["Adele", "Taylor Swift"]);
        assert!(favorites.suggestions().is_empty());
        assert!(favorites.picker().draft().is_empty());
    }

    #[tokio::test]
    async fn test_failed_search_keeps_previous_suggestions() {
        let backend = backend();
        let mut favorites = controller(&backend, "u-1");

        assert!(favorites.type_query("sab").await);
        backend.fail_on(Operation::Select);
        assert!(!favorites.type_query("sabr").await);

        assert_eq!(favorites.suggestions()[0].name, "Sabrina Carpenter");
        assert_eq!(favorites.picker().draft(), "sabr");
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_state_untouched() {
        let backend = backend();
        let mut favorites = controller(&backend, "u-1");
        favorites.refresh().await.unwrap();
        favorites.type_query("Taylor Swift").await;

        backend.fail_on(Operation::Insert);
        assert!(favorites.submit_draft().await.is_err());

        assert_eq!(favorites.favorites().names(), vec!["Adele"]);
        assert_eq!(favorites.picker().draft(), "Taylor Swift");
        assert_eq!(favorites.suggestions().len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_round_trip() {
        let backend = backend();
        let mut favorites = controller(&backend, "u-1");
        favorites.refresh().await.unwrap();

        assert_eq!(favorites.toggle("adele").await.unwrap(), FavoriteAction::Removed);
        assert!(favorites.favorites().is_empty());
        assert!(backend.rows("user_favorites").is_empty());

        assert_eq!(favorites.toggle(" Adele ").await.unwrap(), FavoriteAction::Added);
        assert_eq!(favorites.favorites().names(), vec!["Adele"]);
    }

    #[tokio::test]
    async fn test_invalid_selection_and_blank_draft() {
        let backend = backend();
        let mut favorites = controller(&backend, "u-1");

        assert!(favorites.select_suggestion(3).await.unwrap_err().is_validation());
        assert!(favorites.submit_draft().await.unwrap_err().is_validation());
        assert_eq!(backend.calls(Operation::Insert), 0);
    }

    #[tokio::test]
    async fn test_remove_absent_is_unchanged() {
        let backend = backend();
        let mut favorites = controller(&backend, "u-1");
        favorites.refresh().await.unwrap();

        let action = favorites.remove("Taylor Swift").await.unwrap();
        assert_eq!(action, FavoriteAction::Unchanged);
        assert_eq!(backend.calls(Operation::Delete), 0);
    }
}
