//! Favorites repository trait and implementation

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::error::BridgeError;
use bridge_traits::remote::{AuthUser, Filter, RemoteTableClient, Row, SelectQuery};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::{LibraryError, Result};
use crate::models::{from_row, FavoriteArtist, FavoriteRequest};
use crate::snapshot::{FavoriteSet, RevisionCounter};

/// What a favorite mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteAction {
    Added,
    Removed,
    /// Nothing to do; no remote mutation was issued
    Unchanged,
}

/// Result of a favorite mutation: the action taken and the snapshot to
/// render next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub action: FavoriteAction,
    pub artist_name: String,
    pub snapshot: FavoriteSet,
}

/// Favorites repository interface
///
/// Mutations take the caller's current snapshot by reference and return a
/// new one. On error the caller keeps its snapshot; nothing was applied
/// locally.
#[async_trait]
pub trait FavoritesRepository: Send + Sync {
    /// Fetch every favorite of `user_id`
    ///
    /// # Errors
    /// - `Auth` if no authenticated user is resolvable, or it is not `user_id`
    /// - `Remote` on transport or query failure
    async fn list_favorites(&self, user_id: &str) -> Result<FavoriteSet>;

    /// Add the artist when absent from `current`, remove it when present
    ///
    /// Matching ignores case and surrounding whitespace.
    ///
    /// # Errors
    /// - `Validation` for a blank name, before any remote call
    /// - `Auth` if the session does not belong to `current.owner()`
    /// - `Remote` on transport or query failure
    async fn toggle_favorite(
        &self,
        current: &FavoriteSet,
        request: FavoriteRequest,
    ) -> Result<ToggleOutcome>;

    /// Add the artist; an already-present name is `Unchanged`
    async fn add_favorite(
        &self,
        current: &FavoriteSet,
        request: FavoriteRequest,
    ) -> Result<ToggleOutcome>;

    /// Remove the artist; an absent name is `Unchanged`
    async fn remove_favorite(&self, current: &FavoriteSet, artist_name: &str)
        -> Result<ToggleOutcome>;
}

/// [`FavoritesRepository`] over a remote favorites table
pub struct RemoteFavoritesRepository {
    remote: Arc<dyn RemoteTableClient>,
    table: String,
    revisions: Arc<RevisionCounter>,
}

impl RemoteFavoritesRepository {
    pub fn new(
        remote: Arc<dyn RemoteTableClient>,
        table: impl Into<String>,
        revisions: Arc<RevisionCounter>,
    ) -> Self {
        Self {
            remote,
            table: table.into(),
            revisions,
        }
    }

    /// Resolve the session user and check it owns `user_id`'s data.
    async fn authorize(&self, user_id: &str) -> Result<AuthUser> {
        let user = self.remote.current_user().await?;
        if user.id != user_id {
            warn!(
                session_user = %user.id,
                requested_user = %user_id,
                "Session user does not own the favorites"
            );
            return Err(LibraryError::Auth(format!(
                "session user does not match favorites owner '{}'",
                user_id
            )));
        }
        Ok(user)
    }

    async fn insert_favorite(
        &self,
        current: &FavoriteSet,
        user: &AuthUser,
        artist_name: &str,
    ) -> Result<ToggleOutcome> {
        let mut row = Row::new();
        row.insert("user_id".to_string(), Value::from(user.id.clone()));
        row.insert("artist_name".to_string(), Value::from(artist_name));

        let stored = self.remote.insert(&self.table, vec![row]).await?;
        let stored_row = stored.into_iter().next().ok_or_else(|| {
            LibraryError::Remote(BridgeError::OperationFailed(
                "insert returned no row".to_string(),
            ))
        })?;
        let favorite: FavoriteArtist = from_row(stored_row)?;

        info!(
            user_id = %user.id,
            favorite_id = %favorite.id,
            artist_name = %favorite.artist_name,
            "Favorite added"
        );

        let artist_name = favorite.artist_name.clone();
        Ok(ToggleOutcome {
            action: FavoriteAction::Added,
            artist_name,
            snapshot: current.with_added(favorite, self.revisions.next()),
        })
    }

    async fn delete_favorite(
        &self,
        current: &FavoriteSet,
        user: &AuthUser,
        existing: &FavoriteArtist,
    ) -> Result<ToggleOutcome> {
        // Scoped to the session user so another user's row can never match
        self.remote
            .delete(
                &self.table,
                vec![
                    Filter::eq("id", existing.id.clone()),
                    Filter::eq("user_id", user.id.clone()),
                ],
            )
            .await?;

        info!(
            user_id = %user.id,
            favorite_id = %existing.id,
            artist_name = %existing.artist_name,
            "Favorite removed"
        );

        Ok(ToggleOutcome {
            action: FavoriteAction::Removed,
            artist_name: existing.artist_name.clone(),
            snapshot: current.without(&existing.id, self.revisions.next()),
        })
    }

    fn unchanged(current: &FavoriteSet, artist_name: &str) -> ToggleOutcome {
        ToggleOutcome {
            action: FavoriteAction::Unchanged,
            artist_name: artist_name.to_string(),
            snapshot: current.clone(),
        }
    }
}

#[async_trait]
impl FavoritesRepository for RemoteFavoritesRepository {
    #[instrument(skip(self))]
    async fn list_favorites(&self, user_id: &str) -> Result<FavoriteSet> {
        let user = self.authorize(user_id).await?;

        let rows = self
            .remote
            .select(SelectQuery::new(&self.table).filter(Filter::eq("user_id", user.id.clone())))
            .await?;

        let favorites = rows
            .into_iter()
            .map(from_row::<FavoriteArtist>)
            .collect::<Result<Vec<_>>>()?;

        debug!(count = favorites.len(), "Fetched favorites");
        Ok(FavoriteSet::from_entries(
            user.id,
            self.revisions.next(),
            favorites,
        ))
    }

    #[instrument(skip(self, current, request), fields(user_id = %current.owner(), source = ?request.source))]
    async fn toggle_favorite(
        &self,
        current: &FavoriteSet,
        request: FavoriteRequest,
    ) -> Result<ToggleOutcome> {
        let artist_name = request.validated_name()?;
        let user = self.authorize(current.owner()).await?;

        match current.find(artist_name) {
            Some(existing) => self.delete_favorite(current, &user, existing).await,
            None => self.insert_favorite(current, &user, artist_name).await,
        }
    }

    #[instrument(skip(self, current, request), fields(user_id = %current.owner(), source = ?request.source))]
    async fn add_favorite(
        &self,
        current: &FavoriteSet,
        request: FavoriteRequest,
    ) -> Result<ToggleOutcome> {
        let artist_name = request.validated_name()?;

        if let Some(existing) = current.find(artist_name) {
            debug!(artist_name = %existing.artist_name, "Already a favorite");
            return Ok(Self::unchanged(current, &existing.artist_name));
        }

        let user = self.authorize(current.owner()).await?;
        self.insert_favorite(current, &user, artist_name).await
    }

    #[instrument(skip(self, current), fields(user_id = %current.owner()))]
    async fn remove_favorite(
        &self,
        current: &FavoriteSet,
        artist_name: &str,
    ) -> Result<ToggleOutcome> {
        let artist_name = FavoriteRequest::typed(artist_name).validated_name()?.to_string();

        let Some(existing) = current.find(&artist_name) else {
            debug!(%artist_name, "Not a favorite");
            return Ok(Self::unchanged(current, &artist_name));
        };

        let user = self.authorize(current.owner()).await?;
        self.delete_favorite(current, &user, existing).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Versioned;
    use crate::testing::{InMemoryBackend, MockRemoteTable, Operation};
    use serde_json::json;

    const TABLE: &str = "user_favorites";

    fn repository(backend: Arc<InMemoryBackend>) -> RemoteFavoritesRepository {
        RemoteFavoritesRepository::new(backend, TABLE, Arc::new(RevisionCounter::new()))
    }

    fn seeded(user_id: &str, names: &[&str]) -> Arc<InMemoryBackend> {
        let backend = Arc::new(InMemoryBackend::signed_in(user_id));
        backend.seed(
            TABLE,
            names
                .iter()
                .map(|name| json!({ "user_id": user_id, "artist_name": name })),
        );
        backend
    }

    #[tokio::test]
    async fn test_list_favorites_scoped_to_user() {
        let backend = seeded("u-1", &["Adele", "Taylor Swift"]);
        backend.seed(TABLE, vec![json!({ "user_id": "u-2", "artist_name": "Drake" })]);

        let favorites = repository(backend).list_favorites("u-1").await.unwrap();

        assert_eq!(favorites.owner(), "u-1");
        assert_eq!(favorites.names(), vec!["Adele", "Taylor Swift"]);
    }

    #[tokio::test]
    async fn test_list_favorites_without_session_is_auth_error() {
        let backend = Arc::new(InMemoryBackend::new());
        let result = repository(backend.clone()).list_favorites("u-1").await;

        assert!(result.unwrap_err().is_auth());
        assert_eq!(backend.calls(Operation::Select), 0);
    }

    #[tokio::test]
    async fn test_list_favorites_for_other_user_is_auth_error() {
        let backend = seeded("u-1", &["Adele"]);
        let result = repository(backend).list_favorites("u-2").await;
        assert!(result.unwrap_err().is_auth());
    }

    #[tokio::test]
    async fn test_list_favorites_remote_failure() {
        let backend = seeded("u-1", &["Adele"]);
        backend.fail_on(Operation::Select);

        let result = repository(backend).list_favorites("u-1").await;
        assert!(matches!(result, Err(LibraryError::Remote(_))));
    }

    #[tokio::test]
    async fn test_list_favorites_drops_duplicate_rows() {
        let backend = seeded("u-1", &["Adele", "adele", "ADELE "]);
        let favorites = repository(backend).list_favorites("u-1").await.unwrap();
        assert_eq!(favorites.len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_adds_backend_row() {
        let backend = seeded("u-1", &[]);
        let repo = repository(backend.clone());
        let current = repo.list_favorites("u-1").await.unwrap();

        let outcome = repo
            .toggle_favorite(&current, FavoriteRequest::typed("  Sabrina Carpenter "))
            .await
            .unwrap();

        assert_eq!(outcome.action, FavoriteAction::Added);
        assert_eq!(outcome.artist_name, "Sabrina Carpenter");
        let stored = backend.rows(TABLE);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["artist_name"], json!("Sabrina Carpenter"));

        // Snapshot carries the server-assigned id
        let entry = outcome.snapshot.find("sabrina carpenter").unwrap();
        assert_eq!(entry.id, stored[0]["id"].to_string());
        assert!(outcome.snapshot.revision() > current.revision());
        assert!(current.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_twice_is_net_noop() {
        let backend = seeded("u-1", &["Adele"]);
        let repo = repository(backend.clone());
        let before = repo.list_favorites("u-1").await.unwrap();

        let added = repo
            .toggle_favorite(&before, FavoriteRequest::suggested("Hip Hop Tamizha"))
            .await
            .unwrap();
        let removed = repo
            .toggle_favorite(&added.snapshot, FavoriteRequest::typed("Hip Hop Tamizha"))
            .await
            .unwrap();

        assert_eq!(added.action, FavoriteAction::Added);
        assert_eq!(removed.action, FavoriteAction::Removed);
        assert_eq!(removed.snapshot.entries(), before.entries());
        assert_eq!(backend.rows(TABLE).len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_is_case_insensitive() {
        let backend = seeded("u-1", &["Taylor Swift"]);
        let repo = repository(backend.clone());
        let current = repo.list_favorites("u-1").await.unwrap();

        let outcome = repo
            .toggle_favorite(&current, FavoriteRequest::typed("TAYLOR swift"))
            .await
            .unwrap();

        assert_eq!(outcome.action, FavoriteAction::Removed);
        assert!(outcome.snapshot.is_empty());
        assert!(backend.rows(TABLE).is_empty());
    }

    #[tokio::test]
    async fn test_case_variants_never_produce_two_entries() {
        let backend = seeded("u-1", &[]);
        let repo = repository(backend.clone());
        let mut snapshot = repo.list_favorites("u-1").await.unwrap();

        for name in ["adele", "ADELE", "Adele", " adele ", "AdElE"] {
            snapshot = repo
                .toggle_favorite(&snapshot, FavoriteRequest::typed(name))
                .await
                .unwrap()
                .snapshot;
            assert!(snapshot.len() <= 1);
            assert!(backend.rows(TABLE).len() <= 1);
        }
    }

    #[tokio::test]
    async fn test_blank_name_rejected_before_remote_call() {
        let mut mock = MockRemoteTable::new();
        mock.expect_current_user().never();
        mock.expect_insert().never();
        mock.expect_delete().never();

        let repo = RemoteFavoritesRepository::new(
            Arc::new(mock),
            TABLE,
            Arc::new(RevisionCounter::new()),
        );
        let current = FavoriteSet::empty("u-1");

        let result = repo
            .toggle_favorite(&current, FavoriteRequest::typed("   "))
            .await;
        assert!(result.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_delete_is_scoped_to_row_and_user() {
        let mut mock = MockRemoteTable::new();
        mock.expect_current_user().times(1).returning(|| {
            Ok(AuthUser {
                id: "u-1".to_string(),
                email: None,
            })
        });
        mock.expect_delete()
            .withf(|table, filters| {
                table.to_string() == TABLE
                    && *filters == vec![Filter::eq("id", "7"), Filter::eq("user_id", "u-1")]
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let repo = RemoteFavoritesRepository::new(
            Arc::new(mock),
            TABLE,
            Arc::new(RevisionCounter::new()),
        );
        let current = FavoriteSet::from_entries(
            "u-1",
            crate::snapshot::Revision::INITIAL,
            vec![FavoriteArtist {
                id: "7".to_string(),
                user_id: "u-1".to_string(),
                artist_name: "Adele".to_string(),
            }],
        );

        let outcome = repo.remove_favorite(&current, "adele").await.unwrap();
        assert_eq!(outcome.action, FavoriteAction::Removed);
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_snapshot_untouched() {
        let backend = seeded("u-1", &["Adele"]);
        let repo = repository(backend.clone());
        let current = repo.list_favorites("u-1").await.unwrap();
        backend.fail_on(Operation::Insert);

        let result = repo
            .toggle_favorite(&current, FavoriteRequest::typed("Drake"))
            .await;

        assert!(matches!(result, Err(LibraryError::Remote(_))));
        assert_eq!(current.names(), vec!["Adele"]);
        assert_eq!(backend.rows(TABLE).len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_with_foreign_snapshot_is_auth_error() {
        let backend = seeded("u-2", &[]);
        let repo = repository(backend.clone());
        let foreign = FavoriteSet::empty("u-1");

        let result = repo
            .toggle_favorite(&foreign, FavoriteRequest::typed("Adele"))
            .await;

        assert!(result.unwrap_err().is_auth());
        assert_eq!(backend.calls(Operation::Insert), 0);
    }

    #[tokio::test]
    async fn test_add_existing_is_unchanged_without_remote_call() {
        let backend = seeded("u-1", &["Adele"]);
        let repo = repository(backend.clone());
        let current = repo.list_favorites("u-1").await.unwrap();
        backend.reset_calls();

        let outcome = repo
            .add_favorite(&current, FavoriteRequest::suggested("adele"))
            .await
            .unwrap();

        assert_eq!(outcome.action, FavoriteAction::Unchanged);
        assert_eq!(outcome.artist_name, "Adele");
        assert_eq!(outcome.snapshot, current);
        assert_eq!(backend.calls(Operation::CurrentUser), 0);
        assert_eq!(backend.calls(Operation::Insert), 0);
    }

    #[tokio::test]
    async fn test_remove_absent_is_unchanged() {
        let backend = seeded("u-1", &["Adele"]);
        let repo = repository(backend.clone());
        let current = repo.list_favorites("u-1").await.unwrap();

        let outcome = repo.remove_favorite(&current, "Drake").await.unwrap();

        assert_eq!(outcome.action, FavoriteAction::Unchanged);
        assert_eq!(backend.calls(Operation::Delete), 0);
    }
}
