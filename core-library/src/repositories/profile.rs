//! Profile loader with placeholder fallback

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::remote::{Filter, RemoteTableClient, SelectQuery};
use tracing::{debug, instrument, warn};

use crate::models::{from_row, ProfileRow, ProfileView};

/// Resolves a user's display identity
#[async_trait]
pub trait ProfileLoader: Send + Sync {
    /// Username and avatar of `user_id`
    ///
    /// Never fails: a missing row, a blank username or a failed query yields
    /// the placeholder username and no avatar.
    async fn load_profile(&self, user_id: &str) -> ProfileView;
}

/// [`ProfileLoader`] over a remote profiles table keyed by `id`
pub struct RemoteProfileLoader {
    remote: Arc<dyn RemoteTableClient>,
    table: String,
    placeholder_username: String,
}

impl RemoteProfileLoader {
    pub fn new(
        remote: Arc<dyn RemoteTableClient>,
        table: impl Into<String>,
        placeholder_username: impl Into<String>,
    ) -> Self {
        Self {
            remote,
            table: table.into(),
            placeholder_username: placeholder_username.into(),
        }
    }

    fn placeholder(&self) -> ProfileView {
        ProfileView::placeholder(self.placeholder_username.clone())
    }
}

#[async_trait]
impl ProfileLoader for RemoteProfileLoader {
    #[instrument(skip(self))]
    async fn load_profile(&self, user_id: &str) -> ProfileView {
        let query = SelectQuery::new(&self.table)
            .columns(["username", "avatar_url"])
            .filter(Filter::eq("id", user_id))
            .limit(1);

        let rows = match self.remote.select(query).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Profile query failed, using placeholder");
                return self.placeholder();
            }
        };

        let Some(row) = rows.into_iter().next() else {
            debug!("No profile row, using placeholder");
            return self.placeholder();
        };

        let profile: ProfileRow = match from_row(row) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, "Malformed profile row, using placeholder");
                return self.placeholder();
            }
        };

        let avatar_url = profile
            .avatar_url
            .filter(|url| !url.trim().is_empty());

        match profile.username.filter(|name| !name.trim().is_empty()) {
            Some(username) => ProfileView {
                username,
                avatar_url,
                is_placeholder: false,
            },
            None => ProfileView {
                avatar_url,
                ..self.placeholder()
            },
        }
    }
}
