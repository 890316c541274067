//! Merchandise catalog repository trait and implementation

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::error::BridgeError;
use bridge_traits::remote::{Filter, OrderBy, RemoteTableClient, Row, SelectQuery};
use bridge_traits::time::Clock;
use bytes::Bytes;
use core_runtime::config::StorageConfig;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::error::{LibraryError, Result};
use crate::models::{from_row, MerchandiseItem, NewMerchandise};
use crate::snapshot::{Catalog, RevisionCounter};

/// Merchandise catalog interface
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Items of one artist, newest first
    ///
    /// An artist without items yields an empty catalog.
    ///
    /// # Errors
    /// - `Validation` for a blank artist id
    /// - `Catalog` wrapping any transport or query failure
    async fn list_merchandise(&self, artist_id: &str) -> Result<Catalog>;

    /// Upload the image, then insert the item referencing its public URL
    ///
    /// # Errors
    /// - `Validation` for invalid item fields or empty image bytes
    /// - `Upload` if the image upload fails; no row is inserted
    /// - `Catalog` if the insert fails after the upload; the error carries
    ///   the uploaded blob path, which is left in storage
    async fn publish_merchandise(
        &self,
        item: NewMerchandise,
        image: Bytes,
        artist_id: &str,
    ) -> Result<MerchandiseItem>;
}

/// Blob name for an uploaded image: `{unix_millis}-{name}.{extension}`.
///
/// Whitespace runs in the name become a single `_`; path separators are
/// replaced too so the name stays a single object key.
///
/// ```
/// use core_library::repositories::blob_name;
///
/// assert_eq!(blob_name(1_700_000_000_000, " Tour  Tee ", "jpg"), "1700000000000-Tour_Tee.jpg");
/// ```
pub fn blob_name(unix_millis: i64, item_name: &str, extension: &str) -> String {
    let sanitized = item_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .replace(['/', '\\'], "_");
    format!(
        "{}-{}.{}",
        unix_millis,
        sanitized,
        extension.trim_start_matches('.')
    )
}

/// [`CatalogRepository`] over a remote merchandise table and blob bucket
pub struct RemoteCatalogRepository {
    remote: Arc<dyn RemoteTableClient>,
    table: String,
    storage: StorageConfig,
    clock: Arc<dyn Clock>,
    revisions: Arc<RevisionCounter>,
}

impl RemoteCatalogRepository {
    pub fn new(
        remote: Arc<dyn RemoteTableClient>,
        table: impl Into<String>,
        storage: StorageConfig,
        clock: Arc<dyn Clock>,
        revisions: Arc<RevisionCounter>,
    ) -> Self {
        Self {
            remote,
            table: table.into(),
            storage,
            clock,
            revisions,
        }
    }

    fn require_artist_id(artist_id: &str) -> Result<&str> {
        let artist_id = artist_id.trim();
        if artist_id.is_empty() {
            return Err(LibraryError::validation(
                "artist_id",
                "Artist id cannot be empty",
            ));
        }
        Ok(artist_id)
    }

    fn catalog_error(source: BridgeError, orphaned_blob: Option<String>) -> LibraryError {
        LibraryError::Catalog {
            source,
            orphaned_blob,
        }
    }
}

#[async_trait]
impl CatalogRepository for RemoteCatalogRepository {
    #[instrument(skip(self))]
    async fn list_merchandise(&self, artist_id: &str) -> Result<Catalog> {
        let artist_id = Self::require_artist_id(artist_id)?;

        let rows = self
            .remote
            .select(
                SelectQuery::new(&self.table)
                    .filter(Filter::eq("artist_id", artist_id))
                    .order(OrderBy::desc("created_at")),
            )
            .await
            .map_err(|e| Self::catalog_error(e, None))?;

        let items = rows
            .into_iter()
            .map(|row| {
                serde_json::from_value::<MerchandiseItem>(Value::Object(row))
                    .map_err(|e| Self::catalog_error(BridgeError::Serialization(e), None))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(count = items.len(), "Fetched merchandise");
        Ok(Catalog::new(artist_id, self.revisions.next(), items))
    }

    #[instrument(skip(self, item, image), fields(name = %item.name, size = image.len()))]
    async fn publish_merchandise(
        &self,
        item: NewMerchandise,
        image: Bytes,
        artist_id: &str,
    ) -> Result<MerchandiseItem> {
        let artist_id = Self::require_artist_id(artist_id)?;
        item.validate()?;
        if image.is_empty() {
            return Err(LibraryError::validation("image", "Image cannot be empty"));
        }

        // Phase 1: the image must be stored before any row references it
        let name = blob_name(
            self.clock.unix_timestamp_millis(),
            item.name.trim(),
            &self.storage.image_extension,
        );
        let path = self
            .remote
            .upload_blob(&self.storage.bucket, &name, image)
            .await
            .map_err(LibraryError::Upload)?;
        let image_url = self.remote.public_url(&self.storage.bucket, &path);
        debug!(%path, "Image uploaded");

        // Phase 2
        let mut row = Row::new();
        row.insert("artist_id".to_string(), Value::from(artist_id));
        row.insert("name".to_string(), Value::from(item.name.trim()));
        row.insert("price".to_string(), serde_json::to_value(item.price)?);
        row.insert(
            "description".to_string(),
            item.description.map(Value::from).unwrap_or(Value::Null),
        );
        row.insert("image_url".to_string(), Value::from(image_url));
        row.insert("stock".to_string(), Value::from(item.stock));

        let stored = match self.remote.insert(&self.table, vec![row]).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(%path, error = %e, "Catalog insert failed after upload; blob left orphaned");
                return Err(Self::catalog_error(e, Some(path)));
            }
        };

        let created = stored
            .into_iter()
            .next()
            .ok_or_else(|| {
                Self::catalog_error(
                    BridgeError::OperationFailed("insert returned no row".to_string()),
                    Some(path.clone()),
                )
            })
            .and_then(|row| {
                from_row::<MerchandiseItem>(row).map_err(|e| match e {
                    LibraryError::Remote(source) => Self::catalog_error(source, Some(path.clone())),
                    other => other,
                })
            })?;

        info!(item_id = %created.id, %artist_id, "Merchandise published");
        Ok(created)
    }
}
