//! Order history view

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::remote::{Filter, OrderBy, RemoteTableClient, SelectQuery};
use tracing::{debug, instrument};

use crate::error::{LibraryError, Result};
use crate::models::{from_row, Order};
use crate::snapshot::{OrderHistory, RevisionCounter};

/// Read-only access to a user's orders
#[async_trait]
pub trait OrderHistoryView: Send + Sync {
    /// Orders of `user_id`, newest first
    ///
    /// The pending / completed partition is available on the returned
    /// [`OrderHistory`] and costs no further remote calls.
    async fn list_orders(&self, user_id: &str) -> Result<OrderHistory>;
}

/// [`OrderHistoryView`] over a remote orders table
pub struct RemoteOrderHistory {
    remote: Arc<dyn RemoteTableClient>,
    table: String,
    revisions: Arc<RevisionCounter>,
}

impl RemoteOrderHistory {
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
}

#[async_trait]
impl OrderHistoryView for RemoteOrderHistory {
    #[instrument(skip(self))]
    async fn list_orders(&self, user_id: &str) -> Result<OrderHistory> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(LibraryError::validation("user_id", "User id cannot be empty"));
        }

        let rows = self
            .remote
            .select(
                SelectQuery::new(&self.table)
                    .filter(Filter::eq("user_id", user_id))
                    .order(OrderBy::desc("created_at")),
            )
            .await?;

        let orders = rows
            .into_iter()
            .map(from_row::<Order>)
            .collect::<Result<Vec<_>>>()?;

        debug!(count = orders.len(), "Fetched orders");
        Ok(OrderHistory::new(user_id, self.revisions.next(), orders))
    }
}
