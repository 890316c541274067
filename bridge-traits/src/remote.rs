//! Remote Table Abstraction
//!
//! The back end the fan app talks to is a relational store exposed through a
//! generic table/row API plus a blob store, in the style of PostgREST and
//! Supabase Storage. This module defines that contract so the core stays
//! independent of the concrete back end.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_traits::remote::{Filter, OrderBy, RemoteTableClient, SelectQuery};
//!
//! let rows = client
//!     .select(
//!         SelectQuery::new("Merchandise")
//!             .filter(Filter::eq("artist_id", "42"))
//!             .order(OrderBy::desc("created_at")),
//!     )
//!     .await?;
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// A single row as returned by the table API.
pub type Row = serde_json::Map<String, Value>;

/// Identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Column equals the value
    Eq(Value),
    /// Column contains the text, ignoring case
    ContainsIgnoreCase(String),
}

/// A single column predicate. Multiple filters on one query are AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Eq(value.into()),
        }
    }

    pub fn contains_ignore_case(column: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::ContainsIgnoreCase(text.into()),
        }
    }

    /// Reference evaluation of the predicate against a row.
    ///
    /// Equality compares the textual form of scalars, so an integer id `7`
    /// matches the string `"7"` the same way it would in a URL-encoded query.
    /// Back ends that evaluate filters remotely do not need this; in-memory
    /// implementations use it to stay consistent with them.
    pub fn matches(&self, row: &Row) -> bool {
        let Some(cell) = row.get(&self.column) else {
            return false;
        };

        match &self.op {
            FilterOp::Eq(expected) => match (scalar_text(cell), scalar_text(expected)) {
                (Some(actual), Some(expected)) => actual == expected,
                _ => cell.is_null() && expected.is_null(),
            },
            FilterOp::ContainsIgnoreCase(needle) => cell
                .as_str()
                .map(|haystack| haystack.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false),
        }
    }
}

/// Textual form of a scalar JSON value; `None` for null, arrays and objects.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Sort order for a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// A filtered read against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub table: String,
    /// Projected columns; empty means all columns
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl SelectQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Row-level access to the remote store plus its blob storage.
///
/// # Contract
///
/// - `current_user` fails with `BridgeError::Unauthorized` when no session
///   exists.
/// - `insert` returns the rows as stored, including server-assigned columns.
/// - `delete` with an empty filter list must be rejected rather than
///   deleting every row of the table.
/// - `upload_blob` fails with `BridgeError::Upload` and returns the stored
///   path on success. `public_url` is pure and never touches the network.
/// - Timeouts are the implementation's concern; callers impose none.
///
/// # Example
///
/// ```ignore
/// let user = client.current_user().await?;
/// client
///     .delete("user_favorites", vec![Filter::eq("id", "7"), Filter::eq("user_id", user.id)])
///     .await?;
/// ```
#[async_trait]
pub trait RemoteTableClient: Send + Sync {
    /// Resolve the currently authenticated user
    async fn current_user(&self) -> Result<AuthUser>;

    /// Read rows matching the query
    async fn select(&self, query: SelectQuery) -> Result<Vec<Row>>;

    /// Insert rows and return them as stored
    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>>;

    /// Delete rows matching every filter
    async fn delete(&self, table: &str, filters: Vec<Filter>) -> Result<()>;

    /// Upload a blob and return its stored path
    async fn upload_blob(&self, bucket: &str, name: &str, bytes: Bytes) -> Result<String>;

    /// Public URL of a stored blob
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Account operations of the back end's auth service.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Register a new account
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// Start a session with email and password
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// End the current session
    async fn sign_out(&self) -> Result<()>;
}
