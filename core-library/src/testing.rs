//! Test doubles for the remote back end
//!
//! - [`InMemoryBackend`]: a deterministic fake implementing both
//!   [`RemoteTableClient`] and [`AuthGateway`], with per-operation failure
//!   injection and call counters.
//! - [`MockRemoteTable`]: a `mockall` mock of [`RemoteTableClient`] for tests
//!   that assert exact call patterns.
//!
//! Available under `cfg(test)` and with the `test-support` feature.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::remote::{AuthGateway, AuthUser, Filter, OrderBy, RemoteTableClient, Row, SelectQuery};
use bytes::Bytes;
use chrono::DateTime;
use parking_lot::Mutex;
use serde_json::Value;

/// Base of the synthetic `created_at` values assigned on insert
const CREATED_AT_BASE_SECS: i64 = 1_700_000_000;

mockall::mock! {
    pub RemoteTable {}

    #[async_trait]
    impl RemoteTableClient for RemoteTable {
        async fn current_user(&self) -> Result<AuthUser>;
        async fn select(&self, query: SelectQuery) -> Result<Vec<Row>>;
        async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>>;
        async fn delete(&self, table: &str, filters: Vec<Filter>) -> Result<()>;
        async fn upload_blob(&self, bucket: &str, name: &str, bytes: Bytes) -> Result<String>;
        fn public_url(&self, bucket: &str, path: &str) -> String;
    }
}

/// Operations whose calls are counted and can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CurrentUser,
    Select,
    Insert,
    Delete,
    Upload,
    SignUp,
    SignIn,
    SignOut,
}

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Row>>,
    blobs: HashMap<(String, String), Bytes>,
    accounts: HashMap<String, (String, AuthUser)>,
    session: Option<AuthUser>,
    failures: HashSet<Operation>,
    calls: HashMap<Operation, usize>,
    next_id: i64,
}

impl State {
    fn enter(&mut self, operation: Operation) -> Result<()> {
        *self.calls.entry(operation).or_insert(0) += 1;
        if self.failures.contains(&operation) {
            return Err(injected_failure(operation));
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

fn injected_failure(operation: Operation) -> BridgeError {
    match operation {
        Operation::Upload => BridgeError::Upload("injected upload failure".to_string()),
        Operation::CurrentUser => BridgeError::Unauthorized("injected session failure".to_string()),
        other => BridgeError::Remote {
            status: Some(503),
            message: format!("injected {:?} failure", other),
        },
    }
}

/// In-memory table store, blob store and auth service.
///
/// Inserted rows receive an integer `id` and a `created_at` timestamp when
/// they lack one; timestamps increase with every insert so "newest first"
/// ordering is deterministic.
#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with an active session for `user_id`.
    pub fn signed_in(user_id: &str) -> Self {
        let backend = Self::new();
        backend.sign_in_as(user_id, None);
        backend
    }

    /// Set the active session without going through `sign_in`.
    pub fn sign_in_as(&self, user_id: &str, email: Option<&str>) {
        self.state.lock().session = Some(AuthUser {
            id: user_id.to_string(),
            email: email.map(str::to_string),
        });
    }

    pub fn clear_session(&self) {
        self.state.lock().session = None;
    }

    /// Register an account that can sign in.
    pub fn register_account(&self, user_id: &str, email: &str, password: &str) {
        self.state.lock().accounts.insert(
            email.to_string(),
            (
                password.to_string(),
                AuthUser {
                    id: user_id.to_string(),
                    email: Some(email.to_string()),
                },
            ),
        );
    }

    /// Insert rows directly, bypassing counters and failure injection.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        let mut state = self.state.lock();
        for value in rows {
            if let Value::Object(row) = value {
                let row = prepare_row(&mut state, row);
                state.tables.entry(table.to_string()).or_default().push(row);
            }
        }
    }

    /// Current contents of a table in storage order.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.state
            .lock()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn blob(&self, bucket: &str, path: &str) -> Option<Bytes> {
        self.state
            .lock()
            .blobs
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    pub fn blob_count(&self) -> usize {
        self.state.lock().blobs.len()
    }

    /// Make every subsequent call of `operation` fail.
    pub fn fail_on(&self, operation: Operation) {
        self.state.lock().failures.insert(operation);
    }

    pub fn recover(&self, operation: Operation) {
        self.state.lock().failures.remove(&operation);
    }

    /// Number of calls made to `operation`, including failed ones.
    pub fn calls(&self, operation: Operation) -> usize {
        self.state
            .lock()
            .calls
            .get(&operation)
            .copied()
            .unwrap_or(0)
    }

    pub fn reset_calls(&self) {
        self.state.lock().calls.clear();
    }
}

fn prepare_row(state: &mut State, mut row: Row) -> Row {
    let needs_id = !row.contains_key("id");
    let sequence = state.allocate_id();
    if needs_id {
        row.insert("id".to_string(), Value::from(sequence));
    }
    if !row.contains_key("created_at") {
        let created_at = DateTime::from_timestamp(CREATED_AT_BASE_SECS + sequence, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();
        row.insert("created_at".to_string(), Value::from(created_at));
    }
    row
}

fn compare_cells(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        // Nulls and missing cells sort last
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

fn sort_rows(rows: &mut [Row], order: &OrderBy) {
    rows.sort_by(|a, b| {
        let ordering = compare_cells(a.get(&order.column), b.get(&order.column));
        if order.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

fn project(row: Row, columns: &[String]) -> Row {
    if columns.is_empty() {
        return row;
    }
    row.into_iter()
        .filter(|(key, _)| columns.iter().any(|column| column == key))
        .collect()
}

#[async_trait]
impl RemoteTableClient for InMemoryBackend {
    async fn current_user(&self) -> Result<AuthUser> {
        let mut state = self.state.lock();
        state.enter(Operation::CurrentUser)?;
        state
            .session
            .clone()
            .ok_or_else(|| BridgeError::Unauthorized("no active session".to_string()))
    }

    async fn select(&self, query: SelectQuery) -> Result<Vec<Row>> {
        let mut state = self.state.lock();
        state.enter(Operation::Select)?;

        let mut rows: Vec<Row> = state
            .tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|filter| filter.matches(row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            sort_rows(&mut rows, order);
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows
            .into_iter()
            .map(|row| project(row, &query.columns))
            .collect())
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>> {
        let mut state = self.state.lock();
        state.enter(Operation::Insert)?;

        let stored: Vec<Row> = rows
            .into_iter()
            .map(|row| prepare_row(&mut state, row))
            .collect();
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn delete(&self, table: &str, filters: Vec<Filter>) -> Result<()> {
        let mut state = self.state.lock();
        state.enter(Operation::Delete)?;

        if filters.is_empty() {
            return Err(BridgeError::OperationFailed(format!(
                "refusing to delete from '{}' without filters",
                table
            )));
        }

        if let Some(rows) = state.tables.get_mut(table) {
            rows.retain(|row| !filters.iter().all(|filter| filter.matches(row)));
        }
        Ok(())
    }

    async fn upload_blob(&self, bucket: &str, name: &str, bytes: Bytes) -> Result<String> {
        let mut state = self.state.lock();
        state.enter(Operation::Upload)?;

        let key = (bucket.to_string(), name.to_string());
        if state.blobs.contains_key(&key) {
            return Err(BridgeError::Upload(format!(
                "object '{}' already exists in '{}'",
                name, bucket
            )));
        }
        state.blobs.insert(key, bytes);
        Ok(name.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{}/{}", bucket, path)
    }
}

#[async_trait]
impl AuthGateway for InMemoryBackend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        let mut state = self.state.lock();
        state.enter(Operation::SignUp)?;

        if state.accounts.contains_key(email) {
            return Err(BridgeError::Remote {
                status: Some(422),
                message: "User already registered".to_string(),
            });
        }

        let id = format!("user-{}", state.allocate_id());
        let user = AuthUser {
            id,
            email: Some(email.to_string()),
        };
        state
            .accounts
            .insert(email.to_string(), (password.to_string(), user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let mut state = self.state.lock();
        state.enter(Operation::SignIn)?;

        let user = match state.accounts.get(email) {
            Some((stored, user)) if stored == password => user.clone(),
            _ => {
                return Err(BridgeError::Unauthorized(
                    "Invalid login credentials".to_string(),
                ))
            }
        };
        state.session = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.enter(Operation::SignOut)?;
        state.session = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_select_filters_orders_and_limits() {
        let backend = InMemoryBackend::new();
        backend.seed(
            "artists",
            vec![
                json!({ "name": "Taylor Swift" }),
                json!({ "name": "Harry Styles" }),
                json!({ "name": "Tay Keith" }),
            ],
        );

        let rows = backend
            .select(
                SelectQuery::new("artists")
                    .columns(["name"])
                    .filter(Filter::contains_ignore_case("name", "TAY"))
                    .order(OrderBy::desc("created_at"))
                    .limit(5),
            )
            .await
            .unwrap();

        let names: Vec<&str> = rows.iter().filter_map(|r| r["name"].as_str()).collect();
        assert_eq!(names, vec!["Tay Keith", "Taylor Swift"]);
        assert!(rows[0].get("id").is_none());
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_delete_matches_all_filters() {
        let backend = InMemoryBackend::new();
        let mut row = Row::new();
        row.insert("user_id".to_string(), json!("u-1"));

        let stored = backend.insert("user_favorites", vec![row]).await.unwrap();
        let id = stored[0]["id"].clone();

        backend
            .delete(
                "user_favorites",
                vec![Filter::eq("id", id), Filter::eq("user_id", "someone-else")],
            )
            .await
            .unwrap();
        assert_eq!(backend.rows("user_favorites").len(), 1);

        assert!(backend.delete("user_favorites", Vec::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_failure_injection_counts_calls() {
        let backend = InMemoryBackend::signed_in("u-1");
        backend.fail_on(Operation::Select);

        assert!(backend.select(SelectQuery::new("orders")).await.is_err());
        assert_eq!(backend.calls(Operation::Select), 1);

        backend.recover(Operation::Select);
        assert!(backend.select(SelectQuery::new("orders")).await.is_ok());
        assert_eq!(backend.calls(Operation::Select), 2);
    }

    #[tokio::test]
    async fn test_auth_flow() {
        let backend = InMemoryBackend::new();
        assert!(backend.current_user().await.unwrap_err().is_unauthorized());

        let user = backend.sign_up("fan@example.com", "secret").await.unwrap();
        assert!(backend.sign_up("fan@example.com", "other").await.is_err());

        assert!(backend.sign_in("fan@example.com", "wrong").await.is_err());
        let signed_in = backend.sign_in("fan@example.com", "secret").await.unwrap();
        assert_eq!(signed_in, user);
        assert_eq!(backend.current_user().await.unwrap().id, user.id);

        backend.sign_out().await.unwrap();
        assert!(backend.current_user().await.is_err());
    }
}
