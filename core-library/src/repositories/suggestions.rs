//! Artist suggestion search and the picker state that consumes it

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::remote::{Filter, RemoteTableClient, SelectQuery};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::models::{from_row, ArtistSuggestion, FavoriteRequest};

/// Artist directory search
#[async_trait]
pub trait SuggestionSearch: Send + Sync {
    /// Artists whose name contains `query`, ignoring case
    ///
    /// A blank query returns an empty list without a remote call. Results
    /// keep the back end's order. Callers debounce if they need to.
    async fn suggest(&self, query: &str) -> Result<Vec<ArtistSuggestion>>;
}

/// [`SuggestionSearch`] over a remote artist table with a `name` column
pub struct RemoteSuggestionSearch {
    remote: Arc<dyn RemoteTableClient>,
    table: String,
    limit: Option<usize>,
}

impl RemoteSuggestionSearch {
    pub fn new(remote: Arc<dyn RemoteTableClient>, table: impl Into<String>) -> Self {
        Self {
            remote,
            table: table.into(),
            limit: None,
        }
    }

    /// Cap the number of suggestions per query
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Deserialize)]
struct ArtistNameRow {
    name: String,
}

#[async_trait]
impl SuggestionSearch for RemoteSuggestionSearch {
    #[instrument(skip(self))]
    async fn suggest(&self, query: &str) -> Result<Vec<ArtistSuggestion>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut select = SelectQuery::new(&self.table)
            .columns(["name"])
            .filter(Filter::contains_ignore_case("name", query));
        if let Some(limit) = self.limit {
            select = select.limit(limit);
        }

        let rows = self.remote.select(select).await?;
        let suggestions = rows
            .into_iter()
            .map(|row| from_row::<ArtistNameRow>(row).map(|r| ArtistSuggestion { name: r.name }))
            .collect::<Result<Vec<_>>>()?;

        debug!(count = suggestions.len(), "Fetched suggestions");
        Ok(suggestions)
    }
}

/// Handle for one in-flight suggestion query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    sequence: u64,
    query: String,
}

impl QueryTicket {
    /// Trimmed text to search for
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Caller-owned state of one "add an artist" interaction.
///
/// Every keystroke starts a new query; only results for the latest query are
/// installed, so a slow response for an older prefix cannot overwrite newer
/// suggestions.
///
/// ```
/// use core_library::models::ArtistSuggestion;
/// use core_library::repositories::ArtistPicker;
///
/// let mut picker = ArtistPicker::new();
/// let first = picker.begin_query("ta").unwrap();
/// let second = picker.begin_query("tay").unwrap();
///
/// let taylor = vec![ArtistSuggestion { name: "Taylor Swift".into() }];
/// assert!(!picker.accept(&first, taylor.clone()));
/// assert!(picker.accept(&second, taylor));
/// assert_eq!(picker.suggestions().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistPicker {
    draft: String,
    suggestions: Vec<ArtistSuggestion>,
    sequence: u64,
}

impl ArtistPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn suggestions(&self) -> &[ArtistSuggestion] {
        &self.suggestions
    }

    /// Record the draft text and start a query for it.
    ///
    /// A blank draft clears the suggestions and returns `None`; any query
    /// still in flight becomes stale either way.
    pub fn begin_query(&mut self, text: impl Into<String>) -> Option<QueryTicket> {
        self.draft = text.into();
        self.sequence += 1;

        let query = self.draft.trim();
        if query.is_empty() {
            self.suggestions.clear();
            return None;
        }

        Some(QueryTicket {
            sequence: self.sequence,
            query: query.to_string(),
        })
    }

    /// Install results if `ticket` is still the latest query.
    pub fn accept(&mut self, ticket: &QueryTicket, results: Vec<ArtistSuggestion>) -> bool {
        if ticket.sequence != self.sequence {
            debug!(query = %ticket.query, "Dropping stale suggestions");
            return false;
        }
        self.suggestions = results;
        true
    }

    /// Request for the suggestion at `index`.
    pub fn select(&self, index: usize) -> Option<FavoriteRequest> {
        self.suggestions
            .get(index)
            .map(|suggestion| FavoriteRequest::suggested(suggestion.name.clone()))
    }

    /// Request for the typed draft, if it is not blank.
    pub fn draft_request(&self) -> Option<FavoriteRequest> {
        let name = self.draft.trim();
        (!name.is_empty()).then(|| FavoriteRequest::typed(name))
    }

    /// Reset after the interaction completed; in-flight results are dropped.
    pub fn clear(&mut self) {
        self.draft.clear();
        self.suggestions.clear();
        self.sequence += 1;
    }
}
