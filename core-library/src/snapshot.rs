//! Versioned snapshots returned by the repositories
//!
//! A snapshot is an owned value. Callers replace their copy wholesale with a
//! newer one and never mutate it in place. Each snapshot carries a
//! [`Revision`] drawn from a [`RevisionCounter`] shared by the repositories,
//! so a caller holding two results can tell which one was produced last.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::models::{normalize_artist_name, FavoriteArtist, MerchandiseItem, Order};

/// Monotonic stamp of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Revision(u64);

impl Revision {
    /// Revision of snapshots built locally before any remote result
    pub const INITIAL: Revision = Revision(0);

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Source of revisions, shared by every repository of one service.
#[derive(Debug, Default)]
pub struct RevisionCounter {
    last: AtomicU64,
}

impl RevisionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next revision; strictly greater than every revision handed out before.
    pub fn next(&self) -> Revision {
        Revision(self.last.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn last(&self) -> Revision {
        Revision(self.last.load(Ordering::SeqCst))
    }
}

/// Anything stamped with a [`Revision`].
pub trait Versioned {
    fn revision(&self) -> Revision;
}

/// Replace `slot` with `incoming` unless `slot` is newer.
///
/// Returns whether the replacement happened. Results that arrive after a
/// newer snapshot was installed are dropped here.
pub fn replace_if_newer<T: Versioned>(slot: &mut T, incoming: T) -> bool {
    if incoming.revision() >= slot.revision() {
        *slot = incoming;
        true
    } else {
        false
    }
}

// =============================================================================
// Favorites
// =============================================================================

/// A user's favorite artists.
///
/// Entries keep remote insertion order. The normalised-name index guarantees
/// at most one entry per case-insensitive artist name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteSet {
    owner: String,
    revision: Revision,
    entries: Vec<FavoriteArtist>,
    index: HashMap<String, usize>,
}

impl FavoriteSet {
    /// Empty set for a user, before anything was fetched.
    pub fn empty(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            revision: Revision::INITIAL,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a set from back-end rows, keeping the first row for each
    /// case-insensitive name.
    pub fn from_entries(
        owner: impl Into<String>,
        revision: Revision,
        rows: impl IntoIterator<Item = FavoriteArtist>,
    ) -> Self {
        let mut set = Self {
            owner: owner.into(),
            revision,
            entries: Vec::new(),
            index: HashMap::new(),
        };

        for favorite in rows {
            if !set.push(favorite.clone()) {
                warn!(
                    user_id = %set.owner,
                    favorite_id = %favorite.id,
                    artist_name = %favorite.artist_name,
                    "Dropping duplicate favorite"
                );
            }
        }

        set
    }

    fn push(&mut self, favorite: FavoriteArtist) -> bool {
        let key = favorite.normalized_name();
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(favorite);
        true
    }

    /// Copy with `favorite` appended.
    pub(crate) fn with_added(&self, favorite: FavoriteArtist, revision: Revision) -> Self {
        let mut next = self.clone();
        next.revision = revision;
        if !next.push(favorite.clone()) {
            warn!(
                user_id = %self.owner,
                artist_name = %favorite.artist_name,
                "Favorite already present, keeping existing entry"
            );
        }
        next
    }

    /// Copy without the entry whose id is `favorite_id`.
    pub(crate) fn without(&self, favorite_id: &str, revision: Revision) -> Self {
        Self::from_entries(
            self.owner.clone(),
            revision,
            self.entries
                .iter()
                .filter(|favorite| favorite.id != favorite_id)
                .cloned(),
        )
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn entries(&self) -> &[FavoriteArtist] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &FavoriteArtist> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry matching `artist_name`, ignoring case and surrounding spaces.
    pub fn find(&self, artist_name: &str) -> Option<&FavoriteArtist> {
        self.index
            .get(&normalize_artist_name(artist_name))
            .and_then(|&position| self.entries.get(position))
    }

    pub fn contains(&self, artist_name: &str) -> bool {
        self.find(artist_name).is_some()
    }

    /// Artist names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|favorite| favorite.artist_name.as_str())
            .collect()
    }
}

impl Versioned for FavoriteSet {
    fn revision(&self) -> Revision {
        self.revision
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// An artist's merchandise, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    artist_id: String,
    revision: Revision,
    items: Vec<MerchandiseItem>,
}

impl Catalog {
    pub fn new(artist_id: impl Into<String>, revision: Revision, items: Vec<MerchandiseItem>) -> Self {
        Self {
            artist_id: artist_id.into(),
            revision,
            items,
        }
    }

    pub fn empty(artist_id: impl Into<String>) -> Self {
        Self::new(artist_id, Revision::INITIAL, Vec::new())
    }

    pub fn artist_id(&self) -> &str {
        &self.artist_id
    }

    pub fn items(&self) -> &[MerchandiseItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Versioned for Catalog {
    fn revision(&self) -> Revision {
        self.revision
    }
}

// =============================================================================
// Orders
// =============================================================================

/// A user's orders, newest first.
///
/// The pending / completed views are computed from the owned sequence on
/// every call.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderHistory {
    user_id: String,
    revision: Revision,
    orders: Vec<Order>,
}

impl OrderHistory {
    pub fn new(user_id: impl Into<String>, revision: Revision, orders: Vec<Order>) -> Self {
        Self {
            user_id: user_id.into(),
            revision,
            orders,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn pending(&self) -> Vec<&Order> {
        self.orders.iter().filter(|order| order.is_pending()).collect()
    }

    pub fn completed(&self) -> Vec<&Order> {
        self.orders.iter().filter(|order| !order.is_pending()).collect()
    }
}

impl Versioned for OrderHistory {
    fn revision(&self) -> Revision {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn favorite(id: &str, name: &str) -> FavoriteArtist {
        FavoriteArtist {
            id: id.to_string(),
            user_id: "u-1".to_string(),
            artist_name: name.to_string(),
        }
    }

    fn order(id: &str, status: Option<&str>) -> Order {
        Order {
            id: id.to_string(),
            user_id: "u-1".to_string(),
            name: format!("Order {}", id),
            price: Decimal::new(1500, 2),
            quantity: 1,
            image_url: None,
            status: status.map(str::to_string),
            created_at: None,
        }
    }

    #[test]
    fn test_revision_counter_is_monotonic() {
        let counter = RevisionCounter::new();
        let first = counter.next();
        let second = counter.next();

        assert!(second > first);
        assert!(first > Revision::INITIAL);
        assert_eq!(counter.last(), second);
    }

    #[test]
    fn test_from_entries_drops_case_insensitive_duplicates() {
        let set = FavoriteSet::from_entries(
            "u-1",
            Revision::INITIAL,
            vec![
                favorite("1", "Adele"),
                favorite("2", "ADELE "),
                favorite("3", "Taylor Swift"),
            ],
        );

        assert_eq!(set.len(), 2);
        assert_eq!(set.names(), vec!["Adele", "Taylor Swift"]);
        assert_eq!(set.find("adele").map(|f| f.id.as_str()), Some("1"));
    }

    #[test]
    fn test_with_added_and_without_leave_original_untouched() {
        let counter = RevisionCounter::new();
        let original = FavoriteSet::from_entries("u-1", counter.next(), vec![favorite("1", "Adele")]);

        let added = original.with_added(favorite("2", "Sabrina Carpenter"), counter.next());
        assert_eq!(added.len(), 2);
        assert!(added.contains("sabrina carpenter"));
        assert_eq!(original.len(), 1);

        let removed = added.without("1", counter.next());
        assert_eq!(removed.names(), vec!["Sabrina Carpenter"]);
        assert!(removed.find("Sabrina Carpenter").is_some());
        assert!(removed.revision() > added.revision());
    }

    #[test]
    fn test_with_added_keeps_existing_on_conflict() {
        let set = FavoriteSet::from_entries("u-1", Revision::INITIAL, vec![favorite("1", "Adele")]);
        let next = set.with_added(favorite("9", "adele"), Revision::INITIAL);
        assert_eq!(next.len(), 1);
        assert_eq!(next.entries()[0].id, "1");
    }

    #[test]
    fn test_replace_if_newer() {
        let counter = RevisionCounter::new();
        let older = FavoriteSet::from_entries("u-1", counter.next(), vec![favorite("1", "Adele")]);
        let newer = FavoriteSet::from_entries("u-1", counter.next(), Vec::new());

        let mut slot = newer.clone();
        assert!(!replace_if_newer(&mut slot, older));
        assert!(slot.is_empty());

        let mut slot = FavoriteSet::empty("u-1");
        assert!(replace_if_newer(&mut slot, newer));
    }

    #[test]
    fn test_order_partition() {
        let history = OrderHistory::new(
            "u-1",
            Revision::INITIAL,
            vec![
                order("1", Some("Pending")),
                order("2", Some("completed")),
                order("3", None),
                order("4", Some("PENDING")),
            ],
        );

        let pending: Vec<&str> = history.pending().iter().map(|o| o.id.as_str()).collect();
        let completed: Vec<&str> = history.completed().iter().map(|o| o.id.as_str()).collect();

        assert_eq!(pending, vec!["1", "4"]);
        assert_eq!(completed, vec!["2", "3"]);
    }
}
