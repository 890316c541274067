//! # Repository Pattern Implementation
//!
//! Each repository is a trait plus an implementation over
//! [`RemoteTableClient`](bridge_traits::remote::RemoteTableClient).
//!
//! ## Architecture
//!
//! - Traits define the interface the service layer depends on
//! - `Remote*` implementations issue table/blob calls through the bridge
//! - Every operation returns a fresh owned snapshot; inputs are never mutated
//! - No operation retries; failures are terminal for the triggering action
//!
//! ## Available Repositories
//!
//! - `FavoritesRepository` - A user's favorite artists with toggle semantics
//! - `SuggestionSearch` - Case-insensitive substring search of the artist directory
//! - `CatalogRepository` - Per-artist merchandise listing and publishing
//! - `OrderHistoryView` - A user's orders with pending / completed partition
//! - `ProfileLoader` - Display identity with placeholder fallback

pub mod catalog;
pub mod favorites;
pub mod orders;
pub mod profile;
pub mod suggestions;

pub use catalog::{blob_name, CatalogRepository, RemoteCatalogRepository};
pub use favorites::{FavoriteAction, FavoritesRepository, RemoteFavoritesRepository, ToggleOutcome};
pub use orders::{OrderHistoryView, RemoteOrderHistory};
pub use profile::{ProfileLoader, RemoteProfileLoader};
pub use suggestions::{ArtistPicker, QueryTicket, RemoteSuggestionSearch, SuggestionSearch};
