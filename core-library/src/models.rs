//! Domain models for favorites, merchandise, orders and profiles
//!
//! Every model is decoded from a back-end [`Row`]. Row ids may arrive as
//! strings or integers and are normalised to `String`; timestamps accept both
//! RFC 3339 and offset-less forms.

use bridge_traits::remote::Row;
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{LibraryError, Result};

/// Key used for case-insensitive artist-name comparisons.
pub fn normalize_artist_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Decode a back-end row into a model.
pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T> {
    serde_json::from_value(Value::Object(row)).map_err(LibraryError::from)
}

// =============================================================================
// Favorites
// =============================================================================

/// A user-artist pairing as stored remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteArtist {
    #[serde(deserialize_with = "id_format::deserialize")]
    pub id: String,
    #[serde(deserialize_with = "id_format::deserialize")]
    pub user_id: String,
    pub artist_name: String,
}

impl FavoriteArtist {
    pub fn normalized_name(&self) -> String {
        normalize_artist_name(&self.artist_name)
    }
}

/// Where an add request originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteSource {
    /// Typed into the draft field and submitted
    Typed,
    /// Picked from the suggestion list
    Suggested,
}

/// Single input for every favorite mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteRequest {
    pub artist_name: String,
    pub source: FavoriteSource,
}

impl FavoriteRequest {
    pub fn typed(artist_name: impl Into<String>) -> Self {
        Self {
            artist_name: artist_name.into(),
            source: FavoriteSource::Typed,
        }
    }

    pub fn suggested(artist_name: impl Into<String>) -> Self {
        Self {
            artist_name: artist_name.into(),
            source: FavoriteSource::Suggested,
        }
    }

    /// Trimmed artist name, rejecting blank input.
    pub fn validated_name(&self) -> Result<&str> {
        let name = self.artist_name.trim();
        if name.is_empty() {
            return Err(LibraryError::validation(
                "artist_name",
                "Artist name cannot be empty",
            ));
        }
        Ok(name)
    }
}

// =============================================================================
// Suggestions
// =============================================================================

/// A candidate from the artist directory; never persisted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtistSuggestion {
    pub name: String,
}

// =============================================================================
// Merchandise
// =============================================================================

/// A purchasable item in an artist's catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchandiseItem {
    #[serde(deserialize_with = "id_format::deserialize")]
    pub id: String,
    #[serde(deserialize_with = "id_format::deserialize")]
    pub artist_id: String,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    pub image_url: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default, deserialize_with = "timestamp_format::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Fields supplied by the publisher of a new catalog item.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMerchandise {
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub stock: i64,
}

impl NewMerchandise {
    pub fn new(name: impl Into<String>, price: Decimal, stock: i64) -> Self {
        Self {
            name: name.into(),
            price,
            description: None,
            stock,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validate the item fields.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LibraryError::validation("name", "Item name cannot be empty"));
        }

        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(LibraryError::validation(
                "price",
                format!("Price cannot be negative, got {}", self.price),
            ));
        }

        if self.stock < 0 {
            return Err(LibraryError::validation(
                "stock",
                format!("Stock cannot be negative, got {}", self.stock),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Display partition of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Completed,
}

impl OrderStatus {
    /// `"pending"` in any case is pending; anything else, including a
    /// padded or missing status, is shown as completed.
    pub fn classify(raw: Option<&str>) -> Self {
        match raw {
            Some(status) if status.to_lowercase() == "pending" => OrderStatus::Pending,
            _ => OrderStatus::Completed,
        }
    }
}

/// A past purchase. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(deserialize_with = "id_format::deserialize")]
    pub id: String,
    #[serde(deserialize_with = "id_format::deserialize")]
    pub user_id: String,
    pub name: String,
    pub price: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "timestamp_format::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_quantity() -> i64 {
    1
}

impl Order {
    pub fn display_status(&self) -> OrderStatus {
        OrderStatus::classify(self.status.as_deref())
    }

    pub fn is_pending(&self) -> bool {
        self.display_status() == OrderStatus::Pending
    }

    /// Price times quantity
    pub fn total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

// =============================================================================
// Profiles
// =============================================================================

/// Profile columns read for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileRow {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Display identity of a user.
///
/// `avatar_url` is `None` when the caller should show its bundled default
/// image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub avatar_url: Option<String>,
    /// True when the username is the configured placeholder
    pub is_placeholder: bool,
}

impl ProfileView {
    pub fn placeholder(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            avatar_url: None,
            is_placeholder: true,
        }
    }
}

// =============================================================================
// Serde helpers
// =============================================================================

mod id_format {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Integer(i64),
        Unsigned(u64),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => text,
            RawId::Integer(n) => n.to_string(),
            RawId::Unsigned(n) => n.to_string(),
        })
    }
}

mod timestamp_format {
    use super::*;

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_timestamp))
    }

    /// `timestamptz` columns carry an offset; `timestamp` columns do not and
    /// are read as UTC.
    pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
                    .map(|naive| naive.and_utc())
                    .ok()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_normalize_artist_name() {
        assert_eq!(normalize_artist_name("  Taylor Swift "), "taylor swift");
        assert_eq!(
            normalize_artist_name("ADELE"),
            normalize_artist_name("adele")
        );
    }

    #[test]
    fn test_favorite_ids_accept_numbers_and_strings() {
        let favorite: FavoriteArtist = from_row(row(json!({
            "id": 17,
            "user_id": "2b7c9f7e-0000-4000-8000-000000000001",
            "artist_name": "Adele",
            "created_at": "2024-05-01T10:00:00+00:00"
        })))
        .unwrap();

        assert_eq!(favorite.id, "17");
        assert_eq!(favorite.user_id, "2b7c9f7e-0000-4000-8000-000000000001");
    }

    #[test]
    fn test_malformed_row_is_remote_error() {
        let result: Result<FavoriteArtist> = from_row(row(json!({ "id": 1 })));
        assert!(matches!(result, Err(LibraryError::Remote(_))));
    }

    #[test]
    fn test_request_validation() {
        assert_eq!(
            FavoriteRequest::typed("  Adele  ").validated_name().unwrap(),
            "Adele"
        );
        assert!(FavoriteRequest::suggested("   ")
            .validated_name()
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_merchandise_decoding() {
        let item: MerchandiseItem = from_row(row(json!({
            "id": 3,
            "artist_id": 42,
            "name": "Tour Tee",
            "price": 24.99,
            "description": null,
            "image_url": "https://cdn/tee.jpg",
            "stock": 10,
            "created_at": "2024-05-01T10:00:00.123456"
        })))
        .unwrap();

        assert_eq!(item.artist_id, "42");
        assert_eq!(item.price, Decimal::new(2499, 2));
        assert!(item.created_at.is_some());
    }

    #[test]
    fn test_new_merchandise_validation() {
        assert!(NewMerchandise::new("Tee", Decimal::new(1000, 2), 5)
            .validate()
            .is_ok());
        assert!(NewMerchandise::new("Free Sticker", Decimal::ZERO, 0)
            .validate()
            .is_ok());
        assert!(NewMerchandise::new(" ", Decimal::ONE, 1).validate().is_err());
        assert!(NewMerchandise::new("Tee", Decimal::new(-1, 0), 1)
            .validate()
            .is_err());
        assert!(NewMerchandise::new("Tee", Decimal::ONE, -1)
            .validate()
            .is_err());
    }

    #[test]
    fn test_order_status_classification() {
        assert_eq!(OrderStatus::classify(Some("Pending")), OrderStatus::Pending);
        assert_eq!(OrderStatus::classify(Some("PENDING")), OrderStatus::Pending);
        assert_eq!(
            OrderStatus::classify(Some("completed")),
            OrderStatus::Completed
        );
        assert_eq!(OrderStatus::classify(Some("shipped")), OrderStatus::Completed);
        assert_eq!(OrderStatus::classify(Some(" pending ")), OrderStatus::Completed);
        assert_eq!(OrderStatus::classify(None), OrderStatus::Completed);
    }

    #[test]
    fn test_order_total() {
        let order: Order = from_row(row(json!({
            "id": "o-1",
            "user_id": "u-1",
            "name": "Vinyl",
            "price": 30,
            "quantity": 2,
            "status": null
        })))
        .unwrap();

        assert_eq!(order.total(), Decimal::from(60));
        assert!(!order.is_pending());
    }

    #[test]
    fn test_timestamp_formats() {
        use timestamp_format::parse_timestamp;

        assert!(parse_timestamp("2024-05-01T10:00:00Z").is_some());
        assert!(parse_timestamp("2024-05-01T10:00:00.5+02:00").is_some());
        assert!(parse_timestamp("2024-05-01 10:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
