//! End-to-end flows through the service façade over the in-memory back end.

use std::sync::Arc;

use bridge_traits::time::FixedClock;
use bytes::Bytes;
use core_auth::{AuthError, SignUpRequest};
use core_library::models::{NewMerchandise, OrderStatus};
use core_library::repositories::FavoriteAction;
use core_library::testing::{InMemoryBackend, Operation};
use core_library::{LibraryError, Versioned};
use core_runtime::CoreConfig;
use core_service::{CoreError, CoreService};
use rust_decimal::Decimal;
use serde_json::json;

const NOW_MILLIS: i64 = 1_700_000_000_000;

fn service(backend: &Arc<InMemoryBackend>) -> CoreService {
    let config = CoreConfig::builder()
        .remote(backend.clone())
        .auth_gateway(backend.clone())
        .clock(Arc::new(FixedClock::from_millis(NOW_MILLIS)))
        .build()
        .unwrap();
    CoreService::new(config).unwrap()
}

fn directory() -> Arc<InMemoryBackend> {
    let backend = Arc::new(InMemoryBackend::new());
    backend.seed(
        "artists",
        vec![
            json!({ "id": "a-1", "name": "Taylor Swift" }),
            json!({ "id": "a-2", "name": "Tame Impala" }),
            json!({ "id": "a-3", "name": "Adele" }),
        ],
    );
    backend
}

#[tokio::test]
async fn sign_up_then_build_favorites() {
    let backend = directory();
    let core = service(&backend);
    let accounts = core.accounts().unwrap();

    let user = accounts
        .sign_up(SignUpRequest::new(
            "fan@example.com",
            "fan_01",
            "hunter22",
            "hunter22",
        ))
        .await
        .unwrap();
    accounts.sign_in("fan@example.com", "hunter22").await.unwrap();

    let profile = core.profiles().load_profile(&user.id).await;
    assert_eq!(profile.username, "fan_01");
    assert!(!profile.is_placeholder);

    let mut favorites = core.favorites_controller(user.id.clone());
    favorites.refresh().await.unwrap();
    assert!(favorites.favorites().is_empty());

    assert!(favorites.type_query("ta").await);
    assert_eq!(favorites.suggestions().len(), 2);
    assert_eq!(
        favorites.select_suggestion(1).await.unwrap(),
        FavoriteAction::Added
    );

    favorites.type_query("Adele").await;
    assert_eq!(favorites.submit_draft().await.unwrap(), FavoriteAction::Added);

    favorites.type_query("adele").await;
    assert_eq!(
        favorites.submit_draft().await.unwrap(),
        FavoriteAction::Unchanged
    );

    assert_eq!(favorites.favorites().names(), vec!["Tame Impala", "Adele"]);
    assert_eq!(backend.rows("user_favorites").len(), 2);
}

#[tokio::test]
async fn artist_page_reflects_favorites_and_catalog() {
    let backend = directory();
    backend.sign_in_as("u-1", None);
    let core = service(&backend);

    let item = core
        .catalog()
        .publish_merchandise(
            NewMerchandise::new("Eras Tour Tee", Decimal::new(3500, 2), 10),
            Bytes::from_static(b"jpeg"),
            "a-1",
        )
        .await
        .unwrap();
    assert_eq!(
        backend.blob("merch-images", "1700000000000-Eras_Tour_Tee.jpg"),
        Some(Bytes::from_static(b"jpeg"))
    );
    assert_eq!(item.artist_id, "a-1");

    let mut favorites = core.favorites_controller("u-1");
    favorites.toggle("Taylor Swift").await.unwrap();

    let page = core
        .load_artist_page(favorites.favorites(), "taylor swift", Some("a-1"))
        .await
        .unwrap();
    assert!(page.is_favorite);
    let catalog = page.catalog.unwrap();
    assert_eq!(catalog.len(), 1);
    assert!(catalog.revision() > favorites.favorites().revision());

    backend.reset_calls();
    let page = core
        .load_artist_page(favorites.favorites(), "Adele", None)
        .await
        .unwrap();
    assert!(!page.is_favorite);
    assert!(page.catalog.is_none());
    assert_eq!(backend.calls(Operation::Select), 0);
}

#[tokio::test]
async fn orders_split_by_status() {
    let backend = Arc::new(InMemoryBackend::signed_in("u-1"));
    backend.seed(
        "orders",
        vec![
            json!({ "user_id": "u-1", "name": "Vinyl", "price": 30.0, "status": "Pending" }),
            json!({ "user_id": "u-1", "name": "Poster", "price": 12.5, "status": "Completed" }),
            json!({ "user_id": "u-2", "name": "Hoodie", "price": 55.0, "status": "Pending" }),
        ],
    );
    let core = service(&backend);

    let history = core.orders().list_orders("u-1").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.pending()[0].name, "Vinyl");
    assert_eq!(history.completed()[0].display_status(), OrderStatus::Completed);
}

#[tokio::test]
async fn errors_keep_their_kind() {
    let backend = directory();
    let core = service(&backend);

    let err = core
        .accounts()
        .unwrap()
        .sign_in("fan@example.com", "nope")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials(_)));

    let mut favorites = core.favorites_controller("u-1");
    let err = favorites.toggle("Adele").await.unwrap_err();
    assert!(matches!(err, CoreError::Library(LibraryError::Auth(_))));

    backend.sign_in_as("u-1", None);
    backend.fail_on(Operation::Select);
    let err = core
        .load_artist_page(favorites.favorites(), "Adele", Some("a-3"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Library(LibraryError::Catalog { .. })
    ));
}
