//! Storage-level behavior: pool persistence and dialog durability.

mod common;

use bunkerbot::game::Category;

#[tokio::test]
async fn replace_pool_roundtrips_through_the_database() {
    let storage = common::storage().await;
    let pool = common::test_pool();

    storage.replace_pool(&pool.entries()).await.unwrap();
    let loaded = storage.load_pool().await.unwrap();

    for category in Category::ALL {
        assert_eq!(loaded.values(category), pool.values(category));
    }
}

#[tokio::test]
async fn replace_pool_is_wholesale() {
    let storage = common::storage().await;
    storage
        .replace_pool(&[(Category::Hobby, "Chess".to_string())])
        .await
        .unwrap();
    storage
        .replace_pool(&[(Category::Hobby, "Poker".to_string())])
        .await
        .unwrap();

    let loaded = storage.load_pool().await.unwrap();
    assert_eq!(loaded.values(Category::Hobby), ["Poker"]);
}

#[tokio::test]
async fn dialog_state_upserts_and_clears() {
    let storage = common::storage().await;

    assert!(storage.dialog_json(7).await.unwrap().is_none());

    storage.set_dialog_json(7, "{\"step\":\"a\"}").await.unwrap();
    storage.set_dialog_json(7, "{\"step\":\"b\"}").await.unwrap();
    assert_eq!(
        storage.dialog_json(7).await.unwrap().as_deref(),
        Some("{\"step\":\"b\"}")
    );

    storage.clear_dialog(7).await.unwrap();
    assert!(storage.dialog_json(7).await.unwrap().is_none());
}

#[tokio::test]
async fn migrate_is_idempotent() {
    let storage = common::storage().await;
    storage.migrate().await.unwrap();
    storage.migrate().await.unwrap();
}
