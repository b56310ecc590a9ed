//! Admin mutation operations: random reassign, swap, shuffle, manual
//! change, reveal and special-card play.

mod common;

use std::collections::BTreeMap;

use bunkerbot::game::{ops, Allocator, Category, GameError};

#[tokio::test]
async fn reassign_avoids_other_players_values() {
    let storage = common::storage().await;
    let pool = common::test_pool();
    let mut alloc = Allocator::with_seed(10);
    let code = common::open_room(&storage, &mut alloc).await;

    let alice = common::join(&storage, &pool, &mut alloc, 1, &code, "Alice").await;
    let bob = common::join(&storage, &pool, &mut alloc, 2, &code, "Bob").await;

    let outcome = ops::random_reassign(
        &storage,
        &pool,
        &mut alloc,
        &code,
        alice.user_id,
        Category::Profession,
    )
    .await
    .unwrap();

    assert_eq!(outcome.old, alice.values(Category::Profession));
    assert_ne!(outcome.new, bob.values(Category::Profession));

    let stored = storage.member(&code, 1).await.unwrap().unwrap();
    assert_eq!(stored.values(Category::Profession), outcome.new);
}

#[tokio::test]
async fn reassign_luggage_draws_a_fresh_pair() {
    let storage = common::storage().await;
    let pool = common::test_pool();
    let mut alloc = Allocator::with_seed(11);
    let code = common::open_room(&storage, &mut alloc).await;

    common::join(&storage, &pool, &mut alloc, 1, &code, "Alice").await;
    let bob = common::join(&storage, &pool, &mut alloc, 2, &code, "Bob").await;

    let outcome = ops::random_reassign(&storage, &pool, &mut alloc, &code, 2, Category::Luggage)
        .await
        .unwrap();

    assert_eq!(outcome.new.len(), 2);
    assert_ne!(outcome.new[0], outcome.new[1]);
    let alice = storage.member(&code, 1).await.unwrap().unwrap();
    for value in &outcome.new {
        assert!(!alice.values(Category::Luggage).contains(value));
    }
    assert_eq!(outcome.old, bob.values(Category::Luggage));
}

#[tokio::test]
async fn reassign_pool_size_one_can_return_the_old_value() {
    let storage = common::storage().await;
    let pool = common::tight_pool(Category::Fact, &["Only fact"]);
    let mut alloc = Allocator::with_seed(12);
    let code = common::open_room(&storage, &mut alloc).await;
    common::join(&storage, &pool, &mut alloc, 1, &code, "Alice").await;

    // The excluded set only covers other players, so with a single pool
    // value Alice simply gets her own fact back.
    let outcome = ops::random_reassign(&storage, &pool, &mut alloc, &code, 1, Category::Fact)
        .await
        .unwrap();
    assert_eq!(outcome.old, outcome.new);
}

#[tokio::test]
async fn reassign_fails_without_mutation_when_pool_is_dry() {
    let storage = common::storage().await;
    let pool = common::test_pool();
    let mut alloc = Allocator::with_seed(12);
    let code = common::open_room(&storage, &mut alloc).await;

    common::join(&storage, &pool, &mut alloc, 1, &code, "Alice").await;
    let bob = common::join(&storage, &pool, &mut alloc, 2, &code, "Bob").await;

    // A later reload shrank the luggage column to a single value: a
    // two-slot draw avoiding Alice's items cannot be satisfied.
    let shrunken = common::tight_pool(Category::Luggage, &["Lonely item"]);
    match ops::random_reassign(&storage, &shrunken, &mut alloc, &code, 2, Category::Luggage).await {
        Err(GameError::PoolExhausted { needed, available }) => {
            assert_eq!(needed, 2);
            assert_eq!(available, 1);
        }
        other => panic!("expected PoolExhausted, got {:?}", other.map(|_| ())),
    }

    let unchanged = storage.member(&code, 2).await.unwrap().unwrap();
    assert_eq!(unchanged.values(Category::Luggage), bob.values(Category::Luggage));
}

#[tokio::test]
async fn swap_is_its_own_inverse() {
    let storage = common::storage().await;
    let pool = common::test_pool();
    let mut alloc = Allocator::with_seed(13);
    let code = common::open_room(&storage, &mut alloc).await;

    let alice = common::join(&storage, &pool, &mut alloc, 1, &code, "Alice").await;
    let bob = common::join(&storage, &pool, &mut alloc, 2, &code, "Bob").await;

    for category in [Category::Profession, Category::Luggage] {
        ops::swap(&storage, &code, 1, 2, category).await.unwrap();

        let a = storage.member(&code, 1).await.unwrap().unwrap();
        let b = storage.member(&code, 2).await.unwrap().unwrap();
        assert_eq!(a.values(category), bob.values(category));
        assert_eq!(b.values(category), alice.values(category));

        ops::swap(&storage, &code, 1, 2, category).await.unwrap();

        let a = storage.member(&code, 1).await.unwrap().unwrap();
        let b = storage.member(&code, 2).await.unwrap().unwrap();
        assert_eq!(a.values(category), alice.values(category));
        assert_eq!(b.values(category), bob.values(category));
    }
}

#[tokio::test]
async fn swap_rejects_identical_players() {
    let storage = common::storage().await;
    let pool = common::test_pool();
    let mut alloc = Allocator::with_seed(14);
    let code = common::open_room(&storage, &mut alloc).await;
    common::join(&storage, &pool, &mut alloc, 1, &code, "Alice").await;

    match ops::swap(&storage, &code, 1, 1, Category::Fact).await {
        Err(GameError::Conflict(_)) => {}
        other => panic!("expected Conflict, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn swap_requires_both_players() {
    let storage = common::storage().await;
    let pool = common::test_pool();
    let mut alloc = Allocator::with_seed(15);
    let code = common::open_room(&storage, &mut alloc).await;
    common::join(&storage, &pool, &mut alloc, 1, &code, "Alice").await;

    match ops::swap(&storage, &code, 1, 42, Category::Fact).await {
        Err(GameError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn shuffle_preserves_the_room_wide_multiset() {
    let storage = common::storage().await;
    let pool = common::test_pool();
    let mut alloc = Allocator::with_seed(16);
    let code = common::open_room(&storage, &mut alloc).await;

    for (id, name) in [(1, "Alice"), (2, "Bob"), (3, "Carol")] {
        common::join(&storage, &pool, &mut alloc, id, &code, name).await;
    }

    for category in [Category::Hobby, Category::Luggage] {
        let multiset = |players: &[bunkerbot::storage::Player]| {
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for player in players {
                for value in player.values(category) {
                    *counts.entry(value).or_default() += 1;
                }
            }
            counts
        };

        let before = multiset(&storage.players(&code).await.unwrap());
        let outcome = ops::shuffle(&storage, &mut alloc, &code, category)
            .await
            .unwrap();
        let after = multiset(&storage.players(&code).await.unwrap());

        assert_eq!(before, after);
        assert_eq!(outcome.deals.len(), 3);
        for (_, dealt) in &outcome.deals {
            assert_eq!(dealt.len(), category.slots());
        }
    }
}

#[tokio::test]
async fn shuffle_needs_at_least_two_players() {
    let storage = common::storage().await;
    let pool = common::test_pool();
    let mut alloc = Allocator::with_seed(17);
    let code = common::open_room(&storage, &mut alloc).await;
    common::join(&storage, &pool, &mut alloc, 1, &code, "Alice").await;

    match ops::shuffle(&storage, &mut alloc, &code, Category::Hobby).await {
        Err(GameError::Conflict(_)) => {}
        other => panic!("expected Conflict, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn manual_change_overwrites_and_allows_duplicates() {
    let storage = common::storage().await;
    let pool = common::test_pool();
    let mut alloc = Allocator::with_seed(18);
    let code = common::open_room(&storage, &mut alloc).await;

    common::join(&storage, &pool, &mut alloc, 1, &code, "Alice").await;
    let bob = common::join(&storage, &pool, &mut alloc, 2, &code, "Bob").await;

    // Deliberately give Alice the same profession Bob holds: the admin
    // override bypasses the uniqueness invariant.
    let bobs = bob.values(Category::Profession);
    let outcome = ops::manual_change(&storage, &code, 1, Category::Profession, bobs.clone())
        .await
        .unwrap();
    assert_eq!(outcome.new, bobs);

    let alice = storage.member(&code, 1).await.unwrap().unwrap();
    assert_eq!(alice.values(Category::Profession), bobs);
}

#[tokio::test]
async fn manual_change_validates_arity_and_emptiness() {
    let storage = common::storage().await;
    let pool = common::test_pool();
    let mut alloc = Allocator::with_seed(19);
    let code = common::open_room(&storage, &mut alloc).await;
    common::join(&storage, &pool, &mut alloc, 1, &code, "Alice").await;

    match ops::manual_change(&storage, &code, 1, Category::Luggage, vec!["one".into()]).await {
        Err(GameError::InvalidInput(_)) => {}
        other => panic!("expected InvalidInput, got {:?}", other.map(|_| ())),
    }
    match ops::manual_change(&storage, &code, 1, Category::Fact, vec!["  ".into()]).await {
        Err(GameError::InvalidInput(_)) => {}
        other => panic!("expected InvalidInput, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn reveal_is_idempotent_and_skips_special() {
    let storage = common::storage().await;
    let pool = common::test_pool();
    let mut alloc = Allocator::with_seed(20);
    let code = common::open_room(&storage, &mut alloc).await;
    common::join(&storage, &pool, &mut alloc, 1, &code, "Alice").await;

    assert!(ops::reveal(&storage, &code, 1, Category::Hobby).await.unwrap());
    assert!(!ops::reveal(&storage, &code, 1, Category::Hobby).await.unwrap());

    let player = storage.member(&code, 1).await.unwrap().unwrap();
    assert_eq!(player.revealed.0, vec![Category::Hobby]);

    // Special conditions never travel through reveal
    assert!(!ops::reveal(&storage, &code, 1, Category::Special).await.unwrap());
    let player = storage.member(&code, 1).await.unwrap().unwrap();
    assert_eq!(player.revealed.0, vec![Category::Hobby]);
}

#[tokio::test]
async fn special_cards_play_exactly_once() {
    let storage = common::storage().await;
    let pool = common::test_pool();
    let mut alloc = Allocator::with_seed(21);
    let code = common::open_room(&storage, &mut alloc).await;
    let alice = common::join(&storage, &pool, &mut alloc, 1, &code, "Alice").await;

    let (_, play) = ops::play_special(&storage, 1, 1).await.unwrap();
    assert_eq!(play, ops::CardPlay::Played(alice.special1.clone()));

    let (_, replay) = ops::play_special(&storage, 1, 1).await.unwrap();
    assert_eq!(replay, ops::CardPlay::AlreadyUsed);

    // The second slot is untouched
    let (_, second) = ops::play_special(&storage, 1, 2).await.unwrap();
    assert_eq!(second, ops::CardPlay::Played(alice.special2.clone()));

    match ops::play_special(&storage, 42, 1).await {
        Err(GameError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
    }
}
