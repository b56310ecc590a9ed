//! The full round described in the design notes: open a room, deal two
//! players, reassign, shuffle, reveal, play a card, tear down.

mod common;

use std::collections::BTreeMap;

use bunkerbot::game::{ops, Allocator, Category, GameError};

#[tokio::test]
async fn a_full_round_of_bunker() {
    let storage = common::storage().await;
    let pool = common::test_pool();
    let mut alloc = Allocator::with_seed(100);

    // Admin opens a room
    let code = ops::create_room(&storage, &mut alloc, 4).await.unwrap();

    // Alice joins: one value per single category, two each for luggage
    // and special, all drawn from the configured pool
    let alice = ops::join_room(
        &storage,
        &pool,
        &mut alloc,
        1,
        Some("alice".to_string()),
        &code,
        "Alice",
    )
    .await
    .unwrap();
    for category in Category::ALL {
        let values = alice.values(category);
        assert_eq!(values.len(), category.slots());
        for value in &values {
            assert!(pool.values(category).contains(value));
        }
    }

    // Bob joins and shares no single-category value with Alice
    let bob = ops::join_room(&storage, &pool, &mut alloc, 2, None, &code, "Bob")
        .await
        .unwrap();
    for category in [
        Category::Biology,
        Category::Profession,
        Category::Health,
        Category::Hobby,
        Category::Fact,
    ] {
        assert_ne!(alice.values(category), bob.values(category));
    }

    // Random reassign of Alice's profession avoids Bob's
    let outcome =
        ops::random_reassign(&storage, &pool, &mut alloc, &code, 1, Category::Profession)
            .await
            .unwrap();
    assert_ne!(outcome.new, bob.values(Category::Profession));

    // Shuffling luggage keeps the multiset of four items intact
    let luggage_multiset = |players: &[bunkerbot::storage::Player]| {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for player in players {
            for value in player.values(Category::Luggage) {
                *counts.entry(value).or_default() += 1;
            }
        }
        counts
    };
    let before = luggage_multiset(&storage.players(&code).await.unwrap());
    ops::shuffle(&storage, &mut alloc, &code, Category::Luggage)
        .await
        .unwrap();
    let after = luggage_multiset(&storage.players(&code).await.unwrap());
    assert_eq!(before, after);
    assert_eq!(before.values().sum::<usize>(), 4);

    // Reveal Alice's health for the /info screen; a second reveal is a no-op
    assert!(ops::reveal(&storage, &code, 1, Category::Health).await.unwrap());
    assert!(!ops::reveal(&storage, &code, 1, Category::Health).await.unwrap());

    // Bob plays his first special condition card, once
    let (_, play) = ops::play_special(&storage, 2, 1).await.unwrap();
    assert!(matches!(play, ops::CardPlay::Played(_)));
    let (_, replay) = ops::play_special(&storage, 2, 1).await.unwrap();
    assert_eq!(replay, ops::CardPlay::AlreadyUsed);

    // Teardown: the room closes, players are purged, the code is dead
    let (closed, removed) = ops::close_room(&storage).await.unwrap();
    assert_eq!(closed, code);
    assert_eq!(removed, 2);
    match ops::join_room(&storage, &pool, &mut alloc, 3, None, &code, "Carol").await {
        Err(GameError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {:?}", other.map(|p| p.name)),
    }

    // A new room can open now
    let next = ops::create_room(&storage, &mut alloc, 4).await.unwrap();
    assert_ne!(next, code);
}
