//! Room lifecycle and admin mutation operations.
//!
//! Each operation validates, mutates the store as one unit and returns a
//! typed outcome with enough detail (old and new values, affected
//! players) for the bot layer to render replies and player notices.
//! Nothing here knows about Telegram.

use sqlx::types::Json;

use super::allocator::Allocator;
use super::category::Category;
use super::errors::GameError;
use super::pool::AttributePool;
use crate::storage::{Player, Storage};

/// How many times a colliding room code is redrawn before giving up.
const CODE_RETRIES: usize = 16;

/// Result of a value-changing operation on one player.
#[derive(Debug)]
pub struct ChangeOutcome {
    pub player: Player,
    pub old: Vec<String>,
    pub new: Vec<String>,
}

/// Result of swapping a category between two players.
#[derive(Debug)]
pub struct SwapOutcome {
    pub first: Player,
    pub second: Player,
    pub first_new: Vec<String>,
    pub second_new: Vec<String>,
}

/// Result of shuffling a category across the room: each player with the
/// values dealt to them.
#[derive(Debug)]
pub struct ShuffleOutcome {
    pub deals: Vec<(Player, Vec<String>)>,
}

/// Result of a player playing a special-condition card.
#[derive(Debug, PartialEq, Eq)]
pub enum CardPlay {
    /// The card text, now marked used.
    Played(String),
    AlreadyUsed,
    /// The slot holds no card; the admin is warned about the attempt.
    Empty,
}

/// Open a new room. Fails with `Conflict` while another room is active.
pub async fn create_room(
    storage: &Storage,
    alloc: &mut Allocator,
    code_length: usize,
) -> Result<String, GameError> {
    if let Some(room) = storage.active_room().await? {
        return Err(GameError::Conflict(format!(
            "room {} is already open",
            room.code
        )));
    }
    for _ in 0..CODE_RETRIES {
        let code = alloc.room_code(code_length);
        if !storage.room_exists(&code).await? {
            storage.create_room(&code).await?;
            return Ok(code);
        }
    }
    Err(GameError::Conflict(
        "could not find a free room code".to_string(),
    ))
}

/// Close the active room and purge its players. Destructive, no undo.
pub async fn close_room(storage: &Storage) -> Result<(String, u64), GameError> {
    let room = storage
        .active_room()
        .await?
        .ok_or_else(|| GameError::NotFound("no active room".to_string()))?;
    let removed = storage.close_room(&room.code).await?;
    Ok((room.code, removed))
}

/// Admit a user into an active room and deal them a full character card.
///
/// The excluded set per category is the union of values the other members
/// already hold. The previous membership of the same user (in any room)
/// is removed in the same transaction that inserts the new row, so an
/// allocation failure leaves everything untouched.
pub async fn join_room(
    storage: &Storage,
    pool: &AttributePool,
    alloc: &mut Allocator,
    user_id: i64,
    username: Option<String>,
    code: &str,
    name: &str,
) -> Result<Player, GameError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GameError::InvalidInput("empty display name".to_string()));
    }
    let code = code.trim().to_uppercase();
    let room = storage
        .room_active(&code)
        .await?
        .ok_or_else(|| GameError::NotFound(format!("room {} not found or closed", code)))?;

    if storage.member(&room.code, user_id).await?.is_some() {
        return Err(GameError::Conflict("already in this room".to_string()));
    }
    if storage.player_by_name(&room.code, name).await?.is_some() {
        return Err(GameError::Conflict(format!(
            "name {} is already taken in this room",
            name
        )));
    }

    let others = storage.players(&room.code).await?;
    let used = |category: Category| -> Vec<String> {
        others.iter().flat_map(|p| p.values(category)).collect()
    };

    let biology = alloc.draw(pool.values(Category::Biology), &used(Category::Biology), 1)?;
    let profession = alloc.draw(
        pool.values(Category::Profession),
        &used(Category::Profession),
        1,
    )?;
    let health = alloc.draw(pool.values(Category::Health), &used(Category::Health), 1)?;
    let hobby = alloc.draw(pool.values(Category::Hobby), &used(Category::Hobby), 1)?;
    let fact = alloc.draw(pool.values(Category::Fact), &used(Category::Fact), 1)?;
    let luggage = alloc.draw(pool.values(Category::Luggage), &used(Category::Luggage), 2)?;
    let special = alloc.draw(pool.values(Category::Special), &used(Category::Special), 2)?;

    let player = Player {
        user_id,
        room_code: room.code.clone(),
        username,
        name: name.to_string(),
        biology: biology.into_iter().next().unwrap_or_default(),
        profession: profession.into_iter().next().unwrap_or_default(),
        health: health.into_iter().next().unwrap_or_default(),
        hobby: hobby.into_iter().next().unwrap_or_default(),
        luggage1: luggage[0].clone(),
        luggage2: luggage[1].clone(),
        fact: fact.into_iter().next().unwrap_or_default(),
        special1: special[0].clone(),
        special2: special[1].clone(),
        used_special1: false,
        used_special2: false,
        revealed: Json(Vec::new()),
    };
    storage.adopt_player(&player).await?;
    Ok(player)
}

/// Draw fresh value(s) for one player's category, avoiding everything the
/// other members currently hold. No mutation on pool exhaustion.
///
/// With a single available value the draw can hand back the player's own
/// current value unchanged; the excluded set only covers other members.
pub async fn random_reassign(
    storage: &Storage,
    pool: &AttributePool,
    alloc: &mut Allocator,
    room_code: &str,
    user_id: i64,
    category: Category,
) -> Result<ChangeOutcome, GameError> {
    let player = storage
        .member(room_code, user_id)
        .await?
        .ok_or_else(|| GameError::NotFound("player not found in room".to_string()))?;

    let excluded: Vec<String> = storage
        .players(room_code)
        .await?
        .iter()
        .filter(|p| p.user_id != user_id)
        .flat_map(|p| p.values(category))
        .collect();

    let new = alloc.draw(pool.values(category), &excluded, category.slots())?;
    storage
        .update_category_values(room_code, user_id, category, &new)
        .await?;

    let old = player.values(category);
    Ok(ChangeOutcome { player, old, new })
}

/// Exchange a category between two players verbatim. A pure permutation,
/// so room-wide uniqueness cannot be violated.
pub async fn swap(
    storage: &Storage,
    room_code: &str,
    first_id: i64,
    second_id: i64,
    category: Category,
) -> Result<SwapOutcome, GameError> {
    if first_id == second_id {
        return Err(GameError::Conflict(
            "cannot swap a player with themselves".to_string(),
        ));
    }
    let first = storage
        .member(room_code, first_id)
        .await?
        .ok_or_else(|| GameError::NotFound("first player not found in room".to_string()))?;
    let second = storage
        .member(room_code, second_id)
        .await?
        .ok_or_else(|| GameError::NotFound("second player not found in room".to_string()))?;

    let first_new = second.values(category);
    let second_new = first.values(category);
    storage
        .set_category_values_many(
            room_code,
            category,
            &[
                (first_id, first_new.clone()),
                (second_id, second_new.clone()),
            ],
        )
        .await?;

    Ok(SwapOutcome {
        first,
        second,
        first_new,
        second_new,
    })
}

/// Collect every member's value(s) for a category, permute uniformly and
/// redeal slot-for-slot in roster order. The multiset of values across
/// the room is preserved exactly.
pub async fn shuffle(
    storage: &Storage,
    alloc: &mut Allocator,
    room_code: &str,
    category: Category,
) -> Result<ShuffleOutcome, GameError> {
    let players = storage.players(room_code).await?;
    if players.len() < 2 {
        return Err(GameError::Conflict(
            "need at least two players to shuffle".to_string(),
        ));
    }

    let mut values: Vec<String> = players.iter().flat_map(|p| p.values(category)).collect();
    alloc.shuffle(&mut values);

    // Fixed slot counts per category: the flattened pool always divides
    // evenly across the roster.
    let slots = category.slots();
    let mut deals = Vec::with_capacity(players.len());
    for (index, player) in players.into_iter().enumerate() {
        let dealt = values[index * slots..(index + 1) * slots].to_vec();
        deals.push((player, dealt));
    }

    let updates: Vec<(i64, Vec<String>)> = deals
        .iter()
        .map(|(p, dealt)| (p.user_id, dealt.clone()))
        .collect();
    storage
        .set_category_values_many(room_code, category, &updates)
        .await?;

    Ok(ShuffleOutcome { deals })
}

/// Unconditionally overwrite a player's category. Administrator override:
/// bypasses the allocator and may introduce duplicates across players.
pub async fn manual_change(
    storage: &Storage,
    room_code: &str,
    user_id: i64,
    category: Category,
    values: Vec<String>,
) -> Result<ChangeOutcome, GameError> {
    if values.len() != category.slots() {
        return Err(GameError::InvalidInput(format!(
            "{} takes {} value(s), got {}",
            category,
            category.slots(),
            values.len()
        )));
    }
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(GameError::InvalidInput("empty value".to_string()));
    }
    let values: Vec<String> = values.into_iter().map(|v| v.trim().to_string()).collect();

    let player = storage
        .member(room_code, user_id)
        .await?
        .ok_or_else(|| GameError::NotFound("player not found in room".to_string()))?;

    storage
        .update_category_values(room_code, user_id, category, &values)
        .await?;

    let old = player.values(category);
    Ok(ChangeOutcome {
        player,
        old,
        new: values,
    })
}

/// Idempotently add a category to a player's revealed set. Special
/// conditions never travel through this path: the call is a no-op for
/// them, not a failure.
pub async fn reveal(
    storage: &Storage,
    room_code: &str,
    user_id: i64,
    category: Category,
) -> Result<bool, GameError> {
    if category == Category::Special {
        return Ok(false);
    }
    storage
        .member(room_code, user_id)
        .await?
        .ok_or_else(|| GameError::NotFound("player not found in room".to_string()))?;
    Ok(storage.add_revealed(room_code, user_id, category).await?)
}

/// Play special-condition card 1 or 2. The used flag flips false→true
/// exactly once and is never reset outside room teardown.
pub async fn play_special(
    storage: &Storage,
    user_id: i64,
    slot: u8,
) -> Result<(Player, CardPlay), GameError> {
    let player = storage
        .player_by_user(user_id)
        .await?
        .ok_or_else(|| GameError::NotFound("you are not in a room".to_string()))?;

    let (value, used) = match slot {
        1 => (player.special1.clone(), player.used_special1),
        2 => (player.special2.clone(), player.used_special2),
        _ => return Err(GameError::InvalidInput(format!("no card slot {}", slot))),
    };

    if value.trim().is_empty() {
        return Ok((player, CardPlay::Empty));
    }
    if used {
        return Ok((player, CardPlay::AlreadyUsed));
    }
    let changed = storage
        .mark_special_used(&player.room_code, user_id, slot)
        .await?;
    if !changed {
        // Lost a race against a duplicate update; treat as already used.
        return Ok((player, CardPlay::AlreadyUsed));
    }
    Ok((player, CardPlay::Played(value)))
}
