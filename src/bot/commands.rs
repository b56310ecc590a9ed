//! The slash-command surface and its handlers.
//!
//! Commands either answer immediately or open a dialog flow handled by
//! [`super::dialog`]. Admin-only commands are ignored outright for
//! anyone but the configured admin: no reply, no hint that the command
//! exists.

use log::{error, info, warn};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use super::dialog::{self, DialogState};
use super::replies;
use super::server::deliver_notices;
use super::{BotState, HandlerResult, Notice};
use crate::game::{ops, AttributePool, GameError};
use crate::logutil::escape_log;

/// Every command the bot understands.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    Start,
    Help,
    Admin,
    /// Join a room: `/room ABCD`.
    Room(String),
    Me,
    Info,
    Card1,
    Card2,
    CreateRoom,
    CloseRoom,
    Players,
    Reload,
    AddInfo,
    Random,
    Swap,
    Shuffle,
    Change,
    Cancel,
}

/// Entry point for parsed commands.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> HandlerResult {
    let user = match msg.from() {
        Some(user) => user,
        None => return Ok(()),
    };
    let user_id = user.id.0 as i64;

    let reply = match cmd {
        Command::Start => replies::start_text(),
        Command::Help => replies::help_text(),

        Command::Room(code) => room_command(&state, user_id, &code).await?,
        Command::Me => me_command(&state, user_id).await?,
        Command::Info => info_command(&state, user_id).await?,
        Command::Card1 => card_command(&bot, &state, user_id, 1).await?,
        Command::Card2 => card_command(&bot, &state, user_id, 2).await?,
        Command::Cancel => dialog::cancel(&state, user_id).await?,

        // Admin-only from here on: silence for everyone else.
        _ if !state.is_admin(user_id) => return Ok(()),

        Command::Admin => replies::admin_panel(),
        Command::CreateRoom => create_room_command(&state).await?,
        Command::CloseRoom => close_room_command(&state).await?,
        Command::Players => players_command(&state).await?,
        Command::Reload => {
            bot.send_message(msg.chat.id, "🔄 Loading data from the sheet...")
                .await?;
            reload_command(&state).await?
        }
        Command::AddInfo => {
            admin_dialog(&state, user_id, |code| DialogState::RevealPlayer {
                room_code: code,
            })
            .await?
        }
        Command::Random => {
            admin_dialog(&state, user_id, |code| DialogState::ReassignPlayer {
                room_code: code,
            })
            .await?
        }
        Command::Swap => {
            admin_dialog_with_prompt(
                &state,
                user_id,
                "Enter the first player's name:",
                |code| DialogState::SwapFirst { room_code: code },
            )
            .await?
        }
        Command::Shuffle => {
            admin_dialog_with_prompt(&state, user_id, &replies::category_prompt(), |code| {
                DialogState::ShuffleCategory { room_code: code }
            })
            .await?
        }
        Command::Change => {
            admin_dialog(&state, user_id, |code| DialogState::ChangePlayer {
                room_code: code,
            })
            .await?
        }
    };

    if !reply.is_empty() {
        bot.send_message(msg.chat.id, reply).await?;
    }
    Ok(())
}

/// Plain-text messages feed the sender's dialog, if one is open.
pub async fn handle_dialog_message(bot: Bot, msg: Message, state: Arc<BotState>) -> HandlerResult {
    let user = match msg.from() {
        Some(user) => user,
        None => return Ok(()),
    };
    let text = match msg.text() {
        Some(text) => text,
        None => return Ok(()),
    };
    // Unparsed slash input must not leak into a dialog as a player name.
    if text.trim_start().starts_with('/') {
        return Ok(());
    }

    let user_id = user.id.0 as i64;
    let username = user.username.clone();
    if let Some(output) = dialog::advance(&state, user_id, username, text).await? {
        bot.send_message(msg.chat.id, output.reply).await?;
        deliver_notices(&bot, &output.notices).await;
    }
    Ok(())
}

async fn room_command(state: &BotState, user_id: i64, code: &str) -> anyhow::Result<String> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        return Ok("Specify a room code: /room XYZW".to_string());
    }
    let room = match state.storage.room_active(&code).await? {
        Some(room) => room,
        None => return Ok("❌ Room not found or already closed.".to_string()),
    };
    if state.storage.member(&room.code, user_id).await?.is_some() {
        return Ok("You are already in this room.".to_string());
    }
    dialog::begin(
        state,
        user_id,
        DialogState::JoinName {
            room_code: room.code,
        },
        "Enter your name (what to call you in the game):",
    )
    .await
}

async fn me_command(state: &BotState, user_id: i64) -> anyhow::Result<String> {
    match state.storage.player_by_user(user_id).await? {
        Some(player) => Ok(replies::player_card(&player)),
        None => Ok("You are not in a room. Join with /room <code>".to_string()),
    }
}

async fn info_command(state: &BotState, user_id: i64) -> anyhow::Result<String> {
    // Players see their own room; the admin may look in from outside.
    let room_code = match state.storage.player_by_user(user_id).await? {
        Some(player) => player.room_code,
        None if state.is_admin(user_id) => match state.storage.active_room().await? {
            Some(room) => room.code,
            None => return Ok(replies::no_active_room()),
        },
        None => return Ok("You are not in a room.".to_string()),
    };
    let players = state.storage.players(&room_code).await?;
    if players.is_empty() {
        return Ok("No players in the room.".to_string());
    }
    Ok(replies::revealed_info(&players))
}

async fn card_command(
    bot: &Bot,
    state: &BotState,
    user_id: i64,
    slot: u8,
) -> anyhow::Result<String> {
    match ops::play_special(&state.storage, user_id, slot).await {
        Ok((player, ops::CardPlay::Played(value))) => {
            info!(
                "Player {} played special condition {}",
                escape_log(&player.name),
                slot
            );
            let notice = Notice::new(
                state.admin_id,
                format!(
                    "🎴 Player {} played special condition {}:\n{}",
                    player.name, slot, value
                ),
            );
            deliver_notices(bot, &[notice]).await;
            Ok(format!("You played your special condition: {}", value))
        }
        Ok((_, ops::CardPlay::AlreadyUsed)) => Ok("You already used this card.".to_string()),
        Ok((player, ops::CardPlay::Empty)) => {
            let notice = Notice::new(
                state.admin_id,
                format!(
                    "⚠️ Player {} tried to play empty card {}.",
                    player.name, slot
                ),
            );
            deliver_notices(bot, &[notice]).await;
            Ok("You have no special condition on this card.".to_string())
        }
        Err(GameError::Storage(e)) => Err(e.into()),
        Err(e) => Ok(replies::game_error(&e)),
    }
}

async fn create_room_command(state: &BotState) -> anyhow::Result<String> {
    let mut alloc = state.allocator.lock().await;
    match ops::create_room(&state.storage, &mut alloc, state.room_code_length).await {
        Ok(code) => {
            info!("Room {} created", code);
            Ok(format!("✅ Room created! Code: {}", code))
        }
        Err(GameError::Storage(e)) => Err(e.into()),
        Err(e) => Ok(replies::game_error(&e)),
    }
}

async fn close_room_command(state: &BotState) -> anyhow::Result<String> {
    match ops::close_room(&state.storage).await {
        Ok((code, removed)) => {
            info!("Room {} closed, {} players removed", code, removed);
            Ok(format!(
                "Room {} closed, {} player(s) removed.",
                code, removed
            ))
        }
        Err(GameError::Storage(e)) => Err(e.into()),
        Err(_) => Ok(replies::no_active_room()),
    }
}

async fn players_command(state: &BotState) -> anyhow::Result<String> {
    let room = match state.storage.active_room().await? {
        Some(room) => room,
        None => return Ok(replies::no_active_room()),
    };
    let players = state.storage.players(&room.code).await?;
    Ok(replies::roster(&players))
}

/// Re-import the sheet. On success the snapshot and the persisted pool
/// are replaced together; on failure both stay as they were.
async fn reload_command(state: &BotState) -> anyhow::Result<String> {
    let columns = match state.sheets.fetch_columns().await {
        Ok(columns) => columns,
        Err(e) => {
            error!("Sheet reload failed: {}", e);
            return Ok(format!("❌ Reload failed: {}", e));
        }
    };
    let pool = AttributePool::from_columns(columns);
    if pool.is_empty() {
        warn!("Sheet reload produced no usable columns; keeping previous pool");
        return Ok("❌ Reload failed: the sheet contained no usable columns.".to_string());
    }
    state.storage.replace_pool(&pool.entries()).await?;
    let summary = pool
        .summary()
        .into_iter()
        .map(|(category, count)| format!("{}: {}", category.as_str(), count))
        .collect::<Vec<_>>()
        .join("\n");
    *state.pool.write().await = pool;
    info!("Attribute pool reloaded from sheet");
    Ok(format!("✅ Data updated.\n{}", summary))
}

/// Open an admin dialog that starts by asking for a player name.
async fn admin_dialog(
    state: &BotState,
    user_id: i64,
    make: impl FnOnce(String) -> DialogState,
) -> anyhow::Result<String> {
    admin_dialog_with_prompt(state, user_id, "Enter the player's name:", make).await
}

/// Open an admin dialog with a custom first prompt. All admin dialogs
/// require an active room.
async fn admin_dialog_with_prompt(
    state: &BotState,
    user_id: i64,
    prompt: &str,
    make: impl FnOnce(String) -> DialogState,
) -> anyhow::Result<String> {
    let room = match state.storage.active_room().await? {
        Some(room) => room,
        None => return Ok(replies::no_active_room()),
    };
    dialog::begin(state, user_id, make(room.code), prompt).await
}
