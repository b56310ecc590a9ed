//! Multi-step conversation flows.
//!
//! Each flow is a finite sequence of prompts driven by one persisted
//! [`DialogState`] per user, stored in the same database as the game data
//! so a half-finished dialog survives restarts and arbitrarily long
//! pauses. Invalid input re-prompts the same step without advancing and
//! without partial mutation; `/cancel` discards the dialog from any step.
//!
//! Starting a new dialog while one is in flight is rejected with a
//! message rather than silently discarding the pending one.

use anyhow::Result;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::replies;
use super::{BotState, Notice};
use crate::game::{ops, Category, GameError};
use crate::logutil::escape_log;

/// One step of one flow, tagged for JSON persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum DialogState {
    /// `/room <code>` accepted; waiting for the display name.
    JoinName { room_code: String },

    /// `/addinfo`: waiting for the player name.
    RevealPlayer { room_code: String },
    /// `/addinfo`: waiting for the category.
    RevealCategory {
        room_code: String,
        player_id: i64,
        player_name: String,
    },

    /// `/random`: waiting for the player name.
    ReassignPlayer { room_code: String },
    /// `/random`: waiting for the category.
    ReassignCategory {
        room_code: String,
        player_id: i64,
        player_name: String,
    },

    /// `/swap`: waiting for the first player name.
    SwapFirst { room_code: String },
    /// `/swap`: waiting for the second player name.
    SwapSecond {
        room_code: String,
        first_id: i64,
        first_name: String,
    },
    /// `/swap`: waiting for the category.
    SwapCategory {
        room_code: String,
        first_id: i64,
        first_name: String,
        second_id: i64,
        second_name: String,
    },

    /// `/shuffle`: waiting for the category.
    ShuffleCategory { room_code: String },

    /// `/change`: waiting for the player name.
    ChangePlayer { room_code: String },
    /// `/change`: waiting for the category.
    ChangeCategory {
        room_code: String,
        player_id: i64,
        player_name: String,
    },
    /// `/change`: waiting for the (first) new value.
    ChangeValue {
        room_code: String,
        player_id: i64,
        player_name: String,
        category: Category,
    },
    /// `/change` on luggage: waiting for the second new value.
    ChangeSecondValue {
        room_code: String,
        player_id: i64,
        player_name: String,
        category: Category,
        first_value: String,
    },
}

/// What one consumed message produced: a reply for the sender and any
/// notices for affected players.
#[derive(Debug)]
pub struct StepOutput {
    pub reply: String,
    pub notices: Vec<Notice>,
}

struct Step {
    reply: String,
    notices: Vec<Notice>,
    next: Option<DialogState>,
}

impl Step {
    /// Terminal step: the dialog is over.
    fn done(reply: impl Into<String>) -> Self {
        Step {
            reply: reply.into(),
            notices: Vec::new(),
            next: None,
        }
    }

    fn done_with(reply: impl Into<String>, notices: Vec<Notice>) -> Self {
        Step {
            reply: reply.into(),
            notices,
            next: None,
        }
    }

    /// Re-prompt or move on; either way the dialog continues.
    fn next(state: DialogState, reply: impl Into<String>) -> Self {
        Step {
            reply: reply.into(),
            notices: Vec::new(),
            next: Some(state),
        }
    }
}

/// Recover a game error into a terminal chat reply; storage errors keep
/// propagating.
fn recover(err: GameError) -> Result<Step> {
    match err {
        GameError::Storage(e) => Err(e.into()),
        other => Ok(Step::done(replies::game_error(&other))),
    }
}

/// Open a dialog for `user_id` unless one is already in flight.
pub async fn begin(
    state: &BotState,
    user_id: i64,
    dialog: DialogState,
    prompt: impl Into<String>,
) -> Result<String> {
    if state.storage.dialog_json(user_id).await?.is_some() {
        return Ok(replies::busy_dialog());
    }
    state
        .storage
        .set_dialog_json(user_id, &serde_json::to_string(&dialog)?)
        .await?;
    Ok(prompt.into())
}

/// Discard the caller's dialog, if any.
pub async fn cancel(state: &BotState, user_id: i64) -> Result<String> {
    if state.storage.dialog_json(user_id).await?.is_none() {
        return Ok("❌ No active dialog.".to_string());
    }
    state.storage.clear_dialog(user_id).await?;
    Ok("✅ Dialog cancelled.".to_string())
}

/// Feed one plain-text message into the sender's dialog. Returns `None`
/// when the sender has no dialog open.
pub async fn advance(
    state: &BotState,
    user_id: i64,
    username: Option<String>,
    input: &str,
) -> Result<Option<StepOutput>> {
    let json = match state.storage.dialog_json(user_id).await? {
        Some(json) => json,
        None => return Ok(None),
    };
    let dialog: DialogState = match serde_json::from_str(&json) {
        Ok(dialog) => dialog,
        Err(e) => {
            warn!("Dropping unreadable dialog state for user {}: {}", user_id, e);
            state.storage.clear_dialog(user_id).await?;
            return Ok(None);
        }
    };

    let input = input.trim();
    if input.is_empty() {
        return Ok(Some(StepOutput {
            reply: "❌ The value cannot be empty. Enter again:".to_string(),
            notices: Vec::new(),
        }));
    }

    let step = run_step(state, user_id, username, dialog, input).await?;
    match &step.next {
        Some(next) => {
            state
                .storage
                .set_dialog_json(user_id, &serde_json::to_string(next)?)
                .await?;
        }
        None => state.storage.clear_dialog(user_id).await?,
    }
    Ok(Some(StepOutput {
        reply: step.reply,
        notices: step.notices,
    }))
}

async fn run_step(
    state: &BotState,
    user_id: i64,
    username: Option<String>,
    dialog: DialogState,
    input: &str,
) -> Result<Step> {
    match dialog {
        DialogState::JoinName { room_code } => {
            if state
                .storage
                .player_by_name(&room_code, input)
                .await?
                .is_some()
            {
                return Ok(Step::next(
                    DialogState::JoinName { room_code },
                    "❌ That name is already taken in this room. Enter another name:",
                ));
            }
            let pool = state.pool.read().await;
            let mut alloc = state.allocator.lock().await;
            match ops::join_room(
                &state.storage,
                &pool,
                &mut alloc,
                user_id,
                username,
                &room_code,
                input,
            )
            .await
            {
                Ok(player) => {
                    info!(
                        "Player {} joined room {} as {}",
                        user_id,
                        player.room_code,
                        escape_log(&player.name)
                    );
                    Ok(Step::done(format!(
                        "✅ You joined room {} as {}.\nYour card: /me",
                        player.room_code, player.name
                    )))
                }
                Err(e) => recover(e),
            }
        }

        DialogState::RevealPlayer { room_code } => {
            match state.storage.player_by_name(&room_code, input).await? {
                Some(player) => Ok(Step::next(
                    DialogState::RevealCategory {
                        room_code,
                        player_id: player.user_id,
                        player_name: player.name,
                    },
                    replies::category_prompt(),
                )),
                None => Ok(Step::next(
                    DialogState::RevealPlayer { room_code },
                    replies::unknown_player(),
                )),
            }
        }
        DialogState::RevealCategory {
            room_code,
            player_id,
            player_name,
        } => {
            let category = match Category::parse_adjustable(input) {
                Some(c) => c,
                None => {
                    return Ok(Step::next(
                        DialogState::RevealCategory {
                            room_code,
                            player_id,
                            player_name,
                        },
                        replies::bad_category(),
                    ))
                }
            };
            match ops::reveal(&state.storage, &room_code, player_id, category).await {
                Ok(true) => Ok(Step::done(format!(
                    "✅ {} revealed for {}.",
                    category.label(),
                    player_name
                ))),
                Ok(false) => Ok(Step::done(format!(
                    "{} is already revealed for {}.",
                    category.label(),
                    player_name
                ))),
                Err(e) => recover(e),
            }
        }

        DialogState::ReassignPlayer { room_code } => {
            match state.storage.player_by_name(&room_code, input).await? {
                Some(player) => Ok(Step::next(
                    DialogState::ReassignCategory {
                        room_code,
                        player_id: player.user_id,
                        player_name: player.name,
                    },
                    replies::category_prompt(),
                )),
                None => Ok(Step::next(
                    DialogState::ReassignPlayer { room_code },
                    replies::unknown_player(),
                )),
            }
        }
        DialogState::ReassignCategory {
            room_code,
            player_id,
            player_name,
        } => {
            let category = match Category::parse_adjustable(input) {
                Some(c) => c,
                None => {
                    return Ok(Step::next(
                        DialogState::ReassignCategory {
                            room_code,
                            player_id,
                            player_name,
                        },
                        replies::bad_category(),
                    ))
                }
            };
            let pool = state.pool.read().await;
            let mut alloc = state.allocator.lock().await;
            match ops::random_reassign(
                &state.storage,
                &pool,
                &mut alloc,
                &room_code,
                player_id,
                category,
            )
            .await
            {
                Ok(outcome) => {
                    info!(
                        "Admin reassigned {} for {}",
                        category,
                        escape_log(&player_name)
                    );
                    let notice = Notice::new(
                        player_id,
                        format!(
                            "🔄 The admin randomly changed your {}:\n{}",
                            category.label().to_lowercase(),
                            replies::was_now(&outcome.old, &outcome.new)
                        ),
                    );
                    Ok(Step::done_with(
                        format!(
                            "✅ {} of {} changed to: {}",
                            category.label(),
                            player_name,
                            outcome.new.join(", ")
                        ),
                        vec![notice],
                    ))
                }
                Err(e) => recover(e),
            }
        }

        DialogState::SwapFirst { room_code } => {
            match state.storage.player_by_name(&room_code, input).await? {
                Some(player) => Ok(Step::next(
                    DialogState::SwapSecond {
                        room_code,
                        first_id: player.user_id,
                        first_name: player.name,
                    },
                    "Enter the second player's name:",
                )),
                None => Ok(Step::next(
                    DialogState::SwapFirst { room_code },
                    replies::unknown_player(),
                )),
            }
        }
        DialogState::SwapSecond {
            room_code,
            first_id,
            first_name,
        } => {
            if input == first_name {
                return Ok(Step::next(
                    DialogState::SwapSecond {
                        room_code,
                        first_id,
                        first_name,
                    },
                    "❌ The players must differ. Enter another name:",
                ));
            }
            match state.storage.player_by_name(&room_code, input).await? {
                Some(player) => Ok(Step::next(
                    DialogState::SwapCategory {
                        room_code,
                        first_id,
                        first_name,
                        second_id: player.user_id,
                        second_name: player.name,
                    },
                    replies::category_prompt(),
                )),
                None => Ok(Step::next(
                    DialogState::SwapSecond {
                        room_code,
                        first_id,
                        first_name,
                    },
                    replies::unknown_player(),
                )),
            }
        }
        DialogState::SwapCategory {
            room_code,
            first_id,
            first_name,
            second_id,
            second_name,
        } => {
            let category = match Category::parse_adjustable(input) {
                Some(c) => c,
                None => {
                    return Ok(Step::next(
                        DialogState::SwapCategory {
                            room_code,
                            first_id,
                            first_name,
                            second_id,
                            second_name,
                        },
                        replies::bad_category(),
                    ))
                }
            };
            match ops::swap(&state.storage, &room_code, first_id, second_id, category).await {
                Ok(outcome) => {
                    info!(
                        "Admin swapped {} between {} and {}",
                        category,
                        escape_log(&first_name),
                        escape_log(&second_name)
                    );
                    let label = category.label().to_lowercase();
                    let notices = vec![
                        Notice::new(
                            first_id,
                            format!(
                                "🔄 The admin swapped your {} with {}.\nYou now have: {}",
                                label,
                                second_name,
                                outcome.first_new.join(", ")
                            ),
                        ),
                        Notice::new(
                            second_id,
                            format!(
                                "🔄 The admin swapped your {} with {}.\nYou now have: {}",
                                label,
                                first_name,
                                outcome.second_new.join(", ")
                            ),
                        ),
                    ];
                    Ok(Step::done_with(
                        format!(
                            "✅ {} of {} and {} swapped.",
                            category.label(),
                            first_name,
                            second_name
                        ),
                        notices,
                    ))
                }
                Err(e) => recover(e),
            }
        }

        DialogState::ShuffleCategory { room_code } => {
            let category = match Category::parse_adjustable(input) {
                Some(c) => c,
                None => {
                    return Ok(Step::next(
                        DialogState::ShuffleCategory { room_code },
                        replies::bad_category(),
                    ))
                }
            };
            let mut alloc = state.allocator.lock().await;
            match ops::shuffle(&state.storage, &mut alloc, &room_code, category).await {
                Ok(outcome) => {
                    info!("Admin shuffled {} in room {}", category, room_code);
                    let label = category.label().to_lowercase();
                    let notices = outcome
                        .deals
                        .iter()
                        .map(|(player, dealt)| {
                            Notice::new(
                                player.user_id,
                                format!(
                                    "🔄 The admin shuffled {}! Your new {}:\n{}",
                                    label,
                                    label,
                                    dealt.join(", ")
                                ),
                            )
                        })
                        .collect();
                    Ok(Step::done_with(
                        format!("✅ {} shuffled across all players.", category.label()),
                        notices,
                    ))
                }
                Err(e) => recover(e),
            }
        }

        DialogState::ChangePlayer { room_code } => {
            match state.storage.player_by_name(&room_code, input).await? {
                Some(player) => Ok(Step::next(
                    DialogState::ChangeCategory {
                        room_code,
                        player_id: player.user_id,
                        player_name: player.name,
                    },
                    replies::category_prompt(),
                )),
                None => Ok(Step::next(
                    DialogState::ChangePlayer { room_code },
                    replies::unknown_player(),
                )),
            }
        }
        DialogState::ChangeCategory {
            room_code,
            player_id,
            player_name,
        } => {
            let category = match Category::parse_adjustable(input) {
                Some(c) => c,
                None => {
                    return Ok(Step::next(
                        DialogState::ChangeCategory {
                            room_code,
                            player_id,
                            player_name,
                        },
                        replies::bad_category(),
                    ))
                }
            };
            let prompt = if category.is_multi() {
                "Enter the new value for the first luggage item:".to_string()
            } else {
                format!("Enter the new value for {}:", category.label().to_lowercase())
            };
            Ok(Step::next(
                DialogState::ChangeValue {
                    room_code,
                    player_id,
                    player_name,
                    category,
                },
                prompt,
            ))
        }
        DialogState::ChangeValue {
            room_code,
            player_id,
            player_name,
            category,
        } => {
            if category.is_multi() {
                return Ok(Step::next(
                    DialogState::ChangeSecondValue {
                        room_code,
                        player_id,
                        player_name,
                        category,
                        first_value: input.to_string(),
                    },
                    "Enter the new value for the second luggage item:",
                ));
            }
            apply_manual_change(state, room_code, player_id, player_name, category, vec![
                input.to_string(),
            ])
            .await
        }
        DialogState::ChangeSecondValue {
            room_code,
            player_id,
            player_name,
            category,
            first_value,
        } => {
            apply_manual_change(state, room_code, player_id, player_name, category, vec![
                first_value,
                input.to_string(),
            ])
            .await
        }
    }
}

async fn apply_manual_change(
    state: &BotState,
    room_code: String,
    player_id: i64,
    player_name: String,
    category: Category,
    values: Vec<String>,
) -> Result<Step> {
    match ops::manual_change(&state.storage, &room_code, player_id, category, values).await {
        Ok(outcome) => {
            info!(
                "Admin manually changed {} for {}",
                category,
                escape_log(&player_name)
            );
            let notice = Notice::new(
                player_id,
                format!(
                    "🔄 The admin manually changed your {}:\n{}",
                    category.label().to_lowercase(),
                    replies::was_now(&outcome.old, &outcome.new)
                ),
            );
            Ok(Step::done_with(
                format!(
                    "✅ {} of {} changed to: {}",
                    category.label(),
                    player_name,
                    outcome.new.join(", ")
                ),
                vec![notice],
            ))
        }
        Err(e) => recover(e),
    }
}

#[cfg(test)]
mod tests {
    use super::DialogState;
    use crate::game::Category;

    #[test]
    fn dialog_state_roundtrips_through_json() {
        let state = DialogState::ChangeValue {
            room_code: "ABCD".into(),
            player_id: 7,
            player_name: "Alice".into(),
            category: Category::Luggage,
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: DialogState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn tagged_encoding_is_stable() {
        let state = DialogState::SwapFirst {
            room_code: "ABCD".into(),
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"step\":\"swap_first\""));
    }
}
