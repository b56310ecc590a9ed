//! Chat text rendering: cards, rosters, revealed info, prompts and error
//! lines. Pure functions so every screen is unit-testable.

use crate::game::{Category, GameError};
use crate::storage::Player;

pub fn start_text() -> String {
    "👋 Welcome to the Bunker game bot!\n\
     Player commands:\n\
     /room <code> - join a room\n\
     /me - my character card\n\
     /info - revealed information\n\
     /card1 - play special condition 1\n\
     /card2 - play special condition 2\n\
     /help - command list"
        .to_string()
}

pub fn help_text() -> String {
    "/room <code> - join a room\n\
     /me - my character card\n\
     /info - revealed information\n\
     /card1, /card2 - play your special conditions"
        .to_string()
}

pub fn admin_panel() -> String {
    "🔧 Admin panel:\n\
     /createroom - create a room\n\
     /closeroom - close the room\n\
     /players - list players\n\
     /reload - reload the card pools\n\
     /addinfo - reveal a category in /info\n\
     /random - randomly change a card\n\
     /swap - swap cards between two players\n\
     /shuffle - shuffle a category\n\
     /change - change a card manually\n\
     /cancel - cancel the current dialog"
        .to_string()
}

fn category_emoji(category: Category) -> &'static str {
    match category {
        Category::Biology => "🧬",
        Category::Profession => "💼",
        Category::Health => "❤️",
        Category::Hobby => "🎨",
        Category::Luggage => "🎒",
        Category::Fact => "📜",
        Category::Special => "🔮",
    }
}

fn category_line(category: Category, player: &Player) -> String {
    format!(
        "{} {}: {}",
        category_emoji(category),
        category.label(),
        player.values(category).join(", ")
    )
}

/// The full private character card.
pub fn player_card(player: &Player) -> String {
    let mut lines = vec![format!("🧑 {}", player.name)];
    for category in Category::ALL {
        lines.push(category_line(category, player));
    }
    lines.join("\n")
}

/// The `/info` screen: every player's revealed categories. Players with
/// nothing revealed are skipped entirely.
pub fn revealed_info(players: &[Player]) -> String {
    let mut text = String::from("📢 Revealed information:\n");
    let mut anything = false;
    for player in players {
        if player.revealed.0.is_empty() {
            continue;
        }
        anything = true;
        text.push('\n');
        text.push_str(&player.name);
        for category in &player.revealed.0 {
            text.push('\n');
            text.push_str(&category_line(*category, player));
        }
        text.push('\n');
    }
    if !anything {
        return "Nothing has been revealed yet.".to_string();
    }
    text
}

/// The admin roster listing.
pub fn roster(players: &[Player]) -> String {
    if players.is_empty() {
        return "No players in the room yet.".to_string();
    }
    let mut text = String::from("Players in the room:");
    for player in players {
        text.push_str("\n• ");
        text.push_str(&player.name);
        if let Some(username) = &player.username {
            text.push_str(&format!(" (@{})", username));
        }
    }
    text
}

pub fn category_prompt() -> String {
    format!("Which category? ({})", Category::adjustable_list())
}

pub fn bad_category() -> String {
    format!(
        "❌ Unknown category. Choose one of: {}.",
        Category::adjustable_list()
    )
}

pub fn unknown_player() -> String {
    "❌ No player with that name. Try again or /cancel.".to_string()
}

pub fn busy_dialog() -> String {
    "❌ Another dialog is already in progress. Finish it or send /cancel first.".to_string()
}

pub fn no_active_room() -> String {
    "❌ No active room.".to_string()
}

/// Render a recovered game error as a chat line.
pub fn game_error(err: &GameError) -> String {
    match err {
        GameError::PoolExhausted { needed, available } => format!(
            "❌ Not enough unique cards in the pool: need {}, have {}.",
            needed, available
        ),
        GameError::NotFound(msg)
        | GameError::Conflict(msg)
        | GameError::InvalidInput(msg) => format!("❌ {}.", capitalize(msg)),
        GameError::PermissionDenied => "❌ Permission denied.".to_string(),
        GameError::Storage(e) => {
            // Should be propagated before rendering; kept as a fallback.
            format!("❌ Internal error: {}.", e)
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// "Was: … / Now: …" body shared by change notifications.
pub fn was_now(old: &[String], new: &[String]) -> String {
    format!("Was: {}\nNow: {}", old.join(", "), new.join(", "))
}
