//! # Bot Module - Telegram Frontend
//!
//! Everything that faces Telegram lives here:
//!
//! - [`server`] - dispatcher wiring, startup and notification delivery
//! - [`commands`] - the slash-command surface and its handlers
//! - [`dialog`] - multi-step conversation flows (join, reveal, random,
//!   swap, shuffle, manual change)
//! - [`replies`] - chat text rendering (cards, rosters, prompts)
//!
//! ## Update Flow
//!
//! ```text
//! Telegram update
//!        │
//! ┌──────────────┐   parsed command   ┌───────────────┐
//! │  dispatcher  ├────────────────────▶  commands.rs  │
//! │  (dptree)    │                    └───────────────┘
//! │              │   plain text       ┌───────────────┐
//! │              ├────────────────────▶  dialog.rs    │
//! └──────────────┘                    └───────────────┘
//! ```
//!
//! Commands either answer immediately or open a dialog; plain text is fed
//! to the caller's persisted dialog state and ignored when none is open.
//! Handlers return rendered strings plus [`Notice`]s; the server delivers
//! notices after the data mutation has committed and never rolls back on
//! delivery failure.

pub mod commands;
pub mod dialog;
pub mod replies;
pub mod server;

use tokio::sync::{Mutex, RwLock};

use crate::game::{Allocator, AttributePool};
use crate::sheets::SheetClient;
use crate::storage::Storage;

pub use server::BotServer;

/// Handler result type used throughout the dispatch tree.
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// A one-way message for a specific player, sent after the mutation that
/// produced it has committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub user_id: i64,
    pub text: String,
}

impl Notice {
    pub fn new(user_id: i64, text: impl Into<String>) -> Self {
        Notice {
            user_id,
            text: text.into(),
        }
    }
}

/// Shared state injected into every handler.
pub struct BotState {
    pub storage: Storage,
    /// Current attribute pool snapshot, replaced atomically on `/reload`.
    pub pool: RwLock<AttributePool>,
    pub allocator: Mutex<Allocator>,
    pub sheets: SheetClient,
    pub admin_id: i64,
    pub room_code_length: usize,
}

impl BotState {
    pub fn is_admin(&self, user_id: i64) -> bool {
        user_id == self.admin_id
    }
}
